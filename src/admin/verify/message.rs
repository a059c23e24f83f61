use std::fmt;
use std::ops::ControlFlow;

use super::bounds::KeyBounds;
use super::node::NodeScan;
use super::report::VerifyCheck;
use crate::storage::ftree::{KeyComparator, MessageBuffer, MessageKind};
use crate::types::Msn;

/// Why a single buffered message is misplaced.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageFault {
    /// The message carries the reserved zero MSN.
    ZeroMsn,
    /// A keyed message lies outside the child's bounds.
    OutOfBounds,
}

impl fmt::Display for MessageFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageFault::ZeroMsn => f.write_str("zero msn"),
            MessageFault::OutOfBounds => f.write_str("key outside child bounds"),
        }
    }
}

/// Validates one message against the bounds of the child it is buffered for.
///
/// Only keyed kinds (see [`MessageKind::is_keyed`]) are range-checked; broadcast
/// and maintenance kinds pass regardless of their key.
pub fn check_message(
    cmp: &dyn KeyComparator,
    kind: MessageKind,
    msn: Msn,
    key: &[u8],
    bounds: KeyBounds<'_>,
) -> Result<(), MessageFault> {
    if msn.is_zero() {
        return Err(MessageFault::ZeroMsn);
    }
    if kind.is_keyed() && !bounds.contains(cmp, key) {
        return Err(MessageFault::OutOfBounds);
    }
    Ok(())
}

/// Walks one child buffer oldest-first, enforcing placement, strictly increasing
/// MSNs, and the node's watermark.
pub(super) fn check_buffer(
    cmp: &dyn KeyComparator,
    scan: &mut NodeScan<'_>,
    child: usize,
    buffer: &MessageBuffer,
    bounds: KeyBounds<'_>,
    node_msn: Msn,
) -> ControlFlow<()> {
    let mut last = Msn::ZERO;
    for (pos, message) in buffer.iter().enumerate() {
        scan.tally().counts.messages_checked += 1;
        let placed = check_message(cmp, message.kind, message.msn, &message.key, bounds);
        scan.require(placed.is_ok(), child, VerifyCheck::MessagePlacement, || {
            let fault = placed.err().map(|f| f.to_string()).unwrap_or_default();
            format!(
                "message {pos} ({:?} msn {} key {}): {fault}, bounds {bounds}",
                message.kind, message.msn, message.key
            )
        })?;
        scan.require(message.msn > last, child, VerifyCheck::MessageMsnOrder, || {
            format!("message {pos} msn {} follows msn {last}", message.msn)
        })?;
        scan.require(
            message.msn <= node_msn,
            child,
            VerifyCheck::MessageMsnCeiling,
            || format!("message {pos} msn {} above node msn {node_msn}", message.msn),
        )?;
        last = message.msn;
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ftree::Bytewise;

    #[test]
    fn zero_msn_always_fails() {
        let fault = check_message(
            &Bytewise,
            MessageKind::Optimize,
            Msn::ZERO,
            b"",
            KeyBounds::unbounded(),
        );
        assert_eq!(fault, Err(MessageFault::ZeroMsn));
    }

    #[test]
    fn keyed_message_outside_bounds_fails() {
        let bounds = KeyBounds::new(Some(&b"m"[..]), None);
        for kind in [
            MessageKind::Insert,
            MessageKind::InsertNoOverwrite,
            MessageKind::DeleteAny,
            MessageKind::AbortAny,
            MessageKind::CommitAny,
        ] {
            assert_eq!(
                check_message(&Bytewise, kind, Msn(1), b"c", bounds),
                Err(MessageFault::OutOfBounds),
                "{kind:?}"
            );
            assert_eq!(check_message(&Bytewise, kind, Msn(1), b"q", bounds), Ok(()));
        }
    }

    #[test]
    fn broadcast_kinds_skip_the_range_check() {
        let bounds = KeyBounds::new(Some(&b"m"[..]), Some(&b"p"[..]));
        for kind in [
            MessageKind::None,
            MessageKind::CommitBroadcastAll,
            MessageKind::CommitBroadcastTxn,
            MessageKind::AbortBroadcastTxn,
            MessageKind::Optimize,
            MessageKind::Update,
            MessageKind::UpdateBroadcastAll,
        ] {
            assert_eq!(check_message(&Bytewise, kind, Msn(1), b"a", bounds), Ok(()));
        }
    }
}
