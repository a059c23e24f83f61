use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::key::Key;
use crate::types::{Msn, TxnId};

/// Type tag of a buffered mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Placeholder that carries no mutation.
    None,
    /// Insert or overwrite the value at `key`.
    Insert,
    /// Insert the value only when `key` is absent.
    InsertNoOverwrite,
    /// Delete `key` regardless of its current value.
    DeleteAny,
    /// Roll back the innermost transaction's change to `key`.
    AbortAny,
    /// Commit the innermost transaction's change to `key`.
    CommitAny,
    /// Commit every pending change in the subtree.
    CommitBroadcastAll,
    /// Commit every pending change of one transaction in the subtree.
    CommitBroadcastTxn,
    /// Abort every pending change of one transaction in the subtree.
    AbortBroadcastTxn,
    /// Garbage-collect committed history in the subtree.
    Optimize,
    /// Apply an update function to `key`.
    Update,
    /// Apply an update function to every key in the subtree.
    UpdateBroadcastAll,
}

impl MessageKind {
    /// True for the kinds whose key must fall inside the destination child's range.
    ///
    /// `Update` and the broadcast kinds are not range-checked.
    pub fn is_keyed(self) -> bool {
        matches!(
            self,
            MessageKind::Insert
                | MessageKind::InsertNoOverwrite
                | MessageKind::DeleteAny
                | MessageKind::AbortAny
                | MessageKind::CommitAny
        )
    }
}

/// A pending mutation parked in an internal node's child buffer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Mutation type.
    pub kind: MessageKind,
    /// Sequence number assigned when the message entered the tree.
    pub msn: Msn,
    /// Target key (ignored by broadcast kinds).
    pub key: Key,
    /// Opaque payload.
    #[serde(default, with = "hex")]
    pub value: Vec<u8>,
    /// Transaction id stack, outermost first.
    #[serde(default)]
    pub xids: SmallVec<[TxnId; 2]>,
}

impl Message {
    /// Builds a message with an empty transaction stack.
    pub fn new(kind: MessageKind, msn: Msn, key: impl Into<Key>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            msn,
            key: key.into(),
            value: value.into(),
            xids: SmallVec::new(),
        }
    }

    /// Shorthand for an `Insert` message.
    pub fn insert(msn: Msn, key: impl Into<Key>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageKind::Insert, msn, key, value)
    }

    /// Shorthand for a `DeleteAny` message.
    pub fn delete(msn: Msn, key: impl Into<Key>) -> Self {
        Self::new(MessageKind::DeleteAny, msn, key, Vec::<u8>::new())
    }
}

/// FIFO of messages destined for one child, oldest first.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageBuffer {
    messages: VecDeque<Message>,
}

impl MessageBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `message` as the newest entry.
    pub fn enqueue(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    /// Iterates from the oldest enqueued message to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl FromIterator<Message> for MessageBuffer {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Message>> for MessageBuffer {
    fn from(value: Vec<Message>) -> Self {
        value.into_iter().collect()
    }
}
