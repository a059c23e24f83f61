#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ftree::{
    admin::{
        load_image, open_tree, stats, verify, verify_tree, AdminError, AdminOpenOptions,
        VerifyCheck, VerifyOptions, VerifyStatus,
    },
    primitives::cache::CacheOptions,
    storage::ftree::{Basement, ChildBuffer, Key, Message, NodeBody, TreeBuilder},
    types::{BlockNum, Msn},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

struct Layout {
    builder: TreeBuilder,
    root: BlockNum,
    leaves: Vec<(BlockNum, Vec<Vec<u8>>)>,
}

/// Three-level tree over `n_keys` random keys with messages buffered at both
/// internal levels.
fn random_tree(seed: u64, n_keys: usize) -> Layout {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut keys = BTreeSet::new();
    while keys.len() < n_keys {
        let len = rng.gen_range(1..=8);
        let key: Vec<u8> = (0..len).map(|_| rng.gen::<u8>()).collect();
        keys.insert(key);
    }
    let keys: Vec<Vec<u8>> = keys.into_iter().collect();

    let mut builder = TreeBuilder::new();
    let mut leaves = Vec::new();
    for chunk in keys.chunks(8) {
        let block = builder.leaf_keys(Msn(1), chunk.iter().cloned());
        leaves.push((block, chunk.to_vec()));
    }

    let mut mids = Vec::new();
    for group in leaves.chunks(6) {
        let mut msn = 2;
        let mut children = Vec::new();
        for (block, leaf_keys) in group {
            let mut buffer = Vec::new();
            for _ in 0..rng.gen_range(0..=3) {
                let key = leaf_keys[rng.gen_range(0..leaf_keys.len())].clone();
                buffer.push(Message::insert(Msn(msn), key, b"v".to_vec()));
                msn += 1;
            }
            children.push(ChildBuffer::with_buffer(*block, buffer));
        }
        let pivots = last_keys(group);
        let block = builder.internal(1, Msn(50), pivots, children);
        let first = group[0].1[0].clone();
        let last = group[group.len() - 1].1.last().cloned().unwrap_or_default();
        mids.push((block, vec![first, last]));
    }

    let mut msn = 51;
    let mut children = Vec::new();
    for (block, span) in &mids {
        let mut buffer = Vec::new();
        for key in span {
            buffer.push(Message::delete(Msn(msn), key.clone()));
            msn += 1;
        }
        children.push(ChildBuffer::with_buffer(*block, buffer));
    }
    let pivots = last_keys(&mids);
    let root = builder.internal(2, Msn(200), pivots, children);

    Layout {
        builder,
        root,
        leaves,
    }
}

fn last_keys(group: &[(BlockNum, Vec<Vec<u8>>)]) -> Vec<Key> {
    group[..group.len() - 1]
        .iter()
        .map(|(_, keys)| Key::new(keys[keys.len() - 1].clone()))
        .collect()
}

fn write_image(dir: &TempDir, name: &str, builder: TreeBuilder, root: BlockNum) -> PathBuf {
    let path = dir.path().join(format!("{name}.json"));
    let file = File::create(&path).expect("create image");
    builder.into_image(root).write_to(file).expect("write image");
    path
}

fn keep_going() -> VerifyOptions {
    VerifyOptions {
        keep_going: true,
        ..VerifyOptions::default()
    }
}

#[test]
fn random_tree_round_trips_and_verifies_clean() {
    let dir = TempDir::new().expect("tempdir");
    let layout = random_tree(7, 500);
    let n_leaves = layout.leaves.len() as u64;
    let path = write_image(&dir, "clean", layout.builder, layout.root);

    let tree = open_tree(&path, &AdminOpenOptions::default()).expect("open");
    let report = verify(&tree, None, &keep_going()).expect("verify");
    assert_eq!(report.status, VerifyStatus::Clean, "{:?}", report.findings);
    assert_eq!(report.counts.leaf_entries_checked, 500);
    assert_eq!(report.counts.basements_checked, n_leaves);
    assert!(report.counts.messages_checked > 0);
    assert!(report.pins_balanced());

    let summary = stats(&tree).expect("stats");
    assert_eq!(summary.root_height, 2);
    assert_eq!(summary.nodes_per_height.get(&0), Some(&n_leaves));
    assert_eq!(summary.leaf_entries, 500);
}

#[test]
fn corrupted_leaf_is_localized() {
    let dir = TempDir::new().expect("tempdir");
    let mut layout = random_tree(11, 300);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let (victim, keys) = layout.leaves[rng.gen_range(0..layout.leaves.len())].clone();
    let mut swapped = keys.clone();
    swapped.swap(0, 1);
    layout.builder.node_mut(victim).expect("victim leaf").body = NodeBody::Leaf {
        basements: vec![Basement::from_keys(swapped)],
    };
    let path = write_image(&dir, "swapped", layout.builder, layout.root);

    let tree = open_tree(&path, &AdminOpenOptions::default()).expect("open");
    let report = verify(&tree, None, &keep_going()).expect("verify");
    assert_eq!(report.status, VerifyStatus::NeedsRepair);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].block, victim);
    assert_eq!(report.findings[0].check, VerifyCheck::LeafOrder);
    assert_eq!(tree.cache().count_pinned(), 0);
}

#[test]
fn small_cache_gives_the_same_answer() {
    let dir = TempDir::new().expect("tempdir");
    let layout = random_tree(23, 200);
    let path = write_image(&dir, "small", layout.builder, layout.root);

    let opts = AdminOpenOptions {
        cache: CacheOptions { capacity: 4 },
        ..AdminOpenOptions::default()
    };
    let tree = open_tree(&path, &opts).expect("open");
    let report = verify_tree(&tree).expect("verify");
    assert!(report.is_clean());
    assert!(tree.cache().stats().evictions > 0);
}

#[test]
fn missing_image_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("absent.json");
    match open_tree(&path, &AdminOpenOptions::default()) {
        Err(AdminError::MissingImage(reported)) => assert_eq!(reported, path),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("opened a missing image"),
    }
}

#[test]
fn malformed_image_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("garbage.json");
    fs::write(&path, "{\"file_id\": 1, \"root\": ").expect("write");
    assert!(matches!(load_image(&path), Err(AdminError::Image(_))));
}

#[test]
fn dangling_child_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let mut builder = TreeBuilder::new();
    let leaf = builder.leaf_keys(Msn(1), ["a"]);
    let root = builder.internal(
        1,
        Msn(2),
        vec!["m".into()],
        vec![ChildBuffer::empty(leaf), ChildBuffer::empty(BlockNum(404))],
    );
    let path = write_image(&dir, "dangling", builder, root);
    let tree = open_tree(Path::new(&path), &AdminOpenOptions::default()).expect("open");
    let err = verify_tree(&tree).expect_err("dangling child");
    assert!(err.is_fatal(), "{err}");
    assert_eq!(tree.cache().count_pinned(), 0);
}
