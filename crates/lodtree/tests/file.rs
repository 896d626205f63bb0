use std::sync::Arc;

use lodtree::decode::{DecodeError, DecodeOptions, NodeKind};
use lodtree::{Error, LodFile, MemoryCache, RenderOptions, render_text};

fn words(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Two trees: a Root with a Splitter subtree whose front branch is a
/// Generic, then a tree with an unknown tag.
fn sample() -> (Vec<u8>, usize) {
    let mut data = words(&[
        3, 2, 6, 0, // header, root at 16
        0, -1, -1, 0, 0, -1, -1, 0, 48, -1, 0, 0, // root, subtree -> 64
        0, -1, 0, 0, 0x3f80_0000, 0, 88, -1, // splitter, front -> 104
        0, -1, // generic at 96 is skipped
        0, -1, // front branch at 104
    ]);
    let second = data.len();
    data.extend(words(&[1, 77, 0, -1]));
    (data, second)
}

#[test]
fn decodes_each_tree_independently() {
    let (data, second) = sample();
    let file = LodFile::from_bytes(data);

    let results = file.trees(&[0, second]);

    let first = results[0].as_ref().unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first.count_kind(NodeKind::Splitter), 1);
    assert_eq!(first.nodes()[2].position, 104);

    let Err(Error::Decode(err)) = &results[1] else {
        panic!("second tree should fail");
    };
    assert!(matches!(
        err.error,
        DecodeError::UnknownNodeKind { tag: 77, .. }
    ));
    assert!(results[1].as_ref().unwrap_err().partial_tree().is_some());
}

#[test]
fn memory_cache_reuses_decoded_trees() {
    let (data, _) = sample();
    let file = LodFile::from_bytes(data).with_cache(MemoryCache::new());

    let first = file.tree(0).unwrap();
    let again = file.tree(0).unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(file.cache().len(), 1);
}

#[test]
fn failed_trees_are_not_cached() {
    let (data, second) = sample();
    let file = LodFile::from_bytes(data).with_cache(MemoryCache::new());

    assert!(file.tree(second).is_err());
    assert!(file.cache().is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let err = LodFile::open("does/not/exist.lod").unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("does/not/exist.lod"));
    assert!(err.partial_tree().is_none());
}

#[test]
fn rendering_follows_the_tree_shape() {
    let (data, _) = sample();
    let file = LodFile::from_bytes(data)
        .with_options(DecodeOptions::default().with_annotations(true));
    let tree = file.tree(0).unwrap();

    let text = render_text(
        &tree,
        &RenderOptions {
            positions: true,
            ..RenderOptions::default()
        },
    );

    let headers: Vec<&str> = text
        .lines()
        .filter(|line| line.trim_start().starts_with("***"))
        .collect();
    assert_eq!(
        headers,
        vec![
            "***Root*** #0 @16",
            "  ***Splitter*** #1 @64",
            "    ***Generic*** #2 @104",
        ]
    );
    assert!(text.contains("Front: 88 -> 104"));
    assert!(text.contains("Fields: vft@64 sibling@68"));
}
