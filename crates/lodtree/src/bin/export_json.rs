//! Export a JSON summary of decoded trees for cross-implementation checks.
//!
//! Run: `cargo run -p lodtree --features test-tools --bin export_json -- <file.lod> <offset>...`
//!
//! Writes one JSON array to stdout with an entry per requested tree: its
//! anchor, tags and one record per node with kind, position and links.

use std::env;
use std::process;

use lodtree::decode::{Node, NodeId, NodeKind, Tree};
use lodtree::{Error, LodFile};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

fn node_json(tree: &Tree, index: usize, node: &Node) -> Value {
    let link = |id: Option<NodeId>| id.map(|id| id.0);
    json!({
        "id": index,
        "kind": node.kind().name(),
        "tag": node.kind().tag(),
        "position": node.position,
        "vft": node.vft,
        "sibling_raw": node.sibling.raw,
        "sibling": link(node.links.sibling),
        "subtree": link(node.links.subtree),
        "children": node.links.children.iter().map(|id| id.0).collect::<Vec<_>>(),
        "front": link(node.links.front),
        "back": link(node.links.back),
        "primitives": node.body.primitives().map(|p| json!({
            "code": p.code,
            "position": p.position,
            "vertices": p.vertices,
        })).collect::<Vec<_>>(),
        "annotations": tree.annotations_for(NodeId(index as u32)).count(),
    })
}

fn tree_json(offset: usize, tree: &Tree, error: Option<String>) -> Value {
    let kinds: serde_json::Map<String, Value> = NodeKind::ALL
        .iter()
        .filter_map(|&kind| {
            let count = tree.count_kind(kind);
            (count > 0).then(|| (kind.name().to_string(), json!(count)))
        })
        .collect();
    json!({
        "start_offset": offset,
        "anchor": tree.anchor(),
        "tags": tree.tags(),
        "node_count": tree.len(),
        "fully_consumed": tree.is_fully_consumed(),
        "kinds": kinds,
        "nodes": tree
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| node_json(tree, i, node))
            .collect::<Vec<_>>(),
        "diagnostics": tree
            .diagnostics()
            .iter()
            .map(|d| d.error.to_string())
            .collect::<Vec<_>>(),
        "error": error,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((path, offsets)) = args.split_first() else {
        eprintln!("usage: export_json <file.lod> <offset>...");
        process::exit(2);
    };
    let offsets = offsets
        .iter()
        .map(|a| a.parse::<usize>())
        .collect::<Result<Vec<_>, _>>()?;

    let file = LodFile::open(path)?;
    let mut out = Vec::new();
    for (&offset, result) in offsets.iter().zip(file.trees(&offsets)) {
        match result {
            Ok(tree) => out.push(tree_json(offset, &tree, None)),
            Err(Error::Decode(err)) => {
                out.push(tree_json(offset, &err.partial, Some(err.error.to_string())));
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!("{}", serde_json::to_string_pretty(&Value::Array(out))?);
    Ok(())
}
