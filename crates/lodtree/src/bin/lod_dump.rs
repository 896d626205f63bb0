//! Print the decoded trees of a LOD file as text.
//!
//! Run: `cargo run -p lodtree --bin lod_dump -- <file.lod> <offset>... [--positions]`
//!
//! Offsets are tree start positions, in decimal or `0x` hex. Set `RUST_LOG`
//! to see decoder logging.

use std::env;
use std::process;

use lodtree::decode::DecodeOptions;
use lodtree::{Error, LodFile, RenderOptions, render_text};
use tracing_subscriber::EnvFilter;

fn parse_offset(arg: &str) -> Result<usize, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.map_err(|e| format!("invalid offset '{arg}': {e}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let positions = args.iter().any(|a| a == "--positions");
    args.retain(|a| a != "--positions");

    let Some((path, offsets)) = args.split_first() else {
        eprintln!("usage: lod_dump <file.lod> <offset>... [--positions]");
        process::exit(2);
    };
    let offsets = offsets
        .iter()
        .map(|a| parse_offset(a))
        .collect::<Result<Vec<_>, _>>()?;

    let file =
        LodFile::open(path)?.with_options(DecodeOptions::default().with_annotations(positions));
    let options = RenderOptions {
        positions,
        ..RenderOptions::default()
    };

    let mut failed = false;
    for (offset, result) in offsets.iter().zip(file.trees(&offsets)) {
        println!("=== Tree @{offset} ===");
        match result {
            Ok(tree) => print!("{}", render_text(&tree, &options)),
            Err(Error::Decode(err)) => {
                print!("{}", render_text(&err.partial, &options));
                println!("error: {err}");
                failed = true;
            }
            Err(err) => return Err(err.into()),
        }
        println!();
    }

    if failed {
        process::exit(1);
    }
    Ok(())
}
