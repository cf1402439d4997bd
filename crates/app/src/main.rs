//! Entry point: load one OBJ mesh from the asset directory and report it.
//! Usage: app <file.obj> [--obj-dir=DIR] [--dump[=on|off]]

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use asset::mesh::{MeshData, Vertex};
use corelib::{AssetConfig, OBJ_DIR_ENV};

fn parse_file_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .map(String::as_str)
        .find(|arg| !arg.starts_with("--"))
}

fn parse_obj_dir_arg(args: &[String]) -> Option<PathBuf> {
    // Accept: --obj-dir=DIR, overrides the environment
    args.iter()
        .filter_map(|arg| arg.strip_prefix("--obj-dir="))
        .filter(|dir| !dir.is_empty())
        .last()
        .map(PathBuf::from)
}

fn parse_dump_arg(args: &[String]) -> bool {
    // --dump[=on|off], off by default
    for arg in args {
        if arg == "--dump" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--dump=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn dump_mesh(out: &mut impl Write, mesh: &MeshData) -> io::Result<()> {
    for (i, vertex) in mesh.vertices.iter().enumerate() {
        writeln!(out, "{i:>6}: {vertex}")?;
    }
    for [a, b, c] in mesh.triangles() {
        writeln!(out, "f {a} {b} {c}")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(file) = parse_file_arg(&args) else {
        bail!("Expected an obj file input: app <file.obj> [--obj-dir=DIR] [--dump]");
    };
    let dump = parse_dump_arg(&args);

    let config = match parse_obj_dir_arg(&args) {
        Some(dir) => AssetConfig::new(dir),
        None => AssetConfig::from_env()
            .with_context(|| format!("Pass --obj-dir=DIR or set {OBJ_DIR_ENV}"))?,
    };
    log::info!("Asset directory: {}, dump={}", config.obj_dir.display(), dump);

    let mesh = asset::load_obj_data(&config, file)
        .with_context(|| format!("Failed to load object data from '{file}'"))?;

    let layout = Vertex::LAYOUT;
    for attr in layout.attributes {
        log::debug!(
            "attribute {}: {} x f32 at offset {} (stride {})",
            attr.location,
            attr.components,
            attr.offset,
            layout.stride
        );
    }
    log::info!(
        "Mesh ready for upload: {} vertex bytes, {} index bytes",
        mesh.vertex_bytes().len(),
        mesh.index_bytes().len()
    );

    if dump {
        let stdout = io::stdout();
        dump_mesh(&mut stdout.lock(), &mesh).context("Failed to write mesh dump")?;
    }

    Ok(())
}
