//! Decode, inspect and re-encode TC strings.
//!
//! Usage:
//!   tcfbits decode <STRING> [--schema FILE] [-v]
//!   tcfbits bits <STRING>
//!   tcfbits reencode <STRING> [--schema FILE]
//!
//! `--schema` replaces the bundled TCF definitions with a schema file. `RUST_LOG` controls
//! logging; `-v` raises the default level to `debug`.

use std::path::PathBuf;

use anyhow::{bail, Context};
use tcfbits::dump::format_record;
use tcfbits::{decode_from_base64, Codec, Definitions};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: tcfbits <decode|bits|reencode> <STRING> [--schema FILE] [-v]";

fn init_logging(verbose: bool) {
    let default = if verbose { "tcfbits=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = if let Some(pos) = args.iter().position(|a| a == "--verbose" || a == "-v") {
        args.remove(pos);
        true
    } else {
        false
    };
    let schema_path: Option<PathBuf> = match args.iter().position(|a| a == "--schema" || a.starts_with("--schema=")) {
        Some(pos) => {
            let arg = args.remove(pos);
            match arg.strip_prefix("--schema=") {
                Some(p) => Some(PathBuf::from(p)),
                None if pos < args.len() => Some(PathBuf::from(args.remove(pos))),
                None => bail!("--schema needs a file\n{}", USAGE),
            }
        }
        None => None,
    };
    init_logging(verbose);

    let mut args = args.into_iter();
    let (command, input) = match (args.next(), args.next()) {
        (Some(c), Some(s)) => (c, s),
        _ => bail!(USAGE),
    };

    let codec = match &schema_path {
        Some(path) => Codec::new(
            Definitions::from_path(path).with_context(|| format!("loading schema {}", path.display()))?,
        ),
        None => Codec::try_tcf()?,
    };

    match command.as_str() {
        "decode" => {
            let consent = codec.decode(&input)?;
            println!("version: {}", consent.version);
            println!("{}", format_record(&consent.core));
            for segment in &consent.segments {
                println!();
                println!("segment {}:", segment.id);
                println!("{}", format_record(&segment.fields));
            }
        }
        "bits" => {
            for part in input.trim().split('.') {
                println!("{}", decode_from_base64(part)?);
            }
        }
        "reencode" => {
            let consent = codec.decode(&input)?;
            let encoded = codec.encode(&consent)?;
            println!("{}", encoded);
            if encoded != input.trim() {
                tracing::info!(input = %input.trim(), "re-encoded string differs from input");
            }
        }
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    }
    Ok(())
}
