// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! dynany-inspect - view CDR payloads as dynamic value trees.
//!
//! Usage:
//!   dynany-inspect decode --types types.json --type Scene --data scene.cdr
//!   dynany-inspect decode --types types.json --type Scene --data scene.hex --hex
//!   dynany-inspect default --types types.json --type Scene

mod render;
mod types;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dynany::{Any, DynAnyConfig, DynAnyFactory};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::types::TypeRegistry;

#[derive(Parser)]
#[command(name = "dynany-inspect")]
#[command(about = "Inspect CDR payloads through dynamic values")]
#[command(version)]
struct Cli {
    /// Factory configuration (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a payload and print its component tree
    Decode {
        /// JSON type definitions
        #[arg(long, value_name = "FILE")]
        types: PathBuf,

        /// Name of the payload type
        #[arg(long = "type", value_name = "NAME")]
        type_name: String,

        /// Payload file
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Payload file holds hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Print the default value of a type and its encoding
    Default {
        /// JSON type definitions
        #[arg(long, value_name = "FILE")]
        types: PathBuf,

        /// Name of the type
        #[arg(long = "type", value_name = "NAME")]
        type_name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let factory = load_factory(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Decode {
            types,
            type_name,
            data,
            hex,
        } => cmd_decode(&factory, &types, &type_name, &data, hex)?,
        Commands::Default { types, type_name } => cmd_default(&factory, &types, &type_name)?,
    };
    print!("{output}");
    Ok(())
}

fn load_factory(config: Option<&Path>) -> Result<DynAnyFactory> {
    let config = match config {
        Some(path) => DynAnyConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DynAnyConfig::default(),
    };
    tracing::debug!(
        "factory limits: depth {}, collection {}, default sequence length {}",
        config.max_decode_depth,
        config.max_collection_length,
        config.default_sequence_length
    );
    DynAnyFactory::with_config(config).context("invalid configuration")
}

fn cmd_decode(
    factory: &DynAnyFactory,
    types: &Path,
    type_name: &str,
    data: &Path,
    hex: bool,
) -> Result<String> {
    let registry = TypeRegistry::load(types)?;
    let type_desc = registry.get(type_name)?;

    let bytes = if hex {
        let text = std::fs::read_to_string(data)
            .with_context(|| format!("reading {}", data.display()))?;
        render::parse_hex(&text).with_context(|| format!("parsing {}", data.display()))?
    } else {
        std::fs::read(data).with_context(|| format!("reading {}", data.display()))?
    };
    tracing::info!("decoding {} bytes as {}", bytes.len(), type_name);

    let any = Any::from_encoded(type_desc, bytes);
    let value = factory
        .create_from_any(&any, false)
        .with_context(|| format!("payload is not a valid {type_name}"))?;
    let text = render::render(&value)?;
    value.destroy()?;
    Ok(text)
}

fn cmd_default(factory: &DynAnyFactory, types: &Path, type_name: &str) -> Result<String> {
    let registry = TypeRegistry::load(types)?;
    let type_desc = registry.get(type_name)?;

    let value = factory
        .create_from_type(&type_desc)
        .with_context(|| format!("cannot build a value of {type_name}"))?;
    let mut text = render::render(&value)?;
    let any = value.to_any()?;
    value.destroy()?;

    match any.encoded() {
        Some(bytes) => {
            text.push_str(&format!("encoding ({} bytes):\n", bytes.len()));
            text.push_str(&render::hex_dump(bytes));
            text.push('\n');
        }
        None => text.push_str("encoding: none\n"),
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynany::Value;
    use std::io::Write;

    const TYPES: &str = r#"{ "types": [
        { "kind": "struct", "name": "Reading", "fields": [
            { "name": "id", "type": "unsigned long" },
            { "name": "samples", "type": "sequence<double, 4>" } ] }
    ] }"#;

    fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents).expect("write");
        file
    }

    #[test]
    fn test_decode_raw_and_hex_payloads() {
        let types = write_temp(TYPES.as_bytes());
        let registry = TypeRegistry::load(types.path()).expect("types");
        let value = Value::Struct(vec![
            Value::U32(9),
            Value::Sequence(vec![Value::F64(1.5)]),
        ]);
        let any = Any::new(registry.get("Reading").expect("type"), &value).expect("encode");
        let bytes = any.encoded().expect("bytes").to_vec();
        let factory = DynAnyFactory::new();

        let raw = write_temp(&bytes);
        let text = cmd_decode(&factory, types.path(), "Reading", raw.path(), false).expect("raw");
        assert_eq!(text, "Reading\n  id = 9\n  samples [1]\n    [0] = 1.5\n");

        let hex = write_temp(render::hex_dump(&bytes).as_bytes());
        let from_hex =
            cmd_decode(&factory, types.path(), "Reading", hex.path(), true).expect("hex");
        assert_eq!(from_hex, text);
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let types = write_temp(TYPES.as_bytes());
        let data = write_temp(&[0x01, 0x00]);
        let factory = DynAnyFactory::new();
        assert!(cmd_decode(&factory, types.path(), "Reading", data.path(), false).is_err());
    }

    #[test]
    fn test_default_prints_encoding() {
        let types = write_temp(TYPES.as_bytes());
        let factory = DynAnyFactory::new();
        let text = cmd_default(&factory, types.path(), "Reading").expect("default");
        assert!(text.starts_with("Reading\n  id = 0\n  samples [0]\n"));
        assert!(text.contains("encoding ("));
    }

    #[test]
    fn test_config_file_limits_factory() {
        let config = write_temp(b"max_collection_length = 0\n");
        assert!(load_factory(Some(config.path())).is_err());
        let config = write_temp(b"default_sequence_length = 2\n");
        let factory = load_factory(Some(config.path())).expect("factory");
        assert_eq!(factory.config().default_sequence_length, 2);
    }
}
