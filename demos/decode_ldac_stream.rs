use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rust_ldac::{CodecTables, DecoderFlags, DecoderParams, GradientCurves, decode_with_tables};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Minimal argument parsing (no clap dependency).
    // Usage:
    //   cargo run --example decode_ldac_stream -- --input ldac_stream.bin --output decoded.pcm

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut curves_path: Option<PathBuf> = None;
    let mut flags = DecoderFlags::empty();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" => {
                let v = args.next().context("--input requires a value")?;
                input_path = Some(PathBuf::from(v));
            }
            "--output" => {
                let v = args.next().context("--output requires a value")?;
                output_path = Some(PathBuf::from(v));
            }
            "--gradient-curves" => {
                let v = args.next().context("--gradient-curves requires a value")?;
                curves_path = Some(PathBuf::from(v));
            }
            "--legacy-gradient" => flags |= DecoderFlags::LEGACY_GRADIENT,
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                anyhow::bail!("unknown argument: {other} (use --help)");
            }
        }
    }

    let input_path = input_path.unwrap_or_else(|| PathBuf::from("ldac_stream.bin"));

    let stream = std::fs::read(&input_path)
        .with_context(|| format!("failed to read stream: {}", input_path.display()))?;
    let tables = load_tables(curves_path.as_deref())?;

    let audio = decode_with_tables(&stream, tables, DecoderParams::new(flags)).context("LDAC decode failed")?;

    println!("input: {} ({} bytes)", input_path.display(), stream.len());
    println!("sample rate: {}", audio.sample_rate);
    println!("channels: {}", audio.channels);
    println!("samples: {}", audio.pcm.len());
    println!("first 16 samples: {:?}", &audio.pcm[..audio.pcm.len().min(16)]);

    if let Some(path) = output_path {
        let bytes: Vec<u8> = audio.pcm.iter().flat_map(|s| s.to_le_bytes()).collect();
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write output: {}", path.display()))?;
        println!("wrote s16le PCM to {}", path.display());
    }

    Ok(())
}

fn print_help() {
    println!("decode_ldac_stream (example)");
    println!();
    println!("Usage:");
    println!("  decode_ldac_stream --input <path> [--output <path>] [--gradient-curves <path>] [--legacy-gradient]");
    println!();
    println!("Defaults:");
    println!("  --input ldac_stream.bin");
}

/// Shared tables, or tables with the encoder's gradient curves read from a 50 x 50 byte file.
fn load_tables(curves_path: Option<&Path>) -> anyhow::Result<Arc<CodecTables>> {
    let Some(path) = curves_path else {
        return Ok(CodecTables::shared());
    };
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read gradient curves: {}", path.display()))?;
    let curves = GradientCurves::from_bytes(&bytes).context("invalid gradient curve table")?;
    Ok(Arc::new(CodecTables::with_gradient_curves(curves)))
}
