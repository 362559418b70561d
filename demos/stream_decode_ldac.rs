use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rust_ldac::{
    CodecTables, DecodeStatus, Decoder, DecoderFlags, DecoderParams, Flush, GradientCurves,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Minimal argument parsing (no clap dependency).
    // Usage:
    //   cargo run --example stream_decode_ldac -- --input ldac_stream.bin --in-chunk 330

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut curves_path: Option<PathBuf> = None;
    let mut in_chunk: usize = 4096;
    let mut out_chunk: usize = 16 * 1024;
    let mut flags = DecoderFlags::RESYNC;

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
            "--in-chunk" => {
                let v = args.next().context("--in-chunk requires a value")?;
                in_chunk = v.parse::<usize>().context("--in-chunk must be an integer")?;
            }
            "--out-chunk" => {
                let v = args.next().context("--out-chunk requires a value")?;
                out_chunk = v.parse::<usize>().context("--out-chunk must be an integer")?;
            }
            "--strict" => flags.remove(DecoderFlags::RESYNC),
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

    let mut dec = Decoder::with_tables(tables, DecoderParams::new(flags));

    let mut decoded: Vec<i16> = Vec::new();
    let mut out_buf = vec![0i16; out_chunk.max(1)];

    // Feed input in chunks.
    let mut cursor = 0usize;
    while cursor < stream.len() {
        let end = (cursor + in_chunk.max(1)).min(stream.len());
        dec.push_input(&stream[cursor..end]);
        cursor = end;

        loop {
            let (n, status) = dec.decode(&mut out_buf, Flush::NoFlush)?;
            decoded.extend_from_slice(&out_buf[..n]);
            match status {
                DecodeStatus::NeedOutput => continue,
                DecodeStatus::NeedInput => break,
                DecodeStatus::Finished => anyhow::bail!("decoder finished before Flush"),
            }
        }
    }

    // Flush phase: assert no more input will arrive.
    loop {
        let (n, status) = dec.decode(&mut out_buf, Flush::Flush)?;
        decoded.extend_from_slice(&out_buf[..n]);
        match status {
            DecodeStatus::NeedOutput => continue,
            DecodeStatus::NeedInput => anyhow::bail!("decoder requested more input during Flush"),
            DecodeStatus::Finished => break,
        }
    }

    print_summary(&input_path, &stream, &decoded, &dec);

    if let Some(path) = output_path {
        let bytes: Vec<u8> = decoded.iter().flat_map(|s| s.to_le_bytes()).collect();
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write output: {}", path.display()))?;
    }

    Ok(())
}

fn print_summary(input_path: &PathBuf, stream: &[u8], decoded: &[i16], dec: &Decoder) {
    println!("input: {} ({} bytes)", input_path.display(), stream.len());
    if let Some(header) = dec.frame_decoder().last_header() {
        println!("format: {} Hz, {:?}", header.sample_rate.hz(), header.channel_config);
    }
    println!("frames: {}", dec.frames_decoded());
    println!("samples: {}", decoded.len());
    println!("total_in: {}", dec.total_in());
    println!("total_out: {}", dec.total_out());
    println!("bytes skipped: {}", dec.bytes_skipped());
}

fn print_help() {
    println!("stream_decode_ldac (example)");
    println!();
    println!("Usage:");
    println!("  stream_decode_ldac --input <path> [--output <path>] [--gradient-curves <path>]");
    println!("         [--in-chunk <n>] [--out-chunk <n>] [--strict]");
    println!();
    println!("Defaults:");
    println!("  --input ldac_stream.bin");
    println!("  --in-chunk 4096");
    println!("  --out-chunk 16384");
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
