use rust_ldac::bitreader::BitReader;
use rust_ldac::frame::{BandInfo, FrameHeader};
use rust_ldac::tables::HEADER_BYTES;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "ldac_stream.bin".to_string());
    let limit: usize = match args.next() {
        Some(v) => v.parse()?,
        None => 50,
    };

    let stream = std::fs::read(&path)?;
    println!("{path}: {} bytes", stream.len());

    let mut pos = 0usize;
    let mut frames = 0usize;
    while pos < stream.len() && frames < limit {
        let header = match FrameHeader::peek(&stream[pos..]) {
            Ok(h) => h,
            Err(e) => {
                println!("@{pos:08x} {e}");
                break;
            }
        };

        // Band count of the first block sits right after the header.
        let mut br = BitReader::new(&stream[pos + HEADER_BYTES..]);
        let bands = BandInfo::read(&mut br)
            .map(|b| format!("bands={} units={}", b.bands, b.quant_units))
            .unwrap_or_else(|e| e.to_string());

        println!(
            "#{frames:04} @{pos:08x} rate={} layout={:?} bytes={} status={} {bands}",
            header.sample_rate.hz(),
            header.channel_config,
            header.frame_bytes(),
            header.status,
        );

        pos += header.frame_bytes();
        frames += 1;
    }

    if pos > stream.len() {
        println!("last frame truncated by {} bytes", pos - stream.len());
    }

    Ok(())
}
