use bacwire_core::DecodeOptions;
use bacwire_tools::{parse_frames, parse_hex, Format, Frame, Layer};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

/// Decode hex-encoded BACnet/IP frames.
#[derive(Parser, Debug)]
#[command(name = "bacdump")]
struct Args {
    /// Frames as hex strings. Read from --file or stdin when empty.
    frames: Vec<String>,
    /// File with one hex frame per line; `#` starts a comment.
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Layer::Bvlc)]
    layer: Layer,
    #[arg(long, value_enum, default_value_t = Format::Debug)]
    format: Format,
    /// Treat non-zero reserved fields as decode errors.
    #[arg(long)]
    strict: bool,
}

fn load_frames(args: &Args) -> Result<Vec<(usize, Vec<u8>)>, Box<dyn std::error::Error>> {
    if !args.frames.is_empty() {
        return args
            .frames
            .iter()
            .enumerate()
            .map(|(i, text)| Ok((i + 1, parse_hex(i + 1, text)?)))
            .collect();
    }
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    Ok(parse_frames(&text)?)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let frames = match load_frames(&args) {
        Ok(frames) => frames,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let options = if args.strict {
        DecodeOptions::strict()
    } else {
        DecodeOptions::default()
    };

    let mut failures = 0usize;
    for (line, bytes) in &frames {
        match Frame::decode(args.layer, bytes, options) {
            Ok((frame, diagnostics)) => {
                match frame.render(args.format) {
                    Ok(text) => println!("#{line}: {text}"),
                    Err(e) => {
                        eprintln!("#{line}: cannot render: {e}");
                        failures += 1;
                    }
                }
                for diagnostic in &diagnostics {
                    println!("#{line}: warning: {diagnostic}");
                }
            }
            Err(e) => {
                eprintln!("#{line}: decode failed: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        eprintln!("{failures} of {} frames failed", frames.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
