//! Command-line dump of PICT pictures.
//!
//! Prints the header, warnings and opcodes of one or more pictures. Inputs
//! can be PICT files or DeRez output containing `data 'PICT'` resources.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example pict_dump -- picture.pict
//! cargo run --example pict_dump -- --derez resources.r --opcodes
//! RUST_LOG=debug cargo run --example pict_dump -- *.pict
//! ```
//!
//! With the `imgconv` feature, `--png-dir` writes every decoded raster as a
//! PNG file.

use clap::Parser;
use quickdraw::{HeaderOffset, Opcode, ParseOptions, Picture, extract_resources, parse_many};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Dump the contents of QuickDraw pictures
#[derive(Parser, Debug)]
#[command(name = "pict_dump", version)]
struct Args {
    /// Input files
    #[arg(value_name = "INPUT", required = true)]
    input: Vec<PathBuf>,

    /// Inputs are DeRez text; dump every PICT resource in them
    #[arg(long)]
    derez: bool,

    /// Byte offset of the picture header (detected when omitted)
    #[arg(long)]
    offset: Option<usize>,

    /// Keep QuickTime payloads encoded instead of decoding them
    #[arg(long)]
    no_decode: bool,

    /// List every opcode
    #[arg(long)]
    opcodes: bool,

    /// Write decoded rasters as PNG files into this directory
    #[cfg(feature = "imgconv")]
    #[arg(long, value_name = "DIR")]
    png_dir: Option<PathBuf>,
}

fn load_inputs(args: &Args) -> Result<Vec<(String, Vec<u8>)>, Box<dyn std::error::Error>> {
    let mut inputs = Vec::new();
    for path in &args.input {
        if args.derez {
            let text = fs::read_to_string(path)?;
            for resource in extract_resources(&text)?.into_iter().filter(|r| r.is_pict()) {
                inputs.push((resource.file_name(), resource.to_pict_file()));
            }
        } else {
            inputs.push((path.display().to_string(), fs::read(path)?));
        }
    }
    Ok(inputs)
}

fn print_picture(picture: &Picture, list_opcodes: bool) {
    println!("{}", picture.display_name());
    println!(
        "  version {:?}, frame {}x{}, {} dpi",
        picture.version,
        picture.width(),
        picture.height(),
        picture.resolution.0.rounded()
    );
    println!("  {} opcodes, {} rasters", picture.opcodes.len(), picture.rasters().count());
    for warning in &picture.warnings {
        println!("  warning: {:?}", warning);
    }
    if let Some(error) = &picture.error {
        println!("  stopped: {}", error);
    }
    if list_opcodes {
        for opcode in &picture.opcodes {
            match opcode {
                Opcode::Bits(bits) => println!(
                    "    {:?} {:?} {}x{}x{}",
                    opcode.category(),
                    bits.kind,
                    bits.image.width(),
                    bits.image.height(),
                    bits.image.metadata.pixel_size
                ),
                Opcode::QuickTime(qt) => println!("    {:?} QuickTime {:?}", opcode.category(), qt.image().map(|i| i.error())),
                other => println!("    {:?} {:?}", other.category(), other),
            }
        }
    }
}

#[cfg(feature = "imgconv")]
fn write_rasters(picture: &Picture, dir: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let stem = picture.display_name().replace(['/', '\\'], "_");
    for (index, raster) in picture.rasters().enumerate() {
        let path = dir.join(format!("{}-{}.png", stem, index));
        fs::write(&path, raster.convert_to_png()?)?;
        println!("  wrote {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::init();

    let inputs = match load_inputs(&args) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let mut options = ParseOptions::default().with_decode_images(!args.no_decode);
    if let Some(offset) = args.offset {
        options = options.with_header_offset(HeaderOffset::Explicit(offset));
    }
    let data: Vec<&[u8]> = inputs.iter().map(|(_, bytes)| bytes.as_slice()).collect();
    let results = parse_many(&data, &options);

    let mut failed = false;
    for ((name, _), result) in inputs.iter().zip(results) {
        match result {
            Ok(mut picture) => {
                picture.name = Some(name.clone());
                print_picture(&picture, args.opcodes);
                #[cfg(feature = "imgconv")]
                if let Some(dir) = &args.png_dir {
                    if let Err(e) = write_rasters(&picture, dir) {
                        eprintln!("{}: {}", name, e);
                        failed = true;
                    }
                }
            },
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failed = true;
            },
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
