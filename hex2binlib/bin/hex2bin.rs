use hex2binlib::{Converter, ImageWindow, ImageWriter, Layout, MapOrder, WindowPolicy};
use regex::Regex;
use std::env;
use std::path::PathBuf;
use std::process;

/// Address literals accepted for `--start`, `--end` and `--pad`
const HEX_LITERAL: &str = r"^0[xX][0-9a-fA-F]+$";

/// Flags followed by a value
const VALUE_FLAGS: [&str; 9] = [
    "-i", "--hexfile", "-o", "--binfile", "-s", "--start", "-e", "--end", "--pad",
];

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");

    println!(" ----------------------------------------------------------------");
    println!("|  Intel HEX to BIN  | v{version} - Copyright (c) 2026 Ihar Hlukhau  |");
    println!(" ----------------------------------------------------------------");
    println!("\nUsage:");
    println!("  hex2bin -i <input.hex> -o <output.bin> [-s 0xSTART] [-e 0xEND] [options]");
    println!("\nOptions:");
    println!("  -h, --help             Show this text");
    println!("  -i, --hexfile <path>   Input Intel HEX file");
    println!("  -o, --binfile <path>   Output binary file");
    println!("  -s, --start <0xADDR>   Window start address (default: 0x0)");
    println!("  -e, --end <0xADDR>     Window end address, exclusive (default: 0x0 = no limit)");
    println!("  --sorted               Sort records by address before writing");
    println!("  --filter               Skip records outside the window instead of stopping");
    println!("  --fill-gaps            Place records at their address, padding the gaps");
    println!("  --pad <0xVAL>          Byte used for padding (default: 0xFF)");
    println!("\nExamples:");
    println!("  hex2bin -i firmware.hex -o firmware.bin");
    println!("  hex2bin -i firmware.hex -o firmware.bin -s 0x0800 -e 0x1000");
    println!("  hex2bin -i firmware.hex -o firmware.bin --sorted --fill-gaps --pad 0x00");
}

/// Parsed command line.
struct Options {
    hex_path: PathBuf,
    bin_path: PathBuf,
    converter: Converter,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || wants_help(&args) {
        print_usage();
        process::exit(0);
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_convert(&options) {
        eprintln!("Error: File access failed! Provide a valid input/output path");
        eprintln!("{e}");
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Options, Box<dyn std::error::Error>> {
    let re = Regex::new(HEX_LITERAL)?;

    // Guard: Check file path arguments given
    let hex_path = get_flag_value(args, &["-i", "--hexfile"]).ok_or("Missing input path")?;
    let bin_path = get_flag_value(args, &["-o", "--binfile"]).ok_or("Missing output path")?;

    // Invalid addresses are reported and the default is kept
    let start = get_flag_value(args, &["-s", "--start"]).map_or(0, |s| {
        parse_hex_literal(&re, &s).unwrap_or_else(|| {
            eprintln!("Invalid Start Address");
            0
        })
    });
    let end = get_flag_value(args, &["-e", "--end"]).map_or(0, |s| {
        parse_hex_literal(&re, &s).unwrap_or_else(|| {
            eprintln!("Invalid End Address");
            0
        })
    });

    let pad_byte = if let Some(pad) = get_flag_value(args, &["--pad"]) {
        parse_hex_literal(&re, &pad)
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| format!("Invalid pad byte: {pad}"))?
    } else {
        hex2binlib::PAD_BYTE
    };

    let mut writer = ImageWriter::new().with_pad_byte(pad_byte);
    if has_flag(args, "--filter") {
        writer = writer.with_policy(WindowPolicy::Filter);
    }
    if has_flag(args, "--fill-gaps") {
        writer = writer.with_layout(Layout::Absolute);
    }

    let order = if has_flag(args, "--sorted") {
        MapOrder::Ascending
    } else {
        MapOrder::Insertion
    };

    Ok(Options {
        hex_path: PathBuf::from(hex_path),
        bin_path: PathBuf::from(bin_path),
        converter: Converter {
            order,
            window: ImageWindow::new(start, end),
            writer,
        },
    })
}

fn run_convert(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let image = options
        .converter
        .convert_file(&options.hex_path, &options.bin_path)?;

    println!("Start Address: {}", format_addr(image.start_address));
    println!("End Address: {}", format_addr(image.end_address));
    println!(
        "Total Number Of Bytes: {}",
        format_with_commas(image.byte_count)
    );
    if let Some(entry) = image.entry_point {
        println!("Entry Point: {entry}");
    }
    Ok(())
}

// =============================== HELPER FUNCTIONS ===============================

/// Parse a `0x`-prefixed hex literal. Returns `None` if the literal is malformed
/// or does not fit into an address.
fn parse_hex_literal(re: &Regex, s: &str) -> Option<usize> {
    let s = s.trim();
    if !re.is_match(s) {
        return None;
    }
    usize::from_str_radix(&s[2..], 16).ok()
}

fn format_addr(addr: usize) -> String {
    let s = format!("{addr:08X}");
    format!("0x{}_{}", &s[..s.len() - 4], &s[s.len() - 4..])
}

fn format_with_commas(n: usize) -> String {
    let s = n.to_string();
    s.as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",")
}

/// Find the value after any of the given flags (e.g., "-s 0x1000")
fn get_flag_value(args: &[String], flags: &[&str]) -> Option<String> {
    args.iter()
        .position(|arg| flags.contains(&arg.as_str()))
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}

/// Check for `-h`/`--help` in flag position, i.e., not as the value of another flag
fn wants_help(args: &[String]) -> bool {
    args.windows(2).any(|pair| {
        (pair[1] == "-h" || pair[1] == "--help") && !VALUE_FLAGS.contains(&pair[0].as_str())
    })
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}
