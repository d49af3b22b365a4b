//! Command-line harness for the emulation core.
//!
//! Loads a flat boot image, optionally applies a JSON configuration, runs
//! the machine (CPU alone or CPU + IPU), and prints the run report as
//! JSON. Diagnostics go through `tracing`, filterable with `RUST_LOG`.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use c32_core::sim::load_file;
use c32_core::{Config, System};

#[derive(Parser, Debug)]
#[command(
    name = "c32sim",
    author,
    version,
    about = "Dual-processor mainframe instruction-level emulator",
    long_about = "Loads a flat big-endian boot image and runs it to a halt.\n\nExamples:\n  c32sim boot.img\n  c32sim boot.img --config machine.json\n  c32sim boot.img --ipu --trace"
)]
struct Cli {
    /// Boot image (raw big-endian words).
    image: PathBuf,

    /// Machine configuration (JSON); defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load origin for the image (real byte address, word aligned).
    #[arg(long, default_value_t = 0, value_parser = parse_addr)]
    origin: u32,

    /// Run the companion IPU alongside the CPU.
    #[arg(long)]
    ipu: bool,

    /// Emit per-instruction trace records (also needs RUST_LOG=trace).
    #[arg(long)]
    trace: bool,
}

/// Accepts decimal or 0x-prefixed hexadecimal addresses.
fn parse_addr(text: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = text.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|e| format!("invalid address {text:?}: {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => match Config::from_json(&text) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("error: bad configuration {}: {e}", path.display());
                    process::exit(2);
                }
            },
            Err(e) => {
                eprintln!("error: cannot read {}: {e}", path.display());
                process::exit(2);
            }
        },
        None => Config::default(),
    };
    config.ipu |= cli.ipu;
    config.trace |= cli.trace;

    let system = System::new(config);
    if let Err(e) = load_file(system.memory(), cli.origin, &cli.image) {
        eprintln!("error: {e}");
        process::exit(2);
    }

    let report = system.run();
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: cannot serialize report: {e}");
            process::exit(1);
        }
    }

    let clean = report.cpu.stop == "halted"
        && report
            .ipu
            .as_ref()
            .is_none_or(|ipu| ipu.stop == "halted" || ipu.stop == "stopped by request");
    process::exit(i32::from(!clean));
}
