mod run;
mod single_step;

use clap::{Parser, Subcommand};
use env_logger::Env;
use std::num::ParseIntError;
use std::path::PathBuf;

#[derive(Debug, Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run SingleStepTests-format JSON tests, one instruction per test
    SingleStep {
        /// Directory containing <opcode>.json test files
        #[arg(long, short = 'd')]
        dir: PathBuf,
        /// Only run tests for this opcode (hex); defaults to every documented opcode
        #[arg(long, value_parser = parse_hex_u8)]
        opcode: Option<u8>,
    },
    /// Run a flat binary image until the program traps
    Run {
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Address to load the image at (hex)
        #[arg(long, value_parser = parse_hex_u16, default_value = "0x0000")]
        load_address: u16,
        /// Start executing here instead of at the RESET vector (hex)
        #[arg(long, value_parser = parse_hex_u16)]
        start_pc: Option<u16>,
        /// PC the program is expected to trap at on success (hex)
        #[arg(long, value_parser = parse_hex_u16)]
        success_pc: Option<u16>,
        #[arg(long, default_value_t = 100_000_000)]
        max_instructions: u64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::SingleStep { dir, opcode } => single_step::run_tests(&dir, opcode),
        Command::Run { file, load_address, start_pc, success_pc, max_instructions } => {
            run::run_image(&run::RunConfig {
                file,
                load_address,
                start_pc,
                success_pc,
                max_instructions,
            })
        }
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).or_else(|| s.strip_prefix('$')).unwrap_or(s)
}

fn parse_hex_u8(s: &str) -> Result<u8, ParseIntError> {
    u8::from_str_radix(strip_hex_prefix(s), 16)
}

fn parse_hex_u16(s: &str) -> Result<u16, ParseIntError> {
    u16::from_str_radix(strip_hex_prefix(s), 16)
}
