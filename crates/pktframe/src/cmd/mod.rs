use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use pktframe_frame::FrameConfig;

use crate::exit::{io_error, CliError, CliResult, CONFIG, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod loopback;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Frame a payload with the configured header layout.
    Encode(EncodeArgs),
    /// Split a byte stream into packets and print them.
    Decode(DecodeArgs),
    /// Send packed values through an in-memory line and read them back.
    Loopback(LoopbackArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: &ConfigArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, config, format),
        Command::Decode(args) => decode::run(args, config, format),
        Command::Loopback(args) => loopback::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Framing configuration shared by `encode` and `decode`.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// JSON file describing the frame configuration (header layout and limits).
    #[arg(long, value_name = "FILE", global = true)]
    pub layout: Option<PathBuf>,
    /// Maximum payload size in bytes; overrides the layout file.
    #[arg(long, value_name = "BYTES", global = true)]
    pub max_payload: Option<usize>,
}

impl ConfigArgs {
    /// Build and validate the session configuration.
    pub fn load(&self) -> CliResult<FrameConfig> {
        let mut config = match &self.layout {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|err| {
                    io_error(&format!("failed reading {}", path.display()), err)
                })?;
                serde_json::from_str::<FrameConfig>(&text).map_err(|err| {
                    CliError::new(CONFIG, format!("invalid layout {}: {err}", path.display()))
                })?
            }
            None => FrameConfig::default(),
        };
        if let Some(max) = self.max_payload {
            config.max_payload_size = max;
        }
        config
            .validate()
            .map_err(|err| CliError::new(CONFIG, format!("invalid framing configuration: {err}")))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex-encoded payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Write the frame to this file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input file. Reads stdin when omitted.
    #[arg(conflicts_with = "hex")]
    pub input: Option<PathBuf>,
    /// Hex-encoded input stream.
    #[arg(long)]
    pub hex: Option<String>,
    /// Bytes handed to the framer per read.
    #[arg(long, default_value = "4096")]
    pub chunk_size: usize,
    /// Print framing statistics after the packets.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct LoopbackArgs {
    /// Pairs of unsigned 32-bit values; each pair becomes one packet.
    #[arg(value_name = "VALUE", default_values_t = [1u32, 2u32])]
    pub values: Vec<u32>,
    /// Hex-encoded sync header sent before each packet.
    #[arg(long, default_value = "aa55")]
    pub header: String,
    /// How long to wait for the reader before giving up (milliseconds).
    #[arg(long, default_value = "1000")]
    pub timeout_ms: u64,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex text, ignoring whitespace.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}
