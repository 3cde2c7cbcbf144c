use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pktframe_frame::{FrameConfig, HeaderLayout, Packet, PacketWriter, ReaderThread};
use pktframe_transport::Loopback;
use serde::Serialize;
use tracing::{debug, info};

use crate::cmd::{parse_hex, LoopbackArgs};
use crate::exit::{
    frame_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{print_raw, OutputFormat};

/// `<u32, pad, u32, pad>`, little-endian, no alignment.
const PACKED_SIZE: usize = 10;

#[derive(Serialize)]
struct PairOutput<'a> {
    schema_id: &'a str,
    first: u32,
    second: u32,
}

pub fn run(args: LoopbackArgs, format: OutputFormat) -> CliResult<i32> {
    if args.values.is_empty() || args.values.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "values must come in pairs"));
    }
    let header = parse_hex(&args.header)?;
    if header.is_empty() {
        return Err(CliError::new(USAGE, "--header must not be empty"));
    }

    let config = FrameConfig::with_layout(HeaderLayout::fixed(&header, PACKED_SIZE));
    let line = Loopback::new();
    let tx = line
        .try_clone()
        .map_err(|err| transport_error("failed to open loopback line", err))?;

    let (sender, receiver) = mpsc::channel::<Packet>();
    let reader = ReaderThread::spawn(line, config.clone(), sender)
        .map_err(|err| frame_error("failed to start reader", err))?;

    let mut writer = PacketWriter::with_config(tx, config);
    let pairs: Vec<(u32, u32)> = args
        .values
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    for &(first, second) in &pairs {
        writer
            .send(&pack(first, second))
            .map_err(|err| frame_error("send failed", err))?;
        debug!(first, second, "packet sent");
    }

    let timeout = Duration::from_millis(args.timeout_ms.max(1));
    let mut received = Vec::with_capacity(pairs.len());
    for _ in 0..pairs.len() {
        match receiver.recv_timeout(timeout) {
            Ok(packet) => received.push(unpack(&packet)?),
            Err(RecvTimeoutError::Timeout) => {
                writer.get_ref().close();
                return Err(CliError::new(
                    TIMEOUT,
                    format!("no packet within {}ms", timeout.as_millis()),
                ));
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    writer.get_ref().close();
    let outcome = reader
        .join()
        .map_err(|err| frame_error("reader thread failed", err))?;
    outcome
        .result
        .map_err(|err| frame_error("reader stopped", err))?;
    info!(
        sent = pairs.len(),
        received = received.len(),
        skipped = outcome.stats.bytes_skipped,
        "loopback finished"
    );

    print_pairs(&received, format);

    if received.len() != pairs.len() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("sent {} packets, received {}", pairs.len(), received.len()),
        ));
    }
    Ok(SUCCESS)
}

fn pack(first: u32, second: u32) -> [u8; PACKED_SIZE] {
    let mut out = [0u8; PACKED_SIZE];
    out[0..4].copy_from_slice(&first.to_le_bytes());
    out[5..9].copy_from_slice(&second.to_le_bytes());
    out
}

fn unpack(packet: &Packet) -> CliResult<(u32, u32)> {
    let payload = packet.payload.as_ref();
    let field = |at: usize| -> Option<u32> {
        let bytes: [u8; 4] = payload.get(at..at + 4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    };
    match (payload.len(), field(0), field(5)) {
        (PACKED_SIZE, Some(first), Some(second)) => Ok((first, second)),
        _ => Err(CliError::new(
            DATA_INVALID,
            format!("packet payload is {} bytes, expected {PACKED_SIZE}", payload.len()),
        )),
    }
}

fn print_pairs(pairs: &[(u32, u32)], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for &(first, second) in pairs {
                let out = PairOutput {
                    schema_id: "https://schemas.3leaps.dev/pktframe/cli/v1/loopback-pair.schema.json",
                    first,
                    second,
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIRST", "SECOND"]);
            for &(first, second) in pairs {
                table.add_row(vec![first.to_string(), second.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for &(first, second) in pairs {
                println!("({first}, {second})");
            }
        }
        OutputFormat::Raw => {
            for &(first, second) in pairs {
                print_raw(&pack(first, second));
            }
        }
    }
}
