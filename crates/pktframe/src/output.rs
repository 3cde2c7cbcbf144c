use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pktframe_frame::{FramerStats, Packet};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    schema_id: &'a str,
    index: usize,
    header: String,
    payload_size: usize,
    payload: String,
    payload_hex: String,
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    schema_id: &'a str,
    #[serde(flatten)]
    stats: &'a FramerStats,
    resyncs: u64,
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    schema_id: &'a str,
    payload_size: usize,
    frame_size: usize,
    frame: String,
}

/// Print every packet of a decode run.
///
/// Tables are rendered once for the whole run; the other formats print one
/// line (or one payload) per packet.
pub fn print_packets(packets: &[Packet], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "HEADER", "SIZE", "PAYLOAD"]);
            for (index, packet) in packets.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    hex::encode(&packet.header),
                    packet.payload.len().to_string(),
                    payload_preview(&packet.payload),
                ]);
            }
            println!("{table}");
        }
        _ => {
            for (index, packet) in packets.iter().enumerate() {
                print_packet(index, packet, format);
            }
        }
    }
}

pub fn print_packet(index: usize, packet: &Packet, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                schema_id: "https://schemas.3leaps.dev/pktframe/cli/v1/packet.schema.json",
                index,
                header: hex::encode(&packet.header),
                payload_size: packet.payload.len(),
                payload: payload_preview(&packet.payload),
                payload_hex: hex::encode(&packet.payload),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => print_packets(std::slice::from_ref(packet), format),
        OutputFormat::Pretty => {
            println!(
                "packet={} header={} size={} payload={}",
                index,
                hex::encode(&packet.header),
                packet.payload.len(),
                payload_preview(&packet.payload)
            );
        }
        OutputFormat::Raw => print_raw(&packet.payload),
    }
}

/// Stats go to stderr for `raw` so they never mix with payload bytes.
pub fn print_stats(stats: &FramerStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = StatsOutput {
                schema_id: "https://schemas.3leaps.dev/pktframe/cli/v1/stats.schema.json",
                stats,
                resyncs: stats.resyncs(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"]);
            for (name, value) in stats_rows(stats) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line: Vec<String> = stats_rows(stats)
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("{}", line.join(" "));
        }
        OutputFormat::Raw => {
            for (name, value) in stats_rows(stats) {
                eprintln!("{name}: {value}");
            }
        }
    }
}

pub fn print_encoded(payload_size: usize, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                schema_id: "https://schemas.3leaps.dev/pktframe/cli/v1/encoded.schema.json",
                payload_size,
                frame_size: frame.len(),
                frame: hex::encode(frame),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PAYLOAD", "FRAME", "BYTES"])
                .add_row(vec![
                    payload_size.to_string(),
                    frame.len().to_string(),
                    hex::encode(frame),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", hex::encode(frame)),
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn stats_rows(stats: &FramerStats) -> [(&'static str, u64); 7] {
    [
        ("bytes_received", stats.bytes_received),
        ("packets_delivered", stats.packets_delivered),
        ("bytes_skipped", stats.bytes_skipped),
        ("sync_mismatches", stats.sync_mismatches),
        ("oversized_lengths", stats.oversized_lengths),
        ("checksum_failures", stats.checksum_failures),
        ("resyncs", stats.resyncs()),
    ]
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
