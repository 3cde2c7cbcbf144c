//! Noisy line example: a framer recovering from line noise and corruption.
//!
//! Run with:
//!   cargo run --example noisy-line

use std::error::Error;
use std::io::{Read, Write};
use std::thread;

use pktframe::frame::{handler_fn, FrameConfig, Framer, Packet, PacketWriter};
use pktframe::transport::Loopback;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = FrameConfig {
        max_payload_size: 256,
        ..FrameConfig::default()
    };

    let line = Loopback::new();
    let mut tx = line.try_clone()?;

    let sender = thread::spawn(move || -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut writer = PacketWriter::with_config(tx.try_clone()?, FrameConfig::default());

        // Garbage before the first packet
        tx.write_all(&[0xFF, 0xFE, 0x13])?;
        writer.send(b"first")?;

        // A packet whose last payload byte is flipped in transit
        let mut corrupt = Vec::new();
        PacketWriter::new(&mut corrupt).send(b"corrupt")?;
        if let Some(last) = corrupt.last_mut() {
            *last ^= 0x40;
        }
        writer.write_raw(&corrupt)?;

        writer.send(b"second")?;
        tx.close();
        Ok(())
    });

    let mut framer = Framer::new(
        config,
        handler_fn(|packet: Packet| {
            eprintln!(
                "[rx] {} bytes: {}",
                packet.payload.len(),
                String::from_utf8_lossy(&packet.payload)
            );
        }),
    )?;

    let mut rx = line;
    let mut chunk = [0u8; 4];
    loop {
        let n = rx.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        framer.on_bytes_received(&chunk[..n]);
    }

    sender.join().map_err(|_| "sender thread panicked")??;

    let stats = framer.stats();
    eprintln!(
        "[rx] delivered={} skipped={} checksum_failures={}",
        stats.packets_delivered, stats.bytes_skipped, stats.checksum_failures
    );
    Ok(())
}
