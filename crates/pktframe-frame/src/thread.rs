use std::io::Read;
use std::thread::JoinHandle;

use tracing::{info, warn};

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::machine::{FramerStats, PacketHandler};
use crate::reader::PacketReader;

/// What a finished reader thread hands back.
#[derive(Debug)]
pub struct ReaderOutcome<H> {
    /// The session's handler, with whatever it accumulated.
    pub handler: H,
    /// Final session counters.
    pub stats: FramerStats,
    /// How the read loop ended.
    pub result: Result<()>,
}

/// One dedicated thread reading a stream into one session.
///
/// The thread is the session's only feeder, so the session needs no locks.
/// It exits at end of stream or on the first I/O error; close the transport
/// to stop it.
pub struct ReaderThread<H> {
    handle: JoinHandle<ReaderOutcome<H>>,
}

impl<H: PacketHandler + Send + 'static> ReaderThread<H> {
    /// Start reading `inner` on a new thread.
    ///
    /// Configuration errors are reported here, before the thread starts.
    pub fn spawn<T>(inner: T, config: FrameConfig, handler: H) -> Result<Self>
    where
        T: Read + Send + 'static,
    {
        let mut reader = PacketReader::with_config(inner, config, handler)?;

        let handle = std::thread::Builder::new()
            .name("pktframe-reader".to_string())
            .spawn(move || {
                info!("reader thread started");
                let result = reader.run();
                match &result {
                    Ok(()) => info!("reader thread reached end of stream"),
                    Err(err) => warn!(error = %err, "reader thread stopped"),
                }
                let (_, framer) = reader.into_parts();
                let stats = *framer.stats();
                ReaderOutcome {
                    handler: framer.into_handler(),
                    stats,
                    result,
                }
            })
            .map_err(|err| FrameError::Thread(format!("could not spawn reader: {err}")))?;

        Ok(Self { handle })
    }

    /// Whether the read loop has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the read loop to end.
    pub fn join(self) -> Result<ReaderOutcome<H>> {
        self.handle
            .join()
            .map_err(|_| FrameError::Thread("reader thread panicked".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::mpsc;
    use std::time::Duration;

    use bytes::BytesMut;
    use pktframe_transport::Loopback;

    use super::*;
    use crate::codec::{encode_packet, Packet, DEFAULT_MAX_PAYLOAD};
    use crate::layout::HeaderLayout;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_packet(&HeaderLayout::default(), payload, DEFAULT_MAX_PAYLOAD, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn delivers_over_loopback_and_joins() {
        let line = Loopback::new();
        let mut tx = line.try_clone().unwrap();

        let thread =
            ReaderThread::spawn(line, FrameConfig::default(), Vec::<Packet>::new()).unwrap();

        tx.write_all(&frame(b"first")).unwrap();
        tx.write_all(&frame(b"second")).unwrap();
        tx.close();

        let outcome = thread.join().unwrap();
        outcome.result.unwrap();
        assert_eq!(outcome.handler.len(), 2);
        assert_eq!(outcome.handler[1].payload.as_ref(), b"second");
        assert_eq!(outcome.stats.packets_delivered, 2);
    }

    #[test]
    fn hands_packets_off_through_channel() {
        let line = Loopback::new();
        let mut tx = line.try_clone().unwrap();
        let (sender, receiver) = mpsc::channel::<Packet>();

        let thread = ReaderThread::spawn(line, FrameConfig::default(), sender).unwrap();

        let wire = frame(b"streamed");
        tx.write_all(&wire[..2]).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        tx.write_all(&wire[2..]).unwrap();

        let packet = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(packet.payload.as_ref(), b"streamed");

        tx.close();
        assert!(thread.join().unwrap().result.is_ok());
    }

    #[test]
    fn truncated_stream_reported_on_join() {
        let line = Loopback::new();
        let mut tx = line.try_clone().unwrap();
        let thread =
            ReaderThread::spawn(line, FrameConfig::default(), Vec::<Packet>::new()).unwrap();

        let wire = frame(b"cut short");
        tx.write_all(&wire[..wire.len() - 1]).unwrap();
        tx.close();

        let outcome = thread.join().unwrap();
        assert!(outcome.handler.is_empty());
        assert!(matches!(
            outcome.result,
            Err(FrameError::ConnectionClosed { buffered: 8 })
        ));
    }

    #[test]
    fn handler_panic_reported_on_join() {
        let line = Loopback::new();
        let mut tx = line.try_clone().unwrap();
        let handler = crate::machine::handler_fn(|_packet: Packet| panic!("handler failed"));
        let thread = ReaderThread::spawn(line, FrameConfig::default(), handler).unwrap();

        tx.write_all(&frame(b"boom")).unwrap();
        tx.close();

        assert!(matches!(thread.join(), Err(FrameError::Thread(_))));
    }

    #[test]
    fn config_error_before_spawn() {
        let cfg = FrameConfig {
            max_payload_size: 0,
            ..FrameConfig::default()
        };
        let result = ReaderThread::spawn(Loopback::new(), cfg, Vec::<Packet>::new());
        assert!(matches!(result, Err(FrameError::Config(_))));
    }
}
