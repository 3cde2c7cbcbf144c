use std::fs::File;
use std::io::{self, Cursor, Read};

use pktframe_frame::{FrameError, Packet, PacketReader};
use tracing::{debug, warn};

use crate::cmd::{parse_hex, ConfigArgs, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_packets, print_stats, OutputFormat};

pub fn run(args: DecodeArgs, config: &ConfigArgs, format: OutputFormat) -> CliResult<i32> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be greater than zero"));
    }
    let config = config.load()?;
    let input = open_input(&args)?;

    let mut reader = PacketReader::with_config(input, config, Vec::<Packet>::new())
        .map_err(|err| frame_error("invalid framing configuration", err))?
        .with_chunk_size(args.chunk_size);
    let result = reader.run();

    let (_, framer) = reader.into_parts();
    let stats = *framer.stats();
    debug!(?stats, "decode finished");

    print_packets(framer.handler(), format);
    if args.stats {
        print_stats(&stats, format);
    }

    result.map_err(|err| {
        if let FrameError::ConnectionClosed { buffered } = err {
            warn!(buffered, "input ended inside a packet");
        }
        frame_error("decode failed", err)
    })?;
    Ok(SUCCESS)
}

fn open_input(args: &DecodeArgs) -> CliResult<Box<dyn Read>> {
    if let Some(hex) = &args.hex {
        return Ok(Box::new(Cursor::new(parse_hex(hex)?)));
    }
    match &args.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}
