use std::fs;

use pktframe_frame::PacketWriter;
use tracing::info;

use crate::cmd::{parse_hex, ConfigArgs, EncodeArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, config: &ConfigArgs, format: OutputFormat) -> CliResult<i32> {
    let config = config.load()?;
    let payload = resolve_payload(&args)?;

    let mut writer = PacketWriter::with_config(Vec::new(), config);
    writer
        .send(&payload)
        .map_err(|err| frame_error("encode failed", err))?;
    let frame = writer.into_inner();

    match &args.out {
        Some(path) => {
            fs::write(path, &frame).map_err(|err| {
                io_error(&format!("failed writing {}", path.display()), err)
            })?;
            info!(
                path = %path.display(),
                payload = payload.len(),
                frame = frame.len(),
                "frame written"
            );
        }
        None => print_encoded(payload.len(), &frame, format),
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> EncodeArgs {
        EncodeArgs {
            data: None,
            hex: None,
            file: None,
            out: None,
        }
    }

    #[test]
    fn payload_from_data_and_hex() {
        let data = EncodeArgs {
            data: Some("hi".to_string()),
            ..args()
        };
        assert_eq!(resolve_payload(&data).unwrap(), b"hi");

        let hex = EncodeArgs {
            hex: Some("0102".to_string()),
            ..args()
        };
        assert_eq!(resolve_payload(&hex).unwrap(), vec![1, 2]);
    }

    #[test]
    fn empty_payload_when_nothing_given() {
        assert!(resolve_payload(&args()).unwrap().is_empty());
    }
}
