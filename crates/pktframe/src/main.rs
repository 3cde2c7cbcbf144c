mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, ConfigArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "pktframe", version, about = "Packet framing for noisy byte streams")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        env = "PKTFRAME_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.config, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from(["pktframe", "encode", "--data", "hello"])
            .expect("encode args should parse");
        assert!(matches!(cli.command, Command::Encode(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from(["pktframe", "encode", "--data", "hi", "--hex", "6869"])
            .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn global_config_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pktframe",
            "decode",
            "--max-payload",
            "128",
            "--layout",
            "layout.json",
            "--chunk-size",
            "1",
        ])
        .expect("decode args should parse");

        assert_eq!(cli.config.max_payload, Some(128));
        assert!(cli.config.layout.is_some());
        match cli.command {
            Command::Decode(args) => assert_eq!(args.chunk_size, 1),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_loopback_values() {
        let cli = Cli::try_parse_from(["pktframe", "loopback", "7", "8", "9", "10"])
            .expect("loopback args should parse");
        match cli.command {
            Command::Loopback(args) => assert_eq!(args.values, vec![7, 8, 9, 10]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
