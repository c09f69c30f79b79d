mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "linewire", version, about = "Line-oriented streaming CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

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
    fn parses_double_subcommand() {
        let cli = Cli::try_parse_from(["linewire", "double", "--capacity", "256"])
            .expect("double args should parse");
        assert!(matches!(cli.command, Command::Double(_)));
    }

    #[test]
    fn parses_serve_subcommand_with_mode() {
        let cli = Cli::try_parse_from(["linewire", "serve", "7100", "--mode", "echo"])
            .expect("serve args should parse");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.port, 7100);
        assert!(matches!(args.mode, cmd::ServeMode::Echo));
    }

    #[test]
    fn parses_relay_subcommand() {
        let cli = Cli::try_parse_from(["linewire", "relay", "127.0.0.1", "7100", "--udp"])
            .expect("relay args should parse");
        let Command::Relay(args) = cli.command else {
            panic!("expected relay command");
        };
        assert_eq!(args.host, "127.0.0.1");
        assert!(args.udp);
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "linewire",
            "send",
            "127.0.0.1",
            "7100",
            "--data",
            "hello",
            "--file",
            "/tmp/payload",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
