use std::path::PathBuf;

use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, FAILURE, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        platform_check(),
        tmp_fifo_check(),
        loopback_tcp_check(),
        compiled_features_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput { checks, overall };
    print_doctor(&output, format);

    if has_fail {
        Ok(FAILURE)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("linewire doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<22} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

fn platform_check() -> CheckResult {
    #[cfg(unix)]
    {
        CheckResult {
            name: "platform".to_string(),
            status: CheckStatus::Pass,
            detail: "POSIX FIFOs and sockets available".to_string(),
        }
    }

    #[cfg(not(unix))]
    {
        CheckResult {
            name: "platform".to_string(),
            status: CheckStatus::Fail,
            detail: "linewire targets POSIX platforms only".to_string(),
        }
    }
}

fn tmp_fifo_check() -> CheckResult {
    #[cfg(unix)]
    {
        use linewire_transport::Fifo;
        let dir = PathBuf::from(format!(
            "/tmp/linewire-doctor-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        let _ = std::fs::create_dir_all(&dir);
        let fifo_path = dir.join("doctor.fifo");
        let result = Fifo::create(&fifo_path);
        let outcome = match result {
            Ok(_) => CheckResult {
                name: "tmp_fifo".to_string(),
                status: CheckStatus::Pass,
                detail: "/tmp fifo creation succeeded".to_string(),
            },
            Err(err) => CheckResult {
                name: "tmp_fifo".to_string(),
                status: CheckStatus::Fail,
                detail: format!("/tmp fifo creation failed: {err}"),
            },
        };
        let _ = std::fs::remove_dir_all(&dir);
        outcome
    }

    #[cfg(not(unix))]
    {
        CheckResult {
            name: "tmp_fifo".to_string(),
            status: CheckStatus::Skip,
            detail: "fifo check not applicable on this platform".to_string(),
        }
    }
}

fn loopback_tcp_check() -> CheckResult {
    use linewire_transport::TcpTransport;
    match TcpTransport::bind("127.0.0.1:0") {
        Ok(transport) => CheckResult {
            name: "loopback_tcp".to_string(),
            status: CheckStatus::Pass,
            detail: format!("bound {}", transport.local_addr()),
        },
        Err(err) => CheckResult {
            name: "loopback_tcp".to_string(),
            status: CheckStatus::Fail,
            detail: format!("loopback bind failed: {err}"),
        },
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "relay") {
        features.push("relay");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult {
        name: "compiled_features".to_string(),
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}
