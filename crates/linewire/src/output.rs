use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
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
struct RecordOutput<'a> {
    sequence: u64,
    size: usize,
    payload: String,
    peer: &'a str,
    timestamp: String,
}

pub fn print_record(record: &[u8], sequence: u64, peer: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = RecordOutput {
                sequence,
                size: record.len(),
                payload: payload_preview(record),
                peer,
                timestamp: now_unix_seconds(),
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
                .set_header(vec!["SEQ", "SIZE", "PEER", "PAYLOAD"])
                .add_row(vec![
                    sequence.to_string(),
                    record.len().to_string(),
                    peer.to_string(),
                    payload_preview(record),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "seq={} size={} peer={} payload={}",
                sequence,
                record.len(),
                peer,
                payload_preview(record)
            );
        }
        OutputFormat::Raw => {
            print_raw(record);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

// Records carry their terminator; previews drop it so structured output
// stays one line per record.
fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.trim_end_matches('\n').to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_trims_only_the_terminator() {
        assert_eq!(payload_preview(b"hello\n"), "hello");
        assert_eq!(payload_preview(b"spaces kept \n"), "spaces kept ");
        assert_eq!(payload_preview(b"\n"), "");
    }

    #[test]
    fn preview_falls_back_for_binary() {
        assert_eq!(payload_preview(&[0xFF, 0xFE, b'\n']), "<binary 3 bytes>");
    }
}
