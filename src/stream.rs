use crate::config::{DECODE_BATCH_SIZE, PROGRESS_INTERVAL};
use crate::decoder::EditDecoder;
use crate::geo::GeoLookup;
use crate::models::FeedMessage;
use crate::stats::DecodeStats;
use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// How lines of the input stream are turned into feed messages.
#[derive(Debug, Clone)]
pub enum MessageSource {
    /// Each line is raw feed text from one channel, stamped when it is read.
    Raw { channel: String },
    /// Each line is a JSON `FeedMessage` captured earlier.
    Json,
}

impl MessageSource {
    fn message(&self, line: String) -> Result<FeedMessage, serde_json::Error> {
        match self {
            MessageSource::Raw { channel } => Ok(FeedMessage {
                timestamp: Utc::now(),
                channel: channel.clone(),
                text: line,
            }),
            MessageSource::Json => serde_json::from_str(&line),
        }
    }
}

/// Decodes every line of `reader` and writes one JSON row per line to `writer`.
///
/// Lines that fail to decode are logged and skipped; only I/O errors end the run.
/// Rows come out in input order.
pub fn decode_stream<R, W, G>(
    reader: R,
    mut writer: W,
    decoder: &EditDecoder<G>,
    source: &MessageSource,
) -> Result<DecodeStats>
where
    R: BufRead,
    W: Write,
    G: GeoLookup,
{
    let stats = DecodeStats::new();
    let pb = ProgressBar::new_spinner();
    let mut batch: Vec<(u64, FeedMessage)> = Vec::with_capacity(DECODE_BATCH_SIZE);
    let mut line_no = 0u64;

    for bytes in reader.split(b'\n') {
        let mut bytes = bytes.context("Failed to read feed line")?;
        line_no += 1;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        // Invalid UTF-8 costs only this line.
        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping feed line that is not UTF-8");
                stats.add_lines(1);
                stats.inc_malformed();
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        stats.add_lines(1);

        match source.message(line) {
            Ok(message) => batch.push((line_no, message)),
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping unreadable feed message");
                stats.inc_malformed();
            }
        }

        if batch.len() >= DECODE_BATCH_SIZE {
            flush_batch(&mut batch, &mut writer, decoder, &stats)?;
        }
        if line_no % PROGRESS_INTERVAL == 0 {
            pb.tick();
        }
    }
    flush_batch(&mut batch, &mut writer, decoder, &stats)?;
    writer.flush().context("Failed to flush decoded rows")?;

    pb.finish_and_clear();

    info!(
        lines = stats.lines(),
        rows = stats.rows(),
        malformed = stats.malformed(),
        "Feed decoded"
    );

    Ok(stats)
}

fn flush_batch<W: Write, G: GeoLookup>(
    batch: &mut Vec<(u64, FeedMessage)>,
    writer: &mut W,
    decoder: &EditDecoder<G>,
    stats: &DecodeStats,
) -> Result<()> {
    let decoded: Vec<_> = batch
        .par_iter()
        .map(|(line_no, message)| (*line_no, decoder.decode_message(message)))
        .collect();
    batch.clear();

    for (line_no, result) in decoded {
        match result {
            Ok(row) => {
                stats.record_row(&row);
                serde_json::to_writer(&mut *writer, &row).context("Failed to write row")?;
                writer.write_all(b"\n").context("Failed to write row")?;
            }
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed feed line");
                stats.inc_malformed();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::NoGeoLookup;
    use crate::grammar::tests::feed_line;
    use crate::namespace::NamespaceTable;
    use std::io::Cursor;
    use std::sync::Arc;

    fn decoder() -> EditDecoder<NoGeoLookup> {
        EditDecoder::new(Arc::new(NamespaceTable::default()), NoGeoLookup)
    }

    fn raw() -> MessageSource {
        MessageSource::Raw {
            channel: "#en.wikipedia".to_string(),
        }
    }

    fn output_rows(out: &[u8]) -> Vec<serde_json::Value> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let input = format!(
            "{}\ngarbage\n{}\n",
            feed_line("First", "", "Alice", "(+1)"),
            feed_line("Second", "", "Bob", "(-2)")
        );
        let mut out = Vec::new();
        let stats = decode_stream(Cursor::new(input), &mut out, &decoder(), &raw()).unwrap();

        assert_eq!(stats.lines(), 3);
        assert_eq!(stats.rows(), 2);
        assert_eq!(stats.malformed(), 1);

        let rows = output_rows(&out);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["page"], "First");
        assert_eq!(rows[1]["page"], "Second");
        assert_eq!(rows[1]["language"], "en");
    }

    #[test]
    fn preserves_order_across_batches() {
        let mut input = String::new();
        let total = DECODE_BATCH_SIZE * 2 + 7;
        for i in 0..total {
            input.push_str(&feed_line(&format!("Page {}", i), "", "Alice", "(+1)"));
            input.push('\n');
        }
        let mut out = Vec::new();
        let stats = decode_stream(Cursor::new(input), &mut out, &decoder(), &raw()).unwrap();
        assert_eq!(stats.rows(), total as u64);

        let rows = output_rows(&out);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row["page"], format!("Page_{}", i));
        }
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let mut input = feed_line("First", "", "Alice", "(+1)").into_bytes();
        input.extend_from_slice(b"\n\xff\xfe garbage\r\n");
        input.extend_from_slice(feed_line("Second", "", "Bob", "(-2)").as_bytes());
        input.extend_from_slice(b"\r\n");

        let mut out = Vec::new();
        let stats = decode_stream(Cursor::new(input), &mut out, &decoder(), &raw()).unwrap();

        assert_eq!(stats.lines(), 3);
        assert_eq!(stats.rows(), 2);
        assert_eq!(stats.malformed(), 1);

        let rows = output_rows(&out);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["page"], "First");
        assert_eq!(rows[1]["page"], "Second");
    }

    #[test]
    fn blank_lines_are_ignored() {
        let input = format!("\n\n{}\n\n", feed_line("Rust", "", "Alice", "(+1)"));
        let mut out = Vec::new();
        let stats = decode_stream(Cursor::new(input), &mut out, &decoder(), &raw()).unwrap();
        assert_eq!(stats.lines(), 1);
        assert_eq!(stats.rows(), 1);
        assert_eq!(stats.malformed(), 0);
    }

    #[test]
    fn json_messages_keep_their_timestamp_and_channel() {
        let message = serde_json::json!({
            "timestamp": "2013-05-01T12:00:00Z",
            "channel": "#it.wikipedia",
            "text": feed_line("Roma", "", "Alice", "(+1)"),
        });
        let input = format!("{}\n{{not json}}\n", message);
        let mut out = Vec::new();
        let stats =
            decode_stream(Cursor::new(input), &mut out, &decoder(), &MessageSource::Json).unwrap();

        assert_eq!(stats.rows(), 1);
        assert_eq!(stats.malformed(), 1);
        let rows = output_rows(&out);
        assert_eq!(rows[0]["timestamp"], 1_367_409_600_000i64);
        assert_eq!(rows[0]["language"], "it");
    }
}
