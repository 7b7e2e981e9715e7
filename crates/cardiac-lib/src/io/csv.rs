use crate::signal::{SegmentLabel, Signal};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::debug;
use serde::Serialize;
use std::{io::Write, path::Path};

/// Signal recovered from a two-column table, plus what was thrown away.
#[derive(Debug, Clone)]
pub struct ParsedSignal {
    pub signal: Signal,
    /// Labels from a `segment`/`label` column, when every kept row had a valid one.
    pub segments: Option<Vec<SegmentLabel>>,
    pub time_column: usize,
    pub voltage_column: usize,
    pub dropped_rows: usize,
}

/// Parse a time/voltage table.
///
/// A first row whose first or second cell is non-numeric text is a header: the time column is
/// the first name containing "time", the voltage column the first containing
/// "volt", "lead" or "val". Without a match the first two columns are used.
/// Rows missing either value, or stepping back in time, are dropped.
pub fn parse_signal_csv(text: &str) -> Result<ParsedSignal> {
    let mut reader = ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let first = match records.next() {
        Some(record) => record.context("reading first row")?,
        None => anyhow::bail!("no rows found"),
    };

    // Trailing annotation columns never make a row a header.
    let is_header = first
        .iter()
        .take(2)
        .any(|cell| !cell.is_empty() && cell.parse::<f64>().is_err());
    let (time_column, voltage_column, segment_column) = if is_header {
        locate_columns(&first)
    } else {
        (0, 1, None)
    };

    let mut time = Vec::new();
    let mut voltage = Vec::new();
    let mut labels = Vec::new();
    let mut labels_complete = segment_column.is_some();
    let mut dropped_rows = 0usize;

    let data_rows = if is_header { None } else { Some(Ok(first)) };
    for (idx, result) in data_rows.into_iter().chain(records).enumerate() {
        let record = result.with_context(|| format!("reading row {}", idx + 1))?;
        let t = numeric_cell(&record, time_column);
        let v = numeric_cell(&record, voltage_column);
        let (t, v) = match (t, v) {
            (Some(t), Some(v)) if time.last().map_or(true, |&last| t >= last) => (t, v),
            _ => {
                dropped_rows += 1;
                continue;
            }
        };
        time.push(t);
        voltage.push(v);
        if labels_complete {
            match segment_column
                .and_then(|col| record.get(col))
                .and_then(|cell| cell.parse::<SegmentLabel>().ok())
            {
                Some(label) => labels.push(label),
                None => labels_complete = false,
            }
        }
    }

    if time.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    debug!(
        "csv: kept {} rows (time col {}, voltage col {}), dropped {}",
        time.len(),
        time_column,
        voltage_column,
        dropped_rows
    );

    let signal = Signal::new(time, voltage).context("building signal from csv rows")?;
    Ok(ParsedSignal {
        signal,
        segments: labels_complete.then_some(labels),
        time_column,
        voltage_column,
        dropped_rows,
    })
}

pub fn read_signal_csv(path: &Path) -> Result<ParsedSignal> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_signal_csv(&text).with_context(|| format!("parsing {}", path.display()))
}

#[derive(Serialize)]
struct Row {
    time: f64,
    voltage: f64,
    segment: SegmentLabel,
}

/// Write `time,voltage,segment` rows. Samples without a label are written as baseline.
pub fn write_signal_csv<W: Write>(
    writer: W,
    signal: &Signal,
    segments: &[SegmentLabel],
) -> Result<()> {
    let mut out = WriterBuilder::new().has_headers(true).from_writer(writer);
    for (i, (&time, &voltage)) in signal.time().iter().zip(signal.voltage()).enumerate() {
        out.serialize(Row {
            time,
            voltage,
            segment: segments.get(i).copied().unwrap_or_default(),
        })?;
    }
    out.flush().context("flushing csv output")?;
    Ok(())
}

fn sniff_delimiter(text: &str) -> u8 {
    let line = text
        .lines()
        .find(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .unwrap_or("");
    if line.contains('\t') {
        b'\t'
    } else if line.contains(';') && !line.contains(',') {
        b';'
    } else {
        b','
    }
}

fn locate_columns(headers: &StringRecord) -> (usize, usize, Option<usize>) {
    let names: Vec<String> = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
    let time = names.iter().position(|n| n.contains("time"));
    let voltage = names.iter().enumerate().position(|(i, n)| {
        Some(i) != time && (n.contains("volt") || n.contains("lead") || n.contains("val"))
    });
    let segment = names
        .iter()
        .position(|n| n.contains("segment") || n.contains("label"));
    let time = time.unwrap_or(if voltage == Some(0) { 1 } else { 0 });
    let voltage = voltage.unwrap_or(if time == 1 { 0 } else { 1 });
    (time, voltage, segment)
}

fn numeric_cell(record: &StringRecord, column: usize) -> Option<f64> {
    record
        .get(column)
        .filter(|cell| !cell.is_empty())
        .and_then(|cell| cell.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn named_columns_in_any_order() {
        let text = "Lead II (mV),Time (s)\n0.1,0.000\n0.5,0.004\n0.2,0.008\n";
        let parsed = parse_signal_csv(text).unwrap();
        assert_eq!(parsed.time_column, 1);
        assert_eq!(parsed.voltage_column, 0);
        assert_eq!(parsed.signal.voltage(), &[0.1, 0.5, 0.2]);
        assert_eq!(parsed.signal.time()[2], 0.008);
    }

    #[test]
    fn headerless_uses_positions() {
        let parsed = parse_signal_csv("0,1.5\n0.01,1.7\n").unwrap();
        assert_eq!(parsed.signal.len(), 2);
        assert_eq!(parsed.signal.voltage()[1], 1.7);
        assert!(parsed.segments.is_none());
    }

    #[test]
    fn headerless_with_trailing_column_keeps_first_row() {
        let parsed = parse_signal_csv("0.0,1.0,\n0.004,2.0,\n0.008,3.0,\n").unwrap();
        assert_eq!(parsed.signal.voltage(), &[1.0, 2.0, 3.0]);
        assert_eq!(parsed.dropped_rows, 0);

        let parsed = parse_signal_csv("0.0,1.0,qrs\n0.004,2.0,t\n").unwrap();
        assert_eq!(parsed.signal.time(), &[0.0, 0.004]);
        assert_eq!((parsed.time_column, parsed.voltage_column), (0, 1));
    }

    #[test]
    fn unrecognised_headers_fall_back_to_positions() {
        let parsed = parse_signal_csv("a,b,c\n0,2,9\n1,3,9\n").unwrap();
        assert_eq!((parsed.time_column, parsed.voltage_column), (0, 1));
        assert_eq!(parsed.signal.voltage(), &[2.0, 3.0]);
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let text = "time,value\n0.0,1.0\n0.1,\nabc,2.0\n0.2,NaN\n0.3\n0.4,3.0\n0.35,4.0\n";
        let parsed = parse_signal_csv(text).unwrap();
        assert_eq!(parsed.signal.time(), &[0.0, 0.4]);
        assert_eq!(parsed.signal.voltage(), &[1.0, 3.0]);
        assert_eq!(parsed.dropped_rows, 5);
    }

    #[test]
    fn tab_and_semicolon_delimiters() {
        let tab = parse_signal_csv("time\tvoltage\n0\t1\n1\t2\n").unwrap();
        assert_eq!(tab.signal.voltage(), &[1.0, 2.0]);
        let semi = parse_signal_csv("time;voltage\n0;1\n1;2\n").unwrap();
        assert_eq!(semi.signal.voltage(), &[1.0, 2.0]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_signal_csv("").is_err());
        assert!(parse_signal_csv("time,voltage\n").is_err());
    }

    #[test]
    fn labelled_round_trip() {
        let signal = Signal::new(vec![0.0, 0.004, 0.008], vec![0.0, 1.0, 0.0]).unwrap();
        let labels = vec![SegmentLabel::P, SegmentLabel::Qrs, SegmentLabel::T];
        let mut buf = Vec::new();
        write_signal_csv(&mut buf, &signal, &labels).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("time,voltage,segment\n"));
        let parsed = parse_signal_csv(&text).unwrap();
        assert_eq!(parsed.signal, signal);
        assert_eq!(parsed.segments.as_deref(), Some(labels.as_slice()));
    }

    #[test]
    fn reads_fixture() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .join("test_data/malformed_rows.csv");
        let parsed = read_signal_csv(&path).unwrap();
        assert_eq!(parsed.signal.len(), 6);
        assert_eq!(parsed.dropped_rows, 3);
    }
}
