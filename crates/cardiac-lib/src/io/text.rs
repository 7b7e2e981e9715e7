use crate::signal::Signal;
use anyhow::{Context, Result};
use std::path::Path;

/// Voltage-only series sampled at `fs`, time starting at zero.
///
/// One value per line; blank lines and `#` comments are skipped.
pub fn parse_voltage_signal(text: &str, fs: f64) -> Result<Signal> {
    let voltage = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(lineno, line)| {
            line.parse::<f64>()
                .with_context(|| format!("line {lineno}: expected a voltage value, got {line:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if voltage.is_empty() {
        anyhow::bail!("no voltage samples found");
    }
    Signal::from_voltage(fs, voltage).context("building signal from voltage series")
}

pub fn read_voltage_signal(path: &Path, fs: f64) -> Result<Signal> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_voltage_signal(&text, fs)
}

/// Parse newline-delimited beat sample indices.
pub fn parse_beat_indices(text: &str) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: usize = trimmed
            .parse()
            .with_context(|| format!("line {} is not an integer index: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.windows(2).any(|w| w[1] <= w[0]) {
        anyhow::bail!("beat indices must be strictly increasing");
    }
    Ok(out)
}

pub fn read_beat_indices(path: &Path) -> Result<Vec<usize>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_beat_indices(&text)
}
