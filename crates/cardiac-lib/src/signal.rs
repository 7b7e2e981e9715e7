use crate::error::SignalError;
use serde::{Deserialize, Serialize};

/// Single-lead recording: voltage (mV) sampled at the matching time (s).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    time: Vec<f64>,
    voltage: Vec<f64>,
}

impl Signal {
    /// Build a signal, checking that both axes line up and time never goes backwards.
    pub fn new(time: Vec<f64>, voltage: Vec<f64>) -> Result<Self, SignalError> {
        if time.len() != voltage.len() {
            return Err(SignalError::LengthMismatch {
                time: time.len(),
                voltage: voltage.len(),
            });
        }
        for (index, (t, v)) in time.iter().zip(&voltage).enumerate() {
            if !t.is_finite() || !v.is_finite() {
                return Err(SignalError::NonFinite { index });
            }
        }
        for (index, w) in time.windows(2).enumerate() {
            if w[1] < w[0] {
                return Err(SignalError::NonMonotonicTime {
                    index: index + 1,
                    previous: w[0],
                    current: w[1],
                });
            }
        }
        Ok(Self { time, voltage })
    }

    /// Uniformly sampled signal starting at t = 0.
    pub fn from_voltage(fs: f64, voltage: Vec<f64>) -> Result<Self, SignalError> {
        if !fs.is_finite() || fs <= 0.0 {
            return Err(SignalError::InvalidSampleRate(fs));
        }
        let time = (0..voltage.len()).map(|i| i as f64 / fs).collect();
        Self::new(time, voltage)
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Span between first and last sample in seconds; 0 for an empty signal.
    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Reciprocal of the median sample spacing.
    pub fn sample_rate_hint(&self) -> Option<f64> {
        if self.time.len() < 2 {
            return None;
        }
        let mut dts: Vec<f64> = self.time.windows(2).map(|w| w[1] - w[0]).collect();
        dts.sort_by(|a, b| a.total_cmp(b));
        let median = dts[dts.len() / 2];
        (median > 0.0).then(|| 1.0 / median)
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.time, self.voltage)
    }
}

/// Sample indices of detected beats, strictly increasing.
///
/// Code that writes `indices` directly must keep them ordered; `from_indices`
/// does it for you.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatIndices {
    pub indices: Vec<usize>,
}

impl BeatIndices {
    /// Sorts and drops duplicates.
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Seconds between consecutive beats.
    pub fn rr_intervals(&self, time: &[f64]) -> Vec<f64> {
        self.indices
            .windows(2)
            .map(|w| time[w[1]] - time[w[0]])
            .collect()
    }
}

/// Waveform phase assigned to a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentLabel {
    #[default]
    Baseline,
    P,
    Qrs,
    T,
}

impl SegmentLabel {
    pub const ALL: [SegmentLabel; 4] = [
        SegmentLabel::Baseline,
        SegmentLabel::P,
        SegmentLabel::Qrs,
        SegmentLabel::T,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentLabel::Baseline => "baseline",
            SegmentLabel::P => "p",
            SegmentLabel::Qrs => "qrs",
            SegmentLabel::T => "t",
        }
    }
}

impl std::fmt::Display for SegmentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SegmentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(SegmentLabel::Baseline),
            "p" => Ok(SegmentLabel::P),
            "qrs" => Ok(SegmentLabel::Qrs),
            "t" => Ok(SegmentLabel::T),
            other => Err(format!("unknown segment label: {other}")),
        }
    }
}

/// Cursor-style view of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointDetails {
    pub time: f64,
    pub voltage: f64,
    pub segment: SegmentLabel,
}

/// Sample nearest to `query` in time. Ties go to the earlier sample.
///
/// A `segments` array shorter than the signal reports `Baseline` for the
/// uncovered samples.
pub fn point_at(signal: &Signal, segments: &[SegmentLabel], query: f64) -> Option<PointDetails> {
    let time = signal.time();
    if time.is_empty() || query.is_nan() {
        return None;
    }
    let upper = time.partition_point(|&t| t < query);
    let idx = if upper == 0 {
        0
    } else if upper == time.len() {
        time.len() - 1
    } else if (time[upper] - query) < (query - time[upper - 1]) {
        upper
    } else {
        upper - 1
    };
    Some(PointDetails {
        time: time[idx],
        voltage: signal.voltage()[idx],
        segment: segments.get(idx).copied().unwrap_or_default(),
    })
}

/// Per-label sample counts for a segment array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub total: usize,
    pub baseline: usize,
    pub p: usize,
    pub qrs: usize,
    pub t: usize,
}

impl SegmentSummary {
    pub fn from_labels(labels: &[SegmentLabel]) -> Self {
        let mut summary = Self {
            total: labels.len(),
            ..Self::default()
        };
        for label in labels {
            match label {
                SegmentLabel::Baseline => summary.baseline += 1,
                SegmentLabel::P => summary.p += 1,
                SegmentLabel::Qrs => summary.qrs += 1,
                SegmentLabel::T => summary.t += 1,
            }
        }
        summary
    }

    pub fn count(&self, label: SegmentLabel) -> usize {
        match label {
            SegmentLabel::Baseline => self.baseline,
            SegmentLabel::P => self.p,
            SegmentLabel::Qrs => self.qrs,
            SegmentLabel::T => self.t,
        }
    }

    pub fn fraction(&self, label: SegmentLabel) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(label) as f64 / self.total as f64
        }
    }
}

/// Fraction of positions where both arrays carry the same label.
///
/// Compared over the shorter length; two empty arrays agree fully.
pub fn label_agreement(a: &[SegmentLabel], b: &[SegmentLabel]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return if a.len() == b.len() { 1.0 } else { 0.0 };
    }
    let same = a.iter().zip(b).filter(|(x, y)| x == y).count();
    same as f64 / n as f64
}
