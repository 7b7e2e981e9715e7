use crate::{config::StatisticsConfig, signal::BeatIndices};
use log::warn;
use serde::{Deserialize, Serialize};

/// Aggregate rhythm metrics derived from beat positions.
///
/// `bpm == 0` and `sdnn == 0` mean there were not enough beats, not a true zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RhythmStatistics {
    pub bpm: f64,
    /// Seconds between consecutive beats.
    pub rr_intervals: Vec<f64>,
    /// Population standard deviation of the RR intervals (ms, rounded).
    pub sdnn: f64,
    /// Root mean square of successive RR differences (ms).
    pub rmssd: f64,
    /// Fixed estimate (ms); not measured from the waveform.
    pub qrs_duration: f64,
    /// Seconds between first and last sample.
    pub duration: f64,
    #[serde(rename = "minRR")]
    pub min_rr: f64,
    #[serde(rename = "maxRR")]
    pub max_rr: f64,
}

/// Coarse heart-rate label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateClass {
    Insufficient,
    Bradycardia,
    Normal,
    Tachycardia,
}

impl RhythmStatistics {
    pub fn rate_class(&self) -> RateClass {
        if self.bpm <= 0.0 {
            RateClass::Insufficient
        } else if self.bpm < 60.0 {
            RateClass::Bradycardia
        } else if self.bpm <= 100.0 {
            RateClass::Normal
        } else {
            RateClass::Tachycardia
        }
    }
}

pub fn aggregate(beats: &BeatIndices, time: &[f64]) -> RhythmStatistics {
    aggregate_with_config(beats, time, &StatisticsConfig::default())
}

/// Compute rate, variability and interval bounds from beat positions.
///
/// Fewer than two beats produce the zeroed record with the degenerate QRS
/// placeholder; this is never an error.
pub fn aggregate_with_config(
    beats: &BeatIndices,
    time: &[f64],
    cfg: &StatisticsConfig,
) -> RhythmStatistics {
    let duration = match (time.first(), time.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };

    let in_range: Vec<usize> = beats
        .indices
        .iter()
        .copied()
        .filter(|&idx| idx < time.len())
        .collect();
    if in_range.len() != beats.len() {
        warn!(
            "ignoring {} beat indices beyond {} samples",
            beats.len() - in_range.len(),
            time.len()
        );
    }
    let valid = BeatIndices::from_indices(in_range);

    if valid.len() < 2 {
        return RhythmStatistics {
            bpm: 0.0,
            rr_intervals: Vec::new(),
            sdnn: 0.0,
            rmssd: 0.0,
            qrs_duration: cfg.degenerate_qrs_ms,
            duration,
            min_rr: 0.0,
            max_rr: 0.0,
        };
    }

    let rr = valid.rr_intervals(time);
    let n = rr.len() as f64;
    let mean = rr.iter().sum::<f64>() / n;
    let bpm = if mean > 0.0 { (60.0 / mean).round() } else { 0.0 };
    let variance = rr.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let sdnn = (1000.0 * variance.sqrt()).round();
    let rmssd = if rr.len() > 1 {
        let sum = rr
            .windows(2)
            .map(|w| (1000.0 * (w[1] - w[0])).powi(2))
            .sum::<f64>();
        (sum / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let min_rr = rr.iter().copied().fold(f64::INFINITY, f64::min);
    let max_rr = rr.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    RhythmStatistics {
        bpm,
        rr_intervals: rr,
        sdnn,
        rmssd,
        qrs_duration: cfg.qrs_placeholder_ms,
        duration,
        min_rr,
        max_rr,
    }
}
