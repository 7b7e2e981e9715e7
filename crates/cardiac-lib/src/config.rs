use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for the threshold + refractory beat detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatDetectorConfig {
    /// Fraction of the largest centred excursion a peak must exceed.
    pub threshold_scale: f64,
    /// Minimum spacing between accepted beats (seconds).
    pub refractory_s: f64,
}

impl Default for BeatDetectorConfig {
    fn default() -> Self {
        Self {
            threshold_scale: 0.6,
            refractory_s: 0.25,
        }
    }
}

/// Fixed windows around each beat, in seconds relative to the beat time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Backward scan stops once a sample lies further than this before the beat.
    pub back_limit_s: f64,
    /// Open interval before the beat labelled as P-wave.
    pub p_min_s: f64,
    pub p_max_s: f64,
    /// Samples at most this far before the beat belong to the QRS complex.
    pub qrs_back_s: f64,
    /// Forward scan continues while samples are within this distance after the beat.
    pub forward_limit_s: f64,
    /// Samples strictly closer than this after the beat belong to the QRS complex.
    pub qrs_forward_s: f64,
    /// Open interval after the beat labelled as T-wave.
    pub t_min_s: f64,
    pub t_max_s: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            back_limit_s: 0.25,
            p_min_s: 0.1,
            p_max_s: 0.22,
            qrs_back_s: 0.06,
            forward_limit_s: 0.45,
            qrs_forward_s: 0.06,
            t_min_s: 0.12,
            t_max_s: 0.42,
        }
    }
}

/// Placeholder QRS widths reported alongside the rhythm statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Reported when at least two beats were found (ms).
    pub qrs_placeholder_ms: f64,
    /// Reported for the degenerate fewer-than-two-beats record (ms).
    pub degenerate_qrs_ms: f64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            qrs_placeholder_ms: 90.0,
            degenerate_qrs_ms: 80.0,
        }
    }
}

/// Everything the analysis pipeline can be tuned with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detector: BeatDetectorConfig,
    pub segmenter: SegmenterConfig,
    pub statistics: StatisticsConfig,
}

impl AnalysisConfig {
    /// Parse a (possibly partial) TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: AnalysisConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale = self.detector.threshold_scale;
        if !scale.is_finite() || scale <= 0.0 || scale > 1.0 {
            return Err(ConfigError::InvalidThresholdScale(scale));
        }
        let s = &self.segmenter;
        let windows = [
            ("detector.refractory_s", self.detector.refractory_s),
            ("segmenter.back_limit_s", s.back_limit_s),
            ("segmenter.p_min_s", s.p_min_s),
            ("segmenter.p_max_s", s.p_max_s),
            ("segmenter.qrs_back_s", s.qrs_back_s),
            ("segmenter.forward_limit_s", s.forward_limit_s),
            ("segmenter.qrs_forward_s", s.qrs_forward_s),
            ("segmenter.t_min_s", s.t_min_s),
            ("segmenter.t_max_s", s.t_max_s),
            ("statistics.qrs_placeholder_ms", self.statistics.qrs_placeholder_ms),
            ("statistics.degenerate_qrs_ms", self.statistics.degenerate_qrs_ms),
        ];
        for (field, value) in windows {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWindow { field, value });
            }
        }
        ordered("segmenter.p_min_s", s.p_min_s, "segmenter.p_max_s", s.p_max_s)?;
        ordered("segmenter.t_min_s", s.t_min_s, "segmenter.t_max_s", s.t_max_s)?;
        Ok(())
    }
}

fn ordered(
    lower: &'static str,
    lower_value: f64,
    upper: &'static str,
    upper_value: f64,
) -> Result<(), ConfigError> {
    if lower_value > upper_value {
        return Err(ConfigError::InvertedWindow {
            lower,
            lower_value,
            upper,
            upper_value,
        });
    }
    Ok(())
}
