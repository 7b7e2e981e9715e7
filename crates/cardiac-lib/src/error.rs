use thiserror::Error;

/// Violations of the `Signal` input contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("time has {time} samples but voltage has {voltage}")]
    LengthMismatch { time: usize, voltage: usize },
    #[error("time decreases at sample {index} ({previous} -> {current})")]
    NonMonotonicTime {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("non-finite value at sample {index}")]
    NonFinite { index: usize },
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),
}

/// Rejected analysis configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidWindow { field: &'static str, value: f64 },
    #[error("threshold_scale must be in (0, 1], got {0}")]
    InvalidThresholdScale(f64),
    #[error("{lower} ({lower_value}) must not exceed {upper} ({upper_value})")]
    InvertedWindow {
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
}
