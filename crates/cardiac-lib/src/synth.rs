//! Parametrised synthetic single-lead ECG with ground-truth segment labels.

use crate::signal::{SegmentLabel, Signal};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const SAMPLE_RATE_HZ: f64 = 250.0;

const P_CENTER: f64 = 0.16;
const P_WIDTH: f64 = 1.0 / 50.0;
const P_AMPLITUDE: f64 = 0.15;
const Q_CENTER: f64 = 0.39;
const Q_WIDTH: f64 = 0.008;
const Q_AMPLITUDE: f64 = -0.15;
const R_CENTER: f64 = 0.40;
const R_WIDTH: f64 = 0.01;
const R_AMPLITUDE: f64 = 1.2;
const S_CENTER: f64 = 0.42;
const S_WIDTH: f64 = 0.008;
const S_AMPLITUDE: f64 = -0.25;
const T_CENTER: f64 = 0.62;
const T_WIDTH: f64 = 0.05;
const T_AMPLITUDE: f64 = 0.3;
const QRS_WINDOW: (f64, f64) = (0.37, 0.45);
/// Half-extent of a labelled wave, in Gaussian widths.
const WAVE_EXTENT: f64 = 2.5;

/// Rhythm presets available for demo signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Normal,
    Tachycardia,
    Bradycardia,
    Afib,
    QtProlongation,
}

/// Generator parameters for one archetype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeParams {
    pub bpm: f64,
    /// Uniform beat-timing jitter as a fraction of the beat duration.
    pub irregularity: f64,
    /// Peak-to-peak amplitude of the additive uniform noise (mV).
    pub noise_level: f64,
    /// Scales T-wave position and width.
    pub qt_factor: f64,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::Normal,
        Archetype::Tachycardia,
        Archetype::Bradycardia,
        Archetype::Afib,
        Archetype::QtProlongation,
    ];

    pub fn params(&self) -> ArchetypeParams {
        let (bpm, irregularity, noise_level, qt_factor) = match self {
            Archetype::Normal => (60.0, 0.0, 0.01, 1.0),
            Archetype::Tachycardia => (130.0, 0.0, 0.01, 1.0),
            Archetype::Bradycardia => (45.0, 0.0, 0.01, 1.0),
            Archetype::Afib => (90.0, 0.6, 0.04, 1.0),
            Archetype::QtProlongation => (60.0, 0.0, 0.01, 1.6),
        };
        ArchetypeParams {
            bpm,
            irregularity,
            noise_level,
            qt_factor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Normal => "normal",
            Archetype::Tachycardia => "tachycardia",
            Archetype::Bradycardia => "bradycardia",
            Archetype::Afib => "afib",
            Archetype::QtProlongation => "qt_prolongation",
        }
    }

    fn has_p_wave(&self) -> bool {
        !matches!(self, Archetype::Afib)
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Archetype::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Archetype::ALL.iter().map(|a| a.as_str()).collect();
                format!("unknown archetype '{}' (expected one of {})", s, names.join(", "))
            })
    }
}

/// Generated signal plus the labels it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRecording {
    pub archetype: Archetype,
    pub signal: Signal,
    pub segments: Vec<SegmentLabel>,
}

/// Generate `duration_s` seconds at 250 Hz, reproducible for a given seed.
pub fn generate(archetype: Archetype, duration_s: f64, seed: u64) -> SyntheticRecording {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_with_rng(archetype, duration_s, &mut rng)
}

pub fn generate_with_rng<R: Rng + ?Sized>(
    archetype: Archetype,
    duration_s: f64,
    rng: &mut R,
) -> SyntheticRecording {
    let params = archetype.params();
    let samples = if duration_s.is_finite() && duration_s > 0.0 {
        (duration_s * SAMPLE_RATE_HZ).floor() as usize
    } else {
        0
    };
    let beat = 60.0 / params.bpm;
    let max_jitter = params.irregularity * beat;

    let mut time = Vec::with_capacity(samples);
    let mut voltage = Vec::with_capacity(samples);
    let mut segments = Vec::with_capacity(samples);
    let mut next_beat = beat;

    for i in 0..samples {
        let t = i as f64 / SAMPLE_RATE_HZ;
        while t >= next_beat {
            let jitter = if max_jitter > 0.0 {
                rng.gen_range(-max_jitter..=max_jitter)
            } else {
                0.0
            };
            next_beat += beat + jitter;
        }
        let phase = (t - (next_beat - beat)) / beat;

        let mut v = 0.05 * (0.2 * t).sin();
        if archetype.has_p_wave() {
            v += P_AMPLITUDE * gaussian(phase, P_CENTER, P_WIDTH);
        } else {
            v += 0.03 * (45.0 * t).sin();
        }
        v += Q_AMPLITUDE * gaussian(phase, Q_CENTER, Q_WIDTH);
        v += R_AMPLITUDE * gaussian(phase, R_CENTER, R_WIDTH);
        v += S_AMPLITUDE * gaussian(phase, S_CENTER, S_WIDTH);
        let (t_center, t_width) = t_wave(params.qt_factor);
        v += T_AMPLITUDE * gaussian(phase, t_center, t_width);
        if params.noise_level > 0.0 {
            v += rng.gen_range(-0.5..0.5) * params.noise_level;
        }

        time.push(t);
        voltage.push(v);
        segments.push(label_for_phase(archetype, phase));
    }

    // Uniform time axis with finite samples always satisfies the signal contract.
    let signal = Signal::new(time, voltage).unwrap_or_default();
    SyntheticRecording {
        archetype,
        signal,
        segments,
    }
}

/// Ground-truth label for a position within the cardiac cycle.
pub fn label_for_phase(archetype: Archetype, phase: f64) -> SegmentLabel {
    let params = archetype.params();
    if (QRS_WINDOW.0..=QRS_WINDOW.1).contains(&phase) {
        return SegmentLabel::Qrs;
    }
    if archetype.has_p_wave() && (phase - P_CENTER).abs() <= WAVE_EXTENT * P_WIDTH {
        return SegmentLabel::P;
    }
    let (t_center, t_width) = t_wave(params.qt_factor);
    if (phase - t_center).abs() <= WAVE_EXTENT * t_width {
        return SegmentLabel::T;
    }
    SegmentLabel::Baseline
}

fn t_wave(qt_factor: f64) -> (f64, f64) {
    (T_CENTER * qt_factor, T_WIDTH * qt_factor)
}

fn gaussian(x: f64, center: f64, width: f64) -> f64 {
    let z = (x - center) / width;
    (-0.5 * z * z).exp()
}
