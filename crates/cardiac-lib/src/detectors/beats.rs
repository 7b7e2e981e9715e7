use crate::{
    config::BeatDetectorConfig,
    signal::{BeatIndices, Signal},
};
use log::debug;

/// Detect beats with the default threshold and refractory period.
pub fn detect_beats(signal: &Signal) -> BeatIndices {
    detect_beats_with_config(signal, &BeatDetectorConfig::default())
}

/// Detect the dominant peak of each cardiac cycle.
///
/// The signal is mean-centred; a strict local maximum is accepted when it
/// exceeds `threshold_scale * max(|centred|)` and lies more than
/// `refractory_s` after the previously accepted beat.
pub fn detect_beats_with_config(signal: &Signal, cfg: &BeatDetectorConfig) -> BeatIndices {
    let time = signal.time();
    let centred = centre(signal.voltage());
    if centred.is_empty() {
        return BeatIndices::default();
    }

    let max_abs = centred.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let threshold = cfg.threshold_scale * max_abs;

    let mut beats = Vec::new();
    let mut last_time = -cfg.refractory_s;
    for i in 1..centred.len().saturating_sub(1) {
        let y = centred[i];
        let local_max = y > centred[i - 1] && y > centred[i + 1];
        if local_max && y > threshold && time[i] - last_time > cfg.refractory_s {
            beats.push(i);
            last_time = time[i];
        }
    }

    debug!(
        "beat detector: {} samples, threshold {:.4}, {} beats",
        centred.len(),
        threshold,
        beats.len()
    );
    BeatIndices::from_indices(beats)
}

fn centre(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    data.iter().map(|v| v - mean).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike_train(fs: f64, beats: &[f64], duration: f64) -> Signal {
        let samples = (duration * fs) as usize;
        let mut data = Vec::with_capacity(samples);
        for i in 0..samples {
            let time = i as f64 / fs;
            let mut v = 0.05 * (2.0 * std::f64::consts::PI * time).sin();
            for &bt in beats {
                let width = 0.02;
                v += 1.2 * (-0.5 * ((time - bt) / width).powi(2)).exp();
            }
            data.push(v);
        }
        Signal::from_voltage(fs, data).unwrap()
    }

    #[test]
    fn detects_regular_beats() {
        let beats = [0.5, 1.32, 2.1, 2.9, 3.7, 4.5, 5.28];
        let signal = spike_train(250.0, &beats, 6.0);
        let detected = detect_beats(&signal);
        assert_eq!(detected.len(), beats.len());
        for (idx, bt) in detected.indices.iter().zip(beats) {
            assert!((signal.time()[*idx] - bt).abs() < 0.01);
        }
    }

    #[test]
    fn refractory_period_suppresses_close_peaks() {
        let signal = spike_train(250.0, &[1.0, 1.2, 2.0], 3.0);
        let detected = detect_beats(&signal);
        assert_eq!(detected.len(), 2);
        let times: Vec<f64> = detected.indices.iter().map(|&i| signal.time()[i]).collect();
        assert!(times.windows(2).all(|w| w[1] - w[0] > 0.25));
    }

    #[test]
    fn first_peak_is_eligible_immediately() {
        let time = vec![0.0, 0.004, 0.008, 0.012, 0.016];
        let voltage = vec![0.0, 1.0, 0.0, 0.0, 0.0];
        let signal = Signal::new(time, voltage).unwrap();
        assert_eq!(detect_beats(&signal).indices, vec![1]);
    }

    #[test]
    fn accepted_peaks_exceed_threshold() {
        let signal = spike_train(250.0, &[0.6, 1.4, 2.3], 3.0);
        let mean = signal.voltage().iter().sum::<f64>() / signal.len() as f64;
        let max_abs = signal
            .voltage()
            .iter()
            .fold(0.0_f64, |acc, v| acc.max((v - mean).abs()));
        for idx in detect_beats(&signal).indices {
            assert!(signal.voltage()[idx] - mean > 0.6 * max_abs);
        }
    }

    #[test]
    fn short_and_flat_signals_have_no_beats() {
        assert!(detect_beats(&Signal::default()).is_empty());
        let two = Signal::new(vec![0.0, 0.1], vec![0.0, 5.0]).unwrap();
        assert!(detect_beats(&two).is_empty());
        let flat = Signal::from_voltage(250.0, vec![0.0; 1000]).unwrap();
        assert!(detect_beats(&flat).is_empty());
    }

    #[test]
    fn plateau_is_not_a_strict_maximum() {
        let signal = Signal::from_voltage(10.0, vec![0.0, 1.0, 1.0, 0.0, 0.0]).unwrap();
        assert!(detect_beats(&signal).is_empty());
    }

    #[test]
    fn custom_refractory_is_honoured() {
        let signal = spike_train(250.0, &[1.0, 1.4, 1.8], 2.5);
        assert_eq!(detect_beats(&signal).len(), 3);
        let cfg = BeatDetectorConfig {
            refractory_s: 0.5,
            ..BeatDetectorConfig::default()
        };
        assert_eq!(detect_beats_with_config(&signal, &cfg).indices.len(), 2);
    }

    #[test]
    fn detection_is_deterministic() {
        let signal = spike_train(250.0, &[0.7, 1.5, 2.2], 3.0);
        assert_eq!(detect_beats(&signal), detect_beats(&signal));
    }
}
