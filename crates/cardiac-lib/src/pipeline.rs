use crate::{
    config::AnalysisConfig,
    detectors::{beats::detect_beats_with_config, segment::segment_with_config},
    metrics::rhythm::{aggregate_with_config, RateClass, RhythmStatistics},
    signal::{BeatIndices, SegmentLabel, SegmentSummary, Signal},
};
use log::info;
use serde::{Deserialize, Serialize};

/// Combined result of beat detection, segmentation and rhythm statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub sample_count: usize,
    pub beats: BeatIndices,
    pub segments: Vec<SegmentLabel>,
    pub statistics: RhythmStatistics,
    pub rate_class: RateClass,
}

/// Compact view of a report without the per-sample arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub sample_count: usize,
    pub beat_count: usize,
    pub statistics: RhythmStatistics,
    pub rate_class: RateClass,
    pub segments: SegmentSummary,
}

impl AnalysisReport {
    /// Segment and aggregate around an already known set of beats.
    pub fn from_beats(signal: &Signal, beats: BeatIndices, cfg: &AnalysisConfig) -> Self {
        let segments = segment_with_config(signal, &beats, &cfg.segmenter);
        let statistics = aggregate_with_config(&beats, signal.time(), &cfg.statistics);
        let rate_class = statistics.rate_class();
        Self {
            sample_count: signal.len(),
            beats,
            segments,
            statistics,
            rate_class,
        }
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            sample_count: self.sample_count,
            beat_count: self.beats.len(),
            statistics: self.statistics.clone(),
            rate_class: self.rate_class,
            segments: SegmentSummary::from_labels(&self.segments),
        }
    }
}

/// Run detection, segmentation and aggregation over one signal.
pub fn analyze(signal: &Signal, cfg: &AnalysisConfig) -> AnalysisReport {
    let beats = detect_beats_with_config(signal, &cfg.detector);
    let report = AnalysisReport::from_beats(signal, beats, cfg);
    info!(
        "analysed {} samples: {} beats, {} bpm",
        report.sample_count,
        report.beats.len(),
        report.statistics.bpm
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        detectors::{beats::detect_beats, segment::segment},
        signal::label_agreement,
        synth::{generate, Archetype},
    };

    #[test]
    fn normal_rhythm_end_to_end() {
        let rec = generate(Archetype::Normal, 10.0, 1);
        assert_eq!(rec.signal.len(), 2500);
        let report = analyze(&rec.signal, &AnalysisConfig::default());
        let beats = report.beats.len();
        assert!((9..=11).contains(&beats), "detected {beats} beats");
        assert!((55.0..=65.0).contains(&report.statistics.bpm));
        assert!((report.statistics.duration - (10.0 - 1.0 / 250.0)).abs() < 1e-9);
        assert_eq!(report.statistics.qrs_duration, 90.0);
        assert_eq!(report.rate_class, RateClass::Normal);
        assert_eq!(report.segments.len(), 2500);
    }

    #[test]
    fn tachycardia_end_to_end() {
        let rec = generate(Archetype::Tachycardia, 10.0, 2);
        let report = analyze(&rec.signal, &AnalysisConfig::default());
        let beats = report.beats.len();
        assert!((18..=24).contains(&beats), "detected {beats} beats");
        assert!((120.0..=140.0).contains(&report.statistics.bpm));
        assert_eq!(report.rate_class, RateClass::Tachycardia);
    }

    #[test]
    fn bradycardia_end_to_end() {
        let rec = generate(Archetype::Bradycardia, 10.0, 3);
        let report = analyze(&rec.signal, &AnalysisConfig::default());
        assert!((40.0..=50.0).contains(&report.statistics.bpm));
        assert_eq!(report.rate_class, RateClass::Bradycardia);
    }

    #[test]
    fn flat_signal_gives_placeholder_record() {
        let signal = Signal::from_voltage(360.0, vec![0.0; 1000]).unwrap();
        let report = analyze(&signal, &AnalysisConfig::default());
        assert!(report.beats.is_empty());
        assert_eq!(report.statistics.bpm, 0.0);
        assert!(report.statistics.rr_intervals.is_empty());
        assert_eq!(report.statistics.sdnn, 0.0);
        assert_eq!(report.statistics.rmssd, 0.0);
        assert_eq!(report.statistics.qrs_duration, 80.0);
        assert_eq!(report.statistics.min_rr, 0.0);
        assert_eq!(report.statistics.max_rr, 0.0);
        assert!(report.segments.iter().all(|s| *s == SegmentLabel::Baseline));
        assert_eq!(report.rate_class, RateClass::Insufficient);
    }

    #[test]
    fn empty_signal_is_not_an_error() {
        let report = analyze(&Signal::default(), &AnalysisConfig::default());
        assert_eq!(report.sample_count, 0);
        assert!(report.segments.is_empty());
        assert_eq!(report.statistics.duration, 0.0);
    }

    #[test]
    fn refractory_holds_for_every_archetype() {
        for archetype in Archetype::ALL {
            let rec = generate(archetype, 10.0, 5);
            let beats = detect_beats(&rec.signal);
            let time = rec.signal.time();
            assert!(
                beats.indices.windows(2).all(|w| time[w[1]] - time[w[0]] > 0.25),
                "{archetype}"
            );
        }
    }

    #[test]
    fn heuristic_segmentation_roughly_matches_ground_truth() {
        let rec = generate(Archetype::Normal, 10.0, 9);
        let labels = segment(&rec.signal, &detect_beats(&rec.signal));
        let agreement = label_agreement(&labels, &rec.segments);
        assert!(agreement > 0.5, "agreement {agreement}");
    }

    #[test]
    fn analysis_is_deterministic() {
        let rec = generate(Archetype::Afib, 8.0, 4);
        let cfg = AnalysisConfig::default();
        assert_eq!(analyze(&rec.signal, &cfg), analyze(&rec.signal, &cfg));
    }

    #[test]
    fn summary_counts_segments() {
        let rec = generate(Archetype::Normal, 4.0, 6);
        let report = analyze(&rec.signal, &AnalysisConfig::default());
        let summary = report.summary();
        assert_eq!(summary.segments.total, 1000);
        assert_eq!(summary.beat_count, report.beats.len());
        assert!(summary.segments.qrs > 0);
    }
}
