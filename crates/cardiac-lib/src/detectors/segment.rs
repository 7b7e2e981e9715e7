use crate::{
    config::SegmenterConfig,
    signal::{BeatIndices, SegmentLabel, Signal},
};
use log::{debug, warn};

/// Label every sample using the default windows.
pub fn segment(signal: &Signal, beats: &BeatIndices) -> Vec<SegmentLabel> {
    segment_with_config(signal, beats, &SegmenterConfig::default())
}

/// Label every sample as baseline, P, QRS or T from fixed windows around each beat.
///
/// Beats are applied in order. For each beat the backward window is written
/// before the forward one, so where windows of neighbouring beats overlap the
/// later write wins.
pub fn segment_with_config(
    signal: &Signal,
    beats: &BeatIndices,
    cfg: &SegmenterConfig,
) -> Vec<SegmentLabel> {
    let time = signal.time();
    let mut labels = vec![SegmentLabel::Baseline; time.len()];

    for &idx in &beats.indices {
        if idx >= time.len() {
            warn!("ignoring beat index {} beyond {} samples", idx, time.len());
            continue;
        }
        let t_r = time[idx];

        for i in (0..=idx).rev() {
            let dt = t_r - time[i];
            if dt > cfg.back_limit_s {
                break;
            }
            if dt <= cfg.qrs_back_s {
                labels[i] = SegmentLabel::Qrs;
            }
            if dt > cfg.p_min_s && dt < cfg.p_max_s {
                labels[i] = SegmentLabel::P;
            }
        }

        for i in idx + 1..time.len() {
            let dt = time[i] - t_r;
            if dt > cfg.forward_limit_s {
                break;
            }
            if dt < cfg.qrs_forward_s {
                labels[i] = SegmentLabel::Qrs;
            }
            if dt > cfg.t_min_s && dt < cfg.t_max_s {
                labels[i] = SegmentLabel::T;
            }
        }
    }

    debug!(
        "segmenter: labelled {} samples around {} beats",
        labels.len(),
        beats.len()
    );
    labels
}
