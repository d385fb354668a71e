//! Scene-change keyframe detection.
//!
//! A keyframe is a frame whose histogram correlation with its predecessor
//! falls below a threshold. The scan is a fold over the frame ids: the only
//! carried state is the previous frame's histogram and the keyframes found
//! so far, so at most two decoded frames are alive at once and a scan can
//! be resumed from any [`ScanState`].

use image::DynamicImage;

use crate::config::DetectionSettings;
use crate::frames::FrameStore;
use crate::models::FrameId;
use crate::similarity::Histogram;

/// Configuration for keyframe detection.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Scores strictly below this mark a keyframe.
    pub threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { threshold: 0.6 }
    }
}

impl From<&DetectionSettings> for DetectionConfig {
    fn from(settings: &DetectionSettings) -> Self {
        Self {
            threshold: settings.threshold,
        }
    }
}

/// Accumulator of a keyframe scan.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    previous: Option<(FrameId, Histogram)>,
    keyframes: Vec<FrameId>,
    frames_seen: usize,
    frames_skipped: usize,
}

impl ScanState {
    /// Keyframes found so far, ascending.
    pub fn keyframes(&self) -> &[FrameId] {
        &self.keyframes
    }

    /// Last frame that was read successfully.
    pub fn last_frame(&self) -> Option<FrameId> {
        self.previous.as_ref().map(|(id, _)| *id)
    }

    /// Frames folded into the state, readable or not.
    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    /// Frames that could not be decoded.
    pub fn frames_skipped(&self) -> usize {
        self.frames_skipped
    }

    /// Fold one decoded frame into the state.
    ///
    /// Returns the score against the previous readable frame, `None` for
    /// the first frame of the scan.
    pub fn push(&mut self, id: FrameId, frame: &DynamicImage, threshold: f64) -> Option<f64> {
        self.frames_seen += 1;
        let histogram = Histogram::from_image(frame);

        let score = self
            .previous
            .as_ref()
            .map(|(_, previous)| previous.correlation(&histogram));

        if let Some(score) = score {
            // Frame 0 can only ever be the first frame, so it is never emitted
            if score < threshold && id.index() > 0 {
                self.keyframes.push(id);
            }
        }

        self.previous = Some((id, histogram));
        score
    }

    /// Record a frame that could not be read; the comparison baseline stays.
    pub fn skip(&mut self) {
        self.frames_seen += 1;
        self.frames_skipped += 1;
    }

    /// Finish the scan.
    pub fn into_keyframes(self) -> Vec<FrameId> {
        self.keyframes
    }
}

/// Streaming scene-change detector.
#[derive(Debug, Clone, Default)]
pub struct KeyframeDetector {
    config: DetectionConfig,
}

impl KeyframeDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Scan a whole sequence and return its keyframes in ascending order.
    pub fn detect(&self, store: &dyn FrameStore) -> Vec<FrameId> {
        self.detect_with_progress(store, |_, _| {})
    }

    /// Like [`detect`](Self::detect), reporting `(frames_done, total)` after
    /// each frame.
    pub fn detect_with_progress<F>(&self, store: &dyn FrameStore, mut progress: F) -> Vec<FrameId>
    where
        F: FnMut(usize, usize),
    {
        let total = store.sequence_len();
        let state = store.frame_ids().fold(ScanState::default(), |state, id| {
            let state = self.advance(state, store, id);
            progress(state.frames_seen(), total);
            state
        });

        tracing::info!(
            "{} keyframes in {} {} frames ({} unreadable)",
            state.keyframes().len(),
            total,
            store.sequence(),
            state.frames_skipped()
        );
        state.into_keyframes()
    }

    /// Fold the next frame of `store` into `state`.
    pub fn advance(&self, mut state: ScanState, store: &dyn FrameStore, id: FrameId) -> ScanState {
        match store.load(id) {
            Ok(frame) => {
                let before = state.keyframes().len();
                if let Some(score) = state.push(id, &frame, self.config.threshold) {
                    tracing::debug!("{}: score {:.6}", store.describe(id), score);
                    if state.keyframes().len() > before {
                        tracing::info!(
                            "Keyframe {} (score {:.4} < {})",
                            store.describe(id),
                            score,
                            self.config.threshold
                        );
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable frame: {}", e);
                state.skip();
            }
        }
        state
    }
}
