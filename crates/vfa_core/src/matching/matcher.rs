//! Windowed keyframe matching.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use super::tie_break::{get_policy, TieBreakPolicy};
use crate::config::MatchingSettings;
use crate::frames::FrameStore;
use crate::models::{FrameId, KeyframeMatch, TieBreakMode, NO_SCORE};
use crate::similarity::Histogram;

/// Configuration for keyframe matching.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Candidates must lie within this many frames of the original index.
    pub window_radius: usize,
    /// Best scores below this are rejected.
    pub accept_threshold: f64,
    /// Canonical choice among tied candidates.
    pub tie_break: TieBreakMode,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            window_radius: 250,
            accept_threshold: 0.9,
            tie_break: TieBreakMode::FirstSeen,
        }
    }
}

impl From<&MatchingSettings> for MatchingConfig {
    fn from(settings: &MatchingSettings) -> Self {
        Self {
            window_radius: settings.window_radius,
            accept_threshold: settings.accept_threshold,
            tie_break: settings.tie_break,
        }
    }
}

/// Recorded keyframe with its histogram computed once.
struct Candidate {
    id: FrameId,
    histogram: Option<Histogram>,
}

/// Best score seen so far and every candidate reaching it.
#[derive(Default)]
struct BestSoFar {
    score: Option<f64>,
    ties: Vec<FrameId>,
}

impl BestSoFar {
    fn offer(&mut self, id: FrameId, score: f64) {
        match self.score {
            Some(best) if score < best => {}
            Some(best) if score == best => self.ties.push(id),
            _ => {
                self.score = Some(score);
                self.ties.clear();
                self.ties.push(id);
            }
        }
    }
}

/// Matches original keyframes to recorded keyframes inside a bounded window.
pub struct KeyframeMatcher {
    config: MatchingConfig,
    policy: Box<dyn TieBreakPolicy>,
}

impl KeyframeMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        let policy = get_policy(config.tie_break);
        Self { config, policy }
    }

    /// Use a custom tie-break policy instead of the configured mode.
    pub fn with_policy(config: MatchingConfig, policy: Box<dyn TieBreakPolicy>) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Match every original keyframe; output follows `original_keyframes`.
    pub fn match_keyframes(
        &self,
        original_store: &dyn FrameStore,
        original_keyframes: &[FrameId],
        recorded_store: &dyn FrameStore,
        recorded_keyframes: &[FrameId],
    ) -> Vec<KeyframeMatch> {
        self.match_keyframes_with_progress(
            original_store,
            original_keyframes,
            recorded_store,
            recorded_keyframes,
            |_, _| {},
        )
    }

    /// Like [`match_keyframes`](Self::match_keyframes), reporting
    /// `(matched_so_far, total)` as original keyframes complete.
    pub fn match_keyframes_with_progress<F>(
        &self,
        original_store: &dyn FrameStore,
        original_keyframes: &[FrameId],
        recorded_store: &dyn FrameStore,
        recorded_keyframes: &[FrameId],
        progress: F,
    ) -> Vec<KeyframeMatch>
    where
        F: Fn(usize, usize) + Sync,
    {
        let candidates = self.load_candidates(recorded_store, recorded_keyframes);
        let total = original_keyframes.len();
        let done = AtomicUsize::new(0);

        let matches: Vec<KeyframeMatch> = original_keyframes
            .par_iter()
            .map(|&original| {
                let result = self.match_one(original_store, original, &candidates);
                progress(done.fetch_add(1, Ordering::Relaxed) + 1, total);
                result
            })
            .collect();

        let accepted = matches.iter().filter(|m| m.is_accepted()).count();
        tracing::info!(
            "Matched {}/{} original keyframes (radius {}, threshold {})",
            accepted,
            total,
            self.config.window_radius,
            self.config.accept_threshold
        );
        matches
    }

    /// Decode each recorded keyframe once, ascending and deduplicated.
    fn load_candidates(&self, store: &dyn FrameStore, keyframes: &[FrameId]) -> Vec<Candidate> {
        let mut ids = keyframes.to_vec();
        ids.sort_unstable();
        ids.dedup();

        ids.par_iter()
            .map(|&id| {
                let histogram = match store.load(id) {
                    Ok(frame) => Some(Histogram::from_image(&frame)),
                    Err(e) => {
                        tracing::warn!("Recorded keyframe skipped as candidate: {}", e);
                        None
                    }
                };
                Candidate { id, histogram }
            })
            .collect()
    }

    /// Recorded candidates with `|r - original| <= window_radius`.
    fn window<'a>(&self, original: FrameId, candidates: &'a [Candidate]) -> &'a [Candidate] {
        let lo = original.index().saturating_sub(self.config.window_radius);
        let hi = original.index().saturating_add(self.config.window_radius);
        let start = candidates.partition_point(|c| c.id.index() < lo);
        let end = candidates.partition_point(|c| c.id.index() <= hi);
        &candidates[start..end]
    }

    fn match_one(
        &self,
        store: &dyn FrameStore,
        original: FrameId,
        candidates: &[Candidate],
    ) -> KeyframeMatch {
        let frame = match store.load(original) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Original keyframe {} unreadable, no match: {}", original, e);
                return KeyframeMatch::rejected(original, NO_SCORE);
            }
        };
        let histogram = Histogram::from_image(&frame);

        let mut best = BestSoFar::default();
        for candidate in self.window(original, candidates) {
            if let Some(ref recorded) = candidate.histogram {
                let score = histogram.correlation(recorded);
                tracing::debug!("{} vs recorded {}: {:.6}", original, candidate.id, score);
                best.offer(candidate.id, score);
            }
        }

        let Some(score) = best.score else {
            tracing::warn!(
                "No recorded keyframe within {} frames of original {}",
                self.config.window_radius,
                original
            );
            return KeyframeMatch::rejected(original, NO_SCORE);
        };

        if score < self.config.accept_threshold {
            tracing::warn!(
                "Original keyframe {} rejected: best score {:.4} below {}",
                original,
                score,
                self.config.accept_threshold
            );
            return KeyframeMatch::rejected(original, score);
        }

        match self.policy.choose(original, &best.ties) {
            Some(recorded) => {
                if best.ties.len() > 1 {
                    tracing::info!(
                        "Original keyframe {}: {} candidates tied at {:.4}, {} picked {}",
                        original,
                        best.ties.len(),
                        score,
                        self.policy.name(),
                        recorded
                    );
                }
                let matched = KeyframeMatch::accepted(original, recorded, score, best.ties);
                tracing::info!(
                    "Original keyframe {} -> recorded {} (score {:.4}, offset {})",
                    original,
                    recorded,
                    score,
                    matched.frame_offset_label()
                );
                matched
            }
            None => KeyframeMatch::rejected(original, score),
        }
    }
}

impl Default for KeyframeMatcher {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}
