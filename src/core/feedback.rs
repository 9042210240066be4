/// Feedback scoring — category score ranges, suggestions, and the
/// scoring engine.
///
/// Category ranges are configuration data rather than inline literals, so
/// a real reviewer backend can later replace the sampler without changing
/// the shapes it produces.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::core::store::{BusyFlag, BusyGuard, SessionHandle};
use crate::schema::scene::{FeedbackId, FeedbackRound, FeedbackScore};

/// Default simulated review latency.
pub const REVIEW_LATENCY: Duration = Duration::from_millis(3000);

/// Suggestions returned by the mock reviewer. Static content in this
/// version, not derived from the text.
pub const DEFAULT_SUGGESTIONS: &[&str] = &[
    "Consider adding more sensory details to ground the reader in the scene",
    "The dialogue feels authentic, but could benefit from more subtext",
    "Strong emotional core - the tension is palpable",
    "The symbolism of shadows and light could be developed further",
];

#[derive(Debug, Error)]
pub enum ScoreConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Inclusive bound for one category's sampled score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: u8,
    pub max: u8,
}

impl ScoreRange {
    fn sample(&self, rng: &mut StdRng) -> u8 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Per-category sampling ranges for the mock reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRanges {
    pub coherence: ScoreRange,
    pub dialogue: ScoreRange,
    pub emotional_resonance: ScoreRange,
    pub symbolism: ScoreRange,
}

impl Default for ScoreRanges {
    fn default() -> Self {
        ScoreRanges {
            coherence: ScoreRange { min: 7, max: 9 },
            dialogue: ScoreRange { min: 6, max: 9 },
            emotional_resonance: ScoreRange { min: 8, max: 9 },
            symbolism: ScoreRange { min: 6, max: 8 },
        }
    }
}

impl ScoreRanges {
    /// Load ranges from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<ScoreRanges, ScoreConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse ranges from a RON string.
    pub fn parse_ron(input: &str) -> Result<ScoreRanges, ScoreConfigError> {
        Ok(ron::from_str(input)?)
    }

    fn sample(&self, rng: &mut StdRng) -> FeedbackScore {
        FeedbackScore {
            coherence: self.coherence.sample(rng),
            dialogue: self.dialogue.sample(rng),
            emotional_resonance: self.emotional_resonance.sample(rng),
            symbolism: self.symbolism.sample(rng),
        }
    }
}

/// Strategy seam for scene review.
pub trait FeedbackBackend: Send {
    /// Review a scene-text snapshot into scores and suggestions.
    fn review(&mut self, scene_text: &str) -> (FeedbackScore, Vec<String>);
}

/// The shipped reviewer: samples the configured ranges and returns the
/// fixed suggestion list.
#[derive(Debug)]
pub struct MockReviewer {
    ranges: ScoreRanges,
    rng: StdRng,
}

impl MockReviewer {
    pub fn new() -> MockReviewer {
        MockReviewer {
            ranges: ScoreRanges::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> MockReviewer {
        MockReviewer {
            ranges: ScoreRanges::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_ranges(mut self, ranges: ScoreRanges) -> MockReviewer {
        self.ranges = ranges;
        self
    }
}

impl Default for MockReviewer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackBackend for MockReviewer {
    fn review(&mut self, _scene_text: &str) -> (FeedbackScore, Vec<String>) {
        let scores = self.ranges.sample(&mut self.rng);
        let suggestions = DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
        (scores, suggestions)
    }
}

/// The review engine: snapshots the scene text, simulates latency under
/// the analyzing flag, and appends the round through the store's bounded
/// history append.
pub struct FeedbackScorer {
    backend: Box<dyn FeedbackBackend>,
    latency: Duration,
    rng: StdRng,
}

impl FeedbackScorer {
    pub fn new() -> FeedbackScorer {
        Self::with_backend(Box::new(MockReviewer::new()))
    }

    pub fn with_backend(backend: Box<dyn FeedbackBackend>) -> FeedbackScorer {
        FeedbackScorer {
            backend,
            latency: REVIEW_LATENCY,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> FeedbackScorer {
        self.latency = latency;
        self
    }

    /// Score the current scene. No-op (returns `None`) when there is no
    /// current scene. The analyzing flag is reset on every exit path,
    /// even when the caller drops the call mid-latency.
    pub async fn score(&mut self, session: &SessionHandle) -> Option<FeedbackRound> {
        let (scene_text, guard) = {
            let mut state = session.lock().await;
            let text = state.current_scene.as_ref()?.generated_text.clone();
            let guard = BusyGuard::raise(session, &mut state, BusyFlag::Analyzing);
            (text, guard)
        };

        tokio::time::sleep(self.latency).await;

        let (scores, suggestions) = self.backend.review(&scene_text);
        let round = FeedbackRound {
            id: self.fresh_feedback_id(),
            timestamp: Utc::now(),
            scores,
            suggestions,
            scene_text,
        };

        let mut state = session.lock().await;
        state.add_feedback_round(round.clone());
        guard.release(&mut state);
        drop(state);

        info!(
            feedback_id = round.id.as_str(),
            overall = round.scores.overall(),
            "feedback round recorded"
        );
        Some(round)
    }

    fn fresh_feedback_id(&mut self) -> FeedbackId {
        FeedbackId(format!(
            "feedback-{}-{:08x}",
            Utc::now().timestamp_millis(),
            self.rng.gen::<u32>()
        ))
    }
}

impl Default for FeedbackScorer {
    fn default() -> Self {
        Self::new()
    }
}
