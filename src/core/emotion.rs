/// Emotion arc analysis — sentence-level sentiment heuristic and
/// aggregate statistics.
///
/// Scoring is a keyword-weighted heuristic with bounded random jitter,
/// isolated behind the `SentenceScorer` trait so a real sentiment backend
/// can satisfy the same contract later.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::core::store::{BusyFlag, BusyGuard, SessionHandle};
use crate::schema::scene::{EmotionPoint, SceneId};

/// Sentence-terminal punctuation used to split the scene into units.
const SENTENCE_ENDERS: &[char] = &['.', '!', '?'];

/// Keyword sets with their additive score deltas. Matching is substring
/// containment over the lowercased sentence, so "whisper" also fires on
/// "whispered".
const POSITIVE_WORDS: &[&str] = &[
    "hope", "joy", "love", "peace", "beautiful", "wonderful", "amazing", "success", "victory",
    "triumph",
];
const NEGATIVE_WORDS: &[&str] = &[
    "fear", "terror", "death", "pain", "sorrow", "hate", "anger", "despair", "failure", "darkness",
];
const TENSION_WORDS: &[&str] = &[
    "tension", "silence", "whisper", "shadow", "frozen", "heart hammering", "precipice",
];
const MYSTERY_WORDS: &[&str] = &["secret", "mystery", "hidden", "whispered", "accusation"];

const POSITIVE_WEIGHT: f64 = 0.6;
const NEGATIVE_WEIGHT: f64 = -0.7;
const TENSION_WEIGHT: f64 = -0.4;
const MYSTERY_WEIGHT: f64 = -0.3;

/// Half-width of the uniform jitter added to each sentence score.
const JITTER: f64 = 0.15;

/// Threshold separating rising/falling from stable in trend detection.
const TREND_THRESHOLD: f64 = 0.1;

/// Default simulated analysis latency.
pub const ANALYSIS_LATENCY: Duration = Duration::from_millis(2500);

/// Split text into sentence units, discarding empty fragments.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(SENTENCE_ENDERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The deterministic part of the heuristic: the sum of all applicable
/// keyword-set deltas, before jitter and clamping.
pub fn keyword_score(sentence: &str) -> f64 {
    let lower = sentence.to_lowercase();
    let mut score = 0.0;
    for (words, weight) in [
        (POSITIVE_WORDS, POSITIVE_WEIGHT),
        (NEGATIVE_WORDS, NEGATIVE_WEIGHT),
        (TENSION_WORDS, TENSION_WEIGHT),
        (MYSTERY_WORDS, MYSTERY_WEIGHT),
    ] {
        if words.iter().any(|w| lower.contains(w)) {
            score += weight;
        }
    }
    score
}

/// Strategy seam for sentence scoring.
pub trait SentenceScorer: Send {
    /// Score one sentence in [-1, 1].
    fn score(&mut self, sentence: &str) -> f64;
}

/// The shipped scorer: keyword heuristic plus bounded jitter.
#[derive(Debug)]
pub struct KeywordScorer {
    rng: StdRng,
}

impl KeywordScorer {
    pub fn new() -> KeywordScorer {
        KeywordScorer {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> KeywordScorer {
        KeywordScorer {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceScorer for KeywordScorer {
    fn score(&mut self, sentence: &str) -> f64 {
        let jittered = keyword_score(sentence) + self.rng.gen_range(-JITTER..=JITTER);
        jittered.clamp(-1.0, 1.0)
    }
}

/// Score every sentence of `text` into a positioned point batch.
///
/// Position for sentence `i` of `n` is `round(i / (n-1) * 100)`; a
/// single-sentence text gets position 0.
pub fn score_text(text: &str, scorer: &mut dyn SentenceScorer) -> Vec<EmotionPoint> {
    let sentences = split_sentences(text);
    let n = sentences.len();
    sentences
        .into_iter()
        .enumerate()
        .map(|(i, sentence)| {
            let position = if n > 1 {
                ((i as f64 / (n - 1) as f64) * 100.0).round() as u8
            } else {
                0
            };
            let value = scorer.score(&sentence);
            EmotionPoint {
                position,
                value,
                sentence,
            }
        })
        .collect()
}

/// Overall direction of the emotion arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionTrend {
    Rising,
    Falling,
    Stable,
}

impl EmotionTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

/// Aggregate statistics over one point batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionSummary {
    pub trend: EmotionTrend,
    pub average: f64,
    pub peak_high: f64,
    pub peak_low: f64,
}

/// Compute summary statistics. Returns `None` for an empty batch.
pub fn summarize(points: &[EmotionPoint]) -> Option<EmotionSummary> {
    if points.is_empty() {
        return None;
    }

    let average = points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64;
    let peak_high = points.iter().map(|p| p.value).fold(f64::MIN, f64::max);
    let peak_low = points.iter().map(|p| p.value).fold(f64::MAX, f64::min);

    // Second half starts at floor(n/2); for n == 1 both halves are the
    // single point.
    let mid = points.len() / 2;
    let (first, second) = if mid == 0 {
        (points, points)
    } else {
        points.split_at(mid)
    };
    let first_avg = first.iter().map(|p| p.value).sum::<f64>() / first.len() as f64;
    let second_avg = second.iter().map(|p| p.value).sum::<f64>() / second.len() as f64;

    let trend = if second_avg > first_avg + TREND_THRESHOLD {
        EmotionTrend::Rising
    } else if second_avg < first_avg - TREND_THRESHOLD {
        EmotionTrend::Falling
    } else {
        EmotionTrend::Stable
    };

    Some(EmotionSummary {
        trend,
        average,
        peak_high,
        peak_low,
    })
}

/// The analysis engine: snapshots the current scene's text, simulates
/// latency under the analyzing flag, then replaces the scene's emotion
/// points wholesale.
pub struct EmotionAnalyzer {
    scorer: Box<dyn SentenceScorer>,
    latency: Duration,
    last_auto_scene: Option<SceneId>,
}

impl EmotionAnalyzer {
    pub fn new() -> EmotionAnalyzer {
        Self::with_scorer(Box::new(KeywordScorer::new()))
    }

    pub fn with_scorer(scorer: Box<dyn SentenceScorer>) -> EmotionAnalyzer {
        EmotionAnalyzer {
            scorer,
            latency: ANALYSIS_LATENCY,
            last_auto_scene: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> EmotionAnalyzer {
        self.latency = latency;
        self
    }

    /// Analyze the current scene. No-op (returns `None`) when there is no
    /// current scene. The analyzing flag is reset on every exit path,
    /// even when the caller drops the call mid-latency.
    pub async fn analyze(&mut self, session: &SessionHandle) -> Option<EmotionSummary> {
        let (text, guard) = {
            let mut state = session.lock().await;
            let text = state.current_scene.as_ref()?.generated_text.clone();
            let guard = BusyGuard::raise(session, &mut state, BusyFlag::Analyzing);
            (text, guard)
        };

        tokio::time::sleep(self.latency).await;

        let points = score_text(&text, self.scorer.as_mut());
        let summary = summarize(&points);

        let mut state = session.lock().await;
        state.update_emotion_data(points);
        guard.release(&mut state);
        drop(state);

        debug!(?summary, "emotion analysis complete");
        summary
    }

    /// Run analysis automatically, exactly once per scene whose point list
    /// is still empty. Subsequent calls for the same scene are no-ops, so a
    /// host can invoke this on every state change.
    pub async fn auto_analyze(&mut self, session: &SessionHandle) -> Option<EmotionSummary> {
        let pending_id = {
            let state = session.lock().await;
            match &state.current_scene {
                Some(scene)
                    if scene.emotion_data.is_empty()
                        && self.last_auto_scene.as_ref() != Some(&scene.id) =>
                {
                    scene.id.clone()
                }
                _ => return None,
            }
        };

        self.last_auto_scene = Some(pending_id);
        self.analyze(session).await
    }
}

impl Default for EmotionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
