/// Scene data — the generated passage plus its metadata, emotion arc,
/// and feedback history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::memory::{CharacterId, ThemeId};

/// Newtype wrapper for scene IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

/// Newtype wrapper for feedback round IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(pub String);

impl SceneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FeedbackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Selection lists offered by the composer. Free selection: the generator
/// does not validate labels against these lists.
pub const GENRES: &[&str] = &[
    "Drama", "Thriller", "Romance", "Mystery", "Sci-Fi", "Fantasy", "Horror",
];
pub const TONES: &[&str] = &[
    "Dark", "Hopeful", "Melancholic", "Tense", "Intimate", "Mysterious", "Energetic",
];
pub const SCENE_TYPES: &[&str] = &[
    "Dialogue", "Action", "Introspection", "Confrontation", "Discovery", "Memory",
];

/// One sentence's position-tagged sentiment score.
///
/// Produced in a batch per scene and replaced wholesale on re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPoint {
    /// Integer percent through the scene, 0–100, monotonic across a batch.
    pub position: u8,
    /// Signed sentiment value, clamped to [-1, 1].
    pub value: f64,
    /// The sentence this point was scored from.
    pub sentence: String,
}

/// Four-category feedback scores.
///
/// The mock reviewer bounds each field to its documented range, but
/// consumers must not assume the bound is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackScore {
    pub coherence: u8,
    pub dialogue: u8,
    pub emotional_resonance: u8,
    pub symbolism: u8,
}

impl FeedbackScore {
    /// Unweighted mean of the four categories.
    pub fn overall(&self) -> f64 {
        (self.coherence as f64
            + self.dialogue as f64
            + self.emotional_resonance as f64
            + self.symbolism as f64)
            / 4.0
    }
}

/// One invocation's worth of scores and suggestions. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRound {
    pub id: FeedbackId,
    pub timestamp: DateTime<Utc>,
    pub scores: FeedbackScore,
    pub suggestions: Vec<String>,
    /// Snapshot of the scene text at scoring time.
    pub scene_text: String,
}

/// One generated narrative passage plus everything attached to it.
///
/// Exactly one scene is "current" at a time; generating a new scene
/// replaces the previous one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneData {
    pub id: SceneId,
    pub prompt: String,
    /// The working text. May be edited by the writer.
    pub generated_text: String,
    /// The text exactly as generated, kept for revert.
    pub original_text: String,
    /// Character selection snapshot at generation time, not live references.
    pub selected_characters: Vec<CharacterId>,
    pub selected_themes: Vec<ThemeId>,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub scene_type: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub emotion_data: Vec<EmotionPoint>,
    pub feedback_history: Vec<FeedbackRound>,
}

impl SceneData {
    pub fn latest_feedback(&self) -> Option<&FeedbackRound> {
        self.feedback_history.last()
    }

    /// Replace the working text with an edit.
    pub fn edit_text(&mut self, text: impl Into<String>) {
        self.generated_text = text.into();
    }

    /// Restore the text exactly as it came out of generation.
    pub fn revert_to_original(&mut self) {
        self.generated_text = self.original_text.clone();
    }

    pub fn is_edited(&self) -> bool {
        self.generated_text != self.original_text
    }

    pub fn word_count(&self) -> usize {
        self.generated_text.split_whitespace().count()
    }
}
