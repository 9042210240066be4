/// Export bundle assembly — scene text, feedback record, emotion CSV,
/// and the human-readable report, packed into one ZIP archive.
///
/// Member names and the CSV quote-escaping rule are a compatibility
/// contract with previously exported bundles; do not change them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::core::emotion::{summarize, EmotionSummary};
use crate::core::store::SessionHandle;
use crate::schema::memory::{CharacterId, ThemeId};
use crate::schema::scene::{EmotionPoint, FeedbackRound, SceneData, SceneId};

pub const SCENE_MEMBER: &str = "scene.txt";
pub const FEEDBACK_MEMBER: &str = "feedback.json";
pub const EMOTION_MEMBER: &str = "emotion_data.csv";
pub const REPORT_MEMBER: &str = "meta_score.txt";

pub const EMOTION_CSV_HEADER: &str = "Position,EmotionValue,Sentence";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no scene to export")]
    NoScene,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The `feedback.json` member: latest round, full history, and scene
/// metadata. Field casing matches the original export format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackRecord<'a> {
    latest_feedback: Option<&'a FeedbackRound>,
    feedback_history: &'a [FeedbackRound],
    scene_metadata: SceneMetadata<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneMetadata<'a> {
    id: &'a SceneId,
    prompt: &'a str,
    genre: &'a Option<String>,
    tone: &'a Option<String>,
    scene_type: &'a Option<String>,
    selected_characters: &'a [CharacterId],
    selected_themes: &'a [ThemeId],
    timestamp: &'a DateTime<Utc>,
}

/// A fully assembled bundle, ready to hand to the host for download or
/// to write to disk.
#[derive(Debug, Clone)]
pub struct StoryBundle {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Quote a CSV field, doubling embedded quote characters so the table
/// stays parseable.
fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render the emotion point table. Header-only when no analysis ran.
pub fn emotion_csv(points: &[EmotionPoint]) -> String {
    let mut lines = Vec::with_capacity(points.len() + 1);
    lines.push(EMOTION_CSV_HEADER.to_string());
    for point in points {
        lines.push(format!(
            "{},{},{}",
            point.position,
            point.value,
            csv_quote(&point.sentence)
        ));
    }
    lines.join("\n")
}

fn label_or_unspecified(label: &Option<String>) -> &str {
    label.as_deref().unwrap_or("Not specified")
}

/// Render the `meta_score.txt` report.
///
/// The emotion section is computed by the same `summarize` the analyzer
/// uses, so the report never drifts from the analyzer's statistics.
pub fn render_report(scene: &SceneData, generated_at: DateTime<Utc>) -> String {
    let mut report = String::new();

    report.push_str("INKFRAME SCENE ANALYSIS REPORT\n");
    report.push_str(&format!(
        "Generated: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str("SCENE METADATA\n==============\n");
    report.push_str(&format!("Title: {}\n", scene.id.as_str()));
    report.push_str(&format!("Prompt: {}\n", scene.prompt));
    report.push_str(&format!("Genre: {}\n", label_or_unspecified(&scene.genre)));
    report.push_str(&format!("Tone: {}\n", label_or_unspecified(&scene.tone)));
    report.push_str(&format!(
        "Scene Type: {}\n",
        label_or_unspecified(&scene.scene_type)
    ));
    report.push_str(&format!(
        "Created: {}\n\n",
        scene.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str("FEEDBACK SCORES\n===============\n");
    match scene.latest_feedback() {
        Some(latest) => {
            report.push_str(&format!("Coherence: {}/10\n", latest.scores.coherence));
            report.push_str(&format!("Dialogue: {}/10\n", latest.scores.dialogue));
            report.push_str(&format!(
                "Emotional Resonance: {}/10\n",
                latest.scores.emotional_resonance
            ));
            report.push_str(&format!("Symbolism: {}/10\n\n", latest.scores.symbolism));
            report.push_str(&format!(
                "OVERALL SCORE: {:.1}/10\n\n",
                latest.scores.overall()
            ));

            report.push_str("SUGGESTIONS\n===========\n");
            for (i, suggestion) in latest.suggestions.iter().enumerate() {
                report.push_str(&format!("{}. {}\n", i + 1, suggestion));
            }
            report.push('\n');
        }
        None => {
            report.push_str("No feedback yet.\n\n");
        }
    }

    report.push_str("EMOTIONAL ANALYSIS\n==================\n");
    match summarize(&scene.emotion_data) {
        Some(summary) => {
            report.push_str(&render_emotion_section(&scene.emotion_data, &summary));
        }
        None => {
            report.push_str("Emotion analysis not yet performed\n");
        }
    }

    report
}

fn render_emotion_section(points: &[EmotionPoint], summary: &EmotionSummary) -> String {
    format!(
        "Emotion data points: {}\nAverage emotion: {:.2}\nPeak positive: {:.2}\nPeak negative: {:.2}\nTrend: {}\n",
        points.len(),
        summary.average,
        summary.peak_high,
        summary.peak_low,
        summary.trend.as_str()
    )
}

/// `inkframe_{scene id}_{YYYY-MM-DD}.zip`
pub fn bundle_filename(scene_id: &SceneId, date: NaiveDate) -> String {
    format!("inkframe_{}_{}.zip", scene_id.as_str(), date.format("%Y-%m-%d"))
}

/// Assemble the four-member archive for a scene. Pure function of the
/// scene snapshot; session state is never touched.
pub fn assemble_bundle(scene: &SceneData) -> Result<StoryBundle, ExportError> {
    let now = Utc::now();

    let record = FeedbackRecord {
        latest_feedback: scene.latest_feedback(),
        feedback_history: &scene.feedback_history,
        scene_metadata: SceneMetadata {
            id: &scene.id,
            prompt: &scene.prompt,
            genre: &scene.genre,
            tone: &scene.tone,
            scene_type: &scene.scene_type,
            selected_characters: &scene.selected_characters,
            selected_themes: &scene.selected_themes,
            timestamp: &scene.timestamp,
        },
    };
    let feedback_json = serde_json::to_string_pretty(&record)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer.start_file(SCENE_MEMBER, options)?;
    writer.write_all(scene.generated_text.as_bytes())?;

    writer.start_file(FEEDBACK_MEMBER, options)?;
    writer.write_all(feedback_json.as_bytes())?;

    writer.start_file(EMOTION_MEMBER, options)?;
    writer.write_all(emotion_csv(&scene.emotion_data).as_bytes())?;

    writer.start_file(REPORT_MEMBER, options)?;
    writer.write_all(render_report(scene, now).as_bytes())?;

    let cursor = writer.finish()?;
    Ok(StoryBundle {
        filename: bundle_filename(&scene.id, now.date_naive()),
        bytes: cursor.into_inner(),
    })
}

/// The async packaging wrapper. Reads a cloned scene snapshot, so a
/// packaging failure can never corrupt session state; failures are logged
/// and surfaced as a non-fatal error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportAssembler;

impl ExportAssembler {
    pub fn new() -> ExportAssembler {
        ExportAssembler
    }

    /// Assemble a bundle from the current scene. Disabled (`NoScene`)
    /// when no scene exists.
    pub async fn export(&self, session: &SessionHandle) -> Result<StoryBundle, ExportError> {
        let scene = session.current_scene().await.ok_or(ExportError::NoScene)?;
        match assemble_bundle(&scene) {
            Ok(bundle) => {
                info!(filename = bundle.filename.as_str(), "story bundle assembled");
                Ok(bundle)
            }
            Err(e) => {
                warn!(error = %e, "story bundle assembly failed");
                Err(e)
            }
        }
    }

    /// Assemble and write the bundle into `dir`, returning the path.
    pub async fn export_to_dir(
        &self,
        session: &SessionHandle,
        dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        let bundle = self.export(session).await?;
        let path = dir.join(&bundle.filename);
        tokio::fs::write(&path, &bundle.bytes).await?;
        info!(path = %path.display(), "story bundle written");
        Ok(path)
    }
}
