/// Export integration tests — archive contract and CSV round-tripping.

use std::io::{Cursor, Read};
use std::time::Duration;

use chrono::Utc;
use inkframe::core::emotion::{EmotionAnalyzer, KeywordScorer};
use inkframe::core::export::{
    ExportAssembler, ExportError, EMOTION_CSV_HEADER, EMOTION_MEMBER, FEEDBACK_MEMBER,
    REPORT_MEMBER, SCENE_MEMBER,
};
use inkframe::core::feedback::{FeedbackScorer, MockReviewer};
use inkframe::core::generator::{SceneGenerator, SceneRequest};
use inkframe::SessionHandle;

async fn populated_session() -> SessionHandle {
    let session = SessionHandle::new();
    let mut generator = SceneGenerator::new().with_latency(Duration::ZERO);
    let mut analyzer = EmotionAnalyzer::with_scorer(Box::new(KeywordScorer::with_seed(13)))
        .with_latency(Duration::ZERO);
    let mut scorer = FeedbackScorer::with_backend(Box::new(MockReviewer::with_seed(13)))
        .with_latency(Duration::ZERO);

    generator
        .generate(&session, SceneRequest::new("A tense confrontation"))
        .await
        .unwrap();
    analyzer.analyze(&session).await.unwrap();
    scorer.score(&session).await.unwrap();
    session
}

fn member_text(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut out = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut out)
        .unwrap();
    out
}

/// Minimal parser for one data row of the emotion CSV: undoes the
/// quoting and quote-doubling applied on export.
fn parse_csv_row(line: &str) -> (u8, f64, String) {
    let mut parts = line.splitn(3, ',');
    let position = parts.next().unwrap().parse().unwrap();
    let value = parts.next().unwrap().parse().unwrap();
    let quoted = parts.next().unwrap();
    assert!(quoted.starts_with('"') && quoted.ends_with('"'));
    let sentence = quoted[1..quoted.len() - 1].replace("\"\"", "\"");
    (position, value, sentence)
}

#[tokio::test]
async fn bundle_has_the_four_contract_members() {
    let session = populated_session().await;
    let bundle = ExportAssembler::new().export(&session).await.unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bundle.bytes)).unwrap();
    assert_eq!(archive.len(), 4);
    for member in [SCENE_MEMBER, FEEDBACK_MEMBER, EMOTION_MEMBER, REPORT_MEMBER] {
        assert!(archive.by_name(member).is_ok(), "missing {}", member);
    }
}

#[tokio::test]
async fn scene_member_is_the_working_text() {
    let session = populated_session().await;
    let scene = session.current_scene().await.unwrap();
    let bundle = ExportAssembler::new().export(&session).await.unwrap();
    assert_eq!(member_text(&bundle.bytes, SCENE_MEMBER), scene.generated_text);
}

#[tokio::test]
async fn filename_embeds_scene_id_and_todays_date() {
    let session = populated_session().await;
    let scene = session.current_scene().await.unwrap();
    let bundle = ExportAssembler::new().export(&session).await.unwrap();

    let expected = format!(
        "inkframe_{}_{}.zip",
        scene.id.as_str(),
        Utc::now().format("%Y-%m-%d")
    );
    assert_eq!(bundle.filename, expected);
}

#[tokio::test]
async fn emotion_csv_round_trips_quoted_sentences() {
    let session = populated_session().await;
    let scene = session.current_scene().await.unwrap();
    let bundle = ExportAssembler::new().export(&session).await.unwrap();

    let csv = member_text(&bundle.bytes, EMOTION_MEMBER);
    let mut lines = csv.lines();
    assert_eq!(lines.next().unwrap(), EMOTION_CSV_HEADER);

    let rows: Vec<(u8, f64, String)> = lines.map(parse_csv_row).collect();
    assert_eq!(rows.len(), scene.emotion_data.len());

    // The mock scene contains a sentence with embedded double quotes;
    // every sentence must round-trip unchanged.
    assert!(scene.emotion_data.iter().any(|p| p.sentence.contains('"')));
    for (row, point) in rows.iter().zip(scene.emotion_data.iter()) {
        assert_eq!(row.0, point.position);
        assert!((row.1 - point.value).abs() < 1e-9);
        assert_eq!(row.2, point.sentence);
    }
}

#[tokio::test]
async fn report_statistics_match_the_analyzer() {
    let session = populated_session().await;
    let scene = session.current_scene().await.unwrap();
    let summary = inkframe::core::emotion::summarize(&scene.emotion_data).unwrap();

    let bundle = ExportAssembler::new().export(&session).await.unwrap();
    let report = member_text(&bundle.bytes, REPORT_MEMBER);

    assert!(report.contains(&format!("Emotion data points: {}", scene.emotion_data.len())));
    assert!(report.contains(&format!("Average emotion: {:.2}", summary.average)));
    assert!(report.contains(&format!("Peak positive: {:.2}", summary.peak_high)));
    assert!(report.contains(&format!("Peak negative: {:.2}", summary.peak_low)));
    assert!(report.contains(&format!("Trend: {}", summary.trend.as_str())));
}

#[tokio::test]
async fn feedback_member_carries_history_and_metadata() {
    let session = populated_session().await;
    let bundle = ExportAssembler::new().export(&session).await.unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&member_text(&bundle.bytes, FEEDBACK_MEMBER)).unwrap();

    assert!(json["latestFeedback"].is_object());
    assert_eq!(json["feedbackHistory"].as_array().unwrap().len(), 1);
    assert_eq!(
        json["sceneMetadata"]["prompt"].as_str().unwrap(),
        "A tense confrontation"
    );
    assert!(json["latestFeedback"]["scores"]["emotionalResonance"].is_u64());
}

#[tokio::test]
async fn export_without_scene_is_disabled() {
    let session = SessionHandle::new();
    let result = ExportAssembler::new().export(&session).await;
    assert!(matches!(result, Err(ExportError::NoScene)));
}

#[tokio::test]
async fn export_failure_leaves_session_untouched() {
    let session = populated_session().await;
    let before = session.current_scene().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    let result = ExportAssembler::new()
        .export_to_dir(&session, &missing)
        .await;
    assert!(matches!(result, Err(ExportError::Io(_))));

    let after = session.current_scene().await.unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.generated_text, before.generated_text);
    assert_eq!(after.feedback_history.len(), before.feedback_history.len());
    assert!(!session.is_analyzing().await && !session.is_generating().await);
}

#[tokio::test]
async fn export_to_dir_writes_the_archive() {
    let session = populated_session().await;
    let dir = tempfile::tempdir().unwrap();

    let path = ExportAssembler::new()
        .export_to_dir(&session, dir.path())
        .await
        .unwrap();
    assert!(path.exists());

    let bytes = std::fs::read(&path).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 4);
}
