/// Session integration tests — store contracts driven through the engines.

use std::path::Path;
use std::time::Duration;

use inkframe::core::emotion::{EmotionAnalyzer, KeywordScorer};
use inkframe::core::feedback::{FeedbackScorer, MockReviewer};
use inkframe::core::generator::{GenerateError, SceneGenerator, SceneRequest, FALLBACK_LEAD};
use inkframe::core::store::FEEDBACK_HISTORY_LIMIT;
use inkframe::schema::memory::{CharacterId, MemoryCatalog};
use inkframe::SessionHandle;

fn fast_generator() -> SceneGenerator {
    SceneGenerator::new().with_latency(Duration::ZERO)
}

fn fast_analyzer(seed: u64) -> EmotionAnalyzer {
    EmotionAnalyzer::with_scorer(Box::new(KeywordScorer::with_seed(seed)))
        .with_latency(Duration::ZERO)
}

fn fast_scorer(seed: u64) -> FeedbackScorer {
    FeedbackScorer::with_backend(Box::new(MockReviewer::with_seed(seed)))
        .with_latency(Duration::ZERO)
}

async fn session_with_catalog() -> SessionHandle {
    let session = SessionHandle::new();
    let catalog = MemoryCatalog::load_from_json(
        Path::new("data/characters.json"),
        Path::new("data/themes.json"),
    )
    .unwrap();
    session.load_memory_data(catalog).await;
    session
}

#[tokio::test]
async fn shipped_catalog_loads() {
    let session = session_with_catalog().await;
    let state = session.lock().await;
    assert!(!state.memory.characters.is_empty());
    assert!(!state.memory.themes.is_empty());
}

#[tokio::test]
async fn generated_scene_ids_are_unique() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();

    let first = generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();
    let second = generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn empty_prompt_is_rejected_before_flags() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();

    let result = generator
        .generate(&session, SceneRequest::new("   \n\t"))
        .await;
    assert!(matches!(result, Err(GenerateError::EmptyPrompt)));
    assert!(!session.is_generating().await);
    assert!(session.current_scene().await.is_none());
}

#[tokio::test]
async fn no_characters_selected_uses_fallback_phrase() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();

    let scene = generator
        .generate(&session, SceneRequest::new("A tense confrontation"))
        .await
        .unwrap();

    assert!(scene.generated_text.contains(FALLBACK_LEAD));
    assert!(!scene.generated_text.contains("Elena"));
}

#[tokio::test]
async fn selected_character_name_appears() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();

    let mut request = SceneRequest::new("A tense confrontation");
    request.characters = vec![CharacterId::from("char-elena")];
    let scene = generator.generate(&session, request).await.unwrap();

    assert!(scene.generated_text.contains("Elena Voss"));
    assert!(!scene.generated_text.contains(FALLBACK_LEAD));
}

#[tokio::test]
async fn regeneration_discards_edits() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();

    generator
        .generate(&session, SceneRequest::new("First draft"))
        .await
        .unwrap();
    {
        let mut state = session.lock().await;
        if let Some(scene) = state.current_scene.as_mut() {
            scene.edit_text("Hand-polished version.");
        }
    }

    let regenerated = generator
        .generate(&session, SceneRequest::new("First draft"))
        .await
        .unwrap();
    assert!(!regenerated.is_edited());
    let current = session.current_scene().await.unwrap();
    assert_ne!(current.generated_text, "Hand-polished version.");
    assert!(current.emotion_data.is_empty());
    assert!(current.feedback_history.is_empty());
}

#[tokio::test]
async fn generating_flag_resets_after_completion() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();
    assert!(!session.is_generating().await);
}

#[tokio::test]
async fn four_feedback_rounds_keep_newest_three() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();
    let mut scorer = fast_scorer(5);

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();

    let mut returned = Vec::new();
    for _ in 0..4 {
        returned.push(scorer.score(&session).await.unwrap());
    }

    let scene = session.current_scene().await.unwrap();
    assert_eq!(scene.feedback_history.len(), FEEDBACK_HISTORY_LIMIT);

    // Chronological order, oldest of the four evicted
    let kept: Vec<&str> = scene
        .feedback_history
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    let expected: Vec<&str> = returned[1..].iter().map(|r| r.id.as_str()).collect();
    assert_eq!(kept, expected);
    for pair in scene.feedback_history.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[tokio::test]
async fn feedback_after_clearing_scene_is_noop() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();
    let mut scorer = fast_scorer(5);

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();
    session.set_current_scene(None).await;

    assert!(scorer.score(&session).await.is_none());
    assert!(session.current_scene().await.is_none());
    assert!(!session.is_analyzing().await);
}

#[tokio::test]
async fn analyzer_positions_span_and_stay_monotonic() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();
    let mut analyzer = fast_analyzer(21);

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();
    analyzer.analyze(&session).await.unwrap();

    let scene = session.current_scene().await.unwrap();
    let points = &scene.emotion_data;
    assert!(points.len() > 1);
    assert_eq!(points.first().unwrap().position, 0);
    assert_eq!(points.last().unwrap().position, 100);
    for pair in points.windows(2) {
        assert!(pair[0].position <= pair[1].position);
    }
    for point in points {
        assert!((-1.0..=1.0).contains(&point.value));
    }
    assert!(!session.is_analyzing().await);
}

#[tokio::test]
async fn analyzer_without_scene_is_noop() {
    let session = SessionHandle::new();
    let mut analyzer = fast_analyzer(21);
    assert!(analyzer.analyze(&session).await.is_none());
    assert!(!session.is_analyzing().await);
}

#[tokio::test]
async fn reanalysis_replaces_points_wholesale() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();
    let mut analyzer = fast_analyzer(21);

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();
    analyzer.analyze(&session).await.unwrap();
    let first_len = session.current_scene().await.unwrap().emotion_data.len();

    analyzer.analyze(&session).await.unwrap();
    let scene = session.current_scene().await.unwrap();
    // Same structure; values may differ run to run
    assert_eq!(scene.emotion_data.len(), first_len);
}

#[tokio::test]
async fn auto_analysis_runs_exactly_once_per_scene() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();
    let mut analyzer = fast_analyzer(21);

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();

    assert!(analyzer.auto_analyze(&session).await.is_some());

    // Empty the point list again: the same scene must not re-trigger.
    session.lock().await.update_emotion_data(Vec::new());
    assert!(analyzer.auto_analyze(&session).await.is_none());

    // A new scene triggers again.
    generator
        .generate(&session, SceneRequest::new("A second scene"))
        .await
        .unwrap();
    assert!(analyzer.auto_analyze(&session).await.is_some());
}

#[tokio::test]
async fn abandoned_generation_clears_flag() {
    let session = session_with_catalog().await;
    let mut generator = SceneGenerator::new().with_latency(Duration::from_millis(400));

    // The caller gives up mid-latency; the in-flight future is dropped.
    let result = tokio::time::timeout(
        Duration::from_millis(50),
        generator.generate(&session, SceneRequest::new("A quiet reunion")),
    )
    .await;
    assert!(result.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!session.is_generating().await);
    assert!(session.current_scene().await.is_none());
}

#[tokio::test]
async fn abandoned_analysis_clears_flag() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();
    let mut analyzer = EmotionAnalyzer::with_scorer(Box::new(KeywordScorer::with_seed(21)))
        .with_latency(Duration::from_millis(400));

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();

    let result =
        tokio::time::timeout(Duration::from_millis(50), analyzer.analyze(&session)).await;
    assert!(result.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!session.is_analyzing().await);
    // The interrupted run wrote nothing.
    assert!(session.current_scene().await.unwrap().emotion_data.is_empty());
}

#[tokio::test]
async fn abandoned_feedback_clears_flag() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();
    let mut scorer = FeedbackScorer::with_backend(Box::new(MockReviewer::with_seed(5)))
        .with_latency(Duration::from_millis(400));

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();

    let result = tokio::time::timeout(Duration::from_millis(50), scorer.score(&session)).await;
    assert!(result.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!session.is_analyzing().await);
    assert!(session
        .current_scene()
        .await
        .unwrap()
        .feedback_history
        .is_empty());
}

#[tokio::test]
async fn busy_flags_are_independent() {
    // Both flags can be true at once; nothing in the state layer enforces
    // mutual exclusion. Documented background behavior, not a bug.
    let session = SessionHandle::new();
    {
        let mut state = session.lock().await;
        state.set_generating(true);
        state.set_analyzing(true);
    }
    assert!(session.is_generating().await);
    assert!(session.is_analyzing().await);
}

#[tokio::test]
async fn feedback_scores_respect_documented_ranges() {
    let session = session_with_catalog().await;
    let mut generator = fast_generator();
    let mut scorer = fast_scorer(17);

    generator
        .generate(&session, SceneRequest::new("A quiet reunion"))
        .await
        .unwrap();

    for _ in 0..20 {
        let round = scorer.score(&session).await.unwrap();
        assert!((7..=9).contains(&round.scores.coherence));
        assert!((6..=9).contains(&round.scores.dialogue));
        assert!((8..=9).contains(&round.scores.emotional_resonance));
        assert!((6..=8).contains(&round.scores.symbolism));
        assert_eq!(round.suggestions.len(), 4);
    }
}
