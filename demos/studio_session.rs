/// A full studio session: load the catalog, generate a scene, let the
/// auto-trigger analyze its emotion arc, request a feedback round, and
/// export the story bundle to a temp directory.

use std::path::Path;
use std::time::Duration;

use inkframe::core::emotion::EmotionAnalyzer;
use inkframe::core::export::ExportAssembler;
use inkframe::core::feedback::FeedbackScorer;
use inkframe::core::generator::{SceneGenerator, SceneRequest};
use inkframe::schema::memory::{CharacterId, MemoryCatalog, ThemeId};
use inkframe::SessionHandle;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let session = SessionHandle::new();
    let catalog = MemoryCatalog::load_from_json(
        Path::new("data/characters.json"),
        Path::new("data/themes.json"),
    )?;
    println!(
        "Catalog: {} characters, {} themes",
        catalog.characters.len(),
        catalog.themes.len()
    );
    session.load_memory_data(catalog.clone()).await;

    // Short latencies so the demo does not dawdle; drop the overrides to
    // feel the simulated "AI" delays.
    let mut generator = SceneGenerator::new().with_latency(Duration::from_millis(200));
    let mut analyzer = EmotionAnalyzer::new().with_latency(Duration::from_millis(250));
    let mut scorer = FeedbackScorer::new().with_latency(Duration::from_millis(300));

    let mut request =
        SceneRequest::new("A tense confrontation between two characters who share a dark secret");
    request.genre = Some("Drama".to_string());
    request.tone = Some("Tense".to_string());
    request.scene_type = Some("Confrontation".to_string());
    request.characters = vec![CharacterId::from("char-elena")];
    request.themes = vec![ThemeId::from("theme-concealment")];
    if let (Some(lead), Some(theme)) = (
        catalog.character(&request.characters[0]),
        catalog.theme(&request.themes[0]),
    ) {
        println!("Composing around {} with the \"{}\" theme", lead.name, theme.name);
    }

    let scene = generator.generate(&session, request).await?;
    println!("\n--- {} ---\n{}\n", scene.id.as_str(), scene.generated_text);

    if let Some(summary) = analyzer.auto_analyze(&session).await {
        println!(
            "Emotion arc: {} (avg {:.2}, high {:.2}, low {:.2})",
            summary.trend.as_str(),
            summary.average,
            summary.peak_high,
            summary.peak_low
        );
    }

    if let Some(round) = scorer.score(&session).await {
        println!("Overall feedback score: {:.1}/10", round.scores.overall());
        for suggestion in &round.suggestions {
            println!("  - {}", suggestion);
        }
    }

    let dir = std::env::temp_dir();
    let path = ExportAssembler::new().export_to_dir(&session, &dir).await?;
    println!("\nStory bundle written to {}", path.display());

    Ok(())
}
