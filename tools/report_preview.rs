/// Report Preview — runs one full mock session in the terminal and prints
/// the analysis report the export bundle would contain.
///
/// Usage: report_preview [--prompt <text>] [--character <id>] [--seed <n>]

use std::path::Path;
use std::time::Duration;

use inkframe::core::emotion::{summarize, EmotionAnalyzer, KeywordScorer};
use inkframe::core::export::render_report;
use inkframe::core::feedback::{FeedbackScorer, MockReviewer, ScoreRanges};
use inkframe::core::generator::{SceneGenerator, SceneRequest};
use inkframe::schema::memory::{CharacterId, MemoryCatalog};
use inkframe::SessionHandle;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut prompt = "A tense confrontation between two characters who share a dark secret"
        .to_string();
    let mut character: Option<String> = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--prompt" if i + 1 < args.len() => {
                i += 1;
                prompt = args[i].clone();
            }
            "--character" if i + 1 < args.len() => {
                i += 1;
                character = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--help" | "-h" => {
                println!(
                    "Usage: report_preview [--prompt <text>] [--character <id>] [--seed <n>]"
                );
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let session = SessionHandle::new();
    let catalog = match MemoryCatalog::load_from_json(
        Path::new("data/characters.json"),
        Path::new("data/themes.json"),
    ) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: Failed to load catalog: {}", e);
            std::process::exit(1);
        }
    };
    session.load_memory_data(catalog.clone()).await;

    let mut generator = SceneGenerator::new().with_latency(Duration::ZERO);
    let mut analyzer = EmotionAnalyzer::with_scorer(Box::new(KeywordScorer::with_seed(seed)))
        .with_latency(Duration::ZERO);
    // Retuned score ranges are picked up when the config file is present.
    let ranges = ScoreRanges::load_from_ron(Path::new("config/score_ranges.ron"))
        .unwrap_or_default();
    let mut scorer = FeedbackScorer::with_backend(Box::new(
        MockReviewer::with_seed(seed).with_ranges(ranges),
    ))
    .with_latency(Duration::ZERO);

    let mut request = SceneRequest::new(prompt);
    request.genre = Some("Drama".to_string());
    request.scene_type = Some("Confrontation".to_string());
    if let Some(id) = character {
        let id = CharacterId(id);
        if catalog.character(&id).is_none() {
            eprintln!(
                "WARNING: character '{}' is not in the catalog; the scene gets the generic lead",
                id.as_str()
            );
        }
        request.characters = vec![id];
    }

    let scene = match generator.generate(&session, request).await {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("=== Scene {} ===\n", scene.id.as_str());
    println!("{}\n", scene.generated_text);

    analyzer.auto_analyze(&session).await;
    scorer.score(&session).await;

    if let Some(current) = session.current_scene().await {
        if let Some(summary) = summarize(&current.emotion_data) {
            println!(
                "Emotion arc: {} (avg {:.2}, high {:.2}, low {:.2})\n",
                summary.trend.as_str(),
                summary.average,
                summary.peak_high,
                summary.peak_low
            );
        }
        println!("{}", render_report(&current, chrono::Utc::now()));
    }
}
