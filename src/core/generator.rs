/// Scene generation — prompt plus parameters in, a fresh scene draft out.
///
/// The composition itself sits behind the `SceneBackend` trait; the engine
/// owns the latency-and-flag discipline and the session write, so a real
/// inference backend can drop in without touching the store.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::core::store::{BusyFlag, BusyGuard, SessionHandle};
use crate::schema::memory::{Character, CharacterId, ThemeId};
use crate::schema::scene::{SceneData, SceneId};

/// Default simulated generation latency.
pub const GENERATION_LATENCY: Duration = Duration::from_millis(2000);

/// Fallback noun phrase when no character is selected.
pub const FALLBACK_LEAD: &str = "the protagonist";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("prompt is empty")]
    EmptyPrompt,
}

/// Everything the writer chose before pressing generate.
///
/// Labels are free selections; they are not validated against the fixed
/// lists at this layer. Id lists are snapshots and may be empty.
#[derive(Debug, Clone, Default)]
pub struct SceneRequest {
    pub prompt: String,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub scene_type: Option<String>,
    pub characters: Vec<CharacterId>,
    pub themes: Vec<ThemeId>,
}

impl SceneRequest {
    pub fn new(prompt: impl Into<String>) -> SceneRequest {
        SceneRequest {
            prompt: prompt.into(),
            ..SceneRequest::default()
        }
    }
}

/// Strategy seam for text composition.
pub trait SceneBackend: Send {
    /// Compose scene text for the request. `lead` is the first selected
    /// character that resolved against the catalog, if any.
    fn compose(&mut self, request: &SceneRequest, lead: Option<&Character>) -> String;
}

/// The shipped backend: a fixed template that works the lead character's
/// name (or the generic fallback) into the passage.
#[derive(Debug, Default)]
pub struct MockSceneBackend;

impl SceneBackend for MockSceneBackend {
    fn compose(&mut self, _request: &SceneRequest, lead: Option<&Character>) -> String {
        let name = lead.map(|c| c.name.as_str()).unwrap_or(FALLBACK_LEAD);
        let name_capitalized = capitalize_first(name);
        format!(
            "The room fell silent as {name} entered. The air thick with tension, \
             shadows dancing across worn wooden floors.\n\n\
             \"I know what you did,\" came the whispered accusation, barely audible \
             yet cutting through the silence like a blade.\n\n\
             {name_capitalized} stood frozen, heart hammering against ribs, mind racing \
             through possibilities. This was the moment everything would change, the \
             precipice between before and after.\n\n\
             The accusation hung in the air, demanding an answer that might shatter \
             everything carefully built over years of careful deception."
        )
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The generation engine. Validates the prompt, simulates latency under
/// the generating flag, and installs the new scene wholesale.
pub struct SceneGenerator {
    backend: Box<dyn SceneBackend>,
    latency: Duration,
    rng: StdRng,
}

impl SceneGenerator {
    pub fn new() -> SceneGenerator {
        Self::with_backend(Box::new(MockSceneBackend))
    }

    pub fn with_backend(backend: Box<dyn SceneBackend>) -> SceneGenerator {
        SceneGenerator {
            backend,
            latency: GENERATION_LATENCY,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> SceneGenerator {
        self.latency = latency;
        self
    }

    /// Generate a new scene and make it current, replacing any previous
    /// scene (and its edits) wholesale. Regeneration is this same call
    /// re-invoked.
    ///
    /// An empty or whitespace-only prompt is rejected before any flag is
    /// touched. The generating flag is reset on every exit path, even
    /// when the caller drops the call mid-latency.
    pub async fn generate(
        &mut self,
        session: &SessionHandle,
        request: SceneRequest,
    ) -> Result<SceneData, GenerateError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }

        let guard = {
            let mut state = session.lock().await;
            BusyGuard::raise(session, &mut state, BusyFlag::Generating)
        };

        tokio::time::sleep(self.latency).await;

        let mut state = session.lock().await;
        let lead = request
            .characters
            .first()
            .and_then(|id| state.memory.character(id));

        let text = self.backend.compose(&request, lead);
        let scene = SceneData {
            id: self.fresh_scene_id(),
            prompt: request.prompt,
            generated_text: text.clone(),
            original_text: text,
            selected_characters: request.characters,
            selected_themes: request.themes,
            genre: request.genre,
            tone: request.tone,
            scene_type: request.scene_type,
            timestamp: Utc::now(),
            emotion_data: Vec::new(),
            feedback_history: Vec::new(),
        };

        state.set_current_scene(Some(scene.clone()));
        guard.release(&mut state);
        drop(state);

        info!(scene_id = scene.id.as_str(), "scene generated");
        Ok(scene)
    }

    /// A fresh identifier, unique per call: millisecond timestamp plus a
    /// random suffix to avoid collisions within the same millisecond.
    fn fresh_scene_id(&mut self) -> SceneId {
        SceneId(format!(
            "scene-{}-{:08x}",
            Utc::now().timestamp_millis(),
            self.rng.gen::<u32>()
        ))
    }
}

impl Default for SceneGenerator {
    fn default() -> Self {
        Self::new()
    }
}
