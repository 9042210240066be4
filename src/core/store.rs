/// Session state store — the single mutable state for a writing session.
///
/// Mutation happens only through the action methods below; the invariants
/// (feedback history cap, wholesale replacement semantics) live here and
/// nowhere else. `SessionHandle` wraps the state in one mutex so that a
/// multi-threaded host keeps the same last-write-wins semantics as the
/// single-threaded original.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::schema::memory::MemoryCatalog;
use crate::schema::scene::{EmotionPoint, FeedbackRound, SceneData};

/// A scene's feedback history retains at most this many rounds,
/// oldest evicted first.
pub const FEEDBACK_HISTORY_LIMIT: usize = 3;

/// The session state: one optional current scene, the read-only catalog,
/// and two independent busy flags.
///
/// No relation between the two flags is enforced; both can be true at
/// once. That is accepted background behavior, pinned by a test.
#[derive(Debug, Default)]
pub struct SessionState {
    pub current_scene: Option<SceneData>,
    pub is_generating: bool,
    pub is_analyzing: bool,
    pub memory: MemoryCatalog,
}

impl SessionState {
    /// A fresh session: no scene, empty catalog, both flags false.
    pub fn new() -> SessionState {
        SessionState::default()
    }

    /// Replace the active scene wholesale. No validation of its fields.
    pub fn set_current_scene(&mut self, scene: Option<SceneData>) {
        self.current_scene = scene;
    }

    pub fn set_generating(&mut self, generating: bool) {
        self.is_generating = generating;
    }

    pub fn set_analyzing(&mut self, analyzing: bool) {
        self.is_analyzing = analyzing;
    }

    /// Replace the catalog wholesale. Intended to run once at startup,
    /// but calling it again is an idempotent replace.
    pub fn load_memory_data(&mut self, catalog: MemoryCatalog) {
        self.memory = catalog;
    }

    /// Append a feedback round to the current scene's history, then
    /// truncate to the newest `FEEDBACK_HISTORY_LIMIT` rounds.
    /// No-op if there is no current scene.
    pub fn add_feedback_round(&mut self, round: FeedbackRound) {
        if let Some(scene) = self.current_scene.as_mut() {
            scene.feedback_history.push(round);
            let len = scene.feedback_history.len();
            if len > FEEDBACK_HISTORY_LIMIT {
                scene.feedback_history.drain(..len - FEEDBACK_HISTORY_LIMIT);
            }
        }
    }

    /// Replace the current scene's emotion points wholesale.
    /// No-op if there is no current scene.
    pub fn update_emotion_data(&mut self, points: Vec<EmotionPoint>) {
        if let Some(scene) = self.current_scene.as_mut() {
            scene.emotion_data = points;
        }
    }
}

/// Cloneable shared handle to the session state.
///
/// All engines go through this handle; none of them hold the lock across
/// their simulated delay, so mutations stay atomic single-step replacements.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    pub fn new() -> SessionHandle {
        SessionHandle::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().await
    }

    pub async fn load_memory_data(&self, catalog: MemoryCatalog) {
        self.lock().await.load_memory_data(catalog);
    }

    pub async fn set_current_scene(&self, scene: Option<SceneData>) {
        self.lock().await.set_current_scene(scene);
    }

    /// Clone of the current scene, if any.
    pub async fn current_scene(&self) -> Option<SceneData> {
        self.lock().await.current_scene.clone()
    }

    pub async fn is_generating(&self) -> bool {
        self.lock().await.is_generating
    }

    pub async fn is_analyzing(&self) -> bool {
        self.lock().await.is_analyzing
    }
}

/// Which busy flag an engine operation holds.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BusyFlag {
    Generating,
    Analyzing,
}

impl BusyFlag {
    fn write(self, state: &mut SessionState, value: bool) {
        match self {
            BusyFlag::Generating => state.set_generating(value),
            BusyFlag::Analyzing => state.set_analyzing(value),
        }
    }
}

/// Raises a busy flag and guarantees it is lowered again.
///
/// Engines hold one across their simulated latency. On the normal path
/// the engine lowers the flag itself via [`BusyGuard::release`] inside
/// its final locked update; if the caller abandons the operation
/// mid-latency instead, `Drop` spawns a task that lowers the flag, so an
/// interrupted operation can never leave its control stuck disabled.
#[must_use]
pub(crate) struct BusyGuard {
    session: SessionHandle,
    flag: BusyFlag,
    armed: bool,
}

impl BusyGuard {
    /// Raise `flag` on `state`, which must be the locked state of
    /// `session`, and return the guard that will lower it.
    pub(crate) fn raise(
        session: &SessionHandle,
        state: &mut SessionState,
        flag: BusyFlag,
    ) -> BusyGuard {
        flag.write(state, true);
        BusyGuard {
            session: session.clone(),
            flag,
            armed: true,
        }
    }

    /// Lower the flag as part of the engine's final locked update.
    pub(crate) fn release(mut self, state: &mut SessionState) {
        self.flag.write(state, false);
        self.armed = false;
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let session = self.session.clone();
        let flag = self.flag;
        // If no runtime is left to spawn on, the session is being torn
        // down with it and the flag no longer matters.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                flag.write(&mut *session.lock().await, false);
            });
        }
    }
}
