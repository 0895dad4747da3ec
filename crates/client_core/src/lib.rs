//! Session controller for the cooking coach client.
//!
//! One [`SessionController`] owns the whole session: the phase state machine
//! (prompt, loading, allergen review, coaching), the reconciler for the
//! backend's live push stream, and the speech playback manager. Views hold an
//! `Arc<SessionController>`, call its operations, and subscribe to the
//! broadcast [`CoachEvent`] channel; they never hold mutable state of their
//! own.

pub mod reconcile;
pub mod speech;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use shared::domain::{Phase, SessionSnapshot};
use shared::error::StartError;
use shared::protocol::{
    AllergensResponse, CameraStartRequest, FoodRequest, PushFrame, PushKind, SafeFoodRequest,
    SafetyCautionResponse, SetStepRequest, StepCheck, StepDetailsResponse, StepImageResponse,
    StepsResponse,
};

pub use reconcile::{decode_step_check, strip_code_fences, SpeechFilter};
pub use speech::{AudioSink, NullAudioSink, PlaybackManager};

/// Rotating status lines shown while the recipe is being generated. Purely
/// cosmetic; generation progress is not actually observable.
const LOADING_MESSAGES: &[&str] = &[
    "Reading the recipe...",
    "Warming up the stove...",
    "Checking the pantry...",
    "Sharpening the knives...",
    "Tasting for seasoning...",
];

#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub base_url: String,
    pub voice: String,
    /// Interval between cosmetic loading status lines.
    pub loading_tick: Duration,
    /// Delay between bumping the active step and committing it to display.
    pub transition_delay: Duration,
    /// How long the completion overlay shows before auto-advancing.
    pub completion_overlay: Duration,
    /// Pause before re-opening a dropped push stream connection.
    pub stream_retry: Duration,
    pub speech_filter: SpeechFilter,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            voice: "nova".into(),
            loading_tick: Duration::from_millis(800),
            transition_delay: Duration::from_millis(400),
            completion_overlay: Duration::from_millis(1500),
            stream_retry: Duration::from_secs(1),
            speech_filter: SpeechFilter::default(),
        }
    }
}

/// Validated form of what the user typed on the prompt screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    FreeText(String),
    RecipeUrl(Url),
}

impl PromptInput {
    /// The string sent to the backend as the `food` payload. The backend
    /// decides whether to scrape a URL or treat the text as a dish name.
    pub fn request_text(&self) -> String {
        match self {
            PromptInput::FreeText(text) => text.clone(),
            PromptInput::RecipeUrl(url) => url.to_string(),
        }
    }
}

/// Validate a prompt-screen submission. Anything that looks like it is meant
/// to be a link must actually parse as one; everything else passes through
/// as free text.
pub fn validate_prompt(raw: &str) -> Result<PromptInput, StartError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StartError::EmptyPrompt);
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        let url = Url::parse(trimmed).map_err(|e| StartError::InvalidUrl(e.to_string()))?;
        return Ok(PromptInput::RecipeUrl(url));
    }
    Ok(PromptInput::FreeText(trimmed.to_owned()))
}

/// Everything views can react to. Delivered over a broadcast channel; slow
/// subscribers lag rather than block the controller.
#[derive(Debug, Clone)]
pub enum CoachEvent {
    PhaseChanged(Phase),
    LoadingStatus(String),
    GenerationFailed(String),
    AllergensDetected(Vec<String>),
    StepChanged { index: usize, label: String },
    StepCheckUpdated(StepCheck),
    StepCompleted { index: usize },
    RecipeFinished,
    Speech(String),
    StepDetailsLoaded { index: usize, details: String },
    SafetyLoaded { index: usize, caution: String, tip: Option<String> },
    StepImageLoaded { index: usize, url: String },
    SessionReset,
}

struct SessionState {
    session_id: Uuid,
    phase: Phase,
    food: String,
    steps: Vec<String>,
    current_step: usize,
    display_step: usize,
    transitioning: bool,
    step_completed: bool,
    step_check: Option<StepCheck>,
    remy_speech: Option<String>,
    detected_allergens: Vec<String>,
    selected_allergens: BTreeSet<String>,
    api_error: Option<String>,
    done: bool,
}

impl SessionState {
    fn fresh() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: Phase::Prompt,
            food: String::new(),
            steps: Vec::new(),
            current_step: 0,
            display_step: 0,
            transitioning: false,
            step_completed: false,
            step_check: None,
            remy_speech: None,
            detected_allergens: Vec::new(),
            selected_allergens: BTreeSet::new(),
            api_error: None,
            done: false,
        }
    }

    /// Label of the step the backend is currently evaluating. This is the
    /// reference point for staleness checks, not the displayed step.
    fn current_label(&self) -> Option<&str> {
        self.steps.get(self.current_step).map(String::as_str)
    }
}

pub struct SessionController {
    http: reqwest::Client,
    config: CoachConfig,
    playback: PlaybackManager,
    inner: Mutex<SessionState>,
    // std mutexes so Drop can abort the tasks without an executor.
    stream_task: StdMutex<Option<JoinHandle<()>>>,
    ticker_task: StdMutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<CoachEvent>,
}

impl SessionController {
    pub fn new(config: CoachConfig) -> Arc<Self> {
        Self::with_sink(config, Arc::new(NullAudioSink))
    }

    pub fn with_sink(config: CoachConfig, sink: Arc<dyn AudioSink>) -> Arc<Self> {
        let http = reqwest::Client::new();
        let playback = PlaybackManager::new(
            http.clone(),
            config.base_url.clone(),
            config.voice.clone(),
            sink,
        );
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            http,
            config,
            playback,
            inner: Mutex::new(SessionState::fresh()),
            stream_task: StdMutex::new(None),
            ticker_task: StdMutex::new(None),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CoachEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock().await;
        SessionSnapshot {
            phase: state.phase,
            steps: state.steps.clone(),
            current_step: state.current_step,
            display_step: state.display_step,
            transitioning: state.transitioning,
            step_completed: state.step_completed,
            step_check: state.step_check.clone(),
            remy_speech: state.remy_speech.clone(),
            detected_allergens: state.detected_allergens.clone(),
            selected_allergens: state.selected_allergens.iter().cloned().collect(),
            api_error: state.api_error.clone(),
            done: state.done,
        }
    }

    /// MJPEG preview endpoint for a view layer to embed. The controller
    /// itself never reads it.
    pub fn camera_feed_url(&self) -> String {
        format!("{}/camera/feed", self.config.base_url)
    }

    fn emit(&self, event: CoachEvent) {
        let _ = self.events.send(event);
    }

    /// Prompt-to-loading transition: validate the input, run recipe
    /// generation and allergen detection concurrently, then land on the
    /// allergen review screen or go straight into coaching.
    ///
    /// On generation failure the session returns to the prompt screen with
    /// the reason recorded; allergen detection failing is treated as "no
    /// allergens found" and never blocks the session.
    pub async fn start_cooking(self: &Arc<Self>, raw: &str) -> Result<Phase, StartError> {
        let input = validate_prompt(raw)?;
        let food = input.request_text();
        {
            let mut state = self.inner.lock().await;
            // A finished recipe restarts directly; an active one must be
            // ended first.
            let restartable =
                state.phase == Phase::Prompt || (state.phase == Phase::Coaching && state.done);
            if !restartable {
                return Err(StartError::SessionActive);
            }
            *state = SessionState::fresh();
            state.food = food.clone();
            state.phase = Phase::Loading;
            info!(session = %state.session_id, food = %food, "starting cooking session");
        }
        self.emit(CoachEvent::PhaseChanged(Phase::Loading));
        self.start_loading_ticker();

        let (steps, allergens) =
            tokio::join!(self.generate_steps(&food), self.detect_allergens(&food));
        self.stop_loading_ticker();

        let steps = match steps {
            Ok(steps) if !steps.is_empty() => steps,
            Ok(_) => {
                return Err(self
                    .fail_generation("the recipe came back empty".to_owned())
                    .await)
            }
            Err(err) => return Err(self.fail_generation(err.to_string()).await),
        };
        let allergens = match allergens {
            Ok(list) => list,
            Err(err) => {
                warn!(error = %err, "allergen detection failed, continuing without");
                Vec::new()
            }
        };

        {
            let mut state = self.inner.lock().await;
            state.steps = steps;
            state.detected_allergens = allergens.clone();
        }

        if allergens.is_empty() {
            self.begin_coaching().await;
            Ok(Phase::Coaching)
        } else {
            {
                let mut state = self.inner.lock().await;
                state.phase = Phase::Allergens;
            }
            self.emit(CoachEvent::AllergensDetected(allergens));
            self.emit(CoachEvent::PhaseChanged(Phase::Allergens));
            Ok(Phase::Allergens)
        }
    }

    async fn fail_generation(&self, reason: String) -> StartError {
        {
            let mut state = self.inner.lock().await;
            state.api_error = Some(reason.clone());
            state.phase = Phase::Prompt;
        }
        self.emit(CoachEvent::GenerationFailed(reason.clone()));
        self.emit(CoachEvent::PhaseChanged(Phase::Prompt));
        StartError::Generation(reason)
    }

    /// Flip one allergen in or out of the avoid set.
    pub async fn toggle_allergen(&self, name: &str) {
        let mut state = self.inner.lock().await;
        if !state.selected_allergens.remove(name) {
            state.selected_allergens.insert(name.to_owned());
        }
    }

    /// Leave the allergen review screen. When the user selected allergens to
    /// avoid, ask the backend for a substituted recipe; if that fails, keep
    /// the original steps rather than stranding the session.
    pub async fn confirm_allergens(self: &Arc<Self>) -> anyhow::Result<()> {
        let (food, avoid) = {
            let state = self.inner.lock().await;
            anyhow::ensure!(
                state.phase == Phase::Allergens,
                "no allergen review in progress"
            );
            let avoid: Vec<String> = state.selected_allergens.iter().cloned().collect();
            (state.food.clone(), avoid)
        };
        if !avoid.is_empty() {
            match self.generate_safe_steps(&food, &avoid).await {
                Ok(steps) if !steps.is_empty() => {
                    let mut state = self.inner.lock().await;
                    state.steps = steps;
                }
                Ok(_) => warn!("substitution produced an empty recipe, keeping original steps"),
                Err(err) => {
                    warn!(error = %err, "substitution failed, keeping original steps");
                }
            }
        }
        self.begin_coaching().await;
        Ok(())
    }

    async fn begin_coaching(self: &Arc<Self>) {
        let (label, recipe, steps) = {
            let mut state = self.inner.lock().await;
            state.phase = Phase::Coaching;
            state.current_step = 0;
            state.display_step = 0;
            state.transitioning = false;
            state.step_completed = false;
            state.step_check = None;
            state.done = false;
            (
                state.current_label().map(str::to_owned),
                state.food.clone(),
                state.steps.clone(),
            )
        };
        if let Err(err) = self.start_camera(&recipe, &steps).await {
            warn!(error = %err, "camera start failed, continuing without vision");
        }
        if let Some(label) = &label {
            if let Err(err) = self.set_backend_step(label).await {
                warn!(error = %err, "could not tell the backend which step is active");
            }
        }
        self.open_stream();
        self.emit(CoachEvent::PhaseChanged(Phase::Coaching));
        if let Some(label) = label {
            self.emit(CoachEvent::StepChanged {
                index: 0,
                label: label.clone(),
            });
            self.spawn_step_context(0, label);
        }
    }

    /// Move to the next step, or finish the recipe when already on the last
    /// one. Returns `Ok(false)` when nothing happened (not coaching, already
    /// finished, or an advance is in flight).
    ///
    /// The advance is two-phase: the active step index bumps immediately and
    /// the backend is told, but the displayed step commits only after the
    /// transition delay. The in-flight flag makes the whole thing
    /// single-flight, so a user tap racing the auto-advance collapses into
    /// one transition.
    pub async fn advance_step(self: &Arc<Self>) -> anyhow::Result<bool> {
        let (index, label) = {
            let mut state = self.inner.lock().await;
            if state.phase != Phase::Coaching || state.done || state.transitioning {
                return Ok(false);
            }
            if state.display_step + 1 >= state.steps.len() {
                state.done = true;
                info!(session = %state.session_id, "last step done, finishing recipe");
                drop(state);
                self.finish_recipe().await;
                return Ok(true);
            }
            state.transitioning = true;
            state.current_step += 1;
            let index = state.current_step;
            (index, state.steps[index].clone())
        };

        if let Err(err) = self.set_backend_step(&label).await {
            warn!(error = %err, step = %label, "could not tell the backend which step is active");
        }
        tokio::time::sleep(self.config.transition_delay).await;
        {
            let mut state = self.inner.lock().await;
            state.display_step = state.current_step;
            state.transitioning = false;
            state.step_completed = false;
            state.step_check = None;
        }
        self.emit(CoachEvent::StepChanged {
            index,
            label: label.clone(),
        });
        self.spawn_step_context(index, label);
        Ok(true)
    }

    /// Terminal coaching sub-state: the live machinery shuts down but the
    /// session state stays visible until the user resets.
    async fn finish_recipe(&self) {
        self.close_stream();
        if let Err(err) = self.stop_camera().await {
            debug!(error = %err, "camera stop failed while finishing");
        }
        self.playback.stop();
        self.emit(CoachEvent::RecipeFinished);
    }

    /// Abandon the session from any phase and return to the prompt screen.
    pub async fn end_recipe(&self) {
        self.teardown().await;
        self.emit(CoachEvent::SessionReset);
        self.emit(CoachEvent::PhaseChanged(Phase::Prompt));
    }

    async fn teardown(&self) {
        self.close_stream();
        self.stop_loading_ticker();
        self.playback.stop();
        if let Err(err) = self.stop_camera().await {
            debug!(error = %err, "camera stop failed during teardown");
        }
        let mut state = self.inner.lock().await;
        info!(session = %state.session_id, "session torn down");
        *state = SessionState::fresh();
    }

    fn start_loading_ticker(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            // Emit before the first sleep so even instant generation shows
            // at least one status line.
            let mut idx = 0usize;
            loop {
                let msg = LOADING_MESSAGES[idx % LOADING_MESSAGES.len()];
                this.emit(CoachEvent::LoadingStatus(msg.to_owned()));
                idx += 1;
                tokio::time::sleep(this.config.loading_tick).await;
            }
        });
        if let Ok(mut slot) = self.ticker_task.lock() {
            if let Some(prev) = slot.replace(handle) {
                prev.abort();
            }
        }
    }

    fn stop_loading_ticker(&self) {
        if let Ok(mut slot) = self.ticker_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Connect to the backend push stream, replacing any previous reader so
    /// at most one connection exists.
    fn open_stream(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_stream().await });
        if let Ok(mut slot) = self.stream_task.lock() {
            if let Some(prev) = slot.replace(handle) {
                prev.abort();
            }
        }
    }

    fn close_stream(&self) {
        if let Ok(mut slot) = self.stream_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Transport errors are not fatal: while the session is still coaching,
    /// a dropped connection is re-opened after a short pause. The loop ends
    /// when the task is aborted or the session leaves coaching.
    async fn run_stream(self: Arc<Self>) {
        loop {
            self.read_stream().await;
            let active = {
                let state = self.inner.lock().await;
                state.phase == Phase::Coaching && !state.done
            };
            if !active {
                return;
            }
            info!("push stream lost, reconnecting");
            tokio::time::sleep(self.config.stream_retry).await;
        }
    }

    async fn read_stream(self: &Arc<Self>) {
        let url = format!("{}/stream", self.config.base_url);
        let resp = match self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "push stream connection failed");
                return;
            }
        };
        info!("push stream connected");
        let mut body = resp.bytes_stream();
        let mut buffer = String::new();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!(error = %err, "push stream read failed");
                    return;
                }
            };
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            // Events are separated by a blank line. An event may carry
            // several `data:` lines which form one payload joined by `\n`.
            while let Some(pos) = buffer.find("\n\n") {
                let event: String = buffer.drain(..pos + 2).collect();
                let mut data = String::new();
                for line in event.lines() {
                    if let Some(payload) = line.strip_prefix("data:") {
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(payload.strip_prefix(' ').unwrap_or(payload));
                    }
                }
                if !data.is_empty() {
                    self.handle_frame(data.trim()).await;
                }
            }
        }
        info!("push stream closed by server");
    }

    async fn handle_frame(self: &Arc<Self>, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let frame: PushFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(err) => {
                info!(error = %err, "discarding malformed push frame");
                return;
            }
        };
        match frame.kind {
            PushKind::StepCheck => self.apply_step_check(frame).await,
            PushKind::Speech => self.apply_speech(frame).await,
        }
    }

    /// Fold a vision verdict into the session. Frames tagged with any step
    /// other than the one currently being evaluated are stale and dropped;
    /// once a step is marked completed it stays completed until the next
    /// step commits, regardless of later verdicts.
    async fn apply_step_check(self: &Arc<Self>, frame: PushFrame) {
        let Some(check) = decode_step_check(&frame.data) else {
            info!("discarding undecodable step check payload");
            return;
        };
        let newly_completed;
        {
            let mut state = self.inner.lock().await;
            if state.phase != Phase::Coaching || state.done {
                return;
            }
            let current = state.current_label().map(str::to_owned);
            if frame.step.as_deref() != current.as_deref() {
                info!(
                    frame_step = ?frame.step,
                    current = ?current,
                    "discarding stale step check"
                );
                return;
            }
            state.step_check = Some(check.clone());
            if check.completed && !state.step_completed {
                state.step_completed = true;
                newly_completed = Some((state.current_step, state.session_id));
            } else {
                newly_completed = None;
            }
        }
        self.emit(CoachEvent::StepCheckUpdated(check));
        if let Some((index, session)) = newly_completed {
            self.emit(CoachEvent::StepCompleted { index });
            let this = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(this.config.completion_overlay).await;
                // The session may have been reset and restarted while the
                // overlay was showing; only the session that completed the
                // step may advance it.
                if this.inner.lock().await.session_id != session {
                    return;
                }
                if let Err(err) = this.advance_step().await {
                    warn!(error = %err, "auto advance failed");
                }
            });
        }
    }

    /// Handle a narration frame: filter out misrouted step-check JSON, record
    /// the survivor for display, and voice it unless a step announcement is
    /// already speaking.
    async fn apply_speech(&self, frame: PushFrame) {
        let Some(text) = frame.data.as_str() else {
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.config.speech_filter.looks_like_step_check(text) {
            info!("discarding speech payload that looks like a step check");
            return;
        }
        {
            let mut state = self.inner.lock().await;
            state.remy_speech = Some(text.to_owned());
        }
        self.emit(CoachEvent::Speech(text.to_owned()));
        if self.playback.is_step_speaking() {
            debug!("step announcement in progress, not voicing narration");
            return;
        }
        if let Err(err) = self.playback.speak(text, false).await {
            warn!(error = %err, "narration playback failed");
        }
    }

    /// Kick off the background loads for a freshly committed step: the spoken
    /// announcement (with how-to detail), the safety caution, and the goal
    /// image. All three are best-effort.
    fn spawn_step_context(self: &Arc<Self>, index: usize, label: String) {
        let this = Arc::clone(self);
        let announce = label.clone();
        tokio::spawn(async move { this.announce_step(index, announce).await });

        let this = Arc::clone(self);
        let safety = label.clone();
        tokio::spawn(async move {
            match this.fetch_step_safety(&safety).await {
                Ok(resp) => {
                    if let Some(caution) = resp.caution {
                        this.emit(CoachEvent::SafetyLoaded {
                            index,
                            caution,
                            tip: resp.tip,
                        });
                    }
                }
                Err(err) => info!(error = %err, step = %safety, "no safety caution"),
            }
        });

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let recipe = this.inner.lock().await.food.clone();
            match this.fetch_step_image(&recipe, &label).await {
                Ok(Some(url)) => this.emit(CoachEvent::StepImageLoaded { index, url }),
                Ok(None) => {}
                Err(err) => info!(error = %err, step = %label, "no goal image"),
            }
        });
    }

    async fn announce_step(self: Arc<Self>, index: usize, label: String) {
        let detail = match self.fetch_step_details(&label).await {
            Ok(Some(detail)) if !detail.trim().is_empty() => {
                self.emit(CoachEvent::StepDetailsLoaded {
                    index,
                    details: detail.clone(),
                });
                Some(detail)
            }
            Ok(_) => None,
            Err(err) => {
                info!(error = %err, step = %label, "step details unavailable");
                None
            }
        };
        let line = match detail {
            Some(detail) => format!("{label}. {detail}"),
            None => label,
        };
        if let Err(err) = self.playback.speak(&line, true).await {
            warn!(error = %err, "step announcement playback failed");
        }
    }

    async fn generate_steps(&self, food: &str) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/recipe/generate", self.config.base_url);
        let resp: StepsResponse = self
            .http
            .post(&url)
            .json(&FoodRequest {
                food: food.to_owned(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.steps)
    }

    async fn generate_safe_steps(&self, food: &str, avoid: &[String]) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/recipe/generate-safe", self.config.base_url);
        let resp: StepsResponse = self
            .http
            .post(&url)
            .json(&SafeFoodRequest {
                food: food.to_owned(),
                avoid: avoid.to_vec(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.steps)
    }

    async fn detect_allergens(&self, food: &str) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/recipe/allergens", self.config.base_url);
        let resp: AllergensResponse = self
            .http
            .post(&url)
            .json(&FoodRequest {
                food: food.to_owned(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.allergens.unwrap_or_default())
    }

    async fn set_backend_step(&self, step: &str) -> anyhow::Result<()> {
        let url = format!("{}/recipe/set-step", self.config.base_url);
        self.http
            .post(&url)
            .json(&SetStepRequest {
                step: step.to_owned(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn start_camera(&self, recipe: &str, steps: &[String]) -> anyhow::Result<()> {
        let url = format!("{}/camera/start", self.config.base_url);
        self.http
            .post(&url)
            .json(&CameraStartRequest {
                recipe: recipe.to_owned(),
                steps: steps.to_vec(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn stop_camera(&self) -> anyhow::Result<()> {
        let url = format!("{}/camera/stop", self.config.base_url);
        self.http.post(&url).send().await?.error_for_status()?;
        Ok(())
    }

    async fn fetch_step_details(&self, step: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/step/details", self.config.base_url);
        let resp: StepDetailsResponse = self
            .http
            .get(&url)
            .query(&[("step", step)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.details)
    }

    async fn fetch_step_safety(&self, step: &str) -> anyhow::Result<SafetyCautionResponse> {
        let url = format!("{}/step/safety", self.config.base_url);
        let resp: SafetyCautionResponse = self
            .http
            .get(&url)
            .query(&[("step", step)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }

    async fn fetch_step_image(&self, recipe: &str, step: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/step/image", self.config.base_url);
        let resp: StepImageResponse = self
            .http
            .get(&url)
            .query(&[("step", step), ("recipe", recipe)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.image_url)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        for slot in [&self.stream_task, &self.ticker_task] {
            if let Ok(mut slot) = slot.lock() {
                if let Some(handle) = slot.take() {
                    handle.abort();
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
