//! Text-to-speech playback with stop-and-replace semantics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use shared::error::SpeechError;
use shared::protocol::TtsRequest;

/// Where synthesized audio ends up. Injected so headless hosts and tests can
/// observe playback without an audio device.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play one utterance to completion. Implementations should return only
    /// once playback has finished so the manager can clear its flags.
    async fn play(&self, audio: Vec<u8>) -> anyhow::Result<()>;
}

/// Sink that drops audio on the floor. Useful when no output device exists.
pub struct NullAudioSink;

#[async_trait]
impl AudioSink for NullAudioSink {
    async fn play(&self, audio: Vec<u8>) -> anyhow::Result<()> {
        debug!(bytes = audio.len(), "discarding synthesized audio");
        Ok(())
    }
}

/// Serializes speech output: at most one utterance plays at a time, and a new
/// `speak` call interrupts whatever is in flight.
pub struct PlaybackManager {
    http: reqwest::Client,
    base_url: String,
    voice: String,
    sink: Arc<dyn AudioSink>,
    playing: Mutex<Option<JoinHandle<()>>>,
    step_speaking: Arc<AtomicBool>,
}

impl PlaybackManager {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        voice: String,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        Self {
            http,
            base_url,
            voice,
            sink,
            playing: Mutex::new(None),
            step_speaking: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a step announcement is being synthesized or played.
    /// Ambient narration is suppressed for that window.
    pub fn is_step_speaking(&self) -> bool {
        self.step_speaking.load(Ordering::SeqCst)
    }

    /// Synthesize `text` and play it, interrupting any current utterance.
    ///
    /// For step announcements the speaking flag is raised before the
    /// synthesis request goes out, so narration arriving while we wait on
    /// the backend is already suppressed.
    pub async fn speak(&self, text: &str, is_step_announcement: bool) -> Result<(), SpeechError> {
        self.abort_current();
        if is_step_announcement {
            self.step_speaking.store(true, Ordering::SeqCst);
        }

        let audio = match self.synthesize(text).await {
            Ok(audio) => audio,
            Err(err) => {
                self.step_speaking.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };

        let sink = Arc::clone(&self.sink);
        let flag = Arc::clone(&self.step_speaking);
        let handle = tokio::spawn(async move {
            if let Err(err) = sink.play(audio).await {
                warn!(error = %err, "audio playback failed");
            }
            flag.store(false, Ordering::SeqCst);
        });
        if let Ok(mut slot) = self.playing.lock() {
            *slot = Some(handle);
        }
        Ok(())
    }

    /// Stop whatever is playing and clear the announcement flag.
    pub fn stop(&self) {
        self.abort_current();
        self.step_speaking.store(false, Ordering::SeqCst);
    }

    fn abort_current(&self) {
        if let Ok(mut slot) = self.playing.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let url = format!("{}/tts", self.base_url);
        let body = TtsRequest {
            text: text.to_owned(),
            voice: self.voice.clone(),
        };
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?
            .error_for_status()
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Drop for PlaybackManager {
    fn drop(&mut self) {
        self.abort_current();
    }
}
