//! # Feature: Chat Controller
//!
//! Orchestrates the chat client: input capture, shortcut routing, transport sends,
//! inbound replies and the fan-out to renderer, transcript and history.
//!
//! States: `Idle -> Sending -> AwaitingResponse -> Idle`, with every failure path
//! rendering one inline message and returning to `Idle`.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.1.1: Busy check and the move to `Sending` happen under one lock; startup lists every missing speech capability
//! - 2.1.0: Shortcut table is first-match-wins; one input issues at most one request
//! - 2.0.0: Storage, view and transport are injected instead of looked up globally
//! - 1.0.0: Initial release

use crate::backend::{ApiResponse, Backend};
use crate::commands::ShortcutTable;
use crate::config::ClientConfig;
use crate::export::export_transcript;
use crate::history::{ChatEntry, HistoryStore, Role};
use crate::identity::SessionIdentity;
use crate::renderer::{MessageRenderer, RenderedMessage};
use crate::speech::{
    strip_tags, SpeechCapabilities, DEFAULT_SPEECH_RATE, RECOGNITION_UNSUPPORTED_NOTICE,
    SYNTHESIS_UNSUPPORTED_NOTICE,
};
use crate::storage::Storage;
use crate::theme::{ThemePreference, ThemeStore};
use crate::transport::{InboundMessage, OutboundMessage, Transport, MESSAGE_EVENT, RESPONSE_EVENT};
use crate::view::ChatView;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Bot reply shown when the server sends an empty message
pub const FALLBACK_REPLY: &str = "🤖 I’m here to help!";

/// Rendered after the history is cleared
pub const WELCOME_MESSAGE: &str = "👋 Hi again! I’m Astra. How can I help?";

pub const CLEAR_PROMPT: &str = "Clear chat history?";

pub const SEND_FAILURE_MESSAGE: &str = "⚠️ Sorry, I couldn't reach the server. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Sending,
    AwaitingResponse,
}

/// Key of a keyboard event on the message input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
}

impl KeyEvent {
    pub fn enter() -> Self {
        KeyEvent {
            key: Key::Enter,
            shift: false,
        }
    }

    pub fn shift_enter() -> Self {
        KeyEvent {
            key: Key::Enter,
            shift: true,
        }
    }
}

/// What the input should do with a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Submit and suppress the default newline
    Submit,
    /// Insert a literal newline
    InsertNewline,
    /// Leave the key to the input
    Default,
}

pub fn key_action(event: &KeyEvent) -> KeyAction {
    match (event.key, event.shift) {
        (Key::Enter, false) => KeyAction::Submit,
        (Key::Enter, true) => KeyAction::InsertNewline,
        _ => KeyAction::Default,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only input
    Ignored,
    /// Another submission is still being sent
    Busy,
    /// Emitted over the transport, reply pending
    Sent,
    /// Routed to a shortcut endpoint
    Shortcut { name: &'static str, success: bool },
    /// Transport failure, reported inline
    Failed,
}

pub struct ChatController {
    view: Arc<dyn ChatView>,
    transport: Arc<dyn Transport>,
    backend: Arc<dyn Backend>,
    history: HistoryStore,
    themes: ThemeStore,
    renderer: MessageRenderer,
    shortcuts: ShortcutTable,
    speech: SpeechCapabilities,
    speech_enabled: bool,
    identity: SessionIdentity,
    state: Mutex<ChatState>,
    transcript: Mutex<Vec<ChatEntry>>,
}

impl ChatController {
    pub async fn new(
        config: &ClientConfig,
        storage: Arc<dyn Storage>,
        view: Arc<dyn ChatView>,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn Backend>,
        speech: SpeechCapabilities,
    ) -> Self {
        let identity = SessionIdentity::load_or_create(storage.as_ref()).await;
        let history = HistoryStore::new(storage.clone(), config.history_capacity, config.history_policy);
        let themes = ThemeStore::new(storage, view.clone());

        ChatController {
            view,
            transport,
            backend,
            history,
            themes,
            renderer: MessageRenderer::new(),
            shortcuts: ShortcutTable::filtered(config.shortcut_allowlist()),
            speech,
            speech_enabled: config.speech_enabled,
            identity,
            state: Mutex::new(ChatState::Idle),
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Startup: live region, theme, history replay, capability notices
    pub async fn init(&self) {
        self.view.mark_live_region();
        self.themes.init().await;

        let entries = self.history.load_all().await;
        info!("Restoring {} chat entries", entries.len());
        for entry in entries {
            self.present(&entry.text, entry.role);
        }

        for notice in self.speech.missing_notices() {
            if notice == SYNTHESIS_UNSUPPORTED_NOTICE && !self.speech_enabled {
                continue;
            }
            self.view.notify(notice);
        }
    }

    pub fn state(&self) -> ChatState {
        *self.lock_state()
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn shortcuts(&self) -> &ShortcutTable {
        &self.shortcuts
    }

    /// Entries currently shown, in order
    pub fn transcript(&self) -> Vec<ChatEntry> {
        self.lock_transcript().clone()
    }

    /// Receiver for inbound chat replies
    pub fn responses(&self) -> mpsc::UnboundedReceiver<Value> {
        self.transport.subscribe(RESPONSE_EVENT)
    }

    /// Keyboard handling for the message input
    pub async fn on_key(&self, event: KeyEvent) -> (KeyAction, Option<SubmitOutcome>) {
        let action = key_action(&event);
        match action {
            KeyAction::Submit => (action, Some(self.submit_input().await)),
            _ => (action, None),
        }
    }

    /// Submit whatever is in the bound input
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.view.input_value();
        self.submit(&text).await
    }

    pub async fn submit(&self, raw: &str) -> SubmitOutcome {
        let text = raw.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }
        {
            let mut state = self.lock_state();
            if *state == ChatState::Sending {
                debug!("Submission while sending, ignoring");
                return SubmitOutcome::Busy;
            }
            debug!("Chat state {:?} -> {:?}", *state, ChatState::Sending);
            *state = ChatState::Sending;
        }
        self.record(text, Role::User).await;
        self.view.clear_input();

        if let Some(hit) = self.shortcuts.matching(text) {
            let mut params = hit.params;
            if let Value::Object(ref mut map) = params {
                map.insert("user_id".to_string(), Value::String(self.identity.to_string()));
            }

            self.set_state(ChatState::AwaitingResponse);
            let response = match self.backend.post_json(hit.shortcut.endpoint, params.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Shortcut '{}' request failed: {e}", hit.shortcut.name);
                    ApiResponse::failed(e.to_string())
                }
            };

            let reply = hit.shortcut.reply_message(&params, &response);
            self.record(&reply, Role::Bot).await;
            self.set_state(ChatState::Idle);
            return SubmitOutcome::Shortcut {
                name: hit.shortcut.name,
                success: response.success,
            };
        }

        let payload = OutboundMessage {
            message: text.to_string(),
            user_id: self.identity.to_string(),
        };
        let payload = match serde_json::to_value(&payload) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode outbound message: {e}");
                return self.fail_send();
            }
        };

        match self.transport.emit(MESSAGE_EVENT, payload).await {
            Ok(()) => {
                // A reply may already have been handled while the emit was in flight
                if self.state() == ChatState::Sending {
                    self.set_state(ChatState::AwaitingResponse);
                }
                SubmitOutcome::Sent
            }
            Err(e) => {
                error!("Failed to send message: {e}");
                self.fail_send()
            }
        }
    }

    /// Inbound `response` event
    pub async fn handle_response(&self, inbound: InboundMessage) {
        let spoken = inbound.message.filter(|m| !m.trim().is_empty());
        let text = spoken.as_deref().unwrap_or(FALLBACK_REPLY);
        self.record(text, Role::Bot).await;

        if let Some(message) = spoken.as_deref() {
            self.speak(message);
        }
        self.set_state(ChatState::Idle);
    }

    pub async fn handle_response_value(&self, payload: Value) {
        self.handle_response(InboundMessage::from_value(payload)).await;
    }

    /// Clear transcript and history after confirmation; returns whether it happened
    pub async fn clear_chat(&self) -> bool {
        if !self.view.confirm(CLEAR_PROMPT).await {
            debug!("Clear chat cancelled");
            return false;
        }

        self.view.clear_transcript();
        self.lock_transcript().clear();
        self.history.clear().await;
        self.present(WELCOME_MESSAGE, Role::Bot);
        true
    }

    pub async fn toggle_theme(&self) -> ThemePreference {
        self.themes.toggle().await
    }

    /// Speech-to-text into the message input
    pub async fn dictate(&self) -> Option<String> {
        let Some(recognizer) = self.speech.recognizer.clone() else {
            self.view.notify(RECOGNITION_UNSUPPORTED_NOTICE);
            return None;
        };

        match recognizer.listen().await {
            Ok(text) => {
                self.view.set_input_value(&text);
                Some(text)
            }
            Err(e) => {
                warn!("Speech recognition failed: {e}");
                self.view.notify("🎤 Sorry, I didn't catch that.");
                None
            }
        }
    }

    /// Upload a study file; returns whether the server accepted it
    pub async fn upload_file(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                self.present(&format!("❌ Could not read {file_name}: {e}"), Role::Bot);
                return false;
            }
        };

        self.set_state(ChatState::AwaitingResponse);
        let response = match self.backend.upload(&file_name, bytes).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Upload of {file_name} failed: {e}");
                ApiResponse::failed(e.to_string())
            }
        };

        let reply = if response.success {
            match response.str_field("summary").or_else(|| response.str_field("message")) {
                Some(detail) => format!("📎 Uploaded **{file_name}**. {detail}"),
                None => format!("📎 Uploaded **{file_name}**."),
            }
        } else {
            format!("❌ Upload failed: {}", response.error_text())
        };
        self.record(&reply, Role::Bot).await;
        self.set_state(ChatState::Idle);
        response.success
    }

    /// Plain-text download of the visible transcript
    pub fn export_transcript(&self) -> String {
        export_transcript(&self.lock_transcript())
    }

    /// Unload: apply the history policy
    pub async fn shutdown(&self) {
        info!("Chat client unloading (history policy: {})", self.history.policy());
        self.history.on_unload().await;
    }

    fn fail_send(&self) -> SubmitOutcome {
        self.present(SEND_FAILURE_MESSAGE, Role::Bot);
        self.set_state(ChatState::Idle);
        SubmitOutcome::Failed
    }

    fn speak(&self, text: &str) {
        if !self.speech_enabled {
            return;
        }
        if let Some(synthesizer) = &self.speech.synthesizer {
            if let Err(e) = synthesizer.speak(&strip_tags(text), DEFAULT_SPEECH_RATE) {
                warn!("Speech synthesis failed: {e}");
            }
        }
    }

    /// Render into the view and the in-memory transcript
    fn present(&self, text: &str, role: Role) -> RenderedMessage {
        let message = self.renderer.present(self.view.as_ref(), text, role);
        self.lock_transcript().push(ChatEntry::new(message.text.clone(), role));
        message
    }

    /// Render and persist
    async fn record(&self, text: &str, role: Role) {
        let message = self.present(text, role);
        self.history.append(ChatEntry::new(message.text, role)).await;
    }

    fn set_state(&self, next: ChatState) {
        let mut state = self.lock_state();
        if *state != next {
            debug!("Chat state {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_transcript(&self) -> MutexGuard<'_, Vec<ChatEntry>> {
        self.transcript.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_actions() {
        assert_eq!(key_action(&KeyEvent::enter()), KeyAction::Submit);
        assert_eq!(key_action(&KeyEvent::shift_enter()), KeyAction::InsertNewline);
        assert_eq!(
            key_action(&KeyEvent {
                key: Key::Other('a'),
                shift: true
            }),
            KeyAction::Default
        );
    }
}
