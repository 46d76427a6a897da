//! Typed view binding.
//!
//! Every control the chat client touches is reached through `ChatView`, built once at
//! startup, so handlers never look elements up on their own.

use crate::renderer::RenderedMessage;
use crate::theme::ThemePreference;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[async_trait]
pub trait ChatView: Send + Sync {
    /// Current text of the message input
    fn input_value(&self) -> String;

    fn set_input_value(&self, value: &str);

    fn clear_input(&self) {
        self.set_input_value("");
    }

    /// Append a bubble to the transcript
    fn append_message(&self, message: &RenderedMessage);

    fn clear_transcript(&self);

    /// Bring the newest bubble into view
    fn scroll_to_latest(&self);

    /// Mark the transcript so assistive technology announces new bubbles
    fn mark_live_region(&self);

    /// Reflect the theme onto the visual root
    fn apply_theme(&self, theme: ThemePreference);

    /// Check (light) or uncheck (dark) the theme toggle control
    fn set_theme_toggle(&self, checked: bool);

    /// Show a transient notice outside the transcript
    fn notify(&self, notice: &str);

    /// Ask the user a yes/no question
    async fn confirm(&self, prompt: &str) -> bool;
}

#[derive(Debug, Default)]
struct HeadlessState {
    input: String,
    transcript: Vec<RenderedMessage>,
    theme: Option<ThemePreference>,
    theme_toggle_checked: bool,
    live_region: bool,
    scrolls: usize,
    notices: Vec<String>,
    confirm_answer: bool,
    confirm_prompts: Vec<String>,
}

/// In-memory view that records everything rendered into it.
/// Confirmation prompts are answered with a preset answer (`true` by default).
#[derive(Debug)]
pub struct HeadlessView {
    state: Mutex<HeadlessState>,
}

impl Default for HeadlessView {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessView {
    pub fn new() -> Self {
        HeadlessView {
            state: Mutex::new(HeadlessState {
                confirm_answer: true,
                ..HeadlessState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_confirm_answer(&self, answer: bool) {
        self.state().confirm_answer = answer;
    }

    pub fn transcript(&self) -> Vec<RenderedMessage> {
        self.state().transcript.clone()
    }

    /// Transcript as `(role, text)` pairs
    pub fn transcript_texts(&self) -> Vec<(crate::history::Role, String)> {
        self.state()
            .transcript
            .iter()
            .map(|m| (m.role, m.text.clone()))
            .collect()
    }

    pub fn theme(&self) -> Option<ThemePreference> {
        self.state().theme
    }

    pub fn theme_toggle_checked(&self) -> bool {
        self.state().theme_toggle_checked
    }

    pub fn is_live_region(&self) -> bool {
        self.state().live_region
    }

    pub fn scroll_count(&self) -> usize {
        self.state().scrolls
    }

    pub fn notices(&self) -> Vec<String> {
        self.state().notices.clone()
    }

    pub fn confirm_prompts(&self) -> Vec<String> {
        self.state().confirm_prompts.clone()
    }
}

#[async_trait]
impl ChatView for HeadlessView {
    fn input_value(&self) -> String {
        self.state().input.clone()
    }

    fn set_input_value(&self, value: &str) {
        self.state().input = value.to_string();
    }

    fn append_message(&self, message: &RenderedMessage) {
        self.state().transcript.push(message.clone());
    }

    fn clear_transcript(&self) {
        self.state().transcript.clear();
    }

    fn scroll_to_latest(&self) {
        self.state().scrolls += 1;
    }

    fn mark_live_region(&self) {
        self.state().live_region = true;
    }

    fn apply_theme(&self, theme: ThemePreference) {
        self.state().theme = Some(theme);
    }

    fn set_theme_toggle(&self, checked: bool) {
        self.state().theme_toggle_checked = checked;
    }

    fn notify(&self, notice: &str) {
        self.state().notices.push(notice.to_string());
    }

    async fn confirm(&self, prompt: &str) -> bool {
        let mut state = self.state();
        state.confirm_prompts.push(prompt.to_string());
        state.confirm_answer
    }
}
