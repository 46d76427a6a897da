//! # Feature: Speech
//!
//! Optional text-to-speech for bot replies and speech-to-text for the message input.
//! Capabilities are detected once at startup; a missing one turns into a visible notice.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.1.0: Speech recognition (dictation) support
//! - 1.0.0: Spoken bot replies with markup stripped

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Speaking rate used for bot replies
pub const DEFAULT_SPEECH_RATE: f32 = 0.95;

pub const SYNTHESIS_UNSUPPORTED_NOTICE: &str = "🔇 Speech output is not supported here.";
pub const RECOGNITION_UNSUPPORTED_NOTICE: &str = "🎤 Speech input is not supported here.";

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, text: &str, rate: f32) -> Result<()>;
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen for one utterance and return its transcription
    async fn listen(&self) -> Result<String>;
}

/// Remove markup so only readable text is spoken
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").into_owned()
}

/// Speech capabilities available to the client, detected at startup
#[derive(Clone, Default)]
pub struct SpeechCapabilities {
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    pub recognizer: Option<Arc<dyn SpeechRecognizer>>,
}

impl SpeechCapabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Notices for every capability that is missing
    pub fn missing_notices(&self) -> Vec<&'static str> {
        let mut notices = Vec::new();
        if self.synthesizer.is_none() {
            notices.push(SYNTHESIS_UNSUPPORTED_NOTICE);
        }
        if self.recognizer.is_none() {
            notices.push(RECOGNITION_UNSUPPORTED_NOTICE);
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <strong>there</strong></p>"), "Hello there");
        assert_eq!(strip_tags("line<br/>break"), "linebreak");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn test_missing_notices() {
        assert_eq!(SpeechCapabilities::none().missing_notices().len(), 2);
    }
}
