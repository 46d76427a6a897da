//! # Feature: Theme Preference
//!
//! Persisted light/dark preference reflected onto the view root and its toggle control.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true

use crate::storage::{Storage, THEME_KEY};
use crate::view::ChatView;
use log::{debug, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    Light,
    #[default]
    Dark,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    /// State of the toggle control; checked means light
    pub fn is_light(&self) -> bool {
        *self == ThemePreference::Light
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            other => anyhow::bail!("Unknown theme '{}'", other),
        }
    }
}

#[derive(Clone)]
pub struct ThemeStore {
    storage: Arc<dyn Storage>,
    view: Arc<dyn ChatView>,
}

impl ThemeStore {
    pub fn new(storage: Arc<dyn Storage>, view: Arc<dyn ChatView>) -> Self {
        ThemeStore { storage, view }
    }

    /// Persisted preference, `Dark` when unset or unreadable
    pub async fn get(&self) -> ThemePreference {
        match self.storage.get(THEME_KEY).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring stored theme: {e}");
                ThemePreference::default()
            }),
            Ok(None) => ThemePreference::default(),
            Err(e) => {
                warn!("Failed to read theme preference: {e}");
                ThemePreference::default()
            }
        }
    }

    /// Persist and apply
    pub async fn set(&self, preference: ThemePreference) {
        if let Err(e) = self.storage.set(THEME_KEY, preference.as_str()).await {
            warn!("Failed to persist theme preference: {e}");
        }
        self.apply(preference);
    }

    /// Flip the current preference and return the new one
    pub async fn toggle(&self) -> ThemePreference {
        let next = self.get().await.toggled();
        self.set(next).await;
        next
    }

    /// Apply the persisted preference at startup without writing it back
    pub async fn init(&self) -> ThemePreference {
        let preference = self.get().await;
        self.apply(preference);
        preference
    }

    fn apply(&self, preference: ThemePreference) {
        debug!("Applying {preference} theme");
        self.view.apply_theme(preference);
        self.view.set_theme_toggle(preference.is_light());
    }
}
