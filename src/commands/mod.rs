//! Shortcut commands: free-text patterns routed to auxiliary endpoints instead of chat.
//!
//! The table is ordered and evaluated first-match-wins, so one input issues at most
//! one request.

pub mod shortcuts;

use crate::backend::ApiResponse;
use log::debug;
use regex::{Captures, Regex};
use serde_json::{json, Value};

pub type ExtractFn = fn(&Captures) -> Value;
pub type TemplateFn = fn(&Value, &ApiResponse) -> String;

/// One row of the shortcut table
pub struct Shortcut {
    pub name: &'static str,
    pub description: &'static str,
    pub endpoint: &'static str,
    pattern: Regex,
    extract: ExtractFn,
    success: TemplateFn,
    failure: TemplateFn,
}

impl Shortcut {
    /// New shortcut with no parameters and generic templates
    ///
    /// Patterns are compile-time constants, so an invalid one is a programming error.
    pub fn new(name: &'static str, pattern: &str, endpoint: &'static str) -> Self {
        Shortcut {
            name,
            description: "",
            endpoint,
            pattern: Regex::new(pattern).expect("Invalid shortcut pattern"),
            extract: |_| json!({}),
            success: |_, _| "✅ Done.".to_string(),
            failure: |_, response| format!("❌ {}", response.error_text()),
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn extract(mut self, extract: ExtractFn) -> Self {
        self.extract = extract;
        self
    }

    pub fn success(mut self, success: TemplateFn) -> Self {
        self.success = success;
        self
    }

    pub fn failure(mut self, failure: TemplateFn) -> Self {
        self.failure = failure;
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Request parameters when `input` matches this shortcut
    pub fn parameters(&self, input: &str) -> Option<Value> {
        self.pattern.captures(input).map(|caps| (self.extract)(&caps))
    }

    /// Message to show for an endpoint reply, chosen by its `success` flag
    pub fn reply_message(&self, params: &Value, response: &ApiResponse) -> String {
        if response.success {
            (self.success)(params, response)
        } else {
            (self.failure)(params, response)
        }
    }
}

/// A matched shortcut and the parameters pulled from the input
pub struct ShortcutMatch<'a> {
    pub shortcut: &'a Shortcut,
    pub params: Value,
}

pub struct ShortcutTable {
    shortcuts: Vec<Shortcut>,
}

impl Default for ShortcutTable {
    fn default() -> Self {
        ShortcutTable {
            shortcuts: create_shortcuts(),
        }
    }
}

impl ShortcutTable {
    pub fn new(shortcuts: Vec<Shortcut>) -> Self {
        ShortcutTable { shortcuts }
    }

    /// Built-in table restricted to an allowlist (`None` = every shortcut)
    pub fn filtered(allowed: Option<&[String]>) -> Self {
        let shortcuts = create_shortcuts()
            .into_iter()
            .filter(|s| allows_shortcut(allowed, s.name))
            .collect();
        ShortcutTable { shortcuts }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.shortcuts.iter().map(|s| s.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shortcut> {
        self.shortcuts.iter()
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    /// First shortcut matching the trimmed input
    pub fn matching(&self, input: &str) -> Option<ShortcutMatch<'_>> {
        let input = input.trim();
        self.shortcuts.iter().find_map(|shortcut| {
            shortcut.parameters(input).map(|params| {
                debug!("Input matched shortcut '{}'", shortcut.name);
                ShortcutMatch { shortcut, params }
            })
        })
    }
}

fn allows_shortcut(allowed: Option<&[String]>, name: &str) -> bool {
    match allowed {
        None => true,
        Some(allowed) => allowed.iter().any(|a| a == name),
    }
}

/// Every built-in shortcut, in evaluation order
pub fn create_shortcuts() -> Vec<Shortcut> {
    let mut all = shortcuts::study::create_shortcuts();
    all.extend(shortcuts::planner::create_shortcuts());
    all
}

/// Names of every built-in shortcut
pub fn builtin_shortcut_names() -> Vec<&'static str> {
    create_shortcuts().iter().map(|s| s.name).collect()
}
