//! Planner shortcuts: reminder, calendar, progress, export

use super::param;
use crate::commands::Shortcut;
use serde_json::json;

/// Export format used when the input does not name one
const DEFAULT_EXPORT_FORMAT: &str = "pdf";

/// Creates planner shortcuts
pub fn create_shortcuts() -> Vec<Shortcut> {
    vec![
        create_reminder_shortcut(),
        create_calendar_shortcut(),
        create_progress_shortcut(),
        create_export_shortcut(),
    ]
}

/// "Remind me to revise chemistry at 6pm"
fn create_reminder_shortcut() -> Shortcut {
    Shortcut::new(
        "reminder",
        r"(?i)^remind\s+me\s+to\s+(.+?)\s+(?:at|on)\s+(.+)$",
        "/reminders",
    )
    .description("Schedule a study reminder")
    .extract(|caps| {
        json!({
            "task": caps[1].trim(),
            "time": caps[2].trim(),
        })
    })
    .success(|params, _| {
        format!(
            "⏰ Reminder set: {} at {}",
            param(params, "task"),
            param(params, "time")
        )
    })
    .failure(|_, response| format!("❌ Could not set reminder: {}", response.error_text()))
}

/// "Export my calendar"
fn create_calendar_shortcut() -> Shortcut {
    Shortcut::new(
        "calendar",
        r"(?i)^export\s+(?:my\s+)?(?:calendar|schedule)\s*$",
        "/calendar/export",
    )
    .description("Export the study schedule as a calendar file")
    .success(|_, response| {
        format!(
            "📅 Calendar exported: [download]({})",
            response.str_field("file_url").unwrap_or_default()
        )
    })
    .failure(|_, response| format!("❌ Calendar export failed: {}", response.error_text()))
}

/// "Show my progress"
fn create_progress_shortcut() -> Shortcut {
    Shortcut::new(
        "progress",
        r"(?i)^(?:show\s+(?:me\s+)?|what(?:'s|\s+is)\s+)my\s+progress\s*\??$",
        "/progress",
    )
    .description("Summarise study progress")
    .success(|_, response| {
        let summary = response
            .str_field("summary")
            .map(str::to_string)
            .or_else(|| response.payload.get("progress").map(|p| p.to_string()))
            .unwrap_or_else(|| "No progress recorded yet.".to_string());
        format!("📈 Progress: {summary}")
    })
    .failure(|_, response| format!("❌ Could not load progress: {}", response.error_text()))
}

/// "Export chat as txt"
fn create_export_shortcut() -> Shortcut {
    Shortcut::new(
        "export",
        r"(?i)^export\s+(?:my\s+)?(?:chat|conversation|notes)(?:\s+(?:as|to)\s+(\w+))?\s*$",
        "/export",
    )
    .description("Export notes or the conversation in a chosen format")
    .extract(|caps| {
        let format = caps
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_else(|| DEFAULT_EXPORT_FORMAT.to_string());
        json!({ "format": format })
    })
    .success(|params, response| {
        format!(
            "📦 {} export ready: [download]({})",
            param(params, "format").to_uppercase(),
            response.str_field("file_url").unwrap_or_default()
        )
    })
    .failure(|_, response| format!("❌ Export failed: {}", response.error_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ApiResponse;
    use serde_json::json;

    #[test]
    fn test_reminder_extraction() {
        let shortcut = create_reminder_shortcut();
        assert_eq!(
            shortcut
                .parameters("Remind me to review flashcards on Friday at 9")
                .unwrap(),
            json!({ "task": "review flashcards", "time": "Friday at 9" })
        );
        let params = json!({ "task": "stretch", "time": "5pm" });
        assert_eq!(
            shortcut.reply_message(&params, &ApiResponse::ok(json!({}))),
            "⏰ Reminder set: stretch at 5pm"
        );
    }

    #[test]
    fn test_progress_phrasings() {
        let shortcut = create_progress_shortcut();
        for input in ["show my progress", "Show me my progress?", "what's my progress", "What is my progress"] {
            assert!(shortcut.parameters(input).is_some(), "{input}");
        }
        let response = ApiResponse::ok(json!({ "summary": "3 of 5 topics done" }));
        assert_eq!(
            shortcut.reply_message(&json!({}), &response),
            "📈 Progress: 3 of 5 topics done"
        );
    }

    #[test]
    fn test_export_format() {
        let shortcut = create_export_shortcut();
        assert_eq!(shortcut.parameters("export chat").unwrap(), json!({ "format": "pdf" }));
        assert_eq!(
            shortcut.parameters("Export my notes as DOCX").unwrap(),
            json!({ "format": "docx" })
        );
        assert!(create_calendar_shortcut().parameters("export my schedule").is_some());
    }
}
