//! Study shortcuts: translate, image, tts, quiz

use super::param;
use crate::commands::Shortcut;
use serde_json::json;

/// Default quiz length when the input does not name one
const DEFAULT_QUIZ_QUESTIONS: u64 = 5;

/// Creates study shortcuts
pub fn create_shortcuts() -> Vec<Shortcut> {
    vec![
        create_translate_shortcut(),
        create_image_shortcut(),
        create_tts_shortcut(),
        create_quiz_shortcut(),
    ]
}

/// "Translate this to Spanish: Good morning"
fn create_translate_shortcut() -> Shortcut {
    Shortcut::new(
        "translate",
        r"(?is)^translate\s+(?:this\s+)?(?:to|into)\s+([a-z][a-z\- ]*?)\s*:\s*(.+)$",
        "/translate",
    )
    .description("Translate text into another language")
    .extract(|caps| {
        json!({
            "target": caps[1].trim(),
            "text": caps[2].trim(),
        })
    })
    .success(|params, response| {
        format!(
            "🌐 **{}:** {}",
            param(params, "target"),
            response.str_field("translated_text").unwrap_or_default()
        )
    })
    .failure(|_, response| format!("❌ Translation failed: {}", response.error_text()))
}

/// "Generate an image of the water cycle"
fn create_image_shortcut() -> Shortcut {
    Shortcut::new(
        "image",
        r"(?is)^(?:generate|create|draw)\s+(?:an?\s+)?(?:image|picture|diagram)\s+(?:of\s+)?(.+)$",
        "/generate",
    )
    .description("Generate an illustration from a prompt")
    .extract(|caps| json!({ "prompt": caps[1].trim() }))
    .success(|params, response| {
        format!(
            "🖼️ Here is your image:\n\n![{}]({})",
            param(params, "prompt"),
            response.str_field("image_url").unwrap_or_default()
        )
    })
    .failure(|_, response| format!("❌ Image generation failed: {}", response.error_text()))
}

/// "Read aloud: the mitochondria is the powerhouse of the cell"
fn create_tts_shortcut() -> Shortcut {
    Shortcut::new("tts", r"(?is)^(?:read\s+aloud|speak|say)\s*:\s*(.+)$", "/tts")
        .description("Convert text to downloadable speech")
        .extract(|caps| json!({ "text": caps[1].trim() }))
        .success(|_, response| {
            format!(
                "🔊 Audio ready: [listen]({})",
                response.str_field("audio_url").unwrap_or_default()
            )
        })
        .failure(|_, response| format!("❌ Text-to-speech failed: {}", response.error_text()))
}

/// "Quiz me on algebra with 10 questions"
fn create_quiz_shortcut() -> Shortcut {
    Shortcut::new(
        "quiz",
        r"(?i)^quiz\s+me\s+on\s+(.+?)(?:\s+with\s+(\d+)\s+questions?)?\s*$",
        "/quiz/customize",
    )
    .description("Build a custom quiz on a topic")
    .extract(|caps| {
        let questions = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(DEFAULT_QUIZ_QUESTIONS);
        json!({
            "topic": caps[1].trim(),
            "num_questions": questions,
        })
    })
    .success(|params, response| {
        let questions = params
            .get("num_questions")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_QUIZ_QUESTIONS);
        let mut message = format!(
            "📝 Your {} quiz with {} questions is ready!",
            param(params, "topic"),
            questions
        );
        if let Some(url) = response.str_field("quiz_url") {
            message.push_str(&format!(" [Start quiz]({url})"));
        }
        message
    })
    .failure(|_, response| format!("❌ Could not create quiz: {}", response.error_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ApiResponse;
    use serde_json::json;

    #[test]
    fn test_translate_extraction() {
        let shortcut = create_translate_shortcut();
        let params = shortcut
            .parameters("Translate this to Spanish: Good morning")
            .unwrap();
        assert_eq!(params, json!({ "target": "Spanish", "text": "Good morning" }));

        let params = shortcut.parameters("translate into Brazilian Portuguese:hi").unwrap();
        assert_eq!(params["target"], "Brazilian Portuguese");
        assert!(shortcut.parameters("Translate this to Spanish").is_none());
    }

    #[test]
    fn test_translate_templates() {
        let shortcut = create_translate_shortcut();
        let params = json!({ "target": "Spanish", "text": "Good morning" });
        let ok = ApiResponse::ok(json!({ "translated_text": "Buenos días" }));
        assert_eq!(shortcut.reply_message(&params, &ok), "🌐 **Spanish:** Buenos días");
        assert_eq!(
            shortcut.reply_message(&params, &ApiResponse::failed("unsupported language")),
            "❌ Translation failed: unsupported language"
        );
    }

    #[test]
    fn test_quiz_defaults_question_count() {
        let shortcut = create_quiz_shortcut();
        assert_eq!(
            shortcut.parameters("quiz me on cell biology").unwrap(),
            json!({ "topic": "cell biology", "num_questions": 5 })
        );
        assert_eq!(
            shortcut.parameters("Quiz me on algebra with 1 question").unwrap(),
            json!({ "topic": "algebra", "num_questions": 1 })
        );
    }

    #[test]
    fn test_image_and_tts_extraction() {
        assert_eq!(
            create_image_shortcut().parameters("Draw a diagram of the heart").unwrap(),
            json!({ "prompt": "the heart" })
        );
        assert_eq!(
            create_tts_shortcut().parameters("read aloud: chapter one").unwrap(),
            json!({ "text": "chapter one" })
        );
    }
}
