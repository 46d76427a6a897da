//! Terminal front end for the Study Buddy chat client
//!
//! Each stdin line is typed into the message input and submitted with Enter; a line
//! ending in `\` continues the message on the next line (Shift+Enter). Buttons of the
//! web widget map to slash commands:
//! - /clear, /theme, /mic, /export [path], /upload <path>, /help, /quit
//!
//! Configuration can come from:
//! - config.yaml or the file named by CONFIG_FILE
//! - Environment variables (STUDY_BUDDY_*)

use anyhow::Result;
use async_trait::async_trait;
use dotenvy::dotenv;
use log::{debug, error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use study_buddy::backend::HttpBackend;
use study_buddy::controller::{ChatController, KeyAction, KeyEvent};
use study_buddy::export::Speaker;
use study_buddy::renderer::RenderedMessage;
use study_buddy::speech::SpeechCapabilities;
use study_buddy::theme::ThemePreference;
use study_buddy::transport::HttpTransport;
use study_buddy::view::ChatView;
use study_buddy::{ClientConfig, Database, Storage};

type LineReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>>;

/// Prints the transcript to stdout and reads confirmations from stdin
struct TerminalView {
    input: Mutex<String>,
    lines: LineReceiver,
}

impl TerminalView {
    fn new(lines: LineReceiver) -> Self {
        TerminalView {
            input: Mutex::new(String::new()),
            lines,
        }
    }

    fn input(&self) -> MutexGuard<'_, String> {
        self.input.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatView for TerminalView {
    fn input_value(&self) -> String {
        self.input().clone()
    }

    fn set_input_value(&self, value: &str) {
        *self.input() = value.to_string();
    }

    fn append_message(&self, message: &RenderedMessage) {
        println!("{}: {}\n", Speaker::from(message.role), message.text);
    }

    fn clear_transcript(&self) {
        print!("\x1B[2J\x1B[H");
    }

    fn scroll_to_latest(&self) {
        let _ = std::io::stdout().flush();
    }

    fn mark_live_region(&self) {
        debug!("Terminal transcript is read linearly, no live region needed");
    }

    fn apply_theme(&self, theme: ThemePreference) {
        println!("🎨 Theme: {theme}");
    }

    fn set_theme_toggle(&self, _checked: bool) {}

    fn notify(&self, notice: &str) {
        println!("{notice}");
    }

    async fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = std::io::stdout().flush();
        match self.lines.lock().await.recv().await {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            None => false,
        }
    }
}

/// Handle one stdin line; returns false when the client should exit
async fn handle_line(controller: &ChatController, view: &TerminalView, line: String) -> bool {
    let trimmed = line.trim();
    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (trimmed, ""),
    };

    match command {
        "/quit" | "/exit" => return false,
        "/clear" => {
            controller.clear_chat().await;
        }
        "/theme" => {
            controller.toggle_theme().await;
        }
        "/mic" => {
            if controller.dictate().await.is_some() {
                controller.submit_input().await;
            }
        }
        "/upload" if !argument.is_empty() => {
            controller.upload_file(Path::new(argument)).await;
        }
        "/upload" => view.notify("Usage: /upload <path>"),
        "/export" => {
            let path = if argument.is_empty() {
                PathBuf::from(format!(
                    "astra-chat-{}.txt",
                    chrono::Local::now().format("%Y%m%d-%H%M%S")
                ))
            } else {
                PathBuf::from(argument)
            };
            match tokio::fs::write(&path, controller.export_transcript()).await {
                Ok(()) => view.notify(&format!("💾 Transcript saved to {}", path.display())),
                Err(e) => {
                    error!("Failed to write transcript to {}: {e}", path.display());
                    view.notify(&format!("❌ Could not save transcript: {e}"));
                }
            }
        }
        "/help" => {
            view.notify("Commands: /clear /theme /mic /export [path] /upload <path> /quit");
            for shortcut in controller.shortcuts().iter() {
                view.notify(&format!("  {:<10} {}", shortcut.name, shortcut.description));
            }
        }
        _ => {
            let mut buffer = view.input_value();
            match line.strip_suffix('\\') {
                Some(partial) => {
                    buffer.push_str(partial);
                    let (action, _) = controller.on_key(KeyEvent::shift_enter()).await;
                    if action == KeyAction::InsertNewline {
                        buffer.push('\n');
                    }
                    view.set_input_value(&buffer);
                }
                None => {
                    buffer.push_str(&line);
                    view.set_input_value(&buffer);
                    controller.on_key(KeyEvent::enter()).await;
                }
            }
        }
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = ClientConfig::auto_load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_level),
    )
    .init();

    info!("Starting Study Buddy chat client against {}", config.server_url);

    let storage: Arc<dyn Storage> = Arc::new(Database::new(&config.storage_path).await?);
    let transport = Arc::new(HttpTransport::new(&config.server_url, config.request_timeout())?);
    let backend = Arc::new(HttpBackend::new(&config.server_url, config.request_timeout())?);

    // Stdin is read on its own task so confirmations and submissions share one stream
    let (line_sender, line_receiver) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_sender.send(line).is_err() {
                break;
            }
        }
    });
    let lines: LineReceiver = Arc::new(tokio::sync::Mutex::new(line_receiver));
    let view = Arc::new(TerminalView::new(lines.clone()));

    let controller = ChatController::new(
        &config,
        storage,
        view.clone(),
        transport,
        backend,
        SpeechCapabilities::none(),
    )
    .await;
    info!("Session identity: {}", controller.identity());

    let mut responses = controller.responses();
    controller.init().await;

    loop {
        tokio::select! {
            line = async { lines.lock().await.recv().await } => {
                match line {
                    Some(line) => {
                        if !handle_line(&controller, &view, line).await {
                            break;
                        }
                    }
                    None => {
                        info!("Input closed");
                        break;
                    }
                }
            }
            Some(payload) = responses.recv() => {
                controller.handle_response_value(payload).await;
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    controller.shutdown().await;
    info!("Study Buddy client stopped");
    Ok(())
}
