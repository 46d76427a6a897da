// Core layer - configuration and persisted client state
pub mod config;
pub mod database;
pub mod history;
pub mod identity;
pub mod storage;
pub mod theme;

// Presentation
pub mod export;
pub mod renderer;
pub mod speech;
pub mod view;

// Collaborators behind seams
pub mod backend;
pub mod transport;

// Application layer
pub mod commands;
pub mod controller;

pub use config::ClientConfig;
pub use controller::{ChatController, ChatState, KeyAction, KeyEvent, SubmitOutcome};
pub use database::Database;
pub use history::{ChatEntry, HistoryPolicy, HistoryStore, Role};
pub use storage::{MemoryStorage, Storage};
pub use view::{ChatView, HeadlessView};
