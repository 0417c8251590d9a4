// Library surface for headless/integration tests and reuse.
// Keep this lean: terminal types live with the binary in main.rs and ui/.
pub mod admin;
pub mod app_dirs;
pub mod bank;
pub mod config;
pub mod error;
pub mod justification;
pub mod leaderboard;
pub mod record;
pub mod rules;
pub mod runtime;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod view;

pub use error::{QuizError, Result};
