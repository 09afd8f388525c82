// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds CLI parsing and terminal setup.
pub mod api;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod drafts;
pub mod editor;
pub mod highlight;
pub mod language;
pub mod logging;
pub mod notify;
pub mod runtime;
pub mod session;
pub mod ui;
