// Library surface for the binary, headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod error;
pub mod export;
pub mod geo;
pub mod logging;
pub mod profile;
pub mod records;
pub mod route;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod stats;
pub mod store;
pub mod timer;
pub mod ui;
pub mod util;
