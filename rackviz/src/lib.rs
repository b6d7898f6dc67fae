//! Library surface of rackviz: the scene model, the metrics poller and the
//! terminal renderer. The binary in main.rs only wires these together.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod poller;
pub mod scene;
pub mod types;
pub mod ui;
pub mod viewport;
pub mod ws;
