pub mod app;
pub mod ci;
pub mod config;
pub mod credentials;
pub mod error;
pub mod platform;
pub mod state;
pub mod tracker;
pub mod vcs;
pub mod workflow;
