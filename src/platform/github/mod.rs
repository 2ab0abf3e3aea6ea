pub mod client;
pub mod errors;
pub mod mapper;

pub use client::GitHubHost;
