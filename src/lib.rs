//! dl-avatars - bulk avatar downloader for Discord servers
//!
//! For every configured server this library resolves the server name, lists
//! its members and downloads each custom avatar into
//! `<output>/<server name>/<avatar hash>.png`.
//!
//! # Features
//!
//! - Async/await support via Tokio
//! - Concurrent downloads per server with an optional cap
//! - Failures isolated per avatar and per server
//! - Progress reporting
//!
//! # Example
//!
//! ```no_run
//! use dl_avatars::{DiscordClient, Harvester, HttpFetcher, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load("settings.json")?;
//!     settings.validate()?;
//!     let base_dir = settings.ensure_base_dir()?;
//!
//!     let client = DiscordClient::new(&settings.token, settings.timeout())?;
//!     let fetcher = HttpFetcher::new(client.http().clone());
//!     Harvester::new(&client, &fetcher, &settings, base_dir)
//!         .run(&settings.server_ids)
//!         .await;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod progress;

// Feature modules organized by functionality
pub mod discord;
pub mod download;
pub mod orchestrator;

#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use config::Settings;
pub use discord::{DiscordClient, GuildDirectory};
pub use download::{BatchReport, Fetch, HttpFetcher};
pub use error::{AvatarDlError, Result};
pub use orchestrator::{GroupOutcome, Harvester};
