//! Discord REST API access
//!
//! Only the three operations the harvester needs are covered: server lookup,
//! member listing and CDN avatar URLs.

mod client;
mod models;

pub use client::{DiscordClient, GuildDirectory, API_BASE, CDN_BASE, MEMBER_PAGE_LIMIT};
pub use models::{Guild, Member, User};
