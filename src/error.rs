//! Domain-specific error types for dl-avatars
//!
//! Fatal errors (settings, client creation, base directory) surface as
//! `AvatarDlError`. Group and item failures are logged where they happen and
//! never travel further than their own boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the dl-avatars application
#[derive(Error, Debug)]
pub enum AvatarDlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Discord error: {0}")]
    Discord(#[from] DiscordError),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Settings loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read settings file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    #[error("Bot token not configured")]
    NoToken,

    #[error("No server IDs configured")]
    NoServers,

    #[error("Invalid configuration: {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Could not create output directory {path}: {source}")]
    BaseDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Discord REST API errors
#[derive(Error, Debug)]
pub enum DiscordError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response from {endpoint}: {source}")]
    Json {
        endpoint: String,
        source: serde_json::Error,
    },
}

/// Per-avatar download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {status}")]
    Status { status: u16 },

    #[error("Cannot derive a file name from {url}")]
    NoFileName { url: String },

    #[error("Error creating directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to save file {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias using AvatarDlError
pub type Result<T> = std::result::Result<T, AvatarDlError>;
