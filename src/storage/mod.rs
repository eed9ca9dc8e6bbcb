//! Persistent storage
//!
//! This module handles all data persistence: the chat history database, seed
//! records, settings and downloaded model files.

pub mod database;
pub mod huggingface;
pub mod seed;
pub mod settings;

use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Could not determine the application data directory")]
    NoDataDir,
    #[error("History store lock poisoned")]
    Poisoned,
}

/// Platform data directory of the application
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    ProjectDirs::from("", "", "duochat")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}
