//! Asset error types
//!
//! Errors from locating resource files such as robot descriptions.

use std::fmt;

/// Error type for asset operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// No resource root contains the requested path
    NotFound {
        path: String,
        searched: Vec<String>,
    },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound { path, searched } if searched.is_empty() => {
                write!(f, "Asset not found: {}", path)
            }
            AssetError::NotFound { path, searched } => {
                write!(f, "Asset not found: {} (searched {})", path, searched.join(", "))
            }
        }
    }
}

impl std::error::Error for AssetError {}
