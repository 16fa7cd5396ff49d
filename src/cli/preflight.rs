//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::error::{DocchatError, Result};
use crate::openai::API_KEY_ENV;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingesting local files needs the embeddings API.
    Ingest,
    /// YouTube ingestion additionally needs yt-dlp.
    IngestYoutube,
    /// Asking, chatting and searching embed the query.
    Query,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    check_api_key(std::env::var(API_KEY_ENV).ok())?;
    if let Operation::IngestYoutube = operation {
        check_tool("yt-dlp")?;
    }
    Ok(())
}

/// Check that an API key value is present.
fn check_api_key(value: Option<String>) -> Result<()> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(DocchatError::Config(format!(
            "{} is empty. Set it in your environment or a .env file.",
            API_KEY_ENV
        ))),
        None => Err(DocchatError::Config(format!(
            "{} not set. Set it in your environment or a .env file.",
            API_KEY_ENV
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(DocchatError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DocchatError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(DocchatError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_check() {
        assert!(check_api_key(Some("sk-test".to_string())).is_ok());
        assert!(matches!(
            check_api_key(Some("  ".to_string())),
            Err(DocchatError::Config(_))
        ));
        assert!(matches!(check_api_key(None), Err(DocchatError::Config(_))));
    }

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("docchat-no-such-tool"),
            Err(DocchatError::ToolNotFound(_))
        ));
    }
}
