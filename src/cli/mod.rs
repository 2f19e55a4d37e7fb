pub mod commands;
pub mod history;
pub mod probe;
pub mod render;
pub mod scan;
pub mod serve;

pub use commands::{Cli, Commands};

use std::path::Path;

use crate::config::{parse_config, SitescanConfig};
use crate::errors::ScanError;

/// Load the config file when one was given; otherwise run on env and defaults.
pub async fn load_config(path: Option<&str>) -> Result<SitescanConfig, ScanError> {
    match path {
        Some(path) => parse_config(Path::new(path)).await,
        None => Ok(SitescanConfig::default()),
    }
}

/// Process exit code for a failed command.
pub fn exit_code(err: &ScanError) -> i32 {
    match err {
        ScanError::Config(_) | ScanError::Yaml(_) => 2,
        ScanError::EngineUnreachable(_) => 3,
        ScanError::InvalidUrl(_) => 4,
        ScanError::Cancelled => 5,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&ScanError::Config("x".into())), 2);
        assert_eq!(exit_code(&ScanError::EngineUnreachable("x".into())), 3);
        assert_eq!(exit_code(&ScanError::InvalidUrl("x".into())), 4);
        assert_eq!(exit_code(&ScanError::Cancelled), 5);
        assert_eq!(exit_code(&ScanError::ScanTimeout { attempts: 60 }), 1);
    }

    #[tokio::test]
    async fn test_missing_config_defaults() {
        let config = load_config(None).await.unwrap();
        assert!(config.engine.is_none());
    }
}
