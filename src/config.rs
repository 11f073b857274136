//! Process-level settings that are not about authentication.

use std::path::PathBuf;

const DEV_PLATFORM: &str = "dev";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Deployment platform. Destructive admin endpoints only run on `dev`.
    pub platform: String,
    /// Directory served under `/app`.
    pub file_root: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let platform = lookup("PLATFORM").unwrap_or_default();
        let file_root = lookup("FILEPATH_ROOT")
            .filter(|root| !root.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            platform,
            file_root,
        }
    }

    pub fn dev() -> Self {
        Self {
            platform: DEV_PLATFORM.to_string(),
            file_root: PathBuf::from("."),
        }
    }

    pub fn is_dev(&self) -> bool {
        self.platform == DEV_PLATFORM
    }
}
