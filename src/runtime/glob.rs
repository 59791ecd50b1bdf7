//! Recursive file matching.

use anyhow::{Context, Result};
use log::warn;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn glob_impl(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let entries = ::glob::glob(pattern)
            .with_context(|| format!("Invalid search pattern {:?}", pattern))?;

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => warn!("Skipping unreadable entry while matching {}: {}", pattern, e),
            }
        }
        paths.sort();
        Ok(paths)
    }
}
