use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;

use crate::{copy_plan::PlannedCopy, runtime::Runtime};

/// A planned copy that could not be carried out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedCopy {
    #[serde(flatten)]
    pub copy: PlannedCopy,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CopyOutcome {
    pub copied: Vec<PlannedCopy>,
    pub failed: Vec<FailedCopy>,
}

/// Copy every planned package into `dest`, overwriting existing files.
///
/// Only an unusable destination aborts; a single failed copy is recorded and
/// the remaining ones still run.
#[tracing::instrument(skip(runtime, plan))]
pub fn execute_copies<R: Runtime>(
    runtime: &R,
    plan: &[PlannedCopy],
    dest: &Path,
) -> Result<CopyOutcome> {
    if !runtime.exists(dest) {
        runtime
            .create_dir_all(dest)
            .with_context(|| format!("Failed to create destination {}", dest.display()))?;
        debug!("Created destination directory: {:?}", dest);
    }

    let mut outcome = CopyOutcome::default();
    for copy in plan {
        let target = dest.join(&copy.destination);
        match runtime.copy(&copy.source, &target) {
            Ok(bytes) => {
                info!("Copied {:?} to {:?} ({} bytes)", copy.source, target, bytes);
                outcome.copied.push(copy.clone());
            }
            Err(e) => {
                warn!("Failed to copy {:?} to {:?}: {:#}", copy.source, target, e);
                outcome.failed.push(FailedCopy {
                    copy: copy.clone(),
                    error: format!("{:#}", e),
                });
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::normalize;
    use crate::runtime::MockRuntime;
    use anyhow::anyhow;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn planned(raw: &str, source: &str) -> PlannedCopy {
        let package = normalize(raw).unwrap();
        PlannedCopy {
            destination: package.file_name(),
            package,
            source: PathBuf::from(source),
        }
    }

    #[test]
    fn test_execute_copies_continues_after_failure() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/dest")))
            .returning(|_| true);
        runtime
            .expect_copy()
            .with(
                eq(PathBuf::from("/src/B.Thing.3.var")),
                eq(PathBuf::from("/dest/B.Thing.3.var")),
            )
            .returning(|_, _| Err(anyhow!("permission denied")));
        runtime
            .expect_copy()
            .with(
                eq(PathBuf::from("/src/C.Other.1.var")),
                eq(PathBuf::from("/dest/C.Other.1.var")),
            )
            .returning(|_, _| Ok(42));

        let plan = vec![
            planned("B.Thing.3", "/src/B.Thing.3.var"),
            planned("C.Other.1", "/src/C.Other.1.var"),
        ];
        let outcome = execute_copies(&runtime, &plan, Path::new("/dest")).unwrap();

        assert_eq!(outcome.copied, vec![plan[1].clone()]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].copy, plan[0]);
        assert!(outcome.failed[0].error.contains("permission denied"));
    }

    #[test]
    fn test_execute_copies_creates_destination() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/new/dest")))
            .times(1)
            .returning(|_| Ok(()));

        let outcome = execute_copies(&runtime, &[], Path::new("/new/dest")).unwrap();
        assert_eq!(outcome, CopyOutcome::default());
    }

    #[test]
    fn test_execute_copies_unusable_destination() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        runtime
            .expect_create_dir_all()
            .returning(|_| Err(anyhow!("read-only file system")));

        let plan = vec![planned("B.Thing.3", "/src/B.Thing.3.var")];
        let err = execute_copies(&runtime, &plan, Path::new("/ro")).unwrap_err();
        assert!(err.to_string().contains("Failed to create destination"));
    }
}
