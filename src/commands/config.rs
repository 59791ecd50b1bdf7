use anyhow::{Context, Result, bail};
use log::debug;
use std::path::PathBuf;

use crate::runtime::Runtime;

use super::render::OutputFormat;

/// File written by `--output` when no file name is given.
pub const DEFAULT_OUTPUT_FILE: &str = "SearchVarOutput.txt";

/// What the user asked for, before validation.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub path: PathBuf,
    pub source: Option<PathBuf>,
    pub name: Option<String>,
    pub output: Option<PathBuf>,
    pub missing_only: bool,
    pub verbose: bool,
    pub dest: Option<PathBuf>,
    pub copy_found: bool,
    pub format: OutputFormat,
}

/// Validated scan settings with absolute paths.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub source: Option<PathBuf>,
    /// Partial package name to search for, without a `.var` suffix
    pub name: Option<String>,
    pub output: Option<PathBuf>,
    pub missing_only: bool,
    pub verbose: bool,
    pub dest: Option<PathBuf>,
    pub copy_found: bool,
    pub format: OutputFormat,
}

impl Config {
    /// Validate options before any scanning happens.
    ///
    /// A missing primary or source directory is fatal: resolving against a
    /// partial collection would silently report wrong results.
    #[tracing::instrument(skip(runtime))]
    pub fn new<R: Runtime>(runtime: &R, options: ScanOptions) -> Result<Self> {
        let cwd = runtime.current_dir()?;
        let absolute = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                cwd.join(path)
            }
        };

        let root = absolute(options.path);
        if !runtime.exists(&root) {
            bail!("The given path doesn't exist: {}", root.display());
        }

        let source = options.source.map(&absolute);
        if let Some(ref source) = source
            && !runtime.exists(source)
        {
            bail!("The given source path doesn't exist: {}", source.display());
        }

        if options.copy_found && options.dest.is_none() {
            bail!("A destination folder (--dest) must be specified when using --copy-found");
        }
        let dest = options.dest.map(&absolute);

        let output = options.output.map(&absolute);
        if let Some(ref output) = output {
            prepare_output_file(runtime, output)?;
        }

        let name = options.name.as_deref().and_then(search_name);

        let config = Self {
            root,
            source,
            name,
            output,
            missing_only: options.missing_only,
            verbose: options.verbose,
            dest,
            copy_found: options.copy_found,
            format: options.format,
        };
        debug!("Using config: {:?}", config);
        Ok(config)
    }
}

/// Create the output file's directory and truncate the file, so an unusable
/// output path fails before the scan instead of after it.
fn prepare_output_file<R: Runtime>(runtime: &R, output: &std::path::Path) -> Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !runtime.exists(parent)
    {
        runtime
            .create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        debug!("Created output directory: {:?}", parent);
    }

    runtime
        .write(output, b"")
        .with_context(|| format!("Failed to create/open output file {}", output.display()))
}

/// Accept both `Creator.Name` and a file name like `Creator.Name.1.var`.
fn search_name(name: &str) -> Option<String> {
    let name = name.trim();
    let name = name.strip_suffix(".var").unwrap_or(name);
    (!name.is_empty()).then(|| name.to_string())
}
