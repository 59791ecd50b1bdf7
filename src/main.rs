use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vardeps::commands::{DEFAULT_OUTPUT_FILE, OutputFormat, ScanOptions, scan};

/// vardeps - dependency scanner for .var packages
///
/// Lists packages that no other package or preset depends on, and references
/// that nothing in the collection satisfies.
///
/// Examples:
///   vardeps -p ~/VaM                      # Unused packages and missing references
///   vardeps -p ~/VaM -n Creator.Hair      # Who depends on Creator.Hair
///   vardeps -p ~/VaM -s ~/Archive -c -d ~/VaM/AddonPackages
#[derive(Parser, Debug)]
#[command(author, version = env!("VARDEPS_VERSION"), about)]
struct Cli {
    /// Collection root, containing AddonPackages and Custom (also via VARDEPS_PATH)
    #[arg(
        long,
        short = 'p',
        env = "VARDEPS_PATH",
        value_name = "PATH",
        default_value = "."
    )]
    path: PathBuf,

    /// Secondary directory searched for missing dependencies (also via VARDEPS_SOURCE)
    #[arg(long, short = 's', env = "VARDEPS_SOURCE", value_name = "PATH")]
    source: Option<PathBuf>,

    /// Only report packages whose name contains NAME
    #[arg(long, short = 'n', value_name = "NAME")]
    name: Option<String>,

    /// Also save the results to FILE
    #[arg(
        long,
        short = 'o',
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_OUTPUT_FILE
    )]
    output: Option<PathBuf>,

    /// Only report missing dependencies
    #[arg(long, short = 'm')]
    missing_only: bool,

    /// Show satisfied and found dependencies, and log progress
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Directory to copy found dependencies into
    #[arg(long, short = 'd', value_name = "PATH")]
    dest: Option<PathBuf>,

    /// Copy dependencies found in the source directory to --dest
    #[arg(long, short = 'c', requires = "dest")]
    copy_found: bool,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl From<Cli> for ScanOptions {
    fn from(cli: Cli) -> Self {
        Self {
            path: cli.path,
            source: cli.source,
            name: cli.name,
            output: cli.output,
            missing_only: cli.missing_only,
            verbose: cli.verbose,
            dest: cli.dest,
            copy_found: cli.copy_found,
            format: cli.format,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = vardeps::runtime::RealRuntime;
    scan(runtime, cli.into())
}
