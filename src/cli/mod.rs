// Purpose: Command-line front end: parse flags, set up logging, run the guess and emit a manifest.
// Inputs/Outputs: argv in; manifest on stdout or in a file; process exit code out.
// Invariants: Diagnostics go to stderr so stdout carries only the manifest.
// Gotchas: `-o` refuses to overwrite an existing file unless `--force` is given.

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::guess::{ScanOptions, Strategy, guess_deps};
use crate::manifest::Manifest;
use crate::pkg::build_ctx::BuildConfig;
use crate::pkg::locate::FsLocator;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("DEPGUESS_GIT_COMMIT"),
    ")"
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Toml,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "depguess",
    version = VERSION,
    about = "Guess the external dependencies of a Go source tree from its imports"
)]
pub struct Args {
    /// Project directory to inspect.
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// GOPATH entry to search; repeatable. Overrides $GOPATH.
    #[arg(long = "gopath", value_name = "DIR")]
    pub gopath: Vec<PathBuf>,

    /// Go installation root. Overrides $GOROOT.
    #[arg(long, value_name = "DIR")]
    pub goroot: Option<PathBuf>,

    /// Extra directory names the tree scan never enters (vendor and testdata always).
    #[arg(long = "skip-dir", value_name = "NAME")]
    pub skip_dirs: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Toml)]
    pub format: Format,

    /// Write the manifest here instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overwrite the output file if it exists.
    #[arg(long)]
    pub force: bool,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only errors.
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run_cli<I>(args: I) -> i32
where
    I: IntoIterator<Item = String>,
{
    let args = match Args::try_parse_from(std::iter::once("depguess".to_string()).chain(args)) {
        Ok(a) => a,
        Err(err) => {
            let code = if err.use_stderr() { 2 } else { 0 };
            let _ = err.print();
            return code;
        }
    };
    init_logging(args.verbose, args.quiet);
    match run(args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {:#}", err);
            1
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("DEPGUESS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("depguess={}", default)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn build_config(args: &Args) -> anyhow::Result<BuildConfig> {
    let mut cfg = BuildConfig::from_env()?;
    if let Some(goroot) = &args.goroot {
        cfg.goroot = Some(goroot.clone());
    }
    if !args.gopath.is_empty() {
        cfg.gopath = args.gopath.clone();
    }
    // The project dir is canonicalized below; search roots must match it.
    cfg.goroot = cfg.goroot.map(|p| p.canonicalize().unwrap_or(p));
    cfg.gopath = cfg
        .gopath
        .into_iter()
        .map(|p| p.canonicalize().unwrap_or(p))
        .collect();
    cfg.cwd = cfg
        .cwd
        .join(&args.dir)
        .canonicalize()
        .with_context(|| format!("project directory {}", args.dir.display()))?;
    Ok(cfg)
}

fn run(args: Args) -> anyhow::Result<()> {
    let cfg = build_config(&args)?;
    if !cfg.cwd.is_dir() {
        bail!("{} is not a directory", cfg.cwd.display());
    }
    let root = cfg.cwd.clone();
    let locator = FsLocator::new(cfg);

    let mut options = ScanOptions::default();
    options.skip_dirs.extend(args.skip_dirs.iter().cloned());

    info!("Generating a configuration file and guessing the dependencies");
    let guess = guess_deps(&locator, Path::new("."), &options)
        .with_context(|| format!("guess dependencies of {}", root.display()))?;
    if guess.strategy == Strategy::TreeScan && !guess.skipped.is_empty() {
        warn!(
            "{} director{} could not be resolved and were skipped",
            guess.skipped.len(),
            if guess.skipped.len() == 1 { "y" } else { "ies" }
        );
    }

    let manifest = Manifest::from_guess(&guess);
    let text = match args.format {
        Format::Toml => manifest.to_pretty_toml(),
        Format::Json => manifest.to_json()?,
    };

    match &args.output {
        Some(path) => {
            if path.exists() && !args.force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
