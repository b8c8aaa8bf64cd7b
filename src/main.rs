//! Workflow Policy Generator
//!
//! Writes a policy-bot policy requiring every pull request workflow to pass.

use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use workflow_policy::{
    Generator,
    config::{GeneratorConfig, LogFormat, load_config, validate_config},
    generator::open_override,
    output::PolicyWriter,
    workflow::DirSource,
};

/// Generate a policy-bot policy from GitHub Actions workflows
#[derive(Parser, Debug)]
#[command(name = "workflow-policy")]
#[command(version, about, long_about = None)]
struct Args {
    /// Repository root containing the workflow directory
    root: PathBuf,

    /// Output file, "-" for stdout [default: .policy.yml]
    #[arg(short, long, env = "WORKFLOW_POLICY_OUTPUT")]
    output: Option<String>,

    /// Policy to merge with the generated one, "-" for stdin
    #[arg(short, long, env = "WORKFLOW_POLICY_MERGE_WITH")]
    merge_with: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "WORKFLOW_POLICY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "WORKFLOW_POLICY_CONFIG")]
    config: Option<String>,
}

/// Whether the process runs inside GitHub Actions
fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Whether a GitHub Actions re-run asked for debug logging
fn runner_debug() -> bool {
    std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1")
}

/// Apply CLI flags on top of the loaded configuration.
///
/// Log level precedence: `--log-level`, then `actions_debug`, then config.
/// `RUST_LOG` still overrides all of them when the subscriber is built.
fn apply_args(config: &mut GeneratorConfig, args: &Args, actions_debug: bool) {
    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }
    if let Some(merge_with) = &args.merge_with {
        config.merge.path = Some(merge_with.clone());
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    } else if actions_debug {
        config.logging.level = "debug".to_string();
    }
}

fn init_logging(config: &GeneratorConfig, in_actions: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    match (config.logging.format, in_actions) {
        (LogFormat::Json, _) => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
        (LogFormat::Pretty, true) => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(false)
                    .without_time(),
            )
            .init(),
        (LogFormat::Pretty, false) => registry
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration, CLI flags on top
    let in_actions = in_github_actions();
    let mut config = load_config(args.config.as_deref())?;
    apply_args(&mut config, &args, in_actions && runner_debug());
    validate_config(&config)?;

    init_logging(&config, in_actions);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %args.root.display(),
        "Generating policy"
    );

    let mut merge_source = config
        .merge
        .source()
        .map(open_override)
        .transpose()
        .inspect_err(|e| error!(error = %e, "Failed to open policy to merge"))?;

    let writer = PolicyWriter::create(&config.output.path)
        .inspect_err(|e| error!(error = %e, "Failed to create output"))?;

    let mut generator = Generator::new(DirSource::new(&args.root), config.discovery.clone());
    if config.output.header {
        generator = generator.with_header(env!("CARGO_PKG_NAME"));
    }

    generator
        .run(merge_source.as_deref_mut(), writer)
        .inspect_err(|e| error!(error = %e, "Failed to generate policy"))?;

    Ok(())
}
