mod config;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use argv_shim_core::{Options, prepare_command};
use argv_shim_exec::{BinaryPath, ExecError, Invoker, Mode};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ShimConfig};

#[derive(Debug, Parser)]
#[command(name = "argv-shim", version)]
#[command(about = "Run a wrapped executable with schema-serialized options")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the prepared argument vector for a command as JSON.
    Args(ArgsArgs),
    /// Run a configured command against the wrapped executable.
    Run(RunArgs),
    /// Validate every command schema in a config file.
    Validate(ValidateArgs),
    /// Write a starter config file for a wrapped binary.
    Init(InitArgs),
}

#[derive(Debug, Args)]
struct OptionsInput {
    /// Shim config file (YAML, or JSON with a .json extension).
    #[arg(long)]
    config: PathBuf,
    /// Options object as inline JSON.
    #[arg(long, conflicts_with = "options_file")]
    options: Option<String>,
    /// File containing the options object as JSON.
    #[arg(long)]
    options_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ArgsArgs {
    /// Configured command name.
    name: String,
    #[command(flatten)]
    input: OptionsInput,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Configured command name.
    name: String,
    #[command(flatten)]
    input: OptionsInput,
    /// Connect the child to this terminal instead of capturing its output.
    #[arg(long)]
    live: bool,
    /// Override the configured binary path.
    #[arg(long)]
    binary: Option<PathBuf>,
    /// Kill the child if it runs longer than this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Shim config file (YAML, or JSON with a .json extension).
    #[arg(long)]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct InitArgs {
    /// Config file to create (YAML, or JSON with a .json extension).
    #[arg(long)]
    config: PathBuf,
    /// Name of the wrapped binary, resolved relative to the install location.
    #[arg(long)]
    binary_name: String,
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("invalid options: {0}")]
    Options(String),
    #[error("{0}")]
    Message(String),
}

impl CliError {
    /// Failed captured runs exit with the child's own status.
    fn exit_code(&self) -> i32 {
        match self {
            Self::Exec(err) => err.exit_code().filter(|code| *code != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Args(args) => run_args(args),
        Command::Run(args) => run_run(args),
        Command::Validate(args) => run_validate(args),
        Command::Init(args) => run_init(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn run_args(args: ArgsArgs) -> Result<(), CliError> {
    let config = load_config(&args.input.config)?;
    let argv = prepare(&config, &args.name, &args.input)?;
    let json = serde_json::to_string(&argv).map_err(|err| CliError::Message(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn run_run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(&args.input.config)?;
    let argv = prepare(&config, &args.name, &args.input)?;

    let binary = match args.binary {
        Some(path) => BinaryPath::new(path),
        None => config.binary_path()?,
    };
    let mut invoker = Invoker::new(binary);
    let timeout = args.timeout_ms.map(Duration::from_millis).or(config.timeout());
    if let Some(timeout) = timeout {
        invoker = invoker.with_timeout(timeout);
    }

    let mode = Mode::from(args.live);
    debug!(command = %args.name, ?mode, "Running configured command");
    let stdout = invoker.execute(&argv, mode)?;
    if mode == Mode::Captured {
        let mut out = std::io::stdout().lock();
        out.write_all(stdout.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|err| CliError::Message(format!("failed to write output: {err}")))?;
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let config = ShimConfig::load(&args.config)?;
    let errors = config.validate();
    if errors.is_empty() {
        println!("{} command(s) valid", config.commands.len());
        return Ok(());
    }
    for (command, error) in &errors {
        eprintln!("{command}: {error}");
    }
    Err(CliError::Message(format!(
        "{} validation error(s) in {}",
        errors.len(),
        args.config.display()
    )))
}

fn run_init(args: InitArgs) -> Result<(), CliError> {
    if args.config.exists() && !args.force {
        return Err(CliError::Message(format!(
            "{} already exists (use --force to overwrite)",
            args.config.display()
        )));
    }
    let config = ShimConfig::starter(&args.binary_name);
    config.save(&args.config)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

fn load_config(path: &Path) -> Result<ShimConfig, CliError> {
    let config = ShimConfig::load(path)?;
    let errors = config.validate();
    if let Some((command, error)) = errors.first() {
        return Err(CliError::Message(format!(
            "invalid config {}: {command}: {error}",
            path.display()
        )));
    }
    Ok(config)
}

fn prepare(config: &ShimConfig, name: &str, input: &OptionsInput) -> Result<Vec<String>, CliError> {
    let command = config.command(name)?;
    let options = read_options(input)?;
    prepare_command(command.command.iter().cloned(), &command.schema, &options)
        .map_err(|err| CliError::Options(err.to_string()))
}

fn read_options(input: &OptionsInput) -> Result<Options, CliError> {
    let raw = match (&input.options, &input.options_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|err| {
            CliError::Message(format!(
                "failed to read options file '{}': {err}",
                path.display()
            ))
        })?,
        (None, None) => return Ok(Options::new()),
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Object(options)) => Ok(options),
        Ok(_) => Err(CliError::Options("options must be a JSON object".to_string())),
        Err(err) => Err(CliError::Options(err.to_string())),
    }
}
