//! tigris CLI
//!
//! Main entry point for the `tigris` command.

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tigris::interp::{Console, EvalError, Value};
use tigris::repl::Session;
use tigris::{Config, Error};

#[derive(Parser)]
#[command(name = "tigris")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parse and evaluate programs in a small Tiger dialect", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Interpreter configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a Tiger source file and print its value
    Run {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Parse a Tiger source file and print its AST
    Parse {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the AST as JSON instead of its textual rendering
        #[arg(long)]
        json: bool,
    },

    /// Start the interactive REPL
    Repl,

    /// Show information about the interpreter
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Run { input } => run(&input, &config),
        Commands::Parse { input, json } => parse(&input, json),
        Commands::Repl => Ok(tigris::repl::run(&config)?),
        Commands::Info => info(&config),
    }
}

fn read_source(input: &Path) -> Result<String> {
    std::fs::read_to_string(input)
        .map_err(|source| {
            Error::Io {
                path: input.display().to_string(),
                source,
            }
            .into()
        })
}

fn run(input: &Path, config: &Config) -> Result<()> {
    tracing::info!("Running {:?}", input);

    let source = read_source(input)?;
    let mut session = Session::new(config, Console::stdio());

    match session.eval(&source, &input.display().to_string()) {
        Ok(Value::Unit) => Ok(()),
        Ok(value) => {
            println!("{}", value);
            Ok(())
        }
        Err(Error::Eval(EvalError::Exit(code))) => {
            tracing::debug!("program exited with code {}", code);
            std::process::exit(i32::try_from(code).unwrap_or(1))
        }
        Err(err) => Err(err.into()),
    }
}

fn parse(input: &Path, json: bool) -> Result<()> {
    tracing::info!("Parsing {:?}", input);

    let source = read_source(input)?;
    let program = tigris::parse_named(&source, &input.display().to_string())?;
    tracing::debug!("Parsed {} expression nodes", program.node_count());

    if json {
        let json = serde_json::to_string_pretty(&program)
            .map_err(|e| miette::miette!("Failed to serialize AST: {}", e))?;
        println!("{}", json);
    } else {
        println!("{}", program);
    }
    Ok(())
}

fn info(config: &Config) -> Result<()> {
    println!("tigris, a Tiger-dialect interpreter");
    println!("Version: {}", tigris::VERSION);
    println!();
    println!("Interpreter:");
    println!("  - max call depth: {}", config.interpreter.max_call_depth);
    println!(
        "  - standard library: {}",
        if config.interpreter.stdlib { "enabled" } else { "disabled" }
    );
    println!(
        "  - loop tracing: {}",
        if config.interpreter.trace_loops { "enabled" } else { "disabled" }
    );
    Ok(())
}
