// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS Dynamics CLI
//!
//! Runs Lindblad scenarios described in YAML and prints the summary table.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario
//! qubit-os-dynamics run scenario.yaml
//!
//! # Exact propagation, JSON output, with a step-halving check
//! qubit-os-dynamics run scenario.yaml --method exact --format json --convergence
//!
//! # Built-in example
//! qubit-os-dynamics demo
//!
//! # Show effective configuration
//! qubit-os-dynamics config
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qubit_os_dynamics::config::{Config, LoggingConfig};
use qubit_os_dynamics::lindblad::IntegrationMethod;
use qubit_os_dynamics::report::{self, OutputFormat};
use qubit_os_dynamics::scenario::Scenario;
use qubit_os_dynamics::{Result, VERSION};

/// QubitOS open-system dynamics engine
#[derive(Parser)]
#[command(name = "qubit-os-dynamics")]
#[command(author = "QubitOS Contributors")]
#[command(version = VERSION)]
#[command(about = "Lindblad master-equation engine for open quantum systems")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RunOptions {
    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,

    /// Integration method (rk4, exact)
    #[arg(long)]
    method: Option<IntegrationMethod>,

    /// Maximum RK4 sub-step
    #[arg(long)]
    max_step: Option<f64>,

    /// Rerun with half the step and report the change
    #[arg(long)]
    convergence: bool,

    /// Include every grid point in the output
    #[arg(long)]
    keep_series: bool,

    /// Integrate initial states one after another
    #[arg(long)]
    sequential: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file
    Run {
        /// Scenario YAML file
        scenario: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Run the built-in example scenario
    Demo {
        #[command(flatten)]
        options: RunOptions,
    },

    /// Show effective configuration
    Config,

    /// Validate configuration and, optionally, a scenario file
    Validate {
        /// Scenario YAML file
        scenario: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Run { scenario, options } => {
            let scenario = Scenario::load(&scenario)?;
            execute(&scenario, &mut config, &options)?;
        }

        Commands::Demo { options } => {
            execute(&Scenario::demo(), &mut config, &options)?;
        }

        Commands::Config => {
            // Show effective configuration
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate { scenario } => {
            let outcome = config.validate().and_then(|()| match &scenario {
                Some(path) => Scenario::load(path)?.build(&config).map(|_| ()),
                None => Ok(()),
            });
            match outcome {
                Ok(()) => match scenario {
                    Some(path) => println!("Scenario {} is valid", path.display()),
                    None => println!("Configuration is valid"),
                },
                Err(e) => {
                    eprintln!("Validation error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Apply command-line overrides, build the problem and print the result.
fn execute(scenario: &Scenario, config: &mut Config, options: &RunOptions) -> Result<()> {
    if let Some(method) = options.method {
        config.integrator.method = method;
    }
    if let Some(step) = options.max_step {
        config.integrator.max_step = step;
    }
    if options.keep_series {
        config.aggregation.keep_series = true;
    }
    if options.sequential {
        config.aggregation.parallel = false;
    }
    config.validate()?;

    let problem = scenario.build(config)?;
    info!(
        version = VERSION,
        scenario = %problem.name,
        method = %config.integrator.method,
        states = problem.states.len(),
        measures = problem.measures.len(),
        "Running scenario"
    );

    let (table, convergence) = if options.convergence {
        let (table, report) = problem.run_with_convergence()?;
        (table, Some(report))
    } else {
        (problem.run()?, None)
    };

    print!(
        "{}",
        report::render(&problem.name, &table, convergence.as_ref(), options.format)?
    );
    if matches!(options.format, OutputFormat::Json) {
        println!();
    }
    Ok(())
}

/// Initialize logging with tracing.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // stdout carries the report
    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
