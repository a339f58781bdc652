//! Command-line interface for exploring the yeast batch unit
//!
//! Each invocation sets up a session, optionally from a unit package and a JSON
//! configuration, and runs one command against it.
//!
//! # Usage
//!
//! ```bash
//! # Simulate 12 hours, then continue for another 6, starting with more glucose
//! fmu-explore run --set VG_start=15 --continue 6 --output batch.html
//!
//! # Persistent instance engine with its `_0` convention and a phase plane
//! fmu-explore --backend instance run --set V_0=5 --layout PhasePlane
//!
//! # Describe a parameter and list the culture parameters
//! fmu-explore describe mum
//! fmu-explore disp culture --mode long
//! ```

use std::{path::PathBuf, str::FromStr};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use fmu_explore::{
    engine::{Backend, SimulationEngine},
    info::{command_overview, describe, disp, system_info, DispMode},
    io::{marker_of, process_diagram},
    presentation::{figure::DEFAULT_TITLE, layout::PlotLayout},
    session::{
        application::yeast_batch,
        config::SessionConfig,
        driver::{RunMode, RunOutcome, Session},
    },
    unit::{value::Value, yeast::yeast_batch_unit, Unit},
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OVERRIDE: Regex = Regex::new(r"^\s*([A-Za-z_][\w.\[\]]*)\s*=\s*(.+?)\s*$").expect("valid pattern");
}

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Unit package directory. The built-in yeast batch unit is used if omitted.
    #[arg(short, long, global = true)]
    unit: Option<PathBuf>,

    /// JSON file with session settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Engine backend, 'instance' or 'one-shot'
    #[arg(short, long, global = true)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Set values, simulate and plot
    Run {
        /// Parameter or initial value, repeatable
        #[arg(long = "set", value_name = "NAME=VALUE")]
        parameters: Vec<Override>,

        /// Initial value only, by short name or model path, repeatable
        #[arg(long = "init", value_name = "NAME=VALUE")]
        initial_values: Vec<Override>,

        /// Horizon of the first run in hours
        #[arg(long)]
        horizon: Option<f64>,

        /// Horizon of a continued run, repeatable
        #[arg(long = "continue", value_name = "HORIZON")]
        continuations: Vec<f64>,

        /// Diagram layout
        #[arg(short, long, default_value = "TimeSeries")]
        layout: PlotLayout,

        #[arg(short, long, default_value = DEFAULT_TITLE)]
        title: String,

        /// Write the figure as HTML
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the figure in a browser
        #[arg(long)]
        show: bool,
    },
    /// Describe culture, broth, parts, MSL, time or a parameter or variable
    Describe {
        name: String,

        #[arg(short, long, default_value_t = 3)]
        decimals: usize,

        /// Simulate first so that values reflect a run
        #[arg(long)]
        simulate: bool,
    },
    /// Display parameters and initial values whose path contains NAME
    Disp {
        #[arg(default_value = "")]
        name: String,

        #[arg(short, long, default_value = "short")]
        mode: DispMode,

        #[arg(short, long, default_value_t = 3)]
        decimals: usize,
    },
    /// Show system information
    Info,
    /// Write the process diagram to a file
    Diagram {
        #[arg(short, long, default_value = "processDiagram.png")]
        output: PathBuf,
    },
    /// Write the unit as a package directory
    ExportUnit { dir: PathBuf },
    /// List the key commands
    Commands,
}

/// `NAME=VALUE` given on the command line.
#[derive(Debug, Clone)]
struct Override {
    name: String,
    value: Value,
}

impl FromStr for Override {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = OVERRIDE
            .captures(s)
            .ok_or_else(|| format!("Expected NAME=VALUE, got '{s}'"))?;
        let value = captures[2]
            .parse()
            .map_err(|_| format!("Invalid value in '{s}'"))?;
        Ok(Override {
            name: captures[1].to_string(),
            value,
        })
    }
}

fn setup(cli: &Cli) -> anyhow::Result<Session> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_json(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => SessionConfig::for_backend(cli.backend.unwrap_or_default()),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let unit = match &cli.unit {
        Some(dir) => {
            let unit = Unit::load(dir).context("Failed to load unit package")?;
            let marker = marker_of(unit.description());
            if marker != config.marker {
                log::warn!(
                    "Unit package uses the '{marker}' convention, overriding '{}'",
                    config.marker
                );
                config.marker = marker;
            }
            unit
        }
        None => yeast_batch_unit(config.marker),
    };

    let application = yeast_batch(config.marker);
    Ok(Session::for_unit(unit, config, application))
}

fn simulate(session: &mut Session, mode: RunMode, horizon: Option<f64>) -> anyhow::Result<()> {
    match session.simu().mode(mode).maybe_horizon(horizon).call() {
        RunOutcome::Completed { start, stop, style } => {
            let style = style.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
            println!("{mode} run {start} -> {stop} h drawn with '{style}'");
            Ok(())
        }
        RunOutcome::Aborted(err) => bail!(err),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut session = setup(&cli)?;

    match cli.command {
        Commands::Run {
            parameters,
            initial_values,
            horizon,
            continuations,
            layout,
            title,
            output,
            show,
        } => {
            let report = session.set_parameters(parameters.into_iter().map(|o| (o.name, o.value)));
            print!("{report}");
            let report =
                session.set_initial_values(initial_values.into_iter().map(|o| (o.name, o.value)));
            print!("{report}");

            session
                .declare_plot_layout()
                .kind(layout)
                .title(title)
                .call();

            simulate(&mut session, RunMode::Initial, horizon)?;
            for horizon in continuations {
                simulate(&mut session, RunMode::Continued, Some(horizon))?;
            }

            for (state, value) in session.states().iter() {
                if let Some(value) = value {
                    println!("{state} = {value:.3}");
                }
            }

            if let Some(path) = output {
                session.figure().write_html(&path)?;
                println!("Figure written to {}", path.display());
            }
            if show {
                session.figure().display();
            }
        }
        Commands::Describe {
            name,
            decimals,
            simulate: run_first,
        } => {
            if run_first {
                simulate(&mut session, RunMode::Initial, None)?;
            }
            println!("{}", describe(&session, &name, decimals)?);
        }
        Commands::Disp {
            name,
            mode,
            decimals,
        } => {
            println!("{}", disp(&session, &name, decimals, mode));
        }
        Commands::Info => println!("{}", system_info(&session)),
        Commands::Diagram { output } => {
            let fallback = session.application().diagram_fallback.clone();
            let diagram = process_diagram(session.engine().unit(), fallback.as_deref())?;
            std::fs::write(&output, &diagram.bytes)?;
            println!("Process diagram written to {}", output.display());
        }
        Commands::ExportUnit { dir } => {
            session.engine().unit().export(&dir)?;
            println!("Unit written to {}", dir.display());
        }
        Commands::Commands => println!("{}", command_overview()),
    }

    Ok(())
}

/// Main entry point for the CLI application
pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
