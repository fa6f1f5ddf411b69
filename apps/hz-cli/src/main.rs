use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use hz_app::{AppError, AppResult, ReplayReport, project_service, replay_service};
use hz_controls::{ActuatorCommand, Demand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hz-cli")]
#[command(about = "hydrozone CLI - hydronic floor heating and cooling control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// List zones in a project
    Zones {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Show one zone's configuration
    Zone {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Zone ID
        zone_id: String,
    },
    /// Replay a recorded sensor trace through the controller
    Replay {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Path to the trace file (YAML or JSON)
        trace_path: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Zones { project_path } => cmd_zones(&project_path),
        Commands::Zone { project_path, zone_id } => cmd_zone(&project_path, &zone_id),
        Commands::Replay {
            project_path,
            trace_path,
            format,
            output,
        } => cmd_replay(&project_path, &trace_path, format, output.as_deref()),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    hz_app::compile_project(&project)?;
    println!("✓ Project is valid ({} zones)", project.zones.len());
    Ok(())
}

fn cmd_zones(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let zones = project_service::list_zones(&project);

    if zones.is_empty() {
        println!("No zones found in project");
    } else {
        println!("Zones in project:");
        for zone in zones {
            println!(
                "  {} - {} ({}, {}, {} circuits){}",
                zone.id,
                zone.name,
                zone.control,
                zone.responsiveness,
                zone.circuit_count,
                if zone.enabled { "" } else { " [disabled]" }
            );
        }
    }
    Ok(())
}

fn cmd_zone(project_path: &Path, zone_id: &str) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let zone = project_service::get_zone(&project, zone_id)?;
    let compiled = hz_app::compile_zone(zone)?;

    println!("Zone '{}' ({})", zone.id, compiled.config.name);
    println!("  Circuits:      {}", zone.circuits.join(", "));
    println!("  Temperature:   {}", zone.temp_sensor);
    println!("  Target:        {}", zone.target_source);
    println!("  Hysteresis:    {:.2} °C", compiled.config.hysteresis.band);
    println!("  Strategy:      {:?}", compiled.config.strategy);
    println!("  Responsive:    {:?}", compiled.config.responsiveness);
    println!(
        "  Weights:       flow {:.2}, solar {:.2}",
        compiled.config.flow_weight, compiled.config.solar_weight
    );
    Ok(())
}

fn cmd_replay(
    project_path: &Path,
    trace_path: &Path,
    format: Format,
    output: Option<&Path>,
) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    let trace = replay_service::load_trace(trace_path)?;
    let report = replay_service::replay(&project, &trace)?;
    tracing::debug!(trace = %trace_path.display(), ticks = report.ticks.len(), "rendering replay");

    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::Trace(format!("Failed to serialize report: {}", e)))?,
        Format::Table => render_table(&report),
    };

    if let Some(path) = output {
        std::fs::write(path, rendered)?;
        println!("✓ Wrote {} ticks to {}", report.ticks.len(), path.display());
    } else {
        println!("{}", rendered);
    }
    Ok(())
}

fn render_table(report: &ReplayReport) -> String {
    let zone_ids: Vec<&str> = report
        .ticks
        .first()
        .map(|t| t.report.zones.iter().map(|z| z.id.as_str()).collect())
        .unwrap_or_default();

    let mut out = format!("Replay of '{}'\n", report.project);
    out.push_str(&format!(
        "{:>4}  {:>5}  {:>7}  {:>5}  {:>6}  {:>6}",
        "step", "time", "mode", "dir", "flow", "unclmp"
    ));
    for id in &zone_ids {
        out.push_str(&format!("  {:>12}", id));
    }
    out.push('\n');

    for tick in &report.ticks {
        let r = &tick.report;
        let mode = r
            .effective_mode
            .map_or_else(|| "off".to_string(), |m| m.to_string());
        let (flow, unclamped) = match &r.flow {
            Some(f) => (format!("{:.1}", f.flow_temp), format!("{:.2}", f.breakdown.unclamped)),
            None => ("-".to_string(), "-".to_string()),
        };
        out.push_str(&format!(
            "{:>4}  {:>5}  {:>7}  {:>5}  {:>6}  {:>6}",
            tick.step,
            tick.time.format("%H:%M"),
            mode,
            r.direction.as_str(),
            flow,
            unclamped
        ));
        for zone in &r.zones {
            let warn = if zone.warning.is_some() { "!" } else { "" };
            let cell = format!(
                "{}{}{}",
                demand_mark(zone.demand),
                command_mark(&zone.command),
                warn
            );
            out.push_str(&format!("  {:>12}", cell));
        }
        out.push('\n');
    }
    out
}

fn demand_mark(demand: Demand) -> &'static str {
    match demand {
        Demand::Heat => "H ",
        Demand::Cool => "C ",
        Demand::Idle => ". ",
    }
}

fn command_mark(command: &ActuatorCommand) -> String {
    match *command {
        ActuatorCommand::Switch { on } => (if on { "on" } else { "off" }).to_string(),
        ActuatorCommand::Pulse { duty, on } => {
            format!("{:.0}%{}", duty, if on { "+" } else { "-" })
        }
    }
}
