//! CreditHUD CLI — inspect and summarize a credit-operations export.
//!
//! Commands:
//! - `columns` — list column labels and the roles bound to them
//! - `domains` — list the distinct values of each filter role
//! - `summary` — KPIs, credit per plan type and operations per month,
//!   optionally narrowed with `--filter role=v1,v2`

mod format;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use credithud_core::data::LocationRouter;
use credithud_core::{load, Cell, Dashboard, DashboardConfig, PipelineError, Role};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use format::{format_brl, format_rate};

#[derive(Parser)]
#[command(
    name = "credithud",
    version,
    about = "CreditHUD CLI — credit-operations dashboard over a CSV export"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV location (http(s) URL, Google Sheets link, or file path).
    /// Overrides `[source] url` from the config.
    #[arg(long, global = true)]
    url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List column labels in order with their role bindings.
    Columns,
    /// List the sorted distinct values of each filter role.
    Domains,
    /// Print KPIs, credit per plan type and operations per month.
    Summary {
        /// Restrict a filter role, e.g. `--filter year=2024,2025`. Repeatable.
        #[arg(long = "filter", value_name = "ROLE=V1,V2")]
        filters: Vec<String>,

        /// Emit the full snapshot as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(columns) = err
                .downcast_ref::<PipelineError>()
                .and_then(PipelineError::available_columns)
            {
                eprintln!();
                eprintln!("Available columns:");
                for (i, label) in columns.iter().enumerate() {
                    eprintln!("  {i:>3}  {label}");
                }
            }
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };

    let Some(location) = cli.url.clone().or_else(|| config.source.url.clone()) else {
        bail!("no data source: pass --url or set [source] url in the config");
    };

    let roles = config.role_config()?;
    let router = LocationRouter::new()?;
    let loaded = load(&router, &location, &roles)?;
    tracing::info!(
        %location,
        rows = loaded.table.row_count(),
        fingerprint = %loaded.fingerprint,
        "table loaded"
    );
    let mut dashboard = Dashboard::new(loaded, &config.filters.roles);

    match cli.command {
        Commands::Columns => {
            print_columns(&dashboard);
            Ok(())
        }
        Commands::Domains => {
            print_domains(&dashboard);
            Ok(())
        }
        Commands::Summary { filters, json } => {
            for spec in &filters {
                apply_filter(&mut dashboard, spec)?;
            }
            if json {
                let snapshot = dashboard.snapshot();
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_summary(&dashboard);
            }
            Ok(())
        }
    }
}

/// Parse `role=v1,v2` and replace that role's selection. Values are matched
/// against the role's domain by their displayed form; `(blank)` selects
/// missing cells.
fn apply_filter(dashboard: &mut Dashboard, spec: &str) -> Result<()> {
    let (role_name, values) = spec
        .split_once('=')
        .with_context(|| format!("invalid filter '{spec}': expected ROLE=V1,V2"))?;
    let role: Role = role_name.parse()?;

    if !dashboard.active_filters().contains(&role) {
        bail!("'{role}' is not an active filter (not configured or column absent)");
    }

    let domain = dashboard.domain(role);
    let mut chosen = BTreeSet::new();
    for raw in values.split(',').map(str::trim).filter(|v| !v.is_empty()) {
        let Some(cell) = domain.iter().find(|c| display_value(c) == raw) else {
            let known: Vec<String> = domain.iter().map(display_value).collect();
            bail!(
                "'{raw}' is not a value of {role} (known: {})",
                known.join(", ")
            );
        };
        chosen.insert(cell.clone());
    }

    tracing::debug!(%role, selected = chosen.len(), "filter applied");
    dashboard.select(role, chosen);
    Ok(())
}

fn display_value(cell: &Cell) -> String {
    if cell.is_missing() {
        "(blank)".to_string()
    } else {
        cell.to_string()
    }
}

fn print_columns(dashboard: &Dashboard) {
    let loaded = dashboard.loaded();
    println!("Source: {}", loaded.location);
    println!(
        "Columns: {}  Rows: {}",
        loaded.table.column_count(),
        loaded.table.row_count()
    );
    println!();
    println!("{:>4}  {:<32} {}", "#", "Label", "Role");
    println!("{}", "-".repeat(56));
    for (i, label) in loaded.table.columns().iter().enumerate() {
        let roles: Vec<&str> = loaded
            .bindings
            .iter()
            .filter(|(role, _)| loaded.bindings.column(*role) == Some(i))
            .map(|(role, _)| role.name())
            .collect();
        println!("{:>4}  {:<32} {}", i, label, roles.join(", "));
    }

    let absent: Vec<&str> = Role::ALL
        .into_iter()
        .filter(|r| !loaded.bindings.is_resolved(*r))
        .map(Role::name)
        .collect();
    if !absent.is_empty() {
        println!();
        println!("Unresolved roles: {}", absent.join(", "));
    }
}

fn print_domains(dashboard: &Dashboard) {
    for role in dashboard.active_filters() {
        let values: Vec<String> = dashboard.domain(role).iter().map(display_value).collect();
        println!("{} ({role}): {}", role.caption(), values.join(", "));
    }
}

fn print_summary(dashboard: &Dashboard) {
    let snap = dashboard.snapshot();
    let s = &snap.summary;

    println!("Source: {}", snap.location);
    println!("Rows:   {} of {}", s.count, snap.total_rows);
    println!();
    println!("{:<16} {:>20}", "Total credit", format_brl(s.total_credit));
    println!("{:<16} {:>20}", "Operations", s.count);
    println!("{:<16} {:>20}", "Mean rate", format_rate(s.mean_rate));
    println!("{:<16} {:>20}", "Ticket average", format_brl(s.ticket_average));

    if !snap.plan_distribution.is_empty() {
        println!();
        println!("Credit by plan type");
        for bar in &snap.plan_distribution {
            println!("  {:<24} {:>20}", display_value(&bar.plan), format_brl(bar.credit));
        }
    }

    if !snap.monthly_counts.is_empty() {
        println!();
        println!("Operations by month");
        for point in &snap.monthly_counts {
            let period = format!("{}/{}", display_value(&point.year), display_value(&point.month));
            println!("  {:<24} {:>8}", period, point.count);
        }
    }
}
