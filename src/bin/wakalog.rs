use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wakalog", about = "Log WakaTime durations into a GitHub Gist")]
struct Cli {
    /// Config file path (default: ~/.wakalog/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every day since the last run and save the log
    Sync {
        /// Gist id or URL (overrides GIST_ID and the config file)
        #[arg(long)]
        gist: Option<String>,
        /// Days to look back when the log has no high-water-mark
        #[arg(long, default_value_t = wakalog::date_util::DEFAULT_LOOKBACK_DAYS)]
        days: u32,
        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        today: Option<String>,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored log's high-water-mark and per-project totals
    Status {
        /// Gist id or URL (overrides GIST_ID and the config file)
        #[arg(long)]
        gist: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

/// Progress reporter that writes to stderr.
struct StderrProgress;

impl wakalog::SyncProgress for StderrProgress {
    fn on_day_start(&self, day: NaiveDate, index: usize, total: usize) {
        eprint!("[{}/{}] {day}... ", index + 1, total);
    }

    fn on_day_fetched(&self, _day: NaiveDate, entries: usize) {
        eprintln!("{entries} entries");
    }

    fn on_day_failed(&self, _day: NaiveDate, error: &wakalog::Error) {
        eprintln!("skipped ({error})");
    }

    fn on_saved(&self, location: &str) {
        eprintln!("Saved to Gist {location}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = match cli.config {
        Some(path) => path,
        None => wakalog::ConfigFile::default_path()?,
    };

    match cli.command {
        Commands::Config { action } => handle_config(&config_path, action)?,
        Commands::Status { gist, json } => {
            let dw = open(&config_path, gist.as_deref())?;
            handle_status(&dw, json).await?;
        }
        Commands::Sync {
            gist,
            days,
            today,
            json,
        } => {
            let dw = open(&config_path, gist.as_deref())?;
            let options = wakalog::SyncOptions {
                today: today.as_deref().map(wakalog::date_util::parse_day).transpose()?,
                days,
            };
            let report = dw.sync(&options, &StderrProgress).await;

            if report.created_location {
                if let Some(id) = &report.location {
                    remember_gist(&config_path, id)?;
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_sync_report(&report);
            }
            if !report.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Resolve the configuration. The Gist id comes from `--gist`, then `GIST_ID`, then the file.
fn open(config_path: &Path, gist: Option<&str>) -> anyhow::Result<wakalog::WakaLog> {
    let file = wakalog::ConfigFile::load(config_path)?;
    let mut config = wakalog::Config::from_env()?;
    if let Some(gist) = gist {
        config.gist_id = Some(wakalog::resolve_gist_id(gist)?);
    }
    let config = config.with_config_file(&file);
    Ok(wakalog::WakaLog::new(config)?)
}

/// Write a newly created Gist id into the config file so later runs reuse it.
fn remember_gist(config_path: &Path, id: &str) -> anyhow::Result<()> {
    println!("Created Gist {id}");
    let mut file = wakalog::ConfigFile::load(config_path)?;
    file.set("gist_id", id)?;
    match file.save(config_path) {
        Ok(()) => println!("Saved gist_id to {}", config_path.display()),
        Err(e) => {
            log::warn!("Could not write {}: {e}", config_path.display());
            println!("Set GIST_ID={id} for future runs.");
        }
    }
    Ok(())
}

fn handle_config(config_path: &Path, action: ConfigAction) -> anyhow::Result<()> {
    let mut file = wakalog::ConfigFile::load(config_path)?;
    match action {
        ConfigAction::Get { key } => match file.get(&key)? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            file.set(&key, &value)?;
            file.save(config_path)?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = file.list();
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

async fn handle_status(dw: &wakalog::WakaLog, json: bool) -> anyhow::Result<()> {
    let aggregate = dw.status().await?;
    let totals = aggregate.project_totals();

    if json {
        let out = serde_json::json!({
            "high_water_mark": aggregate.high_water_mark,
            "projects": totals,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Log Status");
    match aggregate.high_water_mark {
        Some(mark) => println!("  Synced through: {mark}"),
        None => println!("  Synced through: never"),
    }
    println!("  Projects:       {}", totals.len());
    println!("  Entries:        {}", aggregate.entry_count());
    for total in &totals {
        println!(
            "    {:<30} {:>6} entries  {}",
            total.project,
            total.entries,
            wakalog::format_seconds(total.seconds)
        );
    }
    Ok(())
}

fn print_sync_report(report: &wakalog::SyncReport) {
    println!("Sync: {}", report.location.as_deref().unwrap_or("(no Gist)"));
    println!("  Status:  {:?}", report.status);
    println!(
        "  Days:    {} walked, {} with data, {} skipped",
        report.days_walked, report.days_with_data, report.days_failed
    );
    println!("  Added:   {} entries", report.entries_added);
    if let Some(mark) = report.high_water_mark {
        println!("  Through: {mark}");
    }
    if let Some(ref err) = report.error {
        println!("  Error:   {err}");
    }
}
