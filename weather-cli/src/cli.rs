use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, Select, Text};
use tracing::debug;
use weather_core::{
    ApiMode, Config, ConfiguredLocation, Coordinates, FileStore, HistoryStore, KeyValueStore,
    QueryOrchestrator, QueryState, UnitStore, UnitSystem, provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and short-term forecast")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure direct or relay access and an optional home location.
    Configure,

    /// Show weather for a city or "City, CC". Without one, repeats the last search.
    Show {
        /// City or "City, Country".
        address: Option<String>,

        /// Switch unit system before querying.
        #[arg(long)]
        units: Option<UnitSystem>,
    },

    /// Show weather for a coordinate pair.
    Coords {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long)]
        units: Option<UnitSystem>,
    },

    /// Show weather for the configured home location.
    Here {
        #[arg(long)]
        units: Option<UnitSystem>,
    },

    /// Show or set the preferred unit system (metric, imperial, standard).
    Units { unit: Option<UnitSystem> },

    /// List recent searches.
    History {
        /// Forget all recent searches.
        #[arg(long)]
        clear: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Show { address, units } => {
                let orch = orchestrator(&config)?;
                apply_units(&orch, units);
                match address {
                    Some(address) => orch.query_by_name(&address).await,
                    None => {
                        if !orch.requery_last().await {
                            debug!("no history to re-query");
                            println!("No recent searches. Try `weather show <city>`.");
                            return Ok(());
                        }
                    }
                }
                report(&orch)?;
            }
            Command::Coords { lat, lon, units } => {
                let orch = orchestrator(&config)?;
                apply_units(&orch, units);
                orch.query_by_coordinates(lat, lon).await;
                report(&orch)?;
            }
            Command::Here { units } => {
                let orch = orchestrator(&config)?;
                apply_units(&orch, units);
                orch.query_my_location(&ConfiguredLocation::new(config.home)).await;
                report(&orch)?;
            }
            Command::Units { unit } => {
                let units = UnitStore::new(data_store()?);
                match unit {
                    Some(unit) => {
                        debug!(%unit, "saving unit preference");
                        units.save(unit);
                        println!("Units set to {unit}");
                    }
                    None => println!("{}", units.load()),
                }
            }
            Command::History { clear } => {
                let history = HistoryStore::new(data_store()?);
                if clear {
                    history.clear();
                    println!("History cleared");
                } else {
                    print!("{}", render::history(history.load().entries()));
                }
            }
        }

        Ok(())
    }
}

fn data_store() -> anyhow::Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(FileStore::new(Config::data_dir()?)))
}

fn orchestrator(config: &Config) -> anyhow::Result<QueryOrchestrator> {
    let provider = provider_from_config(config)?;
    Ok(QueryOrchestrator::with_store(provider, data_store()?))
}

fn apply_units(orch: &QueryOrchestrator, units: Option<UnitSystem>) {
    if let Some(unit) = units {
        debug!(from = %orch.unit_system(), to = %unit, "switching unit system");
        orch.set_unit_system(unit);
    }
}

fn report(orch: &QueryOrchestrator) -> anyhow::Result<()> {
    match orch.current_state() {
        QueryState::Ready(report) => {
            print!("{}", render::report(&report));
            Ok(())
        }
        QueryState::Failed(err) => bail!(err),
        QueryState::Idle | QueryState::Loading => bail!("No result"),
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let modes = vec![ApiMode::Direct, ApiMode::Relay];
    let mode = Select::new("How should requests reach OpenWeather?", modes)
        .prompt()
        .context("Configuration cancelled")?;

    match mode {
        ApiMode::Direct => {
            let key = Password::new("OpenWeather API key:")
                .without_confirmation()
                .prompt()
                .context("Configuration cancelled")?;
            if key.trim().is_empty() {
                bail!("API key must not be empty");
            }
            config.use_direct(key.trim().to_string());
        }
        ApiMode::Relay => {
            let url = Text::new("Relay URL:")
                .with_default(&config.relay_url)
                .prompt()
                .context("Configuration cancelled")?;
            config.use_relay(url.trim().to_string());
        }
    }

    let set_home = Confirm::new("Set a home location for `weather here`?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Configuration cancelled")?;
    if set_home {
        let lat = CustomType::<f64>::new("Latitude:")
            .prompt()
            .context("Configuration cancelled")?;
        let lon = CustomType::<f64>::new("Longitude:")
            .prompt()
            .context("Configuration cancelled")?;
        config.home = Some(Coordinates::new(lat, lon));
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
