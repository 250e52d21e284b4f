//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;
use tracing::debug;

use shrink_core::ShrinkConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "report.layout")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let store = ConfigStore::at(config_path);
    match args.command {
        ConfigCommand::Show => {
            if !store.exists() {
                eprintln!(
                    "{} No config file at {}, showing defaults.",
                    style("ℹ").blue(),
                    store.path.display()
                );
            }
            println!("{}", serde_json::to_string_pretty(&store.load()?)?);
        }
        ConfigCommand::Init(init_args) => {
            let target = init_args.output.map_or(store, |path| ConfigStore { path });
            if target.exists() && !init_args.force {
                anyhow::bail!(
                    "{} already exists; pass --force to replace it",
                    target.path.display()
                );
            }
            target.write(&ShrinkConfig::default())?;
            println!(
                "{} Wrote default configuration to {}",
                style("✓").green(),
                target.path.display()
            );
        }
        ConfigCommand::Get { key } => {
            let tree = serde_json::to_value(store.load()?)?;
            println!("{}", serde_json::to_string_pretty(lookup(&tree, &key)?)?);
        }
        ConfigCommand::Set { key, value } => {
            let value = parse_value(&value);
            let mut tree = serde_json::to_value(store.load()?)?;
            replace(&mut tree, &key, value.clone())?;

            let config: ShrinkConfig = serde_json::from_value(tree)
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
            store.write(&config)?;
            println!("{} {} = {}", style("✓").green(), key, value);
        }
        ConfigCommand::Path => {
            let status = if store.exists() {
                style("exists").green()
            } else {
                style("not created").yellow()
            };
            println!("{} ({})", store.path.display(), status);
        }
    }
    Ok(())
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shrink")
        .join("config.json")
}

/// Load the configuration used by a command.
///
/// An explicit path must exist; otherwise the default file is used when
/// present, then built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ShrinkConfig> {
    if let Some(path) = config_path {
        return Ok(ShrinkConfig::from_file(Path::new(path))?);
    }
    ConfigStore::at(None).load()
}

/// The config file the `config` subcommands read and write.
struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    fn at(config_path: Option<&str>) -> Self {
        Self {
            path: config_path.map_or_else(default_config_path, PathBuf::from),
        }
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    /// File contents, or defaults when the file is missing.
    fn load(&self) -> anyhow::Result<ShrinkConfig> {
        if self.exists() {
            debug!("Using config file {}", self.path.display());
            Ok(ShrinkConfig::from_file(&self.path)?)
        } else {
            Ok(ShrinkConfig::default())
        }
    }

    fn write(&self, config: &ShrinkConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        config.save(&self.path)?;
        Ok(())
    }
}

/// JSON literal when the text parses as one, a plain string otherwise.
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Follow a dotted key such as `report.layout`.
fn lookup<'v>(tree: &'v Value, key: &str) -> anyhow::Result<&'v Value> {
    key.split('.').try_fold(tree, |node, part| {
        node.get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
    })
}

/// Overwrite an existing leaf; unknown keys are rejected rather than added.
fn replace(tree: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let mut node = tree;
    for part in key.split('.') {
        node = node
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    }
    *node = value;
    Ok(())
}
