//! crocon CLI entry point.
//!
//! Converts a single block, biome, item, entity or block entity between
//! editions through the linked libcrocon and prints the result as JSON.

mod json;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crocon_common::{ConfigFile, LoggingConfig};
use crocon_core::{
    BiomeQuery, Block, BlockEntity, ConversionRequest, Converter, Edition, Entity, Item,
};

/// crocon CLI
#[derive(Parser, Debug)]
#[command(name = "crocon")]
#[command(about = "Convert Minecraft data between Java and Bedrock editions")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "CROCON_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    header: HeaderArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct HeaderArgs {
    /// Source game version, e.g. 1.20.4
    #[arg(long, global = true, default_value = "1.20.4")]
    from_version: String,

    /// Target game version, e.g. 1.20.80
    #[arg(long, global = true, default_value = "1.20.80")]
    to_version: String,

    /// Source edition (java or bedrock)
    #[arg(long, global = true, default_value = "java")]
    from: Edition,

    /// Target edition (java or bedrock)
    #[arg(long, global = true, default_value = "bedrock")]
    to: Edition,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a block and its states
    Block {
        /// Namespaced block id
        #[arg(long)]
        id: String,

        /// String state, as name=value (repeatable)
        #[arg(long = "state", value_parser = json::parse_state)]
        states: Vec<(String, String)>,

        /// Integer state, as name=value (repeatable)
        #[arg(long = "int-state", value_parser = json::parse_state)]
        int_states: Vec<(String, String)>,

        /// Boolean state stored as a byte, as name=value (repeatable)
        #[arg(long = "bool-state", value_parser = json::parse_state)]
        bool_states: Vec<(String, String)>,
    },

    /// Convert a biome by Java name or Bedrock id
    Biome {
        /// Java biome name
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        name: Option<String>,

        /// Bedrock biome id
        #[arg(long)]
        id: Option<i32>,
    },

    /// Convert an item stack given as a JSON object
    Item {
        #[arg(long = "json")]
        payload: String,
    },

    /// Convert an entity given as a JSON object
    Entity {
        #[arg(long = "json")]
        payload: String,
    },

    /// Convert a block entity given as a JSON object
    BlockEntity {
        #[arg(long = "json")]
        payload: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigFile::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConfigFile::default(),
    };

    init_tracing(&config.logging);
    debug!(?config, "Configuration loaded");

    let header = ConversionRequest::new(
        cli.header.from_version,
        cli.header.to_version,
        cli.header.from,
        cli.header.to,
    );
    info!(
        from = %header.from_edition(),
        from_version = header.from_version(),
        to = %header.to_edition(),
        to_version = header.to_version(),
        "Starting conversion"
    );

    let converter =
        crocon_native::open(&config.converter).context("Failed to start libcrocon")?;
    let output = run(&converter, header, cli.command);
    converter.close();

    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}

fn run(
    converter: &Converter,
    header: ConversionRequest,
    command: Commands,
) -> Result<serde_json::Value> {
    let output = match command {
        Commands::Block {
            id,
            states,
            int_states,
            bool_states,
        } => {
            let mut block = Block::new(id);
            for (name, value) in states {
                block = block.with_state(name, value);
            }
            for (name, value) in int_states {
                let value: i32 = value
                    .parse()
                    .with_context(|| format!("State '{name}' is not an integer"))?;
                block = block.with_state(name, value);
            }
            for (name, value) in bool_states {
                let value: bool = value
                    .parse()
                    .with_context(|| format!("State '{name}' is not a boolean"))?;
                block = block.with_state(name, value);
            }
            serde_json::to_value(converter.convert_block(&header.with(block))?)?
        }
        Commands::Biome { name, id } => {
            let query = match (name, id) {
                (Some(name), _) => BiomeQuery::Name(name),
                (None, Some(id)) => BiomeQuery::Id(id),
                (None, None) => anyhow::bail!("Either --name or --id is required"),
            };
            serde_json::to_value(converter.convert_biome(&header.with(query))?)?
        }
        Commands::Item { payload } => {
            let item = Item::from(json::parse_compound(&payload)?);
            serde_json::to_value(converter.convert_item(&header.with(item))?)?
        }
        Commands::Entity { payload } => {
            let entity = Entity::from(json::parse_compound(&payload)?);
            serde_json::to_value(converter.convert_entity(&header.with(entity))?)?
        }
        Commands::BlockEntity { payload } => {
            let block_entity = BlockEntity::from(json::parse_compound(&payload)?);
            serde_json::to_value(converter.convert_block_entity(&header.with(block_entity))?)?
        }
    };

    debug!(cache = ?converter.cache_stats(), "Conversion finished");
    Ok(output)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| logging.filter.as_str().into());

    // Logs go to stderr; stdout carries only the conversion result.
    let json_layer = logging
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer =
        (!logging.json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
