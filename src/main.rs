//! Командная строка tilekit
//!
//! Использование:
//!   tilekit world-to-tiles <world-dir> --blocks map.json -o objectgroup.json
//!   tilekit tiles-to-world <objectgroup.json> <world-dir> --blocks map.json
//!   tilekit info <objectgroup.json>

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tilekit::convert::{load_layout, save_layout, TileToWorldConverter, WorldToTileConverter};
use tilekit::{BlockTable, ConvertConfig, ObjectGroup, RegionDirectory};

#[derive(Parser)]
#[command(name = "tilekit")]
#[command(about = "Convert object group tiles to and from a block world")]
struct Cli {
    /// JSON файл с настройками конвертера
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build tiles from a world directory using its layout file
    WorldToTiles {
        world_dir: PathBuf,
        /// Block map JSON
        #[arg(long)]
        blocks: PathBuf,
        /// Output object group JSON
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write an object group into a world directory
    TilesToWorld {
        objectgroup: PathBuf,
        world_dir: PathBuf,
        /// Block map JSON
        #[arg(long)]
        blocks: PathBuf,
    },
    /// Print per-tile statistics
    Info { objectgroup: PathBuf },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::WorldToTiles { world_dir, blocks, output } => world_to_tiles(&config, &world_dir, &blocks, &output),
        Commands::TilesToWorld { objectgroup, world_dir, blocks } => {
            tiles_to_world(&config, &objectgroup, &world_dir, &blocks)
        }
        Commands::Info { objectgroup } => info(&objectgroup),
    }
}

fn load_config(path: Option<&Path>) -> Result<ConvertConfig> {
    match path {
        Some(path) => ConvertConfig::load(path).with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ConvertConfig::default()),
    }
}

fn load_blocks(path: &Path) -> Result<BlockTable> {
    BlockTable::from_file(path).with_context(|| format!("Failed to load block map {}", path.display()))
}

fn world_to_tiles(config: &ConvertConfig, world_dir: &Path, blocks: &Path, output: &Path) -> Result<()> {
    let table = load_blocks(blocks)?;
    let mut group = load_layout(world_dir, config)
        .with_context(|| format!("Failed to load tile layout from {}", world_dir.display()))?;

    let mut world = RegionDirectory::open(world_dir, config.partition_size, config.world_min_y, config.world_max_y)
        .with_context(|| format!("Failed to open world {}", world_dir.display()))?;

    let mut converter = WorldToTileConverter::new(config.clone(), table)?;
    converter.convert(&mut world, &mut group)?;

    group
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Wrote {} tiles to {}", group.tiles.len(), output.display());
    Ok(())
}

fn tiles_to_world(config: &ConvertConfig, objectgroup: &Path, world_dir: &Path, blocks: &Path) -> Result<()> {
    let table = load_blocks(blocks)?;
    let group = ObjectGroup::load(objectgroup).with_context(|| format!("Failed to read {}", objectgroup.display()))?;

    let mut world = RegionDirectory::open(world_dir, config.partition_size, config.world_min_y, config.world_max_y)
        .with_context(|| format!("Failed to open world {}", world_dir.display()))?;

    let mut converter = TileToWorldConverter::new(config.clone(), table)?;
    let layout = converter.convert(&group, &mut world)?;
    save_layout(world_dir, &layout, config).context("Failed to save tile layout")?;

    if converter.skipped() > 0 {
        log::warn!("{} voxels were outside the world height and skipped", converter.skipped());
    }
    Ok(())
}

fn info(objectgroup: &Path) -> Result<()> {
    let group = ObjectGroup::load(objectgroup).with_context(|| format!("Failed to read {}", objectgroup.display()))?;
    println!("{} tiles", group.tiles.len());
    for tile in &group.tiles {
        println!("{}", tile.summary());
    }
    Ok(())
}
