//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Block edit demo command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "blockedit", about = "Batched block edits with chunk sync")]
pub struct CliArgs {
    /// Default view distance for viewers, in chunks.
    #[arg(long)]
    pub view_distance: Option<u32>,

    /// Lowest block Y of the world.
    #[arg(long, allow_hyphen_values = true)]
    pub min_y: Option<i32>,

    /// World height in blocks (a multiple of 16).
    #[arg(long)]
    pub height: Option<u32>,

    /// Y of the first air block above generated terrain.
    #[arg(long, allow_hyphen_values = true)]
    pub ground_level: Option<i32>,

    /// Skip light recomputation on commit.
    #[arg(long)]
    pub no_lighting: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(vd) = args.view_distance {
            self.sync.view_distance = vd;
        }
        if let Some(min_y) = args.min_y {
            self.world.min_y = min_y;
        }
        if let Some(h) = args.height {
            self.world.height = h;
        }
        if let Some(ground) = args.ground_level {
            self.world.ground_level = ground;
        }
        if args.no_lighting {
            self.edit.update_lighting = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
