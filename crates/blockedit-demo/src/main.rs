//! Demo binary that builds a small lit structure with one edit session and
//! logs what each connected viewer receives.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p blockedit-demo` to see the commit reports.
//! Run with `cargo run -p blockedit-demo -- --view-distance 2 --no-lighting` to override.

use std::process::ExitCode;

use blockedit_config::{CliArgs, Config, default_config_dir};
use blockedit_lighting::FloodLightEngine;
use blockedit_session::{CommitReport, EditSession, WorldSession};
use blockedit_sync::{ChannelSink, ChunkSnapshotPacket, SnapshotCodec, Viewer, ViewerId, ViewerList};
use blockedit_voxel::{BlockPos, BlockState, ChunkPos, VoxelWorld, WorldBounds};
use clap::Parser;
use crossbeam_channel::Receiver;
use tracing::{error, info, warn};

/// Half-width of the demo structure's footprint.
const TOWER_RADIUS: i32 = 2;
/// Interior height between floor and roof.
const TOWER_HEIGHT: i32 = 4;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    blockedit_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        error!(error = %e, "refusing to start");
        return ExitCode::FAILURE;
    }
    let bounds = match WorldBounds::new(config.world.min_y, config.world.height) {
        Ok(bounds) => bounds,
        Err(e) => {
            error!(error = %e, "invalid world bounds");
            return ExitCode::FAILURE;
        }
    };

    let world = VoxelWorld::flat(bounds, config.world.ground_level);

    let near = ViewerId(1);
    let far = ViewerId(2);
    let mut sink = ChannelSink::new();
    let receivers = [(near, sink.connect(near)), (far, sink.connect(far))];
    let viewers: ViewerList = [
        Viewer::new(near, ChunkPos::new(0, 0), config.sync.view_distance),
        Viewer::new(far, ChunkPos::new(1_000, 1_000), config.sync.view_distance),
    ]
    .into_iter()
    .collect();

    let mut session: WorldSession =
        EditSession::new(world, FloodLightEngine::new(), viewers, SnapshotCodec::new(sink));

    let floor = config.world.ground_level;
    let lamp = stage_tower(&mut session, BlockPos::new(0, floor, 0));
    info!(staged = session.staged_len(), "staged tower");

    if !commit_and_log(&mut session, "tower", config.edit.update_lighting) {
        return ExitCode::FAILURE;
    }

    // A lamp in a region no one has loaded yet, next to the far viewer.
    let remote = BlockPos::new(16_000, floor, 16_000);
    session.set_block(remote, BlockState::GLOWSTONE);
    if !commit_and_log(&mut session, "remote lamp", config.edit.update_lighting) {
        return ExitCode::FAILURE;
    }

    // The far viewer has its copy; the server no longer needs the column.
    if let Some(column) = session.store_mut().unload_column(remote.chunk_pos()) {
        info!(chunk = %column.pos(), version = column.version(), "unloaded remote column");
    }

    for (id, rx) in &receivers {
        drain_viewer(*id, rx, lamp);
    }

    info!(
        columns = session.store().loaded_count(),
        faulted = session.store().faulted_count(),
        built = session.codec().built_count(),
        sent = session.codec().sent_count(),
        "done"
    );
    ExitCode::SUCCESS
}

/// Stages a glass-walled room with a stone floor and roof centred on
/// `base`, lit by one glowstone. Returns the lamp position.
fn stage_tower(session: &mut WorldSession, base: BlockPos) -> BlockPos {
    let roof = TOWER_HEIGHT + 1;
    for dx in -TOWER_RADIUS..=TOWER_RADIUS {
        for dz in -TOWER_RADIUS..=TOWER_RADIUS {
            let edge = dx.abs() == TOWER_RADIUS || dz.abs() == TOWER_RADIUS;
            session.set_block(base.offset(dx, 0, dz), BlockState::STONE);
            session.set_block(base.offset(dx, roof, dz), BlockState::STONE);
            for dy in 1..=TOWER_HEIGHT {
                let state = if edge { BlockState::GLASS } else { BlockState::AIR };
                session.set_block(base.offset(dx, dy, dz), state);
            }
        }
    }
    let lamp = base.offset(0, 1, 0);
    session.set_block(lamp, BlockState::GLOWSTONE);
    lamp
}

/// Commits and logs the report. Returns `false` if the commit aborted.
fn commit_and_log(session: &mut WorldSession, label: &str, update_lighting: bool) -> bool {
    match session.commit(update_lighting) {
        Ok(report) => {
            log_report(label, &report);
            true
        }
        Err(e) => {
            error!(batch = label, error = %e, "commit aborted");
            false
        }
    }
}

fn log_report(label: &str, report: &CommitReport) {
    info!(
        batch = label,
        edits = report.staged,
        chunks = report.touched_chunks.len(),
        light_updates = report.light_updates,
        snapshots = report.snapshots_built,
        sent = report.packets_sent,
        failures = report.failures.len(),
        "commit report"
    );
    for failure in &report.failures {
        warn!(batch = label, failure = %failure, "best-effort step failed");
    }
}

fn drain_viewer(id: ViewerId, rx: &Receiver<ChunkSnapshotPacket>, lamp: BlockPos) {
    let mut received = 0usize;
    while let Ok(packet) = rx.try_recv() {
        received += 1;
        let snapshot = match packet.decode() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(viewer = %id, chunk = %packet.chunk(), error = %e, "undecodable snapshot");
                continue;
            }
        };
        info!(
            viewer = %id,
            chunk = %snapshot.chunk,
            version = snapshot.version,
            compressed = packet.payload().len(),
            uncompressed = packet.uncompressed_size(),
            "received snapshot"
        );
        if let Some(light) = snapshot.light(lamp) {
            info!(viewer = %id, pos = %lamp, block_light = light.block(), sky_light = light.sky(), "lamp light");
        }
    }
    info!(viewer = %id, packets = received, "viewer drained");
}
