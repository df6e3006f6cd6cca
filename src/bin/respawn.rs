//! boss-respawn-server binary
//!
//! Runs the respawn engine against the in-memory simulated host, starting a
//! join-triggered respawn in every configured world and logging each
//! published event.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                              | Default | Description                          |
//! |----------------------------------|---------|--------------------------------------|
//! | `RESPAWN_STEP_INTERVAL_TICKS`    | `22`    | Ticks between anchor steps           |
//! | `RESPAWN_WATCHDOG_TIMEOUT_TICKS` | `700`   | Watchdog deadline after a start      |
//! | `RESPAWN_ANCHOR_RADIUS`          | `3.0`   | Horizontal anchor offset             |
//! | `RESPAWN_ANCHOR_DROP`            | `3.0`   | Vertical anchor drop                 |
//! | `RESPAWN_JOIN_DELAY_TICKS`       | `0`     | Delay after a join trigger           |
//! | `RESPAWN_DEATH_DELAY_TICKS`      | `0`     | Delay after a death trigger          |
//! | `RESPAWN_DEATH_ANIMATION_TICKS`  | `200`   | Length of the boss death animation   |
//! | `RESPAWN_RNG_SEED`               | *(none)*| Fixed seed for template/loot draws   |

use anyhow::{Context, Result};
use boss_respawn::{
    agent::{AgentConfig, Published, RespawnAgent},
    battle::BattleAdapters,
    host::WorldHost,
    service::RespawnService,
    sim::SimulatedHost,
    template::{DirectoryTemplateSource, Template},
    types::{Location, RespawnConfig, WorldId},
};
use clap::Parser;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "boss-respawn-server", about = "Boss respawn orchestration engine", version)]
struct Args {
    /// Optional TOML file with engine settings
    #[arg(long, env = "RESPAWN_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of JSON template definitions
    #[arg(long, env = "RESPAWN_TEMPLATES", default_value = "templates")]
    templates: PathBuf,

    /// Session name stamped on published events
    #[arg(long, env = "RESPAWN_SESSION", default_value = "default")]
    session: String,

    /// Tick rate (Hz)
    #[arg(long, env = "RESPAWN_TICK_RATE_HZ", default_value_t = 20.0)]
    tick_rate_hz: f32,

    /// Worlds to simulate
    #[arg(long, value_delimiter = ',', default_value = "world_the_end")]
    worlds: Vec<String>,

    /// Respawns the simulated mechanic stalls before succeeding, per world
    #[arg(long, default_value_t = 0)]
    stalls: u32,

    /// Host version used to pick the battle adapter
    #[arg(long, env = "RESPAWN_HOST_VERSION", default_value = "sim")]
    host_version: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<RespawnConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    builder
        .add_source(config::Environment::with_prefix("RESPAWN").try_parsing(true))
        .build()
        .context("Failed to read respawn configuration")?
        .try_deserialize()
        .context("Invalid respawn configuration")
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("boss_respawn=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    log::info!(
        "Starting boss-respawn-server (session='{}', worlds={:?}, step={}t, watchdog={}t)",
        args.session,
        args.worlds,
        config.step_interval_ticks,
        config.watchdog_timeout_ticks,
    );

    // Simulated host with one portal per world
    let host = SimulatedHost::new();
    let worlds: Vec<WorldId> = args.worlds.iter().map(WorldId::new).collect();
    for world in &worlds {
        host.add_world(world.clone(), Location::new(0.0, 67.0, 0.0));
        host.queue_stalls(world, args.stalls);
    }

    let mut adapters = BattleAdapters::new();
    adapters.register("sim", Arc::new(host.clone()));
    let battles = adapters
        .select(&args.host_version)
        .with_context(|| format!("No battle adapter for host version '{}'", args.host_version))?;

    let world_host: Arc<dyn WorldHost> = Arc::new(host.clone());
    let mut service = RespawnService::new(config, battles, world_host);

    let source = DirectoryTemplateSource::new(&args.templates);
    let report = service.reload_templates(&source);
    if report.loaded.is_empty() {
        log::warn!(
            "No templates loaded from {}; respawning with the default profile",
            args.templates.display()
        );
        service.set_fallback_template(Some(Template::new("default", "Ender Dragon", 1.0)));
    }

    for world in &worlds {
        let portal = service.battle_for(world)?.portal_location();
        service
            .handle_participant_join(world, portal)
            .with_context(|| format!("Failed to start respawn in '{}'", world))?;
    }

    // Event sink – log every published event
    let (tx, mut rx) = mpsc::channel::<Published>(256);
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            log::info!("{} {}", msg.subject, String::from_utf8_lossy(&msg.payload));
        }
    });

    let agent_config = AgentConfig {
        session: args.session,
        tick_rate_hz: args.tick_rate_hz,
    };

    // Run until shutdown
    RespawnAgent::new(agent_config, Arc::new(Mutex::new(service)), tx)
        .run()
        .await
}
