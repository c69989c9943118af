//! Demo binary: wires an in-memory robot store and the dry-run executor
//! into a `Manager`, ticks the clock a few times, and prints what fired.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use robotsched::domain::models::{ClockConfig, Quota, RobotConfig, RobotResources, TriggerFlags};
use robotsched::domain::ports::RobotRecord;
use robotsched::infrastructure::config::ConfigLoader;
use robotsched::infrastructure::logging;
use robotsched::{DryRunPhaseBody, ExecutorMode, InMemoryRobotStore, Manager, PhaseBody};

#[derive(Parser, Debug)]
#[command(name = "robotsched-demo")]
#[command(about = "Runs an in-memory scheduling core against a seeded fleet of robots")]
struct Args {
    /// Number of clock ticks to simulate.
    #[arg(long, default_value_t = 3)]
    ticks: u32,

    /// Milliseconds to sleep between ticks.
    #[arg(long, default_value_t = 50)]
    tick_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ConfigLoader::load().context("failed to load configuration")?;
    logging::init(&config.logging.level, config.logging.format).context("failed to initialize logging")?;

    let store = Arc::new(InMemoryRobotStore::new());
    seed_fleet(&store);

    let standard_body: Arc<dyn PhaseBody> = Arc::new(DryRunPhaseBody::new());
    let manager = Manager::new(store, standard_body, config.into_manager_config());
    manager.start().await.context("failed to start manager")?;

    for tick in 1..=args.ticks {
        tokio::time::sleep(std::time::Duration::from_millis(args.tick_interval_ms)).await;
        println!("-- tick {tick} --");
        for execution in manager.list_executions().await {
            println!(
                "  exec {} member {} paused={} cancelled={}",
                execution.exec_id, execution.member_id, execution.is_paused, execution.is_cancelled
            );
        }
    }

    manager.stop().await.context("failed to stop manager")?;
    Ok(())
}

fn seed_fleet(store: &InMemoryRobotStore) {
    store.insert(RobotRecord {
        member_id: "daily-digest".to_string(),
        team_id: "ops".to_string(),
        autonomous_mode: true,
        config: RobotConfig {
            identity: "daily-digest".to_string(),
            quota: Quota { max: 2, queue: 0, priority: 3 },
            triggers: TriggerFlags::all_enabled(),
            clock: Some(ClockConfig::interval_mode("10ms")),
            resources: RobotResources::default(),
            delivery: Vec::new(),
            events_enabled: true,
            executor_mode: ExecutorMode::DryRun,
            agent_allowlist: Vec::new(),
            continue_on_failure: false,
        },
    });
}
