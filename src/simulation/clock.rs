use crate::catalog::ObjectCatalog;
use crate::config::RtlsConfig;
use crate::simulation::model::KinematicModel;
use crate::state::StateHub;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Per-object random source; a fixed seed makes every model reproducible.
pub fn model_rng(seed: Option<u64>, object_id: i64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(object_id as u64)),
        None => StdRng::from_entropy(),
    }
}

/// Fixed-period driver that advances every model and feeds the hub
pub struct SimulationClock {
    models: Vec<KinematicModel>,
    hub: Arc<StateHub>,
    period: Duration,
}

impl SimulationClock {
    pub fn new(models: Vec<KinematicModel>, hub: Arc<StateHub>, period: Duration) -> Self {
        Self {
            models,
            hub,
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Build one model per object id `1..=population`, tagged from the catalog
    pub fn from_config(config: &RtlsConfig, catalog: &ObjectCatalog, hub: Arc<StateHub>) -> Self {
        let area = Arc::new(config.area.clone());
        let motion = Arc::new(config.motion.clone());

        let models = (1..=config.simulation.population as i64)
            .map(|object_id| {
                KinematicModel::new(
                    object_id,
                    catalog.tag_for(object_id),
                    Arc::clone(&area),
                    Arc::clone(&motion),
                    model_rng(config.simulation.seed, object_id),
                )
            })
            .collect();

        Self::new(models, hub, config.simulation.tick_interval())
    }

    pub fn population(&self) -> usize {
        self.models.len()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one tick now
    pub fn tick(&mut self) {
        self.tick_at(Utc::now());
    }

    /// Advance every model once and hand each record to the hub in turn
    pub fn tick_at(&mut self, now: DateTime<Utc>) {
        let dt = self.period.as_secs_f64();
        for model in &mut self.models {
            let record = model.advance_at(dt, now);
            self.hub.update(record);
        }
    }

    /// Spawn the tick loop on the current tokio runtime
    pub fn start(mut self) -> ClockHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        info!(
            population = self.models.len(),
            period_ms = self.period.as_millis() as u64,
            "Simulation clock starting"
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.period);

            // A late tick is absorbed into the next one, never replayed
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // First tick completes immediately; wait one full period instead
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.tick(),
                    _ = &mut stop_rx => break,
                }
            }

            info!("Simulation clock stopped");
        });

        ClockHandle { stop_tx, task }
    }
}

/// Handle to a running clock. `stop` consumes it, so a clock can only be
/// stopped once. Dropping the handle also ends the loop.
pub struct ClockHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ClockHandle {
    /// Halt future ticks and wait for the loop to exit
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "Simulation clock task failed");
        }
    }
}
