// Site Load Manager Library
// Shares a block-quantized site capacity among prioritized consumers

pub mod models;
pub mod allocator;
pub mod snapshot;
pub mod checks;
pub mod config;
pub mod demand;
pub mod report;

pub use models::{CapacityMode, CapacityPool, Consumer, ConsumerId, ConsumerRegistry, Kw};
pub use allocator::{AllocationPolicy, Allocator};
pub use snapshot::{AllocationSnapshot, BlockTransfer, SnapshotDiff};
pub use checks::{AllocationCheck, CheckViolation};
pub use config::{PeakWindow, SiteConfig};
pub use demand::{DemandSource, FixedDemand, RandomDemand};
pub use report::SiteReport;

use chrono::{DateTime, TimeZone};
use tracing::{info, warn};

/// Engine state for one site: pool, consumers and the latest allocation.
///
/// Every mutating call is followed by a full recompute, so [`LoadManager::snapshot`]
/// always reflects the current inputs. Callers that share a manager across
/// threads must serialize access themselves.
pub struct LoadManager {
    config: SiteConfig,
    pool: CapacityPool,
    registry: ConsumerRegistry,
    allocator: Allocator,
    checks: Vec<Box<dyn AllocationCheck>>,
    previous: AllocationSnapshot,
    current: AllocationSnapshot,
}

impl LoadManager {
    pub fn new(config: SiteConfig) -> Result<Self, LoadManagerError> {
        config.validate()?;

        let pool = CapacityPool::from_config(&config);
        let registry = ConsumerRegistry::from_config(&config);
        let allocator = Allocator::new(config.policy);
        let empty = AllocationSnapshot::empty(&pool, &registry);

        let mut manager = Self {
            config,
            pool,
            registry,
            allocator,
            checks: checks::default_checks(),
            previous: empty.clone(),
            current: empty,
        };
        manager.recompute();
        Ok(manager)
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn pool(&self) -> &CapacityPool {
        &self.pool
    }

    pub fn registry(&self) -> &ConsumerRegistry {
        &self.registry
    }

    pub fn consumer(&self, id: ConsumerId) -> Option<&Consumer> {
        self.registry.get(id)
    }

    /// Latest allocation
    pub fn snapshot(&self) -> &AllocationSnapshot {
        &self.current
    }

    /// Change produced by the most recent recompute
    pub fn last_diff(&self) -> SnapshotDiff {
        SnapshotDiff::between(&self.previous, &self.current)
    }

    pub fn connect(&mut self, id: ConsumerId, requested_kw: i64) -> Result<(), LoadManagerError> {
        self.registry
            .connect(id, requested_kw)
            .map_err(|e| rejected("connect", e))?;
        info!(consumer = id, requested_kw, "Consumer connected");
        self.recompute();
        Ok(())
    }

    pub fn disconnect(&mut self, id: ConsumerId) -> Result<(), LoadManagerError> {
        self.registry
            .disconnect(id)
            .map_err(|e| rejected("disconnect", e))?;
        info!(consumer = id, "Consumer disconnected");
        self.recompute();
        Ok(())
    }

    pub fn set_priority(&mut self, id: ConsumerId, priority: i64) -> Result<(), LoadManagerError> {
        self.registry
            .set_priority(id, priority)
            .map_err(|e| rejected("set_priority", e))?;
        self.recompute();
        Ok(())
    }

    pub fn set_request(&mut self, id: ConsumerId, capacity_kw: i64) -> Result<(), LoadManagerError> {
        self.registry
            .set_request(id, capacity_kw)
            .map_err(|e| rejected("set_request", e))?;
        self.recompute();
        Ok(())
    }

    pub fn set_capacity_mode(&mut self, mode: CapacityMode) -> Result<(), LoadManagerError> {
        if self.pool.set_mode(mode) {
            info!(%mode, ceiling_kw = self.pool.ceiling_kw(), "Capacity mode changed");
        }
        self.recompute();
        Ok(())
    }

    /// Like [`LoadManager::set_capacity_mode`], for modes named by a caller
    pub fn set_capacity_mode_named(&mut self, mode: &str) -> Result<(), LoadManagerError> {
        let mode = mode
            .parse::<CapacityMode>()
            .map_err(|e| rejected("set_capacity_mode", e))?;
        self.set_capacity_mode(mode)
    }

    /// Switch to the constrained ceiling inside configured peak windows and
    /// back outside them. Returns true if the mode changed.
    pub fn apply_schedule<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool {
        let mode = if self.config.is_peak(now) {
            CapacityMode::Constrained
        } else {
            CapacityMode::Normal
        };
        if mode == self.pool.mode() {
            return false;
        }
        self.pool.set_mode(mode);
        info!(%mode, ceiling_kw = self.pool.ceiling_kw(), "Peak schedule switched capacity mode");
        self.recompute();
        true
    }

    /// Connect the lowest-numbered idle consumer with a generated request
    pub fn plug_in_next<S>(&mut self, demand: &mut S) -> Option<ConsumerId>
    where
        S: DemandSource + ?Sized,
    {
        let id = self.registry.idle().map(|c| c.id).next()?;
        let requested = demand.next_request(&self.config);
        self.connect(id, requested as i64).ok()?;
        // A zero draw leaves the consumer idle
        Some(id).filter(|id| self.registry.get(*id).is_some_and(|c| c.connected))
    }

    /// Disconnect the highest-numbered connected consumer
    pub fn unplug_last(&mut self) -> Option<ConsumerId> {
        let id = self.registry.connected().map(|c| c.id).last()?;
        self.disconnect(id).ok()?;
        Some(id)
    }

    /// Flip a consumer between connected and idle, keeping its priority.
    /// Returns the new connection state.
    pub fn toggle_plug<S>(&mut self, id: ConsumerId, demand: &mut S) -> Result<bool, LoadManagerError>
    where
        S: DemandSource + ?Sized,
    {
        let connected = self
            .registry
            .get(id)
            .ok_or_else(|| rejected("toggle_plug", LoadManagerError::NotFound(id)))?
            .connected;

        if connected {
            // Unplugging keeps the consumer's priority, unlike `disconnect`
            self.set_request(id, 0)?;
            info!(consumer = id, "Consumer unplugged");
        } else {
            let requested = demand.next_request(&self.config);
            self.connect(id, requested as i64)?;
        }
        Ok(!connected)
    }

    /// Draw a new request for every connected consumer, then recompute once
    pub fn randomize_requests<S>(&mut self, demand: &mut S)
    where
        S: DemandSource + ?Sized,
    {
        let connected: Vec<ConsumerId> = self.registry.connected().map(|c| c.id).collect();
        for id in connected {
            let requested = demand.next_request(&self.config);
            if let Err(e) = self.registry.set_request(id, requested as i64) {
                warn!(consumer = id, error = %e, "Skipping request re-roll");
            }
        }
        self.recompute();
    }

    /// Run the allocator against current inputs and publish the result
    pub fn recompute(&mut self) -> &AllocationSnapshot {
        let next = self.allocator.recompute(&self.pool, &self.registry);
        Allocator::publish(&next, &mut self.pool, &mut self.registry);
        self.previous = std::mem::replace(&mut self.current, next);
        &self.current
    }

    /// Audit the latest allocation against every invariant check
    pub fn check_violations(&self) -> Vec<CheckViolation> {
        let input = checks::AuditInput {
            registry: &self.registry,
            snapshot: &self.current,
        };
        self.checks
            .iter()
            .flat_map(|check| check.check(&input))
            .collect()
    }

    pub fn report(&self) -> SiteReport {
        SiteReport::new(&self.registry, &self.current)
    }
}

fn rejected(operation: &str, err: LoadManagerError) -> LoadManagerError {
    warn!(operation, error = %err, "Operation rejected");
    err
}

#[derive(Debug, thiserror::Error)]
pub enum LoadManagerError {
    #[error("Consumer not found: {0}")]
    NotFound(ConsumerId),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
