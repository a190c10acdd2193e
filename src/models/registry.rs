use std::collections::BTreeMap;
use super::{Consumer, ConsumerId, Kw, MAX_PRIORITY, MIN_PRIORITY};
use crate::config::SiteConfig;
use crate::LoadManagerError;

/// Holds every consumer on the site, keyed by id (1..=N)
#[derive(Debug, Clone)]
pub struct ConsumerRegistry {
    consumers: BTreeMap<ConsumerId, Consumer>,
    block_size_kw: Kw,
    max_per_consumer_kw: Kw,
    default_priority: u8,
}

impl ConsumerRegistry {
    pub fn new(count: u32, block_size_kw: Kw, max_per_consumer_kw: Kw, default_priority: u8) -> Self {
        let default_priority = default_priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
        let consumers = (1..=count)
            .map(|id| (id, Consumer::new(id, default_priority)))
            .collect();

        Self {
            consumers,
            block_size_kw,
            max_per_consumer_kw,
            default_priority,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            config.consumer_count,
            config.block_size_kw,
            config.max_per_consumer_kw,
            config.default_priority,
        )
    }

    pub fn get(&self, id: ConsumerId) -> Option<&Consumer> {
        self.consumers.get(&id)
    }

    fn get_mut(&mut self, id: ConsumerId) -> Result<&mut Consumer, LoadManagerError> {
        self.consumers
            .get_mut(&id)
            .ok_or(LoadManagerError::NotFound(id))
    }

    /// All consumers in id order
    pub fn iter(&self) -> impl Iterator<Item = &Consumer> {
        self.consumers.values()
    }

    pub fn connected(&self) -> impl Iterator<Item = &Consumer> {
        self.consumers.values().filter(|c| c.connected)
    }

    pub fn idle(&self) -> impl Iterator<Item = &Consumer> {
        self.consumers.values().filter(|c| !c.connected)
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    pub fn default_priority(&self) -> u8 {
        self.default_priority
    }

    pub fn connect(&mut self, id: ConsumerId, requested_kw: i64) -> Result<(), LoadManagerError> {
        let request = self.normalize_request(requested_kw);
        let consumer = self.get_mut(id)?;
        consumer.requested_kw = request;
        // A zero request cannot hold a connection
        consumer.connected = request > 0;
        Ok(())
    }

    pub fn disconnect(&mut self, id: ConsumerId) -> Result<(), LoadManagerError> {
        let default_priority = self.default_priority;
        let consumer = self.get_mut(id)?;
        consumer.connected = false;
        consumer.requested_kw = 0;
        consumer.priority = default_priority;
        Ok(())
    }

    pub fn set_priority(&mut self, id: ConsumerId, priority: i64) -> Result<(), LoadManagerError> {
        let consumer = self.get_mut(id)?;
        consumer.priority = priority.clamp(MIN_PRIORITY as i64, MAX_PRIORITY as i64) as u8;
        Ok(())
    }

    pub fn set_request(&mut self, id: ConsumerId, capacity_kw: i64) -> Result<(), LoadManagerError> {
        let request = self.normalize_request(capacity_kw);
        let consumer = self.get_mut(id)?;
        consumer.requested_kw = request;
        consumer.connected = request > 0;
        Ok(())
    }

    /// Round to the nearest block (halves round up) and clamp into [0, max]
    pub fn normalize_request(&self, capacity_kw: i64) -> Kw {
        let block = self.block_size_kw as i64;
        if block == 0 {
            return 0;
        }
        let max = self.max_per_consumer_kw as i64;
        let clamped = capacity_kw.clamp(0, max);
        let rounded = (clamped + block / 2) / block * block;
        rounded.min(max) as Kw
    }

    pub(crate) fn record_allocation(&mut self, allocations: &BTreeMap<ConsumerId, Kw>) {
        for consumer in self.consumers.values_mut() {
            consumer.allocated_kw = allocations.get(&consumer.id).copied().unwrap_or(0);
        }
    }
}
