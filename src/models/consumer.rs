use serde::{Deserialize, Serialize};
use super::{ConsumerId, Kw};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub id: ConsumerId,
    pub connected: bool,
    pub requested_kw: Kw,
    pub priority: u8,
    pub(crate) allocated_kw: Kw,
}

impl Consumer {
    pub fn new(id: ConsumerId, default_priority: u8) -> Self {
        Self {
            id,
            connected: false,
            requested_kw: 0,
            priority: default_priority,
            allocated_kw: 0,
        }
    }

    /// Capacity granted by the last recompute
    pub fn allocated_kw(&self) -> Kw {
        self.allocated_kw
    }

    /// Demand in whole blocks, capped at the site ceiling
    pub fn desired_blocks(&self, block_size_kw: Kw, total_blocks: u32) -> u32 {
        if !self.connected || block_size_kw == 0 {
            return 0;
        }
        (self.requested_kw / block_size_kw).min(total_blocks)
    }

    pub fn is_idle(&self) -> bool {
        !self.connected
    }
}
