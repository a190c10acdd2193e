use crate::models::*;
use crate::snapshot::AllocationSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// How blocks are handed out across priority tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// One block per candidate per pass over the whole priority-ordered list
    #[default]
    RoundRobin,

    /// Exhaust each priority tier (round-robin inside it) before the next one
    StrictPriority,
}

/// A connected consumer competing for blocks in one recompute
#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: ConsumerId,
    priority: u8,
    desired: u32,
    granted: u32,
}

/// Turns pool ceiling and consumer demand into an allocation snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct Allocator {
    policy: AllocationPolicy,
}

impl Allocator {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Compute a fresh snapshot. Pure: identical inputs yield identical snapshots.
    pub fn recompute(&self, pool: &CapacityPool, registry: &ConsumerRegistry) -> AllocationSnapshot {
        let block_size = pool.block_size_kw();
        let total_blocks = pool.total_blocks();

        let mut candidates: Vec<Candidate> = registry
            .connected()
            .map(|c| Candidate {
                id: c.id,
                priority: c.priority,
                desired: c.desired_blocks(block_size, total_blocks),
                granted: 0,
            })
            .collect();

        // Priority descending, then id ascending
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));

        let remaining = match self.policy {
            AllocationPolicy::RoundRobin => round_robin(&mut candidates, total_blocks),
            AllocationPolicy::StrictPriority => {
                let mut remaining = total_blocks;
                let mut start = 0;
                while start < candidates.len() && remaining > 0 {
                    let tier = candidates[start].priority;
                    let end = candidates[start..]
                        .iter()
                        .position(|c| c.priority != tier)
                        .map_or(candidates.len(), |offset| start + offset);
                    remaining = round_robin(&mut candidates[start..end], remaining);
                    start = end;
                }
                remaining
            }
        };

        // Disconnected consumers never appear as candidates and stay at zero
        let mut allocations: BTreeMap<ConsumerId, Kw> = registry.iter().map(|c| (c.id, 0)).collect();
        for candidate in &candidates {
            allocations.insert(candidate.id, candidate.granted * block_size);
        }

        debug!(
            policy = ?self.policy,
            mode = %pool.mode(),
            total_blocks,
            candidates = candidates.len(),
            free_blocks = remaining,
            "Recomputed allocation"
        );

        AllocationSnapshot::new(pool.mode(), block_size, total_blocks, allocations)
    }

    /// Write a snapshot's allocations back into the pool and registry
    pub(crate) fn publish(
        snapshot: &AllocationSnapshot,
        pool: &mut CapacityPool,
        registry: &mut ConsumerRegistry,
    ) {
        pool.record_allocated(snapshot.allocated_blocks());
        registry.record_allocation(snapshot.allocations());
    }
}

/// Hand out single blocks in list order, pass after pass, until supply runs
/// out or a pass grants nothing. Returns the blocks left over.
fn round_robin(candidates: &mut [Candidate], mut remaining: u32) -> u32 {
    while remaining > 0 {
        let mut gave = false;
        for candidate in candidates.iter_mut() {
            if candidate.granted < candidate.desired && remaining > 0 {
                candidate.granted += 1;
                remaining -= 1;
                gave = true;
            }
        }
        if !gave {
            break;
        }
    }
    remaining
}
