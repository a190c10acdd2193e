use crate::models::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable result of one recompute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSnapshot {
    mode: CapacityMode,
    block_size_kw: Kw,
    total_blocks: u32,
    free_blocks: u32,
    allocations: BTreeMap<ConsumerId, Kw>,
}

impl AllocationSnapshot {
    pub(crate) fn new(
        mode: CapacityMode,
        block_size_kw: Kw,
        total_blocks: u32,
        allocations: BTreeMap<ConsumerId, Kw>,
    ) -> Self {
        let used: u32 = allocations
            .values()
            .map(|kw| if block_size_kw == 0 { 0 } else { kw / block_size_kw })
            .sum();

        Self {
            mode,
            block_size_kw,
            total_blocks,
            free_blocks: total_blocks.saturating_sub(used),
            allocations,
        }
    }

    /// Snapshot of a site where nothing is handed out yet
    pub fn empty(pool: &CapacityPool, registry: &ConsumerRegistry) -> Self {
        Self::new(
            pool.mode(),
            pool.block_size_kw(),
            pool.total_blocks(),
            registry.iter().map(|c| (c.id, 0)).collect(),
        )
    }

    pub fn mode(&self) -> CapacityMode {
        self.mode
    }

    pub fn block_size_kw(&self) -> Kw {
        self.block_size_kw
    }

    pub fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    pub fn free_blocks(&self) -> u32 {
        self.free_blocks
    }

    pub fn allocated_blocks(&self) -> u32 {
        self.total_blocks - self.free_blocks
    }

    pub fn ceiling_kw(&self) -> Kw {
        self.total_blocks * self.block_size_kw
    }

    pub fn total_allocated_kw(&self) -> Kw {
        self.allocations.values().sum()
    }

    /// Allocated capacity for a consumer, 0 for unknown ids
    pub fn allocated_kw(&self, id: ConsumerId) -> Kw {
        self.allocations.get(&id).copied().unwrap_or(0)
    }

    pub fn allocated_blocks_for(&self, id: ConsumerId) -> u32 {
        if self.block_size_kw == 0 {
            return 0;
        }
        self.allocated_kw(id) / self.block_size_kw
    }

    pub fn allocations(&self) -> &BTreeMap<ConsumerId, Kw> {
        &self.allocations
    }
}

/// Per-consumer change between two snapshots, in kW
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub block_size_kw: Kw,
    pub deltas: BTreeMap<ConsumerId, i64>,
}

impl SnapshotDiff {
    /// `next - prev` for every consumer that appears in either snapshot
    pub fn between(prev: &AllocationSnapshot, next: &AllocationSnapshot) -> Self {
        let deltas = prev
            .allocations
            .keys()
            .chain(next.allocations.keys())
            .map(|&id| {
                let delta = next.allocated_kw(id) as i64 - prev.allocated_kw(id) as i64;
                (id, delta)
            })
            .collect();

        Self {
            block_size_kw: next.block_size_kw,
            deltas,
        }
    }

    pub fn delta_kw(&self, id: ConsumerId) -> i64 {
        self.deltas.get(&id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.values().all(|d| *d == 0)
    }

    /// Block movements to play out, releases first so blocks return to the pool
    /// before they are handed on
    pub fn transfers(&self) -> Vec<BlockTransfer> {
        if self.block_size_kw == 0 {
            return Vec::new();
        }
        let block = self.block_size_kw as i64;

        let mut transfers: Vec<BlockTransfer> = self
            .deltas
            .iter()
            .filter(|(_, d)| **d != 0)
            .map(|(&consumer, &delta)| {
                let blocks = (delta.unsigned_abs() / block as u64) as u32;
                if delta > 0 {
                    BlockTransfer::Grant { consumer, blocks }
                } else {
                    BlockTransfer::Release { consumer, blocks }
                }
            })
            .collect();

        transfers.sort_by_key(|t| match t {
            BlockTransfer::Release { consumer, .. } => (0, *consumer),
            BlockTransfer::Grant { consumer, .. } => (1, *consumer),
        });
        transfers
    }
}

/// Blocks flowing between the pool and one consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockTransfer {
    /// Pool to consumer
    Grant { consumer: ConsumerId, blocks: u32 },

    /// Consumer back to pool
    Release { consumer: ConsumerId, blocks: u32 },
}

impl BlockTransfer {
    pub fn consumer(&self) -> ConsumerId {
        match self {
            BlockTransfer::Grant { consumer, .. } | BlockTransfer::Release { consumer, .. } => {
                *consumer
            }
        }
    }

    pub fn blocks(&self) -> u32 {
        match self {
            BlockTransfer::Grant { blocks, .. } | BlockTransfer::Release { blocks, .. } => *blocks,
        }
    }

    pub fn description(&self) -> String {
        match self {
            BlockTransfer::Grant { consumer, blocks } => {
                format!("Grant {} block(s) from pool to consumer {}", blocks, consumer)
            }
            BlockTransfer::Release { consumer, blocks } => {
                format!("Release {} block(s) from consumer {} to pool", blocks, consumer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(allocs: &[(ConsumerId, Kw)]) -> AllocationSnapshot {
        AllocationSnapshot::new(CapacityMode::Normal, 50, 8, allocs.iter().copied().collect())
    }

    #[test]
    fn test_free_blocks_from_allocations() {
        let snap = snapshot(&[(1, 150), (2, 100), (3, 0)]);
        assert_eq!(snap.free_blocks(), 3);
        assert_eq!(snap.allocated_blocks(), 5);
        assert_eq!(snap.total_allocated_kw(), 250);
        assert_eq!(snap.allocated_kw(9), 0);
    }

    #[test]
    fn test_diff_signs() {
        let prev = snapshot(&[(1, 400), (2, 0)]);
        let next = snapshot(&[(1, 200), (2, 200)]);

        let diff = SnapshotDiff::between(&prev, &next);
        assert_eq!(diff.delta_kw(1), -200);
        assert_eq!(diff.delta_kw(2), 200);
        assert!(!diff.is_empty());

        let transfers = diff.transfers();
        assert_eq!(
            transfers,
            vec![
                BlockTransfer::Release { consumer: 1, blocks: 4 },
                BlockTransfer::Grant { consumer: 2, blocks: 4 },
            ]
        );
    }

    #[test]
    fn test_identical_snapshots_diff_empty() {
        let a = snapshot(&[(1, 100), (2, 50)]);
        let diff = SnapshotDiff::between(&a, &a.clone());
        assert!(diff.is_empty());
        assert!(diff.transfers().is_empty());
    }
}
