//! Property tests: every reachable engine state satisfies the allocation invariants.

use proptest::prelude::*;
use site_load_manager::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Connect(ConsumerId, i64),
    Disconnect(ConsumerId),
    SetPriority(ConsumerId, i64),
    SetRequest(ConsumerId, i64),
    SetMode(CapacityMode),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let id = 0u32..=7;
    prop_oneof![
        (id.clone(), -100i64..500).prop_map(|(id, kw)| Op::Connect(id, kw)),
        id.clone().prop_map(Op::Disconnect),
        (id.clone(), -3i64..9).prop_map(|(id, p)| Op::SetPriority(id, p)),
        (id, -100i64..500).prop_map(|(id, kw)| Op::SetRequest(id, kw)),
        prop_oneof![Just(CapacityMode::Normal), Just(CapacityMode::Constrained)]
            .prop_map(Op::SetMode),
    ]
}

fn arb_policy() -> impl Strategy<Value = AllocationPolicy> {
    prop_oneof![
        Just(AllocationPolicy::RoundRobin),
        Just(AllocationPolicy::StrictPriority),
    ]
}

fn apply(lm: &mut LoadManager, op: &Op) {
    // Unknown ids are expected to fail without touching state
    let _ = match *op {
        Op::Connect(id, kw) => lm.connect(id, kw),
        Op::Disconnect(id) => lm.disconnect(id),
        Op::SetPriority(id, p) => lm.set_priority(id, p),
        Op::SetRequest(id, kw) => lm.set_request(id, kw),
        Op::SetMode(mode) => lm.set_capacity_mode(mode),
    };
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Ceiling, block alignment, demand bound and idle invariants hold after every operation.
    #[test]
    fn invariants_hold_for_any_operation_sequence(
        policy in arb_policy(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let mut lm = LoadManager::new(SiteConfig { policy, ..SiteConfig::demo() }).unwrap();

        for op in &ops {
            apply(&mut lm, op);
            let snap = lm.snapshot();

            prop_assert!(snap.total_allocated_kw() <= snap.total_blocks() * 50);
            prop_assert_eq!(snap.free_blocks() + snap.allocated_blocks(), snap.total_blocks());

            for c in lm.registry().iter() {
                let allocated = snap.allocated_kw(c.id);
                prop_assert_eq!(allocated % 50, 0);
                prop_assert!(allocated <= 50 * (c.requested_kw / 50));
                prop_assert_eq!(c.allocated_kw(), allocated);
                if !c.connected {
                    prop_assert_eq!(c.requested_kw, 0);
                    prop_assert_eq!(allocated, 0);
                }
            }

            let violations = lm.check_violations();
            prop_assert!(violations.is_empty(), "{:?}", violations);
        }
    }

    /// Recomputing without changes reproduces the same snapshot.
    #[test]
    fn recompute_is_deterministic(ops in prop::collection::vec(arb_op(), 0..30)) {
        let mut lm = LoadManager::new(SiteConfig::demo()).unwrap();
        for op in &ops {
            apply(&mut lm, op);
        }
        let before = lm.snapshot().clone();
        let after = lm.recompute().clone();
        prop_assert_eq!(before, after);
    }

    /// With equal demand, the higher-priority consumer never ends up with fewer blocks.
    #[test]
    fn higher_priority_never_gets_less(
        policy in arb_policy(),
        request in 50i64..=300,
        high in 2i64..=5,
        low_offset in 1i64..=4,
        constrained in any::<bool>(),
    ) {
        let low = (high - low_offset).max(1);
        prop_assume!(low < high);

        let mut lm = LoadManager::new(SiteConfig { policy, ..SiteConfig::demo() }).unwrap();
        if constrained {
            lm.set_capacity_mode(CapacityMode::Constrained).unwrap();
        }
        lm.connect(2, request).unwrap();
        lm.set_priority(2, high).unwrap();
        lm.connect(1, request).unwrap();
        lm.set_priority(1, low).unwrap();

        let snap = lm.snapshot();
        prop_assert!(snap.allocated_blocks_for(2) >= snap.allocated_blocks_for(1));
    }

    /// Same-priority consumers competing for scarce supply differ by at most one block.
    #[test]
    fn same_tier_split_is_within_one_block(
        requests in prop::collection::vec(100i64..=300, 2..=6),
        constrained in any::<bool>(),
    ) {
        let mut lm = LoadManager::new(SiteConfig::demo()).unwrap();
        if constrained {
            lm.set_capacity_mode(CapacityMode::Constrained).unwrap();
        }
        for (i, kw) in requests.iter().enumerate() {
            lm.connect(i as ConsumerId + 1, *kw).unwrap();
        }

        let snap = lm.snapshot();
        let ids: Vec<ConsumerId> = (1..=requests.len() as ConsumerId).collect();
        for &a in &ids {
            for &b in &ids {
                let (ca, cb) = (lm.consumer(a).unwrap(), lm.consumer(b).unwrap());
                let desired_a = (ca.requested_kw / 50).min(snap.total_blocks());
                let desired_b = (cb.requested_kw / 50).min(snap.total_blocks());
                let (ga, gb) = (snap.allocated_blocks_for(a), snap.allocated_blocks_for(b));
                // Both left short: the split is even to within one block
                if ga < desired_a && gb < desired_b {
                    prop_assert!(ga.abs_diff(gb) <= 1);
                }
            }
        }
    }

    /// Diffing two snapshots and applying the deltas recovers the newer allocation.
    #[test]
    fn diff_explains_transition(ops in prop::collection::vec(arb_op(), 1..20)) {
        let mut lm = LoadManager::new(SiteConfig::demo()).unwrap();
        for op in &ops {
            let prev = lm.snapshot().clone();
            apply(&mut lm, op);
            let next = lm.snapshot();
            let diff = SnapshotDiff::between(&prev, next);

            for (&id, &kw) in prev.allocations() {
                prop_assert_eq!(kw as i64 + diff.delta_kw(id), next.allocated_kw(id) as i64);
            }
            let granted: u32 = diff.transfers().iter()
                .filter(|t| matches!(t, BlockTransfer::Grant { .. }))
                .map(|t| t.blocks())
                .sum();
            let released: u32 = diff.transfers().iter()
                .filter(|t| matches!(t, BlockTransfer::Release { .. }))
                .map(|t| t.blocks())
                .sum();
            prop_assert_eq!(
                prev.free_blocks() as i64 + released as i64 - granted as i64
                    + next.total_blocks() as i64 - prev.total_blocks() as i64,
                next.free_blocks() as i64
            );
        }
    }
}
