use super::{AllocationCheck, AuditInput, CheckViolation, ViolationSeverity};
use crate::models::Consumer;
use std::collections::BTreeMap;

/// Within a priority tier, a consumer left short never trails a peer by more than one block
pub struct TierFairnessCheck;

impl AllocationCheck for TierFairnessCheck {
    fn name(&self) -> &str {
        "TierFairnessCheck"
    }

    fn severity(&self) -> ViolationSeverity {
        ViolationSeverity::Low
    }

    fn check(&self, input: &AuditInput<'_>) -> Vec<CheckViolation> {
        let snapshot = input.snapshot;
        let block = snapshot.block_size_kw();
        let total = snapshot.total_blocks();

        let mut tiers: BTreeMap<u8, Vec<&Consumer>> = BTreeMap::new();
        for consumer in input.registry.connected() {
            tiers.entry(consumer.priority).or_default().push(consumer);
        }

        let mut violations = Vec::new();
        for (priority, members) in &tiers {
            for short in members {
                let got = snapshot.allocated_blocks_for(short.id);
                if got >= short.desired_blocks(block, total) {
                    continue;
                }
                for peer in members.iter().filter(|p| p.id != short.id) {
                    let peer_got = snapshot.allocated_blocks_for(peer.id);
                    if peer_got > got + 1 {
                        violations.push(self.violation(
                            format!(
                                "Priority {} tier: consumer {} has {} blocks while short consumer {} has {}",
                                priority, peer.id, peer_got, short.id, got
                            ),
                            vec![short.id, peer.id],
                        ));
                    }
                }
            }
        }

        violations
    }
}
