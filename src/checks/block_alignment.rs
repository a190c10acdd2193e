use super::{AllocationCheck, AuditInput, CheckViolation, ViolationSeverity};

/// Allocations come in whole blocks
pub struct BlockAlignmentCheck;

impl AllocationCheck for BlockAlignmentCheck {
    fn name(&self) -> &str {
        "BlockAlignmentCheck"
    }

    fn severity(&self) -> ViolationSeverity {
        ViolationSeverity::High
    }

    fn check(&self, input: &AuditInput<'_>) -> Vec<CheckViolation> {
        let block = input.snapshot.block_size_kw();
        if block == 0 {
            return Vec::new();
        }

        input
            .snapshot
            .allocations()
            .iter()
            .filter(|(_, kw)| **kw % block != 0)
            .map(|(id, kw)| {
                self.violation(
                    format!("Consumer {} holds {} kW, not a multiple of {} kW", id, kw, block),
                    vec![*id],
                )
            })
            .collect()
    }
}
