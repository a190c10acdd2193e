use super::{AllocationCheck, AuditInput, CheckViolation, ViolationSeverity};

/// Total allocation never exceeds the active site ceiling
pub struct CapacityCeilingCheck;

impl AllocationCheck for CapacityCeilingCheck {
    fn name(&self) -> &str {
        "CapacityCeilingCheck"
    }

    fn severity(&self) -> ViolationSeverity {
        ViolationSeverity::Critical
    }

    fn check(&self, input: &AuditInput<'_>) -> Vec<CheckViolation> {
        let snapshot = input.snapshot;
        let allocated = snapshot.total_allocated_kw();
        let ceiling = snapshot.ceiling_kw();

        if allocated <= ceiling {
            return Vec::new();
        }

        let over: Vec<_> = snapshot
            .allocations()
            .iter()
            .filter(|(_, kw)| **kw > 0)
            .map(|(id, _)| *id)
            .collect();

        vec![self.violation(
            format!(
                "Allocated {} kW exceeds {} ceiling of {} kW",
                allocated,
                snapshot.mode(),
                ceiling
            ),
            over,
        )]
    }
}
