use super::{AllocationCheck, AuditInput, CheckViolation, ViolationSeverity};

/// Disconnected consumers request nothing and hold nothing
pub struct IdleConsumerCheck;

impl AllocationCheck for IdleConsumerCheck {
    fn name(&self) -> &str {
        "IdleConsumerCheck"
    }

    fn severity(&self) -> ViolationSeverity {
        ViolationSeverity::Medium
    }

    fn check(&self, input: &AuditInput<'_>) -> Vec<CheckViolation> {
        input
            .registry
            .idle()
            .filter(|c| c.requested_kw != 0 || input.snapshot.allocated_kw(c.id) != 0)
            .map(|c| {
                self.violation(
                    format!(
                        "Idle consumer {} still shows request {} kW, allocation {} kW",
                        c.id,
                        c.requested_kw,
                        input.snapshot.allocated_kw(c.id)
                    ),
                    vec![c.id],
                )
            })
            .collect()
    }
}
