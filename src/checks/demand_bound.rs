use super::{AllocationCheck, AuditInput, CheckViolation, ViolationSeverity};

/// Nobody receives more than their block-rounded-down request
pub struct DemandBoundCheck;

impl AllocationCheck for DemandBoundCheck {
    fn name(&self) -> &str {
        "DemandBoundCheck"
    }

    fn severity(&self) -> ViolationSeverity {
        ViolationSeverity::High
    }

    fn check(&self, input: &AuditInput<'_>) -> Vec<CheckViolation> {
        let snapshot = input.snapshot;
        let block = snapshot.block_size_kw();
        let mut violations = Vec::new();

        for consumer in input.registry.iter() {
            let desired_kw = consumer.desired_blocks(block, snapshot.total_blocks()) * block;
            let allocated = snapshot.allocated_kw(consumer.id);

            if allocated > desired_kw {
                violations.push(self.violation(
                    format!(
                        "Consumer {} allocated {} kW but desires only {} kW (requested {} kW)",
                        consumer.id, allocated, desired_kw, consumer.requested_kw
                    ),
                    vec![consumer.id],
                ));
            }
        }

        violations
    }
}
