use crate::models::{ConsumerId, ConsumerRegistry};
use crate::snapshot::AllocationSnapshot;

/// How bad a violation is for the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViolationSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone)]
pub struct CheckViolation {
    pub check_name: String,
    pub severity: ViolationSeverity,
    pub description: String,
    pub affected_consumers: Vec<ConsumerId>,
}

/// What a check looks at: the registry after publishing and the snapshot it received
#[derive(Debug, Clone, Copy)]
pub struct AuditInput<'a> {
    pub registry: &'a ConsumerRegistry,
    pub snapshot: &'a AllocationSnapshot,
}

/// An invariant every published allocation must satisfy
pub trait AllocationCheck: Send + Sync {
    fn name(&self) -> &str;

    fn severity(&self) -> ViolationSeverity;

    fn check(&self, input: &AuditInput<'_>) -> Vec<CheckViolation>;

    fn violation(&self, description: String, affected_consumers: Vec<ConsumerId>) -> CheckViolation {
        CheckViolation {
            check_name: self.name().to_string(),
            severity: self.severity(),
            description,
            affected_consumers,
        }
    }
}

/// Every check the engine audits against
pub fn default_checks() -> Vec<Box<dyn AllocationCheck>> {
    vec![
        Box::new(CapacityCeilingCheck),
        Box::new(BlockAlignmentCheck),
        Box::new(DemandBoundCheck),
        Box::new(IdleConsumerCheck),
        Box::new(TierFairnessCheck),
    ]
}

// Module declarations
mod capacity_ceiling;
mod block_alignment;
mod demand_bound;
mod idle_consumer;
mod tier_fairness;

// Re-exports
pub use capacity_ceiling::CapacityCeilingCheck;
pub use block_alignment::BlockAlignmentCheck;
pub use demand_bound::DemandBoundCheck;
pub use idle_consumer::IdleConsumerCheck;
pub use tier_fairness::TierFairnessCheck;
