use crate::models::*;
use crate::snapshot::AllocationSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the site summary table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerRow {
    pub id: ConsumerId,
    pub connected: bool,
    pub requested_kw: Option<Kw>,
    pub allocated_kw: Kw,
    pub priority: u8,
}

impl std::fmt::Display for ConsumerRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let request = match self.requested_kw {
            Some(kw) => format!("{} kW", kw),
            None => "-".to_string(),
        };
        write!(
            f,
            "Stall {:<3} {:<8} {:>8} {:>8} {:>3}",
            self.id,
            if self.connected { "Connected" } else { "Idle" },
            request,
            format!("{} kW", self.allocated_kw),
            self.priority
        )
    }
}

/// Human-readable view of the site after a recompute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteReport {
    pub generated_at: DateTime<Utc>,
    pub mode: CapacityMode,
    pub ceiling_kw: Kw,
    pub total_blocks: u32,
    pub free_blocks: u32,
    pub rows: Vec<ConsumerRow>,
}

impl SiteReport {
    pub fn new(registry: &ConsumerRegistry, snapshot: &AllocationSnapshot) -> Self {
        let rows = registry
            .iter()
            .map(|c| ConsumerRow {
                id: c.id,
                connected: c.connected,
                requested_kw: c.connected.then_some(c.requested_kw),
                allocated_kw: snapshot.allocated_kw(c.id),
                priority: c.priority,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            mode: snapshot.mode(),
            ceiling_kw: snapshot.ceiling_kw(),
            total_blocks: snapshot.total_blocks(),
            free_blocks: snapshot.free_blocks(),
            rows,
        }
    }

    pub fn connected_count(&self) -> usize {
        self.rows.iter().filter(|r| r.connected).count()
    }
}

impl std::fmt::Display for SiteReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Site: {} kW total ({} mode), {}/{} blocks free",
            self.ceiling_kw, self.mode, self.free_blocks, self.total_blocks
        )?;
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::Allocator;

    #[test]
    fn test_idle_request_shows_dash() {
        let pool = CapacityPool::new(50, 400, 300);
        let mut registry = ConsumerRegistry::new(2, 50, 300, 3);
        registry.connect(1, 150).unwrap();
        let snapshot = Allocator::default().recompute(&pool, &registry);

        let report = SiteReport::new(&registry, &snapshot);
        assert_eq!(report.connected_count(), 1);
        assert_eq!(report.rows[0].requested_kw, Some(150));
        assert_eq!(report.rows[1].requested_kw, None);

        let text = report.to_string();
        assert!(text.starts_with("Site: 400 kW total (normal mode), 5/8 blocks free"));
        assert!(text.contains("150 kW"));
        assert!(text.lines().nth(2).unwrap().contains('-'));
    }
}
