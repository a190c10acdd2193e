use crate::config::SiteConfig;
use crate::models::Kw;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Supplies request sizes for consumers that plug in or re-roll demand
pub trait DemandSource {
    /// Next request in kW
    fn next_request(&mut self, config: &SiteConfig) -> Kw;
}

/// Uniform draw of 1..=max blocks per request
pub struct RandomDemand {
    rng: StdRng,
}

impl RandomDemand {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDemand {
    fn default() -> Self {
        Self::new()
    }
}

impl DemandSource for RandomDemand {
    fn next_request(&mut self, config: &SiteConfig) -> Kw {
        if config.block_size_kw == 0 {
            return 0;
        }
        let max_blocks = (config.max_per_consumer_kw / config.block_size_kw).max(1);
        self.rng.gen_range(1..=max_blocks) * config.block_size_kw
    }
}

/// Replays a fixed list of requests, cycling when exhausted
#[derive(Debug, Clone)]
pub struct FixedDemand {
    requests: VecDeque<Kw>,
}

impl FixedDemand {
    pub fn new(requests: impl IntoIterator<Item = Kw>) -> Self {
        Self {
            requests: requests.into_iter().collect(),
        }
    }
}

impl DemandSource for FixedDemand {
    fn next_request(&mut self, _config: &SiteConfig) -> Kw {
        match self.requests.pop_front() {
            Some(kw) => {
                self.requests.push_back(kw);
                kw
            }
            None => 0,
        }
    }
}

impl<F> DemandSource for F
where
    F: FnMut(&SiteConfig) -> Kw,
{
    fn next_request(&mut self, config: &SiteConfig) -> Kw {
        self(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_demand_is_block_aligned() {
        let config = SiteConfig::default();
        let mut demand = RandomDemand::seeded(7);
        for _ in 0..200 {
            let kw = demand.next_request(&config);
            assert!(kw >= 50 && kw <= 300);
            assert_eq!(kw % 50, 0);
        }
    }

    #[test]
    fn test_seeded_demand_repeats() {
        let config = SiteConfig::default();
        let mut a = RandomDemand::seeded(42);
        let mut b = RandomDemand::seeded(42);
        let xs: Vec<Kw> = (0..10).map(|_| a.next_request(&config)).collect();
        let ys: Vec<Kw> = (0..10).map(|_| b.next_request(&config)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_fixed_demand_cycles() {
        let config = SiteConfig::default();
        let mut demand = FixedDemand::new([100, 250]);
        assert_eq!(demand.next_request(&config), 100);
        assert_eq!(demand.next_request(&config), 250);
        assert_eq!(demand.next_request(&config), 100);

        assert_eq!(FixedDemand::new([]).next_request(&config), 0);
    }

    #[test]
    fn test_closure_source() {
        let config = SiteConfig::default();
        let mut source = |c: &SiteConfig| c.block_size_kw * 2;
        assert_eq!(source.next_request(&config), 100);
    }
}
