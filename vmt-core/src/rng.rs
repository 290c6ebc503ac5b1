//! Deterministic RNG plumbing (spec 6.2, 9).
//!
//! A single root `StdRng` seeded from the scenario's `u64` seed drives the
//! only two stochastic draws the in-scope core needs, in a fixed order:
//! resource placement at init, then per-agent utility-type assignment when
//! `utilities.mix` names more than one type. Both happen once, before any
//! tick, so no substream indirection is needed for them.
//!
//! Any future stochastic protocol extension that needs a per-tick,
//! per-agent draw should derive a throwaway substream via [`substream`]
//! instead of consuming the root stream directly, so added phases never
//! shift the draw order of existing ones.

use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn root_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Derive a throwaway `StdRng` from `hash(root_seed, phase_tag, tick,
/// agent_id)`, per the spec's design note on RNG scope.
pub fn substream(root_seed: u64, phase_tag: &str, tick: u64, agent_id: u32) -> StdRng {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    root_seed.hash(&mut hasher);
    phase_tag.hash(&mut hasher);
    tick.hash(&mut hasher);
    agent_id.hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_produces_identical_draws() {
        let mut a = root_rng(42);
        let mut b = root_rng(42);
        let xs: Vec<f64> = (0..5).map(|_| a.random()).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.random()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn substreams_differ_by_tag_tick_and_agent() {
        let mut a = substream(1, "forage", 0, 0);
        let mut b = substream(1, "forage", 0, 1);
        let mut c = substream(1, "trade", 0, 0);
        let x: f64 = a.random();
        let y: f64 = b.random();
        let z: f64 = c.random();
        assert_ne!(x, y);
        assert_ne!(x, z);
    }
}
