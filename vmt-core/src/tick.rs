//! The tick scheduler (spec 4.1): one call to [`step`] runs Perception,
//! Decision, Movement, Trade, Forage, Regeneration and Housekeeping in that
//! fixed order, gated by the current temporal mode.

use crate::config::Params;
use crate::controller::Mode;
use crate::decision::decide;
use crate::error::{InvariantError, VmtError};
use crate::events::{Event, UnpairReason};
use crate::forage::{apply_harvest, apply_regeneration};
use crate::movement::apply_movement;
use crate::perception::build_views;
use crate::quotes::refresh_if_stale;
use crate::trade::run_trade_phase;
use crate::types::PairId;
use crate::world::World;

/// Check the invariants that must hold after every tick (spec 4.1, 7): no
/// negative inventory, money neither created nor destroyed, and pairing
/// stays symmetric. Goods A/B are exempt from the conservation check since
/// foraging legitimately mints them from resource cells.
fn check_invariants(world: &World, tick: u64, phase: &'static str) -> Result<(), InvariantError> {
    use crate::types::{Commodity, CommodityOrMoney};

    let mut money_total = 0i64;
    for agent in &world.agents {
        if agent.inventory.a < 0 {
            return Err(InvariantError::NegativeInventory {
                tick,
                phase,
                agent: agent.id.0,
                kind: CommodityOrMoney::Commodity(Commodity::A),
                amount: agent.inventory.a,
            });
        }
        if agent.inventory.b < 0 {
            return Err(InvariantError::NegativeInventory {
                tick,
                phase,
                agent: agent.id.0,
                kind: CommodityOrMoney::Commodity(Commodity::B),
                amount: agent.inventory.b,
            });
        }
        if agent.inventory.m < 0 {
            return Err(InvariantError::NegativeInventory {
                tick,
                phase,
                agent: agent.id.0,
                kind: CommodityOrMoney::Money,
                amount: agent.inventory.m,
            });
        }
        money_total += agent.inventory.m;

        if let Some(other) = agent.paired_with {
            let reciprocal = world.agents[other.index()].paired_with;
            if reciprocal != Some(agent.id) {
                return Err(InvariantError::DoublePairing {
                    tick,
                    phase,
                    agent: agent.id.0,
                    other_a: other.0,
                    other_b: reciprocal.map(|r| r.0).unwrap_or(agent.id.0),
                });
            }
        }
    }
    if money_total != world.initial_money_total {
        return Err(InvariantError::ConservationViolated {
            tick,
            phase,
            good: CommodityOrMoney::Money,
            actual: money_total,
            expected: world.initial_money_total,
        });
    }
    Ok(())
}

fn count_active_pairs(world: &World) -> usize {
    let mut pairs: Vec<PairId> = world
        .agents
        .iter()
        .filter_map(|a| a.paired_with.map(|other| PairId::new(a.id, other)))
        .collect();
    pairs.sort();
    pairs.dedup();
    pairs.len()
}

/// Unpair every currently-paired agent, stamping `UnpairReason::ModeSwitch`
/// (spec 4.9: a mode transition always unpairs first, before Decision runs).
fn force_unpair_for_mode_switch(world: &mut World) {
    let tick = world.tick;
    let mut pairs: Vec<PairId> = world
        .agents
        .iter()
        .filter_map(|a| a.paired_with.map(|other| PairId::new(a.id, other)))
        .collect();
    pairs.sort();
    pairs.dedup();
    for pair in pairs {
        world.agents[pair.min.index()].paired_with = None;
        world.agents[pair.max.index()].paired_with = None;
        world.events.push(Event::Unpairing {
            tick,
            a: pair.min,
            b: pair.max,
            reason: UnpairReason::ModeSwitch,
        });
    }
}

/// Run one full tick, mutating `world` in place. Returns the mode that was
/// active, for callers that drive their own loop and want to log progress.
/// Errs fatally (spec 4.1, 7) if a conservation, non-negativity, or pairing
/// invariant is violated; the run must not continue past that point.
pub fn step(world: &mut World, params: &Params) -> Result<Mode, VmtError> {
    let tick = world.tick;
    let mode = world.controller.mode_at(tick);

    if world.controller.switched_at(tick) {
        force_unpair_for_mode_switch(world);
    }

    let regime = params.exchange_regime;
    for agent in world.agents.iter_mut() {
        refresh_if_stale(agent, regime, params);
    }

    world.events.push(Event::TickStarted {
        tick,
        mode,
        regime,
        active_pairs: count_active_pairs(world),
    });

    let consider_trade = world.controller.runs_trade(tick);
    let consider_forage = world.controller.runs_forage(tick);

    // Perception
    let views = build_views(&world.agents, &world.grid, &world.resources, params);

    // Decision
    let outcome = decide(&mut world.agents, &views, params, consider_trade, consider_forage);
    for (a, b) in &outcome.pairings {
        world.agents[a.index()].paired_with = Some(*b);
        world.agents[b.index()].paired_with = Some(*a);
        world.events.push(Event::Pairing {
            tick,
            a: *a,
            b: *b,
            reason: crate::events::PairReason::PartnerSelected,
        });
    }

    // Movement
    apply_movement(&mut world.agents, &world.grid, params);

    // Trade
    if consider_trade {
        run_trade_phase(&mut world.agents, &views, params, tick, &mut world.events);
    }

    // Forage
    if consider_forage {
        apply_harvest(&mut world.agents, &mut world.resources, &world.grid, params, tick, &mut world.events);
    }

    // Regeneration always runs; cells regrow independently of the mode gate.
    apply_regeneration(&mut world.resources, &world.grid, params, tick, &mut world.events);

    // Housekeeping
    for agent in world.agents.iter_mut() {
        refresh_if_stale(agent, regime, params);
        agent.tick_cooldowns();
    }

    check_invariants(world, tick, "housekeeping")?;

    world.events.push(Event::TickFinished { tick });
    world.tick += 1;

    Ok(mode)
}

/// Run `max_ticks` ticks from the world's current tick, draining and
/// returning every event emitted. Aborts on the first tick that fails its
/// invariant check; the events emitted up to and including the failing
/// tick remain in `world.events` for a caller to inspect.
pub fn run(world: &mut World, params: &Params, max_ticks: u64) -> Result<Vec<Event>, VmtError> {
    for _ in 0..max_ticks {
        step(world, params)?;
    }
    Ok(world.events.drain())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExchangeRegime, InitialInventories, ResourceSeed, ScalarOrList, ScenarioConfig, UtilityMixEntry};
    use crate::utility::Utility;
    use crate::world::World;

    fn config() -> ScenarioConfig {
        ScenarioConfig {
            schema_version: 1,
            name: "test".to_string(),
            n: 6,
            agents: 2,
            initial_inventories: InitialInventories {
                a: ScalarOrList::List(vec![10, 0]),
                b: ScalarOrList::List(vec![0, 10]),
                m: None,
            },
            lambda_money: None,
            utilities_mix: vec![UtilityMixEntry {
                utility: Utility::Ces { rho: -0.5, w_a: 1.0, w_b: 1.0 },
                weight: 1.0,
            }],
            params: Params {
                exchange_regime: ExchangeRegime::BarterOnly,
                vision_radius: 10,
                ..Params::default()
            },
            resource_seed: ResourceSeed { density: 0.0, amount: 0 },
            mode_schedule: None,
        }
    }

    #[test]
    fn tick_advances_and_emits_tick_started_and_finished() {
        let cfg = config();
        let mut world = World::from_config(&cfg, 1).unwrap();
        step(&mut world, &cfg.params).unwrap();
        assert_eq!(world.tick, 1);
        let events = world.events.as_slice();
        assert!(matches!(events.first(), Some(Event::TickStarted { tick: 0, .. })));
        assert!(matches!(events.last(), Some(Event::TickFinished { tick: 0 })));
    }

    #[test]
    fn two_runs_of_the_same_seed_produce_identical_event_sequences() {
        let cfg = config();
        let mut w1 = World::from_config(&cfg, 99).unwrap();
        let mut w2 = World::from_config(&cfg, 99).unwrap();
        let e1 = run(&mut w1, &cfg.params, 10).unwrap();
        let e2 = run(&mut w2, &cfg.params, 10).unwrap();
        assert_eq!(e1, e2);
    }

    #[test]
    fn conservation_holds_across_a_run() {
        let cfg = config();
        let mut world = World::from_config(&cfg, 5).unwrap();
        let before: i64 = world.agents.iter().map(|a| a.inventory.a + a.inventory.b + a.inventory.m).sum();
        run(&mut world, &cfg.params, 20).unwrap();
        let after: i64 = world.agents.iter().map(|a| a.inventory.a + a.inventory.b + a.inventory.m).sum();
        assert_eq!(before, after);
    }

    #[test]
    fn a_money_leak_outside_of_trade_aborts_the_step() {
        let cfg = config();
        let mut world = World::from_config(&cfg, 1).unwrap();
        world.agents[0].inventory.m += 1; // inventory.m now diverges from initial_money_total
        let err = step(&mut world, &cfg.params).unwrap_err();
        assert!(matches!(err, VmtError::Invariant(InvariantError::ConservationViolated { .. })));
    }

    #[test]
    fn an_asymmetric_pairing_fails_its_invariant_check() {
        // Exercises check_invariants directly: routing this through `step`
        // would let the Trade phase's unconditional unpair at block
        // exhaustion paper over the asymmetry before Housekeeping runs.
        let cfg = config();
        let mut world = World::from_config(&cfg, 1).unwrap();
        world.agents[0].paired_with = Some(world.agents[1].id); // agent 1 never reciprocates
        let err = check_invariants(&world, world.tick, "test").unwrap_err();
        assert!(matches!(err, InvariantError::DoublePairing { .. }));
    }
}
