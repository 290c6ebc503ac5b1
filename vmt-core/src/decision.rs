//! Decision phase (spec 4.5): partner selection and target selection, built
//! entirely off this tick's frozen [`LocalView`]s. Reads agent state, writes
//! only `target` and the set of pairings to form; Trade and Movement act on
//! the result afterward.

use std::collections::{HashMap, HashSet};

use crate::agent::{Agent, Target};
use crate::config::{ExchangeRegime, Params};
use crate::matching::{best_trade_across_pairs, eligible_pair_types, market_is_liquid};
use crate::perception::LocalView;
use crate::types::{AgentId, Commodity, Position};

/// Per-tick resource claim ledger (spec 9 design note): cleared every tick,
/// populated during Decision, consulted during Forage. First claimant -- the
/// lowest agent id, since agents decide in ascending id order -- wins.
#[derive(Debug, Clone, Default)]
pub struct ClaimLedger {
    claims: HashMap<Position, AgentId>,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to claim `pos` for `id`. Returns `true` if `id` now holds the
    /// claim (either newly, or because it already did).
    pub fn try_claim(&mut self, pos: Position, id: AgentId) -> bool {
        match self.claims.get(&pos) {
            Some(&existing) => existing == id,
            None => {
                self.claims.insert(pos, id);
                true
            }
        }
    }

    pub fn claimant(&self, pos: Position) -> Option<AgentId> {
        self.claims.get(&pos).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecisionOutcome {
    /// New pairings to form this tick, in the order they were decided.
    pub pairings: Vec<(AgentId, AgentId)>,
    pub claims: ClaimLedger,
}

fn rank_kind(kind: Commodity) -> u8 {
    match kind {
        Commodity::A => 0,
        Commodity::B => 1,
    }
}

/// Run Decision for every unpaired agent, in ascending id order. Agents
/// already paired keep their existing target untouched. `consider_trade` and
/// `consider_forage` are the current tick's mode gates (spec 4.9); when both
/// are false every unpaired agent's target is cleared to `Target::None`.
pub fn decide(agents: &mut [Agent], views: &[LocalView], params: &Params, consider_trade: bool, consider_forage: bool) -> DecisionOutcome {
    let mut outcome = DecisionOutcome::default();
    let mut reserved: HashSet<AgentId> = agents.iter().filter(|a| a.is_paired()).map(|a| a.id).collect();

    for i in 0..agents.len() {
        if agents[i].is_paired() {
            continue;
        }
        let view = &views[i];

        let partner = if consider_trade {
            select_partner(&agents[i], view, params, &reserved)
        } else {
            None
        };

        if let Some(partner_id) = partner {
            agents[i].target = Target::Partner(partner_id);
            outcome.pairings.push((agents[i].id, partner_id));
            reserved.insert(agents[i].id);
            reserved.insert(partner_id);
            continue;
        }

        agents[i].target = if consider_forage {
            select_forage_target(&agents[i], view, params, &outcome.claims)
        } else {
            Target::None
        };

        if let Target::Forage(pos) = agents[i].target {
            if params.enable_resource_claiming {
                outcome.claims.try_claim(pos, agents[i].id);
            }
        }
    }

    outcome
}

fn visible_distinct_money_neighbors(view: &LocalView) -> usize {
    view.visible_agents
        .iter()
        .filter(|a| a.quotes.monetary_quote_count() > 0)
        .count()
}

fn select_partner(agent: &Agent, view: &LocalView, params: &Params, reserved: &HashSet<AgentId>) -> Option<AgentId> {
    let regime = params.exchange_regime;
    let base_allowed = eligible_pair_types(regime);
    // Monetary pairs are always allowed; barter is the illiquid-only
    // fallback (spec 4.6), enabled only when the gate hasn't been reached.
    let barter_allowed = regime != ExchangeRegime::MixedLiquidityGated
        || !market_is_liquid(visible_distinct_money_neighbors(view), params.liquidity_gate);

    let allowed: Vec<_> = base_allowed
        .iter()
        .copied()
        .filter(|pk| pk.is_monetary() || barter_allowed)
        .collect();
    if allowed.is_empty() {
        return None;
    }

    let mut best: Option<(AgentId, crate::matching::TradeCandidate)> = None;
    for other in &view.visible_agents {
        if other.is_paired || reserved.contains(&other.id) {
            continue;
        }
        if agent.is_on_cooldown_with(other.id) {
            continue;
        }
        if agent.pos.manhattan_distance(other.pos) > params.interaction_radius {
            continue;
        }
        let probe = other.as_probe_agent();
        let candidate = if agent.id.0 < other.id.0 {
            best_trade_across_pairs(agent, &probe, &allowed, params)
        } else {
            best_trade_across_pairs(&probe, agent, &allowed, params)
        };
        let Some(candidate) = candidate else { continue };

        let better = match &best {
            None => true,
            Some((_, current)) => {
                candidate.total_surplus() > current.total_surplus()
                    || (candidate.total_surplus() == current.total_surplus()
                        && candidate.pair_type.priority() < current.pair_type.priority())
            }
        };
        if better {
            best = Some((other.id, candidate));
        }
    }
    best.map(|(id, _)| id)
}

fn select_forage_target(agent: &Agent, view: &LocalView, params: &Params, claims: &ClaimLedger) -> Target {
    let mut best: Option<(f64, Position, Commodity)> = None;
    for resource in &view.visible_resources {
        if params.enable_resource_claiming {
            if let Some(claimed_by) = claims.claimant(resource.pos) {
                if claimed_by != agent.id {
                    continue;
                }
            }
        }
        let harvested = params.forage_rate.min(resource.cell.amount).max(0);
        if harvested == 0 {
            continue;
        }
        let (a, b) = (agent.inventory.a as f64, agent.inventory.b as f64);
        let (next_a, next_b) = match resource.cell.kind {
            Commodity::A => (a + harvested as f64, b),
            Commodity::B => (a, b + harvested as f64),
        };
        let delta_u = agent.utility.u_goods(next_a, next_b) - agent.utility.u_goods(a, b);
        let distance = agent.pos.manhattan_distance(resource.pos);
        let score = delta_u * params.beta.powi(distance);

        let is_better = match &best {
            None => true,
            Some((best_score, best_pos, best_kind)) => {
                score > *best_score
                    || (score == *best_score
                        && (rank_kind(resource.cell.kind), resource.pos.x, resource.pos.y)
                            < (rank_kind(*best_kind), best_pos.x, best_pos.y))
            }
        };
        if is_better {
            best = Some((score, resource.pos, resource.cell.kind));
        }
    }
    best.map(|(_, pos, _)| Target::Forage(pos)).unwrap_or(Target::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geography::{Grid, ResourceCell};
    use crate::perception::build_views;
    use crate::quotes::{compute_quotes, QuoteInputs};
    use crate::types::{Inventory};
    use crate::utility::Utility;

    fn agent_with_quotes(id: u32, x: i32, y: i32, a: i64, b: i64, params: &Params) -> Agent {
        let utility = Utility::Ces { rho: -0.5, w_a: 1.0, w_b: 1.0 };
        let mut agent = Agent::new(AgentId::new(id), Position::new(x, y), Inventory::new(a, b, 0), utility, 1.0);
        let inputs = QuoteInputs {
            a,
            b,
            m: 0,
            utility,
            lambda_money: 1.0,
            money_form: params.money_utility_form,
            spread: params.spread,
            epsilon: params.epsilon,
        };
        agent.quotes = compute_quotes(&inputs, params.exchange_regime);
        agent
    }

    #[test]
    fn claim_ledger_first_claimant_wins() {
        let mut ledger = ClaimLedger::new();
        let pos = Position::new(1, 1);
        assert!(ledger.try_claim(pos, AgentId::new(0)));
        assert!(!ledger.try_claim(pos, AgentId::new(1)));
        assert_eq!(ledger.claimant(pos), Some(AgentId::new(0)));
    }

    #[test]
    fn complementary_agents_pair_up() {
        let mut params = Params::default();
        params.exchange_regime = ExchangeRegime::BarterOnly;
        let mut agents = vec![
            agent_with_quotes(0, 0, 0, 10, 0, &params),
            agent_with_quotes(1, 1, 0, 0, 10, &params),
        ];
        let grid = Grid::new(8);
        let resources = vec![None; grid.cell_count()];
        let views = build_views(&agents, &grid, &resources, &params);
        let outcome = decide(&mut agents, &views, &params, true, true);
        assert_eq!(outcome.pairings, vec![(AgentId::new(0), AgentId::new(1))]);
        assert_eq!(agents[0].target, Target::Partner(AgentId::new(1)));
    }

    #[test]
    fn a_visible_but_out_of_interaction_radius_candidate_is_not_selected() {
        // Both agents see each other (vision_radius is generous) and have
        // complementary endowments, but they are farther apart than
        // interaction_radius, so Decision must not pair them -- Trade would
        // only have to undo it with DistanceLost.
        let mut params = Params::default();
        params.exchange_regime = ExchangeRegime::BarterOnly;
        params.vision_radius = 10;
        params.interaction_radius = 1;
        let mut agents = vec![
            agent_with_quotes(0, 0, 0, 10, 0, &params),
            agent_with_quotes(1, 5, 0, 0, 10, &params),
        ];
        let grid = Grid::new(8);
        let resources = vec![None; grid.cell_count()];
        let views = build_views(&agents, &grid, &resources, &params);
        let outcome = decide(&mut agents, &views, &params, true, true);
        assert!(outcome.pairings.is_empty());
    }

    #[test]
    fn solitary_agent_falls_back_to_foraging() {
        let mut params = Params::default();
        params.exchange_regime = ExchangeRegime::BarterOnly;
        let mut agents = vec![agent_with_quotes(0, 1, 1, 5, 5, &params)];
        let grid = Grid::new(8);
        let mut resources = vec![None; grid.cell_count()];
        resources[grid.cell_index(Position::new(2, 1))] = Some(ResourceCell::new(Commodity::A, 3));
        let views = build_views(&agents, &grid, &resources, &params);
        let outcome = decide(&mut agents, &views, &params, true, true);
        assert!(outcome.pairings.is_empty());
        assert_eq!(agents[0].target, Target::Forage(Position::new(2, 1)));
    }

    #[test]
    fn mode_gates_suppress_both_kinds_of_target() {
        let mut params = Params::default();
        let mut agents = vec![agent_with_quotes(0, 1, 1, 5, 5, &params)];
        let grid = Grid::new(8);
        let mut resources = vec![None; grid.cell_count()];
        resources[grid.cell_index(Position::new(2, 1))] = Some(ResourceCell::new(Commodity::A, 3));
        let views = build_views(&agents, &grid, &resources, &params);
        let outcome = decide(&mut agents, &views, &params, false, false);
        assert!(outcome.pairings.is_empty());
        assert_eq!(agents[0].target, Target::None);
    }

    #[test]
    fn money_pairing_proceeds_even_when_the_gate_has_not_opened() {
        // Only a money trade is profitable here (one A-rich + money-poor,
        // one A-poor + money-rich, both hold zero B). Monetary pairs are
        // never subject to the liquidity gate, so this pairs under the
        // gated regime exactly as it would under plain `Mixed`, even with
        // only one visible money-quoting neighbor (below the threshold of 3).
        let mut gated = Params::default();
        gated.exchange_regime = ExchangeRegime::MixedLiquidityGated;
        gated.liquidity_gate.min_quotes = 3;
        let mut agents = vec![
            agent_with_quotes(0, 0, 0, 10, 0, &gated),
            agent_with_quotes(1, 1, 0, 0, 0, &gated),
        ];
        agents[0].inventory.m = 0;
        agents[1].inventory.m = 20;
        let grid = Grid::new(8);
        let resources = vec![None; grid.cell_count()];
        let views = build_views(&agents, &grid, &resources, &gated);
        let outcome = decide(&mut agents, &views, &gated, true, true);
        assert_eq!(outcome.pairings.len(), 1, "money is never gated off");
    }

    #[test]
    fn barter_pairing_is_blocked_once_the_gate_opens() {
        // Three agents share a cell. Agent 0 can only profitably trade A
        // for B with agent 1 (neither holds money worth trading), but it
        // also sees agents 1 and 2 quoting money prices -- two distinct
        // neighbors, meeting the min_quotes=2 threshold -- so the gate is
        // open and the barter fallback must not kick in.
        let mut gated = Params::default();
        gated.exchange_regime = ExchangeRegime::MixedLiquidityGated;
        gated.liquidity_gate.min_quotes = 2;
        let mut agents = vec![
            agent_with_quotes(0, 0, 0, 10, 0, &gated),
            agent_with_quotes(1, 0, 0, 0, 10, &gated),
            agent_with_quotes(2, 0, 0, 5, 5, &gated),
        ];
        agents[0].inventory.m = 0;
        agents[1].inventory.m = 0;
        agents[2].inventory.m = 0;
        let grid = Grid::new(8);
        let resources = vec![None; grid.cell_count()];
        let views = build_views(&agents, &grid, &resources, &gated);
        let outcome = decide(&mut agents, &views, &gated, true, true);
        assert!(
            outcome.pairings.iter().all(|&(a, b)| a != AgentId::new(0) && b != AgentId::new(0)),
            "agent 0 should find no allowed pair type once the gate is open"
        );
    }
}
