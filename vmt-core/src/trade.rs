//! Trade phase (spec 4.6): executes bilateral bargaining for every paired
//! agent, applying [`crate::matching`]'s price search repeatedly per pair
//! until no more mutually-improving block exists, then unpairs.
//!
//! A pair formed by Decision keeps negotiating, block after block, for as
//! long as this tick's Trade phase runs; the first failed search — whether
//! zero blocks traded or the surplus is simply exhausted — ends the pairing
//! (`UnpairReason::TradeFailed`) and starts both agents' cooldown. There is
//! no cross-tick "still negotiating" state: a pairing and its bargaining
//! session live entirely within one tick's Trade phase.
//!
//! Bargaining itself only ever happens between agents within
//! `interaction_radius` (spec 4.6); Decision's partner selection already
//! filters to that same radius, but Movement can still carry a pair apart
//! within the same tick, in which case the pair is dropped here with
//! `UnpairReason::DistanceLost` instead of being negotiated.

use crate::agent::Agent;
use crate::config::{ExchangeRegime, Params};
use crate::events::{Event, TradeStatus, UnpairReason};
use crate::events::EventStream;
use crate::matching::{best_trade_across_pairs, eligible_pair_types, market_is_liquid};
use crate::perception::LocalView;
use crate::quotes::refresh_if_stale;
use crate::types::PairId;

/// `mixed_liquidity_gated`'s pair-type filter (spec 4.6): monetary pairs are
/// always allowed; barter is the illiquid-only fallback, enabled precisely
/// when the gate's distinct-monetary-neighbor count has *not* been reached.
fn allowed_pair_types(view: &LocalView, params: &Params) -> Vec<crate::types::PairKey> {
    let regime = params.exchange_regime;
    let barter_allowed = regime != ExchangeRegime::MixedLiquidityGated
        || !market_is_liquid(
            view.visible_agents.iter().filter(|a| a.quotes.monetary_quote_count() > 0).count(),
            params.liquidity_gate,
        );
    eligible_pair_types(regime)
        .iter()
        .copied()
        .filter(|pk| pk.is_monetary() || barter_allowed)
        .collect()
}

/// Run the Trade phase over every currently-paired agent. `views` is this
/// tick's Perception snapshot, indexed by `AgentId::index()`; only used to
/// decide which pair types the lower-id agent's liquidity gate allows.
pub fn run_trade_phase(agents: &mut [Agent], views: &[LocalView], params: &Params, tick: u64, events: &mut EventStream) {
    let mut pairs: Vec<PairId> = agents
        .iter()
        .filter_map(|a| a.paired_with.map(|other| PairId::new(a.id, other)))
        .collect();
    pairs.sort();
    pairs.dedup();

    for pair in pairs {
        let lo_idx = pair.min.index();
        let hi_idx = pair.max.index();

        // Bargaining requires the pair to actually be adjacent (spec 4.6).
        // Decision only forms pairs already within interaction_radius, so
        // this only fires when Movement carries the two apart again within
        // the same tick.
        if agents[lo_idx].pos.manhattan_distance(agents[hi_idx].pos) > params.interaction_radius {
            agents[lo_idx].paired_with = None;
            agents[hi_idx].paired_with = None;
            events.push(Event::Unpairing {
                tick,
                a: pair.min,
                b: pair.max,
                reason: UnpairReason::DistanceLost,
            });
            continue;
        }

        let allowed = allowed_pair_types(&views[lo_idx], params);

        loop {
            let (left, right) = agents.split_at_mut(hi_idx);
            let seller = &mut left[lo_idx];
            let buyer = &mut right[0];

            let Some(candidate) = best_trade_across_pairs(seller, buyer, &allowed, params) else {
                seller.paired_with = None;
                buyer.paired_with = None;
                seller.start_cooldown_with(buyer.id, params.trade_cooldown_ticks);
                buyer.start_cooldown_with(seller.id, params.trade_cooldown_ticks);
                events.push(Event::Unpairing {
                    tick,
                    a: seller.id,
                    b: buyer.id,
                    reason: UnpairReason::TradeFailed,
                });
                break;
            };

            let (gx, gy, gm) = candidate.pair_type.gives().delta(-candidate.d_x);
            let (rx, ry, rm) = candidate.pair_type.receives().delta(candidate.d_y);
            seller.apply_trade(gx + rx, gy + ry, gm + rm);
            let (bx, by, bm) = candidate.pair_type.receives().delta(-candidate.d_y);
            let (sx, sy, sm) = candidate.pair_type.gives().delta(candidate.d_x);
            buyer.apply_trade(bx + sx, by + sy, bm + sm);

            refresh_if_stale(seller, params.exchange_regime, params);
            refresh_if_stale(buyer, params.exchange_regime, params);

            let (d_a, d_b, d_m) = {
                let (a1, b1, m1) = candidate.pair_type.gives().delta(candidate.d_x);
                let (a2, b2, m2) = candidate.pair_type.receives().delta(candidate.d_y);
                (a1 + a2, b1 + b2, m1 + m2)
            };
            events.push(Event::TradeAttempt {
                tick,
                a: seller.id,
                b: buyer.id,
                pair_type: candidate.pair_type,
                price: candidate.price,
                d_x: candidate.d_x,
                d_y: candidate.d_y,
                status: TradeStatus::Executed,
            });
            events.push(Event::Trade {
                tick,
                buyer: buyer.id,
                seller: seller.id,
                pair_type: candidate.pair_type,
                d_a,
                d_b,
                d_m,
                price: candidate.price,
                surplus_buyer: candidate.buyer_surplus,
                surplus_seller: candidate.seller_surplus,
            });
        }
    }
}
