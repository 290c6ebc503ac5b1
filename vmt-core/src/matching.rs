//! Bilateral matching and bargaining (spec 4.6): for one pair of agents,
//! search the integer trade space at three quote-implied probe prices --
//! ask, midpoint, bid -- and return the best mutually-improving block
//! among them, if one exists.
//!
//! Partner selection (spec 4.5) calls the same [`best_trade_for_pair`] to
//! estimate a candidate's surplus before committing to a pairing, so the
//! estimate and the executed trade can never disagree.

use crate::agent::Agent;
use crate::config::{ExchangeRegime, LiquidityGate, Params};
use crate::types::{round_half_up, PairKey};
use crate::utility::total_utility;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeCandidate {
    pub pair_type: PairKey,
    /// Units of `pair_type.gives()` the seller (lower agent id) gives up.
    pub d_x: i64,
    /// Units of `pair_type.receives()` the buyer (higher agent id) gives up.
    pub d_y: i64,
    pub price: f64,
    pub seller_surplus: f64,
    pub buyer_surplus: f64,
}

impl TradeCandidate {
    pub fn total_surplus(&self) -> f64 {
        self.seller_surplus + self.buyer_surplus
    }
}

/// The pair types a regime permits before any liquidity gating. `seller` is
/// always the lower-id agent in a pair; `pk.reverse()` supplies the other
/// direction, so trying every entry covers both role assignments.
pub fn eligible_pair_types(regime: ExchangeRegime) -> &'static [PairKey] {
    match regime {
        ExchangeRegime::BarterOnly => &[PairKey::AtoB, PairKey::BtoA],
        ExchangeRegime::MoneyOnly => &[PairKey::AtoM, PairKey::MtoA, PairKey::BtoM, PairKey::MtoB],
        ExchangeRegime::Mixed | ExchangeRegime::MixedLiquidityGated => &PairKey::ALL,
    }
}

/// `mixed_liquidity_gated`'s extra condition (spec 4.6, Open Question): the
/// market around an agent counts as liquid once it can see at least
/// `gate.min_quotes` distinct neighbor identities quoting money prices.
/// Monetary pair types are always allowed regardless of this; barter is the
/// illiquid-only fallback, permitted exactly when the market is *not* liquid.
pub fn market_is_liquid(visible_distinct_money_neighbors: usize, gate: LiquidityGate) -> bool {
    visible_distinct_money_neighbors >= gate.min_quotes
}

/// Search the integer trade block space at one fixed `price`. Returns the
/// smallest block size `d_x` in `1..=params.d_a_max` that is feasible for
/// both sides and strictly improves both parties' utility by more than
/// `params.epsilon`.
fn search_at_price(seller: &Agent, buyer: &Agent, pair_type: PairKey, price: f64, params: &Params) -> Option<TradeCandidate> {
    let eps = params.epsilon;
    let money_form = params.money_utility_form;

    let gives = pair_type.gives();
    let receives = pair_type.receives();

    for d_x in 1..=params.d_a_max {
        let d_y = round_half_up(price * d_x as f64);

        let (sa, sb, sm) = gives.delta(-d_x);
        let (sa2, sb2, sm2) = receives.delta(d_y);
        let Some(seller_next) = seller.inventory.checked_apply(sa + sa2, sb + sb2, sm + sm2) else {
            continue;
        };

        let (ba, bb, bm) = receives.delta(-d_y);
        let (ba2, bb2, bm2) = gives.delta(d_x);
        let Some(buyer_next) = buyer.inventory.checked_apply(ba + ba2, bb + bb2, bm + bm2) else {
            continue;
        };

        let seller_before = total_utility(seller.inventory, &seller.utility, seller.lambda_money, money_form, eps);
        let seller_after = total_utility(seller_next, &seller.utility, seller.lambda_money, money_form, eps);
        let buyer_before = total_utility(buyer.inventory, &buyer.utility, buyer.lambda_money, money_form, eps);
        let buyer_after = total_utility(buyer_next, &buyer.utility, buyer.lambda_money, money_form, eps);

        let seller_surplus = seller_after - seller_before;
        let buyer_surplus = buyer_after - buyer_before;
        if seller_surplus > eps && buyer_surplus > eps {
            return Some(TradeCandidate {
                pair_type,
                d_x,
                d_y,
                price,
                seller_surplus,
                buyer_surplus,
            });
        }
    }
    None
}

/// Search the integer trade space between `seller` (gives `pair_type.gives()`)
/// and `buyer` (gives `pair_type.receives()`) at three probe prices (spec
/// 4.6 step 2): `ask`, the midpoint, and `bid`. Among whichever probes find a
/// feasible, mutually-improving block, picks by highest total surplus, then
/// smaller `d_x`, then lower price (ask beats midpoint beats bid).
pub fn best_trade_for_pair(seller: &Agent, buyer: &Agent, pair_type: PairKey, params: &Params) -> Option<TradeCandidate> {
    let ask = seller.quotes.get(pair_type)?;
    let bid = buyer.quotes.get(pair_type.reverse())?;
    if ask > bid {
        return None;
    }
    let mid = 0.5 * (ask + bid);

    [ask, mid, bid]
        .into_iter()
        .enumerate()
        .filter_map(|(price_index, price)| search_at_price(seller, buyer, pair_type, price, params).map(|c| (price_index, c)))
        .min_by(|(ia, a), (ib, b)| {
            b.total_surplus()
                .partial_cmp(&a.total_surplus())
                .unwrap()
                .then(a.d_x.cmp(&b.d_x))
                .then(ia.cmp(ib))
        })
        .map(|(_, c)| c)
}

/// Evaluate every `allowed` pair type for `(lo, hi)` (`lo.id < hi.id`, `lo`
/// always plays the `pair_type.gives()` seller role) and pick the best:
/// highest total surplus, then smaller `d_x`, then lower price, then
/// money-first pair-type priority (spec 4.6).
pub fn best_trade_across_pairs(lo: &Agent, hi: &Agent, allowed: &[PairKey], params: &Params) -> Option<TradeCandidate> {
    debug_assert!(lo.id.0 < hi.id.0);
    allowed
        .iter()
        .filter_map(|&pk| best_trade_for_pair(lo, hi, pk, params))
        .min_by(|a, b| {
            b.total_surplus()
                .partial_cmp(&a.total_surplus())
                .unwrap()
                .then(a.d_x.cmp(&b.d_x))
                .then(a.price.partial_cmp(&b.price).unwrap())
                .then(a.pair_type.priority().cmp(&b.pair_type.priority()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExchangeRegime;
    use crate::quotes::{compute_quotes, QuoteInputs};
    use crate::types::{AgentId, Inventory, Position};
    use crate::utility::Utility;

    fn make_agent(id: u32, a: i64, b: i64, m: i64, utility: Utility, lambda_money: f64, params: &Params) -> Agent {
        let mut agent = Agent::new(AgentId::new(id), Position::new(0, 0), Inventory::new(a, b, m), utility, lambda_money);
        let inputs = QuoteInputs {
            a,
            b,
            m,
            utility,
            lambda_money,
            money_form: params.money_utility_form,
            spread: params.spread,
            epsilon: params.epsilon,
        };
        agent.quotes = compute_quotes(&inputs, params.exchange_regime);
        agent
    }

    #[test]
    fn barter_trade_executes_when_endowments_are_complementary() {
        let mut params = Params::default();
        params.exchange_regime = ExchangeRegime::BarterOnly;
        params.d_a_max = 3;
        let utility = Utility::Ces { rho: -0.5, w_a: 1.0, w_b: 1.0 };
        // lo is A-rich, hi is B-rich: lo should want to sell A for B.
        let lo = make_agent(0, 10, 0, 0, utility, 1.0, &params);
        let hi = make_agent(1, 0, 10, 0, utility, 1.0, &params);

        let candidate = best_trade_across_pairs(&lo, &hi, eligible_pair_types(params.exchange_regime), &params);
        let candidate = candidate.expect("complementary endowments should find a trade");
        assert_eq!(candidate.pair_type, PairKey::AtoB);
        assert!(candidate.d_x > 0);
        assert!(candidate.seller_surplus > 0.0);
        assert!(candidate.buyer_surplus > 0.0);
    }

    #[test]
    fn identical_endowments_find_no_trade() {
        let mut params = Params::default();
        params.exchange_regime = ExchangeRegime::BarterOnly;
        let utility = Utility::Ces { rho: -0.5, w_a: 1.0, w_b: 1.0 };
        let lo = make_agent(0, 5, 5, 0, utility, 1.0, &params);
        let hi = make_agent(1, 5, 5, 0, utility, 1.0, &params);
        assert!(best_trade_across_pairs(&lo, &hi, eligible_pair_types(params.exchange_regime), &params).is_none());
    }

    #[test]
    fn money_only_regime_restricts_to_monetary_pairs() {
        assert_eq!(eligible_pair_types(ExchangeRegime::MoneyOnly).len(), 4);
        assert!(eligible_pair_types(ExchangeRegime::MoneyOnly)
            .iter()
            .all(|pk| pk.is_monetary()));
    }

    #[test]
    fn liquidity_gate_blocks_below_threshold() {
        let gate = LiquidityGate { min_quotes: 3 };
        assert!(!market_is_liquid(2, gate));
        assert!(market_is_liquid(3, gate));
    }

    #[test]
    fn d_a_max_bounds_the_search() {
        let mut params = Params::default();
        params.exchange_regime = ExchangeRegime::BarterOnly;
        params.d_a_max = 1;
        let utility = Utility::Ces { rho: -0.5, w_a: 1.0, w_b: 1.0 };
        let lo = make_agent(0, 10, 0, 0, utility, 1.0, &params);
        let hi = make_agent(1, 0, 10, 0, utility, 1.0, &params);
        let candidate = best_trade_for_pair(&lo, &hi, PairKey::AtoB, &params).unwrap();
        assert_eq!(candidate.d_x, 1);
    }

    #[test]
    fn no_zone_of_agreement_yields_no_trade() {
        let mut params = Params::default();
        params.exchange_regime = ExchangeRegime::BarterOnly;
        params.spread = 0.5;
        let utility = Utility::Ces { rho: -0.5, w_a: 1.0, w_b: 1.0 };
        // Same endowments under a wide spread: ask should exceed bid.
        let lo = make_agent(0, 5, 5, 0, utility, 1.0, &params);
        let hi = make_agent(1, 5, 5, 0, utility, 1.0, &params);
        assert!(best_trade_for_pair(&lo, &hi, PairKey::AtoB, &params).is_none());
    }

    #[test]
    fn ask_probe_finds_a_trade_the_midpoint_alone_would_miss() {
        // Buyer holds only 1 unit of B, so only the d_y=1 block (the ask
        // probe's price) is feasible; the midpoint and bid probes both
        // imply d_y >= 2 and fail `checked_apply`.
        let params = Params { exchange_regime: ExchangeRegime::BarterOnly, d_a_max: 1, ..Params::default() };
        let mut seller = Agent::new(AgentId::new(0), Position::new(0, 0), Inventory::new(10, 0, 0), Utility::Linear { v_a: 1.0, v_b: 2.0 }, 1.0);
        seller.quotes.a_to_b = Some(1.0);
        let mut buyer = Agent::new(AgentId::new(1), Position::new(0, 0), Inventory::new(0, 1, 0), Utility::Linear { v_a: 3.0, v_b: 1.0 }, 1.0);
        buyer.quotes.b_to_a = Some(3.0);

        let candidate = best_trade_for_pair(&seller, &buyer, PairKey::AtoB, &params)
            .expect("the ask-price probe should still find a feasible block");
        assert_eq!(candidate.d_x, 1);
        assert_eq!(candidate.d_y, 1);
        assert_eq!(candidate.price, 1.0, "only the ask probe is feasible here");
    }
}
