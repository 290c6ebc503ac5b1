//! Bid/ask quote derivation across the six exchange pairs (spec 4.3).

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::config::{ExchangeRegime, Params};
use crate::types::PairKey;
use crate::utility::{MoneyUtilityForm, Utility};

/// Strongly-typed replacement for a `dict[str, float]` quote map (spec 9):
/// optional fields encode pair inactivity without a runtime map lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quotes {
    pub a_to_b: Option<f64>,
    pub b_to_a: Option<f64>,
    pub a_to_m: Option<f64>,
    pub m_to_a: Option<f64>,
    pub b_to_m: Option<f64>,
    pub m_to_b: Option<f64>,
}

impl Quotes {
    pub fn get(&self, pair: PairKey) -> Option<f64> {
        match pair {
            PairKey::AtoB => self.a_to_b,
            PairKey::BtoA => self.b_to_a,
            PairKey::AtoM => self.a_to_m,
            PairKey::MtoA => self.m_to_a,
            PairKey::BtoM => self.b_to_m,
            PairKey::MtoB => self.m_to_b,
        }
    }

    fn set(&mut self, pair: PairKey, value: Option<f64>) {
        match pair {
            PairKey::AtoB => self.a_to_b = value,
            PairKey::BtoA => self.b_to_a = value,
            PairKey::AtoM => self.a_to_m = value,
            PairKey::MtoA => self.m_to_a = value,
            PairKey::BtoM => self.b_to_m = value,
            PairKey::MtoB => self.m_to_b = value,
        }
    }

    /// How many distinct monetary pair quotes are active, used by the
    /// liquidity-gated regime (spec 4.6, Open Question on "distinct quotes").
    pub fn monetary_quote_count(&self) -> usize {
        [self.a_to_m, self.m_to_a, self.b_to_m, self.m_to_b]
            .iter()
            .filter(|q| q.is_some())
            .count()
    }
}

/// Inputs needed to derive one agent's quote map. Plain data, no agent
/// storage coupling, so quote derivation is independently testable.
pub struct QuoteInputs {
    pub a: i64,
    pub b: i64,
    pub m: i64,
    pub utility: Utility,
    pub lambda_money: f64,
    pub money_form: MoneyUtilityForm,
    pub spread: f64,
    pub epsilon: f64,
}

/// Compute the quote map active under `regime` for one agent.
///
/// Each of the three commodity relations (A-B, A-M, B-M) has one canonical
/// price axis ("B per A", "M per A", "M per B"): `ask_X_in_Y` is this agent's
/// minimum to give up X for Y, `bid_X_in_Y` its maximum to give up Y for X.
/// Both of a relation's `PairKey`s read off the *same* axis — `a_to_b` is
/// this agent as a prospective seller of A, `b_to_a` the same agent as a
/// prospective buyer of A (paying in B) — so matching never needs to
/// reciprocate a unit: `ask_seller = seller.quotes.get(pk)`, `bid_buyer =
/// buyer.quotes.get(pk.reverse())`.
pub fn compute_quotes(inputs: &QuoteInputs, regime: ExchangeRegime) -> Quotes {
    let mut quotes = Quotes::default();
    let a = inputs.a as f64;
    let b = inputs.b as f64;
    let m = inputs.m as f64;
    let eps = inputs.epsilon;

    let barter_active = regime.allows_barter();
    let money_active = regime.allows_money();

    if barter_active {
        let (p_min, p_max) = inputs.utility.reservation_bounds_a_in_b(a, b, eps);
        let ask_a_in_b = p_min * (1.0 + inputs.spread);
        let bid_a_in_b = p_max * (1.0 - inputs.spread);
        quotes.set(PairKey::AtoB, Some(ask_a_in_b));
        quotes.set(PairKey::BtoA, Some(bid_a_in_b));
    }

    if money_active {
        let f_prime = inputs.money_form.marginal(m, eps);
        let denom = (inputs.lambda_money * f_prime).max(eps);

        let mu_a = inputs.utility.mu_a(a, b, eps);
        let p_a_star = mu_a / denom;
        let ask_a_in_m = p_a_star * (1.0 + inputs.spread);
        let bid_a_in_m = p_a_star * (1.0 - inputs.spread);
        quotes.set(PairKey::AtoM, Some(ask_a_in_m));
        quotes.set(PairKey::MtoA, Some(bid_a_in_m));

        let mu_b = inputs.utility.mu_b(a, b, eps);
        let p_b_star = mu_b / denom;
        let ask_b_in_m = p_b_star * (1.0 + inputs.spread);
        let bid_b_in_m = p_b_star * (1.0 - inputs.spread);
        quotes.set(PairKey::BtoM, Some(ask_b_in_m));
        quotes.set(PairKey::MtoB, Some(bid_b_in_m));
    }

    quotes
}

/// Recompute `agent`'s quotes in place if its inventory or `lambda_money`
/// changed since the last refresh (Housekeeping, spec 4.1); a no-op
/// otherwise, so repeated calls within a tick stay cheap.
pub fn refresh_if_stale(agent: &mut Agent, regime: ExchangeRegime, params: &Params) {
    if !agent.inventory_changed && !agent.lambda_changed {
        return;
    }
    let inputs = QuoteInputs {
        a: agent.inventory.a,
        b: agent.inventory.b,
        m: agent.inventory.m,
        utility: agent.utility,
        lambda_money: agent.lambda_money,
        money_form: params.money_utility_form,
        spread: params.spread,
        epsilon: params.epsilon,
    };
    agent.quotes = compute_quotes(&inputs, regime);
    agent.inventory_changed = false;
    agent.lambda_changed = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_inputs() -> QuoteInputs {
        QuoteInputs {
            a: 5,
            b: 5,
            m: 10,
            utility: Utility::Linear { v_a: 2.0, v_b: 1.0 },
            lambda_money: 1.0,
            money_form: MoneyUtilityForm::Linear,
            spread: 0.0,
            epsilon: crate::utility::DEFAULT_EPSILON,
        }
    }

    #[test]
    fn zero_spread_makes_ask_and_bid_coincide() {
        let inputs = base_inputs();
        let quotes = compute_quotes(&inputs, ExchangeRegime::MoneyOnly);
        assert!((quotes.a_to_m.unwrap() - quotes.m_to_a.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn barter_only_leaves_money_pairs_inactive() {
        let inputs = base_inputs();
        let quotes = compute_quotes(&inputs, ExchangeRegime::BarterOnly);
        assert!(quotes.a_to_m.is_none());
        assert!(quotes.a_to_b.is_some());
    }

    #[test]
    fn monetary_quote_count_matches_active_pairs() {
        let inputs = base_inputs();
        let quotes = compute_quotes(&inputs, ExchangeRegime::Mixed);
        assert_eq!(quotes.monetary_quote_count(), 4);
    }
}
