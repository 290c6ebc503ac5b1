//! Agent state (spec 3).

use std::collections::HashMap;

use crate::quotes::Quotes;
use crate::types::{AgentId, Inventory, Position};
use crate::utility::Utility;

/// What an agent is currently pursuing: nothing, a trading partner, or a
/// resource cell to forage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    None,
    Partner(AgentId),
    Forage(Position),
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub pos: Position,
    pub inventory: Inventory,
    pub utility: Utility,
    pub lambda_money: f64,
    pub quotes: Quotes,
    pub paired_with: Option<AgentId>,
    pub target: Target,
    /// Ticks remaining before this agent may re-target a given partner,
    /// keyed by the other agent's id.
    pub cooldowns: HashMap<AgentId, u32>,
    pub inventory_changed: bool,
    pub lambda_changed: bool,
}

impl Agent {
    pub fn new(id: AgentId, pos: Position, inventory: Inventory, utility: Utility, lambda_money: f64) -> Self {
        Self {
            id,
            pos,
            inventory,
            utility,
            lambda_money,
            quotes: Quotes::default(),
            paired_with: None,
            target: Target::None,
            cooldowns: HashMap::new(),
            inventory_changed: true,
            lambda_changed: true,
        }
    }

    pub fn is_paired(&self) -> bool {
        self.paired_with.is_some()
    }

    pub fn is_on_cooldown_with(&self, other: AgentId) -> bool {
        self.cooldowns.get(&other).is_some_and(|&t| t > 0)
    }

    pub fn start_cooldown_with(&mut self, other: AgentId, ticks: u32) {
        if ticks > 0 {
            self.cooldowns.insert(other, ticks);
        }
    }

    /// Decrement all cooldowns by one tick and drop any that expire.
    pub fn tick_cooldowns(&mut self) {
        self.cooldowns.retain(|_, ticks| {
            *ticks -= 1;
            *ticks > 0
        });
    }

    pub fn apply_trade(&mut self, d_a: i64, d_b: i64, d_m: i64) -> Option<()> {
        let next = self.inventory.checked_apply(d_a, d_b, d_m)?;
        if next != self.inventory {
            self.inventory = next;
            self.inventory_changed = true;
        }
        Some(())
    }

    pub fn total_utility(&self, money_form: crate::utility::MoneyUtilityForm, eps: f64) -> f64 {
        crate::utility::total_utility(self.inventory, &self.utility, self.lambda_money, money_form, eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_agent(id: u32) -> Agent {
        Agent::new(
            AgentId::new(id),
            Position::new(0, 0),
            Inventory::new(5, 5, 0),
            Utility::Linear { v_a: 1.0, v_b: 1.0 },
            1.0,
        )
    }

    #[test]
    fn cooldown_expires_after_configured_ticks() {
        let mut agent = test_agent(0);
        let other = AgentId::new(1);
        agent.start_cooldown_with(other, 2);
        assert!(agent.is_on_cooldown_with(other));
        agent.tick_cooldowns();
        assert!(agent.is_on_cooldown_with(other));
        agent.tick_cooldowns();
        assert!(!agent.is_on_cooldown_with(other));
    }

    #[test]
    fn apply_trade_rejects_negative_result() {
        let mut agent = test_agent(0);
        assert!(agent.apply_trade(-10, 0, 0).is_none());
        assert_eq!(agent.inventory.a, 5);
    }

    #[test]
    fn apply_trade_sets_inventory_changed_only_on_real_change() {
        let mut agent = test_agent(0);
        agent.inventory_changed = false;
        agent.apply_trade(0, 0, 0);
        assert!(!agent.inventory_changed);
        agent.apply_trade(1, 0, 0);
        assert!(agent.inventory_changed);
    }
}
