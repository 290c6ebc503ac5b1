//! Resource cells: harvest and regeneration (spec 4.7).

use crate::types::Commodity;

/// A single spatial resource deposit. Cell identity is its grid coordinate;
/// the cell itself is permanent, only `amount` and `depleted_at_tick`
/// fluctuate under harvest and regrowth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceCell {
    pub kind: Commodity,
    pub amount: i64,
    pub depleted_at_tick: Option<u64>,
}

impl ResourceCell {
    pub fn new(kind: Commodity, amount: i64) -> Self {
        Self {
            kind,
            amount,
            depleted_at_tick: None,
        }
    }

    /// Harvest up to `rate` units, bounded by what the cell holds. Returns
    /// the amount actually harvested.
    pub fn harvest(&mut self, rate: i64, tick: u64) -> i64 {
        let taken = rate.min(self.amount).max(0);
        self.amount -= taken;
        if self.amount == 0 && taken > 0 {
            self.depleted_at_tick = Some(tick);
        }
        taken
    }

    /// Grow by `growth_rate`, capped at `max_amount`, unless still inside
    /// the post-depletion cooldown window.
    pub fn regenerate(&mut self, tick: u64, growth_rate: i64, max_amount: i64, cooldown: u32) {
        if let Some(depleted_at) = self.depleted_at_tick {
            if tick < depleted_at + cooldown as u64 {
                return;
            }
            self.depleted_at_tick = None;
        }
        if self.amount > 0 {
            self.amount = (self.amount + growth_rate).min(max_amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harvest_is_bounded_by_available_amount() {
        let mut cell = ResourceCell::new(Commodity::A, 2);
        assert_eq!(cell.harvest(5, 0), 2);
        assert_eq!(cell.amount, 0);
        assert_eq!(cell.depleted_at_tick, Some(0));
    }

    #[test]
    fn regeneration_respects_cooldown_then_resumes() {
        let mut cell = ResourceCell::new(Commodity::A, 3);
        cell.harvest(3, 10); // depletes at tick 10, cooldown 5 means stays 0 through tick 14
        for tick in 11..15 {
            cell.regenerate(tick, 1, 5, 5);
            assert_eq!(cell.amount, 0, "cell should stay depleted through cooldown at tick {tick}");
        }
        cell.regenerate(15, 1, 5, 5);
        assert_eq!(cell.amount, 1, "cell should resume growth after cooldown");
        cell.regenerate(16, 1, 5, 5);
        assert_eq!(cell.amount, 2);
    }

    #[test]
    fn regeneration_caps_at_max_amount() {
        let mut cell = ResourceCell::new(Commodity::A, 4);
        cell.regenerate(0, 3, 5, 5);
        assert_eq!(cell.amount, 5);
    }

    #[test]
    fn cell_at_zero_without_depletion_marker_does_not_grow() {
        // A cell seeded at amount = 0 never harvested should stay fallow,
        // matching the amount > 0 guard rather than treating 0 as "just depleted".
        let mut cell = ResourceCell::new(Commodity::A, 0);
        cell.regenerate(0, 1, 5, 5);
        assert_eq!(cell.amount, 0);
    }
}
