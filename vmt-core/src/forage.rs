//! Forage and Regeneration phases (spec 4.7), operating on the grid's
//! resource cells and each agent's `Target::Forage`.

use crate::agent::{Agent, Target};
use crate::config::Params;
use crate::events::{Event, EventStream};
use crate::geography::{Grid, ResourceCell};

/// Harvest phase: among agents whose `Target::Forage(pos)` points at the
/// same cell and who are standing on it this tick, only the lowest agent id
/// harvests (spec 4.7's single-harvester rule), bounded by `forage_rate`.
pub fn apply_harvest(agents: &mut [Agent], resources: &mut [Option<ResourceCell>], grid: &Grid, params: &Params, tick: u64, events: &mut EventStream) {
    let mut arrived_by_cell: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
    for (i, agent) in agents.iter().enumerate() {
        let Target::Forage(pos) = agent.target else { continue };
        if agent.pos != pos || !grid.in_bounds(pos) {
            continue;
        }
        arrived_by_cell.entry(grid.cell_index(pos)).or_default().push(i);
    }

    for (cell_index, mut indices) in arrived_by_cell {
        let Some(cell) = resources[cell_index].as_mut() else { continue };
        if cell.amount <= 0 {
            continue;
        }
        indices.sort_by_key(|&i| agents[i].id);
        let harvesters: &[usize] = if params.enforce_single_harvester {
            &indices[..1]
        } else {
            &indices[..]
        };
        for &i in harvesters {
            let taken = cell.harvest(params.forage_rate, tick);
            if taken == 0 {
                break;
            }
            let kind = cell.kind;
            let (d_a, d_b) = match kind {
                crate::types::Commodity::A => (taken, 0),
                crate::types::Commodity::B => (0, taken),
            };
            agents[i].apply_trade(d_a, d_b, 0);
            events.push(Event::Harvest {
                tick,
                agent_id: agents[i].id,
                cell: grid.position_of(cell_index),
                kind,
                amount: taken,
            });
        }
    }
}

/// Regeneration phase: every cell regrows independently of agent activity.
pub fn apply_regeneration(resources: &mut [Option<ResourceCell>], grid: &Grid, params: &Params, tick: u64, events: &mut EventStream) {
    for (index, slot) in resources.iter_mut().enumerate() {
        let Some(cell) = slot.as_mut() else { continue };
        let before = cell.amount;
        cell.regenerate(tick, params.resource_growth_rate, params.resource_max_amount, params.resource_regen_cooldown);
        if cell.amount != before {
            events.push(Event::Regen {
                tick,
                cell: grid.position_of(index),
                delta: cell.amount - before,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Commodity, Inventory, Position};
    use crate::utility::Utility;

    fn agent_at(id: u32, x: i32, y: i32, target: Target) -> Agent {
        let mut a = Agent::new(
            crate::types::AgentId::new(id),
            Position::new(x, y),
            Inventory::new(0, 0, 0),
            Utility::Linear { v_a: 1.0, v_b: 1.0 },
            1.0,
        );
        a.target = target;
        a
    }

    #[test]
    fn single_harvester_rule_picks_lowest_id() {
        let grid = Grid::new(4);
        let mut resources = vec![None; grid.cell_count()];
        let pos = Position::new(1, 1);
        resources[grid.cell_index(pos)] = Some(ResourceCell::new(Commodity::A, 5));
        let mut agents = vec![
            agent_at(2, 1, 1, Target::Forage(pos)),
            agent_at(0, 1, 1, Target::Forage(pos)),
            agent_at(1, 1, 1, Target::Forage(pos)),
        ];
        let params = Params {
            forage_rate: 1,
            enforce_single_harvester: true,
            ..Params::default()
        };
        let mut events = EventStream::default();
        apply_harvest(&mut agents, &mut resources, &grid, &params, 0, &mut events);
        assert_eq!(agents[0].inventory.a, 0); // id 2
        assert_eq!(agents[1].inventory.a, 1); // id 0, lowest, harvests
        assert_eq!(agents[2].inventory.a, 0); // id 1
    }

    #[test]
    fn harvest_only_counts_agents_standing_on_the_cell() {
        let grid = Grid::new(4);
        let mut resources = vec![None; grid.cell_count()];
        let pos = Position::new(1, 1);
        resources[grid.cell_index(pos)] = Some(ResourceCell::new(Commodity::A, 5));
        let mut agents = vec![agent_at(0, 2, 2, Target::Forage(pos))];
        let params = Params::default();
        let mut events = EventStream::default();
        apply_harvest(&mut agents, &mut resources, &grid, &params, 0, &mut events);
        assert_eq!(agents[0].inventory.a, 0);
    }

    #[test]
    fn regeneration_emits_an_event_only_on_change() {
        let grid = Grid::new(4);
        let mut resources = vec![None; grid.cell_count()];
        let pos = Position::new(0, 0);
        resources[grid.cell_index(pos)] = Some(ResourceCell::new(Commodity::A, 2));
        let params = Params {
            resource_growth_rate: 1,
            resource_max_amount: 5,
            ..Params::default()
        };
        let mut events = EventStream::default();
        apply_regeneration(&mut resources, &grid, &params, 3, &mut events);
        assert_eq!(events.as_slice().len(), 1);
        assert!(matches!(events.as_slice()[0], Event::Regen { delta: 1, .. }));
    }
}
