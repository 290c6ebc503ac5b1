//! Perception phase (spec 4.4): builds an immutable per-agent snapshot of
//! what that agent can act on this tick. Built once at phase start from the
//! previous tick's settled state; nothing later in the tick mutates it.

use crate::agent::Agent;
use crate::config::Params;
use crate::geography::{Grid, ResourceCell};
use crate::types::{AgentId, Inventory, Position};
use crate::quotes::Quotes;
use crate::utility::Utility;

/// One visible neighbor as of perception time: just enough to rank and
/// target a partner without re-reading `World` during Decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleAgent {
    pub id: AgentId,
    pub pos: Position,
    pub quotes: Quotes,
    pub inventory: Inventory,
    pub utility: Utility,
    pub lambda_money: f64,
    pub is_paired: bool,
}

impl VisibleAgent {
    /// Rebuild a standalone [`Agent`] from this frozen snapshot, for feeding
    /// into [`crate::matching`]'s price search without touching the live
    /// (possibly already-mutated-this-tick) agent state.
    pub fn as_probe_agent(&self) -> Agent {
        let mut probe = Agent::new(self.id, self.pos, self.inventory, self.utility, self.lambda_money);
        probe.quotes = self.quotes;
        probe
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleResource {
    pub pos: Position,
    pub cell: ResourceCell,
}

/// Immutable snapshot of one agent's local world, built at the start of a
/// tick and read (never mutated) by Decision and Movement.
#[derive(Debug, Clone)]
pub struct LocalView {
    pub self_id: AgentId,
    pub self_pos: Position,
    pub self_inventory: Inventory,
    pub visible_agents: Vec<VisibleAgent>,
    pub visible_resources: Vec<VisibleResource>,
}

impl LocalView {
    pub fn other(&self, id: AgentId) -> Option<&VisibleAgent> {
        self.visible_agents.iter().find(|a| a.id == id)
    }
}

/// Build every agent's [`LocalView`] for the current tick. `resources` maps
/// grid index (`Grid::cell_index`) to the cell occupying it; absent entries
/// are treated as empty ground.
pub fn build_views(
    agents: &[Agent],
    grid: &Grid,
    resources: &[Option<ResourceCell>],
    params: &Params,
) -> Vec<LocalView> {
    agents
        .iter()
        .map(|agent| build_view(agent, agents, grid, resources, params))
        .collect()
}

fn build_view(
    agent: &Agent,
    agents: &[Agent],
    grid: &Grid,
    resources: &[Option<ResourceCell>],
    params: &Params,
) -> LocalView {
    let mut visible_agents: Vec<VisibleAgent> = agents
        .iter()
        .filter(|other| other.id != agent.id)
        .filter(|other| agent.pos.manhattan_distance(other.pos) <= params.vision_radius)
        .map(|other| VisibleAgent {
            id: other.id,
            pos: other.pos,
            quotes: other.quotes,
            inventory: other.inventory,
            utility: other.utility,
            lambda_money: other.lambda_money,
            is_paired: other.is_paired(),
        })
        .collect();
    visible_agents.sort_by_key(|a| a.id);

    let visible_resources = grid
        .positions_within(agent.pos, params.vision_radius)
        .into_iter()
        .filter_map(|pos| {
            let cell = resources[grid.cell_index(pos)]?;
            (cell.amount > 0).then_some(VisibleResource { pos, cell })
        })
        .collect();

    LocalView {
        self_id: agent.id,
        self_pos: agent.pos,
        self_inventory: agent.inventory,
        visible_agents,
        visible_resources,
    }
}
