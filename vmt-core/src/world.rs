//! World state container (spec 3, 6.2): the full reproducible state of one
//! scenario run, plus the one-time init-phase setup from a validated
//! [`ScenarioConfig`].

use rand::Rng;
use rand::rngs::StdRng;

use crate::agent::Agent;
use crate::config::ScenarioConfig;
use crate::controller::ModeController;
use crate::error::ConfigError;
use crate::events::{Event, EventStream};
use crate::geography::{Grid, ResourceCell};
use crate::rng::root_rng;
use crate::types::{AgentId, Commodity, Inventory};
use crate::utility::Utility;

#[derive(Debug, Clone)]
pub struct World {
    pub tick: u64,
    pub grid: Grid,
    pub agents: Vec<Agent>,
    /// Indexed by `Grid::cell_index`; `None` is bare ground.
    pub resources: Vec<Option<ResourceCell>>,
    pub controller: ModeController,
    pub events: EventStream,
    /// Total money across all agents at construction time. Unlike A/B,
    /// money is never minted by foraging or regeneration, so this total
    /// must hold for the entire run (spec 7's conservation invariant).
    pub initial_money_total: i64,
}

impl World {
    /// Build a `World` from a validated config and seed. The only two
    /// stochastic draws the in-scope core makes happen here, in fixed
    /// order: resource placement, then per-agent utility-type assignment
    /// when `utilities_mix` names more than one type (spec 6.2, 9).
    pub fn from_config(config: &ScenarioConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = root_rng(seed);
        let grid = Grid::new(config.n);
        let resources = place_resources(&grid, config.resource_seed.density, config.resource_seed.amount, &mut rng);

        let agents_count = config.agents as usize;
        let a_vals = config.initial_inventories.a.resolve(agents_count, "initial_inventories.a")?;
        let b_vals = config.initial_inventories.b.resolve(agents_count, "initial_inventories.b")?;
        let m_vals = match &config.initial_inventories.m {
            Some(m) => m.resolve(agents_count, "initial_inventories.m")?,
            None => vec![0; agents_count],
        };
        let lambda_vals = match &config.lambda_money {
            Some(l) => l.resolve(agents_count, "lambda_money")?,
            None => vec![config.params.lambda_money; agents_count],
        };
        let utilities = assign_utilities(config, agents_count, &mut rng);

        let agents = (0..agents_count)
            .map(|i| {
                Agent::new(
                    AgentId::new(i as u32),
                    grid.position_of(i % grid.cell_count()),
                    Inventory::new(a_vals[i], b_vals[i], m_vals[i]),
                    utilities[i],
                    lambda_vals[i],
                )
            })
            .collect();

        let initial_money_total = agents.iter().map(|a| a.inventory.m).sum();

        Ok(Self {
            tick: 0,
            grid,
            agents,
            resources,
            controller: ModeController::new(config.mode_schedule),
            events: EventStream::default(),
            initial_money_total,
        })
    }

    /// Build a point-in-time `AgentSnapshot` for every agent (spec 6.3).
    /// Collaborators call this on whatever cadence they want; the scheduler
    /// never calls it itself.
    pub fn snapshot_agents(&self) -> Vec<Event> {
        self.agents
            .iter()
            .map(|agent| Event::AgentSnapshot {
                tick: self.tick,
                agent_id: agent.id,
                pos: agent.pos,
                inventory: agent.inventory,
                utility_type: agent.utility.type_name(),
                lambda: agent.lambda_money,
                quotes: agent.quotes,
            })
            .collect()
    }

    /// Build a point-in-time `ResourceSnapshot` for every occupied cell
    /// (spec 6.3). Same on-demand cadence contract as `snapshot_agents`.
    pub fn snapshot_resources(&self) -> Vec<Event> {
        self.resources
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| {
                let cell = (*cell)?;
                Some(Event::ResourceSnapshot {
                    tick: self.tick,
                    cell: self.grid.position_of(index),
                    kind: cell.kind,
                    amount: cell.amount,
                })
            })
            .collect()
    }
}

fn place_resources(grid: &Grid, density: f64, amount: i64, rng: &mut StdRng) -> Vec<Option<ResourceCell>> {
    (0..grid.cell_count())
        .map(|_| {
            let present: f64 = rng.random();
            if present >= density {
                return None;
            }
            let kind_draw: f64 = rng.random();
            let kind = if kind_draw < 0.5 { Commodity::A } else { Commodity::B };
            Some(ResourceCell::new(kind, amount))
        })
        .collect()
}

fn assign_utilities(config: &ScenarioConfig, agents_count: usize, rng: &mut StdRng) -> Vec<Utility> {
    if config.utilities_mix.len() == 1 {
        return vec![config.utilities_mix[0].utility; agents_count];
    }
    let total: f64 = config.utilities_mix.iter().map(|e| e.weight).sum();
    (0..agents_count)
        .map(|_| {
            let draw: f64 = rng.random::<f64>() * total;
            let mut acc = 0.0;
            for entry in &config.utilities_mix {
                acc += entry.weight;
                if draw < acc {
                    return entry.utility;
                }
            }
            config.utilities_mix.last().unwrap().utility
        })
        .collect()
}
