//! Movement phase (spec 4.8): one deterministic step per agent toward its
//! `Target`, bounded by `move_budget_per_tick` and the grid's walls.
//! Co-location is always allowed (no occupancy exclusion).

use crate::agent::{Agent, Target};
use crate::config::Params;
use crate::geography::Grid;
use crate::types::Position;

/// Single-axis step reducing `|dx|`/`|dy|` toward zero: whichever axis has
/// the larger remaining gap moves first; ties move `x` before `y`; either
/// way the step is toward the target (never overshoots it), so direction
/// ambiguity ("prefer negative") only arises when the gap on the chosen axis
/// is already zero, in which case that axis contributes no step at all.
fn step_toward(from: Position, to: Position) -> Position {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return from;
    }
    if dx.abs() >= dy.abs() {
        Position::new(from.x + dx.signum(), from.y)
    } else {
        Position::new(from.x, from.y + dy.signum())
    }
}

fn target_position(agent: &Agent, agents: &[Agent]) -> Option<Position> {
    match agent.target {
        Target::None => None,
        Target::Forage(pos) => Some(pos),
        Target::Partner(id) => agents.iter().find(|a| a.id == id).map(|a| a.pos),
    }
}

/// Move every agent up to `move_budget_per_tick` steps toward its target.
/// Reads target positions from a snapshot of pre-movement positions, so a
/// partner's own movement this tick never perturbs another agent's step.
pub fn apply_movement(agents: &mut [Agent], grid: &Grid, params: &Params) {
    let pre_move: Vec<Agent> = agents.to_vec();
    for agent in agents.iter_mut() {
        let Some(goal) = target_position(agent, &pre_move) else {
            continue;
        };
        for _ in 0..params.move_budget_per_tick {
            if agent.pos == goal {
                break;
            }
            let stepped = step_toward(agent.pos, goal);
            agent.pos = grid.clamp(stepped);
        }
    }
}
