//! The outbound event stream (spec 6.3). The authoritative record of a run;
//! any persisted schema a collaborator builds is a projection of this.

use crate::config::ExchangeRegime;
use crate::controller::Mode;
use crate::quotes::Quotes;
use crate::types::{AgentId, Commodity, Inventory, PairKey, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Executed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpairReason {
    TradeFailed,
    ModeSwitch,
    DistanceLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairReason {
    PartnerSelected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    TickStarted {
        tick: u64,
        mode: Mode,
        regime: ExchangeRegime,
        active_pairs: usize,
    },
    /// Periodic or on-demand telemetry (spec 6.3): a collaborator calls
    /// [`crate::world::World::snapshot_agents`] whenever it wants a
    /// point-in-time read of agent state; the scheduler never emits this on
    /// its own cadence.
    AgentSnapshot {
        tick: u64,
        agent_id: AgentId,
        pos: Position,
        inventory: Inventory,
        utility_type: &'static str,
        lambda: f64,
        quotes: Quotes,
    },
    /// Periodic or on-demand telemetry (spec 6.3), the resource-cell
    /// counterpart to `AgentSnapshot`; see
    /// [`crate::world::World::snapshot_resources`].
    ResourceSnapshot {
        tick: u64,
        cell: Position,
        kind: Commodity,
        amount: i64,
    },
    Pairing {
        tick: u64,
        a: AgentId,
        b: AgentId,
        reason: PairReason,
    },
    Unpairing {
        tick: u64,
        a: AgentId,
        b: AgentId,
        reason: UnpairReason,
    },
    TradeAttempt {
        tick: u64,
        a: AgentId,
        b: AgentId,
        pair_type: PairKey,
        price: f64,
        d_x: i64,
        d_y: i64,
        status: TradeStatus,
    },
    Trade {
        tick: u64,
        buyer: AgentId,
        seller: AgentId,
        pair_type: PairKey,
        d_a: i64,
        d_b: i64,
        d_m: i64,
        price: f64,
        surplus_buyer: f64,
        surplus_seller: f64,
    },
    Harvest {
        tick: u64,
        agent_id: AgentId,
        cell: Position,
        kind: Commodity,
        amount: i64,
    },
    Regen {
        tick: u64,
        cell: Position,
        delta: i64,
    },
    TickFinished {
        tick: u64,
    },
}

/// Append-only, in-order record of every event emitted this run. Phase
/// handlers push directly to it; order of pushes is the event order.
#[derive(Debug, Clone, Default)]
pub struct EventStream {
    events: Vec<Event>,
}

impl EventStream {
    pub fn push(&mut self, event: Event) {
        #[cfg(feature = "instrument")]
        emit_tracing(&event);
        self.events.push(event);
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(feature = "instrument")]
fn emit_tracing(event: &Event) {
    match *event {
        Event::Trade {
            tick,
            buyer,
            seller,
            price,
            d_a,
            d_b,
            d_m,
            ..
        } => tracing::info!(
            target: "trade",
            tick,
            buyer = buyer.0,
            seller = seller.0,
            price,
            d_a,
            d_b,
            d_m
        ),
        Event::Pairing { tick, a, b, .. } => {
            tracing::info!(target: "pairing", tick, a = a.0, b = b.0)
        }
        Event::Harvest {
            tick,
            agent_id,
            amount,
            ..
        } => tracing::info!(target: "harvest", tick, agent_id = agent_id.0, amount),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_and_preserves_order() {
        let mut stream = EventStream::default();
        stream.push(Event::TickFinished { tick: 0 });
        stream.push(Event::TickFinished { tick: 1 });
        let drained = stream.drain();
        assert_eq!(drained.len(), 2);
        assert!(stream.as_slice().is_empty());
    }
}
