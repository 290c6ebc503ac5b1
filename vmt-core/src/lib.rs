//! A deterministic agent-based economic simulation.
//!
//! Agents live on a bounded grid, hold inventories of two commodities and
//! money, and each tick run through a fixed-order pipeline:
//!
//! 1. **Perception** — build each agent's bounded local view of neighbors
//!    and resource cells.
//! 2. **Decision** — pick a trading partner or a forage target.
//! 3. **Movement** — step one cell toward the chosen target.
//! 4. **Trade** — bargain block-by-block with a paired partner until no
//!    more mutually-improving trade exists.
//! 5. **Forage** — harvest from the cell an agent is standing on.
//! 6. **Regeneration** — resource cells regrow.
//! 7. **Housekeeping** — refresh stale quotes, advance cooldowns.
//!
//! A [`controller::ModeController`] gates which of Trade/Forage run on a
//! given tick, and an [`config::ExchangeRegime`] gates which commodity
//! pairs agents are allowed to quote and trade.
//!
//! ## Module Structure
//!
//! - `types`       Core value types: IDs, positions, inventories, pair keys
//! - `error`       Config and invariant error types
//! - `utility`     Utility functions and reservation-price derivation
//! - `quotes`      Bid/ask quote derivation from utility and inventory
//! - `config`      Scenario configuration and validation
//! - `agent`       The `Agent` aggregate and its per-tick flags
//! - `geography`   The grid and its resource cells
//! - `rng`         Deterministic RNG construction
//! - `events`      The structured event stream emitted by a run
//! - `controller`  Mode × regime scheduling
//! - `perception`  Bounded local views built each tick
//! - `decision`    Partner selection and forage targeting
//! - `matching`    Bilateral bargaining and integer trade search
//! - `movement`    Deterministic single-step movement toward a target
//! - `forage`      Harvest and regeneration phases
//! - `trade`       Trade-phase bargaining execution
//! - `world`       World state container and scenario construction
//! - `tick`        Full tick orchestration

pub mod agent;
pub mod config;
pub mod controller;
pub mod decision;
pub mod error;
pub mod events;
pub mod forage;
pub mod geography;
#[cfg(feature = "instrument")]
pub use instrument;
pub mod matching;
pub mod movement;
pub mod perception;
pub mod quotes;
pub mod rng;
pub mod tick;
pub mod trade;
pub mod types;
pub mod utility;
pub mod world;

// Core types
pub use types::{
    AgentId, Commodity, CommodityOrMoney, Inventory, PairId, PairKey, Position, round_half_up,
};

// Errors
pub use error::{ConfigError, InvariantError, VmtError};

// Utility and quotes
pub use quotes::{Quotes, QuoteInputs, compute_quotes, refresh_if_stale};
pub use utility::{MoneyUtilityForm, Utility, total_utility};

// Configuration
pub use config::{
    ExchangeRegime, InitialInventories, LambdaBounds, LiquidityGate, ModeSchedule, MoneyMode,
    Params, ResourceSeed, ScalarOrList, ScenarioConfig, StartMode, UtilityMixEntry,
};

// Agent
pub use agent::{Agent, Target};

// Geography
pub use geography::{Grid, ResourceCell};

// RNG
pub use rng::{root_rng, substream};

// Events
pub use events::{Event, EventStream, PairReason, TradeStatus, UnpairReason};

// Controller
pub use controller::{Mode, ModeController};

// Perception
pub use perception::{LocalView, VisibleAgent, VisibleResource, build_views};

// Decision
pub use decision::{ClaimLedger, DecisionOutcome, decide};

// Matching
pub use matching::{
    TradeCandidate, best_trade_across_pairs, best_trade_for_pair, eligible_pair_types,
    market_is_liquid,
};

// Movement
pub use movement::apply_movement;

// Forage
pub use forage::{apply_harvest, apply_regeneration};

// Trade
pub use trade::run_trade_phase;

// World
pub use world::World;

// Tick
pub use tick::{run, step};
