//! Error taxonomy for the simulation core.
//!
//! Only genuinely fatal conditions are modeled as errors here. Bargaining
//! failure, absent targets, and claim conflicts are expected control flow and
//! are represented as ordinary enum variants elsewhere, never as `Result::Err`.

use thiserror::Error;

/// Raised while validating a `ScenarioConfig`, before any agent exists.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("field '{field}' must be {constraint}, got {actual}")]
    OutOfRange {
        field: &'static str,
        constraint: &'static str,
        actual: String,
    },

    #[error("utilities.mix weights must sum to 1.0 +/- 1e-6, got {actual}")]
    WeightsNotNormalized { actual: f64 },

    #[error("CES utility requires rho != 1, got rho = {rho}")]
    CesRhoEqualsOne { rho: f64 },

    #[error(
        "Stone-Geary utility requires initial inventories strictly above subsistence (A={a}, gamma_a={gamma_a}, B={b}, gamma_b={gamma_b}) for agent {agent}"
    )]
    StoneGearySubsistenceViolated {
        agent: u32,
        a: i64,
        gamma_a: f64,
        b: i64,
        gamma_b: f64,
    },

    #[error("exchange_regime '{0}' requires M in initial_inventories")]
    MonetaryRegimeMissingMoney(&'static str),

    #[error("list field '{field}' has length {actual}, expected {expected} (== agents)")]
    ListLengthMismatch {
        field: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("money_mode '{0}' is not implemented; only 'quasilinear' is accepted")]
    UnimplementedMoneyMode(String),
}

/// A conservation or non-negativity violation discovered mid-run. Always a bug;
/// never recovered. The run aborts.
#[derive(Debug, Error, PartialEq)]
pub enum InvariantError {
    #[error("tick {tick} phase {phase}: good {good:?} total {actual} != expected {expected}")]
    ConservationViolated {
        tick: u64,
        phase: &'static str,
        good: crate::types::CommodityOrMoney,
        actual: i64,
        expected: i64,
    },

    #[error("tick {tick} phase {phase}: agent {agent} has negative inventory {kind:?} = {amount}")]
    NegativeInventory {
        tick: u64,
        phase: &'static str,
        agent: u32,
        kind: crate::types::CommodityOrMoney,
        amount: i64,
    },

    #[error("tick {tick} phase {phase}: agent {agent} is paired with both {other_a} and {other_b}")]
    DoublePairing {
        tick: u64,
        phase: &'static str,
        agent: u32,
        other_a: u32,
        other_b: u32,
    },

    #[error(
        "tick {tick}: Stone-Geary agent {agent} fell to or below subsistence (kind={kind:?}, amount={amount}, gamma={gamma})"
    )]
    SubsistenceViolated {
        tick: u64,
        agent: u32,
        kind: crate::types::Commodity,
        amount: i64,
        gamma: f64,
    },
}

/// Top-level error returned from scheduler entry points.
#[derive(Debug, Error)]
pub enum VmtError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),
}
