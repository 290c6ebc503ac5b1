//! Core scalar and identifier types shared across every phase.

use serde::{Deserialize, Serialize};

/// Stable agent identifier, assigned `0..N-1` at init and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Integer grid position on the `N x N` board. Edges are walls; no wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Which of the two tradeable goods a cell or balance refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Commodity {
    A,
    B,
}

/// Non-negative integer holdings of goods A, B and money M (minor units).
///
/// Mutation is exclusive to phase handlers; callers use the checked
/// `try_*` helpers so a negative result surfaces as a caller bug, never a
/// silent wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub a: i64,
    pub b: i64,
    pub m: i64,
}

impl Inventory {
    pub const fn new(a: i64, b: i64, m: i64) -> Self {
        Self { a, b, m }
    }

    pub fn get(self, kind: Commodity) -> i64 {
        match kind {
            Commodity::A => self.a,
            Commodity::B => self.b,
        }
    }

    pub fn is_non_negative(self) -> bool {
        self.a >= 0 && self.b >= 0 && self.m >= 0
    }

    /// Apply a trade's signed deltas, returning `None` if any component would
    /// go negative (callers treat that as infeasible, never as a panic).
    pub fn checked_apply(self, d_a: i64, d_b: i64, d_m: i64) -> Option<Inventory> {
        let next = Inventory {
            a: self.a + d_a,
            b: self.b + d_b,
            m: self.m + d_m,
        };
        next.is_non_negative().then_some(next)
    }
}

/// One of the six directed exchange pairs an agent may quote or trade.
///
/// `X -> Y` reads "agent gives X, receives Y". Money-first priority order
/// (spec 4.6) is the declaration order here: `AtoM=0, BtoM=1, MtoA=2, MtoB=3,
/// AtoB=4, BtoA=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PairKey {
    AtoM,
    BtoM,
    MtoA,
    MtoB,
    AtoB,
    BtoA,
}

impl PairKey {
    pub const ALL: [PairKey; 6] = [
        PairKey::AtoM,
        PairKey::BtoM,
        PairKey::MtoA,
        PairKey::MtoB,
        PairKey::AtoB,
        PairKey::BtoA,
    ];

    /// Priority index used for money-first tie-breaking across pair types.
    pub fn priority(self) -> u8 {
        self as u8
    }

    pub fn gives(self) -> CommodityOrMoney {
        match self {
            PairKey::AtoM | PairKey::AtoB => CommodityOrMoney::Commodity(Commodity::A),
            PairKey::BtoM | PairKey::BtoA => CommodityOrMoney::Commodity(Commodity::B),
            PairKey::MtoA | PairKey::MtoB => CommodityOrMoney::Money,
        }
    }

    pub fn receives(self) -> CommodityOrMoney {
        match self {
            PairKey::MtoA | PairKey::BtoA => CommodityOrMoney::Commodity(Commodity::A),
            PairKey::MtoB | PairKey::AtoB => CommodityOrMoney::Commodity(Commodity::B),
            PairKey::AtoM | PairKey::BtoM => CommodityOrMoney::Money,
        }
    }

    pub fn is_monetary(self) -> bool {
        matches!(
            self,
            PairKey::AtoM | PairKey::BtoM | PairKey::MtoA | PairKey::MtoB
        )
    }

    /// The opposite role assignment for the same two-party exchange: the
    /// giver of `self` becomes the receiver and vice versa. `ask_seller`
    /// under `pk` and `bid_buyer` under `pk.reverse()` are expressed on the
    /// same price axis (spec 4.3's "symmetrically for B"), so matching reads
    /// a buyer's willingness to pay directly off their own reverse-key quote
    /// rather than reciprocating a unit.
    pub fn reverse(self) -> PairKey {
        match self {
            PairKey::AtoB => PairKey::BtoA,
            PairKey::BtoA => PairKey::AtoB,
            PairKey::AtoM => PairKey::MtoA,
            PairKey::MtoA => PairKey::AtoM,
            PairKey::BtoM => PairKey::MtoB,
            PairKey::MtoB => PairKey::BtoM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommodityOrMoney {
    Commodity(Commodity),
    Money,
}

impl CommodityOrMoney {
    /// `(d_a, d_b, d_m)` for a signed `amount` of this kind, zero elsewhere.
    pub fn delta(self, amount: i64) -> (i64, i64, i64) {
        match self {
            CommodityOrMoney::Commodity(Commodity::A) => (amount, 0, 0),
            CommodityOrMoney::Commodity(Commodity::B) => (0, amount, 0),
            CommodityOrMoney::Money => (0, 0, amount),
        }
    }
}

/// Unordered pair of agent ids, canonicalized so `(3, 7) == (7, 3)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId {
    pub min: AgentId,
    pub max: AgentId,
}

impl PairId {
    pub fn new(a: AgentId, b: AgentId) -> Self {
        if a.0 <= b.0 {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }
}

/// `round_half_up` without relying on platform rounding modes: `floor(x +
/// 0.5)` for non-negative `x`. The spec's domain only calls this on
/// non-negative price*quantity products.
pub fn round_half_up(x: f64) -> i64 {
    debug_assert!(x >= 0.0, "round_half_up is only defined for x >= 0");
    (x + 0.5).floor() as i64
}
