//! `ScenarioConfig`: the immutable inbound contract (spec 6.1).
//!
//! Precise textual formats (YAML, JSON) are a collaborator concern; this
//! struct is a plain `serde`-deserializable shape with one validation entry
//! point, `validate`, called once by `World::from_config`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::utility::{MoneyUtilityForm, Utility};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeRegime {
    BarterOnly,
    MoneyOnly,
    Mixed,
    MixedLiquidityGated,
}

impl ExchangeRegime {
    pub fn allows_barter(self) -> bool {
        matches!(
            self,
            ExchangeRegime::BarterOnly | ExchangeRegime::Mixed | ExchangeRegime::MixedLiquidityGated
        )
    }

    pub fn allows_money(self) -> bool {
        matches!(
            self,
            ExchangeRegime::MoneyOnly | ExchangeRegime::Mixed | ExchangeRegime::MixedLiquidityGated
        )
    }

    pub fn requires_money_inventory(self) -> bool {
        matches!(
            self,
            ExchangeRegime::MoneyOnly | ExchangeRegime::Mixed | ExchangeRegime::MixedLiquidityGated
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoneyMode {
    Quasilinear,
    KktLambda,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityGate {
    pub min_quotes: usize,
}

impl Default for LiquidityGate {
    fn default() -> Self {
        Self { min_quotes: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambdaBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for LambdaBounds {
    fn default() -> Self {
        Self { min: 1e-6, max: 1e6 }
    }
}

/// Enumerated, defaulted simulation parameters (spec 6.1 `params`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub spread: f64,
    pub vision_radius: i32,
    pub interaction_radius: i32,
    pub move_budget_per_tick: i32,
    pub d_a_max: i64,
    pub trade_cooldown_ticks: u32,
    pub forage_rate: i64,
    pub resource_growth_rate: i64,
    pub resource_max_amount: i64,
    pub resource_regen_cooldown: u32,
    pub enable_resource_claiming: bool,
    pub enforce_single_harvester: bool,
    pub epsilon: f64,
    pub beta: f64,
    pub exchange_regime: ExchangeRegime,
    pub money_mode: MoneyMode,
    pub money_utility_form: MoneyUtilityForm,
    pub money_scale: i64,
    pub lambda_money: f64,
    pub lambda_update_rate: f64,
    pub lambda_bounds: LambdaBounds,
    pub liquidity_gate: LiquidityGate,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            spread: 0.0,
            vision_radius: 5,
            interaction_radius: 1,
            move_budget_per_tick: 1,
            d_a_max: 5,
            trade_cooldown_ticks: 5,
            forage_rate: 1,
            resource_growth_rate: 0,
            resource_max_amount: 5,
            resource_regen_cooldown: 5,
            enable_resource_claiming: true,
            enforce_single_harvester: true,
            epsilon: 1e-12,
            beta: 0.95,
            exchange_regime: ExchangeRegime::BarterOnly,
            money_mode: MoneyMode::Quasilinear,
            money_utility_form: MoneyUtilityForm::Linear,
            money_scale: 1,
            lambda_money: 1.0,
            lambda_update_rate: 0.2,
            lambda_bounds: LambdaBounds::default(),
            liquidity_gate: LiquidityGate::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSeed {
    pub density: f64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartMode {
    Forage,
    Trade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSchedule {
    pub forage_ticks: u32,
    pub trade_ticks: u32,
    pub start_mode: StartMode,
}

/// Either a single scalar broadcast to every agent, or one value per agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarOrList<T> {
    Scalar(T),
    List(Vec<T>),
}

impl<T: Copy> ScalarOrList<T> {
    pub fn resolve(&self, agents: usize, field: &'static str) -> Result<Vec<T>, ConfigError> {
        match self {
            ScalarOrList::Scalar(v) => Ok(vec![*v; agents]),
            ScalarOrList::List(v) => {
                if v.len() != agents {
                    Err(ConfigError::ListLengthMismatch {
                        field,
                        actual: v.len(),
                        expected: agents,
                    })
                } else {
                    Ok(v.clone())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialInventories {
    pub a: ScalarOrList<i64>,
    pub b: ScalarOrList<i64>,
    #[serde(default)]
    pub m: Option<ScalarOrList<i64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilityMixEntry {
    pub utility: Utility,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub name: String,
    pub n: i32,
    pub agents: u32,
    pub initial_inventories: InitialInventories,
    #[serde(default)]
    pub lambda_money: Option<ScalarOrList<f64>>,
    pub utilities_mix: Vec<UtilityMixEntry>,
    #[serde(default)]
    pub params: Params,
    pub resource_seed: ResourceSeed,
    #[serde(default)]
    pub mode_schedule: Option<ModeSchedule>,
}

fn default_schema_version() -> u32 {
    1
}

impl ScenarioConfig {
    /// Cross-field validation (spec 6.1). Fatal at init; never recovered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != 1 {
            return Err(ConfigError::OutOfRange {
                field: "schema_version",
                constraint: "== 1",
                actual: self.schema_version.to_string(),
            });
        }
        if self.n <= 0 {
            return Err(ConfigError::OutOfRange {
                field: "N",
                constraint: "> 0",
                actual: self.n.to_string(),
            });
        }
        if self.agents == 0 {
            return Err(ConfigError::OutOfRange {
                field: "agents",
                constraint: "> 0",
                actual: self.agents.to_string(),
            });
        }

        let weight_sum: f64 = self.utilities_mix.iter().map(|e| e.weight).sum();
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightsNotNormalized { actual: weight_sum });
        }
        for entry in &self.utilities_mix {
            if let Utility::Ces { rho, .. } = entry.utility {
                if rho == 1.0 {
                    return Err(ConfigError::CesRhoEqualsOne { rho });
                }
            }
            if let Err(reason) = entry.utility.validate() {
                return Err(ConfigError::OutOfRange {
                    field: "utilities_mix[].utility",
                    constraint: "internally consistent parameters",
                    actual: reason,
                });
            }
        }

        if self.params.money_mode == MoneyMode::KktLambda {
            return Err(ConfigError::UnimplementedMoneyMode("kkt_lambda".to_string()));
        }

        if self.params.exchange_regime.requires_money_inventory() && self.initial_inventories.m.is_none() {
            return Err(ConfigError::MonetaryRegimeMissingMoney(regime_name(
                self.params.exchange_regime,
            )));
        }

        let agents = self.agents as usize;
        self.initial_inventories.a.resolve(agents, "initial_inventories.a")?;
        self.initial_inventories.b.resolve(agents, "initial_inventories.b")?;
        if let Some(m) = &self.initial_inventories.m {
            m.resolve(agents, "initial_inventories.m")?;
        }
        if let Some(lambda) = &self.lambda_money {
            lambda.resolve(agents, "lambda_money")?;
        }

        let a_vals = self.initial_inventories.a.resolve(agents, "initial_inventories.a")?;
        let b_vals = self.initial_inventories.b.resolve(agents, "initial_inventories.b")?;
        for entry in &self.utilities_mix {
            if let Utility::StoneGeary {
                gamma_a, gamma_b, ..
            } = entry.utility
            {
                for (i, (&a, &b)) in a_vals.iter().zip(b_vals.iter()).enumerate() {
                    if (a as f64) <= gamma_a || (b as f64) <= gamma_b {
                        return Err(ConfigError::StoneGearySubsistenceViolated {
                            agent: i as u32,
                            a,
                            gamma_a,
                            b,
                            gamma_b,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn regime_name(regime: ExchangeRegime) -> &'static str {
    match regime {
        ExchangeRegime::BarterOnly => "barter_only",
        ExchangeRegime::MoneyOnly => "money_only",
        ExchangeRegime::Mixed => "mixed",
        ExchangeRegime::MixedLiquidityGated => "mixed_liquidity_gated",
    }
}
