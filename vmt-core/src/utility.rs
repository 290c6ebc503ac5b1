//! Polymorphic utility functions over goods `(A, B)` plus quasilinear money.
//!
//! The reference docs describe these as classes behind a common interface;
//! the capability set is fixed and small, so this crate encodes them as one
//! tagged-variant enum with inlined arithmetic rather than a trait object.

use serde::{Deserialize, Serialize};

use crate::types::Inventory;

/// Default zero-inventory stabilization epsilon (spec 4.2).
pub const DEFAULT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Utility {
    Ces {
        rho: f64,
        w_a: f64,
        w_b: f64,
    },
    Linear {
        v_a: f64,
        v_b: f64,
    },
    Quadratic {
        a_star: f64,
        b_star: f64,
        sigma_a: f64,
        sigma_b: f64,
        gamma: f64,
    },
    Translog {
        alpha0: f64,
        alpha_a: f64,
        alpha_b: f64,
        beta_aa: f64,
        beta_bb: f64,
        beta_ab: f64,
    },
    StoneGeary {
        alpha_a: f64,
        alpha_b: f64,
        gamma_a: f64,
        gamma_b: f64,
    },
}

impl Utility {
    /// Stable short tag for telemetry payloads (spec 6.3 `AgentSnapshot.utility_type`).
    pub fn type_name(&self) -> &'static str {
        match self {
            Utility::Ces { .. } => "ces",
            Utility::Linear { .. } => "linear",
            Utility::Quadratic { .. } => "quadratic",
            Utility::Translog { .. } => "translog",
            Utility::StoneGeary { .. } => "stone_geary",
        }
    }
}

/// Shift both arguments by `eps` when either is exactly zero; otherwise pass
/// them through unchanged. Applies to CES, Stone-Geary and Translog, whose
/// marginal utilities are singular at a zero argument.
fn stabilize(a: f64, b: f64, eps: f64) -> (f64, f64) {
    if a == 0.0 || b == 0.0 {
        (a + eps, b + eps)
    } else {
        (a, b)
    }
}

/// Ratio `num / den`, clamping `den`'s magnitude away from zero so a
/// momentarily-flat marginal utility (Quadratic past bliss) never divides by
/// exactly zero.
fn safe_ratio(num: f64, den: f64, eps: f64) -> f64 {
    let den = if den.abs() < eps {
        eps.copysign(if den == 0.0 { 1.0 } else { den })
    } else {
        den
    };
    num / den
}

impl Utility {
    /// Total goods utility `u_goods(A, B)`, ignoring money.
    pub fn u_goods(&self, a: f64, b: f64) -> f64 {
        match *self {
            Utility::Ces { rho, w_a, w_b } => (w_a * a.powf(rho) + w_b * b.powf(rho)).powf(1.0 / rho),
            Utility::Linear { v_a, v_b } => v_a * a + v_b * b,
            Utility::Quadratic {
                a_star,
                b_star,
                sigma_a,
                sigma_b,
                gamma,
            } => {
                let da = a - a_star;
                let db = b - b_star;
                -sigma_a * da * da - sigma_b * db * db - gamma * da * db
            }
            Utility::Translog {
                alpha0,
                alpha_a,
                alpha_b,
                beta_aa,
                beta_bb,
                beta_ab,
            } => {
                let ln_a = a.ln();
                let ln_b = b.ln();
                let ln_u = alpha0
                    + alpha_a * ln_a
                    + alpha_b * ln_b
                    + 0.5 * beta_aa * ln_a * ln_a
                    + 0.5 * beta_bb * ln_b * ln_b
                    + beta_ab * ln_a * ln_b;
                ln_u.exp()
            }
            Utility::StoneGeary {
                alpha_a,
                alpha_b,
                gamma_a,
                gamma_b,
            } => alpha_a * (a - gamma_a).ln() + alpha_b * (b - gamma_b).ln(),
        }
    }

    /// Marginal utility of A, with zero-inventory stabilization applied for
    /// the forms whose MRS is singular at a zero argument.
    pub fn mu_a(&self, a: f64, b: f64, eps: f64) -> f64 {
        match *self {
            Utility::Ces { rho, w_a, .. } => {
                let (a, b) = stabilize(a, b, eps);
                let u = self.u_goods(a, b);
                w_a * a.powf(rho - 1.0) * u.powf(1.0 - rho)
            }
            Utility::Linear { v_a, .. } => v_a,
            Utility::Quadratic {
                a_star,
                sigma_a,
                gamma,
                b_star,
                ..
            } => -2.0 * sigma_a * (a - a_star) - gamma * (b - b_star),
            Utility::Translog {
                alpha_a,
                beta_aa,
                beta_ab,
                ..
            } => {
                let (a, b) = stabilize(a, b, eps);
                let u = self.u_goods(a, b);
                (alpha_a + beta_aa * a.ln() + beta_ab * b.ln()) * u / a
            }
            Utility::StoneGeary {
                alpha_a, gamma_a, ..
            } => {
                let (a, b) = stabilize(a, b, eps);
                let _ = b;
                alpha_a / (a - gamma_a)
            }
        }
    }

    /// Marginal utility of B; mirror of [`Utility::mu_a`].
    pub fn mu_b(&self, a: f64, b: f64, eps: f64) -> f64 {
        match *self {
            Utility::Ces { rho, w_b, .. } => {
                let (a, b) = stabilize(a, b, eps);
                let u = self.u_goods(a, b);
                w_b * b.powf(rho - 1.0) * u.powf(1.0 - rho)
            }
            Utility::Linear { v_b, .. } => v_b,
            Utility::Quadratic {
                b_star,
                sigma_b,
                gamma,
                a_star,
                ..
            } => -2.0 * sigma_b * (b - b_star) - gamma * (a - a_star),
            Utility::Translog {
                alpha_b,
                beta_bb,
                beta_ab,
                ..
            } => {
                let (a, b) = stabilize(a, b, eps);
                let u = self.u_goods(a, b);
                (alpha_b + beta_bb * b.ln() + beta_ab * a.ln()) * u / b
            }
            Utility::StoneGeary {
                alpha_b, gamma_b, ..
            } => {
                let (a, b) = stabilize(a, b, eps);
                let _ = a;
                alpha_b / (b - gamma_b)
            }
        }
    }

    /// Marginal rate of substitution of A for B: `mu_A / mu_B`.
    pub fn mrs_a_in_b(&self, a: f64, b: f64, eps: f64) -> f64 {
        if let Utility::Linear { v_a, v_b } = *self {
            return v_a / v_b;
        }
        safe_ratio(self.mu_a(a, b, eps), self.mu_b(a, b, eps), eps)
    }

    /// Reservation bounds `(p_min, p_max)` for selling/buying A in units of
    /// B. A single-point MRS evaluation for every variant; `p_min == p_max`
    /// always holds prior to spread being applied by the quote system.
    pub fn reservation_bounds_a_in_b(&self, a: f64, b: f64, eps: f64) -> (f64, f64) {
        let mrs = self.mrs_a_in_b(a, b, eps);
        (mrs, mrs)
    }

    /// Config-time validation: `rho != 1` for CES, positive weights, etc.
    /// Returns a human-readable reason on violation.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Utility::Ces { rho, w_a, w_b } => {
                if rho == 1.0 {
                    return Err("CES requires rho != 1".to_string());
                }
                if w_a <= 0.0 || w_b <= 0.0 {
                    return Err("CES requires w_a, w_b > 0".to_string());
                }
            }
            Utility::Linear { v_a, v_b } => {
                if v_a <= 0.0 || v_b <= 0.0 {
                    return Err("Linear requires v_a, v_b > 0".to_string());
                }
            }
            Utility::Quadratic { sigma_a, sigma_b, gamma, .. } => {
                if sigma_a < 0.0 || sigma_b < 0.0 || gamma < 0.0 {
                    return Err("Quadratic requires sigma_a, sigma_b, gamma >= 0".to_string());
                }
            }
            Utility::Translog { alpha_a, alpha_b, .. } => {
                if alpha_a <= 0.0 || alpha_b <= 0.0 {
                    return Err("Translog requires alpha_a, alpha_b > 0".to_string());
                }
            }
            Utility::StoneGeary {
                alpha_a,
                alpha_b,
                gamma_a,
                gamma_b,
            } => {
                if alpha_a <= 0.0 || alpha_b <= 0.0 {
                    return Err("Stone-Geary requires alpha_a, alpha_b > 0".to_string());
                }
                if gamma_a < 0.0 || gamma_b < 0.0 {
                    return Err("Stone-Geary requires gamma_a, gamma_b >= 0".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Functional form of quasilinear money utility `f(M)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MoneyUtilityForm {
    Linear,
    Log { m0: f64 },
}

impl MoneyUtilityForm {
    /// `f'(M)`, the marginal utility of money before the `lambda` scalar.
    pub fn marginal(&self, m: f64, eps: f64) -> f64 {
        match *self {
            MoneyUtilityForm::Linear => 1.0,
            MoneyUtilityForm::Log { m0 } => {
                let m = if m == 0.0 { eps } else { m };
                1.0 / (m + m0)
            }
        }
    }

    /// `f(M)` itself, zero-stabilized the same way as [`Self::marginal`].
    pub fn value(&self, m: f64, eps: f64) -> f64 {
        match *self {
            MoneyUtilityForm::Linear => m,
            MoneyUtilityForm::Log { m0 } => {
                let m = if m == 0.0 { eps } else { m };
                (m + m0).ln()
            }
        }
    }
}

/// `u_goods(A, B) + lambda * f(M)`, the total quasilinear objective an agent
/// maximizes (spec 4.2). Free function over a plain [`Inventory`] so
/// matching can evaluate hypothetical post-trade utility without mutating an
/// `Agent`.
pub fn total_utility(
    inventory: Inventory,
    utility: &Utility,
    lambda_money: f64,
    money_form: MoneyUtilityForm,
    eps: f64,
) -> f64 {
    let goods_u = utility.u_goods(inventory.a as f64, inventory.b as f64);
    let money_u = money_form.value(inventory.m as f64, eps);
    goods_u + lambda_money * money_u
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_has_constant_mrs_equal_bounds() {
        let u = Utility::Linear { v_a: 2.0, v_b: 4.0 };
        let (p_min, p_max) = u.reservation_bounds_a_in_b(10.0, 3.0, DEFAULT_EPSILON);
        assert_eq!(p_min, p_max);
        assert!((p_min - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ces_reservation_bounds_finite_at_zero_inventory() {
        let u = Utility::Ces {
            rho: -0.5,
            w_a: 1.0,
            w_b: 1.0,
        };
        let (p_min, p_max) = u.reservation_bounds_a_in_b(0.0, 5.0, DEFAULT_EPSILON);
        assert!(p_min.is_finite() && p_max.is_finite());
        assert_eq!(p_min, p_max);

        let (p_min, p_max) = u.reservation_bounds_a_in_b(5.0, 0.0, DEFAULT_EPSILON);
        assert!(p_min.is_finite() && p_max.is_finite());
        let _ = p_max;
    }

    #[test]
    fn stone_geary_mrs_blows_up_near_subsistence() {
        let u = Utility::StoneGeary {
            alpha_a: 1.0,
            alpha_b: 1.0,
            gamma_a: 1.0,
            gamma_b: 1.0,
        };
        let near = u.mrs_a_in_b(1.001, 5.0, DEFAULT_EPSILON);
        let far = u.mrs_a_in_b(3.0, 5.0, DEFAULT_EPSILON);
        assert!(near > far, "MRS should rise sharply near subsistence floor");
    }

    #[test]
    fn translog_reservation_bounds_finite_at_zero_inventory() {
        let u = Utility::Translog {
            alpha0: 0.0,
            alpha_a: 0.5,
            alpha_b: 0.5,
            beta_aa: -0.05,
            beta_bb: -0.05,
            beta_ab: 0.02,
        };
        let (p_min, p_max) = u.reservation_bounds_a_in_b(0.0, 4.0, DEFAULT_EPSILON);
        assert!(p_min.is_finite() && p_max.is_finite());
        assert_eq!(p_min, p_max);
    }

    #[test]
    fn quadratic_mu_can_turn_negative_past_bliss() {
        let u = Utility::Quadratic {
            a_star: 5.0,
            b_star: 5.0,
            sigma_a: 1.0,
            sigma_b: 1.0,
            gamma: 0.0,
        };
        assert!(u.mu_a(10.0, 5.0, DEFAULT_EPSILON) < 0.0);
        assert!(u.mu_a(2.0, 5.0, DEFAULT_EPSILON) > 0.0);
    }

    #[test]
    fn money_utility_forms_have_positive_marginal() {
        assert_eq!(MoneyUtilityForm::Linear.marginal(0.0, DEFAULT_EPSILON), 1.0);
        let log_form = MoneyUtilityForm::Log { m0: 1.0 };
        assert!(log_form.marginal(0.0, DEFAULT_EPSILON) > 0.0);
        assert!(log_form.marginal(100.0, DEFAULT_EPSILON) < log_form.marginal(0.0, DEFAULT_EPSILON));
    }

    #[test]
    fn ces_rejects_rho_equal_one() {
        let u = Utility::Ces {
            rho: 1.0,
            w_a: 1.0,
            w_b: 1.0,
        };
        assert!(u.validate().is_err());
    }
}
