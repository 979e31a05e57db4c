//! Qualitative bands for the headline ratios.
//!
//! Every classifier is a plain threshold ladder evaluated top-down; the first
//! threshold the value meets wins. Thresholds are fractions unless noted.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Multiple, Rate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EbitdaMarginBand {
    Exceptional,
    Strong,
    Adequate,
    BelowTarget,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetMarginBand {
    Excellent,
    Healthy,
    Acceptable,
    Suboptimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyBand {
    Robust,
    Solid,
    Moderate,
    HighRisk,
    Critical,
    /// Break-even volume or margin of safety has no value
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitEconomicsBand {
    Exceptional,
    Healthy,
    Acceptable,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStructureBand {
    HighFixed,
    Balanced,
    VariableHeavy,
}

/// Admin payroll as a share of all staff payroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminBurdenBand {
    Lean,
    Typical,
    High,
}

/// Revenue earned per unit of total cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostEfficiencyBand {
    Excellent,
    Good,
    Adequate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpvVerdict {
    ValueCreating,
    ValueDestroying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrVerdict {
    AboveHurdle,
    BelowHurdle,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaybackQuality {
    Excellent,
    Good,
    Acceptable,
    Extended,
    NotRecovered,
}

/// Implied EV/EBITDA against outpatient benchmarks (6-10x).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleBand {
    Premium,
    Market,
    Discount,
}

/// How much base EBITDA survives combined stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResilienceBand {
    Robust,
    Adequate,
    Limited,
    Fragile,
}

pub fn ebitda_margin_band(margin: Rate) -> EbitdaMarginBand {
    if margin >= dec!(0.40) {
        EbitdaMarginBand::Exceptional
    } else if margin >= dec!(0.30) {
        EbitdaMarginBand::Strong
    } else if margin >= dec!(0.20) {
        EbitdaMarginBand::Adequate
    } else if margin >= dec!(0.10) {
        EbitdaMarginBand::BelowTarget
    } else {
        EbitdaMarginBand::Critical
    }
}

pub fn net_margin_band(margin: Rate) -> NetMarginBand {
    if margin >= dec!(0.25) {
        NetMarginBand::Excellent
    } else if margin >= dec!(0.15) {
        NetMarginBand::Healthy
    } else if margin >= dec!(0.08) {
        NetMarginBand::Acceptable
    } else {
        NetMarginBand::Suboptimal
    }
}

pub fn safety_band(mos_pct: Option<Rate>) -> SafetyBand {
    match mos_pct {
        None => SafetyBand::Undefined,
        Some(m) if m >= dec!(0.60) => SafetyBand::Robust,
        Some(m) if m >= dec!(0.40) => SafetyBand::Solid,
        Some(m) if m >= dec!(0.25) => SafetyBand::Moderate,
        Some(m) if m >= dec!(0.15) => SafetyBand::HighRisk,
        Some(_) => SafetyBand::Critical,
    }
}

/// Banded on contribution per patient over tariff.
pub fn unit_economics_band(contribution_rate: Rate) -> UnitEconomicsBand {
    if contribution_rate >= dec!(0.70) {
        UnitEconomicsBand::Exceptional
    } else if contribution_rate >= dec!(0.50) {
        UnitEconomicsBand::Healthy
    } else if contribution_rate >= dec!(0.35) {
        UnitEconomicsBand::Acceptable
    } else {
        UnitEconomicsBand::Weak
    }
}

pub fn cost_structure_band(fixed_ratio: Rate) -> CostStructureBand {
    if fixed_ratio >= dec!(0.50) {
        CostStructureBand::HighFixed
    } else if fixed_ratio >= dec!(0.35) {
        CostStructureBand::Balanced
    } else {
        CostStructureBand::VariableHeavy
    }
}

/// `revenue_per_cost` is revenue divided by total cost (1.3 = 1.30 of
/// revenue per unit of cost).
pub fn cost_efficiency_band(revenue_per_cost: Decimal) -> CostEfficiencyBand {
    if revenue_per_cost >= dec!(1.5) {
        CostEfficiencyBand::Excellent
    } else if revenue_per_cost >= dec!(1.3) {
        CostEfficiencyBand::Good
    } else if revenue_per_cost >= dec!(1.2) {
        CostEfficiencyBand::Adequate
    } else {
        CostEfficiencyBand::Low
    }
}

/// Upper bounds are inclusive: a share of exactly 0.35 is still lean.
pub fn admin_burden_band(admin_labor_share: Rate) -> AdminBurdenBand {
    if admin_labor_share <= dec!(0.35) {
        AdminBurdenBand::Lean
    } else if admin_labor_share <= dec!(0.45) {
        AdminBurdenBand::Typical
    } else {
        AdminBurdenBand::High
    }
}

pub fn npv_verdict(npv: Decimal) -> NpvVerdict {
    if npv > Decimal::ZERO {
        NpvVerdict::ValueCreating
    } else {
        NpvVerdict::ValueDestroying
    }
}

pub fn irr_verdict(irr: Option<Rate>, hurdle: Rate) -> IrrVerdict {
    match irr {
        Some(r) if r > hurdle => IrrVerdict::AboveHurdle,
        Some(_) => IrrVerdict::BelowHurdle,
        None => IrrVerdict::Undefined,
    }
}

/// `payback_year` counts whole years from the investment.
pub fn payback_quality(payback_year: Option<u32>) -> PaybackQuality {
    match payback_year {
        None => PaybackQuality::NotRecovered,
        Some(y) if y <= 2 => PaybackQuality::Excellent,
        Some(3) => PaybackQuality::Good,
        Some(4) => PaybackQuality::Acceptable,
        Some(_) => PaybackQuality::Extended,
    }
}

/// Only positive multiples are banded.
pub fn multiple_band(ev_ebitda: Option<Multiple>) -> Option<MultipleBand> {
    match ev_ebitda {
        Some(m) if m >= dec!(8) => Some(MultipleBand::Premium),
        Some(m) if m >= dec!(5) => Some(MultipleBand::Market),
        Some(m) if m > Decimal::ZERO => Some(MultipleBand::Discount),
        _ => None,
    }
}

/// `resilience_score` is 0..=100; `worst_ebitda` separates Limited from
/// Fragile once less than half the base survives.
pub fn resilience_band(resilience_score: Decimal, worst_ebitda: Decimal) -> ResilienceBand {
    if resilience_score >= dec!(75) {
        ResilienceBand::Robust
    } else if resilience_score >= dec!(50) {
        ResilienceBand::Adequate
    } else if worst_ebitda >= Decimal::ZERO {
        ResilienceBand::Limited
    } else {
        ResilienceBand::Fragile
    }
}
