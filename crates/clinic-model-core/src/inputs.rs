use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ClinicModelError;
use crate::types::{Currency, Money, Rate};
use crate::ClinicModelResult;

/// Operating assumptions for one clinic, one fiscal year, one currency.
///
/// Percentages are stored as fractions (0.20 = 20%). Fields missing from a
/// deserialized document fall back to the baseline scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInputs {
    /// Currency the monetary fields are expressed in
    pub currency: Currency,

    // --- Volume & pricing ---
    /// Patients served per year
    pub patients: u32,
    /// Revenue per patient per year
    pub tariff: Money,

    // --- Variable costs (per patient per month) ---
    pub drugs_base: Money,
    pub drugs_cont: Rate,
    pub labs_base: Money,
    pub labs_cont: Rate,

    // --- Payroll (annual) ---
    pub clinical_pay: Money,
    pub clinical_bur: Rate,
    pub admin_pay: Money,
    pub admin_bur: Rate,

    // --- Facilities & opex ---
    /// Annual rent
    pub rent: Money,
    /// Utilities as a fraction of rent
    pub util_pct: Rate,
    /// EHR licence, monthly
    pub ehr_m: Money,
    /// IT / phone / internet, monthly
    pub it_m: Money,
    pub office_y: Money,
    pub licenses_y: Money,
    pub mal_md_y: Money,
    pub mal_np_y: Money,

    // --- Tax & valuation ---
    pub tax_rate: Rate,
    /// Annual growth applied to free cash flow from year 2 onwards
    pub rev_growth: Rate,
    /// Discount rate (cost of equity)
    pub ke: Rate,
    pub initial_investment: Money,
    /// Free cash flow as a fraction of net profit
    pub fcf_factor: Rate,

    // --- Stress testing ---
    /// Share of patients billed at `low_tariff`
    pub mix_low_pct: Rate,
    pub low_tariff: Money,
    /// Clinical cost inflation applied in the stress scenarios
    pub stress_costs: Rate,
}

/// Largest patient volume the model accepts.
pub const MAX_PATIENTS: u32 = 2000;

/// Upper bounds of the monetary inputs in thousands of USD or EUR, in
/// `monetary_fields` order.
const MONETARY_CAPS: [Money; 14] = [
    dec!(1000000),  // tariff
    dec!(100000),   // drugs_base
    dec!(50000),    // labs_base
    dec!(50000000), // clinical_pay
    dec!(50000000), // admin_pay
    dec!(10000000), // rent
    dec!(500000),   // ehr_m
    dec!(500000),   // it_m
    dec!(5000000),  // office_y
    dec!(5000000),  // licenses_y
    dec!(2000000),  // mal_md_y
    dec!(2000000),  // mal_np_y
    dec!(50000000), // initial_investment
    dec!(2000000),  // low_tariff
];

/// COP amounts run about four thousand times larger than USD or EUR.
const COP_CAP_SCALE: Decimal = dec!(5000);

fn cap_scale(currency: Currency) -> Decimal {
    match currency {
        Currency::COP => COP_CAP_SCALE,
        Currency::USD | Currency::EUR => Decimal::ONE,
    }
}

impl Default for ModelInputs {
    /// The dashboard's baseline scenario, in thousands of USD.
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            patients: 250,
            tariff: dec!(54),
            drugs_base: dec!(1.34),
            drugs_cont: dec!(0.20),
            labs_base: dec!(0.17),
            labs_cont: dec!(0.20),
            clinical_pay: dec!(831),
            clinical_bur: dec!(0.25),
            admin_pay: dec!(399),
            admin_bur: dec!(0.25),
            rent: dec!(125),
            util_pct: dec!(0.15),
            ehr_m: dec!(2),
            it_m: dec!(1),
            office_y: dec!(10),
            licenses_y: dec!(5),
            mal_md_y: dec!(20),
            mal_np_y: dec!(3),
            tax_rate: dec!(0.21),
            rev_growth: dec!(0.15),
            ke: dec!(0.18),
            initial_investment: dec!(650),
            fcf_factor: dec!(0.40),
            mix_low_pct: dec!(0.30),
            low_tariff: dec!(42),
            stress_costs: dec!(0.10),
        }
    }
}

impl ModelInputs {
    pub fn patients_dec(&self) -> Decimal {
        Decimal::from(self.patients)
    }

    /// Monetary fields by name, in declaration order.
    pub fn monetary_fields(&self) -> [(&'static str, Money); 14] {
        [
            ("tariff", self.tariff),
            ("drugs_base", self.drugs_base),
            ("labs_base", self.labs_base),
            ("clinical_pay", self.clinical_pay),
            ("admin_pay", self.admin_pay),
            ("rent", self.rent),
            ("ehr_m", self.ehr_m),
            ("it_m", self.it_m),
            ("office_y", self.office_y),
            ("licenses_y", self.licenses_y),
            ("mal_md_y", self.mal_md_y),
            ("mal_np_y", self.mal_np_y),
            ("initial_investment", self.initial_investment),
            ("low_tariff", self.low_tariff),
        ]
    }

    /// Fraction fields by name; each must lie in [0, 1].
    pub fn fraction_fields(&self) -> [(&'static str, Rate); 11] {
        [
            ("drugs_cont", self.drugs_cont),
            ("labs_cont", self.labs_cont),
            ("clinical_bur", self.clinical_bur),
            ("admin_bur", self.admin_bur),
            ("util_pct", self.util_pct),
            ("tax_rate", self.tax_rate),
            ("rev_growth", self.rev_growth),
            ("ke", self.ke),
            ("fcf_factor", self.fcf_factor),
            ("mix_low_pct", self.mix_low_pct),
            ("stress_costs", self.stress_costs),
        ]
    }
}

/// Range checks owned by the input layer. The engines assume inputs that
/// pass this check and never re-validate. The upper bounds keep every
/// intermediate product well inside the Decimal range.
pub fn validate_inputs(input: &ModelInputs) -> ClinicModelResult<()> {
    if input.patients > MAX_PATIENTS {
        return Err(ClinicModelError::InvalidInput {
            field: "patients".into(),
            reason: format!("At most {MAX_PATIENTS} patients per year (got {})", input.patients),
        });
    }

    let scale = cap_scale(input.currency);
    for ((field, value), cap) in input.monetary_fields().into_iter().zip(MONETARY_CAPS) {
        if value < Decimal::ZERO {
            return Err(ClinicModelError::InvalidInput {
                field: field.into(),
                reason: "Monetary inputs cannot be negative".into(),
            });
        }
        let limit = cap * scale;
        if value > limit {
            return Err(ClinicModelError::InvalidInput {
                field: field.into(),
                reason: format!("Must not exceed {limit} thousand {} (got {value})", input.currency),
            });
        }
    }

    for (field, value) in input.fraction_fields() {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(ClinicModelError::InvalidInput {
                field: field.into(),
                reason: format!("Must be a fraction between 0 and 1 (got {value})"),
            });
        }
    }

    Ok(())
}
