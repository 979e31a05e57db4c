use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ClinicModelError;
use crate::inputs::ModelInputs;
use crate::types::Currency;
use crate::ClinicModelResult;

const USD_COP: Decimal = dec!(3855);
const USD_EUR: Decimal = dec!(0.868);

/// Cross rates: one unit of `from` buys `rates[from][to]` units of `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// Where the rates came from, e.g. a quote date or "Cached"
    #[serde(default)]
    pub as_of: String,
    pub rates: BTreeMap<Currency, BTreeMap<Currency, Decimal>>,
}

impl RateTable {
    /// Static table used when no live quotes are supplied:
    /// 1 USD = 3855 COP = 0.868 EUR.
    pub fn fallback() -> Self {
        let usd = BTreeMap::from([
            (Currency::USD, Decimal::ONE),
            (Currency::COP, USD_COP),
            (Currency::EUR, USD_EUR),
        ]);
        let cop = BTreeMap::from([
            (Currency::USD, Decimal::ONE / USD_COP),
            (Currency::COP, Decimal::ONE),
            (Currency::EUR, USD_EUR / USD_COP),
        ]);
        let eur = BTreeMap::from([
            (Currency::USD, Decimal::ONE / USD_EUR),
            (Currency::COP, USD_COP / USD_EUR),
            (Currency::EUR, Decimal::ONE),
        ]);

        Self {
            as_of: "Cached".into(),
            rates: BTreeMap::from([
                (Currency::USD, usd),
                (Currency::COP, cop),
                (Currency::EUR, eur),
            ]),
        }
    }

    /// Rate from one currency to another. Same-currency lookups are 1 even
    /// when the table omits the diagonal.
    pub fn rate(&self, from: Currency, to: Currency) -> ClinicModelResult<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let rate = self
            .rates
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .ok_or_else(|| ClinicModelError::InvalidInput {
                field: "rates".into(),
                reason: format!("No exchange rate from {from} to {to}"),
            })?;
        if rate <= Decimal::ZERO {
            return Err(ClinicModelError::InvalidInput {
                field: "rates".into(),
                reason: format!("Exchange rate {from}->{to} must be positive (got {rate})"),
            });
        }
        Ok(rate)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Re-express every monetary input in `to`. Fractions and the patient count
/// are unit-free and pass through unchanged.
pub fn convert(inputs: &ModelInputs, to: Currency, rates: &RateTable) -> ClinicModelResult<ModelInputs> {
    let k = rates.rate(inputs.currency, to)?;
    debug!(from = %inputs.currency, %to, rate = %k, "converting inputs");

    Ok(ModelInputs {
        currency: to,
        tariff: inputs.tariff * k,
        drugs_base: inputs.drugs_base * k,
        labs_base: inputs.labs_base * k,
        clinical_pay: inputs.clinical_pay * k,
        admin_pay: inputs.admin_pay * k,
        rent: inputs.rent * k,
        ehr_m: inputs.ehr_m * k,
        it_m: inputs.it_m * k,
        office_y: inputs.office_y * k,
        licenses_y: inputs.licenses_y * k,
        mal_md_y: inputs.mal_md_y * k,
        mal_np_y: inputs.mal_np_y * k,
        initial_investment: inputs.initial_investment * k,
        low_tariff: inputs.low_tariff * k,
        ..inputs.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fallback_rates() {
        let table = RateTable::fallback();
        assert_eq!(table.rate(Currency::USD, Currency::COP).unwrap(), dec!(3855));
        assert_eq!(table.rate(Currency::USD, Currency::EUR).unwrap(), dec!(0.868));
        assert_eq!(table.rate(Currency::EUR, Currency::EUR).unwrap(), Decimal::ONE);

        let cross = table.rate(Currency::EUR, Currency::COP).unwrap();
        assert!((cross - dec!(4441.2442396)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_convert_scales_money_only() {
        let base = ModelInputs::default();
        let cop = convert(&base, Currency::COP, &RateTable::fallback()).unwrap();

        assert_eq!(cop.currency, Currency::COP);
        assert_eq!(cop.tariff, dec!(54) * dec!(3855));
        assert_eq!(cop.rent, dec!(125) * dec!(3855));
        assert_eq!(cop.low_tariff, dec!(42) * dec!(3855));
        assert_eq!(cop.initial_investment, dec!(650) * dec!(3855));

        assert_eq!(cop.patients, base.patients);
        assert_eq!(cop.tax_rate, base.tax_rate);
        assert_eq!(cop.ke, base.ke);
        assert_eq!(cop.util_pct, base.util_pct);

        // Caller's value is untouched
        assert_eq!(base, ModelInputs::default());
    }

    #[test]
    fn test_convert_same_currency_is_identity() {
        let base = ModelInputs::default();
        let same = convert(&base, Currency::USD, &RateTable::fallback()).unwrap();
        assert_eq!(same, base);
    }

    #[test]
    fn test_missing_pair_rejected() {
        let table = RateTable {
            as_of: String::new(),
            rates: BTreeMap::from([(
                Currency::USD,
                BTreeMap::from([(Currency::EUR, dec!(0.9))]),
            )]),
        };
        let err = convert(&ModelInputs::default(), Currency::COP, &table).unwrap_err();
        assert!(err.to_string().contains("USD to COP"));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let table = RateTable {
            as_of: String::new(),
            rates: BTreeMap::from([(
                Currency::USD,
                BTreeMap::from([(Currency::EUR, Decimal::ZERO)]),
            )]),
        };
        assert!(table.rate(Currency::USD, Currency::EUR).is_err());
    }

    #[test]
    fn test_rate_table_from_json() {
        let table: RateTable = serde_json::from_str(
            r#"{"as_of": "2025-01-31", "rates": {"USD": {"EUR": "0.95"}, "EUR": {"USD": "1.0526"}}}"#,
        )
        .unwrap();
        assert_eq!(table.as_of, "2025-01-31");
        assert_eq!(table.rate(Currency::USD, Currency::EUR).unwrap(), dec!(0.95));
    }
}
