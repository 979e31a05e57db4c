#![cfg(feature = "currency")]

use clinic_model_core::currency::{convert, RateTable};
use clinic_model_core::{compute, Currency, ModelInputs};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_conversion_scales_money_outputs() {
    let usd = ModelInputs::default();
    let cop = convert(&usd, Currency::COP, &RateTable::fallback()).unwrap();

    let a = compute(&usd).unwrap();
    let b = compute(&cop).unwrap();

    assert_eq!(b.currency, Currency::COP);
    let scaled = a.income_statement.revenue.annual * dec!(3855);
    assert_eq!(b.income_statement.revenue.annual, scaled);
    let ebitda_ratio = b.income_statement.ebitda.annual / a.income_statement.ebitda.annual;
    assert!((ebitda_ratio - dec!(3855)).abs() < dec!(0.000001));

    // Ratios and volumes do not depend on the unit of account
    assert!((a.key_metrics.ebitda_margin - b.key_metrics.ebitda_margin).abs() < dec!(0.0000001));
    let be_a = a.breakeven.breakeven_patients.unwrap();
    let be_b = b.breakeven.breakeven_patients.unwrap();
    assert!((be_a - be_b).abs() < dec!(0.000001));
    assert_eq!(a.valuation.payback_year, b.valuation.payback_year);
}

#[test]
fn test_round_trip_through_eur() {
    let table = RateTable::fallback();
    let usd = ModelInputs::default();
    let back = convert(
        &convert(&usd, Currency::EUR, &table).unwrap(),
        Currency::USD,
        &table,
    )
    .unwrap();

    assert_eq!(back.currency, Currency::USD);
    for ((name, a), (_, b)) in usd.monetary_fields().iter().zip(back.monetary_fields().iter()) {
        assert!((*a - *b).abs() < dec!(0.0000001), "{name} drifted: {a} vs {b}");
    }
}

#[test]
fn test_rate_table_from_yaml() {
    let yaml = r#"
as_of: "2025-03-01"
rates:
  USD:
    COP: "4100"
  COP:
    USD: "0.000243902439"
"#;
    let table: RateTable = serde_yaml::from_str(yaml).unwrap();
    let cop = convert(&ModelInputs::default(), Currency::COP, &table).unwrap();
    assert_eq!(cop.tariff, dec!(54) * dec!(4100));
    assert!(convert(&ModelInputs::default(), Currency::EUR, &table).is_err());
    assert_eq!(table.rate(Currency::COP, Currency::COP).unwrap(), Decimal::ONE);
}
