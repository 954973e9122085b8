use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parses a Homebank amount and rounds it to exactly two fractional digits.
pub fn parse_amount(value: &str) -> Result<Decimal, String> {
    let value = value.trim();
    let parsed = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|err| err.to_string())?;
    let mut amount = parsed.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    if amount.is_zero() {
        amount.set_sign_positive(true);
    }
    Ok(amount)
}

/// Homebank stores dates as a serial day count where day 1 is 0001-01-01.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let serial: i32 = value.trim().parse().map_err(|err| format!("{err}"))?;
    if serial < 1 {
        return Err("day number must be at least 1".to_string());
    }
    NaiveDate::from_num_days_from_ce_opt(serial)
        .ok_or_else(|| "day number is out of range".to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Datelike as _;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("10", "10.00")]
    #[case("10.005", "10.01")]
    #[case("-10.005", "-10.01")]
    #[case("10.004", "10.00")]
    #[case("0.1", "0.10")]
    #[case("-25", "-25.00")]
    #[case("1234.5600000000001", "1234.56")]
    #[case("1e2", "100.00")]
    #[case("-1.5E-3", "0.00")]
    #[case(" 42.1 ", "42.10")]
    #[case("-0", "0.00")]
    fn amounts(#[case] input: &str, #[case] expected: &str) {
        let amount = parse_amount(input).unwrap();
        assert_eq!(expected, amount.to_string());
        assert_eq!(2, amount.scale());
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1,5")]
    fn invalid_amounts(#[case] input: &str) {
        assert!(parse_amount(input).is_err());
    }

    #[rstest]
    #[case("1", 1, 1, 1)]
    #[case("2", 1, 1, 2)]
    #[case("32", 1, 2, 1)]
    #[case("366", 2, 1, 1)]
    fn dates(#[case] input: &str, #[case] year: i32, #[case] month: u32, #[case] day: u32) {
        assert_eq!(
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            parse_date(input).unwrap()
        );
    }

    #[test]
    fn recent_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            date,
            parse_date(&date.num_days_from_ce().to_string()).unwrap()
        );
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("abc")]
    #[case("1.5")]
    #[case("99999999999")]
    fn invalid_dates(#[case] input: &str) {
        assert!(parse_date(input).is_err());
    }
}
