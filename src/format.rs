//! Display-time formatting. Stored values are never rounded; these helpers
//! are the only place amounts are cut to two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as `"{currency} {value:.2}"`, e.g. `R$ 20.00`.
pub fn money(value: Decimal, currency: &str) -> String {
    format!("{currency} {}", two_places(value))
}

/// Format a percentage, e.g. `25.00%`.
pub fn percent(value: Decimal) -> String {
    format!("{}%", two_places(value))
}

fn two_places(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money() {
        assert_eq!(money(dec!(20), "R$"), "R$ 20.00");
        assert_eq!(money(dec!(28.9971), "R$"), "R$ 29.00");
        assert_eq!(money(dec!(-30), "€"), "€ -30.00");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(dec!(25)), "25.00%");
        assert_eq!(percent(dec!(33.3333333)), "33.33%");
        assert_eq!(percent(dec!(0.005)), "0.01%");
    }
}
