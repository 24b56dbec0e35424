use rust_decimal::{Decimal, RoundingStrategy};

pub const DECIMAL_PLACES: u32 = 2;

pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `value * percent / 100`, rounded.
pub fn percent_of(value: Decimal, percent: Decimal) -> Decimal {
    round_money(value * percent / Decimal::ONE_HUNDRED)
}

pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}
