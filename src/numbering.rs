use chrono::NaiveDate;

use crate::{error::AppResult, gateway::OrderGateway, models::DailySerial};

pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

pub fn parse_order_number(value: &str) -> Option<u64> {
    let digits = value.strip_prefix(ORDER_NUMBER_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Zero-padded to four digits, wider once the counter passes 9999.
pub fn format_order_number(sequence: u64) -> String {
    format!("{ORDER_NUMBER_PREFIX}{sequence:04}")
}

pub fn next_order_number(last: Option<&str>) -> String {
    let next = last
        .and_then(parse_order_number)
        .map(|n| n.saturating_add(1))
        .unwrap_or(1);
    format_order_number(next)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedNumbers {
    pub order_number: String,
    pub daily_serial: Option<DailySerial>,
}

// No lock is held between reading the last number and inserting the order;
// the unique order_number column rejects the loser of a race.
pub async fn assign(
    gateway: &dyn OrderGateway,
    serial_day: Option<NaiveDate>,
) -> AppResult<AssignedNumbers> {
    let last = gateway.last_order_number().await?;
    let order_number = next_order_number(last.as_deref());

    let daily_serial = match serial_day {
        Some(day) => Some(gateway.next_daily_serial(day).await?),
        None => None,
    };

    tracing::debug!(
        last = ?last,
        order_number = %order_number,
        daily_serial = ?daily_serial.map(|s| s.serial),
        "assigned order number"
    );

    Ok(AssignedNumbers {
        order_number,
        daily_serial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_last_number() {
        assert_eq!(next_order_number(Some("ORD-0042")), "ORD-0043");
        assert_eq!(next_order_number(Some("ORD-0999")), "ORD-1000");
    }

    #[test]
    fn starts_at_one() {
        assert_eq!(next_order_number(None), "ORD-0001");
    }

    #[test]
    fn malformed_numbers_restart() {
        assert_eq!(next_order_number(Some("INV-20240101-ab12")), "ORD-0001");
        assert_eq!(next_order_number(Some("ORD-")), "ORD-0001");
        assert_eq!(next_order_number(Some("ORD-12a")), "ORD-0001");
        assert_eq!(next_order_number(Some("ORD--5")), "ORD-0001");
    }

    #[test]
    fn widens_past_four_digits() {
        assert_eq!(next_order_number(Some("ORD-9999")), "ORD-10000");
        assert_eq!(parse_order_number("ORD-10000"), Some(10000));
    }
}
