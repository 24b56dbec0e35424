use std::{env, str::FromStr};

use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pos: PosSettings,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosSettings {
    /// VAT percentage included in menu prices.
    pub vat_rate: Decimal,
    pub daily_serial_enabled: bool,
}

impl Default for PosSettings {
    fn default() -> Self {
        Self {
            vat_rate: Decimal::from(15),
            daily_serial_enabled: true,
        }
    }
}

impl PosSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let vat_rate = match env::var("VAT_RATE") {
            Ok(raw) => Decimal::from_str(raw.trim())
                .map_err(|err| anyhow::anyhow!("VAT_RATE is not a number: {err}"))?,
            Err(_) => defaults.vat_rate,
        };
        if vat_rate < Decimal::ZERO || vat_rate > Decimal::ONE_HUNDRED {
            anyhow::bail!("VAT_RATE must be between 0 and 100, got {vat_rate}");
        }
        let daily_serial_enabled = env::var("DAILY_SERIAL_ENABLED")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.daily_serial_enabled);
        Ok(Self {
            vat_rate,
            daily_serial_enabled,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
            pos: PosSettings::from_env()?,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
