//! Asset classes and bar granularities.

use crate::error::EngineError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Класс актива. Определяет, есть ли у инструмента объём.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stock,
    Crypto,
    Etf,
    Forex,
    Index,
    Commodity,
}

impl AssetType {
    /// Forex and index quotes carry no traded volume.
    pub fn has_volume(&self) -> bool {
        !matches!(self, AssetType::Forex | AssetType::Index)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Crypto => "crypto",
            AssetType::Etf => "etf",
            AssetType::Forex => "forex",
            AssetType::Index => "index",
            AssetType::Commodity => "commodity",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" | "stocks" | "equity" => Ok(AssetType::Stock),
            "crypto" | "cryptocurrency" => Ok(AssetType::Crypto),
            "etf" | "etfs" => Ok(AssetType::Etf),
            "forex" | "fx" | "currency" => Ok(AssetType::Forex),
            "index" | "indices" => Ok(AssetType::Index),
            "commodity" | "commodities" => Ok(AssetType::Commodity),
            other => Err(EngineError::UnknownAssetType(other.to_string())),
        }
    }
}

/// Гранулярность баров.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Daily,
    Hourly,
    FiveMinute,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Daily, Timeframe::Hourly, Timeframe::FiveMinute];

    /// Length of one bar. A bar stamped at `t` closes at `t + duration()`.
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::Daily => Duration::days(1),
            Timeframe::Hourly => Duration::hours(1),
            Timeframe::FiveMinute => Duration::minutes(5),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Hourly => "hourly",
            Timeframe::FiveMinute => "five_minute",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "1d" | "day" => Ok(Timeframe::Daily),
            "hourly" | "1h" | "hour" => Ok(Timeframe::Hourly),
            "five_minute" | "5m" | "5min" => Ok(Timeframe::FiveMinute),
            other => Err(EngineError::invalid_config(format!("unknown timeframe {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_type_from_str() {
        assert_eq!("Stock".parse::<AssetType>().unwrap(), AssetType::Stock);
        assert_eq!("FX".parse::<AssetType>().unwrap(), AssetType::Forex);
        assert_eq!("indices".parse::<AssetType>().unwrap(), AssetType::Index);
        assert!("bond".parse::<AssetType>().is_err());
    }

    #[test]
    fn test_volumeless_assets() {
        assert!(AssetType::Crypto.has_volume());
        assert!(AssetType::Etf.has_volume());
        assert!(!AssetType::Forex.has_volume());
        assert!(!AssetType::Index.has_volume());
    }

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::Hourly.duration(), Duration::minutes(60));
        assert_eq!("5m".parse::<Timeframe>().unwrap(), Timeframe::FiveMinute);
    }
}
