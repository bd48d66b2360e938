use time::macros::format_description;
use time::{Date, Duration};

pub const DEFAULT_LOW_THRESHOLD: i64 = 5;
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

const SECONDS_PER_DAY: i64 = 86_400;

pub const FLAG_INACTIVE: &str = "Inactive";
pub const FLAG_LOW_STOCK: &str = "Low stock";
pub const FLAG_EXPIRED: &str = "Expired";
pub const FLAG_EXPIRING_SOON: &str = "Expiring soon";

/// Thresholds for stock flags and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagParams {
    pub low_threshold: i64,
    pub exp_days: i64,
}

impl Default for FlagParams {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_LOW_THRESHOLD,
            exp_days: DEFAULT_EXPIRY_DAYS,
        }
    }
}

impl FlagParams {
    /// Parse raw query values; anything unparsable keeps the default.
    pub fn from_params(low: Option<&str>, exp: Option<&str>) -> Self {
        let parse = |value: Option<&str>, default: i64| {
            value
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default)
        };
        Self {
            low_threshold: parse(low, DEFAULT_LOW_THRESHOLD),
            exp_days: parse(exp, DEFAULT_EXPIRY_DAYS),
        }
    }

    pub fn is_low(&self, qty_available: f64) -> bool {
        qty_available > 0.0 && qty_available <= self.low_threshold as f64
    }

    /// Last date still counted as "expiring soon". Saturates at the
    /// calendar bounds for out-of-range `exp_days`.
    pub fn expiry_horizon(&self, today: Date) -> Date {
        let saturated = if self.exp_days < 0 { Date::MIN } else { Date::MAX };
        self.exp_days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|secs| today.checked_add(Duration::seconds(secs)))
            .unwrap_or(saturated)
    }
}

pub fn parse_expiry(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn stock_flags(
    expiry_date: Option<&str>,
    qty_available: f64,
    is_active: bool,
    params: FlagParams,
    today: Date,
) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if !is_active {
        flags.push(FLAG_INACTIVE);
    }
    if params.is_low(qty_available) {
        flags.push(FLAG_LOW_STOCK);
    }
    if let Some(expiry) = expiry_date.and_then(parse_expiry) {
        let days_left = (expiry - today).whole_days();
        if days_left < 0 {
            flags.push(FLAG_EXPIRED);
        } else if days_left <= params.exp_days {
            flags.push(FLAG_EXPIRING_SOON);
        }
    }
    flags
}
