//! Meal period classification.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Coarse time-of-day bucket used for grouping and reporting.
///
/// Variant order is the reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Breakfast,
    Lunch,
    Dinner,
    Other,
}

impl Period {
    pub const ALL: [Self; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Other];

    /// Stored and serialized form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "cafe",
            Self::Lunch => "almoco",
            Self::Dinner => "janta",
            Self::Other => "outro",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cafe" => Ok(Self::Breakfast),
            "almoco" => Ok(Self::Lunch),
            "janta" => Ok(Self::Dinner),
            "outro" => Ok(Self::Other),
            _ => Err(ValidationError::InvalidPeriod {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Boundary table used to bucket punches into periods.
///
/// Single-device uploads close lunch at 14:00; consolidated runs keep lunch
/// open until 17:50. Both leave a gap before dinner that falls into
/// [`Period::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodPolicy {
    #[default]
    SingleDevice,
    Consolidated,
}

const fn hm(hour: u32, minute: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(t) => t,
        None => NaiveTime::MIN,
    }
}

const LUNCH_START: NaiveTime = hm(10, 40);
const DINNER_START: NaiveTime = hm(18, 0);

impl PeriodPolicy {
    /// First instant that is no longer lunch.
    #[must_use]
    pub const fn lunch_end(self) -> NaiveTime {
        match self {
            Self::SingleDevice => hm(14, 0),
            Self::Consolidated => hm(17, 50),
        }
    }

    /// Buckets a time of day. Lower bounds are inclusive, upper bounds exclusive.
    #[must_use]
    pub fn classify(self, time: NaiveTime) -> Period {
        if time < LUNCH_START {
            Period::Breakfast
        } else if time < self.lunch_end() {
            Period::Lunch
        } else if time >= DINNER_START {
            Period::Dinner
        } else {
            Period::Other
        }
    }
}

impl fmt::Display for PeriodPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleDevice => write!(f, "single-device"),
            Self::Consolidated => write!(f, "consolidated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    #[test]
    fn shared_boundaries() {
        for policy in [PeriodPolicy::SingleDevice, PeriodPolicy::Consolidated] {
            assert_eq!(policy.classify(t("00:00:00")), Period::Breakfast);
            assert_eq!(policy.classify(t("10:39:00")), Period::Breakfast);
            assert_eq!(policy.classify(t("10:39:59")), Period::Breakfast);
            assert_eq!(policy.classify(t("10:40:00")), Period::Lunch);
            assert_eq!(policy.classify(t("17:59:59")), Period::Other);
            assert_eq!(policy.classify(t("18:00:00")), Period::Dinner);
            assert_eq!(policy.classify(t("23:59:59")), Period::Dinner);
        }
    }

    #[test]
    fn single_device_closes_lunch_at_two() {
        let policy = PeriodPolicy::SingleDevice;
        assert_eq!(policy.classify(t("13:59:59")), Period::Lunch);
        assert_eq!(policy.classify(t("14:00:00")), Period::Other);
        assert_eq!(policy.classify(t("17:49:59")), Period::Other);
    }

    #[test]
    fn consolidated_closes_lunch_at_ten_to_six() {
        let policy = PeriodPolicy::Consolidated;
        assert_eq!(policy.classify(t("14:00:00")), Period::Lunch);
        assert_eq!(policy.classify(t("17:49:59")), Period::Lunch);
        assert_eq!(policy.classify(t("17:50:00")), Period::Other);
    }

    #[test]
    fn period_strings_roundtrip() {
        for period in Period::ALL {
            let json = serde_json::to_string(&period).unwrap();
            assert_eq!(json, format!("\"{}\"", period.as_str()));
            let parsed: Period = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, period);
        }
        assert!("dinner".parse::<Period>().is_err());
    }

    #[test]
    fn policy_serde_is_kebab_case() {
        let json = serde_json::to_string(&PeriodPolicy::SingleDevice).unwrap();
        assert_eq!(json, "\"single-device\"");
        let parsed: PeriodPolicy = serde_json::from_str("\"consolidated\"").unwrap();
        assert_eq!(parsed, PeriodPolicy::Consolidated);
    }
}
