//! Aggregation of energy meter day and month lists into keyed maps.
//!
//! The date of every entry comes from the record itself, never from the
//! query arguments. A key that appears twice in one response is rejected.

use std::collections::{BTreeMap, btree_map::Entry};

use chrono::NaiveDate;

use crate::{
    error::Error,
    response::{DayStat, MonthStat},
};

/// Daily energy usage in watt-hours, keyed by date.
pub type DailyUsage = BTreeMap<NaiveDate, f64>;

/// Monthly energy usage in watt-hours, keyed by month number (1-12).
pub type MonthlyUsage = BTreeMap<u32, f64>;

/// Builds one entry per day record.
///
/// # Errors
///
/// [`Error::Protocol`] if a record has no energy value, names an impossible
/// date, or repeats a date already seen.
pub fn daily_usage(records: &[DayStat]) -> Result<DailyUsage, Error> {
    let mut usage = DailyUsage::new();

    for record in records {
        let date = NaiveDate::from_ymd_opt(record.year, record.month, record.day).ok_or_else(|| {
            Error::Protocol(format!(
                "day record has invalid date {}-{}-{}",
                record.year, record.month, record.day
            ))
        })?;
        let energy = record
            .energy_wh()
            .ok_or_else(|| Error::Protocol(format!("day record {} has no energy", date)))?;

        match usage.entry(date) {
            Entry::Vacant(slot) => {
                slot.insert(energy);
            }
            Entry::Occupied(_) => {
                return Err(Error::Protocol(format!("duplicate day record {}", date)));
            }
        }
    }

    Ok(usage)
}

/// Builds one entry per month record.
///
/// # Errors
///
/// [`Error::Protocol`] if a record has no energy value, a month outside
/// 1-12, or repeats a month already seen.
pub fn monthly_usage(records: &[MonthStat]) -> Result<MonthlyUsage, Error> {
    let mut usage = MonthlyUsage::new();

    for record in records {
        if !(1..=12).contains(&record.month) {
            return Err(Error::Protocol(format!(
                "month record has invalid month {}",
                record.month
            )));
        }
        let energy = record.energy_wh().ok_or_else(|| {
            Error::Protocol(format!("month record {} has no energy", record.month))
        })?;

        if usage.insert(record.month, energy).is_some() {
            return Err(Error::Protocol(format!(
                "duplicate month record {}",
                record.month
            )));
        }
    }

    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32, energy: f64) -> DayStat {
        DayStat {
            year,
            month,
            day,
            energy: Some(energy),
            energy_wh: None,
        }
    }

    fn month(month: u32, energy: f64) -> MonthStat {
        MonthStat {
            year: Some(2023),
            month,
            energy: None,
            energy_wh: Some(energy),
        }
    }

    #[test]
    fn test_daily_usage() {
        let usage = daily_usage(&[day(2023, 6, 1, 120.0), day(2023, 6, 2, 90.0)]).unwrap();

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[&NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()], 120.0);
        assert_eq!(usage[&NaiveDate::from_ymd_opt(2023, 6, 2).unwrap()], 90.0);
    }

    #[test]
    fn test_daily_usage_straddles_month() {
        let usage = daily_usage(&[day(2023, 5, 31, 10.0), day(2023, 6, 1, 20.0)]).unwrap();
        let dates: Vec<_> = usage.keys().map(|d| d.to_string()).collect();
        assert_eq!(dates, ["2023-05-31", "2023-06-01"]);
    }

    #[test]
    fn test_duplicate_day_rejected() {
        let err = daily_usage(&[day(2023, 6, 1, 1.0), day(2023, 6, 1, 2.0)]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let err = daily_usage(&[day(2023, 2, 30, 1.0)]).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_monthly_usage() {
        let usage = monthly_usage(&[month(1, 4000.0), month(2, 3500.0)]).unwrap();
        assert_eq!(usage.into_iter().collect::<Vec<_>>(), [(1, 4000.0), (2, 3500.0)]);
    }

    #[test]
    fn test_duplicate_month_rejected() {
        let err = monthly_usage(&[month(3, 1.0), month(3, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_empty_lists() {
        assert!(daily_usage(&[]).unwrap().is_empty());
        assert!(monthly_usage(&[]).unwrap().is_empty());
    }
}
