// src/models/target.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::validation::not_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "target_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Daily,
    Monthly,
    Quarterly,
    Yearly,
}

impl TargetType {
    pub const ALL: [TargetType; 4] =
        [TargetType::Daily, TargetType::Monthly, TargetType::Quarterly, TargetType::Yearly];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Daily => "daily",
            TargetType::Monthly => "monthly",
            TargetType::Quarterly => "quarterly",
            TargetType::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesTarget {
    pub id: String,
    pub target_type: TargetType,
    pub period: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesTargetPayload {
    pub target_type: TargetType,
    #[validate(length(min = 1, message = "period is required"))]
    pub period: String,
    #[validate(custom(function = "not_negative", message = "amount must be at least 0"))]
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TargetQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl TargetQuery {
    /// The window the targets must overlap: one day when `day` is given,
    /// otherwise the whole month.
    pub fn window(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        let (Some(year), Some(month)) = (self.year, self.month) else {
            return Err(AppError::bad_request("Please provide year and month. Day is optional."));
        };
        let invalid = || AppError::bad_request("Invalid year, month or day");
        match self.day {
            Some(day) => {
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
                Ok((date, date))
            }
            None => month_range(year, month).ok_or_else(invalid),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TargetRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TargetRangeQuery {
    pub fn window(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        let (Some(start), Some(end)) = (self.start_date, self.end_date) else {
            return Err(AppError::bad_request(
                "Please provide both startDate and endDate in YYYY-MM-DD format.",
            ));
        };
        if start > end {
            return Err(AppError::bad_request("startDate cannot be after endDate."));
        }
        Ok((start, end))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetProgress {
    pub id: String,
    pub target_type: TargetType,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_amount: Decimal,
    pub achieved: Decimal,
    pub percentage: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetOverview {
    /// Keyed by target id.
    pub summary: BTreeMap<String, TargetProgress>,
    pub all_targets: Vec<SalesTarget>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TargetSaved {
    pub message: String,
    pub id: String,
}

pub fn target_id(target_type: TargetType, period: &str) -> String {
    format!("{}-{}", target_type.as_str(), period)
}

/// Period label for the target of `target_type` containing `date`:
/// `2024-03-04`, `2024-03`, `2024-Q1`, `2024`.
pub fn period_for(target_type: TargetType, date: NaiveDate) -> String {
    match target_type {
        TargetType::Daily => date.format("%Y-%m-%d").to_string(),
        TargetType::Monthly => date.format("%Y-%m").to_string(),
        TargetType::Quarterly => format!("{}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
        TargetType::Yearly => date.year().to_string(),
    }
}

/// Inclusive first and last day of a period label, or `None` if it does not parse.
pub fn period_range(target_type: TargetType, period: &str) -> Option<(NaiveDate, NaiveDate)> {
    match target_type {
        TargetType::Daily => {
            let day = NaiveDate::parse_from_str(period, "%Y-%m-%d").ok()?;
            Some((day, day))
        }
        TargetType::Monthly => {
            let (year, month) = period.split_once('-')?;
            month_range(year.parse().ok()?, month.parse().ok()?)
        }
        TargetType::Quarterly => {
            let (year, quarter) = period.split_once("-Q")?;
            let year: i32 = year.parse().ok()?;
            let quarter: u32 = quarter.parse().ok()?;
            if !(1..=4).contains(&quarter) {
                return None;
            }
            let (start, _) = month_range(year, (quarter - 1) * 3 + 1)?;
            let (_, end) = month_range(year, quarter * 3)?;
            Some((start, end))
        }
        TargetType::Yearly => {
            let year: i32 = period.parse().ok()?;
            Some((NaiveDate::from_ymd_opt(year, 1, 1)?, NaiveDate::from_ymd_opt(year, 12, 31)?))
        }
    }
}

fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

/// The target's period if it overlaps `start..=end`.
pub fn overlapping_period(
    target: &SalesTarget,
    start: NaiveDate,
    end: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let (from, to) = period_range(target.target_type, &target.period)?;
    (from <= end && to >= start).then_some((from, to))
}

pub fn achievement_percentage(achieved: Decimal, target: Decimal) -> Decimal {
    if target.is_zero() {
        Decimal::ZERO
    } else {
        (achieved / target * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn periods_for_each_target_type() {
        let date = d(2024, 8, 15);
        assert_eq!(period_for(TargetType::Daily, date), "2024-08-15");
        assert_eq!(period_for(TargetType::Monthly, date), "2024-08");
        assert_eq!(period_for(TargetType::Quarterly, date), "2024-Q3");
        assert_eq!(period_for(TargetType::Yearly, date), "2024");
        assert_eq!(target_id(TargetType::Quarterly, "2024-Q3"), "quarterly-2024-Q3");
    }

    #[test]
    fn period_ranges_cover_whole_periods() {
        assert_eq!(period_range(TargetType::Monthly, "2024-02"), Some((d(2024, 2, 1), d(2024, 2, 29))));
        assert_eq!(period_range(TargetType::Monthly, "2024-12"), Some((d(2024, 12, 1), d(2024, 12, 31))));
        assert_eq!(period_range(TargetType::Quarterly, "2024-Q2"), Some((d(2024, 4, 1), d(2024, 6, 30))));
        assert_eq!(period_range(TargetType::Yearly, "2023"), Some((d(2023, 1, 1), d(2023, 12, 31))));
        assert_eq!(period_range(TargetType::Quarterly, "2024-Q5"), None);
        assert_eq!(period_range(TargetType::Daily, "yesterday"), None);
    }

    fn target(target_type: TargetType, period: &str) -> SalesTarget {
        SalesTarget {
            id: target_id(target_type, period),
            target_type,
            period: period.into(),
            amount: Decimal::from(1000),
            description: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn month_and_day_windows() {
        let month = TargetQuery { year: Some(2024), month: Some(2), day: None };
        assert_eq!(month.window().unwrap(), (d(2024, 2, 1), d(2024, 2, 29)));
        let day = TargetQuery { day: Some(14), ..month };
        assert_eq!(day.window().unwrap(), (d(2024, 2, 14), d(2024, 2, 14)));

        match (TargetQuery { year: Some(2024), month: None, day: None }).window() {
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "Please provide year and month. Day is optional.")
            }
            _ => panic!("expected bad request"),
        }
    }

    #[test]
    fn range_window_rules() {
        let reversed = TargetRangeQuery { start_date: Some(d(2024, 3, 2)), end_date: Some(d(2024, 3, 1)) };
        assert!(matches!(reversed.window(), Err(AppError::BadRequest(m)) if m == "startDate cannot be after endDate."));
        let open = TargetRangeQuery { start_date: Some(d(2024, 3, 2)), end_date: None };
        assert!(open.window().is_err());
    }

    #[test]
    fn targets_overlapping_a_window() {
        let (start, end) = (d(2024, 3, 10), d(2024, 3, 10));
        assert!(overlapping_period(&target(TargetType::Daily, "2024-03-10"), start, end).is_some());
        assert!(overlapping_period(&target(TargetType::Daily, "2024-03-11"), start, end).is_none());
        assert_eq!(
            overlapping_period(&target(TargetType::Monthly, "2024-03"), start, end),
            Some((d(2024, 3, 1), d(2024, 3, 31)))
        );
        assert!(overlapping_period(&target(TargetType::Quarterly, "2024-Q1"), start, end).is_some());
        assert!(overlapping_period(&target(TargetType::Yearly, "2023"), start, end).is_none());
    }

    #[test]
    fn percentage_of_target() {
        assert_eq!(achievement_percentage(Decimal::from(750), Decimal::from(1000)), Decimal::from(75));
        assert_eq!(achievement_percentage(Decimal::from(10), Decimal::ZERO), Decimal::ZERO);
    }
}
