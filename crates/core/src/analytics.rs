//! Dashboard analytics: aggregation of submitted applications into chart
//! series.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::application::ApplicationStatus;
use crate::types::Timestamp;

/// Label used for rows with a blank program or campus.
pub const UNSPECIFIED_LABEL: &str = "Unspecified";

/// The columns of one application the dashboard needs.
#[derive(Debug, Clone)]
pub struct SubmissionRow {
    pub status: ApplicationStatus,
    pub degree_program: String,
    pub campus: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total: i64,
    /// Every status, in lifecycle order, including zero counts.
    pub by_status: Vec<ChartPoint>,
    pub by_program: Vec<ChartPoint>,
    pub by_campus: Vec<ChartPoint>,
    /// `YYYY-MM` buckets from the first to the last month with submissions.
    pub monthly: Vec<ChartPoint>,
}

pub fn summarize(rows: &[SubmissionRow]) -> DashboardSummary {
    let by_status = ApplicationStatus::ALL
        .iter()
        .map(|status| ChartPoint {
            label: status.as_str().to_string(),
            count: rows.iter().filter(|r| r.status == *status).count() as i64,
        })
        .collect();

    DashboardSummary {
        total: rows.len() as i64,
        by_status,
        by_program: bar_series(rows.iter().map(|r| r.degree_program.as_str())),
        by_campus: bar_series(rows.iter().map(|r| r.campus.as_str())),
        monthly: monthly_series(rows),
    }
}

/// Count labels, sorted by count descending then label ascending.
fn bar_series<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<ChartPoint> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for label in labels {
        let label = label.trim();
        let label = if label.is_empty() { UNSPECIFIED_LABEL } else { label };
        *counts.entry(label.to_string()).or_default() += 1;
    }
    let mut points: Vec<ChartPoint> = counts
        .into_iter()
        .map(|(label, count)| ChartPoint { label, count })
        .collect();
    points.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    points
}

fn monthly_series(rows: &[SubmissionRow]) -> Vec<ChartPoint> {
    let months: Vec<(i32, u32)> = rows
        .iter()
        .map(|r| (r.created_at.year(), r.created_at.month()))
        .collect();
    let (Some(first), Some(last)) = (months.iter().min(), months.iter().max()) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let (mut year, mut month) = *first;
    while (year, month) <= *last {
        let count = months.iter().filter(|m| **m == (year, month)).count() as i64;
        let label = NaiveDate::from_ymd_opt(year, month, 1)
            .map(|d| d.format("%Y-%m").to_string())
            .unwrap_or_else(|| format!("{year:04}-{month:02}"));
        series.push(ChartPoint { label, count });
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    series
}
