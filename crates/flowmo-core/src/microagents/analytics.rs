//! Analytics agent: productivity insights over the last hundred logs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::types::{
    local_hour, local_midnight, AgentData, Microagent, MicroagentContext, MicroagentResponse,
};
use crate::error::Result;
use crate::storage::{LogRow, TaskFilter};

const LOG_SAMPLE: usize = 100;
const WEEKLY_THRESHOLD_PCT: f64 = 10.0;
const FOCUS_THRESHOLD_PCT: f64 = 5.0;
const FOCUS_WINDOW: usize = 10;
const MIN_HOUR_SAMPLES: usize = 3;

pub const WELCOME_MESSAGE: &str =
    "Welcome to Flowmo! Start your first work session to get personalized insights.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub sessions: usize,
    pub total_minutes: f64,
    pub avg_focus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusTrend {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolumeTrend::Increasing => "increasing",
            VolumeTrend::Decreasing => "decreasing",
            VolumeTrend::Stable => "stable",
        })
    }
}

impl fmt::Display for FocusTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FocusTrend::Improving => "improving",
            FocusTrend::Declining => "declining",
            FocusTrend::Stable => "stable",
        })
    }
}

/// One productivity insight. `change` fields are absolute percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Insight {
    Welcome,
    DailySummary {
        today: DayStats,
        yesterday: DayStats,
    },
    WeeklyTrend {
        trend: VolumeTrend,
        change: f64,
    },
    OptimalTime {
        hour: u32,
        avg_focus: f64,
        session_count: usize,
    },
    CompletionRate {
        rate: u32,
        total: usize,
        completed: usize,
    },
    FocusTrend {
        trend: FocusTrend,
        change: f64,
    },
}

impl Insight {
    pub fn message(&self) -> String {
        match self {
            Insight::Welcome => WELCOME_MESSAGE.to_string(),
            Insight::DailySummary { today, .. } => format!(
                "Today: {} sessions, {} minutes focused",
                today.sessions,
                today.total_minutes.round()
            ),
            Insight::WeeklyTrend { trend, .. } => {
                format!("Your productivity is {trend} this week compared to last week")
            }
            Insight::OptimalTime { hour, avg_focus, .. } => format!(
                "Your most productive time is {hour}:00-{}:00 with {avg_focus:.0}% average focus",
                hour + 1
            ),
            Insight::CompletionRate { rate, .. } => {
                format!("Your task completion rate is {rate}%")
            }
            Insight::FocusTrend { trend, .. } => format!("Your focus scores are {trend}"),
        }
    }
}

/// Compare two weekly focus totals in minutes.
///
/// Stable when the relative change is under 10%; otherwise the direction
/// with the absolute change.
pub fn weekly_trend(last_week: f64, prior_week: f64) -> (VolumeTrend, f64) {
    let change = (last_week - prior_week) / prior_week.max(1.0) * 100.0;
    if change.abs() < WEEKLY_THRESHOLD_PCT {
        (VolumeTrend::Stable, change)
    } else if change > 0.0 {
        (VolumeTrend::Increasing, change.abs())
    } else {
        (VolumeTrend::Decreasing, change.abs())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsAgent;

impl AnalyticsAgent {
    pub fn insights(&self, context: &MicroagentContext<'_>) -> Result<Vec<Insight>> {
        let logs = context.store.recent_logs(&context.user_id, LOG_SAMPLE)?;
        if logs.is_empty() {
            return Ok(vec![Insight::Welcome]);
        }

        let now = context.now;
        let mut insights = Vec::new();

        let today_start = local_midnight(now.with_timezone(&chrono::Local).date_naive());
        let yesterday_start = local_midnight(
            (today_start.with_timezone(&chrono::Local) - Duration::hours(12)).date_naive(),
        );
        insights.push(Insight::DailySummary {
            today: day_stats(logs.iter().filter(|l| l.created_at >= today_start)),
            yesterday: day_stats(
                logs.iter()
                    .filter(|l| l.created_at >= yesterday_start && l.created_at < today_start),
            ),
        });

        let (last, prior) = weekly_totals(&logs, now);
        let (trend, change) = weekly_trend(last, prior);
        if trend != VolumeTrend::Stable {
            insights.push(Insight::WeeklyTrend { trend, change });
        }

        if let Some(best) = best_hour(&logs) {
            insights.push(best);
        }

        let tasks = context.store.tasks(&context.user_id, TaskFilter::all())?;
        let completed = tasks.iter().filter(|t| t.completed).count();
        let rate = if tasks.is_empty() {
            0
        } else {
            (completed as f64 / tasks.len() as f64 * 100.0).round() as u32
        };
        insights.push(Insight::CompletionRate {
            rate,
            total: tasks.len(),
            completed,
        });

        let (trend, change) = focus_trend(&logs);
        if trend != FocusTrend::Stable {
            insights.push(Insight::FocusTrend { trend, change });
        }

        Ok(insights)
    }
}

impl Microagent for AnalyticsAgent {
    fn name(&self) -> &'static str {
        "Analytics Agent"
    }

    fn description(&self) -> &'static str {
        "Provides productivity insights and performance analytics"
    }

    fn execute(&self, context: &MicroagentContext<'_>) -> MicroagentResponse {
        match self.insights(context) {
            Ok(insights) => {
                let messages = insights.iter().map(Insight::message).collect();
                MicroagentResponse::success(
                    "Productivity insights generated",
                    AgentData::Analytics { insights },
                    messages,
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, user = %context.user_id, "analytics failed");
                MicroagentResponse::failure(format!("Failed to generate productivity insights: {e}"))
            }
        }
    }
}

fn focus_of(log: &LogRow) -> f64 {
    log.focus_score.unwrap_or(0.0)
}

fn day_stats<'a>(logs: impl Iterator<Item = &'a LogRow>) -> DayStats {
    let mut stats = DayStats::default();
    let mut focus_sum = 0.0;
    for log in logs {
        stats.sessions += 1;
        stats.total_minutes += log.duration_min();
        focus_sum += focus_of(log);
    }
    if stats.sessions > 0 {
        stats.avg_focus = focus_sum / stats.sessions as f64;
    }
    stats
}

/// Focus minutes of the last seven days and of the seven before.
fn weekly_totals(logs: &[LogRow], now: DateTime<Utc>) -> (f64, f64) {
    let one_week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);
    let mut last = 0.0;
    let mut prior = 0.0;
    for log in logs {
        if log.created_at >= one_week_ago {
            last += log.duration_min();
        } else if log.created_at >= two_weeks_ago {
            prior += log.duration_min();
        }
    }
    (last, prior)
}

/// Local hour with the best average focus, among hours with at least
/// three logs and an average above zero. Earlier hours win ties.
fn best_hour(logs: &[LogRow]) -> Option<Insight> {
    let mut hours: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for log in logs {
        let entry = hours.entry(local_hour(log.created_at)).or_default();
        entry.0 += focus_of(log);
        entry.1 += 1;
    }

    let mut best: Option<Insight> = None;
    let mut best_avg = 0.0;
    for (hour, (total, count)) in hours {
        let avg = total / count as f64;
        if avg > best_avg && count >= MIN_HOUR_SAMPLES {
            best_avg = avg;
            best = Some(Insight::OptimalTime {
                hour,
                avg_focus: avg,
                session_count: count,
            });
        }
    }
    best
}

/// Newest ten logs against the ten before them.
fn focus_trend(logs: &[LogRow]) -> (FocusTrend, f64) {
    if logs.len() < FOCUS_WINDOW {
        return (FocusTrend::Stable, 0.0);
    }
    let (recent, rest) = logs.split_at(FOCUS_WINDOW);
    let older = &rest[..rest.len().min(FOCUS_WINDOW)];
    if older.is_empty() {
        return (FocusTrend::Stable, 0.0);
    }

    let mean = |rows: &[LogRow]| rows.iter().map(focus_of).sum::<f64>() / rows.len() as f64;
    let recent_avg = mean(recent);
    let older_avg = mean(older);
    let change = (recent_avg - older_avg) / older_avg.max(1.0) * 100.0;

    if change.abs() < FOCUS_THRESHOLD_PCT {
        (FocusTrend::Stable, change)
    } else if change > 0.0 {
        (FocusTrend::Improving, change.abs())
    } else {
        (FocusTrend::Declining, change.abs())
    }
}
