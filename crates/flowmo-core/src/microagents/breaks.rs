//! Break agent: rest suggestions from the last working day.

use chrono::{DateTime, Duration, Utc};

use super::types::{
    AgentData, BreakRecommendation, BreakRecommendationType, Microagent, MicroagentContext,
    MicroagentResponse, WorkSession,
};

const LOOKBACK_HOURS: i64 = 8;
const STREAK_GAP_MINUTES: i64 = 5;
const STREAK_FOR_MENTAL_BREAK: usize = 3;
const SCREEN_TIME_LIMIT_MIN: f64 = 120.0;
const SEDENTARY_LIMIT_MIN: f64 = 60.0;
const LOW_FOCUS_SCORE: f64 = 60.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct BreakAgent;

impl BreakAgent {
    pub fn recommendations(&self, context: &MicroagentContext<'_>) -> Vec<BreakRecommendation> {
        let lookback = Duration::hours(LOOKBACK_HOURS);
        let mut recent: Vec<(&WorkSession, DateTime<Utc>)> = context
            .work_session_history
            .iter()
            .filter_map(|s| s.end_time.map(|end| (s, end)))
            .filter(|(_, end)| context.now - *end < lookback)
            .collect();
        recent.sort_by(|a, b| b.0.start_time.cmp(&a.0.start_time));

        let mut recommendations = Vec::new();

        let streak = consecutive_sessions(&recent);
        if streak >= STREAK_FOR_MENTAL_BREAK {
            recommendations.push(BreakRecommendation {
                kind: BreakRecommendationType::MentalBreak,
                message: format!(
                    "You've completed {streak} consecutive work sessions. Take a longer break to recharge."
                ),
                duration: context.user_preferences.long_break_duration,
                confidence: 0.9,
                activities: activities(&[
                    "Meditate for 5 minutes",
                    "Take a short walk",
                    "Do some light stretching",
                ]),
            });
        }

        let screen_time: f64 = recent
            .iter()
            .map(|(s, end)| minutes(*end - s.start_time))
            .sum();
        if screen_time > SCREEN_TIME_LIMIT_MIN {
            recommendations.push(BreakRecommendation {
                kind: BreakRecommendationType::EyeBreak,
                message: "You've been working for over 2 hours. Give your eyes a rest with the 20-20-20 rule.".into(),
                duration: 2,
                confidence: 0.8,
                activities: activities(&[
                    "Look at something 20 feet away for 20 seconds",
                    "Blink frequently",
                    "Use eye drops if needed",
                ]),
            });
        }

        if let Some(last_end) = recent.iter().map(|(_, end)| *end).max() {
            let sedentary = minutes(context.now - last_end);
            if sedentary > SEDENTARY_LIMIT_MIN {
                recommendations.push(BreakRecommendation {
                    kind: BreakRecommendationType::StretchBreak,
                    message: format!(
                        "You've been sitting for {} minutes. Time to stretch and move around!",
                        sedentary.round()
                    ),
                    duration: 5,
                    confidence: 0.7,
                    activities: activities(&[
                        "Neck rolls and shoulder shrugs",
                        "Stand up and walk around",
                        "Do some light stretching exercises",
                    ]),
                });
            }
        }

        let newest_score = recent.first().and_then(|(s, _)| s.focus_score);
        if newest_score.is_some_and(|score| score < LOW_FOCUS_SCORE) {
            recommendations.push(BreakRecommendation {
                kind: BreakRecommendationType::MicroBreak,
                message: "Your focus score is dropping. A quick micro-break might help refresh your concentration.".into(),
                duration: 1,
                confidence: 0.6,
                activities: activities(&[
                    "Take 3 deep breaths",
                    "Drink some water",
                    "Look away from the screen for a moment",
                ]),
            });
        }

        recommendations
    }
}

impl Microagent for BreakAgent {
    fn name(&self) -> &'static str {
        "Break Agent"
    }

    fn description(&self) -> &'static str {
        "Provides intelligent break recommendations and wellness suggestions"
    }

    fn execute(&self, context: &MicroagentContext<'_>) -> MicroagentResponse {
        let recommendations = self.recommendations(context);
        let messages = recommendations.iter().map(|r| r.message.clone()).collect();
        MicroagentResponse::success(
            "Break recommendations generated",
            AgentData::Break { recommendations },
            messages,
        )
    }
}

/// Length of the run of back-to-back sessions at the head of the list.
///
/// Two neighbours are back-to-back when the later one starts less than
/// five minutes after the earlier one ended, whichever order they are
/// listed in.
fn consecutive_sessions(sessions: &[(&WorkSession, DateTime<Utc>)]) -> usize {
    if sessions.is_empty() {
        return 0;
    }
    let limit = Duration::minutes(STREAK_GAP_MINUTES);
    let mut count = 1;
    for pair in sessions.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (earlier, later) = if a.0.start_time <= b.0.start_time { (a, b) } else { (b, a) };
        if later.0.start_time - earlier.1 < limit {
            count += 1;
        } else {
            break;
        }
    }
    count
}

fn minutes(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 60_000.0
}

fn activities(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
