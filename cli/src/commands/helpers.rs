use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use platewise_core::models::{Advisory, CoachingResult, DailyTotals, UserGoals};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn format_macros(calories: f64, protein: f64, carbs: f64, fat: f64) -> String {
    let (calories, protein, carbs, fat) = (
        no_neg_zero(calories),
        no_neg_zero(protein),
        no_neg_zero(carbs),
        no_neg_zero(fat),
    );
    format!("{calories:.0} kcal | P:{protein:.0}g C:{carbs:.0}g F:{fat:.0}g")
}

pub(crate) fn format_totals(totals: &DailyTotals) -> String {
    format_macros(totals.calories, totals.protein, totals.carbs, totals.fat)
}

pub(crate) fn format_goals(goals: &UserGoals) -> String {
    format_macros(
        goals.calorie_goal,
        goals.protein_goal,
        goals.carb_goal,
        goals.fat_goal,
    )
}

/// Human-readable report of a logged meal: totals, what went over, the tip.
pub(crate) fn print_coaching_result(result: &CoachingResult) {
    let decision = &result.decision;
    println!("  TODAY: {}", format_totals(&result.daily_totals));

    if decision.incomplete_goals {
        eprintln!("Note: some goals are not set, run `platewise goals set` to enable every check");
    }

    if decision.exceeded.is_empty() {
        println!("  This {} is within your targets.", decision.meal_type);
    } else {
        let over: Vec<String> = decision.exceeded.iter().map(ToString::to_string).collect();
        println!("  Over target for this {}: {}", decision.meal_type, over.join(", "));
    }

    if let Some(advice) = &result.advice {
        println!("\n  Tip: {advice}");
    }
    if let Some(advisory) = &result.advisory {
        eprintln!("Warning: {}", describe_advisory(advisory));
    }
}

fn describe_advisory(advisory: &Advisory) -> String {
    match advisory {
        Advisory::InferenceUnavailable { message } => {
            format!("meal saved, but no tip could be generated ({message})")
        }
        Advisory::InferenceTimeout { after_ms } => {
            format!("meal saved, but the tip timed out after {}s", after_ms / 1000)
        }
        Advisory::AdviceNotRecorded { message } => {
            format!("tip shown but could not be saved ({message})")
        }
    }
}
