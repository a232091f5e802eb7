use anyhow::Result;
use chrono::Local;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use platewise_core::models::MealType;

use super::helpers::{format_goals, format_macros, format_totals, no_neg_zero, parse_date};
use crate::Coach;

pub(crate) fn cmd_summary(coach: &Coach, user: &str, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let totals = coach.daily_totals(user, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    if totals.meal_count() == 0 {
        eprintln!("No meals logged for {date}");
        process::exit(2);
    }

    println!("=== {date} ===\n");
    for meal_type in MealType::ALL {
        let Some(entry) = totals.per_meal_type.get(&meal_type) else {
            continue;
        };
        let label = meal_type.as_str().to_uppercase();
        let desc = entry
            .description
            .as_ref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        println!(
            "  {label}{desc}: {} | energy {}/5, hunger {}/5",
            format_macros(entry.calories, entry.protein, entry.carbs, entry.fat),
            entry.energy_rating,
            entry.hunger_rating
        );
    }
    println!();
    println!("  TOTAL: {}", format_totals(&totals));

    if let Some(goals) = coach.goals(user)? {
        println!("  GOALS: {}", format_goals(&goals));
        println!(
            "  REMAINING: {}",
            format_macros(
                goals.calorie_goal - totals.calories,
                goals.protein_goal - totals.protein,
                goals.carb_goal - totals.carbs,
                goals.fat_goal - totals.fat
            )
        );
    }

    Ok(())
}

pub(crate) fn cmd_history(coach: &Coach, user: &str, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Meals")]
        meals: usize,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let today = Local::now().date_naive();
    let mut days_totals = Vec::new();

    for i in 0..days {
        let date = today - chrono::Duration::days(i64::from(i));
        days_totals.push(coach.daily_totals(user, date)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&days_totals)?);
        return Ok(());
    }

    if days_totals.iter().all(|t| t.meal_count() == 0) {
        eprintln!("No meals in the last {days} days");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = days_totals
        .iter()
        .map(|t| {
            let cal = no_neg_zero(t.calories);
            let p = no_neg_zero(t.protein);
            let c = no_neg_zero(t.carbs);
            let f = no_neg_zero(t.fat);
            HistoryRow {
                date: t.date.to_string(),
                meals: t.meal_count(),
                calories: format!("{cal:.0}"),
                protein: format!("{p:.0}g"),
                carbs: format!("{c:.0}g"),
                fat: format!("{f:.0}g"),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
