use anyhow::{Result, bail};

use platewise_core::models::{MealType, UserGoals};
use platewise_core::thresholds::ThresholdConfig;

use super::helpers::format_goals;
use crate::Coach;

/// Flags left unset keep the user's current value. Without a stored record
/// every goal has to be given.
fn merge_goals(
    current: Option<UserGoals>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
) -> Result<UserGoals> {
    if let Some(base) = current {
        return Ok(UserGoals {
            calorie_goal: calories.unwrap_or(base.calorie_goal),
            protein_goal: protein.unwrap_or(base.protein_goal),
            carb_goal: carbs.unwrap_or(base.carb_goal),
            fat_goal: fat.unwrap_or(base.fat_goal),
        });
    }

    match (calories, protein, carbs, fat) {
        (Some(calorie_goal), Some(protein_goal), Some(carb_goal), Some(fat_goal)) => {
            Ok(UserGoals {
                calorie_goal,
                protein_goal,
                carb_goal,
                fat_goal,
            })
        }
        _ => {
            let missing: Vec<&str> = [
                ("--calories", calories),
                ("--protein", protein),
                ("--carbs", carbs),
                ("--fat", fat),
            ]
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(flag, _)| *flag)
            .collect();
            bail!(
                "No goals set yet, so all four are required. Missing: {}",
                missing.join(", ")
            );
        }
    }
}

pub(crate) fn cmd_goals_set(
    coach: &Coach,
    user: &str,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    json: bool,
) -> Result<()> {
    let goals = merge_goals(coach.goals(user)?, calories, protein, carbs, fat)?;
    coach.update_goals(user, &goals)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        println!("Goals for {user}: {}", format_goals(&goals));
    }
    Ok(())
}

pub(crate) fn cmd_goals_show(coach: &Coach, user: &str, json: bool) -> Result<()> {
    let goals = coach.goals(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
        return Ok(());
    }

    let Some(goals) = goals else {
        eprintln!(
            "No goals set. Use `platewise goals set --calories <kcal> --protein <g> --carbs <g> --fat <g>`."
        );
        return Ok(());
    };

    println!("Daily goals: {}", format_goals(&goals));
    println!();
    for line in meal_limits(&goals, coach.thresholds()) {
        println!("  {line}");
    }
    Ok(())
}

/// One line per meal type with the per-meal limits the coach checks against.
fn meal_limits(goals: &UserGoals, config: &ThresholdConfig) -> Vec<String> {
    let share = config.macro_pct / 100.0;
    let macros = format!(
        "P:{:.0}g C:{:.0}g F:{:.0}g",
        goals.protein_goal * share,
        goals.carb_goal * share,
        goals.fat_goal * share
    );
    MealType::ALL
        .iter()
        .map(|meal_type| {
            let pct = config.calorie_pct(*meal_type);
            let kcal = goals.calorie_goal * pct / 100.0;
            format!("{:<9} up to {kcal:.0} kcal ({pct}%) | {macros}", meal_type.as_str())
        })
        .collect()
}
