use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::path::PathBuf;
use std::str::FromStr;

use platewise_core::models::{MealEntry, MealEstimate, MealType};

use super::helpers::{format_macros, parse_date, print_coaching_result};
use crate::Coach;

/// Nutrients typed on the command line. Any of them overrides the photo
/// estimate when `--image` is also given.
pub(crate) struct MealArgs {
    pub meal: String,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub image: Option<PathBuf>,
    pub energy: u8,
    pub hunger: u8,
    pub description: Option<String>,
    pub date: Option<String>,
}

pub(crate) async fn cmd_log(coach: &Coach, user: &str, args: MealArgs, json: bool) -> Result<()> {
    let meal_type = MealType::from_str(&args.meal)?;
    let date = parse_date(args.date.clone())?;

    let estimate = match &args.image {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            if !json {
                eprintln!("Analyzing photo, this can take a while...");
            }
            let estimate = coach.analyze_meal_image(&bytes).await?;
            if !json {
                eprintln!(
                    "Estimated: {}",
                    format_macros(
                        estimate.calories,
                        estimate.protein,
                        estimate.carbs,
                        estimate.fat
                    )
                );
            }
            Some(estimate)
        }
        None => None,
    };

    let entry = build_entry(meal_type, &args, estimate)?;
    let result = coach.on_meal_logged(user, date, meal_type, entry).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if let Some(logged) = result.daily_totals.per_meal_type.get(&meal_type) {
            println!(
                "Logged {meal_type} for {date}: {}",
                format_macros(logged.calories, logged.protein, logged.carbs, logged.fat)
            );
        }
        print_coaching_result(&result);
    }

    Ok(())
}

fn build_entry(
    meal_type: MealType,
    args: &MealArgs,
    estimate: Option<MealEstimate>,
) -> Result<MealEntry> {
    let Some(estimate) = estimate else {
        let (Some(calories), Some(protein), Some(carbs), Some(fat)) =
            (args.calories, args.protein, args.carbs, args.fat)
        else {
            bail!("Provide --calories, --protein, --carbs and --fat, or a photo with --image");
        };
        return Ok(MealEntry {
            meal_type,
            calories,
            protein,
            carbs,
            fat,
            energy_rating: args.energy,
            hunger_rating: args.hunger,
            description: args.description.clone(),
            timestamp: Utc::now(),
        });
    };

    let mut entry = estimate.into_entry(meal_type, args.energy, args.hunger);
    entry.calories = args.calories.unwrap_or(entry.calories);
    entry.protein = args.protein.unwrap_or(entry.protein);
    entry.carbs = args.carbs.unwrap_or(entry.carbs);
    entry.fat = args.fat.unwrap_or(entry.fat);
    if args.description.is_some() {
        entry.description.clone_from(&args.description);
    }
    Ok(entry)
}
