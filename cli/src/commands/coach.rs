use anyhow::Result;
use std::process;

use super::helpers::{format_goals, format_totals, json_error, parse_date};
use crate::Coach;
use crate::inference_client::{CHAT_FALLBACK, RemoteInference};

pub(crate) async fn cmd_chat(
    coach: &Coach,
    user: &str,
    message: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;

    match coach.chat(user, date, message).await {
        Ok(reply) => {
            if json {
                println!("{}", serde_json::json!({ "response": reply }));
            } else {
                println!("{reply}");
            }
            Ok(())
        }
        Err(err) if err.is_inference() => {
            tracing::warn!(error = %err, "chat reply failed");
            if json {
                println!("{}", json_error(CHAT_FALLBACK));
            } else {
                eprintln!("{CHAT_FALLBACK}");
            }
            process::exit(3);
        }
        Err(err) => Err(err.into()),
    }
}

/// Print the brief a chat turn would be grounded on.
pub(crate) fn cmd_context(coach: &Coach, user: &str, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let context = coach.build_chat_context(user, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
    } else {
        println!("=== {date} ===\n");
        println!("  TODAY: {}", format_totals(&context.today_totals));
        match &context.goals {
            Some(goals) => println!("  GOALS: {}", format_goals(goals)),
            None => println!("  GOALS: not set"),
        }
        println!("\n  {}", context.describe());
    }
    Ok(())
}

pub(crate) fn cmd_advice(coach: &Coach, user: &str, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let records = coach.advice_for(user, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No tips for {date}");
        process::exit(2);
    }

    for record in &records {
        let time = record.created_at.with_timezone(&chrono::Local).format("%H:%M");
        println!("[{time}] {}: {}", record.meal_type, record.advice);
    }
    Ok(())
}

pub(crate) async fn cmd_health(inference: &RemoteInference, json: bool) -> Result<()> {
    let health = inference.check_health().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&health)?);
    } else {
        let model = health.model.as_deref().unwrap_or("unknown model");
        println!(
            "{}: {} ({model})",
            inference.base_url(),
            health.status
        );
    }
    Ok(())
}
