mod commands;
mod config;
mod inference_client;
mod logging;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;

use crate::commands::{
    MealArgs, cmd_advice, cmd_chat, cmd_context, cmd_goals_set, cmd_goals_show, cmd_health,
    cmd_history, cmd_log, cmd_summary,
};
use crate::config::Config;
use crate::inference_client::RemoteInference;
use platewise_core::db::Database;
use platewise_core::inference::InferenceCapability;
use platewise_core::orchestrator::CoachingOrchestrator;
use platewise_core::store::MealStore;

pub(crate) type Coach = CoachingOrchestrator<dyn MealStore, dyn InferenceCapability>;

#[derive(Parser)]
#[command(
    name = "platewise",
    version,
    about = "Meal logging with per-meal macro coaching"
)]
struct Cli {
    /// User whose meals to read and write (overrides config and PLATEWISE_USER)
    #[arg(short, long, global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a meal, replacing any earlier entry for the same meal and day
    Log {
        /// Meal type: breakfast, lunch, dinner, supper, snack
        meal: String,
        /// Calories (kcal)
        #[arg(long)]
        calories: Option<f64>,
        /// Protein (g)
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs (g)
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat (g)
        #[arg(long)]
        fat: Option<f64>,
        /// Estimate nutrients from a photo of the meal
        #[arg(long, value_name = "PATH")]
        image: Option<std::path::PathBuf>,
        /// How energetic you feel after the meal, 1-5
        #[arg(long, default_value = "3")]
        energy: u8,
        /// How hungry you still are after the meal, 1-5
        #[arg(long, default_value = "3")]
        hunger: u8,
        /// Short description of the meal
        #[arg(short, long)]
        description: Option<String>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily totals (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show totals for the last N days
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage daily calorie/macro goals
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Ask the nutrition assistant a question about today's intake
    Chat {
        /// Your question
        message: String,
        /// Day the question is about (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the context a chat turn would use
    Context {
        /// Date (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List coaching tips generated for a day
    Advice {
        /// Date (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the inference server is reachable
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum GoalsCommands {
    /// Set daily goals; omitted values keep their current setting
    Set {
        /// Daily calories (kcal)
        #[arg(long)]
        calories: Option<f64>,
        /// Daily protein (g)
        #[arg(long)]
        protein: Option<f64>,
        /// Daily carbs (g)
        #[arg(long)]
        carbs: Option<f64>,
        /// Daily fat (g)
        #[arg(long)]
        fat: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show goals and the per-meal limits derived from them
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    if let Err(e) = logging::init_tracing(level) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let user = cli.user.unwrap_or(config.user_id);
    let db = Database::open(&config.db_path)?;
    let inference = Arc::new(RemoteInference::new(&config.inference_url)?);
    let store: Arc<dyn MealStore> = Arc::new(db);
    let capability: Arc<dyn InferenceCapability> = inference.clone();
    let coach: Coach = CoachingOrchestrator::new(store, capability, config.coach)?;

    match cli.command {
        Commands::Log {
            meal,
            calories,
            protein,
            carbs,
            fat,
            image,
            energy,
            hunger,
            description,
            date,
            json,
        } => {
            let args = MealArgs {
                meal,
                calories,
                protein,
                carbs,
                fat,
                image,
                energy,
                hunger,
                description,
                date,
            };
            cmd_log(&coach, &user, args, json).await
        }
        Commands::Summary { date, json } => cmd_summary(&coach, &user, date, json),
        Commands::History { days, json } => cmd_history(&coach, &user, days, json),
        Commands::Goals { command } => match command {
            GoalsCommands::Set {
                calories,
                protein,
                carbs,
                fat,
                json,
            } => cmd_goals_set(&coach, &user, calories, protein, carbs, fat, json),
            GoalsCommands::Show { json } => cmd_goals_show(&coach, &user, json),
        },
        Commands::Chat {
            message,
            date,
            json,
        } => cmd_chat(&coach, &user, &message, date, json).await,
        Commands::Context { date, json } => cmd_context(&coach, &user, date, json),
        Commands::Advice { date, json } => cmd_advice(&coach, &user, date, json),
        Commands::Health { json } => cmd_health(&inference, json).await,
        Commands::Serve { port, bind } => server::start_server(coach, port, &bind).await,
    }
}
