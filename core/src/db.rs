use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use crate::models::{AdviceRecord, MealEntry, MealType, UserGoals};
use crate::store::MealStore;

impl ToSql for MealType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MealType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// SQLite-backed [`MealStore`]. The connection sits behind a mutex so one
/// `Database` can be shared across request handlers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS meal_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    date TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL NOT NULL,
                    carbs REAL NOT NULL,
                    fat REAL NOT NULL,
                    energy_rating INTEGER NOT NULL,
                    hunger_rating INTEGER NOT NULL,
                    description TEXT,
                    logged_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE (user_id, date, meal_type)
                );

                CREATE TABLE IF NOT EXISTS user_goals (
                    user_id TEXT PRIMARY KEY,
                    calorie_goal REAL NOT NULL,
                    protein_goal REAL NOT NULL,
                    carb_goal REAL NOT NULL,
                    fat_goal REAL NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_meal_entries_user_date ON meal_entries(user_id, date);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS advice (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    date TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    advice TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_advice_user_date ON advice(user_id, date);

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    fn meal_entry_from_row(row: &Row<'_>) -> rusqlite::Result<MealEntry> {
        Ok(MealEntry {
            meal_type: row.get(0)?,
            calories: row.get(1)?,
            protein: row.get(2)?,
            carbs: row.get(3)?,
            fat: row.get(4)?,
            energy_rating: row.get(5)?,
            hunger_rating: row.get(6)?,
            description: row.get(7)?,
            timestamp: row.get(8)?,
        })
    }
}

impl MealStore for Database {
    fn get_meal_entries(&self, user_id: &str, date: NaiveDate) -> Result<Vec<MealEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT meal_type, calories, protein, carbs, fat, energy_rating, hunger_rating,
                    description, logged_at
             FROM meal_entries
             WHERE user_id = ?1 AND date = ?2
             ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![user_id, date], Self::meal_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read meal entries")?;
        Ok(entries)
    }

    fn put_meal_entry(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
        entry: &MealEntry,
    ) -> Result<()> {
        let now = Utc::now();
        let uuid = Uuid::new_v4().to_string();
        self.conn()
            .execute(
                "INSERT INTO meal_entries (uuid, user_id, date, meal_type, calories, protein, carbs, fat,
                                           energy_rating, hunger_rating, description, logged_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(user_id, date, meal_type) DO UPDATE SET
                    calories = excluded.calories,
                    protein = excluded.protein,
                    carbs = excluded.carbs,
                    fat = excluded.fat,
                    energy_rating = excluded.energy_rating,
                    hunger_rating = excluded.hunger_rating,
                    description = excluded.description,
                    logged_at = excluded.logged_at,
                    updated_at = excluded.updated_at",
                params![
                    uuid,
                    user_id,
                    date,
                    meal_type,
                    entry.calories,
                    entry.protein,
                    entry.carbs,
                    entry.fat,
                    entry.energy_rating,
                    entry.hunger_rating,
                    entry.description,
                    entry.timestamp,
                    now,
                ],
            )
            .context("Failed to write meal entry")?;
        Ok(())
    }

    fn get_goals(&self, user_id: &str) -> Result<Option<UserGoals>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT calorie_goal, protein_goal, carb_goal, fat_goal
             FROM user_goals WHERE user_id = ?1",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(UserGoals {
                calorie_goal: row.get(0)?,
                protein_goal: row.get(1)?,
                carb_goal: row.get(2)?,
                fat_goal: row.get(3)?,
            }))
        } else {
            Ok(None)
        }
    }

    fn put_goals(&self, user_id: &str, goals: &UserGoals) -> Result<()> {
        let now = Utc::now();
        self.conn()
            .execute(
                "INSERT INTO user_goals (user_id, calorie_goal, protein_goal, carb_goal, fat_goal, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                    calorie_goal = excluded.calorie_goal,
                    protein_goal = excluded.protein_goal,
                    carb_goal = excluded.carb_goal,
                    fat_goal = excluded.fat_goal,
                    updated_at = excluded.updated_at",
                params![
                    user_id,
                    goals.calorie_goal,
                    goals.protein_goal,
                    goals.carb_goal,
                    goals.fat_goal,
                    now,
                ],
            )
            .context("Failed to write goals")?;
        Ok(())
    }

    fn put_advice(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
        advice: &str,
    ) -> Result<()> {
        let uuid = Uuid::new_v4().to_string();
        self.conn()
            .execute(
                "INSERT INTO advice (uuid, user_id, date, meal_type, advice, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![uuid, user_id, date, meal_type, advice, Utc::now()],
            )
            .context("Failed to write advice")?;
        Ok(())
    }

    fn get_advice(&self, user_id: &str, date: NaiveDate) -> Result<Vec<AdviceRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT meal_type, advice, created_at
             FROM advice
             WHERE user_id = ?1 AND date = ?2
             ORDER BY id",
        )?;
        let records = stmt
            .query_map(params![user_id, date], |row| {
                Ok(AdviceRecord {
                    meal_type: row.get(0)?,
                    advice: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
