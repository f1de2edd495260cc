//! Preference storage
//!
//! One row per game version holds the selected items and the last build path
//! as JSON; have-already quantities live in their own table.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use rusqlite::{Connection, OptionalExtension};

use crate::models::Preferences;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            version TEXT PRIMARY KEY,
            selected_items TEXT NOT NULL,
            build_path TEXT NOT NULL
        );

        -- Quantities the user already has, in entry order
        CREATE TABLE IF NOT EXISTS have_already (
            version TEXT NOT NULL,
            item TEXT NOT NULL,
            amount INTEGER NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (version, item)
        );

        CREATE INDEX IF NOT EXISTS idx_have_already_version ON have_already(version, position);
        "#,
    )?;
    Ok(())
}

/// Load the saved preferences for `version`, or empty ones if none exist
pub fn load_preferences(conn: &Connection, version: &str) -> Result<Preferences> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT selected_items, build_path FROM preferences WHERE version = ?1",
            [version],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let mut preferences = Preferences {
        version: version.to_string(),
        ..Preferences::default()
    };

    if let Some((selected_items, build_path)) = row {
        preferences.selected_items =
            serde_json::from_str(&selected_items).context("stored selected items are not valid JSON")?;
        preferences.build_path = serde_json::from_str(&build_path).context("stored build path is not valid JSON")?;
    }

    let mut stmt = conn.prepare(
        "SELECT item, amount FROM have_already
         WHERE version = ?1
         ORDER BY position",
    )?;
    let rows = stmt.query_map([version], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?;

    let mut have_already = IndexMap::new();
    for row in rows {
        let (item, amount) = row?;
        have_already.insert(item, amount);
    }
    preferences.have_already = have_already;

    Ok(preferences)
}

/// Replace everything stored for `preferences.version`
pub fn save_preferences(conn: &Connection, preferences: &Preferences) -> Result<()> {
    let selected_items = serde_json::to_string(&preferences.selected_items)?;
    let build_path = serde_json::to_string(&preferences.build_path)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT OR REPLACE INTO preferences (version, selected_items, build_path)
         VALUES (?1, ?2, ?3)",
        (&preferences.version, &selected_items, &build_path),
    )?;

    tx.execute("DELETE FROM have_already WHERE version = ?1", [&preferences.version])?;
    for (position, (item, amount)) in preferences.have_already.iter().enumerate() {
        tx.execute(
            "INSERT INTO have_already (version, item, amount, position)
             VALUES (?1, ?2, ?3, ?4)",
            (&preferences.version, item, amount, position as i64),
        )?;
    }

    tx.commit().context("failed to save preferences")?;
    Ok(())
}

/// Forget everything stored for `version`
pub fn clear_preferences(conn: &Connection, version: &str) -> Result<()> {
    conn.execute("DELETE FROM have_already WHERE version = ?1", [version])?;
    conn.execute("DELETE FROM preferences WHERE version = ?1", [version])?;
    Ok(())
}
