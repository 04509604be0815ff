/*!
 * Schema migrations.
 *
 * The schema version lives in a single-row `schema_migrations` table. Each
 * adapter supplies an ordered list of up scripts (index `i` moves the schema to
 * version `i + 1`) and the matching down scripts. Migrations run one script at
 * a time; a failing script stops the run and applied steps stay applied.
 */

use log::{debug, info};

use crate::errors::{MigrationFailure, Result, StoreError};

use super::adapter::QueryAdapter;
use super::connection::SqlConnection;

/// Create the version table if needed and seed it with version 0.
///
/// Fails with `CorruptVersionTable` when the table holds more than one row.
pub fn ensure_version_table_exists(
    conn: &mut dyn SqlConnection,
    adapter: &dyn QueryAdapter,
) -> Result<()> {
    conn.execute(adapter.create_version_table_query(), &[])?;

    let count = conn
        .query_opt(adapter.count_version_rows_query(), &[])?
        .map(|row| row.i64(0))
        .transpose()?
        .unwrap_or(0);

    match count {
        0 => {
            debug!("Seeding schema_migrations with version 0");
            conn.execute(adapter.insert_initial_version_query(), &[])?;
            Ok(())
        }
        1 => Ok(()),
        n => Err(StoreError::CorruptVersionTable(n)),
    }
}

/// Current schema version, 0 when no version row exists
pub fn version(conn: &mut dyn SqlConnection, adapter: &dyn QueryAdapter) -> Result<i64> {
    match conn.query_opt(adapter.get_version_query(), &[])? {
        Some(row) => row.i64(0),
        None => Ok(0),
    }
}

fn update_version(
    conn: &mut dyn SqlConnection,
    adapter: &dyn QueryAdapter,
    version: i64,
) -> Result<()> {
    conn.execute(adapter.update_version_query(), &[version.into()])?;
    Ok(())
}

/// Apply every up script above the current version.
///
/// Returns the version reached, or the last version reached together with the
/// error that stopped the run.
pub fn migrate_up(
    conn: &mut dyn SqlConnection,
    adapter: &dyn QueryAdapter,
) -> std::result::Result<i64, MigrationFailure> {
    let fail = |version: i64| move |source: StoreError| MigrationFailure { version, source };

    ensure_version_table_exists(conn, adapter).map_err(fail(0))?;
    let start = version(conn, adapter).map_err(fail(0))?;

    let mut current = start;
    for (i, script) in adapter.up_scripts().iter().enumerate() {
        let target = i as i64 + 1;
        if target <= start {
            continue;
        }

        info!("Migrating {} schema to version {}", adapter.driver(), target);
        conn.execute_batch(script).map_err(fail(current))?;
        update_version(conn, adapter, target).map_err(fail(current))?;
        current = target;
    }

    if current == start {
        debug!("Schema is up to date (v{})", current);
    }
    Ok(current)
}

/// Apply the down scripts in reverse order, skipping versions above the
/// current one, ending at version 0
pub fn migrate_down(
    conn: &mut dyn SqlConnection,
    adapter: &dyn QueryAdapter,
) -> std::result::Result<i64, MigrationFailure> {
    let fail = |version: i64| move |source: StoreError| MigrationFailure { version, source };

    ensure_version_table_exists(conn, adapter).map_err(fail(0))?;
    let start = version(conn, adapter).map_err(fail(0))?;

    let mut current = start;
    for (i, script) in adapter.down_scripts().iter().enumerate().rev() {
        let from = i as i64 + 1;
        let target = i as i64;
        if from > start {
            continue;
        }

        info!("Reverting {} schema to version {}", adapter.driver(), target);
        conn.execute_batch(script).map_err(fail(current))?;
        update_version(conn, adapter, target).map_err(fail(current))?;
        current = target;
    }

    Ok(current)
}
