/*!
 * Query adapters.
 *
 * A `QueryAdapter` supplies the dialect-specific SQL text for every logical
 * operation of the data store, its ordered migration scripts and the way a
 * freshly inserted row id is obtained.
 */

use crate::app_config::DbDriver;
use crate::errors::Result;
use crate::model::SearchField;

use super::connection::SqlConnection;
use super::postgres_adapter::PostgresAdapter;
use super::sqlite_adapter::SqliteAdapter;

/// Back-end specific SQL for the data store and the migration engine
pub trait QueryAdapter: Send + Sync {
    /// The back-end this adapter speaks to
    fn driver(&self) -> DbDriver;

    /// Whether inserts report their id through the driver (`true`) or through
    /// an `INSERT ... RETURNING id` row (`false`)
    fn supports_last_insert_id(&self) -> bool;

    /// Connection setup run once when the data store is built
    fn post_create(&self, _conn: &mut dyn SqlConnection) -> Result<()> {
        Ok(())
    }

    // Inserts. Without last-insert-id support they must return the new id.
    fn create_domain_query(&self) -> &'static str;
    fn create_string_query(&self) -> &'static str;
    fn create_translation_query(&self) -> &'static str;
    fn create_language_query(&self) -> &'static str;

    fn get_all_domains_query(&self) -> &'static str;
    fn get_all_languages_query(&self) -> &'static str;

    /// Flat join rows of one domain: domain id, string id, string name,
    /// language id, language code, translation id, content
    fn get_single_domain_query(&self) -> &'static str;
    fn get_single_domain_id_query(&self) -> &'static str;
    fn get_single_language_query(&self) -> &'static str;
    fn get_single_string_id_query(&self) -> &'static str;
    fn get_single_translation_id_query(&self) -> &'static str;

    fn update_translation_query(&self) -> &'static str;
    fn delete_string_query(&self) -> &'static str;
    fn delete_translation_query(&self) -> &'static str;

    /// Search rows: domain name, string name, language code, content.
    /// The `All` variant binds the pattern twice.
    fn search_query(&self, field: SearchField) -> &'static str;

    // Version bookkeeping
    fn create_version_table_query(&self) -> &'static str;
    fn count_version_rows_query(&self) -> &'static str;
    fn insert_initial_version_query(&self) -> &'static str;
    fn get_version_query(&self) -> &'static str;
    fn update_version_query(&self) -> &'static str;

    /// Up scripts; index `i` migrates to version `i + 1`
    fn up_scripts(&self) -> &'static [&'static str];

    /// Down scripts; index `i` migrates from version `i + 1` to `i`
    fn down_scripts(&self) -> &'static [&'static str];
}

/// Select the adapter for a back-end
pub fn adapter_for(driver: DbDriver) -> Box<dyn QueryAdapter> {
    match driver {
        DbDriver::Sqlite3 => Box::new(SqliteAdapter),
        DbDriver::Postgres => Box::new(PostgresAdapter),
    }
}

/// Select the adapter for a back-end name as written in configuration
pub fn adapter_for_name(driver: &str) -> Result<Box<dyn QueryAdapter>> {
    Ok(adapter_for(driver.parse()?))
}
