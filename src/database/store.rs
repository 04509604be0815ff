/*!
 * The data store.
 *
 * `DataStore` is the single entry point for persistence. It owns one SQL
 * connection (locked per statement), the query adapter of its back-end, two
 * lazily filled id caches and the operation statistics.
 *
 * Lookups of domains and strings go through the caches; inserts are
 * create-or-get. When a concurrent writer wins the insert race the backend
 * reports a uniqueness violation and the lookup is retried once.
 */

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::app_config::{DatabaseConfig, DbDriver};
use crate::errors::{MigrationFailure, Result, StoreError};
use crate::model::{
    Domain, Language, SearchField, SearchHit, StringEntry, TranslatableString, Translation,
    TranslationDomain,
};

use super::adapter::{adapter_for, adapter_for_name, QueryAdapter};
use super::connection::{self, SqlConnection, SqlValue, SqliteConnection};
use super::schema;
use super::stats::Stats;

/// Driver-agnostic access to translation data
pub struct DataStore {
    adapter: Box<dyn QueryAdapter>,
    conn: Mutex<Box<dyn SqlConnection>>,
    /// Domain name -> domain id
    domain_cache: Mutex<HashMap<String, i64>>,
    /// (domain id, string name) -> string id
    string_cache: Mutex<HashMap<(i64, String), i64>>,
    stats: Stats,
}

impl DataStore {
    /// Create a data store over an open connection.
    ///
    /// `driver` selects the query adapter and must be `sqlite3` or `postgres`.
    pub fn new(conn: Box<dyn SqlConnection>, driver: &str) -> Result<Self> {
        let adapter = adapter_for_name(driver)?;
        Self::with_adapter(conn, adapter)
    }

    /// Create a data store with an explicit adapter, running its connection setup
    pub fn with_adapter(
        mut conn: Box<dyn SqlConnection>,
        adapter: Box<dyn QueryAdapter>,
    ) -> Result<Self> {
        adapter.post_create(conn.as_mut())?;

        Ok(Self {
            adapter,
            conn: Mutex::new(conn),
            domain_cache: Mutex::new(HashMap::new()),
            string_cache: Mutex::new(HashMap::new()),
            stats: Stats::new(),
        })
    }

    /// Connect to the configured database.
    ///
    /// The driver is checked before any connection attempt.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let adapter = adapter_for(config.driver()?);
        let conn = connection::open(config)?;
        Self::with_adapter(conn, adapter)
    }

    /// Create a data store over an in-memory SQLite database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = SqliteConnection::open_in_memory()?;
        Self::with_adapter(Box::new(conn), adapter_for(DbDriver::Sqlite3))
    }

    pub fn driver(&self) -> DbDriver {
        self.adapter.driver()
    }

    /// Timing statistics of every operation run so far
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    // =========================================================================
    // Schema
    // =========================================================================

    pub fn ensure_version_table_exists(&self) -> Result<()> {
        let mut conn = self.conn.lock();
        schema::ensure_version_table_exists(conn.as_mut(), self.adapter.as_ref())
    }

    pub fn version(&self) -> Result<i64> {
        let mut conn = self.conn.lock();
        schema::version(conn.as_mut(), self.adapter.as_ref())
    }

    /// Migrate the schema to the newest version
    pub fn migrate_up(&self) -> std::result::Result<i64, MigrationFailure> {
        let mut conn = self.conn.lock();
        let version = schema::migrate_up(conn.as_mut(), self.adapter.as_ref())?;
        info!("Database schema at version {}", version);
        Ok(version)
    }

    /// Revert every migration; cached ids are dropped with the tables
    pub fn migrate_down(&self) -> std::result::Result<i64, MigrationFailure> {
        let result = {
            let mut conn = self.conn.lock();
            schema::migrate_down(conn.as_mut(), self.adapter.as_ref())
        };
        self.clear_caches();
        let version = result?;
        info!("Database schema at version {}", version);
        Ok(version)
    }

    fn clear_caches(&self) {
        self.domain_cache.lock().clear();
        self.string_cache.lock().clear();
    }

    // =========================================================================
    // Statement helpers
    // =========================================================================

    fn query_id(&self, sql: &str, params: &[SqlValue]) -> Result<Option<i64>> {
        self.conn
            .lock()
            .query_opt(sql, params)?
            .map(|row| row.i64(0))
            .transpose()
    }

    /// Run an insert and return the new row id, using the adapter's strategy
    fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64> {
        let mut conn = self.conn.lock();
        if self.adapter.supports_last_insert_id() {
            conn.execute(sql, params)?;
            conn.last_insert_id()
        } else {
            conn.query_opt(sql, params)?
                .ok_or_else(|| StoreError::Storage("insert returned no id".to_string()))?
                .i64(0)
        }
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.conn.lock().execute(sql, params)
    }

    // =========================================================================
    // Domains
    // =========================================================================

    fn get_domain_id(&self, name: &str) -> Result<i64> {
        let _timer = self.stats.timer("domain", "get");

        if let Some(id) = self.domain_cache.lock().get(name) {
            return Ok(*id);
        }

        let id = self
            .query_id(self.adapter.get_single_domain_id_query(), &[name.into()])?
            .ok_or_else(|| StoreError::not_found("domain", name))?;
        self.domain_cache.lock().insert(name.to_string(), id);
        Ok(id)
    }

    fn create_domain(&self, name: &str) -> Result<i64> {
        let _timer = self.stats.timer("domain", "insert");
        debug!("Creating domain '{}'", name);

        let id = self.insert(self.adapter.create_domain_query(), &[name.into()])?;
        self.domain_cache.lock().insert(name.to_string(), id);
        Ok(id)
    }

    /// Id of the named domain, creating the domain when it does not exist
    pub fn get_or_create_domain(&self, name: &str) -> Result<i64> {
        match self.get_domain_id(name) {
            Err(e) if e.is_not_found() => match self.create_domain(name) {
                Err(StoreError::UniqueViolation(_)) => {
                    debug!("Domain '{}' was created concurrently, looking it up again", name);
                    self.get_domain_id(name)
                }
                other => other,
            },
            other => other,
        }
    }

    /// All domains, sorted by name. Only the names are populated.
    pub fn get_domain_list(&self) -> Result<Vec<Domain>> {
        let _timer = self.stats.timer("domain", "get");

        let rows = self
            .conn
            .lock()
            .query(self.adapter.get_all_domains_query(), &[])?;

        rows.iter().map(|row| Ok(Domain::new(row.string(0)?))).collect()
    }

    /// Every string of the named domain with all of its translations.
    ///
    /// Strings keep the query's name ordering; strings without translations
    /// are included with an empty translation map.
    pub fn get_full_domain(&self, name: &str) -> Result<Domain> {
        let _timer = self.stats.timer("domain", "get");

        let rows = self
            .conn
            .lock()
            .query(self.adapter.get_single_domain_query(), &[name.into()])?;

        if rows.is_empty() {
            return Err(StoreError::not_found("domain", name));
        }

        let mut domain = Domain::new(name);
        let mut string_index: HashMap<String, usize> = HashMap::new();

        for row in &rows {
            // A domain without strings yields a single row of NULLs
            let Some(string_id) = row.opt_i64(1)? else {
                continue;
            };
            let string_name = row.string(2)?;

            let idx = match string_index.get(&string_name).copied() {
                Some(idx) => idx,
                None => {
                    let mut entry = StringEntry::new(string_name.clone());
                    entry.id = Some(string_id);
                    domain.strings.push(entry);
                    string_index.insert(string_name, domain.strings.len() - 1);
                    domain.strings.len() - 1
                }
            };

            if let (Some(code), Some(translation_id)) = (row.opt_str(4)?, row.opt_i64(5)?) {
                let translation = Translation {
                    id: Some(translation_id),
                    content: row.string(6)?,
                };
                domain.strings[idx]
                    .translations
                    .insert(code.to_string(), translation);
            }
        }

        Ok(domain)
    }

    // =========================================================================
    // Strings
    // =========================================================================

    fn get_string_id(&self, name: &str, domain_id: i64) -> Result<i64> {
        let _timer = self.stats.timer("string", "get");

        let key = (domain_id, name.to_string());
        if let Some(id) = self.string_cache.lock().get(&key) {
            return Ok(*id);
        }

        let id = self
            .query_id(
                self.adapter.get_single_string_id_query(),
                &[name.into(), domain_id.into()],
            )?
            .ok_or_else(|| StoreError::not_found("string", name))?;
        self.string_cache.lock().insert(key, id);
        Ok(id)
    }

    fn create_string(&self, name: &str, domain_id: i64) -> Result<i64> {
        let _timer = self.stats.timer("string", "insert");

        let id = self.insert(
            self.adapter.create_string_query(),
            &[name.into(), domain_id.into()],
        )?;
        self.string_cache
            .lock()
            .insert((domain_id, name.to_string()), id);
        Ok(id)
    }

    /// Id of the named string in the domain, creating the string when needed
    pub fn get_or_create_string(&self, name: &str, domain_id: i64) -> Result<i64> {
        match self.get_string_id(name, domain_id) {
            Err(e) if e.is_not_found() => match self.create_string(name, domain_id) {
                Err(StoreError::UniqueViolation(_)) => {
                    debug!("String '{}' was created concurrently, looking it up again", name);
                    self.get_string_id(name, domain_id)
                }
                other => other,
            },
            other => other,
        }
    }

    /// Delete a string and, through the cascade, its translations
    pub fn delete_string(&self, domain_name: &str, string_name: &str) -> Result<()> {
        let domain_id = self.get_domain_id(domain_name)?;
        let string_id = self.get_string_id(string_name, domain_id)?;

        let _timer = self.stats.timer("string", "delete");
        self.execute(self.adapter.delete_string_query(), &[string_id.into()])?;
        self.string_cache
            .lock()
            .remove(&(domain_id, string_name.to_string()));

        debug!("Deleted string '{}' from domain '{}'", string_name, domain_name);
        Ok(())
    }

    // =========================================================================
    // Languages
    // =========================================================================

    /// The language registered under a code
    pub fn get_language(&self, code: &str) -> Result<Language> {
        let _timer = self.stats.timer("language", "get");

        let row = self
            .conn
            .lock()
            .query_opt(self.adapter.get_single_language_query(), &[code.into()])?
            .ok_or_else(|| StoreError::not_found("language", code))?;

        Ok(Language::new(row.i64(0)?, row.string(1)?, row.string(2)?))
    }

    /// All languages, sorted by code
    pub fn get_language_list(&self) -> Result<Vec<Language>> {
        let _timer = self.stats.timer("language", "get");

        let rows = self
            .conn
            .lock()
            .query(self.adapter.get_all_languages_query(), &[])?;

        rows.iter()
            .map(|row| Ok(Language::new(row.i64(0)?, row.string(1)?, row.string(2)?)))
            .collect()
    }

    /// Register a new language, failing with `AlreadyExists` for a known code
    pub fn create_language(&self, code: &str, name: &str) -> Result<i64> {
        match self.get_language(code) {
            Ok(_) => {
                return Err(StoreError::AlreadyExists {
                    entity: "language",
                    key: code.to_string(),
                })
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let _timer = self.stats.timer("language", "insert");
        let id = self.insert(
            self.adapter.create_language_query(),
            &[code.into(), name.into()],
        )?;
        info!("Added language {} ({})", name, code);
        Ok(id)
    }

    // =========================================================================
    // Translations
    // =========================================================================

    fn find_translation_id(
        &self,
        language_id: i64,
        string_id: i64,
        domain_id: i64,
    ) -> Result<Option<i64>> {
        let _timer = self.stats.timer("translation", "get");
        self.query_id(
            self.adapter.get_single_translation_id_query(),
            &[string_id.into(), language_id.into(), domain_id.into()],
        )
    }

    fn insert_translation(&self, language_id: i64, content: &str, string_id: i64) -> Result<i64> {
        let _timer = self.stats.timer("translation", "insert");
        self.insert(
            self.adapter.create_translation_query(),
            &[language_id.into(), content.into(), string_id.into()],
        )
    }

    fn update_translation(
        &self,
        translation_id: i64,
        language_id: i64,
        content: &str,
        string_id: i64,
    ) -> Result<()> {
        let _timer = self.stats.timer("translation", "update");
        self.execute(
            self.adapter.update_translation_query(),
            &[
                language_id.into(),
                content.into(),
                string_id.into(),
                translation_id.into(),
            ],
        )?;
        Ok(())
    }

    /// Write one string's translation in a language
    fn upsert_translation(
        &self,
        language_id: i64,
        string_id: i64,
        domain_id: i64,
        content: &str,
    ) -> Result<()> {
        match self.find_translation_id(language_id, string_id, domain_id)? {
            Some(translation_id) => {
                self.update_translation(translation_id, language_id, content, string_id)
            }
            None => self
                .insert_translation(language_id, content, string_id)
                .map(|_| ()),
        }
    }

    /// Set the content of a string in one language.
    ///
    /// The domain must exist. With `allow_create` the string and the
    /// translation are created when missing; without it both must already
    /// exist, and nothing is written when either is missing.
    pub fn create_or_update_translation(
        &self,
        domain_name: &str,
        string_name: &str,
        language_code: &str,
        content: &str,
        allow_create: bool,
    ) -> Result<()> {
        let domain_id = self.get_domain_id(domain_name)?;
        let language = self.get_language(language_code)?;

        if allow_create {
            let string_id = self.get_or_create_string(string_name, domain_id)?;
            return self.upsert_translation(language.id, string_id, domain_id, content);
        }

        let string_id = self.get_string_id(string_name, domain_id)?;
        let translation_id = self
            .find_translation_id(language.id, string_id, domain_id)?
            .ok_or_else(|| {
                StoreError::not_found("translation", format!("{}/{}", string_name, language_code))
            })?;
        self.update_translation(translation_id, language.id, content, string_id)
    }

    /// Delete one translation of a string
    pub fn delete_translation(
        &self,
        domain_name: &str,
        string_name: &str,
        language_code: &str,
    ) -> Result<()> {
        let domain_id = self.get_domain_id(domain_name)?;
        let string_id = self.get_string_id(string_name, domain_id)?;
        let language = self.get_language(language_code)?;
        let translation_id = self
            .find_translation_id(language.id, string_id, domain_id)?
            .ok_or_else(|| {
                StoreError::not_found("translation", format!("{}/{}", string_name, language_code))
            })?;

        let _timer = self.stats.timer("translation", "delete");
        self.execute(
            self.adapter.delete_translation_query(),
            &[translation_id.into()],
        )?;
        Ok(())
    }

    /// Store every string and translation of a domain, creating what is missing
    pub fn import_domain<D: TranslationDomain>(&self, domain: &D) -> Result<()> {
        let domain_id = self.get_or_create_domain(domain.name())?;
        let mut language_ids: HashMap<String, i64> = HashMap::new();

        for string in domain.strings() {
            let string_id = self.get_or_create_string(string.name(), domain_id)?;

            for (code, content) in string.translations() {
                let language_id = match language_ids.get(code) {
                    Some(id) => *id,
                    None => {
                        let id = self.get_language(code)?.id;
                        language_ids.insert(code.to_string(), id);
                        id
                    }
                };
                self.upsert_translation(language_id, string_id, domain_id, content)?;
            }
        }

        debug!(
            "Imported {} string(s) into domain '{}'",
            domain.strings().len(),
            domain.name()
        );
        Ok(())
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Translations whose string name and/or content contain `term`.
    /// At most 100 hits are returned.
    pub fn search(&self, term: &str, field: SearchField) -> Result<Vec<SearchHit>> {
        let _timer = self.stats.timer("translation", "search");

        let pattern = like_pattern(term);
        let params: Vec<SqlValue> = match field {
            SearchField::All => vec![pattern.clone().into(), pattern.into()],
            SearchField::Name | SearchField::Content => vec![pattern.into()],
        };

        let rows = self
            .conn
            .lock()
            .query(self.adapter.search_query(field), &params)?;

        rows.iter()
            .map(|row| {
                Ok(SearchHit {
                    domain: row.string(0)?,
                    string: row.string(1)?,
                    language: row.string(2)?,
                    content: row.string(3)?,
                })
            })
            .collect()
    }
}

/// `%term%` with the LIKE wildcards of `term` escaped by a backslash
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
