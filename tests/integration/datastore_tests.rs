/*!
 * Integration tests for the data store on SQLite files
 */

use anyhow::Result;
use std::sync::Arc;
use std::thread;
use transapi::app_config::{DatabaseConfig, DbDriver};
use transapi::database::{DataStore, SqliteConnection};
use transapi::model::TranslatableString;
use transapi::{SearchField, StoreError};

use crate::common;

/// Test that a store on a file sees the data written by an earlier store
#[test]
fn test_open_withSqliteFile_shouldPersistBetweenConnections() -> Result<()> {
    common::init_logger();
    let temp_dir = common::create_temp_dir()?;
    let config = DatabaseConfig::sqlite(temp_dir.path().join("translations.db"));

    {
        let store = DataStore::open(&config)?;
        assert_eq!(store.migrate_up()?, 2);
        common::seed_homepage(&store)?;
    }

    let store = DataStore::open(&config)?;
    assert_eq!(store.driver(), DbDriver::Sqlite3);
    assert_eq!(store.version()?, 2);
    // Already at the newest version, nothing to run
    assert_eq!(store.migrate_up()?, 2);

    let domain = store.get_full_domain("homepage")?;
    assert_eq!(domain.strings[0].content("de"), Some("Willkommen!"));
    Ok(())
}

#[test]
fn test_open_withUnknownDriver_shouldFailBeforeConnecting() {
    let mut config = DatabaseConfig::sqlite("/nonexistent/dir/never-created.db");
    config.driver = "mysql".to_string();

    let result = DataStore::open(&config);

    assert!(matches!(result, Err(StoreError::Config(_))));
}

#[test]
fn test_new_withExplicitDriverName_shouldUseSqliteAdapter() -> Result<()> {
    let conn = SqliteConnection::open_in_memory()?;
    let store = DataStore::new(Box::new(conn), "sqlite3")?;

    assert_eq!(store.driver(), DbDriver::Sqlite3);
    assert_eq!(store.version()?, 0);
    Ok(())
}

/// Test the migration lifecycle: up, down and up again
#[test]
fn test_migrations_upDownUp_shouldRestoreSeedLanguages() -> Result<()> {
    let store = common::migrated_store()?;
    assert_eq!(store.version()?, 2);
    assert!(store.get_language("nl").is_ok());

    assert_eq!(store.migrate_down()?, 0);
    assert_eq!(store.version()?, 0);
    assert!(store.get_language_list().is_err());

    assert_eq!(store.migrate_up()?, 2);
    assert_eq!(store.get_language_list()?.len(), 22);
    assert!(store.get_domain_list()?.is_empty());
    Ok(())
}

#[test]
fn test_ensureVersionTableExists_shouldBeIdempotent() -> Result<()> {
    let store = DataStore::open_in_memory()?;

    store.ensure_version_table_exists()?;
    store.ensure_version_table_exists()?;

    assert_eq!(store.version()?, 0);
    Ok(())
}

#[test]
fn test_getOrCreateDomain_fromManyThreads_shouldCreateOneRow() -> Result<()> {
    let store = Arc::new(common::migrated_store()?);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.get_or_create_domain("shared"))
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.join().expect("thread panicked")?);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(store.get_domain_list()?.len(), 1);
    Ok(())
}

#[test]
fn test_getOrCreateString_shouldReuseExistingString() -> Result<()> {
    let store = common::migrated_store()?;
    let domain_id = store.get_or_create_domain("homepage")?;

    let first = store.get_or_create_string("welcome", domain_id)?;
    let second = store.get_or_create_string("welcome", domain_id)?;

    assert_eq!(first, second);
    assert_eq!(store.stats().count("string", "insert"), 1);
    Ok(())
}

/// Test that a domain without strings is returned rather than reported missing
#[test]
fn test_getFullDomain_withEmptyDomain_shouldReturnNoStrings() -> Result<()> {
    let store = common::migrated_store()?;
    store.get_or_create_domain("empty")?;

    let domain = store.get_full_domain("empty")?;

    assert_eq!(domain.name, "empty");
    assert!(domain.strings.is_empty());
    Ok(())
}

#[test]
fn test_getDomainList_shouldBeSortedByName() -> Result<()> {
    let store = common::migrated_store()?;
    for name in ["zebra", "alpha", "middle"] {
        store.get_or_create_domain(name)?;
    }

    let names: Vec<String> = store.get_domain_list()?.into_iter().map(|d| d.name).collect();

    assert_eq!(names, vec!["alpha", "middle", "zebra"]);
    Ok(())
}

#[test]
fn test_createOrUpdateTranslation_withUnknownLanguage_shouldReturnNotFound() -> Result<()> {
    let store = common::migrated_store()?;
    common::seed_homepage(&store)?;

    let error = store
        .create_or_update_translation("homepage", "welcome", "tlh", "nuqneH", true)
        .unwrap_err();

    assert!(matches!(error, StoreError::NotFound { entity: "language", .. }));
    Ok(())
}

#[test]
fn test_createLanguage_thenTranslate_shouldAcceptNewLanguage() -> Result<()> {
    let store = common::migrated_store()?;
    common::seed_homepage(&store)?;

    store.create_language("tlh", "Klingon")?;
    store.create_or_update_translation("homepage", "welcome", "tlh", "nuqneH", true)?;

    let domain = store.get_full_domain("homepage")?;
    assert_eq!(domain.strings[0].content("tlh"), Some("nuqneH"));
    assert_eq!(store.get_language("tlh")?.name, "Klingon");
    Ok(())
}

#[test]
fn test_deleteString_thenRecreate_shouldNotUseStaleCache() -> Result<()> {
    let store = common::migrated_store()?;
    common::seed_homepage(&store)?;

    store.delete_string("homepage", "welcome")?;
    store.create_or_update_translation("homepage", "welcome", "en", "Hi!", true)?;

    let domain = store.get_full_domain("homepage")?;
    assert_eq!(domain.strings.len(), 1);
    assert_eq!(domain.strings[0].translations.len(), 1);
    assert_eq!(domain.strings[0].content("en"), Some("Hi!"));
    Ok(())
}

#[test]
fn test_search_shouldSpanDomainsAndLanguages() -> Result<()> {
    let store = common::migrated_store()?;
    common::seed_homepage(&store)?;
    store.get_or_create_domain("email")?;
    store.create_or_update_translation("email", "welcome_subject", "en", "Hello there", true)?;

    let hits = store.search("welcome", SearchField::Name)?;
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().any(|h| h.domain == "email" && h.language == "en"));

    let hits = store.search("Willkommen", SearchField::Content)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].domain, "homepage");
    assert_eq!(hits[0].language, "de");

    let hits = store.search("Hello", SearchField::All)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].string, "welcome_subject");
    Ok(())
}

#[test]
fn test_search_shouldReturnAtMostOneHundredHits() -> Result<()> {
    let store = common::migrated_store()?;
    store.get_or_create_domain("bulk")?;
    for i in 0..120 {
        store.create_or_update_translation("bulk", &format!("label_{:03}", i), "en", "Label", true)?;
    }

    let hits = store.search("label_", SearchField::Name)?;

    assert_eq!(hits.len(), 100);
    Ok(())
}

#[test]
fn test_stats_shouldReportOperations() -> Result<()> {
    let store = common::migrated_store()?;
    common::seed_homepage(&store)?;

    let report = store.stats().to_string();

    assert!(store.stats().count("translation", "insert") >= 2);
    assert!(report.contains("translation 'insert'"));
    Ok(())
}
