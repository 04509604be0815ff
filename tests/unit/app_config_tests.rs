/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use transapi::app_config::{Config, DbDriver, LogLevel};
use transapi::StoreError;

use crate::common;

/// Test loading a complete PostgreSQL configuration from disk
#[test]
fn test_load_withPostgresConfig_shouldReadEverySection() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "transapi.toml",
        r#"
log_level = "debug"

[database]
driver = "postgres"
host = "db.internal"
port = 5433
name = "translations"
user = "transapi"
password = "secret"

[server]
port = 9090

[xliff]
import_path = "/srv/xliff/in"
export_path = "/srv/xliff/out"
source_language = "de"

[export]
queue_capacity = 8
"#,
    )?;

    let config = Config::load(&path)?;

    assert_eq!(config.database.driver()?, DbDriver::Postgres);
    let pg = config.database.postgres_config();
    assert_eq!(pg.get_ports(), &[5433]);
    assert_eq!(pg.get_dbname(), Some("translations"));
    assert_eq!(pg.get_user(), Some("transapi"));
    assert_eq!(pg.get_password(), Some("secret".as_bytes()));
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.xliff.source_language, "de");
    assert_eq!(config.export.queue_capacity, 8);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test that missing sections fall back to their defaults
#[test]
fn test_load_withOnlyDatabaseSection_shouldUseDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "transapi.toml",
        "[database]\ndriver = \"sqlite3\"\nfile = \"strings.db\"\n",
    )?;

    let config = Config::load(&path)?;

    assert_eq!(config.database.file, "strings.db");
    assert_eq!(config.server.port, 8181);
    assert_eq!(config.xliff.import_path, "./xliff-in");
    assert_eq!(config.xliff.export_path, "./xliff-out");
    assert_eq!(config.xliff.source_language, "en");
    assert_eq!(config.export.queue_capacity, 100);
    Ok(())
}

/// Test that reserved URL characters in credentials reach the client intact
#[test]
fn test_load_withReservedCharactersInPassword_shouldKeepCredentials() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "transapi.toml",
        r#"
[database]
driver = "postgres"
host = "localhost"
name = "translations"
user = "trans@api"
password = "p@ss/word#1"
"#,
    )?;

    let pg = Config::load(&path)?.database.postgres_config();

    assert_eq!(
        pg.get_hosts(),
        &[postgres::config::Host::Tcp("localhost".to_string())]
    );
    assert_eq!(pg.get_user(), Some("trans@api"));
    assert_eq!(pg.get_password(), Some("p@ss/word#1".as_bytes()));
    assert_eq!(pg.get_dbname(), Some("translations"));
    Ok(())
}

#[test]
fn test_load_withUnknownDriver_shouldNameTheValidDrivers() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "transapi.toml",
        "[database]\ndriver = \"mssql\"\n",
    )?;

    let error = Config::load(&path).unwrap_err();
    let message = format!("{:#}", error);

    assert!(message.contains("database.driver"));
    assert!(message.contains("postgres"));
    assert!(message.contains("sqlite3"));
    Ok(())
}

#[test]
fn test_load_withMissingFile_shouldFail() {
    let result = Config::load("/definitely/not/here/transapi.toml");
    assert!(result.is_err());
}

#[test]
fn test_databaseDriver_withUnknownName_shouldBeConfigError() {
    let mut config = Config::default();
    config.database.driver = "oracle".to_string();

    let error = config.database.driver().unwrap_err();

    assert!(matches!(error, StoreError::Config(_)));
    assert!(error.to_string().contains("oracle"));
}

#[test]
fn test_validateImportPath_shouldRequireExistingDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = Config::default();

    config.xliff.import_path = temp_dir.path().join("missing").to_string_lossy().into_owned();
    assert!(config.validate_import_path().is_err());

    config.xliff.import_path = temp_dir.path().to_string_lossy().into_owned();
    assert!(config.validate_import_path().is_ok());
    Ok(())
}

#[test]
fn test_defaultConfig_shouldSurviveTomlRoundTrip() -> Result<()> {
    let config = Config::default();

    let text = toml::to_string_pretty(&config)?;
    let parsed = Config::from_toml(&text)?;

    parsed.validate()?;
    assert_eq!(parsed.database.driver()?, DbDriver::Sqlite3);
    assert_eq!(parsed.xliff.export_path, config.xliff.export_path);
    Ok(())
}
