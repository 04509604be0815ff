/*!
 * Integration tests for the controller and its background exports
 */

use anyhow::Result;
use std::path::Path;
use transapi::app_config::{Config, DatabaseConfig};
use transapi::model::{TranslatableString, TranslationDomain};
use transapi::xliff;
use transapi::{Controller, DataStore, SearchField};

use crate::common;

fn create_test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.database = DatabaseConfig::sqlite(root.join("translations.db"));
    config.xliff.import_path = root.join("in").to_string_lossy().into_owned();
    config.xliff.export_path = root.join("out").to_string_lossy().into_owned();
    config
}

/// Test the whole flow: migrate, import, edit, and find the edit re-exported
#[tokio::test]
async fn test_controller_importEditShutdown_shouldReExportEditedDomain() -> Result<()> {
    common::init_logger();
    let temp_dir = common::create_temp_dir()?;
    let config = create_test_config(temp_dir.path());
    std::fs::create_dir_all(&config.xliff.import_path)?;
    common::create_test_file(
        Path::new(&config.xliff.import_path),
        "homepage.de.xliff",
        &common::xliff_document("de", &[("welcome", "Welcome!", "Willkommen!")]),
    )?;

    let controller = Controller::with_config(config)?;
    assert_eq!(controller.init_db()?, 2);

    let mut imported = Vec::new();
    let count = controller.import(None, |name| imported.push(name.to_string()))?;
    assert_eq!(count, 1);
    assert_eq!(imported, vec!["homepage.de.xliff"]);

    controller
        .set_translation("homepage", "welcome", "de", "Hallo!", false)
        .await?;
    let export_dir = temp_dir.path().join("out");
    let report = controller.shutdown().await;

    let exported = xliff::parse_file(export_dir.join("homepage.de.xliff"))?;
    assert_eq!(exported.strings()[0].content("de"), Some("Hallo!"));
    assert!(report.contains("translation 'update'"));
    Ok(())
}

#[tokio::test]
async fn test_controller_reads_shouldReflectStore() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_store(
        create_test_config(temp_dir.path()),
        DataStore::open_in_memory()?,
    );
    controller.init_db()?;
    common::seed_homepage(controller.store())?;

    assert_eq!(controller.languages()?.len(), 22);
    assert_eq!(controller.domains()?.len(), 1);
    assert_eq!(controller.domain("homepage")?.strings.len(), 1);
    assert_eq!(controller.search("Willkommen", SearchField::Content)?.len(), 1);

    controller.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_controller_deleteTranslation_shouldDropLanguageFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let out_dir = temp_dir.path().join("out");
    let controller = Controller::with_store(
        create_test_config(temp_dir.path()),
        DataStore::open_in_memory()?,
    );
    controller.init_db()?;
    common::seed_homepage(controller.store())?;

    controller.delete_translation("homepage", "welcome", "de").await?;
    controller.shutdown().await;

    // Only languages that still have content get a file
    assert!(out_dir.join("homepage.en.xliff").is_file());
    assert!(!out_dir.join("homepage.de.xliff").exists());
    Ok(())
}

#[tokio::test]
async fn test_controller_deleteString_withUnknownString_shouldMapTo404() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_store(
        create_test_config(temp_dir.path()),
        DataStore::open_in_memory()?,
    );
    controller.init_db()?;
    controller.store().get_or_create_domain("homepage")?;

    let error = controller.delete_string("homepage", "ghost").await.unwrap_err();

    assert_eq!(error.http_status(), 404);
    assert_eq!(error.public_message(), "not found");
    controller.shutdown().await;
    Ok(())
}

/// Test that many edits queue up without losing the final state
#[tokio::test]
async fn test_controller_manyEdits_withSmallQueue_shouldExportFinalContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = create_test_config(temp_dir.path());
    config.export.queue_capacity = 1;
    let controller = Controller::with_store(config, DataStore::open_in_memory()?);
    controller.init_db()?;
    controller.store().get_or_create_domain("counter")?;

    for i in 0..10 {
        controller
            .set_translation("counter", "value", "en", &i.to_string(), true)
            .await?;
    }
    controller.shutdown().await;

    let exported = xliff::parse_file(temp_dir.path().join("out").join("counter.en.xliff"))?;
    assert_eq!(exported.strings()[0].content("en"), Some("9"));
    Ok(())
}

#[tokio::test]
async fn test_controller_export_withExplicitDirectory_shouldOverrideConfig() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_store(
        create_test_config(temp_dir.path()),
        DataStore::open_in_memory()?,
    );
    controller.init_db()?;
    common::seed_homepage(controller.store())?;

    let elsewhere = temp_dir.path().join("elsewhere");
    let written = controller.export(None, Some(&elsewhere))?;

    assert_eq!(written.len(), 2);
    assert!(written.iter().all(|p| p.starts_with(&elsewhere)));
    assert!(!temp_dir.path().join("out").exists());

    assert_eq!(controller.remove_db()?, 0);
    controller.shutdown().await;
    Ok(())
}
