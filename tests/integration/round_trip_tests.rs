/*!
 * Integration tests for directory import and export
 */

use anyhow::Result;
use transapi::model::{Domain, TranslatableString, TranslationDomain};
use transapi::pipeline::{export_directory, import_directory, ExportTarget};
use transapi::xliff::{self, XliffDocument};
use transapi::StoreError;

use crate::common;

/// Test that exporting a store and importing the files into a fresh store
/// reproduces the same domains
#[test]
fn test_exportThenImport_intoFreshStore_shouldReproduceDomains() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::migrated_store()?;
    common::seed_homepage(&source)?;
    source.get_or_create_domain("help")?;
    source.create_or_update_translation("help", "faq", "en", "FAQ", true)?;
    source.create_or_update_translation("help", "faq", "fr", "Questions", true)?;
    source.create_or_update_translation("help", "contact", "en", "Contact us", true)?;

    let written = export_directory(&source, ExportTarget::All, temp_dir.path(), "en")?;
    assert_eq!(written.len(), 4);

    let target = common::migrated_store()?;
    let mut seen = Vec::new();
    let count = import_directory(&target, temp_dir.path(), |name| seen.push(name.to_string()))?;

    assert_eq!(count, 4);
    assert_eq!(
        seen,
        vec![
            "help.en.xliff",
            "help.fr.xliff",
            "homepage.de.xliff",
            "homepage.en.xliff"
        ]
    );
    for name in ["homepage", "help"] {
        assert_eq!(
            without_ids(target.get_full_domain(name)?),
            without_ids(source.get_full_domain(name)?)
        );
    }
    Ok(())
}

/// Test that leading and trailing whitespace in content survives the files
#[test]
fn test_exportThenImport_withSurroundingWhitespace_shouldKeepContentExactly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::migrated_store()?;
    source.get_or_create_domain("spacing")?;
    let contents = [
        ("padded", "  Hello  "),
        ("blank", " "),
        ("empty", ""),
        ("newline", "line1\n"),
    ];
    for (name, content) in contents {
        source.create_or_update_translation("spacing", name, "en", content, true)?;
    }

    export_directory(&source, Some("spacing"), temp_dir.path(), "en")?;
    let target = common::migrated_store()?;
    assert_eq!(import_directory(&target, temp_dir.path(), |_| {})?, 1);

    let domain = target.get_full_domain("spacing")?;
    for (name, content) in contents {
        assert_eq!(
            domain.string(name).and_then(|s| s.content("en")),
            Some(content),
            "content of '{}'",
            name
        );
    }
    assert_eq!(
        without_ids(domain),
        without_ids(source.get_full_domain("spacing")?)
    );
    Ok(())
}

/// Row ids depend on insertion order, so compare content only
fn without_ids(mut domain: Domain) -> Domain {
    for string in &mut domain.strings {
        string.id = None;
        for translation in string.translations.values_mut() {
            translation.id = None;
        }
    }
    domain
}

/// Test the files written for the homepage domain
#[test]
fn test_exportDirectory_withSingleDomain_shouldWriteSourceAndTarget() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = common::migrated_store()?;
    common::seed_homepage(&store)?;
    store.get_or_create_domain("other")?;
    store.create_or_update_translation("other", "x", "en", "X", true)?;

    let written = export_directory(&store, Some("homepage"), temp_dir.path(), "en")?;

    assert_eq!(written.len(), 2);
    assert!(!temp_dir.path().join("other.en.xliff").exists());

    let en = XliffDocument::from_xml(&std::fs::read_to_string(temp_dir.path().join("homepage.en.xliff"))?)?;
    assert_eq!(en.file.body.trans_units[0].source, "Welcome!");
    assert_eq!(en.file.body.trans_units[0].target, "Welcome!");

    let de = XliffDocument::from_xml(&std::fs::read_to_string(temp_dir.path().join("homepage.de.xliff"))?)?;
    assert_eq!(de.file.body.trans_units[0].source, "Welcome!");
    assert_eq!(de.file.body.trans_units[0].target, "Willkommen!");
    Ok(())
}

#[test]
fn test_exportDirectory_withEmptyDomain_shouldWriteNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = common::migrated_store()?;
    store.get_or_create_domain("empty")?;

    let written = export_directory(&store, Some("empty"), temp_dir.path(), "en")?;

    assert!(written.is_empty());
    Ok(())
}

#[test]
fn test_importDirectory_shouldUpdateExistingTranslations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = common::migrated_store()?;
    common::seed_homepage(&store)?;
    common::create_test_file(
        temp_dir.path(),
        "homepage.de.xliff",
        &common::xliff_document(
            "de",
            &[("welcome", "Welcome!", "Herzlich willkommen!"), ("bye", "Bye", "Tschüss")],
        ),
    )?;

    import_directory(&store, temp_dir.path(), |_| {})?;

    let domain = store.get_full_domain("homepage")?;
    assert_eq!(domain.strings.len(), 2);
    let welcome = domain.string("welcome").expect("welcome string");
    assert_eq!(welcome.content("de"), Some("Herzlich willkommen!"));
    assert_eq!(welcome.content("en"), Some("Welcome!"));
    assert_eq!(domain.string("bye").and_then(|s| s.content("de")), Some("Tschüss"));
    Ok(())
}

#[test]
fn test_importDirectory_shouldIgnoreOtherFilesAndSubdirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = common::migrated_store()?;
    common::create_test_file(temp_dir.path(), "README.txt", "not xliff")?;
    std::fs::create_dir(temp_dir.path().join("nested"))?;
    common::create_test_file(
        &temp_dir.path().join("nested"),
        "deep.en.xliff",
        &common::xliff_document("en", &[("a", "A", "A")]),
    )?;
    common::create_test_file(
        temp_dir.path(),
        "top.en.xliff",
        &common::xliff_document("en", &[("a", "A", "A")]),
    )?;

    let count = import_directory(&store, temp_dir.path(), |_| {})?;

    assert_eq!(count, 1);
    let names: Vec<String> = store.get_domain_list()?.into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["top"]);
    Ok(())
}

/// Test that the first failing file stops the import and earlier files stay
#[test]
fn test_importDirectory_withUnknownLanguage_shouldStopAtFailingFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = common::migrated_store()?;
    common::create_test_file(
        temp_dir.path(),
        "a.en.xliff",
        &common::xliff_document("en", &[("one", "One", "One")]),
    )?;
    common::create_test_file(
        temp_dir.path(),
        "b.xx.xliff",
        &common::xliff_document("xx", &[("two", "Two", "Zwo")]),
    )?;
    common::create_test_file(
        temp_dir.path(),
        "c.en.xliff",
        &common::xliff_document("en", &[("three", "Three", "Three")]),
    )?;

    let failure = import_directory(&store, temp_dir.path(), |_| {}).unwrap_err();

    assert_eq!(failure.processed, 1);
    assert!(matches!(failure.source, StoreError::NotFound { entity: "language", .. }));
    assert!(store.get_full_domain("a").is_ok());
    assert!(store.get_full_domain("c").unwrap_err().is_not_found());
    Ok(())
}

#[test]
fn test_importDirectory_withMissingDirectory_shouldFailWithoutProcessing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = common::migrated_store()?;

    let failure = import_directory(&store, temp_dir.path().join("absent"), |_| {}).unwrap_err();

    assert_eq!(failure.processed, 0);
    Ok(())
}

#[test]
fn test_exportDomain_directlyFromParsedFile_shouldKeepTarget() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "shop.it.xliff",
        &common::xliff_document("it", &[("cart", "Cart", "Carrello")]),
    )?;

    let parsed = xliff::parse_file(&input)?;
    let out_dir = temp_dir.path().join("out");
    xliff::export_domain(&parsed, "it", &out_dir)?;

    let reparsed = xliff::parse_file(out_dir.join("shop.it.xliff"))?;
    assert_eq!(reparsed.strings().len(), 1);
    assert_eq!(reparsed.strings()[0].name(), "cart");
    assert_eq!(reparsed.strings()[0].content("it"), Some("Carrello"));
    assert_eq!(reparsed.strings()[0].source, "Carrello");
    Ok(())
}
