/*!
 * XLIFF 1.2 codec.
 *
 * A document holds one domain in one target language and is stored as
 * `{domain}.{language}.xliff`. The file name is the only place the domain
 * name is kept, so decoding validates it before reading any XML.
 */

use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{Result, StoreError};
use crate::file_utils::FileManager;
use crate::model::{TranslatableString, TranslationDomain};

pub const XLIFF_NAMESPACE: &str = "urn:oasis:names:tc:xliff:document:1.2";
pub const XLIFF_VERSION: &str = "1.2";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

static FILE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^.]+)\.([^.]+)\.(?i:xliff)$").expect("Failed to compile file name regex")
});

/// Root `<xliff>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "xliff")]
pub struct XliffDocument {
    #[serde(rename = "@xmlns", default)]
    pub namespace: String,
    #[serde(rename = "@version", default)]
    pub version: String,
    pub file: XliffFile,
}

/// The single `<file>` element of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XliffFile {
    #[serde(rename = "@date", default)]
    pub date: String,
    #[serde(rename = "@datatype", default)]
    pub datatype: String,
    #[serde(rename = "@original", default)]
    pub original: String,
    #[serde(rename = "@source-language", default)]
    pub source_language: String,
    #[serde(rename = "@target-language", default)]
    pub target_language: String,
    #[serde(default)]
    pub header: XliffHeader,
    #[serde(default)]
    pub body: XliffBody,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XliffHeader {
    #[serde(default)]
    pub tool: XliffTool,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XliffTool {
    #[serde(rename = "@tool-id", default)]
    pub id: String,
    #[serde(rename = "@tool-name", default)]
    pub name: String,
    #[serde(rename = "@tool-version", default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XliffBody {
    #[serde(rename = "trans-unit", default)]
    pub trans_units: Vec<TransUnit>,
}

/// One `<trans-unit>`: a string and its content in the document's language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransUnit {
    /// SHA-1 of the string name
    #[serde(rename = "@id", default)]
    pub id: String,
    /// The string name
    #[serde(rename = "@resname")]
    pub resname: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    /// Target language code, taken from the file name when decoding
    #[serde(skip)]
    pub language: String,
}

impl TranslatableString for TransUnit {
    fn name(&self) -> &str {
        &self.resname
    }

    fn translations(&self) -> Vec<(&str, &str)> {
        vec![(self.language.as_str(), self.target.as_str())]
    }
}

impl XliffDocument {
    /// An empty document with generated header metadata
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            namespace: XLIFF_NAMESPACE.to_string(),
            version: XLIFF_VERSION.to_string(),
            file: XliffFile {
                date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                datatype: "plaintext".to_string(),
                original: "not.available".to_string(),
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
                header: XliffHeader {
                    tool: XliffTool {
                        id: env!("CARGO_PKG_NAME").to_string(),
                        name: env!("CARGO_PKG_NAME").to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                    note: String::new(),
                },
                body: XliffBody::default(),
            },
        }
    }

    /// Serialize with the XML declaration and two-space indentation
    pub fn to_xml(&self) -> Result<String> {
        let mut buffer = String::from(XML_DECLARATION);
        let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
        serializer.indent(' ', 2);
        self.serialize(serializer)?;
        buffer.push('\n');
        Ok(buffer)
    }

    /// Parse a document. Unit texts are kept exactly as written, including
    /// leading and trailing whitespace.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut document: Self = quick_xml::de::from_str(xml)?;

        // The serde deserializer trims text content
        let texts = read_unit_texts(xml)?;
        let units = &mut document.file.body.trans_units;
        if texts.len() != units.len() {
            return Err(StoreError::Xml(format!(
                "found {} trans-unit texts for {} trans-units",
                texts.len(),
                units.len()
            )));
        }
        for (unit, (source, target)) in units.iter_mut().zip(texts) {
            unit.source = source;
            unit.target = target;
        }

        Ok(document)
    }
}

#[derive(Clone, Copy)]
enum UnitText {
    Source,
    Target,
}

/// Untrimmed `(source, target)` text of every trans-unit, in document order
fn read_unit_texts(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut texts: Vec<(String, String)> = Vec::new();
    let mut unit: Option<(String, String)> = None;
    let mut field: Option<UnitText> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"trans-unit" => unit = Some(Default::default()),
                b"source" if unit.is_some() => field = Some(UnitText::Source),
                b"target" if unit.is_some() => field = Some(UnitText::Target),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"trans-unit" => {
                texts.push(Default::default());
            }
            Event::Text(e) => {
                if let (Some((source, target)), Some(field)) = (unit.as_mut(), field) {
                    let text = e.unescape()?;
                    match field {
                        UnitText::Source => source.push_str(&text),
                        UnitText::Target => target.push_str(&text),
                    }
                }
            }
            Event::CData(e) => {
                if let (Some((source, target)), Some(field)) = (unit.as_mut(), field) {
                    let text = String::from_utf8_lossy(&e);
                    match field {
                        UnitText::Source => source.push_str(&text),
                        UnitText::Target => target.push_str(&text),
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"source" | b"target" => field = None,
                b"trans-unit" => texts.extend(unit.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(texts)
}

/// A decoded XLIFF file: one domain fragment in one language
#[derive(Debug, Clone, PartialEq)]
pub struct XliffDomain {
    name: String,
    language: String,
    units: Vec<TransUnit>,
}

impl XliffDomain {
    /// Target language of every unit
    pub fn language(&self) -> &str {
        &self.language
    }
}

impl TranslationDomain for XliffDomain {
    type Entry = TransUnit;

    fn name(&self) -> &str {
        &self.name
    }

    fn strings(&self) -> &[TransUnit] {
        &self.units
    }
}

/// Lowercase hex SHA-1 of a string name, used as the trans-unit id
pub fn unit_id(name: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Split `{domain}.{language}.xliff` into its domain and language parts
pub fn parse_file_name(file_name: &str) -> Result<(String, String)> {
    let captures = FILE_NAME_REGEX.captures(file_name).ok_or_else(|| {
        StoreError::Validation(format!(
            "Domain name or language missing from filename '{}'",
            file_name
        ))
    })?;

    Ok((captures[1].to_string(), captures[2].to_string()))
}

/// Decode one XLIFF file.
///
/// The file name must be `{domain}.{language}.xliff` and the document's
/// target language must match the language in the name.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<XliffDomain> {
    let path = path.as_ref();
    let file_name = FileManager::file_name(path);
    let (name, language) = parse_file_name(&file_name)?;

    let document = XliffDocument::from_xml(&FileManager::read_to_string(path)?)?;

    let found = &document.file.target_language;
    if *found != language {
        return Err(StoreError::Validation(format!(
            "Found language '{}' but expected '{}' based on filename '{}'",
            found,
            language,
            path.display()
        )));
    }

    let mut units = document.file.body.trans_units;
    for unit in &mut units {
        unit.language = language.clone();
    }

    debug!(
        "Decoded {} trans-unit(s) for domain '{}' ({})",
        units.len(),
        name,
        language
    );
    Ok(XliffDomain {
        name,
        language,
        units,
    })
}

/// Build one document per target language present in the domain.
///
/// The source text of a unit is the string's content in `source_language`,
/// falling back to the string name.
pub fn encode_domain<D: TranslationDomain>(
    domain: &D,
    source_language: &str,
) -> BTreeMap<String, XliffDocument> {
    let mut documents: BTreeMap<String, XliffDocument> = BTreeMap::new();

    for string in domain.strings() {
        let name = string.name();
        let source = string.content(source_language).unwrap_or(name).to_string();

        for (code, content) in string.translations() {
            documents
                .entry(code.to_string())
                .or_insert_with(|| XliffDocument::new(source_language, code))
                .file
                .body
                .trans_units
                .push(TransUnit {
                    id: unit_id(name),
                    resname: name.to_string(),
                    source: source.clone(),
                    target: content.to_string(),
                    language: code.to_string(),
                });
        }
    }

    documents
}

/// Write `{domain}.{language}.xliff` for every language of the domain into
/// `output_dir`, creating it if needed. Existing files are overwritten.
pub fn export_domain<D: TranslationDomain, P: AsRef<Path>>(
    domain: &D,
    source_language: &str,
    output_dir: P,
) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    FileManager::ensure_dir(output_dir)?;

    let mut written = Vec::new();
    for (language, document) in encode_domain(domain, source_language) {
        let path = FileManager::xliff_path(output_dir, domain.name(), &language);
        FileManager::write_to_file(&path, &document.to_xml()?)?;
        written.push(path);
    }

    info!(
        "Exported domain '{}' to {} file(s) in {:?}",
        domain.name(),
        written.len(),
        output_dir
    );
    Ok(written)
}
