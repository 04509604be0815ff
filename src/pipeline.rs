/*!
 * Directory-level XLIFF import and export.
 */

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::database::DataStore;
use crate::errors::{ImportFailure, Result};
use crate::file_utils::FileManager;
use crate::xliff;

/// Import every `*.xliff` file directly inside `dir`, in file name order.
///
/// `notify` receives the base name of each file once it has been imported.
/// The first failing file stops the run; files imported before it stay
/// imported and their number is reported in the failure.
pub fn import_directory<P, F>(
    store: &DataStore,
    dir: P,
    mut notify: F,
) -> std::result::Result<usize, ImportFailure>
where
    P: AsRef<Path>,
    F: FnMut(&str),
{
    let dir = dir.as_ref();
    let files = FileManager::find_files(dir, "xliff").map_err(|source| ImportFailure {
        processed: 0,
        source,
    })?;

    info!("Importing {} XLIFF file(s) from {:?}", files.len(), dir);

    for (processed, file) in files.iter().enumerate() {
        let imported = xliff::parse_file(file).and_then(|domain| store.import_domain(&domain));
        if let Err(source) = imported {
            return Err(ImportFailure { processed, source });
        }

        let name = FileManager::file_name(file);
        debug!("Imported {}", name);
        notify(&name);
    }

    Ok(files.len())
}

/// Which domains an export covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget<'a> {
    All,
    Domain(&'a str),
}

impl<'a> From<Option<&'a str>> for ExportTarget<'a> {
    fn from(domain: Option<&'a str>) -> Self {
        match domain {
            Some(name) => Self::Domain(name),
            None => Self::All,
        }
    }
}

/// Export one domain, or every domain, to `dir`.
///
/// Returns the paths of all written files.
pub fn export_directory<'a, P: AsRef<Path>>(
    store: &DataStore,
    target: impl Into<ExportTarget<'a>>,
    dir: P,
    source_language: &str,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();

    let names = match target.into() {
        ExportTarget::Domain(name) => vec![name.to_string()],
        ExportTarget::All => store
            .get_domain_list()?
            .into_iter()
            .map(|domain| domain.name)
            .collect(),
    };

    let mut written = Vec::new();
    for name in &names {
        let domain = store.get_full_domain(name)?;
        written.extend(xliff::export_domain(&domain, source_language, dir)?);
    }

    Ok(written)
}
