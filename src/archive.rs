//! Zip packaging of catalog sets
//!
//! An export produces one catalog per output file and locale, stored in the
//! archive as `<locale>/<file name>`. On import every archive member ending
//! in the catalog extension is parsed, wherever it sits in the archive.

use crate::catalog::Catalog;
use crate::error::I18nResult;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// The catalogs produced by one export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSet {
    pub catalogs: Vec<Catalog>,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, catalog: Catalog) {
        self.catalogs.push(catalog);
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// Archive path of a catalog
    pub fn path_of(catalog: &Catalog) -> String {
        format!("{}/{}", catalog.locale, catalog.file_name)
    }

    /// Pack every catalog into a zip archive
    pub fn to_zip(&self) -> I18nResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for catalog in &self.catalogs {
            let path = Self::path_of(catalog);
            debug!(path = %path, entries = catalog.entries.len(), "writing catalog");
            writer.start_file(path, options)?;
            writer.write_all(catalog.to_po().as_bytes())?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

/// Parse every catalog file in a zip archive
///
/// Members whose name does not end in `.<extension>` are ignored.
pub fn read_zip(bytes: &[u8], extension: &str) -> I18nResult<Vec<Catalog>> {
    let suffix = format!(".{}", extension);
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut catalogs = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() || !file.name().ends_with(&suffix) {
            continue;
        }
        let name = file.name().to_string();
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        catalogs.push(Catalog::parse(&name, &content)?);
    }

    debug!(count = catalogs.len(), "read catalogs from archive");
    Ok(catalogs)
}
