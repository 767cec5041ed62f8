//! Sitemap-index XML generation
//!
//! This module serializes the pages collected by a crawl into one or more
//! sitemap-index documents. Each file is complete on its own and holds at most
//! [`MAX_URLS_PER_SITEMAP`] entries.

use crate::state::UrlRecord;
use crate::SumiError;
use quick_xml::escape::partial_escape;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Entry limit for a single sitemap file
pub const MAX_URLS_PER_SITEMAP: usize = 50_000;

/// Namespace of the `sitemapindex` root element
pub const SITEMAP_NAMESPACE: &str = "http://www.google.com/schemas/sitemap/0.84";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Renders one complete sitemap-index document
///
/// # Arguments
///
/// * `records` - Entries for this document, in output order
///
/// # Returns
///
/// The XML text, tab indented, ending with the closing root tag
pub fn render_sitemap_index(records: &[UrlRecord]) -> String {
    let mut xml = String::new();

    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!("<sitemapindex xmlns=\"{}\">", SITEMAP_NAMESPACE));

    for record in records {
        xml.push_str("\n\t<sitemap>");
        xml.push_str(&format!("\n\t\t<loc>{}</loc>", partial_escape(&record.loc)));
        if let Some(lastmod) = &record.lastmod {
            xml.push_str(&format!(
                "\n\t\t<lastmod>{}</lastmod>",
                partial_escape(lastmod)
            ));
        }
        xml.push_str("\n\t</sitemap>");
    }

    xml.push_str("\n</sitemapindex>");
    xml
}

/// Returns the file name of the `index`-th sitemap for `host`
///
/// The first file is `{host}.xml`; later ones are `{host}(1).xml`,
/// `{host}(2).xml` and so on.
pub fn sitemap_file_name(host: &str, index: usize) -> String {
    if index == 0 {
        format!("{}.xml", host)
    } else {
        format!("{}({}).xml", host, index)
    }
}

/// Writes batches of records as numbered sitemap files
#[derive(Debug, Clone)]
pub struct SitemapWriter {
    directory: PathBuf,
    host: String,
    max_entries: usize,
}

impl SitemapWriter {
    /// Creates a writer for `host` targeting `directory`
    pub fn new(directory: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            host: host.into(),
            max_entries: MAX_URLS_PER_SITEMAP,
        }
    }

    /// Overrides the per-file entry limit (at least one)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Writes every record exactly once, in order
    ///
    /// The output directory is created if missing. An empty slice writes
    /// nothing and does not touch the filesystem.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PathBuf>)` - Paths of the written files, first file first
    /// * `Err(io::Error)` - Failed to create the directory or a file
    pub fn write(&self, records: &[UrlRecord]) -> io::Result<Vec<PathBuf>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        fs::create_dir_all(&self.directory)?;

        let mut written = Vec::new();
        for (index, batch) in records.chunks(self.max_entries).enumerate() {
            let path = self.directory.join(sitemap_file_name(&self.host, index));
            fs::write(&path, render_sitemap_index(batch))?;
            tracing::debug!("Wrote {} entries to {}", batch.len(), path.display());
            written.push(path);
        }

        Ok(written)
    }
}

/// Writes the sitemap files for `host` into `directory`
///
/// # Arguments
///
/// * `directory` - Output directory, created if missing
/// * `host` - Host name used for the file names
/// * `records` - Pages to list, in crawl order
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the written files; empty if there were no records
/// * `Err(SumiError)` - An IO failure while writing
pub fn write_sitemaps(
    directory: &Path,
    host: &str,
    records: &[UrlRecord],
) -> Result<Vec<PathBuf>, SumiError> {
    let files = SitemapWriter::new(directory, host).write(records)?;
    if !files.is_empty() {
        tracing::info!(
            "Wrote {} URLs to {} sitemap file(s) in {}",
            records.len(),
            files.len(),
            directory.display()
        );
    }
    Ok(files)
}
