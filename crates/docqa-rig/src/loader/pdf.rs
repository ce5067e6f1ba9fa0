//! PDF loader backed by `lopdf`.

use std::path::{Path, PathBuf};

use docqa_core::config::DocumentSettings;
use docqa_core::{DocumentPage, Error, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::TRACING_TARGET_LOADER;

/// A PDF that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    /// Path relative to the data directory.
    pub path: String,
    /// Why the file was skipped.
    pub message: String,
}

/// Result of loading a data directory.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Extracted pages in file then page order.
    pub pages: Vec<DocumentPage>,
    /// Number of files that were read successfully.
    pub files: usize,
    /// Files that were skipped.
    pub failures: Vec<LoadFailure>,
}

/// Loads every PDF in a directory into [`DocumentPage`]s.
///
/// Files are visited in lexicographic order. Only the top level of the
/// directory is searched unless the loader is recursive. Unreadable files are
/// skipped and reported; loading fails only when nothing could be read.
#[derive(Debug, Clone)]
pub struct PdfLoader {
    root: PathBuf,
    recursive: bool,
}

impl PdfLoader {
    /// Creates a loader for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
        }
    }

    /// Creates a loader from resolved document settings.
    pub fn from_settings(settings: &DocumentSettings) -> Self {
        Self::new(&settings.data_path).with_recursive(settings.recursive)
    }

    /// Descend into subdirectories.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Returns the data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists the PDF files the loader would read.
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(Error::load(format!(
                "data directory '{}' does not exist",
                self.root.display()
            )));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET_LOADER,
                        error = %err,
                        "Skipping unreadable directory entry"
                    );
                    continue;
                }
            };

            if entry.file_type().is_file() && is_pdf(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Loads every PDF under the data directory.
    ///
    /// This is blocking; run it on a blocking thread from async code.
    pub fn load(&self) -> Result<LoadOutcome> {
        let files = self.list_files()?;
        if files.is_empty() {
            return Err(Error::load(format!(
                "no PDF files found in '{}'",
                self.root.display()
            )));
        }

        let mut outcome = LoadOutcome::default();
        for path in &files {
            match self.load_file(path) {
                Ok(pages) => {
                    tracing::debug!(
                        target: TRACING_TARGET_LOADER,
                        path = %path.display(),
                        pages = pages.len(),
                        "Loaded PDF"
                    );
                    outcome.files += 1;
                    outcome.pages.extend(pages);
                }
                Err(err) => {
                    let failure = LoadFailure {
                        path: self.relative(path),
                        message: err.to_string(),
                    };
                    tracing::warn!(
                        target: TRACING_TARGET_LOADER,
                        path = %failure.path,
                        error = %failure.message,
                        "Skipping unreadable PDF"
                    );
                    outcome.failures.push(failure);
                }
            }
        }

        if outcome.files == 0 {
            let mut err = Error::load(format!("none of the {} PDF files could be read", files.len()));
            if let Some(first) = outcome.failures.first() {
                err = err.with_context(format!("{}: {}", first.path, first.message));
            }
            return Err(err);
        }

        tracing::info!(
            target: TRACING_TARGET_LOADER,
            root = %self.root.display(),
            files = outcome.files,
            pages = outcome.pages.len(),
            failures = outcome.failures.len(),
            "Loaded documents"
        );

        Ok(outcome)
    }

    /// Extracts the pages of a single PDF.
    pub fn load_file(&self, path: &Path) -> Result<Vec<DocumentPage>> {
        let source = self.relative(path);
        let document = lopdf::Document::load(path)
            .map_err(|e| Error::load(format!("cannot parse '{source}'")).with_source(e))?;

        let mut pages = Vec::new();
        for number in document.get_pages().into_keys() {
            let text = document.extract_text(&[number]).map_err(|e| {
                Error::load(format!("cannot extract page {number} of '{source}'")).with_source(e)
            })?;

            // lopdf numbers pages from 1.
            pages.push(DocumentPage::new(
                normalize(&text),
                source.clone(),
                number.saturating_sub(1),
            ));
        }

        Ok(pages)
    }

    fn relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn normalize(text: &str) -> String {
    text.trim().to_owned()
}
