//! PDF discovery and per-page text extraction.

mod pdf;

pub use pdf::{LoadFailure, LoadOutcome, PdfLoader};
