//! Bulk exports for the admissions office: a flat spreadsheet of every record
//! and a zip of printable per-application PDFs.

pub mod archive;
pub mod pdf;
pub mod sheet;

use chrono::NaiveDate;

use crate::config::AdmissionsConfig;

pub use archive::{ArchiveBuilder, ArchiveSummary, BundledArchive};
pub use pdf::{ApplicationDocument, DocumentLayout, PdfEncoder, RenderError};
pub use sheet::{Sheet, SheetBuilder, SpreadsheetFormat};

/// Branding printed at the top of every application document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Institution {
    pub name: String,
    pub title: String,
}

impl Institution {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }

    pub fn from_config(config: &AdmissionsConfig) -> Self {
        Self::new(&config.institution_name, &config.admission_title)
    }
}

/// `Applications_<date>.<extension>`
pub fn export_filename(date: NaiveDate, extension: &str) -> String {
    format!("Applications_{}.{extension}", date.format("%Y-%m-%d"))
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("spreadsheet encoding failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("zip encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("export io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}
