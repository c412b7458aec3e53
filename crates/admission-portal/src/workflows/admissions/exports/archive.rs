use std::collections::HashSet;
use std::io::{Cursor, Write};

use tracing::{info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::pdf::ApplicationDocument;
use super::{ExportError, Institution};
use crate::workflows::admissions::applications::domain::ApplicationRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub written: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledArchive {
    pub bytes: Vec<u8>,
    pub summary: ArchiveSummary,
}

/// Zips one rendered PDF per record. Records that fail to render are
/// logged and left out.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    institution: Institution,
}

impl ArchiveBuilder {
    pub fn new(institution: Institution) -> Self {
        Self { institution }
    }

    pub fn bundle(&self, records: &[ApplicationRecord]) -> Result<BundledArchive, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut summary = ArchiveSummary::default();
        let mut used_names = HashSet::new();

        for record in records {
            let pdf = match ApplicationDocument::pdf(record, &self.institution) {
                Ok(pdf) => pdf,
                Err(error) => {
                    warn!(
                        application_id = %record.id,
                        register_number = %record.application.register_number(),
                        %error,
                        "skipping application in pdf export"
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            let name = unique_name(document_filename(record), &mut used_names);
            zip.start_file(name, options)?;
            zip.write_all(&pdf)?;
            summary.written += 1;
        }

        let bytes = zip.finish()?.into_inner();
        info!(
            written = summary.written,
            skipped = summary.skipped,
            "pdf export archive built"
        );
        Ok(BundledArchive { bytes, summary })
    }
}

/// `<register number or id>_<applicant name>.pdf` with whitespace runs as `_`.
pub fn document_filename(record: &ApplicationRecord) -> String {
    let register = record.application.register_number().as_str().trim();
    let prefix = if register.is_empty() {
        record.id.to_string()
    } else {
        register.to_string()
    };
    let name = record
        .application
        .applicant
        .applicant_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\'], "_");
    format!("{}_{name}.pdf", prefix.replace(['/', '\\'], "_"))
}

fn unique_name(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let stem = candidate.trim_end_matches(".pdf");
    let mut counter = 2;
    loop {
        let next = format!("{stem}_{counter}.pdf");
        if used.insert(next.clone()) {
            return next;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::admissions::applications::tests::common::{
        record, sslc_submission, submission_with_register,
    };

    #[test]
    fn filename_joins_register_number_and_name() {
        let mut record = record(sslc_submission());
        record.application.applicant.applicant_name = "Fathima  Nasrin K".to_string();
        assert_eq!(document_filename(&record), "SK2025A01_Fathima_Nasrin_K.pdf");
    }

    #[test]
    fn repeated_names_get_a_counter() {
        let mut used = HashSet::new();
        assert_eq!(unique_name("a.pdf".to_string(), &mut used), "a.pdf");
        assert_eq!(unique_name("a.pdf".to_string(), &mut used), "a_2.pdf");
    }

    #[test]
    fn bundle_skips_records_that_fail_to_render() {
        let good = record(submission_with_register("GOOD1"));
        let mut bad = record(submission_with_register("BAD1"));
        bad.application.applicant.applicant_name = String::new();

        let archive = ArchiveBuilder::new(Institution::new("School", "Admission"))
            .bundle(&[good, bad])
            .expect("archive");
        assert_eq!(
            archive.summary,
            ArchiveSummary {
                written: 1,
                skipped: 1
            }
        );

        let reader = zip::ZipArchive::new(Cursor::new(archive.bytes)).expect("zip");
        assert_eq!(reader.len(), 1);
    }
}
