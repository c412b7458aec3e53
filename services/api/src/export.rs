use crate::infra::ConfiguredStore;
use admission_portal::config::AppConfig;
use admission_portal::error::AppError;
use admission_portal::telemetry;
use admission_portal::workflows::admissions::admin::{AdminDirectory, Role};
use admission_portal::workflows::admissions::applications::{
    ApplicationQuery, ApplicationRecord, ApplicationStore,
};
use admission_portal::workflows::admissions::exports::{
    ArchiveBuilder, SheetBuilder, SpreadsheetFormat,
};
use admission_portal::workflows::admissions::Institution;
use clap::{Args, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportKind {
    Excel,
    Csv,
    Pdfs,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Which export to produce
    #[arg(value_enum)]
    pub(crate) kind: ExportKind,
    /// Destination file for the export
    #[arg(long)]
    pub(crate) out: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct ProvisionArgs {
    /// Login email for the new account
    #[arg(long)]
    pub(crate) email: String,
    /// Password to hash into the account entry
    #[arg(long)]
    pub(crate) password: String,
    /// Role claim carried by the account (admin or viewer)
    #[arg(long, default_value = "admin", value_parser = parse_role)]
    pub(crate) role: Role,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role '{raw}' (expected admin or viewer)"))
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let store = ConfiguredStore::open(&config.storage)?;
    let records = store.list(&ApplicationQuery::all())?;
    let institution = Institution::from_config(&config.admissions);

    let summary = write_export(args.kind, &records, &institution, &args.out)?;
    println!("{summary}");
    Ok(())
}

pub(crate) fn write_export(
    kind: ExportKind,
    records: &[ApplicationRecord],
    institution: &Institution,
    out: &Path,
) -> Result<String, AppError> {
    let (bytes, summary) = match kind {
        ExportKind::Excel | ExportKind::Csv => {
            let format = if kind == ExportKind::Csv {
                SpreadsheetFormat::Csv
            } else {
                SpreadsheetFormat::Xlsx
            };
            let sheet = SheetBuilder.build(records);
            let bytes = format.encode(&sheet)?;
            (bytes, format!("wrote {} rows", sheet.rows.len()))
        }
        ExportKind::Pdfs => {
            let archive = ArchiveBuilder::new(institution.clone()).bundle(records)?;
            let summary = format!(
                "wrote {} documents ({} skipped)",
                archive.summary.written, archive.summary.skipped
            );
            (archive.bytes, summary)
        }
    };

    fs::write(out, bytes)?;
    Ok(format!("{summary} to {}", out.display()))
}

/// Prints an `APP_ADMIN_ACCOUNTS` entry; nothing is stored.
pub(crate) fn run_provision(args: ProvisionArgs) -> Result<(), AppError> {
    let account = AdminDirectory::provision(&args.email, &args.password, args.role);
    println!("{}", account.entry());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_export_of_empty_store_writes_header_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("applications.csv");
        let summary = write_export(
            ExportKind::Csv,
            &[],
            &Institution::new("School", "Admission"),
            &out,
        )
        .expect("export");
        assert!(summary.starts_with("wrote 0 rows"));

        let written = fs::read_to_string(&out).expect("read export");
        assert!(written.starts_with("Application ID,Application Number,Register Number"));
        assert_eq!(written.lines().count(), 1);
    }

    #[test]
    fn empty_pdf_export_is_still_a_zip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("applications.zip");
        write_export(
            ExportKind::Pdfs,
            &[],
            &Institution::new("School", "Admission"),
            &out,
        )
        .expect("export");
        let bytes = fs::read(&out).expect("read export");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn role_parser_rejects_unknown_roles() {
        assert_eq!(parse_role("Viewer"), Ok(Role::Viewer));
        assert!(parse_role("owner").is_err());
    }
}
