//! Admission application intake, review, and export.
//!
//! The public side accepts structured applications, checks register numbers, and hands
//! applicants a short-lived confirmation token. The admin side lists, prints, and exports
//! submissions as spreadsheets or archives of PDF documents.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
