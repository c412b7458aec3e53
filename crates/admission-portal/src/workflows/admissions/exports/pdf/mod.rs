//! Printable application documents drawn with explicit coordinates and
//! serialized without a PDF library.

pub mod document;
pub mod encode;
pub mod fonts;
pub mod layout;

pub use document::ApplicationDocument;
pub use encode::PdfEncoder;
pub use fonts::Font;
pub use layout::{Color, DocumentLayout, DrawOp, Page};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("application record is incomplete: {field} is blank")]
    IncompleteRecord { field: &'static str },
    #[error("character {character:?} in {text:?} cannot be printed with the standard PDF fonts")]
    UnsupportedText { character: char, text: String },
}
