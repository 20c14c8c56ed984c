//! Specialized regions of the buffered DOCX tree.
//!
//! Every recognized construct is an ordinary buffered element whose
//! [`Region`] payload carries the state it needs to finalize itself.

mod bookmark;
mod complex_field;
mod fld_simple;
mod hyperlink;
mod mergefield;
mod paragraph;
mod run;

pub use bookmark::BookmarkImageRegion;
pub use complex_field::CollapseOutcome;
pub use fld_simple::SimpleFieldRegion;
pub use hyperlink::HyperlinkRegion;
pub use mergefield::{Mergefield, parse_merge_field_name};
pub use paragraph::{ParagraphChild, ParagraphRegion};
pub use run::RunRegion;

use crate::ooxml::error::ConstructKind;

/// Region payload of a buffered element.
#[derive(Debug, Clone, Default)]
pub enum Region {
    /// Generic element built by default node creation
    #[default]
    Plain,
    Paragraph(ParagraphRegion),
    Run(RunRegion),
    SimpleField(SimpleFieldRegion),
    BookmarkImage(BookmarkImageRegion),
    Hyperlink(HyperlinkRegion),
}

impl Region {
    /// Tracker slot this region occupies while open.
    pub fn kind(&self) -> Option<ConstructKind> {
        match self {
            Self::Plain => None,
            Self::Paragraph(_) => Some(ConstructKind::Paragraph),
            Self::Run(_) => Some(ConstructKind::Run),
            Self::SimpleField(_) => Some(ConstructKind::SimpleField),
            Self::BookmarkImage(_) => Some(ConstructKind::Bookmark),
            Self::Hyperlink(_) => Some(ConstructKind::Hyperlink),
        }
    }

    /// Merge field state of field-bearing regions.
    pub fn mergefield(&self) -> Option<&Mergefield> {
        match self {
            Self::Run(run) => Some(run.field()),
            Self::SimpleField(field) => Some(field.field()),
            _ => None,
        }
    }

    #[inline]
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain)
    }
}
