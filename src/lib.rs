//! docx-preprocess - mail-merge preprocessing of Word document markup
//!
//! This library turns the `word/document.xml` part of a .docx template into
//! a buffered element tree in a single forward scan. Merge fields (simple
//! and complex field codes), image placeholder bookmarks and hyperlinks are
//! recognized while the scan runs, and each is finalized the moment it
//! closes, so the rewritten markup carries template expressions in place
//! of Word's field codes.
//!
//! # Features
//!
//! - **Single pass**: no lookahead, one event at a time
//! - **Typed dispatch**: elements and attributes are matched through closed
//!   enumerations keyed by namespace URI
//! - **Pluggable data binding**: field resolution, scripts and row rewriting
//!   go through the [`MergeHandler`](ooxml::docx::preprocessor::MergeHandler) trait
//!
//! # Example
//!
//! ```rust
//! use docx_preprocess::ooxml::docx::preprocessor::{preprocess, FieldsMetadata, TemplateContext};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let xml = r#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:r><w:t>Dear </w:t></w:r><w:fldSimple w:instr=" MERGEFIELD name "><w:r><w:t>«name»</w:t></w:r></w:fldSimple></w:p>"#.as_bytes();
//!
//! let mut context = TemplateContext::new(FieldsMetadata::new());
//! let doc = preprocess(xml, &mut context)?;
//! assert_eq!(
//!     doc.to_xml(),
//!     r#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:r><w:t>Dear </w:t></w:r><w:r><w:t>${name}</w:t></w:r></w:p>"#
//! );
//! # Ok(())
//! # }
//! ```

/// Shared XML helpers
pub mod common;

/// OOXML (Office Open XML) support
pub mod ooxml;

pub use ooxml::docx::preprocessor;
pub use ooxml::error::{OoxmlError, Result};
