//! Mail-merge preprocessing of `word/document.xml`.
//!
//! The preprocessor performs one forward scan over the document markup and
//! builds a buffered element tree in which the constructs relevant to
//! templating are specialized regions:
//!
//! - paragraphs (`w:p`), which collapse complex field codes when they close
//! - runs (`w:r`), which record complex field markers and instruction text
//! - simple fields (`w:fldSimple`), whose result becomes a merge expression
//! - bookmarks naming an image field (`w:bookmarkStart`)
//! - hyperlinks with a relationship id (`w:hyperlink r:id`)
//!
//! Field-bearing regions ask the [`MergeHandler`] for conditional scripts
//! when they close; a hit discards their buffered content.
//!
//! # Example
//!
//! ```rust
//! use docx_preprocess::ooxml::docx::preprocessor::{preprocess, FieldsMetadata, TemplateContext};
//!
//! let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
//! <w:body><w:p>
//! <w:r><w:fldChar w:fldCharType="begin"/></w:r>
//! <w:r><w:instrText xml:space="preserve"> MERGEFIELD city </w:instrText></w:r>
//! <w:r><w:fldChar w:fldCharType="separate"/></w:r>
//! <w:r><w:t>«city»</w:t></w:r>
//! <w:r><w:fldChar w:fldCharType="end"/></w:r>
//! </w:p></w:body></w:document>"#.as_bytes();
//!
//! let mut context = TemplateContext::new(FieldsMetadata::new());
//! let doc = preprocess(xml, &mut context)?;
//! assert!(doc.to_xml().contains("<w:t>${city}</w:t>"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod buffered;
mod context;
mod document;
mod element;
mod handler;
mod metadata;
mod names;
mod options;
mod reader;
mod regions;
mod tracker;

#[cfg(test)]
mod tests;

pub use buffered::{BufferedDocument, RowPosition};
pub use context::{InjectedScript, ScriptPlacement, TemplateContext};
pub use document::{DocxBufferedDocument, ProcessStats};
pub use element::{Element, ElementId, Node};
pub use handler::{
    FieldResolution, FieldsMetadataProvider, MergeHandler, RowContext, ScriptResolver, SyntaxKind,
    TextStyling,
};
pub use metadata::{FieldMetadata, FieldsMetadata};
pub use names::{AttrName, Attribute, Attributes, ElementName, FldCharType};
pub use options::PreprocessOptions;
pub use reader::{feed, preprocess, preprocess_with_stats};
pub use regions::{
    BookmarkImageRegion, CollapseOutcome, HyperlinkRegion, Mergefield, ParagraphChild,
    ParagraphRegion, Region, RunRegion, SimpleFieldRegion, parse_merge_field_name,
};
pub use tracker::ConstructTracker;
