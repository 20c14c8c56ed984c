/// Word (.docx) document support.
///
/// The container (the .docx archive) is opened by the caller; this module
/// works on the `word/document.xml` part.
///
/// # Example
///
/// ```rust
/// use docx_preprocess::ooxml::docx::preprocessor::{preprocess, FieldsMetadata, TemplateContext};
///
/// let mut metadata = FieldsMetadata::new();
/// metadata.add_image_field("photo", "logo");
/// let mut context = TemplateContext::new(metadata);
///
/// let xml = br#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:bookmarkStart w:id="0" w:name="logo"/><w:bookmarkEnd w:id="0"/></w:p>"#;
/// let doc = preprocess(xml, &mut context)?;
/// assert_eq!(doc.to_xml().as_bytes(), &xml[..]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod preprocessor;

pub use preprocessor::{DocxBufferedDocument, preprocess};
