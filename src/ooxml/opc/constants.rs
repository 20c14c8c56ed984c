/// Constant values related to the Open Packaging Convention.
///
/// Only the XML namespaces that the document preprocessor matches against
/// are kept here.

/// XML namespaces
pub mod namespace {
    /// WordprocessingML main namespace
    pub const WML_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    /// Office relationships namespace
    pub const OFC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// DrawingML main namespace
    pub const DML_MAIN: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

    /// Namespace bound to the `xmlns` prefix itself
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";

    /// Namespace bound to the `xml` prefix
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
}
