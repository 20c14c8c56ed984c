/// Configuration of the document reader and of the ready-made
/// [`TemplateContext`](super::TemplateContext) handler.
///
/// # Examples
///
/// ```rust
/// use docx_preprocess::ooxml::docx::preprocessor::PreprocessOptions;
///
/// let options = PreprocessOptions::new()
///     .with_field_delimiters("[=", "]")
///     .with_before_row_token("@row-start");
/// assert_eq!(options.field_start, "[=");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Opening delimiter of a merge expression
    pub field_start: String,
    /// Closing delimiter of a merge expression
    pub field_end: String,
    /// Field name prefix marking a script injected before the table row
    pub before_row_token: String,
    /// Field name prefix marking a script injected after the table row
    pub after_row_token: String,
    /// Whether the XML declaration of the source is written back
    pub keep_declaration: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            field_start: "${".to_owned(),
            field_end: "}".to_owned(),
            before_row_token: "@before-row".to_owned(),
            after_row_token: "@after-row".to_owned(),
            keep_declaration: true,
        }
    }
}

impl PreprocessOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiters written around field names.
    #[inline]
    pub fn with_field_delimiters(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.field_start = start.into();
        self.field_end = end.into();
        self
    }

    #[inline]
    pub fn with_before_row_token(mut self, token: impl Into<String>) -> Self {
        self.before_row_token = token.into();
        self
    }

    #[inline]
    pub fn with_after_row_token(mut self, token: impl Into<String>) -> Self {
        self.after_row_token = token.into();
        self
    }

    #[inline]
    pub fn with_declaration(mut self, keep: bool) -> Self {
        self.keep_declaration = keep;
        self
    }
}
