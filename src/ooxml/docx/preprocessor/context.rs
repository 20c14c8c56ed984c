/// Ready-made [`MergeHandler`] backed by [`FieldsMetadata`].
use super::buffered::RowPosition;
use super::handler::{
    FieldsMetadataProvider, MergeHandler, RowContext, ScriptResolver, TextStyling,
};
use super::metadata::FieldsMetadata;
use super::options::PreprocessOptions;
use crate::ooxml::error::Result;

/// Where an injected script goes relative to its table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPlacement {
    BeforeRow,
    AfterRow,
}

/// A script carried by a field such as `@before-row[#list items as item]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedScript {
    pub placement: ScriptPlacement,
    /// Script body with the row token stripped
    pub script: String,
    /// Row the field was found in, if any
    pub row: Option<RowPosition>,
}

/// Handler producing `${name}` style expressions.
///
/// Script fields are field names that start with the configured before-row
/// or after-row token; their bodies are collected in [`scripts`](Self::scripts).
///
/// # Examples
///
/// ```rust
/// use docx_preprocess::ooxml::docx::preprocessor::{preprocess, FieldsMetadata, TemplateContext};
///
/// let xml = br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:fldSimple w:instr=" MERGEFIELD name "><w:r><w:t>name</w:t></w:r></w:fldSimple></w:p></w:body></w:document>"#;
/// let mut context = TemplateContext::new(FieldsMetadata::new());
/// let doc = preprocess(xml, &mut context)?;
/// assert!(doc.to_xml().contains("<w:t>${name}</w:t>"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    metadata: FieldsMetadata,
    options: PreprocessOptions,
    scripts: Vec<InjectedScript>,
    last_row: Option<RowPosition>,
}

impl TemplateContext {
    pub fn new(metadata: FieldsMetadata) -> Self {
        Self::with_options(metadata, PreprocessOptions::default())
    }

    pub fn with_options(metadata: FieldsMetadata, options: PreprocessOptions) -> Self {
        Self {
            metadata,
            options,
            scripts: Vec::new(),
            last_row: None,
        }
    }

    #[inline]
    pub fn metadata(&self) -> &FieldsMetadata {
        &self.metadata
    }

    #[inline]
    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Scripts collected during the scan, in document order.
    #[inline]
    pub fn scripts(&self) -> &[InjectedScript] {
        &self.scripts
    }

    fn collect_script(&mut self, field_name: &str, placement: ScriptPlacement) -> bool {
        let token = match placement {
            ScriptPlacement::BeforeRow => &self.options.before_row_token,
            ScriptPlacement::AfterRow => &self.options.after_row_token,
        };
        let Some(script) = field_name.strip_prefix(token.as_str()) else {
            return false;
        };
        self.scripts.push(InjectedScript {
            placement,
            script: script.trim().to_owned(),
            row: self.last_row,
        });
        true
    }
}

impl FieldsMetadataProvider for TemplateContext {
    fn text_styling(&self, instr: &str) -> Result<Option<TextStyling>> {
        self.metadata.text_styling(instr)
    }

    fn image_field_for(&self, bookmark_name: &str) -> Result<Option<String>> {
        self.metadata.image_field_for(bookmark_name)
    }
}

impl ScriptResolver for TemplateContext {
    fn has_before_script(&mut self, field_name: &str) -> Result<bool> {
        Ok(self.collect_script(field_name, ScriptPlacement::BeforeRow))
    }

    fn has_after_script(&mut self, field_name: &str) -> Result<bool> {
        Ok(self.collect_script(field_name, ScriptPlacement::AfterRow))
    }
}

impl RowContext for TemplateContext {
    fn rewrite_instruction(&mut self, instr: &str, row: Option<RowPosition>) -> Result<String> {
        self.last_row = row;
        Ok(instr.to_owned())
    }
}

impl MergeHandler for TemplateContext {
    fn field_expression(&self, field_name: &str, styling: Option<&TextStyling>) -> String {
        let PreprocessOptions {
            field_start,
            field_end,
            ..
        } = &self.options;
        match styling {
            Some(styling) => format!("{}{}?{}{}", field_start, field_name, styling.syntax.as_str(), field_end),
            None => format!("{}{}{}", field_start, field_name, field_end),
        }
    }
}
