/// Collaborator contracts consumed by the DOCX preprocessor.
///
/// The preprocessor never evaluates templates itself. It asks a
/// [`MergeHandler`] which instructions are merge fields, which bookmarks
/// are image placeholders and whether a field carries a conditional
/// script, and it asks for the template expression that replaces a field.
use super::buffered::RowPosition;
use super::regions::parse_merge_field_name;
use crate::ooxml::error::Result;
use serde::{Deserialize, Serialize};

/// Markup syntax a field value is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxKind {
    Html,
    Markdown,
    Plain,
}

impl SyntaxKind {
    /// Lowercase name used in template expressions.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Plain => "plain",
        }
    }
}

/// Field-level text styling metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyling {
    /// Name of the field the styling applies to
    pub field_name: String,
    pub syntax: SyntaxKind,
}

/// Result of resolving an instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldResolution {
    /// `None` when the instruction is not a merge field
    pub field_name: Option<String>,
    pub styling: Option<TextStyling>,
}

/// Field metadata lookups.
pub trait FieldsMetadataProvider {
    /// Styling declared for the field named by `instr`.
    fn text_styling(&self, instr: &str) -> Result<Option<TextStyling>>;

    /// Field name of an instruction, `None` if it is not a merge field.
    fn field_name(&self, instr: &str) -> Result<Option<String>> {
        Ok(parse_merge_field_name(instr))
    }

    /// Resolve both the field name and its styling.
    fn resolve(&self, instr: &str) -> Result<FieldResolution> {
        Ok(FieldResolution {
            field_name: self.field_name(instr)?,
            styling: self.text_styling(instr)?,
        })
    }

    /// Image field mapped to a bookmark name.
    fn image_field_for(&self, bookmark_name: &str) -> Result<Option<String>>;
}

/// Conditional script lookups.
///
/// A `true` answer means conditional content is injected around the field,
/// and the buffered content of the field's region is discarded.
pub trait ScriptResolver {
    fn has_before_script(&mut self, field_name: &str) -> Result<bool>;

    fn has_after_script(&mut self, field_name: &str) -> Result<bool>;
}

/// Hook for rewriting instructions that live inside repeated table rows.
pub trait RowContext {
    fn rewrite_instruction(&mut self, instr: &str, row: Option<RowPosition>) -> Result<String> {
        let _ = row;
        Ok(instr.to_owned())
    }
}

/// Everything the preprocessor needs from the data-binding side.
pub trait MergeHandler: FieldsMetadataProvider + ScriptResolver + RowContext {
    /// Template expression written in place of a merge field's result text.
    fn field_expression(&self, field_name: &str, styling: Option<&TextStyling>) -> String;

    /// New relationship id for a hyperlink, given the merge fields found in
    /// its runs. `None` keeps the original id.
    fn rewrite_hyperlink_id(&mut self, id: &str, field_names: &[String]) -> Result<Option<String>> {
        let _ = (id, field_names);
        Ok(None)
    }
}
