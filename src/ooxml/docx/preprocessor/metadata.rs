/// Fields metadata: which fields exist, how they are styled and which
/// bookmarks stand for images.
use super::handler::{FieldsMetadataProvider, SyntaxKind, TextStyling};
use super::regions::parse_merge_field_name;
use crate::ooxml::error::{OoxmlError, Result};
use serde::{Deserialize, Serialize};

/// Metadata of a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub field_name: String,
    /// Bookmark name marking the image placeholder of an image field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    /// Markup syntax of the field value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_kind: Option<SyntaxKind>,
    /// Whether the field is a list item repeated over table rows
    #[serde(default)]
    pub list_field: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldMetadata {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            image_name: None,
            syntax_kind: None,
            list_field: false,
            description: None,
        }
    }
}

/// Metadata of all fields of a template.
///
/// # Examples
///
/// ```rust
/// use docx_preprocess::ooxml::docx::preprocessor::{FieldsMetadata, FieldsMetadataProvider};
///
/// let metadata = FieldsMetadata::from_yaml(
///     "fields:\n  - field_name: photo\n    image_name: logo\n",
/// )?;
/// assert_eq!(metadata.image_field_for("logo")?.as_deref(), Some("photo"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsMetadata {
    #[serde(default)]
    pub fields: Vec<FieldMetadata>,
}

impl FieldsMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse metadata from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| OoxmlError::InvalidFormat(format!("Failed to parse fields metadata: {}", e)))
    }

    /// Serialize metadata to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| OoxmlError::Other(format!("Failed to serialize fields metadata: {}", e)))
    }

    /// Declare a field, returning its metadata for further tuning.
    pub fn add_field(&mut self, field_name: impl Into<String>) -> &mut FieldMetadata {
        let field_name = field_name.into();
        let index = match self.fields.iter().position(|f| f.field_name == field_name) {
            Some(index) => index,
            None => {
                self.fields.push(FieldMetadata::new(field_name));
                self.fields.len() - 1
            },
        };
        &mut self.fields[index]
    }

    /// Declare an image field whose placeholder is the bookmark `image_name`.
    pub fn add_image_field(&mut self, field_name: impl Into<String>, image_name: impl Into<String>) {
        self.add_field(field_name).image_name = Some(image_name.into());
    }

    pub fn field(&self, field_name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }
}

impl FieldsMetadataProvider for FieldsMetadata {
    fn text_styling(&self, instr: &str) -> Result<Option<TextStyling>> {
        let Some(name) = parse_merge_field_name(instr) else {
            return Ok(None);
        };
        Ok(self.field(&name).and_then(|field| {
            field.syntax_kind.map(|syntax| TextStyling {
                field_name: field.field_name.clone(),
                syntax,
            })
        }))
    }

    fn image_field_for(&self, bookmark_name: &str) -> Result<Option<String>> {
        Ok(self
            .fields
            .iter()
            .find(|f| f.image_name.as_deref() == Some(bookmark_name))
            .map(|f| f.field_name.clone()))
    }
}
