/// Merge field state shared by run and simple-field regions.
use crate::ooxml::docx::preprocessor::handler::{FieldResolution, TextStyling};

/// Instruction text of a field-bearing region and what it resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mergefield {
    instr_text: Option<String>,
    field_name: Option<String>,
    styling: Option<TextStyling>,
}

impl Mergefield {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an instruction together with its resolution.
    pub fn set_instr_text(&mut self, instr_text: String, resolution: FieldResolution) {
        self.instr_text = Some(instr_text);
        self.field_name = resolution.field_name;
        self.styling = resolution.styling;
    }

    /// The raw field code, after row rewriting.
    #[inline]
    pub fn instr_text(&self) -> Option<&str> {
        self.instr_text.as_deref()
    }

    /// `None` for instructions that are not merge fields.
    #[inline]
    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    #[inline]
    pub fn styling(&self) -> Option<&TextStyling> {
        self.styling.as_ref()
    }
}

const MERGEFIELD: &str = "MERGEFIELD";

/// Extract the field name of a `MERGEFIELD` instruction.
///
/// Switches (`\* MERGEFORMAT`, `\b "..."`) and surrounding quotes are
/// removed.
///
/// # Examples
///
/// ```
/// use docx_preprocess::ooxml::docx::preprocessor::parse_merge_field_name;
///
/// assert_eq!(parse_merge_field_name(" MERGEFIELD name \\* MERGEFORMAT ").as_deref(), Some("name"));
/// assert_eq!(parse_merge_field_name("MERGEFIELD \"first name\"").as_deref(), Some("first name"));
/// assert_eq!(parse_merge_field_name("PAGE"), None);
/// ```
pub fn parse_merge_field_name(instr: &str) -> Option<String> {
    let trimmed = instr.trim_start();
    let head = trimmed.get(..MERGEFIELD.len())?;
    if !head.eq_ignore_ascii_case(MERGEFIELD) {
        return None;
    }
    let rest = &trimmed[MERGEFIELD.len()..];
    if rest.chars().next().is_some_and(|c| !c.is_whitespace()) {
        return None;
    }

    let rest = match memchr::memchr(b'\\', rest.as_bytes()) {
        Some(switch) => &rest[..switch],
        None => rest,
    };
    let rest = rest.trim();
    let name = rest
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(rest)
        .trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_owned())
    }
}
