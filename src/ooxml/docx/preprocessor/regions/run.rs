/// Run region (`w:r`).
use super::mergefield::Mergefield;
use crate::ooxml::docx::preprocessor::names::FldCharType;

/// A top-level text run.
///
/// Runs carry the complex field marker found in them, if any, and the
/// instruction text captured from their `w:instrText` children.
#[derive(Debug, Clone, Default)]
pub struct RunRegion {
    fld_char_type: Option<FldCharType>,
    raw_instr: String,
    field: Mergefield,
    script_reset: bool,
}

impl RunRegion {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn fld_char_type(&self) -> Option<FldCharType> {
        self.fld_char_type
    }

    pub(crate) fn set_fld_char_type(&mut self, fld_char_type: Option<FldCharType>) {
        if fld_char_type.is_some() {
            self.fld_char_type = fld_char_type;
        }
    }

    #[inline]
    pub fn field(&self) -> &Mergefield {
        &self.field
    }

    #[inline]
    pub(crate) fn field_mut(&mut self) -> &mut Mergefield {
        &mut self.field
    }

    /// Instruction text captured from `w:instrText`, before any rewriting.
    #[inline]
    pub fn raw_instr(&self) -> &str {
        &self.raw_instr
    }

    pub(crate) fn push_raw_instr(&mut self, text: &str) {
        self.raw_instr.push_str(text);
    }

    /// Whether the run content was discarded for an injected script.
    #[inline]
    pub fn is_script_reset(&self) -> bool {
        self.script_reset
    }

    pub(crate) fn mark_script_reset(&mut self) {
        self.script_reset = true;
    }
}
