/// Simple field region (`w:fldSimple`).
use super::mergefield::Mergefield;

/// A single-element merge field.
#[derive(Debug, Clone, Default)]
pub struct SimpleFieldRegion {
    field: Mergefield,
    result_written: bool,
}

impl SimpleFieldRegion {
    pub fn new(field: Mergefield) -> Self {
        Self {
            field,
            result_written: false,
        }
    }

    #[inline]
    pub fn field(&self) -> &Mergefield {
        &self.field
    }

    /// Whether the merge expression has been written into a `w:t`.
    #[inline]
    pub fn is_result_written(&self) -> bool {
        self.result_written
    }

    pub(crate) fn mark_result_written(&mut self) {
        self.result_written = true;
    }
}
