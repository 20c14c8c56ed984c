/// Paragraph region (`w:p`).
use super::Region;
use super::complex_field::{self, CollapseOutcome};
use crate::ooxml::docx::preprocessor::buffered::BufferedDocument;
use crate::ooxml::docx::preprocessor::element::ElementId;
use crate::ooxml::docx::preprocessor::handler::MergeHandler;
use crate::ooxml::error::Result;
use smallvec::SmallVec;
use tracing::debug;

/// A region registered with its paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphChild {
    Run(ElementId),
    Hyperlink(ElementId),
}

/// A paragraph and the run / hyperlink regions added to it while it was open.
#[derive(Debug, Clone, Default)]
pub struct ParagraphRegion {
    regions: SmallVec<[ParagraphChild; 8]>,
    processed: bool,
}

impl ParagraphRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_region(&mut self, child: ParagraphChild) {
        self.regions.push(child);
    }

    #[inline]
    pub fn regions(&self) -> &[ParagraphChild] {
        &self.regions
    }

    #[inline]
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Finalize the paragraph once its end tag has been closed.
    ///
    /// Complex fields made of the paragraph's own runs are collapsed.
    /// Runs that belong to a hyperlink were handled when the hyperlink
    /// closed.
    pub(crate) fn process(
        doc: &mut BufferedDocument,
        handler: &mut dyn MergeHandler,
        id: ElementId,
    ) -> Result<CollapseOutcome> {
        let runs: SmallVec<[ElementId; 8]> = match doc.element(id).region() {
            Region::Paragraph(paragraph) => paragraph
                .regions
                .iter()
                .filter_map(|child| match child {
                    ParagraphChild::Run(run) => Some(*run),
                    ParagraphChild::Hyperlink(_) => None,
                })
                .collect(),
            _ => return Ok(CollapseOutcome::default()),
        };

        let outcome = complex_field::collapse(doc, handler, &runs)?;
        if let Region::Paragraph(paragraph) = doc.region_mut(id) {
            paragraph.processed = true;
        }
        debug!(runs = runs.len(), fields = outcome.field_names.len(), "processed paragraph");
        Ok(outcome)
    }
}
