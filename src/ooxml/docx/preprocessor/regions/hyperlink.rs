/// Hyperlink region (`w:hyperlink` with an `r:id`).
use super::Region;
use super::complex_field::{self, CollapseOutcome};
use crate::ooxml::docx::preprocessor::buffered::BufferedDocument;
use crate::ooxml::docx::preprocessor::element::ElementId;
use crate::ooxml::docx::preprocessor::handler::MergeHandler;
use crate::ooxml::error::Result;
use smallvec::SmallVec;
use tracing::debug;

/// A hyperlink whose relationship id is kept apart from the generic
/// attributes so it can be rewritten.
#[derive(Debug, Clone)]
pub struct HyperlinkRegion {
    id_qname: String,
    id: String,
    original_id: String,
    runs: SmallVec<[ElementId; 4]>,
    processed: bool,
}

impl HyperlinkRegion {
    /// `id_qname` is the qualified attribute name (`r:id`), `id` its unescaped value.
    pub fn new(id_qname: String, id: String) -> Self {
        Self {
            id_qname,
            original_id: id.clone(),
            id,
            runs: SmallVec::new(),
            processed: false,
        }
    }

    #[inline]
    pub fn id_qname(&self) -> &str {
        &self.id_qname
    }

    /// Current relationship id, possibly rewritten.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Relationship id as found in the document.
    #[inline]
    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    #[inline]
    pub fn runs(&self) -> &[ElementId] {
        &self.runs
    }

    #[inline]
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub(crate) fn add_region(&mut self, run: ElementId) {
        self.runs.push(run);
    }

    /// Finalize the hyperlink once its end tag has been closed.
    ///
    /// Collapses complex fields among its runs, then offers the
    /// relationship id to the handler together with the merge fields found.
    /// Returns what the collapse did.
    pub(crate) fn process(
        doc: &mut BufferedDocument,
        handler: &mut dyn MergeHandler,
        id: ElementId,
    ) -> Result<CollapseOutcome> {
        let (runs, rel_id) = match doc.element(id).region() {
            Region::Hyperlink(link) => (link.runs.clone(), link.id.clone()),
            _ => return Ok(CollapseOutcome::default()),
        };

        let outcome = complex_field::collapse(doc, handler, &runs)?;
        let mut field_names = outcome.field_names.clone();
        for &run in &runs {
            if let Region::Run(region) = doc.element(run).region()
                && let Some(name) = region.field().field_name()
                && !field_names.iter().any(|known| known == name)
            {
                field_names.push(name.to_owned());
            }
        }

        let rewritten = handler.rewrite_hyperlink_id(&rel_id, &field_names)?;
        if let Region::Hyperlink(link) = doc.region_mut(id) {
            if let Some(new_id) = rewritten {
                debug!(from = %link.id, to = %new_id, "rewrote hyperlink relationship id");
                link.id = new_id;
            }
            link.processed = true;
        }
        Ok(outcome)
    }
}
