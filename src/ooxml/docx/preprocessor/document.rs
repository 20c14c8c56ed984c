/// Event-driven DOCX buffered document.
///
/// Start events go through [`DocxBufferedDocument::start_element`], end
/// events through [`DocxBufferedDocument::end_element`]. Both classify the
/// element, then either build a specialized region or fall back to the
/// default tree building of [`BufferedDocument`].
///
/// At most one paragraph is open at a time. A `w:p` inside a text box
/// (`w:txbxContent` within a run of an open paragraph) is rejected with
/// [`ProtocolViolation::NestedConstruct`], which aborts the scan, so
/// templates with text boxes in the body cannot be preprocessed.
use super::buffered::BufferedDocument;
use super::element::ElementId;
use super::handler::{FieldResolution, MergeHandler};
use super::names::{AttrName, Attributes, ElementName, FldCharType};
use super::regions::{
    BookmarkImageRegion, CollapseOutcome, HyperlinkRegion, Mergefield, ParagraphChild,
    ParagraphRegion, Region, RunRegion, SimpleFieldRegion,
};
use super::tracker::ConstructTracker;
use crate::common::xml::escape_xml;
use crate::ooxml::error::{ConstructKind, OoxmlError, ProtocolViolation, Result};
use tracing::{debug, trace, warn};

/// Counters of the finalization work done during a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub paragraphs_processed: usize,
    pub hyperlinks_processed: usize,
    /// Regions whose content was discarded for an injected script
    pub resets: usize,
    pub script_hits: usize,
    pub collapsed_fields: usize,
}

/// What a start element turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Construct {
    Default,
    Paragraph,
    Run,
    SimpleField { instr: String },
    BookmarkImage { bookmark: String, image_field: String },
    Hyperlink { id_index: usize },
}

/// Buffered `word/document.xml` that recognizes mail-merge constructs.
pub struct DocxBufferedDocument<'h> {
    handler: &'h mut dyn MergeHandler,
    tree: BufferedDocument,
    tracker: ConstructTracker,
    stats: ProcessStats,
}

impl<'h> DocxBufferedDocument<'h> {
    pub fn new(handler: &'h mut dyn MergeHandler) -> Self {
        Self {
            handler,
            tree: BufferedDocument::new(),
            tracker: ConstructTracker::new(),
            stats: ProcessStats::default(),
        }
    }

    #[inline]
    pub fn tree(&self) -> &BufferedDocument {
        &self.tree
    }

    #[inline]
    pub fn tracker(&self) -> &ConstructTracker {
        &self.tracker
    }

    #[inline]
    pub fn stats(&self) -> ProcessStats {
        self.stats
    }

    pub(crate) fn tree_mut(&mut self) -> &mut BufferedDocument {
        &mut self.tree
    }

    /// End the scan and hand over the finished tree.
    ///
    /// Fails if a paragraph, run, simple field or hyperlink is still open.
    pub fn finish(self) -> Result<BufferedDocument> {
        for kind in [
            ConstructKind::Paragraph,
            ConstructKind::Run,
            ConstructKind::SimpleField,
            ConstructKind::Hyperlink,
        ] {
            if self.tracker.is_open(kind) {
                return Err(violation(ProtocolViolation::Unterminated { kind }));
            }
        }
        Ok(self.tree)
    }

    /// Handle a start element event.
    pub fn start_element(
        &mut self,
        uri: &str,
        local_name: &str,
        qname: &str,
        mut attributes: Attributes,
    ) -> Result<ElementId> {
        let name = ElementName::classify(uri, local_name);
        self.observe_start(name, &attributes);

        let construct = self.classify(name, &attributes)?;
        trace!(qname, ?construct, "start element");

        match construct {
            Construct::Default => {
                Ok(self.tree.create_element(uri, local_name, qname, attributes, Region::Plain))
            },
            Construct::Paragraph => {
                self.ensure_free(ConstructKind::Paragraph)?;
                let id = self.tree.create_element(
                    uri,
                    local_name,
                    qname,
                    attributes,
                    Region::Paragraph(ParagraphRegion::new()),
                );
                self.tracker.open(ConstructKind::Paragraph, id)?;
                Ok(id)
            },
            Construct::Run => {
                self.ensure_free(ConstructKind::Run)?;
                let id = self.tree.create_element(
                    uri,
                    local_name,
                    qname,
                    attributes,
                    Region::Run(RunRegion::new()),
                );
                self.tracker.open(ConstructKind::Run, id)?;
                self.attach_run(id);
                Ok(id)
            },
            Construct::SimpleField { instr } => {
                self.ensure_free(ConstructKind::SimpleField)?;
                let styling = self.handler.text_styling(&instr)?;
                let instr = self.handler.rewrite_instruction(&instr, self.tree.current_row())?;
                let field_name = self.handler.field_name(&instr)?;
                let mut field = Mergefield::new();
                field.set_instr_text(instr, FieldResolution { field_name, styling });

                let id = self.tree.create_element(
                    uri,
                    local_name,
                    qname,
                    attributes,
                    Region::SimpleField(SimpleFieldRegion::new(field)),
                );
                self.tracker.open(ConstructKind::SimpleField, id)?;
                Ok(id)
            },
            Construct::BookmarkImage {
                bookmark,
                image_field,
            } => {
                self.ensure_free(ConstructKind::Bookmark)?;
                debug!(%bookmark, %image_field, "image placeholder bookmark");
                let id = self.tree.create_element(
                    uri,
                    local_name,
                    qname,
                    attributes,
                    Region::BookmarkImage(BookmarkImageRegion::new(bookmark, image_field)),
                );
                self.tracker.open(ConstructKind::Bookmark, id)?;
                Ok(id)
            },
            Construct::Hyperlink { id_index } => {
                self.ensure_free(ConstructKind::Hyperlink)?;
                let rel_id = attributes.remove(id_index);
                let region = HyperlinkRegion::new(rel_id.qname.clone(), rel_id.unescaped_value().into_owned());
                let id = self.tree.create_element(
                    uri,
                    local_name,
                    qname,
                    attributes,
                    Region::Hyperlink(region),
                );
                self.tracker.open(ConstructKind::Hyperlink, id)?;
                if let Some(paragraph) = self.tracker.paragraph()
                    && let Region::Paragraph(region) = self.tree.region_mut(paragraph)
                {
                    region.add_region(ParagraphChild::Hyperlink(id));
                }
                Ok(id)
            },
        }
    }

    /// Handle an end element event.
    pub fn end_element(&mut self, uri: &str, local_name: &str, qname: &str) -> Result<()> {
        if self.tree.depth() == 0 {
            return Err(violation(ProtocolViolation::UnbalancedEnd {
                qname: qname.to_owned(),
            }));
        }
        let id = self.tree.current_element();
        let kind = self.tree.element(id).region().kind();
        trace!(uri, local_name, qname, ?kind, "end element");

        match kind {
            Some(ConstructKind::Paragraph) => {
                self.ensure_current(ConstructKind::Paragraph, id)?;
                self.tree.end_element(qname)?;
                let outcome = ParagraphRegion::process(&mut self.tree, &mut *self.handler, id)?;
                self.stats.paragraphs_processed += 1;
                self.record_collapse(&outcome);
                self.tracker.close(ConstructKind::Paragraph, id)?;
            },
            Some(ConstructKind::Run) => {
                self.ensure_current(ConstructKind::Run, id)?;
                self.tree.end_element(qname)?;
                if self.process_script_before_after(id)? {
                    self.reset(id);
                    if let Region::Run(run) = self.tree.region_mut(id) {
                        run.mark_script_reset();
                    }
                }
                self.tracker.close(ConstructKind::Run, id)?;
            },
            Some(ConstructKind::SimpleField) => {
                self.ensure_current(ConstructKind::SimpleField, id)?;
                if self.process_script_before_after(id)? {
                    self.reset(id);
                } else {
                    self.complete_simple_field(id);
                }
                self.tree.end_element(qname)?;
                self.tracker.close(ConstructKind::SimpleField, id)?;
            },
            Some(ConstructKind::Hyperlink) => {
                self.ensure_current(ConstructKind::Hyperlink, id)?;
                self.tree.end_element(qname)?;
                let outcome = HyperlinkRegion::process(&mut self.tree, &mut *self.handler, id)?;
                self.stats.hyperlinks_processed += 1;
                self.record_collapse(&outcome);
                self.tracker.close(ConstructKind::Hyperlink, id)?;
            },
            Some(ConstructKind::Bookmark) | None => {
                self.tree.end_element(qname)?;
                if self.tree.element(id).name() == ElementName::InstrText {
                    self.capture_instr_text(id)?;
                }
            },
        }
        Ok(())
    }

    /// Handle character data, given in escaped wire form.
    ///
    /// Result text of a resolved simple field is replaced by the field's
    /// merge expression.
    pub fn characters(&mut self, raw: &str) -> Result<()> {
        if let Some(field_id) = self.tracker.simple_field() {
            let current = self.tree.current_element();
            if self.tree.element(current).name() == ElementName::T
                && self.tree.is_within(current, field_id)
                && let Region::SimpleField(field) = self.tree.element(field_id).region()
                && let Some(name) = field.field().field_name()
            {
                if !field.is_result_written() {
                    let expression = self.handler.field_expression(name, field.field().styling());
                    self.tree.append_text(current, &escape_xml(&expression));
                    if let Region::SimpleField(field) = self.tree.region_mut(field_id) {
                        field.mark_result_written();
                    }
                }
                return Ok(());
            }
        }
        self.tree.characters(raw);
        Ok(())
    }

    /// Side effects of a start element that do not change how it is built.
    fn observe_start(&mut self, name: ElementName, attributes: &Attributes) {
        match name {
            ElementName::FldChar => {
                if let Some(run) = self.tracker.run() {
                    let fld_char_type = attributes
                        .get(AttrName::W_FLD_CHAR_TYPE)
                        .and_then(|value| FldCharType::parse(&value));
                    if let Region::Run(region) = self.tree.region_mut(run) {
                        region.set_fld_char_type(fld_char_type);
                    }
                }
            },
            ElementName::BookmarkEnd => self.tracker.clear(ConstructKind::Bookmark),
            ElementName::Blip => {
                if let Some(bookmark) = self.tracker.bookmark()
                    && let Some(embed) = attributes.get(AttrName::R_EMBED)
                    && let Region::BookmarkImage(region) = self.tree.region_mut(bookmark)
                {
                    region.add_blip(embed.into_owned());
                }
            },
            _ => {},
        }
    }

    fn classify(&mut self, name: ElementName, attributes: &Attributes) -> Result<Construct> {
        let construct = match name {
            ElementName::P => Construct::Paragraph,
            ElementName::R if !self.tracker.is_open(ConstructKind::SimpleField) => Construct::Run,
            ElementName::FldSimple => Construct::SimpleField {
                instr: attributes
                    .get(AttrName::W_INSTR)
                    .map(|instr| instr.into_owned())
                    .unwrap_or_default(),
            },
            ElementName::BookmarkStart => match attributes.get(AttrName::W_NAME) {
                Some(bookmark) => match self.handler.image_field_for(&bookmark)? {
                    Some(image_field) => Construct::BookmarkImage {
                        bookmark: bookmark.into_owned(),
                        image_field,
                    },
                    None => Construct::Default,
                },
                None => Construct::Default,
            },
            ElementName::Hyperlink => match attributes.position(AttrName::R_ID) {
                Some(id_index) => Construct::Hyperlink { id_index },
                None => Construct::Default,
            },
            _ => Construct::Default,
        };
        Ok(construct)
    }

    /// Register a new run with the open hyperlink, else the open paragraph.
    fn attach_run(&mut self, run: ElementId) {
        if let Some(hyperlink) = self.tracker.hyperlink() {
            if let Region::Hyperlink(region) = self.tree.region_mut(hyperlink) {
                region.add_region(run);
            }
        } else if let Some(paragraph) = self.tracker.paragraph()
            && let Region::Paragraph(region) = self.tree.region_mut(paragraph)
        {
            region.add_region(ParagraphChild::Run(run));
        }
    }

    /// Append the text of a closed `w:instrText` to the open run.
    fn capture_instr_text(&mut self, instr_text: ElementId) -> Result<()> {
        let Some(run) = self.tracker.run() else {
            return Ok(());
        };
        if !self.tree.is_within(instr_text, run) {
            return Ok(());
        }
        let text = self.tree.text(instr_text);
        let raw = match self.tree.region_mut(run) {
            Region::Run(region) => {
                region.push_raw_instr(&text);
                region.raw_instr().to_owned()
            },
            _ => return Ok(()),
        };

        let instr = self.handler.rewrite_instruction(&raw, self.tree.current_row())?;
        let resolution = self.handler.resolve(&instr)?;
        if let Region::Run(region) = self.tree.region_mut(run) {
            region.field_mut().set_instr_text(instr, resolution);
        }
        Ok(())
    }

    /// Write the merge expression of a resolved simple field that received
    /// no result text.
    fn complete_simple_field(&mut self, id: ElementId) {
        let expression = match self.tree.element(id).region() {
            Region::SimpleField(field) if !field.is_result_written() => {
                match field.field().field_name() {
                    Some(name) => self.handler.field_expression(name, field.field().styling()),
                    None => return,
                }
            },
            _ => return,
        };
        let expression = escape_xml(&expression).into_owned();

        let t = match self.tree.find_descendant(id, ElementName::T) {
            Some(t) => t,
            None => {
                let element = self.tree.element(id);
                let uri = element.uri().to_owned();
                let run_qname = element.sibling_qname("r");
                let t_qname = element.sibling_qname("t");
                let run = self.tree.append_element(id, &uri, "r", &run_qname);
                self.tree.append_element(run, &uri, "t", &t_qname)
            },
        };
        self.tree.set_text(t, &expression);
        if let Region::SimpleField(field) = self.tree.region_mut(id) {
            field.mark_result_written();
        }
    }

    /// Ask for a before script, then for an after script, of the region's field.
    fn process_script_before_after(&mut self, id: ElementId) -> Result<bool> {
        let Some(field_name) = self
            .tree
            .element(id)
            .region()
            .mergefield()
            .and_then(Mergefield::field_name)
            .map(str::to_owned)
        else {
            return Ok(false);
        };

        let has_script = self.handler.has_before_script(&field_name)?
            || self.handler.has_after_script(&field_name)?;
        if has_script {
            debug!(field = %field_name, "conditional script injected");
            self.stats.script_hits += 1;
        }
        Ok(has_script)
    }

    fn record_collapse(&mut self, outcome: &CollapseOutcome) {
        self.stats.collapsed_fields += outcome.field_names.len();
        self.stats.resets += outcome.script_hits;
        self.stats.script_hits += outcome.script_hits;
    }

    /// Discard the buffered content of a region.
    fn reset(&mut self, id: ElementId) {
        self.tree.clear_children(id);
        self.stats.resets += 1;
    }

    fn ensure_free(&self, kind: ConstructKind) -> Result<()> {
        if self.tracker.is_open(kind) {
            return Err(violation(ProtocolViolation::NestedConstruct { kind }));
        }
        Ok(())
    }

    fn ensure_current(&self, kind: ConstructKind, id: ElementId) -> Result<()> {
        if self.tracker.get(kind) != Some(id) {
            return Err(violation(ProtocolViolation::UnmatchedEnd { kind }));
        }
        Ok(())
    }
}

fn violation(violation: ProtocolViolation) -> OoxmlError {
    warn!(%violation, "aborting document scan");
    violation.into()
}
