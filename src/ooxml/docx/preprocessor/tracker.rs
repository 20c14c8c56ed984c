/// The "current construct" slots of the forward scan.
use super::element::ElementId;
use crate::ooxml::error::{ConstructKind, ProtocolViolation};

/// One nullable slot per construct kind.
///
/// A slot holds an element only between that element's start and end
/// events, and at most one construct of each kind is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructTracker {
    paragraph: Option<ElementId>,
    run: Option<ElementId>,
    simple_field: Option<ElementId>,
    bookmark: Option<ElementId>,
    hyperlink: Option<ElementId>,
}

impl ConstructTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn paragraph(&self) -> Option<ElementId> {
        self.paragraph
    }

    #[inline]
    pub fn run(&self) -> Option<ElementId> {
        self.run
    }

    #[inline]
    pub fn simple_field(&self) -> Option<ElementId> {
        self.simple_field
    }

    #[inline]
    pub fn bookmark(&self) -> Option<ElementId> {
        self.bookmark
    }

    #[inline]
    pub fn hyperlink(&self) -> Option<ElementId> {
        self.hyperlink
    }

    #[inline]
    pub fn get(&self, kind: ConstructKind) -> Option<ElementId> {
        match kind {
            ConstructKind::Paragraph => self.paragraph,
            ConstructKind::Run => self.run,
            ConstructKind::SimpleField => self.simple_field,
            ConstructKind::Bookmark => self.bookmark,
            ConstructKind::Hyperlink => self.hyperlink,
        }
    }

    #[inline]
    pub fn is_open(&self, kind: ConstructKind) -> bool {
        self.get(kind).is_some()
    }

    /// Whether every slot is empty.
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }

    /// Occupy the slot of `kind`.
    pub fn open(&mut self, kind: ConstructKind, id: ElementId) -> Result<(), ProtocolViolation> {
        let slot = self.slot_mut(kind);
        if slot.is_some() {
            return Err(ProtocolViolation::NestedConstruct { kind });
        }
        *slot = Some(id);
        Ok(())
    }

    /// Release the slot of `kind`, which must hold `id`.
    pub fn close(&mut self, kind: ConstructKind, id: ElementId) -> Result<(), ProtocolViolation> {
        let slot = self.slot_mut(kind);
        if *slot != Some(id) {
            return Err(ProtocolViolation::UnmatchedEnd { kind });
        }
        *slot = None;
        Ok(())
    }

    /// Release the slot of `kind` whatever it holds.
    pub fn clear(&mut self, kind: ConstructKind) {
        *self.slot_mut(kind) = None;
    }

    fn slot_mut(&mut self, kind: ConstructKind) -> &mut Option<ElementId> {
        match kind {
            ConstructKind::Paragraph => &mut self.paragraph,
            ConstructKind::Run => &mut self.run,
            ConstructKind::SimpleField => &mut self.simple_field,
            ConstructKind::Bookmark => &mut self.bookmark,
            ConstructKind::Hyperlink => &mut self.hyperlink,
        }
    }
}
