/// Nodes of the buffered document tree.
use super::names::{Attributes, ElementName};
use super::regions::Region;

/// Index of an element in the buffered document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(ElementId),
    /// Character data in escaped wire form
    Text(String),
}

/// A buffered element.
///
/// Generic elements carry [`Region::Plain`]; the constructs recognized by
/// the preprocessor carry their region state in [`Element::region`].
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) uri: String,
    pub(crate) local_name: String,
    pub(crate) qname: String,
    pub(crate) name: ElementName,
    pub(crate) attributes: Attributes,
    pub(crate) children: Vec<Node>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) region: Region,
    pub(crate) closed: bool,
}

impl Element {
    pub(crate) fn new(
        uri: &str,
        local_name: &str,
        qname: &str,
        attributes: Attributes,
        parent: Option<ElementId>,
        region: Region,
    ) -> Self {
        Self {
            uri: uri.to_owned(),
            local_name: local_name.to_owned(),
            qname: qname.to_owned(),
            name: ElementName::classify(uri, local_name),
            attributes,
            children: Vec::new(),
            parent,
            region,
            closed: false,
        }
    }

    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[inline]
    pub fn qname(&self) -> &str {
        &self.qname
    }

    #[inline]
    pub fn name(&self) -> ElementName {
        self.name
    }

    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    #[inline]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[inline]
    pub fn region(&self) -> &Region {
        &self.region
    }

    #[inline]
    pub(crate) fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    /// Whether the end event of this element has been seen.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Prefix of the qualified name (`w` for `w:r`).
    pub fn prefix(&self) -> Option<&str> {
        self.qname.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Qualified name for a sibling element in the same namespace.
    pub(crate) fn sibling_qname(&self, local_name: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local_name),
            None => local_name.to_owned(),
        }
    }
}
