/// Generic buffered document tree.
///
/// This is the base the DOCX dispatcher builds on: default node creation,
/// default close, text accumulation, table row bookkeeping and
/// serialization back to markup.
use super::element::{Element, ElementId, Node};
use super::names::{Attributes, ElementName};
use super::regions::Region;
use crate::common::xml::{escape_xml, unescape_xml};
use crate::ooxml::error::{ProtocolViolation, Result};
use std::borrow::Cow;
use std::fmt::Write as FmtWrite;
use tracing::trace;

/// Position of the innermost open table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPosition {
    /// Number of open tables, 1 for a top-level table
    pub table_depth: usize,
    /// Zero-based index of the row inside its table
    pub row_index: usize,
}

#[derive(Debug, Clone)]
struct TableFrame {
    table: ElementId,
    rows_seen: usize,
    open_row: Option<ElementId>,
}

/// Arena-backed element tree built from one forward scan.
#[derive(Debug, Clone)]
pub struct BufferedDocument {
    elements: Vec<Element>,
    stack: Vec<ElementId>,
    tables: Vec<TableFrame>,
    declaration: Option<String>,
}

impl Default for BufferedDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedDocument {
    pub fn new() -> Self {
        let root = Element::new("", "", "", Attributes::new(), None, Region::Plain);
        Self {
            elements: vec![root],
            stack: Vec::with_capacity(32),
            tables: Vec::new(),
            declaration: None,
        }
    }

    /// The synthetic root holding the document element.
    #[inline]
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// The innermost open element, or the root.
    #[inline]
    pub fn current_element(&self) -> ElementId {
        self.stack.last().copied().unwrap_or(ElementId(0))
    }

    /// Number of currently open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.index()]
    }

    pub(crate) fn region_mut(&mut self, id: ElementId) -> &mut Region {
        self.elements[id.index()].region_mut()
    }

    /// Total number of elements in the arena, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.len() == 1
    }

    pub(crate) fn set_declaration(&mut self, declaration: String) {
        self.declaration = Some(declaration);
    }

    /// Default node creation.
    ///
    /// The element becomes the last child of the current element and is
    /// pushed on the open-element stack.
    pub fn create_element(
        &mut self,
        uri: &str,
        local_name: &str,
        qname: &str,
        attributes: Attributes,
        region: Region,
    ) -> ElementId {
        let parent = self.current_element();
        let id = self.alloc(Element::new(uri, local_name, qname, attributes, Some(parent), region));
        self.elements[parent.index()].children.push(Node::Element(id));
        self.stack.push(id);

        match self.elements[id.index()].name() {
            ElementName::Tbl => self.tables.push(TableFrame {
                table: id,
                rows_seen: 0,
                open_row: None,
            }),
            ElementName::Tr => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.open_row = Some(id);
                }
            },
            _ => {},
        }
        id
    }

    /// Default close: pops the innermost open element.
    pub fn end_element(&mut self, qname: &str) -> Result<ElementId> {
        let Some(id) = self.stack.pop() else {
            return Err(ProtocolViolation::UnbalancedEnd {
                qname: qname.to_owned(),
            }
            .into());
        };
        let element = &mut self.elements[id.index()];
        element.closed = true;

        match element.name() {
            ElementName::Tbl => {
                if self.tables.last().is_some_and(|frame| frame.table == id) {
                    self.tables.pop();
                }
            },
            ElementName::Tr => {
                if let Some(frame) = self.tables.last_mut()
                    && frame.open_row == Some(id)
                {
                    frame.open_row = None;
                    frame.rows_seen += 1;
                }
            },
            _ => {},
        }
        trace!(qname, "closed element");
        Ok(id)
    }

    /// Append escaped character data to the current element.
    pub fn characters(&mut self, raw: &str) {
        let current = self.current_element();
        self.append_text(current, raw);
    }

    /// Append escaped character data to `id`, merging with a trailing text node.
    pub fn append_text(&mut self, id: ElementId, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let children = &mut self.elements[id.index()].children;
        if let Some(Node::Text(text)) = children.last_mut() {
            text.push_str(raw);
        } else {
            children.push(Node::Text(raw.to_owned()));
        }
    }

    /// Replace the content of `id` with a single text node.
    pub fn set_text(&mut self, id: ElementId, raw: &str) {
        let children = &mut self.elements[id.index()].children;
        children.clear();
        if !raw.is_empty() {
            children.push(Node::Text(raw.to_owned()));
        }
    }

    /// Discard every buffered child of `id`. Start and end tags are kept.
    pub fn clear_children(&mut self, id: ElementId) {
        self.elements[id.index()].children.clear();
    }

    /// Append an already closed element that did not come from the tokenizer.
    pub fn append_element(
        &mut self,
        parent: ElementId,
        uri: &str,
        local_name: &str,
        qname: &str,
    ) -> ElementId {
        let mut element = Element::new(uri, local_name, qname, Attributes::new(), Some(parent), Region::Plain);
        element.closed = true;
        let id = self.alloc(element);
        self.elements[parent.index()].children.push(Node::Element(id));
        id
    }

    /// Position of the innermost open table row, if any.
    pub fn current_row(&self) -> Option<RowPosition> {
        let frame = self.tables.last()?;
        frame.open_row.map(|_| RowPosition {
            table_depth: self.tables.len(),
            row_index: frame.rows_seen,
        })
    }

    /// Whether `id` is `ancestor` or one of its descendants.
    pub fn is_within(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.element(current).parent();
        }
        false
    }

    /// First descendant of `id` (depth first, document order) with the given name.
    pub fn find_descendant(&self, id: ElementId, name: ElementName) -> Option<ElementId> {
        let mut pending: Vec<ElementId> = self
            .element(id)
            .children()
            .iter()
            .rev()
            .filter_map(|node| match node {
                Node::Element(child) => Some(*child),
                Node::Text(_) => None,
            })
            .collect();
        while let Some(current) = pending.pop() {
            let element = self.element(current);
            if element.name() == name {
                return Some(current);
            }
            pending.extend(element.children().iter().rev().filter_map(|node| match node {
                Node::Element(child) => Some(*child),
                Node::Text(_) => None,
            }));
        }
        None
    }

    /// Unescaped text content of `id` and its descendants.
    pub fn text(&self, id: ElementId) -> String {
        let mut raw = String::new();
        self.collect_text(id, &mut raw);
        unescape_xml(&raw).into_owned()
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        for node in self.element(id).children() {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(child) => self.collect_text(*child, out),
            }
        }
    }

    /// Serialize the tree back to markup.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(self.elements.len() * 24);
        if let Some(declaration) = &self.declaration {
            out.push_str(declaration);
        }
        for node in self.element(self.root()).children() {
            self.write_node(node, &mut out);
        }
        out
    }

    fn write_node(&self, node: &Node, out: &mut String) {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(id) => self.write_element(*id, out),
        }
    }

    fn write_element(&self, id: ElementId, out: &mut String) {
        let element = self.element(id);

        // A resolved simple field is replaced by its result content
        if let Region::SimpleField(field) = element.region()
            && field.field().field_name().is_some()
        {
            for child in element.children() {
                self.write_node(child, out);
            }
            return;
        }

        out.push('<');
        out.push_str(element.qname());
        if let Region::Hyperlink(link) = element.region() {
            let _ = write!(out, " {}=\"{}\"", link.id_qname(), escape_xml(link.id()));
        }
        for attr in element.attributes() {
            let _ = write!(out, " {}=\"{}\"", attr.qname, double_quoted(&attr.value));
        }
        if element.children().is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in element.children() {
            self.write_node(child, out);
        }
        out.push_str("</");
        out.push_str(element.qname());
        out.push('>');
    }

    fn alloc(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(element);
        id
    }
}

/// An escaped attribute value made safe for double quotes.
///
/// Values read from single-quoted attributes may hold a literal `"`.
fn double_quoted(value: &str) -> Cow<'_, str> {
    if memchr::memchr(b'"', value.as_bytes()).is_some() {
        Cow::Owned(value.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}
