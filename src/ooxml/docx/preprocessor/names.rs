/// Typed names for the elements and attributes the preprocessor reacts to.
///
/// Matching is done on namespace URI and local name so that documents using
/// non-standard prefixes are recognized too.
use crate::common::xml::unescape_xml;
use crate::ooxml::opc::constants::namespace;
use std::borrow::Cow;

/// A recognized WordprocessingML or DrawingML element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementName {
    /// `w:p`
    P,
    /// `w:r`
    R,
    /// `w:t`
    T,
    /// `w:fldSimple`
    FldSimple,
    /// `w:fldChar`
    FldChar,
    /// `w:instrText`
    InstrText,
    /// `w:bookmarkStart`
    BookmarkStart,
    /// `w:bookmarkEnd`
    BookmarkEnd,
    /// `w:hyperlink`
    Hyperlink,
    /// `w:tbl`
    Tbl,
    /// `w:tr`
    Tr,
    /// `a:blip`
    Blip,
    /// Anything else
    Other,
}

impl ElementName {
    /// Classify an element by namespace URI and local name.
    pub fn classify(uri: &str, local_name: &str) -> Self {
        if uri == namespace::WML_MAIN {
            match local_name {
                "p" => Self::P,
                "r" => Self::R,
                "t" => Self::T,
                "fldSimple" => Self::FldSimple,
                "fldChar" => Self::FldChar,
                "instrText" => Self::InstrText,
                "bookmarkStart" => Self::BookmarkStart,
                "bookmarkEnd" => Self::BookmarkEnd,
                "hyperlink" => Self::Hyperlink,
                "tbl" => Self::Tbl,
                "tr" => Self::Tr,
                _ => Self::Other,
            }
        } else if uri == namespace::DML_MAIN && local_name == "blip" {
            Self::Blip
        } else {
            Self::Other
        }
    }
}

/// A recognized namespaced attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum AttrName {
    /// `w:instr` on `w:fldSimple`
    W_INSTR,
    /// `w:name` on `w:bookmarkStart`
    W_NAME,
    /// `w:fldCharType` on `w:fldChar`
    W_FLD_CHAR_TYPE,
    /// `r:id` on `w:hyperlink`
    R_ID,
    /// `r:embed` on `a:blip`
    R_EMBED,
}

impl AttrName {
    /// Namespace URI and local name of the attribute.
    #[inline]
    pub fn parts(self) -> (&'static str, &'static str) {
        match self {
            Self::W_INSTR => (namespace::WML_MAIN, "instr"),
            Self::W_NAME => (namespace::WML_MAIN, "name"),
            Self::W_FLD_CHAR_TYPE => (namespace::WML_MAIN, "fldCharType"),
            Self::R_ID => (namespace::OFC_RELATIONSHIPS, "id"),
            Self::R_EMBED => (namespace::OFC_RELATIONSHIPS, "embed"),
        }
    }
}

/// A single attribute as delivered by the tokenizer.
///
/// `value` is kept in its escaped wire form so that serialization does not
/// need to re-escape untouched attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub uri: String,
    pub local_name: String,
    pub qname: String,
    pub value: String,
}

impl Attribute {
    pub fn new(
        uri: impl Into<String>,
        local_name: impl Into<String>,
        qname: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            local_name: local_name.into(),
            qname: qname.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn is(&self, name: AttrName) -> bool {
        let (uri, local) = name.parts();
        self.uri == uri && self.local_name == local
    }

    /// The attribute value with predefined entities resolved.
    #[inline]
    pub fn unescaped_value(&self) -> Cow<'_, str> {
        unescape_xml(&self.value)
    }
}

/// Ordered attribute list of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attr: Attribute) {
        self.items.push(attr);
    }

    /// Index of a recognized attribute.
    pub fn position(&self, name: AttrName) -> Option<usize> {
        self.items.iter().position(|attr| attr.is(name))
    }

    /// Unescaped value of a recognized attribute.
    pub fn get(&self, name: AttrName) -> Option<Cow<'_, str>> {
        self.items
            .iter()
            .find(|attr| attr.is(name))
            .map(Attribute::unescaped_value)
    }

    /// Remove the attribute at `index`, keeping the order of the rest.
    pub fn remove(&mut self, index: usize) -> Attribute {
        self.items.remove(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.items.iter()
    }
}

impl From<Vec<Attribute>> for Attributes {
    fn from(items: Vec<Attribute>) -> Self {
        Self { items }
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Type of a `w:fldChar` complex field marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FldCharType {
    Begin,
    Separate,
    End,
}

impl FldCharType {
    /// Parse a `w:fldCharType` value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "begin" => Some(Self::Begin),
            "separate" => Some(Self::Separate),
            "end" => Some(Self::End),
            _ => None,
        }
    }
}
