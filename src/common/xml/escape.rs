use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;
use std::borrow::Cow;

const SPECIAL: [&str; 5] = ["&", "<", ">", "\"", "'"];
const ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"];

static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(SPECIAL)
        .expect("Failed to build XML escaper")
});

// LeftmostLongest so `&amp;lt;` yields `&lt;` and not `<`
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(ENTITIES)
        .expect("Failed to build XML unescaper")
});

/// Escape XML special characters.
///
/// Used for merge expressions written into `w:t` text and for attribute
/// values that were rewritten by a handler.
///
/// # Examples
///
/// ```
/// use docx_preprocess::common::xml::escape_xml;
/// assert_eq!(escape_xml("${a} & ${b}"), "${a} &amp; ${b}");
/// assert_eq!(escape_xml("[#if x > 1]"), "[#if x &gt; 1]");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| matches!(b, b'&' | b'<' | b'>' | b'"' | b'\'')) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(XML_ESCAPER.replace_all(s, &ENTITIES))
}

/// Unescape the five predefined XML entities.
///
/// Character references and unknown entities are left as they are.
///
/// # Examples
///
/// ```
/// use docx_preprocess::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("MERGEFIELD &quot;name&quot;"), "MERGEFIELD \"name\"");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("&#160;"), "&#160;");
/// ```
#[inline]
pub fn unescape_xml(s: &str) -> Cow<'_, str> {
    if memchr::memchr(b'&', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }
    Cow::Owned(XML_UNESCAPER.replace_all(s, &SPECIAL))
}
