/// Drives a quick-xml reader over document markup.
///
/// The reader resolves namespace prefixes itself and hands the core
/// `start_element(uri, local_name, qname, attributes)` and
/// `end_element(uri, local_name, qname)` events in document order.
use super::buffered::BufferedDocument;
use super::document::{DocxBufferedDocument, ProcessStats};
use super::handler::MergeHandler;
use super::names::{Attribute, Attributes};
use super::options::PreprocessOptions;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::borrow::Cow;

const DEFAULT_DECLARATION: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

/// In-scope namespace declarations, one frame per open element.
#[derive(Debug, Default)]
struct NamespaceScopes {
    bindings: Vec<(String, String)>,
    frames: Vec<usize>,
}

impl NamespaceScopes {
    fn push(&mut self, declared: impl IntoIterator<Item = (String, String)>) {
        self.frames.push(self.bindings.len());
        self.bindings.extend(declared);
    }

    fn pop(&mut self) {
        if let Some(len) = self.frames.pop() {
            self.bindings.truncate(len);
        }
    }

    /// URI bound to `prefix`; the empty prefix is the default namespace.
    fn resolve(&self, prefix: &str) -> &str {
        match prefix {
            "xml" => namespace::XML,
            "xmlns" => namespace::XMLNS,
            _ => self
                .bindings
                .iter()
                .rev()
                .find(|(bound, _)| bound == prefix)
                .map(|(_, uri)| uri.as_str())
                .unwrap_or(""),
        }
    }
}

/// A start tag with names and attributes resolved.
struct ResolvedStart {
    uri: String,
    local_name: String,
    qname: String,
    attributes: Attributes,
}

fn split_qname(qname: &str) -> (&str, &str) {
    qname.split_once(':').unwrap_or(("", qname))
}

fn utf8(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn resolve_start(scopes: &mut NamespaceScopes, e: &BytesStart<'_>) -> Result<ResolvedStart> {
    let mut raw_attrs: SmallVec<[(String, String); 8]> = SmallVec::new();
    let mut declared: SmallVec<[(String, String); 4]> = SmallVec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| OoxmlError::Xml(err.to_string()))?;
        let key = utf8(attr.key.as_ref()).into_owned();
        let value = utf8(&attr.value).into_owned();
        if key == "xmlns" {
            declared.push((String::new(), value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push((prefix.to_owned(), value.clone()));
        }
        raw_attrs.push((key, value));
    }
    scopes.push(declared);

    let qname = utf8(e.name().as_ref()).into_owned();
    let (prefix, local_name) = split_qname(&qname);
    let uri = scopes.resolve(prefix).to_owned();
    let local_name = local_name.to_owned();

    let attributes = raw_attrs
        .into_iter()
        .map(|(key, value)| {
            let (prefix, local) = split_qname(&key);
            let attr_uri = if key == "xmlns" {
                namespace::XMLNS
            } else if prefix.is_empty() {
                ""
            } else {
                scopes.resolve(prefix)
            };
            Attribute::new(attr_uri, local, key.as_str(), value)
        })
        .collect();

    Ok(ResolvedStart {
        uri,
        local_name,
        qname,
        attributes,
    })
}

/// Feed every event of `xml` into `doc`.
pub fn feed(doc: &mut DocxBufferedDocument<'_>, xml: &[u8], keep_declaration: bool) -> Result<()> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut scopes = NamespaceScopes::default();
    let mut open: Vec<(String, String, String)> = Vec::with_capacity(32);
    let mut buf = Vec::with_capacity(1024);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let start = resolve_start(&mut scopes, &e)?;
                doc.start_element(&start.uri, &start.local_name, &start.qname, start.attributes)?;
                open.push((start.uri, start.local_name, start.qname));
            },
            Ok(Event::Empty(e)) => {
                let start = resolve_start(&mut scopes, &e)?;
                doc.start_element(&start.uri, &start.local_name, &start.qname, start.attributes)?;
                doc.end_element(&start.uri, &start.local_name, &start.qname)?;
                scopes.pop();
            },
            Ok(Event::End(e)) => {
                let qname = utf8(e.name().as_ref()).into_owned();
                match open.pop() {
                    Some((uri, local_name, open_qname)) if open_qname == qname => {
                        doc.end_element(&uri, &local_name, &qname)?;
                    },
                    _ => {
                        return Err(OoxmlError::Xml(format!(
                            "unexpected end tag </{}> at position {}",
                            qname,
                            reader.buffer_position()
                        )));
                    },
                }
                scopes.pop();
            },
            Ok(Event::Text(e)) => doc.characters(&utf8(e.as_ref()))?,
            Ok(Event::GeneralRef(e)) => {
                let entity = format!("&{};", utf8(e.as_ref()));
                doc.characters(&entity)?;
            },
            Ok(Event::CData(e)) => {
                let cdata = format!("<![CDATA[{}]]>", utf8(e.as_ref()));
                doc.characters(&cdata)?;
            },
            Ok(Event::Decl(_)) => {
                if keep_declaration {
                    doc.tree_mut().set_declaration(DEFAULT_DECLARATION.to_owned());
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(OoxmlError::Xml(e.to_string())),
            _ => {},
        }
        buf.clear();
    }

    if let Some((_, _, qname)) = open.last() {
        return Err(OoxmlError::Xml(format!("unclosed element <{}>", qname)));
    }
    Ok(())
}

/// Preprocess `word/document.xml` bytes with `handler`.
///
/// Returns the finished tree; call [`BufferedDocument::to_xml`] for the
/// rewritten markup.
pub fn preprocess(xml: &[u8], handler: &mut dyn MergeHandler) -> Result<BufferedDocument> {
    preprocess_with_stats(xml, handler, &PreprocessOptions::default()).map(|(tree, _)| tree)
}

/// Like [`preprocess`], with explicit options and the finalization counters.
pub fn preprocess_with_stats(
    xml: &[u8],
    handler: &mut dyn MergeHandler,
    options: &PreprocessOptions,
) -> Result<(BufferedDocument, ProcessStats)> {
    let mut doc = DocxBufferedDocument::new(handler);
    feed(&mut doc, xml, options.keep_declaration)?;
    let stats = doc.stats();
    Ok((doc.finish()?, stats))
}
