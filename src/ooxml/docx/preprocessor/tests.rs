//! End-to-end scans through the dispatcher and finalizer.
use super::*;
use crate::ooxml::error::{ConstructKind, OoxmlError, ProtocolViolation, Result};
use crate::ooxml::opc::constants::namespace::{DML_MAIN, OFC_RELATIONSHIPS, WML_MAIN};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

const W_DECL: &str = "xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"";
const R_DECL: &str =
    "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"";

/// Handler that records every question it is asked.
#[derive(Debug, Default)]
struct Recorder {
    images: HashMap<String, String>,
    before: HashSet<String>,
    after: HashSet<String>,
    before_calls: Vec<String>,
    after_calls: Vec<String>,
    rewrites: Vec<(String, Option<RowPosition>)>,
    hyperlinks: Vec<(String, Vec<String>)>,
    hyperlink_target: Option<String>,
    fail_images: bool,
}

impl FieldsMetadataProvider for Recorder {
    fn text_styling(&self, _instr: &str) -> Result<Option<TextStyling>> {
        Ok(None)
    }

    fn image_field_for(&self, bookmark_name: &str) -> Result<Option<String>> {
        if self.fail_images {
            return Err(OoxmlError::Handler("metadata unavailable".to_owned()));
        }
        Ok(self.images.get(bookmark_name).cloned())
    }
}

impl ScriptResolver for Recorder {
    fn has_before_script(&mut self, field_name: &str) -> Result<bool> {
        self.before_calls.push(field_name.to_owned());
        Ok(self.before.contains(field_name))
    }

    fn has_after_script(&mut self, field_name: &str) -> Result<bool> {
        self.after_calls.push(field_name.to_owned());
        Ok(self.after.contains(field_name))
    }
}

impl RowContext for Recorder {
    fn rewrite_instruction(&mut self, instr: &str, row: Option<RowPosition>) -> Result<String> {
        self.rewrites.push((instr.to_owned(), row));
        Ok(instr.to_owned())
    }
}

impl MergeHandler for Recorder {
    fn field_expression(&self, field_name: &str, _styling: Option<&TextStyling>) -> String {
        format!("${{{}}}", field_name)
    }

    fn rewrite_hyperlink_id(&mut self, id: &str, field_names: &[String]) -> Result<Option<String>> {
        self.hyperlinks.push((id.to_owned(), field_names.to_vec()));
        Ok(self.hyperlink_target.clone())
    }
}

fn start(doc: &mut DocxBufferedDocument<'_>, local: &str) -> Result<ElementId> {
    start_with(doc, local, &[])
}

fn start_with(
    doc: &mut DocxBufferedDocument<'_>,
    local: &str,
    attrs: &[(&str, &str, &str, &str)],
) -> Result<ElementId> {
    let attributes = attrs
        .iter()
        .map(|(uri, local, qname, value)| Attribute::new(*uri, *local, *qname, *value))
        .collect();
    doc.start_element(WML_MAIN, local, &format!("w:{}", local), attributes)
}

fn end(doc: &mut DocxBufferedDocument<'_>, local: &str) -> Result<()> {
    doc.end_element(WML_MAIN, local, &format!("w:{}", local))
}

fn wrap(body: &str) -> String {
    format!("<w:document {} {}><w:body>{}</w:body></w:document>", W_DECL, R_DECL, body)
}

fn run_xml(xml: &str, handler: &mut dyn MergeHandler) -> (String, ProcessStats) {
    let options = PreprocessOptions::default();
    let (tree, stats) = preprocess_with_stats(xml.as_bytes(), handler, &options).unwrap();
    (tree.to_xml(), stats)
}

#[test]
fn test_simple_field_inside_run_scenario() {
    let mut handler = Recorder::default();
    let mut doc = DocxBufferedDocument::new(&mut handler);

    let p = start(&mut doc, "p").unwrap();
    let r = start(&mut doc, "r").unwrap();
    let field = start_with(
        &mut doc,
        "fldSimple",
        &[(WML_MAIN, "instr", "w:instr", "MERGEFIELD name")],
    )
    .unwrap();
    assert_eq!(doc.tracker().simple_field(), Some(field));
    end(&mut doc, "fldSimple").unwrap();
    end(&mut doc, "r").unwrap();
    end(&mut doc, "p").unwrap();

    let stats = doc.stats();
    assert_eq!(stats.paragraphs_processed, 1);
    assert_eq!(stats.resets, 0);
    assert!(doc.tracker().is_idle());

    let tree = doc.finish().unwrap();
    let Region::Paragraph(paragraph) = tree.element(p).region() else {
        panic!("paragraph region expected");
    };
    assert!(paragraph.is_processed());
    assert_eq!(paragraph.regions(), &[ParagraphChild::Run(r)]);
    assert_eq!(tree.element(r).parent(), Some(p));
    assert!(matches!(tree.element(r).region(), Region::Run(_)));
    assert_eq!(tree.element(field).parent(), Some(r));
    let Region::SimpleField(simple) = tree.element(field).region() else {
        panic!("simple field region expected");
    };
    assert_eq!(simple.field().field_name(), Some("name"));
    assert_eq!(simple.field().instr_text(), Some("MERGEFIELD name"));
    assert_eq!(handler.before_calls, vec!["name".to_owned()]);
    assert_eq!(handler.after_calls, vec!["name".to_owned()]);
}

#[test]
fn test_run_inside_simple_field_is_plain() {
    let mut handler = Recorder::default();
    let mut doc = DocxBufferedDocument::new(&mut handler);

    let p = start(&mut doc, "p").unwrap();
    start_with(
        &mut doc,
        "fldSimple",
        &[(WML_MAIN, "instr", "w:instr", " MERGEFIELD name ")],
    )
    .unwrap();
    let inner = start(&mut doc, "r").unwrap();
    assert_eq!(doc.tracker().run(), None);
    start(&mut doc, "t").unwrap();
    doc.characters("«name»").unwrap();
    end(&mut doc, "t").unwrap();
    end(&mut doc, "r").unwrap();
    end(&mut doc, "fldSimple").unwrap();
    end(&mut doc, "p").unwrap();

    let tree = doc.finish().unwrap();
    assert!(tree.element(inner).region().is_plain());
    let Region::Paragraph(paragraph) = tree.element(p).region() else {
        panic!("paragraph region expected");
    };
    assert!(paragraph.regions().is_empty());
    assert_eq!(tree.text(inner), "${name}");
}

#[test]
fn test_bookmark_image_placeholder() {
    let mut handler = Recorder::default();
    handler.images.insert("logo".to_owned(), "photo".to_owned());
    let mut doc = DocxBufferedDocument::new(&mut handler);

    let mapped = start_with(
        &mut doc,
        "bookmarkStart",
        &[
            (WML_MAIN, "id", "w:id", "0"),
            (WML_MAIN, "name", "w:name", "logo"),
        ],
    )
    .unwrap();
    end(&mut doc, "bookmarkStart").unwrap();
    assert_eq!(doc.tracker().bookmark(), Some(mapped));

    let blip = doc
        .start_element(
            DML_MAIN,
            "blip",
            "a:blip",
            vec![Attribute::new(OFC_RELATIONSHIPS, "embed", "r:embed", "rId7")].into(),
        )
        .unwrap();
    doc.end_element(DML_MAIN, "blip", "a:blip").unwrap();
    start_with(&mut doc, "bookmarkEnd", &[(WML_MAIN, "id", "w:id", "0")]).unwrap();
    assert_eq!(doc.tracker().bookmark(), None);
    end(&mut doc, "bookmarkEnd").unwrap();

    let plain = start_with(&mut doc, "bookmarkStart", &[(WML_MAIN, "name", "w:name", "note")]).unwrap();
    end(&mut doc, "bookmarkStart").unwrap();
    assert_eq!(doc.tracker().bookmark(), None);

    let tree = doc.finish().unwrap();
    let Region::BookmarkImage(image) = tree.element(mapped).region() else {
        panic!("bookmark image region expected");
    };
    assert_eq!(image.bookmark_name(), "logo");
    assert_eq!(image.image_field_name(), "photo");
    assert_eq!(image.blip_ids(), &["rId7".to_owned()]);
    assert!(tree.element(blip).region().is_plain());
    assert!(tree.element(plain).region().is_plain());
    assert_eq!(tree.element(mapped).qname(), "w:bookmarkStart");
}

#[test]
fn test_hyperlink_relationship_id_is_extracted() {
    let mut handler = Recorder::default();
    let mut doc = DocxBufferedDocument::new(&mut handler);

    let p = start(&mut doc, "p").unwrap();
    let link = start_with(
        &mut doc,
        "hyperlink",
        &[
            (OFC_RELATIONSHIPS, "id", "r:id", "rId5"),
            (WML_MAIN, "history", "w:history", "1"),
        ],
    )
    .unwrap();
    let r = start(&mut doc, "r").unwrap();
    end(&mut doc, "r").unwrap();
    end(&mut doc, "hyperlink").unwrap();
    assert_eq!(doc.tracker().hyperlink(), None);

    let anchor = start_with(&mut doc, "hyperlink", &[(WML_MAIN, "anchor", "w:anchor", "top")]).unwrap();
    end(&mut doc, "hyperlink").unwrap();
    end(&mut doc, "p").unwrap();
    assert_eq!(doc.stats().hyperlinks_processed, 1);

    let tree = doc.finish().unwrap();
    let element = tree.element(link);
    assert!(element.attributes().position(AttrName::R_ID).is_none());
    assert_eq!(element.attributes().len(), 1);
    let Region::Hyperlink(region) = element.region() else {
        panic!("hyperlink region expected");
    };
    assert_eq!(region.id_qname(), "r:id");
    assert_eq!(region.id(), "rId5");
    assert_eq!(region.runs(), &[r]);
    assert!(region.is_processed());

    assert!(tree.element(anchor).region().is_plain());
    let Region::Paragraph(paragraph) = tree.element(p).region() else {
        panic!("paragraph region expected");
    };
    assert_eq!(paragraph.regions(), &[ParagraphChild::Hyperlink(link)]);
    assert_eq!(handler.hyperlinks, vec![("rId5".to_owned(), Vec::new())]);
}

#[test]
fn test_before_script_resets_run_once() {
    let mut handler = Recorder::default();
    handler.before.insert("loop".to_owned());
    let mut doc = DocxBufferedDocument::new(&mut handler);

    start(&mut doc, "p").unwrap();
    let r = start(&mut doc, "r").unwrap();
    start(&mut doc, "instrText").unwrap();
    doc.characters(" MERGEFIELD loop ").unwrap();
    end(&mut doc, "instrText").unwrap();
    assert_eq!(doc.tree().element(r).children().len(), 1);
    end(&mut doc, "r").unwrap();
    assert!(doc.tree().element(r).children().is_empty());
    end(&mut doc, "p").unwrap();

    let stats = doc.stats();
    assert_eq!(stats.resets, 1);
    assert_eq!(stats.script_hits, 1);
    let tree = doc.finish().unwrap();
    let Region::Run(run) = tree.element(r).region() else {
        panic!("run region expected");
    };
    assert!(run.is_script_reset());
    assert_eq!(run.field().field_name(), Some("loop"));
    assert_eq!(handler.before_calls, vec!["loop".to_owned()]);
    assert!(handler.after_calls.is_empty());
}

#[test]
fn test_after_script_is_asked_only_without_before_script() {
    let mut handler = Recorder::default();
    handler.after.insert("tail".to_owned());
    let xml = wrap(
        "<w:p><w:fldSimple w:instr=\"MERGEFIELD tail\"><w:r><w:t>x</w:t></w:r></w:fldSimple></w:p>",
    );
    let (out, stats) = run_xml(&xml, &mut handler);

    assert_eq!(stats.resets, 1);
    assert_eq!(handler.before_calls, vec!["tail".to_owned()]);
    assert_eq!(handler.after_calls, vec!["tail".to_owned()]);
    // the reset, unwrapped simple field leaves nothing behind
    assert_eq!(out, wrap("<w:p></w:p>"));
}

#[test]
fn test_unresolved_field_skips_script_resolver() {
    let mut handler = Recorder::default();
    let xml = wrap(
        "<w:p><w:r><w:instrText> PAGE </w:instrText></w:r><w:fldSimple w:instr=\" NUMPAGES \"><w:r><w:t>3</w:t></w:r></w:fldSimple></w:p>",
    );
    let (out, stats) = run_xml(&xml, &mut handler);

    assert!(handler.before_calls.is_empty());
    assert!(handler.after_calls.is_empty());
    assert_eq!(stats.resets, 0);
    assert_eq!(out, xml);
}

#[test]
fn test_nested_paragraph_is_fatal() {
    let mut handler = Recorder::default();
    let mut doc = DocxBufferedDocument::new(&mut handler);
    start(&mut doc, "p").unwrap();
    start(&mut doc, "r").unwrap();
    let err = start(&mut doc, "p").unwrap_err();
    assert!(matches!(
        err,
        OoxmlError::Protocol(ProtocolViolation::NestedConstruct {
            kind: ConstructKind::Paragraph
        })
    ));
}

#[test]
fn test_nested_hyperlink_is_fatal() {
    let mut handler = Recorder::default();
    let mut doc = DocxBufferedDocument::new(&mut handler);
    let rid = [(OFC_RELATIONSHIPS, "id", "r:id", "rId1")];
    start_with(&mut doc, "hyperlink", &rid).unwrap();
    let err = start_with(&mut doc, "hyperlink", &rid).unwrap_err();
    assert!(matches!(
        err,
        OoxmlError::Protocol(ProtocolViolation::NestedConstruct {
            kind: ConstructKind::Hyperlink
        })
    ));
}

#[test]
fn test_unbalanced_end_and_unterminated_paragraph() {
    let mut handler = Recorder::default();
    let mut doc = DocxBufferedDocument::new(&mut handler);
    let err = end(&mut doc, "p").unwrap_err();
    assert!(matches!(
        err,
        OoxmlError::Protocol(ProtocolViolation::UnbalancedEnd { .. })
    ));

    start(&mut doc, "p").unwrap();
    let err = doc.finish().unwrap_err();
    assert!(matches!(
        err,
        OoxmlError::Protocol(ProtocolViolation::Unterminated {
            kind: ConstructKind::Paragraph
        })
    ));
}

#[test]
fn test_collaborator_failure_propagates() {
    let mut handler = Recorder {
        fail_images: true,
        ..Recorder::default()
    };
    let xml = wrap("<w:p><w:bookmarkStart w:id=\"1\" w:name=\"logo\"/></w:p>");
    let err = preprocess(xml.as_bytes(), &mut handler).unwrap_err();
    assert!(matches!(err, OoxmlError::Handler(_)));
}

#[test]
fn test_fld_char_outside_run_is_ignored() {
    let mut handler = Recorder::default();
    let mut doc = DocxBufferedDocument::new(&mut handler);
    start(&mut doc, "p").unwrap();
    start_with(&mut doc, "fldChar", &[(WML_MAIN, "fldCharType", "w:fldCharType", "begin")]).unwrap();
    end(&mut doc, "fldChar").unwrap();
    let r = start(&mut doc, "r").unwrap();
    start_with(&mut doc, "fldChar", &[(WML_MAIN, "fldCharType", "w:fldCharType", "end")]).unwrap();
    end(&mut doc, "fldChar").unwrap();
    end(&mut doc, "r").unwrap();
    end(&mut doc, "p").unwrap();

    let tree = doc.finish().unwrap();
    let Region::Run(run) = tree.element(r).region() else {
        panic!("run region expected");
    };
    assert_eq!(run.fld_char_type(), Some(FldCharType::End));
}

#[test]
fn test_complex_field_collapses_to_result_run() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap(concat!(
        "<w:p>",
        "<w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>",
        "<w:r><w:instrText xml:space=\"preserve\"> MERGEFIELD </w:instrText></w:r>",
        "<w:r><w:instrText xml:space=\"preserve\">user.name \\* MERGEFORMAT </w:instrText></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"separate\"/></w:r>",
        "<w:r><w:rPr><w:b/></w:rPr><w:t>«user.name»</w:t></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"end\"/></w:r>",
        "<w:r><w:t xml:space=\"preserve\"> and more</w:t></w:r>",
        "</w:p>",
    ));
    let (out, stats) = run_xml(&xml, &mut context);

    assert_eq!(stats.collapsed_fields, 1);
    assert_eq!(stats.resets, 0);
    assert_eq!(
        out,
        wrap(concat!(
            "<w:p>",
            "<w:r/><w:r/><w:r/><w:r/>",
            "<w:r><w:rPr><w:b/></w:rPr><w:t>${user.name}</w:t></w:r>",
            "<w:r/>",
            "<w:r><w:t xml:space=\"preserve\"> and more</w:t></w:r>",
            "</w:p>",
        ))
    );
}

#[test]
fn test_complex_field_without_result_text() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap(concat!(
        "<w:p>",
        "<w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>",
        "<w:r><w:instrText>MERGEFIELD total</w:instrText></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"end\"/></w:r>",
        "</w:p>",
    ));
    let (out, _) = run_xml(&xml, &mut context);
    assert_eq!(
        out,
        wrap("<w:p><w:r><w:t>${total}</w:t></w:r><w:r/><w:r/></w:p>")
    );
}

#[test]
fn test_non_merge_complex_field_is_untouched() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap(concat!(
        "<w:p>",
        "<w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>",
        "<w:r><w:instrText> PAGE </w:instrText></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"separate\"/></w:r>",
        "<w:r><w:t>1</w:t></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"end\"/></w:r>",
        "</w:p>",
    ));
    let (out, stats) = run_xml(&xml, &mut context);
    assert_eq!(out, xml);
    assert_eq!(stats.collapsed_fields, 0);
    assert_eq!(stats.paragraphs_processed, 1);
}

#[test]
fn test_nested_complex_field_collapses_outer_only() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap(concat!(
        "<w:p>",
        "<w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>",
        "<w:r><w:instrText>MERGEFIELD outer</w:instrText></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"separate\"/></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>",
        "<w:r><w:instrText> PAGE </w:instrText></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"end\"/></w:r>",
        "<w:r><w:t>cached</w:t></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"end\"/></w:r>",
        "</w:p>",
    ));
    let (out, stats) = run_xml(&xml, &mut context);
    assert_eq!(stats.collapsed_fields, 1);
    assert_eq!(
        out,
        wrap("<w:p><w:r/><w:r/><w:r/><w:r/><w:r/><w:r/><w:r><w:t>${outer}</w:t></w:r><w:r/></w:p>")
    );
}

#[test]
fn test_hyperlink_receives_field_names_and_is_rewritten() {
    let mut handler = Recorder {
        hyperlink_target: Some("${link}".to_owned()),
        ..Recorder::default()
    };
    let xml = wrap(concat!(
        "<w:p><w:hyperlink r:id=\"rId9\" w:history=\"1\">",
        "<w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>",
        "<w:r><w:instrText>MERGEFIELD site</w:instrText></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"separate\"/></w:r>",
        "<w:r><w:t>site</w:t></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"end\"/></w:r>",
        "</w:hyperlink></w:p>",
    ));
    let (out, stats) = run_xml(&xml, &mut handler);

    assert_eq!(stats.hyperlinks_processed, 1);
    assert_eq!(stats.collapsed_fields, 1);
    assert_eq!(handler.hyperlinks, vec![("rId9".to_owned(), vec!["site".to_owned()])]);
    assert!(out.contains("<w:hyperlink r:id=\"${link}\" w:history=\"1\">"));
    assert!(out.contains("<w:r><w:t>${site}</w:t></w:r>"));
}

#[test]
fn test_split_script_instruction_is_consumed() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap(concat!(
        "<w:tbl><w:tr><w:tc><w:p>",
        "<w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>",
        "<w:r><w:instrText xml:space=\"preserve\"> MERGEFIELD </w:instrText></w:r>",
        "<w:r><w:instrText>@before-row[#list items as item]</w:instrText></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"separate\"/></w:r>",
        "<w:r><w:t>x</w:t></w:r>",
        "<w:r><w:fldChar w:fldCharType=\"end\"/></w:r>",
        "</w:p></w:tc></w:tr></w:tbl>",
    ));
    let (out, stats) = run_xml(&xml, &mut context);

    assert_eq!(stats.script_hits, 1);
    assert_eq!(stats.resets, 1);
    assert_eq!(stats.collapsed_fields, 0);
    assert_eq!(
        out,
        wrap("<w:tbl><w:tr><w:tc><w:p><w:r/><w:r/><w:r/><w:r/><w:r/><w:r/></w:p></w:tc></w:tr></w:tbl>")
    );
    assert_eq!(
        context.scripts(),
        &[InjectedScript {
            placement: ScriptPlacement::BeforeRow,
            script: "[#list items as item]".to_owned(),
            row: Some(RowPosition {
                table_depth: 1,
                row_index: 0,
            }),
        }]
    );
}

#[test]
fn test_single_quoted_attribute_with_quote_round_trips() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap("<w:p w:x='a\"b'><w:r><w:t>x</w:t></w:r></w:p>");
    let (out, _) = run_xml(&xml, &mut context);
    assert_eq!(out, wrap("<w:p w:x=\"a&quot;b\"><w:r><w:t>x</w:t></w:r></w:p>"));

    let mut context = TemplateContext::new(FieldsMetadata::new());
    let (again, _) = run_xml(&out, &mut context);
    assert_eq!(again, out);
}

#[test]
fn test_paragraph_in_text_box_is_rejected() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap(concat!(
        "<w:p><w:r><w:pict><w:txbxContent>",
        "<w:p><w:r><w:t>inside</w:t></w:r></w:p>",
        "</w:txbxContent></w:pict></w:r></w:p>",
    ));
    let err = preprocess(xml.as_bytes(), &mut context).unwrap_err();
    assert!(matches!(
        err,
        OoxmlError::Protocol(ProtocolViolation::NestedConstruct {
            kind: ConstructKind::Paragraph
        })
    ));
}

#[test]
fn test_row_position_reaches_row_context() {
    let mut handler = Recorder::default();
    let xml = wrap(concat!(
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc></w:tr>",
        "<w:tr><w:tc><w:p><w:fldSimple w:instr=\" MERGEFIELD item.name \"><w:r><w:t>x</w:t></w:r></w:fldSimple></w:p></w:tc></w:tr></w:tbl>",
        "<w:p><w:fldSimple w:instr=\" MERGEFIELD footer \"/></w:p>",
    ));
    let (out, _) = run_xml(&xml, &mut handler);

    assert_eq!(
        handler.rewrites,
        vec![
            (
                " MERGEFIELD item.name ".to_owned(),
                Some(RowPosition {
                    table_depth: 1,
                    row_index: 1
                })
            ),
            (" MERGEFIELD footer ".to_owned(), None),
        ]
    );
    assert!(out.contains("<w:tc><w:p><w:r><w:t>${item.name}</w:t></w:r></w:p></w:tc>"));
    // a simple field without result content gets one
    assert!(out.contains("<w:p><w:r><w:t>${footer}</w:t></w:r></w:p>"));
}

#[test]
fn test_template_context_row_scripts() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap(concat!(
        "<w:tbl><w:tr><w:tc><w:p>",
        "<w:fldSimple w:instr=\"MERGEFIELD @before-row[#list items as item]\"><w:r><w:t>«@before-row»</w:t></w:r></w:fldSimple>",
        "<w:fldSimple w:instr=\"MERGEFIELD item.name\"><w:r><w:t>«item.name»</w:t></w:r></w:fldSimple>",
        "<w:fldSimple w:instr=\"MERGEFIELD @after-row[/#list]\"><w:r><w:t>«@after-row»</w:t></w:r></w:fldSimple>",
        "</w:p></w:tc></w:tr></w:tbl>",
    ));
    let options = PreprocessOptions::default();
    let (tree, stats) = preprocess_with_stats(xml.as_bytes(), &mut context, &options).unwrap();

    assert_eq!(stats.resets, 2);
    assert_eq!(stats.script_hits, 2);
    assert_eq!(
        tree.to_xml(),
        wrap("<w:tbl><w:tr><w:tc><w:p><w:r><w:t>${item.name}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>")
    );
    let row = Some(RowPosition {
        table_depth: 1,
        row_index: 0,
    });
    assert_eq!(
        context.scripts(),
        &[
            InjectedScript {
                placement: ScriptPlacement::BeforeRow,
                script: "[#list items as item]".to_owned(),
                row,
            },
            InjectedScript {
                placement: ScriptPlacement::AfterRow,
                script: "[/#list]".to_owned(),
                row,
            },
        ]
    );
}

#[test]
fn test_styled_simple_field_and_escaping() {
    let mut metadata = FieldsMetadata::new();
    metadata.add_field("comment").syntax_kind = Some(SyntaxKind::Html);
    let options = PreprocessOptions::new().with_field_delimiters("<<", ">>");
    let mut context = TemplateContext::with_options(metadata, options.clone());
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n{}",
        wrap("<w:p><w:fldSimple w:instr=\" MERGEFIELD comment \"><w:r><w:t>a &amp; b</w:t></w:r></w:fldSimple></w:p>")
    );
    let (tree, _) = preprocess_with_stats(xml.as_bytes(), &mut context, &options).unwrap();
    let out = tree.to_xml();
    assert!(out.starts_with("<?xml version=\"1.0\""));
    assert!(out.contains("<w:t>&lt;&lt;comment?html&gt;&gt;</w:t>"));
}

#[test]
fn test_entities_and_untouched_markup_survive() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = wrap(concat!(
        "\n  <w:p w:rsidR=\"00A1\">\n",
        "    <w:pPr><w:jc w:val=\"center\"/></w:pPr>\n",
        "    <w:r><w:t xml:space=\"preserve\">Tom &amp; Jerry &lt;3 </w:t></w:r>\n",
        "    <w:bookmarkStart w:id=\"0\" w:name=\"_GoBack\"/><w:bookmarkEnd w:id=\"0\"/>\n",
        "  </w:p>\n",
    ));
    let (out, stats) = run_xml(&xml, &mut context);
    assert_eq!(out, xml);
    assert_eq!(stats.paragraphs_processed, 1);
}

#[test]
fn test_mismatched_end_tag_is_an_xml_error() {
    let mut context = TemplateContext::new(FieldsMetadata::new());
    let xml = format!("<w:p {}><w:r></w:p>", W_DECL);
    let err = preprocess(xml.as_bytes(), &mut context).unwrap_err();
    assert!(matches!(err, OoxmlError::Xml(_)));
}

fn paragraph_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-zA-Z0-9 ]{1,12}", 1..4), 1..6)
}

fn build_document(paragraphs: &[Vec<String>], field_every: Option<usize>) -> String {
    let mut body = String::new();
    for (index, runs) in paragraphs.iter().enumerate() {
        body.push_str("<w:p>");
        for text in runs {
            body.push_str("<w:r><w:t xml:space=\"preserve\">");
            body.push_str(text);
            body.push_str("</w:t></w:r>");
        }
        if field_every.is_some_and(|every| index % every == 0) {
            body.push_str("<w:fldSimple w:instr=\" MERGEFIELD f \"><w:r><w:t>f</w:t></w:r></w:fldSimple>");
        }
        body.push_str("</w:p>");
    }
    wrap(&body)
}

proptest! {
    #[test]
    fn prop_each_paragraph_processed_once(paragraphs in paragraph_strategy()) {
        let mut handler = Recorder::default();
        let xml = build_document(&paragraphs, Some(2));
        let options = PreprocessOptions::default();
        let (tree, stats) = preprocess_with_stats(xml.as_bytes(), &mut handler, &options).unwrap();

        prop_assert_eq!(stats.paragraphs_processed, paragraphs.len());
        let processed = (0..tree.len() as u32)
            .map(ElementId)
            .filter(|id| matches!(tree.element(*id).region(), Region::Paragraph(p) if p.is_processed()))
            .count();
        prop_assert_eq!(processed, paragraphs.len());
    }

    #[test]
    fn prop_no_scripts_means_no_resets(paragraphs in paragraph_strategy()) {
        let mut handler = Recorder::default();
        let xml = build_document(&paragraphs, None);
        let options = PreprocessOptions::default();
        let (tree, stats) = preprocess_with_stats(xml.as_bytes(), &mut handler, &options).unwrap();

        prop_assert_eq!(stats.resets, 0);
        prop_assert_eq!(tree.to_xml(), xml);
    }
}
