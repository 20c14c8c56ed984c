/// Collapsing of complex field codes spread over several runs.
///
/// A complex merge field is written by Word as
///
/// ```text
/// <w:r><w:fldChar w:fldCharType="begin"/></w:r>
/// <w:r><w:instrText> MERGEFIELD name </w:instrText></w:r>
/// <w:r><w:fldChar w:fldCharType="separate"/></w:r>
/// <w:r><w:t>«name»</w:t></w:r>
/// <w:r><w:fldChar w:fldCharType="end"/></w:r>
/// ```
///
/// Once resolved the group collapses to the single result run holding the
/// merge expression; the other runs are emptied.
use super::Region;
use crate::common::xml::escape_xml;
use crate::ooxml::docx::preprocessor::buffered::BufferedDocument;
use crate::ooxml::docx::preprocessor::element::ElementId;
use crate::ooxml::docx::preprocessor::handler::MergeHandler;
use crate::ooxml::docx::preprocessor::names::{ElementName, FldCharType};
use crate::ooxml::error::Result;
use tracing::debug;

/// What a collapse pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseOutcome {
    /// Field names of the groups that were collapsed
    pub field_names: Vec<String>,
    /// Groups dropped because a script consumed one of their runs
    pub consumed: usize,
    /// Groups dropped because their joined instruction names a script field
    pub script_hits: usize,
}

#[derive(Debug, Default)]
struct FieldGroup {
    runs: Vec<ElementId>,
    results: Vec<ElementId>,
    instr: String,
    separated: bool,
    script_reset: bool,
}

/// Collapse every outermost complex field found in `runs`.
pub(crate) fn collapse(
    doc: &mut BufferedDocument,
    handler: &mut dyn MergeHandler,
    runs: &[ElementId],
) -> Result<CollapseOutcome> {
    let mut outcome = CollapseOutcome::default();
    let mut depth = 0usize;
    let mut group: Option<FieldGroup> = None;

    for &run_id in runs {
        let Region::Run(run) = doc.element(run_id).region() else {
            continue;
        };
        let fld_char_type = run.fld_char_type();
        let instr = (!run.raw_instr().is_empty()).then(|| run.raw_instr().to_owned());
        let script_reset = run.is_script_reset();

        let mut closes_group = false;
        match fld_char_type {
            Some(FldCharType::Begin) => {
                depth += 1;
                if depth == 1 {
                    group = Some(FieldGroup::default());
                }
            },
            Some(FldCharType::End) => {
                closes_group = depth == 1;
                depth = depth.saturating_sub(1);
            },
            _ => {},
        }

        let Some(current) = group.as_mut() else {
            continue;
        };
        current.runs.push(run_id);
        current.script_reset |= script_reset;

        if closes_group {
            if let Some(finished) = group.take() {
                finish(doc, handler, finished, &mut outcome)?;
            }
            continue;
        }

        match fld_char_type {
            Some(FldCharType::Separate) if depth == 1 => current.separated = true,
            Some(FldCharType::Begin) | None if depth == 1 => {
                if current.separated {
                    if fld_char_type.is_none() {
                        current.results.push(run_id);
                    }
                } else if let Some(instr) = instr {
                    current.instr.push_str(&instr);
                }
            },
            _ => {},
        }
    }

    Ok(outcome)
}

fn finish(
    doc: &mut BufferedDocument,
    handler: &mut dyn MergeHandler,
    group: FieldGroup,
    outcome: &mut CollapseOutcome,
) -> Result<()> {
    if group.script_reset {
        for &run in &group.runs {
            doc.clear_children(run);
        }
        outcome.consumed += 1;
        return Ok(());
    }

    let instr = handler.rewrite_instruction(&group.instr, doc.current_row())?;
    let resolution = handler.resolve(&instr)?;
    let Some(field_name) = resolution.field_name else {
        return Ok(());
    };

    // a split instruction may name a script only once joined
    if handler.has_before_script(&field_name)? || handler.has_after_script(&field_name)? {
        debug!(field = %field_name, "conditional script injected");
        for &run in &group.runs {
            doc.clear_children(run);
        }
        outcome.script_hits += 1;
        return Ok(());
    }

    let expression = handler.field_expression(&field_name, resolution.styling.as_ref());
    let expression = escape_xml(&expression);

    let target = group
        .results
        .iter()
        .copied()
        .find_map(|run| doc.find_descendant(run, ElementName::T).map(|t| (run, t)));

    let keep = match target {
        Some((run, t)) => {
            doc.set_text(t, &expression);
            run
        },
        None => {
            let Some(&begin) = group.runs.first() else {
                return Ok(());
            };
            doc.clear_children(begin);
            let element = doc.element(begin);
            let uri = element.uri().to_owned();
            let qname = element.sibling_qname("t");
            let t = doc.append_element(begin, &uri, "t", &qname);
            doc.set_text(t, &expression);
            begin
        },
    };

    for &run in group.runs.iter().filter(|&&run| run != keep) {
        doc.clear_children(run);
    }
    debug!(field = %field_name, runs = group.runs.len(), "collapsed complex field");
    outcome.field_names.push(field_name);
    Ok(())
}
