//! Read-only structural validation.

use crate::types::{Document, Tag};

/// A single finding from [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dot-separated path to the offending tag.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

/// Walk a document and report every structural defect found.
///
/// Returns an empty vector for a healthy tree and never fails. The typed
/// model rules out unknown variants and out-of-range numerics at
/// construction, so findings here are list payloads that no longer match
/// their list's declared element id — possible after in-place tag
/// replacement through [`Document::get_mut`].
pub fn validate(doc: &Document) -> Vec<Diagnostic> {
    let mut findings = Vec::new();
    walk(&doc.root, String::new(), &mut findings);
    findings
}

fn walk(tag: &Tag, path: String, findings: &mut Vec<Diagnostic>) {
    match tag {
        Tag::Compound(entries) => {
            for (key, value) in entries.iter() {
                walk(value, join(&path, key), findings);
            }
        }
        Tag::List(list) => {
            for (index, item) in list.iter().enumerate() {
                let item_path = join(&path, &index.to_string());
                if item.id() != list.elem() {
                    findings.push(Diagnostic {
                        path: item_path.clone(),
                        message: format!(
                            "list of {} holds a {}",
                            list.elem().name(),
                            item.type_name()
                        ),
                    });
                }
                walk(item, item_path, findings);
            }
        }
        _ => {}
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_owned()
    } else {
        format!("{path}.{segment}")
    }
}
