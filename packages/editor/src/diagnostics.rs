//! Development-mode invariant checks. They warn and report, never fail.

use crate::dom::{DomKind, DomNode};
use crate::errors::Diagnostic;
use folio_model::normalize::is_normalized;
use folio_model::Element;
use std::sync::Arc;
use tracing::warn;

/// Report rendered elements that carry no attributes.
///
/// contentEditable handles attribute-less empty elements unreliably, so the
/// render contract asks for at least one on every element.
pub fn check_rendered<N: DomNode>(root: &N) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    walk(root, &mut Vec::new(), &mut diagnostics);
    diagnostics
}

fn walk<N: DomNode>(node: &N, at: &mut Vec<usize>, diagnostics: &mut Vec<Diagnostic>) {
    if node.kind() != DomKind::Element {
        return;
    }
    if node.attribute_count() == 0 {
        let position = format!("{at:?}");
        warn!(position = %position, "rendered element has no attributes");
        diagnostics.push(Diagnostic::MissingAttributes(position));
    }
    for (index, child) in node.child_nodes().iter().enumerate() {
        at.push(index);
        walk(child, at, diagnostics);
        at.pop();
    }
}

/// `Some` when `element` would change under normalization.
pub fn check_normalized(element: &Arc<Element>) -> Option<Diagnostic> {
    if is_normalized(element) {
        return None;
    }
    warn!("document is not normalized");
    Some(Diagnostic::NotNormalized)
}
