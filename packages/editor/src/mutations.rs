//! # Mutation reconciler
//!
//! Reads `MutationObserver` batches from the editable root and turns the
//! shapes it recognizes into registry updates and `SetText` actions.
//!
//! ## Recognized shapes
//!
//! ### TextEdited
//! - One or two `characterData` records; the last one wins
//! - Dispatches the node's text, unless it is now empty (see below)
//!
//! ### TextReplacedByBreak
//! - `characterData`, then a removal of that text node and an insertion of a
//!   `<br>` (the browser emptied a run and substituted a line break)
//! - The `<br>` takes over the text's registry entry; dispatches `""`
//!
//! ### RenderedSwap
//! - A single `childList` record swapping a text node and a `<br>`
//! - Produced by a render commit that already follows the model; nothing to do
//!
//! ### BreakReplacedByText
//! - Two or more `childList` records removing a `<br>` and adding a text node,
//!   followed by `characterData` records (typing into an empty line)
//! - The text node takes over the `<br>`'s registry entry; dispatches its text
//!
//! Anything else is reported and left unapplied.

use crate::actions::Action;
use crate::dom::{DomKind, DomNode};
use crate::errors::Diagnostic;
use crate::registry::NodeRegistry;
use folio_model::Path;
use tracing::{debug, warn};

/// One `MutationRecord`, reduced to what the reconciler reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord<N> {
    CharacterData { target: N },
    ChildList { target: N, added: Vec<N>, removed: Vec<N> },
}

impl<N> MutationRecord<N> {
    fn is_character_data(&self) -> bool {
        matches!(self, MutationRecord::CharacterData { .. })
    }

    fn describe(&self) -> String {
        match self {
            MutationRecord::CharacterData { .. } => "characterData".to_string(),
            MutationRecord::ChildList { added, removed, .. } => {
                format!("childList(+{}/-{})", added.len(), removed.len())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationShape {
    TextEdited,
    TextReplacedByBreak,
    RenderedSwap,
    BreakReplacedByText,
    Unknown,
}

/// What a batch amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub shape: MutationShape,
    pub action: Option<Action>,
    pub diagnostic: Option<Diagnostic>,
}

impl Reconciliation {
    fn quiet(shape: MutationShape) -> Self {
        Self {
            shape,
            action: None,
            diagnostic: None,
        }
    }

    fn dispatch(shape: MutationShape, path: Path, text: String) -> Self {
        Self {
            shape,
            action: Some(Action::SetText { path, text }),
            diagnostic: None,
        }
    }

    fn report(shape: MutationShape, diagnostic: Diagnostic) -> Self {
        if diagnostic.is_unrecognized() {
            warn!(%diagnostic, "mutation batch not applied");
        } else {
            debug!(%diagnostic, "mutation batch not applied");
        }
        Self {
            shape,
            action: None,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Classify `records` and apply the registry side of the recognized shape.
pub fn reconcile<N: DomNode>(records: &[MutationRecord<N>], registry: &mut NodeRegistry<N>) -> Reconciliation {
    let reconciliation = if let Some(result) = text_edited(records, registry) {
        result
    } else if let Some(result) = text_replaced_by_break(records, registry) {
        result
    } else if is_rendered_swap(records) {
        Reconciliation::quiet(MutationShape::RenderedSwap)
    } else if let Some(result) = break_replaced_by_text(records, registry) {
        result
    } else {
        let summary = records.iter().map(MutationRecord::describe).collect::<Vec<_>>().join(", ");
        Reconciliation::report(MutationShape::Unknown, Diagnostic::UnrecognizedMutation(summary))
    };

    debug!(shape = ?reconciliation.shape, records = records.len(), "mutations reconciled");
    reconciliation
}

fn text_edited<N: DomNode>(records: &[MutationRecord<N>], registry: &NodeRegistry<N>) -> Option<Reconciliation> {
    if records.is_empty() || records.len() > 2 || !records.iter().all(MutationRecord::is_character_data) {
        return None;
    }
    let MutationRecord::CharacterData { target } = records.last()? else {
        return None;
    };

    let Some(path) = registry.by_node(target) else {
        return Some(Reconciliation::report(
            MutationShape::TextEdited,
            Diagnostic::UnresolvableCoordinate("edited text node is not registered".to_string()),
        ));
    };
    let text = target.text_content();
    if text.is_empty() {
        return Some(Reconciliation::quiet(MutationShape::TextEdited));
    }
    Some(Reconciliation::dispatch(MutationShape::TextEdited, path.clone(), text))
}

fn text_replaced_by_break<N: DomNode>(
    records: &[MutationRecord<N>],
    registry: &mut NodeRegistry<N>,
) -> Option<Reconciliation> {
    let [MutationRecord::CharacterData { .. }, first, second] = records else {
        return None;
    };
    let removed_text = [first, second].into_iter().find_map(|record| only_removed(record, DomKind::Text))?;
    let added_break = [first, second].into_iter().find_map(|record| only_added(record, DomKind::LineBreak))?;

    let Some(path) = registry.by_node(removed_text).cloned() else {
        return Some(Reconciliation::report(
            MutationShape::TextReplacedByBreak,
            Diagnostic::UnresolvableCoordinate("removed text node is not registered".to_string()),
        ));
    };
    registry.remove(removed_text, &path);
    registry.add(added_break.clone(), path.clone());
    Some(Reconciliation::dispatch(MutationShape::TextReplacedByBreak, path, String::new()))
}

fn is_rendered_swap<N: DomNode>(records: &[MutationRecord<N>]) -> bool {
    let [MutationRecord::ChildList { added, removed, .. }] = records else {
        return false;
    };
    let ([added], [removed]) = (added.as_slice(), removed.as_slice()) else {
        return false;
    };
    matches!(
        (added.kind(), removed.kind()),
        (DomKind::LineBreak, DomKind::Text) | (DomKind::Text, DomKind::LineBreak)
    )
}

fn break_replaced_by_text<N: DomNode>(
    records: &[MutationRecord<N>],
    registry: &mut NodeRegistry<N>,
) -> Option<Reconciliation> {
    let split = records.iter().position(MutationRecord::is_character_data)?;
    let (child_lists, character_data) = records.split_at(split);
    if child_lists.len() < 2 || !character_data.iter().all(MutationRecord::is_character_data) {
        return None;
    }

    let mut removed_break = None;
    let mut added_text = None;
    for record in child_lists {
        let MutationRecord::ChildList { added, removed, .. } = record else {
            return None;
        };
        removed_break = removed_break.or_else(|| removed.iter().find(|node| node.kind() == DomKind::LineBreak));
        added_text = added_text.or_else(|| added.iter().find(|node| node.kind() == DomKind::Text));
    }
    let (removed_break, added_text) = (removed_break?, added_text?);

    let Some(path) = registry.by_node(removed_break).cloned() else {
        return Some(Reconciliation::report(
            MutationShape::BreakReplacedByText,
            Diagnostic::UnresolvableCoordinate("removed line break is not registered".to_string()),
        ));
    };
    registry.remove(removed_break, &path);
    registry.add(added_text.clone(), path.clone());

    let text = match character_data.last() {
        Some(MutationRecord::CharacterData { target }) if target == added_text => target.text_content(),
        _ => added_text.text_content(),
    };
    Some(Reconciliation::dispatch(MutationShape::BreakReplacedByText, path, text))
}

fn only_removed<N: DomNode>(record: &MutationRecord<N>, kind: DomKind) -> Option<&N> {
    match record {
        MutationRecord::ChildList { added, removed, .. } if added.is_empty() => {
            removed.iter().find(|node| node.kind() == kind)
        }
        _ => None,
    }
}

fn only_added<N: DomNode>(record: &MutationRecord<N>, kind: DomKind) -> Option<&N> {
    match record {
        MutationRecord::ChildList { added, removed, .. } if removed.is_empty() => {
            added.iter().find(|node| node.kind() == kind)
        }
        _ => None,
    }
}
