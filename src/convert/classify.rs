//! Shape classifier

use super::locate::{append_sites, key_assignments};
use crate::parser::ForLoop;
use serde::Serialize;

/// What a loop builds, if anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    List,
    Dict,
    NotACandidate,
}

/// Decide whether `for_loop` builds a list or a dict.
///
/// A literal-key subscript assignment among the direct children makes the
/// loop a dict candidate even when it also appends somewhere.
pub fn classify(for_loop: &ForLoop) -> Shape {
    if !key_assignments(&for_loop.body).is_empty() {
        Shape::Dict
    } else if !append_sites(&for_loop.body).is_empty() {
        Shape::List
    } else {
        Shape::NotACandidate
    }
}

pub fn is_candidate(for_loop: &ForLoop) -> bool {
    classify(for_loop) != Shape::NotACandidate
}
