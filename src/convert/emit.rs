//! Comprehension emitter

use super::element::expr_names;
use super::locate::{AccumulatorMutation, MutationKind};
use super::Declined;
use crate::parser::{Comprehension, Expr, ForLoop, ForTarget};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Literal-key assignments collected from a loop body.
///
/// Keys keep the position of their first assignment; a later assignment to
/// the same key replaces the value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyAssignments {
    entries: IndexMap<String, Expr>,
}

impl KeyAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Expr) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Expr> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> FromIterator<AccumulatorMutation<'a>> for KeyAssignments {
    fn from_iter<I: IntoIterator<Item = AccumulatorMutation<'a>>>(iter: I) -> Self {
        let mut pairs = KeyAssignments::new();
        for mutation in iter {
            if let MutationKind::KeyAssign { key } = mutation.kind {
                pairs.insert(key, mutation.value.clone());
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComprehensionKind {
    List,
    Dict,
}

/// What each iteration contributes
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    List(Expr),
    Dict(KeyAssignments),
}

/// Everything needed to build one comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionSpec {
    pub element: Element,
    pub target: ForTarget,
    pub iter: Expr,
    /// Conjunction of conditions, outermost first
    pub filters: Vec<Expr>,
}

impl ComprehensionSpec {
    pub fn list(for_loop: &ForLoop, element: Expr, filters: Vec<Expr>) -> Self {
        Self {
            element: Element::List(element),
            target: for_loop.target.clone(),
            iter: for_loop.iter.clone(),
            filters,
        }
    }

    pub fn dict(for_loop: &ForLoop, pairs: KeyAssignments, filters: Vec<Expr>) -> Result<Self, Declined> {
        if pairs.is_empty() {
            return Err(Declined::MalformedInput("dict comprehension without key assignments"));
        }
        Ok(Self {
            element: Element::Dict(pairs),
            target: for_loop.target.clone(),
            iter: for_loop.iter.clone(),
            filters,
        })
    }

    pub fn kind(&self) -> ComprehensionKind {
        match self.element {
            Element::List(_) => ComprehensionKind::List,
            Element::Dict(_) => ComprehensionKind::Dict,
        }
    }
}

/// Build the comprehension expression described by a `ComprehensionSpec`.
///
/// A dict with one key yields `{'k': v for ...}`. Several keys are spread
/// through an inner clause over `(key, value)` pairs so every key is
/// written on each iteration, in the loop's order.
pub fn emit(spec: &ComprehensionSpec) -> Result<Expr, Declined> {
    let outer = Comprehension {
        target: spec.target.clone(),
        iter: spec.iter.clone(),
        ifs: spec.filters.clone(),
    };

    match &spec.element {
        Element::List(elt) => Ok(Expr::ListComp {
            elt: Box::new(elt.clone()),
            generators: vec![outer],
        }),
        Element::Dict(pairs) => match pairs.len() {
            0 => Err(Declined::MalformedInput("dict comprehension without key assignments")),
            1 => {
                let (key, value) = pairs
                    .iter()
                    .next()
                    .ok_or(Declined::MalformedInput("dict comprehension without key assignments"))?;
                Ok(Expr::DictComp {
                    key: Box::new(Expr::StringLiteral(key.to_string())),
                    value: Box::new(value.clone()),
                    generators: vec![outer],
                })
            }
            _ => {
                let taken = names_in(spec);
                let key_name = fresh_name("key", &taken);
                let value_name = fresh_name("value", &taken);
                let items = pairs
                    .iter()
                    .map(|(key, value)| Expr::Tuple(vec![Expr::StringLiteral(key.to_string()), value.clone()]))
                    .collect();
                let inner = Comprehension {
                    target: ForTarget::Tuple(vec![
                        ForTarget::Name(key_name.clone()),
                        ForTarget::Name(value_name.clone()),
                    ]),
                    iter: Expr::Tuple(items),
                    ifs: vec![],
                };
                Ok(Expr::DictComp {
                    key: Box::new(Expr::Ident(key_name)),
                    value: Box::new(Expr::Ident(value_name)),
                    generators: vec![outer, inner],
                })
            }
        },
    }
}

/// Every identifier the comprehension will read or bind
fn names_in(spec: &ComprehensionSpec) -> IndexSet<String> {
    let mut names: IndexSet<String> = spec.target.names().into_iter().map(String::from).collect();
    names.extend(expr_names(&spec.iter));
    for filter in &spec.filters {
        names.extend(expr_names(filter));
    }
    if let Element::Dict(pairs) = &spec.element {
        for (_, value) in pairs.iter() {
            names.extend(expr_names(value));
        }
    }
    names
}

/// `base`, or `base_1`, `base_2`, ... for the first one not in `taken`
pub fn fresh_name(base: &str, taken: &IndexSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
