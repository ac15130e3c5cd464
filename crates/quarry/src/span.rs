//! Eager-load paths attached to query results.

use indexmap::{IndexMap, IndexSet};
use quarry_core::ast::NodeId;

/// Dotted navigation paths, such as `Orders.Lines`, to load together with
/// the entities a query returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    paths: IndexSet<String>,
}

impl Span {
    pub fn new() -> Span {
        Span::default()
    }

    /// Adds a path. Returns `false` if it was already present.
    pub fn include(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn paths(&self) -> impl ExactSizeIterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Paths of both spans, left first.
    pub fn merge(lhs: Option<&Span>, rhs: Option<&Span>) -> Option<Span> {
        match (lhs, rhs) {
            (None, None) => None,
            (Some(span), None) | (None, Some(span)) => Some(span.clone()),
            (Some(lhs), Some(rhs)) => Some(Span {
                paths: lhs.paths.union(&rhs.paths).cloned().collect(),
            }),
        }
    }
}

/// Spans keyed by the source node whose translation they describe.
#[derive(Debug, Default)]
pub struct SpanMap {
    spans: IndexMap<NodeId, Span>,
}

impl SpanMap {
    pub fn new() -> SpanMap {
        SpanMap::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&Span> {
        self.spans.get(&node)
    }

    pub fn set(&mut self, node: NodeId, span: Span) {
        self.spans.insert(node, span);
    }

    /// Gives `to` the span of `from` plus `path`.
    pub fn include(&mut self, from: NodeId, to: NodeId, path: &str) {
        let mut span = self.get(from).cloned().unwrap_or_default();
        span.include(path);
        self.set(to, span);
    }

    /// Gives `to` the span of `from`, if it has one.
    pub fn propagate(&mut self, from: NodeId, to: NodeId) {
        if let Some(span) = self.get(from).cloned() {
            self.set(to, span);
        }
    }

    /// Gives `to` the combined spans of `lhs` and `rhs`.
    pub fn merge(&mut self, lhs: NodeId, rhs: NodeId, to: NodeId) {
        if let Some(span) = Span::merge(self.get(lhs), self.get(rhs)) {
            self.set(to, span);
        }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_extends_source_span() {
        let mut spans = SpanMap::new();
        let (a, b, c) = (NodeId::from_raw(0), NodeId::from_raw(1), NodeId::from_raw(2));

        spans.include(a, b, "Orders");
        spans.include(b, c, "Orders.Lines");

        assert!(spans.get(a).is_none());
        assert_eq!(spans.get(b).unwrap().len(), 1);
        assert_eq!(
            spans.get(c).unwrap().paths().collect::<Vec<_>>(),
            ["Orders", "Orders.Lines"]
        );
    }

    #[test]
    fn merge_keeps_each_path_once() {
        let mut lhs = Span::new();
        lhs.include("Orders");
        let mut rhs = Span::new();
        rhs.include("Orders");
        rhs.include("Address");

        let merged = Span::merge(Some(&lhs), Some(&rhs)).unwrap();
        assert_eq!(merged.paths().collect::<Vec<_>>(), ["Orders", "Address"]);
        assert!(Span::merge(None, None).is_none());
    }
}
