use super::{Ast, NodeId};
use crate::Result;
use std::{cell::Cell, fmt};

/// A query object captured by another query.
///
/// The funcletizer inlines the embedded query's expression where it is
/// referenced and watches for later changes to its merge option.
pub trait EmbeddedQuery: fmt::Debug {
    /// Copies the query's expression into `ast` and returns its root.
    fn graft(&self, ast: &mut Ast) -> Result<NodeId>;

    /// Merge option set on the query, if any.
    fn merge_option(&self) -> Option<MergeOption>;
}

/// How materialized entities are merged with already tracked ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeOption {
    #[default]
    AppendOnly,
    OverwriteChanges,
    PreserveChanges,
    NoTracking,
}

impl MergeOption {
    /// Parses the variant name, as passed to `MergeAs`.
    pub fn from_name(name: &str) -> Option<MergeOption> {
        Some(match name {
            "AppendOnly" => MergeOption::AppendOnly,
            "OverwriteChanges" => MergeOption::OverwriteChanges,
            "PreserveChanges" => MergeOption::PreserveChanges,
            "NoTracking" => MergeOption::NoTracking,
            _ => return None,
        })
    }
}

/// An [`EmbeddedQuery`] that builds its expression with a function.
pub struct Fragment {
    build: Box<dyn Fn(&mut Ast) -> NodeId>,
    merge_option: Cell<Option<MergeOption>>,
}

impl Fragment {
    pub fn new(build: impl Fn(&mut Ast) -> NodeId + 'static) -> Fragment {
        Fragment {
            build: Box::new(build),
            merge_option: Cell::new(None),
        }
    }

    pub fn set_merge_option(&self, merge_option: Option<MergeOption>) {
        self.merge_option.set(merge_option);
    }
}

impl EmbeddedQuery for Fragment {
    fn graft(&self, ast: &mut Ast) -> Result<NodeId> {
        Ok((self.build)(ast))
    }

    fn merge_option(&self) -> Option<MergeOption> {
        self.merge_option.get()
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("merge_option", &self.merge_option.get())
            .finish_non_exhaustive()
    }
}
