use super::EmbeddedQuery;
use crate::{algebra::Value, Error, Result};
use indexmap::IndexMap;
use std::{cell::RefCell, fmt, rc::Rc};

/// Variables captured by the code that built a query.
///
/// A closure is shared with its creator: assigning a captured variable after
/// the query is compiled is visible to the placeholders reading it. Member
/// access on a [`Expr::Closure`](super::Expr::Closure) node reads a slot.
#[derive(Clone, Default)]
pub struct Closure {
    slots: Rc<RefCell<IndexMap<String, Captured>>>,
}

/// The value held by a captured variable.
#[derive(Clone)]
pub enum Captured {
    /// A plain value
    Value(Value),

    /// Another query, inlined into the query that captures it
    Query(Rc<dyn EmbeddedQuery>),

    /// A value computed on every read
    Getter(Rc<dyn Fn() -> Result<Value>>),
}

impl Closure {
    pub fn new() -> Closure {
        Closure::default()
    }

    /// Assigns a captured variable, replacing any previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.slots
            .borrow_mut()
            .insert(name.into(), Captured::Value(value.into()));
    }

    pub fn set_query(&self, name: impl Into<String>, query: Rc<dyn EmbeddedQuery>) {
        self.slots
            .borrow_mut()
            .insert(name.into(), Captured::Query(query));
    }

    pub fn set_getter(
        &self,
        name: impl Into<String>,
        getter: impl Fn() -> Result<Value> + 'static,
    ) {
        self.slots
            .borrow_mut()
            .insert(name.into(), Captured::Getter(Rc::new(getter)));
    }

    /// The current contents of a captured variable.
    pub fn get(&self, name: &str) -> Result<Captured> {
        self.slots.borrow().get(name).cloned().ok_or_else(|| {
            Error::expression_evaluation_failed(format!("closure has no variable `{name}`"))
        })
    }

    /// Reads a captured variable as a value, running getters.
    pub fn read(&self, name: &str) -> Result<Value> {
        match self.get(name)? {
            Captured::Value(value) => Ok(value),
            Captured::Getter(getter) => getter(),
            Captured::Query(_) => Err(Error::expression_evaluation_failed(format!(
                "closure variable `{name}` holds a query, not a value"
            ))),
        }
    }

    /// Two handles to the same captured environment.
    pub fn ptr_eq(&self, other: &Closure) -> bool {
        Rc::ptr_eq(&self.slots, &other.slots)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.borrow().keys()).finish()
    }
}

impl fmt::Debug for Captured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Captured::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Captured::Query(query) => f.debug_tuple("Query").field(query).finish(),
            Captured::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}
