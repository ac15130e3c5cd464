use super::{TranslationContext, TranslationState};
use quarry_core::{
    algebra::{self, ExprRow, InitializerDescriptor, InitializerKind, RowType, Type, Value},
    ast::{Expr, ExprMemberInit, ExprNew, ExprNewArray, NodeId},
    schema::HostType,
    Error, Result,
};

impl TranslationContext<'_> {
    pub(super) fn constant(&self, id: NodeId, value: &Value) -> Result<algebra::Expr> {
        let ty = self.ast.ty(id);

        match value {
            Value::Null => Ok(algebra::Expr::null(
                self.resolver.type_for_host_type(ty).unwrap_or(Type::Unknown),
            )),
            Value::Record(_) => Err(Error::unsupported_construct(format!(
                "a constant of type `{ty}`"
            ))),
            value => Ok(value.clone().into()),
        }
    }

    pub(super) fn entity_set(&self, name: &str) -> Result<algebra::Expr> {
        let set = self
            .resolver
            .entity_set(name)
            .ok_or_else(|| Error::unsupported_construct(format!("unknown entity set `{name}`")))?;
        let ty = self.algebra_type(&HostType::entity(set.entity.clone()))?;

        Ok(algebra::Expr::scan(set.name.clone(), ty))
    }

    /// `new T(a, b)`: a row whose fields are the members the arguments
    /// initialize.
    pub(super) fn new_object(
        self,
        state: &mut TranslationState,
        id: NodeId,
        new: &ExprNew,
    ) -> Result<algebra::Expr> {
        let host_type = self.constructible(id)?;

        if new.args.is_empty() {
            return initialized_row(state, host_type, InitializerKind::Empty, vec![]);
        }

        if new.members.len() != new.args.len() {
            return Err(Error::unsupported_construct(format!(
                "a constructor of `{host_type}` whose arguments do not map to members"
            )));
        }

        let fields = self.fields(state, new.members.iter().zip(&new.args))?;
        initialized_row(
            state,
            host_type,
            InitializerKind::Constructor {
                members: new.members.clone(),
            },
            fields,
        )
    }

    /// `new T(a) { B = b }`: constructor members first, then the bound
    /// members, in source order.
    pub(super) fn member_init(
        self,
        state: &mut TranslationState,
        id: NodeId,
        init: &ExprMemberInit,
    ) -> Result<algebra::Expr> {
        let host_type = self.constructible(id)?;

        let Expr::New(new) = self.ast.expr(init.new) else {
            return Err(Error::unsupported_construct(
                "an object initializer without a constructor",
            ));
        };

        if new.members.len() != new.args.len() {
            return Err(Error::unsupported_construct(format!(
                "a constructor of `{host_type}` whose arguments do not map to members"
            )));
        }

        let mut fields = self.fields(state, new.members.iter().zip(&new.args))?;
        fields.extend(self.fields(state, init.bindings.iter().map(|(name, id)| (name, id)))?);

        initialized_row(
            state,
            host_type,
            InitializerKind::MemberInit {
                constructor: new.members.clone(),
                bindings: init.bindings.iter().map(|(name, _)| name.clone()).collect(),
            },
            fields,
        )
    }

    pub(super) fn new_array(
        self,
        state: &mut TranslationState,
        id: NodeId,
        array: &ExprNewArray,
    ) -> Result<algebra::Expr> {
        let element = match self.node_type(id)? {
            Type::Collection(element) => *element,
            ty => {
                return Err(Error::unsupported_construct(format!(
                    "an array of type `{ty}`"
                )))
            }
        };

        let elements = array
            .elements
            .iter()
            .map(|&element| self.translate(state, element))
            .collect::<Result<Vec<_>>>()?;

        Ok(algebra::Expr::collection(elements, element))
    }

    /// The target of `is`, `as`, and `OfType` must be an entity or complex
    /// type.
    pub(super) fn type_test_target(&self, ty: &HostType) -> Result<Type> {
        if !ty.is_nominal() {
            return Err(Error::unsupported_construct(format!(
                "a type test against `{ty}`"
            )));
        }
        self.algebra_type(ty)
    }

    /// Host type built by a construction node. Model types are materialized
    /// by the model itself, and sequences have no row shape.
    fn constructible(&self, id: NodeId) -> Result<HostType> {
        let ty = self.ast.ty(id);

        if ty.non_nullable().is_nominal() {
            return Err(Error::unsupported_construct(format!(
                "constructing entity or complex type `{ty}` in a query"
            )));
        }

        if ty.is_sequence() || ty.is_grouping() {
            return Err(Error::unsupported_construct(format!(
                "constructing enumerable type `{ty}` in a query"
            )));
        }

        Ok(ty.clone())
    }

    fn fields<'n>(
        self,
        state: &mut TranslationState,
        members: impl Iterator<Item = (&'n String, &'n NodeId)>,
    ) -> Result<Vec<(String, algebra::Expr)>> {
        members
            .map(|(name, &id)| Ok((name.clone(), self.translate(state, id)?)))
            .collect()
    }
}

/// A row constructor tagged with the canonical descriptor of its shape.
pub(super) fn initialized_row(
    state: &mut TranslationState,
    host_type: HostType,
    kind: InitializerKind,
    fields: Vec<(String, algebra::Expr)>,
) -> Result<algebra::Expr> {
    let initializer = state
        .initializers
        .canonicalize(InitializerDescriptor::new(host_type, kind))?;

    let (names, fields): (Vec<_>, Vec<_>) = fields.into_iter().unzip();
    let ty = RowType::new(
        names
            .into_iter()
            .zip(&fields)
            .map(|(name, field)| (name, field.ty()))
            .collect(),
    )
    .with_initializer(initializer);

    Ok(ExprRow { ty, fields }.into())
}
