use super::{construct::initialized_row, sequence::elements, TranslationContext, TranslationState};
use quarry_core::{
    algebra::{self, InitializerKind, Type},
    ast::{Expr, ExprMember, NodeId},
    schema::{HostType, MemberKind},
    Error, Result,
};

/// Date and time members with a canonical function of the same name.
const DATE_PARTS: [&str; 6] = ["Year", "Month", "Day", "Hour", "Minute", "Second"];

impl TranslationContext<'_> {
    pub(super) fn member(
        self,
        state: &mut TranslationState,
        member: &ExprMember,
    ) -> Result<algebra::Expr> {
        let Some(receiver) = member.receiver else {
            return self.static_member(member);
        };

        if self.root_context == Some(receiver) {
            return self.context_member(receiver, member);
        }

        if matches!(self.ast.expr(receiver), Expr::Closure(_)) {
            return Err(Error::unsupported_construct(format!(
                "captured variable `{}` that was not evaluated locally",
                member.name
            )));
        }

        let instance = self.translate(state, receiver)?;
        let receiver_ty = self.ast.ty(receiver);
        let name = member.name.as_str();

        match receiver_ty.non_nullable() {
            HostType::Entity(owner) | HostType::Complex(owner) => {
                return self.model_member(state, instance, owner, name);
            }
            HostType::Grouping(..) if name == "Key" => {
                return Ok(algebra::Expr::field(instance, "Key"));
            }
            HostType::String if name == "Length" => {
                return Ok(algebra::Expr::canonical("Length", vec![instance], Type::I32));
            }
            HostType::DateTime if DATE_PARTS.contains(&name) => {
                return Ok(algebra::Expr::canonical(name, vec![instance], Type::I32));
            }
            HostType::Sequence(_) | HostType::Grouping(..) if name == "Count" => {
                return Ok(count(state, elements(instance), "Count", Type::I32));
            }
            _ => {}
        }

        if receiver_ty.is_nullable() {
            match name {
                "HasValue" => return Ok(algebra::Expr::not(algebra::Expr::is_null(instance))),
                "Value" => return Ok(instance),
                _ => {}
            }
        }

        // Members of rows built by projections
        if let Type::Row(row) = instance.ty() {
            if row.field(name).is_some() {
                return Ok(algebra::Expr::field(instance, name));
            }
        }

        Err(Error::unsupported_construct(format!(
            "member `{name}` of `{receiver_ty}`"
        )))
    }

    /// Properties and navigations declared by the model.
    fn model_member(
        self,
        state: &mut TranslationState,
        instance: algebra::Expr,
        owner: &str,
        name: &str,
    ) -> Result<algebra::Expr> {
        let member = self.resolver.member_for(owner, name).ok_or_else(|| {
            Error::unsupported_construct(format!("`{owner}` has no member `{name}`"))
        })?;

        let ty = self.algebra_type(&member.host_type())?;

        match &member.kind {
            MemberKind::Property(_) => Ok(algebra::Expr::property(instance, name, ty)),
            MemberKind::Navigation(navigation) if !navigation.many => {
                Ok(algebra::Expr::navigate(instance, name, ty))
            }
            MemberKind::Navigation(_) => {
                // One-to-many navigations carry their owner along, so the
                // materializer can attach the elements to it
                let elements = algebra::Expr::navigate(instance.clone(), name, ty);
                initialized_row(
                    state,
                    member.host_type(),
                    InitializerKind::EntityCollection {
                        owner: owner.to_string(),
                        navigation: name.to_string(),
                    },
                    vec![
                        ("Owner".to_string(), instance),
                        ("Elements".to_string(), elements),
                    ],
                )
            }
        }
    }

    fn static_member(&self, member: &ExprMember) -> Result<algebra::Expr> {
        match (member.owner.non_nullable(), member.name.as_str()) {
            (HostType::DateTime, "Now") => Ok(algebra::Expr::canonical(
                "CurrentDateTime",
                vec![],
                Type::DateTime,
            )),
            (HostType::DateTime, "UtcNow") => Ok(algebra::Expr::canonical(
                "CurrentUtcDateTime",
                vec![],
                Type::DateTime,
            )),
            (owner, name) => Err(Error::unsupported_construct(format!(
                "static member `{owner}.{name}`"
            ))),
        }
    }

    /// `context.Products` scans the `Products` entity set. The context
    /// parameter is good for nothing else.
    fn context_member(&self, context: NodeId, member: &ExprMember) -> Result<algebra::Expr> {
        if self.resolver.entity_set(&member.name).is_some() {
            return self.entity_set(&member.name);
        }

        let name = match self.ast.expr(context) {
            Expr::Parameter(param) => param.name.as_str(),
            _ => "context",
        };
        Err(Error::root_context_misuse(name))
    }
}

/// `Count` and `LongCount` over a collection.
pub(super) fn count(
    state: &mut TranslationState,
    collection: algebra::Expr,
    name: &str,
    ty: Type,
) -> algebra::Expr {
    let input = state.bind(collection);
    algebra::Expr::aggregate(name, algebra::Expr::project(input, 1), ty)
}
