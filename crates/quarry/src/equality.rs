//! Null-aware equality.
//!
//! The backend compares with three-valued logic: `x = NULL` is unknown, not
//! false. Depending on where the comparison appears, the translator asks
//! for one of three strategies.

use crate::Options;
use quarry_core::{
    algebra::{Expr, Type},
    schema::Resolver,
    Error, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualsPattern {
    /// The backend's own equality. Unknown when either side is null.
    Store,

    /// Null equals null. Used for join keys and grouping.
    PositiveNullEqualityNonComposable,

    /// Null equals null, and the result is never unknown, so it can be
    /// negated or combined like an in-memory boolean.
    PositiveNullEqualityComposable,
}

impl EqualsPattern {
    /// The pattern for equality written by the user.
    pub fn user(options: &Options) -> EqualsPattern {
        if options.user_null_semantics {
            EqualsPattern::PositiveNullEqualityComposable
        } else {
            EqualsPattern::Store
        }
    }

    /// Composable equality is only produced when the options ask for user
    /// null semantics; otherwise it degrades to the non-composable form.
    pub fn effective(self, options: &Options) -> EqualsPattern {
        match self {
            EqualsPattern::PositiveNullEqualityComposable if !options.user_null_semantics => {
                EqualsPattern::PositiveNullEqualityNonComposable
            }
            pattern => pattern,
        }
    }
}

/// Builds `lhs == rhs` under `pattern`.
///
/// Rows compare member-wise and entities compare their keys. Literal nulls
/// and constants are folded before the pattern applies.
pub fn equals(
    resolver: &dyn Resolver,
    lhs: Expr,
    rhs: Expr,
    pattern: EqualsPattern,
) -> Result<Expr> {
    let (lhs_ty, rhs_ty) = (lhs.ty(), rhs.ty());

    if let (Type::Row(lhs_row), Type::Row(rhs_row)) = (&lhs_ty, &rhs_ty) {
        if lhs_row.has_incompatible_initializer(rhs_row) {
            return Ok(false.into());
        }

        if lhs_row.fields.len() != rhs_row.fields.len() {
            return Ok(false.into());
        }

        let mut operands = vec![];
        for (name, _) in &lhs_row.fields {
            if rhs_row.field(name).is_none() {
                return Ok(false.into());
            }
            operands.push(equals(
                resolver,
                Expr::field(lhs.clone(), name),
                Expr::field(rhs.clone(), name),
                pattern,
            )?);
        }
        return Ok(Expr::and_all(operands));
    }

    if let (Type::Entity(entity), true) = (&lhs_ty, rhs_ty.is_nominal()) {
        if !lhs.is_value_null() && !rhs.is_value_null() {
            return entity_equals(resolver, entity, lhs, rhs, pattern);
        }
    }

    Ok(scalar_equals(lhs, rhs, pattern))
}

fn entity_equals(
    resolver: &dyn Resolver,
    entity: &str,
    lhs: Expr,
    rhs: Expr,
    pattern: EqualsPattern,
) -> Result<Expr> {
    let keys = resolver.key_members(entity);
    if keys.is_empty() {
        return Err(Error::unsupported_construct(format!(
            "equality comparison on `{entity}`, which has no key"
        )));
    }

    let mut operands = vec![];
    for key in keys {
        let ty = resolver
            .member_for(entity, &key)
            .and_then(|member| resolver.type_for_host_type(&member.host_type()))
            .unwrap_or(Type::Unknown);
        operands.push(scalar_equals(
            Expr::property(lhs.clone(), key.clone(), ty.clone()),
            Expr::property(rhs.clone(), key, ty),
            pattern,
        ));
    }

    Ok(Expr::and_all(operands))
}

fn scalar_equals(lhs: Expr, rhs: Expr, pattern: EqualsPattern) -> Expr {
    match (Operand::of(&lhs), Operand::of(&rhs)) {
        (Operand::Null, Operand::Null) => true.into(),
        (Operand::Null, Operand::Constant) | (Operand::Constant, Operand::Null) => false.into(),
        (Operand::Constant, Operand::Constant) => Expr::eq(lhs, rhs),
        (Operand::Null, Operand::Unknown) => Expr::is_null(rhs),
        (Operand::Unknown, Operand::Null) => Expr::is_null(lhs),
        (Operand::Constant, Operand::Unknown) => {
            let unknown = rhs.clone();
            constant_equals_unknown(lhs, rhs, unknown, pattern)
        }
        (Operand::Unknown, Operand::Constant) => {
            let unknown = lhs.clone();
            constant_equals_unknown(lhs, rhs, unknown, pattern)
        }
        (Operand::Unknown, Operand::Unknown) => unknown_equals_unknown(lhs, rhs, pattern),
    }
}

/// The constant is known to be non-null, so only the unknown side can make
/// the comparison unknown.
fn constant_equals_unknown(lhs: Expr, rhs: Expr, unknown: Expr, pattern: EqualsPattern) -> Expr {
    match pattern {
        EqualsPattern::Store | EqualsPattern::PositiveNullEqualityNonComposable => Expr::eq(lhs, rhs),
        EqualsPattern::PositiveNullEqualityComposable => {
            Expr::and(Expr::eq(lhs, rhs), Expr::not(Expr::is_null(unknown)))
        }
    }
}

fn unknown_equals_unknown(lhs: Expr, rhs: Expr, pattern: EqualsPattern) -> Expr {
    let both_null = || Expr::and(Expr::is_null(lhs.clone()), Expr::is_null(rhs.clone()));

    match pattern {
        EqualsPattern::Store => Expr::eq(lhs, rhs),
        EqualsPattern::PositiveNullEqualityNonComposable => {
            Expr::or(Expr::eq(lhs.clone(), rhs.clone()), both_null())
        }
        EqualsPattern::PositiveNullEqualityComposable => {
            let either_null = Expr::or(Expr::is_null(lhs.clone()), Expr::is_null(rhs.clone()));
            Expr::or(
                Expr::and(Expr::eq(lhs.clone(), rhs.clone()), Expr::not(either_null)),
                both_null(),
            )
        }
    }
}

enum Operand {
    Null,
    Constant,
    Unknown,
}

impl Operand {
    fn of(expr: &Expr) -> Operand {
        match expr {
            expr if expr.is_value_null() => Operand::Null,
            Expr::Value(_) => Operand::Constant,
            _ => Operand::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::Schema;

    fn param(name: &str) -> Expr {
        Expr::param(name, Type::I32)
    }

    #[test]
    fn null_against_unknown_is_null_test() {
        let schema = Schema::default();
        let expr = equals(&schema, Expr::null(Type::I32), param("a"), EqualsPattern::Store).unwrap();
        assert_eq!(expr, Expr::is_null(param("a")));
    }

    #[test]
    fn constants_fold() {
        let schema = Schema::default();
        for pattern in [
            EqualsPattern::Store,
            EqualsPattern::PositiveNullEqualityNonComposable,
            EqualsPattern::PositiveNullEqualityComposable,
        ] {
            let both_null =
                equals(&schema, Expr::null(Type::I32), Expr::null(Type::I32), pattern).unwrap();
            assert!(both_null.is_true());

            let one_null = equals(&schema, Expr::from(1), Expr::null(Type::I32), pattern).unwrap();
            assert!(one_null.is_false());
        }
    }

    #[test]
    fn composable_degrades_without_user_null_semantics() {
        let pattern = EqualsPattern::PositiveNullEqualityComposable;
        assert_eq!(
            pattern.effective(&Options::DEFAULT),
            EqualsPattern::PositiveNullEqualityNonComposable
        );
        assert_eq!(pattern.effective(&Options::CLIENT_NULL_SEMANTICS), pattern);
    }
}
