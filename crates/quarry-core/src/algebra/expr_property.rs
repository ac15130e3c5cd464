use super::{Expr, Type};

/// Reads a property, or follows a navigation, of an instance or row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprProperty {
    pub instance: Box<Expr>,
    pub name: String,
    pub ty: Type,

    /// Set for relationship navigations
    pub navigation: bool,
}

impl Expr {
    pub fn property(instance: impl Into<Self>, name: impl Into<String>, ty: Type) -> Self {
        ExprProperty {
            instance: Box::new(instance.into()),
            name: name.into(),
            ty,
            navigation: false,
        }
        .into()
    }

    pub fn navigate(instance: impl Into<Self>, name: impl Into<String>, ty: Type) -> Self {
        ExprProperty {
            instance: Box::new(instance.into()),
            name: name.into(),
            ty,
            navigation: true,
        }
        .into()
    }

    /// Reads a field of a row-typed expression, folding the access when the
    /// instance is a row constructor.
    pub fn field(instance: Expr, name: &str) -> Self {
        if let Expr::Row(row) = &instance {
            if let Some(index) = row.ty.position(name) {
                return row.fields[index].clone();
            }
        }

        let ty = instance
            .ty()
            .as_row()
            .and_then(|row| row.field(name).cloned())
            .unwrap_or(Type::Unknown);
        Expr::property(instance, name, ty)
    }
}

impl From<ExprProperty> for Expr {
    fn from(value: ExprProperty) -> Self {
        Self::Property(value)
    }
}
