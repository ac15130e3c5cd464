use super::{Expr, RowType, Type};

/// Evaluates to a row; `fields` line up with `ty.fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprRow {
    pub ty: RowType,
    pub fields: Vec<Expr>,
}

impl Expr {
    /// Builds a row from named fields, inferring the field types.
    pub fn row(fields: Vec<(String, Expr)>) -> Self {
        let (names, exprs): (Vec<_>, Vec<_>) = fields.into_iter().unzip();
        let ty = RowType::new(
            names
                .into_iter()
                .zip(&exprs)
                .map(|(name, expr)| (name, expr.ty()))
                .collect(),
        );
        ExprRow { ty, fields: exprs }.into()
    }
}

impl ExprRow {
    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.ty.position(name).map(|index| &self.fields[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.ty
            .fields
            .iter()
            .map(|(name, _)| name.as_str())
            .zip(&self.fields)
    }

    pub fn field_ty(&self, name: &str) -> Type {
        self.ty.field(name).cloned().unwrap_or(Type::Unknown)
    }
}

impl From<ExprRow> for Expr {
    fn from(value: ExprRow) -> Self {
        Self::Row(value)
    }
}
