use super::{Local, Mode, Pass};
use quarry_core::{
    ast::{Captured, Expr, ExprUnary, NodeId, UnaryOp},
    schema::HostType,
    Error, Result,
};
use tracing::trace;

impl Pass<'_, '_> {
    /// Classifies `id` and its subtree.
    ///
    /// A node is local only if it meets its own criterion and every child is
    /// local in the same sense.
    pub(super) fn nominate(&mut self, id: NodeId) -> Result<Local> {
        if let Some(&local) = self.nominations.get(&id) {
            return Ok(local);
        }

        if !self.nominating.insert(id) {
            return Err(Error::cycle_detected(id.index()));
        }

        let mut children = Local {
            constant: true,
            variable: true,
        };
        for child in self.ast.children(id) {
            let local = self.nominate(child)?;
            children.constant &= local.constant;
            children.variable &= local.variable;
        }

        let criterion = self.criterion(id);
        let local = Local {
            constant: criterion.constant && children.constant,
            variable: criterion.variable && children.variable,
        };

        if local.variable {
            trace!(?id, constant = local.constant, "nominated");
        }

        self.nominating.swap_remove(&id);
        self.nominations.insert(id, local);
        Ok(local)
    }

    /// The node's own criterion, ignoring its children.
    fn criterion(&self, id: NodeId) -> Local {
        const CONSTANT: Local = Local {
            constant: true,
            variable: true,
        };
        const VARIABLE: Local = Local {
            constant: false,
            variable: true,
        };
        const NEITHER: Local = Local {
            constant: false,
            variable: false,
        };

        let funcletizer = self.funcletizer;

        match self.ast.expr(id) {
            Expr::Constant(_) => CONSTANT,
            Expr::Closure(_) => VARIABLE,
            Expr::Parameter(_) if funcletizer.root_context() == Some(id) => NEITHER,
            Expr::Parameter(_) if funcletizer.is_formal(id) => match funcletizer.mode {
                Mode::CompiledEvaluation => CONSTANT,
                _ => VARIABLE,
            },
            Expr::Parameter(_) => NEITHER,
            Expr::Member(member) => match member.receiver {
                Some(receiver) => match self.ast.expr(receiver) {
                    // Closure reads are always repeatable; captured queries
                    // are inlined instead
                    Expr::Closure(closure) => match closure.get(&member.name) {
                        Ok(Captured::Query(_)) => NEITHER,
                        _ => VARIABLE,
                    },
                    _ if funcletizer
                        .resolver
                        .is_reevaluable(self.ast.ty(receiver), &member.name) =>
                    {
                        VARIABLE
                    }
                    _ => NEITHER,
                },
                None => NEITHER,
            },
            Expr::New(_) if is_primitive_constructor(self.ast.ty(id)) => CONSTANT,
            Expr::NewArray(_) if is_primitive_array(self.ast.ty(id)) => CONSTANT,
            Expr::Unary(ExprUnary {
                op: UnaryOp::Convert,
                operand,
            }) => {
                if self.ast.ty(*operand).widens_to(self.ast.ty(id)) {
                    CONSTANT
                } else {
                    NEITHER
                }
            }
            Expr::Unary(ExprUnary {
                op: UnaryOp::Quote, ..
            }) => NEITHER,
            Expr::Unary(_) | Expr::Binary(_) | Expr::Conditional(_) => CONSTANT,
            Expr::Call(_)
            | Expr::EntitySet(_)
            | Expr::Lambda(_)
            | Expr::MemberInit(_)
            | Expr::New(_)
            | Expr::NewArray(_)
            | Expr::Placeholder(_)
            | Expr::TypeAs(_)
            | Expr::TypeIs(_) => NEITHER,
        }
    }
}

/// Guids, strings, numbers, and dates can be built locally.
fn is_primitive_constructor(ty: &HostType) -> bool {
    matches!(
        ty.non_nullable(),
        HostType::Guid | HostType::String | HostType::I32 | HostType::I64 | HostType::F64 | HostType::DateTime
    )
}

fn is_primitive_array(ty: &HostType) -> bool {
    match ty {
        HostType::Bytes => true,
        HostType::Sequence(element) => element.is_primitive(),
        _ => false,
    }
}
