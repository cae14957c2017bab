//! Builds [`Call`] entities from call expressions.

use crate::entities::{Call, UNKNOWN_OWNER};
use crate::error::{ExtractError, Result};
use crate::syntax::Expr;

use super::expression::extract_expression;

/// Builds a call entity from a call expression.
///
/// Returns `Ok(None)` when the callee can never be resolved statically
/// (`items[0]()`, `make()()`, `(a + b)()`) or sits in a syntax error, and
/// [`ExtractError::UnexpectedCallee`] for any callee shape outside the
/// attribute / name / subscript / call / binary-operation set.
/// Passing a non-call expression yields `Ok(None)`.
pub fn build_call(expr: &Expr) -> Result<Option<Call>> {
    let Expr::Call {
        func, args, keywords, ..
    } = expr
    else {
        return Ok(None);
    };

    let mut taken_var = Vec::new();
    for arg in args {
        taken_var.extend(extract_expression(arg)?);
    }
    for keyword in keywords {
        taken_var.extend(extract_expression(&keyword.value)?);
    }

    match func.as_ref() {
        Expr::Attribute { value, attr, line } => Ok(Some(Call {
            name: attr.clone(),
            line: *line,
            owner: Some(owner_token(value)),
            taken_var,
        })),
        Expr::Name { id, line } => Ok(Some(Call {
            name: id.clone(),
            line: *line,
            owner: None,
            taken_var,
        })),
        Expr::Subscript { .. } | Expr::Call { .. } | Expr::BinOp { .. } => Ok(None),
        Expr::Other { kind, .. } if kind == "ERROR" => Ok(None),
        other => Err(ExtractError::UnexpectedCallee {
            kind: other.kind_name().to_string(),
            line: other.line(),
        }),
    }
}

/// Dotted receiver path of a qualified call: `a.b` for `a.b.c()`.
pub(crate) fn owner_token(receiver: &Expr) -> String {
    let mut segments = Vec::new();
    let mut current = Some(receiver);
    while let Some(node) = current {
        match node {
            Expr::Attribute { attr, .. } => segments.push(attr.as_str()),
            Expr::Name { id, .. } => segments.push(id.as_str()),
            _ => {}
        }
        current = node.value_link();
    }

    if segments.is_empty() {
        return UNKNOWN_OWNER.to_string();
    }
    segments.reverse();
    segments.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Reference;
    use crate::indexer::Parser;
    use crate::syntax::Stmt;

    fn expr(source: &str) -> Expr {
        let module = Parser::default().parse_python(source).unwrap().module();
        match module.body.into_iter().next() {
            Some(Stmt::Expr { value, .. }) => value,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_unqualified_call() {
        let call = build_call(&expr("f(x)\n")).unwrap().unwrap();
        assert_eq!(call.name, "f");
        assert_eq!(call.owner, None);
        assert_eq!(call.taken_var, vec![Reference::name("x")]);
        assert_eq!(call.line, 1);
    }

    #[test]
    fn test_qualified_call_owner_chain() {
        let call = build_call(&expr("a.b.c(x)\n")).unwrap().unwrap();
        assert_eq!(call.name, "c");
        assert_eq!(call.owner.as_deref(), Some("a.b"));
    }

    #[test]
    fn test_owner_chain_through_call_receiver() {
        let call = build_call(&expr("get().b.c()\n")).unwrap().unwrap();
        assert_eq!(call.owner.as_deref(), Some("b"));

        let call = build_call(&expr("get().c()\n")).unwrap().unwrap();
        assert_eq!(call.owner.as_deref(), Some(UNKNOWN_OWNER));
    }

    #[test]
    fn test_owner_chain_through_subscript() {
        let call = build_call(&expr("self.items[0].run()\n")).unwrap().unwrap();
        assert_eq!(call.owner.as_deref(), Some("self.items"));
    }

    #[test]
    fn test_unresolvable_callees() {
        assert!(build_call(&expr("handlers[0](event)\n")).unwrap().is_none());
        assert!(build_call(&expr("factory()(event)\n")).unwrap().is_none());
        assert!(build_call(&expr("(a + b)(event)\n")).unwrap().is_none());
    }

    #[test]
    fn test_error_node_callee_is_unresolvable() {
        let call = Expr::Call {
            func: Box::new(Expr::Other {
                kind: "ERROR".into(),
                line: 3,
            }),
            args: vec![Expr::Name {
                id: "x".into(),
                line: 3,
            }],
            keywords: Vec::new(),
            line: 3,
        };
        assert!(build_call(&call).unwrap().is_none());
    }

    #[test]
    fn test_unexpected_callee_is_error() {
        let err = build_call(&expr("(lambda: 1)()\n")).unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedCallee { ref kind, line: 1 } if kind == "Lambda"));
    }

    #[test]
    fn test_arguments_then_keywords() {
        let call = build_call(&expr("run(a, b.c, *rest, key=v, **opts)\n")).unwrap().unwrap();
        let names: Vec<_> = call.taken_var.iter().filter_map(Reference::as_name).collect();
        assert_eq!(names, vec!["a", "v", "opts"]);
        assert_eq!(call.taken_var.len(), 5);
        assert_eq!(call.taken_var[2], Reference::Unmodeled("Starred".into()));
    }

    #[test]
    fn test_non_call_expression() {
        assert!(build_call(&expr("x\n")).unwrap().is_none());
    }
}
