//! Turns assignment statements into [`Variable`] bindings.

use crate::entities::{Target, Variable};
use crate::error::Result;
use crate::syntax::{Expr, Stmt};

use super::call::owner_token;
use super::expression::extract_expression;

/// Builds the variable binding for an `Assign`, `AugAssign` or annotated
/// assignment with a value. Returns `None` for anything else, and when no
/// target could be decomposed.
///
/// Chained targets (`a = b = value`) share one `points_to`.
pub fn process_assignment(stmt: &Stmt) -> Result<Option<Variable>> {
    let (targets, value, line): (Vec<&Expr>, &Expr, usize) = match stmt {
        Stmt::Assign { targets, value, line } => (targets.iter().collect(), value, *line),
        Stmt::AugAssign { target, value, line, .. } => (vec![target], value, *line),
        Stmt::AnnAssign {
            target,
            value: Some(value),
            line,
            ..
        } => (vec![target], value, *line),
        _ => return Ok(None),
    };

    let points_to = extract_expression(value)?;

    let mut decomposed = Vec::new();
    for target in targets {
        extract_targets(target, &mut decomposed)?;
    }
    if decomposed.is_empty() {
        return Ok(None);
    }

    Ok(Some(Variable {
        targets: decomposed,
        points_to,
        line,
    }))
}

fn extract_targets(target: &Expr, out: &mut Vec<Target>) -> Result<()> {
    match target {
        Expr::Name { id, .. } => out.push(Target::Name(id.clone())),
        Expr::Tuple { elts, .. } | Expr::List { elts, .. } => {
            for elt in elts {
                extract_targets(elt, out)?;
            }
        }
        Expr::Starred { value, .. } => extract_targets(value, out)?,
        Expr::Attribute { value, attr, .. } => out.push(Target::Attribute {
            owner: owner_token(value),
            attr: attr.clone(),
        }),
        Expr::Subscript { value, slice, .. } => {
            let base = extract_expression(value)?;
            let index = match slice.as_ref() {
                Expr::Name { .. } | Expr::Attribute { .. } => Some(extract_expression(slice)?),
                _ => None,
            };
            out.push(Target::Subscript { base, index });
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Reference;
    use crate::indexer::Parser;

    fn variable(source: &str) -> Option<Variable> {
        let module = Parser::default().parse_python(source).unwrap().module();
        process_assignment(&module.body[0]).unwrap()
    }

    #[test]
    fn test_simple_assignment() {
        let var = variable("total = price * qty\n").unwrap();
        assert_eq!(var.targets, vec![Target::Name("total".into())]);
        assert_eq!(var.points_to, vec![Reference::name("price"), Reference::name("qty")]);
        assert_eq!(var.line, 1);
    }

    #[test]
    fn test_tuple_unpacking_keeps_order() {
        let var = variable("(x, y) = load()\n").unwrap();
        assert_eq!(var.target_names(), vec!["x", "y"]);
        assert_eq!(var.points_to[0].as_call().unwrap().name, "load");

        let var = variable("a, (b, *rest) = items\n").unwrap();
        assert_eq!(var.target_names(), vec!["a", "b", "rest"]);
    }

    #[test]
    fn test_chained_targets_share_value() {
        let var = variable("a = b = make()\n").unwrap();
        assert_eq!(var.target_names(), vec!["a", "b"]);
        assert_eq!(var.points_to.len(), 1);
    }

    #[test]
    fn test_attribute_targets() {
        let var = variable("self.count = 0\n").unwrap();
        assert_eq!(
            var.targets,
            vec![Target::Attribute {
                owner: "self".into(),
                attr: "count".into()
            }]
        );

        let var = variable("self.state.value = v\n").unwrap();
        assert!(matches!(&var.targets[0], Target::Attribute { owner, .. } if owner == "self.state"));
    }

    #[test]
    fn test_subscript_targets() {
        let var = variable("cache[key] = value\n").unwrap();
        assert_eq!(
            var.targets,
            vec![Target::Subscript {
                base: vec![Reference::name("cache")],
                index: Some(vec![Reference::name("key")]),
            }]
        );

        let var = variable("cache[0] = value\n").unwrap();
        assert!(matches!(&var.targets[0], Target::Subscript { index: None, .. }));
    }

    #[test]
    fn test_augmented_and_annotated() {
        let var = variable("total += step(n)\n").unwrap();
        assert_eq!(var.target_names(), vec!["total"]);
        assert_eq!(var.points_to[0].as_call().unwrap().name, "step");

        let var = variable("limit: int = base\n").unwrap();
        assert_eq!(var.target_names(), vec!["limit"]);

        assert!(variable("limit: int\n").is_none());
    }

    #[test]
    fn test_non_assignment_is_none() {
        assert!(variable("run()\n").is_none());
    }
}
