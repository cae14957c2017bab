//! Decomposes expressions into ordered primitive references.

use crate::entities::{ConditionKind, LogicStatement, Receiver, Reference};
use crate::error::Result;
use crate::syntax::Expr;

use super::call::build_call;

/// Extracts every call, attribute access, name and conditional expression
/// reachable from `expr`, left to right, depth first.
///
/// Shapes that are not modelled become [`Reference::Unmodeled`] carrying the
/// node-kind name, so nothing is dropped. The only error is an unexpected
/// callee inside a nested call.
pub fn extract_expression(expr: &Expr) -> Result<Vec<Reference>> {
    let mut refs = Vec::new();
    extract_into(expr, &mut refs)?;
    Ok(refs)
}

fn extract_into(expr: &Expr, out: &mut Vec<Reference>) -> Result<()> {
    match expr {
        Expr::BinOp { left, right, .. } => {
            extract_into(left, out)?;
            extract_into(right, out)?;
        }
        Expr::UnaryOp { operand, .. } => extract_into(operand, out)?,
        Expr::Call { .. } => {
            if let Some(call) = build_call(expr)? {
                out.push(Reference::Call(call));
            }
        }
        Expr::Attribute { value, attr, .. } => {
            let owner = extract_receiver(value)?;
            out.push(Reference::Attribute {
                owner,
                attr: attr.clone(),
            });
        }
        Expr::Name { id, .. } => out.push(Reference::Name(id.clone())),
        Expr::Subscript { value, slice, .. } => {
            extract_into(value, out)?;
            if matches!(slice.as_ref(), Expr::Name { .. } | Expr::Attribute { .. }) {
                extract_into(slice, out)?;
            }
        }
        Expr::JoinedStr { values, .. } => {
            for part in values {
                if let Expr::FormattedValue { value, .. } = part {
                    extract_into(value, out)?;
                }
            }
        }
        Expr::IfExp {
            test,
            body,
            orelse,
            line,
        } => {
            let process = extract_expression(body)?;
            let else_branch = extract_expression(orelse)?;
            let condition = extract_expression(test)?;
            out.push(Reference::Logic(LogicStatement {
                kind: ConditionKind::IfExp,
                condition: Some(condition),
                process,
                else_branch: Some(else_branch),
                line: *line,
            }));
        }
        other => out.push(Reference::Unmodeled(other.kind_name().to_string())),
    }
    Ok(())
}

fn extract_receiver(value: &Expr) -> Result<Receiver> {
    let refs = match value {
        Expr::Call { .. } => {
            return Ok(match build_call(value)? {
                Some(call) => Receiver::One(Box::new(Reference::Call(call))),
                None => Receiver::Absent,
            });
        }
        // Collection literals have no name; the kind stands in for it.
        Expr::Dict { .. } => vec![Reference::Unmodeled(value.kind_name().to_string())],
        _ => extract_expression(value)?,
    };

    Ok(match <[Reference; 1]>::try_from(refs) {
        Ok([single]) => Receiver::One(Box::new(single)),
        Err(many) => Receiver::Many(many),
    })
}
