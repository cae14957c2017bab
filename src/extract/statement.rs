//! Walks statement sequences into ordered `process` lists.

use crate::config::ExtractorConfig;
use crate::entities::{ConditionKind, Entity, LogicStatement, Reference};
use crate::error::Result;
use crate::syntax::{Constant, Expr, Stmt};

use super::assignment::process_assignment;
use super::call::build_call;
use super::expression::extract_expression;

pub struct StatementWalker<'a> {
    config: &'a ExtractorConfig,
}

impl<'a> StatementWalker<'a> {
    pub fn new(config: &'a ExtractorConfig) -> Self {
        Self { config }
    }

    /// Builds the ordered entity list for `stmts`.
    ///
    /// At the top level (`is_root`), an entry-point guard contributes its body
    /// directly instead of a [`LogicStatement`]. A `return` contributes the calls
    /// in its value. Statements that carry no call, binding or control flow
    /// (`for`, `with`, `pass`, ...) are skipped.
    pub fn walk(&self, stmts: &[Stmt], is_root: bool) -> Result<Vec<Entity>> {
        let mut process = Vec::new();
        for stmt in stmts {
            if is_root && self.is_entry_guard(stmt) {
                if let Stmt::If { body, .. } = stmt {
                    process.extend(self.walk(body, false)?);
                }
                continue;
            }

            match stmt {
                Stmt::Assign { .. } | Stmt::AugAssign { .. } | Stmt::AnnAssign { .. } => {
                    if let Some(variable) = process_assignment(stmt)? {
                        process.push(Entity::Variable(variable));
                    }
                }
                Stmt::If {
                    test,
                    body,
                    orelse,
                    line,
                } => {
                    let else_branch = if orelse.is_empty() {
                        None
                    } else {
                        Some(self.walk(orelse, false)?)
                    };
                    process.push(Entity::Logic(LogicStatement {
                        kind: ConditionKind::If,
                        condition: Some(extract_expression(test)?),
                        process: self.walk(body, false)?,
                        else_branch,
                        line: *line,
                    }));
                }
                Stmt::While { test, body, line, .. } => {
                    process.push(Entity::Logic(LogicStatement {
                        kind: ConditionKind::While,
                        condition: Some(extract_expression(test)?),
                        process: self.walk(body, false)?,
                        else_branch: None,
                        line: *line,
                    }));
                }
                Stmt::Try { body, line, .. } => {
                    process.push(Entity::Logic(LogicStatement {
                        kind: ConditionKind::Try,
                        condition: None,
                        process: self.walk(body, false)?,
                        else_branch: None,
                        line: *line,
                    }));
                }
                Stmt::Expr {
                    value: value @ Expr::Call { .. },
                    ..
                } => {
                    if let Some(call) = build_call(value)? {
                        process.push(Entity::Call(call));
                    }
                }
                Stmt::Return { value: Some(value), .. } => {
                    for reference in extract_expression(value)? {
                        if let Reference::Call(call) = reference {
                            process.push(Entity::Call(call));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(process)
    }

    /// `if <token> == "<literal>":` with exactly one comparison and no `else`.
    pub fn is_entry_guard(&self, stmt: &Stmt) -> bool {
        let Stmt::If {
            test: Expr::Compare {
                left,
                ops,
                comparators,
                ..
            },
            orelse,
            ..
        } = stmt
        else {
            return false;
        };

        let left_matches =
            matches!(left.as_ref(), Expr::Name { id, .. } if *id == self.config.entry_guard_token);
        let op_matches = ops.len() == 1 && ops[0] == "==";
        let literal_matches = matches!(
            comparators.as_slice(),
            [Expr::Constant { value: Constant::Str(s), .. }] if *s == self.config.entry_guard_literal
        );
        orelse.is_empty() && left_matches && op_matches && literal_matches
    }
}
