//! Typed Python syntax tree consumed by the extractor.
//!
//! The shapes mirror the node kinds of Python's own `ast` module closely enough
//! that kind names (`Compare`, `ListComp`, ...) can be used as stable tokens.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    pub posonly: Vec<String>,
    pub args: Vec<String>,
    pub vararg: Option<String>,
    pub kwonly: Vec<String>,
    pub kwarg: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Parameters,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub is_async: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub kind: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    /// `None` for `**mapping` arguments.
    pub arg: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        line: usize,
    },
    AugAssign {
        target: Expr,
        op: String,
        value: Expr,
        line: usize,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
        line: usize,
    },
    Expr {
        value: Expr,
        line: usize,
    },
    Return {
        value: Option<Expr>,
        line: usize,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        line: usize,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        line: usize,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        is_async: bool,
        line: usize,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
        line: usize,
    },
    With {
        items: Vec<Expr>,
        body: Vec<Stmt>,
        is_async: bool,
        line: usize,
    },
    Import {
        names: Vec<Alias>,
        line: usize,
    },
    ImportFrom {
        module: Option<String>,
        names: Vec<Alias>,
        level: usize,
        line: usize,
    },
    Other {
        kind: String,
        line: usize,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::FunctionDef(def) => def.line,
            Stmt::ClassDef(def) => def.line,
            Stmt::Assign { line, .. }
            | Stmt::AugAssign { line, .. }
            | Stmt::AnnAssign { line, .. }
            | Stmt::Expr { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::For { line, .. }
            | Stmt::Try { line, .. }
            | Stmt::With { line, .. }
            | Stmt::Import { line, .. }
            | Stmt::ImportFrom { line, .. }
            | Stmt::Other { line, .. } => *line,
        }
    }

    pub fn kind_name(&self) -> &str {
        match self {
            Stmt::FunctionDef(def) if def.is_async => "AsyncFunctionDef",
            Stmt::FunctionDef(_) => "FunctionDef",
            Stmt::ClassDef(_) => "ClassDef",
            Stmt::Assign { .. } => "Assign",
            Stmt::AugAssign { .. } => "AugAssign",
            Stmt::AnnAssign { .. } => "AnnAssign",
            Stmt::Expr { .. } => "Expr",
            Stmt::Return { .. } => "Return",
            Stmt::If { .. } => "If",
            Stmt::While { .. } => "While",
            Stmt::For { is_async: true, .. } => "AsyncFor",
            Stmt::For { .. } => "For",
            Stmt::Try { .. } => "Try",
            Stmt::With { is_async: true, .. } => "AsyncWith",
            Stmt::With { .. } => "With",
            Stmt::Import { .. } => "Import",
            Stmt::ImportFrom { .. } => "ImportFrom",
            Stmt::Other { kind, .. } => kind,
        }
    }

    /// Nested statement blocks, in source order.
    pub fn blocks(&self) -> Vec<&[Stmt]> {
        match self {
            Stmt::FunctionDef(def) => vec![&def.body],
            Stmt::ClassDef(def) => vec![&def.body],
            Stmt::If { body, orelse, .. }
            | Stmt::While { body, orelse, .. }
            | Stmt::For { body, orelse, .. } => vec![body, orelse],
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            } => {
                let mut blocks: Vec<&[Stmt]> = vec![body];
                blocks.extend(handlers.iter().map(|h| h.body.as_slice()));
                blocks.push(orelse);
                blocks.push(finalbody);
                blocks
            }
            Stmt::With { body, .. } => vec![body],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constant {
    Bool(bool),
    Str(String),
    /// Numeric literals keep their source spelling.
    Number(String),
    Bytes(Vec<u8>),
    Ellipsis(EllipsisMarker),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EllipsisMarker {
    #[serde(rename = "...")]
    Ellipsis,
}

impl Constant {
    fn repr(&self) -> String {
        match self {
            Constant::Bool(true) => "True".to_string(),
            Constant::Bool(false) => "False".to_string(),
            Constant::Str(s) => format!("'{}'", s),
            Constant::Number(n) => n.clone(),
            Constant::Bytes(b) => format!("b'{}'", String::from_utf8_lossy(b)),
            Constant::Ellipsis(_) => "Ellipsis".to_string(),
            Constant::None => "None".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionKind {
    List,
    Set,
    Dict,
    Generator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name {
        id: String,
        line: usize,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
        line: usize,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        line: usize,
    },
    BinOp {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
        line: usize,
    },
    UnaryOp {
        op: String,
        operand: Box<Expr>,
        line: usize,
    },
    BoolOp {
        op: String,
        values: Vec<Expr>,
        line: usize,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<String>,
        comparators: Vec<Expr>,
        line: usize,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
        line: usize,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Expr>,
        line: usize,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        line: usize,
    },
    /// f-string: `values` holds `Constant` text segments and `FormattedValue`s.
    JoinedStr {
        values: Vec<Expr>,
        line: usize,
    },
    FormattedValue {
        value: Box<Expr>,
        line: usize,
    },
    Constant {
        value: Constant,
        line: usize,
    },
    Tuple {
        elts: Vec<Expr>,
        line: usize,
    },
    List {
        elts: Vec<Expr>,
        line: usize,
    },
    Set {
        elts: Vec<Expr>,
        line: usize,
    },
    Dict {
        /// `None` keys stand for `**mapping` entries.
        keys: Vec<Option<Expr>>,
        values: Vec<Expr>,
        line: usize,
    },
    Comprehension {
        kind: ComprehensionKind,
        line: usize,
    },
    Lambda {
        line: usize,
    },
    Await {
        value: Box<Expr>,
        line: usize,
    },
    Yield {
        value: Option<Box<Expr>>,
        line: usize,
    },
    YieldFrom {
        value: Box<Expr>,
        line: usize,
    },
    Starred {
        value: Box<Expr>,
        line: usize,
    },
    NamedExpr {
        target: Box<Expr>,
        value: Box<Expr>,
        line: usize,
    },
    Other {
        kind: String,
        line: usize,
    },
}

impl Expr {
    pub fn name(id: impl Into<String>, line: usize) -> Self {
        Expr::Name { id: id.into(), line }
    }

    pub fn line(&self) -> usize {
        match self {
            Expr::Name { line, .. }
            | Expr::Attribute { line, .. }
            | Expr::Call { line, .. }
            | Expr::BinOp { line, .. }
            | Expr::UnaryOp { line, .. }
            | Expr::BoolOp { line, .. }
            | Expr::Compare { line, .. }
            | Expr::IfExp { line, .. }
            | Expr::Subscript { line, .. }
            | Expr::Slice { line, .. }
            | Expr::JoinedStr { line, .. }
            | Expr::FormattedValue { line, .. }
            | Expr::Constant { line, .. }
            | Expr::Tuple { line, .. }
            | Expr::List { line, .. }
            | Expr::Set { line, .. }
            | Expr::Dict { line, .. }
            | Expr::Comprehension { line, .. }
            | Expr::Lambda { line }
            | Expr::Await { line, .. }
            | Expr::Yield { line, .. }
            | Expr::YieldFrom { line, .. }
            | Expr::Starred { line, .. }
            | Expr::NamedExpr { line, .. }
            | Expr::Other { line, .. } => *line,
        }
    }

    /// Node-kind name, as Python's `ast` module spells it.
    pub fn kind_name(&self) -> &str {
        match self {
            Expr::Name { .. } => "Name",
            Expr::Attribute { .. } => "Attribute",
            Expr::Call { .. } => "Call",
            Expr::BinOp { .. } => "BinOp",
            Expr::UnaryOp { .. } => "UnaryOp",
            Expr::BoolOp { .. } => "BoolOp",
            Expr::Compare { .. } => "Compare",
            Expr::IfExp { .. } => "IfExp",
            Expr::Subscript { .. } => "Subscript",
            Expr::Slice { .. } => "Slice",
            Expr::JoinedStr { .. } => "JoinedStr",
            Expr::FormattedValue { .. } => "FormattedValue",
            Expr::Constant { .. } => "Constant",
            Expr::Tuple { .. } => "Tuple",
            Expr::List { .. } => "List",
            Expr::Set { .. } => "Set",
            Expr::Dict { .. } => "Dict",
            Expr::Comprehension { kind, .. } => match kind {
                ComprehensionKind::List => "ListComp",
                ComprehensionKind::Set => "SetComp",
                ComprehensionKind::Dict => "DictComp",
                ComprehensionKind::Generator => "GeneratorExp",
            },
            Expr::Lambda { .. } => "Lambda",
            Expr::Await { .. } => "Await",
            Expr::Yield { .. } => "Yield",
            Expr::YieldFrom { .. } => "YieldFrom",
            Expr::Starred { .. } => "Starred",
            Expr::NamedExpr { .. } => "NamedExpr",
            Expr::Other { kind, .. } => kind,
        }
    }

    /// The `value` link followed when walking a receiver chain.
    pub fn value_link(&self) -> Option<&Expr> {
        match self {
            Expr::Attribute { value, .. }
            | Expr::Subscript { value, .. }
            | Expr::FormattedValue { value, .. }
            | Expr::Await { value, .. }
            | Expr::YieldFrom { value, .. }
            | Expr::Starred { value, .. }
            | Expr::NamedExpr { value, .. } => Some(value),
            Expr::Yield { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    /// Deterministic structural rendering, in the style of `ast.dump`.
    pub fn dump(&self) -> String {
        match self {
            Expr::Name { id, .. } => format!("Name(id='{}')", id),
            Expr::Attribute { value, attr, .. } => {
                format!("Attribute(value={}, attr='{}')", value.dump(), attr)
            }
            Expr::Call {
                func,
                args,
                keywords,
                ..
            } => {
                let keywords: Vec<String> = keywords
                    .iter()
                    .map(|k| match &k.arg {
                        Some(arg) => format!("keyword(arg='{}', value={})", arg, k.value.dump()),
                        None => format!("keyword(value={})", k.value.dump()),
                    })
                    .collect();
                format!(
                    "Call(func={}, args=[{}], keywords=[{}])",
                    func.dump(),
                    dump_list(args),
                    keywords.join(", ")
                )
            }
            Expr::BinOp { left, op, right, .. } => {
                format!("BinOp(left={}, op='{}', right={})", left.dump(), op, right.dump())
            }
            Expr::UnaryOp { op, operand, .. } => {
                format!("UnaryOp(op='{}', operand={})", op, operand.dump())
            }
            Expr::BoolOp { op, values, .. } => {
                format!("BoolOp(op='{}', values=[{}])", op, dump_list(values))
            }
            Expr::Compare {
                left,
                ops,
                comparators,
                ..
            } => format!(
                "Compare(left={}, ops=[{}], comparators=[{}])",
                left.dump(),
                ops.iter().map(|o| format!("'{}'", o)).collect::<Vec<_>>().join(", "),
                dump_list(comparators)
            ),
            Expr::IfExp {
                test, body, orelse, ..
            } => format!(
                "IfExp(test={}, body={}, orelse={})",
                test.dump(),
                body.dump(),
                orelse.dump()
            ),
            Expr::Subscript { value, slice, .. } => {
                format!("Subscript(value={}, slice={})", value.dump(), slice.dump())
            }
            Expr::Slice {
                lower, upper, step, ..
            } => {
                let part = |e: &Option<Box<Expr>>| e.as_ref().map(|e| e.dump()).unwrap_or_else(|| "None".to_string());
                format!("Slice(lower={}, upper={}, step={})", part(lower), part(upper), part(step))
            }
            Expr::JoinedStr { values, .. } => format!("JoinedStr(values=[{}])", dump_list(values)),
            Expr::FormattedValue { value, .. } => format!("FormattedValue(value={})", value.dump()),
            Expr::Constant { value, .. } => format!("Constant(value={})", value.repr()),
            Expr::Tuple { elts, .. } => format!("Tuple(elts=[{}])", dump_list(elts)),
            Expr::List { elts, .. } => format!("List(elts=[{}])", dump_list(elts)),
            Expr::Set { elts, .. } => format!("Set(elts=[{}])", dump_list(elts)),
            Expr::Dict { keys, values, .. } => {
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| k.as_ref().map(|k| k.dump()).unwrap_or_else(|| "None".to_string()))
                    .collect();
                format!("Dict(keys=[{}], values=[{}])", keys.join(", "), dump_list(values))
            }
            Expr::Await { value, .. } => format!("Await(value={})", value.dump()),
            Expr::Yield { value, .. } => match value {
                Some(v) => format!("Yield(value={})", v.dump()),
                None => "Yield()".to_string(),
            },
            Expr::YieldFrom { value, .. } => format!("YieldFrom(value={})", value.dump()),
            Expr::Starred { value, .. } => format!("Starred(value={})", value.dump()),
            Expr::NamedExpr { target, value, .. } => {
                format!("NamedExpr(target={}, value={})", target.dump(), value.dump())
            }
            Expr::Comprehension { .. } | Expr::Lambda { .. } | Expr::Other { .. } => {
                format!("{}()", self.kind_name())
            }
        }
    }
}

fn dump_list(exprs: &[Expr]) -> String {
    exprs.iter().map(Expr::dump).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_call() {
        let call = Expr::Call {
            func: Box::new(Expr::name("helper", 1)),
            args: vec![Expr::name("b", 1)],
            keywords: vec![Keyword {
                arg: Some("k".to_string()),
                value: Expr::Constant {
                    value: Constant::Number("1".to_string()),
                    line: 1,
                },
            }],
            line: 1,
        };
        assert_eq!(
            call.dump(),
            "Call(func=Name(id='helper'), args=[Name(id='b')], keywords=[keyword(arg='k', value=Constant(value=1))])"
        );
    }

    #[test]
    fn test_value_link_follows_attribute_and_subscript() {
        let base = Expr::name("a", 1);
        let attr = Expr::Attribute {
            value: Box::new(base.clone()),
            attr: "b".to_string(),
            line: 1,
        };
        assert_eq!(attr.value_link(), Some(&base));
        assert!(base.value_link().is_none());
    }

    #[test]
    fn test_kind_names() {
        let comp = Expr::Comprehension {
            kind: ComprehensionKind::List,
            line: 3,
        };
        assert_eq!(comp.kind_name(), "ListComp");
        assert_eq!(comp.line(), 3);
        let stmt = Stmt::Other {
            kind: "Pass".to_string(),
            line: 1,
        };
        assert_eq!(stmt.kind_name(), "Pass");
    }

    #[test]
    fn test_try_blocks_include_handlers() {
        let stmt = Stmt::Try {
            body: vec![Stmt::Other { kind: "Pass".into(), line: 2 }],
            handlers: vec![ExceptHandler {
                kind: None,
                name: None,
                body: vec![Stmt::Other { kind: "Pass".into(), line: 4 }],
                line: 3,
            }],
            orelse: Vec::new(),
            finalbody: Vec::new(),
            line: 1,
        };
        let blocks = stmt.blocks();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1][0].line(), 4);
    }
}
