//! Lowering of tree-sitter-python concrete trees into the typed [`Module`].
//!
//! Lowering never fails: node kinds without a typed counterpart (including
//! `ERROR` nodes) become `Stmt::Other` / `Expr::Other` carrying the raw kind.

use tree_sitter::Node;

use super::ast::{
    Alias, ClassDef, ComprehensionKind, Constant, EllipsisMarker, ExceptHandler, Expr,
    FunctionDef, Keyword, Module, Parameters, Stmt,
};

pub struct Lowerer<'a> {
    source: &'a [u8],
}

fn line_of(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Named children, skipping comments and other extras.
fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect()
}

fn all_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).filter(|c| !c.is_extra()).collect()
}

fn field_children<'t>(node: &Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn has_child_kind(node: &Node, kind: &str) -> bool {
    all_children(node).iter().any(|c| c.kind() == kind)
}

impl<'a> Lowerer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
        }
    }

    fn text(&self, node: &Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn field_text(&self, node: &Node, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.text(&n).to_string())
    }

    pub fn lower_module(&self, root: &Node) -> Module {
        Module {
            body: self.lower_block(root),
        }
    }

    fn lower_block(&self, node: &Node) -> Vec<Stmt> {
        named_children(node)
            .iter()
            .map(|child| self.lower_stmt(child))
            .collect()
    }

    fn lower_field_block(&self, node: &Node, field: &str) -> Vec<Stmt> {
        node.child_by_field_name(field)
            .map(|n| self.lower_block(&n))
            .unwrap_or_default()
    }

    fn lower_stmt(&self, node: &Node) -> Stmt {
        let line = line_of(node);
        match node.kind() {
            "function_definition" => Stmt::FunctionDef(self.lower_function(node, Vec::new())),
            "class_definition" => Stmt::ClassDef(self.lower_class(node, Vec::new())),
            "decorated_definition" => self.lower_decorated(node),
            "expression_statement" => self.lower_expression_statement(node),
            "return_statement" => Stmt::Return {
                value: self.lower_optional_expr_list(node),
                line,
            },
            "if_statement" => {
                let alternatives = field_children(node, "alternative");
                Stmt::If {
                    test: self.lower_field(node, "condition"),
                    body: self.lower_field_block(node, "consequence"),
                    orelse: self.lower_else_chain(&alternatives),
                    line,
                }
            }
            "while_statement" => Stmt::While {
                test: self.lower_field(node, "condition"),
                body: self.lower_field_block(node, "body"),
                orelse: self.lower_else_clause(node.child_by_field_name("alternative")),
                line,
            },
            "for_statement" => Stmt::For {
                target: self.lower_field(node, "left"),
                iter: self.lower_field(node, "right"),
                body: self.lower_field_block(node, "body"),
                orelse: self.lower_else_clause(node.child_by_field_name("alternative")),
                is_async: has_child_kind(node, "async"),
                line,
            },
            "try_statement" => self.lower_try(node),
            "with_statement" => self.lower_with(node),
            "import_statement" => Stmt::Import {
                names: self.lower_aliases(node),
                line,
            },
            "import_from_statement" => self.lower_import_from(node),
            "future_import_statement" => Stmt::ImportFrom {
                module: Some("__future__".to_string()),
                names: self.lower_aliases(node),
                level: 0,
                line,
            },
            kind => Stmt::Other {
                kind: statement_kind_name(kind),
                line,
            },
        }
    }

    fn lower_decorated(&self, node: &Node) -> Stmt {
        let decorators: Vec<Expr> = named_children(node)
            .iter()
            .filter(|c| c.kind() == "decorator")
            .filter_map(|d| named_children(d).first().map(|e| self.lower_expr(e)))
            .collect();

        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "function_definition" => {
                Stmt::FunctionDef(self.lower_function(&def, decorators))
            }
            Some(def) if def.kind() == "class_definition" => {
                Stmt::ClassDef(self.lower_class(&def, decorators))
            }
            _ => Stmt::Other {
                kind: "ERROR".to_string(),
                line: line_of(node),
            },
        }
    }

    fn lower_function(&self, node: &Node, decorators: Vec<Expr>) -> FunctionDef {
        FunctionDef {
            name: self.field_text(node, "name").unwrap_or_default(),
            params: node
                .child_by_field_name("parameters")
                .map(|p| self.lower_parameters(&p))
                .unwrap_or_default(),
            body: self.lower_field_block(node, "body"),
            decorators,
            is_async: has_child_kind(node, "async"),
            line: line_of(node),
        }
    }

    fn lower_parameters(&self, node: &Node) -> Parameters {
        let mut params = Parameters::default();
        let mut keyword_only = false;

        for child in named_children(node) {
            let mut param = child;
            // `*args: T` / `**kw: T` arrive wrapped in a typed_parameter
            if param.kind() == "typed_parameter" {
                if let Some(inner) = named_children(&param).first() {
                    if inner.kind() != "identifier" {
                        param = *inner;
                    }
                }
            }

            match param.kind() {
                "list_splat_pattern" => {
                    params.vararg = named_children(&param).first().map(|n| self.text(n).to_string());
                    keyword_only = true;
                }
                "dictionary_splat_pattern" => {
                    params.kwarg = named_children(&param).first().map(|n| self.text(n).to_string());
                }
                "keyword_separator" => keyword_only = true,
                "positional_separator" => params.posonly.append(&mut params.args),
                kind => {
                    let name = match kind {
                        "identifier" => Some(self.text(&param).to_string()),
                        "typed_parameter" => named_children(&param)
                            .first()
                            .map(|n| self.text(n).to_string()),
                        "default_parameter" | "typed_default_parameter" => {
                            self.field_text(&param, "name")
                        }
                        _ => None,
                    };
                    if let Some(name) = name {
                        if keyword_only {
                            params.kwonly.push(name);
                        } else {
                            params.args.push(name);
                        }
                    }
                }
            }
        }

        params
    }

    fn lower_class(&self, node: &Node, decorators: Vec<Expr>) -> ClassDef {
        let mut bases = Vec::new();
        let mut keywords = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            for arg in named_children(&superclasses) {
                match arg.kind() {
                    "keyword_argument" => keywords.push(Keyword {
                        arg: self.field_text(&arg, "name"),
                        value: self.lower_field(&arg, "value"),
                    }),
                    _ => bases.push(self.lower_expr(&arg)),
                }
            }
        }

        ClassDef {
            name: self.field_text(node, "name").unwrap_or_default(),
            bases,
            keywords,
            body: self.lower_field_block(node, "body"),
            decorators,
            line: line_of(node),
        }
    }

    fn lower_expression_statement(&self, node: &Node) -> Stmt {
        let line = line_of(node);
        let children = named_children(node);
        if children.len() == 1 {
            let child = &children[0];
            match child.kind() {
                "assignment" => return self.lower_assignment(child),
                "augmented_assignment" => {
                    return Stmt::AugAssign {
                        target: self.lower_field(child, "left"),
                        op: self.field_text(child, "operator").unwrap_or_default(),
                        value: self.lower_field(child, "right"),
                        line: line_of(child),
                    }
                }
                _ => {
                    return Stmt::Expr {
                        value: self.lower_expr(child),
                        line,
                    }
                }
            }
        }

        Stmt::Expr {
            value: Expr::Tuple {
                elts: children.iter().map(|c| self.lower_expr(c)).collect(),
                line,
            },
            line,
        }
    }

    fn lower_assignment(&self, node: &Node) -> Stmt {
        let line = line_of(node);
        let target = self.lower_field(node, "left");

        if let Some(annotation) = node.child_by_field_name("type") {
            return Stmt::AnnAssign {
                target,
                annotation: self.lower_expr(&annotation),
                value: node.child_by_field_name("right").map(|r| self.lower_expr(&r)),
                line,
            };
        }

        // `a = b = value` nests assignments on the right-hand side
        let mut targets = vec![target];
        let mut right = node.child_by_field_name("right");
        while let Some(r) = right {
            if r.kind() != "assignment" {
                break;
            }
            targets.push(self.lower_field(&r, "left"));
            right = r.child_by_field_name("right");
        }

        Stmt::Assign {
            targets,
            value: match right {
                Some(r) => self.lower_expr(&r),
                None => Expr::Other {
                    kind: "ERROR".to_string(),
                    line,
                },
            },
            line,
        }
    }

    fn lower_else_chain(&self, alternatives: &[Node]) -> Vec<Stmt> {
        let Some((first, rest)) = alternatives.split_first() else {
            return Vec::new();
        };
        match first.kind() {
            "elif_clause" => vec![Stmt::If {
                test: self.lower_field(first, "condition"),
                body: self.lower_field_block(first, "consequence"),
                orelse: self.lower_else_chain(rest),
                line: line_of(first),
            }],
            _ => self.lower_else_clause(Some(*first)),
        }
    }

    fn lower_else_clause(&self, clause: Option<Node>) -> Vec<Stmt> {
        clause
            .map(|c| self.lower_field_block(&c, "body"))
            .unwrap_or_default()
    }

    fn lower_try(&self, node: &Node) -> Stmt {
        let mut handlers = Vec::new();
        let mut orelse = Vec::new();
        let mut finalbody = Vec::new();

        for child in named_children(node) {
            match child.kind() {
                "except_clause" | "except_group_clause" => handlers.push(self.lower_handler(&child)),
                "else_clause" => orelse = self.lower_field_block(&child, "body"),
                "finally_clause" => {
                    finalbody = named_children(&child)
                        .iter()
                        .find(|c| c.kind() == "block")
                        .map(|b| self.lower_block(b))
                        .unwrap_or_default();
                }
                _ => {}
            }
        }

        Stmt::Try {
            body: self.lower_field_block(node, "body"),
            handlers,
            orelse,
            finalbody,
            line: line_of(node),
        }
    }

    fn lower_handler(&self, node: &Node) -> ExceptHandler {
        let children = named_children(node);
        let body = children
            .iter()
            .find(|c| c.kind() == "block")
            .map(|b| self.lower_block(b))
            .unwrap_or_default();
        let header: Vec<&Node> = children.iter().filter(|c| c.kind() != "block").collect();

        let (kind, name) = match header.as_slice() {
            [pattern] if pattern.kind() == "as_pattern" => {
                let parts = named_children(pattern);
                (
                    parts.first().map(|k| self.lower_expr(k)),
                    parts.get(1).map(|a| self.text(a).to_string()),
                )
            }
            [kind] => (Some(self.lower_expr(kind)), None),
            [kind, alias, ..] => (Some(self.lower_expr(kind)), Some(self.text(alias).to_string())),
            [] => (None, None),
        };

        ExceptHandler {
            kind,
            name,
            body,
            line: line_of(node),
        }
    }

    fn lower_with(&self, node: &Node) -> Stmt {
        let mut items = Vec::new();
        for clause in named_children(node).iter().filter(|c| c.kind() == "with_clause") {
            for item in named_children(clause) {
                if let Some(value) = item.child_by_field_name("value") {
                    items.push(self.lower_expr(&value));
                }
            }
        }

        Stmt::With {
            items,
            body: self.lower_field_block(node, "body"),
            is_async: has_child_kind(node, "async"),
            line: line_of(node),
        }
    }

    fn lower_aliases(&self, node: &Node) -> Vec<Alias> {
        field_children(node, "name")
            .iter()
            .map(|name| match name.kind() {
                "aliased_import" => Alias {
                    name: self.field_text(name, "name").unwrap_or_default(),
                    asname: self.field_text(name, "alias"),
                },
                _ => Alias {
                    name: self.text(name).to_string(),
                    asname: None,
                },
            })
            .collect()
    }

    fn lower_import_from(&self, node: &Node) -> Stmt {
        let (module, level) = match node.child_by_field_name("module_name") {
            Some(m) if m.kind() == "relative_import" => {
                let mut level = 0;
                let mut module = None;
                for part in named_children(&m) {
                    match part.kind() {
                        "import_prefix" => level = self.text(&part).chars().filter(|c| *c == '.').count(),
                        _ => module = Some(self.text(&part).to_string()),
                    }
                }
                (module, level)
            }
            Some(m) => (Some(self.text(&m).to_string()), 0),
            None => (None, 0),
        };

        let mut names = self.lower_aliases(node);
        if has_child_kind(node, "wildcard_import") {
            names.push(Alias {
                name: "*".to_string(),
                asname: None,
            });
        }

        Stmt::ImportFrom {
            module,
            names,
            level,
            line: line_of(node),
        }
    }

    fn lower_field(&self, node: &Node, field: &str) -> Expr {
        match node.child_by_field_name(field) {
            Some(child) => self.lower_expr(&child),
            None => Expr::Other {
                kind: "ERROR".to_string(),
                line: line_of(node),
            },
        }
    }

    fn lower_optional_expr_list(&self, node: &Node) -> Option<Expr> {
        named_children(node).first().map(|e| self.lower_expr(e))
    }

    fn lower_all(&self, node: &Node) -> Vec<Expr> {
        named_children(node)
            .iter()
            .map(|c| self.lower_expr(c))
            .collect()
    }

    fn lower_first(&self, node: &Node) -> Expr {
        match named_children(node).first() {
            Some(child) => self.lower_expr(child),
            None => Expr::Other {
                kind: "ERROR".to_string(),
                line: line_of(node),
            },
        }
    }

    pub fn lower_expr(&self, node: &Node) -> Expr {
        let line = line_of(node);
        match node.kind() {
            "identifier" | "keyword_identifier" => Expr::Name {
                id: self.text(node).to_string(),
                line,
            },
            "attribute" => Expr::Attribute {
                value: Box::new(self.lower_field(node, "object")),
                attr: self.field_text(node, "attribute").unwrap_or_default(),
                line,
            },
            "call" => self.lower_call(node),
            "binary_operator" => Expr::BinOp {
                left: Box::new(self.lower_field(node, "left")),
                op: self.field_text(node, "operator").unwrap_or_default(),
                right: Box::new(self.lower_field(node, "right")),
                line,
            },
            "unary_operator" => Expr::UnaryOp {
                op: self.field_text(node, "operator").unwrap_or_default(),
                operand: Box::new(self.lower_field(node, "argument")),
                line,
            },
            "not_operator" => Expr::UnaryOp {
                op: "not".to_string(),
                operand: Box::new(self.lower_field(node, "argument")),
                line,
            },
            "boolean_operator" => self.lower_boolean(node),
            "comparison_operator" => {
                let mut operands = self.lower_all(node).into_iter();
                let left = operands.next().unwrap_or(Expr::Other {
                    kind: "ERROR".to_string(),
                    line,
                });
                let ops = field_children(node, "operators")
                    .iter()
                    .map(|op| self.text(op).split_whitespace().collect::<Vec<_>>().join(" "))
                    .collect();
                Expr::Compare {
                    left: Box::new(left),
                    ops,
                    comparators: operands.collect(),
                    line,
                }
            }
            "conditional_expression" => {
                let mut parts = self.lower_all(node).into_iter();
                let mut next = || {
                    parts.next().unwrap_or(Expr::Other {
                        kind: "ERROR".to_string(),
                        line,
                    })
                };
                let body = next();
                let test = next();
                let orelse = next();
                Expr::IfExp {
                    test: Box::new(test),
                    body: Box::new(body),
                    orelse: Box::new(orelse),
                    line,
                }
            }
            "subscript" => {
                let mut indices: Vec<Expr> = field_children(node, "subscript")
                    .iter()
                    .map(|s| self.lower_expr(s))
                    .collect();
                let slice = if indices.len() == 1 {
                    indices.remove(0)
                } else {
                    Expr::Tuple { elts: indices, line }
                };
                Expr::Subscript {
                    value: Box::new(self.lower_field(node, "value")),
                    slice: Box::new(slice),
                    line,
                }
            }
            "slice" => self.lower_slice(node),
            "string" => self.lower_string(node),
            "concatenated_string" => self.lower_concatenated(node),
            "integer" | "float" => Expr::Constant {
                value: Constant::Number(self.text(node).to_string()),
                line,
            },
            "true" => Expr::Constant {
                value: Constant::Bool(true),
                line,
            },
            "false" => Expr::Constant {
                value: Constant::Bool(false),
                line,
            },
            "none" => Expr::Constant {
                value: Constant::None,
                line,
            },
            "ellipsis" => Expr::Constant {
                value: Constant::Ellipsis(EllipsisMarker::Ellipsis),
                line,
            },
            "tuple" | "expression_list" | "pattern_list" | "tuple_pattern" => Expr::Tuple {
                elts: self.lower_all(node),
                line,
            },
            "list" | "list_pattern" => Expr::List {
                elts: self.lower_all(node),
                line,
            },
            "set" => Expr::Set {
                elts: self.lower_all(node),
                line,
            },
            "dictionary" => self.lower_dictionary(node),
            "list_comprehension" => Expr::Comprehension {
                kind: ComprehensionKind::List,
                line,
            },
            "set_comprehension" => Expr::Comprehension {
                kind: ComprehensionKind::Set,
                line,
            },
            "dictionary_comprehension" => Expr::Comprehension {
                kind: ComprehensionKind::Dict,
                line,
            },
            "generator_expression" => Expr::Comprehension {
                kind: ComprehensionKind::Generator,
                line,
            },
            "lambda" => Expr::Lambda { line },
            "await" => Expr::Await {
                value: Box::new(self.lower_first(node)),
                line,
            },
            "yield" => {
                let value = named_children(node).first().map(|v| Box::new(self.lower_expr(v)));
                match (has_child_kind(node, "from"), value) {
                    (true, Some(value)) => Expr::YieldFrom { value, line },
                    (_, value) => Expr::Yield { value, line },
                }
            }
            "list_splat" | "list_splat_pattern" | "dictionary_splat" => Expr::Starred {
                value: Box::new(self.lower_first(node)),
                line,
            },
            "named_expression" => Expr::NamedExpr {
                target: Box::new(self.lower_field(node, "name")),
                value: Box::new(self.lower_field(node, "value")),
                line,
            },
            "parenthesized_expression" | "as_pattern" | "type" => self.lower_first(node),
            kind => Expr::Other {
                kind: kind.to_string(),
                line,
            },
        }
    }

    fn lower_call(&self, node: &Node) -> Expr {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        if let Some(arguments) = node.child_by_field_name("arguments") {
            if arguments.kind() == "generator_expression" {
                args.push(self.lower_expr(&arguments));
            } else {
                for arg in named_children(&arguments) {
                    match arg.kind() {
                        "keyword_argument" => keywords.push(Keyword {
                            arg: self.field_text(&arg, "name"),
                            value: self.lower_field(&arg, "value"),
                        }),
                        "dictionary_splat" => keywords.push(Keyword {
                            arg: None,
                            value: self.lower_first(&arg),
                        }),
                        _ => args.push(self.lower_expr(&arg)),
                    }
                }
            }
        }

        Expr::Call {
            func: Box::new(self.lower_field(node, "function")),
            args,
            keywords,
            line: line_of(node),
        }
    }

    fn lower_boolean(&self, node: &Node) -> Expr {
        let op = self.field_text(node, "operator").unwrap_or_default();
        let mut values = Vec::new();
        for side in ["left", "right"] {
            match self.lower_field(node, side) {
                // `a and b and c` is one BoolOp with three values
                Expr::BoolOp {
                    op: inner_op,
                    values: inner,
                    ..
                } if inner_op == op && side == "left" => values.extend(inner),
                other => values.push(other),
            }
        }
        Expr::BoolOp {
            op,
            values,
            line: line_of(node),
        }
    }

    fn lower_slice(&self, node: &Node) -> Expr {
        let mut parts: [Option<Box<Expr>>; 3] = [None, None, None];
        let mut index = 0;
        for child in all_children(node) {
            if child.kind() == ":" {
                index += 1;
            } else if child.is_named() && index < parts.len() {
                parts[index] = Some(Box::new(self.lower_expr(&child)));
            }
        }
        let [lower, upper, step] = parts;
        Expr::Slice {
            lower,
            upper,
            step,
            line: line_of(node),
        }
    }

    fn string_prefix(&self, node: &Node) -> String {
        all_children(node)
            .iter()
            .find(|c| c.kind() == "string_start")
            .map(|s| {
                self.text(s)
                    .chars()
                    .take_while(|c| c.is_ascii_alphabetic())
                    .collect::<String>()
                    .to_ascii_lowercase()
            })
            .unwrap_or_default()
    }

    /// Text and interpolation segments of a single string literal.
    fn string_segments(&self, node: &Node) -> Vec<Expr> {
        let line = line_of(node);
        let mut segments = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "string_content" => segments.push(Expr::Constant {
                    value: Constant::Str(self.text(&child).to_string()),
                    line,
                }),
                "interpolation" => {
                    let value = match child.child_by_field_name("expression") {
                        Some(expr) => self.lower_expr(&expr),
                        None => self.lower_first(&child),
                    };
                    segments.push(Expr::FormattedValue {
                        value: Box::new(value),
                        line: line_of(&child),
                    });
                }
                _ => {}
            }
        }
        segments
    }

    fn plain_text(segments: &[Expr]) -> String {
        segments
            .iter()
            .filter_map(|s| match s {
                Expr::Constant {
                    value: Constant::Str(text),
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn lower_string(&self, node: &Node) -> Expr {
        let line = line_of(node);
        let prefix = self.string_prefix(node);
        let segments = self.string_segments(node);
        if prefix.contains('f') {
            Expr::JoinedStr {
                values: segments,
                line,
            }
        } else if prefix.contains('b') {
            Expr::Constant {
                value: Constant::Bytes(Self::plain_text(&segments).into_bytes()),
                line,
            }
        } else {
            Expr::Constant {
                value: Constant::Str(Self::plain_text(&segments)),
                line,
            }
        }
    }

    fn lower_concatenated(&self, node: &Node) -> Expr {
        let line = line_of(node);
        let parts: Vec<Node> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "string")
            .collect();
        let any_formatted = parts.iter().any(|p| self.string_prefix(p).contains('f'));
        let segments: Vec<Expr> = parts.iter().flat_map(|p| self.string_segments(p)).collect();

        if any_formatted {
            Expr::JoinedStr {
                values: segments,
                line,
            }
        } else {
            Expr::Constant {
                value: Constant::Str(Self::plain_text(&segments)),
                line,
            }
        }
    }

    fn lower_dictionary(&self, node: &Node) -> Expr {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for entry in named_children(node) {
            match entry.kind() {
                "pair" => {
                    keys.push(Some(self.lower_field(&entry, "key")));
                    values.push(self.lower_field(&entry, "value"));
                }
                "dictionary_splat" => {
                    keys.push(None);
                    values.push(self.lower_first(&entry));
                }
                _ => {}
            }
        }
        Expr::Dict {
            keys,
            values,
            line: line_of(node),
        }
    }
}

fn statement_kind_name(kind: &str) -> String {
    match kind {
        "pass_statement" => "Pass",
        "break_statement" => "Break",
        "continue_statement" => "Continue",
        "raise_statement" => "Raise",
        "assert_statement" => "Assert",
        "global_statement" => "Global",
        "nonlocal_statement" => "Nonlocal",
        "delete_statement" => "Delete",
        "match_statement" => "Match",
        "type_alias_statement" => "TypeAlias",
        other => other,
    }
    .to_string()
}
