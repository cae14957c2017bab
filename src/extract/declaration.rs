//! Function and class entities.

use crate::config::ExtractorConfig;
use crate::entities::{Class, CoverageGap, Function, Output};
use crate::error::Result;
use crate::syntax::{ClassDef, Constant, Expr, FunctionDef, Stmt};

use super::statement::StatementWalker;

pub struct DeclarationBuilder<'a> {
    config: &'a ExtractorConfig,
    walker: StatementWalker<'a>,
}

impl<'a> DeclarationBuilder<'a> {
    pub fn new(config: &'a ExtractorConfig) -> Self {
        Self {
            config,
            walker: StatementWalker::new(config),
        }
    }

    pub fn build_function(&self, def: &FunctionDef) -> Result<Function> {
        let mut inputs = def.params.args.clone();
        inputs.extend(def.params.kwarg.iter().cloned());

        Ok(Function {
            name: def.name.clone(),
            line: def.line,
            docstring: docstring(&def.body),
            inputs,
            outputs: function_outputs(&def.body),
            process: self.walker.walk(&def.body, false)?,
            is_async: def.is_async,
        })
    }

    /// Builds a class and reports nested class declarations as coverage gaps.
    pub fn build_class(&self, def: &ClassDef) -> Result<(Class, Vec<CoverageGap>)> {
        let mut methods = Vec::new();
        let mut attributes = Vec::new();
        let mut gaps = Vec::new();

        for stmt in &def.body {
            match stmt {
                Stmt::FunctionDef(method) if self.config.is_constructor(&method.name) => {
                    self.collect_attributes(&method.body, &mut attributes);
                }
                Stmt::FunctionDef(method) => methods.push(self.build_function(method)?),
                Stmt::ClassDef(nested) => {
                    tracing::warn!(
                        "Nested class '{}' in '{}' (line {}) is not extracted",
                        nested.name,
                        def.name,
                        nested.line
                    );
                    gaps.push(CoverageGap::NestedClass {
                        class: def.name.clone(),
                        name: nested.name.clone(),
                        line: nested.line,
                    });
                }
                _ => {}
            }
        }

        let superclasses = def
            .bases
            .iter()
            .filter_map(|base| match base {
                Expr::Name { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect();

        let class = Class {
            name: def.name.clone(),
            line: def.line,
            superclasses,
            methods,
            attributes,
        };
        Ok((class, gaps))
    }

    /// `self.<attr> = ...` assignments anywhere in a constructor body.
    fn collect_attributes(&self, body: &[Stmt], attributes: &mut Vec<String>) {
        for stmt in body {
            if let Stmt::Assign { targets, .. } = stmt {
                for target in targets {
                    if let Expr::Attribute { value, attr, .. } = target {
                        let on_self =
                            matches!(value.as_ref(), Expr::Name { id, .. } if *id == self.config.self_name);
                        if on_self && !attributes.contains(attr) {
                            attributes.push(attr.clone());
                        }
                    }
                }
            }
            for block in stmt.blocks() {
                self.collect_attributes(block, attributes);
            }
        }
    }
}

/// Output descriptors of the `return` statements directly in `body`.
pub fn function_outputs(body: &[Stmt]) -> Vec<Output> {
    let mut outputs = Vec::new();
    for stmt in body {
        if let Stmt::Return { value: Some(value), .. } = stmt {
            for output in extract_outputs(value) {
                match output {
                    Output::Group(items) => outputs.extend(items),
                    other => outputs.push(other),
                }
            }
        }
    }
    outputs
}

fn extract_outputs(expr: &Expr) -> Vec<Output> {
    match expr {
        Expr::Name { id, .. } => vec![Output::Name(id.clone())],
        Expr::Tuple { elts, .. } => elts.iter().map(|e| Output::Group(extract_outputs(e))).collect(),
        Expr::Subscript { value, slice, .. } => {
            vec![Output::Pair(extract_outputs(value), extract_outputs(slice))]
        }
        Expr::Dict { keys, values, .. } => keys
            .iter()
            .zip(values)
            .map(|(key, value)| {
                let key = key.as_ref().map(extract_outputs).unwrap_or_default();
                Output::Pair(key, extract_outputs(value))
            })
            .collect(),
        Expr::BoolOp { values, .. } => values.iter().map(|v| Output::Group(extract_outputs(v))).collect(),
        Expr::Constant { value, .. } => vec![Output::Constant(value.clone())],
        Expr::BinOp { left, right, .. } => {
            vec![Output::BinOp(extract_outputs(left), extract_outputs(right))]
        }
        other => vec![Output::Opaque(other.dump())],
    }
}

/// The leading string literal of a body, with indentation cleaned.
pub fn docstring(body: &[Stmt]) -> Option<String> {
    match body.first() {
        Some(Stmt::Expr {
            value:
                Expr::Constant {
                    value: Constant::Str(text),
                    ..
                },
            ..
        }) => Some(clean_doc(text)),
        _ => None,
    }
}

fn clean_doc(text: &str) -> String {
    let expanded = text.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let margin = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned = vec![first.trim_start().to_string()];
    cleaned.extend(rest.iter().map(|l| l.get(margin..).unwrap_or("").trim_end().to_string()));

    let start = cleaned.iter().position(|l| !l.is_empty()).unwrap_or(cleaned.len());
    let end = cleaned.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    cleaned[start..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Reference;
    use crate::indexer::Parser;

    fn first_stmt(source: &str) -> Stmt {
        let module = Parser::default().parse_python(source).unwrap().module();
        module.body.into_iter().next().unwrap()
    }

    fn function(source: &str) -> Function {
        let Stmt::FunctionDef(def) = first_stmt(source) else {
            panic!("expected function");
        };
        DeclarationBuilder::new(&ExtractorConfig::default())
            .build_function(&def)
            .unwrap()
    }

    fn class(source: &str) -> (Class, Vec<CoverageGap>) {
        let Stmt::ClassDef(def) = first_stmt(source) else {
            panic!("expected class");
        };
        DeclarationBuilder::new(&ExtractorConfig::default())
            .build_class(&def)
            .unwrap()
    }

    #[test]
    fn test_function_with_binop_return() {
        let f = function("def f(a, b):\n    return a + helper(b)\n");
        assert_eq!(f.inputs, vec!["a", "b"]);
        assert_eq!(f.process.len(), 1);
        let call = f.process[0].as_call().unwrap();
        assert_eq!(call.name, "helper");
        assert_eq!(call.taken_var, vec![Reference::name("b")]);
        assert_eq!(
            f.outputs,
            vec![Output::BinOp(
                vec![Output::Name("a".into())],
                vec![Output::Opaque(
                    "Call(func=Name(id='helper'), args=[Name(id='b')], keywords=[])".into()
                )],
            )]
        );
    }

    #[test]
    fn test_inputs_include_kwargs_only() {
        let f = function("def f(a, *args, b, **kw):\n    pass\n");
        assert_eq!(f.inputs, vec!["a", "kw"]);
    }

    #[test]
    fn test_tuple_and_boolop_outputs_are_flattened() {
        let f = function("def f(a, b):\n    if a:\n        return b\n    return a, b\n");
        assert_eq!(f.outputs, vec![Output::Name("a".into()), Output::Name("b".into())]);

        let f = function("def f(a, b):\n    return a or b\n");
        assert_eq!(f.outputs, vec![Output::Name("a".into()), Output::Name("b".into())]);
    }

    #[test]
    fn test_subscript_dict_and_constant_outputs() {
        let f = function("def f(d, k):\n    return d[k]\n");
        assert_eq!(
            f.outputs,
            vec![Output::Pair(vec![Output::Name("d".into())], vec![Output::Name("k".into())])]
        );

        let f = function("def f(v, extra):\n    return {'key': v, **extra}\n");
        assert_eq!(f.outputs.len(), 2);
        assert!(matches!(&f.outputs[1], Output::Pair(key, _) if key.is_empty()));

        let f = function("def f():\n    return None\n");
        assert_eq!(f.outputs, vec![Output::Constant(Constant::None)]);
    }

    #[test]
    fn test_bare_return_has_no_output() {
        let f = function("def f():\n    return\n");
        assert!(f.outputs.is_empty());
    }

    #[test]
    fn test_docstring_is_cleaned() {
        let f = function("def f():\n    \"\"\"Summary.\n\n        Details here.\n    \"\"\"\n    run()\n");
        assert_eq!(f.docstring.as_deref(), Some("Summary.\n\nDetails here."));
        assert_eq!(f.process.len(), 1);

        let f = function("def f():\n    run()\n");
        assert!(f.docstring.is_none());
    }

    #[test]
    fn test_async_function() {
        let f = function("async def fetch(url):\n    await get(url)\n");
        assert!(f.is_async);
        assert!(f.process.is_empty());
    }

    #[test]
    fn test_class_attributes_from_constructor() {
        let (c, gaps) = class(
            "class Point(Base, mod.Mixin):\n    def __init__(self):\n        self.x = 1\n        if flag:\n            self.y = f()\n        self.x = 2\n\n    def norm(self):\n        return self.x\n",
        );
        assert!(gaps.is_empty());
        assert_eq!(c.name, "Point");
        assert_eq!(c.superclasses, vec!["Base"]);
        assert_eq!(c.attributes, vec!["x", "y"]);
        assert_eq!(c.methods.len(), 1);
        assert!(c.method("__init__").is_none());
        assert_eq!(c.symbols().keys().copied().collect::<Vec<_>>(), vec!["norm"]);
    }

    #[test]
    fn test_both_constructors_feed_attributes() {
        let (c, _) = class(
            "class A:\n    def __new__(cls):\n        self.a = 1\n    def __init__(self):\n        self.b = 2\n        other.c = 3\n",
        );
        assert_eq!(c.attributes, vec!["a", "b"]);
        assert!(c.methods.is_empty());
    }

    #[test]
    fn test_nested_class_is_a_gap() {
        let (c, gaps) = class("class Outer:\n    class Inner:\n        pass\n    def m(self):\n        run()\n");
        assert_eq!(
            gaps,
            vec![CoverageGap::NestedClass {
                class: "Outer".into(),
                name: "Inner".into(),
                line: 2
            }]
        );
        assert_eq!(c.methods[0].process[0].as_call().unwrap().name, "run");
    }

    #[test]
    fn test_method_process_uses_walker() {
        let (c, _) = class("class A:\n    def m(self, v):\n        self.v = v\n");
        let var = c.methods[0].process[0].as_variable().unwrap();
        assert_eq!(var.points_to, vec![Reference::name("v")]);
    }
}
