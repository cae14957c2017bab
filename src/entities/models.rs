use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::syntax::Constant;

/// Owner token used when a qualified call's receiver has no static name.
pub const UNKNOWN_OWNER: &str = "unknown";

// =====================================================
// Primitive references
// =====================================================

/// One element of an extracted expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    /// A bare name token.
    Name(String),
    /// `receiver.attr`
    Attribute { owner: Receiver, attr: String },
    Call(Call),
    /// A conditional expression (`x if cond else y`).
    Logic(LogicStatement<Reference>),
    /// Node kind that is not modelled further (e.g. `Compare`, `Constant`).
    Unmodeled(String),
}

/// Receiver side of an attribute reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    One(Box<Reference>),
    Many(Vec<Reference>),
    /// The receiver is a call that cannot be resolved statically.
    Absent,
}

impl Reference {
    pub fn name(name: impl Into<String>) -> Self {
        Reference::Name(name.into())
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Reference::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Reference::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn has_call(&self) -> bool {
        match self {
            Reference::Call(_) => true,
            Reference::Attribute { owner, .. } => match owner {
                Receiver::One(r) => r.has_call(),
                Receiver::Many(rs) => rs.iter().any(Reference::has_call),
                Receiver::Absent => false,
            },
            Reference::Logic(logic) => logic.has_call(),
            Reference::Name(_) | Reference::Unmodeled(_) => false,
        }
    }
}

// =====================================================
// Statement-level entities
// =====================================================

/// One statement-level element of a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Call(Call),
    Variable(Variable),
    Logic(LogicStatement<Entity>),
}

impl Entity {
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Entity::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Entity::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    pub fn as_logic(&self) -> Option<&LogicStatement<Entity>> {
        match self {
            Entity::Logic(logic) => Some(logic),
            _ => None,
        }
    }

    /// Whether this entity or anything nested inside it is a call.
    pub fn has_call(&self) -> bool {
        match self {
            Entity::Call(_) => true,
            Entity::Variable(variable) => variable.points_to.iter().any(Reference::has_call),
            Entity::Logic(logic) => logic.has_call(),
        }
    }

    /// Number of entities in this subtree, including itself.
    pub fn count(&self) -> usize {
        match self {
            Entity::Logic(logic) => {
                1 + logic.process.iter().map(Entity::count).sum::<usize>()
                    + logic
                        .else_branch
                        .iter()
                        .flatten()
                        .map(Entity::count)
                        .sum::<usize>()
            }
            _ => 1,
        }
    }
}

/// Items that can appear in a [`LogicStatement`] body.
pub trait LogicItem {
    fn has_call(&self) -> bool;
}

impl LogicItem for Entity {
    fn has_call(&self) -> bool {
        Entity::has_call(self)
    }
}

impl LogicItem for Reference {
    fn has_call(&self) -> bool {
        Reference::has_call(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    #[serde(rename = "if")]
    If,
    #[serde(rename = "try")]
    Try,
    #[serde(rename = "while")]
    While,
    #[serde(rename = "ifExp")]
    IfExp,
}

impl ConditionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::If => "if",
            ConditionKind::Try => "try",
            ConditionKind::While => "while",
            ConditionKind::IfExp => "ifExp",
        }
    }
}

/// A control-flow construct. `T` is [`Entity`] for statement blocks and
/// [`Reference`] for conditional expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicStatement<T> {
    pub kind: ConditionKind,
    /// Absent for exception guards.
    pub condition: Option<Vec<Reference>>,
    pub process: Vec<T>,
    pub else_branch: Option<Vec<T>>,
    pub line: usize,
}

impl<T: LogicItem> LogicStatement<T> {
    pub fn has_call(&self) -> bool {
        self.condition.iter().flatten().any(Reference::has_call)
            || self.process.iter().any(LogicItem::has_call)
            || self.else_branch.iter().flatten().any(LogicItem::has_call)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub line: usize,
    /// Dotted receiver path, [`UNKNOWN_OWNER`], or `None` for unqualified calls.
    pub owner: Option<String>,
    pub taken_var: Vec<Reference>,
}

impl Call {
    pub fn is_qualified(&self) -> bool {
        self.owner.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Name(String),
    Attribute {
        owner: String,
        attr: String,
    },
    Subscript {
        base: Vec<Reference>,
        index: Option<Vec<Reference>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub targets: Vec<Target>,
    pub points_to: Vec<Reference>,
    pub line: usize,
}

impl Variable {
    pub fn target_names(&self) -> Vec<&str> {
        self.targets
            .iter()
            .filter_map(|t| match t {
                Target::Name(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

// =====================================================
// Declarations
// =====================================================

/// Descriptor of a returned value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    Name(String),
    Constant(Constant),
    /// Structural dump of an expression that is not decomposed.
    Opaque(String),
    Group(Vec<Output>),
    /// `(base, index)` of a subscript or `(key, value)` of a mapping entry.
    Pair(Vec<Output>, Vec<Output>),
    BinOp(Vec<Output>, Vec<Output>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<Output>,
    pub process: Vec<Entity>,
    #[serde(default)]
    pub is_async: bool,
}

impl Function {
    pub fn calls(&self) -> Vec<&Call> {
        self.process.iter().filter_map(Entity::as_call).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub line: usize,
    pub superclasses: Vec<String>,
    pub methods: Vec<Function>,
    pub attributes: Vec<String>,
}

impl Class {
    pub fn method(&self, name: &str) -> Option<&Function> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn symbols(&self) -> BTreeMap<&str, &Function> {
        self.methods.iter().map(|m| (m.name.as_str(), m)).collect()
    }
}

// =====================================================
// Imports and file
// =====================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedName {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportRecord {
    Resolved {
        path: PathBuf,
        names: Vec<ImportedName>,
    },
    Unresolved {
        module: String,
        names: Vec<ImportedName>,
    },
}

impl ImportRecord {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ImportRecord::Resolved { .. })
    }

    pub fn names(&self) -> &[ImportedName] {
        match self {
            ImportRecord::Resolved { names, .. } | ImportRecord::Unresolved { names, .. } => names,
        }
    }
}

/// Input the extractor recognized but does not model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gap", rename_all = "snake_case")]
pub enum CoverageGap {
    NestedClass {
        class: String,
        name: String,
        line: usize,
    },
}

/// A top-level declaration of a [`File`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymbolRef<'a> {
    Function(&'a Function),
    Class(&'a Class),
}

impl<'a> SymbolRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            SymbolRef::Function(f) => &f.name,
            SymbolRef::Class(c) => &c.name,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            SymbolRef::Function(f) => f.line,
            SymbolRef::Class(c) => c.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub path: PathBuf,
    /// Top-level statements, with the entry-point guard flattened in.
    pub process: Vec<Entity>,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    pub constants: Vec<String>,
    pub imports: Vec<ImportRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<CoverageGap>,
}

impl File {
    /// Functions first, then classes.
    pub fn all_symbols(&self) -> Vec<SymbolRef<'_>> {
        self.functions
            .iter()
            .map(SymbolRef::Function)
            .chain(self.classes.iter().map(SymbolRef::Class))
            .collect()
    }

    /// Top-level symbols by name, optionally restricted to `filter`.
    /// A class shadows a function of the same name.
    pub fn symbols(&self, filter: Option<&[&str]>) -> BTreeMap<&str, SymbolRef<'_>> {
        self.all_symbols()
            .into_iter()
            .filter(|s| filter.map(|names| names.contains(&s.name())).unwrap_or(true))
            .map(|s| (s.name(), s))
            .collect()
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Total statement-level entities across the file, methods included.
    pub fn entity_count(&self) -> usize {
        let count = |process: &[Entity]| process.iter().map(Entity::count).sum::<usize>();
        count(&self.process)
            + self.functions.iter().map(|f| count(&f.process)).sum::<usize>()
            + self
                .classes
                .iter()
                .flat_map(|c| c.methods.iter())
                .map(|m| count(&m.process))
                .sum::<usize>()
    }
}
