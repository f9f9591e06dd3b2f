//! Typed structural model of a playbook.
//!
//! Every node carries its source position plus the formatting metadata the
//! style rules need (quoting, key spacing, blank lines). Nodes are built once
//! per file by the [`DocumentBuilder`](super::builder::DocumentBuilder) and
//! never mutated afterwards.

use super::source::{KeySpacing, QuoteStyle, SourceMap};
use super::types::Position;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Inferred kind of a scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    VariableReference,
    ConditionalExpression,
    Null,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Boolean => write!(f, "boolean"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::String => write!(f, "string"),
            ValueKind::VariableReference => write!(f, "variable reference"),
            ValueKind::ConditionalExpression => write!(f, "conditional expression"),
            ValueKind::Null => write!(f, "null"),
        }
    }
}

/// Syntactic role of a scalar, resolved while building the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarContext {
    /// Value of a module parameter.
    ModuleParam,
    /// Single-line `module: args` string.
    InlineArgs,
    /// `hosts:` target of a host block.
    HostTarget,
    /// Any other host-level option.
    HostOption,
    /// `name:` of a play, task or include.
    Name,
    /// Task-level option such as `become` or `tags`.
    TaskOption,
    /// `when`, `changed_when`, `failed_when`, `until`.
    Conditional,
    /// `loop` and `with_*` directives.
    Loop,
    /// `register:` target.
    RegisteredVariable,
    /// Filename of an include statement.
    IncludeTarget,
    /// Value assigned to a variable under `vars` or as a role parameter.
    VariableValue,
    /// Name of a role.
    RoleName,
    /// Filename listed under `vars_files`.
    FileReference,
}

/// A scalar value together with its formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// Token as written, including quotes.
    pub raw: String,
    /// Decoded content.
    pub text: String,
    pub style: QuoteStyle,
    pub kind: ValueKind,
    pub context: ScalarContext,
    /// Mapping key this scalar is the value of, if any.
    pub key: Option<String>,
    /// Module this scalar belongs to, for module parameters.
    pub module: Option<String>,
    pub position: Position,
    pub end_line: usize,
}

impl Scalar {
    /// Whether the content contains a Jinja expression.
    pub fn is_templated(&self) -> bool {
        self.text.contains("{{") || self.text.contains("{%")
    }
}

/// A value of a mapping entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(Scalar),
    Mapping(Vec<Entry>),
    Sequence(Vec<Value>),
    Null,
}

impl Value {
    /// Scalar payload, if any.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Entries of a mapping value.
    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match self {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }
}

/// A `key: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub position: Position,
    pub spacing: KeySpacing,
    pub value: Value,
    pub end_line: usize,
    /// The key names a variable being assigned.
    pub assigns_variable: bool,
}

/// Invocation of a module inside a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInvocation {
    pub name: String,
    pub position: Position,
    pub spacing: KeySpacing,
    /// Parameters: a mapping, an inline string, or nothing.
    pub args: Value,
    pub end_line: usize,
}

impl ModuleInvocation {
    /// Parameters given as a block mapping.
    pub fn params(&self) -> Option<&[Entry]> {
        self.args.as_mapping()
    }

    /// Parameters given as a single inline string or flow collection.
    pub fn inline_args(&self) -> Option<&Scalar> {
        self.args.as_scalar()
    }
}

/// Where a task field belongs in the canonical field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskFieldKind {
    Name,
    Vars,
    Module,
    Loop,
    Option,
}

/// A top-level key of a task, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskField {
    pub kind: TaskFieldKind,
    pub key: String,
    pub position: Position,
}

/// Nested task list of a `block`, `rescue` or `always` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBlock {
    pub key: String,
    pub position: Position,
    pub items: Vec<TaskItem>,
}

/// A single unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Position of the list dash.
    pub position: Position,
    pub end_line: usize,
    pub blank_lines_before: usize,
    pub name: Option<Scalar>,
    pub module: Option<ModuleInvocation>,
    /// Fields in source order.
    pub fields: Vec<TaskField>,
    /// Entries other than the module and nested blocks.
    pub entries: Vec<Entry>,
    pub blocks: Vec<TaskBlock>,
}

impl Task {
    /// Look up a non-module entry by key.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Name used in messages.
    pub fn display_name(&self) -> String {
        match (&self.name, &self.module) {
            (Some(name), _) => name.text.clone(),
            (None, Some(module)) => module.name.clone(),
            (None, None) => "unnamed task".to_string(),
        }
    }
}

/// `include`-style statement referencing another file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeStatement {
    /// Position of the list dash.
    pub position: Position,
    pub end_line: usize,
    pub blank_lines_before: usize,
    /// `include`, `import_playbook`, `include_tasks`, ...
    pub keyword: String,
    pub keyword_position: Position,
    pub spacing: KeySpacing,
    pub target: Scalar,
    /// Other entries such as `vars`, `tags`, `when`, `name`.
    pub entries: Vec<Entry>,
}

impl IncludeStatement {
    /// Whether the statement spans more than one line.
    pub fn is_multiline(&self) -> bool {
        self.end_line > self.position.line
    }

    /// The `vars` mapping, if present.
    pub fn vars(&self) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == "vars")
    }
}

/// An element of a task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskItem {
    Task(Task),
    Include(IncludeStatement),
}

/// How a role entry is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSyntax {
    /// `- rolename`
    Bare,
    /// `- role: rolename` followed by parameters.
    Mapping,
    /// `- { role: rolename, param: value }`
    Flow,
}

/// A role applied by a host block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    /// Position of the list dash.
    pub position: Position,
    pub end_line: usize,
    pub blank_lines_before: usize,
    pub name: Option<Scalar>,
    pub syntax: RoleSyntax,
    /// Mapping entries, including `role:` itself.
    pub entries: Vec<Entry>,
    /// Raw flow collection for [`RoleSyntax::Flow`].
    pub flow: Option<Scalar>,
}

/// Section of a host block, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostFieldKind {
    Declaration,
    Option,
    PreTasks,
    Roles,
    Tasks,
    PostTasks,
    Handlers,
}

impl HostFieldKind {
    /// Section kind for a host block key.
    pub fn for_key(key: &str) -> Self {
        match key {
            "hosts" | "name" => HostFieldKind::Declaration,
            "pre_tasks" => HostFieldKind::PreTasks,
            "roles" => HostFieldKind::Roles,
            "tasks" => HostFieldKind::Tasks,
            "post_tasks" => HostFieldKind::PostTasks,
            "handlers" => HostFieldKind::Handlers,
            _ => HostFieldKind::Option,
        }
    }
}

impl std::fmt::Display for HostFieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostFieldKind::Declaration => write!(f, "host declaration"),
            HostFieldKind::Option => write!(f, "host options"),
            HostFieldKind::PreTasks => write!(f, "pre_tasks"),
            HostFieldKind::Roles => write!(f, "roles"),
            HostFieldKind::Tasks => write!(f, "tasks"),
            HostFieldKind::PostTasks => write!(f, "post_tasks"),
            HostFieldKind::Handlers => write!(f, "handlers"),
        }
    }
}

/// A top-level key of a host block, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostField {
    pub kind: HostFieldKind,
    pub key: String,
    pub position: Position,
}

/// Items of a host block section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionItems {
    Tasks(Vec<TaskItem>),
    Roles(Vec<RoleRef>),
}

/// `pre_tasks`, `roles`, `tasks`, `post_tasks` or `handlers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSection {
    pub kind: HostFieldKind,
    pub position: Position,
    pub items: SectionItems,
}

/// A mapping that begins with a `hosts:` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBlock {
    /// Position of the list dash.
    pub position: Position,
    pub end_line: usize,
    pub blank_lines_before: usize,
    pub name: Option<Scalar>,
    pub hosts: Option<Scalar>,
    /// Fields in source order.
    pub fields: Vec<HostField>,
    /// Declaration and option entries.
    pub entries: Vec<Entry>,
    pub sections: Vec<HostSection>,
}

impl HostBlock {
    /// Look up a declaration or option entry by key.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Number of tasks across all task sections, including nested blocks.
    pub fn task_count(&self) -> usize {
        fn count(items: &[TaskItem]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    TaskItem::Task(task) => {
                        1 + task.blocks.iter().map(|b| count(&b.items)).sum::<usize>()
                    }
                    TaskItem::Include(_) => 1,
                })
                .sum()
        }

        self.sections
            .iter()
            .map(|s| match &s.items {
                SectionItems::Tasks(items) => count(items),
                SectionItems::Roles(_) => 0,
            })
            .sum()
    }
}

/// A top-level element of a playbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Host(HostBlock),
    Include(IncludeStatement),
}

/// A parsed playbook file.
#[derive(Debug, Clone)]
pub struct PlaybookDocument {
    pub path: PathBuf,
    pub blocks: Vec<Block>,
    pub source: SourceMap,
    /// Lines whose indentation belongs to a multi-line scalar.
    pub verbatim: Vec<RangeInclusive<usize>>,
    /// The file is vault-encrypted and was not parsed.
    pub encrypted: bool,
}

impl PlaybookDocument {
    /// Placeholder document for a vault-encrypted file.
    pub fn encrypted(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            blocks: Vec::new(),
            source: SourceMap::default(),
            verbatim: Vec::new(),
            encrypted: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a line belongs to a multi-line scalar body.
    pub fn is_verbatim(&self, line: usize) -> bool {
        self.verbatim.iter().any(|r| r.contains(&line))
    }

    /// Host blocks in source order.
    pub fn host_blocks(&self) -> impl Iterator<Item = &HostBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Host(h) => Some(h),
            Block::Include(_) => None,
        })
    }

    /// Number of host blocks.
    pub fn play_count(&self) -> usize {
        self.host_blocks().count()
    }

    /// Number of tasks across all host blocks.
    pub fn task_count(&self) -> usize {
        self.host_blocks().map(HostBlock::task_count).sum()
    }
}
