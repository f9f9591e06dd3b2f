//! Document model builder.
//!
//! Combines the generic tree returned by `serde_yaml` (shape validation) with
//! the positional outline of the raw source (formatting metadata) into a typed
//! [`PlaybookDocument`]. Every scalar is tagged with its syntactic context
//! here, so rules never have to guess a value's role from its shape.

use super::model::{
    Block, Entry, HostBlock, HostField, HostFieldKind, HostSection, IncludeStatement,
    ModuleInvocation, PlaybookDocument, RoleRef, RoleSyntax, Scalar, ScalarContext, SectionItems,
    Task, TaskBlock, TaskField, TaskFieldKind, TaskItem, Value, ValueKind,
};
use super::source::{OutlineScanner, QuoteStyle, RawEntry, RawItem, RawNode, RawScalar, SourceMap};
use super::types::{LintError, LintOpResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, trace};

/// Known task attributes that are not module names.
pub(crate) const TASK_KEYS: &[&str] = &[
    "name", "action", "when", "loop", "with_items", "with_dict",
    "with_file", "with_fileglob", "with_first_found", "with_together",
    "with_nested", "with_random_choice", "with_sequence", "with_subelements",
    "with_template", "with_inventory_hostnames", "with_indexed_items",
    "loop_control", "register", "notify", "listen",
    "ignore_errors", "ignore_unreachable", "changed_when", "failed_when",
    "tags", "become", "become_method", "become_user", "become_flags",
    "become_exe", "become_password", "collections", "port",
    "delegate_to", "delegate_facts", "local_action", "run_once",
    "retries", "delay", "until", "async", "poll",
    "environment", "vars", "args", "block", "rescue", "always",
    "connection", "throttle", "timeout", "no_log", "diff", "check_mode",
    "module_defaults", "any_errors_fatal", "debugger", "remote_user",
    "sudo", "sudo_user", "sudo_pass", "sudo_exe", "sudo_flags", "su", "su_user",
];

/// Keys whose values are Jinja conditionals without braces.
pub(crate) const CONDITIONAL_KEYS: &[&str] = &["when", "changed_when", "failed_when", "until"];

/// Keys that take boolean values.
pub(crate) const BOOLEAN_KEYS: &[&str] = &[
    "become", "gather_facts", "ignore_errors", "ignore_unreachable", "enabled",
    "validate_certs", "force", "backup", "update_cache", "run_once", "no_log",
    "check_mode", "diff", "any_errors_fatal", "force_handlers", "delegate_facts",
    "create", "recurse", "follow", "remote_src", "daemon_reload", "append",
    "cacheable", "sudo", "su", "changed", "failed", "skipped", "system",
    "list_files", "unsafe_writes", "executable_only",
];

/// Include keywords recognised at the top level of a playbook.
pub(crate) const TOP_LEVEL_INCLUDES: &[&str] = &["include", "import_playbook"];

/// Include keywords recognised inside task lists.
pub(crate) const TASK_INCLUDES: &[&str] = &[
    "include", "include_tasks", "import_tasks", "include_vars", "import_playbook",
];

/// Role entry keys that configure the role rather than pass variables.
const ROLE_KEYWORDS: &[&str] = &[
    "role", "name", "tags", "when", "become", "become_user", "become_method",
    "delegate_to", "ignore_errors", "environment", "vars", "sudo", "sudo_user",
    "public", "apply",
];

/// Canonical and YAML 1.1 boolean tokens.
pub(crate) const BOOLEAN_TOKENS: &[&str] = &[
    "true", "false", "True", "False", "TRUE", "FALSE",
    "yes", "no", "Yes", "No", "YES", "NO",
    "on", "off", "On", "Off", "ON", "OFF",
];

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*|\[[^\]]+\])*$")
        .expect("identifier pattern is valid")
});

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(0|[1-9][0-9]*)$").expect("integer pattern is valid"));

/// Collection prefixes under which the core modules are also published.
const BUILTIN_PREFIXES: &[&str] = &["ansible.builtin.", "ansible.legacy."];

/// Short name of a module, with any core collection prefix removed.
pub(crate) fn short_module_name(name: &str) -> &str {
    BUILTIN_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
}

/// Whether a key names a loop directive.
pub(crate) fn is_loop_key(key: &str) -> bool {
    key == "loop" || key == "loop_control" || key.starts_with("with_")
}

#[derive(Debug, Clone, Copy)]
struct Ctx<'a> {
    context: ScalarContext,
    module: Option<&'a str>,
    /// Keys of a mapping value assign variables.
    assigns_children: bool,
}

impl<'a> Ctx<'a> {
    fn of(context: ScalarContext) -> Self {
        Self {
            context,
            module: None,
            assigns_children: false,
        }
    }

    fn module(module: &'a str) -> Self {
        Self {
            context: ScalarContext::ModuleParam,
            module: Some(module),
            assigns_children: short_module_name(module) == "set_fact",
        }
    }

    fn variables() -> Self {
        Self {
            context: ScalarContext::VariableValue,
            module: None,
            assigns_children: true,
        }
    }

    fn nested(self) -> Self {
        Self {
            assigns_children: false,
            ..self
        }
    }
}

/// Builds a [`PlaybookDocument`] from a parse tree and its source text.
pub struct DocumentBuilder<'a> {
    path: &'a Path,
    source: &'a str,
    map: SourceMap,
}

impl<'a> DocumentBuilder<'a> {
    /// Create a builder for one file.
    pub fn new(path: &'a Path, source: &'a str) -> Self {
        Self {
            path,
            source,
            map: SourceMap::new(source),
        }
    }

    /// Parse the source with `serde_yaml` and build the model.
    pub fn parse(path: &'a Path, source: &'a str) -> LintOpResult<PlaybookDocument> {
        let tree: serde_yaml::Value =
            serde_yaml::from_str(source).map_err(|e| LintError::Parse {
                path: path.to_path_buf(),
                message: format!("YAML syntax error: {}", e),
                line: e.location().map(|l| l.line()),
                column: e.location().map(|l| l.column()),
            })?;

        Self::new(path, source).build(&tree)
    }

    /// Build the model from an already parsed tree.
    pub fn build(self, tree: &serde_yaml::Value) -> LintOpResult<PlaybookDocument> {
        let plays = match tree {
            serde_yaml::Value::Sequence(plays) => plays,
            serde_yaml::Value::Null => return Err(self.malformed("document is empty", None)),
            serde_yaml::Value::Mapping(_) => {
                return Err(self.malformed(
                    "playbook must be a list of host blocks or include statements, not a single mapping",
                    None,
                ))
            }
            _ => {
                return Err(self.malformed(
                    "playbook must be a list of host blocks or include statements",
                    None,
                ))
            }
        };

        let outline = OutlineScanner::scan(self.source);
        let items = match &outline.root {
            RawNode::Sequence { items, .. } if items.len() == plays.len() => items,
            _ => {
                return Err(self.malformed(
                    "top-level list could not be matched against the source layout",
                    None,
                ))
            }
        };

        let mut blocks = Vec::with_capacity(items.len());
        for (value, item) in plays.iter().zip(items) {
            let line = Some(item.position.line);
            if !value.is_mapping() {
                return Err(self.malformed("top-level item must be a mapping", line));
            }

            if value.get("hosts").is_some() {
                blocks.push(Block::Host(self.host_block(item)));
            } else if let Some(include) = self.include(item, TOP_LEVEL_INCLUDES) {
                blocks.push(Block::Include(include));
            } else {
                return Err(self.malformed(
                    "top-level item is neither a host block nor an include statement",
                    line,
                ));
            }
        }

        debug!(
            path = %self.path.display(),
            blocks = blocks.len(),
            "built playbook document"
        );

        Ok(PlaybookDocument {
            path: self.path.to_path_buf(),
            blocks,
            source: self.map,
            verbatim: outline.verbatim,
            encrypted: false,
        })
    }

    fn malformed(&self, message: &str, line: Option<usize>) -> LintError {
        LintError::MalformedPlaybook {
            path: self.path.to_path_buf(),
            message: message.to_string(),
            line,
        }
    }

    fn host_block(&self, item: &RawItem) -> HostBlock {
        let mut block = HostBlock {
            position: item.position,
            end_line: item.end_line,
            blank_lines_before: self.map.blank_lines_before(item.position.line),
            name: None,
            hosts: None,
            fields: Vec::new(),
            entries: Vec::new(),
            sections: Vec::new(),
        };

        for raw in item.node.entries().unwrap_or_default() {
            let kind = HostFieldKind::for_key(&raw.key);
            block.fields.push(HostField {
                kind,
                key: raw.key.clone(),
                position: raw.position,
            });

            match kind {
                HostFieldKind::Declaration => {
                    let context = if raw.key == "hosts" {
                        ScalarContext::HostTarget
                    } else {
                        ScalarContext::Name
                    };
                    let entry = self.entry(raw, Ctx::of(context), false);
                    let scalar = entry.value.as_scalar().cloned();
                    if raw.key == "hosts" {
                        block.hosts = scalar;
                    } else {
                        block.name = scalar;
                    }
                    block.entries.push(entry);
                }
                HostFieldKind::Option => {
                    let ctx = match raw.key.as_str() {
                        "vars" => Ctx::variables(),
                        "vars_files" => Ctx::of(ScalarContext::FileReference),
                        key if CONDITIONAL_KEYS.contains(&key) => Ctx::of(ScalarContext::Conditional),
                        _ => Ctx::of(ScalarContext::HostOption),
                    };
                    block.entries.push(self.entry(raw, ctx, false));
                }
                HostFieldKind::Roles => block.sections.push(HostSection {
                    kind,
                    position: raw.position,
                    items: SectionItems::Roles(self.roles(&raw.value)),
                }),
                _ => block.sections.push(HostSection {
                    kind,
                    position: raw.position,
                    items: SectionItems::Tasks(self.task_items(&raw.value)),
                }),
            }
        }

        trace!(line = item.position.line, "host block");
        block
    }

    fn task_items(&self, node: &RawNode) -> Vec<TaskItem> {
        match node {
            RawNode::Sequence { items, .. } => {
                items.iter().filter_map(|item| self.task_item(item)).collect()
            }
            _ => Vec::new(),
        }
    }

    fn task_item(&self, item: &RawItem) -> Option<TaskItem> {
        let entries = item.node.entries()?;
        if let Some(include) = self.include(item, TASK_INCLUDES) {
            return Some(TaskItem::Include(include));
        }

        let mut task = Task {
            position: item.position,
            end_line: item.end_line,
            blank_lines_before: self.map.blank_lines_before(item.position.line),
            name: None,
            module: None,
            fields: Vec::new(),
            entries: Vec::new(),
            blocks: Vec::new(),
        };

        for raw in entries {
            let key = raw.key.as_str();
            let kind = match key {
                "name" => TaskFieldKind::Name,
                "vars" => TaskFieldKind::Vars,
                "block" | "rescue" | "always" => TaskFieldKind::Module,
                k if is_loop_key(k) => TaskFieldKind::Loop,
                k if TASK_KEYS.contains(&k) => TaskFieldKind::Option,
                _ if task.module.is_none() => TaskFieldKind::Module,
                _ => TaskFieldKind::Option,
            };
            task.fields.push(TaskField {
                kind,
                key: raw.key.clone(),
                position: raw.position,
            });

            match (kind, key) {
                (TaskFieldKind::Module, "block" | "rescue" | "always") => {
                    task.blocks.push(TaskBlock {
                        key: raw.key.clone(),
                        position: raw.position,
                        items: self.task_items(&raw.value),
                    });
                }
                (TaskFieldKind::Module, _) => task.module = Some(self.module(raw)),
                (TaskFieldKind::Name, _) => {
                    let entry = self.entry(raw, Ctx::of(ScalarContext::Name), false);
                    task.name = entry.value.as_scalar().cloned();
                    task.entries.push(entry);
                }
                _ => task.entries.push(self.task_entry(raw)),
            }
        }

        Some(TaskItem::Task(task))
    }

    /// Entry of a task or include that is not the module itself.
    fn task_entry(&self, raw: &RawEntry) -> Entry {
        let key = raw.key.as_str();
        let ctx = match key {
            "name" => Ctx::of(ScalarContext::Name),
            "vars" => Ctx::variables(),
            "register" => Ctx::of(ScalarContext::RegisteredVariable),
            k if CONDITIONAL_KEYS.contains(&k) => Ctx::of(ScalarContext::Conditional),
            k if is_loop_key(k) => Ctx::of(ScalarContext::Loop),
            _ => Ctx::of(ScalarContext::TaskOption),
        };
        self.entry(raw, ctx, false)
    }

    fn module(&self, raw: &RawEntry) -> ModuleInvocation {
        let args = match &raw.value {
            RawNode::Scalar(s) => {
                Value::Scalar(self.scalar(s, Some(raw.key.as_str()), Ctx::of(ScalarContext::InlineArgs)))
            }
            other => self.value(other, Some(raw.key.as_str()), Ctx::module(&raw.key)),
        };

        ModuleInvocation {
            name: raw.key.clone(),
            position: raw.position,
            spacing: raw.spacing,
            args,
            end_line: raw.end_line,
        }
    }

    fn include(&self, item: &RawItem, keywords: &[&str]) -> Option<IncludeStatement> {
        let entries = item.node.entries()?;
        let target_entry = entries.iter().find(|e| {
            keywords.contains(&e.key.as_str()) && matches!(e.value, RawNode::Scalar(_))
        })?;
        let target = self.scalar(
            target_entry.value.as_scalar()?,
            Some(target_entry.key.as_str()),
            Ctx::of(ScalarContext::IncludeTarget),
        );

        Some(IncludeStatement {
            position: item.position,
            end_line: item.end_line,
            blank_lines_before: self.map.blank_lines_before(item.position.line),
            keyword: target_entry.key.clone(),
            keyword_position: target_entry.position,
            spacing: target_entry.spacing,
            target,
            entries: entries
                .iter()
                .filter(|e| !std::ptr::eq(*e, target_entry))
                .map(|e| self.task_entry(e))
                .collect(),
        })
    }

    fn roles(&self, node: &RawNode) -> Vec<RoleRef> {
        let RawNode::Sequence { items, .. } = node else {
            return Vec::new();
        };
        items.iter().filter_map(|item| self.role(item)).collect()
    }

    fn role(&self, item: &RawItem) -> Option<RoleRef> {
        let mut role = RoleRef {
            position: item.position,
            end_line: item.end_line,
            blank_lines_before: self.map.blank_lines_before(item.position.line),
            name: None,
            syntax: RoleSyntax::Mapping,
            entries: Vec::new(),
            flow: None,
        };

        match &item.node {
            RawNode::Scalar(s) if s.style == QuoteStyle::Flow => {
                role.syntax = RoleSyntax::Flow;
                role.name = flow_role_name(s);
                role.flow = Some(self.scalar(s, None, Ctx::of(ScalarContext::InlineArgs)));
            }
            RawNode::Scalar(s) => {
                role.syntax = RoleSyntax::Bare;
                role.name = Some(self.scalar(s, None, Ctx::of(ScalarContext::RoleName)));
            }
            RawNode::Mapping { entries, .. } => {
                for raw in entries {
                    let key = raw.key.as_str();
                    let (ctx, assigns) = match key {
                        "role" | "name" => (Ctx::of(ScalarContext::RoleName), false),
                        "vars" => (Ctx::variables(), false),
                        k if CONDITIONAL_KEYS.contains(&k) => (Ctx::of(ScalarContext::Conditional), false),
                        k if ROLE_KEYWORDS.contains(&k) => (Ctx::of(ScalarContext::TaskOption), false),
                        _ => (Ctx::of(ScalarContext::VariableValue), true),
                    };
                    let entry = self.entry(raw, ctx, assigns);
                    if matches!(key, "role" | "name") && role.name.is_none() {
                        role.name = entry.value.as_scalar().cloned();
                    }
                    role.entries.push(entry);
                }
            }
            _ => return None,
        }

        Some(role)
    }

    fn entry(&self, raw: &RawEntry, ctx: Ctx<'_>, assigns_variable: bool) -> Entry {
        Entry {
            key: raw.key.clone(),
            position: raw.position,
            spacing: raw.spacing,
            value: self.value(&raw.value, Some(raw.key.as_str()), ctx),
            end_line: raw.end_line,
            assigns_variable,
        }
    }

    fn value(&self, node: &RawNode, key: Option<&str>, ctx: Ctx<'_>) -> Value {
        match node {
            RawNode::Scalar(s) => Value::Scalar(self.scalar(s, key, ctx)),
            RawNode::Mapping { entries, .. } => Value::Mapping(
                entries
                    .iter()
                    .map(|e| self.entry(e, ctx.nested(), ctx.assigns_children))
                    .collect(),
            ),
            RawNode::Sequence { items, .. } => Value::Sequence(
                items
                    .iter()
                    .map(|item| self.value(&item.node, key, ctx.nested()))
                    .collect(),
            ),
            RawNode::Empty => Value::Null,
        }
    }

    fn scalar(&self, raw: &RawScalar, key: Option<&str>, ctx: Ctx<'_>) -> Scalar {
        Scalar {
            raw: raw.raw.clone(),
            text: raw.text.clone(),
            style: raw.style,
            kind: infer_kind(raw, key, ctx.context, ctx.module),
            context: ctx.context,
            key: key.map(String::from),
            module: ctx.module.map(String::from),
            position: raw.position,
            end_line: raw.end_line,
        }
    }
}

/// Extract the role name from `{ role: name, ... }`.
fn flow_role_name(raw: &RawScalar) -> Option<Scalar> {
    let value: serde_yaml::Value = serde_yaml::from_str(&raw.raw).ok()?;
    let name = value
        .get("role")
        .or_else(|| value.get("name"))
        .and_then(|v| v.as_str())?
        .to_string();

    Some(Scalar {
        raw: name.clone(),
        text: name,
        style: QuoteStyle::Unquoted,
        kind: ValueKind::String,
        context: ScalarContext::RoleName,
        key: Some("role".to_string()),
        module: None,
        position: raw.position,
        end_line: raw.end_line,
    })
}

/// Infer the kind of a scalar from its context, key and token.
pub(crate) fn infer_kind(
    raw: &RawScalar,
    key: Option<&str>,
    context: ScalarContext,
    module: Option<&str>,
) -> ValueKind {
    let text = raw.text.as_str();
    match context {
        ScalarContext::Conditional => return ValueKind::ConditionalExpression,
        ScalarContext::RegisteredVariable => return ValueKind::VariableReference,
        ScalarContext::Name
        | ScalarContext::HostTarget
        | ScalarContext::IncludeTarget
        | ScalarContext::RoleName
        | ScalarContext::FileReference
        | ScalarContext::InlineArgs => return ValueKind::String,
        _ => {}
    }

    if matches!(
        raw.style,
        QuoteStyle::Literal | QuoteStyle::Folded | QuoteStyle::Flow
    ) {
        return ValueKind::String;
    }

    match (module.map(short_module_name), key) {
        (Some("assert"), Some("that")) => return ValueKind::ConditionalExpression,
        (Some("debug"), Some("var")) if IDENTIFIER.is_match(text) => {
            return ValueKind::VariableReference
        }
        _ => {}
    }

    if context == ScalarContext::Loop && IDENTIFIER.is_match(text) {
        return ValueKind::VariableReference;
    }

    let boolean_key = key.is_some_and(|k| BOOLEAN_KEYS.contains(&k));
    if raw.style == QuoteStyle::Unquoted {
        if BOOLEAN_TOKENS.contains(&text) || (boolean_key && matches!(text, "1" | "0")) {
            return ValueKind::Boolean;
        }
        return match serde_yaml::from_str::<serde_yaml::Value>(text) {
            Ok(serde_yaml::Value::Number(_)) => ValueKind::Number,
            Ok(serde_yaml::Value::Null) => ValueKind::Null,
            _ => ValueKind::String,
        };
    }

    if boolean_key && (BOOLEAN_TOKENS.contains(&text) || matches!(text, "1" | "0")) {
        ValueKind::Boolean
    } else if INTEGER.is_match(text) {
        ValueKind::Number
    } else {
        ValueKind::String
    }
}
