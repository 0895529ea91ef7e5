//! Flattened view of a [`ProcessTree`] and its text rendering.

use colored::Colorize;
use termtree::Tree;

use crate::application::tree::ProcessTree;
use crate::domain::{NodeId, ProcessId, ProcessStatus, ProcessType};

/// Horizontal indentation per depth level.
pub const INDENT_STEP: usize = 24;
/// Base padding of a process row.
pub const ROW_PADDING: usize = 12;
/// Base padding of loading/empty placeholders.
pub const PLACEHOLDER_PADDING: usize = 40;

pub const LOADING_LABEL: &str = "Carregando...";
pub const EMPTY_LABEL: &str = "Nenhum subprocesso";
pub const ADD_SUBPROCESS_TITLE: &str = "Adicionar subprocesso";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expander {
    Collapsed,
    Expanded,
}

impl Expander {
    pub fn glyph(self) -> &'static str {
        match self {
            Expander::Collapsed => "▸",
            Expander::Expanded => "▾",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeIcon {
    Circle,
    Cpu,
}

impl TypeIcon {
    pub fn for_type(process_type: ProcessType) -> Self {
        match process_type {
            ProcessType::Manual => TypeIcon::Circle,
            ProcessType::Systemic => TypeIcon::Cpu,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            TypeIcon::Circle => "○",
            TypeIcon::Cpu => "⚙",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    CheckCircle,
    AlertCircle,
    XCircle,
}

impl StatusIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            StatusIcon::CheckCircle => "✔",
            StatusIcon::AlertCircle => "!",
            StatusIcon::XCircle => "✘",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Yellow,
    Red,
}

/// Icon and color shown for a status.
pub fn status_style(status: ProcessStatus) -> (StatusIcon, StatusColor) {
    match status {
        ProcessStatus::Active => (StatusIcon::CheckCircle, StatusColor::Green),
        ProcessStatus::InReview => (StatusIcon::AlertCircle, StatusColor::Yellow),
        ProcessStatus::Deprecated => (StatusIcon::XCircle, StatusColor::Red),
    }
}

/// Everything displayed for one mounted process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRow {
    pub node: NodeId,
    pub id: ProcessId,
    pub name: String,
    pub description: Option<String>,
    pub depth: usize,
    pub indent: usize,
    /// `None` when no expand affordance is offered
    pub expander: Option<Expander>,
    pub type_icon: TypeIcon,
    pub type_label: &'static str,
    pub status_icon: StatusIcon,
    pub status_color: StatusColor,
    pub status_label: &'static str,
    pub selected: bool,
    pub dragging: bool,
    pub add_subprocess: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeRow {
    Process(ProcessRow),
    Loading { depth: usize, indent: usize },
    Empty { depth: usize, indent: usize },
}

impl TreeRow {
    pub fn depth(&self) -> usize {
        match self {
            TreeRow::Process(row) => row.depth,
            TreeRow::Loading { depth, .. } | TreeRow::Empty { depth, .. } => *depth,
        }
    }
}

pub fn row_indent(depth: usize) -> usize {
    depth * INDENT_STEP + ROW_PADDING
}

pub fn placeholder_indent(depth: usize) -> usize {
    depth * INDENT_STEP + PLACEHOLDER_PADDING
}

/// Visible rows in display order.
pub fn flatten(tree: &ProcessTree) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    for &root in tree.roots() {
        flatten_node(tree, root, &mut rows);
    }
    rows
}

fn flatten_node(tree: &ProcessTree, node: NodeId, rows: &mut Vec<TreeRow>) {
    let Some(row) = process_row(tree, node) else {
        return;
    };
    let expanded = tree.is_expanded(node);
    let depth = row.depth;
    rows.push(TreeRow::Process(row));
    if !expanded {
        return;
    }
    let Some(n) = tree.node(node) else {
        return;
    };
    let child_depth = depth + 1;
    if n.shows_loading() {
        rows.push(TreeRow::Loading {
            depth: child_depth,
            indent: placeholder_indent(child_depth),
        });
    } else if n.children_loaded() && n.children().is_empty() {
        rows.push(TreeRow::Empty {
            depth: child_depth,
            indent: placeholder_indent(child_depth),
        });
    } else {
        for &child in n.children() {
            flatten_node(tree, child, rows);
        }
    }
}

fn process_row(tree: &ProcessTree, node: NodeId) -> Option<ProcessRow> {
    let n = tree.node(node)?;
    let expanded = tree.is_expanded(node);
    let process = &n.process;
    let (status_icon, status_color) = status_style(process.status);
    let expander = n.can_expand(expanded).then_some(if expanded {
        Expander::Expanded
    } else {
        Expander::Collapsed
    });
    let dragging = n
        .parent
        .and_then(|p| tree.node(p))
        .and_then(|p| p.dragging())
        .is_some_and(|d| d == n.id());

    Some(ProcessRow {
        node,
        id: process.id.clone(),
        name: process.name.clone(),
        description: process.description.clone(),
        depth: n.depth,
        indent: row_indent(n.depth),
        expander,
        type_icon: TypeIcon::for_type(process.process_type),
        type_label: process.process_type.label(),
        status_icon,
        status_color,
        status_label: process.status.label(),
        selected: tree.selected() == Some(&process.id),
        dragging,
        add_subprocess: tree.add_subprocess_enabled(),
    })
}

/// One line of text for a process row.
pub fn row_label(row: &ProcessRow, color: bool) -> String {
    let expander = row.expander.map(Expander::glyph).unwrap_or(" ");
    let status = format!("{} {}", row.status_icon.glyph(), row.status_label);
    let status = if color {
        match row.status_color {
            StatusColor::Green => status.green().to_string(),
            StatusColor::Yellow => status.yellow().to_string(),
            StatusColor::Red => status.red().to_string(),
        }
    } else {
        status
    };
    let name = if row.selected && color {
        row.name.bold().to_string()
    } else {
        row.name.clone()
    };
    let mut label = format!(
        "{} {} {} [{}] {} ({})",
        expander,
        row.type_icon.glyph(),
        name,
        row.type_label,
        status,
        row.id
    );
    if row.selected {
        label.push_str(" *");
    }
    if row.dragging {
        label.push_str(" ⇅");
    }
    label
}

fn placeholder_label(text: &str, color: bool) -> String {
    if color {
        text.dimmed().italic().to_string()
    } else {
        text.to_string()
    }
}

/// termtree rendering of the visible rows, one tree per root.
pub fn to_termtree(tree: &ProcessTree, color: bool) -> Vec<Tree<String>> {
    tree.roots()
        .iter()
        .filter_map(|&root| build_termtree(tree, root, color))
        .collect()
}

fn build_termtree(tree: &ProcessTree, node: NodeId, color: bool) -> Option<Tree<String>> {
    let row = process_row(tree, node)?;
    let mut out = Tree::new(row_label(&row, color));
    if !tree.is_expanded(node) {
        return Some(out);
    }
    let n = tree.node(node)?;
    if n.shows_loading() {
        out.push(Tree::new(placeholder_label(LOADING_LABEL, color)));
    } else if n.children_loaded() && n.children().is_empty() {
        out.push(Tree::new(placeholder_label(EMPTY_LABEL, color)));
    } else {
        let leaves: Vec<Tree<String>> = n
            .children()
            .iter()
            .filter_map(|&child| build_termtree(tree, child, color))
            .collect();
        out = out.with_leaves(leaves);
    }
    Some(out)
}

/// Complete text rendering of the tree.
pub fn render_text(tree: &ProcessTree, color: bool) -> String {
    to_termtree(tree, color)
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("")
}
