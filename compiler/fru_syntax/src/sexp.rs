//! S-expression rendering.
//!
//! Named nodes print as `(kind child...)`. Anonymous tokens are left out,
//! except directly inside an `ERROR` node where they print quoted so the
//! swallowed text stays visible. Missing tokens print as `(MISSING kind)`.
//! Hidden nodes contribute their children; ambiguous nodes print their
//! preferred alternative.

use fru_grammar::Language;

use crate::green::GreenNode;

pub(crate) fn render(node: &GreenNode, language: &Language) -> String {
    let mut out = String::new();
    write_node(node, language, false, &mut out);
    out
}

fn write_node(node: &GreenNode, language: &Language, in_error: bool, out: &mut String) {
    if node.is_ambiguous() {
        if let Some(preferred) = node.children().first() {
            write_node(preferred.node(), language, in_error, out);
        }
        return;
    }

    let name = language.symbol_name(node.symbol());
    if node.is_missing() {
        open(out);
        out.push_str("MISSING ");
        if node.is_named() {
            out.push_str(name);
        } else {
            out.push_str(&format!("{name:?}"));
        }
        out.push(')');
        return;
    }

    if !node.is_visible() {
        write_children(node, language, in_error, out);
        return;
    }

    if !node.is_named() {
        if in_error && node.is_leaf() {
            separate(out);
            out.push_str(&format!("{name:?}"));
        } else {
            write_children(node, language, in_error, out);
        }
        return;
    }

    open(out);
    out.push_str(name);
    write_children(node, language, node.is_error(), out);
    out.push(')');
}

fn write_children(node: &GreenNode, language: &Language, in_error: bool, out: &mut String) {
    fru_stack::ensure_sufficient_stack(|| {
        for child in node.children() {
            write_node(child.node(), language, in_error, out);
        }
    });
}

fn open(out: &mut String) {
    separate(out);
    out.push('(');
}

fn separate(out: &mut String) {
    if !out.is_empty() && !out.ends_with('(') {
        out.push(' ');
    }
}
