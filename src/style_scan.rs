//! Class-name scanner for raw style sources.
//!
//! Collects the names a CSS Modules transform would export for a file: class
//! selectors in rule preludes (at any nesting depth), `@keyframes` names,
//! `:export { name: value }` entries and `@value` definitions or imports.
//! Anything under `:global` stays global and is not exported.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CLASS_RE: Regex = Regex::new(r"\.(-?[_a-zA-Z][_a-zA-Z0-9-]*)").unwrap();
    static ref GLOBAL_FN_RE: Regex = Regex::new(r":global\([^)]*\)").unwrap();
    static ref KEYFRAMES_RE: Regex =
        Regex::new(r"^@(?:-[a-z]+-)?keyframes\s+(-?[_a-zA-Z][_a-zA-Z0-9-]*)").unwrap();
    static ref VALUE_IMPORT_RE: Regex = Regex::new(r"^@value\s+([\s\S]+?)\s+from\s").unwrap();
    static ref VALUE_DEF_RE: Regex =
        Regex::new(r"^@value\s+([_a-zA-Z][_a-zA-Z0-9-]*)\s*[:\s]").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Rule,
    AtRule,
    Keyframes,
    Export,
}

/// Exported names in order of first appearance, without duplicates.
pub fn scan_class_names(source: &str) -> Vec<String> {
    let cleaned = strip_comments_and_strings(source);
    let mut names: Vec<String> = Vec::new();

    let mut stack: Vec<Block> = Vec::new();
    let mut prelude = String::new();

    for ch in cleaned.chars() {
        match ch {
            '{' => {
                let head = prelude.trim();
                let block = if stack.last() == Some(&Block::Keyframes) {
                    Block::Keyframes
                } else if head == ":export" {
                    Block::Export
                } else if head.starts_with('@') {
                    match KEYFRAMES_RE.captures(head) {
                        Some(caps) => {
                            push_unique(&mut names, &caps[1]);
                            Block::Keyframes
                        }
                        None => Block::AtRule,
                    }
                } else {
                    for name in selector_classes(head) {
                        push_unique(&mut names, &name);
                    }
                    Block::Rule
                };
                stack.push(block);
                prelude.clear();
            }
            '}' => {
                if stack.pop() == Some(Block::Export) {
                    push_export_entry(&mut names, &prelude);
                }
                prelude.clear();
            }
            ';' => {
                if stack.last() == Some(&Block::Export) {
                    push_export_entry(&mut names, &prelude);
                } else {
                    for name in value_names(prelude.trim()) {
                        push_unique(&mut names, &name);
                    }
                }
                prelude.clear();
            }
            _ => prelude.push(ch),
        }
    }

    names
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

/// `name: value` inside an `:export` block.
fn push_export_entry(names: &mut Vec<String>, declaration: &str) {
    if let Some((name, _)) = declaration.split_once(':') {
        let name = name.trim();
        if !name.is_empty() {
            push_unique(names, name);
        }
    }
}

/// Names bound by an `@value` statement. Imports re-export under their local
/// alias (`a as b` binds `b`).
fn value_names(statement: &str) -> Vec<String> {
    if let Some(caps) = VALUE_IMPORT_RE.captures(statement) {
        return caps[1]
            .trim_matches(|c| c == '(' || c == ')')
            .split(',')
            .filter_map(|item| item.split_whitespace().last())
            .map(str::to_string)
            .collect();
    }
    match VALUE_DEF_RE.captures(statement) {
        Some(caps) => vec![caps[1].to_string()],
        None => Vec::new(),
    }
}

fn selector_classes(selector_list: &str) -> Vec<String> {
    let mut out = Vec::new();
    for selector in selector_list.split(',') {
        let local = GLOBAL_FN_RE.replace_all(selector, "");
        let local = match local.find(":global") {
            Some(idx) => &local[..idx],
            None => &local[..],
        };
        for caps in CLASS_RE.captures_iter(local) {
            out.push(caps[1].to_string());
        }
    }
    out
}

/// Drop comments and empty out string literals so neither can contribute
/// selectors or braces.
fn strip_comments_and_strings(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '"' | '\'' => {
                out.push(ch);
                let mut escaped = false;
                for c in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == ch {
                        break;
                    }
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    out
}
