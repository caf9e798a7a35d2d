//! Style Export Parser
//!
//! Finds the `exports.locals = {...};` assignment that the bundler's
//! CSS-Modules transform embeds in otherwise opaque module text, and parses
//! its literal. Locating the literal is behind [`ExportLocator`] so the text
//! pattern can be swapped for a structured parse without touching callers.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{AssignmentExpression, AssignmentTarget, Expression};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Range;

use crate::error::ExportError;

/// Local class name -> generated identifier, in source order.
/// Values are opaque and only ever passed through.
pub type ExportMapping = serde_json::Map<String, Value>;

lazy_static! {
    static ref LOCALS_RE: Regex = Regex::new(r"exports\.locals = (\{[\s\S]*\});").unwrap();
}

/// Locates the byte range of the exported JSON literal inside module text.
pub trait ExportLocator: Send + Sync {
    /// `Ok(None)` means the text is not a CSS Modules unit.
    fn locate(&self, content: &str) -> Result<Option<Range<usize>>, ExportError>;
}

/// Which [`ExportLocator`] a build uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocatorKind {
    #[default]
    Pattern,
    Syntax,
}

impl LocatorKind {
    pub fn locator(self) -> Box<dyn ExportLocator> {
        match self {
            LocatorKind::Pattern => Box::new(PatternLocator),
            LocatorKind::Syntax => Box::new(SyntaxLocator),
        }
    }
}

/// Text-pattern locator. Matches the transform's output byte for byte; the
/// literal runs greedily to the last `};` in the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternLocator;

impl ExportLocator for PatternLocator {
    fn locate(&self, content: &str) -> Result<Option<Range<usize>>, ExportError> {
        Ok(LOCALS_RE
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.range()))
    }
}

/// Structured locator: parses the module and finds the first
/// `exports.locals = { ... }` assignment whose right side is an object literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxLocator;

struct LocalsFinder {
    found: Option<Span>,
}

impl<'a> Visit<'a> for LocalsFinder {
    fn visit_assignment_expression(&mut self, expr: &AssignmentExpression<'a>) {
        if self.found.is_none() {
            if let AssignmentTarget::StaticMemberExpression(member) = &expr.left {
                if let Expression::Identifier(object) = &member.object {
                    if object.name.as_str() == "exports"
                        && member.property.name.as_str() == "locals"
                    {
                        if let Expression::ObjectExpression(literal) = &expr.right {
                            self.found = Some(literal.span);
                            return;
                        }
                    }
                }
            }
        }
        walk::walk_assignment_expression(self, expr);
    }
}

impl ExportLocator for SyntaxLocator {
    fn locate(&self, content: &str) -> Result<Option<Range<usize>>, ExportError> {
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_module(false);
        let ret = Parser::new(&allocator, content, source_type).parse();
        if let Some(first) = ret.errors.first() {
            return Err(ExportError::Unparseable {
                reason: first.to_string(),
            });
        }

        let mut finder = LocalsFinder { found: None };
        finder.visit_program(&ret.program);
        Ok(finder
            .found
            .map(|span| span.start as usize..span.end as usize))
    }
}

/// A parsed export literal and where it sits in the module text.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedExports {
    pub range: Range<usize>,
    pub mapping: ExportMapping,
}

/// Locate and parse the export literal.
///
/// Returns `Ok(None)` when the text carries no export assignment; the caller
/// must then pass the content through unchanged. A literal that is not valid
/// JSON is an error, never dropped.
pub fn parse_exports(
    locator: &dyn ExportLocator,
    content: &str,
) -> Result<Option<LocatedExports>, ExportError> {
    let Some(range) = locator.locate(content)? else {
        return Ok(None);
    };

    let value: Value = serde_json::from_str(&content[range.clone()])
        .map_err(|e| ExportError::MalformedLiteral {
            reason: e.to_string(),
        })?;

    match value {
        Value::Object(mapping) => Ok(Some(LocatedExports { range, mapping })),
        _ => Err(ExportError::NotAnObject),
    }
}

/// Replace `range` in `content` with `replacement`, keeping every other byte.
pub fn replace_literal(content: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(content.len() + replacement.len());
    out.push_str(&content[..range.start]);
    out.push_str(replacement);
    out.push_str(&content[range.end..]);
    out
}
