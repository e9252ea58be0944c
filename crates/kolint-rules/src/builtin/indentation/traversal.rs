//! The indentation pass: depth tracking, checker chain and verdicts
//!
//! One pre-order walk over every node and token. Delimiters drive the
//! [`IndentContext`], every line-break whitespace that has a following
//! sibling gets a default expectation, the checker chain may override it,
//! and a mismatch becomes a [`Violation`] carrying the token rewrite. A line
//! opening a `trimIndent()`/`trimMargin()` raw string takes the string's
//! body along when it moves.

use kolint_core::cst::is_newline_whitespace;
use kolint_core::{KtSyntaxElement, KtSyntaxKind, KtSyntaxNode, KtSyntaxToken, TextEdit};
use rowan::{NodeOrToken, WalkEvent};
use tracing::trace;

use super::checkers::{CheckerContext, IndentationChecker, IndentationError};
use super::config::IndentationConfig;
use super::context::IndentContext;
use super::tree::{IndentLedger, ancestors, has_ancestor, last_indent, next_code_sibling};
use super::{TreeFix, Violation};

use KtSyntaxKind::*;

/// Step opened or closed by a delimiter, zero for other elements
///
/// Parentheses of a parenthesized expression only count when a line break
/// follows `(`.
fn delimiter_change(element: &KtSyntaxElement, config: &IndentationConfig) -> i64 {
    let kind = element.kind();
    if !kind.is_opening_delimiter() && !kind.is_closing_delimiter() {
        return 0;
    }
    match element.parent() {
        Some(parent) if parent.kind() == Parenthesized && matches!(kind, Lpar | Rpar) => {
            let wrapped = parent
                .children_with_tokens()
                .find(|e| e.kind() == Lpar)
                .and_then(|lpar| lpar.next_sibling_or_token())
                .is_some_and(|next| is_newline_whitespace(&next));
            if wrapped {
                config.step(config.extended_indent_after_operators)
            } else {
                0
            }
        }
        _ => config.indent_size(),
    }
}

/// Node that carries the indent an override propagates
fn exception_initiator(whitespace: &KtSyntaxToken) -> Option<KtSyntaxNode> {
    let parent = whitespace.parent()?;
    let kind = parent.kind();
    let initiator = if kind.is_chain_expression() {
        ancestors(whitespace)
            .take_while(|n| n.kind().is_chain_expression())
            .last()
    } else if kind == If {
        next_code_sibling(&NodeOrToken::Token(whitespace.clone()))
            .and_then(NodeOrToken::into_node)
            .filter(|n| matches!(n.kind(), Then | Else))
    } else if kind.is_loop() {
        parent.children().find(|c| c.kind() == Body)
    } else {
        None
    };
    Some(initiator.unwrap_or(parent))
}

pub(super) struct IndentationVisitor<'a> {
    config: &'a IndentationConfig,
    checkers: &'a [Box<dyn IndentationChecker>],
    root: &'a KtSyntaxNode,
    source: String,
    fix: bool,
    context: IndentContext,
    ledger: IndentLedger,
    violations: Vec<Violation>,
}

impl<'a> IndentationVisitor<'a> {
    pub(super) fn new(
        root: &'a KtSyntaxNode,
        config: &'a IndentationConfig,
        checkers: &'a [Box<dyn IndentationChecker>],
        fix: bool,
    ) -> Self {
        Self {
            config,
            checkers,
            root,
            source: root.text().to_string(),
            fix,
            context: IndentContext::new(),
            ledger: IndentLedger::default(),
            violations: Vec::new(),
        }
    }

    /// Walk the whole tree and return the mismatched lines in document order
    pub(super) fn run(mut self) -> Vec<Violation> {
        for event in self.root.preorder_with_tokens() {
            if let WalkEvent::Enter(element) = event {
                self.visit(&element);
            }
        }
        trace!("Recorded {} line(s)", self.ledger.len());
        self.violations
    }

    fn visit(&mut self, element: &KtSyntaxElement) {
        self.context.check_and_reset(element);

        let kind = element.kind();
        let change = delimiter_change(element, self.config);
        if kind.is_opening_delimiter() && change != 0 {
            self.context.store_incrementing_token(kind, change);
        } else if kind.is_closing_delimiter()
            && change != 0
            && !element
                .prev_sibling_or_token()
                .is_some_and(|prev| is_newline_whitespace(&prev))
        {
            self.context.close(kind);
        } else if is_newline_whitespace(element)
            && element.next_sibling_or_token().is_some()
            && let Some(whitespace) = element.as_token()
        {
            self.visit_whitespace(whitespace);
        }
    }

    fn visit_whitespace(&mut self, whitespace: &KtSyntaxToken) {
        self.context.maybe_increment();
        let Some(next) = whitespace.next_sibling_or_token() else {
            return;
        };
        // The line belongs to the closer, so it is already one step out
        if next.kind().is_closing_delimiter() && delimiter_change(&next, self.config) != 0 {
            self.context.close(next.kind());
        }

        let error = IndentationError {
            expected: self.context.indentation(),
            actual: last_indent(whitespace.text()),
        };
        let ctx = CheckerContext {
            config: self.config,
            ledger: &self.ledger,
            root: self.root,
            source: &self.source,
        };
        let (checker, result) = self
            .checkers
            .iter()
            .find_map(|checker| {
                checker
                    .check(whitespace, error, &ctx)
                    .map(|result| (checker.name(), result))
            })
            .unzip();
        let expected = result.map_or(error.expected, |r| r.expected_indent);

        let in_template = has_ancestor(whitespace, LongStringTemplateEntry);
        if let Some(result) = result
            && result.adjust_next
            && !in_template
            && let Some(initiator) = exception_initiator(whitespace)
        {
            self.context.add_exception(
                initiator,
                expected - error.expected,
                result.include_last_child,
            );
        }
        if let Some(parent) = whitespace.parent()
            && parent.kind() == LongStringTemplateEntry
            && next.kind() != LongTemplateEntryEnd
        {
            self.context
                .add_exception(parent, self.config.indent_size(), false);
        }

        let width = if self.fix { expected.max(0) } else { error.actual };
        self.ledger.record(whitespace.text_range(), width);

        let is_correct = result.is_some_and(|r| r.is_correct);
        let aligned = quotes_aligned(&next, error.actual);
        trace!(
            "Line at {:?}: expected {} found {} (checker: {})",
            whitespace.text_range(),
            expected,
            error.actual,
            checker.unwrap_or("default")
        );
        if (!is_correct && expected != error.actual) || !aligned {
            let message = if aligned {
                format!("expected {expected} but was {}", error.actual)
            } else {
                QUOTES_MISALIGNED.to_string()
            };
            let literal = trimmed_raw_string(&next)
                .map(|template| {
                    shift_raw_string(&template, expected, error.actual, self.config.indent_size())
                })
                .unwrap_or_default();
            self.violations
                .push(mismatch(whitespace, expected, message, literal));
        }
    }
}

const QUOTES_MISALIGNED: &str =
    "the same number of indents to the opening and closing quotes was expected";

const TRIM_FUNCTIONS: [&str; 2] = ["trimIndent", "trimMargin"];

fn spaces(width: i64) -> String {
    " ".repeat(usize::try_from(width.max(0)).unwrap_or_default())
}

/// Rewrite of the line's indent, plus the literal lines moving with it
fn mismatch(
    whitespace: &KtSyntaxToken,
    expected: i64,
    message: String,
    literal: Vec<TextEdit>,
) -> Violation {
    let text = whitespace.text();
    let start = usize::from(whitespace.text_range().start());
    let line_break = text.rfind('\n').unwrap_or(0);
    let line_start = start + line_break + 1;
    let indent_end = start + text.len();
    let spaces = spaces(expected);
    let rewritten = format!("{}{}", &text[..=line_break], spaces);
    let mut edits = vec![TextEdit::new(whitespace.text_range(), rewritten)];
    edits.extend(literal);
    Violation {
        message,
        span: line_start..indent_end,
        replacement_span: line_start..indent_end,
        replacement: spaces,
        fix_message: "Re-indent the line",
        fix: TreeFix::Tokens(edits),
    }
}

/// The raw string of a `"""…""".trimIndent()` or `.trimMargin()` call
///
/// `next` is either the dot-qualified call itself or a node wrapping it,
/// such as a value argument.
fn trimmed_raw_string(next: &KtSyntaxElement) -> Option<KtSyntaxNode> {
    let node = next.as_node()?;
    let call = if node.kind() == DotQualifiedExpression {
        node.clone()
    } else {
        node.children().find(|c| c.kind() == DotQualifiedExpression)?
    };
    let template = call.first_child().filter(|c| c.kind() == StringTemplate)?;
    let raw = template
        .first_token()
        .is_some_and(|quote| quote.kind() == OpenQuote && quote.text() == "\"\"\"");
    (raw && is_trim_call(&call)).then_some(template)
}

fn is_trim_call(call: &KtSyntaxNode) -> bool {
    call.children()
        .find(|c| c.kind() == CallExpression)
        .and_then(|callee| callee.first_child())
        .filter(|reference| reference.kind() == ReferenceExpression)
        .and_then(|reference| reference.first_token())
        .is_some_and(|name| name.kind() == Identifier && TRIM_FUNCTIONS.contains(&name.text()))
}

/// Whether a wrapped multi-line raw string argument closes on the column it opens on
fn quotes_aligned(next: &KtSyntaxElement, indent: i64) -> bool {
    if next.kind() != ValueArgument {
        return true;
    }
    let Some(template) = trimmed_raw_string(next) else {
        return true;
    };
    let Some(closing) = template
        .children_with_tokens()
        .filter_map(NodeOrToken::into_token)
        .find(|t| t.kind() == ClosingQuote)
    else {
        return true;
    };
    let text = template.text().to_string();
    let body = &text[..usize::from(closing.text_range().start() - template.text_range().start())];
    match body.rfind('\n') {
        Some(line_break) => body[line_break + 1..].chars().count() as i64 == indent,
        None => true,
    }
}

/// Rewrites of the string parts of `template` when its line moves from
/// `actual` to `expected`
///
/// Lines of the body keep their offset from the old indent but end up at
/// least one step deeper than the new one. Blank lines and the text after
/// the opening quotes stay as they are. The line of the closing quotes is
/// put on the new indent, which also realigns misplaced quotes.
fn shift_raw_string(template: &KtSyntaxNode, expected: i64, actual: i64, step: i64) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    let mut at_line_start = false;
    for element in template.children_with_tokens() {
        let part = element
            .as_node()
            .filter(|entry| entry.kind() == LiteralStringTemplateEntry)
            .and_then(KtSyntaxNode::first_token);
        let Some(part) = part else {
            at_line_start = false;
            continue;
        };
        let closes = element
            .next_sibling_or_token()
            .is_some_and(|e| e.kind() == ClosingQuote);

        let text = part.text();
        let mut rewritten = String::with_capacity(text.len());
        let mut lines = text.split_inclusive('\n').peekable();
        while let Some(line) = lines.next() {
            let (body, eol) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };
            let content = body.trim_start();
            if !at_line_start || (content.trim().is_empty() && !eol.is_empty()) {
                rewritten.push_str(line);
            } else if closes && lines.peek().is_none() && eol.is_empty() {
                rewritten.push_str(&spaces(expected));
                rewritten.push_str(content);
            } else if expected == actual {
                rewritten.push_str(line);
            } else {
                let leading = body.chars().take_while(|c| *c == ' ').count() as i64;
                rewritten.push_str(&spaces(expected + step + (leading - actual - step).max(0)));
                rewritten.push_str(content);
                rewritten.push_str(eol);
            }
            at_line_start = !eol.is_empty();
        }
        if closes && at_line_start {
            rewritten.push_str(&spaces(expected));
        }
        if rewritten != text {
            edits.push(TextEdit::new(part.text_range(), rewritten));
        }
    }
    edits
}
