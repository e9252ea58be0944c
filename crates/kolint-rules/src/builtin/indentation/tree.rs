//! Tree navigation shared by the traversal and the checkers

use std::iter::successors;

use indexmap::IndexMap;
use kolint_core::cst::is_newline_whitespace;
use kolint_core::{KtSyntaxElement, KtSyntaxKind, KtSyntaxNode, KtSyntaxToken};
use rowan::{NodeOrToken, TextRange, TextSize};

/// Indent widths of the line-break whitespace visited so far
///
/// In check mode a width is what the source says. In fix mode it is the
/// width the fixer is going to write, so later lines are measured against
/// already-corrected lines and one pass reaches a fixed point.
#[derive(Debug, Default)]
pub(super) struct IndentLedger {
    widths: IndexMap<TextRange, i64>,
}

impl IndentLedger {
    /// Record a width; the first record for a range wins
    pub(super) fn record(&mut self, range: TextRange, width: i64) -> bool {
        if self.widths.contains_key(&range) {
            return false;
        }
        self.widths.insert(range, width);
        true
    }

    /// Width of the last line in `whitespace`, as recorded or as written
    pub(super) fn width_of(&self, whitespace: &KtSyntaxToken) -> i64 {
        self.widths
            .get(&whitespace.text_range())
            .copied()
            .unwrap_or_else(|| last_indent(whitespace.text()))
    }

    pub(super) fn len(&self) -> usize {
        self.widths.len()
    }
}

/// Number of spaces after the last line break
pub(super) fn last_indent(text: &str) -> i64 {
    let tail = text.rsplit('\n').next().unwrap_or_default();
    tail.chars().filter(|c| *c == ' ').count() as i64
}

/// The node itself (for nodes) followed by all its ancestors
pub(super) fn self_and_ancestors(element: &KtSyntaxElement) -> impl Iterator<Item = KtSyntaxNode> {
    let start = match element {
        NodeOrToken::Node(node) => Some(node.clone()),
        NodeOrToken::Token(token) => token.parent(),
    };
    successors(start, |node| node.parent())
}

pub(super) fn ancestors(token: &KtSyntaxToken) -> impl Iterator<Item = KtSyntaxNode> {
    successors(token.parent(), |node| node.parent())
}

pub(super) fn has_ancestor(token: &KtSyntaxToken, kind: KtSyntaxKind) -> bool {
    ancestors(token).any(|node| node.kind() == kind)
}

pub(super) fn contains_newline(element: &KtSyntaxElement) -> bool {
    match element {
        NodeOrToken::Node(node) => node.text().contains_char('\n'),
        NodeOrToken::Token(token) => token.text().contains('\n'),
    }
}

fn is_whitespace_or_comment(kind: KtSyntaxKind) -> bool {
    kind == KtSyntaxKind::WhiteSpace || kind == KtSyntaxKind::Kdoc || kind.is_comment()
}

/// Next sibling that is neither whitespace nor a comment
pub(super) fn next_code_sibling(element: &KtSyntaxElement) -> Option<KtSyntaxElement> {
    successors(element.next_sibling_or_token(), |e| e.next_sibling_or_token())
        .find(|e| !is_whitespace_or_comment(e.kind()))
}

fn previous_newline_whitespace(element: &KtSyntaxElement) -> Option<KtSyntaxToken> {
    successors(element.prev_sibling_or_token(), |e| e.prev_sibling_or_token())
        .find(is_newline_whitespace)
        .and_then(NodeOrToken::into_token)
}

/// Indent of the closest line start enclosing `element`
///
/// Looks for a line break among the preceding siblings of the element, then
/// of each ancestor in turn.
pub(super) fn parent_indent(element: &KtSyntaxElement, ledger: &IndentLedger) -> Option<i64> {
    let mut current = Some(element.clone());
    while let Some(el) = current {
        if let Some(whitespace) = previous_newline_whitespace(&el) {
            return Some(ledger.width_of(&whitespace));
        }
        current = el.parent().map(NodeOrToken::Node);
    }
    None
}

/// Zero-based column of `element` on its line
///
/// When the line starts with whitespace the ledger knows, the recorded width
/// is used instead of the written one.
pub(super) fn column_of(
    element: &KtSyntaxElement,
    root: &KtSyntaxNode,
    source: &str,
    ledger: &IndentLedger,
) -> i64 {
    let start = usize::from(element.text_range().start()).min(source.len());
    let chars_between = |from: usize| source.get(from..start).map_or(0, |s| s.chars().count()) as i64;
    let Some(newline) = source[..start].rfind('\n') else {
        return chars_between(0);
    };

    let line_start = u32::try_from(newline)
        .ok()
        .and_then(|offset| root.token_at_offset(TextSize::from(offset)).right_biased())
        .filter(|token| token.kind() == KtSyntaxKind::WhiteSpace);
    if let Some(whitespace) = line_start {
        let range = whitespace.text_range();
        let last_break = whitespace
            .text()
            .rfind('\n')
            .map(|i| usize::from(range.start()) + i);
        if last_break == Some(newline) {
            return ledger.width_of(&whitespace) + chars_between(usize::from(range.end()));
        }
    }
    chars_between(newline + 1)
}

/// Binary expression whose operator is `&&` or `||`
pub(super) fn is_boolean_expression(node: &KtSyntaxNode) -> bool {
    node.kind() == KtSyntaxKind::BinaryExpression
        && node
            .children()
            .find(|c| c.kind() == KtSyntaxKind::OperationReference)
            .and_then(|op| op.first_token())
            .is_some_and(|t| matches!(t.kind(), KtSyntaxKind::AndAnd | KtSyntaxKind::OrOr))
}
