//! Running indentation state of one traversal
//!
//! The state is a `regular` indent driven by delimiters plus a list of
//! exceptional indents contributed by checker overrides. A new context is
//! created for every traversal and dropped with it.

use kolint_core::{KtSyntaxElement, KtSyntaxKind, KtSyntaxNode};

use super::tree::self_and_ancestors;

/// An open delimiter, or a marker that its increment was applied
///
/// A `WhiteSpace` entry records that a line break was seen after the
/// delimiter below it, which is when the delimiter's step takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveDelimiter {
    kind: KtSyntaxKind,
    change: i64,
}

/// Extra indent applied while the traversal is inside `initiator`
#[derive(Debug, Clone)]
struct ExceptionalIndent {
    initiator: KtSyntaxNode,
    indent: i64,
    include_last_child: bool,
}

impl ExceptionalIndent {
    fn is_active(&self, element: &KtSyntaxElement) -> bool {
        self_and_ancestors(element).any(|node| node == self.initiator)
            && (self.include_last_child
                || element.next_sibling_or_token() != self.initiator.last_child_or_token())
    }
}

#[derive(Debug, Default)]
pub(super) struct IndentContext {
    regular: i64,
    exceptions: Vec<ExceptionalIndent>,
    active: Vec<ActiveDelimiter>,
}

impl IndentContext {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Expected indent for a line starting here
    pub(super) fn indentation(&self) -> i64 {
        self.regular + self.exceptions.iter().map(|e| e.indent).sum::<i64>()
    }

    #[cfg(test)]
    pub(super) fn regular(&self) -> i64 {
        self.regular
    }

    /// Opening delimiters not closed yet
    #[cfg(test)]
    pub(super) fn open_delimiters(&self) -> usize {
        self.active
            .iter()
            .filter(|a| a.kind != KtSyntaxKind::WhiteSpace)
            .count()
    }

    pub(super) fn store_incrementing_token(&mut self, kind: KtSyntaxKind, change: i64) {
        self.active.push(ActiveDelimiter { kind, change });
    }

    /// Apply the innermost delimiter's step at the first line break after it
    pub(super) fn maybe_increment(&mut self) {
        if let Some(head) = self.active.last().copied()
            && head.kind != KtSyntaxKind::WhiteSpace
        {
            self.regular += head.change;
            self.active.push(ActiveDelimiter {
                kind: KtSyntaxKind::WhiteSpace,
                change: 0,
            });
        }
    }

    /// Close the delimiter matching `closer`
    ///
    /// The step is removed only if a line break applied it.
    pub(super) fn close(&mut self, closer: KtSyntaxKind) {
        let opener = closer.matching_opener();
        let head_is = |active: &[ActiveDelimiter], kind: Option<KtSyntaxKind>| {
            active.last().map(|a| a.kind).is_some_and(|k| Some(k) == kind)
        };

        if head_is(&self.active, Some(KtSyntaxKind::WhiteSpace)) {
            while head_is(&self.active, Some(KtSyntaxKind::WhiteSpace)) {
                self.active.pop();
            }
            if head_is(&self.active, opener)
                && let Some(head) = self.active.last()
            {
                self.regular -= head.change;
            }
        }
        if head_is(&self.active, opener) {
            self.active.pop();
        }
    }

    pub(super) fn add_exception(
        &mut self,
        initiator: KtSyntaxNode,
        indent: i64,
        include_last_child: bool,
    ) {
        self.exceptions.push(ExceptionalIndent {
            initiator,
            indent,
            include_last_child,
        });
    }

    /// Drop exceptional indents that no longer apply at `element`
    pub(super) fn check_and_reset(&mut self, element: &KtSyntaxElement) {
        self.exceptions.retain(|e| e.is_active(element));
    }
}
