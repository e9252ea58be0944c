//! Tab characters in whitespace

use kolint_core::{KtSyntaxKind, KtSyntaxNode, TextEdit};

use super::config::IndentationConfig;
use super::{TreeFix, Violation};

pub(super) const TABS_MESSAGE: &str = "tabs are not allowed for indentation";

/// One violation per whitespace token holding a tab, located at its first tab
///
/// The fix replaces every tab of the token with one indentation step.
pub(super) fn find_tabs(root: &KtSyntaxNode, config: &IndentationConfig) -> Vec<Violation> {
    let spaces = config.spaces();
    root.descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == KtSyntaxKind::WhiteSpace)
        .filter_map(|token| {
            let text = token.text();
            let first_tab = text.find('\t')?;
            let start = usize::from(token.text_range().start());
            let replaced = text.replace('\t', &spaces);
            Some(Violation {
                message: TABS_MESSAGE.to_string(),
                span: start + first_tab..start + first_tab + 1,
                replacement_span: start..start + text.len(),
                replacement: replaced.clone(),
                fix_message: "Replace tabs with spaces",
                fix: TreeFix::Token(TextEdit::new(token.text_range(), replaced)),
            })
        })
        .collect()
}
