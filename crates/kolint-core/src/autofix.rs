//! Whitespace-only tree rewriting
//!
//! Fixes are collected as [`TextEdit`]s during a read-only pass and applied
//! afterwards. An edit replaces the text of exactly one token, so the tree
//! keeps its shape: node and token counts never change.

use rowan::{GreenToken, NodeOrToken, TextRange};
use similar::TextDiff;
use std::path::Path;

use crate::cst::{KtSyntaxKind, KtSyntaxNode};
use crate::error::KolintError;
use crate::result::Result;

/// Replacement text for the token covering `range`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }
}

/// Apply token edits and return the new root
///
/// Edits are applied back to front so earlier ranges stay valid. When two
/// edits target the same token the first one given wins. Untouched subtrees
/// are shared with the input tree.
pub fn apply_token_edits(root: &KtSyntaxNode, edits: &[TextEdit]) -> Result<KtSyntaxNode> {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| std::cmp::Reverse(edit.range.start()));
    ordered.dedup_by_key(|edit| edit.range);

    let mut current = root.clone();
    for edit in ordered {
        let token = match current.covering_element(edit.range) {
            NodeOrToken::Token(token) if token.text_range() == edit.range => token,
            _ => {
                return Err(KolintError::fix_error(format!(
                    "no token spans {:?}",
                    edit.range
                )));
            }
        };
        let green = token.replace_with(GreenToken::new(token.kind().into(), &edit.replacement));
        current = KtSyntaxNode::new_root(green);
    }
    Ok(current)
}

/// Append a token as the last child of the root
pub fn append_token(root: &KtSyntaxNode, kind: KtSyntaxKind, text: &str) -> KtSyntaxNode {
    let green = root.green();
    let index = green.children().len();
    let new_root = green.insert_child(index, NodeOrToken::Token(GreenToken::new(kind.into(), text)));
    KtSyntaxNode::new_root(new_root)
}

/// Render a unified diff between the original and fixed text
pub fn unified_diff(path: &Path, before: &str, after: &str) -> String {
    let name = path.display().to_string();
    let old_header = format!("a/{name}");
    let new_header = format!("b/{name}");
    let diff = TextDiff::from_lines(before, after);
    diff.unified_diff()
        .context_radius(3)
        .header(&old_header, &new_header)
        .to_string()
}
