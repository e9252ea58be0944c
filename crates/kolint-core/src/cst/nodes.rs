//! Red-tree aliases and small helpers shared by rules

use std::fmt::Write;

use super::{KotlinLanguage, KtSyntaxKind};

/// Kotlin syntax node (red tree)
pub type KtSyntaxNode = rowan::SyntaxNode<KotlinLanguage>;

/// Kotlin syntax token (red tree)
pub type KtSyntaxToken = rowan::SyntaxToken<KotlinLanguage>;

/// Either a node or a token
pub type KtSyntaxElement = rowan::SyntaxElement<KotlinLanguage>;

/// True for a whitespace token whose text holds at least one line break
pub fn is_newline_whitespace(element: &KtSyntaxElement) -> bool {
    element
        .as_token()
        .is_some_and(|token| token.kind() == KtSyntaxKind::WhiteSpace && token.text().contains('\n'))
}

/// Render a tree as an indented outline, one element per line
///
/// Tokens are printed with their text escaped; used by tests and `--verbose`
/// debugging output.
pub fn dump_tree(node: &KtSyntaxNode) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for event in node.preorder_with_tokens() {
        match event {
            rowan::WalkEvent::Enter(element) => {
                let indent = "  ".repeat(depth);
                match &element {
                    rowan::NodeOrToken::Node(n) => {
                        let _ = writeln!(out, "{indent}{:?}", n.kind());
                        depth += 1;
                    }
                    rowan::NodeOrToken::Token(t) => {
                        let _ = writeln!(out, "{indent}{:?} {:?}", t.kind(), t.text());
                    }
                }
            }
            rowan::WalkEvent::Leave(rowan::NodeOrToken::Node(_)) => {
                depth = depth.saturating_sub(1);
            }
            rowan::WalkEvent::Leave(rowan::NodeOrToken::Token(_)) => {}
        }
    }
    out
}
