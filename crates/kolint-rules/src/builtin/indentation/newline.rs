//! Line break at the end of the file

use kolint_core::{KtSyntaxKind, KtSyntaxNode, TextEdit};

use super::{TreeFix, Violation};

/// Check that the file ends with exactly one line break
///
/// A last token that is not whitespace gets a `"\n"` token appended.
/// Trailing whitespace with no or several line breaks is rewritten to one
/// line break followed by its other characters.
pub(super) fn check_newline_at_end(root: &KtSyntaxNode, file_name: &str) -> Option<Violation> {
    let end = usize::from(root.text_range().end());
    let Some(last) = root.last_token() else {
        return Some(missing_newline(file_name, end));
    };

    let range = last.text_range();
    let span = usize::from(range.start())..usize::from(range.end());
    if last.kind() != KtSyntaxKind::WhiteSpace {
        let mut violation = missing_newline(file_name, end);
        violation.span = span;
        return Some(violation);
    }

    let breaks = last.text().matches('\n').count();
    if breaks == 1 {
        return None;
    }
    let message = if breaks == 0 {
        format!("no newline at the end of file {file_name}")
    } else {
        format!("too many blank lines at the end of file {file_name}")
    };
    let replacement = format!("\n{}", last.text().replace('\n', ""));
    Some(Violation {
        message,
        span: span.clone(),
        replacement_span: span,
        replacement: replacement.clone(),
        fix_message: "End the file with a single line break",
        fix: TreeFix::Token(TextEdit::new(range, replacement)),
    })
}

fn missing_newline(file_name: &str, end: usize) -> Violation {
    Violation {
        message: format!("no newline at the end of file {file_name}"),
        span: end..end,
        replacement_span: end..end,
        replacement: "\n".to_string(),
        fix_message: "Add a line break at the end of the file",
        fix: TreeFix::AppendWhitespace("\n"),
    }
}
