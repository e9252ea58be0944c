//! Concrete Syntax Tree (CST) for Kotlin
//!
//! A lossless syntax tree built on Rowan. Every character of the input,
//! whitespace and comments included, is kept in the tree, so
//! `parse_kotlin(source).0.text() == source` always holds.
//!
//! ## Trivia placement
//!
//! Whitespace and comments are emitted lazily: they attach to whichever node
//! is open when the next real token or node starts. This yields the same
//! shapes Kotlin's PSI produces, for example the line break before `.bar()`
//! sits inside the `DotQualifiedExpression`, and the whitespace before a
//! closing `}` is the last-but-one child of the block.
//!
//! ## Example
//!
//! ```rust,ignore
//! use kolint_core::cst::{KtSyntaxKind, parse_kotlin};
//!
//! let (root, errors) = parse_kotlin("fun f() {\n    g()\n}\n");
//! assert!(errors.is_empty());
//! assert_eq!(root.kind(), KtSyntaxKind::File);
//! ```

mod language;
mod lexer;
mod nodes;
mod parser;
mod syntax_kind;


pub use language::KotlinLanguage;
pub use lexer::{CstToken, LexerError, lex_with_trivia};
pub use nodes::{
    KtSyntaxElement, KtSyntaxNode, KtSyntaxToken, dump_tree, is_newline_whitespace,
};
pub use parser::{ParseError, parse_kotlin};
pub use syntax_kind::{KindCategory, KtSyntaxKind};
