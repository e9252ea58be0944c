//! Overrides of the default indentation for specific syntactic shapes
//!
//! Each checker looks at one line-break whitespace and either stays silent
//! or returns the indent its shape requires. The chain asks the checkers in a
//! fixed order and the first answer wins over the default from the depth
//! tracker.

use std::iter::successors;

use kolint_core::cst::is_newline_whitespace;
use kolint_core::{KtSyntaxElement, KtSyntaxKind, KtSyntaxNode, KtSyntaxToken};
use rowan::NodeOrToken;

use super::config::IndentationConfig;
use super::tree::{
    IndentLedger, ancestors, column_of, contains_newline, has_ancestor, is_boolean_expression,
    next_code_sibling, parent_indent,
};

use KtSyntaxKind::*;

/// Default verdict for one line: what the depth tracker expects and what
/// the source has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct IndentationError {
    pub expected: i64,
    pub actual: i64,
}

/// A checker's override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CheckResult {
    pub is_correct: bool,
    pub expected_indent: i64,
    /// Propagate the difference to the lines that follow inside the same
    /// construct
    pub adjust_next: bool,
    /// Whether the propagated indent also covers the construct's closing
    /// delimiter
    pub include_last_child: bool,
}

impl CheckResult {
    fn new(actual: i64, expected: i64, adjust_next: bool) -> Self {
        Self {
            is_correct: actual == expected,
            expected_indent: expected,
            adjust_next,
            include_last_child: true,
        }
    }

    fn excluding_last_child(mut self) -> Self {
        self.include_last_child = false;
        self
    }
}

/// What a checker may look at besides the whitespace itself
pub(super) struct CheckerContext<'a> {
    pub config: &'a IndentationConfig,
    pub ledger: &'a IndentLedger,
    pub root: &'a KtSyntaxNode,
    pub source: &'a str,
}

impl CheckerContext<'_> {
    fn parent_indent(&self, element: &KtSyntaxElement) -> Option<i64> {
        parent_indent(element, self.ledger)
    }

    fn step(&self, extended: bool) -> i64 {
        self.config.step(extended)
    }
}

pub(super) trait IndentationChecker: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult>;
}

/// Checkers in the order they are asked
pub(super) fn checker_chain() -> Vec<Box<dyn IndentationChecker>> {
    vec![
        Box::new(AssignmentOperatorChecker),
        Box::new(ConditionalsAndLoopsWithoutBracesChecker),
        Box::new(SuperTypeListChecker),
        Box::new(ValueParameterListChecker),
        Box::new(ExpressionIndentationChecker),
        Box::new(DotCallChecker),
        Box::new(KdocIndentationChecker),
        Box::new(CustomGettersAndSettersChecker),
        Box::new(ArrowInWhenChecker),
    ]
}

fn element(token: &KtSyntaxToken) -> KtSyntaxElement {
    NodeOrToken::Token(token.clone())
}

fn first_kind(node: &KtSyntaxNode) -> Option<KtSyntaxKind> {
    node.first_child_or_token().map(|c| c.kind())
}

/// Expression body after `=` on the next line
struct AssignmentOperatorChecker;

impl IndentationChecker for AssignmentOperatorChecker {
    fn name(&self) -> &'static str {
        "assignment"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let prev = whitespace.prev_sibling_or_token()?;
        if prev.kind() != Eq || !whitespace.text().contains('\n') {
            return None;
        }
        let base = ctx.parent_indent(&element(whitespace)).unwrap_or(error.expected);
        let expected = base + ctx.step(ctx.config.extended_indent_for_expression_bodies);
        Some(CheckResult::new(error.actual, expected, true))
    }
}

/// `if`/`else` branches and loop bodies without braces
struct ConditionalsAndLoopsWithoutBracesChecker;

impl IndentationChecker for ConditionalsAndLoopsWithoutBracesChecker {
    fn name(&self) -> &'static str {
        "conditionals-and-loops"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let parent = whitespace.parent()?;
        let next = next_code_sibling(&element(whitespace))?;
        let content = next
            .as_node()
            .and_then(|branch| branch.children().next())
            .map(|c| c.kind());

        let applies = if parent.kind().is_loop() {
            next.kind() == Body && content != Some(Block)
        } else if parent.kind() == If {
            (next.kind() == Then && content != Some(Block))
                || (next.kind() == Else && !matches!(content, Some(Block | If)))
        } else {
            false
        };

        applies.then(|| {
            CheckResult::new(error.actual, error.expected + ctx.config.indent_size(), true)
        })
    }
}

/// `: Base(), Other` after a class header
struct SuperTypeListChecker;

impl IndentationChecker for SuperTypeListChecker {
    fn name(&self) -> &'static str {
        "super-type-list"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let next = whitespace.next_sibling_or_token()?;
        if next.kind() == SuperTypeList {
            let colon_on_new_line = successors(whitespace.prev_sibling_or_token(), |e| {
                e.prev_sibling_or_token()
            })
            .find(|e| e.kind() == Colon)
            .and_then(|colon| colon.prev_sibling_or_token())
            .is_some_and(|before| is_newline_whitespace(&before));
            let expected = error.expected + ctx.step(colon_on_new_line);
            return Some(CheckResult::new(error.actual, expected, false));
        }

        if whitespace.parent()?.kind() == SuperTypeList {
            let expected = ctx
                .parent_indent(&element(whitespace))
                .unwrap_or(error.expected + ctx.config.indent_size());
            return Some(CheckResult::new(error.actual, expected, false));
        }
        None
    }
}

/// The first line break inside a parameter or argument list
struct ValueParameterListChecker;

impl ValueParameterListChecker {
    fn is_check_needed(whitespace: &KtSyntaxToken, list: &KtSyntaxNode) -> bool {
        if !matches!(list.kind(), ValueParameterList | ValueArgumentList) {
            return false;
        }
        let me = element(whitespace);
        let earlier_break =
            successors(me.prev_sibling_or_token(), |e| e.prev_sibling_or_token())
                .any(|e| is_newline_whitespace(&e));
        let more_items = successors(me.next_sibling_or_token(), |e| e.next_sibling_or_token())
            .any(|e| matches!(e.kind(), ValueParameter | ValueArgument));
        !earlier_break && more_items
    }
}

impl IndentationChecker for ValueParameterListChecker {
    fn name(&self) -> &'static str {
        "value-parameter-list"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let list = whitespace.parent()?;
        if !Self::is_check_needed(whitespace, &list) {
            return None;
        }

        // Lambda parameter lists have no parentheses
        let first_after_lpar = list
            .children_with_tokens()
            .find(|e| e.kind() == Lpar)
            .and_then(|lpar| lpar.next_sibling_or_token())
            .filter(|e| e.kind() != WhiteSpace && !contains_newline(e));

        let expected = match first_after_lpar {
            Some(first) if ctx.config.aligned_parameters && list.kind() == ValueParameterList => {
                column_of(&first, ctx.root, ctx.source, ctx.ledger)
            }
            _ if ctx.config.extended_indent_of_parameters => {
                error.expected + ctx.config.indent_size()
            }
            _ => error.expected,
        };
        Some(CheckResult::new(error.actual, expected, true).excluding_last_child())
    }
}

/// Operand continuing after a binary operator or a cast
struct ExpressionIndentationChecker;

impl IndentationChecker for ExpressionIndentationChecker {
    fn name(&self) -> &'static str {
        "binary-expression"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let parent = whitespace.parent()?;
        if !matches!(parent.kind(), BinaryExpression | BinaryWithType) {
            return None;
        }
        let is_operator = |sibling: Option<KtSyntaxElement>| {
            sibling
                .and_then(NodeOrToken::into_node)
                .is_some_and(|n| n.kind() == OperationReference && first_kind(&n) != Some(Elvis))
        };
        if !(is_operator(whitespace.prev_sibling_or_token())
            || is_operator(whitespace.next_sibling_or_token()))
        {
            return None;
        }

        let base = ctx.parent_indent(&element(whitespace)).unwrap_or(error.expected);
        let expected = base + ctx.step(ctx.config.extended_indent_after_operators);
        Some(CheckResult::new(error.actual, expected, true))
    }
}

/// Wrapped `.call()`, `?.call()`, `?:` and casts
struct DotCallChecker;

impl DotCallChecker {
    fn is_dot_before_call_or_reference(element: &KtSyntaxElement) -> bool {
        matches!(element.kind(), Dot | SafeAccess)
            && element
                .next_sibling_or_token()
                .is_some_and(|next| next.kind().is_call_or_reference())
    }

    fn is_elvis_reference(element: &KtSyntaxElement) -> bool {
        element
            .as_node()
            .is_some_and(|n| n.kind() == OperationReference && first_kind(n) == Some(Elvis))
    }

    fn is_chain_operator_reference(element: &KtSyntaxElement) -> bool {
        element.as_node().is_some_and(|n| {
            n.kind() == OperationReference
                && matches!(first_kind(n), Some(Elvis | AsKeyword | AsSafe))
        })
    }

    /// A comment whose next code (skipping line comments) matches
    fn is_comment_before(
        element: &KtSyntaxElement,
        predicate: fn(&KtSyntaxElement) -> bool,
    ) -> bool {
        if !element.kind().is_comment() {
            return false;
        }
        successors(element.next_sibling_or_token(), |e| e.next_sibling_or_token())
            .find(|e| !matches!(e.kind(), WhiteSpace | EolComment))
            .is_some_and(|e| predicate(&e))
    }
}

impl IndentationChecker for DotCallChecker {
    fn name(&self) -> &'static str {
        "dot-call"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let next = whitespace.next_sibling_or_token()?;
        let elvis = Self::is_elvis_reference(&next)
            || Self::is_comment_before(&next, Self::is_elvis_reference);
        let triggers = elvis
            || Self::is_dot_before_call_or_reference(&next)
            || Self::is_chain_operator_reference(&next)
            || Self::is_comment_before(&next, Self::is_dot_before_call_or_reference);
        if !triggers {
            return None;
        }

        let step = ctx.step(ctx.config.extended_indent_before_dot);
        if has_ancestor(whitespace, LongStringTemplateEntry) {
            return Some(CheckResult::new(error.actual, error.expected + step, true));
        }

        // The nearest binary expression for `?:`, so a boolean operand is not
        // indented twice; the outermost chain for dots, so every link of a
        // chain lands on the same column
        let parents: Vec<KtSyntaxNode> = ancestors(whitespace)
            .take_while(|p| {
                if elvis {
                    p.kind() == BinaryExpression
                } else {
                    p.kind().is_chain_expression()
                }
            })
            .collect();
        let anchor = if elvis { parents.first() } else { parents.last() };
        let base = match anchor {
            Some(node) => ctx.parent_indent(&NodeOrToken::Node(node.clone())),
            None => ctx.parent_indent(&element(whitespace)),
        }
        .unwrap_or(0);

        let expected = if elvis && parents.iter().any(is_boolean_expression) {
            base
        } else {
            base + step
        };
        Some(CheckResult::new(error.actual, expected, true))
    }
}

/// Leading `*` and closing `*/` of a doc comment sit one column right
struct KdocIndentationChecker;

impl IndentationChecker for KdocIndentationChecker {
    fn name(&self) -> &'static str {
        "kdoc"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        _ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let next = whitespace.next_sibling_or_token()?;
        matches!(next.kind(), KdocLeadingAsterisk | KdocEnd)
            .then(|| CheckResult::new(error.actual, error.expected + 1, false))
    }
}

/// `get()`/`set()` on the lines after a property
struct CustomGettersAndSettersChecker;

impl IndentationChecker for CustomGettersAndSettersChecker {
    fn name(&self) -> &'static str {
        "accessors"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let property = whitespace.parent()?;
        let next = whitespace.next_sibling_or_token()?;
        if property.kind() != Property || next.kind() != PropertyAccessor {
            return None;
        }
        let base = ctx
            .parent_indent(&NodeOrToken::Node(property))
            .unwrap_or(error.expected);
        Some(CheckResult::new(
            error.actual,
            base + ctx.config.indent_size(),
            true,
        ))
    }
}

/// Body of a `when` entry on the line after `->`
struct ArrowInWhenChecker;

impl IndentationChecker for ArrowInWhenChecker {
    fn name(&self) -> &'static str {
        "arrow-in-when"
    }

    fn check(
        &self,
        whitespace: &KtSyntaxToken,
        error: IndentationError,
        ctx: &CheckerContext<'_>,
    ) -> Option<CheckResult> {
        let prev = whitespace.prev_sibling_or_token()?;
        if prev.kind() != Arrow || whitespace.parent()?.kind() != WhenEntry {
            return None;
        }
        let base = ctx.parent_indent(&element(whitespace)).unwrap_or(error.expected);
        Some(CheckResult::new(
            error.actual,
            base + ctx.config.indent_size(),
            true,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::indentation::tree::last_indent;
    use kolint_core::parse_kotlin;

    /// Ask the chain about the line that starts right before `needle`
    fn first_answer(
        source: &str,
        needle: &str,
        config: &IndentationConfig,
        default: i64,
    ) -> Option<(&'static str, CheckResult)> {
        let (root, _) = parse_kotlin(source);
        let offset = source.find(needle).expect("needle present");
        let whitespace = root
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .filter(|t| t.kind() == WhiteSpace && t.text().contains('\n'))
            .find(|t| usize::from(t.text_range().end()) == offset)
            .expect("line break right before needle");
        let ledger = IndentLedger::default();
        let ctx = CheckerContext {
            config,
            ledger: &ledger,
            root: &root,
            source,
        };
        let error = IndentationError {
            expected: default,
            actual: last_indent(whitespace.text()),
        };
        checker_chain()
            .iter()
            .find_map(|c| c.check(&whitespace, error, &ctx).map(|r| (c.name(), r)))
    }

    #[test]
    fn test_chain_order() {
        let names: Vec<_> = checker_chain().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "assignment",
                "conditionals-and-loops",
                "super-type-list",
                "value-parameter-list",
                "binary-expression",
                "dot-call",
                "kdoc",
                "accessors",
                "arrow-in-when",
            ]
        );
    }

    #[test]
    fn test_assignment() {
        let config = IndentationConfig::default();
        let source = "fun f() {\n    val x =\n        false\n}\n";
        let (name, result) = first_answer(source, "false", &config, 4).unwrap();
        assert_eq!(name, "assignment");
        assert_eq!(result.expected_indent, 8);
        assert!(result.is_correct);
        assert!(result.adjust_next);
    }

    #[test]
    fn test_conditional_branch() {
        let config = IndentationConfig::default();
        let source = "fun f() {\n    if (a)\n        b()\n    else\n        c()\n}\n";
        let (name, result) = first_answer(source, "b()", &config, 4).unwrap();
        assert_eq!(name, "conditionals-and-loops");
        assert_eq!(result.expected_indent, 8);
        let (_, result) = first_answer(source, "c()", &config, 4).unwrap();
        assert_eq!(result.expected_indent, 8);
        assert!(first_answer(source, "else", &config, 4).is_none());
    }

    #[test]
    fn test_else_if_is_not_a_braceless_branch() {
        let config = IndentationConfig::default();
        let source = "fun f() {\n    if (a) {\n    } else\n    if (b) {\n    }\n}\n";
        assert!(first_answer(source, "if (b)", &config, 4).is_none());
    }

    #[test]
    fn test_loop_body() {
        let config = IndentationConfig::default();
        let source = "fun f() {\n    for (x in xs)\n        use(x)\n}\n";
        let (name, result) = first_answer(source, "use(x)", &config, 4).unwrap();
        assert_eq!(name, "conditionals-and-loops");
        assert_eq!(result.expected_indent, 8);
    }

    #[test]
    fn test_super_type_list() {
        let config = IndentationConfig::default();
        let source = "class A(x: Int) :\n    B(x),\n    C\n";
        let (name, result) = first_answer(source, "B(x)", &config, 0).unwrap();
        assert_eq!(name, "super-type-list");
        assert_eq!(result.expected_indent, 4);
        assert!(!result.adjust_next);
        let (_, result) = first_answer(source, "C\n", &config, 0).unwrap();
        assert_eq!(result.expected_indent, 4);
    }

    #[test]
    fn test_aligned_parameters() {
        let config = IndentationConfig::default();
        let source = "fun foo(a: Int,\n        b: Int) {}\n";
        let (name, result) = first_answer(source, "b: Int", &config, 4).unwrap();
        assert_eq!(name, "value-parameter-list");
        assert_eq!(result.expected_indent, 8);
        assert!(!result.include_last_child);

        let config = IndentationConfig {
            aligned_parameters: false,
            ..IndentationConfig::default()
        };
        let (_, result) = first_answer(source, "b: Int", &config, 4).unwrap();
        assert_eq!(result.expected_indent, 4);
    }

    #[test]
    fn test_arguments_are_not_aligned() {
        let config = IndentationConfig::default();
        let source = "val x = foo(a,\n    b)\n";
        let (_, result) = first_answer(source, "b)", &config, 4).unwrap();
        assert_eq!(result.expected_indent, 4);

        let config = IndentationConfig {
            extended_indent_of_parameters: true,
            ..IndentationConfig::default()
        };
        let (_, result) = first_answer(source, "b)", &config, 4).unwrap();
        assert_eq!(result.expected_indent, 8);
    }

    #[test]
    fn test_binary_operator() {
        let config = IndentationConfig::default();
        let source = "val ok = a &&\n        b\n";
        let (name, result) = first_answer(source, "b\n", &config, 0).unwrap();
        assert_eq!(name, "binary-expression");
        assert_eq!(result.expected_indent, 8);

        let config = IndentationConfig {
            extended_indent_after_operators: false,
            ..IndentationConfig::default()
        };
        let (_, result) = first_answer(source, "b\n", &config, 0).unwrap();
        assert_eq!(result.expected_indent, 4);
    }

    #[test]
    fn test_dot_call_uses_outermost_chain() {
        let config = IndentationConfig::default();
        let source = "a\n    .b()\n    .c()\n";
        let (name, result) = first_answer(source, ".b()", &config, 0).unwrap();
        assert_eq!(name, "dot-call");
        assert_eq!(result.expected_indent, 4);
        let (_, result) = first_answer(source, ".c()", &config, 0).unwrap();
        assert_eq!(result.expected_indent, 4);
    }

    #[test]
    fn test_elvis_inside_boolean_expression() {
        let config = IndentationConfig::default();
        let source = "val ok = a &&\n        b\n        ?: c\n";
        let (name, result) = first_answer(source, "?: c", &config, 0).unwrap();
        assert_eq!(name, "dot-call");
        assert_eq!(result.expected_indent, 8);
    }

    #[test]
    fn test_kdoc_markers() {
        let config = IndentationConfig::default();
        let source = "/**\n * Doc\n */\nfun f() {}\n";
        let (name, result) = first_answer(source, "* Doc", &config, 0).unwrap();
        assert_eq!(name, "kdoc");
        assert_eq!(result.expected_indent, 1);
        let (_, result) = first_answer(source, "*/", &config, 0).unwrap();
        assert_eq!(result.expected_indent, 1);
    }

    #[test]
    fn test_accessor() {
        let config = IndentationConfig::default();
        let source = "class A {\n    val x: Int\n        get() = 1\n}\n";
        let (name, result) = first_answer(source, "get()", &config, 4).unwrap();
        assert_eq!(name, "accessors");
        assert_eq!(result.expected_indent, 8);
    }

    #[test]
    fn test_arrow_in_when() {
        let config = IndentationConfig::default();
        let source = "val y = when (x) {\n    1 ->\n        \"one\"\n    else -> \"other\"\n}\n";
        let (name, result) = first_answer(source, "\"one\"", &config, 4).unwrap();
        assert_eq!(name, "arrow-in-when");
        assert_eq!(result.expected_indent, 8);
    }

    #[test]
    fn test_plain_statement_has_no_override() {
        let config = IndentationConfig::default();
        let source = "fun f() {\n    g()\n}\n";
        assert!(first_answer(source, "g()", &config, 4).is_none());
    }
}
