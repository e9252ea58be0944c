//! End-to-end indentation scenarios through the rule engine

mod common;

use common::{check_with, fix, fix_with, messages, messages_with};
use serde_json::json;

#[test]
fn block_body_is_indented_one_step() {
    let source = "fun f() {\nval a = 1\n}";
    let options = json!({ "newlineAtEnd": false });

    let diagnostics = check_with(source, options.clone());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "expected 4 but was 0");
    assert_eq!(
        (diagnostics[0].location.line, diagnostics[0].location.column),
        (2, 1)
    );

    assert_eq!(fix_with(source, options), "fun f() {\n    val a = 1\n}");
}

#[test]
fn expression_body_after_assignment() {
    let source = "fun f() {\n    val x =\n    false\n}\n";
    assert_eq!(messages(source), vec!["expected 8 but was 4"]);
    assert_eq!(
        messages_with(source, json!({ "extendedIndentForExpressionBodies": true })),
        vec!["expected 12 but was 4"]
    );
    assert_eq!(fix(source), "fun f() {\n    val x =\n        false\n}\n");
}

#[test]
fn wrapped_dot_calls_share_one_column() {
    let source = "a\n.b()\n.c()\n";
    assert_eq!(
        messages(source),
        vec!["expected 4 but was 0", "expected 4 but was 0"]
    );
    assert_eq!(fix(source), "a\n    .b()\n    .c()\n");
    assert_eq!(
        fix_with(source, json!({ "extendedIndentBeforeDot": true })),
        "a\n        .b()\n        .c()\n"
    );
}

#[test]
fn tabs_suppress_the_indentation_pass_in_check_mode() {
    // The misindented `g()` line is not reported while tabs are present
    let source = "fun f() {\n\tval a = 1\n  g()\n}\n";
    let diagnostics = check_with(source, json!({}));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "tabs are not allowed for indentation");
    assert_eq!(
        (diagnostics[0].location.line, diagnostics[0].location.column),
        (2, 1)
    );
}

#[test]
fn tab_diagnostic_points_at_the_first_tab() {
    let diagnostics = check_with("fun f() {\n    \t\tg()\n}\n", json!({}));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        (diagnostics[0].location.line, diagnostics[0].location.column),
        (2, 5)
    );
}

#[test]
fn tabs_are_replaced_before_reindenting() {
    let source = "fun f() {\n\tval a = 1\n\t\tg()\n}";
    assert_eq!(fix(source), "fun f() {\n    val a = 1\n    g()\n}\n");
}

#[test]
fn tabs_follow_the_configured_step() {
    let source = "fun f() {\n\tg()\n}\n";
    assert_eq!(
        fix_with(source, json!({ "indentationSize": 2 })),
        "fun f() {\n  g()\n}\n"
    );
}

#[test]
fn missing_newline_at_end_of_file() {
    assert_eq!(
        messages("val a = 1"),
        vec!["no newline at the end of file Test.kt"]
    );
    assert_eq!(fix("val a = 1"), "val a = 1\n");
}

#[test]
fn blank_lines_at_end_of_file() {
    assert_eq!(
        messages("val a = 1\n\n\n"),
        vec!["too many blank lines at the end of file Test.kt"]
    );
    assert_eq!(fix("val a = 1\n\n\n"), "val a = 1\n");
}

#[test]
fn end_of_file_check_can_be_disabled() {
    assert!(messages_with("val a = 1", json!({ "newlineAtEnd": false })).is_empty());
}

#[test]
fn empty_file_gets_a_line_break() {
    assert_eq!(fix(""), "\n");
}

#[test]
fn check_mode_measures_against_written_lines() {
    // In check mode the `1` line is judged against the misindented line
    // above it; the fixer judges it against the corrected one
    let source = "fun f() {\n  val x =\n      1\n}\n";
    assert_eq!(messages(source), vec!["expected 4 but was 2"]);

    let result = common::lint(source, json!({}), kolint_rules::LintMode::Fix);
    let fixed_messages: Vec<_> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        fixed_messages,
        vec!["expected 4 but was 2", "expected 8 but was 6"]
    );
    assert_eq!(result.output_text, "fun f() {\n    val x =\n        1\n}\n");
}

#[test]
fn diagnostics_carry_a_safe_suggestion() {
    let diagnostics = check_with("fun f() {\n  g()\n}\n", json!({}));
    let diagnostic = &diagnostics[0];
    assert!(diagnostic.auto_fixable);
    assert_eq!(diagnostic.suggestions.len(), 1);
    assert_eq!(diagnostic.suggestions[0].replacement, "    ");
    assert_eq!(diagnostic.location.line, 2);
}

#[test]
fn report_for_a_messy_file() {
    let source = "class A {\nfun f() {\n  if (ok)\n  run()\n    }\n}";
    let report: Vec<String> = check_with(source, json!({}))
        .iter()
        .map(|d| format!("{}:{} {}", d.location.line, d.location.column, d.message))
        .collect();
    insta::assert_snapshot!(report.join("\n"), @r"
    2:1 expected 4 but was 0
    3:1 expected 8 but was 2
    4:1 expected 12 but was 2
    6:1 no newline at the end of file Test.kt
    ");
}

mod propagated_indent {
    use super::*;

    #[test]
    fn aligned_parameters_carry_to_following_parameters() {
        assert!(messages("fun foo(a: Int,\n        b: Int,\n        c: Int) {}\n").is_empty());
        assert_eq!(
            messages("fun foo(a: Int,\n    b: Int,\n    c: Int) {}\n"),
            vec!["expected 8 but was 4", "expected 8 but was 4"]
        );
    }

    #[test]
    fn aligned_parameters_release_the_closing_parenthesis() {
        assert!(messages("fun foo(a: Int,\n        b: Int\n) {}\n").is_empty());
    }

    #[test]
    fn wrapped_chain_carries_into_lambda_bodies() {
        let source = "val x = items\n    .map {\n        it * 2\n    }\n    .filter { it > 2 }\n";
        assert!(messages(source).is_empty());
    }

    #[test]
    fn expression_body_carries_into_arguments() {
        assert!(messages("val x =\n    foo(\n        1\n    )\n").is_empty());
    }

    #[test]
    fn braceless_branch_carries_into_arguments() {
        let source = "fun f() {\n    if (a)\n        foo(\n            1\n        )\n}\n";
        assert!(messages(source).is_empty());
    }

    #[test]
    fn template_block_is_indented_from_its_line() {
        assert!(messages("val s = \"${\n    a.b()\n}\"\n").is_empty());
    }
}

mod raw_strings {
    use super::*;

    const MOVED_ARGUMENT: &str =
        "fun f() {\n    foo(\n    \"\"\"\n        |hello\n    \"\"\".trimMargin()\n    )\n}\n";
    const FIXED_ARGUMENT: &str =
        "fun f() {\n    foo(\n        \"\"\"\n            |hello\n        \"\"\".trimMargin()\n    )\n}\n";

    #[test]
    fn trimmed_string_moves_with_its_line() {
        assert_eq!(messages(MOVED_ARGUMENT), vec!["expected 8 but was 4"]);
        assert_eq!(fix(MOVED_ARGUMENT), FIXED_ARGUMENT);
        assert!(messages(FIXED_ARGUMENT).is_empty());
    }

    #[test]
    fn misaligned_closing_quotes() {
        let source =
            "fun f() {\n    foo(\n        \"\"\"\n            |hello\n            \"\"\".trimMargin()\n    )\n}\n";
        let diagnostics = check_with(source, json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "the same number of indents to the opening and closing quotes was expected"
        );
        assert_eq!(
            (diagnostics[0].location.line, diagnostics[0].location.column),
            (3, 1)
        );
        assert_eq!(fix(source), FIXED_ARGUMENT);
    }

    #[test]
    fn body_keeps_its_shape_and_blank_lines() {
        let source = "fun f() {\n    val s =\n    \"\"\"\n        a\n\n          b\n    \"\"\".trimIndent()\n}\n";
        assert_eq!(messages(source), vec!["expected 8 but was 4"]);
        assert_eq!(
            fix(source),
            "fun f() {\n    val s =\n        \"\"\"\n            a\n\n              b\n        \"\"\".trimIndent()\n}\n"
        );
    }

    #[test]
    fn shallow_body_lines_end_up_one_step_in() {
        let source = "fun f() {\n    val s =\n    \"\"\"\n    a\n    \"\"\".trimIndent()\n}\n";
        assert_eq!(
            fix(source),
            "fun f() {\n    val s =\n        \"\"\"\n            a\n        \"\"\".trimIndent()\n}\n"
        );
    }

    #[test]
    fn other_calls_leave_the_string_alone() {
        let source = "fun f() {\n    val s =\n    \"\"\"\n        a\n    \"\"\".lines()\n}\n";
        assert_eq!(
            fix(source),
            "fun f() {\n    val s =\n        \"\"\"\n        a\n    \"\"\".lines()\n}\n"
        );
    }

    #[test]
    fn string_opened_mid_line_is_not_touched() {
        let source = "fun f() {\nval s = \"\"\"\n    a\n\"\"\".trimIndent()\n}\n";
        assert_eq!(
            fix(source),
            "fun f() {\n    val s = \"\"\"\n    a\n\"\"\".trimIndent()\n}\n"
        );
    }
}
