//! One case per indentation override, with and without the option that
//! shapes it

mod common;

use common::{messages, messages_with};
use serde_json::json;

#[test]
fn assignment_body() {
    let source = "val x =\n    false\n";
    assert!(messages(source).is_empty());
    assert_eq!(
        messages_with(source, json!({ "extendedIndentForExpressionBodies": true })),
        vec!["expected 8 but was 4"]
    );
    assert!(
        messages_with("val x =\n        false\n", json!({ "extendedIndentForExpressionBodies": true }))
            .is_empty()
    );
}

#[test]
fn function_expression_body() {
    assert!(messages("fun add(a: Int, b: Int) =\n    a + b\n").is_empty());
    assert_eq!(
        messages("fun add(a: Int, b: Int) =\na + b\n"),
        vec!["expected 4 but was 0"]
    );
}

#[test]
fn braceless_if_and_else() {
    let source = "fun f() {\n    if (a)\n    b()\n    else\n    c()\n}\n";
    assert_eq!(
        messages(source),
        vec!["expected 8 but was 4", "expected 8 but was 4"]
    );
    assert!(messages("fun f() {\n    if (a)\n        b()\n    else\n        c()\n}\n").is_empty());
}

#[test]
fn else_if_stays_on_the_if_column() {
    let source = "fun f() {\n    if (a) {\n        b()\n    } else if (c) {\n        d()\n    }\n}\n";
    assert!(messages(source).is_empty());
}

#[test]
fn braceless_loops() {
    let source = "fun f() {\n    for (x in xs)\n    use(x)\n    while (more())\n        step()\n}\n";
    assert_eq!(messages(source), vec!["expected 8 but was 4"]);
}

#[test]
fn super_type_list() {
    assert!(messages("class A(x: Int) :\n    B(x),\n    C\n").is_empty());
    // `C` follows the written indent of the line above it in check mode
    assert_eq!(
        messages("class A(x: Int) :\nB(x),\nC\n"),
        vec!["expected 4 but was 0"]
    );
    assert_eq!(
        common::fix("class A(x: Int) :\nB(x),\nC\n"),
        "class A(x: Int) :\n    B(x),\n    C\n"
    );
}

#[test]
fn aligned_parameters() {
    let source = "fun foo(a: Int,\n        b: Int) {}\n";
    assert!(messages(source).is_empty());
    assert_eq!(
        messages_with(source, json!({ "alignedParameters": false })),
        vec!["expected 4 but was 8"]
    );
}

#[test]
fn parameters_starting_on_their_own_line() {
    let source = "fun foo(\n    a: Int,\n    b: Int\n) {}\n";
    assert!(messages(source).is_empty());
    assert_eq!(
        messages_with(source, json!({ "extendedIndentOfParameters": true })),
        vec!["expected 8 but was 4", "expected 8 but was 4"]
    );
}

#[test]
fn argument_lists_are_not_aligned() {
    let source = "val x = foo(a,\n    b)\n";
    assert!(messages(source).is_empty());
    assert_eq!(
        messages_with(source, json!({ "extendedIndentOfParameters": true })),
        vec!["expected 8 but was 4"]
    );
}

#[test]
fn binary_operator_continuation() {
    let source = "val ok = a &&\n        b\n";
    assert!(messages(source).is_empty());
    assert_eq!(
        messages_with(source, json!({ "extendedIndentAfterOperators": false })),
        vec!["expected 4 but was 8"]
    );
}

#[test]
fn wrapped_parenthesized_expression() {
    let source = "val y = (\n    a\n)\n";
    assert_eq!(messages(source), vec!["expected 8 but was 4"]);
    assert!(messages_with(source, json!({ "extendedIndentAfterOperators": false })).is_empty());
}

#[test]
fn dot_chain() {
    let source = "val x = items\n    .map { it }\n    .toList()\n";
    assert!(messages(source).is_empty());
    assert_eq!(
        messages_with(source, json!({ "extendedIndentBeforeDot": true })),
        vec!["expected 8 but was 4", "expected 8 but was 4"]
    );
}

#[test]
fn safe_call_chain() {
    assert!(messages("val n = user\n    ?.name\n    ?.length\n").is_empty());
}

#[test]
fn elvis_continuation() {
    assert!(messages("val name = user?.name\n    ?: \"anonymous\"\n").is_empty());
    assert_eq!(
        messages_with(
            "val name = user?.name\n    ?: \"anonymous\"\n",
            json!({ "extendedIndentBeforeDot": true })
        ),
        vec!["expected 8 but was 4"]
    );
}

#[test]
fn elvis_inside_boolean_operand_gets_no_extra_step() {
    assert!(messages("val ok = a &&\n        b\n        ?: c\n").is_empty());
}

#[test]
fn dot_call_inside_string_template() {
    // Lines after the first one inside `${` carry the template's extra step
    assert!(messages("val s = \"${\n    a\n            .b()\n}\"\n").is_empty());
    assert_eq!(
        messages("val s = \"${\n    a\n        .b()\n}\"\n"),
        vec!["expected 12 but was 8"]
    );
}

#[test]
fn kdoc_markers() {
    assert!(messages("/**\n * Doc\n */\nfun f() {}\n").is_empty());
    assert_eq!(
        messages("/**\n* Doc\n*/\nfun f() {}\n"),
        vec!["expected 1 but was 0", "expected 1 but was 0"]
    );
}

#[test]
fn property_accessors() {
    let source = "class A {\n    val x: Int\n        get() = 1\n}\n";
    assert!(messages(source).is_empty());
    assert_eq!(
        messages("class A {\n    val x: Int\n    get() = 1\n}\n"),
        vec!["expected 8 but was 4"]
    );
    assert_eq!(
        messages_with(source, json!({ "indentationSize": 2 })),
        vec!["expected 2 but was 4", "expected 6 but was 8"]
    );
}

#[test]
fn when_arrow_body() {
    let source = "val y = when (x) {\n    1 ->\n        \"one\"\n    else -> \"other\"\n}\n";
    assert!(messages(source).is_empty());
    assert_eq!(
        messages("val y = when (x) {\n    1 ->\n    \"one\"\n    else -> \"other\"\n}\n"),
        vec!["expected 8 but was 4"]
    );
}

#[test]
fn custom_indentation_size() {
    let source = "fun f() {\n  if (a)\n    b()\n}\n";
    assert!(messages_with(source, json!({ "indentationSize": 2 })).is_empty());
    assert_eq!(
        messages(source),
        vec!["expected 4 but was 2", "expected 8 but was 4"]
    );
}

#[test]
fn wrapped_casts_continue_the_expression() {
    let source = "fun foo() {\n    bar\n        .baz()\n            as Baz\n            as? Baz\n}\n";
    assert!(messages(source).is_empty());
    assert_eq!(common::fix(source), source);
}

#[test]
fn wrapped_cast_after_assignment() {
    let source = "fun x() {\n    val a = b\n        as String\n}\n";
    assert!(messages_with(source, json!({ "extendedIndentAfterOperators": false })).is_empty());
    assert_eq!(messages(source), vec!["expected 12 but was 8"]);
    assert_eq!(
        common::fix(source),
        "fun x() {\n    val a = b\n            as String\n}\n"
    );
}
