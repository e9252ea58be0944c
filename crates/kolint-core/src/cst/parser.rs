//! Kotlin parser building a lossless Rowan tree
//!
//! Recursive descent for declarations and statements with a binding-power
//! loop for binary operators. The parser never fails: anything it cannot
//! place is wrapped in an `Error` node, so the tree text always equals the
//! input.
//!
//! Trivia is not attached eagerly. Whitespace and comments are flushed into
//! whichever node is open when the next token or node starts, which gives the
//! PSI-like placement indentation rules rely on.

use rowan::{Checkpoint, GreenNodeBuilder};
use std::ops::Range;

use super::lexer::{CstToken, lex_with_trivia};
use super::{KtSyntaxKind, KtSyntaxNode};

use KtSyntaxKind::*;

/// Parse error with the byte span it refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
}

/// Parse Kotlin source into a lossless syntax tree
///
/// Lexer errors are reported alongside parser errors.
pub fn parse_kotlin(source: &str) -> (KtSyntaxNode, Vec<ParseError>) {
    let (tokens, lex_errors) = lex_with_trivia(source);
    let mut parser = Parser::new(tokens);
    parser
        .errors
        .extend(lex_errors.into_iter().map(|e| ParseError {
            message: e.message,
            span: e.span,
        }));
    parser.parse_file();
    let green = parser.builder.finish();
    (KtSyntaxNode::new_root(green), parser.errors)
}

/// Declaration keywords that may follow a modifier list
const DECLARATION_KEYWORDS: &[KtSyntaxKind] = &[
    ClassKeyword,
    InterfaceKeyword,
    FunKeyword,
    ValKeyword,
    VarKeyword,
    ObjectKeyword,
    TypealiasKeyword,
];

struct Parser {
    tokens: Vec<CstToken>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
    /// Whether a line break ends the current expression; `false` inside
    /// parentheses, brackets and string template entries
    newline_modes: Vec<bool>,
}

impl Parser {
    fn new(tokens: Vec<CstToken>) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            newline_modes: vec![true],
        }
    }

    // ===== Token access =====

    /// Index of the n-th non-trivia token at or after `pos`
    fn significant_index(&self, n: usize) -> Option<usize> {
        self.tokens
            .iter()
            .enumerate()
            .skip(self.pos)
            .filter(|(_, t)| !t.kind.is_trivia())
            .nth(n)
            .map(|(i, _)| i)
    }

    fn significant_pos(&self) -> usize {
        self.significant_index(0).unwrap_or(self.tokens.len())
    }

    fn nth(&self, n: usize) -> Option<KtSyntaxKind> {
        self.significant_index(n).map(|i| self.tokens[i].kind)
    }

    fn nth_text(&self, n: usize) -> &str {
        self.significant_index(n)
            .map(|i| self.tokens[i].text.as_str())
            .unwrap_or("")
    }

    fn current(&self) -> Option<KtSyntaxKind> {
        self.nth(0)
    }

    /// Kind of the very next token, trivia included
    fn raw_current(&self) -> Option<KtSyntaxKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn at(&self, kind: KtSyntaxKind) -> bool {
        self.current() == Some(kind)
    }

    fn at_any(&self, kinds: &[KtSyntaxKind]) -> bool {
        self.current().is_some_and(|k| kinds.contains(&k))
    }

    fn at_identifier(&self, text: &str) -> bool {
        self.at(Identifier) && self.nth_text(0) == text
    }

    fn at_eof(&self) -> bool {
        self.current().is_none()
    }

    /// Whether trivia between `pos` and the next real token holds a line break
    fn newline_before(&self) -> bool {
        self.tokens[self.pos..]
            .iter()
            .take_while(|t| t.kind.is_trivia())
            .any(|t| t.kind == WhiteSpace && (t.text.contains('\n') || t.text.contains('\r')))
    }

    fn newlines_significant(&self) -> bool {
        self.newline_modes.last().copied().unwrap_or(true)
    }

    /// `at(kind)` that refuses to continue across a significant line break
    fn at_same_line(&self, kind: KtSyntaxKind) -> bool {
        self.at(kind) && !(self.newlines_significant() && self.newline_before())
    }

    fn with_newlines<T>(&mut self, significant: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        self.newline_modes.push(significant);
        let result = f(self);
        self.newline_modes.pop();
        result
    }

    // ===== Tree building =====

    fn emit_current(&mut self) {
        let token = &self.tokens[self.pos];
        self.builder.token(token.kind.into(), token.text.as_str());
        self.pos += 1;
    }

    /// Emit pending trivia into the currently open node
    fn flush_trivia(&mut self) {
        while let Some(kind) = self.raw_current() {
            if !kind.is_trivia() {
                break;
            }
            if kind == KdocStart {
                self.builder.start_node(Kdoc.into());
                self.emit_current();
                while let Some(inner) = self.raw_current() {
                    if !matches!(inner, KdocText | KdocLeadingAsterisk | WhiteSpace | KdocEnd) {
                        break;
                    }
                    self.emit_current();
                    if inner == KdocEnd {
                        break;
                    }
                }
                self.builder.finish_node();
            } else {
                self.emit_current();
            }
        }
    }

    fn bump(&mut self) {
        self.flush_trivia();
        if self.pos < self.tokens.len() {
            self.emit_current();
        }
    }

    fn start(&mut self, kind: KtSyntaxKind) {
        self.flush_trivia();
        self.builder.start_node(kind.into());
    }

    fn finish(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        self.builder.checkpoint()
    }

    fn wrap(&mut self, checkpoint: Checkpoint, kind: KtSyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        let span = self
            .significant_index(0)
            .map(|i| self.tokens[i].span.clone())
            .unwrap_or_else(|| {
                let end = self.tokens.last().map(|t| t.span.end).unwrap_or(0);
                end..end
            });
        self.errors.push(ParseError {
            message: message.into(),
            span,
        });
    }

    fn error_and_bump(&mut self, message: &str) {
        self.error(message);
        self.start(Error);
        self.bump();
        self.finish();
    }

    fn expect(&mut self, kind: KtSyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error(format!("expected {kind}"));
            false
        }
    }

    fn reference(&mut self) {
        self.start(ReferenceExpression);
        self.bump();
        self.finish();
    }

    fn operation_reference(&mut self) {
        self.start(OperationReference);
        self.bump();
        self.finish();
    }

    // ===== File structure =====

    fn parse_file(&mut self) {
        self.builder.start_node(File.into());

        while self.at(At) && self.nth(1) == Some(Identifier) && self.nth_text(1) == "file" {
            self.annotation();
        }
        if self.at(PackageKeyword) {
            self.start(PackageDirective);
            self.bump();
            self.qualified_name();
            self.finish();
        }
        if self.at(ImportKeyword) {
            self.start(ImportList);
            while self.at(ImportKeyword) {
                self.import_directive();
            }
            self.finish();
        }
        while !self.at_eof() {
            self.statement();
        }

        self.flush_trivia();
        self.finish();
    }

    /// `a.b.c` or `a.b.*` on one line
    fn qualified_name(&mut self) {
        if !self.at(Identifier) {
            self.error("expected a name");
            return;
        }
        let checkpoint = self.checkpoint();
        self.reference();
        while self.at(Dot)
            && !self.newline_before()
            && matches!(self.nth(1), Some(Identifier | Mul))
        {
            self.wrap(checkpoint, DotQualifiedExpression);
            self.bump();
            if self.at(Identifier) {
                self.reference();
            } else {
                self.bump();
            }
            self.finish();
        }
    }

    fn import_directive(&mut self) {
        self.start(ImportDirective);
        self.bump();
        self.qualified_name();
        if self.at_same_line(AsKeyword) {
            self.start(ImportAlias);
            self.bump();
            if self.at(Identifier) {
                self.bump();
            }
            self.finish();
        }
        self.finish();
    }

    // ===== Statements =====

    fn statement(&mut self) {
        let before = self.significant_pos();
        if self.at(Semicolon) {
            self.bump();
            return;
        }
        if self.at_declaration_start() {
            self.declaration();
        } else {
            self.expression();
        }
        if self.significant_pos() == before {
            self.error_and_bump("expected a declaration or statement");
        }
    }

    fn statements_until_rbrace(&mut self) {
        while !self.at_eof() && !self.at(Rbrace) {
            self.statement();
        }
    }

    fn block(&mut self) {
        self.start(Block);
        self.bump();
        self.with_newlines(true, |p| p.statements_until_rbrace());
        self.expect(Rbrace);
        self.finish();
    }

    /// Body of `if`/`when`/loops: a block or a single expression
    fn control_body(&mut self) {
        if self.at(Lbrace) {
            self.block();
        } else if !self.at_eof() && !self.at_any(&[Semicolon, Rbrace, Rpar]) {
            self.expression();
        }
    }

    // ===== Declarations =====

    fn at_declaration_start(&self) -> bool {
        let mut n = 0;
        loop {
            match self.nth(n) {
                Some(At) => return true,
                Some(ObjectKeyword) => return self.nth(n + 1) != Some(Colon),
                Some(kind) if DECLARATION_KEYWORDS.contains(&kind) => return true,
                Some(Identifier) if KtSyntaxKind::is_modifier_word(self.nth_text(n)) => {
                    match self.nth(n + 1) {
                        Some(Identifier)
                            if KtSyntaxKind::is_modifier_word(self.nth_text(n + 1)) =>
                        {
                            n += 1
                        }
                        Some(At) => return true,
                        Some(kind) if DECLARATION_KEYWORDS.contains(&kind) => return true,
                        _ => return false,
                    }
                }
                _ => return false,
            }
        }
    }

    fn at_modifier(&self) -> bool {
        match self.current() {
            Some(At) => true,
            Some(Identifier) if KtSyntaxKind::is_modifier_word(self.nth_text(0)) => {
                match self.nth(1) {
                    Some(At) => true,
                    Some(kind) if DECLARATION_KEYWORDS.contains(&kind) => true,
                    Some(Identifier) => {
                        let next = self.nth_text(1);
                        KtSyntaxKind::is_modifier_word(next)
                            || matches!(next, "get" | "set" | "constructor")
                            || matches!(self.nth_text(0), "vararg" | "noinline" | "crossinline")
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Parse a modifier list if one starts here; returns the modifier words seen
    fn modifier_list(&mut self) -> Vec<String> {
        let mut words = Vec::new();
        if !self.at_modifier() {
            return words;
        }
        self.start(ModifierList);
        while self.at_modifier() {
            if self.at(At) {
                self.annotation();
            } else {
                words.push(self.nth_text(0).to_string());
                self.bump();
            }
        }
        self.finish();
        words
    }

    fn annotation(&mut self) {
        self.start(AnnotationEntry);
        self.bump();
        // Use-site target, as in `@file:JvmName` or `@get:Rule`
        if self.raw_current() == Some(Identifier)
            && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(Colon)
        {
            self.bump();
            self.bump();
        }
        if self.at(Identifier) {
            self.start(ConstructorCallee);
            self.start(TypeReference);
            self.user_type(false);
            self.finish();
            self.finish();
        }
        if self.raw_current() == Some(Lpar) {
            self.value_argument_list();
        }
        self.finish();
    }

    fn declaration(&mut self) {
        let checkpoint = self.checkpoint();
        let modifiers = self.modifier_list();
        match self.current() {
            Some(ClassKeyword | InterfaceKeyword) => {
                let is_enum = modifiers.iter().any(|m| m == "enum");
                self.class(checkpoint, is_enum);
            }
            Some(ObjectKeyword) => {
                self.wrap(checkpoint, ObjectDeclaration);
                self.object_rest();
                self.finish();
            }
            Some(FunKeyword) => self.function(checkpoint),
            Some(ValKeyword | VarKeyword) => self.property(checkpoint),
            Some(TypealiasKeyword) => self.type_alias(checkpoint),
            // Annotated expression
            _ => self.expression(),
        }
    }

    fn class(&mut self, checkpoint: Checkpoint, is_enum: bool) {
        self.wrap(checkpoint, Class);
        self.bump();
        if self.at(Identifier) {
            self.bump();
        }
        if self.at(Lt) {
            self.type_parameter_list();
        }
        if self.at_primary_constructor() {
            self.start(PrimaryConstructor);
            if self.at(Identifier) && self.nth_text(0) != "constructor" {
                self.start(ModifierList);
                while self.at(Identifier) && self.nth_text(0) != "constructor" {
                    self.bump();
                }
                self.finish();
            }
            if self.at_identifier("constructor") {
                self.bump();
            }
            if self.at(Lpar) {
                self.value_parameter_list();
            }
            self.finish();
        }
        if self.at(Colon) {
            self.bump();
            self.super_type_list();
        }
        if self.at(Lbrace) {
            self.class_body(is_enum);
        }
        self.finish();
    }

    fn at_primary_constructor(&self) -> bool {
        if self.at(Lpar) {
            return true;
        }
        let mut n = 0;
        while self.nth(n) == Some(Identifier) && KtSyntaxKind::is_modifier_word(self.nth_text(n)) {
            n += 1;
        }
        self.nth(n) == Some(Identifier) && self.nth_text(n) == "constructor"
    }

    /// `object` keyword onwards, shared by declarations and object literals
    fn object_rest(&mut self) {
        self.bump();
        if self.at(Identifier) {
            self.bump();
        }
        if self.at(Colon) {
            self.bump();
            self.super_type_list();
        }
        if self.at(Lbrace) {
            self.class_body(false);
        }
    }

    fn super_type_list(&mut self) {
        self.start(SuperTypeList);
        loop {
            self.super_type_entry();
            if self.at(Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.finish();
    }

    fn super_type_entry(&mut self) {
        let checkpoint = self.checkpoint();
        self.type_reference();
        if self.at(Lpar) && !self.newline_before() {
            self.wrap(checkpoint, ConstructorCallee);
            self.finish();
            self.value_argument_list();
            self.wrap(checkpoint, SuperTypeCallEntry);
        } else {
            self.wrap(checkpoint, SuperTypeEntry);
            if self.at_identifier("by") {
                self.bump();
                self.expression();
            }
        }
        self.finish();
    }

    fn class_body(&mut self, is_enum: bool) {
        self.start(ClassBody);
        self.bump();
        self.with_newlines(true, |p| {
            if is_enum {
                p.enum_entries();
            }
            while !p.at_eof() && !p.at(Rbrace) {
                if p.at_identifier("init") && p.nth(1) == Some(Lbrace) {
                    p.start(ClassInitializer);
                    p.bump();
                    p.block();
                    p.finish();
                } else {
                    p.statement();
                }
            }
        });
        self.expect(Rbrace);
        self.finish();
    }

    fn enum_entries(&mut self) {
        while self.at(Identifier) && !self.at_declaration_start() {
            self.start(EnumEntry);
            self.bump();
            if self.at(Lpar) && !self.newline_before() {
                self.value_argument_list();
            }
            if self.at(Lbrace) {
                self.class_body(false);
            }
            self.finish();
            if self.at(Comma) {
                self.bump();
            } else {
                break;
            }
        }
        if self.at(Semicolon) {
            self.bump();
        }
    }

    fn function(&mut self, checkpoint: Checkpoint) {
        self.wrap(checkpoint, Fun);
        self.bump();
        if self.at(Lt) {
            self.type_parameter_list();
        }
        if self.function_has_receiver() {
            self.type_reference_in(true);
            self.expect(Dot);
        }
        if self.at(Identifier) {
            self.bump();
        }
        if self.at(Lpar) {
            self.value_parameter_list();
        }
        if self.at(Colon) {
            self.bump();
            self.type_reference();
        }
        if self.at(Eq) {
            self.bump();
            self.expression();
        } else if self.at(Lbrace) {
            self.block();
        }
        self.finish();
    }

    /// `fun Receiver.name(` has a dot at angle-depth 0 before the `(`
    fn function_has_receiver(&self) -> bool {
        let mut depth = 0usize;
        let mut saw_dot = false;
        let mut n = 0;
        loop {
            match self.nth(n) {
                Some(Lt) => depth += 1,
                Some(Gt) => depth = depth.saturating_sub(1),
                Some(Dot) if depth == 0 => saw_dot = true,
                Some(Lpar) if depth == 0 => return saw_dot,
                Some(Identifier | Comma | Quest | Mul | Dot | Lpar | Rpar | Arrow) => {}
                _ => return false,
            }
            n += 1;
        }
    }

    fn property(&mut self, checkpoint: Checkpoint) {
        self.wrap(checkpoint, Property);
        self.bump();
        if self.at(Lt) {
            self.type_parameter_list();
        }
        if self.at(Lpar) {
            self.destructuring_declaration();
        } else {
            if self.at(Identifier) && matches!(self.nth(1), Some(Dot | Lt)) {
                self.type_reference_in(true);
                self.expect(Dot);
            }
            if self.at(Identifier) {
                self.bump();
            }
        }
        if self.at(Colon) {
            self.bump();
            self.type_reference();
        }
        if self.at(Eq) {
            self.bump();
            self.expression();
        } else if self.at_identifier("by") {
            self.start(PropertyDelegate);
            self.bump();
            self.expression();
            self.finish();
        }
        self.property_accessors();
        self.finish();
    }

    fn at_accessor(&self) -> bool {
        let mut n = 0;
        while self.nth(n) == Some(Identifier) && KtSyntaxKind::is_modifier_word(self.nth_text(n)) {
            n += 1;
        }
        self.nth(n) == Some(Identifier)
            && matches!(self.nth_text(n), "get" | "set")
            && (n > 0 || matches!(self.nth(n + 1), Some(Lpar | Eq | Lbrace)))
    }

    fn property_accessors(&mut self) {
        for _ in 0..2 {
            if !self.at_accessor() {
                break;
            }
            self.start(PropertyAccessor);
            if self.at(Identifier) && !matches!(self.nth_text(0), "get" | "set") {
                self.start(ModifierList);
                while !matches!(self.nth_text(0), "get" | "set") {
                    self.bump();
                }
                self.finish();
            }
            self.bump();
            if self.at(Lpar) {
                self.start(ValueParameterList);
                self.bump();
                self.with_newlines(false, |p| {
                    if !p.at(Rpar) {
                        p.value_parameter();
                    }
                });
                self.expect(Rpar);
                self.finish();
            }
            if self.at(Colon) {
                self.bump();
                self.type_reference();
            }
            if self.at(Eq) {
                self.bump();
                self.expression();
            } else if self.at(Lbrace) {
                self.block();
            }
            self.finish();
        }
    }

    fn type_alias(&mut self, checkpoint: Checkpoint) {
        self.wrap(checkpoint, TypeAlias);
        self.bump();
        if self.at(Identifier) {
            self.bump();
        }
        if self.at(Lt) {
            self.type_parameter_list();
        }
        if self.expect(Eq) {
            self.type_reference();
        }
        self.finish();
    }

    fn destructuring_declaration(&mut self) {
        self.start(DestructuringDeclaration);
        self.bump();
        self.with_newlines(false, |p| {
            while p.at(Identifier) {
                p.start(DestructuringDeclarationEntry);
                p.bump();
                if p.at(Colon) {
                    p.bump();
                    p.type_reference();
                }
                p.finish();
                if p.at(Comma) {
                    p.bump();
                } else {
                    break;
                }
            }
        });
        self.expect(Rpar);
        self.finish();
    }

    fn type_parameter_list(&mut self) {
        self.start(TypeParameterList);
        self.bump();
        self.with_newlines(false, |p| {
            while p.at(Identifier) || p.at(InKeyword) || p.at(At) {
                p.start(TypeParameter);
                while p.at(InKeyword)
                    || (p.at(Identifier)
                        && matches!(p.nth_text(0), "out" | "reified")
                        && p.nth(1) == Some(Identifier))
                {
                    p.bump();
                }
                while p.at(At) {
                    p.annotation();
                }
                if p.at(Identifier) {
                    p.bump();
                }
                if p.at(Colon) {
                    p.bump();
                    p.type_reference();
                }
                p.finish();
                if p.at(Comma) {
                    p.bump();
                } else {
                    break;
                }
            }
        });
        self.expect(Gt);
        self.finish();
    }

    fn value_parameter_list(&mut self) {
        self.start(ValueParameterList);
        self.bump();
        self.with_newlines(false, |p| {
            while !p.at_eof() && !p.at(Rpar) {
                let before = p.significant_pos();
                p.value_parameter();
                if p.at(Comma) {
                    p.bump();
                } else if p.significant_pos() == before {
                    p.error_and_bump("unexpected token in parameter list");
                } else if !p.at(Rpar) {
                    p.error("expected ',' or ')'");
                    break;
                }
            }
        });
        self.expect(Rpar);
        self.finish();
    }

    fn value_parameter(&mut self) {
        self.start(ValueParameter);
        self.modifier_list();
        if self.at_any(&[ValKeyword, VarKeyword]) {
            self.bump();
        }
        if self.at(Identifier) {
            self.bump();
        }
        if self.at(Colon) {
            self.bump();
            self.type_reference();
        }
        if self.at(Eq) {
            self.bump();
            self.expression();
        }
        self.finish();
    }

    // ===== Types =====

    fn type_reference(&mut self) {
        self.type_reference_in(false);
    }

    /// In receiver position the last `.name` belongs to the declaration
    fn type_reference_in(&mut self, receiver: bool) {
        self.start(TypeReference);
        if self.at_identifier("suspend") && self.nth(1) == Some(Lpar) {
            self.start(ModifierList);
            self.bump();
            self.finish();
        }
        while self.at(At) {
            self.annotation();
        }
        self.type_element(receiver);
        self.finish();
    }

    fn type_element(&mut self, receiver: bool) {
        let checkpoint = self.checkpoint();
        match self.current() {
            Some(Lpar) if self.paren_followed_by_arrow() => self.function_type(),
            Some(Lpar) => {
                self.bump();
                self.with_newlines(false, |p| p.type_element(false));
                self.expect(Rpar);
            }
            Some(Mul) => self.bump(),
            Some(Identifier) => self.user_type(receiver),
            _ => {
                self.error("expected a type");
                return;
            }
        }
        while self.at(Quest) && !self.newline_before() {
            self.wrap(checkpoint, NullableType);
            self.bump();
            self.finish();
        }
    }

    fn user_type(&mut self, receiver: bool) {
        let checkpoint = self.checkpoint();
        self.start(UserType);
        self.reference();
        if self.at(Lt) && !self.newline_before() {
            self.type_argument_list();
        }
        self.finish();
        while self.at(Dot) && self.nth(1) == Some(Identifier) {
            if receiver && !matches!(self.nth(2), Some(Dot | Lt)) {
                break;
            }
            self.wrap(checkpoint, UserType);
            self.bump();
            self.reference();
            if self.at(Lt) && !self.newline_before() {
                self.type_argument_list();
            }
            self.finish();
        }
    }

    fn function_type(&mut self) {
        self.start(FunctionType);
        self.start(ValueParameterList);
        self.bump();
        self.with_newlines(false, |p| {
            while !p.at_eof() && !p.at(Rpar) {
                let before = p.significant_pos();
                p.start(ValueParameter);
                if p.at(Identifier) && p.nth(1) == Some(Colon) {
                    p.bump();
                    p.bump();
                }
                p.type_reference();
                p.finish();
                if p.at(Comma) {
                    p.bump();
                } else if p.significant_pos() == before {
                    p.error_and_bump("unexpected token in function type");
                } else {
                    break;
                }
            }
        });
        self.expect(Rpar);
        self.finish();
        if self.expect(Arrow) {
            self.type_reference();
        }
        self.finish();
    }

    /// `( ... ) ->` with balanced parentheses
    fn paren_followed_by_arrow(&self) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        loop {
            match self.nth(n) {
                Some(Lpar) => depth += 1,
                Some(Rpar) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.nth(n + 1) == Some(Arrow);
                    }
                }
                None => return false,
                _ => {}
            }
            n += 1;
        }
    }

    fn type_argument_list(&mut self) {
        self.start(TypeArgumentList);
        self.bump();
        self.with_newlines(false, |p| {
            while !p.at_eof() && !p.at(Gt) {
                let before = p.significant_pos();
                p.start(TypeProjection);
                while p.at(InKeyword) || (p.at_identifier("out") && p.nth(1) == Some(Identifier)) {
                    p.bump();
                }
                if p.at(Mul) {
                    p.bump();
                } else {
                    p.type_reference();
                }
                p.finish();
                if p.at(Comma) {
                    p.bump();
                } else if p.significant_pos() == before {
                    p.error_and_bump("unexpected token in type arguments");
                } else {
                    break;
                }
            }
        });
        self.expect(Gt);
        self.finish();
    }

    /// Speculative scan telling `foo<Bar>(` apart from a comparison
    fn looks_like_type_arguments(&self) -> bool {
        let mut depth = 0usize;
        for n in 0..64 {
            match self.nth(n) {
                Some(Lt) => depth += 1,
                Some(Gt) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.nth(n + 1),
                            Some(Lpar | Lbrace | ColonColon | Dot | SafeAccess)
                        );
                    }
                }
                Some(Identifier | Comma | Dot | Quest | Colon | Mul | InKeyword | Lpar | Rpar | Arrow) => {}
                _ => return false,
            }
        }
        false
    }

    // ===== Expressions =====

    fn expression(&mut self) {
        let checkpoint = self.checkpoint();
        self.binary(0);
        if self.at_assignment_operator() {
            self.wrap(checkpoint, BinaryExpression);
            self.operation_reference();
            self.expression();
            self.finish();
        }
    }

    fn at_assignment_operator(&self) -> bool {
        [Eq, PlusEq, MinusEq, MulEq, DivEq, PercEq]
            .into_iter()
            .any(|kind| self.at_same_line(kind))
    }

    /// The binary operator at the cursor with its node kind and binding power
    fn binary_operator(&self) -> Option<(KtSyntaxKind, u8)> {
        let kind = self.current()?;
        let continues_line = matches!(kind, AndAnd | OrOr | Elvis | AsKeyword | AsSafe);
        if !continues_line && self.newlines_significant() && self.newline_before() {
            return None;
        }
        let op = match kind {
            OrOr => (BinaryExpression, 1),
            AndAnd => (BinaryExpression, 2),
            EqEq | ExclEq | EqEqEq | ExclEqEq => (BinaryExpression, 3),
            Lt | Gt | LtEq | GtEq => (BinaryExpression, 4),
            InKeyword | NotIn => (BinaryExpression, 5),
            IsKeyword | NotIs => (IsExpression, 5),
            Elvis => (BinaryExpression, 6),
            // Infix function call, e.g. `a to b`
            Identifier if !self.newline_before() => (BinaryExpression, 7),
            Range | RangeUntil => (BinaryExpression, 8),
            Plus | Minus => (BinaryExpression, 9),
            Mul | Div | Perc => (BinaryExpression, 10),
            AsKeyword | AsSafe => (BinaryWithType, 11),
            _ => return None,
        };
        Some(op)
    }

    fn binary(&mut self, min_power: u8) {
        let checkpoint = self.checkpoint();
        self.prefix();
        while let Some((kind, power)) = self.binary_operator() {
            if power < min_power {
                break;
            }
            self.wrap(checkpoint, kind);
            self.operation_reference();
            match kind {
                IsExpression | BinaryWithType => self.type_reference(),
                _ => self.binary(power + 1),
            }
            self.finish();
        }
    }

    fn prefix(&mut self) {
        match self.current() {
            Some(Minus | Plus | Excl | PlusPlus | MinusMinus) => {
                self.start(PrefixExpression);
                self.operation_reference();
                self.prefix();
                self.finish();
            }
            Some(At) => {
                self.annotation();
                self.prefix();
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) {
        let checkpoint = self.checkpoint();
        self.atom();
        loop {
            match self.current() {
                Some(Dot | SafeAccess) => {
                    let kind = if self.at(Dot) {
                        DotQualifiedExpression
                    } else {
                        SafeAccessExpression
                    };
                    self.wrap(checkpoint, kind);
                    self.bump();
                    self.selector();
                    self.finish();
                }
                Some(ColonColon) if !self.newline_before() => {
                    self.wrap(checkpoint, CallableReferenceExpression);
                    self.bump();
                    if self.at(Identifier) {
                        self.reference();
                    } else if self.at(ClassKeyword) {
                        self.bump();
                    }
                    self.finish();
                }
                Some(Lpar) if !self.newline_before() => {
                    self.wrap(checkpoint, CallExpression);
                    self.value_argument_list();
                    self.lambda_arguments();
                    self.finish();
                }
                Some(Lbracket) if !self.newline_before() => {
                    self.wrap(checkpoint, ArrayAccessExpression);
                    self.start(Indices);
                    self.bump();
                    self.with_newlines(false, |p| {
                        while !p.at_eof() && !p.at(Rbracket) {
                            let before = p.significant_pos();
                            p.expression();
                            if p.at(Comma) {
                                p.bump();
                            } else if p.significant_pos() == before {
                                p.error_and_bump("unexpected token in index");
                            } else {
                                break;
                            }
                        }
                    });
                    self.expect(Rbracket);
                    self.finish();
                    self.finish();
                }
                Some(ExclExcl | PlusPlus | MinusMinus) if !self.newline_before() => {
                    self.wrap(checkpoint, PostfixExpression);
                    self.operation_reference();
                    self.finish();
                }
                _ => break,
            }
        }
    }

    /// Member name after `.`/`?.`, possibly called
    fn selector(&mut self) {
        let checkpoint = self.checkpoint();
        match self.current() {
            Some(Identifier) => self.reference(),
            Some(ClassKeyword | ThisKeyword) => {
                self.start(ReferenceExpression);
                self.bump();
                self.finish();
            }
            _ => {
                self.error("expected a member name");
                return;
            }
        }
        self.call_suffix(checkpoint);
    }

    fn at_lambda_argument(&self) -> bool {
        self.at(Lbrace) && !self.newline_before()
    }

    /// Type arguments, a value argument list and trailing lambdas after a name
    fn call_suffix(&mut self, checkpoint: Checkpoint) {
        let type_arguments = self.at(Lt) && !self.newline_before() && self.looks_like_type_arguments();
        let arguments = self.at(Lpar) && !self.newline_before();
        if !(type_arguments || arguments || self.at_lambda_argument()) {
            return;
        }
        self.wrap(checkpoint, CallExpression);
        if type_arguments {
            self.type_argument_list();
        }
        if self.at(Lpar) && !self.newline_before() {
            self.value_argument_list();
        }
        self.lambda_arguments();
        self.finish();
    }

    fn lambda_arguments(&mut self) {
        while self.at_lambda_argument() {
            self.start(LambdaArgument);
            self.lambda();
            self.finish();
        }
    }

    fn value_argument_list(&mut self) {
        self.start(ValueArgumentList);
        self.bump();
        self.with_newlines(false, |p| {
            while !p.at_eof() && !p.at(Rpar) {
                let before = p.significant_pos();
                p.value_argument();
                if p.at(Comma) {
                    p.bump();
                } else if p.significant_pos() == before {
                    p.error_and_bump("unexpected token in argument list");
                } else if !p.at(Rpar) {
                    p.error("expected ',' or ')'");
                    break;
                }
            }
        });
        self.expect(Rpar);
        self.finish();
    }

    fn value_argument(&mut self) {
        self.start(ValueArgument);
        if self.at(Identifier) && self.nth(1) == Some(Eq) {
            self.reference();
            self.bump();
        }
        if self.at(Mul) {
            self.bump();
        }
        self.expression();
        self.finish();
    }

    fn atom(&mut self) {
        match self.current() {
            Some(Identifier) => {
                let checkpoint = self.checkpoint();
                self.reference();
                self.call_suffix(checkpoint);
            }
            Some(IntegerLiteral) => self.literal(IntegerConstant),
            Some(FloatLiteral) => self.literal(FloatConstant),
            Some(CharacterLiteral) => self.literal(CharacterConstant),
            Some(TrueKeyword | FalseKeyword) => self.literal(BooleanConstant),
            Some(NullKeyword) => self.literal(Null),
            Some(OpenQuote) => self.string_template(),
            Some(ThisKeyword) => {
                self.start(ThisExpression);
                self.bump();
                self.label_qualifier();
                self.finish();
            }
            Some(SuperKeyword) => {
                self.start(SuperExpression);
                self.bump();
                if self.raw_current() == Some(Lt) {
                    self.type_argument_list();
                }
                self.label_qualifier();
                self.finish();
            }
            Some(Lpar) => {
                self.start(Parenthesized);
                self.bump();
                self.with_newlines(false, |p| p.expression());
                self.expect(Rpar);
                self.finish();
            }
            Some(Lbrace) => self.lambda(),
            Some(IfKeyword) => self.if_expression(),
            Some(WhenKeyword) => self.when_expression(),
            Some(TryKeyword) => self.try_expression(),
            Some(ForKeyword) => self.for_loop(),
            Some(WhileKeyword) => self.while_loop(),
            Some(DoKeyword) => self.do_while_loop(),
            Some(ReturnKeyword) => self.jump(Return, true),
            Some(ThrowKeyword) => self.jump(Throw, true),
            Some(BreakKeyword) => self.jump(Break, false),
            Some(ContinueKeyword) => self.jump(Continue, false),
            Some(ObjectKeyword) => {
                self.start(ObjectLiteral);
                self.start(ObjectDeclaration);
                self.object_rest();
                self.finish();
                self.finish();
            }
            Some(FunKeyword) => {
                let checkpoint = self.checkpoint();
                self.function(checkpoint);
            }
            Some(ColonColon) => {
                self.start(CallableReferenceExpression);
                self.bump();
                if self.at(Identifier) {
                    self.reference();
                } else if self.at(ClassKeyword) {
                    self.bump();
                }
                self.finish();
            }
            Some(Rpar | Rbrace | Rbracket | LongTemplateEntryEnd | Comma | Semicolon | Arrow) => {
                self.error("expected an expression");
            }
            Some(_) => self.error_and_bump("expected an expression"),
            None => self.error("unexpected end of file"),
        }
    }

    fn literal(&mut self, kind: KtSyntaxKind) {
        self.start(kind);
        self.bump();
        self.finish();
    }

    /// `@label` glued to `this`, `super`, `return`, `break` or `continue`
    fn label_qualifier(&mut self) {
        if self.raw_current() == Some(At)
            && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(Identifier)
        {
            self.start(LabelQualifier);
            self.bump();
            self.bump();
            self.finish();
        }
    }

    fn jump(&mut self, kind: KtSyntaxKind, takes_value: bool) {
        self.start(kind);
        self.bump();
        self.label_qualifier();
        if takes_value && !self.at_expression_end() {
            self.expression();
        }
        self.finish();
    }

    fn at_expression_end(&self) -> bool {
        self.at_eof()
            || (self.newlines_significant() && self.newline_before())
            || self.at_any(&[
                Rbrace,
                Rpar,
                Rbracket,
                Semicolon,
                Comma,
                LongTemplateEntryEnd,
                ElseKeyword,
            ])
    }

    fn string_template(&mut self) {
        self.start(StringTemplate);
        self.bump();
        loop {
            match self.raw_current() {
                Some(RegularStringPart) => self.literal(LiteralStringTemplateEntry),
                Some(EscapeSequence) => self.literal(EscapeStringTemplateEntry),
                Some(ShortTemplateEntryStart) => {
                    self.start(ShortStringTemplateEntry);
                    self.bump();
                    match self.raw_current() {
                        Some(Identifier) => self.reference(),
                        Some(ThisKeyword) => self.literal(ThisExpression),
                        _ => {}
                    }
                    self.finish();
                }
                Some(LongTemplateEntryStart) => {
                    self.start(LongStringTemplateEntry);
                    self.bump();
                    self.with_newlines(false, |p| {
                        if !p.at(LongTemplateEntryEnd) {
                            p.expression();
                        }
                    });
                    self.expect(LongTemplateEntryEnd);
                    self.finish();
                }
                Some(ClosingQuote) => {
                    self.bump();
                    break;
                }
                _ => {
                    self.error("unterminated string literal");
                    break;
                }
            }
        }
        self.finish();
    }

    fn lambda(&mut self) {
        self.start(LambdaExpression);
        self.start(FunctionLiteral);
        self.bump();
        self.with_newlines(true, |p| {
            if p.at_lambda_parameters() {
                p.start(ValueParameterList);
                loop {
                    p.start(ValueParameter);
                    if p.at(Lpar) {
                        p.destructuring_declaration();
                    } else {
                        p.bump();
                    }
                    if p.at(Colon) {
                        p.bump();
                        p.type_reference();
                    }
                    p.finish();
                    if p.at(Comma) {
                        p.bump();
                    } else {
                        break;
                    }
                }
                p.finish();
                p.expect(Arrow);
            }
            p.start(Block);
            p.statements_until_rbrace();
            p.finish();
        });
        self.expect(Rbrace);
        self.finish();
        self.finish();
    }

    /// `{ a, b: T -> ...` has only parameter-ish tokens before the arrow
    fn at_lambda_parameters(&self) -> bool {
        for n in 0..64 {
            match self.nth(n) {
                Some(Arrow) => return n > 0,
                Some(Identifier | Comma | Colon | Dot | Lt | Gt | Quest | Lpar | Rpar | Mul) => {}
                _ => return false,
            }
        }
        false
    }

    fn if_expression(&mut self) {
        self.start(If);
        self.bump();
        self.parenthesized_condition();
        self.start(Then);
        self.control_body();
        self.finish();
        if self.at(ElseKeyword) {
            self.bump();
            self.start(Else);
            self.control_body();
            self.finish();
        }
        self.finish();
    }

    /// `( expr )` wrapped in a `Condition` node
    fn parenthesized_condition(&mut self) {
        if self.expect(Lpar) {
            self.with_newlines(false, |p| {
                p.start(Condition);
                p.expression();
                p.finish();
            });
            self.expect(Rpar);
        }
    }

    fn when_expression(&mut self) {
        self.start(When);
        self.bump();
        if self.at(Lpar) {
            self.bump();
            self.with_newlines(false, |p| {
                if p.at_any(&[ValKeyword, VarKeyword]) {
                    let checkpoint = p.checkpoint();
                    p.property(checkpoint);
                } else {
                    p.expression();
                }
            });
            self.expect(Rpar);
        }
        if self.expect(Lbrace) {
            self.with_newlines(true, |p| {
                while !p.at_eof() && !p.at(Rbrace) {
                    let before = p.significant_pos();
                    if p.at(Semicolon) {
                        p.bump();
                        continue;
                    }
                    p.when_entry();
                    if p.significant_pos() == before {
                        p.error_and_bump("expected a when entry");
                    }
                }
            });
            self.expect(Rbrace);
        }
        self.finish();
    }

    fn when_entry(&mut self) {
        self.start(WhenEntry);
        if self.at(ElseKeyword) {
            self.bump();
        } else {
            loop {
                self.when_condition();
                if self.at(Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if self.expect(Arrow) {
            self.control_body();
        }
        self.finish();
    }

    fn when_condition(&mut self) {
        self.start(WhenCondition);
        match self.current() {
            Some(InKeyword | NotIn) => {
                self.operation_reference();
                self.expression();
            }
            Some(IsKeyword | NotIs) => {
                self.operation_reference();
                self.type_reference();
            }
            _ => self.expression(),
        }
        self.finish();
    }

    fn try_expression(&mut self) {
        self.start(Try);
        self.bump();
        if self.at(Lbrace) {
            self.block();
        }
        while self.at_identifier("catch") {
            self.start(Catch);
            self.bump();
            if self.at(Lpar) {
                self.value_parameter_list();
            }
            if self.at(Lbrace) {
                self.block();
            }
            self.finish();
        }
        if self.at_identifier("finally") {
            self.start(Finally);
            self.bump();
            if self.at(Lbrace) {
                self.block();
            }
            self.finish();
        }
        self.finish();
    }

    fn for_loop(&mut self) {
        self.start(For);
        self.bump();
        if self.expect(Lpar) {
            self.with_newlines(false, |p| {
                p.start(ValueParameter);
                if p.at(Lpar) {
                    p.destructuring_declaration();
                } else if p.at(Identifier) {
                    p.bump();
                }
                if p.at(Colon) {
                    p.bump();
                    p.type_reference();
                }
                p.finish();
                if p.expect(InKeyword) {
                    p.start(LoopRange);
                    p.expression();
                    p.finish();
                }
            });
            self.expect(Rpar);
        }
        self.loop_body();
        self.finish();
    }

    fn while_loop(&mut self) {
        self.start(While);
        self.bump();
        self.parenthesized_condition();
        self.loop_body();
        self.finish();
    }

    fn do_while_loop(&mut self) {
        self.start(DoWhile);
        self.bump();
        self.loop_body();
        if self.expect(WhileKeyword) {
            self.parenthesized_condition();
        }
        self.finish();
    }

    fn loop_body(&mut self) {
        self.start(Body);
        self.control_body();
        self.finish();
    }
}
