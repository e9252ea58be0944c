//! CST-aware lexer that preserves all trivia (whitespace, comments)
//!
//! Produces a flat token stream whose texts concatenate back to the input.
//! String literals are split into their template pieces, and `${ ... }`
//! entries are lexed as ordinary code up to the brace that closes them.

use crate::cst::KtSyntaxKind;
use std::ops::Range;

/// Simple span representing a byte range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: KtSyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: KtSyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

/// Lex input preserving ALL trivia for CST construction
///
/// - Each run of spaces, tabs and line breaks becomes one `WhiteSpace` token
/// - Comments and KDoc pieces are kept as tokens
/// - Unknown characters become `BadCharacter` tokens plus an error
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    if input.starts_with("#!") {
        lexer.eat_while(|c| c != '\n' && c != '\r');
        lexer.push(KtSyntaxKind::EolComment, 0);
    }
    lexer.lex_code(false);
    (lexer.tokens, lexer.errors)
}

/// Multi-character operators, longest first
const OPERATORS: &[(&str, KtSyntaxKind)] = &[
    ("..<", KtSyntaxKind::RangeUntil),
    ("===", KtSyntaxKind::EqEqEq),
    ("!==", KtSyntaxKind::ExclEqEq),
    ("?.", KtSyntaxKind::SafeAccess),
    ("?:", KtSyntaxKind::Elvis),
    ("::", KtSyntaxKind::ColonColon),
    ("->", KtSyntaxKind::Arrow),
    ("++", KtSyntaxKind::PlusPlus),
    ("--", KtSyntaxKind::MinusMinus),
    ("&&", KtSyntaxKind::AndAnd),
    ("||", KtSyntaxKind::OrOr),
    ("==", KtSyntaxKind::EqEq),
    ("!=", KtSyntaxKind::ExclEq),
    ("<=", KtSyntaxKind::LtEq),
    (">=", KtSyntaxKind::GtEq),
    ("+=", KtSyntaxKind::PlusEq),
    ("-=", KtSyntaxKind::MinusEq),
    ("*=", KtSyntaxKind::MulEq),
    ("/=", KtSyntaxKind::DivEq),
    ("%=", KtSyntaxKind::PercEq),
    ("..", KtSyntaxKind::Range),
    ("!!", KtSyntaxKind::ExclExcl),
    ("(", KtSyntaxKind::Lpar),
    (")", KtSyntaxKind::Rpar),
    ("[", KtSyntaxKind::Lbracket),
    ("]", KtSyntaxKind::Rbracket),
    (",", KtSyntaxKind::Comma),
    (";", KtSyntaxKind::Semicolon),
    (":", KtSyntaxKind::Colon),
    (".", KtSyntaxKind::Dot),
    ("@", KtSyntaxKind::At),
    ("?", KtSyntaxKind::Quest),
    ("=", KtSyntaxKind::Eq),
    ("+", KtSyntaxKind::Plus),
    ("-", KtSyntaxKind::Minus),
    ("*", KtSyntaxKind::Mul),
    ("/", KtSyntaxKind::Div),
    ("%", KtSyntaxKind::Perc),
    ("!", KtSyntaxKind::Excl),
    ("<", KtSyntaxKind::Lt),
    (">", KtSyntaxKind::Gt),
];

fn is_whitespace_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<CstToken>,
    errors: Vec<LexerError>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn push(&mut self, kind: KtSyntaxKind, start: usize) {
        let end = self.pos;
        self.tokens
            .push(CstToken::new(kind, &self.input[start..end], start..end));
    }

    fn error(&mut self, message: &str, start: usize) {
        self.errors
            .push(LexerError::new(message, start..self.pos.max(start + 1)));
    }

    /// Lex code up to end of input, or up to the `}` closing a `${` entry
    fn lex_code(&mut self, in_template: bool) {
        let mut brace_depth = 0usize;

        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                c if is_whitespace_char(c) => {
                    self.eat_while(is_whitespace_char);
                    self.push(KtSyntaxKind::WhiteSpace, start);
                }
                '/' if self.rest().starts_with("//") => {
                    self.eat_while(|c| c != '\n' && c != '\r');
                    self.push(KtSyntaxKind::EolComment, start);
                }
                '/' if self.rest().starts_with("/**") && !self.rest().starts_with("/**/") => {
                    self.lex_kdoc();
                }
                '/' if self.rest().starts_with("/*") => self.lex_block_comment(),
                '"' => self.lex_string(),
                '\'' => self.lex_char(),
                '`' => {
                    self.bump_char();
                    self.eat_while(|c| c != '`' && c != '\n');
                    if self.peek() == Some('`') {
                        self.bump_char();
                    } else {
                        self.error("unterminated backtick identifier", start);
                    }
                    self.push(KtSyntaxKind::Identifier, start);
                }
                c if c.is_ascii_digit() => self.lex_number(),
                c if is_ident_start(c) => self.lex_identifier(),
                '{' => {
                    brace_depth += 1;
                    self.bump_char();
                    self.push(KtSyntaxKind::Lbrace, start);
                }
                '}' => {
                    self.bump_char();
                    if brace_depth == 0 && in_template {
                        self.push(KtSyntaxKind::LongTemplateEntryEnd, start);
                        return;
                    }
                    brace_depth = brace_depth.saturating_sub(1);
                    self.push(KtSyntaxKind::Rbrace, start);
                }
                '!' if self.at_negated_keyword() => {
                    let kind = if self.rest().starts_with("!is") {
                        KtSyntaxKind::NotIs
                    } else {
                        KtSyntaxKind::NotIn
                    };
                    self.pos += 3;
                    self.push(kind, start);
                }
                _ => self.lex_operator(),
            }
        }

        if in_template {
            self.error("unterminated string template entry", self.pos);
        }
    }

    /// `!is` / `!in` not followed by more identifier characters
    fn at_negated_keyword(&self) -> bool {
        let rest = self.rest();
        (rest.starts_with("!is") || rest.starts_with("!in"))
            && !rest[3..].chars().next().is_some_and(is_ident_char)
    }

    fn lex_operator(&mut self) {
        let start = self.pos;
        let rest = self.rest();
        if let Some((text, kind)) = OPERATORS.iter().find(|(op, _)| rest.starts_with(op)) {
            self.pos += text.len();
            self.push(*kind, start);
        } else {
            self.bump_char();
            self.push(KtSyntaxKind::BadCharacter, start);
            self.error("unexpected character", start);
        }
    }

    fn lex_identifier(&mut self) {
        let start = self.pos;
        self.eat_while(is_ident_char);
        let text = &self.input[start..self.pos];
        if text == "as" && self.peek() == Some('?') {
            self.bump_char();
            self.push(KtSyntaxKind::AsSafe, start);
            return;
        }
        let kind = KtSyntaxKind::keyword(text).unwrap_or(KtSyntaxKind::Identifier);
        self.push(kind, start);
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        let rest = self.rest();
        let mut float = false;

        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
        } else if rest.starts_with("0b") || rest.starts_with("0B") {
            self.pos += 2;
            self.eat_while(|c| c == '0' || c == '1' || c == '_');
        } else {
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
            if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
                float = true;
                self.bump_char();
                self.eat_while(|c| c.is_ascii_digit() || c == '_');
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let save = self.pos;
                self.bump_char();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump_char();
                }
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    float = true;
                    self.eat_while(|c| c.is_ascii_digit() || c == '_');
                } else {
                    self.pos = save;
                }
            }
        }

        match self.peek() {
            Some('f' | 'F') => {
                float = true;
                self.bump_char();
            }
            Some('L') => self.bump_char(),
            Some('u' | 'U') => {
                self.bump_char();
                if self.peek() == Some('L') {
                    self.bump_char();
                }
            }
            _ => {}
        }

        let kind = if float {
            KtSyntaxKind::FloatLiteral
        } else {
            KtSyntaxKind::IntegerLiteral
        };
        self.push(kind, start);
    }

    fn lex_char(&mut self) {
        let start = self.pos;
        self.bump_char();
        match self.peek() {
            Some('\\') => {
                self.bump_char();
                if self.peek() == Some('u') {
                    self.bump_char();
                    for _ in 0..4 {
                        if self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                            self.bump_char();
                        }
                    }
                } else {
                    self.bump_char();
                }
            }
            Some('\'') | Some('\n') | None => {}
            Some(_) => self.bump_char(),
        }
        if self.peek() == Some('\'') {
            self.bump_char();
        } else {
            self.error("unterminated character literal", start);
        }
        self.push(KtSyntaxKind::CharacterLiteral, start);
    }

    fn lex_block_comment(&mut self) {
        let start = self.pos;
        self.pos += 2;
        let mut depth = 1usize;
        while depth > 0 {
            let rest = self.rest();
            if rest.is_empty() {
                self.error("unterminated block comment", start);
                break;
            }
            if rest.starts_with("/*") {
                depth += 1;
                self.pos += 2;
            } else if rest.starts_with("*/") {
                depth -= 1;
                self.pos += 2;
            } else {
                self.bump_char();
            }
        }
        self.push(KtSyntaxKind::BlockComment, start);
    }

    /// KDoc: `/**`, free text, line-breaking whitespace, leading `*`, `*/`
    fn lex_kdoc(&mut self) {
        let start = self.pos;
        self.pos += 3;
        self.push(KtSyntaxKind::KdocStart, start);

        let mut text_start = self.pos;
        let mut at_line_start = false;
        loop {
            let Some(c) = self.peek() else {
                self.flush(KtSyntaxKind::KdocText, text_start);
                self.error("unterminated KDoc comment", start);
                return;
            };

            if self.rest().starts_with("*/") {
                self.flush(KtSyntaxKind::KdocText, text_start);
                let end_start = self.pos;
                self.pos += 2;
                self.push(KtSyntaxKind::KdocEnd, end_start);
                return;
            }

            if is_whitespace_char(c) {
                let ws_start = self.pos;
                self.eat_while(is_whitespace_char);
                let run = &self.input[ws_start..self.pos];
                if run.contains('\n') || run.contains('\r') {
                    let end = self.pos;
                    self.pos = ws_start;
                    self.flush(KtSyntaxKind::KdocText, text_start);
                    self.pos = end;
                    self.push(KtSyntaxKind::WhiteSpace, ws_start);
                    text_start = self.pos;
                    at_line_start = true;
                }
                continue;
            }

            if at_line_start && c == '*' {
                let star = self.pos;
                self.bump_char();
                self.push(KtSyntaxKind::KdocLeadingAsterisk, star);
                text_start = self.pos;
                at_line_start = false;
                continue;
            }

            at_line_start = false;
            self.bump_char();
        }
    }

    /// Push `[from, pos)` as `kind` if non-empty
    fn flush(&mut self, kind: KtSyntaxKind, from: usize) {
        if self.pos > from {
            self.push(kind, from);
        }
    }

    fn lex_string(&mut self) {
        let start = self.pos;
        let raw = self.rest().starts_with("\"\"\"");
        self.pos += if raw { 3 } else { 1 };
        self.push(KtSyntaxKind::OpenQuote, start);

        let mut part_start = self.pos;
        loop {
            let Some(c) = self.peek() else {
                self.flush(KtSyntaxKind::RegularStringPart, part_start);
                self.error("unterminated string literal", start);
                return;
            };

            if raw {
                if self.rest().starts_with("\"\"\"") {
                    // In `""""`, only the last three quotes close the literal.
                    let run = self.rest().chars().take_while(|&c| c == '"').count();
                    self.pos += run - 3;
                    self.flush(KtSyntaxKind::RegularStringPart, part_start);
                    let quote = self.pos;
                    self.pos += 3;
                    self.push(KtSyntaxKind::ClosingQuote, quote);
                    return;
                }
            } else {
                match c {
                    '"' => {
                        self.flush(KtSyntaxKind::RegularStringPart, part_start);
                        let quote = self.pos;
                        self.bump_char();
                        self.push(KtSyntaxKind::ClosingQuote, quote);
                        return;
                    }
                    '\n' | '\r' => {
                        self.flush(KtSyntaxKind::RegularStringPart, part_start);
                        self.error("unterminated string literal", start);
                        return;
                    }
                    '\\' => {
                        self.flush(KtSyntaxKind::RegularStringPart, part_start);
                        let esc = self.pos;
                        self.bump_char();
                        if self.peek() == Some('u') {
                            self.bump_char();
                            for _ in 0..4 {
                                if self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                                    self.bump_char();
                                }
                            }
                        } else {
                            self.bump_char();
                        }
                        self.push(KtSyntaxKind::EscapeSequence, esc);
                        part_start = self.pos;
                        continue;
                    }
                    _ => {}
                }
            }

            if c == '$' {
                if self.rest().starts_with("${") {
                    self.flush(KtSyntaxKind::RegularStringPart, part_start);
                    let entry = self.pos;
                    self.pos += 2;
                    self.push(KtSyntaxKind::LongTemplateEntryStart, entry);
                    self.lex_code(true);
                    part_start = self.pos;
                    continue;
                }
                if self
                    .peek_second()
                    .is_some_and(|n| is_ident_start(n) || n == '`')
                {
                    self.flush(KtSyntaxKind::RegularStringPart, part_start);
                    let entry = self.pos;
                    self.bump_char();
                    self.push(KtSyntaxKind::ShortTemplateEntryStart, entry);
                    let name = self.pos;
                    if self.peek() == Some('`') {
                        self.bump_char();
                        self.eat_while(|c| c != '`' && c != '\n');
                        if self.peek() == Some('`') {
                            self.bump_char();
                        }
                        self.push(KtSyntaxKind::Identifier, name);
                    } else {
                        self.lex_identifier();
                    }
                    part_start = self.pos;
                    continue;
                }
            }

            self.bump_char();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use KtSyntaxKind::*;

    fn kinds(input: &str) -> Vec<KtSyntaxKind> {
        let (tokens, errors) = lex_with_trivia(input);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    fn assert_lossless(input: &str) {
        let (tokens, _) = lex_with_trivia(input);
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn whitespace_runs_are_single_tokens() {
        let (tokens, _) = lex_with_trivia("a \n\n    b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, WhiteSpace);
        assert_eq!(tokens[1].text, " \n\n    ");
        assert_eq!(tokens[1].span, 1..8);
    }

    #[test]
    fn keywords_and_soft_keywords() {
        assert_eq!(
            kinds("fun get as? x !is y !in z"),
            vec![
                FunKeyword, WhiteSpace, Identifier, WhiteSpace, AsSafe, WhiteSpace, Identifier,
                WhiteSpace, NotIs, WhiteSpace, Identifier, WhiteSpace, NotIn, WhiteSpace,
                Identifier
            ]
        );
        assert_eq!(kinds("!inside"), vec![Excl, Identifier]);
    }

    #[test]
    fn operators_use_longest_match() {
        assert_eq!(
            kinds("a?.b ?: c..<d === e"),
            vec![
                Identifier, SafeAccess, Identifier, WhiteSpace, Elvis, WhiteSpace, Identifier,
                RangeUntil, Identifier, WhiteSpace, EqEqEq, WhiteSpace, Identifier
            ]
        );
        assert_eq!(kinds("x!!"), vec![Identifier, ExclExcl]);
        assert_eq!(kinds("{ a -> }"), vec![Lbrace, WhiteSpace, Identifier, WhiteSpace, Arrow, WhiteSpace, Rbrace]);
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("1_000L"), vec![IntegerLiteral]);
        assert_eq!(kinds("0xFF"), vec![IntegerLiteral]);
        assert_eq!(kinds("1.5f"), vec![FloatLiteral]);
        assert_eq!(kinds("2e10"), vec![FloatLiteral]);
        assert_eq!(kinds("1..2"), vec![IntegerLiteral, Range, IntegerLiteral]);
    }

    #[test]
    fn comments() {
        assert_eq!(
            kinds("a // c\n/* x /* y */ z */"),
            vec![Identifier, WhiteSpace, EolComment, WhiteSpace, BlockComment]
        );
        assert_eq!(kinds("/**/"), vec![BlockComment]);
    }

    #[test]
    fn kdoc_pieces() {
        let (tokens, errors) = lex_with_trivia("/**\n * Foo bar\n */");
        assert!(errors.is_empty());
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                KdocStart,
                WhiteSpace,
                KdocLeadingAsterisk,
                KdocText,
                WhiteSpace,
                KdocEnd
            ]
        );
        assert_eq!(tokens[3].text, " Foo bar");
        assert_eq!(tokens[4].text, "\n ");
    }

    #[test]
    fn single_line_kdoc() {
        assert_eq!(kinds("/** doc */"), vec![KdocStart, KdocText, KdocEnd]);
    }

    #[test]
    fn string_templates() {
        assert_eq!(
            kinds(r#""a $b ${c + 1}\n""#),
            vec![
                OpenQuote,
                RegularStringPart,
                ShortTemplateEntryStart,
                Identifier,
                RegularStringPart,
                LongTemplateEntryStart,
                Identifier,
                WhiteSpace,
                Plus,
                WhiteSpace,
                IntegerLiteral,
                LongTemplateEntryEnd,
                EscapeSequence,
                ClosingQuote
            ]
        );
    }

    #[test]
    fn nested_braces_inside_template() {
        assert_eq!(
            kinds(r#""${ f { it } }""#),
            vec![
                OpenQuote,
                LongTemplateEntryStart,
                WhiteSpace,
                Identifier,
                WhiteSpace,
                Lbrace,
                WhiteSpace,
                Identifier,
                WhiteSpace,
                Rbrace,
                WhiteSpace,
                LongTemplateEntryEnd,
                ClosingQuote
            ]
        );
    }

    #[test]
    fn raw_strings_keep_newlines_and_extra_quotes() {
        let (tokens, errors) = lex_with_trivia("\"\"\"a\n  b\"\"\"\"");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, OpenQuote);
        assert_eq!(tokens[1].kind, RegularStringPart);
        assert_eq!(tokens[1].text, "a\n  b\"");
        assert_eq!(tokens[2].kind, ClosingQuote);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let (_, errors) = lex_with_trivia("\"abc\nx");
        assert_eq!(errors.len(), 1);
        assert_lossless("\"abc\nx");
    }

    #[test]
    fn bad_character() {
        let (tokens, errors) = lex_with_trivia("a # b");
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[2].kind, BadCharacter);
    }

    #[test]
    fn lossless_on_mixed_input() {
        assert_lossless(
            "package a.b\n\nclass C<T>(val x: T?) : B() {\n\tfun f() = \"${x}\" ?: 'c'\n}\n",
        );
        assert_lossless("#!/usr/bin/env kotlin\nprintln(1)\n");
    }
}
