//! Syntax kinds for the Kotlin concrete syntax tree
//!
//! Every token and node in the tree carries one [`KtSyntaxKind`]. The names
//! mirror the element types of the Kotlin PSI so that tree shapes read the
//! same way Kotlin tooling describes them.

use std::fmt;

macro_rules! syntax_kinds {
    ($( $(#[$meta:meta])* $name:ident ),* $(,)?) => {
        /// Syntax kinds for Kotlin tokens and nodes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum KtSyntaxKind {
            $( $(#[$meta])* $name, )*
        }

        impl KtSyntaxKind {
            const ALL: &'static [KtSyntaxKind] = &[ $( KtSyntaxKind::$name, )* ];

            /// Look up a kind by its raw discriminant
            pub fn from_raw(raw: u16) -> Option<Self> {
                Self::ALL.get(raw as usize).copied()
            }
        }
    };
}

syntax_kinds! {
    // ===== Trivia =====
    /// Spaces, tabs and newlines; one token per contiguous run
    WhiteSpace,
    /// `// ...` up to (not including) the line break
    EolComment,
    /// `/* ... */`, nesting allowed
    BlockComment,
    /// `/**`
    KdocStart,
    /// `*/` closing a KDoc comment
    KdocEnd,
    /// `*` that opens a KDoc line
    KdocLeadingAsterisk,
    /// Free text inside a KDoc comment
    KdocText,

    // ===== Literals and names =====
    Identifier,
    IntegerLiteral,
    FloatLiteral,
    CharacterLiteral,

    // ===== String pieces =====
    OpenQuote,
    ClosingQuote,
    RegularStringPart,
    EscapeSequence,
    /// `$` before a simple name
    ShortTemplateEntryStart,
    /// `${`
    LongTemplateEntryStart,
    /// `}` closing a `${`
    LongTemplateEntryEnd,

    // ===== Keywords =====
    PackageKeyword,
    ImportKeyword,
    ClassKeyword,
    InterfaceKeyword,
    FunKeyword,
    ValKeyword,
    VarKeyword,
    ObjectKeyword,
    TypealiasKeyword,
    IfKeyword,
    ElseKeyword,
    WhenKeyword,
    ForKeyword,
    WhileKeyword,
    DoKeyword,
    TryKeyword,
    ReturnKeyword,
    ThrowKeyword,
    BreakKeyword,
    ContinueKeyword,
    ThisKeyword,
    SuperKeyword,
    NullKeyword,
    TrueKeyword,
    FalseKeyword,
    InKeyword,
    /// `!in`
    NotIn,
    IsKeyword,
    /// `!is`
    NotIs,
    AsKeyword,
    /// `as?`
    AsSafe,

    // ===== Delimiters =====
    Lpar,
    Rpar,
    Lbrace,
    Rbrace,
    Lbracket,
    Rbracket,

    // ===== Punctuation =====
    Comma,
    Semicolon,
    Colon,
    Arrow,
    At,
    Quest,

    // ===== Chain operators =====
    Dot,
    /// `?.`
    SafeAccess,
    /// `?:`
    Elvis,
    /// `::`
    ColonColon,

    // ===== Operators =====
    Eq,
    PlusEq,
    MinusEq,
    MulEq,
    DivEq,
    PercEq,
    Plus,
    Minus,
    Mul,
    Div,
    Perc,
    PlusPlus,
    MinusMinus,
    Excl,
    ExclExcl,
    AndAnd,
    OrOr,
    EqEq,
    ExclEq,
    EqEqEq,
    ExclEqEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    /// `..`
    Range,
    /// `..<`
    RangeUntil,

    /// Character the lexer could not classify
    BadCharacter,

    // ===== Nodes: file structure =====
    File,
    PackageDirective,
    ImportList,
    ImportDirective,
    ImportAlias,
    ModifierList,
    AnnotationEntry,
    ConstructorCallee,
    Kdoc,

    // ===== Nodes: declarations =====
    Class,
    ObjectDeclaration,
    ClassBody,
    ClassInitializer,
    EnumEntry,
    PrimaryConstructor,
    SuperTypeList,
    SuperTypeEntry,
    SuperTypeCallEntry,
    Fun,
    Property,
    PropertyAccessor,
    PropertyDelegate,
    TypeAlias,
    DestructuringDeclaration,
    DestructuringDeclarationEntry,
    ValueParameterList,
    ValueParameter,
    TypeParameterList,
    TypeParameter,

    // ===== Nodes: types =====
    TypeReference,
    UserType,
    NullableType,
    FunctionType,
    TypeArgumentList,
    TypeProjection,

    // ===== Nodes: control flow =====
    Block,
    Body,
    Then,
    Else,
    Condition,
    LoopRange,
    If,
    When,
    WhenEntry,
    WhenCondition,
    For,
    While,
    DoWhile,
    Try,
    Catch,
    Finally,
    Return,
    Throw,
    Break,
    Continue,
    LabelQualifier,

    // ===== Nodes: expressions =====
    BinaryExpression,
    BinaryWithType,
    IsExpression,
    PrefixExpression,
    PostfixExpression,
    OperationReference,
    DotQualifiedExpression,
    SafeAccessExpression,
    CallableReferenceExpression,
    CallExpression,
    ArrayAccessExpression,
    Indices,
    ValueArgumentList,
    ValueArgument,
    LambdaArgument,
    LambdaExpression,
    FunctionLiteral,
    ReferenceExpression,
    ThisExpression,
    SuperExpression,
    Parenthesized,
    ObjectLiteral,
    IntegerConstant,
    FloatConstant,
    CharacterConstant,
    BooleanConstant,
    Null,

    // ===== Nodes: strings =====
    StringTemplate,
    LiteralStringTemplateEntry,
    EscapeStringTemplateEntry,
    ShortStringTemplateEntry,
    LongStringTemplateEntry,

    /// Input the parser could not place
    Error,
}

/// Semantic grouping of syntax kinds
///
/// Indentation logic reasons about categories rather than long lists of
/// concrete kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindCategory {
    OpeningDelimiter,
    ClosingDelimiter,
    Whitespace,
    Comment,
    DocCommentMarker,
    Operator,
    ChainOperator,
    Keyword,
    Literal,
    Identifier,
    Punctuation,
    StringPart,
    Node,
}

impl KtSyntaxKind {
    /// The semantic category of this kind
    pub const fn category(self) -> KindCategory {
        use KtSyntaxKind::*;
        match self {
            Lpar | Lbrace | Lbracket | LongTemplateEntryStart => KindCategory::OpeningDelimiter,
            Rpar | Rbrace | Rbracket | LongTemplateEntryEnd => KindCategory::ClosingDelimiter,
            WhiteSpace => KindCategory::Whitespace,
            EolComment | BlockComment | KdocText => KindCategory::Comment,
            KdocStart | KdocEnd | KdocLeadingAsterisk => KindCategory::DocCommentMarker,
            Dot | SafeAccess | Elvis | ColonColon => KindCategory::ChainOperator,
            Eq | PlusEq | MinusEq | MulEq | DivEq | PercEq | Plus | Minus | Mul | Div | Perc
            | PlusPlus | MinusMinus | Excl | ExclExcl | AndAnd | OrOr | EqEq | ExclEq
            | EqEqEq | ExclEqEq | Lt | Gt | LtEq | GtEq | Range | RangeUntil => {
                KindCategory::Operator
            }
            PackageKeyword | ImportKeyword | ClassKeyword | InterfaceKeyword | FunKeyword
            | ValKeyword | VarKeyword | ObjectKeyword | TypealiasKeyword | IfKeyword
            | ElseKeyword | WhenKeyword | ForKeyword | WhileKeyword | DoKeyword | TryKeyword
            | ReturnKeyword | ThrowKeyword | BreakKeyword | ContinueKeyword | ThisKeyword
            | SuperKeyword | NullKeyword | TrueKeyword | FalseKeyword | InKeyword | NotIn
            | IsKeyword | NotIs | AsKeyword | AsSafe => KindCategory::Keyword,
            IntegerLiteral | FloatLiteral | CharacterLiteral => KindCategory::Literal,
            Identifier => KindCategory::Identifier,
            OpenQuote | ClosingQuote | RegularStringPart | EscapeSequence
            | ShortTemplateEntryStart => KindCategory::StringPart,
            Comma | Semicolon | Colon | Arrow | At | Quest | BadCharacter => {
                KindCategory::Punctuation
            }
            _ => KindCategory::Node,
        }
    }

    /// Returns true if this is a token kind (leaf)
    pub const fn is_token(self) -> bool {
        !matches!(self.category(), KindCategory::Node)
    }

    /// Returns true for tokens the parser skips between meaningful tokens
    pub const fn is_trivia(self) -> bool {
        use KtSyntaxKind::*;
        matches!(
            self,
            WhiteSpace | EolComment | BlockComment | KdocStart | KdocEnd | KdocLeadingAsterisk
                | KdocText
        )
    }

    pub const fn is_comment(self) -> bool {
        matches!(self, KtSyntaxKind::EolComment | KtSyntaxKind::BlockComment)
    }

    pub const fn is_opening_delimiter(self) -> bool {
        matches!(self.category(), KindCategory::OpeningDelimiter)
    }

    pub const fn is_closing_delimiter(self) -> bool {
        matches!(self.category(), KindCategory::ClosingDelimiter)
    }

    /// The opening delimiter a closing delimiter pairs with
    pub const fn matching_opener(self) -> Option<KtSyntaxKind> {
        use KtSyntaxKind::*;
        match self {
            Rpar => Some(Lpar),
            Rbrace => Some(Lbrace),
            Rbracket => Some(Lbracket),
            LongTemplateEntryEnd => Some(LongTemplateEntryStart),
            _ => None,
        }
    }

    /// `.`/`?.` qualified expressions
    pub const fn is_chain_expression(self) -> bool {
        matches!(
            self,
            KtSyntaxKind::DotQualifiedExpression | KtSyntaxKind::SafeAccessExpression
        )
    }

    pub const fn is_loop(self) -> bool {
        matches!(
            self,
            KtSyntaxKind::For | KtSyntaxKind::While | KtSyntaxKind::DoWhile
        )
    }

    /// Kinds that name a call target or a member after a chain operator
    pub const fn is_call_or_reference(self) -> bool {
        matches!(
            self,
            KtSyntaxKind::CallExpression | KtSyntaxKind::ReferenceExpression
        )
    }

    /// Modifier words are identifiers in the lexer; this is the set the parser accepts
    pub fn is_modifier_word(text: &str) -> bool {
        matches!(
            text,
            "public"
                | "private"
                | "protected"
                | "internal"
                | "override"
                | "open"
                | "abstract"
                | "final"
                | "data"
                | "sealed"
                | "enum"
                | "inner"
                | "companion"
                | "const"
                | "lateinit"
                | "suspend"
                | "inline"
                | "operator"
                | "infix"
                | "tailrec"
                | "external"
                | "vararg"
                | "noinline"
                | "crossinline"
                | "annotation"
                | "value"
                | "expect"
                | "actual"
        )
    }

    /// Map a hard keyword's text to its kind
    pub fn keyword(text: &str) -> Option<KtSyntaxKind> {
        use KtSyntaxKind::*;
        Some(match text {
            "package" => PackageKeyword,
            "import" => ImportKeyword,
            "class" => ClassKeyword,
            "interface" => InterfaceKeyword,
            "fun" => FunKeyword,
            "val" => ValKeyword,
            "var" => VarKeyword,
            "object" => ObjectKeyword,
            "typealias" => TypealiasKeyword,
            "if" => IfKeyword,
            "else" => ElseKeyword,
            "when" => WhenKeyword,
            "for" => ForKeyword,
            "while" => WhileKeyword,
            "do" => DoKeyword,
            "try" => TryKeyword,
            "return" => ReturnKeyword,
            "throw" => ThrowKeyword,
            "break" => BreakKeyword,
            "continue" => ContinueKeyword,
            "this" => ThisKeyword,
            "super" => SuperKeyword,
            "null" => NullKeyword,
            "true" => TrueKeyword,
            "false" => FalseKeyword,
            "in" => InKeyword,
            "is" => IsKeyword,
            "as" => AsKeyword,
            _ => return None,
        })
    }
}

impl From<KtSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: KtSyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

impl fmt::Display for KtSyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
