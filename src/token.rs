use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Types
    Int,
    Char,
    String,
    Bool,
    Float,
    Double,

    // Declarations
    Auto,
    Define,
    Func,
    Namespace,
    Class,
    Instance,
    Init,
    Import,

    // Control flow
    If,
    Else,
    ElseIf,
    For,
    In,
    While,
    Do,
    Switch,
    Case,
    Return,

    // Error handling
    Try,
    Happen,
    As,

    // Literals and logical operators
    True,
    False,
    And,
    Or,
    Xor,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Self> {
        let keyword = match word {
            "int" => Keyword::Int,
            "char" => Keyword::Char,
            "string" => Keyword::String,
            "bool" => Keyword::Bool,
            "float" => Keyword::Float,
            "double" => Keyword::Double,
            "auto" => Keyword::Auto,
            "define" => Keyword::Define,
            "func" => Keyword::Func,
            "namespace" => Keyword::Namespace,
            "class" => Keyword::Class,
            "instance" => Keyword::Instance,
            "init" => Keyword::Init,
            "import" => Keyword::Import,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "else-if" => Keyword::ElseIf,
            "for" => Keyword::For,
            "in" => Keyword::In,
            "while" => Keyword::While,
            "do" => Keyword::Do,
            "switch" => Keyword::Switch,
            "case" => Keyword::Case,
            "return" => Keyword::Return,
            "try" => Keyword::Try,
            "happen" => Keyword::Happen,
            "as" => Keyword::As,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "XOR" => Keyword::Xor,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::String => "string",
            Keyword::Bool => "bool",
            Keyword::Float => "float",
            Keyword::Double => "double",
            Keyword::Auto => "auto",
            Keyword::Define => "define",
            Keyword::Func => "func",
            Keyword::Namespace => "namespace",
            Keyword::Class => "class",
            Keyword::Instance => "instance",
            Keyword::Init => "init",
            Keyword::Import => "import",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::ElseIf => "else-if",
            Keyword::For => "for",
            Keyword::In => "in",
            Keyword::While => "while",
            Keyword::Do => "do",
            Keyword::Switch => "switch",
            Keyword::Case => "case",
            Keyword::Return => "return",
            Keyword::Try => "try",
            Keyword::Happen => "happen",
            Keyword::As => "as",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Xor => "XOR",
        }
    }

    /// Keywords that name a declared value type.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Keyword::Int
                | Keyword::Char
                | Keyword::String
                | Keyword::Bool
                | Keyword::Float
                | Keyword::Double
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    Comment,

    // Literals
    String,
    Char,
    Integer,
    Float,
    Double,

    // Operators
    Assign,        // =
    Plus,          // +
    Minus,         // -
    Star,          // *
    Slash,         // /
    Percent,       // %
    ShiftLeft,     // <<
    ShiftRight,    // >>
    Equal,         // ==
    NotEqual,      // !=
    Less,          // <
    LessEqual,     // <=
    Greater,       // >
    GreaterEqual,  // >=
    PlusAssign,    // +=
    MinusAssign,   // -=
    StarAssign,    // *=
    SlashAssign,   // /=
    PercentAssign, // %=

    // Delimiters
    Dot,       // .
    Colon,     // :
    Semicolon, // ;
    Comma,     // ,
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }

    // Structural
    EOF,
}

impl TokenKind {
    /// Human-readable category name used in syntax errors.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Keyword(_) => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::Comment => "comment",
            TokenKind::String => "string literal",
            TokenKind::Char => "char literal",
            TokenKind::Integer => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Double => "double literal",
            TokenKind::Assign => "assignment operator",
            TokenKind::Plus => "plus",
            TokenKind::Minus => "minus",
            TokenKind::Star => "multiply",
            TokenKind::Slash => "divide",
            TokenKind::Percent => "modulo",
            TokenKind::ShiftLeft => "left shift",
            TokenKind::ShiftRight => "right shift",
            TokenKind::Equal => "equal",
            TokenKind::NotEqual => "not equal",
            TokenKind::Less => "less than",
            TokenKind::LessEqual => "less than or equal",
            TokenKind::Greater => "greater than",
            TokenKind::GreaterEqual => "greater than or equal",
            TokenKind::PlusAssign => "plus assign",
            TokenKind::MinusAssign => "minus assign",
            TokenKind::StarAssign => "multiply assign",
            TokenKind::SlashAssign => "divide assign",
            TokenKind::PercentAssign => "modulo assign",
            TokenKind::Dot => "dot",
            TokenKind::Colon => "colon",
            TokenKind::Semicolon => "semicolon",
            TokenKind::Comma => "comma",
            TokenKind::LParen => "left parenthesis",
            TokenKind::RParen => "right parenthesis",
            TokenKind::LBrace => "left brace",
            TokenKind::RBrace => "right brace",
            TokenKind::EOF => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(keyword) => write!(f, "keyword '{}'", keyword.as_str()),
            other => f.write_str(other.describe()),
        }
    }
}

/// A scanned token. `lexeme` borrows the source: literal contents without
/// their delimiters, comment text after `|`, numbers without their suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}
