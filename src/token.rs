use std::fmt;

/// A classified lexical unit, borrowing its text from the scanned source.
///
/// `line` and `column` are 1-based; the column counts characters, not
/// bytes, and resets after every newline the lexer consumes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub text: &'src str,
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

impl<'src> Token<'src> {
    pub fn new(text: &'src str, kind: TokenKind, line: u32, column: u32) -> Token<'src> {
        Token {
            text,
            kind,
            line,
            column,
        }
    }

    /// Whether the parser should skip this token while advancing.
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token({:?}, {:?}, {}:{})",
            self.text, self.kind, self.line, self.column
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Operator,
    Symbol,
    Comment,
    /// Never produced by the lexer (whitespace is consumed, not emitted),
    /// but part of the token classification contract.
    Whitespace,
    Unknown,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::Whitespace)
    }
}

pub static KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "int",
    "float",
    "char",
    "double",
    "return",
    "if",
    "else",
    "for",
    "while",
    "do",
    "break",
    "continue",
    "void",
    "public",
    "private",
    "class",
    "static",
    "def",
    "import",
    "from",
    "try",
    "except",
    "finally",
    "new",
    "this",
    "true",
    "false",
    "null",
    "None",
};

/// Keywords that may start a declaration statement.
pub static TYPE_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "int",
    "float",
    "char",
    "double",
    "void",
};

/// The operator table, ordered so that every multi-character operator
/// precedes each of its prefixes. The lexer tries candidates in order,
/// which gives longest-match semantics ("==" wins over "=").
pub const OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "<<", ">>", "=", "+",
    "-", "*", "/", "%", "<", ">", "!", "&", "|", "^", "~",
];

/// Single-character punctuation, matched after the operator table fails.
pub const SYMBOLS: &[char] = &['(', ')', '{', '}', '[', ']', ';', ',', '.', ':'];
