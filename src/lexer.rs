use crate::token::{Token, TokenKind, KEYWORDS, OPERATORS, SYMBOLS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// Scans the provided source, producing the tokens into the provided buffer.
///
/// Scanning is total: any character that matches no token rule becomes a
/// single-character [`TokenKind::Unknown`] token, so the produced sequence
/// always covers the whole input (minus skipped whitespace).
pub fn lex<'src>(src: &'src str, tokens: &mut Vec<Token<'src>>) {
    Lexer::new(src, tokens).lex();
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens);
    tokens
}

struct Lexer<'src, 'tok> {
    src: &'src str,
    cursor: usize,
    line: u32,
    column: u32,
    tokens: &'tok mut Vec<Token<'src>>,
}

impl<'src> Lexer<'src, '_> {
    /// Scans the source string until the input is exhausted.
    ///
    /// Tokens are written into the provided tokens buffer.
    fn lex(mut self) {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        while let Some(c) = self.peek() {
            // Whitespace is consumed but never emitted.
            if c.is_whitespace() {
                self.advance(c.len_utf8());
                continue;
            }

            let rest = self.rest();
            if rest.starts_with("//") {
                let len = rest.find('\n').unwrap_or(rest.len());
                self.produce(TokenKind::Comment, len);
            } else if rest.starts_with("/*") {
                let len = rest[2..].find("*/").map_or(rest.len(), |i| i + 4);
                self.produce(TokenKind::Comment, len);
            } else if c == '"' || c == '\'' {
                let len = self.string_len(c);
                self.produce(TokenKind::String, len);
            } else if c.is_ascii_digit() {
                let len = number_len(rest);
                self.produce(TokenKind::Number, len);
            } else if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                self.produce(TokenKind::Operator, op.len());
            } else if SYMBOLS.contains(&c) {
                self.produce(TokenKind::Symbol, c.len_utf8());
            } else if c.is_alphabetic() || c == '_' {
                let len = identifier_len(rest);
                let kind = if KEYWORDS.contains(&rest[..len]) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                self.produce(kind, len);
            } else {
                // Fallback which guarantees forward progress.
                self.produce(TokenKind::Unknown, c.len_utf8());
            }
        }
    }

    /// Returns the byte length of the string literal starting at the cursor.
    ///
    /// A backslash escapes the following character, including the closing
    /// quote. An unterminated literal still yields a best-effort length
    /// spanning to the end of the input.
    fn string_len(&self, quote: char) -> usize {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        chars.next(); // opening quote
        let mut escaping = false;
        for (i, c) in chars {
            if escaping {
                escaping = false;
            } else if c == '\\' {
                escaping = true;
            } else if c == quote {
                return i + c.len_utf8();
            }
        }
        rest.len()
    }
}

/// `digits ('.' digits)? ([eE] [+-]? digits)?`
///
/// The decimal point is only consumed when a digit follows it, and the
/// exponent marker only when an (optionally signed) digit follows, so
/// `1.x` scans as `1` `.` `x` and `2e` as `2` `e`.
fn number_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = digits(0);
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i = digits(i + 1);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            i = digits(j);
        }
    }
    i
}

/// A Unicode letter or underscore, followed by letters, digits and
/// underscores.
fn identifier_len(rest: &str) -> usize {
    rest.char_indices()
        .find(|&(i, c)| i > 0 && !(c.is_alphanumeric() || c == '_'))
        .map_or(rest.len(), |(i, _)| i)
}

impl<'src> Lexer<'src, '_> {
    fn new<'tok>(src: &'src str, tokens: &'tok mut Vec<Token<'src>>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            cursor: 0,
            line: 1,
            column: 1,
            tokens,
        }
    }

    /// Returns the not-yet-scanned suffix of the source.
    fn rest(&self) -> &'src str {
        &self.src[self.cursor..]
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Advances the cursor by `len` bytes, updating the line/column
    /// bookkeeping per consumed character.
    fn advance(&mut self, len: usize) {
        for c in self.src[self.cursor..self.cursor + len].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.cursor += len;
    }

    /// Produces a token spanning the next `len` bytes and advances past it.
    fn produce(&mut self, kind: TokenKind, len: usize) {
        let text = &self.src[self.cursor..self.cursor + len];
        self.tokens
            .push(Token::new(text, kind, self.line, self.column));
        self.advance(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tests_with_position() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "x=1+2;" => [
                ("x", Identifier, 1, 1),
                ("=", Operator, 1, 2),
                ("1", Number, 1, 3),
                ("+", Operator, 1, 4),
                ("2", Number, 1, 5),
                (";", Symbol, 1, 6),
            ],
            "a==b" => [
                ("a", Identifier, 1, 1),
                ("==", Operator, 1, 2),
                ("b", Identifier, 1, 4),
            ],
            "<= >= != && || ++ -- += -= *= /= << >>" => [
                ("<=", Operator, 1, 1),
                (">=", Operator, 1, 4),
                ("!=", Operator, 1, 7),
                ("&&", Operator, 1, 10),
                ("||", Operator, 1, 13),
                ("++", Operator, 1, 16),
                ("--", Operator, 1, 19),
                ("+=", Operator, 1, 22),
                ("-=", Operator, 1, 25),
                ("*=", Operator, 1, 28),
                ("/=", Operator, 1, 31),
                ("<<", Operator, 1, 34),
                (">>", Operator, 1, 37),
            ],
            "int x;\nfloat y;" => [
                ("int", Keyword, 1, 1),
                ("x", Identifier, 1, 5),
                (";", Symbol, 1, 6),
                ("float", Keyword, 2, 1),
                ("y", Identifier, 2, 5),
                (";", Symbol, 2, 6),
            ],
            "1.5 1.5e-3 2E10 1. 2e 7e+" => [
                ("1.5", Number, 1, 1),
                ("1.5e-3", Number, 1, 5),
                ("2E10", Number, 1, 12),
                ("1", Number, 1, 17),
                (".", Symbol, 1, 18),
                ("2", Number, 1, 20),
                ("e", Identifier, 1, 21),
                ("7", Number, 1, 23),
                ("e", Identifier, 1, 24),
                ("+", Operator, 1, 25),
            ],
            r#""hi" 'a' "es\"c" "open"# => [
                (r#""hi""#, String, 1, 1),
                ("'a'", String, 1, 6),
                (r#""es\"c""#, String, 1, 10),
                (r#""open"#, String, 1, 18),
            ],
            "x // rest of line\ny /* span\nlines */ z /* open" => [
                ("x", Identifier, 1, 1),
                ("// rest of line", Comment, 1, 3),
                ("y", Identifier, 2, 1),
                ("/* span\nlines */", Comment, 2, 3),
                ("z", Identifier, 3, 10),
                ("/* open", Comment, 3, 12),
            ],
            "αβ=1; _под2" => [
                ("αβ", Identifier, 1, 1),
                ("=", Operator, 1, 3),
                ("1", Number, 1, 4),
                (";", Symbol, 1, 5),
                ("_под2", Identifier, 1, 7),
            ],
            "a @ b # c" => [
                ("a", Identifier, 1, 1),
                ("@", Unknown, 1, 3),
                ("b", Identifier, 1, 5),
                ("#", Unknown, 1, 7),
                ("c", Identifier, 1, 9),
            ],
            "" => [],
            "   \n\t  " => [],
        });

        for (input, tokens) in cases {
            let lexed = tokenize(input);
            assert_eq!(&lexed, tokens, "input: {input:?}");
        }
    }

    #[test]
    fn keywords_are_case_sensitive() {
        use TokenKind::*;
        let lexed = tokenize("while While None none");
        let kinds: Vec<_> = lexed.iter().map(|t| (t.text, t.kind)).collect();
        assert_eq!(
            kinds,
            [
                ("while", Keyword),
                ("While", Identifier),
                ("None", Keyword),
                ("none", Identifier),
            ]
        );
    }

    /// Every token is a slice of the original input, the slices appear in
    /// source order without overlap, and every skipped gap is whitespace.
    #[test]
    fn lexing_covers_the_whole_input() {
        let inputs = [
            "x=1+2;",
            "if (x <= 10) { y = \"str\"; } else { y = 'c'; }",
            "weird $$$ input @@@ 123abc /* and */ // tail",
            "1..2...3e+e-",
            "\\ \\\\ ``` ?? ::",
        ];
        for src in inputs {
            let mut cursor = 0;
            for token in tokenize(src) {
                let offset = token.text.as_ptr() as usize - src.as_ptr() as usize;
                assert!(offset >= cursor, "tokens out of order in {src:?}");
                assert!(
                    src[cursor..offset].chars().all(char::is_whitespace),
                    "dropped non-whitespace characters in {src:?}"
                );
                assert_eq!(&src[offset..offset + token.text.len()], token.text);
                cursor = offset + token.text.len();
            }
            assert!(
                src[cursor..].chars().all(char::is_whitespace),
                "trailing characters dropped in {src:?}"
            );
        }
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($text:expr, $kind:expr, $line:expr, $column:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![
                    $(Token::new($text, $kind, $line, $column)),*
                ],
            )),*]
        }};
    }
    use cases;
}
