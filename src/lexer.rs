use std::{iter::Peekable, str::CharIndices};

use tracing::trace;

use crate::token::{Keyword, Span, Token, TokenKind};

pub mod error;

pub use error::{LexError, LexResult};

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Scans the next token. Once the input is exhausted every call returns
    /// the same end-of-file token.
    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        let token = self.scan_token()?;
        trace!(
            kind = %token.kind,
            lexeme = token.lexeme,
            line = token.span.line,
            column = token.span.column,
            "token"
        );
        Ok(token)
    }

    fn scan_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_whitespace();

        let (start, ch) = match self.chars.peek() {
            Some(&(idx, c)) => (idx, c),
            None => {
                let index = self.input.len();
                return Ok(Token::new(
                    TokenKind::EOF,
                    "",
                    Span {
                        start: index,
                        end: index,
                        line: self.line,
                        column: self.column,
                    },
                ));
            }
        };

        let line = self.line;
        let column = self.column;
        match ch {
            '|' => Ok(self.read_comment(start, line, column)),
            '"' => self
                .read_quoted('"', TokenKind::String, start, line, column)
                .ok_or(LexError::UnterminatedString { line, column }),
            '\'' => self
                .read_quoted('\'', TokenKind::Char, start, line, column)
                .ok_or(LexError::UnterminatedChar { line, column }),
            '.' => Ok(self.single(TokenKind::Dot, start, line, column)),
            ':' => Ok(self.single(TokenKind::Colon, start, line, column)),
            ';' => Ok(self.single(TokenKind::Semicolon, start, line, column)),
            ',' => Ok(self.single(TokenKind::Comma, start, line, column)),
            '(' => Ok(self.single(TokenKind::LParen, start, line, column)),
            ')' => Ok(self.single(TokenKind::RParen, start, line, column)),
            '{' => Ok(self.single(TokenKind::LBrace, start, line, column)),
            '}' => Ok(self.single(TokenKind::RBrace, start, line, column)),
            '<' => Ok(self.read_operator(
                TokenKind::Less,
                &[('<', TokenKind::ShiftLeft), ('=', TokenKind::LessEqual)],
                start,
                line,
                column,
            )),
            '>' => Ok(self.read_operator(
                TokenKind::Greater,
                &[('>', TokenKind::ShiftRight), ('=', TokenKind::GreaterEqual)],
                start,
                line,
                column,
            )),
            '=' => Ok(self.read_operator(
                TokenKind::Assign,
                &[('=', TokenKind::Equal)],
                start,
                line,
                column,
            )),
            '+' => Ok(self.read_operator(
                TokenKind::Plus,
                &[('=', TokenKind::PlusAssign)],
                start,
                line,
                column,
            )),
            '-' => Ok(self.read_operator(
                TokenKind::Minus,
                &[('=', TokenKind::MinusAssign)],
                start,
                line,
                column,
            )),
            '*' => Ok(self.read_operator(
                TokenKind::Star,
                &[('=', TokenKind::StarAssign)],
                start,
                line,
                column,
            )),
            '/' => Ok(self.read_operator(
                TokenKind::Slash,
                &[('=', TokenKind::SlashAssign)],
                start,
                line,
                column,
            )),
            '%' => Ok(self.read_operator(
                TokenKind::Percent,
                &[('=', TokenKind::PercentAssign)],
                start,
                line,
                column,
            )),
            '!' => {
                self.advance_char();
                if let Some(&(_, '=')) = self.chars.peek() {
                    self.advance_char();
                    Ok(self.token_from(TokenKind::NotEqual, start, line, column))
                } else {
                    Err(LexError::UnexpectedCharacter {
                        character: '!',
                        line,
                        column,
                    })
                }
            }
            c if c.is_ascii_digit() => Ok(self.read_number(start, line, column)),
            c if c.is_ascii_alphabetic() => Ok(self.read_identifier(start, line, column)),
            _ => Err(LexError::UnexpectedCharacter {
                character: ch,
                line,
                column,
            }),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token<'a> {
        self.advance_char();
        self.token_from(kind, start, line, column)
    }

    /// Consumes a one-character operator, upgrading it to a two-character
    /// operator when the next character matches one of `pairs`.
    fn read_operator(
        &mut self,
        single: TokenKind,
        pairs: &[(char, TokenKind)],
        start: usize,
        line: usize,
        column: usize,
    ) -> Token<'a> {
        self.advance_char();
        let paired = match self.chars.peek() {
            Some(&(_, next)) => pairs
                .iter()
                .find(|(candidate, _)| *candidate == next)
                .map(|(_, kind)| *kind),
            None => None,
        };
        let kind = match paired {
            Some(kind) => {
                self.advance_char();
                kind
            }
            None => single,
        };
        self.token_from(kind, start, line, column)
    }

    fn read_comment(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.advance_char(); // Consume `|`
        while let Some(&(_, c)) = self.chars.peek() {
            // The closing brace belongs to the enclosing block.
            if c == '\n' || c == '}' {
                break;
            }
            self.advance_char();
        }
        let end = self.current_index();
        Token::new(
            TokenKind::Comment,
            &self.input[start + 1..end],
            Span {
                start,
                end,
                line,
                column,
            },
        )
    }

    fn read_quoted(
        &mut self,
        delimiter: char,
        kind: TokenKind,
        start: usize,
        line: usize,
        column: usize,
    ) -> Option<Token<'a>> {
        self.advance_char(); // Consume opening delimiter
        let content_start = start + delimiter.len_utf8();
        while let Some((idx, c)) = self.advance_char() {
            if c == delimiter {
                return Some(Token::new(
                    kind,
                    &self.input[content_start..idx],
                    Span {
                        start,
                        end: idx + c.len_utf8(),
                        line,
                        column,
                    },
                ));
            }
        }
        None
    }

    fn read_number(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.consume_digits();
        let mut has_decimal = false;
        if let Some(&(_, '.')) = self.chars.peek() {
            has_decimal = true;
            self.advance_char();
            self.consume_digits();
        }
        let digits_end = self.current_index();

        let kind = match self.chars.peek() {
            Some(&(_, 'f' | 'F')) => {
                self.advance_char();
                TokenKind::Float
            }
            Some(&(_, 'd' | 'D')) => {
                self.advance_char();
                TokenKind::Double
            }
            _ if has_decimal => TokenKind::Double,
            _ => TokenKind::Integer,
        };
        let end = self.current_index();
        Token::new(
            kind,
            &self.input[start..digits_end],
            Span {
                start,
                end,
                line,
                column,
            },
        )
    }

    fn consume_digits(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.advance_char(); // Consume first letter
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let end = self.current_index();
        let word = &self.input[start..end];
        let kind = Keyword::lookup(word).map_or(TokenKind::Identifier, TokenKind::Keyword);
        Token::new(
            kind,
            word,
            Span {
                start,
                end,
                line,
                column,
            },
        )
    }

    fn token_from(&mut self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token<'a> {
        let end = self.current_index();
        Token::new(
            kind,
            &self.input[start..end],
            Span {
                start,
                end,
                line,
                column,
            },
        )
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

/// Scans the whole input, including the trailing end-of-file token.
pub fn tokenize(input: &str) -> LexResult<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = matches!(token.kind, TokenKind::EOF);
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("tokenize should succeed")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_simple_program() {
        let input = indoc! {"
            func main() {
                int x = 1;
                System.print(x);
            }
        "};
        let expected_tokens = vec![
            TokenKind::Keyword(Keyword::Func),
            TokenKind::Identifier,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Keyword(Keyword::Int),
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Integer,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::RParen,
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::EOF,
        ];

        assert_eq!(kinds(input), expected_tokens);
    }

    #[test]
    fn disambiguates_one_and_two_character_operators() {
        assert_eq!(
            kinds("< << <= > >> >= = == != + += - -= * *= / /= % %="),
            vec![
                TokenKind::Less,
                TokenKind::ShiftLeft,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::ShiftRight,
                TokenKind::GreaterEqual,
                TokenKind::Assign,
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::Plus,
                TokenKind::PlusAssign,
                TokenKind::Minus,
                TokenKind::MinusAssign,
                TokenKind::Star,
                TokenKind::StarAssign,
                TokenKind::Slash,
                TokenKind::SlashAssign,
                TokenKind::Percent,
                TokenKind::PercentAssign,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn classifies_number_literals_by_suffix_and_decimal_point() {
        let tokens = tokenize("42 3.14 2.5f 7d 1.0D 9F").expect("tokenize should succeed");
        let actual = tokens
            .iter()
            .map(|token| (token.kind, token.lexeme))
            .collect::<Vec<_>>();
        assert_eq!(
            actual,
            vec![
                (TokenKind::Integer, "42"),
                (TokenKind::Double, "3.14"),
                (TokenKind::Float, "2.5"),
                (TokenKind::Double, "7"),
                (TokenKind::Double, "1.0"),
                (TokenKind::Float, "9"),
                (TokenKind::EOF, ""),
            ]
        );
    }

    #[test]
    fn identifiers_may_contain_dashes_and_keywords_are_case_sensitive() {
        let tokens = tokenize("first-name else-if AND and user_id").expect("tokenize should succeed");
        let actual = tokens
            .iter()
            .map(|token| (token.kind, token.lexeme))
            .collect::<Vec<_>>();
        assert_eq!(
            actual,
            vec![
                (TokenKind::Identifier, "first-name"),
                (TokenKind::Keyword(Keyword::ElseIf), "else-if"),
                (TokenKind::Keyword(Keyword::And), "AND"),
                (TokenKind::Identifier, "and"),
                (TokenKind::Identifier, "user_id"),
                (TokenKind::EOF, ""),
            ]
        );
    }

    #[test]
    fn comment_stops_before_newline_or_closing_brace() {
        let tokens = tokenize("{ | inline note }\n| full line\nx").expect("tokenize should succeed");
        let actual = tokens
            .iter()
            .map(|token| (token.kind, token.lexeme))
            .collect::<Vec<_>>();
        assert_eq!(
            actual,
            vec![
                (TokenKind::LBrace, "{"),
                (TokenKind::Comment, " inline note "),
                (TokenKind::RBrace, "}"),
                (TokenKind::Comment, " full line"),
                (TokenKind::Identifier, "x"),
                (TokenKind::EOF, ""),
            ]
        );
    }

    #[test]
    fn string_and_char_contents_are_verbatim() {
        let tokens = tokenize(r#""a\nb" 'c' "two words""#).expect("tokenize should succeed");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "a\\nb");
        assert_eq!(tokens[1].kind, TokenKind::Char);
        assert_eq!(tokens[1].lexeme, "c");
        assert_eq!(tokens[2].lexeme, "two words");
    }

    #[test]
    fn tracks_line_and_column_across_newlines() {
        let tokens = tokenize("a\nb\n   c").expect("tokenize should succeed");
        let positions = tokens
            .iter()
            .map(|token| (token.span.line, token.span.column))
            .collect::<Vec<_>>();
        assert_eq!(positions, vec![(1, 1), (2, 1), (3, 4), (3, 5)]);
    }

    #[test]
    fn end_of_input_is_idempotent() {
        let mut lexer = Lexer::new("x");
        let identifier = lexer.next_token().expect("identifier");
        assert_eq!(identifier.kind, TokenKind::Identifier);

        let first_eof = lexer.next_token().expect("first eof");
        for _ in 0..3 {
            let again = lexer.next_token().expect("repeated eof");
            assert_eq!(again, first_eof);
        }
        assert_eq!(first_eof.kind, TokenKind::EOF);
        assert_eq!(first_eof.span.column, 2);
    }

    #[test]
    fn errors_on_invalid_character() {
        let err = tokenize("x = 1 @ 2;").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '@',
                line: 1,
                column: 7,
            }
        );
        assert!(err.to_string().contains("Unknown character '@'"));
    }

    #[test]
    fn errors_on_lone_bang() {
        let err = tokenize("x ! y").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '!',
                line: 1,
                column: 3,
            }
        );
    }

    #[test]
    fn errors_on_unterminated_literals() {
        let err = tokenize("x = \"open").expect_err("expected unterminated string");
        assert_eq!(err, LexError::UnterminatedString { line: 1, column: 5 });

        let err = tokenize("\nc = 'x").expect_err("expected unterminated char");
        assert_eq!(err, LexError::UnterminatedChar { line: 2, column: 5 });
    }
}
