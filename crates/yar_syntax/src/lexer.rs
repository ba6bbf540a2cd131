//! Byte-driven lexer for yar source text.
//!
//! The lexer walks the raw byte buffer and produces [`Token`]s one at a time,
//! ending with an EOF token. It is UTF-8-agnostic: only ASCII is interpreted,
//! everything else passes through inside string literals or comes out as an
//! illegal token.
//!
//! ## Position tracking
//!
//! Lines and columns are 1-based. A newline increments the line and resets
//! the column; every token carries the span of its source text.
//!
//! ## Newlines and comments
//!
//! Whitespace (space, tab, CR) is skipped between tokens. Newlines are
//! emitted as distinct tokens because the statement layer treats them as
//! terminators. Line (`//`) and block (`/* */`, no nesting) comments are
//! emitted as [`TokenKind::Comment`] tokens and filtered by the parser.
//!
//! ## Operator folding
//!
//! Multi-character operators are disambiguated with one-character lookahead
//! after the first byte (`:` → `::` or `:=`, `<` → `<<`, `<=`). The
//! shift-assign operators `<<=`/`>>=` are the single case needing a second
//! character of lookahead.
//!
//! ## Failure mode
//!
//! The lexer never aborts. A byte that starts no known token becomes an
//! [`TokenKind::Illegal`] token; an unterminated string simply ends at EOF
//! and later phases observe the truncated content.

use crate::token::{lookup_keyword, Token, TokenKind};
use yar_base::{Pos, Span};

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn cur(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 2).copied()
    }

    fn position(&self) -> Pos {
        Pos::new(self.line, self.column, self.pos)
    }

    fn advance(&mut self) {
        if let Some(b) = self.cur() {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.cur() {
            match b {
                b' ' | b'\t' | b'\r' => self.advance(),
                _ => break,
            }
        }
    }

    /// Produces the next token. Returns EOF forever once the input is spent.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position();
        let b = match self.cur() {
            Some(b) => b,
            None => return Token::new(TokenKind::Eof, "", Span::at(start)),
        };

        match b {
            b'\n' => {
                self.advance();
                self.make(TokenKind::Newline, start)
            }
            b'/' => match self.peek() {
                Some(b'/') => self.line_comment(start),
                Some(b'*') => self.block_comment(start),
                Some(b'=') => self.two(TokenKind::SlashAssign, start),
                _ => self.one(TokenKind::Slash, start),
            },
            b'0'..=b'9' => self.number(start),
            b'.' => match self.peek() {
                Some(b'0'..=b'9') => self.number(start),
                Some(b'.') => self.two(TokenKind::DotDot, start),
                _ => self.one(TokenKind::Dot, start),
            },
            b'"' => self.string_literal(start, b'"', TokenKind::Str),
            b'\'' => self.string_literal(start, b'\'', TokenKind::Char),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(start),
            b'(' => self.one(TokenKind::LParen, start),
            b')' => self.one(TokenKind::RParen, start),
            b'{' => self.one(TokenKind::LBrace, start),
            b'}' => self.one(TokenKind::RBrace, start),
            b'[' => self.one(TokenKind::LBracket, start),
            b']' => self.one(TokenKind::RBracket, start),
            b',' => self.one(TokenKind::Comma, start),
            b';' => self.one(TokenKind::Semicolon, start),
            b'?' => self.one(TokenKind::Question, start),
            b'~' => self.one(TokenKind::Tilde, start),
            b'=' => match self.peek() {
                Some(b'=') => self.two(TokenKind::Eq, start),
                _ => self.one(TokenKind::Assign, start),
            },
            b'!' => match self.peek() {
                Some(b'=') => self.two(TokenKind::NotEq, start),
                _ => self.one(TokenKind::Bang, start),
            },
            b':' => match self.peek() {
                Some(b':') => self.two(TokenKind::ColonColon, start),
                Some(b'=') => self.two(TokenKind::ColonAssign, start),
                _ => self.one(TokenKind::Colon, start),
            },
            b'<' => match self.peek() {
                // <<= is the only operator needing two characters of lookahead.
                Some(b'<') => match self.peek2() {
                    Some(b'=') => self.three(TokenKind::ShlAssign, start),
                    _ => self.two(TokenKind::Shl, start),
                },
                Some(b'=') => self.two(TokenKind::LtEq, start),
                _ => self.one(TokenKind::Lt, start),
            },
            b'>' => match self.peek() {
                Some(b'>') => match self.peek2() {
                    Some(b'=') => self.three(TokenKind::ShrAssign, start),
                    _ => self.two(TokenKind::Shr, start),
                },
                Some(b'=') => self.two(TokenKind::GtEq, start),
                _ => self.one(TokenKind::Gt, start),
            },
            b'+' => match self.peek() {
                Some(b'=') => self.two(TokenKind::PlusAssign, start),
                _ => self.one(TokenKind::Plus, start),
            },
            b'-' => match self.peek() {
                Some(b'=') => self.two(TokenKind::MinusAssign, start),
                Some(b'>') => self.two(TokenKind::Arrow, start),
                _ => self.one(TokenKind::Minus, start),
            },
            b'*' => match self.peek() {
                Some(b'=') => self.two(TokenKind::StarAssign, start),
                _ => self.one(TokenKind::Star, start),
            },
            b'%' => match self.peek() {
                Some(b'=') => self.two(TokenKind::PercentAssign, start),
                _ => self.one(TokenKind::Percent, start),
            },
            b'&' => match self.peek() {
                Some(b'&') => self.two(TokenKind::AndAnd, start),
                Some(b'=') => self.two(TokenKind::AmpAssign, start),
                _ => self.one(TokenKind::Amp, start),
            },
            b'|' => match self.peek() {
                Some(b'|') => self.two(TokenKind::OrOr, start),
                Some(b'=') => self.two(TokenKind::PipeAssign, start),
                _ => self.one(TokenKind::Pipe, start),
            },
            b'^' => match self.peek() {
                Some(b'=') => self.two(TokenKind::CaretAssign, start),
                _ => self.one(TokenKind::Caret, start),
            },
            _ => self.one(TokenKind::Illegal, start),
        }
    }

    fn one(&mut self, kind: TokenKind, start: Pos) -> Token {
        self.advance();
        self.make(kind, start)
    }

    fn two(&mut self, kind: TokenKind, start: Pos) -> Token {
        self.advance();
        self.advance();
        self.make(kind, start)
    }

    fn three(&mut self, kind: TokenKind, start: Pos) -> Token {
        self.advance();
        self.advance();
        self.advance();
        self.make(kind, start)
    }

    /// Builds a token whose lexeme is the source slice from `start` to here.
    fn make(&self, kind: TokenKind, start: Pos) -> Token {
        let end = self.position();
        let lexeme = &self.source[start.offset..end.offset];
        Token::new(kind, lexeme, Span::new(start, end))
    }

    fn line_comment(&mut self, start: Pos) -> Token {
        while let Some(b) = self.cur() {
            if b == b'\n' {
                break;
            }
            self.advance();
        }
        self.make(TokenKind::Comment, start)
    }

    fn block_comment(&mut self, start: Pos) -> Token {
        self.advance();
        self.advance();
        while let Some(b) = self.cur() {
            if b == b'*' && self.peek() == Some(b'/') {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }
        self.make(TokenKind::Comment, start)
    }

    fn identifier(&mut self, start: Pos) -> Token {
        while let Some(b) = self.cur() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => self.advance(),
                _ => break,
            }
        }
        let end = self.position();
        let text = &self.source[start.offset..end.offset];
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, Span::new(start, end))
    }

    /// Scans an integer or float literal. Emits a single token; the kind is
    /// int vs float based on the presence of `.` or an exponent.
    fn number(&mut self, start: Pos) -> Token {
        let mut is_float = false;

        if self.cur() == Some(b'.') {
            // Leading-dot float: `.5`
            is_float = true;
            self.advance();
            self.digits();
        } else if self.cur() == Some(b'0')
            && matches!(self.peek(), Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B'))
        {
            // Base-prefixed integer: 0x / 0o / 0b, case-insensitive.
            self.advance();
            self.advance();
            while let Some(b) = self.cur() {
                if b.is_ascii_alphanumeric() || b == b'_' {
                    self.advance();
                } else {
                    break;
                }
            }
            return self.make(TokenKind::Int, start);
        } else {
            self.digits();
            if self.cur() == Some(b'.') {
                match self.peek() {
                    // `0..3` is an int followed by a range operator.
                    Some(b'.') => {}
                    Some(b'0'..=b'9') => {
                        is_float = true;
                        self.advance();
                        self.digits();
                    }
                    // `5.foo` keeps the dot for field access; `5.` is a
                    // trailing-dot float.
                    Some(b'a'..=b'z' | b'A'..=b'Z' | b'_') => {}
                    _ => {
                        is_float = true;
                        self.advance();
                    }
                }
            }
        }

        // Optional signed decimal exponent.
        if matches!(self.cur(), Some(b'e' | b'E')) {
            let signed = matches!(self.peek(), Some(b'+' | b'-'));
            let exp_digit = if signed { self.peek2() } else { self.peek() };
            if matches!(exp_digit, Some(b'0'..=b'9')) {
                is_float = true;
                self.advance();
                if signed {
                    self.advance();
                }
                self.digits();
            }
        }

        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        self.make(kind, start)
    }

    fn digits(&mut self) {
        while let Some(b) = self.cur() {
            match b {
                b'0'..=b'9' | b'_' => self.advance(),
                _ => break,
            }
        }
    }

    /// Scans a quoted literal, decoding escapes. The span covers the quotes;
    /// the lexeme is the decoded content. An unterminated literal ends at EOF.
    fn string_literal(&mut self, start: Pos, quote: u8, kind: TokenKind) -> Token {
        self.advance();
        let mut content = String::new();
        while let Some(b) = self.cur() {
            if b == quote {
                self.advance();
                break;
            }
            if b == b'\\' {
                self.advance();
                if let Some(esc) = self.cur() {
                    content.push(decode_escape(esc));
                    self.advance();
                }
                continue;
            }
            content.push(b as char);
            self.advance();
        }
        let end = self.position();
        Token::new(kind, content, Span::new(start, end))
    }
}

fn decode_escape(b: u8) -> char {
    match b {
        b'n' => '\n',
        b't' => '\t',
        b'r' => '\r',
        b'0' => '\0',
        other => other as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let kind = tok.kind;
            out.push(kind);
            if kind == TokenKind::Eof {
                return out;
            }
        }
    }

    fn lex_one(source: &str) -> Token {
        Lexer::new(source).next_token()
    }

    #[test]
    fn positions_are_one_based() {
        let mut lexer = Lexer::new("a\n  b");
        let a = lexer.next_token();
        assert_eq!((a.span.start.line, a.span.start.column), (1, 1));
        let newline = lexer.next_token();
        assert_eq!(newline.kind, TokenKind::Newline);
        let b = lexer.next_token();
        assert_eq!((b.span.start.line, b.span.start.column), (2, 3));
    }

    #[test]
    fn multi_char_operators_fold() {
        assert_eq!(
            kinds(":= :: -> .. == != <= >= << >> && ||"),
            vec![
                TokenKind::ColonAssign,
                TokenKind::ColonColon,
                TokenKind::Arrow,
                TokenKind::DotDot,
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Shl,
                TokenKind::Shr,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn shift_assign_needs_two_lookahead() {
        assert_eq!(
            kinds("<<= >>= << = >> ="),
            vec![
                TokenKind::ShlAssign,
                TokenKind::ShrAssign,
                TokenKind::Shl,
                TokenKind::Assign,
                TokenKind::Shr,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numeric_literal_forms() {
        assert_eq!(lex_one("42").kind, TokenKind::Int);
        assert_eq!(lex_one("1_000_000").kind, TokenKind::Int);
        assert_eq!(lex_one("0xFF_EC").kind, TokenKind::Int);
        assert_eq!(lex_one("0o777").kind, TokenKind::Int);
        assert_eq!(lex_one("0b1010").kind, TokenKind::Int);
        assert_eq!(lex_one("3.14").kind, TokenKind::Float);
        assert_eq!(lex_one(".5").kind, TokenKind::Float);
        assert_eq!(lex_one("5.").kind, TokenKind::Float);
        assert_eq!(lex_one("1e9").kind, TokenKind::Float);
        assert_eq!(lex_one("2.5e-3").kind, TokenKind::Float);
    }

    #[test]
    fn int_before_range_stays_int() {
        assert_eq!(
            kinds("0..3"),
            vec![
                TokenKind::Int,
                TokenKind::DotDot,
                TokenKind::Int,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_lexeme_is_decoded_without_quotes() {
        let tok = lex_one("\"hi\\n\\\"there\\\"\"");
        assert_eq!(tok.kind, TokenKind::Str);
        assert_eq!(tok.lexeme, "hi\n\"there\"");
        // Span still covers the quotes.
        assert_eq!(tok.span.start.offset, 0);
        assert_eq!(tok.span.end.offset, 15);
    }

    #[test]
    fn unterminated_string_ends_at_eof() {
        let tok = lex_one("\"abc");
        assert_eq!(tok.kind, TokenKind::Str);
        assert_eq!(tok.lexeme, "abc");
    }

    #[test]
    fn char_literal() {
        let tok = lex_one("'x'");
        assert_eq!(tok.kind, TokenKind::Char);
        assert_eq!(tok.lexeme, "x");
    }

    #[test]
    fn comments_are_tokens() {
        assert_eq!(
            kinds("1 // trailing\n/* block */ 2"),
            vec![
                TokenKind::Int,
                TokenKind::Comment,
                TokenKind::Newline,
                TokenKind::Comment,
                TokenKind::Int,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("fn main let mutable"),
            vec![
                TokenKind::Fn,
                TokenKind::Ident,
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn illegal_byte_is_reported_not_fatal() {
        assert_eq!(
            kinds("a $ b"),
            vec![
                TokenKind::Ident,
                TokenKind::Illegal,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }
}
