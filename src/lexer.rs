use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
        }
    }

    /// Scan the whole input. Stops at the first lexical error.
    pub fn tokenize(mut self) -> Result<Vec<Spanned<Lexeme>>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Spanned<Lexeme>, Diagnostic> {
        self.skip_whitespace_and_comments()?;

        if self.pos >= self.source.len() {
            return Ok(self.make_token(Lexeme::Eof, self.pos, self.pos));
        }

        let start = self.pos;
        let ch = self.source[self.pos];

        if is_ident_start(ch) {
            return Ok(self.scan_ident_or_keyword());
        }

        if ch.is_ascii_digit() {
            return self.scan_number();
        }

        if ch == b'\'' {
            return self.scan_character();
        }

        self.scan_symbol(start)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), Diagnostic> {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.pos + 1 < self.source.len()
                && self.source[self.pos] == b'/'
                && self.source[self.pos + 1] == b'/'
            {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if self.pos + 1 < self.source.len()
                && self.source[self.pos] == b'/'
                && self.source[self.pos + 1] == b'*'
            {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos + 1 >= self.source.len() {
                        return Err(Diagnostic::error(
                            "unterminated block comment",
                            Span::new(start as u32, self.source.len() as u32),
                        )
                        .with_help("every '/*' must be closed by a matching '*/'"));
                    }
                    if self.source[self.pos] == b'*' && self.source[self.pos + 1] == b'/' {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }

            return Ok(());
        }
    }

    fn scan_ident_or_keyword(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        let token = Lexeme::from_keyword(text).unwrap_or_else(|| Lexeme::Ident(text.to_string()));
        self.make_token(token, start, self.pos)
    }

    fn scan_number(&mut self) -> Result<Spanned<Lexeme>, Diagnostic> {
        let start = self.pos;
        while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos < self.source.len() && is_ident_start(self.source[self.pos]) {
            while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
                self.pos += 1;
            }
            let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
            return Err(Diagnostic::error(
                format!("invalid token '{}'", text),
                Span::new(start as u32, self.pos as u32),
            )
            .with_help("identifiers cannot start with a digit"));
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        match text.parse::<u32>() {
            Ok(n) => Ok(self.make_token(Lexeme::Integer(n), start, self.pos)),
            Err(_) => Err(Diagnostic::error(
                format!("integer literal '{}' is too large", text),
                Span::new(start as u32, self.pos as u32),
            )
            .with_note("values are bytes; anything above 255 wraps modulo 256 anyway")),
        }
    }

    fn scan_character(&mut self) -> Result<Spanned<Lexeme>, Diagnostic> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let value = match self.peek() {
            None | Some(b'\n') => {
                return Err(self.char_error(start, "unterminated character literal"))
            }
            Some(b'\'') => {
                return Err(self.char_error(start, "empty character literal"));
            }
            Some(b'\\') => {
                self.pos += 1;
                self.scan_escape(start)?
            }
            Some(ch) => {
                self.pos += 1;
                ch
            }
        };
        if self.peek() != Some(b'\'') {
            return Err(self.char_error(start, "unterminated character literal"));
        }
        self.pos += 1; // closing quote
        Ok(self.make_token(Lexeme::Character(value), start, self.pos))
    }

    fn scan_escape(&mut self, start: usize) -> Result<u8, Diagnostic> {
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Err(self.char_error(start, "unterminated character literal")),
        };
        self.pos += 1;
        let value = match ch {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'0' => 0,
            b'\\' => b'\\',
            b'\'' => b'\'',
            b'"' => b'"',
            b'x' => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 2 {
                    match self.peek().and_then(hex_digit) {
                        Some(d) => {
                            value = value * 16 + d;
                            self.pos += 1;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err(self.char_error(start, "'\\x' escape needs hex digits"));
                }
                value as u8
            }
            other => {
                return Err(Diagnostic::error(
                    format!("invalid escape sequence '\\{}'", other as char),
                    Span::new(start as u32, self.pos as u32),
                )
                .with_help("supported escapes: \\n \\r \\t \\0 \\\\ \\' \\\" \\xHH"));
            }
        };
        Ok(value)
    }

    fn char_error(&self, start: usize, message: &str) -> Diagnostic {
        Diagnostic::error(message, Span::new(start as u32, self.pos as u32))
            .with_help("character literals look like 'a', '\\n', or '\\x41'")
    }

    fn scan_symbol(&mut self, start: usize) -> Result<Spanned<Lexeme>, Diagnostic> {
        let ch = self.source[self.pos];
        self.pos += 1;

        let token = match ch {
            b'(' => Lexeme::LParen,
            b')' => Lexeme::RParen,
            b'{' => Lexeme::LBrace,
            b'}' => Lexeme::RBrace,
            b'[' => Lexeme::LBracket,
            b']' => Lexeme::RBracket,
            b',' => Lexeme::Comma,
            b';' => Lexeme::Semicolon,
            b'|' => Lexeme::Or,
            b'&' => Lexeme::And,
            b'+' => self.with_assign(Lexeme::Plus, Lexeme::PlusAssign),
            b'-' => self.with_assign(Lexeme::Minus, Lexeme::MinusAssign),
            b'*' => self.with_assign(Lexeme::Star, Lexeme::StarAssign),
            b'/' => self.with_assign(Lexeme::Slash, Lexeme::SlashAssign),
            b'%' => self.with_assign(Lexeme::Percent, Lexeme::PercentAssign),
            b'=' => self.with_assign(Lexeme::Assign, Lexeme::EqEq),
            b'!' => self.with_assign(Lexeme::Not, Lexeme::NotEq),
            b'<' => self.with_assign(Lexeme::Lt, Lexeme::Le),
            b'>' => self.with_assign(Lexeme::Gt, Lexeme::Ge),
            _ => {
                return Err(Diagnostic::error(
                    format!("unexpected character '{}' (U+{:04X})", ch as char, ch),
                    Span::new(start as u32, self.pos as u32),
                )
                .with_help("this character is not part of the language"));
            }
        };

        Ok(self.make_token(token, start, self.pos))
    }

    /// `base` if the next byte is not '=', otherwise the combined token.
    fn with_assign(&mut self, base: Lexeme, combined: Lexeme) -> Lexeme {
        if self.peek() == Some(b'=') {
            self.pos += 1;
            combined
        } else {
            base
        }
    }

    fn peek(&self) -> Option<u8> {
        if self.pos < self.source.len() {
            Some(self.source[self.pos])
        } else {
            None
        }
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(token, Span::new(start as u32, end as u32))
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

fn hex_digit(ch: u8) -> Option<u32> {
    (ch as char).to_digit(16)
}
