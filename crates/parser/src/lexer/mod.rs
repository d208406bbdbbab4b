mod util;

use crate::{
    error::{Error, PResult, SyntaxError},
    token::{Token, TokenAndPos, PUNCTUATORS},
};
use ast::JsWord;
use std::rc::Rc;
pub use util::{is_ident_part, is_ident_start, is_line_break};
use util::{is_valid_regex_flag, is_whitespace};

/// Splits a source text into [Token]s.
///
/// Whether a `/` starts a regular expression is decided from the previous
/// token, so the lexer must be driven in order.
pub struct Lexer<'a> {
    src: &'a str,
    /// Byte offset of the next unread character.
    pos: usize,
    line: u32,
    col: u32,
    source_name: JsWord,
    prev_ends_value: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source_name: JsWord, src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            col: 0,
            source_name,
            prev_ends_value: false,
        }
    }

    /// Gets the current char in the input.
    #[inline]
    fn cur(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    /// Gets the char after the current one.
    #[inline]
    fn peek(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) {
        let ch = match self.cur() {
            Some(ch) => ch,
            None => return,
        };
        self.pos += ch.len_utf8();
        // `\r\n` is a single line break.
        if is_line_break(ch) && !(ch == '\r' && self.cur() == Some('\n')) {
            self.line += 1;
            self.col = 0;
        } else if ch != '\r' {
            self.col += 1;
        }
    }

    fn error(&self, kind: SyntaxError, line: u32, col: u32) -> Error {
        Error {
            kind,
            source_name: self.source_name.clone(),
            line,
            col,
        }
    }

    pub fn next_token(&mut self) -> PResult<TokenAndPos> {
        let (had_line_break, jsdoc) = self.skip_space()?;
        let (line, col) = (self.line, self.col);

        let token = match self.cur() {
            None => Token::Eof,
            Some(ch) => self.read_token(ch, line, col)?,
        };
        self.prev_ends_value = token.ends_value();

        Ok(TokenAndPos {
            token,
            line,
            col,
            had_line_break,
            jsdoc,
        })
    }

    /// Skips whitespace and comments, returning whether a line break was seen
    /// and the last JSDoc comment passed over.
    fn skip_space(&mut self) -> PResult<(bool, Option<Rc<str>>)> {
        let mut had_line_break = false;
        let mut jsdoc = None;
        while let Some(ch) = self.cur() {
            if is_line_break(ch) {
                had_line_break = true;
                self.bump();
            } else if is_whitespace(ch) {
                self.bump();
            } else if ch == '/' && self.peek() == Some('/') {
                while let Some(ch) = self.cur() {
                    if is_line_break(ch) {
                        break;
                    }
                    self.bump();
                }
            } else if ch == '/' && self.peek() == Some('*') {
                let (line, col) = (self.line, self.col);
                self.bump();
                self.bump();
                let start = self.pos;
                loop {
                    match self.cur() {
                        None => return Err(self.error(SyntaxError::UnterminatedComment, line, col)),
                        Some('*') if self.peek() == Some('/') => break,
                        Some(ch) => {
                            had_line_break |= is_line_break(ch);
                            self.bump();
                        }
                    }
                }
                let text = &self.src[start..self.pos];
                self.bump();
                self.bump();
                // `/**/` is an empty block comment, not JSDoc.
                if let Some(body) = text.strip_prefix('*') {
                    jsdoc = Some(Rc::from(body));
                }
            } else {
                break;
            }
        }
        Ok((had_line_break, jsdoc))
    }

    fn read_token(&mut self, ch: char, line: u32, col: u32) -> PResult<Token> {
        match ch {
            '"' | '\'' => self.read_str(ch, line, col),
            '0'..='9' => self.read_number(line, col),
            '.' if matches!(self.peek(), Some('0'..='9')) => self.read_number(line, col),
            '/' if !self.prev_ends_value => self.read_regex(line, col),
            '\\' => Err(self.error(SyntaxError::UnexpectedChar(ch), line, col)),
            _ if is_ident_start(ch) => Ok(self.read_word()),
            _ => {
                let rest = &self.src[self.pos..];
                match PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
                    Some(punct) => {
                        for _ in 0..punct.len() {
                            self.bump();
                        }
                        Ok(Token::Punct(punct))
                    }
                    None => Err(self.error(SyntaxError::UnexpectedChar(ch), line, col)),
                }
            }
        }
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        while let Some(ch) = self.cur() {
            if !is_ident_part(ch) {
                break;
            }
            self.bump();
        }
        Token::Word(JsWord::from(&self.src[start..self.pos]))
    }

    fn read_number(&mut self, line: u32, col: u32) -> PResult<Token> {
        let start = self.pos;
        let value = if self.cur() == Some('0') && matches!(self.peek(), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            let digits_start = self.pos;
            while matches!(self.cur(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[digits_start..self.pos];
            if digits.is_empty() {
                return Err(self.error(SyntaxError::InvalidNumber, line, col));
            }
            digits
                .chars()
                .filter_map(|c| c.to_digit(16))
                .fold(0.0, |acc, d| acc * 16.0 + f64::from(d))
        } else {
            self.eat_digits();
            if self.cur() == Some('.') {
                self.bump();
                self.eat_digits();
            }
            if matches!(self.cur(), Some('e') | Some('E')) {
                self.bump();
                if matches!(self.cur(), Some('+') | Some('-')) {
                    self.bump();
                }
                if !matches!(self.cur(), Some('0'..='9')) {
                    return Err(self.error(SyntaxError::InvalidNumber, line, col));
                }
                self.eat_digits();
            }
            self.src[start..self.pos]
                .parse::<f64>()
                .map_err(|_| self.error(SyntaxError::InvalidNumber, line, col))?
        };
        // `3in x` is not a number followed by a keyword.
        if matches!(self.cur(), Some(c) if is_ident_start(c)) {
            return Err(self.error(SyntaxError::InvalidNumber, line, col));
        }
        Ok(Token::Num(value))
    }

    fn eat_digits(&mut self) {
        while matches!(self.cur(), Some('0'..='9')) {
            self.bump();
        }
    }

    fn read_str(&mut self, quote: char, line: u32, col: u32) -> PResult<Token> {
        self.bump();
        let mut value = String::new();
        loop {
            let ch = match self.cur() {
                Some(ch) if ch == quote => {
                    self.bump();
                    break;
                }
                Some(ch) if ch == '\n' || ch == '\r' => {
                    return Err(self.error(SyntaxError::UnterminatedStr, line, col))
                }
                None => return Err(self.error(SyntaxError::UnterminatedStr, line, col)),
                Some(ch) => ch,
            };
            if ch != '\\' {
                value.push(ch);
                self.bump();
                continue;
            }
            let (escape_line, escape_col) = (self.line, self.col);
            self.bump();
            let escaped = match self.cur() {
                Some(ch) => ch,
                None => return Err(self.error(SyntaxError::UnterminatedStr, line, col)),
            };
            self.bump();
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                'b' => value.push('\u{8}'),
                'f' => value.push('\u{C}'),
                'v' => value.push('\u{B}'),
                '0' if !matches!(self.cur(), Some('0'..='9')) => value.push('\0'),
                'x' | 'u' => {
                    let len = if escaped == 'x' { 2 } else { 4 };
                    let mut code = 0;
                    for _ in 0..len {
                        match self.cur().and_then(|c| c.to_digit(16)) {
                            Some(digit) => {
                                code = code * 16 + digit;
                                self.bump();
                            }
                            None => {
                                return Err(self.error(
                                    SyntaxError::InvalidEscape,
                                    escape_line,
                                    escape_col,
                                ))
                            }
                        }
                    }
                    value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                }
                // Line continuation.
                '\r' => {
                    if self.cur() == Some('\n') {
                        self.bump();
                    }
                }
                '\n' | '\u{2028}' | '\u{2029}' => {}
                other => value.push(other),
            }
        }
        Ok(Token::Str(JsWord::from(value)))
    }

    fn read_regex(&mut self, line: u32, col: u32) -> PResult<Token> {
        let start = self.pos;
        self.bump();
        let mut in_class = false;
        loop {
            match self.cur() {
                None => return Err(self.error(SyntaxError::UnterminatedRegex, line, col)),
                Some(ch) if is_line_break(ch) => {
                    return Err(self.error(SyntaxError::UnterminatedRegex, line, col))
                }
                Some('\\') => {
                    self.bump();
                    if matches!(self.cur(), None) || self.cur().map_or(false, is_line_break) {
                        return Err(self.error(SyntaxError::UnterminatedRegex, line, col));
                    }
                    self.bump();
                }
                Some('[') => {
                    in_class = true;
                    self.bump();
                }
                Some(']') => {
                    in_class = false;
                    self.bump();
                }
                Some('/') if !in_class => {
                    self.bump();
                    break;
                }
                Some(_) => self.bump(),
            }
        }
        while let Some(ch) = self.cur() {
            if !is_valid_regex_flag(ch) {
                if is_ident_part(ch) {
                    return Err(self.error(SyntaxError::UnexpectedChar(ch), self.line, self.col));
                }
                break;
            }
            self.bump();
        }
        Ok(Token::Regex(JsWord::from(&self.src[start..self.pos])))
    }
}
