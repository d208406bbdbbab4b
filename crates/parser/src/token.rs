use ast::JsWord;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords. Keywords are distinguished by the parser so
    /// they remain usable as property names.
    Word(JsWord),
    Num(f64),
    Str(JsWord),
    Regex(JsWord),
    Punct(&'static str),
    Eof,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self, Token::Punct(q) if *q == p)
    }

    pub fn is_word(&self, w: &str) -> bool {
        matches!(self, Token::Word(word) if &**word == w)
    }

    /// Whether a `/` following this token starts a division rather than a
    /// regular expression.
    pub(crate) fn ends_value(&self) -> bool {
        match self {
            Token::Word(w) => !is_keyword(w) || matches!(&**w, "this" | "null" | "true" | "false"),
            Token::Num(_) | Token::Str(_) | Token::Regex(_) => true,
            Token::Punct(p) => matches!(*p, ")" | "]" | "}" | "++" | "--"),
            Token::Eof => false,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{}'", w),
            Token::Num(n) => write!(f, "number {}", n),
            Token::Str(s) => write!(f, "string \"{}\"", s),
            Token::Regex(r) => write!(f, "regular expression {}", r),
            Token::Punct(p) => write!(f, "'{}'", p),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// A token together with its position and the JSDoc comment, if any, that
/// immediately precedes it.
#[derive(Debug, Clone)]
pub struct TokenAndPos {
    pub token: Token,
    pub line: u32,
    pub col: u32,
    pub had_line_break: bool,
    pub jsdoc: Option<Rc<str>>,
}

pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "break"
            | "case"
            | "catch"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "in"
            | "instanceof"
            | "new"
            | "return"
            | "switch"
            | "this"
            | "throw"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "null"
            | "true"
            | "false"
    )
}

/// Words that can never be used as binding or reference names.
pub fn is_reserved_word(word: &str) -> bool {
    is_keyword(word)
        || matches!(
            word,
            "class" | "const" | "enum" | "export" | "extends" | "import" | "super"
        )
}

/// Punctuators, longest first so the lexer can match greedily.
pub(crate) const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", ">>>", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "{", "}", "(", ")", "[", "]",
    ";", ",", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];
