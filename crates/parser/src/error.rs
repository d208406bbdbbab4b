use ast::JsWord;
use thiserror::Error;

pub type PResult<T> = Result<T, Error>;

/// A fatal syntax error, with the position it was found at.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{source_name}:{line}:{col}: {kind}")]
pub struct Error {
    pub kind: SyntaxError,
    pub source_name: JsWord,
    pub line: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedStr,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("unterminated regular expression")]
    UnterminatedRegex,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("expected {expected} but found {found}")]
    Expected { expected: &'static str, found: String },
    #[error("unexpected token {0}")]
    Unexpected(String),
    #[error("'{0}' is a reserved word")]
    ReservedWord(JsWord),
    #[error("invalid assignment target")]
    InvalidAssignTarget,
    #[error("invalid left-hand side in for-in loop")]
    InvalidForInTarget,
    #[error("'{0}' is only valid inside a function")]
    ReturnOutsideFunction(&'static str),
}
