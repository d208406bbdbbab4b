mod expression;
mod function;
mod statement;

use crate::{
    error::{Error, PResult, SyntaxError},
    jsdoc::{parse_inline_type, parse_jsdoc},
    lexer::Lexer,
    token::{is_reserved_word, Token, TokenAndPos},
};
use ast::{Ast, JsWord, NodeFlags, NodeId, SourcePos, Token as T};
use std::rc::Rc;

/// EcmaScript 5 parser.
pub struct Parser<'a> {
    ast: &'a mut Ast,
    input: Lexer<'a>,
    cur: TokenAndPos,
    source_name: JsWord,
    is_externs: bool,
    /// Number of functions enclosing the current position.
    function_depth: u32,
    /// `in` is not a binary operator in the initializer of a `for`.
    no_in: bool,
}

impl<'a> Parser<'a> {
    pub fn new(ast: &'a mut Ast, source_name: JsWord, src: &'a str, is_externs: bool) -> Self {
        Parser {
            ast,
            input: Lexer::new(source_name.clone(), src),
            cur: TokenAndPos {
                token: Token::Eof,
                line: 1,
                col: 0,
                had_line_break: false,
                jsdoc: None,
            },
            source_name,
            is_externs,
            function_depth: 0,
            no_in: false,
        }
    }

    /// Parses the whole input and appends it to the root as a `SCRIPT`.
    pub fn parse_script(mut self) -> PResult<NodeId> {
        self.cur = self.input.next_token()?;
        let script = self.node(T::Script, self.pos());
        while self.cur.token != Token::Eof {
            let statement = self.parse_statement()?;
            self.ast.append_child(script, statement);
        }
        let root = self.ast.root();
        self.ast.append_child(root, script);
        Ok(script)
    }

    // ---- tokens ----

    fn bump(&mut self) -> PResult<()> {
        self.cur = self.input.next_token()?;
        Ok(())
    }

    fn is(&self, punct: &str) -> bool {
        self.cur.token.is_punct(punct)
    }

    fn is_word(&self, word: &str) -> bool {
        self.cur.token.is_word(word)
    }

    fn eat(&mut self, punct: &str) -> PResult<bool> {
        if self.is(punct) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, punct: &'static str) -> PResult<()> {
        if self.eat(punct)? {
            Ok(())
        } else {
            Err(self.expected(punct))
        }
    }

    /// The word at the current position, if any.
    fn cur_word(&self) -> Option<JsWord> {
        match &self.cur.token {
            Token::Word(word) => Some(word.clone()),
            _ => None,
        }
    }

    /// Consumes an explicit or automatically inserted semicolon.
    fn semicolon(&mut self) -> PResult<()> {
        if self.eat(";")? {
            return Ok(());
        }
        if self.is("}") || self.cur.token == Token::Eof || self.cur.had_line_break {
            return Ok(());
        }
        Err(self.expected("';'"))
    }

    /// Consumes a name usable as a binding or reference.
    fn parse_binding_identifier(&mut self) -> PResult<(JsWord, SourcePos)> {
        match self.cur_word() {
            Some(word) if is_reserved_word(&word) => {
                Err(self.error(SyntaxError::ReservedWord(word)))
            }
            Some(word) => {
                let pos = self.pos();
                self.bump()?;
                Ok((word, pos))
            }
            None => Err(self.expected("identifier")),
        }
    }

    /// Takes the JSDoc comment preceding the current token.
    fn take_jsdoc(&mut self) -> Option<Rc<str>> {
        self.cur.jsdoc.take()
    }

    // ---- errors ----

    fn error(&self, kind: SyntaxError) -> Error {
        self.error_at(kind, self.cur.line, self.cur.col)
    }

    fn error_at(&self, kind: SyntaxError, line: u32, col: u32) -> Error {
        Error {
            kind,
            source_name: self.source_name.clone(),
            line,
            col,
        }
    }

    fn expected(&self, expected: &'static str) -> Error {
        self.error(SyntaxError::Expected {
            expected,
            found: self.cur.token.to_string(),
        })
    }

    fn unexpected(&self) -> Error {
        self.error(SyntaxError::Unexpected(self.cur.token.to_string()))
    }

    // ---- nodes ----

    fn pos(&self) -> SourcePos {
        SourcePos {
            source_name: self.source_name.clone(),
            line: self.cur.line,
            col: self.cur.col,
        }
    }

    fn node(&mut self, token: T, pos: SourcePos) -> NodeId {
        let node = self.ast.new_node(token, pos);
        if self.is_externs {
            self.ast.set_flag(node, NodeFlags::FROM_EXTERNS);
        }
        node
    }

    fn string_node(&mut self, token: T, string: JsWord, pos: SourcePos) -> NodeId {
        let node = self.node(token, pos);
        self.ast.set_string(node, string);
        node
    }

    fn node_with_children(&mut self, token: T, pos: SourcePos, children: &[NodeId]) -> NodeId {
        let node = self.node(token, pos);
        for &child in children {
            self.ast.append_child(node, child);
        }
        node
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.ast.append_child(parent, child);
    }

    fn node_pos(&self, node: NodeId) -> SourcePos {
        self.ast[node].pos.clone()
    }

    /// Attaches a `/** ... */` comment to a declaration or expression.
    fn attach_jsdoc(&mut self, node: NodeId, text: Option<Rc<str>>) {
        if let Some(text) = text {
            self.ast.set_jsdoc(node, parse_jsdoc(&text));
        }
    }

    /// Attaches a comment written in front of a name, which may be either a
    /// bare type (`/** number */ x`) or a full JSDoc block.
    fn attach_inline_jsdoc(&mut self, node: NodeId, text: Option<Rc<str>>) {
        if let Some(text) = text {
            let info = if text.contains('@') {
                Some(parse_jsdoc(&text))
            } else {
                parse_inline_type(&text)
            };
            if let Some(info) = info {
                self.ast.set_jsdoc(node, info);
            }
        }
    }

    /// Wraps a statement in a `BLOCK` unless it already is one.
    fn wrap_in_block(&mut self, statement: NodeId) -> NodeId {
        if self.ast.is(statement, T::Block) {
            return statement;
        }
        let pos = self.node_pos(statement);
        self.node_with_children(T::Block, pos, &[statement])
    }
}
