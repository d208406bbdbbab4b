use super::Parser;
use crate::{
    error::{PResult, SyntaxError},
    token::Token,
};
use ast::{NodeId, Token as T};

impl Parser<'_> {
    pub(super) fn parse_statement(&mut self) -> PResult<NodeId> {
        let jsdoc = self.take_jsdoc();
        let pos = self.pos();
        if self.is("{") {
            return self.parse_block();
        }
        if self.is(";") {
            self.bump()?;
            return Ok(self.node(T::Empty, pos));
        }

        match self.cur_word().as_deref() {
            Some("var") => {
                let var = self.parse_var()?;
                self.semicolon()?;
                self.attach_jsdoc(var, jsdoc);
                Ok(var)
            }
            Some("function") => {
                let function = self.parse_function(true)?;
                self.attach_jsdoc(function, jsdoc);
                Ok(function)
            }
            Some("if") => self.parse_if(),
            Some("while") => {
                self.bump()?;
                let condition = self.parse_paren_expression()?;
                let body = self.parse_loop_body()?;
                Ok(self.node_with_children(T::While, pos, &[condition, body]))
            }
            Some("do") => {
                self.bump()?;
                let body = self.parse_loop_body()?;
                if !self.is_word("while") {
                    return Err(self.expected("'while'"));
                }
                self.bump()?;
                let condition = self.parse_paren_expression()?;
                // The semicolon after a do-while is always optional.
                self.eat(";")?;
                Ok(self.node_with_children(T::Do, pos, &[body, condition]))
            }
            Some("for") => self.parse_for(),
            Some("switch") => self.parse_switch(),
            Some("try") => self.parse_try(),
            Some("return") => {
                if self.function_depth == 0 {
                    return Err(self.error(SyntaxError::ReturnOutsideFunction("return")));
                }
                self.bump()?;
                let ret = self.node(T::Return, pos);
                if !self.at_statement_end() {
                    let value = self.parse_expression()?;
                    self.append(ret, value);
                }
                self.semicolon()?;
                Ok(ret)
            }
            Some("throw") => {
                self.bump()?;
                if self.cur.had_line_break {
                    return Err(self.unexpected());
                }
                let value = self.parse_expression()?;
                self.semicolon()?;
                Ok(self.node_with_children(T::Throw, pos, &[value]))
            }
            Some("break") => self.parse_jump(T::Break),
            Some("continue") => self.parse_jump(T::Continue),
            Some("debugger") => {
                self.bump()?;
                self.semicolon()?;
                Ok(self.node(T::Debugger, pos))
            }
            _ => {
                let expr = self.parse_expression()?;
                if self.ast.is(expr, T::Name) && self.is(":") {
                    self.bump()?;
                    let label = self.ast.string(expr).clone();
                    let statement = self.parse_statement()?;
                    let node = self.string_node(T::Label, label, pos);
                    self.append(node, statement);
                    return Ok(node);
                }
                self.semicolon()?;
                self.attach_jsdoc(expr, jsdoc);
                Ok(self.node_with_children(T::ExprResult, pos, &[expr]))
            }
        }
    }

    fn at_statement_end(&self) -> bool {
        self.is(";") || self.is("}") || self.cur.token == Token::Eof || self.cur.had_line_break
    }

    pub(super) fn parse_block(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.expect("{")?;
        let block = self.node(T::Block, pos);
        while !self.is("}") {
            if self.cur.token == Token::Eof {
                return Err(self.expected("'}'"));
            }
            let statement = self.parse_statement()?;
            self.append(block, statement);
        }
        self.bump()?;
        Ok(block)
    }

    /// Parses `var a = 1, b`, leaving the terminating token in place.
    fn parse_var(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.bump()?;
        let var = self.node(T::Var, pos);
        loop {
            let jsdoc = self.take_jsdoc();
            let (name, name_pos) = self.parse_binding_identifier()?;
            let name = self.string_node(T::Name, name, name_pos);
            self.attach_inline_jsdoc(name, jsdoc);
            if self.eat("=")? {
                let value = self.parse_assignment()?;
                self.append(name, value);
            }
            self.append(var, name);
            if !self.eat(",")? {
                break;
            }
        }
        Ok(var)
    }

    fn parse_paren_expression(&mut self) -> PResult<NodeId> {
        self.expect("(")?;
        let expr = self.with_in_allowed(|p| p.parse_expression())?;
        self.expect(")")?;
        Ok(expr)
    }

    fn parse_loop_body(&mut self) -> PResult<NodeId> {
        let body = self.parse_statement()?;
        Ok(self.wrap_in_block(body))
    }

    fn parse_if(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.bump()?;
        let condition = self.parse_paren_expression()?;
        let then_branch = self.parse_loop_body()?;
        let node = self.node_with_children(T::If, pos, &[condition, then_branch]);
        if self.is_word("else") {
            self.bump()?;
            let else_branch = self.parse_loop_body()?;
            self.append(node, else_branch);
        }
        Ok(node)
    }

    fn parse_for(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.bump()?;
        self.expect("(")?;

        let init = if self.is(";") {
            let pos = self.pos();
            self.node(T::Empty, pos)
        } else {
            let saved = std::mem::replace(&mut self.no_in, true);
            let init = if self.is_word("var") {
                self.parse_var()
            } else {
                self.parse_expression()
            };
            self.no_in = saved;
            init?
        };

        if self.is_word("in") {
            let valid_target = match self.ast.token(init) {
                T::Var => {
                    self.ast.child_count(init) == 1
                        && self
                            .ast
                            .first_child(init)
                            .map_or(false, |name| !self.ast.has_children(name))
                }
                T::Name | T::GetProp | T::GetElem => true,
                _ => false,
            };
            if !valid_target {
                return Err(self.error(SyntaxError::InvalidForInTarget));
            }
            self.bump()?;
            let object = self.with_in_allowed(|p| p.parse_expression())?;
            self.expect(")")?;
            let body = self.parse_loop_body()?;
            return Ok(self.node_with_children(T::ForIn, pos, &[init, object, body]));
        }

        self.expect(";")?;
        let condition = self.parse_optional_clause(";")?;
        self.expect(";")?;
        let increment = self.parse_optional_clause(")")?;
        self.expect(")")?;
        let body = self.parse_loop_body()?;
        Ok(self.node_with_children(T::For, pos, &[init, condition, increment, body]))
    }

    /// An optional `for(;;)` clause, `EMPTY` when absent.
    fn parse_optional_clause(&mut self, terminator: &str) -> PResult<NodeId> {
        if self.is(terminator) {
            let pos = self.pos();
            Ok(self.node(T::Empty, pos))
        } else {
            self.with_in_allowed(|p| p.parse_expression())
        }
    }

    fn parse_switch(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.bump()?;
        let discriminant = self.parse_paren_expression()?;
        let switch = self.node_with_children(T::Switch, pos, &[discriminant]);
        self.expect("{")?;
        let mut seen_default = false;
        while !self.eat("}")? {
            let case_pos = self.pos();
            let case = if self.is_word("case") {
                self.bump()?;
                let test = self.with_in_allowed(|p| p.parse_expression())?;
                self.node_with_children(T::Case, case_pos, &[test])
            } else if self.is_word("default") && !seen_default {
                seen_default = true;
                self.bump()?;
                self.node(T::DefaultCase, case_pos)
            } else {
                return Err(self.expected("'case', 'default' or '}'"));
            };
            self.expect(":")?;
            let body_pos = self.pos();
            let body = self.node(T::Block, body_pos);
            while !(self.is_word("case") || self.is_word("default") || self.is("}")) {
                if self.cur.token == Token::Eof {
                    return Err(self.expected("'}'"));
                }
                let statement = self.parse_statement()?;
                self.append(body, statement);
            }
            self.append(case, body);
            self.append(switch, case);
        }
        Ok(switch)
    }

    fn parse_try(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.bump()?;
        let body = self.parse_block()?;
        let catch_pos = self.pos();
        let catch_block = self.node(T::Block, catch_pos.clone());
        let try_node = self.node_with_children(T::Try, pos, &[body, catch_block]);

        let mut has_handler = false;
        if self.is_word("catch") {
            has_handler = true;
            self.bump()?;
            self.expect("(")?;
            let (name, name_pos) = self.parse_binding_identifier()?;
            let name = self.string_node(T::Name, name, name_pos);
            self.expect(")")?;
            let handler = self.parse_block()?;
            let catch = self.node_with_children(T::Catch, catch_pos, &[name, handler]);
            self.append(catch_block, catch);
        }
        if self.is_word("finally") {
            has_handler = true;
            self.bump()?;
            let finally = self.parse_block()?;
            self.append(try_node, finally);
        }
        if !has_handler {
            return Err(self.expected("'catch' or 'finally'"));
        }
        Ok(try_node)
    }

    fn parse_jump(&mut self, token: T) -> PResult<NodeId> {
        let pos = self.pos();
        self.bump()?;
        let node = self.node(token, pos);
        if !self.cur.had_line_break {
            if let Some(label) = self.cur_word() {
                if !crate::token::is_keyword(&label) {
                    self.bump()?;
                    self.ast.set_string(node, label);
                }
            }
        }
        self.semicolon()?;
        Ok(node)
    }
}
