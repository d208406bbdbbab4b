use super::Parser;
use crate::{
    error::{PResult, SyntaxError},
    token::{is_keyword, is_reserved_word, Token},
};
use ast::{JsWord, NodeFlags, NodeId, Token as T};

impl Parser<'_> {
    /// Runs `f` with `in` treated as an operator again.
    pub(super) fn with_in_allowed<F, R>(&mut self, f: F) -> PResult<R>
    where
        F: FnOnce(&mut Self) -> PResult<R>,
    {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    /// Parses a comma-separated expression.
    pub(super) fn parse_expression(&mut self) -> PResult<NodeId> {
        let mut expr = self.parse_assignment()?;
        while self.is(",") {
            self.bump()?;
            let right = self.parse_assignment()?;
            let pos = self.node_pos(expr);
            expr = self.node_with_children(T::Comma, pos, &[expr, right]);
        }
        Ok(expr)
    }

    pub(super) fn parse_assignment(&mut self) -> PResult<NodeId> {
        let left = self.parse_conditional()?;
        let op = match &self.cur.token {
            Token::Punct(p) => assign_op(p),
            _ => None,
        };
        let op = match op {
            Some(op) => op,
            None => return Ok(left),
        };
        if !matches!(self.ast.token(left), T::Name | T::GetProp | T::GetElem) {
            return Err(self.error(SyntaxError::InvalidAssignTarget));
        }
        self.bump()?;
        let right = self.parse_assignment()?;
        let pos = self.node_pos(left);
        Ok(self.node_with_children(op, pos, &[left, right]))
    }

    fn parse_conditional(&mut self) -> PResult<NodeId> {
        let test = self.parse_binary(1)?;
        if !self.is("?") {
            return Ok(test);
        }
        self.bump()?;
        let consequent = self.with_in_allowed(|p| p.parse_assignment())?;
        self.expect(":")?;
        let alternate = self.parse_assignment()?;
        let pos = self.node_pos(test);
        Ok(self.node_with_children(T::Hook, pos, &[test, consequent, alternate]))
    }

    /// Precedence climbing over the binary operators.
    fn parse_binary(&mut self, min_precedence: u8) -> PResult<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let (op, precedence) = match self.binary_op() {
                Some((op, precedence)) if precedence >= min_precedence => (op, precedence),
                _ => break,
            };
            self.bump()?;
            let right = self.parse_binary(precedence + 1)?;
            let pos = self.node_pos(left);
            left = self.node_with_children(op, pos, &[left, right]);
        }
        Ok(left)
    }

    fn binary_op(&self) -> Option<(T, u8)> {
        match &self.cur.token {
            Token::Punct(p) => binary_op(p),
            Token::Word(w) if &**w == "instanceof" => Some((T::InstanceOf, 7)),
            Token::Word(w) if &**w == "in" && !self.no_in => Some((T::In, 7)),
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        let op = match &self.cur.token {
            Token::Punct("!") => Some(T::Not),
            Token::Punct("~") => Some(T::BitNot),
            Token::Punct("+") => Some(T::Pos),
            Token::Punct("-") => Some(T::Neg),
            Token::Punct("++") => Some(T::Inc),
            Token::Punct("--") => Some(T::Dec),
            Token::Word(w) => match &**w {
                "typeof" => Some(T::TypeOf),
                "void" => Some(T::Void),
                "delete" => Some(T::DelProp),
                _ => None,
            },
            _ => None,
        };
        let op = match op {
            Some(op) => op,
            None => return self.parse_postfix(),
        };
        self.bump()?;
        let operand = self.parse_unary()?;
        if matches!(op, T::Inc | T::Dec) && !is_simple_assign_target(self.ast.token(operand)) {
            return Err(self.error_at(SyntaxError::InvalidAssignTarget, pos.line, pos.col));
        }
        Ok(self.node_with_children(op, pos, &[operand]))
    }

    fn parse_postfix(&mut self) -> PResult<NodeId> {
        let operand = self.parse_lhs()?;
        let op = match &self.cur.token {
            Token::Punct("++") if !self.cur.had_line_break => T::Inc,
            Token::Punct("--") if !self.cur.had_line_break => T::Dec,
            _ => return Ok(operand),
        };
        if !is_simple_assign_target(self.ast.token(operand)) {
            return Err(self.error(SyntaxError::InvalidAssignTarget));
        }
        self.bump()?;
        let pos = self.node_pos(operand);
        let node = self.node_with_children(op, pos, &[operand]);
        self.ast.set_flag(node, NodeFlags::POSTFIX);
        Ok(node)
    }

    /// Member accesses, calls and `new`.
    fn parse_lhs(&mut self) -> PResult<NodeId> {
        let mut expr = if self.is_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            if self.is("(") {
                let args = self.parse_arguments()?;
                let pos = self.node_pos(expr);
                let call = self.node_with_children(T::Call, pos, &[expr]);
                for arg in args {
                    self.append(call, arg);
                }
                expr = call;
            } else if let Some(member) = self.parse_member_suffix(expr)? {
                expr = member;
            } else {
                return Ok(expr);
            }
        }
    }

    /// `new Callee(args)`, where the arguments are optional.
    fn parse_new(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.bump()?;
        let mut callee = if self.is_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        while let Some(member) = self.parse_member_suffix(callee)? {
            callee = member;
        }
        let new = self.node_with_children(T::New, pos, &[callee]);
        if self.is("(") {
            for arg in self.parse_arguments()? {
                self.append(new, arg);
            }
        }
        Ok(new)
    }

    /// `.name` or `[index]` following `object`.
    fn parse_member_suffix(&mut self, object: NodeId) -> PResult<Option<NodeId>> {
        let pos = self.node_pos(object);
        if self.eat(".")? {
            let name = match self.cur_word() {
                Some(name) => name,
                None => return Err(self.expected("property name")),
            };
            self.bump()?;
            let node = self.string_node(T::GetProp, name, pos);
            self.append(node, object);
            Ok(Some(node))
        } else if self.eat("[")? {
            let index = self.with_in_allowed(|p| p.parse_expression())?;
            self.expect("]")?;
            Ok(Some(self.node_with_children(
                T::GetElem,
                pos,
                &[object, index],
            )))
        } else {
            Ok(None)
        }
    }

    fn parse_arguments(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut args = Vec::new();
        if self.eat(")")? {
            return Ok(args);
        }
        loop {
            args.push(self.with_in_allowed(|p| p.parse_assignment())?);
            if self.eat(")")? {
                return Ok(args);
            }
            self.expect(",")?;
        }
    }

    fn parse_primary(&mut self) -> PResult<NodeId> {
        let jsdoc = self.take_jsdoc();
        let pos = self.pos();
        match self.cur.token.clone() {
            Token::Word(word) => match &*word {
                "this" => {
                    self.bump()?;
                    Ok(self.node(T::This, pos))
                }
                "null" => {
                    self.bump()?;
                    Ok(self.node(T::Null, pos))
                }
                "true" => {
                    self.bump()?;
                    Ok(self.node(T::True, pos))
                }
                "false" => {
                    self.bump()?;
                    Ok(self.node(T::False, pos))
                }
                "function" => {
                    let function = self.parse_function(false)?;
                    self.attach_jsdoc(function, jsdoc);
                    Ok(function)
                }
                _ if is_keyword(&word) => Err(self.unexpected()),
                _ if is_reserved_word(&word) => Err(self.error(SyntaxError::ReservedWord(word))),
                _ => {
                    self.bump()?;
                    Ok(self.string_node(T::Name, word, pos))
                }
            },
            Token::Num(value) => {
                self.bump()?;
                let node = self.ast.new_number_node(value, pos);
                if self.is_externs {
                    self.ast.set_flag(node, NodeFlags::FROM_EXTERNS);
                }
                Ok(node)
            }
            Token::Str(value) => {
                self.bump()?;
                Ok(self.string_node(T::String, value, pos))
            }
            Token::Regex(value) => {
                self.bump()?;
                Ok(self.string_node(T::Regexp, value, pos))
            }
            Token::Punct("(") => {
                self.bump()?;
                let expr = self.with_in_allowed(|p| p.parse_expression())?;
                self.expect(")")?;
                // A JSDoc comment in front of parentheses is a cast.
                self.attach_jsdoc(expr, jsdoc);
                Ok(expr)
            }
            Token::Punct("[") => self.parse_array_literal(),
            Token::Punct("{") => {
                let literal = self.parse_object_literal()?;
                self.attach_jsdoc(literal, jsdoc);
                Ok(literal)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_array_literal(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.expect("[")?;
        let array = self.node(T::ArrayLit, pos);
        loop {
            if self.eat("]")? {
                return Ok(array);
            }
            if self.is(",") {
                // Elisions are holes.
                let hole_pos = self.pos();
                let hole = self.node(T::Empty, hole_pos);
                self.append(array, hole);
                self.bump()?;
                continue;
            }
            let element = self.with_in_allowed(|p| p.parse_assignment())?;
            self.append(array, element);
            if !self.is("]") {
                self.expect(",")?;
            }
        }
    }

    fn parse_object_literal(&mut self) -> PResult<NodeId> {
        let pos = self.pos();
        self.expect("{")?;
        let literal = self.node(T::ObjectLit, pos);
        loop {
            if self.eat("}")? {
                return Ok(literal);
            }
            let jsdoc = self.take_jsdoc();
            let key_pos = self.pos();
            let (mut name, mut flags) = self.parse_property_name()?;

            let accessor = match &*name {
                "get" if flags.is_empty() && !self.is(":") => Some(T::GetterDef),
                "set" if flags.is_empty() && !self.is(":") => Some(T::SetterDef),
                _ => None,
            };
            let key = match accessor {
                Some(token) => {
                    let (accessor_name, accessor_flags) = self.parse_property_name()?;
                    name = accessor_name;
                    flags = accessor_flags;
                    let function_pos = self.pos();
                    let empty = JsWord::from("");
                    let function = self.parse_function_rest(function_pos, empty, key_pos.clone())?;
                    self.attach_jsdoc(function, jsdoc.clone());
                    let key = self.string_node(token, name, key_pos);
                    self.append(key, function);
                    key
                }
                None => {
                    self.expect(":")?;
                    let value = self.with_in_allowed(|p| p.parse_assignment())?;
                    let key = self.string_node(T::StringKey, name, key_pos);
                    self.append(key, value);
                    key
                }
            };
            if !flags.is_empty() {
                self.ast.set_flag(key, flags);
            }
            self.attach_inline_jsdoc(key, jsdoc);
            self.append(literal, key);

            if !self.is("}") {
                self.expect(",")?;
            }
        }
    }

    /// An object literal key: an identifier, string or number.
    fn parse_property_name(&mut self) -> PResult<(JsWord, NodeFlags)> {
        let key = match self.cur.token.clone() {
            Token::Word(word) => (word, NodeFlags::empty()),
            Token::Str(value) => (value, NodeFlags::QUOTED),
            Token::Num(value) => (JsWord::from(number_to_string(value)), NodeFlags::NUMERIC_KEY),
            _ => return Err(self.expected("property name")),
        };
        self.bump()?;
        Ok(key)
    }
}

fn is_simple_assign_target(token: T) -> bool {
    matches!(token, T::Name | T::GetProp | T::GetElem)
}

fn assign_op(punct: &str) -> Option<T> {
    Some(match punct {
        "=" => T::Assign,
        "|=" => T::AssignBitOr,
        "^=" => T::AssignBitXor,
        "&=" => T::AssignBitAnd,
        "<<=" => T::AssignLsh,
        ">>=" => T::AssignRsh,
        ">>>=" => T::AssignUrsh,
        "+=" => T::AssignAdd,
        "-=" => T::AssignSub,
        "*=" => T::AssignMul,
        "/=" => T::AssignDiv,
        "%=" => T::AssignMod,
        _ => return None,
    })
}

fn binary_op(punct: &str) -> Option<(T, u8)> {
    Some(match punct {
        "||" => (T::Or, 1),
        "&&" => (T::And, 2),
        "|" => (T::BitOr, 3),
        "^" => (T::BitXor, 4),
        "&" => (T::BitAnd, 5),
        "==" => (T::Eq, 6),
        "!=" => (T::Ne, 6),
        "===" => (T::ShEq, 6),
        "!==" => (T::ShNe, 6),
        "<" => (T::Lt, 7),
        "<=" => (T::Le, 7),
        ">" => (T::Gt, 7),
        ">=" => (T::Ge, 7),
        "<<" => (T::Lsh, 8),
        ">>" => (T::Rsh, 8),
        ">>>" => (T::Ursh, 8),
        "+" => (T::Add, 9),
        "-" => (T::Sub, 9),
        "*" => (T::Mul, 10),
        "/" => (T::Div, 10),
        "%" => (T::Mod, 10),
        _ => return None,
    })
}

/// Renders a numeric property key the way JavaScript converts it to a string.
fn number_to_string(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
