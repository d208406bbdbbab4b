use super::Parser;
use crate::error::PResult;
use ast::{JsWord, NodeId, SourcePos, Token as T};

impl Parser<'_> {
    /// Parses `function name(params) { body }`. Declarations must be named.
    pub(super) fn parse_function(&mut self, is_declaration: bool) -> PResult<NodeId> {
        let pos = self.pos();
        self.bump()?;
        let (name, name_pos) = if is_declaration || !self.is("(") {
            self.parse_binding_identifier()?
        } else {
            (JsWord::from(""), self.pos())
        };
        self.parse_function_rest(pos, name, name_pos)
    }

    /// Parses the parameter list and body of a function whose name, possibly
    /// empty, has already been read.
    pub(super) fn parse_function_rest(
        &mut self,
        pos: SourcePos,
        name: JsWord,
        name_pos: SourcePos,
    ) -> PResult<NodeId> {
        let name = self.string_node(T::Name, name, name_pos);

        let params_pos = self.pos();
        self.expect("(")?;
        let params = self.node(T::ParamList, params_pos);
        if !self.eat(")")? {
            loop {
                let jsdoc = self.take_jsdoc();
                let (param, param_pos) = self.parse_binding_identifier()?;
                let param = self.string_node(T::Name, param, param_pos);
                self.attach_inline_jsdoc(param, jsdoc);
                self.append(params, param);
                if self.eat(")")? {
                    break;
                }
                self.expect(",")?;
            }
        }

        self.function_depth += 1;
        let body = self.with_in_allowed(|p| p.parse_block());
        self.function_depth -= 1;
        let body = body?;

        Ok(self.node_with_children(T::Function, pos, &[name, params, body]))
    }
}
