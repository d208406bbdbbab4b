//! Parses the body of a `/** ... */` comment into a [JSDocInfo].
//!
//! Malformed annotations are dropped rather than reported: a tag whose type
//! cannot be parsed behaves as if its type were absent.

use ast::{FunctionTypeExpr, JSDocFlags, JSDocInfo, JsWord, TypeExpr};

pub fn parse_jsdoc(text: &str) -> JSDocInfo {
    let mut info = JSDocInfo::default();
    // Strip the leading `*` of every line.
    let body: String = text
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            trimmed.strip_prefix('*').unwrap_or(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n");

    for tag in split_tags(&body) {
        let (name, rest) = match tag.find(|c: char| c.is_whitespace() || c == '{') {
            Some(index) => (&tag[..index], tag[index..].trim_start()),
            None => (tag, ""),
        };
        match name {
            "type" => info.ty = parse_tag_type(rest).map(|(ty, _)| ty),
            "define" => {
                info.ty = parse_tag_type(rest).map(|(ty, _)| ty);
                info.flags.insert(JSDocFlags::CONSTANT);
            }
            "param" => {
                if let Some((ty, rest)) = parse_tag_type(rest) {
                    if let Some(param) = rest.split_whitespace().next() {
                        info.params.push((JsWord::from(param), ty));
                    }
                }
            }
            "return" | "returns" => info.return_type = parse_tag_type(rest).map(|(ty, _)| ty),
            "this" => info.this_type = parse_tag_type(rest).map(|(ty, _)| ty),
            "extends" | "inherits" => info.base_type = parse_tag_type(rest).map(|(ty, _)| ty),
            "implements" => {
                if let Some((ty, _)) = parse_tag_type(rest) {
                    info.implemented_interfaces.push(ty);
                }
            }
            "enum" => {
                info.flags.insert(JSDocFlags::ENUM);
                info.enum_parameter_type = Some(
                    parse_tag_type(rest)
                        .map(|(ty, _)| ty)
                        .unwrap_or_else(|| TypeExpr::named("number")),
                );
            }
            "typedef" => {
                info.flags.insert(JSDocFlags::TYPEDEF);
                info.typedef_type = parse_tag_type(rest).map(|(ty, _)| ty);
            }
            "template" => {
                for name in rest.split(|c: char| c == ',' || c.is_whitespace()) {
                    if !name.is_empty() {
                        info.template_type_names.push(JsWord::from(name));
                    }
                }
            }
            "lends" => {
                let target = rest
                    .trim_start_matches('{')
                    .split(|c: char| c == '}' || c.is_whitespace())
                    .next()
                    .unwrap_or("");
                if !target.is_empty() {
                    info.lends_name = Some(JsWord::from(target));
                }
            }
            "constructor" => info.flags.insert(JSDocFlags::CONSTRUCTOR),
            "interface" => info.flags.insert(JSDocFlags::INTERFACE),
            "const" | "constant" | "final" => info.flags.insert(JSDocFlags::CONSTANT),
            "noalias" => info.flags.insert(JSDocFlags::NO_ALIAS),
            "override" => info.flags.insert(JSDocFlags::OVERRIDE),
            "deprecated" => info.flags.insert(JSDocFlags::DEPRECATED),
            _ => {}
        }
    }
    info
}

/// Parses an inline annotation such as `var /** number */ x`.
pub fn parse_inline_type(text: &str) -> Option<JSDocInfo> {
    let trimmed = text.trim().trim_start_matches('*').trim();
    if trimmed.is_empty() || trimmed.contains('@') {
        return None;
    }
    let mut parser = TypeParser::new(trimmed);
    let ty = parser.parse_top_level()?;
    if !parser.at_end() {
        return None;
    }
    Some(JSDocInfo {
        ty: Some(ty),
        ..Default::default()
    })
}

/// Splits the comment into `@tag rest` chunks, dropping the description
/// before the first tag.
fn split_tags(body: &str) -> Vec<&str> {
    let mut tags = Vec::new();
    let mut start = None;
    let mut depth = 0i32;
    for (index, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            '@' if depth <= 0 => {
                let at_word_start = index == 0
                    || body[..index]
                        .chars()
                        .next_back()
                        .map_or(true, |p| p.is_whitespace());
                if at_word_start {
                    if let Some(s) = start {
                        tags.push(body[s..index].trim());
                    }
                    start = Some(index + 1);
                    depth = 0;
                }
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tags.push(body[s..].trim());
    }
    tags
}

/// Parses `{Type} rest` or a bare type word, returning the type and the text
/// after it.
fn parse_tag_type(text: &str) -> Option<(TypeExpr, &str)> {
    let text = text.trim_start();
    if let Some(inner) = text.strip_prefix('{') {
        let mut depth = 1;
        let mut end = None;
        for (index, c) in inner.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(index);
                        break;
                    }
                }
                _ => {}
            }
        }
        let end = end?;
        let mut parser = TypeParser::new(&inner[..end]);
        let ty = parser.parse_top_level()?;
        if !parser.at_end() {
            return None;
        }
        Some((ty, &inner[end + 1..]))
    } else {
        let word_end = text
            .find(char::is_whitespace)
            .unwrap_or_else(|| text.len());
        if word_end == 0 {
            return None;
        }
        let mut parser = TypeParser::new(&text[..word_end]);
        let ty = parser.parse_top_level()?;
        if !parser.at_end() {
            return None;
        }
        Some((ty, &text[word_end..]))
    }
}

/// Recursive-descent parser for type expressions.
struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_space(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn at_end(&mut self) -> bool {
        self.skip_space();
        self.pos >= self.src.len()
    }

    fn eat(&mut self, s: &str) -> bool {
        self.skip_space();
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.skip_space();
        self.rest().chars().next()
    }

    fn name(&mut self) -> Option<&'a str> {
        self.skip_space();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '.'))
            .unwrap_or_else(|| rest.len());
        // `Array.<T>` keeps the dot in front of the angle bracket.
        let len = if rest[..len].ends_with('.') && rest[len..].starts_with('<') {
            len - 1
        } else {
            len
        };
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Top-level types may omit the parentheses around a union.
    fn parse_top_level(&mut self) -> Option<TypeExpr> {
        let first = self.parse_type()?;
        if self.peek_char() != Some('|') {
            return Some(first);
        }
        let mut alternates = vec![first];
        while self.eat("|") {
            alternates.push(self.parse_type()?);
        }
        Some(TypeExpr::Union(alternates))
    }

    fn parse_type(&mut self) -> Option<TypeExpr> {
        if self.eat("...") {
            let inner = if matches!(self.peek_char(), None | Some(')') | Some(',') | Some(']')) {
                TypeExpr::Unknown
            } else {
                self.parse_type()?
            };
            return Some(TypeExpr::VarArgs(Box::new(inner)));
        }
        let ty = self.parse_prefixed()?;
        if self.eat("=") {
            return Some(TypeExpr::Optional(Box::new(ty)));
        }
        Some(ty)
    }

    fn parse_prefixed(&mut self) -> Option<TypeExpr> {
        if self.eat("?") {
            return match self.peek_char() {
                None | Some(')') | Some(',') | Some('|') | Some('>') | Some('}') | Some('=')
                | Some(']') => Some(TypeExpr::Unknown),
                _ => Some(TypeExpr::Nullable(Box::new(self.parse_prefixed()?))),
            };
        }
        if self.eat("!") {
            return Some(TypeExpr::NonNull(Box::new(self.parse_prefixed()?)));
        }
        let ty = self.parse_basic()?;
        // Postfix nullability.
        if self.eat("?") {
            return Some(TypeExpr::Nullable(Box::new(ty)));
        }
        if self.eat("!") {
            return Some(TypeExpr::NonNull(Box::new(ty)));
        }
        Some(ty)
    }

    fn parse_basic(&mut self) -> Option<TypeExpr> {
        if self.eat("*") {
            return Some(TypeExpr::All);
        }
        if self.eat("(") {
            let mut alternates = vec![self.parse_type()?];
            while self.eat("|") {
                alternates.push(self.parse_type()?);
            }
            if !self.eat(")") {
                return None;
            }
            return Some(if alternates.len() == 1 {
                alternates.pop()?
            } else {
                TypeExpr::Union(alternates)
            });
        }
        if self.eat("{") {
            return self.parse_record();
        }
        let name = self.name()?;
        match name {
            "function" => self.parse_function(),
            "undefined" | "void" => Some(TypeExpr::Void),
            _ => {
                let mut args = Vec::new();
                if self.eat(".<") || self.eat("<") {
                    loop {
                        args.push(self.parse_top_level()?);
                        if !self.eat(",") {
                            break;
                        }
                    }
                    if !self.eat(">") {
                        return None;
                    }
                }
                Some(TypeExpr::Named {
                    name: JsWord::from(name),
                    args,
                })
            }
        }
    }

    fn parse_record(&mut self) -> Option<TypeExpr> {
        let mut fields = Vec::new();
        if self.eat("}") {
            return Some(TypeExpr::Record(fields));
        }
        loop {
            let key = self.name()?;
            let ty = if self.eat(":") {
                self.parse_top_level()?
            } else {
                TypeExpr::Unknown
            };
            fields.push((JsWord::from(key), ty));
            if self.eat("}") {
                return Some(TypeExpr::Record(fields));
            }
            if !self.eat(",") {
                return None;
            }
        }
    }

    fn parse_function(&mut self) -> Option<TypeExpr> {
        if !self.eat("(") {
            return None;
        }
        let mut function = FunctionTypeExpr {
            params: Vec::new(),
            return_type: None,
            this_type: None,
            new_type: None,
        };
        if !self.eat(")") {
            loop {
                if self.eat("this:") {
                    function.this_type = Some(Box::new(self.parse_type()?));
                } else if self.eat("new:") {
                    function.new_type = Some(Box::new(self.parse_type()?));
                } else {
                    function.params.push(self.parse_type()?);
                }
                if self.eat(")") {
                    break;
                }
                if !self.eat(",") {
                    return None;
                }
            }
        }
        if self.eat(":") {
            function.return_type = Some(Box::new(self.parse_type()?));
        }
        Some(TypeExpr::Function(function))
    }
}
