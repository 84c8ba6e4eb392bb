use crate::lexer::{Lexer, Token};
use xkbrev_core::XkbError;
use super::ast::*;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Option<Token>,
    peek: Option<Token>,
}

impl<'a> Parser<'a> {
    /// `file` is only used to label errors
    pub fn new(input: &'a str, file: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input, file),
            current: None,
            peek: None,
        }
    }

    pub fn parse(&mut self) -> Result<XkbFile, XkbError> {
        // Prime the first token; lexer errors surface here
        self.advance()?;

        let mut file = XkbFile {
            name: self.lexer.file.to_string(),
            sections: Vec::new(),
        };

        while let Some(token) = &self.current {
            if *token == Token::Semicolon {
                self.advance()?;
                continue;
            }
            if let Some(section) = self.parse_section()? {
                file.sections.push(section);
            }
        }

        Ok(file)
    }

    fn error(&self, message: impl Into<String>) -> XkbError {
        XkbError::parse(self.lexer.file, self.lexer.current_line(), message)
    }

    fn advance(&mut self) -> Result<(), XkbError> {
        self.current = self.lexer.next_token()?;
        self.peek = self.lexer.peek();
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<(), XkbError> {
        if self.current.as_ref() != Some(&expected) {
            return Err(self.error(format!(
                "Expected {:?}, found {:?}",
                expected, self.current
            )));
        }
        self.advance()
    }

    /// Consume `token` if it is next
    fn eat(&mut self, token: &Token) -> Result<bool, XkbError> {
        if self.current.as_ref() == Some(token) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_identifier(&mut self) -> Result<String, XkbError> {
        match self.current.take() {
            Some(Token::Identifier(name)) => {
                self.advance()?;
                Ok(name)
            }
            other => {
                self.current = other;
                Err(self.error(format!("Expected identifier, found {:?}", self.current)))
            }
        }
    }

    fn expect_key_name(&mut self) -> Result<String, XkbError> {
        match self.current.take() {
            Some(Token::KeyName(name)) => {
                self.advance()?;
                Ok(name)
            }
            other => {
                self.current = other;
                Err(self.error(format!("Expected key name, found {:?}", self.current)))
            }
        }
    }

    fn parse_section(&mut self) -> Result<Option<Section>, XkbError> {
        let mut flags = Vec::new();
        let keyword = loop {
            match &self.current {
                Some(Token::Identifier(word)) if word.to_ascii_lowercase().starts_with("xkb_") => {
                    break word.clone();
                }
                Some(Token::Identifier(word)) => {
                    flags.push(word.clone());
                    self.advance()?;
                }
                other => {
                    return Err(self.error(format!("Expected section keyword, found {:?}", other)));
                }
            }
        };

        let line = self.lexer.current_line();
        self.advance()?;

        let name = match &self.current {
            Some(Token::String(name)) => {
                let name = name.clone();
                self.advance()?;
                name
            }
            _ => String::new(),
        };

        let kind = match SectionKind::from_keyword(&keyword) {
            Some(kind) => kind,
            None => {
                // xkb_keymap and friends wrap other sections; not needed here
                log::debug!("{}: skipping {} \"{}\"", self.lexer.file, keyword, name);
                self.skip_block()?;
                self.eat(&Token::Semicolon)?;
                return Ok(None);
            }
        };

        self.expect(Token::LBrace)?;
        let mut statements = Vec::new();
        loop {
            match &self.current {
                Some(Token::RBrace) => break,
                None => return Err(self.error(format!("Unterminated section \"{}\"", name))),
                _ => {
                    if let Some(statement) = self.parse_statement()? {
                        statements.push(statement);
                    }
                }
            }
        }
        self.expect(Token::RBrace)?;
        self.eat(&Token::Semicolon)?;

        Ok(Some(Section {
            kind,
            name,
            flags,
            statements,
            line,
        }))
    }

    fn parse_statement(&mut self) -> Result<Option<Statement>, XkbError> {
        let line = self.lexer.current_line();

        let mut merge = MergeMode::Default;
        if let Some(token) = &self.current {
            if token.is_merge_mode() {
                let is_include = *token == Token::Include;
                merge = match token {
                    Token::Augment => MergeMode::Augment,
                    Token::Override => MergeMode::Override,
                    Token::Replace => MergeMode::Replace,
                    _ => MergeMode::Default,
                };
                self.advance()?;

                if let Some(Token::String(target)) = &self.current {
                    let target = target.clone();
                    self.advance()?;
                    self.eat(&Token::Semicolon)?;
                    return Ok(Some(Statement {
                        merge,
                        line,
                        kind: StatementKind::Include(target),
                    }));
                }
                if is_include {
                    return Err(self.error("Expected string after 'include'"));
                }
            }
        }

        let kind = match &self.current {
            Some(Token::Semicolon) => {
                self.advance()?;
                return Ok(None);
            }
            Some(Token::KeyName(_)) => self.parse_keycode()?,
            Some(Token::Identifier(word)) => {
                let word = word.to_ascii_lowercase();
                match word.as_str() {
                    "key" if matches!(self.peek, Some(Token::KeyName(_))) => self.parse_key()?,
                    "type" if matches!(self.peek, Some(Token::String(_))) => self.parse_type()?,
                    "alias" => self.parse_alias()?,
                    "modifier_map" | "modmap" | "mod_map" => self.parse_modifier_map()?,
                    "virtual_modifiers" => self.parse_virtual_modifiers()?,
                    "indicator" | "interpret" | "virtual" | "group" | "shape" | "section"
                    | "doodad" | "solid" | "outline" | "text" | "logo" | "overlay" | "row" => {
                        self.skip_statement()?;
                        StatementKind::Skipped(word)
                    }
                    _ => StatementKind::Var(self.parse_var_statement()?),
                }
            }
            Some(Token::Exclam) => StatementKind::Var(self.parse_var_statement()?),
            other => return Err(self.error(format!("Unexpected {:?}", other))),
        };

        Ok(Some(Statement { merge, line, kind }))
    }

    // <AE01> = 10;
    fn parse_keycode(&mut self) -> Result<StatementKind, XkbError> {
        let name = self.expect_key_name()?;
        self.expect(Token::Equals)?;
        let code = match &self.current {
            Some(Token::Integer(Some(code))) => *code,
            other => {
                return Err(self.error(format!("Expected keycode for <{}>, found {:?}", name, other)))
            }
        };
        self.advance()?;
        self.expect(Token::Semicolon)?;
        Ok(StatementKind::Keycode { name, code })
    }

    fn parse_key(&mut self) -> Result<StatementKind, XkbError> {
        self.advance()?; // key
        let name = self.expect_key_name()?;
        self.expect(Token::LBrace)?;

        let mut fields = Vec::new();
        while self.current != Some(Token::RBrace) {
            if self.current == Some(Token::LBracket) {
                let symbols = self.parse_list(Token::LBracket, Token::RBracket)?;
                fields.push(KeyField::Symbols(symbols));
            } else {
                fields.push(KeyField::Var(self.parse_var_def()?));
            }

            if !self.eat(&Token::Comma)? && self.current != Some(Token::RBrace) {
                return Err(self.error(format!(
                    "Expected ',' or '}}' in key <{}>, found {:?}",
                    name, self.current
                )));
            }
        }

        self.expect(Token::RBrace)?;
        self.expect(Token::Semicolon)?;
        Ok(StatementKind::Key { name, fields })
    }

    fn parse_type(&mut self) -> Result<StatementKind, XkbError> {
        self.advance()?; // type
        let name = match self.current.take() {
            Some(Token::String(name)) => name,
            other => {
                self.current = other;
                return Err(self.error("Expected type name"));
            }
        };
        self.advance()?;
        self.expect(Token::LBrace)?;

        let mut fields = Vec::new();
        while self.current != Some(Token::RBrace) {
            if self.eat(&Token::Semicolon)? {
                continue;
            }
            fields.push(self.parse_var_statement()?);
        }

        self.expect(Token::RBrace)?;
        self.expect(Token::Semicolon)?;
        Ok(StatementKind::Type { name, fields })
    }

    fn parse_alias(&mut self) -> Result<StatementKind, XkbError> {
        self.advance()?; // alias
        let alias = self.expect_key_name()?;
        self.expect(Token::Equals)?;
        let real = self.expect_key_name()?;
        self.expect(Token::Semicolon)?;
        Ok(StatementKind::Alias { alias, real })
    }

    fn parse_modifier_map(&mut self) -> Result<StatementKind, XkbError> {
        self.advance()?; // modifier_map
        let modifier = self.expect_identifier()?;
        let keys = self.parse_list(Token::LBrace, Token::RBrace)?;
        self.expect(Token::Semicolon)?;
        Ok(StatementKind::ModifierMap { modifier, keys })
    }

    fn parse_virtual_modifiers(&mut self) -> Result<StatementKind, XkbError> {
        self.advance()?; // virtual_modifiers
        let mut names = Vec::new();
        loop {
            names.push(self.expect_identifier()?);
            // Alt = Mod1 binds a real modifier; only the name matters here
            if self.eat(&Token::Equals)? {
                self.parse_expr()?;
            }
            if !self.eat(&Token::Comma)? {
                break;
            }
        }
        self.expect(Token::Semicolon)?;
        Ok(StatementKind::VirtualModifiers(names))
    }

    fn parse_var_statement(&mut self) -> Result<VarDef, XkbError> {
        let var = self.parse_var_def()?;
        self.expect(Token::Semicolon)?;
        Ok(var)
    }

    /// `lhs = value`, or a bare `lhs` / `!lhs` for boolean flags
    fn parse_var_def(&mut self) -> Result<VarDef, XkbError> {
        if self.eat(&Token::Exclam)? {
            let lhs = self.parse_lvalue()?;
            return Ok(VarDef {
                lhs,
                value: Expr::Ident("false".to_string()),
            });
        }

        let lhs = self.parse_lvalue()?;
        let value = if self.eat(&Token::Equals)? {
            self.parse_expr()?
        } else {
            Expr::Ident("true".to_string())
        };
        Ok(VarDef { lhs, value })
    }

    fn parse_lvalue(&mut self) -> Result<LValue, XkbError> {
        let first = self.expect_identifier()?;
        self.parse_lvalue_tail(first)
    }

    fn parse_lvalue_tail(&mut self, first: String) -> Result<LValue, XkbError> {
        let (element, field) = if self.eat(&Token::Dot)? {
            (Some(first), self.expect_identifier()?)
        } else {
            (None, first)
        };

        let index = if self.eat(&Token::LBracket)? {
            let index = self.parse_expr()?;
            self.expect(Token::RBracket)?;
            Some(Box::new(index))
        } else {
            None
        };

        Ok(LValue {
            element,
            field,
            index,
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, XkbError> {
        let mut left = self.parse_unary()?;
        loop {
            match self.current {
                Some(Token::Plus) => {
                    self.advance()?;
                    let right = self.parse_unary()?;
                    left = Expr::Sum(Box::new(left), Box::new(right));
                }
                Some(Token::Minus) => {
                    self.advance()?;
                    let right = self.parse_unary()?;
                    left = Expr::Sum(Box::new(left), Box::new(Expr::Unary('-', Box::new(right))));
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, XkbError> {
        let op = match self.current {
            Some(Token::Minus) => '-',
            Some(Token::Exclam) => '!',
            Some(Token::Invert) => '~',
            Some(Token::Plus) => {
                self.advance()?;
                return self.parse_primary();
            }
            _ => return self.parse_primary(),
        };
        self.advance()?;
        Ok(Expr::Unary(op, Box::new(self.parse_unary()?)))
    }

    fn parse_primary(&mut self) -> Result<Expr, XkbError> {
        let token = match self.current.take() {
            Some(token) => token,
            None => return Err(self.error("Unexpected end of file in expression")),
        };

        match token {
            Token::Integer(Some(n)) => {
                self.advance()?;
                Ok(Expr::Integer(n))
            }
            Token::Integer(None) => Err(self.error("Number out of range")),
            Token::Float(text) => {
                self.advance()?;
                Ok(Expr::Ident(text))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::Str(s))
            }
            Token::KeyName(name) => {
                self.advance()?;
                Ok(Expr::KeyName(name))
            }
            Token::LBracket | Token::LBrace => {
                let close = if token == Token::LBracket {
                    Token::RBracket
                } else {
                    Token::RBrace
                };
                self.current = Some(token.clone());
                Ok(Expr::List(self.parse_list(token, close)?))
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Identifier(name) => {
                self.advance()?;
                match self.current {
                    Some(Token::LParen) => self.parse_call(name),
                    Some(Token::Dot) | Some(Token::LBracket) => {
                        Ok(Expr::Field(Box::new(self.parse_lvalue_tail(name)?)))
                    }
                    _ => Ok(Expr::Ident(name)),
                }
            }
            other => {
                self.current = Some(other);
                Err(self.error(format!("Unexpected {:?} in expression", self.current)))
            }
        }
    }

    /// `[ a, b ]` or `{ a, b }`
    fn parse_list(&mut self, open: Token, close: Token) -> Result<Vec<Expr>, XkbError> {
        self.expect(open)?;
        let mut items = Vec::new();
        while self.current.as_ref() != Some(&close) {
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma)? {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    // SetMods(modifiers=Shift, clearLocks)
    fn parse_call(&mut self, name: String) -> Result<Expr, XkbError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        while self.current != Some(Token::RParen) {
            let arg = self.parse_expr()?;
            let arg = if self.current == Some(Token::Equals) {
                let lhs = match arg {
                    Expr::Ident(field) => LValue {
                        element: None,
                        field,
                        index: None,
                    },
                    Expr::Field(lhs) => *lhs,
                    other => {
                        return Err(self.error(format!("Cannot assign to {:?}", other)));
                    }
                };
                self.advance()?;
                Expr::Assign(Box::new(lhs), Box::new(self.parse_expr()?))
            } else {
                arg
            };
            args.push(arg);
            if !self.eat(&Token::Comma)? {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(Expr::Call { name, args })
    }

    /// Skip to the end of the current statement, leaving a closing `}` in place
    fn skip_statement(&mut self) -> Result<(), XkbError> {
        let mut depth = 0usize;
        loop {
            match &self.current {
                None => return Err(self.error("Unexpected end of file")),
                Some(Token::LBrace) => depth += 1,
                Some(Token::RBrace) if depth == 0 => return Ok(()),
                Some(Token::RBrace) => depth -= 1,
                Some(Token::Semicolon) if depth == 0 => return self.advance(),
                _ => {}
            }
            self.advance()?;
        }
    }

    fn skip_block(&mut self) -> Result<(), XkbError> {
        self.expect(Token::LBrace)?;
        let mut depth = 1usize;
        while depth > 0 {
            match &self.current {
                None => return Err(self.error("Unexpected end of file")),
                Some(Token::LBrace) => depth += 1,
                Some(Token::RBrace) => depth -= 1,
                _ => {}
            }
            self.advance()?;
        }
        Ok(())
    }
}
