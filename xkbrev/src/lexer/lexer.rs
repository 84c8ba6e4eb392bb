use logos::{Logos, Lexer as LogosLexer};
use xkbrev_core::XkbError;
use super::Token;

pub struct Lexer<'a> {
    inner: LogosLexer<'a, Token>,
    current_line: usize,
    counted_to: usize,
    pub input: &'a str,
    pub file: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, file: &'a str) -> Self {
        Self {
            inner: Token::lexer(input),
            current_line: 1,
            counted_to: 0,
            input,
            file,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, XkbError> {
        let result = self.inner.next();
        let span = self.inner.span();

        // Count newlines skipped since the previous token
        let gap = self.input.get(self.counted_to..span.start).unwrap_or("");
        self.current_line += gap.chars().filter(|&c| c == '\n').count();
        self.counted_to = self.counted_to.max(span.start);

        match result {
            Some(Ok(token)) => Ok(Some(token)),
            Some(Err(_)) => {
                let text = &self.input[span.start..span.end];
                Err(XkbError::parse(
                    self.file,
                    self.current_line,
                    format!("Unexpected token: '{}'", text),
                ))
            }
            None => Ok(None),
        }
    }

    pub fn current_line(&self) -> usize {
        self.current_line
    }

    pub fn peek(&self) -> Option<Token> {
        self.inner.clone().next().and_then(|r| r.ok())
    }

    pub fn collect_all(mut self) -> Result<Vec<Token>, XkbError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}
