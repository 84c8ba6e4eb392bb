use logos::{FilterResult, Logos};

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    // Comments and whitespace (skipped)
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)]
    #[token("/*", skip_block_comment)]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Comment,

    // Merge modes
    #[token("include", ignore(ascii_case))]
    Include,

    #[token("augment", ignore(ascii_case))]
    Augment,

    #[token("override", ignore(ascii_case))]
    Override,

    #[token("replace", ignore(ascii_case))]
    Replace,

    // Delimiters
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    // Operators
    #[token("=")]
    Equals,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("!")]
    Exclam,

    #[token("~")]
    Invert,

    // <AE01>
    #[regex(r"<[A-Za-z0-9_+\-]+>", |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    KeyName(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    Integer(Option<i64>),

    // Geometry files use these; they are only ever skipped
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().to_string())]
    Float(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len()-1])
    })]
    String(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
}

impl Token {
    pub fn is_merge_mode(&self) -> bool {
        matches!(self, Token::Include | Token::Augment | Token::Override | Token::Replace)
    }
}

/// Skip past the closing `*/`; an unterminated comment is an error
fn skip_block_comment(lex: &mut logos::Lexer<Token>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(())
        }
    }
}

fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(c) => {
                result.push('\\');
                result.push(c);
            }
            None => result.push('\\'),
        }
    }

    result
}
