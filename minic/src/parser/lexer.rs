use std::fmt;

use crate::error::{CompileError, LexErrorKind};
use crate::ir::ast::{Operator, TypeKind};
use crate::span::Span;
use super::grammar;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Ключевые слова
    Def, Extern, Return, If, Else, While, For,
    // int, float, bool, char, string
    Type(TypeKind),
    // Литералы
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    CharLiteral(char),
    StringLiteral(String),
    Identifier(String),
    Operator(Operator),
    // Пунктуация
    Semicolon,     // ;
    Comma,         // ,
    LParen,        // (
    RParen,        // )
    LBrace,        // {
    RBrace,        // }
    LBracket,      // [
    RBracket,      // ]
    Arrow,         // ->
    // Специальные
    Eof,
}

impl TokenKind {
    /// Исходный текст токена, если его можно восстановить один в один.
    /// Числа, строки и символы не восстанавливаются: форма записи теряется.
    pub fn lexeme(&self) -> Option<String> {
        let text = match self {
            TokenKind::Def => "def",
            TokenKind::Extern => "extern",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Type(ty) => return Some(ty.to_string()),
            TokenKind::BoolLiteral(value) => return Some(value.to_string()),
            TokenKind::Identifier(name) => return Some(name.clone()),
            TokenKind::Operator(op) => op.lexeme(),
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Arrow => "->",
            TokenKind::IntLiteral(_)
            | TokenKind::FloatLiteral(_)
            | TokenKind::CharLiteral(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::Eof => return None,
        };
        Some(text.to_string())
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Def => f.write_str("DEF"),
            TokenKind::Extern => f.write_str("EXTERN"),
            TokenKind::Return => f.write_str("RETURN"),
            TokenKind::If => f.write_str("IF"),
            TokenKind::Else => f.write_str("ELSE"),
            TokenKind::While => f.write_str("WHILE"),
            TokenKind::For => f.write_str("FOR"),
            TokenKind::Type(ty) => write!(f, "{}", ty.to_string().to_uppercase()),
            TokenKind::IntLiteral(value) => write!(f, "INT_LITERAL {}", value),
            TokenKind::FloatLiteral(value) => write!(f, "FLOAT_LITERAL {}", value),
            TokenKind::BoolLiteral(value) => write!(f, "BOOL_LITERAL {}", value),
            TokenKind::CharLiteral(value) => write!(f, "CHAR_LITERAL {}", value),
            TokenKind::StringLiteral(value) => write!(f, "STRING_LITERAL {}", value),
            TokenKind::Identifier(name) => write!(f, "IDENTIFIER {}", name),
            TokenKind::Operator(op) => write!(f, "OPERATOR {}", op.lexeme()),
            TokenKind::Semicolon => f.write_str("SEMICOLON"),
            TokenKind::Comma => f.write_str("COMMA"),
            TokenKind::LParen => f.write_str("LPAREN"),
            TokenKind::RParen => f.write_str("RPAREN"),
            TokenKind::LBrace => f.write_str("LBRACE"),
            TokenKind::RBrace => f.write_str("RBRACE"),
            TokenKind::LBracket => f.write_str("LBRACKET"),
            TokenKind::RBracket => f.write_str("RBRACKET"),
            TokenKind::Arrow => f.write_str("ARROW"),
            TokenKind::Eof => f.write_str("EOF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Лексер по требованию: каждый вызов `next_token` отдаёт один токен.
/// После конца входа всегда возвращается `Eof`.
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    offset: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        self.skip_trivia();

        let start = self.mark();
        let Some(ch) = self.peek() else {
            return Ok(Token { kind: TokenKind::Eof, span: start });
        };

        let kind = match ch {
            'a'..='z' | 'A'..='Z' | '_' => self.lex_word(),
            '0'..='9' => self.lex_number(),
            ',' | ';' | '(' | ')' | '{' | '}' | '[' | ']' => self.lex_separator(ch),
            '"' => self.lex_string(start)?,
            '\'' => self.lex_char(start)?,
            _ => self.lex_operator(start)?,
        };

        Ok(Token { kind, span: self.finish(start) })
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\n' | '\r' => {
                    self.bump();
                }
                '#' => {
                    // Комментарии - пропускаем до конца строки
                    while let Some(ch) = self.peek() {
                        if ch == '\n' { break; }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_word(&mut self) -> TokenKind {
        let mut ident = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => {
                    ident.push(ch);
                    self.bump();
                }
                _ => break,
            }
        }

        grammar::lookup_keyword(&ident).unwrap_or(TokenKind::Identifier(ident))
    }

    /// Целая часть копится как `value * 10 + digit` без проверки переполнения:
    /// литералы больше `i64::MAX` заворачиваются по модулю 2^64.
    fn lex_number(&mut self) -> TokenKind {
        let mut value: i64 = 0;

        while let Some(digit) = self.peek().and_then(|ch| ch.to_digit(10)) {
            value = value.wrapping_mul(10).wrapping_add(digit as i64);
            self.bump();
        }

        if self.peek() != Some('.') {
            return TokenKind::IntLiteral(value);
        }
        self.bump(); // consume '.'

        let mut fraction = 0.0;
        let mut base = 0.1;
        while let Some(digit) = self.peek().and_then(|ch| ch.to_digit(10)) {
            fraction += digit as f64 * base;
            base *= 0.1;
            self.bump();
        }

        TokenKind::FloatLiteral(value as f64 + fraction)
    }

    fn lex_separator(&mut self, ch: char) -> TokenKind {
        self.bump();
        match ch {
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            _ => TokenKind::RBracket,
        }
    }

    fn lex_string(&mut self, start: Span) -> Result<TokenKind, CompileError> {
        self.bump(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.bump() {
                Some('"') => return Ok(TokenKind::StringLiteral(value)),
                Some(ch) => value.push(ch),
                None => return Err(lex_error(start, LexErrorKind::UnterminatedString)),
            }
        }
    }

    fn lex_char(&mut self, start: Span) -> Result<TokenKind, CompileError> {
        self.bump(); // consume opening quote
        let value = self
            .bump()
            .ok_or_else(|| lex_error(start, LexErrorKind::UnterminatedChar))?;

        match self.bump() {
            Some('\'') => Ok(TokenKind::CharLiteral(value)),
            _ => Err(lex_error(start, LexErrorKind::UnterminatedChar)),
        }
    }

    fn lex_operator(&mut self, start: Span) -> Result<TokenKind, CompileError> {
        if self.position + 1 < self.chars.len() {
            let two: String = self.chars[self.position..self.position + 2].iter().collect();
            if let Some(op) = grammar::lookup_operator(&two) {
                self.bump();
                self.bump();
                return Ok(operator_token(op));
            }
        }

        let ch = self.chars[self.position];
        match grammar::lookup_operator(ch.encode_utf8(&mut [0; 4])) {
            Some(op) => {
                self.bump();
                Ok(operator_token(op))
            }
            None => Err(lex_error(start, LexErrorKind::UnknownOperator(ch))),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn mark(&self) -> Span {
        Span::new(self.line, self.column, self.offset, self.offset)
    }

    fn finish(&self, start: Span) -> Span {
        Span { end: self.offset, ..start }
    }
}

fn operator_token(op: Operator) -> TokenKind {
    match op {
        Operator::Arrow => TokenKind::Arrow,
        _ => TokenKind::Operator(op),
    }
}

fn lex_error(span: Span, kind: LexErrorKind) -> CompileError {
    CompileError::LexerError { span, kind }
}

/// Токенизирует весь исходник. Вектор всегда заканчивается ровно одним `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }

    tracing::debug!(tokens = tokens.len(), "tokenized source");
    Ok(tokens)
}

/// Поток токенов для парсера: текущий токен + продвижение вперёд.
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token { kind: TokenKind::Eof, span });
        }
        Self { tokens, position: 0 }
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// Токен на `n` позиций впереди; за концом всегда `Eof`.
    pub fn peek(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + n).min(last)]
    }

    /// Отбрасывает текущий токен и возвращает его.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    pub fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }
}
