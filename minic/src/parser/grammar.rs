//! Таблицы классификации: ключевые слова, операторы, типы.
//! Общие для лексера и парсера.

use crate::ir::ast::{Operator, TypeKind};
use super::lexer::TokenKind;

/// Все операторы языка. Поиск идёт сначала по двум символам, потом по одному.
pub const OPERATORS: &[(&str, Operator)] = &[
    ("==", Operator::EqualEqual),
    ("!=", Operator::NotEqual),
    ("<=", Operator::LessEqual),
    (">=", Operator::GreaterEqual),
    ("&&", Operator::AndAnd),
    ("||", Operator::OrOr),
    ("++", Operator::PlusPlus),
    ("--", Operator::MinusMinus),
    ("+=", Operator::PlusEqual),
    ("-=", Operator::MinusEqual),
    ("->", Operator::Arrow),
    ("+", Operator::Plus),
    ("-", Operator::Minus),
    ("*", Operator::Multiply),
    ("/", Operator::Divide),
    ("=", Operator::Equal),
    ("!", Operator::Not),
    ("&", Operator::And),
    ("|", Operator::Or),
    ("<", Operator::Less),
    (">", Operator::Greater),
];

pub fn lookup_operator(lexeme: &str) -> Option<Operator> {
    OPERATORS
        .iter()
        .find(|(text, _)| *text == lexeme)
        .map(|(_, op)| *op)
}

/// Ключевое слово -> токен. `None` значит обычный идентификатор.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "def" => TokenKind::Def,
        "extern" => TokenKind::Extern,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "int" => TokenKind::Type(TypeKind::Int),
        "float" => TokenKind::Type(TypeKind::Float),
        "bool" => TokenKind::Type(TypeKind::Bool),
        "char" => TokenKind::Type(TypeKind::Char),
        "string" => TokenKind::Type(TypeKind::String),
        "true" => TokenKind::BoolLiteral(true),
        "false" => TokenKind::BoolLiteral(false),
        _ => return None,
    };
    Some(kind)
}

/// Тип, который называет токен, если это ключевое слово типа
pub fn type_of_keyword(kind: &TokenKind) -> Option<TypeKind> {
    match kind {
        TokenKind::Type(ty) => Some(*ty),
        _ => None,
    }
}

pub fn is_type_keyword(kind: &TokenKind) -> bool {
    type_of_keyword(kind).is_some()
}

/// Уровни приоритета бинарных операторов, от слабого к сильному
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Assignment,
    LogicalOr,
    LogicalAnd,
    Equality,
    Comparison,
    Additive,
    Multiplicative,
}

impl Operator {
    pub fn lexeme(&self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(_, op)| op == self)
            .map(|(text, _)| *text)
            .unwrap_or("?")
    }

    /// Уровень, на котором оператор встречается как инфиксный.
    /// `&`, `|`, `++`, `+=` и прочие в грамматике инфиксными не бывают.
    pub fn precedence(&self) -> Option<Precedence> {
        let level = match self {
            Operator::Equal => Precedence::Assignment,
            Operator::OrOr => Precedence::LogicalOr,
            Operator::AndAnd => Precedence::LogicalAnd,
            Operator::EqualEqual | Operator::NotEqual => Precedence::Equality,
            Operator::Less | Operator::Greater | Operator::LessEqual | Operator::GreaterEqual => {
                Precedence::Comparison
            }
            Operator::Plus | Operator::Minus => Precedence::Additive,
            Operator::Multiply | Operator::Divide => Precedence::Multiplicative,
            _ => return None,
        };
        Some(level)
    }

    /// Префиксные операторы, которые принимает парсер
    pub fn is_prefix(&self) -> bool {
        matches!(self, Operator::Not | Operator::Minus)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self.precedence(),
            Some(Precedence::Equality | Precedence::Comparison)
        )
    }

    /// `<`, `>`, `<=`, `>=` - требуют упорядоченного типа
    pub fn is_ordering(&self) -> bool {
        self.precedence() == Some(Precedence::Comparison)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::AndAnd | Operator::OrOr)
    }
}
