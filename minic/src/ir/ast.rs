use std::fmt;

/// Статические типы языка. `Void` допустим только как тип возврата.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Int,
    Float,
    String,
    Bool,
    Char,
    Void,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Int => "int",
            TypeKind::Float => "float",
            TypeKind::String => "string",
            TypeKind::Bool => "bool",
            TypeKind::Char => "char",
            TypeKind::Void => "void",
        };
        f.write_str(name)
    }
}

/// Все операторы, которые знает лексер.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,         // +
    Minus,        // -
    PlusPlus,     // ++
    MinusMinus,   // --
    Multiply,     // *
    Divide,       // /
    EqualEqual,   // ==
    NotEqual,     // !=
    Less,         // <
    Greater,      // >
    LessEqual,    // <=
    GreaterEqual, // >=
    PlusEqual,    // +=
    MinusEqual,   // -=
    AndAnd,       // &&
    OrOr,         // ||
    And,          // &
    Or,           // |
    Not,          // !
    Equal,        // =
    Arrow,        // ->
}

/// Программа - упорядоченный список элементов верхнего уровня
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// def name(int a) -> int { ... }
    Function(FunctionDef),
    /// extern int name(int a);
    Extern(ExternDecl),
    /// любой оператор на верхнем уровне
    Statement(Statement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: TypeKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub return_type: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// int x = 10;
    VarDecl {
        ty: TypeKind,
        name: String,
        initializer: Option<Expression>,
    },
    /// f(x);
    Expr(Expression),
    /// { ... }
    Block(Block),
    /// return x;
    Return(Option<Expression>),
    /// if (cond) { ... } else { ... }
    If {
        condition: Expression,
        then_block: Block,
        else_block: Option<Block>,
    },
    /// while (cond) { ... }
    While {
        condition: Expression,
        body: Block,
    },
    /// for (init; cond; step) { ... }
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        increment: Option<Expression>,
        body: Block,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// x, counter
    Identifier(String),
    /// 42 (переполнение при лексинге заворачивается)
    IntLiteral(i64),
    /// 3.14
    FloatLiteral(f64),
    /// true, false
    BoolLiteral(bool),
    /// 'a'
    CharLiteral(char),
    /// "hello"
    StringLiteral(String),
    /// -x, !flag
    Unary {
        op: Operator,
        operand: Box<Expression>,
    },
    /// a + b
    Binary {
        op: Operator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// add(1, 2)
    Call {
        callee: String,
        arguments: Vec<Expression>,
    },
    /// x = 5
    Assign {
        target: String,
        value: Box<Expression>,
    },
}
