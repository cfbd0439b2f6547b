use crate::error::CompileError;
use crate::ir::ast::{
    Block, Expression, ExternDecl, FunctionDef, Item, Operator, Param, Program, Statement,
    TypeKind,
};
use super::grammar::{self, Precedence};
use super::lexer::{Token, TokenKind, TokenStream};

/// Предел вложенности скобок, унарных операторов и блоков
pub const MAX_NESTING: usize = 128;

pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, CompileError> {
    let mut parser = Parser::new(TokenStream::new(tokens));
    parser.parse_program()
}

/// Рекурсивный спуск; бинарные выражения разбираются каскадом уровней приоритета.
/// Первая же ошибка прерывает разбор, восстановления нет.
pub struct Parser {
    stream: TokenStream,
    depth: usize,
}

type ParseFn = fn(&mut Parser) -> Result<Expression, CompileError>;

impl Parser {
    pub fn new(stream: TokenStream) -> Self {
        Self { stream, depth: 0 }
    }

    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut items = Vec::new();

        while !self.stream.is_at_end() {
            items.push(self.parse_item()?);
        }

        tracing::debug!(items = items.len(), "parsed program");
        Ok(Program { items })
    }

    fn parse_item(&mut self) -> Result<Item, CompileError> {
        match self.stream.current().kind {
            TokenKind::Def => {
                self.stream.advance(); // consume 'def'
                Ok(Item::Function(self.parse_function()?))
            }
            TokenKind::Extern => {
                self.stream.advance(); // consume 'extern'
                Ok(Item::Extern(self.parse_extern()?))
            }
            _ => Ok(Item::Statement(self.parse_statement()?)),
        }
    }

    /// def name(int a, float b) -> int { ... }
    fn parse_function(&mut self) -> Result<FunctionDef, CompileError> {
        let name = self.expect_identifier("Expected identifier after def")?;
        self.expect(TokenKind::LParen, "Expected '(' after function name")?;
        let params = self.parse_params("function")?;

        // без '->' функция ничего не возвращает
        let mut return_type = TypeKind::Void;
        if self.check(&TokenKind::Arrow) {
            self.stream.advance();
            return_type = self.expect_type("Expected type after '->' in function return type")?;
        }

        let body = self.parse_block("function body")?;
        Ok(FunctionDef { name, params, body, return_type })
    }

    /// extern int name(int a);
    fn parse_extern(&mut self) -> Result<ExternDecl, CompileError> {
        let mut return_type = TypeKind::Void;
        if let Some(ty) = grammar::type_of_keyword(&self.stream.current().kind) {
            self.stream.advance();
            return_type = ty;
        }

        let name = self.expect_identifier("Expected identifier after extern")?;
        self.expect(TokenKind::LParen, "Expected '(' after extern identifier")?;
        let params = self.parse_params("extern")?;
        self.expect(TokenKind::Semicolon, "Expected ';' after extern declaration")?;

        Ok(ExternDecl { name, params, return_type })
    }

    /// Список параметров после '('. Пустой или `type name (, type name)*`, затем ')'.
    fn parse_params(&mut self, owner: &str) -> Result<Vec<Param>, CompileError> {
        let mut params = Vec::new();
        if self.check(&TokenKind::RParen) {
            self.stream.advance();
            return Ok(params);
        }

        loop {
            let ty = self.expect_type(&format!("Expected type in {} parameter", owner))?;
            let name = self.expect_identifier(&format!(
                "Expected identifier after type in {} parameter",
                owner
            ))?;
            params.push(Param { ty, name });

            match self.stream.current().kind {
                TokenKind::Comma => {
                    self.stream.advance();
                }
                TokenKind::RParen => {
                    self.stream.advance();
                    return Ok(params);
                }
                _ => return Err(self.error("Expected ',' or ')' after parameter")),
            }
        }
    }

    /// '{' statement* '}'
    fn parse_block(&mut self, what: &str) -> Result<Block, CompileError> {
        self.expect(TokenKind::LBrace, &format!("Expected '{{' to open {}", what))?;

        let statements = self.nested("Block", |this| {
            let mut statements = Vec::new();
            while !this.check(&TokenKind::RBrace) && !this.stream.is_at_end() {
                statements.push(this.parse_statement()?);
            }
            Ok(statements)
        })?;

        self.expect(TokenKind::RBrace, &format!("Expected '}}' to close {}", what))?;
        Ok(Block { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, CompileError> {
        match self.stream.current().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Type(_) => self.parse_var_decl(),
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block("block")?)),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_if(&mut self) -> Result<Statement, CompileError> {
        self.stream.advance(); // consume 'if'
        self.expect(TokenKind::LParen, "Expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "Expected ')' after if condition")?;
        let then_block = self.parse_block("if body")?;

        let mut else_block = None;
        if self.check(&TokenKind::Else) {
            self.stream.advance();
            else_block = Some(self.parse_block("else body")?);
        }

        Ok(Statement::If { condition, then_block, else_block })
    }

    fn parse_while(&mut self) -> Result<Statement, CompileError> {
        self.stream.advance(); // consume 'while'
        self.expect(TokenKind::LParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "Expected ')' after while condition")?;
        let body = self.parse_block("while body")?;

        Ok(Statement::While { condition, body })
    }

    /// for (init; cond; step) - каждая часть может отсутствовать
    fn parse_for(&mut self) -> Result<Statement, CompileError> {
        self.stream.advance(); // consume 'for'
        self.expect(TokenKind::LParen, "Expected '(' after 'for'")?;

        // init сам съедает свою ';'
        let init = if self.check(&TokenKind::Semicolon) {
            self.stream.advance();
            None
        } else if grammar::is_type_keyword(&self.stream.current().kind) {
            Some(Box::new(self.parse_var_decl()?))
        } else {
            Some(Box::new(self.parse_expression_statement()?))
        };

        let mut condition = None;
        if !self.check(&TokenKind::Semicolon) {
            condition = Some(self.parse_expression()?);
        }
        self.expect(TokenKind::Semicolon, "Expected ';' after for condition")?;

        let mut increment = None;
        if !self.check(&TokenKind::RParen) {
            increment = Some(self.parse_expression()?);
        }
        self.expect(TokenKind::RParen, "Expected ')' after for clauses")?;

        let body = self.parse_block("for body")?;
        Ok(Statement::For { init, condition, increment, body })
    }

    fn parse_return(&mut self) -> Result<Statement, CompileError> {
        self.stream.advance(); // consume 'return'

        let mut value = None;
        if !self.check(&TokenKind::Semicolon) {
            value = Some(self.parse_expression()?);
        }
        self.expect(TokenKind::Semicolon, "Expected ';' after return")?;

        Ok(Statement::Return(value))
    }

    /// int x = 10;
    fn parse_var_decl(&mut self) -> Result<Statement, CompileError> {
        let ty = self.expect_type("Expected type in variable declaration")?;
        let name = self.expect_identifier("Expected identifier after type")?;

        let mut initializer = None;
        if self.check_operator(Operator::Equal) {
            self.stream.advance(); // consume '='
            initializer = Some(self.parse_expression()?);
        }
        self.expect(TokenKind::Semicolon, "Expected ';' after variable declaration")?;

        Ok(Statement::VarDecl { ty, name, initializer })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, CompileError> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after expression")?;
        Ok(Statement::Expr(expr))
    }

    pub fn parse_expression(&mut self) -> Result<Expression, CompileError> {
        self.nested("Expression", Self::parse_assignment)
    }

    /// Присваивание правоассоциативно, слева допустим только идентификатор
    fn parse_assignment(&mut self) -> Result<Expression, CompileError> {
        let left = self.parse_logical_or()?;

        if self.binary_operator_at(Precedence::Assignment).is_none() {
            return Ok(left);
        }
        let assign_span = self.stream.advance().span;
        let value = self.parse_assignment()?;

        match left {
            Expression::Identifier(target) => Ok(Expression::Assign {
                target,
                value: Box::new(value),
            }),
            _ => Err(CompileError::SyntaxError {
                span: assign_span,
                message: "Left side of assignment must be a variable".to_string(),
            }),
        }
    }

    fn parse_logical_or(&mut self) -> Result<Expression, CompileError> {
        self.parse_binary(Precedence::LogicalOr, Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, CompileError> {
        self.parse_binary(Precedence::LogicalAnd, Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expression, CompileError> {
        self.parse_binary(Precedence::Equality, Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Result<Expression, CompileError> {
        self.parse_binary(Precedence::Comparison, Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Expression, CompileError> {
        self.parse_binary(Precedence::Additive, Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, CompileError> {
        self.parse_binary(Precedence::Multiplicative, Self::parse_unary)
    }

    /// Левоассоциативный уровень: operand (op operand)*
    fn parse_binary(&mut self, level: Precedence, operand: ParseFn) -> Result<Expression, CompileError> {
        let mut left = operand(self)?;

        while let Some(op) = self.binary_operator_at(level) {
            self.stream.advance(); // consume operator
            let right = operand(self)?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn binary_operator_at(&self, level: Precedence) -> Option<Operator> {
        match self.stream.current().kind {
            TokenKind::Operator(op) if op.precedence() == Some(level) => Some(op),
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, CompileError> {
        if let TokenKind::Operator(op) = self.stream.current().kind {
            if op.is_prefix() {
                self.stream.advance();
                let operand = self.nested("Expression", Self::parse_unary)?;
                return Ok(Expression::Unary { op, operand: Box::new(operand) });
            }
        }
        self.parse_postfix()
    }

    /// primary ('(' args ')')*
    fn parse_postfix(&mut self) -> Result<Expression, CompileError> {
        let mut expr = self.parse_primary()?;

        while self.check(&TokenKind::LParen) {
            let call_span = self.stream.advance().span;
            let arguments = self.parse_arguments()?;

            expr = match expr {
                Expression::Identifier(callee) => Expression::Call { callee, arguments },
                _ => {
                    return Err(CompileError::SyntaxError {
                        span: call_span,
                        message: "Can only call identifiers".to_string(),
                    });
                }
            };
        }

        Ok(expr)
    }

    /// Аргументы после '(' вплоть до ')' включительно
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, CompileError> {
        let mut arguments = Vec::new();
        if self.check(&TokenKind::RParen) {
            self.stream.advance();
            return Ok(arguments);
        }

        loop {
            arguments.push(self.parse_expression()?);
            match self.stream.current().kind {
                TokenKind::Comma => {
                    self.stream.advance();
                }
                TokenKind::RParen => {
                    self.stream.advance();
                    return Ok(arguments);
                }
                _ => return Err(self.error("Expected ',' or ')' in function call")),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, CompileError> {
        let expr = match &self.stream.current().kind {
            TokenKind::Identifier(name) => Expression::Identifier(name.clone()),
            TokenKind::IntLiteral(n) => Expression::IntLiteral(*n),
            TokenKind::FloatLiteral(x) => Expression::FloatLiteral(*x),
            TokenKind::BoolLiteral(b) => Expression::BoolLiteral(*b),
            TokenKind::CharLiteral(c) => Expression::CharLiteral(*c),
            TokenKind::StringLiteral(s) => Expression::StringLiteral(s.clone()),
            TokenKind::LParen => {
                self.stream.advance(); // consume '('
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "Expected ')' after expression")?;
                return Ok(expr);
            }
            _ => return Err(self.error("Unexpected token in expression")),
        };

        self.stream.advance();
        Ok(expr)
    }

    // Вспомогательные методы

    /// Один уровень вложенности; глубина восстанавливается и при ошибке
    fn nested<T>(
        &mut self,
        what: &str,
        parse: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        if self.depth >= MAX_NESTING {
            return Err(CompileError::SyntaxError {
                span: self.stream.current().span,
                message: format!("{} nested too deeply", what),
            });
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.stream.current().kind == *kind
    }

    fn check_operator(&self, op: Operator) -> bool {
        self.stream.current().kind == TokenKind::Operator(op)
    }

    fn expect(&mut self, expected: TokenKind, message: &str) -> Result<Token, CompileError> {
        if self.check(&expected) {
            Ok(self.stream.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String, CompileError> {
        match &self.stream.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.stream.advance();
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }

    fn expect_type(&mut self, message: &str) -> Result<TypeKind, CompileError> {
        match grammar::type_of_keyword(&self.stream.current().kind) {
            Some(ty) => {
                self.stream.advance();
                Ok(ty)
            }
            None => Err(self.error(message)),
        }
    }

    fn error(&self, message: &str) -> CompileError {
        let token = self.stream.current();
        CompileError::SyntaxError {
            span: token.span,
            message: format!("{}, found {}", message, token.kind),
        }
    }
}
