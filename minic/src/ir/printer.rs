//! Текстовый дамп AST: дерево с отступом в два пробела на уровень.

use std::fmt::{self, Write};

use super::ast::{Block, Expression, Item, Param, Program, Statement};

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer { out: f };
        printer.line(0, "Program")?;
        for item in &self.items {
            printer.item(item, 1)?;
        }
        Ok(())
    }
}

struct Printer<'a, W: Write> {
    out: &'a mut W,
}

impl<W: Write> Printer<'_, W> {
    fn line(&mut self, depth: usize, text: impl fmt::Display) -> fmt::Result {
        writeln!(self.out, "{:indent$}{}", "", text, indent = depth * 2)
    }

    fn item(&mut self, item: &Item, depth: usize) -> fmt::Result {
        match item {
            Item::Function(func) => {
                self.line(depth, format_args!("FunctionDef {} -> {}", func.name, func.return_type))?;
                self.params(&func.params, depth + 1)?;
                self.line(depth + 1, "Body:")?;
                self.statements(&func.body, depth + 2)
            }
            Item::Extern(decl) => {
                self.line(depth, format_args!("ExternDecl {} -> {}", decl.name, decl.return_type))?;
                self.params(&decl.params, depth + 1)
            }
            Item::Statement(stmt) => self.statement(stmt, depth),
        }
    }

    fn params(&mut self, params: &[Param], depth: usize) -> fmt::Result {
        if params.is_empty() {
            return Ok(());
        }
        self.line(depth, "Params:")?;
        for param in params {
            self.line(depth + 1, format_args!("{} {}", param.ty, param.name))?;
        }
        Ok(())
    }

    fn statements(&mut self, block: &Block, depth: usize) -> fmt::Result {
        for stmt in &block.statements {
            self.statement(stmt, depth)?;
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &Statement, depth: usize) -> fmt::Result {
        match stmt {
            Statement::VarDecl { ty, name, initializer } => {
                self.line(depth, format_args!("VarDecl {} {}", ty, name))?;
                if let Some(init) = initializer {
                    self.expression(init, depth + 1)?;
                }
                Ok(())
            }
            Statement::Expr(expr) => {
                self.line(depth, "ExprStmt")?;
                self.expression(expr, depth + 1)
            }
            Statement::Block(block) => {
                self.line(depth, "Block")?;
                self.statements(block, depth + 1)
            }
            Statement::Return(value) => {
                self.line(depth, "Return")?;
                if let Some(value) = value {
                    self.expression(value, depth + 1)?;
                }
                Ok(())
            }
            Statement::If { condition, then_block, else_block } => {
                self.line(depth, "If")?;
                self.expression(condition, depth + 1)?;
                self.line(depth, "Then:")?;
                self.statements(then_block, depth + 1)?;
                if let Some(else_block) = else_block {
                    self.line(depth, "Else:")?;
                    self.statements(else_block, depth + 1)?;
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                self.line(depth, "While")?;
                self.expression(condition, depth + 1)?;
                self.line(depth, "Body:")?;
                self.statements(body, depth + 1)
            }
            Statement::For { init, condition, increment, body } => {
                self.line(depth, "For")?;
                if let Some(init) = init {
                    self.line(depth + 1, "Init:")?;
                    self.statement(init, depth + 2)?;
                }
                if let Some(condition) = condition {
                    self.line(depth + 1, "Cond:")?;
                    self.expression(condition, depth + 2)?;
                }
                if let Some(increment) = increment {
                    self.line(depth + 1, "Step:")?;
                    self.expression(increment, depth + 2)?;
                }
                self.line(depth + 1, "Body:")?;
                self.statements(body, depth + 2)
            }
        }
    }

    fn expression(&mut self, expr: &Expression, depth: usize) -> fmt::Result {
        match expr {
            Expression::Identifier(name) => self.line(depth, format_args!("Identifier {}", name)),
            Expression::IntLiteral(n) => self.line(depth, format_args!("IntLiteral {}", n)),
            Expression::FloatLiteral(x) => self.line(depth, format_args!("FloatLiteral {}", x)),
            Expression::BoolLiteral(b) => self.line(depth, format_args!("BoolLiteral {}", b)),
            Expression::CharLiteral(c) => self.line(depth, format_args!("CharLiteral '{}'", c)),
            Expression::StringLiteral(s) => {
                self.line(depth, format_args!("StringLiteral \"{}\"", s))
            }
            Expression::Unary { op, operand } => {
                self.line(depth, format_args!("UnaryExpr {}", op.lexeme()))?;
                self.expression(operand, depth + 1)
            }
            Expression::Binary { op, left, right } => {
                self.line(depth, format_args!("BinaryExpr {}", op.lexeme()))?;
                self.expression(left, depth + 1)?;
                self.expression(right, depth + 1)
            }
            Expression::Call { callee, arguments } => {
                self.line(depth, format_args!("CallExpr {}", callee))?;
                for argument in arguments {
                    self.expression(argument, depth + 1)?;
                }
                Ok(())
            }
            Expression::Assign { target, value } => {
                self.line(depth, format_args!("AssignExpr {}", target))?;
                self.expression(value, depth + 1)
            }
        }
    }
}
