use crate::error::{MismatchContext, SemanticError, SymbolRole};
use crate::ir::ast::{
    Block, Expression, ExternDecl, FunctionDef, Item, Operator, Program, Statement, TypeKind,
};
use super::scope::{ScopeStack, Symbol};

type Result<T> = std::result::Result<T, SemanticError>;

/// Проверка имён и типов. Два прохода: сначала все функции регистрируются
/// в глобальной области, потом элементы проверяются по порядку.
pub struct SemanticAnalyzer {
    scopes: ScopeStack,
    /// `None` вне тела функции
    return_type: Option<TypeKind>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            return_type: None,
        }
    }

    pub fn analyze_program(&mut self, program: &Program) -> Result<()> {
        // Первый проход - вызовы вперёд по тексту должны разрешаться
        for item in &program.items {
            if let Item::Function(func) = item {
                let params = func.params.iter().map(|p| p.ty).collect();
                let symbol = Symbol::function(&func.name, func.return_type, params);
                self.declare(symbol, SymbolRole::Function)?;
            }
        }

        for item in &program.items {
            self.analyze_item(item)?;
        }

        tracing::debug!(items = program.items.len(), "semantic analysis passed");
        Ok(())
    }

    fn analyze_item(&mut self, item: &Item) -> Result<()> {
        match item {
            Item::Function(func) => self.analyze_function(func),
            Item::Extern(decl) => self.analyze_extern(decl),
            Item::Statement(stmt) => self.analyze_statement(stmt),
        }
    }

    fn analyze_function(&mut self, func: &FunctionDef) -> Result<()> {
        let outer_return = self.return_type.replace(func.return_type);

        let result = self.with_scope(|this| {
            for param in &func.params {
                this.declare(Symbol::variable(&param.name, param.ty), SymbolRole::Parameter)?;
            }
            // тело делит область с параметрами
            this.analyze_statements(&func.body)
        });

        self.return_type = outer_return;
        result
    }

    fn analyze_extern(&mut self, decl: &ExternDecl) -> Result<()> {
        if !self.scopes.is_root() {
            return Err(SemanticError::ExternNotAtTopLevel(decl.name.clone()));
        }

        let params = decl.params.iter().map(|p| p.ty).collect();
        self.declare(
            Symbol::function(&decl.name, decl.return_type, params),
            SymbolRole::Extern,
        )
    }

    fn analyze_statement(&mut self, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::VarDecl { ty, name, initializer } => {
                self.declare(Symbol::variable(name, *ty), SymbolRole::Variable)?;
                if let Some(init) = initializer {
                    let found = self.analyze_expression(init)?;
                    if found != *ty {
                        return Err(SemanticError::TypeMismatch {
                            context: MismatchContext::VariableDeclaration(name.clone()),
                            expected: *ty,
                            found,
                        });
                    }
                }
                Ok(())
            }
            Statement::Expr(expr) => {
                self.analyze_expression(expr)?;
                Ok(())
            }
            Statement::Block(block) => self.analyze_block(block),
            Statement::Return(value) => self.analyze_return(value.as_ref()),
            Statement::If { condition, then_block, else_block } => {
                self.check_condition(condition, "if")?;
                self.analyze_block(then_block)?;
                if let Some(else_block) = else_block {
                    self.analyze_block(else_block)?;
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                self.check_condition(condition, "while")?;
                self.analyze_block(body)
            }
            Statement::For { init, condition, increment, body } => {
                // одна область на весь цикл: переменная из init видна везде
                self.with_scope(|this| {
                    if let Some(init) = init {
                        this.analyze_statement(init)?;
                    }
                    if let Some(condition) = condition {
                        this.check_condition(condition, "for")?;
                    }
                    if let Some(increment) = increment {
                        this.analyze_expression(increment)?;
                    }
                    this.analyze_statements(body)
                })
            }
        }
    }

    fn analyze_return(&mut self, value: Option<&Expression>) -> Result<()> {
        let expected = self.return_type.ok_or(SemanticError::ReturnOutsideFunction)?;

        match (expected, value) {
            (TypeKind::Void, None) => Ok(()),
            (TypeKind::Void, Some(value)) => Err(SemanticError::UnexpectedReturnValue {
                found: self.analyze_expression(value)?,
            }),
            (expected, None) => Err(SemanticError::MissingReturnValue { expected }),
            (expected, Some(value)) => {
                let found = self.analyze_expression(value)?;
                if found != expected {
                    return Err(SemanticError::TypeMismatch {
                        context: MismatchContext::Return,
                        expected,
                        found,
                    });
                }
                Ok(())
            }
        }
    }

    fn analyze_block(&mut self, block: &Block) -> Result<()> {
        self.with_scope(|this| this.analyze_statements(block))
    }

    /// Операторы блока в текущей области, без открытия новой
    fn analyze_statements(&mut self, block: &Block) -> Result<()> {
        for stmt in &block.statements {
            self.analyze_statement(stmt)?;
        }
        Ok(())
    }

    fn check_condition(&self, condition: &Expression, construct: &'static str) -> Result<()> {
        match self.analyze_expression(condition)? {
            TypeKind::Bool => Ok(()),
            found => Err(SemanticError::NonBooleanCondition { construct, found }),
        }
    }

    /// Выводит статический тип выражения
    pub fn analyze_expression(&self, expr: &Expression) -> Result<TypeKind> {
        match expr {
            Expression::IntLiteral(_) => Ok(TypeKind::Int),
            Expression::FloatLiteral(_) => Ok(TypeKind::Float),
            Expression::BoolLiteral(_) => Ok(TypeKind::Bool),
            Expression::CharLiteral(_) => Ok(TypeKind::Char),
            Expression::StringLiteral(_) => Ok(TypeKind::String),
            Expression::Identifier(name) => self
                .scopes
                .lookup(name)
                .map(|symbol| symbol.ty)
                .ok_or_else(|| SemanticError::UndefinedVariable(name.clone())),
            Expression::Unary { op, operand } => self.analyze_unary(*op, operand),
            Expression::Binary { op, left, right } => self.analyze_binary(*op, left, right),
            Expression::Call { callee, arguments } => self.analyze_call(callee, arguments),
            Expression::Assign { target, value } => self.analyze_assign(target, value),
        }
    }

    fn analyze_unary(&self, op: Operator, operand: &Expression) -> Result<TypeKind> {
        let found = self.operand_type(operand)?;

        let valid = match op {
            Operator::Not => found == TypeKind::Bool,
            Operator::Minus => matches!(found, TypeKind::Int | TypeKind::Float),
            Operator::PlusPlus | Operator::MinusMinus => found == TypeKind::Int,
            _ => false,
        };

        if !valid {
            return Err(SemanticError::InvalidOperand { op, found });
        }
        Ok(found)
    }

    fn analyze_binary(&self, op: Operator, left: &Expression, right: &Expression) -> Result<TypeKind> {
        let left = self.operand_type(left)?;
        let right = self.operand_type(right)?;

        if op.is_logical() {
            if left != TypeKind::Bool {
                return Err(SemanticError::InvalidOperand { op, found: left });
            }
            if right != TypeKind::Bool {
                return Err(SemanticError::InvalidOperand { op, found: right });
            }
            return Ok(TypeKind::Bool);
        }

        // сравнение и арифметика требуют совпадения типов, без приведений
        if left != right {
            return Err(SemanticError::OperandMismatch { op, left, right });
        }

        if op.is_comparison() {
            if op.is_ordering() && !matches!(left, TypeKind::Int | TypeKind::Float | TypeKind::Char) {
                return Err(SemanticError::InvalidOperand { op, found: left });
            }
            return Ok(TypeKind::Bool);
        }

        Ok(left)
    }

    fn analyze_call(&self, callee: &str, arguments: &[Expression]) -> Result<TypeKind> {
        let symbol = self
            .scopes
            .lookup(callee)
            .ok_or_else(|| SemanticError::UndefinedFunction(callee.to_string()))?;

        if !symbol.is_function {
            return Err(SemanticError::CallToNonFunction(callee.to_string()));
        }
        if symbol.params.len() != arguments.len() {
            return Err(SemanticError::ArgumentCount {
                name: callee.to_string(),
                expected: symbol.params.len(),
                found: arguments.len(),
            });
        }

        for (position, (argument, expected)) in arguments.iter().zip(&symbol.params).enumerate() {
            let found = self.analyze_expression(argument)?;
            if found != *expected {
                return Err(SemanticError::TypeMismatch {
                    context: MismatchContext::Argument {
                        callee: callee.to_string(),
                        position,
                    },
                    expected: *expected,
                    found,
                });
            }
        }

        Ok(symbol.ty)
    }

    fn analyze_assign(&self, target: &str, value: &Expression) -> Result<TypeKind> {
        let symbol = self
            .scopes
            .lookup(target)
            .ok_or_else(|| SemanticError::UndefinedVariable(target.to_string()))?;

        if symbol.is_function {
            return Err(SemanticError::AssignToFunction(target.to_string()));
        }

        let found = self.analyze_expression(value)?;
        if found != symbol.ty {
            return Err(SemanticError::TypeMismatch {
                context: MismatchContext::Assignment(target.to_string()),
                expected: symbol.ty,
                found,
            });
        }
        Ok(symbol.ty)
    }

    /// Тип операнда оператора; void-значение операндом быть не может
    fn operand_type(&self, expr: &Expression) -> Result<TypeKind> {
        match self.analyze_expression(expr)? {
            TypeKind::Void => Err(SemanticError::VoidValue),
            ty => Ok(ty),
        }
    }

    fn declare(&mut self, symbol: Symbol, role: SymbolRole) -> Result<()> {
        let name = symbol.name.clone();
        if !self.scopes.insert(symbol) {
            return Err(SemanticError::Redefinition { what: role, name });
        }
        Ok(())
    }

    /// Открывает область на время `body` и закрывает её и при ошибке
    fn with_scope<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scopes.push();
        let result = body(self);
        self.scopes.pop();
        result
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn check(source: &str) -> Result<()> {
        let program = parse(source).expect("parse failed");
        SemanticAnalyzer::new().analyze_program(&program)
    }

    fn check_err(source: &str) -> SemanticError {
        match check(source) {
            Err(err) => err,
            Ok(()) => panic!("expected semantic error for {:?}", source),
        }
    }

    #[test]
    fn arithmetic_requires_matching_operands() {
        assert!(check("int x = 1 + 2;").is_ok());
        assert_eq!(
            check_err("int x = 1 + 1.5;"),
            SemanticError::OperandMismatch {
                op: Operator::Plus,
                left: TypeKind::Int,
                right: TypeKind::Float,
            }
        );
        assert!(check("float f = 1.5 * 2.0 - 0.5;").is_ok());
        assert!(check("string s = \"a\" + \"b\";").is_ok());
    }

    #[test]
    fn no_implicit_widening_in_declarations() {
        assert_eq!(
            check_err("float f = 1;"),
            SemanticError::TypeMismatch {
                context: MismatchContext::VariableDeclaration("f".into()),
                expected: TypeKind::Float,
                found: TypeKind::Int,
            }
        );
    }

    #[test]
    fn comparison_yields_bool() {
        assert!(check("bool b = 1 == 1;").is_ok());
        assert!(check("bool b = 'a' < 'b';").is_ok());
        assert!(check("bool b = \"x\" != \"y\";").is_ok());
        assert!(check("bool b = true == false;").is_ok());
        assert!(matches!(
            check_err("bool b = 1 < 1.0;"),
            SemanticError::OperandMismatch { .. }
        ));
    }

    #[test]
    fn ordering_is_limited_to_numbers_and_chars() {
        assert_eq!(
            check_err("bool b = \"a\" < \"b\";"),
            SemanticError::InvalidOperand { op: Operator::Less, found: TypeKind::String }
        );
        assert_eq!(
            check_err("bool b = true >= false;"),
            SemanticError::InvalidOperand { op: Operator::GreaterEqual, found: TypeKind::Bool }
        );
    }

    #[test]
    fn logical_operators_require_bool() {
        assert!(check("bool b = true && (1 < 2) || false;").is_ok());
        assert_eq!(
            check_err("bool b = true && 1;"),
            SemanticError::InvalidOperand { op: Operator::AndAnd, found: TypeKind::Int }
        );
    }

    #[test]
    fn unary_rules() {
        assert!(check("bool b = !true; int i = -1; float f = -1.5;").is_ok());
        assert_eq!(
            check_err("bool b = !1;"),
            SemanticError::InvalidOperand { op: Operator::Not, found: TypeKind::Int }
        );
        assert_eq!(
            check_err("bool b = -true;"),
            SemanticError::InvalidOperand { op: Operator::Minus, found: TypeKind::Bool }
        );
    }

    #[test]
    fn increment_requires_int() {
        let analyzer = SemanticAnalyzer::new();
        let inc = |operand| Expression::Unary {
            op: Operator::PlusPlus,
            operand: Box::new(operand),
        };
        assert_eq!(analyzer.analyze_expression(&inc(Expression::IntLiteral(1))), Ok(TypeKind::Int));
        assert_eq!(
            analyzer.analyze_expression(&inc(Expression::FloatLiteral(1.0))),
            Err(SemanticError::InvalidOperand { op: Operator::PlusPlus, found: TypeKind::Float })
        );
    }

    #[test]
    fn undefined_identifier() {
        assert_eq!(
            check_err("int x = y;"),
            SemanticError::UndefinedVariable("y".into())
        );
        assert_eq!(check_err("z = 1;"), SemanticError::UndefinedVariable("z".into()));
        assert_eq!(check_err("nope();"), SemanticError::UndefinedFunction("nope".into()));
    }

    #[test]
    fn block_scoped_variable_is_invisible_afterwards() {
        assert_eq!(
            check_err("def f() { { int inner = 1; } inner = 2; }"),
            SemanticError::UndefinedVariable("inner".into())
        );
    }

    #[test]
    fn outer_variable_visible_in_nested_scopes() {
        assert!(check(
            "def f() { int x = 1; { { if (x == 1) { while (x < 3) { x = x + 1; } } } } }"
        )
        .is_ok());
    }

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        assert!(check("def f() { int x = 1; { float x = 2.0; x = 3.0; } x = 4; }").is_ok());
    }

    #[test]
    fn redefinitions() {
        assert_eq!(
            check_err("def f() { int x = 1; int x = 2; }"),
            SemanticError::Redefinition { what: SymbolRole::Variable, name: "x".into() }
        );
        assert_eq!(
            check_err("def f(int a, int a) { }"),
            SemanticError::Redefinition { what: SymbolRole::Parameter, name: "a".into() }
        );
        assert_eq!(
            check_err("def f(int a) { int a = 1; }"),
            SemanticError::Redefinition { what: SymbolRole::Variable, name: "a".into() }
        );
        assert_eq!(
            check_err("def f() { } def f() { }"),
            SemanticError::Redefinition { what: SymbolRole::Function, name: "f".into() }
        );
        assert_eq!(
            check_err("def f() { } extern f();"),
            SemanticError::Redefinition { what: SymbolRole::Extern, name: "f".into() }
        );
        assert_eq!(
            check_err("extern g(); extern g();"),
            SemanticError::Redefinition { what: SymbolRole::Extern, name: "g".into() }
        );
    }

    #[test]
    fn forward_calls_between_functions() {
        assert!(check(
            "def a() -> int { return b(1); } def b(int n) -> int { return n; }"
        )
        .is_ok());
    }

    #[test]
    fn externs_are_visible_only_after_declaration() {
        assert_eq!(
            check_err("def f() { g(); } extern g();"),
            SemanticError::UndefinedFunction("g".into())
        );
        assert!(check("extern g(); def f() { g(); }").is_ok());
    }

    #[test]
    fn conditions_must_be_bool() {
        assert_eq!(
            check_err("if (1) { }"),
            SemanticError::NonBooleanCondition { construct: "if", found: TypeKind::Int }
        );
        assert_eq!(
            check_err("while (\"s\") { }"),
            SemanticError::NonBooleanCondition { construct: "while", found: TypeKind::String }
        );
        assert_eq!(
            check_err("for (; 1.0;) { }"),
            SemanticError::NonBooleanCondition { construct: "for", found: TypeKind::Float }
        );
        assert!(check("for (;;) { }").is_ok());
    }

    #[test]
    fn if_branches_have_their_own_scopes() {
        assert!(check("if (true) { int x = 1; } else { int x = 2; }").is_ok());
        assert_eq!(
            check_err("if (true) { int x = 1; } x = 2;"),
            SemanticError::UndefinedVariable("x".into())
        );
    }

    #[test]
    fn for_variable_visible_in_header_and_body_only() {
        assert!(check("def f() { for (int i = 0; i < 10; i = i + 1) { int j = i; } }").is_ok());
        assert_eq!(
            check_err("def f() { for (int i = 0; i < 10; i = i + 1) { } i = 1; }"),
            SemanticError::UndefinedVariable("i".into())
        );
        // тело не открывает отдельную область
        assert_eq!(
            check_err("def f() { for (int i = 0;;) { int i = 1; } }"),
            SemanticError::Redefinition { what: SymbolRole::Variable, name: "i".into() }
        );
    }

    #[test]
    fn return_rules() {
        assert!(check("def f() { return; }").is_ok());
        assert!(check("def f() -> bool { return 1 < 2; }").is_ok());
        assert_eq!(
            check_err("def f() -> int { return; }"),
            SemanticError::MissingReturnValue { expected: TypeKind::Int }
        );
        assert_eq!(
            check_err("def f() { return 1; }"),
            SemanticError::UnexpectedReturnValue { found: TypeKind::Int }
        );
        assert_eq!(
            check_err("def f() -> int { return 1.0; }"),
            SemanticError::TypeMismatch {
                context: MismatchContext::Return,
                expected: TypeKind::Int,
                found: TypeKind::Float,
            }
        );
        assert_eq!(check_err("return;"), SemanticError::ReturnOutsideFunction);
    }

    #[test]
    fn return_type_is_restored_after_function() {
        assert_eq!(
            check_err("def f() -> int { return 1; } return 2;"),
            SemanticError::ReturnOutsideFunction
        );
    }

    #[test]
    fn call_rules() {
        let prelude = "extern float scale(float x, int times); ";
        assert!(check(&format!("{}float y = scale(1.0, 2);", prelude)).is_ok());
        assert_eq!(
            check_err(&format!("{}float y = scale(1.0);", prelude)),
            SemanticError::ArgumentCount { name: "scale".into(), expected: 2, found: 1 }
        );
        assert_eq!(
            check_err(&format!("{}float y = scale(1.0, 2.0);", prelude)),
            SemanticError::TypeMismatch {
                context: MismatchContext::Argument { callee: "scale".into(), position: 1 },
                expected: TypeKind::Int,
                found: TypeKind::Float,
            }
        );
        assert_eq!(
            check_err(&format!("{}int y = scale(1.0, 2);", prelude)),
            SemanticError::TypeMismatch {
                context: MismatchContext::VariableDeclaration("y".into()),
                expected: TypeKind::Int,
                found: TypeKind::Float,
            }
        );
    }

    #[test]
    fn calling_a_parameter_is_rejected() {
        assert_eq!(
            check_err("def f(int a) { a(); }"),
            SemanticError::CallToNonFunction("a".into())
        );
    }

    #[test]
    fn assignment_rules() {
        assert!(check("int x; x = 5; int y = x = 6;").is_ok());
        assert_eq!(
            check_err("int x; x = true;"),
            SemanticError::TypeMismatch {
                context: MismatchContext::Assignment("x".into()),
                expected: TypeKind::Int,
                found: TypeKind::Bool,
            }
        );
        assert_eq!(
            check_err("def f() { } f = 1;"),
            SemanticError::AssignToFunction("f".into())
        );
    }

    #[test]
    fn void_values_cannot_be_operands() {
        assert!(check("extern log(); log();").is_ok());
        assert_eq!(
            check_err("extern log(); bool b = log() == log();"),
            SemanticError::VoidValue
        );
        assert_eq!(
            check_err("extern log(); int x = log();"),
            SemanticError::TypeMismatch {
                context: MismatchContext::VariableDeclaration("x".into()),
                expected: TypeKind::Int,
                found: TypeKind::Void,
            }
        );
    }

    #[test]
    fn extern_outside_root_scope_is_rejected() {
        let mut analyzer = SemanticAnalyzer::new();
        let decl = ExternDecl {
            name: "late".into(),
            params: Vec::new(),
            return_type: TypeKind::Void,
        };
        let result = analyzer.with_scope(|this| this.analyze_extern(&decl));
        assert_eq!(result, Err(SemanticError::ExternNotAtTopLevel("late".into())));
        assert!(analyzer.scopes.is_root());
    }

    #[test]
    fn scopes_are_released_on_error() {
        let mut analyzer = SemanticAnalyzer::new();
        let program = parse("def f() { { { int x = true; } } }").unwrap();
        assert!(analyzer.analyze_program(&program).is_err());
        assert!(analyzer.scopes.is_root());
    }
}
