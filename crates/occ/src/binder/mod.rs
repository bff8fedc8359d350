//! Name binding and type checking.
//!
//! One forward walk over the program. Function and struct symbols go into
//! global tables as their declarations are reached; each function body gets
//! its own [`Scope`]. The first violation aborts with a [`BindError`].
//!
//! Type comparisons are always `declared.equals(actual)`, which matters for
//! the asymmetric `any` type.

mod scope;
mod symbols;

use std::collections::HashMap;

use overcast_ast::{
    Block, Expr, FunctionDecl, IfStmt, MemberAccess, OcType, Program, Stmt, StructDecl,
    StructLayout,
};
use overcast_parser::PRINT_FUNCTION;

use crate::error::BindError;

pub use scope::Scope;
pub use symbols::{FunctionSymbol, StructSymbol, VariableSymbol};

type BindResult<T> = Result<T, BindError>;

fn fail<T>(message: impl Into<String>) -> BindResult<T> {
    Err(BindError::new(message))
}

pub struct Binder {
    functions: HashMap<String, FunctionSymbol>,
    structs: HashMap<String, StructSymbol>,
    scopes: Vec<Scope>,
    current_function: Option<String>,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// A binder that knows the built-in `print(format: string, ...) -> int`.
    pub fn new() -> Self {
        let mut functions = HashMap::new();
        functions.insert(
            PRINT_FUNCTION.to_string(),
            FunctionSymbol {
                name: PRINT_FUNCTION.to_string(),
                params: vec![VariableSymbol {
                    name: "format".to_string(),
                    ty: OcType::string(),
                }],
                return_type: OcType::int(),
                is_variadic: true,
            },
        );
        Self {
            functions,
            structs: HashMap::new(),
            scopes: Vec::new(),
            current_function: None,
        }
    }

    pub fn functions(&self) -> &HashMap<String, FunctionSymbol> {
        &self.functions
    }

    pub fn structs(&self) -> &HashMap<String, StructSymbol> {
        &self.structs
    }

    pub fn bind_program(&mut self, program: &Program) -> BindResult<()> {
        for stmt in &program.body {
            match stmt {
                Stmt::FunctionDeclaration(_) | Stmt::StructDeclaration(_) => self.bind_stmt(stmt)?,
                Stmt::Return(_) => return fail("Top-level returns are not supported."),
                other => {
                    return fail(format!(
                        "Only function and struct declarations are allowed at the top level, found a {}.",
                        other.kind_name()
                    ));
                }
            }
        }
        Ok(())
    }

    fn scope(&self) -> BindResult<&Scope> {
        match self.scopes.last() {
            Some(scope) => Ok(scope),
            None => fail("Statement is only valid inside a function body."),
        }
    }

    fn scope_mut(&mut self) -> BindResult<&mut Scope> {
        match self.scopes.last_mut() {
            Some(scope) => Ok(scope),
            None => fail("Statement is only valid inside a function body."),
        }
    }

    fn lookup_variable(&self, name: &str) -> BindResult<&VariableSymbol> {
        match self.scope()?.lookup(name) {
            Some(symbol) => Ok(symbol),
            None => fail(format!("Attempt to access undefined variable {name}.")),
        }
    }

    fn bind_stmt(&mut self, stmt: &Stmt) -> BindResult<()> {
        match stmt {
            Stmt::FunctionDeclaration(decl) => self.bind_function(decl),
            Stmt::StructDeclaration(decl) => self.bind_struct(decl),
            Stmt::VariableDeclaration(decl) => {
                self.check_value_type(&decl.ty, "variable", &decl.name)?;
                if self.scope()?.lookup(&decl.name).is_some() {
                    return fail(format!(
                        "Attempt to redeclare an already declared variable {}.",
                        decl.name
                    ));
                }
                self.bind_expr(&decl.value)?;
                let actual = self.infer_type(&decl.value)?;
                if !decl.ty.equals(&actual) {
                    return fail(format!(
                        "Variable type and value type mismatch: {} is declared {} but assigned {}.",
                        decl.name, decl.ty, actual
                    ));
                }
                self.scope_mut()?.declare(&decl.name, decl.ty.clone())
            }
            Stmt::VariableSet(set) => {
                let declared = self.lookup_variable(&set.name)?.ty.clone();
                self.bind_expr(&set.value)?;
                let actual = self.infer_type(&set.value)?;
                if !declared.equals(&actual) {
                    return fail(format!(
                        "Variable type and value type mismatch: {} is declared {} but assigned {}.",
                        set.name, declared, actual
                    ));
                }
                Ok(())
            }
            Stmt::StructMemberSet(set) => {
                self.scope()?;
                let declared = self.bind_member_access(&set.target)?;
                self.bind_expr(&set.value)?;
                let actual = self.infer_type(&set.value)?;
                if !declared.equals(&actual) {
                    return fail(format!(
                        "Member type and value type mismatch: {} is declared {} but assigned {}.",
                        set.target.member, declared, actual
                    ));
                }
                Ok(())
            }
            Stmt::If(stmt) => self.bind_if(stmt),
            Stmt::Return(ret) => {
                let Some(function) = self.current_function.clone() else {
                    return fail("Top-level returns are not supported.");
                };
                self.bind_expr(&ret.value)?;
                let actual = self.infer_type(&ret.value)?;
                let declared = &self.functions[&function].return_type;
                if !declared.equals(&actual) {
                    return fail(format!(
                        "Return/Function type mismatch. {function} returns {declared}, got {actual}."
                    ));
                }
                Ok(())
            }
            Stmt::Expression(expr) => {
                self.scope()?;
                self.bind_expr(expr)
            }
            Stmt::Block(block) => self.bind_block(block),
        }
    }

    fn bind_block(&mut self, block: &Block) -> BindResult<()> {
        block.stmts.iter().try_for_each(|stmt| self.bind_stmt(stmt))
    }

    fn bind_function(&mut self, decl: &FunctionDecl) -> BindResult<()> {
        if self.current_function.is_some() {
            return fail(format!(
                "Nested function declarations are not supported ({}).",
                decl.name
            ));
        }
        if self.functions.contains_key(&decl.name) {
            return fail(format!("Attempt to redeclare existing function {}.", decl.name));
        }
        if !decl.return_type.is_void() {
            self.check_value_type(&decl.return_type, "return", &decl.name)?;
        }
        let mut scope = Scope::default();
        for param in &decl.params {
            self.check_value_type(&param.ty, "parameter", &param.name)?;
            scope.declare(&param.name, param.ty.clone())?;
        }

        // Declared before the body so it can call itself.
        self.functions.insert(
            decl.name.clone(),
            FunctionSymbol {
                name: decl.name.clone(),
                params: decl
                    .params
                    .iter()
                    .map(|p| VariableSymbol {
                        name: p.name.clone(),
                        ty: p.ty.clone(),
                    })
                    .collect(),
                return_type: decl.return_type.clone(),
                is_variadic: false,
            },
        );

        self.scopes.push(scope);
        self.current_function = Some(decl.name.clone());
        let result = self.bind_block(&decl.body);
        self.current_function = None;
        self.scopes.pop();
        result
    }

    fn bind_struct(&mut self, decl: &StructDecl) -> BindResult<()> {
        if self.structs.contains_key(&decl.name) {
            return fail(format!("Attempt to redeclare existing struct {}.", decl.name));
        }
        if OcType::identifier(&decl.name).is_builtin() || decl.name == OcType::ANY {
            return fail(format!("Cannot declare a struct named after built-in type {}.", decl.name));
        }
        let layout = StructLayout::from_members(&decl.members);
        if layout.has_duplicates() {
            return fail(format!("Struct {} declares a member twice.", decl.name));
        }
        for member in &decl.members {
            if member.ty.pointer_depth() > 0 && member.ty.base_name() == decl.name {
                continue;
            }
            if member.ty == OcType::identifier(&decl.name) {
                return fail(format!(
                    "Struct {} cannot contain itself by value (member {}).",
                    decl.name, member.name
                ));
            }
            self.check_value_type(&member.ty, "member", &member.name)?;
        }
        self.structs.insert(
            decl.name.clone(),
            StructSymbol {
                name: decl.name.clone(),
                layout,
            },
        );
        Ok(())
    }

    fn bind_if(&mut self, stmt: &IfStmt) -> BindResult<()> {
        self.scope()?;
        self.bind_expr(&stmt.lhs)?;
        self.bind_expr(&stmt.rhs)?;
        let lhs = self.infer_type(&stmt.lhs)?;
        let rhs = self.infer_type(&stmt.rhs)?;
        if !lhs.equals(&rhs) {
            return fail(format!(
                "Attempted to compare incompatible types {lhs} and {rhs}."
            ));
        }
        if !(lhs.is_integer() || lhs == OcType::bool()) {
            return fail(format!("Attempted to compare values of non-integer type {lhs}."));
        }
        self.bind_block(&stmt.then_block)?;
        if let Some(else_block) = &stmt.else_block {
            self.bind_block(else_block)?;
        }
        Ok(())
    }

    /// Variables, parameters and members: a built-in other than `void`, or a
    /// declared struct, behind any number of pointers.
    fn check_value_type(&self, ty: &OcType, what: &str, name: &str) -> BindResult<()> {
        if ty.is_void() {
            return fail(format!("The {what} {name} cannot have type void."));
        }
        let base = ty.base_type();
        if base.is_builtin() || self.structs.contains_key(ty.base_name()) {
            return Ok(());
        }
        fail(format!("Unknown type {ty} for {what} {name}."))
    }

    fn bind_expr(&self, expr: &Expr) -> BindResult<()> {
        match expr {
            Expr::StringLiteral(_) | Expr::IntLiteral(_) => Ok(()),
            Expr::Variable(name) => self.lookup_variable(name).map(|_| ()),
            Expr::InvokeFunction(call) => {
                let Some(function) = self.functions.get(&call.name) else {
                    return fail(format!(
                        "Attempt to invoke/call invalid function {}.",
                        call.name
                    ));
                };
                let arity_ok = if function.is_variadic {
                    call.args.len() >= function.params.len()
                } else {
                    call.args.len() == function.params.len()
                };
                if !arity_ok {
                    return fail(format!(
                        "Argument/parameter count mismatch. {} expects {} argument(s), got {}.",
                        call.name,
                        function.params.len(),
                        call.args.len()
                    ));
                }
                for arg in &call.args {
                    self.bind_expr(arg)?;
                }
                // Variadic extras are not checked.
                for (param, arg) in function.params.iter().zip(&call.args) {
                    let actual = self.infer_type(arg)?;
                    if !param.ty.equals(&actual) {
                        return fail(format!(
                            "Argument type mismatch: parameter {} of {} is {}, got {}.",
                            param.name, call.name, param.ty, actual
                        ));
                    }
                }
                Ok(())
            }
            Expr::Binary(binary) => {
                self.bind_expr(&binary.lhs)?;
                self.bind_expr(&binary.rhs)?;
                let lhs = self.infer_type(&binary.lhs)?;
                let rhs = self.infer_type(&binary.rhs)?;
                if !lhs.equals(&rhs) || !lhs.is_integer() {
                    return fail(format!(
                        "Attempted to do arithmetics on incompatible types {lhs} {} {rhs}.",
                        binary.op.symbol()
                    ));
                }
                Ok(())
            }
            Expr::StructObjCreation(creation) => {
                let Some(symbol) = self.structs.get(&creation.struct_name) else {
                    return fail(format!("No such struct {} exists.", creation.struct_name));
                };
                if creation.args.len() != symbol.layout.len() {
                    return fail(format!(
                        "Struct {} has {} member(s) but {} value(s) were given.",
                        symbol.name,
                        symbol.layout.len(),
                        creation.args.len()
                    ));
                }
                for (member, arg) in symbol.layout.members().iter().zip(&creation.args) {
                    self.bind_expr(arg)?;
                    let actual = self.infer_type(arg)?;
                    if !member.ty.equals(&actual) {
                        return fail(format!(
                            "Member type and value type mismatch: {}.{} is {}, got {}.",
                            symbol.name, member.name, member.ty, actual
                        ));
                    }
                }
                Ok(())
            }
            Expr::StructMemberAccess(access) => self.bind_member_access(access).map(|_| ()),
            Expr::Reference(inner) => {
                if !inner.is_lvalue() {
                    return fail("Reference can only be taken of valid lvalues.");
                }
                self.bind_expr(inner)
            }
        }
    }

    /// Checks the access and returns the member's declared type.
    fn bind_member_access(&self, access: &MemberAccess) -> BindResult<OcType> {
        self.bind_expr(&access.object)?;
        let object_ty = self.infer_type(&access.object)?;
        let Some(symbol) = self.structs.get(object_ty.base_name()) else {
            return fail(format!(
                "Attempt to access member {} of non-struct type {object_ty}.",
                access.member
            ));
        };
        match symbol.member_type(&access.member) {
            Some(ty) => Ok(ty.clone()),
            None => fail(format!(
                "Attempt to access invalid member of struct {}: {}.",
                symbol.name, access.member
            )),
        }
    }

    /// The static type of an expression. Assumes the expression is bound.
    pub fn infer_type(&self, expr: &Expr) -> BindResult<OcType> {
        match expr {
            Expr::StringLiteral(_) => Ok(OcType::string()),
            Expr::IntLiteral(_) => Ok(OcType::int()),
            Expr::Variable(name) => Ok(self.lookup_variable(name)?.ty.clone()),
            Expr::InvokeFunction(call) => match self.functions.get(&call.name) {
                Some(function) => Ok(function.return_type.clone()),
                None => fail(format!(
                    "Attempt to invoke/call invalid function {}.",
                    call.name
                )),
            },
            // The left operand's type, never a widened one.
            Expr::Binary(binary) => self.infer_type(&binary.lhs),
            Expr::StructObjCreation(creation) => Ok(OcType::identifier(&creation.struct_name)),
            Expr::StructMemberAccess(access) => self.bind_member_access(access),
            Expr::Reference(inner) => Ok(OcType::pointer(self.infer_type(inner)?)),
        }
    }
}
