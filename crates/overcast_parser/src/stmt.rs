//! Statement productions.

use overcast_ast::{
    Block, Comparison, FunctionDecl, IfStmt, MemberAccess, Parameter, ReturnStmt, Stmt,
    StructDecl, StructMemberSet, VariableDecl, VariableSet,
};

use crate::tokenizer::TokenKind;
use crate::{ParseError, Parser};

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current().kind {
            TokenKind::Func => self.parse_function_decl(),
            TokenKind::Let => self.parse_variable_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Identifier => {
                // Order matters: all four productions may start with an identifier.
                if self.at_member_set() {
                    self.parse_member_set()
                } else if self.is_local(&self.current().text) {
                    self.parse_variable_set()
                } else if self.at_struct_decl() {
                    self.parse_struct_decl()
                } else {
                    Ok(Stmt::Expression(self.parse_expression()?))
                }
            }
            _ => Err(ParseError::syntax(
                format!("unexpected `{}` at start of statement", self.current().text),
                self.current(),
            )),
        }
    }

    /// `local -> member -> ...`
    fn at_member_set(&self) -> bool {
        self.is_local(&self.current().text)
            && self.peek(1).is(TokenKind::Arrow, "->")
            && self.peek(2).kind == TokenKind::Identifier
            && self.peek(3).kind == TokenKind::Arrow
    }

    /// `Name -> struct`
    fn at_struct_decl(&self) -> bool {
        self.peek(1).kind == TokenKind::Arrow && self.peek(2).kind == TokenKind::Struct
    }

    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.consume_value(TokenKind::Symbol, "{")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::Symbol, "}") {
            if self.current().kind == TokenKind::Eof {
                return Err(ParseError::mismatched("SYMBOL `}`", self.current()));
            }
            stmts.push(self.parse_statement()?);
        }
        self.consume_value(TokenKind::Symbol, "}")?;
        Ok(Block { stmts })
    }

    fn parse_function_decl(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::Func)?;
        let name = self.consume(TokenKind::Identifier)?.text;

        self.push_scope();
        self.consume_value(TokenKind::Symbol, "(")?;
        let mut params = Vec::new();
        while !self.check(TokenKind::Symbol, ")") {
            let param = self.parse_parameter()?;
            self.declare_local(&param.name);
            params.push(param);
            if !self.check(TokenKind::Symbol, ")") {
                self.consume_value(TokenKind::Symbol, ",")?;
            }
        }
        self.consume_value(TokenKind::Symbol, ")")?;
        self.consume_value(TokenKind::Arrow, "->")?;
        let return_type = self.parse_type()?;

        // Registered before the body so the function can call itself.
        self.functions.insert(name.clone());
        let body = self.parse_block()?;
        self.pop_scope();

        Ok(Stmt::FunctionDeclaration(FunctionDecl {
            name,
            params,
            return_type,
            body,
        }))
    }

    /// `name: Type`
    pub(crate) fn parse_parameter(&mut self) -> Result<Parameter, ParseError> {
        let name = self.consume(TokenKind::Identifier)?.text;
        self.consume_value(TokenKind::Symbol, ":")?;
        let ty = self.parse_type()?;
        Ok(Parameter { name, ty })
    }

    fn parse_variable_decl(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::Let)?;
        let name = self.consume(TokenKind::Identifier)?.text;
        self.consume_value(TokenKind::Symbol, ":")?;
        let ty = self.parse_type()?;
        self.consume(TokenKind::Arrow)?;
        let value = self.parse_expression()?;
        self.declare_local(&name);
        Ok(Stmt::VariableDeclaration(VariableDecl { name, ty, value }))
    }

    fn parse_variable_set(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Identifier)?.text;
        self.consume(TokenKind::Arrow)?;
        let value = self.parse_expression()?;
        Ok(Stmt::VariableSet(VariableSet { name, value }))
    }

    fn parse_member_set(&mut self) -> Result<Stmt, ParseError> {
        let object = self.consume(TokenKind::Identifier)?.text;
        self.consume_value(TokenKind::Arrow, "->")?;
        let member = self.consume(TokenKind::Identifier)?.text;
        self.consume(TokenKind::Arrow)?;
        let value = self.parse_expression()?;
        Ok(Stmt::StructMemberSet(StructMemberSet {
            target: MemberAccess {
                object: Box::new(overcast_ast::Expr::Variable(object)),
                member,
            },
            value,
        }))
    }

    fn parse_struct_decl(&mut self) -> Result<Stmt, ParseError> {
        let name_token = self.consume(TokenKind::Identifier)?;
        self.consume(TokenKind::Arrow)?;
        self.consume(TokenKind::Struct)?;
        self.consume_value(TokenKind::Symbol, "{")?;
        let mut members = Vec::new();
        while !self.check(TokenKind::Symbol, "}") {
            members.push(self.parse_parameter()?);
            self.eat_comma();
        }
        if members.is_empty() {
            return Err(ParseError::syntax(
                format!("struct `{}` must declare at least one member", name_token.text),
                &name_token,
            ));
        }
        self.consume_value(TokenKind::Symbol, "}")?;
        self.structs.insert(name_token.text.clone());
        Ok(Stmt::StructDeclaration(StructDecl {
            name: name_token.text,
            members,
        }))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::If)?;
        self.consume_value(TokenKind::Symbol, "(")?;
        let lhs = self.parse_expression()?;
        let op = match Comparison::from_symbol(&self.current().text) {
            Some(op) if self.current().kind == TokenKind::Operator => op,
            _ => return Err(ParseError::mismatched("comparison operator", self.current())),
        };
        self.advance();
        let rhs = self.parse_expression()?;
        self.consume_value(TokenKind::Symbol, ")")?;
        let then_block = self.parse_block()?;
        let else_block = if self.current().kind == TokenKind::Else {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            lhs,
            op,
            rhs,
            then_block,
            else_block,
        }))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::Return)?;
        let value = self.parse_expression()?;
        Ok(Stmt::Return(ReturnStmt { value }))
    }
}
