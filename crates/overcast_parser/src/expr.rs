//! Expression productions and binary precedence climbing.

use overcast_ast::{BinaryExpr, BinaryOp, Expr, InvokeFunction, MemberAccess, StructObjCreation};

use crate::tokenizer::{Token, TokenKind};
use crate::{ParseError, Parser};

struct OperatorInfo {
    symbol: &'static str,
    op: BinaryOp,
    precedence: u8,
}

const OPERATORS: [OperatorInfo; 4] = [
    OperatorInfo {
        symbol: "+",
        op: BinaryOp::Add,
        precedence: 1,
    },
    OperatorInfo {
        symbol: "-",
        op: BinaryOp::Sub,
        precedence: 1,
    },
    OperatorInfo {
        symbol: "*",
        op: BinaryOp::Mul,
        precedence: 2,
    },
    OperatorInfo {
        symbol: "/",
        op: BinaryOp::Div,
        precedence: 2,
    },
];

/// `*` is lexed as a symbol, the rest as operators.
fn binary_operator(token: &Token) -> Option<&'static OperatorInfo> {
    if !matches!(token.kind, TokenKind::Operator | TokenKind::Symbol) {
        return None;
    }
    OPERATORS.iter().find(|info| info.symbol == token.text)
}

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(0)
    }

    /// Every binary operator is left-associative.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_primary()?;
        while let Some(info) = binary_operator(self.current()) {
            if info.precedence < min_precedence {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(info.precedence + 1)?;
            lhs = Expr::Binary(BinaryExpr {
                lhs: Box::new(lhs),
                op: info.op,
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Str => {
                self.advance();
                Ok(Expr::StringLiteral(token.text))
            }
            TokenKind::Integer => {
                self.advance();
                let value = token.text.parse::<i32>().map_err(|_| {
                    ParseError::syntax(
                        format!("integer literal `{}` does not fit in int", token.text),
                        &token,
                    )
                })?;
                Ok(Expr::IntLiteral(value))
            }
            TokenKind::Operator if token.text == "&" => {
                self.advance();
                Ok(Expr::Reference(Box::new(self.parse_primary()?)))
            }
            TokenKind::Symbol if token.text == "[" => self.parse_struct_creation(),
            TokenKind::Identifier if self.functions.contains(&token.text) => {
                self.parse_invocation()
            }
            TokenKind::Identifier if self.is_local(&token.text) => {
                self.advance();
                if self.check(TokenKind::Arrow, "->") {
                    self.advance();
                    let member = self.consume(TokenKind::Identifier)?.text;
                    Ok(Expr::StructMemberAccess(MemberAccess {
                        object: Box::new(Expr::Variable(token.text)),
                        member,
                    }))
                } else {
                    Ok(Expr::Variable(token.text))
                }
            }
            _ => Err(ParseError::no_expression(&token)),
        }
    }

    /// `name(arg, arg)`
    fn parse_invocation(&mut self) -> Result<Expr, ParseError> {
        let name = self.consume(TokenKind::Identifier)?.text;
        self.consume_value(TokenKind::Symbol, "(")?;
        let mut args = Vec::new();
        while !self.check(TokenKind::Symbol, ")") {
            args.push(self.parse_expression()?);
            self.eat_comma();
        }
        self.consume_value(TokenKind::Symbol, ")")?;
        Ok(Expr::InvokeFunction(InvokeFunction { name, args }))
    }

    /// `[Name]{ value, value }`
    fn parse_struct_creation(&mut self) -> Result<Expr, ParseError> {
        self.consume_value(TokenKind::Symbol, "[")?;
        let name_token = self.consume(TokenKind::Identifier)?;
        self.consume_value(TokenKind::Symbol, "]")?;
        self.consume_value(TokenKind::Symbol, "{")?;
        let mut args = Vec::new();
        while !self.check(TokenKind::Symbol, "}") {
            args.push(self.parse_expression()?);
            self.eat_comma();
        }
        if args.is_empty() {
            return Err(ParseError::syntax(
                format!(
                    "struct literal for `{}` requires at least one value",
                    name_token.text
                ),
                &name_token,
            ));
        }
        self.consume_value(TokenKind::Symbol, "}")?;
        Ok(Expr::StructObjCreation(StructObjCreation {
            struct_name: name_token.text,
            args,
        }))
    }
}
