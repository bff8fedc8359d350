use overcast_ast::*;
use overcast_parser::tokenizer::{TokenKind, tokenize};
use overcast_parser::{ParseError, Parser, parse_source, parse_type_str};

fn parse(src: &str) -> Program {
    parse_source(src).unwrap_or_else(|e| panic!("parse failed: {e}"))
}

fn function<'a>(program: &'a Program, name: &str) -> &'a FunctionDecl {
    program
        .body
        .iter()
        .find_map(|stmt| match stmt {
            Stmt::FunctionDeclaration(f) if f.name == name => Some(f),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function {name}"))
}

#[test]
fn parsing_is_idempotent() {
    let src = r#"
        Point -> struct { x: int, y: int }
        func add(a: int, b: int) -> int { return a + b * 2 }
        func main() -> int {
            let p: Point -> [Point]{1, 2}
            p -> x -> add(p -> x, 3)
            print("%d\n", p -> y)
            return 0
        }
    "#;
    let tokens = tokenize(src).unwrap();
    let first = Parser::new(tokens.clone()).parse_program().unwrap();
    let second = Parser::new(tokens).parse_program().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.body.len(), 3);
}

#[test]
fn function_declaration_shape() {
    let program = parse("func add(a: int, b: int) -> int { return a + b }");
    let add = function(&program, "add");
    assert_eq!(
        add.params,
        vec![
            Parameter::new("a", OcType::int()),
            Parameter::new("b", OcType::int())
        ]
    );
    assert_eq!(add.return_type, OcType::int());
    assert_eq!(
        add.body.stmts,
        vec![Stmt::Return(ReturnStmt {
            value: Expr::Binary(BinaryExpr {
                lhs: Box::new(Expr::Variable("a".into())),
                op: BinaryOp::Add,
                rhs: Box::new(Expr::Variable("b".into())),
            })
        })]
    );
}

#[test]
fn multiplication_binds_tighter_and_operators_are_left_associative() {
    let program = parse("func f(a: int, b: int, c: int) -> int { return a - b - c * 2 }");
    let Stmt::Return(ret) = &function(&program, "f").body.stmts[0] else {
        panic!("expected return");
    };
    // ((a - b) - (c * 2))
    let Expr::Binary(outer) = &ret.value else {
        panic!("expected binary");
    };
    assert_eq!(outer.op, BinaryOp::Sub);
    assert!(matches!(&*outer.lhs, Expr::Binary(inner) if inner.op == BinaryOp::Sub));
    assert!(matches!(&*outer.rhs, Expr::Binary(inner) if inner.op == BinaryOp::Mul));
}

#[test]
fn statement_disambiguation_uses_scope() {
    let src = r#"
        Point -> struct { x: int y: int }
        func main() -> int {
            let p: Point -> [Point]{1, 2}
            let n: int -> 0
            n -> n + 1
            let m: int -> p -> x
            p -> y -> 7
            print("hi")
            return n
        }
    "#;
    let program = parse(src);
    assert!(matches!(&program.body[0], Stmt::StructDeclaration(s) if s.members.len() == 2));
    let stmts = &function(&program, "main").body.stmts;
    assert!(matches!(&stmts[2], Stmt::VariableSet(set)
        if set.name == "n" && matches!(&set.value, Expr::Binary(_))));
    assert!(matches!(&stmts[3], Stmt::VariableDeclaration(decl)
        if matches!(&decl.value, Expr::StructMemberAccess(m) if m.member == "x")));
    assert!(matches!(&stmts[4], Stmt::StructMemberSet(set)
        if set.target.member == "y" && set.value == Expr::IntLiteral(7)));
    assert!(matches!(&stmts[5], Stmt::Expression(Expr::InvokeFunction(call)) if call.name == "print"));
}

#[test]
fn pointer_types_and_references() {
    let program = parse(
        "func f(p: int**) -> int* { let q: int* -> &p return q }",
    );
    let f = function(&program, "f");
    assert_eq!(
        f.params[0].ty,
        OcType::pointer(OcType::pointer(OcType::int()))
    );
    assert_eq!(f.return_type, OcType::pointer(OcType::int()));
    assert!(matches!(&f.body.stmts[0], Stmt::VariableDeclaration(decl)
        if decl.value == Expr::Reference(Box::new(Expr::Variable("p".into())))));
}

#[test]
fn pointer_type_round_trips_through_text() {
    let ty = OcType::pointer(OcType::pointer(OcType::int()));
    assert_eq!(ty.to_string(), "int**");
    assert_eq!(parse_type_str(&ty.to_string()).unwrap(), ty);
    assert_eq!(parse_type_str("Point").unwrap(), OcType::identifier("Point"));
}

#[test]
fn if_else_parses_comparison() {
    let program =
        parse("func max(a: int, b: int) -> int { if (a >= b) { return a } else { return b } }");
    let Stmt::If(stmt) = &function(&program, "max").body.stmts[0] else {
        panic!("expected if");
    };
    assert_eq!(stmt.op, Comparison::Ge);
    assert_eq!(stmt.then_block.stmts.len(), 1);
    assert!(stmt.else_block.is_some());
}

#[test]
fn parameters_do_not_leak_into_later_functions() {
    let err = parse_source("func f(a: int) -> int { return a } func g() -> int { return a }")
        .unwrap_err();
    assert!(matches!(err, ParseError::NoExpression { ref found, .. } if found == "a"));
}

#[test]
fn recursion_is_recognized_but_forward_calls_are_not() {
    parse("func fact(n: int) -> int { return n * fact(n - 1) }");
    let err = parse_source("func a() -> int { return b() } func b() -> int { return 1 }")
        .unwrap_err();
    assert!(matches!(err, ParseError::NoExpression { .. }));
}

#[test]
fn mismatched_token_reports_position() {
    let err = parse_source("func main() -> int {\n  let x int -> 1\n}").unwrap_err();
    match err {
        ParseError::MismatchedToken {
            found_kind,
            found,
            line,
            column,
            ..
        } => {
            assert_eq!(found_kind, TokenKind::Identifier);
            assert_eq!(found, "int");
            assert_eq!((line, column), (2, 9));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn empty_struct_literal_is_rejected() {
    let err = parse_source(
        "Point -> struct { x: int } func main() -> int { let p: Point -> [Point]{} return 0 }",
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::Syntax { ref message, .. } if message.contains("at least one value")));
}

#[test]
fn empty_struct_declaration_is_rejected() {
    assert!(parse_source("Empty -> struct { }").is_err());
}

#[test]
fn lex_errors_surface_through_parse() {
    let err = parse_source("func main() -> int { return 1 ~ 2 }").unwrap_err();
    assert!(matches!(err, ParseError::Lex(_)));
    assert_eq!(err.position(), (1, 31));
}

#[test]
fn negative_literals_and_subtraction() {
    let program = parse("func f(a: int) -> int { let b: int -> -5 return a - 1 }");
    let f = function(&program, "f");
    assert!(matches!(&f.body.stmts[0], Stmt::VariableDeclaration(d) if d.value == Expr::IntLiteral(-5)));
    assert!(matches!(&f.body.stmts[1], Stmt::Return(r)
        if matches!(&r.value, Expr::Binary(b) if b.op == BinaryOp::Sub)));
}

#[test]
fn oversized_integer_literal_is_rejected() {
    let err = parse_source("func f() -> int { return 99999999999 }").unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}
