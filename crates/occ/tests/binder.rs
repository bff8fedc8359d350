//! Name resolution and type-checking rules.

mod common;

use common::{bind_error, bind_source};
use occ::binder::Binder;
use overcast_ast::*;

fn assert_rejects(src: &str, expected: &str) {
    let message = bind_error(src);
    assert!(
        message.contains(expected),
        "expected `{expected}` in `{message}` for:\n{src}"
    );
}

fn main_returning(value: Expr) -> Program {
    Program {
        body: vec![Stmt::FunctionDeclaration(FunctionDecl {
            name: "main".into(),
            params: vec![],
            return_type: OcType::int(),
            body: Block {
                stmts: vec![Stmt::Return(ReturnStmt { value })],
            },
        })],
    }
}

#[test]
fn well_typed_program_binds() {
    let binder = bind_source(
        r#"
Point -> struct { x: int, y: int }
Node -> struct { value: int, next: Node* }

func fact(n: int) -> int {
    if (n == 0) {
        return 1
    }
    return n * fact(n - 1)
}

func main() -> int {
    let p: Point -> [Point]{1, 2}
    let q: Point -> p
    let r: Point* -> &p
    q -> x -> fact(5)
    print("%d %d\n", p -> x, q -> y)
    return q -> x
}
"#,
    )
    .expect("binds");
    assert!(binder.functions().contains_key("fact"));
    assert!(binder.structs().contains_key("Node"));
    assert_eq!(binder.structs()["Point"].layout.index_of("y"), Some(1));
}

#[test]
fn print_is_a_variadic_builtin() {
    let binder = Binder::new();
    let print = &binder.functions()["print"];
    assert!(print.is_variadic);
    assert_eq!(print.params.len(), 1);
    assert_eq!(print.params[0].ty, OcType::string());
    assert_eq!(print.return_type, OcType::int());
}

#[test]
fn top_level_statements_are_limited_to_declarations() {
    assert_rejects(
        "let x: int -> 1",
        "Only function and struct declarations are allowed at the top level, found a variable declaration.",
    );
    assert_rejects("return 1", "Top-level returns are not supported.");
}

#[test]
fn variable_rules() {
    assert_rejects(
        "func main() -> int { let x: int -> \"hi\"\n return 0 }",
        "Variable type and value type mismatch: x is declared int but assigned string.",
    );
    assert_rejects(
        "func main() -> int { let x: int -> 1\n let x: int -> 2\n return x }",
        "Attempt to redeclare an already declared variable x.",
    );
    assert_rejects(
        "func main() -> int { let x: int -> 1\n x -> \"s\"\n return x }",
        "Variable type and value type mismatch",
    );
    assert_rejects(
        "func main() -> int { let x: Missing -> 1\n return 0 }",
        "Unknown type Missing for variable x.",
    );
    assert_rejects(
        "func main() -> int { let x: void -> 1\n return 0 }",
        "The variable x cannot have type void.",
    );
}

#[test]
fn any_is_not_a_declarable_type() {
    assert_rejects(
        "func main() -> int { let x: any -> 1\n return 0 }",
        "Unknown type any for variable x.",
    );
}

#[test]
fn undefined_names_are_rejected() {
    let err = Binder::new()
        .bind_program(&main_returning(Expr::Variable("ghost".into())))
        .expect_err("ghost is undefined");
    assert_eq!(err.message, "Attempt to access undefined variable ghost.");

    let err = Binder::new()
        .bind_program(&main_returning(Expr::InvokeFunction(InvokeFunction {
            name: "later".into(),
            args: vec![],
        })))
        .expect_err("later is undefined");
    assert_eq!(err.message, "Attempt to invoke/call invalid function later.");
}

#[test]
fn function_rules() {
    assert_rejects(
        "func f() -> int { return 1 }\nfunc f() -> int { return 2 }",
        "Attempt to redeclare existing function f.",
    );
    assert_rejects(
        "func f() -> int { func g() -> int { return 1 }\n return 2 }",
        "Nested function declarations are not supported",
    );
    assert_rejects(
        "func f(a: int, a: int) -> int { return a }",
        "Attempt to redeclare an already declared variable a.",
    );
    assert_rejects(
        "func f(a: void) -> int { return 1 }",
        "The parameter a cannot have type void.",
    );
    assert_rejects(
        "func f(p: Missing) -> int { return 1 }",
        "Unknown type Missing for parameter p.",
    );
    assert_rejects(
        "func f() -> int { return \"no\" }",
        "Return/Function type mismatch. f returns int, got string.",
    );
}

#[test]
fn call_rules() {
    assert_rejects(
        "func f(a: int) -> int { return a }\nfunc main() -> int { return f(1, 2) }",
        "Argument/parameter count mismatch. f expects 1 argument(s), got 2.",
    );
    assert_rejects(
        "func f(a: int) -> int { return a }\nfunc main() -> int { return f(\"x\") }",
        "Argument type mismatch: parameter a of f is int, got string.",
    );
    assert_rejects(
        "func main() -> int { print()\n return 0 }",
        "Argument/parameter count mismatch.",
    );
    assert_rejects(
        "func main() -> int { print(1)\n return 0 }",
        "Argument type mismatch",
    );
    bind_source("func main() -> int { print(\"%d %s\\n\", 1, \"two\")\n return 0 }")
        .expect("variadic extras are unchecked");
}

#[test]
fn arithmetic_needs_matching_integers() {
    assert_rejects(
        "func main() -> int { let s: string -> \"a\" + \"b\"\n return 0 }",
        "Attempted to do arithmetics on incompatible types string + string.",
    );
    assert_rejects(
        "func main() -> int { return 1 - \"b\" }",
        "Attempted to do arithmetics on incompatible types int - string.",
    );
}

#[test]
fn comparisons_need_matching_integers() {
    assert_rejects(
        "func main() -> int { if (\"a\" == \"b\") { return 1 }\n return 0 }",
        "Attempted to compare values of non-integer type string.",
    );
    assert_rejects(
        "func main() -> int { if (1 < \"b\") { return 1 }\n return 0 }",
        "Attempted to compare incompatible types int and string.",
    );
}

#[test]
fn struct_declaration_rules() {
    assert_rejects(
        "P -> struct { x: int }\nP -> struct { y: int }",
        "Attempt to redeclare existing struct P.",
    );
    assert_rejects(
        "P -> struct { x: int, x: int }",
        "Struct P declares a member twice.",
    );
    assert_rejects(
        "Node -> struct { next: Node }",
        "Struct Node cannot contain itself by value (member next).",
    );
    assert_rejects(
        "P -> struct { q: Q }",
        "Unknown type Q for member q.",
    );

    let builtin = Program {
        body: vec![Stmt::StructDeclaration(StructDecl {
            name: "int".into(),
            members: vec![Parameter::new("x", OcType::int())],
        })],
    };
    let err = Binder::new().bind_program(&builtin).expect_err("int is built in");
    assert!(err.message.contains("built-in type int"), "{}", err.message);
}

#[test]
fn struct_usage_rules() {
    let point = "Point -> struct { x: int, y: int }\n";
    assert_rejects(
        &format!("{point}func main() -> int {{ let p: Point -> [Point]{{1}}\n return 0 }}"),
        "Struct Point has 2 member(s) but 1 value(s) were given.",
    );
    assert_rejects(
        &format!("{point}func main() -> int {{ let p: Point -> [Point]{{1, \"y\"}}\n return 0 }}"),
        "Member type and value type mismatch: Point.y is int, got string.",
    );
    assert_rejects(
        &format!("{point}func main() -> int {{ let p: Point -> [Point]{{1, 2}}\n return p -> z }}"),
        "Attempt to access invalid member of struct Point: z.",
    );
    assert_rejects(
        &format!(
            "{point}func main() -> int {{ let p: Point -> [Point]{{1, 2}}\n p -> x -> \"s\"\n return 0 }}"
        ),
        "Member type and value type mismatch: x is declared int but assigned string.",
    );
    assert_rejects(
        "func main() -> int { let n: int -> 1\n return n -> x }",
        "Attempt to access member x of non-struct type int.",
    );
}

#[test]
fn struct_literals_must_name_known_structs() {
    let program = main_returning(Expr::StructObjCreation(StructObjCreation {
        struct_name: "Ghost".into(),
        args: vec![Expr::IntLiteral(1)],
    }));
    let err = Binder::new().bind_program(&program).expect_err("no Ghost");
    assert_eq!(err.message, "No such struct Ghost exists.");
}

#[test]
fn references_need_lvalues() {
    assert_rejects(
        "func main() -> int { let r: int* -> &1\n return 0 }",
        "Reference can only be taken of valid lvalues.",
    );
    assert_rejects(
        "func main() -> int { let n: int -> 1\n let r: int** -> &n\n return 0 }",
        "Variable type and value type mismatch: r is declared int** but assigned int*.",
    );
}

#[test]
fn binary_type_is_the_left_operand_type() {
    let binder = bind_source("func main() -> int { return 1 }").expect("binds");
    let expr = Expr::Binary(BinaryExpr {
        lhs: Box::new(Expr::IntLiteral(1)),
        op: BinaryOp::Add,
        rhs: Box::new(Expr::IntLiteral(2)),
    });
    assert_eq!(binder.infer_type(&expr).expect("infers"), OcType::int());
}
