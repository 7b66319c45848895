mod common;

use pretty_assertions::assert_eq;

use common::{errors_of, output_of, run};
use rox::error::{LoxError, RuntimeError};

fn runtime_error(source: &str) -> RuntimeError {
    let mut errors = errors_of(source);
    assert_eq!(errors.len(), 1, "a runtime error is reported alone");
    match errors.remove(0) {
        LoxError::Runtime(e) => e,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

// ── expressions ──────────────────────────────────────────────────────

#[test]
fn arithmetic_and_number_formatting() {
    assert_eq!(
        output_of("print 1 + 2; print 7 / 2; print -3 * 2; print +4; print 0.1 + 0.2 == 0.3;"),
        vec!["3", "3.5", "-6", "4", "false"]
    );
}

#[test]
fn modulo_takes_the_sign_of_the_divisor() {
    assert_eq!(
        output_of("print 7 % 3; print -7 % 3; print 7 % -3; print 5.5 % 2;"),
        vec!["1", "2", "-2", "1.5"]
    );
}

#[test]
fn division_by_zero_follows_floating_point() {
    assert_eq!(output_of("print 1 / 0; print -1 / 0;"), vec!["inf", "-inf"]);
}

#[test]
fn string_concatenation_and_equality() {
    assert_eq!(
        output_of(
            "print \"a\" + \"b\";
             print \"a\" == \"a\";
             print 1 == \"1\";
             print nil == nil;
             print nil == false;
             print 2 >= 2;"
        ),
        vec!["ab", "true", "false", "true", "false", "true"]
    );
}

#[test]
fn mixed_addition_is_an_error() {
    for source in ["print 1 + \"a\";", "print \"a\" + 1;"] {
        assert_eq!(
            runtime_error(source),
            RuntimeError::TypeMismatch {
                message: "Operands must be two numbers or two strings.".into(),
                line: 1
            }
        );
    }
}

#[test]
fn comparison_needs_numbers() {
    assert_eq!(
        runtime_error("print \"a\" < \"b\";").to_string(),
        "Operands must be numbers. [line 1]"
    );
}

#[test]
fn unary_operand_types() {
    assert_eq!(output_of("print !true; print !!false;"), vec!["false", "false"]);

    assert_eq!(
        runtime_error("print !1;").to_string(),
        "Operand must be a boolean. [line 1]"
    );
    assert_eq!(
        runtime_error("print -\"x\";").to_string(),
        "Operand must be a number. [line 1]"
    );
}

#[test]
fn truthiness() {
    assert_eq!(
        output_of(
            "if (0) print \"zero\";
             if (\"\") print \"empty\";
             if (nil) print \"nil\"; else print \"not nil\";
             if (false) print \"false\"; else print \"not false\";"
        ),
        vec!["zero", "empty", "not nil", "not false"]
    );
}

#[test]
fn logical_operators_short_circuit_and_return_operands() {
    assert_eq!(
        output_of(
            "print nil or \"default\";
             print 1 and 2;
             print false && missing();
             print true || missing();"
        ),
        vec!["default", "2", "false", "true"]
    );
}

// ── statements and scope ────────────────────────────────────────────

#[test]
fn block_scoping_shadows_and_restores() {
    assert_eq!(
        output_of("var a = 1; { var a = 2; print a; } print a;"),
        vec!["2", "1"]
    );
}

#[test]
fn assignment_reaches_the_enclosing_scope() {
    assert_eq!(
        output_of("var a = 1; { a = 2; val b = a = 3; print b; } print a;"),
        vec!["3", "3"]
    );
}

#[test]
fn uninitialized_variables_are_nil() {
    assert_eq!(output_of("var a; print a;"), vec!["nil"]);
}

#[test]
fn undefined_variables() {
    assert_eq!(
        runtime_error("print nope;"),
        RuntimeError::UndefinedVariable {
            name: "nope".into(),
            line: 1
        }
    );
    assert_eq!(
        runtime_error("\nnope = 1;").to_string(),
        "Undefined variable 'nope'. [line 2]"
    );
}

#[test]
fn fresh_global_initialized_from_itself_is_undefined_at_runtime() {
    assert_eq!(
        runtime_error("var a = a;"),
        RuntimeError::UndefinedVariable {
            name: "a".into(),
            line: 1
        }
    );
}

#[test]
fn while_and_for_loops() {
    assert_eq!(
        output_of(
            "var i = 0; while (i < 3) { print i; i = i + 1; }
             for (var j = 0; j < 2; j = j + 1) print j;"
        ),
        vec!["0", "1", "2", "0", "1"]
    );
}

#[test]
fn output_before_a_runtime_error_is_kept() {
    let (output, result) = run("print 1; print nope; print 2;");

    assert_eq!(output, "1\n");
    let errors = result.unwrap_err();
    assert_eq!(errors[0].exit_code(), 70);
}

#[test]
fn static_errors_prevent_any_execution() {
    let (output, result) = run("print 1; return 2;");

    assert_eq!(output, "");
    assert_eq!(result.unwrap_err()[0].exit_code(), 65);
}

// ── functions and closures ───────────────────────────────────────────

#[test]
fn functions_return_values_and_nil() {
    assert_eq!(
        output_of(
            "fun add(a, b) { return a + b; }
             fun nothing() {}
             fun early() { return; print \"unreachable\"; }
             print add(1, 2);
             print nothing();
             print early();
             print add;
             print clock;"
        ),
        vec!["3", "nil", "nil", "<fn add>", "<native fn clock>"]
    );
}

#[test]
fn recursion() {
    assert_eq!(
        output_of(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
             print fib(15);"
        ),
        vec!["610"]
    );
}

#[test]
fn closures_keep_independent_state() {
    assert_eq!(
        output_of(
            "fun makeCounter() {
               var count = 0;
               fun counter() { count = count + 1; return count; }
               return counter;
             }
             var a = makeCounter();
             var b = makeCounter();
             print a(); print a(); print b(); print a();"
        ),
        vec!["1", "2", "1", "3"]
    );
}

#[test]
fn closures_bind_lexically() {
    assert_eq!(
        output_of(
            "var a = \"global\";
             {
               fun show() { print a; }
               show();
               var a = \"block\";
               show();
             }"
        ),
        vec!["global", "global"]
    );
}

#[test]
fn return_unwinds_through_loops_and_blocks() {
    assert_eq!(
        output_of(
            "fun find() {
               for (var i = 0; i < 10; i = i + 1) {
                 { if (i == 4) return i; }
               }
               return -1;
             }
             print find();
             var after = \"scope restored\";
             print after;"
        ),
        vec!["4", "scope restored"]
    );
}

#[test]
fn arity_is_checked() {
    assert_eq!(
        runtime_error("fun f(a, b) {} f(1);"),
        RuntimeError::ArityMismatch {
            expected: 2,
            got: 1,
            line: 1
        }
    );
    assert_eq!(
        runtime_error("fun none() {} none(1);"),
        RuntimeError::ArityMismatch {
            expected: 0,
            got: 1,
            line: 1
        }
    );
    assert_eq!(
        runtime_error("clock(1);").to_string(),
        "Expected 0 arguments but got 1. [line 1]"
    );
}

#[test]
fn only_functions_and_classes_are_callable() {
    assert_eq!(
        runtime_error("\"text\"();"),
        RuntimeError::NotCallable { line: 1 }
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(
        output_of("var t = clock(); print t > 1000000000; print clock() >= t;"),
        vec!["true", "true"]
    );
}

// ── classes ──────────────────────────────────────────────────────────

#[test]
fn instances_fields_and_methods() {
    assert_eq!(
        output_of(
            "class Point {
               init(x, y) { this.x = x; this.y = y; }
               sum() { return this.x + this.y; }
             }
             var p = Point(1, 2);
             print p.sum();
             p.x = 10;
             print p.sum();
             print Point;
             print p;"
        ),
        vec!["3", "12", "Point", "Point instance"]
    );
}

#[test]
fn bound_methods_remember_their_instance() {
    assert_eq!(
        output_of(
            "class Cat { init(name) { this.name = name; } speak() { print this.name; } }
             var speak = Cat(\"tom\").speak;
             speak();"
        ),
        vec!["tom"]
    );
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        output_of(
            "class A { m() { return \"method\"; } }
             var a = A();
             print a.m();
             a.m = \"field\";
             print a.m;"
        ),
        vec!["method", "field"]
    );
}

#[test]
fn initializer_returns_the_instance() {
    assert_eq!(
        output_of(
            "class A { init() { this.v = 1; return; } }
             var a = A();
             print a.init() == a;
             print a.v;"
        ),
        vec!["true", "1"]
    );
}

#[test]
fn class_arity_comes_from_init() {
    assert_eq!(
        runtime_error("class A { init(x) {} } A();"),
        RuntimeError::ArityMismatch {
            expected: 1,
            got: 0,
            line: 1
        }
    );
    assert_eq!(
        runtime_error("class B {} B(1);").to_string(),
        "Expected 0 arguments but got 1. [line 1]"
    );
}

#[test]
fn inherited_initializer_chain() {
    assert_eq!(
        output_of(
            "class A { init() { this.x = 1; } }
             class B < A { init() { super.init(); this.y = 2; } }
             var b = B();
             print b.x;
             print b.y;"
        ),
        vec!["1", "2"]
    );
}

#[test]
fn super_dispatches_to_the_superclass_method() {
    assert_eq!(
        output_of(
            "class A { name() { return \"A\"; } greet() { return \"hi \" + this.name(); } }
             class B < A { name() { return \"B\"; } greet() { return super.greet() + \"!\"; } }
             class C < B {}
             print C().greet();
             print B().name();"
        ),
        vec!["hi B!", "B"]
    );
}

#[test]
fn super_resolves_statically_not_through_this() {
    assert_eq!(
        output_of(
            "class A { m() { return \"A\"; } }
             class B < A { m() { return \"B\" + super.m(); } }
             class C < B { m() { return \"C\" + super.m(); } }
             print C().m();"
        ),
        vec!["CBA"]
    );
}

#[test]
fn superclass_must_be_a_class() {
    assert_eq!(
        runtime_error("var NotClass = 1; class A < NotClass {}").to_string(),
        "Superclass must be a class. [line 1]"
    );
}

#[test]
fn property_errors() {
    assert_eq!(
        runtime_error("class A {} print A().missing;"),
        RuntimeError::UndefinedProperty {
            name: "missing".into(),
            line: 1
        }
    );
    assert_eq!(
        runtime_error("var s = \"str\"; print s.length;"),
        RuntimeError::NotAnInstance { line: 1 }
    );
    assert_eq!(
        runtime_error("var n = 1; n.x = 2;"),
        RuntimeError::NotAnInstance { line: 1 }
    );
    assert_eq!(
        runtime_error("class A {} class B < A { m() { return super.m(); } } B().m();")
            .to_string(),
        "Undefined property 'm'. [line 1]"
    );
}

#[test]
#[should_panic(expected = "do not hold a class and an instance")]
fn super_slots_with_wrong_kinds_of_value_panic() {
    use std::collections::HashMap;

    use rox::ast::{Expr, ExprId, Identifier, LiteralValue, Stmt};
    use rox::interpreter::Interpreter;

    // No parsed program can put a number where `super` and `this` live, so
    // the tree is built by hand.
    let var = |name: &str, n: f64| Stmt::Var {
        name: Identifier::new(name, 1),
        initializer: Some(Expr::Literal(LiteralValue::Number(n))),
    };
    let program = vec![Stmt::Block(vec![
        var("super", 1.0),
        Stmt::Block(vec![
            var("this", 2.0),
            Stmt::Expression(Expr::Super {
                id: ExprId(0),
                line: 1,
                method: Identifier::new("m", 1),
            }),
        ]),
    ])];

    let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));
    interpreter.resolve(HashMap::from([(ExprId(0), 1)]));
    let _ = interpreter.interpret(&program);
}
