use pretty_assertions::assert_eq;

use rox::ast::{Expr, ExprId, Stmt};
use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::lox::scan;
use rox::parser::Parser;

fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let tokens = scan(source).expect("source should lex");
    Parser::new(&tokens).parse()
}

fn printed(source: &str) -> String {
    let statements = parse(source).expect("source should parse");
    AstPrinter::print_program(&statements)
}

#[test]
fn precedence_and_grouping() {
    assert_eq!(
        printed("print 1 + 2 * 3 - -(4 % 5);"),
        "(print (- (+ 1.0 (* 2.0 3.0)) (- (group (% 4.0 5.0)))))"
    );
}

#[test]
fn logical_operators_in_both_spellings() {
    assert_eq!(
        printed("a or b && c; a || b and c;"),
        "(; (or a (and b c)))\n(; (or a (and b c)))"
    );
}

#[test]
fn val_declares_like_var() {
    assert_eq!(printed("val x = \"hi\"; var y;"), "(var x hi)\n(var y)");
}

#[test]
fn for_loop_is_desugared_into_block_and_while() {
    assert_eq!(
        printed("for (var i = 0; i < 3; i = i + 1) print i;"),
        "(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
    );
}

#[test]
fn for_loop_without_clauses_loops_forever() {
    assert_eq!(printed("for (;;) print 1;"), "(while true (print 1.0))");
}

#[test]
fn functions_classes_and_properties() {
    let source = "\
fun add(a, b) { return a + b; }
class B < A {
  init(x) { this.x = x; }
  m() { return super.m(); }
}
print obj.field.method(1);
";

    assert_eq!(
        printed(source),
        "(fun add (a b) (block (return (+ a b))))\n\
         (class B < A (method init (x) (block (; (.= this x x)))) \
         (method m () (block (return (call (super m))))))\n\
         (print (call (. (. obj field) method) 1.0))"
    );
}

#[test]
fn every_occurrence_gets_its_own_id() {
    let statements = parse("x; x; x = 1;").expect("parses");

    let ids: Vec<ExprId> = statements
        .iter()
        .map(|stmt| match stmt {
            Stmt::Expression(Expr::Variable { id, .. }) => *id,
            Stmt::Expression(Expr::Assign { id, .. }) => *id,
            other => panic!("unexpected statement {:?}", other),
        })
        .collect();

    // The assignment target is first parsed as a variable, which uses up id 2.
    assert_eq!(ids, vec![ExprId(0), ExprId(1), ExprId(3)]);
}

#[test]
fn ids_continue_from_the_given_start() {
    let tokens = scan("a; this;").expect("lexes");
    let mut parser = Parser::with_first_id(&tokens, 10);
    let statements = parser.parse().expect("parses");

    match &statements[0] {
        Stmt::Expression(Expr::Variable { id, .. }) => assert_eq!(*id, ExprId(10)),
        other => panic!("unexpected statement {:?}", other),
    }
    assert_eq!(parser.next_id(), 12);
}

#[test]
fn invalid_assignment_target() {
    let errors = parse("1 = 2;").unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[ERROR]: [line 1] Invalid assignment target"
    );
}

#[test]
fn reports_every_syntax_error_after_recovering() {
    let errors = parse("var = 1;\nprint ;\nprint 2;").unwrap_err();

    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "[ERROR]: [line 1] Expected variable name",
            "[ERROR]: [line 2] Error at ';': Expected expression",
        ]
    );
}

#[test]
fn missing_expression_at_end() {
    let errors = parse("print").unwrap_err();

    assert_eq!(
        errors[0].to_string(),
        "[ERROR]: [line 1] Error at end: Expected expression"
    );
}

#[test]
fn too_many_arguments() {
    let arguments = vec!["1"; 256].join(", ");
    let errors = parse(&format!("f({});", arguments)).unwrap_err();

    assert!(errors[0]
        .to_string()
        .contains("Can't have more than 255 arguments"));
}
