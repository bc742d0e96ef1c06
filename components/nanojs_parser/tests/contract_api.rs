//! Contract tests for the parser API
//!
//! These tests verify the public lexing and parsing surface: token span
//! laws, the end-to-end parse shapes, boundary behaviors, and the exact
//! error messages.

use nanojs_core::ErrorKind;
use nanojs_parser::ast::{
    AssignmentTarget, BinaryOperator, Expression, ForInit, ObjectMember, Pattern, Statement,
    VariableKind,
};
use nanojs_parser::{parse, parse_expression, pattern, Lexer, ParserOptions, TokenKind};

fn parse_ok(source: &str) -> nanojs_parser::Program {
    parse(source, ParserOptions::default()).unwrap()
}

fn expr_ok(source: &str) -> Expression {
    parse_expression(source, ParserOptions::default()).unwrap()
}

// =============================================================================
// Lexer Contract Tests
// =============================================================================

#[test]
fn test_token_spans_are_ordered_and_half_open() {
    let tokens = Lexer::new("let x = y >>> 2;").tokenize().unwrap();
    for token in &tokens {
        let span = token.span.as_ref().unwrap();
        assert!(span.start.offset <= span.end.offset);
    }
    for pair in tokens.windows(2) {
        let first = pair[0].span.as_ref().unwrap();
        let second = pair[1].span.as_ref().unwrap();
        assert!(first.end.offset <= second.start.offset);
    }
}

#[test]
fn test_token_end_is_cursor_after_consumption() {
    let tokens = Lexer::new("ab  cd").tokenize().unwrap();
    let ab = tokens[0].span.as_ref().unwrap();
    assert_eq!(ab.start.offset, 0);
    assert_eq!(ab.end.offset, 2);
    let cd = tokens[1].span.as_ref().unwrap();
    assert_eq!(cd.start.offset, 4);
    assert_eq!(cd.end.offset, 6);
}

#[test]
fn test_last_token_is_eof() {
    for source in ["", "x", "let a = 1;", "a + b * c"] {
        let tokens = Lexer::new(source).tokenize().unwrap();
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1
        );
    }
}

#[test]
fn test_greedy_operator_disambiguation() {
    let tokens = Lexer::new("a >>>= b >> c > d").tokenize().unwrap();
    let values: Vec<&str> = tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Punctuator(_)))
        .map(|t| t.value.as_str())
        .collect();
    assert_eq!(values, vec![">>>=", ">>", ">"]);
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_scenario_var_declaration() {
    let program = parse_ok("var x = 1;");
    assert_eq!(program.body.len(), 1);
    let Statement::VariableDeclaration {
        kind, declarations, ..
    } = &program.body[0]
    else {
        panic!("expected variable declaration");
    };
    assert_eq!(*kind, VariableKind::Var);
    assert_eq!(declarations.len(), 1);
    assert!(matches!(
        declarations[0].id,
        Pattern::Identifier { ref name, .. } if name == "x"
    ));
    assert!(matches!(
        declarations[0].init,
        Some(Expression::NumericLiteral { value, .. }) if value == 1.0
    ));
}

#[test]
fn test_scenario_precedence() {
    let program = parse_ok("1 + 2 * 3");
    let Statement::ExpressionStatement { expression, .. } = &program.body[0] else {
        panic!("expected expression statement");
    };
    let Expression::BinaryExpression {
        operator,
        left,
        right,
        ..
    } = expression
    else {
        panic!("expected binary expression");
    };
    assert_eq!(*operator, BinaryOperator::Add);
    assert!(matches!(**left, Expression::NumericLiteral { value, .. } if value == 1.0));
    let Expression::BinaryExpression {
        operator: inner,
        left: inner_left,
        right: inner_right,
        ..
    } = &**right
    else {
        panic!("expected nested binary expression");
    };
    assert_eq!(*inner, BinaryOperator::Mul);
    assert!(matches!(**inner_left, Expression::NumericLiteral { value, .. } if value == 2.0));
    assert!(matches!(**inner_right, Expression::NumericLiteral { value, .. } if value == 3.0));
}

#[test]
fn test_scenario_exponentiation_right_assoc() {
    let expr = expr_ok("2 ** 3 ** 4");
    let Expression::BinaryExpression {
        operator,
        left,
        right,
        ..
    } = expr
    else {
        panic!("expected binary expression");
    };
    assert_eq!(operator, BinaryOperator::Exp);
    assert!(matches!(*left, Expression::NumericLiteral { value, .. } if value == 2.0));
    let Expression::BinaryExpression {
        operator: inner,
        left: inner_left,
        right: inner_right,
        ..
    } = *right
    else {
        panic!("expected nested binary expression");
    };
    assert_eq!(inner, BinaryOperator::Exp);
    assert!(matches!(*inner_left, Expression::NumericLiteral { value, .. } if value == 3.0));
    assert!(matches!(*inner_right, Expression::NumericLiteral { value, .. } if value == 4.0));
}

#[test]
fn test_scenario_assignment_right_assoc() {
    let expr = expr_ok("a = b = c");
    let Expression::AssignmentExpression { left, right, .. } = expr else {
        panic!("expected assignment");
    };
    assert!(matches!(
        left,
        AssignmentTarget::Pattern(Pattern::Identifier { ref name, .. }) if name == "a"
    ));
    let Expression::AssignmentExpression {
        left: inner_left,
        right: inner_right,
        ..
    } = *right
    else {
        panic!("expected nested assignment");
    };
    assert!(matches!(
        inner_left,
        AssignmentTarget::Pattern(Pattern::Identifier { ref name, .. }) if name == "b"
    ));
    assert!(matches!(
        *inner_right,
        Expression::Identifier { ref name, .. } if name == "c"
    ));
}

#[test]
fn test_scenario_destructuring_declaration() {
    let program = parse_ok("const [a, ...b] = [1, 2, 3];");
    let Statement::VariableDeclaration {
        kind, declarations, ..
    } = &program.body[0]
    else {
        panic!("expected variable declaration");
    };
    assert_eq!(*kind, VariableKind::Const);

    let Pattern::ArrayPattern { elements, .. } = &declarations[0].id else {
        panic!("expected array pattern");
    };
    assert_eq!(elements.len(), 2);
    assert!(matches!(
        elements[0],
        Some(Pattern::Identifier { ref name, .. }) if name == "a"
    ));
    let Some(Pattern::RestElement { argument, .. }) = &elements[1] else {
        panic!("expected rest element");
    };
    assert!(matches!(**argument, Pattern::Identifier { ref name, .. } if name == "b"));

    let Some(Expression::ArrayExpression {
        elements: init_elements,
        ..
    }) = &declarations[0].init
    else {
        panic!("expected array initializer");
    };
    let values: Vec<f64> = init_elements
        .iter()
        .map(|e| match e {
            Some(Expression::NumericLiteral { value, .. }) => *value,
            other => panic!("expected numeric literal, got {:?}", other),
        })
        .collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_scenario_function_declaration() {
    let program = parse_ok("function f(x, y) { return x + y; }");
    let Statement::FunctionDeclaration {
        name,
        params,
        body,
        is_generator,
        is_async,
        ..
    } = &program.body[0]
    else {
        panic!("expected function declaration");
    };
    assert_eq!(name, "f");
    assert!(!is_generator);
    assert!(!is_async);
    assert_eq!(params.len(), 2);
    assert!(matches!(params[0], Pattern::Identifier { ref name, .. } if name == "x"));
    assert!(matches!(params[1], Pattern::Identifier { ref name, .. } if name == "y"));

    let Statement::BlockStatement {
        body: statements, ..
    } = &**body
    else {
        panic!("expected block body");
    };
    let Statement::ReturnStatement {
        argument: Some(argument),
        ..
    } = &statements[0]
    else {
        panic!("expected return with argument");
    };
    assert!(matches!(
        argument,
        Expression::BinaryExpression {
            operator: BinaryOperator::Add,
            ..
        }
    ));
}

// =============================================================================
// Round-trip laws
// =============================================================================

#[test]
fn test_identifier_round_trip() {
    for name in ["x", "$foo", "_bar9", "async2", "letter"] {
        let expr = expr_ok(name);
        assert!(matches!(expr, Expression::Identifier { name: n, .. } if n == name));
    }
}

#[test]
fn test_boolean_literals() {
    assert!(matches!(
        expr_ok("true"),
        Expression::BooleanLiteral { value: true, .. }
    ));
    assert!(matches!(
        expr_ok("false"),
        Expression::BooleanLiteral { value: false, .. }
    ));
}

#[test]
fn test_null_literal() {
    assert_eq!(expr_ok("null").kind_name(), "NullLiteral");
}

#[test]
fn test_integer_literals_round_trip() {
    for (source, value) in [("0", 0.0), ("7", 7.0), ("42", 42.0), ("123456", 123456.0)] {
        assert!(matches!(
            expr_ok(source),
            Expression::NumericLiteral { value: v, .. } if v == value
        ));
    }
}

#[test]
fn test_string_literal_value_is_raw() {
    assert!(matches!(
        expr_ok("'hi'"),
        Expression::StringLiteral { ref value, .. } if value == "hi"
    ));
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_program_span_contains_statement_spans() {
    let program = parse_ok("var x = 1;\nvar y = 2;");
    let program_span = program.meta.span.as_ref().unwrap();
    for statement in &program.body {
        let span = statement.meta().span.as_ref().unwrap();
        assert!(program_span.contains(span));
    }
}

#[test]
fn test_statement_span_contains_expression_span() {
    let program = parse_ok("  f(x) ;");
    let Statement::ExpressionStatement {
        expression, meta, ..
    } = &program.body[0]
    else {
        panic!("expected expression statement");
    };
    let statement_span = meta.span.as_ref().unwrap();
    let expression_span = expression.meta().span.as_ref().unwrap();
    assert!(statement_span.contains(expression_span));
}

#[test]
fn test_sequence_has_at_least_two_entries() {
    for source in ["a, b", "a, b, c", "(a, b, c)"] {
        let Expression::SequenceExpression { expressions, .. } = expr_ok(source) else {
            panic!("expected sequence for {}", source);
        };
        assert!(expressions.len() >= 2);
    }
}

#[test]
fn test_rewriter_is_idempotent_over_identifiers() {
    let expr = expr_ok("x");
    let Expression::Identifier { name, meta } = expr else {
        panic!("expected identifier");
    };
    let once = pattern::expression_to_pattern(Expression::Identifier {
        name: name.clone(),
        meta: meta.clone(),
    })
    .unwrap();
    let again = pattern::expression_to_pattern(Expression::Identifier { name, meta }).unwrap();
    assert_eq!(once, again);
}

// =============================================================================
// Boundary behaviors
// =============================================================================

#[test]
fn test_empty_source_parses_to_empty_program() {
    let program = parse_ok("");
    assert!(program.body.is_empty());
}

#[test]
fn test_single_semicolon_is_empty_statement() {
    let program = parse_ok(";");
    assert_eq!(program.body.len(), 1);
    assert!(matches!(program.body[0], Statement::EmptyStatement { .. }));
}

#[test]
fn test_trailing_comma_in_call_arguments() {
    let Expression::CallExpression { arguments, .. } = expr_ok("f(a, b,)") else {
        panic!("expected call");
    };
    assert!(arguments.last().unwrap().meta().trailing_comma);
    assert!(!arguments[0].meta().trailing_comma);
}

#[test]
fn test_trailing_comma_in_array() {
    let Expression::ArrayExpression { elements, .. } = expr_ok("[a, b, ]") else {
        panic!("expected array");
    };
    let Some(Some(last)) = elements.last() else {
        panic!("expected last element");
    };
    assert!(last.meta().trailing_comma);
}

#[test]
fn test_trailing_comma_in_object() {
    let Expression::ObjectExpression { properties, .. } = expr_ok("({ a: 1, })") else {
        panic!("expected object");
    };
    let Some(ObjectMember::Property(last)) = properties.last() else {
        panic!("expected property");
    };
    assert!(last.meta.trailing_comma);
}

#[test]
fn test_rest_with_trailing_comma_message() {
    let result = parse("const [...a,] = x;", ParserOptions::default());
    assert_eq!(
        result.unwrap_err().message,
        "A rest element cannot have a trailing comma"
    );
}

#[test]
fn test_rest_with_trailing_comma_in_params_message() {
    let result = parse("function f(...xs,) {}", ParserOptions::default());
    assert_eq!(
        result.unwrap_err().message,
        "A rest element cannot have a trailing comma"
    );
}

#[test]
fn test_return_at_end_of_input_has_null_argument() {
    let program = parse_ok("function f() { return }");
    let Statement::FunctionDeclaration { body, .. } = &program.body[0] else {
        panic!("expected function declaration");
    };
    let Statement::BlockStatement { body, .. } = &**body else {
        panic!("expected block");
    };
    assert!(matches!(
        body[0],
        Statement::ReturnStatement { argument: None, .. }
    ));
}

#[test]
fn test_return_before_line_break_has_null_argument() {
    let program = parse_ok("function f() {\nreturn\n1\n}");
    let Statement::FunctionDeclaration { body, .. } = &program.body[0] else {
        panic!("expected function declaration");
    };
    let Statement::BlockStatement { body, .. } = &**body else {
        panic!("expected block");
    };
    assert!(matches!(
        body[0],
        Statement::ReturnStatement { argument: None, .. }
    ));
    assert!(matches!(body[1], Statement::ExpressionStatement { .. }));
}

#[test]
fn test_for_with_empty_clauses() {
    let program = parse_ok("for(;;) {}");
    let Statement::ForStatement {
        init, test, update, ..
    } = &program.body[0]
    else {
        panic!("expected for statement");
    };
    assert!(init.is_none());
    assert!(test.is_none());
    assert!(update.is_none());
}

#[test]
fn test_for_init_declaration_consumes_first_semicolon() {
    let program = parse_ok("for (let i = 0; i < 2; i++) {}");
    assert!(matches!(
        program.body[0],
        Statement::ForStatement {
            init: Some(ForInit::VariableDeclaration { .. }),
            ..
        }
    ));
}

// =============================================================================
// Error scenarios
// =============================================================================

#[test]
fn test_error_number_followed_by_identifier() {
    let error = parse("1abc", ParserOptions::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::SyntaxError);
    assert!(error.message.contains("Unexpected token abc"));
}

#[test]
fn test_error_unmatchable_input() {
    let error = parse("ab£c", ParserOptions::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::LexError);
    assert_eq!(error.remaining.as_deref(), Some("£c"));
}

#[test]
fn test_error_raw_line_feed_in_string() {
    let error = parse("'hello\nworld'", ParserOptions::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::LexError);
}

#[test]
fn test_error_try_without_catch_or_finally() {
    let error = parse("try {}", ParserOptions::default()).unwrap_err();
    assert_eq!(error.message, "Missing catch or finally after try");
}

#[test]
fn test_error_rest_element_not_last() {
    let error = parse("const [...a, b] = x;", ParserOptions::default()).unwrap_err();
    assert_eq!(
        error.message,
        "A rest element must be last in a destructuring pattern"
    );
}

#[test]
fn test_error_rest_not_last_in_params() {
    let error = parse("function f(...xs, y) {}", ParserOptions::default()).unwrap_err();
    assert_eq!(error.message, "A rest element must be last in a parameter list");
}

#[test]
fn test_error_arrow_rest_not_last() {
    let error = parse_expression("(...xs, y) => 1", ParserOptions::default()).unwrap_err();
    assert_eq!(error.message, "A rest element must be last in a parameter list");
}

#[test]
fn test_error_invalid_pattern_kind_named() {
    let error = parse("var 1 = x;", ParserOptions::default()).unwrap_err();
    assert_eq!(error.message, "Invalid pattern NumericLiteral");
}

#[test]
fn test_error_compound_operator_in_pattern() {
    let error = parse("var [a += 1] = x;", ParserOptions::default()).unwrap_err();
    assert_eq!(
        error.message,
        "Invalid assignment pattern operator +=, expected ="
    );
}

#[test]
fn test_errors_carry_positions() {
    let error = parse("var x = ;", ParserOptions::default()).unwrap_err();
    let position = error.source_position.unwrap();
    assert_eq!(position.line, 0);
    assert_eq!(position.column, 8);
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_omit_locations_drops_all_spans() {
    let options = ParserOptions {
        omit_locations: true,
        ..Default::default()
    };
    let program = parse("var x = [1, 2]; f(x);", options).unwrap();
    assert!(program.meta.span.is_none());
    for statement in &program.body {
        assert!(statement.meta().span.is_none());
    }
}

#[test]
fn test_emit_logs_does_not_change_result() {
    let quiet = parse("let a = 1 + 2;", ParserOptions::default()).unwrap();
    let noisy = parse(
        "let a = 1 + 2;",
        ParserOptions {
            emit_logs: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(quiet, noisy);
}
