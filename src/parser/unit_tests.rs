use super::api::{parse_function_body, parse_script, JsParser, Rule};
use super::ast::*;

use pest::consumes_to;
use pest::fails_with;
use pest::parses_to;
use pest::Parser;

fn first_expression(script: &str) -> ExpressionType {
    let program = parse_script(script).unwrap();
    match program.body.body.into_iter().next().unwrap() {
        StatementType::ExpressionStatement { expression, .. } => expression,
        s => panic!("Expected an expression statement, got {:?}", s),
    }
}

#[test]
fn test_decimal_number_with_exp() {
    parses_to! {
        parser: JsParser,
        input: "10.5e3",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 6)
        ]
    };
}

#[test]
fn test_hex_number() {
    parses_to! {
        parser: JsParser,
        input: "0xFF",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 4)
        ]
    };
}

#[test]
fn test_number_rejects_letters() {
    fails_with! {
        parser: JsParser,
        input: "abc",
        rule: Rule::numeric_literal,
        positives: vec![Rule::numeric_literal],
        negatives: vec![],
        pos: 0
    };
}

#[test]
fn test_double_quoted_string() {
    parses_to! {
        parser: JsParser,
        input: "\"abc\"",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 5, [
                double_string_characters(1, 4)
            ])
        ]
    };
}

#[test]
fn test_identifier_may_start_with_keyword() {
    let pair = JsParser::parse(Rule::identifier, "returnValue")
        .unwrap()
        .next()
        .unwrap();
    assert_eq!(pair.as_str(), "returnValue");
    assert!(JsParser::parse(Rule::identifier, "return").is_err());
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    match first_expression("1 + 2 * 3") {
        ExpressionType::BinaryExpression {
            operator, right, ..
        } => {
            assert_eq!(operator, BinaryOperator::Add);
            assert!(matches!(
                *right,
                ExpressionType::BinaryExpression {
                    operator: BinaryOperator::Multiply,
                    ..
                }
            ));
        }
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_exponent_is_right_associative() {
    match first_expression("2 ** 3 ** 2") {
        ExpressionType::BinaryExpression { left, right, .. } => {
            assert!(matches!(*left, ExpressionType::Literal(_)));
            assert!(matches!(
                *right,
                ExpressionType::BinaryExpression {
                    operator: BinaryOperator::Exponent,
                    ..
                }
            ));
        }
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_logical_operators_build_logical_expressions() {
    match first_expression("a || b && c") {
        ExpressionType::LogicalExpression {
            operator, right, ..
        } => {
            assert_eq!(operator, LogicalOperator::Or);
            assert!(matches!(
                *right,
                ExpressionType::LogicalExpression {
                    operator: LogicalOperator::And,
                    ..
                }
            ));
        }
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_optional_chain_is_wrapped() {
    match first_expression("a?.b.c") {
        ExpressionType::ChainExpression { expression, .. } => match *expression {
            ExpressionType::MemberExpression(m) => {
                assert!(!m.optional);
                assert!(matches!(
                    *m.object,
                    ExpressionType::MemberExpression(MemberExpressionData { optional: true, .. })
                ));
            }
            e => panic!("Unexpected {:?}", e),
        },
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_ternary_is_not_confused_with_optional_chaining() {
    assert!(matches!(
        first_expression("a ? b : c"),
        ExpressionType::ConditionalExpression { .. }
    ));
}

#[test]
fn test_template_literal_quasis_surround_expressions() {
    match first_expression("`Hello ${name}!`") {
        ExpressionType::TemplateLiteral(t) => {
            assert_eq!(t.quasis, vec!["Hello ".to_string(), "!".to_string()]);
            assert_eq!(t.expressions.len(), 1);
        }
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_string_escapes_are_decoded() {
    match first_expression(r#"'a\nA\x42'"#) {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::StringLiteral(s),
            ..
        }) => assert_eq!(s, "a\nAB"),
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_statements_without_semicolons() {
    let program = parse_script("a = 1\nb = 2").unwrap();
    assert_eq!(program.body.body.len(), 2);
}

#[test]
fn test_top_level_return_is_rejected_in_scripts() {
    let err = parse_script("return 1").unwrap_err();
    assert!(err.to_string().contains("Illegal return statement"));
    assert!(parse_function_body("return 1").is_ok());
}

#[test]
fn test_return_inside_function_is_allowed_in_scripts() {
    assert!(parse_script("function f() { return 1 } f()").is_ok());
}

#[test]
fn test_break_outside_loop_is_rejected() {
    assert!(parse_script("break").is_err());
    assert!(parse_script("while (true) { if (x) break; }").is_ok());
}

#[test]
fn test_var_and_function_declarations_are_hoisted() {
    let program = parse_script("if (x) { var a = 1; let b = 2; } function f() { var c; }").unwrap();
    assert_eq!(program.body.hoisted_var_names, vec!["a".to_string()]);
    assert_eq!(program.body.hoisted_functions.len(), 1);
}

#[test]
fn test_invalid_assignment_target() {
    let err = parse_script("1 = 2").unwrap_err();
    assert!(err.to_string().starts_with("SyntaxError"));
}

#[test]
fn test_compound_assignment_to_member() {
    match first_expression("a.b += c ? 1 : 2") {
        ExpressionType::AssignmentExpression { operator, left, right, .. } => {
            assert!(matches!(operator, AssignmentOperator::AddEquals));
            assert!(matches!(*left, ExpressionType::MemberExpression(_)));
            assert!(matches!(*right, ExpressionType::ConditionalExpression { .. }));
        }
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_unbalanced_input_is_a_syntax_error() {
    assert!(parse_function_body("return (state.a").is_err());
}

#[test]
fn test_arrow_functions() {
    match first_expression("(a, b = 2) => a + b") {
        ExpressionType::ArrowFunctionExpression(f) => {
            assert!(f.is_arrow);
            assert_eq!(f.params.len(), 2);
            assert!(matches!(f.body, FunctionBodyOrExpression::Expression(_)));
        }
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_object_literal_with_methods_and_spread() {
    match first_expression("({ a: 1, b, ...c, ['d']: 4, e() { return 5 } })") {
        ExpressionType::ObjectExpression { properties, .. } => assert_eq!(properties.len(), 5),
        e => panic!("Unexpected {:?}", e),
    }
}

#[test]
fn test_for_of_and_for_in_heads() {
    let program = parse_script("for (const x of xs) {} for (var k in o) {}").unwrap();
    assert!(matches!(program.body.body[0], StatementType::ForOfStatement { .. }));
    assert!(matches!(program.body.body[1], StatementType::ForInStatement { .. }));
    assert_eq!(program.body.hoisted_var_names, vec!["k".to_string()]);
}
