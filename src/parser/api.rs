use std::rc::Rc;

use pest::error::{Error, ErrorVariant, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;

use super::ast::*;
use super::static_semantics::{find_illegal_statement, get_var_scoped_declarations};
use crate::runner::ds::error::JErrorType;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

lazy_static! {
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        .op(Op::infix(Rule::op_nullish, Assoc::Left))
        .op(Op::infix(Rule::op_or, Assoc::Left))
        .op(Op::infix(Rule::op_and, Assoc::Left))
        .op(Op::infix(Rule::op_bit_or, Assoc::Left))
        .op(Op::infix(Rule::op_bit_xor, Assoc::Left))
        .op(Op::infix(Rule::op_bit_and, Assoc::Left))
        .op(Op::infix(Rule::op_strict_eq, Assoc::Left)
            | Op::infix(Rule::op_strict_ne, Assoc::Left)
            | Op::infix(Rule::op_eq, Assoc::Left)
            | Op::infix(Rule::op_ne, Assoc::Left))
        .op(Op::infix(Rule::op_lt, Assoc::Left)
            | Op::infix(Rule::op_gt, Assoc::Left)
            | Op::infix(Rule::op_le, Assoc::Left)
            | Op::infix(Rule::op_ge, Assoc::Left)
            | Op::infix(Rule::op_instanceof, Assoc::Left)
            | Op::infix(Rule::op_in, Assoc::Left))
        .op(Op::infix(Rule::op_shl, Assoc::Left)
            | Op::infix(Rule::op_shr, Assoc::Left)
            | Op::infix(Rule::op_ushr, Assoc::Left))
        .op(Op::infix(Rule::op_add, Assoc::Left) | Op::infix(Rule::op_sub, Assoc::Left))
        .op(Op::infix(Rule::op_mul, Assoc::Left)
            | Op::infix(Rule::op_div, Assoc::Left)
            | Op::infix(Rule::op_mod, Assoc::Left))
        .op(Op::infix(Rule::op_exp, Assoc::Right));
}

/// Parses a script. A `return` outside of a function is a syntax error and the
/// value of the script is the value of its last expression statement.
pub fn parse_script(script: &str) -> Result<ProgramData, JErrorType> {
    parse_program(script, false)
}

/// Parses source text as the body of a function, so top-level `return` is allowed.
pub fn parse_function_body(script: &str) -> Result<ProgramData, JErrorType> {
    parse_program(script, true)
}

fn parse_program(script: &str, allow_return: bool) -> Result<ProgramData, JErrorType> {
    let program = build_program(script, allow_return).map_err(to_syntax_error)?;
    Ok(program)
}

fn build_program(script: &str, allow_return: bool) -> Result<ProgramData, Error<Rule>> {
    let mut pairs = JsParser::parse(Rule::script, script)?;
    let script_pair = pairs
        .next()
        .ok_or_else(|| custom_error("Empty parse result", 0, script))?;
    let meta = get_meta(&script_pair);
    let mut body = None;
    for pair in script_pair.into_inner() {
        match pair.as_rule() {
            Rule::statement_list => {
                body = Some(build_body(pair, allow_return)?);
            }
            Rule::EOI => { /* Do nothing */ }
            _ => return Err(get_unexpected_error(1, &pair)),
        }
    }
    let body = body.ok_or_else(|| custom_error("Missing statement list", 0, script))?;
    Ok(ProgramData { meta, body })
}

fn to_syntax_error(e: Error<Rule>) -> JErrorType {
    let (line, col) = match e.line_col {
        LineColLocation::Pos(p) => p,
        LineColLocation::Span(p, _) => p,
    };
    let message = match &e.variant {
        ErrorVariant::CustomError { message } => message.to_string(),
        ErrorVariant::ParsingError { .. } => "Unexpected token".to_string(),
    };
    JErrorType::SyntaxError(format!("{} (line {}, column {})", message, line, col))
}

fn custom_error(message: &str, pos: usize, input: &str) -> Error<Rule> {
    let pos = pest::Position::new(input, pos).unwrap_or_else(|| pest::Position::from_start(input));
    Error::new_from_pos(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        pos,
    )
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn get_error_at(message: &str, pair: &Pair<Rule>) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        pair.as_span(),
    )
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    Meta {
        start_index: pair.as_span().start(),
        end_index: pair.as_span().end(),
    }
}

fn expect_next<'a>(iter: &mut Pairs<'a, Rule>, parent: &Pair<'a, Rule>) -> Result<Pair<'a, Rule>, Error<Rule>> {
    iter.next().ok_or_else(|| get_unexpected_error(2, parent))
}

/// Children of a pair without the keyword tokens, which carry no meaning once
/// the rule has matched.
fn inner_without_keywords<'a>(pair: Pair<'a, Rule>) -> Vec<Pair<'a, Rule>> {
    pair.into_inner()
        .filter(|p| {
            !matches!(
                p.as_rule(),
                Rule::kw_if
                    | Rule::kw_else
                    | Rule::kw_for
                    | Rule::kw_of
                    | Rule::kw_while
                    | Rule::kw_do
                    | Rule::kw_return
                    | Rule::kw_break
                    | Rule::kw_continue
                    | Rule::kw_throw
                    | Rule::kw_try
                    | Rule::kw_catch
                    | Rule::kw_finally
                    | Rule::kw_function
                    | Rule::kw_new
                    | Rule::op_in
            )
        })
        .collect()
}

fn build_body(pair: Pair<Rule>, allow_return: bool) -> Result<FunctionBodyData, Error<Rule>> {
    let meta = get_meta(&pair);
    let body = build_statement_list(pair.clone())?;
    if let Some((m, message)) = find_illegal_statement(&body, allow_return) {
        let input = pair.as_span().get_input();
        return Err(custom_error(message, m.start_index, input));
    }
    let declarations = get_var_scoped_declarations(&body);
    Ok(FunctionBodyData {
        meta,
        body,
        hoisted_var_names: declarations.var_names,
        hoisted_functions: declarations.functions,
    })
}

fn build_statement_list(pair: Pair<Rule>) -> Result<Vec<StatementType>, Error<Rule>> {
    let mut statements = vec![];
    for inner_pair in pair.into_inner() {
        statements.push(build_ast_from_statement(inner_pair)?);
    }
    Ok(statements)
}

fn build_ast_from_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(match pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement(build_block(pair)?),
        Rule::variable_statement => {
            let mut iter = pair.clone().into_inner();
            let kind_pair = expect_next(&mut iter, &pair)?;
            let list_pair = expect_next(&mut iter, &pair)?;
            StatementType::VariableDeclaration(build_variable_declaration(
                meta, kind_pair, list_pair,
            )?)
        }
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::if_statement => {
            let mut iter = inner_without_keywords(pair.clone()).into_iter();
            let test = build_ast_from_expression(iter.next().ok_or_else(|| get_unexpected_error(3, &pair))?)?;
            let consequent = Box::new(build_ast_from_statement(
                iter.next().ok_or_else(|| get_unexpected_error(4, &pair))?,
            )?);
            let alternate = match iter.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test,
                consequent,
                alternate,
            }
        }
        Rule::for_statement => build_for_statement(pair)?,
        Rule::while_statement => {
            let mut iter = inner_without_keywords(pair.clone()).into_iter();
            let test = build_ast_from_expression(iter.next().ok_or_else(|| get_unexpected_error(5, &pair))?)?;
            let body = Box::new(build_ast_from_statement(
                iter.next().ok_or_else(|| get_unexpected_error(6, &pair))?,
            )?);
            StatementType::WhileStatement { meta, test, body }
        }
        Rule::do_while_statement => {
            let mut iter = inner_without_keywords(pair.clone()).into_iter();
            let body = Box::new(build_ast_from_statement(
                iter.next().ok_or_else(|| get_unexpected_error(7, &pair))?,
            )?);
            let test = build_ast_from_expression(iter.next().ok_or_else(|| get_unexpected_error(8, &pair))?)?;
            StatementType::DoWhileStatement { meta, body, test }
        }
        Rule::continue_statement => StatementType::ContinueStatement { meta },
        Rule::break_statement => StatementType::BreakStatement { meta },
        Rule::return_statement => {
            let argument = match inner_without_keywords(pair).into_iter().next() {
                Some(p) => Some(build_ast_from_expression(p)?),
                None => None,
            };
            StatementType::ReturnStatement { meta, argument }
        }
        Rule::throw_statement => {
            let argument = inner_without_keywords(pair.clone())
                .into_iter()
                .next()
                .ok_or_else(|| get_unexpected_error(9, &pair))?;
            StatementType::ThrowStatement {
                meta,
                argument: build_ast_from_expression(argument)?,
            }
        }
        Rule::try_statement => {
            let mut block = None;
            let mut handler = None;
            let mut finalizer = None;
            for p in inner_without_keywords(pair.clone()) {
                match p.as_rule() {
                    Rule::block_statement => block = Some(build_block(p)?),
                    Rule::catch_clause => {
                        let catch_meta = get_meta(&p);
                        let mut param = None;
                        let mut body = None;
                        for c in inner_without_keywords(p) {
                            match c.as_rule() {
                                Rule::identifier => param = Some(build_identifier(&c)),
                                Rule::block_statement => body = Some(build_block(c)?),
                                _ => return Err(get_unexpected_error(10, &c)),
                            }
                        }
                        handler = Some(CatchClauseData {
                            meta: catch_meta,
                            param,
                            body: body.ok_or_else(|| get_unexpected_error(11, &pair))?,
                        });
                    }
                    Rule::finally_clause => {
                        let b = inner_without_keywords(p.clone())
                            .into_iter()
                            .next()
                            .ok_or_else(|| get_unexpected_error(12, &p))?;
                        finalizer = Some(build_block(b)?);
                    }
                    _ => return Err(get_unexpected_error(13, &p)),
                }
            }
            StatementType::TryStatement {
                meta,
                block: block.ok_or_else(|| get_unexpected_error(14, &pair))?,
                handler,
                finalizer,
            }
        }
        Rule::function_declaration => {
            StatementType::FunctionDeclaration(Rc::new(build_function(pair, false)?))
        }
        Rule::expression_statement => {
            let expr = pair
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| get_unexpected_error(15, &pair))?;
            StatementType::ExpressionStatement {
                meta,
                expression: build_ast_from_expression(expr)?,
            }
        }
        _ => return Err(get_unexpected_error(16, &pair)),
    })
}

fn build_block(pair: Pair<Rule>) -> Result<BlockStatementData, Error<Rule>> {
    let meta = get_meta(&pair);
    let list = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| get_unexpected_error(17, &pair))?;
    Ok(BlockStatementData {
        meta,
        body: build_statement_list(list)?,
    })
}

fn get_var_kind(pair: &Pair<Rule>) -> VariableDeclarationKind {
    match pair.as_str() {
        "let" => VariableDeclarationKind::Let,
        "const" => VariableDeclarationKind::Const,
        _ => VariableDeclarationKind::Var,
    }
}

fn build_variable_declaration(
    meta: Meta,
    kind_pair: Pair<Rule>,
    list_pair: Pair<Rule>,
) -> Result<VariableDeclarationData, Error<Rule>> {
    let kind = get_var_kind(&kind_pair);
    let mut declarations = vec![];
    for decl in list_pair.into_inner() {
        let mut iter = decl.clone().into_inner();
        let id_pair = expect_next(&mut iter, &decl)?;
        let init = match iter.next() {
            Some(p) => Some(build_ast_from_assignment_expression(p)?),
            None => None,
        };
        if kind == VariableDeclarationKind::Const && init.is_none() {
            return Err(get_error_at("Missing initializer in const declaration", &decl));
        }
        declarations.push(VariableDeclaratorData {
            id: build_identifier(&id_pair),
            init,
        });
    }
    Ok(VariableDeclarationData {
        meta,
        kind,
        declarations,
    })
}

fn build_for_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut iter = inner_without_keywords(pair.clone()).into_iter();
    let head = iter.next().ok_or_else(|| get_unexpected_error(18, &pair))?;
    let body = Box::new(build_ast_from_statement(
        iter.next().ok_or_else(|| get_unexpected_error(19, &pair))?,
    )?);
    Ok(match head.as_rule() {
        Rule::for_in_head | Rule::for_of_head => {
            let is_in = head.as_rule() == Rule::for_in_head;
            let mut head_iter = inner_without_keywords(head.clone()).into_iter();
            let binding = head_iter.next().ok_or_else(|| get_unexpected_error(20, &head))?;
            let right = build_ast_from_expression_like(
                head_iter.next().ok_or_else(|| get_unexpected_error(21, &head))?,
            )?;
            let mut kind = None;
            let mut id = None;
            for p in binding.into_inner() {
                match p.as_rule() {
                    Rule::var_kind => kind = Some(get_var_kind(&p)),
                    Rule::identifier => id = Some(build_identifier(&p)),
                    _ => return Err(get_unexpected_error(22, &p)),
                }
            }
            let left = ForIteratorBinding {
                kind,
                id: id.ok_or_else(|| get_unexpected_error(23, &head))?,
            };
            if is_in {
                StatementType::ForInStatement {
                    meta,
                    left,
                    right,
                    body,
                }
            } else {
                StatementType::ForOfStatement {
                    meta,
                    left,
                    right,
                    body,
                }
            }
        }
        Rule::for_classic_head => {
            let mut init = None;
            let mut test = None;
            let mut update = None;
            for p in head.into_inner() {
                match p.as_rule() {
                    Rule::for_init => {
                        let init_meta = get_meta(&p);
                        let mut init_iter = p.clone().into_inner();
                        let first = expect_next(&mut init_iter, &p)?;
                        init = Some(if first.as_rule() == Rule::var_kind {
                            let list = expect_next(&mut init_iter, &p)?;
                            VariableDeclarationOrExpression::VariableDeclaration(
                                build_variable_declaration(init_meta, first, list)?,
                            )
                        } else {
                            VariableDeclarationOrExpression::Expression(build_ast_from_expression(
                                first,
                            )?)
                        });
                    }
                    Rule::for_test => {
                        let e = p.clone().into_inner().next().ok_or_else(|| get_unexpected_error(24, &p))?;
                        test = Some(build_ast_from_expression(e)?);
                    }
                    Rule::for_update => {
                        let e = p.clone().into_inner().next().ok_or_else(|| get_unexpected_error(25, &p))?;
                        update = Some(build_ast_from_expression(e)?);
                    }
                    _ => return Err(get_unexpected_error(26, &p)),
                }
            }
            StatementType::ForStatement {
                meta,
                init,
                test,
                update,
                body,
            }
        }
        _ => return Err(get_unexpected_error(27, &head)),
    })
}

fn build_identifier(pair: &Pair<Rule>) -> IdentifierData {
    IdentifierData {
        name: pair.as_str().to_string(),
        meta: get_meta(pair),
    }
}

fn build_function(pair: Pair<Rule>, is_arrow: bool) -> Result<FunctionData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut id = None;
    let mut params = vec![];
    let mut body = None;
    for p in inner_without_keywords(pair.clone()) {
        match p.as_rule() {
            Rule::identifier => id = Some(build_identifier(&p)),
            Rule::formal_parameters => params = build_formal_parameters(p)?,
            Rule::function_body => body = Some(build_function_body(p)?),
            _ => return Err(get_unexpected_error(28, &p)),
        }
    }
    Ok(FunctionData {
        meta,
        id,
        params,
        body: body.ok_or_else(|| get_unexpected_error(29, &pair))?,
        is_arrow,
    })
}

fn build_function_body(pair: Pair<Rule>) -> Result<FunctionBodyOrExpression, Error<Rule>> {
    let list = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| get_unexpected_error(30, &pair))?;
    let mut data = build_body(list, true)?;
    data.meta = get_meta(&pair);
    Ok(FunctionBodyOrExpression::FunctionBody(data))
}

fn build_formal_parameters(pair: Pair<Rule>) -> Result<Vec<PatternType>, Error<Rule>> {
    let mut params = vec![];
    let mut seen_rest = false;
    for param in pair.into_inner() {
        if seen_rest {
            return Err(get_error_at("Rest parameter must be last formal parameter", &param));
        }
        let meta = get_meta(&param);
        let mut iter = param.clone().into_inner();
        let first = expect_next(&mut iter, &param)?;
        params.push(match first.as_rule() {
            Rule::rest_parameter => {
                seen_rest = true;
                let id = first
                    .clone()
                    .into_inner()
                    .next()
                    .ok_or_else(|| get_unexpected_error(31, &first))?;
                PatternType::RestElement {
                    meta,
                    argument: build_identifier(&id),
                }
            }
            Rule::identifier => match iter.next() {
                Some(default) => PatternType::AssignmentPattern {
                    meta,
                    left: build_identifier(&first),
                    right: build_ast_from_assignment_expression(default)?,
                },
                None => PatternType::Identifier(build_identifier(&first)),
            },
            _ => return Err(get_unexpected_error(32, &first)),
        });
    }
    Ok(params)
}

fn build_arrow_function(pair: Pair<Rule>) -> Result<FunctionData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut iter = pair.clone().into_inner();
    let params_pair = expect_next(&mut iter, &pair)?;
    let body_pair = expect_next(&mut iter, &pair)?;
    let params_inner = params_pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| get_unexpected_error(33, &params_pair))?;
    let params = match params_inner.as_rule() {
        Rule::identifier => vec![PatternType::Identifier(build_identifier(&params_inner))],
        Rule::formal_parameters => build_formal_parameters(params_inner)?,
        _ => return Err(get_unexpected_error(34, &params_inner)),
    };
    let body = match body_pair.as_rule() {
        Rule::function_body => build_function_body(body_pair)?,
        _ => FunctionBodyOrExpression::Expression(build_ast_from_assignment_expression(body_pair)?),
    };
    Ok(FunctionData {
        meta,
        id: None,
        params,
        body,
        is_arrow: true,
    })
}

/// Builds from either an `expression` or an `assignment_expression` pair.
fn build_ast_from_expression_like(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    match pair.as_rule() {
        Rule::expression => build_ast_from_expression(pair),
        _ => build_ast_from_assignment_expression(pair),
    }
}

fn build_ast_from_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut expressions = vec![];
    for inner_pair in pair.into_inner() {
        expressions.push(build_ast_from_assignment_expression(inner_pair)?);
    }
    Ok(if expressions.len() == 1 {
        expressions.remove(0)
    } else {
        ExpressionType::SequenceExpression { meta, expressions }
    })
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut iter = pair.clone().into_inner();
    let first = expect_next(&mut iter, &pair)?;
    Ok(match first.as_rule() {
        Rule::arrow_function => {
            ExpressionType::ArrowFunctionExpression(Rc::new(build_arrow_function(first)?))
        }
        Rule::conditional_expression => {
            let left = build_ast_from_conditional_expression(first.clone())?;
            match iter.next() {
                None => left,
                Some(op_pair) => {
                    let right_pair = expect_next(&mut iter, &pair)?;
                    if !is_valid_assignment_target(&left) {
                        return Err(get_error_at("Invalid left-hand side in assignment", &first));
                    }
                    ExpressionType::AssignmentExpression {
                        meta,
                        operator: get_assignment_operator(&op_pair)?,
                        left: Box::new(left),
                        right: Box::new(build_ast_from_assignment_expression(right_pair)?),
                    }
                }
            }
        }
        _ => return Err(get_unexpected_error(35, &first)),
    })
}

fn is_valid_assignment_target(e: &ExpressionType) -> bool {
    match e {
        ExpressionType::Identifier(_) => true,
        ExpressionType::MemberExpression(m) => !m.optional,
        _ => false,
    }
}

fn get_assignment_operator(pair: &Pair<Rule>) -> Result<AssignmentOperator, Error<Rule>> {
    Ok(match pair.as_str() {
        "=" => AssignmentOperator::Equals,
        "+=" => AssignmentOperator::AddEquals,
        "-=" => AssignmentOperator::SubtractEquals,
        "*=" => AssignmentOperator::MultiplyEquals,
        "/=" => AssignmentOperator::DivideEquals,
        "%=" => AssignmentOperator::ModuloEquals,
        "**=" => AssignmentOperator::ExponentEquals,
        "<<=" => AssignmentOperator::BitwiseLeftShiftEquals,
        ">>=" => AssignmentOperator::BitwiseRightShiftEquals,
        ">>>=" => AssignmentOperator::BitwiseUnsignedRightShiftEquals,
        "|=" => AssignmentOperator::BitwiseOrEquals,
        "&=" => AssignmentOperator::BitwiseAndEquals,
        "^=" => AssignmentOperator::BitwiseXorEquals,
        "&&=" => AssignmentOperator::LogicalAndEquals,
        "||=" => AssignmentOperator::LogicalOrEquals,
        "??=" => AssignmentOperator::NullishEquals,
        _ => return Err(get_unexpected_error(36, pair)),
    })
}

fn build_ast_from_conditional_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut iter = pair.clone().into_inner();
    let test = build_ast_from_binary_expression(expect_next(&mut iter, &pair)?)?;
    Ok(match iter.next() {
        Some(consequent) => {
            let alternate = expect_next(&mut iter, &pair)?;
            ExpressionType::ConditionalExpression {
                meta,
                test: Box::new(test),
                consequent: Box::new(build_ast_from_assignment_expression(consequent)?),
                alternate: Box::new(build_ast_from_assignment_expression(alternate)?),
            }
        }
        None => test,
    })
}

fn build_ast_from_binary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    PRATT_PARSER
        .map_primary(build_ast_from_unary_expression)
        .map_infix(|lhs, op, rhs| {
            let lhs = lhs?;
            let rhs = rhs?;
            let meta = Meta {
                start_index: lhs.get_meta().start_index,
                end_index: rhs.get_meta().end_index,
            };
            let left = Box::new(lhs);
            let right = Box::new(rhs);
            let logical = match op.as_rule() {
                Rule::op_or => Some(LogicalOperator::Or),
                Rule::op_and => Some(LogicalOperator::And),
                Rule::op_nullish => Some(LogicalOperator::NullishCoalescing),
                _ => None,
            };
            if let Some(operator) = logical {
                return Ok(ExpressionType::LogicalExpression {
                    meta,
                    operator,
                    left,
                    right,
                });
            }
            let operator = match op.as_rule() {
                Rule::op_bit_or => BinaryOperator::BitwiseOr,
                Rule::op_bit_xor => BinaryOperator::BitwiseXor,
                Rule::op_bit_and => BinaryOperator::BitwiseAnd,
                Rule::op_strict_eq => BinaryOperator::StrictlyEqual,
                Rule::op_strict_ne => BinaryOperator::StrictlyUnequal,
                Rule::op_eq => BinaryOperator::LooselyEqual,
                Rule::op_ne => BinaryOperator::LooselyUnequal,
                Rule::op_lt => BinaryOperator::LessThan,
                Rule::op_gt => BinaryOperator::GreaterThan,
                Rule::op_le => BinaryOperator::LessThanEqual,
                Rule::op_ge => BinaryOperator::GreaterThanEqual,
                Rule::op_instanceof => BinaryOperator::InstanceOf,
                Rule::op_in => BinaryOperator::In,
                Rule::op_shl => BinaryOperator::BitwiseLeftShift,
                Rule::op_shr => BinaryOperator::BitwiseRightShift,
                Rule::op_ushr => BinaryOperator::BitwiseUnsignedRightShift,
                Rule::op_add => BinaryOperator::Add,
                Rule::op_sub => BinaryOperator::Subtract,
                Rule::op_mul => BinaryOperator::Multiply,
                Rule::op_div => BinaryOperator::Divide,
                Rule::op_mod => BinaryOperator::Modulo,
                Rule::op_exp => BinaryOperator::Exponent,
                _ => return Err(get_unexpected_error(37, &op)),
            };
            Ok(ExpressionType::BinaryExpression {
                meta,
                operator,
                left,
                right,
            })
        })
        .parse(pair.into_inner())
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let mut prefixes = vec![];
    let mut operand = None;
    for p in pair.clone().into_inner() {
        match p.as_rule() {
            Rule::prefix_operator => prefixes.push(p),
            Rule::postfix_expression => operand = Some(build_ast_from_postfix_expression(p)?),
            _ => return Err(get_unexpected_error(38, &p)),
        }
    }
    let mut expr = operand.ok_or_else(|| get_unexpected_error(39, &pair))?;
    let end_index = pair.as_span().end();
    // Innermost operator applies first.
    for op in prefixes.into_iter().rev() {
        let meta = Meta {
            start_index: op.as_span().start(),
            end_index,
        };
        expr = match op.as_str() {
            "++" | "--" => {
                if !is_valid_assignment_target(&expr) {
                    return Err(get_error_at(
                        "Invalid left-hand side expression in prefix operation",
                        &op,
                    ));
                }
                ExpressionType::UpdateExpression {
                    meta,
                    operator: if op.as_str() == "++" {
                        UpdateOperator::PlusPlus
                    } else {
                        UpdateOperator::MinusMinus
                    },
                    argument: Box::new(expr),
                    prefix: true,
                }
            }
            s => ExpressionType::UnaryExpression {
                meta,
                operator: match s {
                    "-" => UnaryOperator::Minus,
                    "+" => UnaryOperator::Plus,
                    "!" => UnaryOperator::LogicalNot,
                    "~" => UnaryOperator::BitwiseNot,
                    "typeof" => UnaryOperator::TypeOf,
                    "void" => UnaryOperator::Void,
                    "delete" => UnaryOperator::Delete,
                    _ => return Err(get_unexpected_error(40, &op)),
                },
                argument: Box::new(expr),
            },
        };
    }
    Ok(expr)
}

fn build_ast_from_postfix_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut iter = pair.clone().into_inner();
    let lhs_pair = expect_next(&mut iter, &pair)?;
    let expr = build_ast_from_lhs_expression(lhs_pair.clone())?;
    Ok(match iter.next() {
        Some(op) => {
            if !is_valid_assignment_target(&expr) {
                return Err(get_error_at(
                    "Invalid left-hand side expression in postfix operation",
                    &lhs_pair,
                ));
            }
            ExpressionType::UpdateExpression {
                meta,
                operator: if op.as_str() == "++" {
                    UpdateOperator::PlusPlus
                } else {
                    UpdateOperator::MinusMinus
                },
                argument: Box::new(expr),
                prefix: false,
            }
        }
        None => expr,
    })
}

fn build_ast_from_lhs_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let start_index = pair.as_span().start();
    let mut iter = pair.clone().into_inner();
    let first = expect_next(&mut iter, &pair)?;
    let mut expr = match first.as_rule() {
        Rule::new_expression => build_ast_from_new_expression(first)?,
        _ => build_ast_from_primary_expression(first)?,
    };
    let mut has_optional = false;
    for accessor in iter {
        let end_index = accessor.as_span().end();
        let meta = Meta {
            start_index,
            end_index,
        };
        let optional = matches!(
            accessor.as_rule(),
            Rule::optional_call | Rule::optional_index | Rule::optional_member
        );
        has_optional |= optional;
        expr = build_accessor(expr, accessor, meta, optional)?;
    }
    if has_optional {
        expr = ExpressionType::ChainExpression {
            meta: get_meta(&pair),
            expression: Box::new(expr),
        };
    }
    Ok(expr)
}

fn build_accessor(
    object: ExpressionType,
    accessor: Pair<Rule>,
    meta: Meta,
    optional: bool,
) -> Result<ExpressionType, Error<Rule>> {
    Ok(match accessor.as_rule() {
        Rule::member_dot | Rule::optional_member => {
            let name = accessor
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| get_unexpected_error(41, &accessor))?;
            ExpressionType::MemberExpression(MemberExpressionData {
                meta,
                object: Box::new(object),
                property: MemberProperty::Identifier(build_identifier(&name)),
                optional,
            })
        }
        Rule::member_index | Rule::optional_index => {
            let e = accessor
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| get_unexpected_error(42, &accessor))?;
            ExpressionType::MemberExpression(MemberExpressionData {
                meta,
                object: Box::new(object),
                property: MemberProperty::Computed(Box::new(build_ast_from_expression(e)?)),
                optional,
            })
        }
        Rule::arguments | Rule::optional_call => {
            let args_pair = if accessor.as_rule() == Rule::arguments {
                accessor
            } else {
                accessor
                    .clone()
                    .into_inner()
                    .next()
                    .ok_or_else(|| get_unexpected_error(43, &accessor))?
            };
            ExpressionType::CallExpression {
                meta,
                callee: Box::new(object),
                arguments: build_arguments(args_pair)?,
                optional,
            }
        }
        _ => return Err(get_unexpected_error(44, &accessor)),
    })
}

fn build_arguments(pair: Pair<Rule>) -> Result<Vec<ExpressionOrSpreadElement>, Error<Rule>> {
    let mut args = vec![];
    for p in pair.into_inner() {
        args.push(build_expression_or_spread(p)?);
    }
    Ok(args)
}

fn build_expression_or_spread(pair: Pair<Rule>) -> Result<ExpressionOrSpreadElement, Error<Rule>> {
    Ok(match pair.as_rule() {
        Rule::spread_element => {
            let e = pair
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| get_unexpected_error(45, &pair))?;
            ExpressionOrSpreadElement::SpreadElement(build_ast_from_assignment_expression(e)?)
        }
        _ => ExpressionOrSpreadElement::Expression(build_ast_from_assignment_expression(pair)?),
    })
}

fn build_ast_from_new_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut callee = None;
    let mut arguments = vec![];
    for p in inner_without_keywords(pair.clone()) {
        match p.as_rule() {
            Rule::new_callee => {
                let start_index = p.as_span().start();
                let mut iter = p.clone().into_inner();
                let first = expect_next(&mut iter, &p)?;
                let mut expr = match first.as_rule() {
                    Rule::new_expression => build_ast_from_new_expression(first)?,
                    _ => build_ast_from_primary_expression(first)?,
                };
                for accessor in iter {
                    let m = Meta {
                        start_index,
                        end_index: accessor.as_span().end(),
                    };
                    expr = build_accessor(expr, accessor, m, false)?;
                }
                callee = Some(expr);
            }
            Rule::arguments => arguments = build_arguments(p)?,
            _ => return Err(get_unexpected_error(46, &p)),
        }
    }
    Ok(ExpressionType::NewExpression {
        meta,
        callee: Box::new(callee.ok_or_else(|| get_unexpected_error(47, &pair))?),
        arguments,
    })
}

fn build_ast_from_primary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(match pair.as_rule() {
        Rule::null_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::NullLiteral,
        }),
        Rule::boolean_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::BooleanLiteral(pair.as_str() == "true"),
        }),
        Rule::numeric_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::NumberLiteral(parse_numeric_literal(&pair)?),
        }),
        Rule::string_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::StringLiteral(get_string_literal_value(&pair)?),
        }),
        Rule::template_literal => {
            let mut quasis = vec![String::new()];
            let mut expressions = vec![];
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::template_characters => {
                        if let Some(last) = quasis.last_mut() {
                            last.push_str(&unescape(p.as_str(), &p)?);
                        }
                    }
                    Rule::template_substitution => {
                        let e = p
                            .clone()
                            .into_inner()
                            .next()
                            .ok_or_else(|| get_unexpected_error(48, &p))?;
                        expressions.push(build_ast_from_expression(e)?);
                        quasis.push(String::new());
                    }
                    _ => return Err(get_unexpected_error(49, &p)),
                }
            }
            ExpressionType::TemplateLiteral(TemplateLiteralData {
                meta,
                quasis,
                expressions,
            })
        }
        Rule::array_literal => {
            let mut elements = vec![];
            for p in pair.into_inner() {
                elements.push(build_expression_or_spread(p)?);
            }
            ExpressionType::ArrayExpression { meta, elements }
        }
        Rule::object_literal => {
            let mut properties = vec![];
            for p in pair.into_inner() {
                properties.push(build_property_definition(p)?);
            }
            ExpressionType::ObjectExpression { meta, properties }
        }
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_function(pair, false)?))
        }
        Rule::this_expression => ExpressionType::ThisExpression { meta },
        Rule::identifier => ExpressionType::Identifier(build_identifier(&pair)),
        Rule::parenthesized_expression => {
            let e = pair
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| get_unexpected_error(50, &pair))?;
            build_ast_from_expression(e)?
        }
        _ => return Err(get_unexpected_error(51, &pair)),
    })
}

fn build_property_definition(pair: Pair<Rule>) -> Result<PropertyData, Error<Rule>> {
    Ok(match pair.as_rule() {
        Rule::spread_element => {
            let e = pair
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| get_unexpected_error(52, &pair))?;
            PropertyData::Spread(build_ast_from_assignment_expression(e)?)
        }
        Rule::shorthand_property => {
            let id = pair
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| get_unexpected_error(53, &pair))?;
            PropertyData::Property {
                key: PropertyKey::Named(id.as_str().to_string()),
                value: ExpressionType::Identifier(build_identifier(&id)),
            }
        }
        Rule::property_assignment => {
            let mut iter = pair.clone().into_inner();
            let key = build_property_name(expect_next(&mut iter, &pair)?)?;
            let value = build_ast_from_assignment_expression(expect_next(&mut iter, &pair)?)?;
            PropertyData::Property { key, value }
        }
        Rule::property_method => {
            let meta = get_meta(&pair);
            let mut iter = pair.clone().into_inner();
            let name_pair = expect_next(&mut iter, &pair)?;
            let params = build_formal_parameters(expect_next(&mut iter, &pair)?)?;
            let body = build_function_body(expect_next(&mut iter, &pair)?)?;
            let name_meta = get_meta(&name_pair);
            let key = build_property_name(name_pair)?;
            let id = match &key {
                PropertyKey::Named(n) => Some(IdentifierData {
                    name: n.to_string(),
                    meta: name_meta,
                }),
                PropertyKey::Computed(_) => None,
            };
            PropertyData::Property {
                key,
                value: ExpressionType::FunctionExpression(Rc::new(FunctionData {
                    meta,
                    id,
                    params,
                    body,
                    is_arrow: false,
                })),
            }
        }
        _ => return Err(get_unexpected_error(54, &pair)),
    })
}

fn build_property_name(pair: Pair<Rule>) -> Result<PropertyKey, Error<Rule>> {
    let inner = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| get_unexpected_error(55, &pair))?;
    Ok(match inner.as_rule() {
        Rule::identifier_name => PropertyKey::Named(inner.as_str().to_string()),
        Rule::string_literal => PropertyKey::Named(get_string_literal_value(&inner)?),
        Rule::numeric_literal => PropertyKey::Named(match parse_numeric_literal(&inner)? {
            NumberLiteralType::IntegerLiteral(i) => i.to_string(),
            NumberLiteralType::FloatLiteral(f) => f.to_string(),
        }),
        Rule::computed_property_name => {
            let e = inner
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| get_unexpected_error(56, &inner))?;
            PropertyKey::Computed(build_ast_from_assignment_expression(e)?)
        }
        _ => return Err(get_unexpected_error(57, &inner)),
    })
}

fn parse_numeric_literal(pair: &Pair<Rule>) -> Result<NumberLiteralType, Error<Rule>> {
    let s = pair.as_str();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return match i64::from_str_radix(hex, 16) {
            Ok(i) => Ok(NumberLiteralType::IntegerLiteral(i)),
            Err(_) => Ok(NumberLiteralType::FloatLiteral(
                hex.chars()
                    .filter_map(|c| c.to_digit(16))
                    .fold(0.0, |acc, d| acc * 16.0 + d as f64),
            )),
        };
    }
    if !s.contains(|c| c == '.' || c == 'e' || c == 'E') {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(NumberLiteralType::IntegerLiteral(i));
        }
    }
    s.parse::<f64>()
        .map(NumberLiteralType::FloatLiteral)
        .map_err(|_| get_error_at("Invalid or unexpected token", pair))
}

fn get_string_literal_value(pair: &Pair<Rule>) -> Result<String, Error<Rule>> {
    match pair.clone().into_inner().next() {
        Some(chars) => unescape(chars.as_str(), &chars),
        None => Ok(String::new()),
    }
}

fn unescape(raw: &str, pair: &Pair<Rule>) -> Result<String, Error<Rule>> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => break,
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // Line continuation.
            '\n' => {}
            'x' => {
                let hex: String = (0..2).filter_map(|_| chars.next()).collect();
                out.push(parse_code_point(&hex, pair)?);
            }
            'u' => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    (0..4).filter_map(|_| chars.next()).collect()
                };
                out.push(parse_code_point(&hex, pair)?);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn parse_code_point(hex: &str, pair: &Pair<Rule>) -> Result<char, Error<Rule>> {
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(std::char::from_u32)
        .ok_or_else(|| get_error_at("Invalid hexadecimal escape sequence", pair))
}
