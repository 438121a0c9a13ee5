use std::rc::Rc;

use crate::parser::ast::{
    FunctionData, Meta, StatementType, VariableDeclarationKind, VariableDeclarationOrExpression,
};

/// Declarations that belong to the enclosing function scope: `var` names and
/// function declarations, collected through nested blocks but not through
/// nested functions.
pub(crate) struct VarScopedDeclarations {
    pub(crate) var_names: Vec<String>,
    pub(crate) functions: Vec<Rc<FunctionData>>,
}

pub(crate) fn get_var_scoped_declarations(body: &[StatementType]) -> VarScopedDeclarations {
    let mut d = VarScopedDeclarations {
        var_names: vec![],
        functions: vec![],
    };
    for s in body {
        collect_var_scoped(s, &mut d);
    }
    d
}

fn push_var_name(d: &mut VarScopedDeclarations, name: &str) {
    if !d.var_names.iter().any(|n| n == name) {
        d.var_names.push(name.to_string());
    }
}

fn collect_var_scoped(s: &StatementType, d: &mut VarScopedDeclarations) {
    match s {
        StatementType::VariableDeclaration(v) => {
            if v.kind == VariableDeclarationKind::Var {
                for decl in &v.declarations {
                    push_var_name(d, &decl.id.name);
                }
            }
        }
        StatementType::FunctionDeclaration(f) => d.functions.push(f.clone()),
        StatementType::BlockStatement(b) => {
            for s in &b.body {
                collect_var_scoped(s, d);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_scoped(consequent, d);
            if let Some(a) = alternate {
                collect_var_scoped(a, d);
            }
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            for s in &block.body {
                collect_var_scoped(s, d);
            }
            if let Some(h) = handler {
                for s in &h.body.body {
                    collect_var_scoped(s, d);
                }
            }
            if let Some(f) = finalizer {
                for s in &f.body {
                    collect_var_scoped(s, d);
                }
            }
        }
        StatementType::WhileStatement { body, .. } | StatementType::DoWhileStatement { body, .. } => {
            collect_var_scoped(body, d)
        }
        StatementType::ForStatement { init, body, .. } => {
            if let Some(VariableDeclarationOrExpression::VariableDeclaration(v)) = init {
                if v.kind == VariableDeclarationKind::Var {
                    for decl in &v.declarations {
                        push_var_name(d, &decl.id.name);
                    }
                }
            }
            collect_var_scoped(body, d);
        }
        StatementType::ForInStatement { left, body, .. }
        | StatementType::ForOfStatement { left, body, .. } => {
            if left.kind == Some(VariableDeclarationKind::Var) {
                push_var_name(d, &left.id.name);
            }
            collect_var_scoped(body, d);
        }
        _ => {}
    }
}

/// Finds the first statement that is not allowed where it appears: a `return`
/// outside of a function body (unless `allow_return`), or a `break`/`continue`
/// outside of a loop. Returns the offending location and the error message.
pub(crate) fn find_illegal_statement(
    body: &[StatementType],
    allow_return: bool,
) -> Option<(Meta, &'static str)> {
    body.iter()
        .find_map(|s| check_statement(s, allow_return, false))
}

fn check_statement(
    s: &StatementType,
    allow_return: bool,
    in_loop: bool,
) -> Option<(Meta, &'static str)> {
    match s {
        StatementType::ReturnStatement { meta, .. } if !allow_return => {
            Some((meta.clone(), "Illegal return statement"))
        }
        StatementType::BreakStatement { meta } if !in_loop => {
            Some((meta.clone(), "Illegal break statement"))
        }
        StatementType::ContinueStatement { meta } if !in_loop => Some((
            meta.clone(),
            "Illegal continue statement: no surrounding iteration statement",
        )),
        StatementType::BlockStatement(b) => b
            .body
            .iter()
            .find_map(|s| check_statement(s, allow_return, in_loop)),
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => check_statement(consequent, allow_return, in_loop).or_else(|| {
            alternate
                .as_ref()
                .and_then(|a| check_statement(a, allow_return, in_loop))
        }),
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => block
            .body
            .iter()
            .chain(handler.iter().flat_map(|h| h.body.body.iter()))
            .chain(finalizer.iter().flat_map(|f| f.body.iter()))
            .find_map(|s| check_statement(s, allow_return, in_loop)),
        StatementType::WhileStatement { body, .. }
        | StatementType::DoWhileStatement { body, .. }
        | StatementType::ForStatement { body, .. }
        | StatementType::ForInStatement { body, .. }
        | StatementType::ForOfStatement { body, .. } => check_statement(body, allow_return, true),
        _ => None,
    }
}
