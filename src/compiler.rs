use rustc_hash::FxHashSet;

use crate::{
    ast::{dotted_parts, Expr, Item, Module, Statement},
    bytecode::{CompiledFunction, Instruction, OpCode},
    span::Span,
    tokenizer::TokenType,
};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Empty expression at {span}")]
    EmptyExpression { span: Span },
    #[error("Expected an operand at {span} but found \"{found}\"")]
    ExpectedOperand { found: String, span: Span },
    #[error("Expected an operator at {span} but found \"{found}\"")]
    ExpectedOperator { found: String, span: Span },
    #[error("Operator \"{operator}\" at {span} has no right-hand operand")]
    TrailingOperator { operator: String, span: Span },
    #[error("Identifier \"{name}\" at {span} has an empty component around a dot")]
    MalformedName { name: String, span: Span },
    #[error("Function \"{name}\" at {span} is declared more than once")]
    DuplicateFunction { name: String, span: Span },
    #[error("Internal compiler error: cannot lower {node}")]
    Internal { node: String },
}

impl CompileError {
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal { .. })
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, CompileError::DuplicateFunction { .. })
    }
}

/// An expression after phase 1. Invocations and subexpressions keep their
/// shape until phase 2 splices them into the surrounding instructions.
#[derive(Debug, Clone, PartialEq)]
enum Lowered {
    Instruction(Instruction),
    Invocation { name: String, args: Vec<Vec<Lowered>> },
    Subexpression(Vec<Lowered>),
}

/// A statement whose expression slots have been lowered by phase 1.
#[derive(Debug)]
enum Annotated<'a> {
    If {
        cond: Vec<Lowered>,
        cond_true: Vec<Annotated<'a>>,
        cond_false: Vec<Annotated<'a>>,
    },
    Assignment {
        body: Vec<Lowered>,
    },
    Declaration,
    Unlowerable(&'a Statement),
}

enum Operator {
    Arithmetic(OpCode),
    Comparison(OpCode),
}

/// Compiles every function of a module, in source order. Other items carry
/// no code.
pub fn compile(module: &Module) -> Result<Vec<CompiledFunction>, CompileError> {
    let mut seen = FxHashSet::default();
    let mut functions = Vec::new();

    for item in &module.items {
        let Item::Function {
            name, body, span, ..
        } = item
        else {
            tracing::trace!(item = %item, "skipping item without code");
            continue;
        };
        if !seen.insert(name.as_str()) {
            return Err(CompileError::DuplicateFunction {
                name: name.clone(),
                span: *span,
            });
        }
        functions.push(compile_function(name, body)?);
    }

    tracing::debug!(functions = functions.len(), "compiled module");
    Ok(functions)
}

pub fn compile_function(
    name: &str,
    body: &[Statement],
) -> Result<CompiledFunction, CompileError> {
    let annotated = body.iter().map(annotate).collect::<Result<Vec<_>, _>>()?;

    let mut instructions = Vec::new();
    for statement in annotated {
        collapse(statement, &mut instructions)?;
    }
    instructions.push(Instruction::simple(OpCode::Return));

    tracing::trace!(name, instructions = instructions.len(), "compiled function");

    let function = CompiledFunction {
        name: name.to_string(),
        instructions,
    };

    #[cfg(feature = "disassemble")]
    tracing::debug!("\n{}", function.disassemble());

    Ok(function)
}

/// Lowers and flattens a single expression.
pub fn compile_expression(exprs: &[Expr], span: Span) -> Result<Vec<Instruction>, CompileError> {
    let mut out = Vec::new();
    collapse_expression(lower_expression(exprs, span)?, &mut out);
    Ok(out)
}

fn annotate(statement: &Statement) -> Result<Annotated<'_>, CompileError> {
    Ok(match statement {
        Statement::If {
            cond,
            cond_true,
            cond_false,
            span,
        } => Annotated::If {
            cond: lower_expression(cond, *span)?,
            cond_true: cond_true.iter().map(annotate).collect::<Result<_, _>>()?,
            cond_false: cond_false.iter().map(annotate).collect::<Result<_, _>>()?,
        },
        Statement::Assignment { dst, body, span } => {
            let mut body = lower_expression(body, *span)?;
            body.push(Lowered::Instruction(match dst {
                Some(dst) => Instruction::store_local(dst.as_str()),
                None => Instruction::simple(OpCode::PopOne),
            }));
            Annotated::Assignment { body }
        }
        Statement::Declaration { .. } => Annotated::Declaration,
        Statement::For { .. } | Statement::Stray(_) => Annotated::Unlowerable(statement),
    })
}

/// Loads the first operand, then takes operator/operand pairs left to right.
/// Arithmetic is emitted right after its right operand. A comparison waits
/// until the next comparison or the end of the expression.
fn lower_expression(exprs: &[Expr], span: Span) -> Result<Vec<Lowered>, CompileError> {
    let mut out = Vec::new();
    let mut exprs = exprs.iter();

    let Some(first) = exprs.next() else {
        return Err(CompileError::EmptyExpression { span });
    };
    load_operand(first, &mut out)?;

    let mut pending_comparison = None;
    while let Some(operator) = exprs.next() {
        let operator_kind = operator_kind(operator)?;
        let Some(operand) = exprs.next() else {
            return Err(CompileError::TrailingOperator {
                operator: operator.to_string(),
                span: operator.span(),
            });
        };
        load_operand(operand, &mut out)?;

        match operator_kind {
            Operator::Arithmetic(opcode) => {
                out.push(Lowered::Instruction(Instruction::simple(opcode)));
            }
            Operator::Comparison(opcode) => {
                if let Some(previous) = pending_comparison.replace(opcode) {
                    out.push(Lowered::Instruction(Instruction::simple(previous)));
                }
            }
        }
    }

    if let Some(opcode) = pending_comparison {
        out.push(Lowered::Instruction(Instruction::simple(opcode)));
    }

    Ok(out)
}

fn load_operand(expr: &Expr, out: &mut Vec<Lowered>) -> Result<(), CompileError> {
    match expr {
        Expr::Token(token) => match token.token_type() {
            TokenType::Name(name) => {
                let Some(parts) = dotted_parts(name) else {
                    return Err(CompileError::MalformedName {
                        name: name.clone(),
                        span: token.span,
                    });
                };
                let mut parts = parts.into_iter();
                if let Some(local) = parts.next() {
                    out.push(Lowered::Instruction(Instruction::load_local(local)));
                }
                out.extend(parts.map(|member| Lowered::Instruction(Instruction::load_member(member))));
            }
            TokenType::Number(number) => {
                out.push(Lowered::Instruction(Instruction::load_num(*number)));
            }
            TokenType::String(text) => {
                out.push(Lowered::Instruction(Instruction::load_string(text.as_str())));
            }
            _ => {
                return Err(CompileError::ExpectedOperand {
                    found: token.to_string(),
                    span: token.span,
                })
            }
        },
        Expr::Invocation {
            name_parts,
            args,
            span,
        } => {
            if name_parts.is_empty() || name_parts.iter().any(String::is_empty) {
                return Err(CompileError::MalformedName {
                    name: name_parts.join("."),
                    span: *span,
                });
            }
            let args = args
                .iter()
                .map(|arg| lower_expression(arg, *span))
                .collect::<Result<_, _>>()?;
            out.push(Lowered::Invocation {
                name: name_parts.join("."),
                args,
            });
        }
        Expr::Subexpression { body, span } => {
            out.push(Lowered::Subexpression(lower_expression(body, *span)?));
        }
    }
    Ok(())
}

fn operator_kind(expr: &Expr) -> Result<Operator, CompileError> {
    let opcode = match expr {
        Expr::Token(token) => match token.token_type() {
            TokenType::Plus => Operator::Arithmetic(OpCode::Add),
            TokenType::Minus => Operator::Arithmetic(OpCode::Subtract),
            TokenType::Star => Operator::Arithmetic(OpCode::Multiply),
            TokenType::Slash => Operator::Arithmetic(OpCode::Divide),
            TokenType::Percent => Operator::Arithmetic(OpCode::Modulo),
            TokenType::Greater => Operator::Comparison(OpCode::Greater),
            TokenType::Less => Operator::Comparison(OpCode::Less),
            TokenType::Equal => Operator::Comparison(OpCode::Equal),
            TokenType::GreaterEqual => Operator::Comparison(OpCode::EqualOrGreater),
            TokenType::LessEqual => Operator::Comparison(OpCode::EqualOrLess),
            _ => return Err(expected_operator(expr)),
        },
        _ => return Err(expected_operator(expr)),
    };
    Ok(opcode)
}

fn expected_operator(expr: &Expr) -> CompileError {
    CompileError::ExpectedOperator {
        found: expr.to_string(),
        span: expr.span(),
    }
}

/// Phase 2: flattens one annotated statement onto `out`.
fn collapse(statement: Annotated<'_>, out: &mut Vec<Instruction>) -> Result<(), CompileError> {
    match statement {
        Annotated::If {
            cond,
            cond_true,
            cond_false,
        } => {
            collapse_expression(cond, out);

            let mut true_branch = Vec::new();
            for statement in cond_true {
                collapse(statement, &mut true_branch)?;
            }
            let mut false_branch = Vec::new();
            for statement in cond_false {
                collapse(statement, &mut false_branch)?;
            }

            // Offsets count from the jump instruction itself.
            out.push(Instruction::jump_if_false(true_branch.len() + 2));
            out.extend(true_branch);
            if !false_branch.is_empty() {
                out.push(Instruction::jump(false_branch.len() + 1));
                out.extend(false_branch);
            }
        }
        Annotated::Assignment { body } => collapse_expression(body, out),
        Annotated::Declaration => {}
        Annotated::Unlowerable(node) => {
            return Err(CompileError::Internal {
                node: format!("{node:?}"),
            })
        }
    }
    Ok(())
}

fn collapse_expression(lowered: Vec<Lowered>, out: &mut Vec<Instruction>) {
    for item in lowered {
        match item {
            Lowered::Instruction(instruction) => out.push(instruction),
            Lowered::Invocation { name, args } => {
                for arg in args {
                    collapse_expression(arg, out);
                }
                out.push(Instruction::invoke(name));
            }
            Lowered::Subexpression(body) => collapse_expression(body, out),
        }
    }
}
