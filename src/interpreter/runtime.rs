use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use tracing::debug;

use crate::ast::{
    AssignTarget, BinaryOperator, Expression, FunctionCall, Receiver, Statement, VariableType,
};

use super::{Console, RuntimeError, Value};

type EvalResult<T> = std::result::Result<T, RuntimeError>;

/// Flat name-to-value bindings for one run. Blocks do not open scopes, so a
/// declaration stays visible for the rest of the run.
pub type Environment = FxHashMap<String, Value>;

/// Control-flow marker for statement execution.
pub(super) enum Flow {
    Continue,
    Return(Value),
}

/// Runtime executor for interpreted statements and expressions.
pub(super) struct Runtime<'c> {
    console: &'c mut dyn Console,
}

impl<'c> Runtime<'c> {
    pub(super) fn new(console: &'c mut dyn Console) -> Self {
        Self { console }
    }

    pub(super) fn exec_block(
        &mut self,
        body: &[Statement],
        environment: &mut Environment,
    ) -> EvalResult<Flow> {
        for statement in body {
            if let Flow::Return(value) = self.exec_statement(statement, environment)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Continue)
    }

    fn exec_statement(
        &mut self,
        statement: &Statement,
        environment: &mut Environment,
    ) -> EvalResult<Flow> {
        match statement {
            Statement::Comment(_) => {}
            Statement::VariableDeclaration {
                variable_type,
                name,
                initializer,
            } => {
                let value = match initializer {
                    Some(value) => self.eval_expression(value, environment)?,
                    None if *variable_type == VariableType::Define => {
                        Value::String(String::new())
                    }
                    None => Value::Absent,
                };
                environment.insert(name.clone(), value);
            }
            Statement::Expression(expression) => {
                self.eval_expression(expression, environment)?;
            }
            Statement::Return(value) => {
                let value = match value {
                    Some(value) => self.eval_expression(value, environment)?,
                    None => Value::Absent,
                };
                return Ok(Flow::Return(value));
            }
            Statement::If(conditional) => {
                let condition = self.eval_expression(&conditional.condition, environment)?;
                if truthy(&condition)? {
                    return self.exec_block(&conditional.body, environment);
                }
                for clause in &conditional.else_ifs {
                    let condition = self.eval_expression(&clause.condition, environment)?;
                    if truthy(&condition)? {
                        return self.exec_block(&clause.body, environment);
                    }
                }
                if let Some(else_body) = &conditional.else_body {
                    return self.exec_block(else_body, environment);
                }
            }
            Statement::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                self.exec_statement(initializer, environment)?;
                loop {
                    let value = self.eval_expression(condition, environment)?;
                    if !truthy(&value)? {
                        break;
                    }
                    if let Flow::Return(value) = self.exec_block(body, environment)? {
                        return Ok(Flow::Return(value));
                    }
                    self.eval_expression(increment, environment)?;
                }
            }
            Statement::ForIn {
                variable,
                collection,
                body,
                ..
            } => {
                for item in self.iteration_items(collection, environment)? {
                    environment.insert(variable.clone(), item);
                    if let Flow::Return(value) = self.exec_block(body, environment)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Statement::While { condition, body } => loop {
                let value = self.eval_expression(condition, environment)?;
                if !truthy(&value)? {
                    break;
                }
                if let Flow::Return(value) = self.exec_block(body, environment)? {
                    return Ok(Flow::Return(value));
                }
            },
            Statement::DoWhile { body, condition } => loop {
                if let Flow::Return(value) = self.exec_block(body, environment)? {
                    return Ok(Flow::Return(value));
                }
                let value = self.eval_expression(condition, environment)?;
                if !truthy(&value)? {
                    break;
                }
            },
            Statement::Switch { scrutinee, cases } => {
                let subject = self.eval_expression(scrutinee, environment)?;
                // The first matching case runs alone; there is no fallthrough.
                for case in cases {
                    if self.eval_expression(&case.value, environment)? == subject {
                        return self.exec_block(&case.body, environment);
                    }
                }
                return Err(RuntimeError::NoMatchingCase {
                    value: subject.render(),
                });
            }
            Statement::TryHappen {
                body,
                error_type,
                binding,
                handler,
            } => {
                return match self.exec_block(body, environment) {
                    Err(error) if error.is_caught_by(error_type) => {
                        debug!(kind = error.kind(), %binding, "caught runtime error");
                        environment.insert(binding.clone(), Value::String(error.to_string()));
                        self.exec_block(handler, environment)
                    }
                    result => result,
                };
            }
        }
        Ok(Flow::Continue)
    }

    /// Produces the values a for-in loop binds: `range(...)` bounds, yielded
    /// one at a time, or the characters of a string.
    fn iteration_items(
        &mut self,
        collection: &Expression,
        environment: &mut Environment,
    ) -> EvalResult<IterationItems> {
        if let Expression::Call(call) = collection
            && call.receiver == Receiver::None
            && call.name == "range"
        {
            let bounds = self.eval_arguments(&call.arguments, environment)?;
            return integer_range(&bounds).map(IterationItems::Range);
        }
        match self.eval_expression(collection, environment)? {
            Value::String(text) => Ok(IterationItems::Characters(
                text.chars().collect::<Vec<_>>().into_iter(),
            )),
            other => Err(RuntimeError::NotIterable {
                type_name: other.type_name(),
            }),
        }
    }

    fn eval_expression(
        &mut self,
        expression: &Expression,
        environment: &mut Environment,
    ) -> EvalResult<Value> {
        match expression {
            Expression::Identifier(name) => environment
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() }),
            Expression::Integer(value) => Ok(Value::Integer(*value)),
            Expression::Char(value) => Ok(Value::Character(*value)),
            Expression::Boolean(value) => Ok(Value::Boolean(*value)),
            Expression::String(value) => Ok(Value::String(value.clone())),
            Expression::Float(_) => Err(unsupported("float literal")),
            Expression::Double(_) => Err(unsupported("double literal")),
            Expression::SelfInstance => Err(unsupported("instance reference")),
            Expression::Binary { left, op, right } => {
                self.eval_binary(left, *op, right, environment)
            }
            Expression::Assignment { target, value } => match target {
                AssignTarget::Identifier(name) => {
                    let value = self.eval_expression(value, environment)?;
                    environment.insert(name.clone(), value.clone());
                    Ok(value)
                }
                AssignTarget::Member { .. } => Err(unsupported("member assignment")),
            },
            Expression::Call(call) => self.eval_call(call, environment),
            Expression::NamespaceAccess { namespace, member } => {
                Err(unsupported(&format!("namespace access '{namespace}:{member}'")))
            }
            Expression::InstanceCreation { class, .. } => {
                Err(unsupported(&format!("instance creation of '{class}'")))
            }
            Expression::InstanceAccess { member, .. } => {
                Err(unsupported(&format!("member access '.{member}'")))
            }
        }
    }

    fn eval_binary(
        &mut self,
        left: &Expression,
        op: BinaryOperator,
        right: &Expression,
        environment: &mut Environment,
    ) -> EvalResult<Value> {
        match op {
            BinaryOperator::And => {
                let left = self.eval_expression(left, environment)?;
                if !truthy(&left)? {
                    return Ok(Value::Boolean(false));
                }
                let right = self.eval_expression(right, environment)?;
                Ok(Value::Boolean(truthy(&right)?))
            }
            BinaryOperator::Or => {
                let left = self.eval_expression(left, environment)?;
                if truthy(&left)? {
                    return Ok(Value::Boolean(true));
                }
                let right = self.eval_expression(right, environment)?;
                Ok(Value::Boolean(truthy(&right)?))
            }
            _ => {
                let left = self.eval_expression(left, environment)?;
                let right = self.eval_expression(right, environment)?;
                apply_binary(op, left, right)
            }
        }
    }

    fn eval_call(&mut self, call: &FunctionCall, environment: &mut Environment) -> EvalResult<Value> {
        match &call.receiver {
            Receiver::Named(receiver) if receiver == "System" => match call.name.as_str() {
                "print" => {
                    // Every argument is evaluated before anything is written.
                    let line = self
                        .eval_arguments(&call.arguments, environment)?
                        .iter()
                        .map(Value::render)
                        .collect::<String>();
                    self.console.write_line(&line).map_err(console_error)?;
                    Ok(Value::Absent)
                }
                "input" => {
                    let prompt = match call.arguments.as_slice() {
                        [] => None,
                        [prompt] => Some(self.eval_expression(prompt, environment)?),
                        _ => {
                            return Err(RuntimeError::InvalidArgumentCount {
                                name: "System.input".to_string(),
                                expected: "0 or 1",
                                found: call.arguments.len(),
                            });
                        }
                    };
                    if let Some(prompt) = prompt {
                        self.console
                            .write_prompt(&prompt.render())
                            .map_err(console_error)?;
                    }
                    let line = self.console.read_line().map_err(console_error)?;
                    Ok(Value::String(line.unwrap_or_default()))
                }
                other => Err(RuntimeError::UnsupportedCall {
                    name: format!("System.{other}"),
                }),
            },
            Receiver::Namespace(namespace) if namespace == "type" => {
                let value = match call.arguments.as_slice() {
                    [argument] => self.eval_expression(argument, environment)?,
                    _ => {
                        return Err(RuntimeError::InvalidArgumentCount {
                            name: format!("type:{}", call.name),
                            expected: "1",
                            found: call.arguments.len(),
                        });
                    }
                };
                convert(&call.name, value)
            }
            Receiver::None => Err(RuntimeError::UnsupportedCall {
                name: call.name.clone(),
            }),
            Receiver::Named(receiver) if call.name == "replace" => {
                self.eval_replace(receiver, &call.arguments, environment)
            }
            Receiver::Named(receiver) => Err(RuntimeError::UnsupportedCall {
                name: format!("{receiver}.{}", call.name),
            }),
            Receiver::Namespace(namespace) => Err(RuntimeError::UnsupportedCall {
                name: format!("{namespace}:{}", call.name),
            }),
            Receiver::SelfInstance => Err(RuntimeError::UnsupportedCall {
                name: format!("instance.{}", call.name),
            }),
        }
    }

    /// `text.replace(old, new)` replaces every occurrence of `old`. An empty
    /// `old` leaves the text unchanged.
    fn eval_replace(
        &mut self,
        receiver: &str,
        arguments: &[Expression],
        environment: &mut Environment,
    ) -> EvalResult<Value> {
        let text = match environment.get(receiver) {
            Some(Value::String(text)) => text.clone(),
            Some(_) => {
                return Err(RuntimeError::UnsupportedCall {
                    name: format!("{receiver}.replace"),
                });
            }
            None => {
                return Err(RuntimeError::UndefinedVariable {
                    name: receiver.to_string(),
                });
            }
        };
        let arguments = self.eval_arguments(arguments, environment)?;
        let (old, new) = match arguments.as_slice() {
            [Value::String(old), Value::String(new)] => (old, new),
            [old, new] => {
                return Err(RuntimeError::TypeMismatch {
                    operation: "replace",
                    left: old.type_name(),
                    right: new.type_name(),
                });
            }
            _ => {
                return Err(RuntimeError::InvalidArgumentCount {
                    name: format!("{receiver}.replace"),
                    expected: "2",
                    found: arguments.len(),
                });
            }
        };
        if old.is_empty() {
            return Ok(Value::String(text));
        }
        Ok(Value::String(text.replace(old.as_str(), new)))
    }

    fn eval_arguments(
        &mut self,
        arguments: &[Expression],
        environment: &mut Environment,
    ) -> EvalResult<Vec<Value>> {
        arguments
            .iter()
            .map(|argument| self.eval_expression(argument, environment))
            .collect()
    }
}

fn apply_binary(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
    let symbol = op.symbol();
    match op {
        // `+` always concatenates renderings, even for two integers.
        BinaryOperator::Add => Ok(Value::String(left.render() + &right.render())),
        BinaryOperator::Equal => Ok(Value::Boolean(left == right)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(left != right)),
        BinaryOperator::Xor => Ok(Value::Boolean(truthy(&left)? != truthy(&right)?)),
        BinaryOperator::Less
        | BinaryOperator::LessEqual
        | BinaryOperator::Greater
        | BinaryOperator::GreaterEqual => {
            let ordering = compare(symbol, &left, &right)?;
            let result = match op {
                BinaryOperator::Less => ordering == Ordering::Less,
                BinaryOperator::LessEqual => ordering != Ordering::Greater,
                BinaryOperator::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Boolean(result))
        }
        _ => {
            let (Value::Integer(left), Value::Integer(right)) = (&left, &right) else {
                return Err(RuntimeError::TypeMismatch {
                    operation: symbol,
                    left: left.type_name(),
                    right: right.type_name(),
                });
            };
            let (left, right) = (*left, *right);
            let overflow = RuntimeError::IntegerOverflow { operation: symbol };
            let result = match op {
                BinaryOperator::Sub => left.checked_sub(right),
                BinaryOperator::Mul => left.checked_mul(right),
                BinaryOperator::Div | BinaryOperator::Mod if right == 0 => {
                    return Err(RuntimeError::DivisionByZero);
                }
                BinaryOperator::Div => left.checked_div(right),
                BinaryOperator::Mod => left.checked_rem(right),
                BinaryOperator::ShiftLeft => u32::try_from(right)
                    .ok()
                    .and_then(|amount| left.checked_shl(amount)),
                BinaryOperator::ShiftRight => u32::try_from(right)
                    .ok()
                    .and_then(|amount| left.checked_shr(amount)),
                _ => None,
            };
            result.map(Value::Integer).ok_or(overflow)
        }
    }
}

fn compare(operation: &'static str, left: &Value, right: &Value) -> EvalResult<Ordering> {
    match (left, right) {
        (Value::Integer(left), Value::Integer(right)) => Ok(left.cmp(right)),
        (Value::Character(left), Value::Character(right)) => Ok(left.cmp(right)),
        (Value::String(left), Value::String(right)) => Ok(left.cmp(right)),
        _ => Err(RuntimeError::TypeMismatch {
            operation,
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn truthy(value: &Value) -> EvalResult<bool> {
    match value {
        Value::Boolean(value) => Ok(*value),
        Value::Integer(value) => Ok(*value != 0),
        other => Err(RuntimeError::NotACondition {
            type_name: other.type_name(),
        }),
    }
}

/// Values bound by one for-in loop.
pub(super) enum IterationItems {
    Range(IntegerRange),
    Characters(std::vec::IntoIter<char>),
}

impl Iterator for IterationItems {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            IterationItems::Range(range) => range.next().map(Value::Integer),
            IterationItems::Characters(characters) => characters.next().map(Value::Character),
        }
    }
}

/// Half-open integer range with a non-zero step. Iteration stops early if
/// the next value would overflow.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct IntegerRange {
    next: Option<i64>,
    end: i64,
    step: i64,
}

impl Iterator for IntegerRange {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let current = self.next?;
        let in_bounds =
            (self.step > 0 && current < self.end) || (self.step < 0 && current > self.end);
        if !in_bounds {
            self.next = None;
            return None;
        }
        self.next = current.checked_add(self.step);
        Some(current)
    }
}

fn integer_range(bounds: &[Value]) -> EvalResult<IntegerRange> {
    let integers = bounds
        .iter()
        .map(|bound| match bound {
            Value::Integer(value) => Ok(*value),
            other => Err(RuntimeError::InvalidConversion {
                value: other.render(),
                target: "int",
            }),
        })
        .collect::<EvalResult<Vec<_>>>()?;
    let (start, end, step) = match integers.as_slice() {
        [end] => (0, *end, 1),
        [start, end] => (*start, *end, 1),
        [start, end, step] => (*start, *end, *step),
        _ => {
            return Err(RuntimeError::InvalidArgumentCount {
                name: "range".to_string(),
                expected: "1 to 3",
                found: bounds.len(),
            });
        }
    };
    if step == 0 {
        return Err(RuntimeError::InvalidRange);
    }
    Ok(IntegerRange {
        next: Some(start),
        end,
        step,
    })
}

fn convert(target: &str, value: Value) -> EvalResult<Value> {
    let invalid = |value: &Value, target: &'static str| RuntimeError::InvalidConversion {
        value: value.render(),
        target,
    };
    match target {
        "int" => match &value {
            Value::Integer(integer) => Ok(Value::Integer(*integer)),
            Value::Character(character) => Ok(Value::Integer(i64::from(u32::from(*character)))),
            Value::Boolean(flag) => Ok(Value::Integer(i64::from(*flag))),
            Value::String(text) => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| invalid(&value, "int")),
            Value::Absent => Err(invalid(&value, "int")),
        },
        "string" => Ok(Value::String(value.render())),
        "char" => match &value {
            Value::Character(character) => Ok(Value::Character(*character)),
            Value::Integer(code) => u32::try_from(*code)
                .ok()
                .and_then(char::from_u32)
                .map(Value::Character)
                .ok_or_else(|| invalid(&value, "char")),
            Value::String(text) => text
                .chars()
                .next()
                .map(Value::Character)
                .ok_or_else(|| invalid(&value, "char")),
            Value::Boolean(_) | Value::Absent => Err(invalid(&value, "char")),
        },
        other => Err(RuntimeError::UnsupportedCall {
            name: format!("type:{other}"),
        }),
    }
}

fn unsupported(construct: &str) -> RuntimeError {
    RuntimeError::UnsupportedExpression {
        construct: construct.to_string(),
    }
}

fn console_error(error: std::io::Error) -> RuntimeError {
    RuntimeError::Console {
        message: error.to_string(),
    }
}
