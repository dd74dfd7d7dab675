use super::{ParseResult, Parser, SyntaxError};
use crate::ast::{
    AssignTarget, BinaryOperator, CLASS_RECEIVER_NAME, Expression, FunctionCall, RECEIVER_NAME,
    Receiver,
};
use crate::token::{Keyword, TokenKind};

type Operand<'a> = fn(&mut Parser<'a>) -> ParseResult<Expression>;

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_assignment()
    }

    /// Assignment is right-associative and binds loosest. Compound forms
    /// such as `a += b` become `a = a + b`.
    fn parse_assignment(&mut self) -> ParseResult<Expression> {
        let target = self.parse_comparison()?;
        let Some(compound) = assignment_operator(self.current.kind) else {
            return Ok(target);
        };

        let (line, column) = self.position();
        let target = match target {
            Expression::Identifier(name) => AssignTarget::Identifier(name),
            Expression::InstanceAccess { instance, member } => {
                AssignTarget::Member { instance, member }
            }
            _ => return Err(SyntaxError::InvalidAssignmentTarget { line, column }.into()),
        };
        self.advance()?;

        let value = self.parse_assignment()?;
        let value = match compound {
            Some(op) => Expression::Binary {
                left: Box::new(target.to_expression()),
                op,
                right: Box::new(value),
            },
            None => value,
        };
        Ok(Expression::Assignment {
            target,
            value: Box::new(value),
        })
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_logical, comparison_operator)
    }

    fn parse_logical(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_shift, logical_operator)
    }

    fn parse_shift(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_additive, shift_operator)
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_multiplicative, additive_operator)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_primary, multiplicative_operator)
    }

    /// One left-associative precedence level.
    fn parse_binary_level(
        &mut self,
        operand: Operand<'a>,
        operator: fn(TokenKind) -> Option<BinaryOperator>,
    ) -> ParseResult<Expression> {
        let mut left = operand(self)?;
        while let Some(op) = operator(self.current.kind) {
            self.advance()?;
            let right = operand(self)?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current.kind {
            TokenKind::Integer => self.parse_literal("integer", |text| {
                text.parse::<i64>().ok().map(Expression::Integer)
            }),
            TokenKind::Float => self.parse_literal("float", |text| {
                text.parse::<f32>().ok().map(Expression::Float)
            }),
            TokenKind::Double => self.parse_literal("double", |text| {
                text.parse::<f64>().ok().map(Expression::Double)
            }),
            TokenKind::Char => self.parse_literal("char", |text| {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(character), None) => Some(Expression::Char(character)),
                    _ => None,
                }
            }),
            TokenKind::String => Ok(Expression::String(self.advance()?.lexeme.to_string())),
            TokenKind::Keyword(Keyword::True) => {
                self.advance()?;
                Ok(Expression::Boolean(true))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance()?;
                Ok(Expression::Boolean(false))
            }
            TokenKind::Keyword(Keyword::Instance) => self.parse_instance_expression(),
            TokenKind::Keyword(Keyword::Class) => {
                self.advance()?;
                self.consume(TokenKind::Dot)?;
                let name = self.expect_member_name()?;
                let arguments = self.parse_arguments()?;
                Ok(Expression::Call(FunctionCall {
                    receiver: Receiver::Named(CLASS_RECEIVER_NAME.to_string()),
                    name,
                    arguments,
                }))
            }
            TokenKind::Identifier => {
                let name = self.advance()?.lexeme.to_string();
                self.finish_named(name)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_literal(
        &mut self,
        kind: &'static str,
        convert: impl FnOnce(&str) -> Option<Expression>,
    ) -> ParseResult<Expression> {
        let (line, column) = self.position();
        let token = self.advance()?;
        convert(token.lexeme).ok_or_else(|| {
            SyntaxError::InvalidLiteral {
                kind,
                literal: token.lexeme.to_string(),
                line,
                column,
            }
            .into()
        })
    }

    /// `instance Ns:Class(args)` creates an object; `instance.x` and
    /// `instance.m(args)` address the current receiver; a bare `instance`
    /// is an ordinary identifier, as when passed to a base initializer.
    fn parse_instance_expression(&mut self) -> ParseResult<Expression> {
        self.consume_keyword(Keyword::Instance)?;
        match self.current.kind {
            TokenKind::Identifier => {
                let first = self.expect_identifier()?;
                let (namespace, class) = if self.check(TokenKind::Colon) {
                    self.advance()?;
                    (Some(first), self.expect_identifier()?)
                } else {
                    (None, first)
                };
                let arguments = self.parse_arguments()?;
                Ok(Expression::InstanceCreation {
                    namespace,
                    class,
                    arguments,
                })
            }
            _ => self.finish_named(RECEIVER_NAME.to_string()),
        }
    }

    /// Handles what may follow a name: `:member`, `.member`, or a call.
    fn finish_named(&mut self, name: String) -> ParseResult<Expression> {
        match self.current.kind {
            TokenKind::Colon => {
                self.advance()?;
                let member = self.expect_member_name()?;
                if self.check(TokenKind::LParen) {
                    let arguments = self.parse_arguments()?;
                    Ok(Expression::Call(FunctionCall {
                        receiver: Receiver::Namespace(name),
                        name: member,
                        arguments,
                    }))
                } else {
                    Ok(Expression::NamespaceAccess {
                        namespace: name,
                        member,
                    })
                }
            }
            TokenKind::Dot => {
                self.advance()?;
                let member = self.expect_member_name()?;
                if self.check(TokenKind::LParen) {
                    let arguments = self.parse_arguments()?;
                    Ok(Expression::Call(FunctionCall {
                        receiver: Receiver::Named(name),
                        name: member,
                        arguments,
                    }))
                } else {
                    Ok(Expression::InstanceAccess {
                        instance: Box::new(Expression::Identifier(name)),
                        member,
                    })
                }
            }
            TokenKind::LParen => {
                let arguments = self.parse_arguments()?;
                Ok(Expression::Call(FunctionCall {
                    receiver: Receiver::None,
                    name,
                    arguments,
                }))
            }
            _ => Ok(Expression::Identifier(name)),
        }
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Expression>> {
        self.consume(TokenKind::LParen)?;
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(arguments)
    }
}

/// `Some(None)` for plain `=`, `Some(Some(op))` for a compound assignment.
fn assignment_operator(kind: TokenKind) -> Option<Option<BinaryOperator>> {
    match kind {
        TokenKind::Assign => Some(None),
        TokenKind::PlusAssign => Some(Some(BinaryOperator::Add)),
        TokenKind::MinusAssign => Some(Some(BinaryOperator::Sub)),
        TokenKind::StarAssign => Some(Some(BinaryOperator::Mul)),
        TokenKind::SlashAssign => Some(Some(BinaryOperator::Div)),
        TokenKind::PercentAssign => Some(Some(BinaryOperator::Mod)),
        _ => None,
    }
}

fn comparison_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Equal => Some(BinaryOperator::Equal),
        TokenKind::NotEqual => Some(BinaryOperator::NotEqual),
        TokenKind::Less => Some(BinaryOperator::Less),
        TokenKind::LessEqual => Some(BinaryOperator::LessEqual),
        TokenKind::Greater => Some(BinaryOperator::Greater),
        TokenKind::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        _ => None,
    }
}

fn logical_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Keyword(Keyword::And) => Some(BinaryOperator::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOperator::Or),
        TokenKind::Keyword(Keyword::Xor) => Some(BinaryOperator::Xor),
        _ => None,
    }
}

fn shift_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::ShiftLeft => Some(BinaryOperator::ShiftLeft),
        TokenKind::ShiftRight => Some(BinaryOperator::ShiftRight),
        _ => None,
    }
}

fn additive_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Plus => Some(BinaryOperator::Add),
        TokenKind::Minus => Some(BinaryOperator::Sub),
        _ => None,
    }
}

fn multiplicative_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Star => Some(BinaryOperator::Mul),
        TokenKind::Slash => Some(BinaryOperator::Div),
        TokenKind::Percent => Some(BinaryOperator::Mod),
        _ => None,
    }
}
