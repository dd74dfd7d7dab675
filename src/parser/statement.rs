use super::{ParseResult, Parser, SyntaxError, type_name};
use crate::ast::{CaseStatement, Expression, IfStatement, Statement, TypeName, VariableType};
use crate::token::{Keyword, TokenKind};

impl<'a> Parser<'a> {
    pub(super) fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        self.consume(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EOF) {
            body.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace)?;
        Ok(body)
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current.kind {
            TokenKind::Comment => {
                let comment = self.advance()?;
                Ok(Statement::Comment(comment.lexeme.trim().to_string()))
            }
            TokenKind::Keyword(keyword) if starts_declaration(keyword) => {
                let variable_type = self.parse_variable_type()?;
                let name = self.expect_identifier()?;
                let declaration = self.finish_variable_declaration(variable_type, name)?;
                self.consume(TokenKind::Semicolon)?;
                Ok(declaration)
            }
            TokenKind::Keyword(Keyword::If) => Ok(Statement::If(self.parse_if()?)),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while(),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Keyword(Keyword::Try) => self.parse_try_happen(),
            _ => {
                let expression = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    fn parse_variable_type(&mut self) -> ParseResult<VariableType> {
        let variable_type = match self.current.kind {
            TokenKind::Keyword(Keyword::Auto) => VariableType::Auto,
            TokenKind::Keyword(Keyword::Define) => VariableType::Define,
            TokenKind::Keyword(keyword) => match type_name(keyword) {
                Some(type_name) => VariableType::Typed(type_name),
                None => return Err(self.unexpected("type")),
            },
            _ => return Err(self.unexpected("type")),
        };
        self.advance()?;
        Ok(variable_type)
    }

    fn finish_variable_declaration(
        &mut self,
        variable_type: VariableType,
        name: String,
    ) -> ParseResult<Statement> {
        let initializer = if self.check(TokenKind::Assign) {
            self.advance()?;
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Statement::VariableDeclaration {
            variable_type,
            name,
            initializer,
        })
    }

    fn parse_if(&mut self) -> ParseResult<IfStatement> {
        self.consume_keyword(Keyword::If)?;
        let mut statement = self.parse_conditional_clause()?;
        loop {
            if self.check_keyword(Keyword::ElseIf) {
                self.advance()?;
                statement.else_ifs.push(self.parse_conditional_clause()?);
            } else if self.check_keyword(Keyword::Else) {
                self.advance()?;
                if self.check_keyword(Keyword::If) {
                    self.advance()?;
                    statement.else_ifs.push(self.parse_conditional_clause()?);
                } else {
                    statement.else_body = Some(self.parse_block()?);
                    break;
                }
            } else {
                break;
            }
        }
        Ok(statement)
    }

    fn parse_conditional_clause(&mut self) -> ParseResult<IfStatement> {
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(IfStatement {
            condition,
            body,
            else_ifs: Vec::new(),
            else_body: None,
        })
    }

    /// `for (x in e)`, `for (int x in e)`, or a three-clause loop whose
    /// initializer is a declaration or an assignment.
    fn parse_for(&mut self) -> ParseResult<Statement> {
        self.consume_keyword(Keyword::For)?;
        self.consume(TokenKind::LParen)?;

        let initializer = match self.current.kind {
            TokenKind::Keyword(keyword) if starts_declaration(keyword) => {
                let variable_type = self.parse_variable_type()?;
                let name = self.expect_identifier()?;
                if self.check_keyword(Keyword::In) {
                    let bound_type = match variable_type {
                        VariableType::Typed(type_name) => Some(type_name),
                        VariableType::Auto | VariableType::Define => None,
                    };
                    return self.finish_for_in(name, bound_type);
                }
                self.finish_variable_declaration(variable_type, name)?
            }
            TokenKind::Identifier => {
                if self.peek_kind()? == TokenKind::Keyword(Keyword::In) {
                    let name = self.expect_identifier()?;
                    return self.finish_for_in(name, None);
                }
                let (line, column) = self.position();
                let expression = self.parse_expression()?;
                if !matches!(expression, Expression::Assignment { .. }) {
                    return Err(SyntaxError::InvalidForInitializer { line, column }.into());
                }
                Statement::Expression(expression)
            }
            _ => {
                let (line, column) = self.position();
                return Err(SyntaxError::InvalidForInitializer { line, column }.into());
            }
        };

        self.consume(TokenKind::Semicolon)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Semicolon)?;
        let increment = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Statement::For {
            initializer: Box::new(initializer),
            condition,
            increment,
            body,
        })
    }

    fn finish_for_in(
        &mut self,
        variable: String,
        variable_type: Option<TypeName>,
    ) -> ParseResult<Statement> {
        self.consume_keyword(Keyword::In)?;
        let collection = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Statement::ForIn {
            variable,
            variable_type,
            collection,
            body,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        self.consume_keyword(Keyword::While)?;
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Statement::While { condition, body })
    }

    fn parse_do_while(&mut self) -> ParseResult<Statement> {
        self.consume_keyword(Keyword::Do)?;
        let body = self.parse_block()?;
        self.consume_keyword(Keyword::While)?;
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        // The terminator after `while (...)` is optional.
        if self.check(TokenKind::Semicolon) {
            self.advance()?;
        }
        Ok(Statement::DoWhile { body, condition })
    }

    fn parse_switch(&mut self) -> ParseResult<Statement> {
        self.consume_keyword(Keyword::Switch)?;
        self.consume(TokenKind::LParen)?;
        let scrutinee = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        self.consume(TokenKind::LBrace)?;

        let mut cases = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::Comment => {
                    self.advance()?;
                }
                TokenKind::Keyword(Keyword::Case) => {
                    self.advance()?;
                    let value = self.parse_expression()?;
                    let body = self.parse_block()?;
                    cases.push(CaseStatement { value, body });
                }
                _ => break,
            }
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Statement::Switch { scrutinee, cases })
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.consume_keyword(Keyword::Return)?;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Return(value))
    }

    fn parse_try_happen(&mut self) -> ParseResult<Statement> {
        self.consume_keyword(Keyword::Try)?;
        let body = self.parse_block()?;
        self.consume_keyword(Keyword::Happen)?;
        self.consume(TokenKind::LParen)?;
        let error_type = self.expect_identifier()?;
        self.consume(TokenKind::RParen)?;
        self.consume_keyword(Keyword::As)?;
        let binding = self.expect_identifier()?;
        let handler = self.parse_block()?;
        Ok(Statement::TryHappen {
            body,
            error_type,
            binding,
            handler,
        })
    }
}

fn starts_declaration(keyword: Keyword) -> bool {
    keyword.is_type() || matches!(keyword, Keyword::Auto | Keyword::Define)
}
