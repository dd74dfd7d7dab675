use tracing::debug;

use super::{ParseResult, Parser, SyntaxError, type_name};
use crate::ast::{
    ClassDeclaration, Declaration, FunctionDeclaration, NamespaceDeclaration, Parameter,
    RECEIVER_NAME,
};
use crate::token::{Keyword, TokenKind};

impl<'a> Parser<'a> {
    pub(super) fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        match self.current.kind {
            TokenKind::Keyword(Keyword::Func) => Ok(Declaration::Function(self.parse_function()?)),
            TokenKind::Keyword(Keyword::Namespace) => self.parse_namespace(),
            TokenKind::Keyword(Keyword::Class) => self.parse_class(),
            TokenKind::Keyword(Keyword::Import) => self.parse_import(),
            _ => {
                let (line, column) = self.position();
                Err(SyntaxError::ExpectedFunction { line, column }.into())
            }
        }
    }

    fn parse_function(&mut self) -> ParseResult<FunctionDeclaration> {
        self.consume_keyword(Keyword::Func)?;
        let name = self.expect_identifier()?;
        let parameters = self.parse_parameters()?;
        let body = self.parse_block()?;
        debug!(name = %name, parameters = parameters.len(), "parsed function");
        Ok(FunctionDeclaration {
            return_type: None,
            name,
            parameters,
            body,
        })
    }

    fn parse_parameters(&mut self) -> ParseResult<Vec<Parameter>> {
        self.consume(TokenKind::LParen)?;
        let mut parameters = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(parameters)
    }

    fn parse_parameter(&mut self) -> ParseResult<Parameter> {
        let type_name = match self.current.kind {
            TokenKind::Keyword(keyword) if keyword.is_type() => {
                self.advance()?;
                type_name(keyword)
            }
            TokenKind::Keyword(Keyword::Auto) => {
                self.advance()?;
                None
            }
            _ => None,
        };
        let name = if self.check_keyword(Keyword::Instance) {
            self.advance()?;
            RECEIVER_NAME.to_string()
        } else {
            self.expect_identifier()?
        };
        Ok(Parameter { name, type_name })
    }

    fn parse_namespace(&mut self) -> ParseResult<Declaration> {
        self.consume_keyword(Keyword::Namespace)?;
        let name = self.expect_identifier()?;
        self.consume(TokenKind::LBrace)?;
        let mut declarations = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::RBrace | TokenKind::EOF => break,
                TokenKind::Comment => {
                    self.advance()?;
                }
                _ => declarations.push(self.parse_declaration()?),
            }
        }
        self.consume(TokenKind::RBrace)?;
        debug!(name = %name, declarations = declarations.len(), "parsed namespace");
        Ok(Declaration::Namespace(NamespaceDeclaration { name, declarations }))
    }

    fn parse_class(&mut self) -> ParseResult<Declaration> {
        self.consume_keyword(Keyword::Class)?;
        let name = self.expect_identifier()?;
        self.consume(TokenKind::LParen)?;
        let base = if self.check(TokenKind::Identifier) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.consume(TokenKind::RParen)?;
        self.consume(TokenKind::LBrace)?;

        let mut class = ClassDeclaration {
            name,
            base,
            class_methods: Vec::new(),
            instance_methods: Vec::new(),
            initializer: None,
        };
        loop {
            match self.current.kind {
                TokenKind::RBrace | TokenKind::EOF => break,
                TokenKind::Comment => {
                    self.advance()?;
                }
                TokenKind::Keyword(Keyword::Instance) => {
                    self.advance()?;
                    self.consume(TokenKind::Dot)?;
                    if self.check_keyword(Keyword::Init) {
                        self.advance()?;
                        class.initializer = Some(self.parse_method("init".to_string())?);
                    } else {
                        let method_name = self.expect_identifier()?;
                        class.instance_methods.push(self.parse_method(method_name)?);
                    }
                }
                TokenKind::Keyword(Keyword::Class) => {
                    self.advance()?;
                    self.consume(TokenKind::Dot)?;
                    let method_name = self.expect_identifier()?;
                    class.class_methods.push(self.parse_method(method_name)?);
                }
                _ => return Err(self.unexpected("class member")),
            }
        }
        self.consume(TokenKind::RBrace)?;
        debug!(
            name = %class.name,
            instance_methods = class.instance_methods.len(),
            class_methods = class.class_methods.len(),
            "parsed class"
        );
        Ok(Declaration::Class(class))
    }

    /// Parses a method's parameter list and body. The leading receiver
    /// parameter is implicit in the tree and is dropped here.
    fn parse_method(&mut self, name: String) -> ParseResult<FunctionDeclaration> {
        let mut parameters = self.parse_parameters()?;
        if parameters
            .first()
            .is_some_and(|parameter| parameter.name == RECEIVER_NAME)
        {
            parameters.remove(0);
        }
        let body = self.parse_block()?;
        Ok(FunctionDeclaration {
            return_type: None,
            name,
            parameters,
            body,
        })
    }

    fn parse_import(&mut self) -> ParseResult<Declaration> {
        self.consume_keyword(Keyword::Import)?;
        let mut module = self.expect_identifier()?;
        while self.check(TokenKind::Dot) {
            self.advance()?;
            module.push('.');
            module.push_str(&self.expect_identifier()?);
        }
        self.consume(TokenKind::Semicolon)?;
        Ok(Declaration::Import(module))
    }
}
