use std::mem;

use crate::ast::{Program, TypeName};
use crate::lexer::Lexer;
use crate::token::{Keyword, Token, TokenKind};

mod declaration;
pub mod error;
mod expression;
mod statement;

pub use error::{ParseError, SyntaxError};

pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser pulling tokens from the lexer on demand.
///
/// `current` is the single token of lookahead; `peeked` is filled only when a
/// production needs to see one token further (the for-in check).
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    peeked: Option<Token<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> ParseResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            peeked: None,
        })
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        let mut declarations = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::EOF => break,
                TokenKind::Comment => {
                    self.advance()?;
                }
                _ => declarations.push(self.parse_declaration()?),
            }
        }
        Ok(Program { declarations })
    }

    fn advance(&mut self) -> ParseResult<Token<'a>> {
        let next = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(mem::replace(&mut self.current, next))
    }

    fn peek_kind(&mut self) -> ParseResult<TokenKind> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        let kind = token.kind;
        self.peeked = Some(token);
        Ok(kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.is_keyword(keyword)
    }

    /// Advances past the current token if it has the expected category.
    fn consume(&mut self, expected: TokenKind) -> ParseResult<Token<'a>> {
        if self.check(expected) {
            self.advance()
        } else {
            Err(self.unexpected(expected.describe()))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> ParseResult<()> {
        if self.check_keyword(keyword) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected(&format!("keyword '{}'", keyword.as_str())))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance()?.lexeme.to_string())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    /// Member names after `.` or `:` may also be keywords, as in `Base.init`.
    fn expect_member_name(&mut self) -> ParseResult<String> {
        match self.current.kind {
            TokenKind::Identifier | TokenKind::Keyword(_) => Ok(self.advance()?.lexeme.to_string()),
            _ => Err(self.unexpected("member name")),
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.current.span.line, self.current.span.column)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let (line, column) = self.position();
        SyntaxError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current.kind.to_string(),
            line,
            column,
        }
        .into()
    }
}

fn type_name(keyword: Keyword) -> Option<TypeName> {
    match keyword {
        Keyword::Int => Some(TypeName::Int),
        Keyword::Char => Some(TypeName::Char),
        Keyword::String => Some(TypeName::String),
        Keyword::Bool => Some(TypeName::Bool),
        Keyword::Float => Some(TypeName::Float),
        Keyword::Double => Some(TypeName::Double),
        _ => None,
    }
}

pub fn parse(input: &str) -> ParseResult<Program> {
    Parser::new(input)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        AssignTarget, BinaryOperator, CaseStatement, ClassDeclaration, Declaration, Expression,
        FunctionCall, FunctionDeclaration, IfStatement, NamespaceDeclaration, Parameter, Receiver,
        Statement, VariableType,
    };
    use crate::lexer::LexError;
    use indoc::indoc;

    fn int(value: i64) -> Expression {
        Expression::Integer(value)
    }

    fn identifier(name: &str) -> Expression {
        Expression::Identifier(name.to_string())
    }

    fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    fn assign(name: &str, value: Expression) -> Expression {
        Expression::Assignment {
            target: AssignTarget::Identifier(name.to_string()),
            value: Box::new(value),
        }
    }

    fn print(arguments: Vec<Expression>) -> Statement {
        Statement::Expression(Expression::Call(FunctionCall {
            receiver: Receiver::Named("System".to_string()),
            name: "print".to_string(),
            arguments,
        }))
    }

    /// Parses `func main() { <body> }` and returns the body statements.
    fn main_body(body: &str) -> Vec<Statement> {
        let source = format!("func main() {{ {body} }}");
        let program = parse(&source).expect("parse failed");
        match program.declarations.into_iter().next() {
            Some(Declaration::Function(function)) => function.body,
            other => panic!("expected main function, got {other:?}"),
        }
    }

    fn expression(source: &str) -> Expression {
        match main_body(&format!("{source};")).into_iter().next() {
            Some(Statement::Expression(expression)) => expression,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn syntax_error(source: &str) -> SyntaxError {
        match parse(source).expect_err("expected parse failure") {
            ParseError::Syntax(error) => error,
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn parses_main_with_variable_declaration() {
        let program = parse("func main() { int x = 1; }").expect("parse failed");

        let expected = Program {
            declarations: vec![Declaration::Function(FunctionDeclaration {
                return_type: None,
                name: "main".to_string(),
                parameters: vec![],
                body: vec![Statement::VariableDeclaration {
                    variable_type: VariableType::Typed(TypeName::Int),
                    name: "x".to_string(),
                    initializer: Some(int(1)),
                }],
            })],
        };

        assert_eq!(program, expected);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            expression("1 + 2 * 3"),
            binary(
                int(1),
                BinaryOperator::Add,
                binary(int(2), BinaryOperator::Mul, int(3))
            )
        );
    }

    #[test]
    fn follows_the_precedence_ladder_from_comparison_down_to_shift() {
        assert_eq!(
            expression("a == b AND c << 1"),
            binary(
                identifier("a"),
                BinaryOperator::Equal,
                binary(
                    identifier("b"),
                    BinaryOperator::And,
                    binary(identifier("c"), BinaryOperator::ShiftLeft, int(1))
                )
            )
        );
    }

    #[test]
    fn binary_levels_are_left_associative() {
        assert_eq!(
            expression("10 - 4 - 3"),
            binary(
                binary(int(10), BinaryOperator::Sub, int(4)),
                BinaryOperator::Sub,
                int(3)
            )
        );
        assert_eq!(
            expression("8 / 2 % 3"),
            binary(
                binary(int(8), BinaryOperator::Div, int(2)),
                BinaryOperator::Mod,
                int(3)
            )
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(expression("a = b = 3"), assign("a", assign("b", int(3))));
    }

    #[test]
    fn compound_assignment_desugars_to_binary_update() {
        assert_eq!(
            expression("total += 2"),
            assign(
                "total",
                binary(identifier("total"), BinaryOperator::Add, int(2))
            )
        );
    }

    #[test]
    fn member_assignment_targets_are_allowed() {
        assert_eq!(
            expression("point.x = 4"),
            Expression::Assignment {
                target: AssignTarget::Member {
                    instance: Box::new(identifier("point")),
                    member: "x".to_string(),
                },
                value: Box::new(int(4)),
            }
        );
    }

    #[test]
    fn errors_on_non_identifier_assignment_target() {
        assert_eq!(
            syntax_error("func main() { 1 = x; }"),
            SyntaxError::InvalidAssignmentTarget {
                line: 1,
                column: 17
            }
        );
        assert!(matches!(
            syntax_error("func main() { f() = 2; }"),
            SyntaxError::InvalidAssignmentTarget { .. }
        ));
    }

    #[test]
    fn disambiguates_for_in_from_three_clause_for() {
        let body = main_body("for (i in range) { } for (i = 0; i < 10; i = i + 1) { }");

        assert_eq!(
            body,
            vec![
                Statement::ForIn {
                    variable: "i".to_string(),
                    variable_type: None,
                    collection: identifier("range"),
                    body: vec![],
                },
                Statement::For {
                    initializer: Box::new(Statement::Expression(assign("i", int(0)))),
                    condition: binary(identifier("i"), BinaryOperator::Less, int(10)),
                    increment: assign(
                        "i",
                        binary(identifier("i"), BinaryOperator::Add, int(1))
                    ),
                    body: vec![],
                },
            ]
        );
    }

    #[test]
    fn parses_typed_for_in_and_declaration_initializer() {
        let body = main_body(indoc! {"
            for (int k in range(3)) { }
            for (int i = 0; i < 3; i = i - 1) { }
        "});

        assert_eq!(
            body[0],
            Statement::ForIn {
                variable: "k".to_string(),
                variable_type: Some(TypeName::Int),
                collection: Expression::Call(FunctionCall {
                    receiver: Receiver::None,
                    name: "range".to_string(),
                    arguments: vec![int(3)],
                }),
                body: vec![],
            }
        );
        match &body[1] {
            Statement::For { initializer, .. } => assert_eq!(
                **initializer,
                Statement::VariableDeclaration {
                    variable_type: VariableType::Typed(TypeName::Int),
                    name: "i".to_string(),
                    initializer: Some(int(0)),
                }
            ),
            other => panic!("expected for loop, got {other:?}"),
        }
    }

    #[test]
    fn errors_on_malformed_for_initializer() {
        assert_eq!(
            syntax_error("func main() { for (1; i < 3; i = i - 1) { } }"),
            SyntaxError::InvalidForInitializer {
                line: 1,
                column: 20
            }
        );
        assert!(matches!(
            syntax_error("func main() { for (i < 3; i < 3; i = i - 1) { } }"),
            SyntaxError::InvalidForInitializer { .. }
        ));
    }

    #[test]
    fn else_if_clauses_form_a_linear_chain() {
        let body = main_body(indoc! {r#"
            if (x == 1) {
                System.print("one");
            } else-if (x == 2) {
                System.print("two");
            } else if (x == 3) {
                System.print("three");
            } else {
                System.print("many");
            }
        "#});

        let clause = |value: i64, text: &str| IfStatement {
            condition: binary(identifier("x"), BinaryOperator::Equal, int(value)),
            body: vec![print(vec![Expression::String(text.to_string())])],
            else_ifs: vec![],
            else_body: None,
        };
        let mut expected = clause(1, "one");
        expected.else_ifs = vec![clause(2, "two"), clause(3, "three")];
        expected.else_body = Some(vec![print(vec![Expression::String("many".to_string())])]);

        assert_eq!(body, vec![Statement::If(expected)]);
    }

    #[test]
    fn parses_switch_cases_in_order() {
        let body = main_body(indoc! {r#"
            switch (code) {
                | first case
                case 1 { System.print("a"); }
                case 1 { System.print("b"); }
            }
        "#});

        assert_eq!(
            body,
            vec![Statement::Switch {
                scrutinee: identifier("code"),
                cases: vec![
                    CaseStatement {
                        value: int(1),
                        body: vec![print(vec![Expression::String("a".to_string())])],
                    },
                    CaseStatement {
                        value: int(1),
                        body: vec![print(vec![Expression::String("b".to_string())])],
                    },
                ],
            }]
        );
    }

    #[test]
    fn parses_loops_return_and_comments() {
        let body = main_body(indoc! {"
            | count down
            while (n > 0) { n = n - 1; }
            do { n = n * 2; } while (n < 8);
            define label;
            return n;
        "});

        assert_eq!(
            body,
            vec![
                Statement::Comment("count down".to_string()),
                Statement::While {
                    condition: binary(identifier("n"), BinaryOperator::Greater, int(0)),
                    body: vec![Statement::Expression(assign(
                        "n",
                        binary(identifier("n"), BinaryOperator::Sub, int(1))
                    ))],
                },
                Statement::DoWhile {
                    body: vec![Statement::Expression(assign(
                        "n",
                        binary(identifier("n"), BinaryOperator::Mul, int(2))
                    ))],
                    condition: binary(identifier("n"), BinaryOperator::Less, int(8)),
                },
                Statement::VariableDeclaration {
                    variable_type: VariableType::Define,
                    name: "label".to_string(),
                    initializer: None,
                },
                Statement::Return(Some(identifier("n"))),
            ]
        );
    }

    #[test]
    fn parses_literals_of_every_kind() {
        let body = main_body(r#"auto a = 2.5f; auto b = 1.25; auto c = 'z'; auto d = true; auto e = "hi";"#);
        let initializers = body
            .into_iter()
            .map(|statement| match statement {
                Statement::VariableDeclaration { initializer, .. } => initializer,
                other => panic!("expected declaration, got {other:?}"),
            })
            .collect::<Vec<_>>();

        assert_eq!(
            initializers,
            vec![
                Some(Expression::Float(2.5)),
                Some(Expression::Double(1.25)),
                Some(Expression::Char('z')),
                Some(Expression::Boolean(true)),
                Some(Expression::String("hi".to_string())),
            ]
        );
    }

    #[test]
    fn errors_on_multi_character_char_literal() {
        assert_eq!(
            syntax_error("func main() { c = 'ab'; }"),
            SyntaxError::InvalidLiteral {
                kind: "char",
                literal: "ab".to_string(),
                line: 1,
                column: 19,
            }
        );
    }

    #[test]
    fn parses_object_and_namespace_expressions() {
        assert_eq!(
            expression("p = instance Geo:Point(1, 2)"),
            assign(
                "p",
                Expression::InstanceCreation {
                    namespace: Some("Geo".to_string()),
                    class: "Point".to_string(),
                    arguments: vec![int(1), int(2)],
                }
            )
        );
        assert_eq!(
            expression("Geo:origin"),
            Expression::NamespaceAccess {
                namespace: "Geo".to_string(),
                member: "origin".to_string(),
            }
        );
        assert_eq!(
            expression("Geo:distance(p)"),
            Expression::Call(FunctionCall {
                receiver: Receiver::Namespace("Geo".to_string()),
                name: "distance".to_string(),
                arguments: vec![identifier("p")],
            })
        );
        assert_eq!(
            expression("p.x"),
            Expression::InstanceAccess {
                instance: Box::new(identifier("p")),
                member: "x".to_string(),
            }
        );
        assert_eq!(
            expression("instance"),
            identifier("instance")
        );
    }

    #[test]
    fn parses_namespace_and_class_declarations() {
        let program = parse(indoc! {r#"
            import shapes.base;

            namespace Geo {
                func origin() { return 0; }
            }

            class Employee(Person) {
                | members
                instance.init(instance, name, id) {
                    Person.init(instance, name);
                    instance.id = id;
                }
                instance.getId(instance) {
                    return instance.id;
                }
                class.create(name) {
                    return instance Employee(name, 0);
                }
            }
        "#})
        .expect("parse failed");

        let parameter = |name: &str| Parameter {
            name: name.to_string(),
            type_name: None,
        };
        let instance_member = |member: &str| Expression::InstanceAccess {
            instance: Box::new(identifier("instance")),
            member: member.to_string(),
        };

        let expected = Program {
            declarations: vec![
                Declaration::Import("shapes.base".to_string()),
                Declaration::Namespace(NamespaceDeclaration {
                    name: "Geo".to_string(),
                    declarations: vec![Declaration::Function(FunctionDeclaration {
                        return_type: None,
                        name: "origin".to_string(),
                        parameters: vec![],
                        body: vec![Statement::Return(Some(int(0)))],
                    })],
                }),
                Declaration::Class(ClassDeclaration {
                    name: "Employee".to_string(),
                    base: Some("Person".to_string()),
                    class_methods: vec![FunctionDeclaration {
                        return_type: None,
                        name: "create".to_string(),
                        parameters: vec![parameter("name")],
                        body: vec![Statement::Return(Some(Expression::InstanceCreation {
                            namespace: None,
                            class: "Employee".to_string(),
                            arguments: vec![identifier("name"), int(0)],
                        }))],
                    }],
                    instance_methods: vec![FunctionDeclaration {
                        return_type: None,
                        name: "getId".to_string(),
                        parameters: vec![],
                        body: vec![Statement::Return(Some(instance_member("id")))],
                    }],
                    initializer: Some(FunctionDeclaration {
                        return_type: None,
                        name: "init".to_string(),
                        parameters: vec![parameter("name"), parameter("id")],
                        body: vec![
                            Statement::Expression(Expression::Call(FunctionCall {
                                receiver: Receiver::Named("Person".to_string()),
                                name: "init".to_string(),
                                arguments: vec![identifier("instance"), identifier("name")],
                            })),
                            Statement::Expression(Expression::Assignment {
                                target: AssignTarget::Member {
                                    instance: Box::new(identifier("instance")),
                                    member: "id".to_string(),
                                },
                                value: Box::new(identifier("id")),
                            }),
                        ],
                    }),
                }),
            ],
        };

        assert_eq!(program, expected);
    }

    #[test]
    fn parses_typed_function_parameters() {
        let program = parse("func add(int a, b) { return a; }").expect("parse failed");
        let Some(Declaration::Function(function)) = program.declarations.first() else {
            panic!("expected function");
        };
        assert_eq!(
            function.parameters,
            vec![
                Parameter {
                    name: "a".to_string(),
                    type_name: Some(TypeName::Int),
                },
                Parameter {
                    name: "b".to_string(),
                    type_name: None,
                },
            ]
        );
    }

    #[test]
    fn program_must_start_with_func() {
        let error = syntax_error("int x = 1;");
        assert_eq!(error, SyntaxError::ExpectedFunction { line: 1, column: 1 });
        assert_eq!(
            error.to_string(),
            "function definition must start with func at line 1, column 1"
        );
    }

    #[test]
    fn reports_expected_and_actual_categories() {
        let error = syntax_error("func main() { x = 1 }");
        assert_eq!(
            error.to_string(),
            "expected semicolon, but got right brace at line 1, column 21"
        );

        let error = syntax_error("func main() {\n    x = 1 | trailing\n}");
        assert_eq!(
            error,
            SyntaxError::UnexpectedToken {
                expected: "semicolon".to_string(),
                found: "comment".to_string(),
                line: 2,
                column: 11,
            }
        );
    }

    #[test]
    fn propagates_lexer_errors() {
        let error = parse("func main() { x = 1 # 2; }").expect_err("expected lex failure");
        assert_eq!(
            error,
            ParseError::Lex(LexError::UnexpectedCharacter {
                character: '#',
                line: 1,
                column: 21,
            })
        );
        assert_eq!(error.category(), "LexError");
        assert_eq!(error.position(), (1, 21));
    }

    #[test]
    fn parses_try_happen_with_binding() {
        let body = main_body(indoc! {r#"
            try {
                x = 1;
            } happen (ValueError) as e {
                System.print(e);
            }
        "#});

        assert_eq!(
            body,
            vec![Statement::TryHappen {
                body: vec![Statement::Expression(assign("x", int(1)))],
                error_type: "ValueError".to_string(),
                binding: "e".to_string(),
                handler: vec![print(vec![identifier("e")])],
            }]
        );
    }

    #[test]
    fn try_without_happen_clause_is_rejected() {
        let error = syntax_error("func main() { try { x = 1; } }");
        assert_eq!(
            error.to_string(),
            "expected keyword 'happen', but got right brace at line 1, column 30"
        );
    }
}
