//! Binds the receiver inside class bodies before rendering.
//!
//! `instance.x` becomes a member access on [`Expression::SelfInstance`],
//! `instance.m()` a call on [`Receiver::SelfInstance`], and `class.m()` a
//! qualified call on the enclosing class. A bare `instance` is left as an
//! identifier.

use crate::ast::{
    AssignTarget, CLASS_RECEIVER_NAME, CaseStatement, ClassDeclaration, Declaration, Expression,
    FunctionCall, FunctionDeclaration, IfStatement, NamespaceDeclaration, Program,
    RECEIVER_NAME, Receiver, Statement,
};

/// Lowers every class in the program, including classes nested in namespaces.
pub fn lower_program(program: &Program) -> Program {
    Program {
        declarations: lower_declarations(&program.declarations),
    }
}

fn lower_declarations(declarations: &[Declaration]) -> Vec<Declaration> {
    declarations
        .iter()
        .map(|declaration| match declaration {
            Declaration::Class(class) => Declaration::Class(lower_class(class)),
            Declaration::Namespace(namespace) => Declaration::Namespace(NamespaceDeclaration {
                name: namespace.name.clone(),
                declarations: lower_declarations(&namespace.declarations),
            }),
            other => other.clone(),
        })
        .collect()
}

pub fn lower_class(class: &ClassDeclaration) -> ClassDeclaration {
    let lowering = Lowering {
        class_name: &class.name,
    };
    ClassDeclaration {
        name: class.name.clone(),
        base: class.base.clone(),
        class_methods: class
            .class_methods
            .iter()
            .map(|method| lowering.function(method))
            .collect(),
        instance_methods: class
            .instance_methods
            .iter()
            .map(|method| lowering.function(method))
            .collect(),
        initializer: class
            .initializer
            .as_ref()
            .map(|initializer| lowering.function(initializer)),
    }
}

struct Lowering<'c> {
    class_name: &'c str,
}

impl Lowering<'_> {
    fn function(&self, function: &FunctionDeclaration) -> FunctionDeclaration {
        FunctionDeclaration {
            return_type: function.return_type,
            name: function.name.clone(),
            parameters: function.parameters.clone(),
            body: self.block(&function.body),
        }
    }

    fn block(&self, statements: &[Statement]) -> Vec<Statement> {
        statements
            .iter()
            .map(|statement| self.statement(statement))
            .collect()
    }

    fn statement(&self, statement: &Statement) -> Statement {
        match statement {
            Statement::Comment(text) => Statement::Comment(text.clone()),
            Statement::VariableDeclaration {
                variable_type,
                name,
                initializer,
            } => Statement::VariableDeclaration {
                variable_type: *variable_type,
                name: name.clone(),
                initializer: initializer.as_ref().map(|value| self.expression(value)),
            },
            Statement::Expression(expression) => Statement::Expression(self.expression(expression)),
            Statement::Return(value) => {
                Statement::Return(value.as_ref().map(|value| self.expression(value)))
            }
            Statement::If(conditional) => Statement::If(self.conditional(conditional)),
            Statement::For {
                initializer,
                condition,
                increment,
                body,
            } => Statement::For {
                initializer: Box::new(self.statement(initializer)),
                condition: self.expression(condition),
                increment: self.expression(increment),
                body: self.block(body),
            },
            Statement::ForIn {
                variable,
                variable_type,
                collection,
                body,
            } => Statement::ForIn {
                variable: variable.clone(),
                variable_type: *variable_type,
                collection: self.expression(collection),
                body: self.block(body),
            },
            Statement::While { condition, body } => Statement::While {
                condition: self.expression(condition),
                body: self.block(body),
            },
            Statement::DoWhile { body, condition } => Statement::DoWhile {
                body: self.block(body),
                condition: self.expression(condition),
            },
            Statement::Switch { scrutinee, cases } => Statement::Switch {
                scrutinee: self.expression(scrutinee),
                cases: cases
                    .iter()
                    .map(|case| CaseStatement {
                        value: self.expression(&case.value),
                        body: self.block(&case.body),
                    })
                    .collect(),
            },
            Statement::TryHappen {
                body,
                error_type,
                binding,
                handler,
            } => Statement::TryHappen {
                body: self.block(body),
                error_type: error_type.clone(),
                binding: binding.clone(),
                handler: self.block(handler),
            },
        }
    }

    fn conditional(&self, conditional: &IfStatement) -> IfStatement {
        IfStatement {
            condition: self.expression(&conditional.condition),
            body: self.block(&conditional.body),
            else_ifs: conditional
                .else_ifs
                .iter()
                .map(|clause| self.conditional(clause))
                .collect(),
            else_body: conditional.else_body.as_ref().map(|body| self.block(body)),
        }
    }

    fn expression(&self, expression: &Expression) -> Expression {
        match expression {
            Expression::InstanceAccess { instance, member } => Expression::InstanceAccess {
                instance: Box::new(self.accessed(instance)),
                member: member.clone(),
            },
            Expression::Assignment { target, value } => Expression::Assignment {
                target: match target {
                    AssignTarget::Identifier(name) => AssignTarget::Identifier(name.clone()),
                    AssignTarget::Member { instance, member } => AssignTarget::Member {
                        instance: Box::new(self.accessed(instance)),
                        member: member.clone(),
                    },
                },
                value: Box::new(self.expression(value)),
            },
            Expression::Binary { left, op, right } => Expression::Binary {
                left: Box::new(self.expression(left)),
                op: *op,
                right: Box::new(self.expression(right)),
            },
            Expression::Call(call) => Expression::Call(FunctionCall {
                receiver: self.receiver(&call.receiver),
                name: call.name.clone(),
                arguments: call
                    .arguments
                    .iter()
                    .map(|argument| self.expression(argument))
                    .collect(),
            }),
            Expression::InstanceCreation {
                namespace,
                class,
                arguments,
            } => Expression::InstanceCreation {
                namespace: namespace.clone(),
                class: class.clone(),
                arguments: arguments
                    .iter()
                    .map(|argument| self.expression(argument))
                    .collect(),
            },
            other => other.clone(),
        }
    }

    /// The object side of a member access. Only here does the receiver
    /// name denote the current instance.
    fn accessed(&self, instance: &Expression) -> Expression {
        match instance {
            Expression::Identifier(name) if name == RECEIVER_NAME => Expression::SelfInstance,
            other => self.expression(other),
        }
    }

    fn receiver(&self, receiver: &Receiver) -> Receiver {
        match receiver {
            Receiver::Named(name) if name == RECEIVER_NAME => Receiver::SelfInstance,
            Receiver::Named(name) if name == CLASS_RECEIVER_NAME => {
                Receiver::Namespace(self.class_name.to_string())
            }
            other => other.clone(),
        }
    }
}
