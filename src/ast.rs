/// Name bound to the current instance inside initializer and method bodies.
pub const RECEIVER_NAME: &str = "instance";
/// Receiver used for calls to class-level methods: `class.create()`.
pub const CLASS_RECEIVER_NAME: &str = "class";

#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

impl Program {
    /// Finds a top-level function by name. Namespaced functions are not searched.
    pub fn function(&self, name: &str) -> Option<&FunctionDeclaration> {
        self.declarations
            .iter()
            .find_map(|declaration| match declaration {
                Declaration::Function(function) if function.name == name => Some(function),
                _ => None,
            })
    }

    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.declarations
            .iter()
            .filter_map(|declaration| match declaration {
                Declaration::Import(module) => Some(module.as_str()),
                _ => None,
            })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Declaration {
    Function(FunctionDeclaration),
    Namespace(NamespaceDeclaration),
    Class(ClassDeclaration),
    Import(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDeclaration {
    pub return_type: Option<TypeName>,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parameter {
    pub name: String,
    pub type_name: Option<TypeName>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NamespaceDeclaration {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassDeclaration {
    pub name: String,
    pub base: Option<String>,
    pub class_methods: Vec<FunctionDeclaration>,
    pub instance_methods: Vec<FunctionDeclaration>,
    pub initializer: Option<FunctionDeclaration>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TypeName {
    Int,
    Char,
    String,
    Bool,
    Float,
    Double,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum VariableType {
    Typed(TypeName),
    Auto,
    /// The untyped `define` form.
    Define,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Comment(String),
    VariableDeclaration {
        variable_type: VariableType,
        name: String,
        initializer: Option<Expression>,
    },
    Expression(Expression),
    Return(Option<Expression>),
    If(IfStatement),
    For {
        initializer: Box<Statement>,
        condition: Expression,
        increment: Expression,
        body: Vec<Statement>,
    },
    ForIn {
        variable: String,
        variable_type: Option<TypeName>,
        collection: Expression,
        body: Vec<Statement>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    DoWhile {
        body: Vec<Statement>,
        condition: Expression,
    },
    Switch {
        scrutinee: Expression,
        cases: Vec<CaseStatement>,
    },
    /// `try { body } happen (ErrorType) as binding { handler }`
    TryHappen {
        body: Vec<Statement>,
        error_type: String,
        binding: String,
        handler: Vec<Statement>,
    },
}

/// An `if` clause. Else-if clauses are themselves `IfStatement`s kept in
/// source order; their own `else_ifs` and `else_body` are always empty.
#[derive(Debug, PartialEq, Clone)]
pub struct IfStatement {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub else_ifs: Vec<IfStatement>,
    pub else_body: Option<Vec<Statement>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CaseStatement {
    pub value: Expression,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Identifier(String),
    Integer(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Boolean(bool),
    String(String),
    /// The current instance inside a method body. Only produced by lowering.
    SelfInstance,
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Assignment {
        target: AssignTarget,
        value: Box<Expression>,
    },
    Call(FunctionCall),
    NamespaceAccess {
        namespace: String,
        member: String,
    },
    InstanceCreation {
        namespace: Option<String>,
        class: String,
        arguments: Vec<Expression>,
    },
    InstanceAccess {
        instance: Box<Expression>,
        member: String,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionCall {
    pub receiver: Receiver,
    pub name: String,
    pub arguments: Vec<Expression>,
}

impl FunctionCall {
    pub fn is_method_of(&self, receiver: &str, name: &str) -> bool {
        matches!(&self.receiver, Receiver::Named(named) if named == receiver) && self.name == name
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Receiver {
    /// Free function call: `f(args)`.
    None,
    /// Method call on a named object: `obj.m(args)`.
    Named(String),
    /// Namespace-qualified call: `ns:f(args)`.
    Namespace(String),
    /// Method call on the current instance. Only produced by lowering.
    SelfInstance,
}

#[derive(Debug, PartialEq, Clone)]
pub enum AssignTarget {
    Identifier(String),
    Member {
        instance: Box<Expression>,
        member: String,
    },
}

impl AssignTarget {
    pub fn to_expression(&self) -> Expression {
        match self {
            AssignTarget::Identifier(name) => Expression::Identifier(name.clone()),
            AssignTarget::Member { instance, member } => Expression::InstanceAccess {
                instance: instance.clone(),
                member: member.clone(),
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    ShiftLeft,
    ShiftRight,
    And,
    Or,
    Xor,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Xor => "XOR",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}
