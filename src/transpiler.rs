use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use self::cpp_runtime::{
    CPP_CONVERSIONS, CPP_ERRORS, CPP_HEADERS, CPP_RANGE, CPP_STRINGS, CPP_VALUE_TYPE,
    escape_cpp_char, escape_cpp_string,
};
use self::lowering::lower_program;
use self::toolchain::run_compiled_binary;
pub use self::toolchain::Toolchain;
use self::types::{DYNAMIC_TYPE, cpp_type, mangle, method_return_type, parameter_type};
use crate::ast::{
    AssignTarget, BinaryOperator, ClassDeclaration, Declaration, Expression, FunctionCall,
    FunctionDeclaration, IfStatement, Parameter, Program, RECEIVER_NAME, Receiver, Statement,
    VariableType,
};
use crate::backend::{Backend, PreparedBackend};

mod cpp_runtime;
mod lowering;
mod toolchain;
mod types;

/// Renders a program as a single C++17 translation unit and, as a backend,
/// compiles and runs it with an external toolchain.
#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    toolchain: Toolchain,
}

pub struct PreparedTranspiler {
    source_path: PathBuf,
    binary_path: PathBuf,
}

impl Transpiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toolchain(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Generation is total: constructs without a C++ rendering become
    /// placeholders instead of errors.
    pub fn generate(&self, program: &Program) -> String {
        let program = lower_program(program);
        let source = CodeGenerator::new(&program).generate(&program);
        debug!(
            declarations = program.declarations.len(),
            bytes = source.len(),
            "generated C++"
        );
        source
    }
}

pub fn prelude() -> String {
    [
        CPP_HEADERS,
        CPP_ERRORS,
        CPP_VALUE_TYPE,
        CPP_RANGE,
        CPP_CONVERSIONS,
        CPP_STRINGS,
    ]
    .concat()
}

struct ClassInfo {
    base: Option<String>,
    fields: Vec<(String, &'static str)>,
}

struct CodeGenerator {
    output: String,
    scopes: Vec<FxHashSet<String>>,
    /// Suffix for generated switch subjects and caught exceptions.
    next_temporary: usize,
    /// Set while emitting the body of `int main`, where a bare `return`
    /// must still produce an exit status.
    in_main: bool,
    classes: FxHashMap<String, ClassInfo>,
}

impl CodeGenerator {
    fn new(program: &Program) -> Self {
        let mut classes = FxHashMap::default();
        collect_classes(&program.declarations, &mut classes);
        Self {
            output: String::new(),
            scopes: Vec::new(),
            next_temporary: 0,
            in_main: false,
            classes,
        }
    }

    fn generate(mut self, program: &Program) -> String {
        self.output.push_str(&prelude());
        for declaration in &program.declarations {
            self.emit_declaration(declaration, 0);
            self.output.push('\n');
        }
        self.output
    }

    fn emit_declaration(&mut self, declaration: &Declaration, indent: usize) {
        match declaration {
            Declaration::Function(function) => self.emit_function(function, indent),
            Declaration::Namespace(namespace) => {
                self.push_line(indent, &format!("namespace {} {{", mangle(&namespace.name)));
                for (position, nested) in namespace.declarations.iter().enumerate() {
                    if position > 0 {
                        self.output.push('\n');
                    }
                    self.emit_declaration(nested, indent);
                }
                self.push_line(indent, &format!("}} // namespace {}", mangle(&namespace.name)));
            }
            Declaration::Class(class) => self.emit_class(class, indent),
            Declaration::Import(module) => self.push_line(indent, &format!("// import {module}")),
        }
    }

    fn emit_function(&mut self, function: &FunctionDeclaration, indent: usize) {
        let is_main = function.name == "main" && indent == 0;
        if is_main {
            self.push_line(indent, "int main() {");
            self.push_line(indent + 1, "std::cout << std::boolalpha;");
        } else {
            let return_type = function.return_type.map(cpp_type).unwrap_or("auto");
            self.push_line(
                indent,
                &format!(
                    "{return_type} {}({}) {{",
                    mangle(&function.name),
                    self.parameter_list(&function.parameters)
                ),
            );
        }
        self.in_main = is_main;
        self.emit_body(&function.parameters, &function.body, indent + 1);
        self.in_main = false;
        self.push_line(indent, "}");
    }

    fn emit_body(&mut self, parameters: &[Parameter], body: &[Statement], indent: usize) {
        self.scopes.push(
            parameters
                .iter()
                .map(|parameter| parameter.name.clone())
                .collect(),
        );
        for statement in body {
            self.emit_statement(statement, indent);
        }
        self.scopes.pop();
    }

    fn emit_class(&mut self, class: &ClassDeclaration, indent: usize) {
        let name = mangle(&class.name);
        let header = match &class.base {
            Some(base) => format!("class {name} : public {} {{", mangle(base)),
            None => format!("class {name} {{"),
        };
        self.push_line(indent, &header);
        self.push_line(indent, "public:");

        let inherited = self.inherited_fields(class);
        let fields = self
            .classes
            .get(&class.name)
            .map(|info| info.fields.clone())
            .unwrap_or_default();
        for (field, field_type) in fields {
            if !inherited.contains(&field) {
                self.push_line(indent + 1, &format!("{field_type} {};", mangle(&field)));
            }
        }

        if let Some(initializer) = &class.initializer {
            self.output.push('\n');
            self.emit_constructor(&name, class.base.as_deref(), initializer, indent + 1);
        }
        for method in &class.class_methods {
            self.output.push('\n');
            self.emit_method(method, "static ", indent + 1);
        }
        for method in &class.instance_methods {
            self.output.push('\n');
            self.emit_method(method, "", indent + 1);
        }
        self.push_line(indent, "};");
    }

    /// `Base.init(instance, args)` in the initializer becomes the
    /// base-initializer list; the remaining statements form the body.
    fn emit_constructor(
        &mut self,
        name: &str,
        base: Option<&str>,
        initializer: &FunctionDeclaration,
        indent: usize,
    ) {
        let mut base_arguments = None;
        let mut body = Vec::new();
        for statement in &initializer.body {
            match (statement, base) {
                (Statement::Expression(Expression::Call(call)), Some(base))
                    if base_arguments.is_none() && call.is_method_of(base, "init") =>
                {
                    base_arguments = Some(
                        call.arguments
                            .iter()
                            .filter(|argument| !is_receiver_name(argument))
                            .map(|argument| self.expression(argument))
                            .collect::<Vec<_>>()
                            .join(", "),
                    );
                }
                _ => body.push(statement.clone()),
            }
        }

        let mut signature = format!("{name}({})", self.parameter_list(&initializer.parameters));
        if let (Some(base), Some(arguments)) = (base, base_arguments) {
            signature.push_str(&format!(" : {}({arguments})", mangle(base)));
        }
        self.push_line(indent, &format!("{signature} {{"));
        self.emit_body(&initializer.parameters, &body, indent + 1);
        self.push_line(indent, "}");
    }

    fn emit_method(&mut self, method: &FunctionDeclaration, qualifier: &str, indent: usize) {
        self.push_line(
            indent,
            &format!(
                "{qualifier}{} {}({}) {{",
                method_return_type(method),
                mangle(&method.name),
                self.parameter_list(&method.parameters)
            ),
        );
        self.emit_body(&method.parameters, &method.body, indent + 1);
        self.push_line(indent, "}");
    }

    fn inherited_fields(&self, class: &ClassDeclaration) -> FxHashSet<String> {
        let mut inherited = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut next = class.base.as_deref();
        while let Some(base) = next {
            if !visited.insert(base) {
                break;
            }
            let Some(info) = self.classes.get(base) else {
                break;
            };
            inherited.extend(info.fields.iter().map(|(field, _)| field.clone()));
            next = info.base.as_deref();
        }
        inherited
    }

    fn parameter_list(&self, parameters: &[Parameter]) -> String {
        parameters
            .iter()
            .map(|parameter| {
                format!(
                    "{} {}",
                    parameter_type(&parameter.name, parameter.type_name),
                    mangle(&parameter.name)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn emit_block(&mut self, body: &[Statement], indent: usize) {
        self.scopes.push(FxHashSet::default());
        for statement in body {
            self.emit_statement(statement, indent);
        }
        self.scopes.pop();
    }

    fn emit_statement(&mut self, statement: &Statement, indent: usize) {
        match statement {
            Statement::Comment(text) => self.push_line(indent, &format!("// {text}")),
            Statement::VariableDeclaration { .. } | Statement::Expression(_) => {
                let line = self.simple_statement(statement);
                self.push_line(indent, &format!("{line};"));
            }
            Statement::Return(value) if self.in_main => {
                // The returned value is evaluated for its effects; main exits with 0.
                if let Some(value) = value {
                    let value = self.expression(value);
                    self.push_line(indent, &format!("static_cast<void>({value});"));
                }
                self.push_line(indent, "return 0;");
            }
            Statement::Return(Some(value)) => {
                let value = self.expression(value);
                self.push_line(indent, &format!("return {value};"));
            }
            Statement::Return(None) => self.push_line(indent, "return;"),
            Statement::If(conditional) => self.emit_if(conditional, indent),
            Statement::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                self.scopes.push(FxHashSet::default());
                let initializer = self.simple_statement(initializer);
                let condition = self.expression(condition);
                let increment = self.expression(increment);
                self.push_line(
                    indent,
                    &format!("for ({initializer}; {condition}; {increment}) {{"),
                );
                self.emit_block(body, indent + 1);
                self.push_line(indent, "}");
                self.scopes.pop();
            }
            Statement::ForIn {
                variable,
                variable_type,
                collection,
                body,
            } => {
                let element_type = variable_type.map(cpp_type).unwrap_or("auto");
                let collection = self.owned_operand(collection);
                self.push_line(
                    indent,
                    &format!("for ({element_type} {} : {collection}) {{", mangle(variable)),
                );
                self.scopes.push(FxHashSet::from_iter([variable.clone()]));
                self.emit_block(body, indent + 1);
                self.scopes.pop();
                self.push_line(indent, "}");
            }
            Statement::While { condition, body } => {
                let condition = self.expression(condition);
                self.push_line(indent, &format!("while ({condition}) {{"));
                self.emit_block(body, indent + 1);
                self.push_line(indent, "}");
            }
            Statement::DoWhile { body, condition } => {
                self.push_line(indent, "do {");
                self.emit_block(body, indent + 1);
                let condition = self.expression(condition);
                self.push_line(indent, &format!("}} while ({condition});"));
            }
            Statement::Switch { scrutinee, cases } => {
                let subject = format!("vn_switch_{}", self.next_temporary);
                self.next_temporary += 1;
                let scrutinee = self.owned_operand(scrutinee);
                self.push_line(indent, "{");
                self.push_line(indent + 1, &format!("const auto {subject} = {scrutinee};"));
                let mut keyword = "if";
                for case in cases {
                    let value = self.operand(&case.value, EQUALITY, true);
                    self.push_line(indent + 1, &format!("{keyword} ({subject} == {value}) {{"));
                    self.emit_block(&case.body, indent + 2);
                    self.push_line(indent + 1, "}");
                    keyword = "else if";
                }
                let fallback = if cases.is_empty() { "{" } else { "else {" };
                self.push_line(indent + 1, fallback);
                self.push_line(
                    indent + 2,
                    &format!(
                        "throw vn_error(\"ValueError\", \"No case matches switch value \" + vn_to_string({subject}));"
                    ),
                );
                self.push_line(indent + 1, "}");
                self.push_line(indent, "}");
            }
            Statement::TryHappen {
                body,
                error_type,
                binding,
                handler,
            } => self.emit_try_happen(body, error_type, binding, handler, indent),
        }
    }

    /// `happen (Error)` catches everything; any other type rethrows what it
    /// does not match. The binding holds the error message.
    fn emit_try_happen(
        &mut self,
        body: &[Statement],
        error_type: &str,
        binding: &str,
        handler: &[Statement],
        indent: usize,
    ) {
        let caught = format!("vn_caught_{}", self.next_temporary);
        self.next_temporary += 1;
        self.push_line(indent, "try {");
        self.emit_block(body, indent + 1);
        self.push_line(
            indent,
            &format!("}} catch (const std::exception& {caught}) {{"),
        );
        if error_type != "Error" {
            self.push_line(
                indent + 1,
                &format!(
                    "if (!vn_error_is({caught}, \"{}\")) {{",
                    escape_cpp_string(error_type)
                ),
            );
            self.push_line(indent + 2, "throw;");
            self.push_line(indent + 1, "}");
        }
        self.push_line(
            indent + 1,
            &format!("std::string {} = {caught}.what();", mangle(binding)),
        );
        self.scopes.push(FxHashSet::from_iter([binding.to_string()]));
        self.emit_block(handler, indent + 1);
        self.scopes.pop();
        self.push_line(indent, "}");
    }

    fn emit_if(&mut self, conditional: &IfStatement, indent: usize) {
        let condition = self.expression(&conditional.condition);
        self.push_line(indent, &format!("if ({condition}) {{"));
        self.emit_block(&conditional.body, indent + 1);
        for clause in &conditional.else_ifs {
            let condition = self.expression(&clause.condition);
            self.push_line(indent, &format!("}} else if ({condition}) {{"));
            self.emit_block(&clause.body, indent + 1);
        }
        if let Some(else_body) = &conditional.else_body {
            self.push_line(indent, "} else {");
            self.emit_block(else_body, indent + 1);
        }
        self.push_line(indent, "}");
    }

    /// A declaration or expression statement without its terminator, as used
    /// both for plain statements and for-loop initializers.
    fn simple_statement(&mut self, statement: &Statement) -> String {
        match statement {
            Statement::VariableDeclaration {
                variable_type,
                name,
                initializer,
            } => {
                self.declare(name);
                let name = mangle(name);
                match (variable_type, initializer) {
                    (VariableType::Typed(type_name), Some(value)) => {
                        format!("{} {name} = {}", cpp_type(*type_name), self.expression(value))
                    }
                    (VariableType::Typed(type_name), None) => {
                        format!("{} {name}{{}}", cpp_type(*type_name))
                    }
                    (VariableType::Auto | VariableType::Define, Some(value)) => {
                        format!("auto {name} = {}", self.owned_operand(value))
                    }
                    (VariableType::Auto, None) => format!("{DYNAMIC_TYPE} {name}"),
                    (VariableType::Define, None) => format!("std::string {name} = \"\""),
                }
            }
            Statement::Expression(Expression::Assignment {
                target: AssignTarget::Identifier(name),
                value,
            }) if !self.is_declared(name) => {
                self.declare(name);
                format!("auto {} = {}", mangle(name), self.owned_operand(value))
            }
            Statement::Expression(expression) => self.expression(expression),
            other => format!("/* unsupported statement: {other:?} */"),
        }
    }

    fn expression(&self, expression: &Expression) -> String {
        match expression {
            Expression::Identifier(name) => mangle(name),
            Expression::Integer(value) => value.to_string(),
            Expression::Float(value) => format!("{value:?}f"),
            Expression::Double(value) => format!("{value:?}"),
            Expression::Char(value) => format!("'{}'", escape_cpp_char(*value)),
            Expression::Boolean(value) => value.to_string(),
            Expression::String(value) => format!("\"{}\"", escape_cpp_string(value)),
            Expression::SelfInstance => "this".to_string(),
            Expression::Binary { left, op, right } => self.binary(left, *op, right),
            Expression::Assignment { target, value } => {
                let target = match target {
                    AssignTarget::Identifier(name) => mangle(name),
                    AssignTarget::Member { instance, member } => self.member(instance, member),
                };
                format!("{target} = {}", self.expression(value))
            }
            Expression::Call(call) => self.call(call),
            Expression::NamespaceAccess { namespace, member } => {
                format!("{}::{}", mangle(namespace), mangle(member))
            }
            Expression::InstanceCreation {
                namespace,
                class,
                arguments,
            } => {
                let class = match namespace {
                    Some(namespace) => format!("{}::{}", mangle(namespace), mangle(class)),
                    None => mangle(class),
                };
                format!("std::make_unique<{class}>({})", self.arguments(arguments))
            }
            Expression::InstanceAccess { instance, member } => self.member(instance, member),
        }
    }

    fn binary(&self, left: &Expression, op: BinaryOperator, right: &Expression) -> String {
        if op == BinaryOperator::Add && is_string_concatenation(left, right) {
            return format!(
                "{} + {}",
                self.concatenation_operand(left),
                self.concatenation_operand(right)
            );
        }
        let precedence = precedence(op);
        let symbol = match op {
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Xor => "!=",
            other => other.symbol(),
        };
        format!(
            "{} {symbol} {}",
            self.operand(left, precedence, false),
            self.operand(right, precedence, true)
        )
    }

    /// Parenthesizes `expression` when C++ would otherwise group it
    /// differently under an operator of `parent` precedence.
    fn operand(&self, expression: &Expression, parent: u8, right: bool) -> String {
        let rendered = self.expression(expression);
        let own = expression_precedence(expression);
        if own < parent || (right && own == parent) {
            format!("({rendered})")
        } else {
            rendered
        }
    }

    fn concatenation_operand(&self, expression: &Expression) -> String {
        match expression {
            Expression::String(value) => format!("std::string(\"{}\")", escape_cpp_string(value)),
            Expression::Binary {
                left,
                op: BinaryOperator::Add,
                right,
            } if is_string_concatenation(left, right) => self.expression(expression),
            other => format!("vn_to_string({})", self.expression(other)),
        }
    }

    /// String literals become `std::string` so `auto` deduces an owned string
    /// and overload resolution does not pick the `bool` conversion.
    fn owned_operand(&self, expression: &Expression) -> String {
        match expression {
            Expression::String(value) => format!("std::string(\"{}\")", escape_cpp_string(value)),
            other => self.expression(other),
        }
    }

    fn member(&self, instance: &Expression, member: &str) -> String {
        match instance {
            Expression::Identifier(name) if self.classes.contains_key(name) => {
                format!("{}::{}", mangle(name), mangle(member))
            }
            _ => format!(
                "{}->{}",
                self.operand(instance, POSTFIX, false),
                mangle(member)
            ),
        }
    }

    fn call(&self, call: &FunctionCall) -> String {
        match &call.receiver {
            Receiver::Named(receiver) if receiver == "System" => self.system_call(call),
            Receiver::Named(receiver) if self.classes.contains_key(receiver) => format!(
                "{}::{}({})",
                mangle(receiver),
                mangle(&call.name),
                self.arguments(&call.arguments)
            ),
            Receiver::Named(receiver) if call.name == "replace" && call.arguments.len() == 2 => {
                format!(
                    "vn_replace({}, {})",
                    mangle(receiver),
                    self.arguments(&call.arguments)
                )
            }
            Receiver::Named(receiver) => format!(
                "{}->{}({})",
                mangle(receiver),
                mangle(&call.name),
                self.arguments(&call.arguments)
            ),
            Receiver::Namespace(namespace) if namespace == "type" => self.conversion(call),
            Receiver::Namespace(namespace) => format!(
                "{}::{}({})",
                mangle(namespace),
                mangle(&call.name),
                self.arguments(&call.arguments)
            ),
            Receiver::SelfInstance => format!(
                "this->{}({})",
                mangle(&call.name),
                self.arguments(&call.arguments)
            ),
            Receiver::None => format!(
                "{}({})",
                mangle(&call.name),
                self.arguments(&call.arguments)
            ),
        }
    }

    fn system_call(&self, call: &FunctionCall) -> String {
        match call.name.as_str() {
            "print" => {
                let mut line = String::from("std::cout");
                for segment in call.arguments.iter().flat_map(print_segments) {
                    line.push_str(" << ");
                    line.push_str(&self.operand(segment, SHIFT, true));
                }
                line.push_str(" << std::endl");
                line
            }
            "input" => {
                let prompt = match call.arguments.first() {
                    Some(prompt) => format!(
                        "std::cout << {}; ",
                        self.operand(prompt, SHIFT, true)
                    ),
                    None => String::new(),
                };
                format!(
                    "([&]() {{ {prompt}std::string vn_line; std::getline(std::cin, vn_line); return vn_line; }}())"
                )
            }
            other => placeholder(&format!("System.{other}")),
        }
    }

    fn conversion(&self, call: &FunctionCall) -> String {
        let helper = match call.name.as_str() {
            "int" => "vn_to_int",
            "string" => "vn_to_string",
            "char" => "vn_to_char",
            other => return placeholder(&format!("type:{other}")),
        };
        match call.arguments.as_slice() {
            [argument] => format!("{helper}({})", self.owned_operand(argument)),
            _ => placeholder(&format!("type:{} with {} arguments", call.name, call.arguments.len())),
        }
    }

    fn arguments(&self, arguments: &[Expression]) -> String {
        arguments
            .iter()
            .map(|argument| self.expression(argument))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn push_line(&mut self, indent: usize, line: &str) {
        for _ in 0..indent {
            self.output.push_str("    ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }
}

const ASSIGNMENT: u8 = 2;
const LOGICAL_OR: u8 = 3;
const LOGICAL_AND: u8 = 4;
const EQUALITY: u8 = 8;
const RELATIONAL: u8 = 9;
const SHIFT: u8 = 11;
const ADDITIVE: u8 = 12;
const MULTIPLICATIVE: u8 = 13;
const POSTFIX: u8 = 16;
const PRIMARY: u8 = 17;

/// C++ binding strength of the rendered operator.
fn precedence(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => MULTIPLICATIVE,
        BinaryOperator::Add | BinaryOperator::Sub => ADDITIVE,
        BinaryOperator::ShiftLeft | BinaryOperator::ShiftRight => SHIFT,
        BinaryOperator::Less
        | BinaryOperator::LessEqual
        | BinaryOperator::Greater
        | BinaryOperator::GreaterEqual => RELATIONAL,
        BinaryOperator::Equal | BinaryOperator::NotEqual | BinaryOperator::Xor => EQUALITY,
        BinaryOperator::And => LOGICAL_AND,
        BinaryOperator::Or => LOGICAL_OR,
    }
}

fn expression_precedence(expression: &Expression) -> u8 {
    match expression {
        Expression::Binary { op, .. } => precedence(*op),
        Expression::Assignment { .. } => ASSIGNMENT,
        Expression::Call(_) | Expression::InstanceAccess { .. } => POSTFIX,
        _ => PRIMARY,
    }
}

fn is_string_concatenation(left: &Expression, right: &Expression) -> bool {
    [left, right].into_iter().any(|side| match side {
        Expression::String(_) => true,
        Expression::Binary {
            left,
            op: BinaryOperator::Add,
            right,
        } => is_string_concatenation(left, right),
        _ => false,
    })
}

/// A print argument that is a `+` chain is streamed one operand at a time.
fn print_segments(expression: &Expression) -> Vec<&Expression> {
    match expression {
        Expression::Binary {
            left,
            op: BinaryOperator::Add,
            right,
        } => {
            let mut segments = print_segments(left);
            segments.extend(print_segments(right));
            segments
        }
        other => vec![other],
    }
}

fn is_receiver_name(expression: &Expression) -> bool {
    matches!(expression, Expression::Identifier(name) if name == RECEIVER_NAME)
}

fn placeholder(what: &str) -> String {
    format!("{DYNAMIC_TYPE}{{}} /* unsupported: {what} */")
}

fn collect_classes(declarations: &[Declaration], classes: &mut FxHashMap<String, ClassInfo>) {
    for declaration in declarations {
        match declaration {
            Declaration::Class(class) => {
                classes.insert(
                    class.name.clone(),
                    ClassInfo {
                        base: class.base.clone(),
                        fields: class_fields(class),
                    },
                );
            }
            Declaration::Namespace(namespace) => {
                collect_classes(&namespace.declarations, classes)
            }
            Declaration::Function(_) | Declaration::Import(_) => {}
        }
    }
}

/// Fields are the members assigned through the receiver, in first-assignment
/// order, typed from the assigned parameter or the conventional name table.
fn class_fields(class: &ClassDeclaration) -> Vec<(String, &'static str)> {
    let mut fields: Vec<(String, &'static str)> = Vec::new();
    let methods = class.initializer.iter().chain(&class.instance_methods);
    for method in methods {
        let mut assignments = Vec::new();
        block_assignments(&method.body, &mut assignments);
        for (member, value) in assignments {
            if fields.iter().any(|(field, _)| field == member) {
                continue;
            }
            let field_type = match value {
                Expression::Identifier(name) => method
                    .parameters
                    .iter()
                    .find(|parameter| &parameter.name == name)
                    .map(|parameter| parameter_type(member, parameter.type_name))
                    .unwrap_or_else(|| parameter_type(member, None)),
                Expression::Integer(_) => "int",
                Expression::Boolean(_) => "bool",
                Expression::Char(_) => "char",
                Expression::String(_) => "std::string",
                Expression::Double(_) => "double",
                Expression::Float(_) => "float",
                _ => parameter_type(member, None),
            };
            fields.push((member.to_string(), field_type));
        }
    }
    fields
}

type ReceiverAssignment<'s> = (&'s str, &'s Expression);

fn receiver_assignments<'s>(statement: &'s Statement, found: &mut Vec<ReceiverAssignment<'s>>) {
    match statement {
        Statement::Expression(Expression::Assignment {
            target: AssignTarget::Member { instance, member },
            value,
        }) if **instance == Expression::SelfInstance => found.push((member.as_str(), &**value)),
        Statement::If(conditional) => {
            block_assignments(&conditional.body, found);
            for clause in &conditional.else_ifs {
                block_assignments(&clause.body, found);
            }
            if let Some(else_body) = &conditional.else_body {
                block_assignments(else_body, found);
            }
        }
        Statement::For { body, .. }
        | Statement::ForIn { body, .. }
        | Statement::While { body, .. }
        | Statement::DoWhile { body, .. } => block_assignments(body, found),
        Statement::Switch { cases, .. } => {
            for case in cases {
                block_assignments(&case.body, found);
            }
        }
        Statement::TryHappen { body, handler, .. } => {
            block_assignments(body, found);
            block_assignments(handler, found);
        }
        _ => {}
    }
}

fn block_assignments<'s>(body: &'s [Statement], found: &mut Vec<ReceiverAssignment<'s>>) {
    for statement in body {
        receiver_assignments(statement, found);
    }
}

impl Backend for Transpiler {
    fn name(&self) -> &'static str {
        "transpiler"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        let source = self.generate(program);
        let (source_path, binary_path) = self.toolchain.compile_source(&source)?;
        Ok(Box::new(PreparedTranspiler {
            source_path,
            binary_path,
        }))
    }
}

impl PreparedBackend for PreparedTranspiler {
    fn run(&self, input: &str) -> Result<String> {
        run_compiled_binary(&self.binary_path, input)
    }
}

impl Drop for PreparedTranspiler {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.source_path);
        let _ = fs::remove_file(&self.binary_path);
    }
}
