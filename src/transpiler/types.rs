use crate::ast::{Expression, FunctionDeclaration, Statement, TypeName};

/// Dynamic fallback for values whose type is not known at generation time.
pub const DYNAMIC_TYPE: &str = "vn_value";

const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "asm", "break", "catch", "const", "constexpr", "continue", "default",
    "delete", "enum", "explicit", "export", "extern", "friend", "goto", "inline", "long",
    "mutable", "new", "noexcept", "nullptr", "operator", "private", "protected", "public",
    "register", "short", "signed", "sizeof", "static", "struct", "template", "this", "throw",
    "try", "typedef", "typeid", "typename", "union", "unsigned", "using", "virtual", "void",
    "volatile",
];

pub fn cpp_type(type_name: TypeName) -> &'static str {
    match type_name {
        TypeName::Int => "int",
        TypeName::Char => "char",
        TypeName::String => "std::string",
        TypeName::Bool => "bool",
        TypeName::Float => "float",
        TypeName::Double => "double",
    }
}

/// Conventional member names whose type is fixed when nothing else says so.
pub fn conventional_type(name: &str) -> Option<&'static str> {
    match name {
        "name" => Some("std::string"),
        "age" | "id" => Some("int"),
        _ => None,
    }
}

pub fn parameter_type(name: &str, declared: Option<TypeName>) -> &'static str {
    declared
        .map(cpp_type)
        .or_else(|| conventional_type(name))
        .unwrap_or(DYNAMIC_TYPE)
}

/// Return type of an instance method: `void` when it never returns a
/// value, the conventional type of a returned member, `auto` otherwise.
pub fn method_return_type(method: &FunctionDeclaration) -> &'static str {
    if let Some(type_name) = method.return_type {
        return cpp_type(type_name);
    }
    match first_returned_value(&method.body) {
        None => "void",
        Some(Expression::InstanceAccess { member, .. }) => {
            conventional_type(member).unwrap_or("auto")
        }
        Some(_) => "auto",
    }
}

/// First `return <value>` in source order, searching nested blocks too.
fn first_returned_value(body: &[Statement]) -> Option<&Expression> {
    body.iter().find_map(|statement| match statement {
        Statement::Return(value) => value.as_ref(),
        Statement::If(conditional) => first_returned_value(&conditional.body)
            .or_else(|| {
                conditional
                    .else_ifs
                    .iter()
                    .find_map(|clause| first_returned_value(&clause.body))
            })
            .or_else(|| {
                conditional
                    .else_body
                    .as_deref()
                    .and_then(first_returned_value)
            }),
        Statement::For { body, .. }
        | Statement::ForIn { body, .. }
        | Statement::While { body, .. }
        | Statement::DoWhile { body, .. } => first_returned_value(body),
        Statement::Switch { cases, .. } => cases
            .iter()
            .find_map(|case| first_returned_value(&case.body)),
        Statement::TryHappen { body, handler, .. } => {
            first_returned_value(body).or_else(|| first_returned_value(handler))
        }
        Statement::Comment(_)
        | Statement::VariableDeclaration { .. }
        | Statement::Expression(_) => None,
    })
}

/// Makes a source identifier usable in C++: dashes become underscores and
/// reserved words get a trailing underscore.
pub fn mangle(name: &str) -> String {
    let mangled = name.replace('-', "_");
    if CPP_KEYWORDS.contains(&mangled.as_str()) {
        format!("{mangled}_")
    } else {
        mangled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CaseStatement, IfStatement};

    #[test]
    fn mangles_dashes_and_reserved_words() {
        assert_eq!(mangle("max-value"), "max_value");
        assert_eq!(mangle("this"), "this_");
        assert_eq!(mangle("count"), "count");
    }

    #[test]
    fn parameters_fall_back_to_the_name_table_then_the_variant() {
        assert_eq!(parameter_type("x", Some(TypeName::Double)), "double");
        assert_eq!(parameter_type("name", None), "std::string");
        assert_eq!(parameter_type("id", None), "int");
        assert_eq!(parameter_type("other", None), DYNAMIC_TYPE);
    }

    #[test]
    fn infers_getter_return_types() {
        let method = |body| FunctionDeclaration {
            return_type: None,
            name: "get".to_string(),
            parameters: vec![],
            body,
        };
        let returning = |member: &str| {
            vec![Statement::Return(Some(Expression::InstanceAccess {
                instance: Box::new(Expression::SelfInstance),
                member: member.to_string(),
            }))]
        };

        assert_eq!(method_return_type(&method(returning("name"))), "std::string");
        assert_eq!(method_return_type(&method(returning("age"))), "int");
        assert_eq!(method_return_type(&method(returning("colour"))), "auto");
        assert_eq!(method_return_type(&method(vec![])), "void");
    }

    #[test]
    fn finds_returns_nested_in_control_flow() {
        let method = |body| FunctionDeclaration {
            return_type: None,
            name: "sign".to_string(),
            parameters: vec![],
            body,
        };
        let returning = |value: i64| vec![Statement::Return(Some(Expression::Integer(value)))];
        let branch = |body| IfStatement {
            condition: Expression::Boolean(true),
            body,
            else_ifs: vec![],
            else_body: None,
        };

        let if_else = Statement::If(IfStatement {
            else_body: Some(returning(0)),
            ..branch(returning(1))
        });
        assert_eq!(method_return_type(&method(vec![if_else])), "auto");

        let only_else_if = Statement::If(IfStatement {
            else_ifs: vec![branch(returning(2))],
            ..branch(vec![])
        });
        assert_eq!(method_return_type(&method(vec![only_else_if])), "auto");

        let in_loop = Statement::While {
            condition: Expression::Boolean(true),
            body: vec![Statement::If(branch(returning(3)))],
        };
        assert_eq!(method_return_type(&method(vec![in_loop])), "auto");

        let in_case = Statement::Switch {
            scrutinee: Expression::Integer(1),
            cases: vec![CaseStatement {
                value: Expression::Integer(1),
                body: returning(4),
            }],
        };
        assert_eq!(method_return_type(&method(vec![in_case])), "auto");

        let bare_return = Statement::If(branch(vec![Statement::Return(None)]));
        assert_eq!(method_return_type(&method(vec![bare_return])), "void");
    }
}
