/// The closed value domain of the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Character(char),
    String(String),
    Boolean(bool),
    /// A declared but never assigned variable.
    Absent,
}

impl Value {
    /// Native rendering used by printing and by `+` concatenation.
    pub fn render(&self) -> String {
        match self {
            Value::Integer(value) => value.to_string(),
            Value::Character(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Boolean(value) => value.to_string(),
            Value::Absent => "undefined".to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Character(_) => "char",
            Value::String(_) => "string",
            Value::Boolean(_) => "bool",
            Value::Absent => "undefined",
        }
    }
}
