pub const CPP_HEADERS: &str = r#"#include <cctype>
#include <cstddef>
#include <iostream>
#include <memory>
#include <sstream>
#include <stdexcept>
#include <string>
#include <variant>

"#;

/// Runtime failures carry the error type name a `happen (...)` clause
/// matches. Exceptions from the standard library count as `CError`.
pub const CPP_ERRORS: &str = r#"struct vn_error : std::runtime_error {
    std::string kind;

    vn_error(const std::string& kind, const std::string& message)
        : std::runtime_error(message), kind(kind) {}
};

inline bool vn_error_is(const std::exception& error, const std::string& kind) {
    if (kind == "Error") {
        return true;
    }
    if (const auto* raised = dynamic_cast<const vn_error*>(&error)) {
        return raised->kind == kind;
    }
    return kind == "CError";
}

"#;

pub const CPP_VALUE_TYPE: &str = r#"using vn_value = std::variant<int, double, char, bool, std::string>;

std::ostream& operator<<(std::ostream& os, const vn_value& value) {
    std::visit([&os](const auto& inner) { os << inner; }, value);
    return os;
}

"#;

pub const CPP_RANGE: &str = r#"struct vn_range {
    int start;
    int stop;
    int step;

    struct iterator {
        int current;
        int step;
        int operator*() const { return current; }
        iterator& operator++() {
            current += step;
            return *this;
        }
        bool operator!=(const iterator& other) const {
            return step > 0 ? current < other.current : current > other.current;
        }
    };

    iterator begin() const { return {start, step}; }
    iterator end() const { return {stop, step}; }
};

inline vn_range range(int start, int stop, int step) {
    if (step == 0) {
        throw vn_error("ValueError", "Range step must not be zero");
    }
    return {start, stop, step};
}
inline vn_range range(int start, int stop) { return range(start, stop, 1); }
inline vn_range range(int stop) { return range(0, stop, 1); }

"#;

pub const CPP_CONVERSIONS: &str = r#"inline int vn_to_int(int value) { return value; }
inline int vn_to_int(char value) { return static_cast<int>(value); }
inline int vn_to_int(bool value) { return value ? 1 : 0; }
inline int vn_to_int(double value) { return static_cast<int>(value); }
inline int vn_to_int(const std::string& value) {
    const auto invalid = [&value]() {
        return vn_error("ValueError", "Cannot convert " + value + " to int");
    };
    std::size_t consumed = 0;
    int result = 0;
    try {
        result = std::stoi(value, &consumed);
    } catch (const std::logic_error&) {
        throw invalid();
    }
    while (consumed < value.size() && std::isspace(static_cast<unsigned char>(value[consumed]))) {
        ++consumed;
    }
    if (consumed != value.size()) {
        throw invalid();
    }
    return result;
}

inline std::string vn_to_string(int value) { return std::to_string(value); }
inline std::string vn_to_string(char value) { return std::string(1, value); }
inline std::string vn_to_string(bool value) { return value ? "true" : "false"; }
inline std::string vn_to_string(double value) {
    std::ostringstream out;
    out << value;
    return out.str();
}
inline std::string vn_to_string(const std::string& value) { return value; }
inline std::string vn_to_string(const vn_value& value) {
    std::ostringstream out;
    out << std::boolalpha << value;
    return out.str();
}

inline char vn_to_char(char value) { return value; }
inline char vn_to_char(int value) { return static_cast<char>(value); }
inline char vn_to_char(const std::string& value) {
    if (value.empty()) {
        throw vn_error("ValueError", "Cannot convert  to char");
    }
    return value[0];
}

"#;

pub const CPP_STRINGS: &str = r#"inline std::string vn_replace(std::string text, const std::string& from, const std::string& to) {
    if (from.empty()) {
        return text;
    }
    std::size_t position = 0;
    while ((position = text.find(from, position)) != std::string::npos) {
        text.replace(position, from.size(), to);
        position += to.size();
    }
    return text;
}

"#;

pub fn escape_cpp_string(value: &str) -> String {
    let mut escaped = String::new();
    for ch in value.chars() {
        push_escaped(&mut escaped, ch, '"');
    }
    escaped
}

pub fn escape_cpp_char(value: char) -> String {
    let mut escaped = String::new();
    push_escaped(&mut escaped, value, '\'');
    escaped
}

fn push_escaped(out: &mut String, ch: char, quote: char) {
    match ch {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\0' => out.push_str("\\0"),
        _ if ch == quote => {
            out.push('\\');
            out.push(ch);
        }
        _ => out.push(ch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_for_their_own_delimiter_only() {
        assert_eq!(escape_cpp_string("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(escape_cpp_string("it's"), "it's");
        assert_eq!(escape_cpp_char('\''), "\\'");
        assert_eq!(escape_cpp_char('"'), "\"");
        assert_eq!(escape_cpp_char('\\'), "\\\\");
    }
}
