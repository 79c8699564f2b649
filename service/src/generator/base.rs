//! Base functionality shared by the output templates

use convert_case::{Case, Casing};
use linkml_core::Value;

/// Base code formatter with common functionality
pub struct BaseCodeFormatter;

impl BaseCodeFormatter {
    /// Escape a string for a double-quoted Python literal
    #[must_use]
    pub fn escape_python_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    /// Double-quoted Python string literal
    #[must_use]
    pub fn python_str(s: &str) -> String {
        format!("\"{}\"", Self::escape_python_string(s))
    }

    /// Convert a schema element name to a `PascalCase` class name
    ///
    /// Names that already start with an uppercase letter are kept, so
    /// `PanderaSyntheticTable` is not split into words.
    #[must_use]
    pub fn to_pascal_case(s: &str) -> String {
        if s.chars().next().is_some_and(char::is_uppercase) && !s.contains(['_', ' ', '-']) {
            return s.to_string();
        }
        s.to_case(Case::Pascal)
    }

    /// Convert a slot name to a valid Python identifier
    #[must_use]
    pub fn to_python_identifier(s: &str) -> String {
        let mut ident: String = s
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if ident.chars().next().is_none_or(|c| c.is_ascii_digit()) {
            ident.insert(0, '_');
        }
        ident
    }

    /// Render a JSON value as a Python literal
    #[must_use]
    pub fn python_literal(value: &Value) -> String {
        match value {
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => Self::python_str(s),
            Value::Array(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(Self::python_literal)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Value::Object(map) => format!(
                "{{{}}}",
                map.iter()
                    .map(|(k, v)| format!("{}: {}", Self::python_str(k), Self::python_literal(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Wrap text to a specific line width
    #[must_use]
    pub fn wrap_text(text: &str, width: usize, indent: &str) -> String {
        let mut lines = Vec::new();
        let mut current_line = String::new();

        for word in text.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.len() + 1 + word.len() <= width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = word.to_string();
            }
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }

        lines.join(&format!("\n{indent}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_conversions() {
        assert_eq!(BaseCodeFormatter::to_pascal_case("hello_world"), "HelloWorld");
        assert_eq!(
            BaseCodeFormatter::to_pascal_case("PanderaSyntheticTable"),
            "PanderaSyntheticTable"
        );
        assert_eq!(BaseCodeFormatter::to_python_identifier("has-dash"), "has_dash");
        assert_eq!(BaseCodeFormatter::to_python_identifier("1st"), "_1st");
    }

    #[test]
    fn test_python_literals() {
        assert_eq!(
            BaseCodeFormatter::python_literal(&json!(["a", 1, true, null])),
            "[\"a\", 1, True, None]"
        );
        assert_eq!(
            BaseCodeFormatter::python_str("say \"hi\"\n"),
            "\"say \\\"hi\\\"\\n\""
        );
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = BaseCodeFormatter::wrap_text("one two three four", 9, "    ");
        assert_eq!(wrapped, "one two\n    three\n    four");
    }
}
