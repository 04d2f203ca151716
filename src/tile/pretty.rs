// ============================================
// Pretty JSON - Компактный читаемый JSON
// ============================================
// Контейнер остаётся в одну строку, если влезает в MAX_LINE с учётом
// отступа, иначе раскрывается по элементу на строку.

use serde_json::Value;

const INDENT: &str = "  ";
const MAX_LINE: usize = 80;

/// Сериализовать значение в компактный pretty JSON
pub fn to_string(value: &Value) -> String {
    stringify(value, "", 0)
}

fn stringify(value: &Value, current_indent: &str, reserved: usize) -> String {
    let compact = value.to_string();
    let length = MAX_LINE.saturating_sub(current_indent.len() + reserved);

    if compact.chars().count() <= length {
        let spaced = add_spaces(&compact);
        if spaced.chars().count() <= length {
            return spaced;
        }
    }

    let next_indent = format!("{}{}", current_indent, INDENT);
    let (start, end, items) = match value {
        Value::Object(map) if !map.is_empty() => {
            let last = map.len() - 1;
            let items: Vec<String> = map
                .iter()
                .enumerate()
                .map(|(i, (key, item))| {
                    let key_part = format!("{}: ", Value::String(key.clone()));
                    let reserved = key_part.chars().count() + usize::from(i != last);
                    format!("{}{}", key_part, stringify(item, &next_indent, reserved))
                })
                .collect();
            ('{', '}', items)
        }
        Value::Array(array) if !array.is_empty() => {
            let last = array.len() - 1;
            let items: Vec<String> = array
                .iter()
                .enumerate()
                .map(|(i, item)| stringify(item, &next_indent, usize::from(i != last)))
                .collect();
            ('[', ']', items)
        }
        _ => return compact,
    };

    format!(
        "{}\n{}{}\n{}{}",
        start,
        next_indent,
        items.join(&format!(",\n{}", next_indent)),
        current_indent,
        end
    )
}

/// Пробел после ':' и ',' вне строк
fn add_spaces(compact: &str) -> String {
    let mut out = String::with_capacity(compact.len() + compact.len() / 4);
    let mut in_string = false;
    let mut escaped = false;

    for c in compact.chars() {
        out.push(c);
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ':' | ',' => out.push(' '),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_values_stay_on_one_line() {
        let value = json!({ "pos": [1, 1, 0], "size": [5, 1, 1] });
        assert_eq!(to_string(&value), r#"{"pos": [1, 1, 0], "size": [5, 1, 1]}"#);
    }

    #[test]
    fn test_long_values_expand() {
        let long = "x".repeat(90);
        let value = json!({ "id": "a", "blocks": long, "size": [1, 2, 3] });
        let expected = format!("{{\n  \"id\": \"a\",\n  \"blocks\": \"{}\",\n  \"size\": [1, 2, 3]\n}}", long);
        assert_eq!(to_string(&value), expected);
    }

    #[test]
    fn test_strings_with_separators_untouched() {
        let value = json!(["a:b,c", "q\"uote:"]);
        assert_eq!(to_string(&value), r#"["a:b,c", "q\"uote:"]"#);
    }

    #[test]
    fn test_output_parses_back() {
        let value = json!({
            "objects": [
                { "id": "tile", "pos": [0, 0, 0], "size": [16, 32, 16], "blocks": "A".repeat(120) },
                { "id": "other", "doors": [ { "pos": [1, 1, 0], "size": [5, 1, 1] } ] }
            ]
        });
        let text = to_string(&value);
        assert!(text.contains("\n    {"));
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), value);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(to_string(&json!({ "a": [], "b": {} })), r#"{"a": [], "b": {}}"#);
    }
}
