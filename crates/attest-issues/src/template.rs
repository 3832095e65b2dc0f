//! Minimal mustache-style template rendering (§4.6): `{{var}}`,
//! `{{obj.prop}}`, `{{#array}}…{{this}}…{{/array}}`, and falsy-collapsing
//! conditional blocks sharing the same `{{#name}}…{{/name}}` syntax.

use serde_json::Value;

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    if path == "this" {
        return Some(context);
    }
    let mut current = context;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn substitute_vars(template: &str, context: &Value) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let Some(start) = rest.find("{{") else {
            output.push_str(rest);
            break;
        };
        let Some(end) = rest[start..].find("}}") else {
            output.push_str(rest);
            break;
        };
        let end = start + end;
        output.push_str(&rest[..start]);
        let path = rest[start + 2..end].trim();
        if !path.starts_with('#') && !path.starts_with('/') {
            let value = lookup(context, path);
            output.push_str(&value.map(scalar_to_string).unwrap_or_default());
        }
        rest = &rest[end + 2..];
    }
    output
}

/// Finds the matching `{{/name}}` for a `{{#name}}` section whose body
/// starts at `body_start`. Returns `(body_end, after_close)`.
fn find_section_end(template: &str, name: &str, body_start: usize) -> Option<(usize, usize)> {
    let open_tag = format!("{{{{#{name}}}}}");
    let close_tag = format!("{{{{/{name}}}}}");
    let mut depth = 1usize;
    let mut cursor = body_start;
    loop {
        let next_open = template[cursor..].find(&open_tag).map(|i| cursor + i);
        let next_close = template[cursor..].find(&close_tag).map(|i| cursor + i);
        match (next_open, next_close) {
            (Some(open_at), Some(close_at)) if open_at < close_at => {
                depth += 1;
                cursor = open_at + open_tag.len();
            }
            (_, Some(close_at)) => {
                depth -= 1;
                if depth == 0 {
                    return Some((close_at, close_at + close_tag.len()));
                }
                cursor = close_at + close_tag.len();
            }
            _ => return None,
        }
    }
}

/// Renders `template` against `context`. Section blocks (`{{#name}}…{{/name}}`)
/// iterate when `context.name` is an array (substituting each element for
/// `{{this}}`/`{{this.prop}}`), render once when it is any other truthy
/// value, and collapse to empty when falsy or missing.
pub fn render(template: &str, context: &Value) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0usize;
    loop {
        let Some(open_rel) = rest.find("{{#") else {
            output.push_str(&substitute_vars(rest, context));
            break;
        };
        let open_at = offset + open_rel;
        let Some(name_end_rel) = rest[open_rel..].find("}}") else {
            output.push_str(&substitute_vars(rest, context));
            break;
        };
        let name_end = open_rel + name_end_rel;
        let name = template[open_at + 3..offset + name_end].to_string();
        let body_start = offset + name_end + 2;

        output.push_str(&substitute_vars(&template[offset..open_at], context));

        let Some((body_end, after_close)) = find_section_end(template, &name, body_start) else {
            // Unterminated section: treat the rest of the template literally.
            output.push_str(&substitute_vars(&template[open_at..], context));
            break;
        };
        let body = &template[body_start..body_end];

        let section_value = lookup(context, &name);
        match section_value {
            Some(Value::Array(items)) => {
                for item in items {
                    output.push_str(&render(body, item));
                }
            }
            Some(value) if is_truthy(value) => {
                output.push_str(&render(body, context));
            }
            _ => {}
        }

        offset = after_close;
        rest = &template[offset..];
    }
    output
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render;

    #[test]
    fn unit_scalar_substitution() {
        let output = render("Hello {{name}}!", &json!({"name": "World"}));
        assert_eq!(output, "Hello World!");
    }

    #[test]
    fn functional_nested_property_substitution() {
        let output = render("{{scenario.id}}", &json!({"scenario": {"id": "login"}}));
        assert_eq!(output, "login");
    }

    #[test]
    fn functional_array_section_iterates_with_this() {
        let output = render("{{#items}}-{{this}} {{/items}}", &json!({"items": ["a", "b"]}));
        assert_eq!(output, "-a -b ");
    }

    #[test]
    fn regression_falsy_conditional_collapses_to_empty() {
        let output = render("before{{#flag}}shown{{/flag}}after", &json!({"flag": false}));
        assert_eq!(output, "beforeafter");
    }

    #[test]
    fn functional_truthy_conditional_renders_once() {
        let output = render("{{#flag}}shown {{name}}{{/flag}}", &json!({"flag": true, "name": "x"}));
        assert_eq!(output, "shown x");
    }

    #[test]
    fn integration_missing_variable_renders_empty_string() {
        let output = render("[{{missing}}]", &json!({}));
        assert_eq!(output, "[]");
    }
}
