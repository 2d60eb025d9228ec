//! Render context construction and address resolution

use serde_json::{Map, Value};

/// Build the context a template is rendered against.
///
/// Later sources override earlier ones on name collision, one level deep:
/// `{receiver, sender}` < `locals` < `data` < `extra`.
pub fn build_render_context(
    receiver: Option<&Value>,
    sender: Option<&Value>,
    locals: &Map<String, Value>,
    data: &Map<String, Value>,
    extra: &Map<String, Value>,
) -> Map<String, Value> {
    let mut context = Map::new();

    if let Some(receiver) = receiver {
        context.insert("receiver".to_string(), receiver.clone());
    }
    if let Some(sender) = sender {
        context.insert("sender".to_string(), sender.clone());
    }

    for source in [locals, data, extra] {
        for (key, value) in source {
            context.insert(key.clone(), value.clone());
        }
    }

    context
}

/// Address carried by a value: the string itself, or the `email` field of an object
pub fn address_of(value: &Value) -> Option<String> {
    let address = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("email")?.as_str()?,
        _ => return None,
    };

    if address.trim().is_empty() {
        None
    } else {
        Some(address.to_string())
    }
}

/// Explicit argument first, then the same-named context field
pub fn resolve_address(
    explicit: Option<&Value>,
    context: &Map<String, Value>,
    field: &str,
) -> Option<String> {
    explicit
        .and_then(address_of)
        .or_else(|| context.get(field).and_then(address_of))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_precedence_extra_over_data_over_locals_over_args() {
        let receiver = json!("r@example.com");
        let locals = map(json!({"field": "locals", "receiver": "locals@example.com", "l": 1}));
        let data = map(json!({"field": "data", "d": 2}));
        let extra = map(json!({"field": "extra", "e": 3}));

        let context = build_render_context(Some(&receiver), None, &locals, &data, &extra);

        assert_eq!(context["field"], "extra");
        assert_eq!(context["receiver"], "locals@example.com");
        assert_eq!(context["l"], 1);
        assert_eq!(context["d"], 2);
        assert_eq!(context["e"], 3);
        assert!(!context.contains_key("sender"));
    }

    #[test]
    fn test_nested_objects_are_replaced_not_merged() {
        let locals = map(json!({"user": {"name": "Default", "plan": "free"}}));
        let data = map(json!({"user": {"name": "Ada"}}));

        let context = build_render_context(None, None, &locals, &data, &Map::new());
        assert_eq!(context["user"], json!({"name": "Ada"}));
    }

    #[test]
    fn test_address_of() {
        assert_eq!(address_of(&json!("a@b.com")), Some("a@b.com".to_string()));
        assert_eq!(
            address_of(&json!({"email": "c@d.com", "name": "C"})),
            Some("c@d.com".to_string())
        );
        assert_eq!(address_of(&json!("")), None);
        assert_eq!(address_of(&json!({"name": "no email"})), None);
        assert_eq!(address_of(&json!(42)), None);
    }

    #[test]
    fn test_resolve_address_falls_back_to_context() {
        let context = map(json!({"sender": {"email": "locals@example.com"}}));

        assert_eq!(
            resolve_address(Some(&json!("arg@example.com")), &context, "sender"),
            Some("arg@example.com".to_string())
        );
        assert_eq!(
            resolve_address(Some(&json!("")), &context, "sender"),
            Some("locals@example.com".to_string())
        );
        assert_eq!(
            resolve_address(None, &context, "sender"),
            Some("locals@example.com".to_string())
        );
        assert_eq!(resolve_address(None, &Map::new(), "sender"), None);
    }
}
