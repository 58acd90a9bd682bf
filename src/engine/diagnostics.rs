//! Failure attribution heuristics
//!
//! Both functions work on text only. They do not understand the expression
//! grammar, so a rule that mentions several fields is attributed to the
//! first one.

use crate::types::Value;

/// Root variable prefix searched for in expanded expressions
const ROOT_PREFIX: &str = "values.";

/// Error message markers that precede a key name, tried in order
const KEY_MARKERS: [&str; 3] = ["no such key: ", "undefined field '", "missing key "];

/// Characters that end a field path inside an expression
const PATH_TERMINATORS: &[char] = &[
    ')', '&', '|', '=', '!', '<', '>', ',', '?', ':', '+', '*', '%',
];

/// Extracts the key an evaluation error complained about
pub fn extract_path_from_error(message: &str) -> Option<String> {
    let rest = KEY_MARKERS
        .iter()
        .find_map(|marker| message.find(marker).map(|idx| &message[idx + marker.len()..]))?;

    let rest = rest.trim_start_matches(['\'', '"']);
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '\'' || c == '"')
        .unwrap_or(rest.len());

    match &rest[..end] {
        "" => None,
        path => Some(path.to_string()),
    }
}

/// Locates the first `values.` reference in `expression` and looks it up
///
/// Returns the value found and the path it was found at. The walk stops at
/// the first intermediate segment that is not a mapping and reports that
/// segment's value and the path consumed so far.
pub fn extract_path_and_value(document: &Value, expression: &str) -> (Option<Value>, Option<String>) {
    let Some(start) = expression.find(ROOT_PREFIX) else {
        return (None, None);
    };
    let candidate = &expression[start + ROOT_PREFIX.len()..];
    let candidate = candidate
        .find(ROOT_PREFIX)
        .map_or(candidate, |next| &candidate[..next]);
    let candidate = candidate
        .split(char::is_whitespace)
        .next()
        .unwrap_or_default();
    let candidate = candidate
        .find(PATH_TERMINATORS)
        .map_or(candidate, |end| &candidate[..end]);
    let path = candidate.trim_matches(['(', ')']);

    if path.is_empty() {
        return (None, None);
    }

    let segments: Vec<&str> = path.split('.').collect();
    let mut current = document;
    for (i, segment) in segments.iter().enumerate() {
        let found = current.get(segment);
        let is_last = i + 1 == segments.len();
        match found {
            Some(next @ Value::Mapping(_)) if !is_last => current = next,
            _ => return (found.cloned(), Some(segments[..=i].join("."))),
        }
    }

    (Some(current.clone()), Some(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::values::parse_document;

    fn doc() -> Value {
        parse_document(
            "service:\n  type: ClusterIP\n  port: 70000\nreplicas: 3\nhosts:\n  - a\nname: ~\n",
        )
        .unwrap()
    }

    #[test]
    fn test_path_from_error_markers() {
        assert_eq!(
            extract_path_from_error("no such key: port"),
            Some("port".to_string())
        );
        assert_eq!(
            extract_path_from_error("undefined field 'nodePort'"),
            Some("nodePort".to_string())
        );
        assert_eq!(
            extract_path_from_error("missing key \"ingress\" in map"),
            Some("ingress".to_string())
        );
        assert_eq!(extract_path_from_error("division by zero"), None);
        assert_eq!(extract_path_from_error("no such key: "), None);
    }

    #[test]
    fn test_path_and_value_for_nested_field() {
        let (value, path) = extract_path_and_value(&doc(), "values.service.port <= 65535");
        assert_eq!(value, Some(Value::from(70000)));
        assert_eq!(path.as_deref(), Some("service.port"));
    }

    #[test]
    fn test_path_and_value_inside_parentheses() {
        let (value, path) =
            extract_path_and_value(&doc(), "(values.service.port >= 1 && values.service.port <= 65535)");
        assert_eq!(value, Some(Value::from(70000)));
        assert_eq!(path.as_deref(), Some("service.port"));
    }

    #[test]
    fn test_path_and_value_without_spaces() {
        let (value, path) =
            extract_path_and_value(&doc(), "has(values.service)&&has(values.service.port)");
        assert_eq!(path.as_deref(), Some("service"));
        let Some(Value::Mapping(service)) = value else {
            panic!("expected mapping");
        };
        assert_eq!(service.get("type"), Some(&Value::from("ClusterIP")));
    }

    #[test]
    fn test_walk_stops_at_scalar() {
        let (value, path) = extract_path_and_value(&doc(), "values.replicas.count > 1");
        assert_eq!(value, Some(Value::from(3)));
        assert_eq!(path.as_deref(), Some("replicas"));
    }

    #[test]
    fn test_missing_intermediate_segment() {
        let (value, path) = extract_path_and_value(&doc(), "values.ingress.host != ''");
        assert_eq!(value, None);
        assert_eq!(path.as_deref(), Some("ingress"));
    }

    #[test]
    fn test_missing_leaf() {
        let (value, path) = extract_path_and_value(&doc(), "values.service.nodePort > 0");
        assert_eq!(value, None);
        assert_eq!(path.as_deref(), Some("service.nodePort"));
    }

    #[test]
    fn test_no_values_reference() {
        assert_eq!(extract_path_and_value(&doc(), "1 > 2"), (None, None));
        assert_eq!(extract_path_and_value(&doc(), "values. > 2"), (None, None));
    }

    #[test]
    fn test_first_reference_wins() {
        let (value, path) = extract_path_and_value(&doc(), "1 < values.replicas && values.service.port < 10");
        assert_eq!(value, Some(Value::from(3)));
        assert_eq!(path.as_deref(), Some("replicas"));
    }
}
