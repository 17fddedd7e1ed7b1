//! Shared prompt helpers.

use serde_json::Value;

use super::AiError;

/// `$1,234,567` with no decimals. Negative amounts keep their sign.
pub fn format_money(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Parse the first JSON object in a model reply, tolerating code fences and
/// chatter around it.
pub fn parse_json_object(raw: &str) -> Result<Value, AiError> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let slice = match (start, end) {
        (Some(s), Some(e)) if e > s => &raw[s..=e],
        _ => return Err(AiError::Malformed("no JSON object in response".into())),
    };
    let value: Value =
        serde_json::from_str(slice).map_err(|e| AiError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(AiError::Malformed("response is not a JSON object".into()));
    }
    Ok(value)
}

pub fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Integer field that may arrive as a number (`8`, `8.0`) or a string (`"8"`).
pub fn u64_field(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64),
        _ => None,
    }
}

pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_grouping() {
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(999.4), "$999");
        assert_eq!(format_money(142_000.0), "$142,000");
        assert_eq!(format_money(5_000_000.0), "$5,000,000");
        assert_eq!(format_money(-28_000.0), "-$28,000");
    }

    #[test]
    fn json_inside_code_fence() {
        let raw = "Sure!\n```json\n{\"a\": 1}\n```";
        assert_eq!(parse_json_object(raw).unwrap()["a"], 1);
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse_json_object("no json here"), Err(AiError::Malformed(_))));
        assert!(matches!(parse_json_object("{not json}"), Err(AiError::Malformed(_))));
    }

    #[test]
    fn lenient_field_access() {
        let v: Value = serde_json::json!({
            "n": 8.0, "s": "7", "name": "  ", "alt": "x", "list": ["a", "", 3, "b"]
        });
        assert_eq!(u64_field(&v, "n"), Some(8));
        assert_eq!(u64_field(&v, "s"), Some(7));
        assert_eq!(u64_field(&v, "missing"), None);
        assert_eq!(str_field(&v, &["name", "alt"]).as_deref(), Some("x"));
        assert_eq!(string_list(&v, "list"), vec!["a", "b"]);
    }
}
