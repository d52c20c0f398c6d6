use regex::Regex;
use serde_json::{Number, Value};
use thiserror::Error;
use uuid::Uuid;

use super::Params;

/// Converts a single URL variable between its path form and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Default,
    Int,
    Float,
    Path,
    Uuid,
}

impl Converter {
    fn parse(name: &str) -> Result<Self, RuleError> {
        match name {
            "" | "default" | "string" => Ok(Converter::Default),
            "int" => Ok(Converter::Int),
            "float" => Ok(Converter::Float),
            "path" => Ok(Converter::Path),
            "uuid" => Ok(Converter::Uuid),
            other => Err(RuleError::UnknownConverter(other.to_string())),
        }
    }

    fn regex(self) -> &'static str {
        match self {
            Converter::Default => r"[^/]+",
            Converter::Int => r"\d+",
            Converter::Float => r"\d+\.\d+",
            Converter::Path => r"[^/].*?",
            Converter::Uuid => {
                r"[A-Fa-f0-9]{8}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{12}"
            }
        }
    }

    /// Render a parameter value for the path, before percent-encoding.
    pub fn to_url(self, value: &Value) -> Result<String, String> {
        match self {
            Converter::Default | Converter::Path => match value {
                Value::String(s) if s.is_empty() => Err("empty string".to_string()),
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                _ => Err("expected a scalar".to_string()),
            },
            Converter::Int => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(|n| n.to_string())
                    .map_err(|_| format!("'{}' is not an integer", s)),
                _ => Err("expected an integer".to_string()),
            },
            Converter::Float => match value {
                Value::Number(n) => n
                    .as_f64()
                    .map(format_float)
                    .ok_or_else(|| "expected a float".to_string()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(format_float)
                    .map_err(|_| format!("'{}' is not a float", s)),
                _ => Err("expected a float".to_string()),
            },
            Converter::Uuid => match value {
                Value::String(s) => Uuid::parse_str(s)
                    .map(|id| id.hyphenated().to_string())
                    .map_err(|e| e.to_string()),
                _ => Err("expected a UUID string".to_string()),
            },
        }
    }

    /// Convert a decoded path capture back into a value.
    pub fn to_value(self, raw: &str) -> Option<Value> {
        match self {
            Converter::Default | Converter::Path => Some(Value::String(raw.to_string())),
            Converter::Int => raw.parse::<u64>().ok().map(Value::from),
            Converter::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            Converter::Uuid => Uuid::parse_str(raw)
                .ok()
                .map(|id| Value::String(id.hyphenated().to_string())),
        }
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Static(String),
    Var { name: String, converter: Converter },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("URL rule '{0}' must start with a slash")]
    MissingSlash(String),

    #[error("URL rule '{0}' has an unclosed variable")]
    Unclosed(String),

    #[error("Unknown URL converter '{0}'")]
    UnknownConverter(String),

    #[error("Invalid variable name '{0}'")]
    InvalidName(String),

    #[error("Variable '{0}' appears more than once")]
    DuplicateArgument(String),

    #[error("URL converter '{0}' must span a whole path segment")]
    PathNotWholeSegment(String),
}

/// A compiled URL pattern bound to an endpoint.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    endpoint: String,
    parts: Vec<Part>,
    arguments: Vec<String>,
    regex: Regex,
}

impl Rule {
    pub fn new(pattern: &str, endpoint: impl Into<String>) -> Result<Self, RuleError> {
        if !pattern.starts_with('/') {
            return Err(RuleError::MissingSlash(pattern.to_string()));
        }

        let parts = parse_parts(pattern)?;
        let mut arguments: Vec<String> = Vec::new();
        let mut source = String::from("^");
        for (i, part) in parts.iter().enumerate() {
            match part {
                Part::Static(text) => source.push_str(&regex::escape(text)),
                Part::Var { name, converter } => {
                    if arguments.contains(name) {
                        return Err(RuleError::DuplicateArgument(name.clone()));
                    }
                    if *converter == Converter::Path && !spans_segment(&parts, i) {
                        return Err(RuleError::PathNotWholeSegment(name.clone()));
                    }
                    arguments.push(name.clone());
                    source.push_str(&format!("(?P<{}>{})", name, converter.regex()));
                }
            }
        }
        source.push('$');

        // Names and converter patterns are validated above.
        let regex = Regex::new(&source).expect("generated rule regex is valid");

        Ok(Self {
            pattern: pattern.to_string(),
            endpoint: endpoint.into(),
            parts,
            arguments,
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Arguments this rule needs that `params` lacks (or holds as null).
    pub fn missing_arguments(&self, params: &Params) -> Vec<String> {
        self.arguments
            .iter()
            .filter(|name| params.get(*name).map_or(true, Value::is_null))
            .cloned()
            .collect()
    }

    /// Render the path for this rule. Every argument must be present.
    pub fn build_path(&self, params: &Params) -> Result<String, (String, String)> {
        let mut path = String::new();
        for part in &self.parts {
            match part {
                Part::Static(text) => path.push_str(text),
                Part::Var { name, converter } => {
                    let value = params.get(name).unwrap_or(&Value::Null);
                    let raw = converter
                        .to_url(value)
                        .map_err(|reason| (name.clone(), reason))?;
                    if *converter == Converter::Path {
                        let encoded: Vec<String> = raw.split('/').map(encode_segment).collect();
                        path.push_str(&encoded.join("/"));
                    } else {
                        path.push_str(&encode_segment(&raw));
                    }
                }
            }
        }
        Ok(path)
    }

    /// Match a path (already stripped of any script root).
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut params = Params::new();
        for part in &self.parts {
            if let Part::Var { name, converter } = part {
                let raw = captures.name(name)?.as_str();
                let decoded = urlencoding::decode(raw).ok()?;
                params.insert(name.clone(), converter.to_value(&decoded)?);
            }
        }
        Some(params)
    }
}

/// Percent-encode one path segment. Dot segments are encoded too, so a
/// value of `..` can't climb out of the rule's path.
fn encode_segment(piece: &str) -> String {
    match piece {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => urlencoding::encode(piece).into_owned(),
    }
}

fn spans_segment(parts: &[Part], index: usize) -> bool {
    let before_ok = match index.checked_sub(1).and_then(|i| parts.get(i)) {
        Some(Part::Static(text)) => text.ends_with('/'),
        _ => false,
    };
    let after_ok = match parts.get(index + 1) {
        None => true,
        Some(Part::Static(text)) => text.starts_with('/'),
        Some(Part::Var { .. }) => false,
    };
    before_ok && after_ok
}

fn parse_parts(pattern: &str) -> Result<Vec<Part>, RuleError> {
    let mut parts = Vec::new();
    let mut rest = pattern;

    while let Some(start) = rest.find('<') {
        if start > 0 {
            parts.push(Part::Static(rest[..start].to_string()));
        }
        let after = &rest[start + 1..];
        let end = after
            .find('>')
            .ok_or_else(|| RuleError::Unclosed(pattern.to_string()))?;
        let spec = after[..end].trim();
        let (converter, name) = match spec.split_once(':') {
            Some((converter, name)) => (converter.trim(), name.trim()),
            None => ("", spec),
        };
        if !is_identifier(name) {
            return Err(RuleError::InvalidName(name.to_string()));
        }
        parts.push(Part::Var {
            name: name.to_string(),
            converter: Converter::parse(converter)?,
        });
        rest = &after[end + 1..];
    }

    if !rest.is_empty() {
        parts.push(Part::Static(rest.to_string()));
    }
    Ok(parts)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parses_static_rule() {
        let rule = Rule::new("/authors/", "authors").unwrap();
        assert!(rule.arguments().is_empty());
        assert_eq!(rule.build_path(&Params::new()).unwrap(), "/authors/");
    }

    #[test]
    fn test_parses_converters_and_arguments() {
        let rule = Rule::new("/author/<int:id>/books/<slug>", "author_books").unwrap();
        assert_eq!(rule.arguments(), &["id".to_string(), "slug".to_string()]);
    }

    #[test]
    fn test_rejects_bad_patterns() {
        assert_eq!(
            Rule::new("author", "a").unwrap_err(),
            RuleError::MissingSlash("author".into())
        );
        assert!(matches!(
            Rule::new("/author/<int:id", "a"),
            Err(RuleError::Unclosed(_))
        ));
        assert_eq!(
            Rule::new("/author/<hex:id>", "a").unwrap_err(),
            RuleError::UnknownConverter("hex".into())
        );
        assert_eq!(
            Rule::new("/a/<id>/<id>", "a").unwrap_err(),
            RuleError::DuplicateArgument("id".into())
        );
        assert_eq!(
            Rule::new("/a/<1id>", "a").unwrap_err(),
            RuleError::InvalidName("1id".into())
        );
        assert_eq!(
            Rule::new("/a/x<path:p>", "a").unwrap_err(),
            RuleError::PathNotWholeSegment("p".into())
        );
    }

    #[test]
    fn test_builds_int_from_number_or_numeric_string() {
        let rule = Rule::new("/author/<int:id>", "author").unwrap();
        assert_eq!(rule.build_path(&params(json!({"id": 123}))).unwrap(), "/author/123");
        assert_eq!(rule.build_path(&params(json!({"id": "7"}))).unwrap(), "/author/7");
        assert!(rule.build_path(&params(json!({"id": "seven"}))).is_err());
    }

    #[test]
    fn test_default_converter_percent_encodes() {
        let rule = Rule::new("/books/<id>", "book").unwrap();
        assert_eq!(
            rule.build_path(&params(json!({"id": "a b/c"}))).unwrap(),
            "/books/a%20b%2Fc"
        );
    }

    #[test]
    fn test_path_converter_keeps_slashes() {
        let rule = Rule::new("/files/<path:name>", "file").unwrap();
        assert_eq!(
            rule.build_path(&params(json!({"name": "docs/read me.txt"}))).unwrap(),
            "/files/docs/read%20me.txt"
        );
        let matched = rule.match_path("/files/docs/read%20me.txt").unwrap();
        assert_eq!(matched["name"], json!("docs/read me.txt"));
    }

    #[test]
    fn test_path_converter_encodes_dot_segments() {
        let rule = Rule::new("/files/<path:name>", "file").unwrap();
        assert_eq!(
            rule.build_path(&params(json!({"name": "docs/../secret"}))).unwrap(),
            "/files/docs/%2E%2E/secret"
        );
        let matched = rule.match_path("/files/docs/%2E%2E/secret").unwrap();
        assert_eq!(matched["name"], json!("docs/../secret"));
    }

    #[test]
    fn test_missing_arguments_treats_null_as_absent() {
        let rule = Rule::new("/author/<int:id>", "author").unwrap();
        assert_eq!(rule.missing_arguments(&params(json!({"id": null}))), vec!["id"]);
        assert!(rule.missing_arguments(&params(json!({"id": 1}))).is_empty());
    }

    #[test]
    fn test_matches_and_converts_captures() {
        let rule = Rule::new("/author/<int:id>", "author").unwrap();
        let matched = rule.match_path("/author/123").unwrap();
        assert_eq!(matched["id"], json!(123));
        assert!(rule.match_path("/author/abc").is_none());
        assert!(rule.match_path("/author/123/extra").is_none());
    }

    #[test]
    fn test_uuid_round_trips_normalized() {
        let rule = Rule::new("/pads/<uuid:id>", "pad").unwrap();
        let id = Uuid::new_v4();
        let upper = id.hyphenated().to_string().to_uppercase();
        let path = rule.build_path(&params(json!({"id": upper}))).unwrap();
        assert_eq!(path, format!("/pads/{}", id.hyphenated()));
        let matched = rule.match_path(&path).unwrap();
        assert_eq!(matched["id"], json!(id.hyphenated().to_string()));
    }

    #[test]
    fn test_float_converter_renders_decimal_point() {
        let rule = Rule::new("/price/<float:amount>", "price").unwrap();
        assert_eq!(
            rule.build_path(&params(json!({"amount": 2}))).unwrap(),
            "/price/2.0"
        );
        assert_eq!(
            rule.match_path("/price/2.5").unwrap()["amount"],
            json!(2.5)
        );
    }
}
