use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::LoadError;

/// Where a document comes from: an HTTP(S) URI or a local file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Url(Url),
    File(PathBuf),
}

impl DocumentSource {
    /// Detect the source kind from a raw string. Anything that is not an
    /// `http://` or `https://` URI is treated as a filesystem path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            if let Ok(url) = Url::parse(raw) {
                return DocumentSource::Url(url);
            }
        }
        DocumentSource::File(PathBuf::from(raw))
    }

    pub fn as_str(&self) -> String {
        match self {
            DocumentSource::Url(url) => url.to_string(),
            DocumentSource::File(path) => path.display().to_string(),
        }
    }
}

/// Fetches raw spec bytes and parses them into a generic JSON tree.
///
/// Content type is detected by attempting a JSON parse first and falling
/// back to YAML, so servers with wrong `Content-Type` headers still work.
pub struct DocumentLoader {
    client: reqwest::Client,
}

impl DocumentLoader {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Read the source and parse it into a raw tree.
    pub async fn load(&self, source: &DocumentSource) -> Result<Value, LoadError> {
        let text = match source {
            DocumentSource::Url(url) => self.fetch(url).await?,
            DocumentSource::File(path) => fs::read_to_string(path)
                .map_err(|e| LoadError::SourceUnreachable(format!("{}: {e}", path.display())))?,
        };
        parse_document(&text)
    }

    async fn fetch(&self, url: &Url) -> Result<String, LoadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LoadError::SourceUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LoadError::SourceUnreachable(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| LoadError::SourceUnreachable(e.to_string()))
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

/// Parse text as JSON, then as YAML. The result is always a `serde_json`
/// tree with object keys as strings.
pub fn parse_document(text: &str) -> Result<Value, LoadError> {
    if text.trim().is_empty() {
        return Err(LoadError::EmptyDocument);
    }

    let tree = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(json_err) => match serde_yaml_ng::from_str::<serde_yaml_ng::Value>(text) {
            Ok(value) => yaml_to_json(value),
            Err(yaml_err) => {
                return Err(LoadError::Parse {
                    json: json_err,
                    yaml: yaml_err,
                });
            }
        },
    };

    match &tree {
        Value::Object(map) if !map.is_empty() => Ok(tree),
        _ => Err(LoadError::EmptyDocument),
    }
}

/// Convert a YAML value to a JSON value. YAML mapping keys are not
/// necessarily strings (`200:` parses as an integer), so keys are
/// stringified on the way through.
fn yaml_to_json(value: serde_yaml_ng::Value) -> Value {
    use serde_yaml_ng::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(Value::from).unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => serde_yaml_ng::to_string(&other)
                        .map(|s| s.trim_end().to_string())
                        .unwrap_or_default(),
                };
                out.insert(key, yaml_to_json(v));
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_url_sources() {
        let src = DocumentSource::parse("https://example.com/openapi.json");
        assert!(matches!(src, DocumentSource::Url(_)));

        let src = DocumentSource::parse("./specs/petstore.yaml");
        assert!(matches!(src, DocumentSource::File(_)));
    }

    #[test]
    fn parses_json_first() {
        let tree = parse_document(r#"{"openapi": "3.0.0"}"#).unwrap();
        assert_eq!(tree["openapi"], "3.0.0");
    }

    #[test]
    fn falls_back_to_yaml() {
        let tree = parse_document("openapi: 3.0.0\ninfo:\n  title: T\n").unwrap();
        assert_eq!(tree["openapi"], "3.0.0");
    }

    #[test]
    fn stringifies_numeric_yaml_keys() {
        let tree = parse_document("responses:\n  200:\n    description: ok\n").unwrap();
        assert_eq!(tree["responses"]["200"]["description"], "ok");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(parse_document("   "), Err(LoadError::EmptyDocument)));
        assert!(matches!(
            parse_document("null"),
            Err(LoadError::EmptyDocument)
        ));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_document("{not json: [and not yaml").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
