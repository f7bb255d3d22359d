//! Wire format of an LSIF dump: one JSON element per line.
//!
//! Every element carries `{id, type, label}`; the remaining keys depend on the
//! label and are decoded lazily, once the label is known. Identifiers may be
//! encoded as JSON numbers or strings and are normalized to [`Id`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{CorrelateError, CorrelateResult};
use crate::datastructures::Id;

/// Separator placed between the parts of a multi-part hover.
pub const HOVER_PART_SEPARATOR: &str = "\n\n---\n\n";

/// An identifier as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    /// Normalize to a numeric identifier. `0` is reserved and rejected.
    pub fn resolve(&self, line: usize) -> CorrelateResult<Id> {
        let id = match self {
            WireId::Number(n) => Some(*n),
            WireId::Text(s) => s.trim().parse::<Id>().ok(),
        };

        match id {
            Some(id) if id != 0 => Ok(id),
            _ => Err(CorrelateError::InvalidId {
                line,
                raw: match self {
                    WireId::Number(n) => n.to_string(),
                    WireId::Text(s) => s.clone(),
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Vertex,
    Edge,
}

/// A decoded line before its payload is interpreted.
#[derive(Debug, Deserialize)]
pub struct RawElement {
    pub id: WireId,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RawElement {
    pub fn parse(line: usize, text: &str) -> CorrelateResult<Self> {
        serde_json::from_str(text).map_err(|source| CorrelateError::MalformedJson { line, source })
    }

    pub fn element_kind(&self, line: usize) -> CorrelateResult<ElementKind> {
        match self.kind.as_str() {
            "vertex" => Ok(ElementKind::Vertex),
            "edge" => Ok(ElementKind::Edge),
            other => Err(CorrelateError::UnknownElementType {
                line,
                kind: other.to_string(),
            }),
        }
    }

    /// Interpret the label-specific keys as `T`.
    pub fn decode<T: DeserializeOwned>(self, line: usize) -> CorrelateResult<T> {
        let RawElement { label, payload, .. } = self;
        serde_json::from_value(Value::Object(payload)).map_err(|e| {
            CorrelateError::MalformedPayload {
                line,
                label,
                reason: e.to_string(),
            }
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MetaDataPayload {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "projectRoot")]
    pub project_root: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentPayload {
    pub uri: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RangePayload {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonikerKind {
    Import,
    Export,
    #[default]
    Local,
}

#[derive(Debug, Deserialize)]
pub struct MonikerPayload {
    #[serde(default)]
    pub kind: MonikerKind,
    pub scheme: String,
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct PackageInformationPayload {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HoverPart {
    Plain(String),
    Marked { language: String, value: String },
    Markup { kind: String, value: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HoverContents {
    Many(Vec<HoverPart>),
    One(HoverPart),
}

#[derive(Debug, Deserialize)]
pub struct HoverResult {
    pub contents: HoverContents,
}

#[derive(Debug, Deserialize)]
pub struct HoverResultPayload {
    pub result: HoverResult,
}

impl HoverPart {
    fn render(&self) -> String {
        match self {
            HoverPart::Plain(text) => text.clone(),
            HoverPart::Marked { language, value } if !language.is_empty() => {
                format!("```{language}\n{value}\n```")
            }
            HoverPart::Marked { value, .. } | HoverPart::Markup { value, .. } => value.clone(),
        }
    }
}

impl HoverContents {
    /// Render as a single markdown string.
    pub fn render(&self) -> String {
        match self {
            HoverContents::One(part) => part.render(),
            HoverContents::Many(parts) => parts
                .iter()
                .map(HoverPart::render)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(HOVER_PART_SEPARATOR),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DiagnosticCode {
    Number(i64),
    Text(String),
}

impl DiagnosticCode {
    pub fn render(&self) -> String {
        match self {
            DiagnosticCode::Number(n) => n.to_string(),
            DiagnosticCode::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DiagnosticPayload {
    #[serde(default)]
    pub severity: i32,
    #[serde(default)]
    pub code: Option<DiagnosticCode>,
    pub message: String,
    #[serde(default)]
    pub source: String,
    pub range: RangePayload,
}

#[derive(Debug, Deserialize)]
pub struct DiagnosticResultPayload {
    pub result: Vec<DiagnosticPayload>,
}

#[derive(Debug, Deserialize)]
pub struct EdgePayload {
    #[serde(rename = "outV")]
    pub out_v: WireId,
    #[serde(rename = "inV", default)]
    pub in_v: Option<WireId>,
    #[serde(rename = "inVs", default)]
    pub in_vs: Vec<WireId>,
    #[serde(default)]
    pub document: Option<WireId>,
    #[serde(default)]
    pub property: Option<String>,
}

impl EdgePayload {
    pub fn out_v(&self, line: usize) -> CorrelateResult<Id> {
        self.out_v.resolve(line)
    }

    /// The single `inV` target; required by one-to-one edges.
    pub fn in_v(&self, line: usize, label: &str) -> CorrelateResult<Id> {
        match &self.in_v {
            Some(id) => id.resolve(line),
            None => Err(CorrelateError::MalformedPayload {
                line,
                label: label.to_string(),
                reason: "missing inV".to_string(),
            }),
        }
    }

    /// Every target of a one-to-many edge, `inV` included when present.
    pub fn targets(&self, line: usize) -> CorrelateResult<Vec<Id>> {
        self.in_v
            .iter()
            .chain(self.in_vs.iter())
            .map(|id| id.resolve(line))
            .collect()
    }

    pub fn document(&self, line: usize, label: &str) -> CorrelateResult<Id> {
        match &self.document {
            Some(id) => id.resolve(line),
            None => Err(CorrelateError::MalformedPayload {
                line,
                label: label.to_string(),
                reason: "missing document".to_string(),
            }),
        }
    }
}

/// Express `uri` relative to `root`, lexically.
///
/// Components shared with the root are dropped and every remaining root
/// component becomes a `..`, so documents outside the project root come out
/// with a leading parent-directory escape.
pub fn relative_uri(root: &str, uri: &str) -> String {
    let root_parts: Vec<&str> = root.split('/').filter(|p| !p.is_empty()).collect();
    let uri_parts: Vec<&str> = uri.split('/').filter(|p| !p.is_empty()).collect();

    let shared = root_parts
        .iter()
        .zip(uri_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let parts: Vec<&str> = std::iter::repeat_n("..", root_parts.len() - shared)
        .chain(uri_parts[shared..].iter().copied())
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_id_resolution() {
        assert_eq!(WireId::Number(12).resolve(1).unwrap(), 12);
        assert_eq!(WireId::Text("34".into()).resolve(1).unwrap(), 34);
        assert!(matches!(
            WireId::Text("abc".into()).resolve(7),
            Err(CorrelateError::InvalidId { line: 7, .. })
        ));
        assert!(WireId::Number(0).resolve(1).is_err());
    }

    #[test]
    fn test_raw_element_parse() {
        let text = r#"{"id":"5","type":"vertex","label":"document","uri":"file:///a.go"}"#;
        let element = RawElement::parse(1, text).unwrap();
        assert_eq!(element.element_kind(1).unwrap(), ElementKind::Vertex);
        assert_eq!(element.label, "document");

        let payload: DocumentPayload = element.decode(1).unwrap();
        assert_eq!(payload.uri, "file:///a.go");
    }

    #[test]
    fn test_unknown_element_type() {
        let element = RawElement::parse(3, r#"{"id":1,"type":"hyperedge","label":"x"}"#).unwrap();
        assert!(matches!(
            element.element_kind(3),
            Err(CorrelateError::UnknownElementType { line: 3, .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            RawElement::parse(9, "{not json"),
            Err(CorrelateError::MalformedJson { line: 9, .. })
        ));
    }

    #[test]
    fn test_hover_rendering() {
        let parse = |json: &str| -> String {
            let payload: HoverResultPayload = serde_json::from_str(json).unwrap();
            payload.result.contents.render()
        };

        assert_eq!(parse(r#"{"result":{"contents":"plain"}}"#), "plain");
        assert_eq!(
            parse(r#"{"result":{"contents":{"language":"go","value":"func f()"}}}"#),
            "```go\nfunc f()\n```"
        );
        assert_eq!(
            parse(r#"{"result":{"contents":{"kind":"markdown","value":"**doc**"}}}"#),
            "**doc**"
        );
        assert_eq!(
            parse(r#"{"result":{"contents":[{"language":"go","value":"var x int"},"docs"]}}"#),
            "```go\nvar x int\n```\n\n---\n\ndocs"
        );
    }

    #[test]
    fn test_relative_uri() {
        assert_eq!(relative_uri("file:///repo", "file:///repo/main.go"), "main.go");
        assert_eq!(relative_uri("file:///repo/", "file:///repo/a/b.go"), "a/b.go");
        assert_eq!(
            relative_uri("file:///repo/sub", "file:///repo/other/x.go"),
            "../other/x.go"
        );
        assert_eq!(relative_uri("file:///repo", "file:///repo"), ".");
    }

    #[test]
    fn test_edge_targets() {
        let payload: EdgePayload =
            serde_json::from_str(r#"{"outV":"1","inVs":[2,"3"],"document":4}"#).unwrap();
        assert_eq!(payload.out_v(1).unwrap(), 1);
        assert_eq!(payload.targets(1).unwrap(), vec![2, 3]);
        assert_eq!(payload.document(1, "item").unwrap(), 4);
        assert!(payload.in_v(1, "next").is_err());
    }
}
