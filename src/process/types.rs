/// Core diagram type definitions
///
/// Defines the elements (nodes) and connections (edges) of a process diagram,
/// their identifiers and the opaque properties bag carried by both.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Identifier of an element within one process
///
/// Elements created in the editor start with a `Local` id and are rebound to
/// the `Remote` row id once storage has acknowledged them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Remote(i64),
    Local(Uuid),
}

/// Identifier of a connection within one process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionId {
    Remote(i64),
    Local(Uuid),
}

impl ElementId {
    /// Fresh temporary id for an element not yet known to storage
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    pub fn remote_id(&self) -> Option<i64> {
        match self {
            Self::Remote(id) => Some(*id),
            Self::Local(_) => None,
        }
    }
}

impl ConnectionId {
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    pub fn remote_id(&self) -> Option<i64> {
        match self {
            Self::Remote(id) => Some(*id),
            Self::Local(_) => None,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(id) => write!(f, "{}", id),
            Self::Local(uuid) => write!(f, "tmp-{}", uuid),
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(id) => write!(f, "{}", id),
            Self::Local(uuid) => write!(f, "tmp-{}", uuid),
        }
    }
}

/// Kind of diagram element
///
/// Serialized as the lowercase wire string. Unknown strings are kept in
/// `Other` so they survive a load/save cycle; they render with the default
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Start,
    Step,
    Decision,
    End,
    Subprocess,
    Document,
    User,
    System,
    Database,
    Cloud,
    Security,
    Public,
    Other(String),
}

impl ElementType {
    /// All built-in kinds in palette order
    pub const BUILTIN: [ElementType; 12] = [
        ElementType::Start,
        ElementType::Step,
        ElementType::Decision,
        ElementType::End,
        ElementType::Subprocess,
        ElementType::Document,
        ElementType::User,
        ElementType::System,
        ElementType::Database,
        ElementType::Cloud,
        ElementType::Security,
        ElementType::Public,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Step => "step",
            Self::Decision => "decision",
            Self::End => "end",
            Self::Subprocess => "subprocess",
            Self::Document => "document",
            Self::User => "user",
            Self::System => "system",
            Self::Database => "database",
            Self::Cloud => "cloud",
            Self::Security => "security",
            Self::Public => "public",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ElementType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "start" => Self::Start,
            "step" => Self::Step,
            "decision" => Self::Decision,
            "end" => Self::End,
            "subprocess" => Self::Subprocess,
            "document" => Self::Document,
            "user" => Self::User,
            "system" => Self::System,
            "database" => Self::Database,
            "cloud" => Self::Cloud,
            "security" => Self::Security,
            "public" => Self::Public,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for ElementType {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<ElementType> for String {
    fn from(kind: ElementType) -> Self {
        match kind {
            ElementType::Other(raw) => raw,
            builtin => builtin.as_str().to_string(),
        }
    }
}

impl Default for ElementType {
    fn default() -> Self {
        Self::Step
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point in canvas space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same point with negative axes pulled back to 0
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.max(0.0),
            y: self.y.max(0.0),
        }
    }

    pub fn offset_from(self, origin: Position) -> Position {
        Position::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Open-ended properties bag attached to elements and connections
///
/// Stored and transmitted as JSON text. Only the `description` key has a
/// meaning the editor relies on; everything else is carried opaquely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(Map<String, Value>);

impl Properties {
    const DESCRIPTION: &'static str = "description";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(description: impl Into<String>) -> Self {
        let mut properties = Self::new();
        properties.set_description(description);
        properties
    }

    /// Parse the serialized form sent by storage
    ///
    /// Missing text, invalid JSON and non-object JSON all yield an empty map.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::new();
        };

        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Self(map),
            Ok(Value::Null) => Self::new(),
            Ok(other) => {
                tracing::warn!("Ignoring non-object properties payload: {}", other);
                Self::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed properties payload: {}", e);
                Self::new()
            }
        }
    }

    /// Canonical JSON text used on the wire
    pub fn to_json_text(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn description(&self) -> Option<&str> {
        self.0.get(Self::DESCRIPTION).and_then(Value::as_str)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.0
            .insert(Self::DESCRIPTION.to_string(), Value::String(description.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Map<String, Value>> for Properties {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A node of the process diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub element_type: ElementType,
    pub label: String,
    pub position: Position,
    pub properties: Properties,
}

impl Element {
    pub fn description(&self) -> Option<&str> {
        self.properties.description()
    }
}

/// A directed, optionally labelled edge between two elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: ElementId,
    pub target: ElementId,
    pub label: Option<String>,
    pub properties: Properties,
}

impl Connection {
    /// Whether this connection touches `element` at either end
    pub fn references(&self, element: &ElementId) -> bool {
        &self.source == element || &self.target == element
    }

    /// Whether this connection links `a` and `b`, in either direction
    pub fn links(&self, a: &ElementId, b: &ElementId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }
}

/// Input for creating an element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewElement {
    pub element_type: ElementType,
    pub label: String,
    pub properties: Properties,
    /// Explicit placement; a random spot is picked when absent
    pub position: Option<Position>,
}

impl NewElement {
    pub fn new(element_type: ElementType, label: impl Into<String>) -> Self {
        Self {
            element_type,
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

/// Partial update of an element; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub label: Option<String>,
    pub element_type: Option<ElementType>,
    pub position: Option<Position>,
    pub properties: Option<Properties>,
}

impl ElementPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Result of a connect request
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    /// A new connection was appended
    Created(Connection),
    /// The two elements were already linked (in either direction)
    AlreadyConnected(ConnectionId),
}

/// Everything removed by a cascading element delete
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedElement {
    pub element: Element,
    pub connections: Vec<Connection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_type_round_trips_unknown_strings() {
        let kind: ElementType = serde_json::from_str("\"swimlane\"").unwrap();
        assert_eq!(kind, ElementType::Other("swimlane".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"swimlane\"");

        let decision: ElementType = serde_json::from_str("\"decision\"").unwrap();
        assert_eq!(decision, ElementType::Decision);
        assert_eq!(serde_json::to_string(&ElementType::Subprocess).unwrap(), "\"subprocess\"");
    }

    #[test]
    fn properties_tolerate_garbage() {
        assert!(Properties::parse_lenient(None).is_empty());
        assert!(Properties::parse_lenient(Some("")).is_empty());
        assert!(Properties::parse_lenient(Some("{not json")).is_empty());
        assert!(Properties::parse_lenient(Some("[1,2,3]")).is_empty());
        assert!(Properties::parse_lenient(Some("null")).is_empty());

        let parsed = Properties::parse_lenient(Some(r#"{"description":"Check invoice","sla":3}"#));
        assert_eq!(parsed.description(), Some("Check invoice"));
        assert_eq!(parsed.get("sla"), Some(&Value::from(3)));
    }

    #[test]
    fn properties_text_form_parses_back() {
        let mut properties = Properties::with_description("Approve");
        properties.insert("owner", Value::from("finance"));
        let reparsed = Properties::parse_lenient(Some(&properties.to_json_text()));
        assert_eq!(reparsed, properties);
    }

    #[test]
    fn links_ignores_direction() {
        let a = ElementId::Remote(1);
        let b = ElementId::Remote(2);
        let connection = Connection {
            id: ConnectionId::Remote(10),
            source: a,
            target: b,
            label: None,
            properties: Properties::new(),
        };
        assert!(connection.links(&a, &b));
        assert!(connection.links(&b, &a));
        assert!(!connection.links(&a, &ElementId::Remote(3)));
    }
}
