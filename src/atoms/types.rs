// tutorchat — Wire types
// JSON bodies exchanged with the tutoring backend. Response fields default
// when absent; the server omits keys freely.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

// ── Chat ───────────────────────────────────────────────────────────────

/// Body of `POST /chat` and `POST /get_book_recommendations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatResponse {
    /// The reply text, if non-empty.
    pub fn reply_text(&self) -> Option<&str> {
        non_empty(self.reply.as_deref())
    }

    /// The server-side error text, if non-empty.
    pub fn error_text(&self) -> Option<&str> {
        non_empty(self.error.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Ai,
}

impl Role {
    /// CSS class used for bubbles of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Ai => "ai",
        }
    }
}

// ── History ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryTurn {
    pub role: Role,
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
}

/// `GET /chat/history` answers with either an ordered array of turns or an
/// object carrying `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HistoryPayload {
    Turns(Vec<HistoryTurn>),
    Failure {
        #[serde(default)]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClearResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Book recommendations ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Book {
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_default")]
    pub image: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookRecommendations {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub keywords: Option<String>,
}

// ── Ordered JSON objects ───────────────────────────────────────────────

/// A JSON object kept as `(key, value)` pairs in source order.
/// Chart labels and dashboard cards follow the order the server emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter().map(|(_, v)| v)
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, V>()? {
            entries.push((k, v));
        }
        Ok(OrderedMap(entries))
    }

    // Python serializes an empty dict built from a missing relation as null
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::default())
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::default())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}

// ── Teacher analytics ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TeacherAnalytics {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stats: TeacherStats,
    #[serde(default)]
    pub scaffolding_stats: OrderedMap<f64>,
    #[serde(default)]
    pub unit_stats: OrderedMap<f64>,
    #[serde(default)]
    pub level_stats: OrderedMap<f64>,
    #[serde(default)]
    pub daily_activity: OrderedMap<f64>,
    #[serde(default)]
    pub students: Vec<StudentRow>,
}

/// Headline numbers. The server emits these keys in camelCase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStats {
    #[serde(default)]
    pub active_students: Option<Value>,
    #[serde(default)]
    pub total_conversations: Option<Value>,
    #[serde(default)]
    pub avg_level: Option<Value>,
    #[serde(default)]
    pub popular_unit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudentRow {
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_count_opt")]
    pub total_conversations: Option<u64>,
    #[serde(default, deserialize_with = "null_default")]
    pub main_scaffolding: String,
    #[serde(default, deserialize_with = "null_default")]
    pub current_level: String,
    #[serde(default, deserialize_with = "null_default")]
    pub favorite_unit: String,
    #[serde(default, deserialize_with = "null_default")]
    pub last_activity: String,
}

// ── Student analytics ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudentAnalytics {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub overall_stats: OverallStats,
    #[serde(default)]
    pub unit_progress: OrderedMap<UnitProgress>,
    #[serde(default)]
    pub scaffolding_stats: OrderedMap<ScaffoldingShare>,
    #[serde(default)]
    pub weakness_analysis: OrderedMap<Weakness>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverallStats {
    #[serde(default)]
    pub units_studied: Option<Value>,
    #[serde(default)]
    pub avg_level: Option<Value>,
    #[serde(default)]
    pub most_discussed_unit: Option<String>,
    #[serde(default)]
    pub main_scaffolding: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UnitProgress {
    #[serde(default, deserialize_with = "null_default")]
    pub avg_level: f64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub conversations: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub current_level: String,
    #[serde(default, deserialize_with = "null_default")]
    pub trend: String,
    #[serde(default, deserialize_with = "null_default")]
    pub last_studied: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScaffoldingShare {
    #[serde(default, deserialize_with = "null_default")]
    pub count: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Weakness {
    #[serde(default, deserialize_with = "null_default")]
    pub weakness: String,
    #[serde(default, deserialize_with = "null_default")]
    pub suggestions: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub confidence: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    #[serde(default, deserialize_with = "null_default")]
    pub unit: String,
    #[serde(default, deserialize_with = "null_default")]
    pub level: String,
    #[serde(default, deserialize_with = "null_default")]
    pub timestamp: String,
}

// ── Helpers ────────────────────────────────────────────────────────────

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Explicit `null` reads as the field's default, like a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counts arrive as ints, floats (`9.0` from SQL `AVG`/`SUM`) or `null`.
fn lenient_count_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let n = Option::<f64>::deserialize(deserializer)?;
    Ok(n.filter(|n| n.is_finite() && *n >= 0.0).map(|n| n.round() as u64))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient_count_opt(deserializer)?.unwrap_or(0))
}

/// Display text for a loosely-typed stat value. Empty strings, zero, `false`
/// and `null` count as absent, matching how the dashboards fall back to a
/// placeholder.
pub fn stat_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".into()),
        _ => None,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
