use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One term from the term catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub slug: String,
    pub classes_start: NaiveDate,
    pub classes_end: NaiveDate,
}

/// A field value returned by a warehouse query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    Date(NaiveDate),
    Text(String),
    Null,
}

impl RowValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Blank text and `Null` count as absent.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::Date(_) => true,
            Self::Null => false,
        }
    }

    /// Renders the value the way string interpolation would.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Date(d) => d.to_string(),
            Self::Null => String::new(),
        }
    }
}

impl From<&str> for RowValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<NaiveDate> for RowValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// One warehouse row, mutated in place by the row adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub data: HashMap<String, RowValue>,
}

impl SectionRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&RowValue> {
        self.data.get(key)
    }

    /// `None` for absent keys and for `Null` values.
    pub fn get_non_null(&self, key: &str) -> Option<&RowValue> {
        self.data.get(key).filter(|v| !matches!(v, RowValue::Null))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(RowValue::as_str)
    }

    pub fn is_present(&self, key: &str) -> bool {
        self.data.get(key).is_some_and(RowValue::is_present)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<RowValue>) {
        self.data.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<RowValue> {
        self.data.remove(key)
    }
}

impl<K: Into<String>, V: Into<RowValue>> FromIterator<(K, V)> for SectionRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Warehouse query: a name plus filter params. The SQL lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    pub name: String,
    pub params: Vec<(String, String)>,
}

impl RowQuery {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Career {
    pub code: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A student's academic plan as delivered by the college-and-level feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicPlan {
    pub enrollment_role: String,
    pub career: Career,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An active term-career pairing the student is enrolled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerTerm {
    pub term_id: String,
    #[serde(default)]
    pub term_descr: String,
    pub acad_career: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSummary {
    pub term_id: String,
    pub term_descr: String,
}

impl From<&CareerTerm> for TermSummary {
    fn from(term: &CareerTerm) -> Self {
        Self {
            term_id: term.term_id.clone(),
            term_descr: term.term_descr.clone(),
        }
    }
}

/// Plans sharing one (role, career) key, optionally joined to a career term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerTermRole {
    pub role: String,
    pub career_code: String,
    pub academic_plans: Vec<AcademicPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<TermSummary>,
}

/// Upstream response, not yet classified.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status_code: u16,
    pub raw_body: String,
    pub parsed_body: Value,
}

/// Response after key case conversion, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEnvelope {
    pub status_code: u16,
    pub feed: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_student_id: bool,
}

/// Classified result of a proxy call. Callers check for `Errored` before
/// touching the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyResponse {
    Ok { status_code: u16, feed: Value },
    Errored,
    Disabled,
}

impl ProxyResponse {
    pub fn feed(&self) -> Option<&Value> {
        match self {
            Self::Ok { feed, .. } => Some(feed),
            _ => None,
        }
    }

    pub fn into_feed(self) -> Option<Value> {
        match self {
            Self::Ok { feed, .. } => Some(feed),
            _ => None,
        }
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored)
    }

    /// `{statusCode, feed}`, `{errored: true}` or `{}`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Ok { status_code, feed } => serde_json::json!({
                "statusCode": status_code,
                "feed": feed,
            }),
            Self::Errored => serde_json::json!({ "errored": true }),
            Self::Disabled => Value::Object(Map::new()),
        }
    }
}

/// The assembled class-enrollment record, before key camelization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositeFeed {
    pub enrollment_term_instruction_types: Vec<CareerTermRole>,
    pub enrollment_term_instructions: Map<String, Value>,
    pub enrollment_term_academic_planner: Map<String, Value>,
    pub has_holds: bool,
    pub links: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_academic_plan_keeps_unknown_fields() {
        let plan: AcademicPlan = serde_json::from_value(json!({
            "enrollmentRole": "fpf",
            "career": {"code": "UGRD", "description": "Undergraduate"},
            "plan": {"code": "25000FPFU", "description": "L&S Undeclared FPF"}
        }))
        .unwrap();

        assert_eq!(plan.enrollment_role, "fpf");
        assert_eq!(plan.career.code, "UGRD");
        assert!(plan.extra.contains_key("plan"));

        let back = serde_json::to_value(&plan).unwrap();
        assert_eq!(back["career"]["description"], "Undergraduate");
        assert_eq!(back["enrollmentRole"], "fpf");
    }

    #[test]
    fn test_proxy_response_values() {
        let ok = ProxyResponse::Ok {
            status_code: 200,
            feed: json!({"a": 1}),
        };
        assert_eq!(ok.to_value(), json!({"statusCode": 200, "feed": {"a": 1}}));
        assert_eq!(ProxyResponse::Errored.to_value(), json!({"errored": true}));
        assert!(ProxyResponse::Errored.feed().is_none());
        assert_eq!(ProxyResponse::Disabled.to_value(), json!({}));
    }

    #[test]
    fn test_row_value_presence() {
        assert!(!RowValue::text("  ").is_present());
        assert!(!RowValue::Null.is_present());
        assert!(RowValue::text("12345").is_present());
    }
}
