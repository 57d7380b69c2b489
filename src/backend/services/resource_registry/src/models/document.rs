use chrono::{DateTime, Utc};
use resource_models::{Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Schemaless JSON document served by the registry binary.
///
/// `id`, `created_at` and `updated_at` are maintained by the stores; every
/// other top-level key of the request body lands in `fields`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl Identifiable for Document {
    type Id = Uuid;

    fn id(&self) -> Option<&Uuid> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }

    fn inherit_from(&mut self, previous: &Self) {
        if previous.created_at.is_some() {
            self.created_at = previous.created_at;
        }
    }
}

impl Timestamped for Document {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_arbitrary_fields() {
        let doc: Document = serde_json::from_value(json!({
            "title": "Dune",
            "pages": 412
        }))
        .unwrap();

        assert!(doc.id.is_none());
        assert_eq!(doc.field("title"), Some(&json!("Dune")));
        assert_eq!(doc.field("pages"), Some(&json!(412)));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({ "title": "Dune", "pages": 412 }));
    }

    #[test]
    fn touch_overrides_client_timestamps() {
        let forged = Utc::now() - chrono::Duration::days(365);
        let mut doc = Document::new();
        doc.created_at = Some(forged);
        doc.updated_at = Some(forged);

        let now = Utc::now();
        doc.touch(now);

        assert_eq!(doc.created_at(), Some(now));
        assert_eq!(doc.updated_at(), Some(now));
    }

    #[test]
    fn replace_keeps_creation_time() {
        let first = Utc::now();
        let mut stored = Document::new();
        stored.touch(first);

        let later = first + chrono::Duration::seconds(5);
        let mut replacement = Document::new().with_field("title", "Final");
        replacement.touch(later);
        replacement.inherit_from(&stored);

        assert_eq!(replacement.created_at(), Some(first));
        assert_eq!(replacement.updated_at(), Some(later));
    }
}
