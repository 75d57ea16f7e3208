use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NB_CONTENT: &str = "nb_content";
pub const NB_CATS: &str = "nb_cats";

/// Event payload as delivered by the host. Keys other than `nb_content` and
/// `nb_cats` pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    payload: Map<String, Value>,
}

impl Event {
    pub fn new(content: impl Into<String>, categories: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert(NB_CONTENT.to_string(), Value::String(content.into()));
        payload.insert(NB_CATS.to_string(), Value::String(categories.into()));
        Self { payload }
    }

    pub fn from_payload(payload: Map<String, Value>) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn content(&self) -> Cow<'_, str> {
        self.text_field(NB_CONTENT)
    }

    pub fn categories(&self) -> Cow<'_, str> {
        self.text_field(NB_CATS)
    }

    pub fn set_categories(&mut self, categories: impl Into<String>) {
        self.payload
            .insert(NB_CATS.to_string(), Value::String(categories.into()));
    }

    /// Appends one category to `nb_cats`, space separated.
    pub fn append_category(&mut self, category: &str) {
        let next = {
            let current = self.categories();
            if current.trim().is_empty() {
                category.to_string()
            } else {
                format!("{current} {category}")
            }
        };
        self.set_categories(next);
    }

    fn text_field(&self, key: &str) -> Cow<'_, str> {
        match self.payload.get(key) {
            Some(Value::String(text)) => Cow::Borrowed(text.as_str()),
            Some(Value::Number(number)) => Cow::Owned(number.to_string()),
            Some(Value::Bool(flag)) => Cow::Owned(flag.to_string()),
            Some(Value::Array(items)) => Cow::Owned(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Some(Value::Null) | Some(Value::Object(_)) | None => Cow::Borrowed(""),
        }
    }
}
