//! JSON-LD payloads embedded in article pages.
//!
//! A `<script type="application/ld+json">` body is either one object, a list
//! of objects, or garbage. [`StructuredData::parse`] sorts it into one of
//! those three shapes and [`StructuredData::find_article`] picks the first
//! object whose `@type` names an article type.

use serde_json::{Map, Value};

/// Script type carrying structured data.
pub const STRUCTURED_DATA_SELECTOR: &str = "script[type='application/ld+json']";

#[derive(Debug, Clone, PartialEq)]
pub enum StructuredData {
    Single(Map<String, Value>),
    List(Vec<Value>),
    /// Not JSON, or JSON of a shape that cannot describe an article.
    Malformed,
}

impl StructuredData {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => Self::Single(object),
            Ok(Value::Array(items)) => Self::List(items),
            _ => Self::Malformed,
        }
    }

    /// First object declaring one of `article_types` as its `@type`.
    ///
    /// In a list, non-object members are skipped.
    pub fn find_article(&self, article_types: &[String]) -> Option<ArticleFields> {
        match self {
            Self::Single(object) => {
                declares_type(object, article_types).then(|| ArticleFields::from_object(object))
            }
            Self::List(items) => items
                .iter()
                .filter_map(Value::as_object)
                .find(|object| declares_type(object, article_types))
                .map(ArticleFields::from_object),
            Self::Malformed => None,
        }
    }
}

/// The three fields read from an article object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFields {
    pub headline: Option<String>,
    pub description: Option<String>,
    pub date_published: Option<String>,
}

impl ArticleFields {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            headline: string_field(object, "headline"),
            description: string_field(object, "description"),
            date_published: string_field(object, "datePublished"),
        }
    }
}

fn declares_type(object: &Map<String, Value>, article_types: &[String]) -> bool {
    object
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|declared| article_types.iter().any(|t| t == declared))
}

/// Non-blank string value of `key`; anything else counts as absent.
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
