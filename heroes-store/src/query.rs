//! Query Documents
//!
//! Typed predicates, updates and find options. Repositories build these;
//! executors either evaluate them directly (in-memory) or compile them to
//! their native query language (Postgres). `to_document` renders the
//! document-database form used in error context and logs.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StoreError;

/// A stored document: a JSON object keyed by field name
pub type Document = Map<String, Value>;

/// Field holding a document's identity
pub const ID_FIELD: &str = "_id";

/// Field holding the soft-delete flag
pub const REMOVED_FIELD: &str = "isRemoved";

/// Record selection predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Document identity equals the id
    Id(Uuid),
    /// Field is present and equal to the value
    Eq(String, Value),
    /// Field is one of the strings, or is an array holding any of them
    In(String, Vec<String>),
    /// Every sub-filter matches
    And(Vec<Filter>),
}

impl Filter {
    pub fn id(id: Uuid) -> Self {
        Filter::Id(id)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn any_of(field: impl Into<String>, values: Vec<String>) -> Self {
        Filter::In(field.into(), values)
    }

    /// Excludes soft-deleted records. Every read of live data goes through this.
    pub fn active() -> Self {
        Filter::eq(REMOVED_FIELD, false)
    }

    /// Conjunction, flattening nested `And`s and dropping `All`
    pub fn and(self, other: Filter) -> Self {
        let mut parts = Vec::new();
        for filter in [self, other] {
            match filter {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                f => parts.push(f),
            }
        }

        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => doc
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .is_some_and(|doc_id| doc_id == *id),
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::In(field, values) => match doc.get(field) {
                Some(Value::String(s)) => values.contains(s),
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|item| values.iter().any(|v| v == item)),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }

    /// Native document-database form, e.g. `{"superpowers": {"$in": [...]}}`
    pub fn to_document(&self) -> Value {
        match self {
            Filter::All => json!({}),
            Filter::Id(id) => json!({ ID_FIELD: id.to_string() }),
            Filter::Eq(field, value) => json!({ field.as_str(): value }),
            Filter::In(field, values) => json!({ field.as_str(): { "$in": values } }),
            Filter::And(filters) => {
                let parts: Vec<Value> = filters.iter().map(Filter::to_document).collect();
                let mut merged = Map::new();
                let mut conflict = false;
                for part in &parts {
                    if let Value::Object(fields) = part {
                        for (key, value) in fields {
                            conflict |= merged.insert(key.clone(), value.clone()).is_some();
                        }
                    }
                }

                if conflict {
                    json!({ "$and": parts })
                } else {
                    Value::Object(merged)
                }
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

/// Partial update of top-level fields
///
/// The identity field can never be set through an update.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    set: Document,
}

impl Update {
    pub fn set(mut fields: Document) -> Self {
        fields.remove(ID_FIELD);
        Self { set: fields }
    }

    pub fn fields(&self) -> &Document {
        &self.set
    }

    pub fn apply(&self, doc: &mut Document) {
        for (key, value) in &self.set {
            doc.insert(key.clone(), value.clone());
        }
    }

    /// Native form, `{"$set": {...}}`
    pub fn to_document(&self) -> Value {
        json!({ "$set": self.set })
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort key, written `field` for ascending and `-field` for descending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Compare two documents on this key
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

impl FromStr for SortKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (field, direction) = match s.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Descending),
            None => (s.strip_prefix('+').unwrap_or(s), SortDirection::Ascending),
        };

        if field.is_empty() {
            return Err(StoreError::InvalidQuery(format!("empty sort key: {s:?}")));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{}", self.field),
            SortDirection::Descending => write!(f, "-{}", self.field),
        }
    }
}

/// Sorting and windowing for `find`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub skip: u64,
    /// `None` returns every remaining document
    pub limit: Option<u64>,
}

/// Orders missing/null < string < number < bool < array < object, the
/// same type order as Postgres jsonb
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Encode a value as a document
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::InvalidDocument(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Decode a document into a typed record
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Read a document's identity
pub fn document_id(doc: &Document) -> Result<Uuid, StoreError> {
    let raw = doc
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument(format!("missing {ID_FIELD}")))?;

    Uuid::parse_str(raw)
        .map_err(|e| StoreError::InvalidDocument(format!("{ID_FIELD} {raw:?} is not a UUID: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_any_of_renders_in_operator() {
        let filter = Filter::any_of("superpowers", vec!["flight".to_string()]);
        assert_eq!(filter.to_string(), r#"{"superpowers":{"$in":["flight"]}}"#);
    }

    #[test]
    fn test_active_lookup_renders_single_document() {
        let id = Uuid::new_v4();
        let filter = Filter::id(id).and(Filter::active());
        assert_eq!(
            filter.to_document(),
            json!({ "_id": id.to_string(), "isRemoved": false })
        );
    }

    #[test]
    fn test_conflicting_keys_render_as_and() {
        let filter = Filter::eq("name", "a").and(Filter::eq("name", "b"));
        assert_eq!(
            filter.to_document(),
            json!({ "$and": [{ "name": "a" }, { "name": "b" }] })
        );
    }

    #[test]
    fn test_and_flattens_and_drops_all() {
        let filter = Filter::All
            .and(Filter::active())
            .and(Filter::eq("name", "x").and(Filter::All));
        assert_eq!(
            filter,
            Filter::And(vec![Filter::active(), Filter::eq("name", "x")])
        );
        assert_eq!(Filter::All.and(Filter::All), Filter::All);
    }

    #[test]
    fn test_any_of_matches_arrays_and_scalars() {
        let filter = Filter::any_of("superpowers", vec!["flight".into(), "telepathy".into()]);

        assert!(filter.matches(&doc(json!({ "superpowers": ["strength", "flight"] }))));
        assert!(filter.matches(&doc(json!({ "superpowers": "telepathy" }))));
        assert!(!filter.matches(&doc(json!({ "superpowers": ["strength"] }))));
        assert!(!filter.matches(&doc(json!({ "name": "no powers" }))));
    }

    #[test]
    fn test_empty_any_of_matches_nothing() {
        let filter = Filter::any_of("superpowers", vec![]);
        assert!(!filter.matches(&doc(json!({ "superpowers": ["flight"] }))));
    }

    #[test]
    fn test_eq_requires_presence() {
        let filter = Filter::active();
        assert!(filter.matches(&doc(json!({ "isRemoved": false }))));
        assert!(!filter.matches(&doc(json!({ "isRemoved": true }))));
        assert!(!filter.matches(&doc(json!({}))));
    }

    #[test]
    fn test_id_filter_matches_string_id() {
        let id = Uuid::new_v4();
        assert!(Filter::id(id).matches(&doc(json!({ "_id": id.to_string() }))));
        assert!(!Filter::id(Uuid::new_v4()).matches(&doc(json!({ "_id": id.to_string() }))));
    }

    #[test]
    fn test_update_never_sets_id() {
        let update = Update::set(doc(json!({ "_id": "x", "isRemoved": true })));
        assert_eq!(update.to_document(), json!({ "$set": { "isRemoved": true } }));

        let mut target = doc(json!({ "_id": "keep", "isRemoved": false, "name": "n" }));
        update.apply(&mut target);
        assert_eq!(target["_id"], "keep");
        assert_eq!(target["isRemoved"], true);
        assert_eq!(target["name"], "n");
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("created".parse::<SortKey>().unwrap(), SortKey::ascending("created"));
        assert_eq!("-name".parse::<SortKey>().unwrap(), SortKey::descending("name"));
        assert_eq!("+name".parse::<SortKey>().unwrap(), SortKey::ascending("name"));
        assert!("-".parse::<SortKey>().is_err());
        assert!("".parse::<SortKey>().is_err());
        assert_eq!(SortKey::descending("name").to_string(), "-name");
    }

    #[test]
    fn test_sort_key_compare() {
        let a = doc(json!({ "name": "Angel", "rank": 2 }));
        let b = doc(json!({ "name": "Beast", "rank": 10 }));
        let none = doc(json!({}));

        assert_eq!(SortKey::ascending("name").compare(&a, &b), Ordering::Less);
        assert_eq!(SortKey::descending("name").compare(&a, &b), Ordering::Greater);
        assert_eq!(SortKey::ascending("rank").compare(&a, &b), Ordering::Less);
        assert_eq!(SortKey::ascending("name").compare(&none, &a), Ordering::Less);
    }

    #[test]
    fn test_sort_orders_mixed_types() {
        let missing = doc(json!({}));
        let null = doc(json!({ "v": null }));
        let string = doc(json!({ "v": "z" }));
        let number = doc(json!({ "v": 1 }));
        let boolean = doc(json!({ "v": false }));

        let asc = SortKey::ascending("v");
        assert_eq!(asc.compare(&missing, &null), Ordering::Equal);
        assert_eq!(asc.compare(&null, &string), Ordering::Less);
        assert_eq!(asc.compare(&string, &number), Ordering::Less);
        assert_eq!(asc.compare(&number, &boolean), Ordering::Less);

        // missing fields trail a descending sort
        assert_eq!(SortKey::descending("v").compare(&missing, &string), Ordering::Greater);
    }

    #[test]
    fn test_document_id() {
        let id = Uuid::new_v4();
        assert_eq!(document_id(&doc(json!({ "_id": id.to_string() }))).unwrap(), id);
        assert!(matches!(
            document_id(&doc(json!({ "_id": "nope" }))),
            Err(StoreError::InvalidDocument(_))
        ));
        assert!(document_id(&doc(json!({}))).is_err());
    }

    #[test]
    fn test_to_document_rejects_scalars() {
        assert!(matches!(to_document(&5), Err(StoreError::InvalidDocument(_))));
    }
}
