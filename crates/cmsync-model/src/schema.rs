//! Whitelist references inside component schemas
//!
//! A schema is free-form JSON, but exactly three field names carry references
//! to other resources, at any nesting depth:
//!
//! | field | entries | stable? |
//! |-------|---------|---------|
//! | `component_whitelist` | component names | yes |
//! | `component_group_whitelist` | group uuids | yes |
//! | `component_tag_whitelist` | tag ids | no, environment-local |
//!
//! Only these names are recognised. Everything else is opaque content.

use crate::id::ResourceId;
use serde_json::{Map, Value};

/// Field holding component names
pub const COMPONENT_WHITELIST: &str = "component_whitelist";
/// Field holding group uuids
pub const GROUP_WHITELIST: &str = "component_group_whitelist";
/// Field holding environment-local tag ids
pub const TAG_WHITELIST: &str = "component_tag_whitelist";

/// One reference found in a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaRef {
    /// Whitelisted component, by name
    Component(String),
    /// Whitelisted group, by uuid
    Group(String),
    /// Whitelisted tag, by environment-local id
    Tag(ResourceId),
}

/// Collect every whitelist reference in `schema`, in document order
#[must_use]
pub fn collect_refs(schema: &Map<String, Value>) -> Vec<SchemaRef> {
    let mut refs = Vec::new();
    walk_object(schema, &mut refs);
    refs
}

fn walk_object(object: &Map<String, Value>, refs: &mut Vec<SchemaRef>) {
    for (key, value) in object {
        match (key.as_str(), value) {
            (COMPONENT_WHITELIST, Value::Array(entries)) => refs.extend(
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|name| SchemaRef::Component(name.to_string())),
            ),
            (GROUP_WHITELIST, Value::Array(entries)) => refs.extend(
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|uuid| SchemaRef::Group(uuid.to_string())),
            ),
            (TAG_WHITELIST, Value::Array(entries)) => {
                refs.extend(entries.iter().filter_map(ResourceId::from_json).map(SchemaRef::Tag));
            }
            (_, nested) => walk_value(nested, refs),
        }
    }
}

fn walk_value(value: &Value, refs: &mut Vec<SchemaRef>) {
    match value {
        Value::Object(object) => walk_object(object, refs),
        Value::Array(items) => items.iter().for_each(|item| walk_value(item, refs)),
        _ => {}
    }
}

/// Rewrite every `component_tag_whitelist` entry in place
///
/// `rewrite` receives the original entry and its parsed id and returns the
/// replacement, or `None` to keep the entry as it is. Entries that do not
/// parse as an id are left alone.
pub fn rewrite_tag_whitelists<F>(schema: &mut Map<String, Value>, mut rewrite: F)
where
    F: FnMut(&Value, ResourceId) -> Option<Value>,
{
    rewrite_object(schema, &mut rewrite);
}

fn rewrite_object<F>(object: &mut Map<String, Value>, rewrite: &mut F)
where
    F: FnMut(&Value, ResourceId) -> Option<Value>,
{
    for (key, value) in object.iter_mut() {
        match (key.as_str(), value) {
            (TAG_WHITELIST, Value::Array(entries)) => {
                for entry in entries.iter_mut() {
                    let Some(id) = ResourceId::from_json(entry) else {
                        continue;
                    };
                    if let Some(replacement) = rewrite(entry, id) {
                        *entry = replacement;
                    }
                }
            }
            (COMPONENT_WHITELIST | GROUP_WHITELIST, _) => {}
            (_, nested) => rewrite_value(nested, rewrite),
        }
    }
}

fn rewrite_value<F>(value: &mut Value, rewrite: &mut F)
where
    F: FnMut(&Value, ResourceId) -> Option<Value>,
{
    match value {
        Value::Object(object) => rewrite_object(object, rewrite),
        Value::Array(items) => items.iter_mut().for_each(|item| rewrite_value(item, rewrite)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test schema must be an object"),
        }
    }

    #[test]
    fn finds_references_at_any_depth() {
        let schema = schema(json!({
            "body": {
                "type": "bloks",
                "component_whitelist": ["teaser", "grid"],
                "component_group_whitelist": ["g-1"],
                "component_tag_whitelist": [100, "101"]
            },
            "tabs": [{
                "inner": {
                    "settings": { "component_whitelist": ["hero"] }
                }
            }]
        }));

        let refs = collect_refs(&schema);
        assert_eq!(refs.len(), 6);
        assert!(refs.contains(&SchemaRef::Component("hero".into())));
        assert!(refs.contains(&SchemaRef::Group("g-1".into())));
        assert!(refs.contains(&SchemaRef::Tag(ResourceId(101))));
    }

    #[test]
    fn ignores_lookalike_fields_and_malformed_entries() {
        let schema = schema(json!({
            "component_whitelist_note": ["not-a-ref"],
            "title": { "component_whitelist": "teaser" },
            "body": { "component_tag_whitelist": [null, {"id": 4}, "x"] }
        }));
        assert!(collect_refs(&schema).is_empty());
    }

    #[test]
    fn rewrites_only_tag_whitelists() {
        let mut schema = schema(json!({
            "body": {
                "component_whitelist": ["100"],
                "component_tag_whitelist": [100, "101", 102]
            }
        }));

        rewrite_tag_whitelists(&mut schema, |_, id| match id.get() {
            100 => Some(json!(500)),
            101 => Some(json!("501")),
            _ => None,
        });

        assert_eq!(
            Value::Object(schema),
            json!({
                "body": {
                    "component_whitelist": ["100"],
                    "component_tag_whitelist": [500, "501", 102]
                }
            })
        );
    }
}
