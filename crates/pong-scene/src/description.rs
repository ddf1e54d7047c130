//! Declarative scene descriptions.
//!
//! A description is plain data, conventionally loaded from a JSON document:
//!
//! ```json
//! {
//!   "court": {
//!     "components": { "position": { "x": 0, "y": 0 } },
//!     "children": {
//!       "ball": { "components": { "position": { "x": 1, "y": 1 } } }
//!     }
//!   }
//! }
//! ```
//!
//! Component payloads are opaque here and handed untouched to the matching
//! component's `setup`.

use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SceneError;

/// Top-level entities of a scene, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneDescription {
    #[serde(deserialize_with = "unique_keys")]
    entities: IndexMap<String, EntityDescription>,
}

/// One entity: component payloads keyed by type name, plus named children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDescription {
    #[serde(deserialize_with = "unique_keys")]
    pub components: IndexMap<String, Value>,
    #[serde(deserialize_with = "unique_keys")]
    pub children: IndexMap<String, EntityDescription>,
}

impl SceneDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a description from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON description document.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let text = fs::read_to_string(path).map_err(|e| SceneError::Io(path.to_path_buf(), e))?;
        Self::from_json_str(&text)
    }

    /// Add (or replace) a top-level entity.
    pub fn with_entity(mut self, name: impl Into<String>, entity: EntityDescription) -> Self {
        self.entities.insert(name.into(), entity);
        self
    }

    /// Top-level entities in document order.
    pub fn entities(&self) -> impl Iterator<Item = (&str, &EntityDescription)> {
        self.entities.iter().map(|(name, entity)| (name.as_str(), entity))
    }

    /// Every entity name at every depth, depth-first in document order.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, entity) in &self.entities {
            names.push(name.clone());
            entity.collect_names(&mut names);
        }
        names
    }

    /// Number of top-level entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, type_name: impl Into<String>, config: Value) -> Self {
        self.components.insert(type_name.into(), config);
        self
    }

    pub fn with_child(mut self, name: impl Into<String>, child: EntityDescription) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        for (name, child) in &self.children {
            names.push(name.clone());
            child.collect_names(names);
        }
    }
}

/// Deserialize a map, rejecting a key that appears twice instead of keeping
/// the last value.
fn unique_keys<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueKeys<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
        type Value = IndexMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map with unique keys")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                match out.entry(key) {
                    Entry::Occupied(entry) => {
                        return Err(de::Error::custom(format_args!("duplicate key '{}'", entry.key())));
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                    }
                }
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_document() {
        let description = SceneDescription::from_json_str(
            r#"{
                "A": {
                    "components": { "Pos": { "x": 0, "y": 0 } },
                    "children": {
                        "B": { "components": { "Pos": { "x": 1, "y": 1 } }, "children": {} }
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(description.len(), 1);
        let (name, a) = description.entities().next().unwrap();
        assert_eq!(name, "A");
        assert_eq!(a.components["Pos"], json!({ "x": 0, "y": 0 }));
        assert_eq!(a.children["B"].components["Pos"]["x"], json!(1));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let description = SceneDescription::from_json_str(r#"{ "ball": {} }"#).unwrap();
        let (_, ball) = description.entities().next().unwrap();
        assert!(ball.components.is_empty());
        assert!(ball.children.is_empty());
    }

    #[test]
    fn entity_names_cover_every_depth() {
        let description = SceneDescription::new()
            .with_entity(
                "court",
                EntityDescription::new()
                    .with_child(
                        "net",
                        EntityDescription::new().with_child("post", EntityDescription::new()),
                    )
                    .with_child("ball", EntityDescription::new()),
            )
            .with_entity("hud", EntityDescription::new());

        assert_eq!(description.entity_names(), vec!["court", "net", "post", "ball", "hud"]);
    }

    #[test]
    fn document_order_is_preserved() {
        let description =
            SceneDescription::from_json_str(r#"{ "zeta": {}, "alpha": {}, "mid": {} }"#).unwrap();
        let names: Vec<&str> = description.entities().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn invalid_json_is_reported() {
        let result = SceneDescription::from_json_str("{ not json");
        assert!(matches!(result, Err(SceneError::InvalidDescription(_))));
    }

    #[test]
    fn repeated_component_type_is_rejected() {
        let result = SceneDescription::from_json_str(
            r#"{ "ball": { "components": { "Pos": { "x": 1 }, "Pos": { "x": 2 } } } }"#,
        );
        match result {
            Err(SceneError::InvalidDescription(err)) => assert!(err.to_string().contains("duplicate key 'Pos'")),
            other => panic!("expected InvalidDescription, got: {:?}", other),
        }
    }

    #[test]
    fn repeated_child_name_is_rejected() {
        let result = SceneDescription::from_json_str(
            r#"{ "court": { "children": { "ball": {}, "net": {}, "ball": {} } } }"#,
        );
        match result {
            Err(SceneError::InvalidDescription(err)) => assert!(err.to_string().contains("duplicate key 'ball'")),
            other => panic!("expected InvalidDescription, got: {:?}", other),
        }
    }

    #[test]
    fn repeated_root_name_is_rejected() {
        let result = SceneDescription::from_json_str(r#"{ "hud": {}, "hud": {} }"#);
        assert!(matches!(result, Err(SceneError::InvalidDescription(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = SceneDescription::load(Path::new("/nonexistent/scene.json"));
        match result {
            Err(SceneError::Io(path, _)) => assert_eq!(path, Path::new("/nonexistent/scene.json")),
            other => panic!("expected Io, got: {:?}", other),
        }
    }
}
