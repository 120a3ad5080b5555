//! Deep merge algorithm for JSON configuration layers.
//!
//! Shelter layers an environment's instance config with optional user
//! overrides. This module implements the merge semantics.
//!
//! # Merge Rules
//!
//! - Keys missing from the accumulator are copied from the layer
//! - Objects are merged recursively
//! - Arrays are concatenated, duplicates included
//! - Anything else in the layer replaces the accumulated value
//!
//! # Caller hazard
//!
//! Because arrays concatenate, merging the same layer stack twice doubles
//! every list it contributes. Always merge from the raw layers, never from
//! a previously merged result. [`MergeStrategy::Deduplicate`] is available
//! for callers that cannot guarantee this.

use serde_json::{Map, Value};

use crate::error::{Result, ShelterError};

/// How sequences are combined when both sides hold one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Append every incoming element.
    #[default]
    Concatenate,
    /// Append only incoming elements not already present.
    Deduplicate,
}

/// Deep merge `layer` into `base` using [`MergeStrategy::Concatenate`].
///
/// # Arguments
///
/// * `base` - The accumulated configuration
/// * `layer` - The overlay configuration (takes precedence)
///
/// # Returns
///
/// A new Value with merged contents
pub fn deep_merge(base: &Value, layer: &Value) -> Value {
    deep_merge_with(base, layer, MergeStrategy::Concatenate)
}

/// Deep merge with an explicit sequence strategy.
pub fn deep_merge_with(base: &Value, layer: &Value, strategy: MergeStrategy) -> Value {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            let mut result = base_map.clone();
            merge_into(&mut result, layer_map, strategy);
            Value::Object(result)
        }
        (_, layer) => layer.clone(),
    }
}

fn merge_into(acc: &mut Map<String, Value>, layer: &Map<String, Value>, strategy: MergeStrategy) {
    for (key, layer_value) in layer {
        match acc.get_mut(key) {
            None => {
                acc.insert(key.clone(), layer_value.clone());
            }
            Some(slot) => match (slot, layer_value) {
                (Value::Object(acc_map), Value::Object(layer_map)) => {
                    merge_into(acc_map, layer_map, strategy);
                }
                (Value::Array(acc_items), Value::Array(items)) => match strategy {
                    MergeStrategy::Concatenate => acc_items.extend(items.iter().cloned()),
                    MergeStrategy::Deduplicate => {
                        for item in items {
                            if !acc_items.contains(item) {
                                acc_items.push(item.clone());
                            }
                        }
                    }
                },
                (slot, other) => *slot = other.clone(),
            },
        }
    }
}

/// Merge multiple layers in order (later overrides earlier).
///
/// Layers that are not JSON objects are ignored here; use [`resolve`] to
/// reject them.
pub fn merge_layers(layers: &[Value]) -> Value {
    layers
        .iter()
        .fold(Value::Object(Map::new()), |acc, layer| deep_merge(&acc, layer))
}

/// Resolve an effective descriptor from a base mapping and its layers.
///
/// Pure function: nothing is read or written. Every input must be a JSON
/// object.
///
/// # Errors
///
/// Returns `InvalidLayer` if the base or any layer is not an object.
pub fn resolve(base: &Value, layers: &[Value]) -> Result<Value> {
    resolve_with(base, layers, MergeStrategy::Concatenate)
}

/// [`resolve`] with an explicit sequence strategy.
pub fn resolve_with(base: &Value, layers: &[Value], strategy: MergeStrategy) -> Result<Value> {
    if !base.is_object() {
        return Err(ShelterError::InvalidLayer {
            source_name: "base descriptor".to_string(),
        });
    }
    let mut effective = base.clone();
    for (index, layer) in layers.iter().enumerate() {
        if !layer.is_object() {
            return Err(ShelterError::InvalidLayer {
                source_name: format!("layer {}", index + 1),
            });
        }
        effective = deep_merge_with(&effective, layer, strategy);
    }
    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_are_copied() {
        let result = deep_merge(&json!({"a": 1}), &json!({"b": 2}));
        assert_eq!(result, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let base = json!({"env": {"HOME": "/shelter/host/home", "LANG": "C"}});
        let layer = json!({"env": {"LANG": "en_US.UTF-8"}});

        let result = deep_merge(&base, &layer);

        assert_eq!(result["env"]["HOME"], "/shelter/host/home");
        assert_eq!(result["env"]["LANG"], "en_US.UTF-8");
    }

    #[test]
    fn sequences_concatenate_without_dedup() {
        let result = deep_merge(&json!({"m": ["x"]}), &json!({"m": ["x"]}));
        assert_eq!(result, json!({"m": ["x", "x"]}));
    }

    #[test]
    fn deduplicate_strategy_skips_present_items() {
        let result = deep_merge_with(
            &json!({"m": ["x", "y"]}),
            &json!({"m": ["x", "z"]}),
            MergeStrategy::Deduplicate,
        );
        assert_eq!(result, json!({"m": ["x", "y", "z"]}));
    }

    #[test]
    fn scalar_layer_replaces_sequence() {
        let result = deep_merge(&json!({"m": ["x"]}), &json!({"m": "none"}));
        assert_eq!(result["m"], "none");
    }

    #[test]
    fn scalar_layer_replaces_mapping() {
        let result = deep_merge(&json!({"env": {"A": "1"}}), &json!({"env": "off"}));
        assert_eq!(result["env"], "off");
    }

    #[test]
    fn mapping_layer_replaces_scalar() {
        let result = deep_merge(&json!({"env": "off"}), &json!({"env": {"A": "1"}}));
        assert_eq!(result["env"], json!({"A": "1"}));
    }

    #[test]
    fn null_layer_value_replaces() {
        let result = deep_merge(&json!({"image": "a.sif"}), &json!({"image": null}));
        assert!(result["image"].is_null());
    }

    #[test]
    fn disjoint_scalars_union_and_remerge_is_stable() {
        let a = json!({"name": "dev", "system": "ubuntu-20.04"});
        let b = json!({"branch": "master", "distro": "opensource"});

        let merged = deep_merge(&a, &b);
        for key in ["name", "system", "branch", "distro"] {
            assert!(merged.get(key).is_some(), "missing {}", key);
        }

        let again = deep_merge(&merged, &b);
        assert_eq!(again, merged);
    }

    #[test]
    fn merge_layers_applies_in_order() {
        let result = merge_layers(&[json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4}), json!({"c": 5})]);
        assert_eq!(result, json!({"a": 1, "b": 3, "c": 5}));
    }

    #[test]
    fn merge_layers_empty_is_empty_object() {
        assert_eq!(merge_layers(&[]), json!({}));
    }

    #[test]
    fn resolve_rejects_non_object_layer() {
        let err = resolve(&json!({"name": "dev"}), &[json!({}), json!(["x"])]).unwrap_err();
        match err {
            ShelterError::InvalidLayer { source_name } => assert_eq!(source_name, "layer 2"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn resolve_rejects_non_object_base() {
        assert!(matches!(
            resolve(&json!("dev"), &[]),
            Err(ShelterError::InvalidLayer { .. })
        ));
    }

    #[test]
    fn resolve_does_not_mutate_inputs() {
        let base = json!({"mounts": {"/a": "/b"}});
        let layer = json!({"mounts": {"/c": "/d"}});
        let effective = resolve(&base, std::slice::from_ref(&layer)).unwrap();

        assert_eq!(base, json!({"mounts": {"/a": "/b"}}));
        assert_eq!(effective["mounts"]["/c"], "/d");
    }

    #[test]
    fn merged_mapping_keeps_insertion_order() {
        let base = json!({"mounts": {"/z": "1", "/a": "2"}});
        let layer = json!({"mounts": {"/m": "3"}});
        let result = deep_merge(&base, &layer);
        let keys: Vec<_> = result["mounts"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["/z", "/a", "/m"]);
    }
}
