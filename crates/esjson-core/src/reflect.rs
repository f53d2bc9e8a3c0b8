//! Field-descriptor reflection for encoding arbitrary structs.
//!
//! There is no runtime type introspection to lean on, so reflectable types
//! declare their own field tables: a static slice of [`FieldDescriptor`]s,
//! each carrying the field name, a declared visibility, and a getter.
//! The encoder filters that table by the configured visibility level, or
//! by an explicit per-type selection list, and emits the survivors in
//! declaration order.

use std::any::{Any, TypeId};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;

use crate::config::JsonConfig;
use crate::value::Value;

/// Extracts one field's value from a type-erased instance.
pub type FieldGetter = fn(&dyn Any) -> Value;

/// Declared visibility of a field. Filtering at a level keeps fields at
/// that level and above, so `Public` is the most restrictive filter and
/// `Private` shows everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Private,
    Package,
    Protected,
    Public,
}

/// One entry in a type's field table.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub visibility: Visibility,
    pub get: FieldGetter,
}

/// Implemented by types that can be encoded through their field table.
///
/// `fields` must list fields in the order they should be emitted.
pub trait Reflect: 'static {
    fn type_name(&self) -> &'static str;
    fn fields(&self) -> &'static [FieldDescriptor];
    fn as_any(&self) -> &dyn Any;
}

type GetterList = Arc<Vec<(&'static str, FieldGetter)>>;

static CACHE: LazyLock<DashMap<(TypeId, Visibility), GetterList>> = LazyLock::new(DashMap::new);

/// Drop all cached visibility-filtered field tables.
pub fn clear_reflection_cache() {
    CACHE.clear();
}

fn visible_fields(obj: &dyn Reflect, level: Visibility, use_cache: bool) -> GetterList {
    let key = (obj.as_any().type_id(), level);
    if use_cache {
        if let Some(hit) = CACHE.get(&key) {
            return Arc::clone(&hit);
        }
    }
    let list: GetterList = Arc::new(
        obj.fields()
            .iter()
            .filter(|f| f.visibility >= level)
            .map(|f| (f.name, f.get))
            .collect(),
    );
    if use_cache {
        CACHE.insert(key, Arc::clone(&list));
    }
    list
}

/// Resolve the (name, value) pairs to emit for one reflected instance.
///
/// An explicit selection configured for the type takes precedence over
/// visibility filtering: selected fields are emitted in selection order
/// under their configured names, even below the visibility threshold.
/// Selected names with no matching field are skipped.
pub(crate) fn reflect_object(obj: &dyn Reflect, cfg: &JsonConfig) -> Vec<(String, Value)> {
    let instance = obj.as_any();
    if let Some(selection) = cfg.reflect_field_selection(instance.type_id()) {
        let mut pairs = Vec::with_capacity(selection.len());
        for spec in selection {
            if let Some(desc) = obj.fields().iter().find(|f| f.name == spec.field) {
                let name = spec.rename.clone().unwrap_or_else(|| spec.field.clone());
                pairs.push((name, (desc.get)(instance)));
            }
        }
        return pairs;
    }
    visible_fields(obj, cfg.reflection_visibility, cfg.cache_reflection_data)
        .iter()
        .map(|(name, get)| ((*name).to_string(), get(instance)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
        y: i32,
        tag: String,
    }

    fn get_x(any: &dyn Any) -> Value {
        Value::Int(any.downcast_ref::<Point>().unwrap().x)
    }

    fn get_y(any: &dyn Any) -> Value {
        Value::Int(any.downcast_ref::<Point>().unwrap().y)
    }

    fn get_tag(any: &dyn Any) -> Value {
        Value::String(any.downcast_ref::<Point>().unwrap().tag.clone())
    }

    static POINT_FIELDS: [FieldDescriptor; 3] = [
        FieldDescriptor {
            name: "x",
            visibility: Visibility::Public,
            get: get_x,
        },
        FieldDescriptor {
            name: "y",
            visibility: Visibility::Public,
            get: get_y,
        },
        FieldDescriptor {
            name: "tag",
            visibility: Visibility::Private,
            get: get_tag,
        },
    ];

    impl Reflect for Point {
        fn type_name(&self) -> &'static str {
            "Point"
        }

        fn fields(&self) -> &'static [FieldDescriptor] {
            &POINT_FIELDS
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn point() -> Point {
        Point {
            x: 3,
            y: 4,
            tag: "origin-ish".to_string(),
        }
    }

    #[test]
    fn visibility_ordering() {
        assert!(Visibility::Private < Visibility::Public);
        assert!(Visibility::Package < Visibility::Protected);
    }

    #[test]
    fn public_filter_hides_private_fields() {
        let mut cfg = JsonConfig::default();
        cfg.cache_reflection_data = false;
        let pairs = reflect_object(&point(), &cfg);
        let names: Vec<&str> = pairs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn private_filter_shows_everything() {
        let mut cfg = JsonConfig::default();
        cfg.cache_reflection_data = false;
        cfg.reflection_visibility = Visibility::Private;
        let pairs = reflect_object(&point(), &cfg);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2].0, "tag");
    }

    #[test]
    fn selection_overrides_visibility_and_renames() {
        let mut cfg = JsonConfig::default();
        cfg.cache_reflection_data = false;
        cfg.set_reflect_fields::<Point>(&[("tag", Some("label")), ("x", None)]);
        let pairs = reflect_object(&point(), &cfg);
        assert_eq!(pairs[0].0, "label");
        assert_eq!(pairs[1].0, "x");
        assert_eq!(pairs.len(), 2);
    }
}
