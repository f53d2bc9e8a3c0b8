use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use esjson_core::{
    encode, encode_with, FieldDescriptor, JsonConfig, JsonError, Reflect, Value, Visibility,
};

// ============================================================================
// A reflectable fixture type
// ============================================================================

struct Employee {
    name: String,
    years: i32,
    salary: f64,
}

fn get_name(any: &dyn Any) -> Value {
    Value::String(any.downcast_ref::<Employee>().unwrap().name.clone())
}

fn get_years(any: &dyn Any) -> Value {
    Value::Int(any.downcast_ref::<Employee>().unwrap().years)
}

fn get_salary(any: &dyn Any) -> Value {
    Value::Double(any.downcast_ref::<Employee>().unwrap().salary)
}

static EMPLOYEE_FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor {
        name: "name",
        visibility: Visibility::Public,
        get: get_name,
    },
    FieldDescriptor {
        name: "years",
        visibility: Visibility::Public,
        get: get_years,
    },
    FieldDescriptor {
        name: "salary",
        visibility: Visibility::Private,
        get: get_salary,
    },
];

impl Reflect for Employee {
    fn type_name(&self) -> &'static str {
        "Employee"
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        &EMPLOYEE_FIELDS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn alice() -> Value {
    Value::Reflected(Rc::new(Employee {
        name: "Alice".to_string(),
        years: 5,
        salary: 75000.5,
    }))
}

// ============================================================================
// Visibility filtering
// ============================================================================

#[test]
fn public_fields_only_by_default() {
    assert_eq!(encode(&alice()).unwrap(), r#"{"name":"Alice","years":5}"#);
}

#[test]
fn private_visibility_exposes_everything() {
    let mut cfg = JsonConfig::default();
    cfg.reflection_visibility = Visibility::Private;
    assert_eq!(
        encode_with(&alice(), &cfg).unwrap(),
        r#"{"name":"Alice","years":5,"salary":75000.5}"#
    );
}

#[test]
fn cached_and_uncached_agree() {
    let mut cfg = JsonConfig::default();
    cfg.cache_reflection_data = true;
    let cached = encode_with(&alice(), &cfg).unwrap();
    let again = encode_with(&alice(), &cfg).unwrap();
    cfg.cache_reflection_data = false;
    let uncached = encode_with(&alice(), &cfg).unwrap();
    assert_eq!(cached, again);
    assert_eq!(cached, uncached);
}

// ============================================================================
// Field selection
// ============================================================================

#[test]
fn selection_restricts_renames_and_reorders() {
    let mut cfg = JsonConfig::default();
    cfg.set_reflect_fields::<Employee>(&[("salary", Some("compensation")), ("name", None)]);
    assert_eq!(
        encode_with(&alice(), &cfg).unwrap(),
        r#"{"compensation":75000.5,"name":"Alice"}"#
    );
}

#[test]
fn empty_selection_restores_defaults() {
    let mut cfg = JsonConfig::default();
    cfg.set_reflect_fields::<Employee>(&[("years", None)]);
    cfg.set_reflect_fields::<Employee>(&[]);
    assert_eq!(
        encode_with(&alice(), &cfg).unwrap(),
        r#"{"name":"Alice","years":5}"#
    );
}

#[test]
fn unknown_selected_fields_are_skipped() {
    let mut cfg = JsonConfig::default();
    cfg.set_reflect_fields::<Employee>(&[("nope", None), ("years", None)]);
    assert_eq!(encode_with(&alice(), &cfg).unwrap(), r#"{"years":5}"#);
}

// ============================================================================
// Reflected values inside containers
// ============================================================================

#[test]
fn reflected_values_nest_in_containers() {
    let v = Value::object_from([("employee", alice())]);
    assert_eq!(
        encode(&v).unwrap(),
        r#"{"employee":{"name":"Alice","years":5}}"#
    );
}

// ============================================================================
// Loop detection through reflection
// ============================================================================

struct Node {
    label: &'static str,
    next: RefCell<Option<Value>>,
}

fn get_label(any: &dyn Any) -> Value {
    Value::from(any.downcast_ref::<Node>().unwrap().label)
}

fn get_next(any: &dyn Any) -> Value {
    any.downcast_ref::<Node>()
        .unwrap()
        .next
        .borrow()
        .clone()
        .unwrap_or(Value::Null)
}

static NODE_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor {
        name: "label",
        visibility: Visibility::Public,
        get: get_label,
    },
    FieldDescriptor {
        name: "next",
        visibility: Visibility::Public,
        get: get_next,
    },
];

impl Reflect for Node {
    fn type_name(&self) -> &'static str {
        "Node"
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        &NODE_FIELDS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn reflected_cycle_is_detected() {
    let node = Rc::new(Node {
        label: "a",
        next: RefCell::new(None),
    });
    let value = Value::Reflected(node.clone());
    *node.next.borrow_mut() = Some(value.clone());
    assert!(matches!(
        encode(&value),
        Err(JsonError::DataStructureLoop { kind: "Node" })
    ));
}

#[test]
fn acyclic_chain_encodes() {
    let tail = Rc::new(Node {
        label: "tail",
        next: RefCell::new(None),
    });
    let head = Rc::new(Node {
        label: "head",
        next: RefCell::new(Some(Value::Reflected(tail))),
    });
    assert_eq!(
        encode(&Value::Reflected(head)).unwrap(),
        r#"{"label":"head","next":{"label":"tail","next":null}}"#
    );
}
