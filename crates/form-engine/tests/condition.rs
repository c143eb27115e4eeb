use serde_json::{Value, json};

use form_engine::{Condition, ConditionSet, Operator, Values, evaluate};

fn values(value: Value) -> Values {
    value.as_object().cloned().expect("object")
}

#[test]
fn absent_condition_is_true() {
    assert!(evaluate(None, &values(json!({}))));
}

#[test]
fn in_operator_matches_list_membership() {
    let condition = Condition::new("category", Operator::In, json!(["a", "b"]));
    assert!(!condition.evaluate(&values(json!({ "category": "c" }))));
    assert!(condition.evaluate(&values(json!({ "category": "a" }))));
}

#[test]
fn in_requires_a_list_literal() {
    let condition = Condition::new("category", Operator::In, json!("a"));
    assert!(!condition.evaluate(&values(json!({ "category": "a" }))));
}

#[test]
fn not_in_fails_open_for_non_list_literal() {
    let condition = Condition::new("category", Operator::NotIn, json!("a"));
    assert!(condition.evaluate(&values(json!({ "category": "a" }))));

    let listed = Condition::new("category", Operator::NotIn, json!(["a"]));
    assert!(!listed.evaluate(&values(json!({ "category": "a" }))));
    assert!(listed.evaluate(&values(json!({ "category": "z" }))));
}

#[test]
fn equality_is_type_strict() {
    let condition = Condition::equals("count", json!(1));
    assert!(condition.evaluate(&values(json!({ "count": 1 }))));
    assert!(!condition.evaluate(&values(json!({ "count": "1" }))));

    let not_equal = Condition::new("count", Operator::NotEquals, json!(1));
    assert!(not_equal.evaluate(&values(json!({ "count": "1" }))));
    assert!(not_equal.evaluate(&values(json!({}))));
}

#[test]
fn absent_field_is_not_null() {
    let is_null = Condition::equals("nickname", Value::Null);
    assert!(!is_null.evaluate(&values(json!({}))));
    assert!(is_null.evaluate(&values(json!({ "nickname": null }))));

    let in_null = Condition::new("nickname", Operator::In, json!([null, "x"]));
    assert!(!in_null.evaluate(&values(json!({}))));
    assert!(in_null.evaluate(&values(json!({ "nickname": null }))));

    let not_in_null = Condition::new("nickname", Operator::NotIn, json!([null]));
    assert!(not_in_null.evaluate(&values(json!({}))));
}

#[test]
fn numeric_comparisons_reject_non_numbers() {
    let greater = Condition::new("age", Operator::GreaterThan, json!(18));
    assert!(greater.evaluate(&values(json!({ "age": 19 }))));
    assert!(!greater.evaluate(&values(json!({ "age": 18 }))));
    assert!(!greater.evaluate(&values(json!({ "age": "40" }))));
    assert!(!greater.evaluate(&values(json!({}))));

    let less = Condition::new("age", Operator::LessThan, json!(18));
    assert!(less.evaluate(&values(json!({ "age": 17.5 }))));
    assert!(!less.evaluate(&values(json!({ "age": null }))));
}

#[test]
fn condition_lists_are_conjunctions() {
    let set: ConditionSet = serde_json::from_value(json!([
        { "field": "newsletter", "operator": "equals", "value": true },
        { "field": "category", "operator": "notEquals", "value": "c" }
    ]))
    .expect("deserialize");

    let mut current = values(json!({ "newsletter": true, "category": "a" }));
    assert!(set.evaluate(&current));

    current.insert("category".into(), json!("c"));
    assert!(!set.evaluate(&current));

    current.insert("category".into(), json!("a"));
    current.insert("newsletter".into(), json!(false));
    assert!(!set.evaluate(&current));
}

#[test]
fn empty_condition_list_is_true() {
    let set = ConditionSet::All(Vec::new());
    assert!(set.evaluate(&values(json!({}))));
}

#[test]
fn single_condition_deserializes_as_single() {
    let set: ConditionSet =
        serde_json::from_value(json!({ "field": "a", "operator": "equals", "value": 1 }))
            .expect("deserialize");
    assert!(matches!(set, ConditionSet::Single(_)));
    assert_eq!(set.iter().count(), 1);
    assert!(set.references("a"));
    assert!(!set.references("b"));
}
