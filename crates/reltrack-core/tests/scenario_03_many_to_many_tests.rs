/// Scenario 3: Many-to-many add and remove
///
/// Adding id "m1" reports `([], [{pk: "m1"}])`; removing it after a persist
/// reports `([{pk: "m1"}], [])`.
mod common;

use common::{materialize, new_store, register, save, test_document_schema};
use serde_json::json;

#[test]
fn test_scenario_03_happy_add_persist_remove() {
    // GIVEN an entity with a many-to-many relation keyed by "pk"
    let class = register(test_document_schema("Scenario03Doc"));
    let store = new_store();
    let mut doc = materialize(&class, &store);

    // WHEN adding "m1"
    doc.doc_mut()
        .join_ids_mut("many_to_many_related")
        .push(json!("m1"));

    // THEN the change-set holds ([], [{pk: "m1"}])
    let changes = doc.relation_change_set().expect("change-set");
    let change = changes.get("many_to_many_related").expect("changed");
    assert_eq!(change.old, json!([]));
    assert_eq!(change.new, json!([{"pk": "m1"}]));

    // WHEN persisting, then removing "m1"
    save(&mut doc);
    doc.doc_mut().join_ids_mut("many_to_many_related").clear();

    // THEN the change-set holds ([{pk: "m1"}], [])
    let changes = doc.relation_change_set().expect("change-set");
    let change = changes.get("many_to_many_related").expect("changed");
    assert_eq!(change.old, json!([{"pk": "m1"}]));
    assert_eq!(change.new, json!([]));
}
