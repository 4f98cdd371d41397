use cellbook_core::{CellData, CellModel, CellType, SourceText};
use serde_json::json;

fn data(value: serde_json::Value) -> CellData {
    serde_json::from_value(value).expect("test record should deserialize")
}

#[test]
fn code_cell_round_trip_preserves_execution_state() {
    let record = data(json!({
        "cell_type": "code",
        "source": "x=1",
        "metadata": {},
        "execution_count": 3,
        "outputs": [{ "output_type": "stream", "text": "1", "name": "stdout" }]
    }));

    let cell = CellModel::code(Some(&record));
    let value = serde_json::to_value(cell.to_data()).expect("cell should serialize");

    assert_eq!(value["cell_type"], "code");
    assert_eq!(value["source"], "x=1");
    assert_eq!(value["execution_count"], 3);
    assert_eq!(value["metadata"], json!({}));
    assert_eq!(
        value["outputs"],
        json!([{ "output_type": "stream", "name": "stdout", "text": "1" }])
    );
}

#[test]
fn unexecuted_code_cell_serializes_null_execution_count() {
    let cell = CellModel::code(None);
    let value = serde_json::to_value(cell.to_data()).expect("cell should serialize");

    assert_eq!(value["execution_count"], json!(null));
    assert_eq!(value["outputs"], json!([]));
}

#[test]
fn non_code_serialization_carries_no_code_fields() {
    for cell in [CellModel::raw(None), CellModel::markdown(None)] {
        let value = serde_json::to_value(cell.to_data()).expect("cell should serialize");
        let object = value.as_object().expect("record should be an object");
        assert!(!object.contains_key("execution_count"));
        assert!(!object.contains_key("outputs"));
        assert_eq!(object["cell_type"], cell.cell_type().as_str());
    }
}

#[test]
fn serialized_cell_parses_back_into_an_equivalent_model() {
    let cell = CellModel::code(None);
    cell.set_text("print('hello')");
    cell.metadata().set("tags", json!(["demo"]));
    cell.set_trusted(true);
    cell.set_execution_count(Some(7));

    let wire = serde_json::to_string(&cell.to_data()).expect("cell should serialize");
    let parsed: CellData = serde_json::from_str(&wire).expect("wire form should parse");
    let reloaded = CellModel::from_data(&parsed);

    assert_eq!(reloaded.cell_type(), CellType::Code);
    assert_eq!(reloaded.id(), cell.id());
    assert_eq!(reloaded.text(), "print('hello')");
    assert_eq!(reloaded.metadata().get("tags"), Some(json!(["demo"])));
    assert!(reloaded.trusted());
    assert_eq!(reloaded.execution_count(), Some(7));
    assert!(reloaded
        .outputs()
        .expect("code cell owns outputs")
        .trusted());
}

#[test]
fn source_accepts_both_string_and_line_array_forms() {
    let joined = data(json!({
        "cell_type": "raw",
        "source": "line one\nline two",
        "metadata": {}
    }));
    let lines = data(json!({
        "cell_type": "raw",
        "source": ["line one", "line two"],
        "metadata": {}
    }));

    assert_eq!(
        CellModel::raw(Some(&joined)).text(),
        CellModel::raw(Some(&lines)).text()
    );
}

#[test]
fn metadata_is_deep_copied_from_the_input_record() {
    let record = data(json!({
        "cell_type": "markdown",
        "source": "",
        "metadata": { "tags": ["original"] }
    }));
    let cell = CellModel::markdown(Some(&record));

    cell.metadata().set("tags", json!(["mutated"]));
    assert_eq!(record.metadata()["tags"], json!(["original"]));
}

#[test]
fn serialized_metadata_is_a_snapshot_not_a_live_view() {
    let cell = CellModel::raw(None);
    cell.metadata().set("stage", json!("draft"));

    let snapshot = cell.to_data();
    cell.metadata().set("stage", json!("final"));

    assert_eq!(snapshot.metadata()["stage"], json!("draft"));
}

#[test]
fn tolerant_ingest_defaults_missing_fields() {
    let record = data(json!({ "cell_type": "code" }));
    let cell = CellModel::from_data(&record);

    assert_eq!(cell.text(), "");
    assert!(cell.metadata().is_empty());
    assert!(!cell.trusted());
    assert_eq!(cell.execution_count(), None);
    assert!(cell.outputs().expect("code cell owns outputs").is_empty());
}

#[test]
fn source_text_helpers_normalize_lines() {
    assert_eq!(
        SourceText::Lines(vec!["a".to_string(), "b".to_string()]).to_joined(),
        "a\nb"
    );
    assert_eq!(SourceText::from("plain").to_joined(), "plain");
}
