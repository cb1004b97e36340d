use std::path::PathBuf;

use schema_objects::{Category, Error, NativeType, SchemaDocument, TypeHandle, TypeRegistry, Value};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn registry() -> TypeRegistry {
    SchemaDocument::from_path(fixture("instrument_schema.json"))
        .unwrap()
        .compile()
        .unwrap()
}

fn input() -> serde_json::Value {
    let source = std::fs::read_to_string(fixture("experiment.json")).unwrap();
    serde_json::from_str(&source).unwrap()
}

#[test]
fn compiles_the_instrument_schema() {
    let registry = registry();
    assert_eq!(registry.root(), Some("Experiment"));
    assert_eq!(registry.lookup_category("Step").unwrap(), Category::Polymorph);
    assert_eq!(registry.lookup_category("RampStep").unwrap(), Category::MultiInheritance);
    assert_eq!(registry.lookup_category("Experiment_operator").unwrap(), Category::Custom);
    assert_eq!(registry.lookup_type("DateTime").unwrap(), &TypeHandle::Native(NativeType::DateTime));
    assert_eq!(
        registry.class("Procedure").unwrap().signature(),
        "Procedure(id: uuid, started_at: date-time, status: Optional[ProcedureStatus] = None, \
         steps: Optional[List[Union[IsothermalStep, RampStep]]] = None)"
    );
    assert_eq!(
        registry.class("RampStep").unwrap().signature(),
        "RampStep(step_type: string, index: Optional[integer] = None, \
         rate: Optional[number] = None, target: Optional[number] = None)"
    );
}

#[test]
fn loads_typed_values() {
    let registry = registry();
    let experiment = registry.class("Experiment").unwrap().from_dict(input()).unwrap();

    let procedure = experiment.get("procedure").and_then(Value::as_object).unwrap();
    assert_eq!(procedure.type_name(), "Procedure");
    assert!(procedure.get("id").and_then(Value::as_uuid).is_some());
    assert_eq!(
        procedure.get("started_at").and_then(Value::as_datetime).map(|dt| dt.to_rfc3339()),
        Some("2024-03-01T10:15:00+00:00".to_string())
    );
    assert_eq!(procedure.get("status").and_then(Value::as_enum).map(|m| m.name.as_str()), Some("COMPLETED"));

    let steps = procedure.get("steps").and_then(Value::as_list).unwrap();
    let kinds: Vec<_> = steps.iter().filter_map(Value::as_object).map(|s| s.type_name()).collect();
    assert_eq!(kinds, ["IsothermalStep", "RampStep"]);

    let sample = experiment.get("sample").and_then(Value::as_object).unwrap();
    assert_eq!(sample.get("batch"), Some(&Value::from("42")));
    assert_eq!(sample.get("pan_type"), Some(&Value::from("Platinum")));

    let operator = experiment.get("operator").and_then(Value::as_object).unwrap();
    assert_eq!(operator.type_name(), "Experiment_operator");
    assert_eq!(operator.get("badge"), Some(&Value::Integer(7)));
}

#[test]
fn output_matches_input_up_to_coercion() {
    let registry = registry();
    let experiment = registry.class("Experiment").unwrap().from_dict(input()).unwrap();
    let mut expected = input();
    expected["Sample"]["Batch"] = json!("42");
    assert_eq!(experiment.to_json_value().unwrap(), expected);
}

#[test]
fn round_trip_is_idempotent() {
    let registry = registry();
    let class = registry.class("Experiment").unwrap();
    let first = class.from_dict(input()).unwrap().to_json_string().unwrap();
    let second = class.from_json_str(&first).unwrap().to_json_string().unwrap();
    assert_eq!(first, second);
}

#[test]
fn file_round_trip() {
    let registry = registry();
    let class = registry.class("Experiment").unwrap();
    let experiment = class.from_json_path(fixture("experiment.json")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("experiment.out.json");
    experiment.to_json_path(&out).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("{\n  \"Procedure\": {"), "{written}");
    assert_eq!(class.from_json_path(&out).unwrap(), experiment);
}

#[test]
fn nested_errors_carry_the_data_path() {
    let registry = registry();
    let mut raw = input();
    raw["Results"][1]["SampleMass"] = json!("heavy");
    let err = registry.class("Experiment").unwrap().from_dict(raw).unwrap_err();
    assert!(matches!(err, Error::Type { .. }), "{err}");
    assert_eq!(err.path().unwrap().to_string(), "$.Results[1].SampleMass");
    let rendered = err.to_string();
    assert!(rendered.contains("argument 'sample_mass' must be of type number"), "{rendered}");
    assert!(rendered.contains("Experiment"), "{rendered}");
}

#[test]
fn unmapped_step_type_is_a_key_error() {
    let registry = registry();
    let mut raw = input();
    raw["Procedure"]["Steps"][0]["StepType"] = json!("Hold");
    let err = registry.class("Experiment").unwrap().from_dict(raw).unwrap_err();
    assert!(matches!(err, Error::Key { .. }), "{err}");
    assert_eq!(err.path().unwrap().to_string(), "$.Procedure.Steps[0].StepType");
}

#[test]
fn missing_required_field_is_rejected() {
    let registry = registry();
    let mut raw = input();
    raw["Procedure"].as_object_mut().unwrap().shift_remove("StartedAt");
    let err = registry.class("Experiment").unwrap().from_dict(raw).unwrap_err();
    assert!(err.to_string().contains("missing 1 required argument: 'started_at'"), "{err}");
}

#[test]
fn registry_is_shared_across_threads() {
    let registry = registry();
    let expected = registry.class("Experiment").unwrap().from_dict(input()).unwrap();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let loaded = registry.class("Experiment").unwrap().from_dict(input()).unwrap();
                assert_eq!(loaded, expected);
            });
        }
    });
}
