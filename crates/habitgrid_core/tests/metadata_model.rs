use habitgrid_core::{
    Habit, HabitValidationError, MetadataField, MetadataFieldError, MetadataKind, MetadataValue,
};
use uuid::Uuid;

fn field(name: &str, kind: MetadataKind) -> MetadataField {
    MetadataField {
        name: name.to_string(),
        kind,
        options: None,
        default: None,
    }
}

#[test]
fn enum_field_requires_non_empty_options() {
    let mut missing = field("mood", MetadataKind::Enum);
    assert!(matches!(
        missing.validate(),
        Err(MetadataFieldError::MissingEnumOptions { .. })
    ));

    missing.options = Some(Vec::new());
    assert!(matches!(
        missing.validate(),
        Err(MetadataFieldError::MissingEnumOptions { .. })
    ));

    missing.options = Some(vec!["good".to_string(), "bad".to_string()]);
    assert!(missing.validate().is_ok());
}

#[test]
fn non_enum_field_rejects_options() {
    let mut text = field("note", MetadataKind::Text);
    text.options = Some(vec!["unexpected".to_string()]);
    assert!(matches!(
        text.validate(),
        Err(MetadataFieldError::UnexpectedOptions { .. })
    ));
}

#[test]
fn blank_field_name_is_rejected() {
    let blank = field("  ", MetadataKind::Number);
    assert!(matches!(
        blank.validate(),
        Err(MetadataFieldError::BlankName)
    ));
}

#[test]
fn defaults_must_type_match_field_kind() {
    let mut number = field("reps", MetadataKind::Number);
    number.default = Some(MetadataValue::Number(12.0));
    assert!(number.validate().is_ok());

    number.default = Some(MetadataValue::Text("twelve".to_string()));
    assert!(matches!(
        number.validate(),
        Err(MetadataFieldError::DefaultTypeMismatch { .. })
    ));

    let mut flag = field("fasted", MetadataKind::Boolean);
    flag.default = Some(MetadataValue::Boolean(false));
    assert!(flag.validate().is_ok());

    let mut date = field("since", MetadataKind::Date);
    date.default = Some(MetadataValue::Text("2024-01-01".to_string()));
    assert!(date.validate().is_ok());
    date.default = Some(MetadataValue::Text("someday".to_string()));
    assert!(matches!(
        date.validate(),
        Err(MetadataFieldError::InvalidDateDefault { .. })
    ));
}

#[test]
fn enum_default_must_be_a_declared_option() {
    let mut mood = field("mood", MetadataKind::Enum);
    mood.options = Some(vec!["good".to_string(), "bad".to_string()]);

    mood.default = Some(MetadataValue::Text("good".to_string()));
    assert!(mood.validate().is_ok());

    mood.default = Some(MetadataValue::Text("great".to_string()));
    assert!(matches!(
        mood.validate(),
        Err(MetadataFieldError::DefaultNotInOptions { .. })
    ));
}

#[test]
fn metadata_value_json_shape_is_untagged() {
    let json = serde_json::to_string(&MetadataValue::Number(5.5)).unwrap();
    assert_eq!(json, "5.5");
    let json = serde_json::to_string(&MetadataValue::Boolean(true)).unwrap();
    assert_eq!(json, "true");
    let json = serde_json::to_string(&MetadataValue::Text("ok".to_string())).unwrap();
    assert_eq!(json, "\"ok\"");

    let parsed: MetadataValue = serde_json::from_str("false").unwrap();
    assert_eq!(parsed, MetadataValue::Boolean(false));
    let parsed: MetadataValue = serde_json::from_str("3.25").unwrap();
    assert_eq!(parsed, MetadataValue::Number(3.25));
    let parsed: MetadataValue = serde_json::from_str("\"2024-01-01\"").unwrap();
    assert_eq!(parsed, MetadataValue::Text("2024-01-01".to_string()));
}

#[test]
fn metadata_field_serializes_with_external_schema_naming() {
    let mut mood = field("mood", MetadataKind::Enum);
    mood.options = Some(vec!["good".to_string()]);

    let json = serde_json::to_value(&mood).unwrap();
    assert_eq!(json["type"], "enum");
    assert_eq!(json["name"], "mood");
    assert!(json.get("default").is_none());
}

#[test]
fn habit_validation_covers_name_parent_and_metadata() {
    let owner = Uuid::new_v4();
    let mut habit = Habit::new(owner, "Lift", "#000", "barbell");
    assert!(habit.validate().is_ok());

    habit.name = "   ".to_string();
    assert!(matches!(
        habit.validate(),
        Err(HabitValidationError::BlankName)
    ));

    habit.name = "Lift".to_string();
    habit.parent_uuid = Some(habit.uuid);
    assert!(matches!(
        habit.validate(),
        Err(HabitValidationError::SelfParent)
    ));

    habit.parent_uuid = None;
    habit.metadata = Some(vec![
        field("weight", MetadataKind::Number),
        field("weight", MetadataKind::Text),
    ]);
    assert!(matches!(
        habit.validate(),
        Err(HabitValidationError::DuplicateMetadataField(name)) if name == "weight"
    ));
}
