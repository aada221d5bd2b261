use habitgrid_core::db::open_db_in_memory;
use habitgrid_core::{
    AuthContext, CreateHabitRequest, HabitRepoError, HabitRepository, HabitService,
    HabitServiceError, MetadataField, MetadataKind, MetadataValue, SqliteHabitRepository,
    UpdateHabitRequest,
};
use rusqlite::Connection;
use uuid::Uuid;

fn habit_request(name: &str) -> CreateHabitRequest {
    CreateHabitRequest {
        name: name.to_string(),
        color: "#4caf50".to_string(),
        icon: "leaf".to_string(),
        parent_uuid: None,
        metadata: None,
    }
}

fn update_request(habit_uuid: Uuid, name: &str) -> UpdateHabitRequest {
    UpdateHabitRequest {
        habit_uuid,
        name: name.to_string(),
        color: "#2196f3".to_string(),
        icon: "drop".to_string(),
        parent_uuid: None,
        metadata: None,
    }
}

#[test]
fn create_and_get_roundtrip_preserves_metadata_schema() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let auth = AuthContext::authenticated(Uuid::new_v4());

    let mut request = habit_request("Morning run");
    request.metadata = Some(vec![
        MetadataField {
            name: "distance_km".to_string(),
            kind: MetadataKind::Number,
            options: None,
            default: Some(MetadataValue::Number(5.0)),
        },
        MetadataField {
            name: "mood".to_string(),
            kind: MetadataKind::Enum,
            options: Some(vec!["good".to_string(), "bad".to_string()]),
            default: None,
        },
    ]);

    let id = service.create_habit(&auth, request).unwrap();
    let loaded = service.get_habit(&auth, id).unwrap().unwrap();

    assert_eq!(loaded.name, "Morning run");
    assert!(loaded.is_active);
    assert!(loaded.parent_uuid.is_none());
    let fields = loaded.metadata.unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "distance_km");
    assert_eq!(fields[1].kind, MetadataKind::Enum);
}

#[test]
fn anonymous_queries_are_empty_and_mutations_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let anonymous = AuthContext::anonymous();

    assert!(service.list_habits(&anonymous, true).unwrap().is_empty());
    assert!(service
        .get_habit(&anonymous, Uuid::new_v4())
        .unwrap()
        .is_none());
    assert!(service
        .list_sub_habits(&anonymous, Uuid::new_v4())
        .unwrap()
        .is_empty());

    let create_err = service
        .create_habit(&anonymous, habit_request("Stretch"))
        .unwrap_err();
    assert!(matches!(create_err, HabitServiceError::Unauthenticated));

    let deactivate_err = service
        .deactivate_habit(&anonymous, Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(deactivate_err, HabitServiceError::Unauthenticated));
}

#[test]
fn list_habits_returns_top_level_unless_nested_requested() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let auth = AuthContext::authenticated(Uuid::new_v4());

    let parent_id = service.create_habit(&auth, habit_request("Fitness")).unwrap();
    let mut child = habit_request("Push-ups");
    child.parent_uuid = Some(parent_id);
    let child_id = service.create_habit(&auth, child).unwrap();

    let top_level = service.list_habits(&auth, false).unwrap();
    assert_eq!(top_level.len(), 1);
    assert_eq!(top_level[0].uuid, parent_id);

    let everything = service.list_habits(&auth, true).unwrap();
    assert_eq!(everything.len(), 2);

    let children = service.list_sub_habits(&auth, parent_id).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].uuid, child_id);
    assert_eq!(children[0].parent_uuid, Some(parent_id));
}

#[test]
fn update_replaces_fields_and_keeps_active_flag() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let auth = AuthContext::authenticated(Uuid::new_v4());

    let id = service.create_habit(&auth, habit_request("Jurnal")).unwrap();
    service
        .update_habit(&auth, update_request(id, "Journal"))
        .unwrap();

    let loaded = service.get_habit(&auth, id).unwrap().unwrap();
    assert_eq!(loaded.name, "Journal");
    assert_eq!(loaded.color, "#2196f3");
    assert_eq!(loaded.icon, "drop");
    assert!(loaded.is_active);
}

#[test]
fn update_missing_or_foreign_habit_collapses_to_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let owner = AuthContext::authenticated(Uuid::new_v4());
    let stranger = AuthContext::authenticated(Uuid::new_v4());

    let id = service.create_habit(&owner, habit_request("Meditate")).unwrap();

    let missing = service
        .update_habit(&owner, update_request(Uuid::new_v4(), "Nope"))
        .unwrap_err();
    assert!(matches!(missing, HabitServiceError::HabitNotFound(_)));

    let foreign = service
        .update_habit(&stranger, update_request(id, "Hijack"))
        .unwrap_err();
    assert!(matches!(foreign, HabitServiceError::HabitNotFound(_)));

    let untouched = service.get_habit(&owner, id).unwrap().unwrap();
    assert_eq!(untouched.name, "Meditate");
}

#[test]
fn deactivate_cascades_to_direct_children_and_nothing_else() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let auth = AuthContext::authenticated(Uuid::new_v4());

    let a = service.create_habit(&auth, habit_request("A")).unwrap();
    let mut b = habit_request("B");
    b.parent_uuid = Some(a);
    let b = service.create_habit(&auth, b).unwrap();
    let mut c = habit_request("C");
    c.parent_uuid = Some(a);
    let c = service.create_habit(&auth, c).unwrap();
    let d = service.create_habit(&auth, habit_request("D")).unwrap();

    service.deactivate_habit(&auth, a).unwrap();

    for id in [a, b, c] {
        let habit = service.get_habit(&auth, id).unwrap().unwrap();
        assert!(!habit.is_active, "expected {id} to be deactivated");
    }
    let unrelated = service.get_habit(&auth, d).unwrap().unwrap();
    assert!(unrelated.is_active);

    let remaining = service.list_habits(&auth, true).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].uuid, d);
}

#[test]
fn deactivate_is_idempotent_for_owned_habits() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let auth = AuthContext::authenticated(Uuid::new_v4());

    let id = service.create_habit(&auth, habit_request("Floss")).unwrap();
    service.deactivate_habit(&auth, id).unwrap();
    service.deactivate_habit(&auth, id).unwrap();

    let habit = service.get_habit(&auth, id).unwrap().unwrap();
    assert!(!habit.is_active);
}

#[test]
fn parent_rules_enforce_one_level_nesting() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let auth = AuthContext::authenticated(Uuid::new_v4());
    let stranger = AuthContext::authenticated(Uuid::new_v4());

    let parent = service.create_habit(&auth, habit_request("Parent")).unwrap();
    let mut child = habit_request("Child");
    child.parent_uuid = Some(parent);
    let child = service.create_habit(&auth, child).unwrap();

    // Nesting under an already nested habit is rejected.
    let mut grandchild = habit_request("Grandchild");
    grandchild.parent_uuid = Some(child);
    let err = service.create_habit(&auth, grandchild).unwrap_err();
    assert!(matches!(err, HabitServiceError::ParentNotNestable(id) if id == child));

    // A foreign parent reads as missing.
    let mut foreign = habit_request("Foreign child");
    foreign.parent_uuid = Some(parent);
    let err = service.create_habit(&stranger, foreign).unwrap_err();
    assert!(matches!(err, HabitServiceError::ParentNotFound(id) if id == parent));

    // A habit with children cannot itself be nested.
    let other = service.create_habit(&auth, habit_request("Other")).unwrap();
    let mut nest_parent = update_request(parent, "Parent");
    nest_parent.parent_uuid = Some(other);
    let err = service.update_habit(&auth, nest_parent).unwrap_err();
    assert!(matches!(err, HabitServiceError::HabitHasChildren(id) if id == parent));
}

#[test]
fn deactivated_parent_rejects_new_children() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let auth = AuthContext::authenticated(Uuid::new_v4());

    let parent = service.create_habit(&auth, habit_request("Retired")).unwrap();
    service.deactivate_habit(&auth, parent).unwrap();

    let mut child = habit_request("Late child");
    child.parent_uuid = Some(parent);
    let err = service.create_habit(&auth, child).unwrap_err();
    assert!(matches!(err, HabitServiceError::ParentNotFound(id) if id == parent));
}

#[test]
fn validation_failures_block_writes() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let auth = AuthContext::authenticated(Uuid::new_v4());

    let blank = service.create_habit(&auth, habit_request("   ")).unwrap_err();
    assert!(matches!(blank, HabitServiceError::Validation(_)));

    let mut enum_without_options = habit_request("Supplements");
    enum_without_options.metadata = Some(vec![MetadataField {
        name: "kind".to_string(),
        kind: MetadataKind::Enum,
        options: None,
        default: None,
    }]);
    let err = service
        .create_habit(&auth, enum_without_options)
        .unwrap_err();
    assert!(matches!(err, HabitServiceError::Validation(_)));

    assert!(service.list_habits(&auth, true).unwrap().is_empty());
}

#[test]
fn ownership_isolation_hides_foreign_records() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let user_x = AuthContext::authenticated(Uuid::new_v4());
    let user_y = AuthContext::authenticated(Uuid::new_v4());

    let y_habit = service.create_habit(&user_y, habit_request("Secret")).unwrap();

    assert!(service.get_habit(&user_x, y_habit).unwrap().is_none());
    assert!(service.list_habits(&user_x, true).unwrap().is_empty());
    assert!(service
        .list_sub_habits(&user_x, y_habit)
        .unwrap()
        .is_empty());

    let err = service
        .deactivate_habit(&user_x, y_habit)
        .unwrap_err();
    assert!(matches!(err, HabitServiceError::HabitNotFound(_)));
    assert!(service.get_habit(&user_y, y_habit).unwrap().unwrap().is_active);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteHabitRepository::try_new(&conn);
    match result {
        Err(HabitRepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_lists_are_deterministically_ordered() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::try_new(&conn).unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let owner = Uuid::new_v4();
    let auth = AuthContext::authenticated(owner);

    for name in ["Cello", "Aikido", "Baking"] {
        service.create_habit(&auth, habit_request(name)).unwrap();
    }

    let names: Vec<String> = repo
        .list_habits(owner, &Default::default())
        .unwrap()
        .into_iter()
        .map(|habit| habit.name)
        .collect();
    assert_eq!(names, vec!["Aikido", "Baking", "Cello"]);
}
