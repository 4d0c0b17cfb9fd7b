use std::path::PathBuf;
use std::sync::Arc;

use rules_core::{Character, ItemSlot, OperationId, VariableValue};
use runtime::{
    CharacterRepository, FileCharacterRepo, InMemoryCharacterRepo, Runtime, RuntimeConfig,
    RuntimeError, RuntimeEvent,
};

const LANGUAGE_SELECT: &str = "9c54476d-217d-58e3-903c-781cd736bfa0";
const GNOMISH: &str = "901f709b-be95-5cf3-9aea-4b82714f0c72";
const ORCISH: &str = "d3b9cfd3-1df4-50d7-b5a1-e7aa8f651b20";

fn content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../rules/content/data")
}

fn id(text: &str) -> OperationId {
    text.parse().unwrap()
}

fn harsk() -> Character {
    Character::new("harsk", "Harsk", 1)
        .with_content_source("core")
        .with_ancestry("dwarf")
        .with_class("fighter")
        .with_item(ItemSlot::equipped("steel_shield", 0))
}

fn runtime_with(repository: Arc<dyn CharacterRepository>) -> Runtime {
    Runtime::builder()
        .config(RuntimeConfig::default())
        .content_dir(content_dir())
        .repository(repository)
        .build()
        .expect("runtime should build from sample content")
}

fn languages(resolution: &rules_core::Resolution) -> Vec<String> {
    match resolution.character_scope().value("LANGUAGE_NAMES") {
        Some(VariableValue::ListOfString(names)) => names.clone(),
        other => panic!("unexpected LANGUAGE_NAMES: {:?}", other),
    }
}

#[tokio::test]
async fn record_and_clear_selection_round_trip() {
    let repository = Arc::new(InMemoryCharacterRepo::with_characters([harsk()]));
    let runtime = runtime_with(repository.clone());
    let mut events = runtime.subscribe();

    let pending = runtime.pending_selections("harsk").await.unwrap();
    assert!(pending.iter().any(|op| op.id == id(LANGUAGE_SELECT)));
    assert!(matches!(
        events.recv().await.unwrap(),
        RuntimeEvent::Resolved(summary) if summary.character == "harsk"
    ));

    let resolution = runtime
        .record_selection("harsk", id(LANGUAGE_SELECT), id(GNOMISH))
        .await
        .unwrap();
    assert!(languages(&resolution).contains(&"Gnomish".to_string()));
    assert!(
        resolution
            .pending_selections()
            .all(|op| op.id != id(LANGUAGE_SELECT))
    );
    assert_eq!(
        repository
            .load("harsk")
            .unwrap()
            .operation_data
            .selection(id(LANGUAGE_SELECT)),
        Some(GNOMISH)
    );
    assert!(matches!(
        events.recv().await.unwrap(),
        RuntimeEvent::SelectionRecorded { operation, .. } if operation == id(LANGUAGE_SELECT)
    ));

    let resolution = runtime
        .clear_selection("harsk", id(LANGUAGE_SELECT))
        .await
        .unwrap();
    assert!(!languages(&resolution).contains(&"Gnomish".to_string()));
    assert!(
        resolution
            .pending_selections()
            .any(|op| op.id == id(LANGUAGE_SELECT))
    );
    assert!(matches!(
        events.recv().await.unwrap(),
        RuntimeEvent::SelectionCleared { .. }
    ));
}

#[tokio::test]
async fn invalid_option_leaves_record_untouched() {
    let repository = Arc::new(InMemoryCharacterRepo::with_characters([harsk()]));
    let runtime = runtime_with(repository.clone());

    let err = runtime
        .record_selection("harsk", id(LANGUAGE_SELECT), id(LANGUAGE_SELECT))
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::Selection(_)));
    assert!(
        repository
            .load("harsk")
            .unwrap()
            .operation_data
            .selections
            .is_empty()
    );
}

#[tokio::test]
async fn resolve_many_keeps_input_order_and_isolates_failures() {
    let elf = Character::new("lem", "Lem", 2).with_ancestry("elf");
    let repository = Arc::new(InMemoryCharacterRepo::with_characters([harsk(), elf]));
    let runtime = Runtime::builder()
        .config(RuntimeConfig {
            max_parallel: 1,
            ..RuntimeConfig::default()
        })
        .content_dir(content_dir())
        .repository(repository)
        .build()
        .unwrap();

    let ids = vec!["lem".to_string(), "ghost".to_string(), "harsk".to_string()];
    let results = runtime.resolve_many(&ids).await;

    let order: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, vec!["lem", "ghost", "harsk"]);
    assert!(results[0].1.is_ok());
    assert!(results[1].1.as_ref().unwrap_err().is_not_found());
    assert_eq!(
        results[2]
            .1
            .as_ref()
            .unwrap()
            .character_scope()
            .value("HAS_DARKVISION"),
        Some(&VariableValue::Boolean(true))
    );
}

#[tokio::test]
async fn concurrent_choices_on_file_repository_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let repository = Arc::new(FileCharacterRepo::new(dir.path()).unwrap());
    repository.save(&harsk()).unwrap();
    let runtime = runtime_with(repository.clone());

    let first = runtime.clone();
    let second = runtime.clone();
    let (language, note) = tokio::join!(
        async move {
            first
                .record_selection("harsk", id(LANGUAGE_SELECT), id(ORCISH))
                .await
        },
        async move { second.set_note("harsk", id(LANGUAGE_SELECT), "grew up near the hills") },
    );
    language.unwrap();
    note.unwrap();

    let stored = repository.load("harsk").unwrap();
    assert_eq!(
        stored.operation_data.selection(id(LANGUAGE_SELECT)),
        Some(ORCISH)
    );
    assert_eq!(
        stored.operation_data.note(id(LANGUAGE_SELECT)),
        Some("grew up near the hills")
    );

    let resolution = runtime.resolve("harsk").await.unwrap();
    let record = resolution
        .trace()
        .iter()
        .find(|record| record.id == id(LANGUAGE_SELECT))
        .unwrap();
    assert_eq!(record.note.as_deref(), Some("grew up near the hills"));
}

#[tokio::test]
async fn unknown_character_is_not_found() {
    let runtime = runtime_with(Arc::new(InMemoryCharacterRepo::new()));
    let err = runtime.resolve("nobody").await.unwrap_err();
    assert!(err.is_not_found());
}
