mod common;

use docflow_client::ClientError;
use docflow_core::domain::pipeline::Pipeline;
use docflow_core::dto::pipeline::PipelineFilters;
use docflow_core::editor::{PayloadEdit, PromptEdit, TaskEdit, merge};
use serde_json::{Value, json};

fn intake_pipeline() -> Pipeline {
    serde_json::from_value(json!({
        "key": "intake",
        "name": "Intake",
        "version": "4",
        "scope": "default",
        "active": true,
        "auto_publish_entities_enabled": true,
        "app_id": "clinic-7",
        "created_by": "admin@example.org",
        "created_at": "2026-03-01T10:00:00.000Z",
        "notification_channel": "ops",
        "tasks": [
            {
                "id": "split",
                "type": "module",
                "module": { "type": "splitter", "context": { "max_pages": 50 } },
                "post_processing": { "for_each": "pages" }
            },
            {
                "id": "classify",
                "type": "prompt",
                "prompt": { "model": "gemini-2.5-flash", "prompt": "Classify", "temperature": 0.3 },
                "entity_schema_ref": { "name": "Classification" },
                "params": { "labels": ["lab", "imaging"] }
            },
            {
                "id": "publish",
                "type": "publish_callback",
                "callback": { "topic": "documents" },
                "invoke": { "async": true }
            }
        ]
    }))
    .unwrap()
}

fn without_tasks(mut value: Value) -> Value {
    value.as_object_mut().unwrap().remove("tasks");
    value
}

#[tokio::test]
async fn test_replace_task_changes_only_that_task() {
    let (client, _svc) = common::spawn(Some("secret")).await;

    let created = client.create_pipeline(&intake_pipeline()).await.unwrap();
    let id = created.id.clone().unwrap();
    let before = serde_json::to_value(client.get_pipeline(&id).await.unwrap()).unwrap();

    let original = created.task("classify").unwrap().clone();
    let edit = TaskEdit {
        payload: Some(PayloadEdit::Prompt(PromptEdit {
            temperature: Some("0.75".to_string()),
            ..Default::default()
        })),
        ..Default::default()
    };
    let edited = merge(&original, &edit).unwrap();
    client.replace_task(&id, edited).await.unwrap();

    let after = serde_json::to_value(client.get_pipeline(&id).await.unwrap()).unwrap();

    assert_eq!(after["tasks"][0], before["tasks"][0]);
    assert_eq!(after["tasks"][2], before["tasks"][2]);
    assert_ne!(after["tasks"][1], before["tasks"][1]);
    assert_eq!(after["tasks"][1]["prompt"]["temperature"], json!(0.8));
    assert_eq!(
        after["tasks"][1]["entity_schema_ref"],
        before["tasks"][1]["entity_schema_ref"]
    );
    assert_eq!(without_tasks(after), without_tasks(before));
}

#[tokio::test]
async fn test_create_is_upsert_by_key() {
    let (client, svc) = common::spawn(None).await;

    let first = client.create_pipeline(&intake_pipeline()).await.unwrap();
    let mut renamed = intake_pipeline();
    renamed.name = "Intake v2".to_string();
    let second = client.upsert_pipeline(&renamed).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(svc.pipelines.lock().unwrap().len(), 1);
    let listed = client
        .list_pipelines(&PipelineFilters::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Intake v2");
}

#[tokio::test]
async fn test_unknown_fields_survive_round_trip() {
    let (client, svc) = common::spawn(None).await;

    let created = client.create_pipeline(&intake_pipeline()).await.unwrap();
    let id = created.id.unwrap();
    let stored = svc.stored(&id).unwrap();

    assert_eq!(stored["notification_channel"], json!("ops"));
    assert_eq!(stored["tasks"][2]["invoke"], json!({ "async": true }));
    assert_eq!(stored["tasks"][1]["params"]["labels"][1], json!("imaging"));
}

#[tokio::test]
async fn test_list_filters_by_app() {
    let (client, _svc) = common::spawn(None).await;

    client.create_pipeline(&intake_pipeline()).await.unwrap();
    let mut other = intake_pipeline();
    other.key = "billing".to_string();
    other.app_id = Some("clinic-9".to_string());
    client.create_pipeline(&other).await.unwrap();

    let filters = PipelineFilters {
        app_id: Some("clinic-9".to_string()),
        labels: Vec::new(),
    };
    let listed = client.list_pipelines(&filters).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].key, "billing");
}

#[tokio::test]
async fn test_requests_carry_token_and_json_content_type() {
    let (client, svc) = common::spawn(Some("secret")).await;

    client
        .list_pipelines(&PipelineFilters::default())
        .await
        .unwrap();

    let seen = svc.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_no_token_means_no_authorization_header() {
    let (client, svc) = common::spawn(None).await;

    client
        .list_pipelines(&PipelineFilters::default())
        .await
        .unwrap();

    assert_eq!(svc.requests()[0].authorization, None);
}

#[tokio::test]
async fn test_missing_pipeline_is_not_found() {
    let (client, _svc) = common::spawn(None).await;

    let err = client.get_pipeline("p-404").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_success_false_is_an_error() {
    let (client, _svc) = common::spawn(None).await;

    let created = client.create_pipeline(&intake_pipeline()).await.unwrap();
    let err = client
        .update_pipeline(created.id.as_deref().unwrap(), &created)
        .await
        .unwrap_err();

    match err {
        ClientError::Rejected(message) => assert_eq!(message, "pipeline is locked"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_error_status_uses_envelope_message() {
    let (client, _svc) = common::spawn(None).await;

    let mut keyless = intake_pipeline();
    keyless.key = String::new();

    match client.create_pipeline(&keyless).await.unwrap_err() {
        ClientError::ApiError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "key is required");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_pipeline() {
    let (client, svc) = common::spawn(None).await;

    let created = client.create_pipeline(&intake_pipeline()).await.unwrap();
    let id = created.id.unwrap();

    client.delete_pipeline(&id).await.unwrap();
    assert!(svc.stored(&id).is_none());

    let err = client.delete_pipeline(&id).await.unwrap_err();
    match err {
        ClientError::ApiError { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "pipeline not found");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_replace_unknown_task_sends_nothing() {
    let (client, svc) = common::spawn(None).await;

    let created = client.create_pipeline(&intake_pipeline()).await.unwrap();
    let id = created.id.unwrap();
    let stray = docflow_core::editor::create_task(
        "missing",
        docflow_core::domain::task::TaskKind::Module,
    )
    .unwrap();

    let requests_before = svc.requests().len();
    let err = client.replace_task(&id, stray).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidRequest(_)));
    // Only the GET went out
    assert_eq!(svc.requests().len(), requests_before + 1);
}

#[tokio::test]
async fn test_replace_tasks_reorders() {
    let (client, _svc) = common::spawn(None).await;

    let created = client.create_pipeline(&intake_pipeline()).await.unwrap();
    let id = created.id.clone().unwrap();
    let mut tasks = created.tasks.clone();
    tasks.reverse();

    let saved = client.replace_tasks(&id, tasks).await.unwrap();
    let order: Vec<&str> = saved.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(order, ["publish", "classify", "split"]);

    let mut doubled = created.tasks.clone();
    doubled.push(created.tasks[0].clone());
    assert!(matches!(
        client.replace_tasks(&id, doubled).await,
        Err(ClientError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_replace_task_resends_other_json_verbatim() {
    let (client, svc) = common::spawn(None).await;
    let record = json!({
        "id": "p-raw",
        "key": "raw",
        "name": "Raw",
        "version": 3,
        "modified_at": null,
        "tasks": [
            {
                "id": "a",
                "type": "prompt",
                "prompt": { "model": "m", "temperature": 0, "top_k": null }
            },
            { "id": "b", "type": "remote", "remote": { "url": "https://old", "timeout": 30 } }
        ]
    });
    svc.seed_pipeline(record.clone());

    let pipeline = client.get_pipeline("p-raw").await.unwrap();
    assert_eq!(pipeline.version.as_deref(), Some("3"));

    let mut edited = pipeline.task("b").unwrap().clone();
    if let docflow_core::domain::task::TaskPayload::Remote(spec) = &mut edited.payload {
        spec.url = Some("https://new".to_string());
    }
    client.replace_task("p-raw", edited).await.unwrap();

    let stored = svc.stored("p-raw").unwrap();
    assert_eq!(stored["tasks"][0], record["tasks"][0]);
    assert_eq!(stored["tasks"][1]["remote"]["url"], json!("https://new"));
    assert_eq!(without_tasks(stored), without_tasks(record));
}

#[tokio::test]
async fn test_ids_with_reserved_characters_stay_one_segment() {
    let (client, svc) = common::spawn(None).await;
    svc.seed_pipeline(json!({ "id": "team/intake?v=2", "key": "intake", "name": "Intake" }));

    let pipeline = client.get_pipeline("team/intake?v=2").await.unwrap();
    assert_eq!(pipeline.key, "intake");
    assert_eq!(svc.requests()[0].path, "/api/v1/pipelines/team/intake?v=2");

    client.delete_pipeline("team/intake?v=2").await.unwrap();
    assert!(svc.stored("team/intake?v=2").is_none());
}

