mod common;

use std::time::Duration;

use chrono::NaiveDate;
use docflow_client::ClientError;
use docflow_core::domain::llm_model::{LifecycleWindow, LlmModel};
use docflow_core::domain::onboarding::OnboardStatus;
use docflow_core::domain::profile::UserProfile;
use docflow_core::dto::llm_model::ModelSearch;
use docflow_core::dto::onboarding::OnboardRequest;
use serde_json::json;

fn flash_model(model_id: &str) -> LlmModel {
    LlmModel {
        family: "gemini".to_string(),
        name: "Gemini 2.5 Flash".to_string(),
        model_id: model_id.to_string(),
        version: "2.5".to_string(),
        description: "Fast multimodal model".to_string(),
        knowledge_cutoff_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        ..Default::default()
    }
}

fn profile(email: &str, display_name: &str) -> UserProfile {
    UserProfile {
        email: email.to_string(),
        display_name: Some(display_name.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_my_profile_resolves_permissions() {
    let (client, svc) = common::spawn(Some("secret")).await;

    let me = client.my_profile().await.unwrap();

    assert_eq!(me.profile.email, "admin@example.org");
    assert_eq!(me.profile.extra["team"], "platform");
    assert!(me.has_role("admin"));
    assert!(me.has_permission("pipelines.write"));
    assert!(!me.has_permission("profiles.write"));
    assert_eq!(
        svc.requests()[0].authorization.as_deref(),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn test_onboarding_runs_to_completion() {
    let (client, _svc) = common::spawn(None).await;

    let request = OnboardRequest {
        app_id: "clinic-7".to_string(),
        app_name: "Clinic Seven".to_string(),
        ..Default::default()
    };
    let job = client.save_onboarding(&request).await.unwrap();
    assert_eq!(job.job_id, "job-1");

    let first = client.onboarding_progress(&job.job_id).await.unwrap();
    assert_eq!(first.status, OnboardStatus::Running);
    assert_eq!(first.progress, 40);

    let done = client
        .wait_for_onboarding(&job.job_id, Duration::from_millis(5), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(done.status, OnboardStatus::Completed);
    assert_eq!(done.progress, 100);
}

#[tokio::test]
async fn test_onboarding_requires_app_id() {
    let (client, _svc) = common::spawn(None).await;

    let err = client
        .save_onboarding(&OnboardRequest::default())
        .await
        .unwrap_err();

    assert!(err.is_client_error());
    match err {
        ClientError::ApiError { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "app_id is required");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_onboarding() {
    let (client, _svc) = common::spawn(None).await;
    client.cancel_onboarding("job-1").await.unwrap();
}

#[tokio::test]
async fn test_invalid_model_is_never_sent() {
    let (client, svc) = common::spawn(None).await;

    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
    let mut model = LlmModel {
        family: "gemini".to_string(),
        name: "Gemini 2.5 Flash".to_string(),
        model_id: "Gemini 2.5 Flash".to_string(),
        version: "2.5".to_string(),
        description: "Fast multimodal model".to_string(),
        knowledge_cutoff_date: date(2025, 1, 1),
        ..Default::default()
    };
    model.lifecycle.insert(
        "google".to_string(),
        LifecycleWindow::new(date(2026, 6, 1), date(2025, 6, 1)),
    );

    let err = client.create_llm_model(&model).await.unwrap_err();
    let errors = match err {
        ClientError::Validation(errors) => errors,
        other => panic!("expected validation failure, got {:?}", other),
    };
    assert!(errors.get("model_id").is_some());
    assert_eq!(
        errors.get("lifecycle.google"),
        Some("sunset_date must be after available_date")
    );

    let err = client.update_llm_model("m-1", &model).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(svc.requests().is_empty());
}

#[tokio::test]
async fn test_waiting_on_a_stuck_job_times_out() {
    let (client, svc) = common::spawn(None).await;

    let err = client
        .wait_for_onboarding(
            common::STUCK_JOB_ID,
            Duration::from_millis(5),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Timeout(_)));
    assert!(*svc.progress_polls.lock().unwrap() >= 2);
}

#[tokio::test]
async fn test_model_lifecycle() {
    let (client, svc) = common::spawn(Some("secret")).await;

    let created = client
        .create_llm_model(&flash_model("gemini-2.5-flash"))
        .await
        .unwrap();
    let id = created.id.clone().unwrap();
    assert_eq!(svc.models.lock().unwrap().len(), 1);

    let fetched = client.get_llm_model(&id).await.unwrap();
    assert_eq!(fetched.model_id, "gemini-2.5-flash");
    assert_eq!(fetched.knowledge_cutoff_date, NaiveDate::from_ymd_opt(2025, 1, 1));

    let mut changed = fetched.clone();
    changed.description = "Cheaper tier".to_string();
    let updated = client.update_llm_model(&id, &changed).await.unwrap();
    assert_eq!(updated.description, "Cheaper tier");
    assert_eq!(client.list_llm_models().await.unwrap().len(), 1);

    client.delete_llm_model(&id).await.unwrap();
    assert!(client.get_llm_model(&id).await.unwrap_err().is_not_found());
    assert!(
        svc.requests()
            .iter()
            .all(|r| r.authorization.as_deref() == Some("Bearer secret"))
    );
}

#[tokio::test]
async fn test_duplicate_model_is_a_conflict() {
    let (client, _svc) = common::spawn(None).await;

    client
        .create_llm_model(&flash_model("gemini-2.5-flash"))
        .await
        .unwrap();
    match client
        .create_llm_model(&flash_model("gemini-2.5-flash"))
        .await
        .unwrap_err()
    {
        ClientError::ApiError { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "model_id already registered");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_model_search_sends_only_given_filters() {
    let (client, svc) = common::spawn(None).await;

    client
        .create_llm_model(&flash_model("gemini-2.5-flash"))
        .await
        .unwrap();
    let mut pro = flash_model("gemini-2.5-pro");
    pro.name = "Gemini 2.5 Pro".to_string();
    client.create_llm_model(&pro).await.unwrap();

    let search = ModelSearch {
        query: Some("flash".to_string()),
        family: Some("gemini".to_string()),
        vendor: None,
    };
    let found = client.search_llm_models(&search).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].model_id, "gemini-2.5-flash");
    assert_eq!(
        svc.searches(),
        vec![json!({ "query": "flash", "family": "gemini" })]
    );
}

#[tokio::test]
async fn test_profiles_save_list_and_search() {
    let (client, svc) = common::spawn(None).await;

    let saved = client
        .save_profile(&profile("nurse@example.org", "Night Nurse"))
        .await
        .unwrap();
    assert_eq!(saved.id.as_deref(), Some("u-1"));

    let resaved = client
        .save_profile(&profile("nurse@example.org", "Day Nurse"))
        .await
        .unwrap();
    assert_eq!(resaved.id, saved.id);
    client
        .save_profile(&profile("admin@example.org", "Admin"))
        .await
        .unwrap();

    let all = client.list_profiles().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].display_name.as_deref(), Some("Day Nurse"));

    let found = client.search_profiles("nurse").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].email, "nurse@example.org");
    assert_eq!(svc.searches(), vec![json!({ "query": "nurse" })]);
}

#[tokio::test]
async fn test_profile_envelope_failures() {
    let (client, _svc) = common::spawn(None).await;

    match client.save_profile(&profile(" ", "Nobody")).await.unwrap_err() {
        ClientError::Rejected(message) => assert_eq!(message, "email is required"),
        other => panic!("unexpected error {:?}", other),
    }

    match client.search_profiles("").await.unwrap_err() {
        ClientError::ApiError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "query is required");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

