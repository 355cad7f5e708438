//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use cmbuild_config::Config;
    use cmbuild_errors::{ApiError, Error, MonitorError, NetworkError};
    use cmbuild_events::{
        channel, AppEvent, ApplicationEvent, ArtifactEvent, BuildEvent, EventReceiver,
        GeneralEvent,
    };
    use cmbuild_net::ApiResponse;
    use cmbuild_ops::*;
    use cmbuild_types::{Artifact, Build, BuildRequest, BuildStatus};
    use httpmock::prelude::*;
    use std::collections::{HashMap, VecDeque};
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    type Scripted = Result<ApiResponse, Error>;

    /// Service answering from fixed responses; build polls follow a script
    /// whose last entry repeats once the script runs out
    #[derive(Default)]
    struct FakeService {
        apps: Option<Scripted>,
        app_detail: Option<Scripted>,
        created: Option<Scripted>,
        polls: Mutex<VecDeque<Scripted>>,
        files: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<BuildRequest>>,
    }

    impl FakeService {
        fn with_apps(mut self, status: u16, body: &str) -> Self {
            self.apps = Some(Ok(ApiResponse::new(status, body)));
            self
        }

        fn with_created(mut self, status: u16, body: &str) -> Self {
            self.created = Some(Ok(ApiResponse::new(status, body)));
            self
        }

        fn with_polls(self, polls: Vec<Scripted>) -> Self {
            *self.polls.lock().unwrap() = polls.into();
            self
        }

        fn with_file(mut self, url: &str, content: &[u8]) -> Self {
            self.files.insert(url.to_string(), content.to_vec());
            self
        }

        fn unscripted() -> Scripted {
            Err(Error::internal("no scripted response"))
        }
    }

    impl BuildService for FakeService {
        async fn list_applications(&self) -> Result<ApiResponse, Error> {
            self.apps.clone().unwrap_or_else(Self::unscripted)
        }

        async fn get_application(&self, _app_id: &str) -> Result<ApiResponse, Error> {
            self.app_detail
                .clone()
                .unwrap_or_else(|| Ok(ApiResponse::new(200, "{}")))
        }

        async fn create_build(&self, request: &BuildRequest) -> Result<ApiResponse, Error> {
            self.requests.lock().unwrap().push(request.clone());
            self.created.clone().unwrap_or_else(Self::unscripted)
        }

        async fn get_build(&self, _build_id: &str) -> Result<ApiResponse, Error> {
            let mut polls = self.polls.lock().unwrap();
            if polls.len() > 1 {
                polls.pop_front().unwrap()
            } else {
                polls.front().cloned().unwrap_or_else(Self::unscripted)
            }
        }

        async fn download_artifact(&self, url: &str, dest: &Path) -> Result<u64, Error> {
            match self.files.get(url) {
                Some(content) => {
                    tokio::fs::write(dest, content).await?;
                    Ok(content.len() as u64)
                }
                None => Err(NetworkError::HttpError {
                    status: 404,
                    message: "Not Found".to_string(),
                }
                .into()),
            }
        }
    }

    fn make_ctx<S: BuildService>(service: S) -> (OpsCtx<S>, EventReceiver) {
        let (tx, rx) = channel();
        let ctx = OpsContextBuilder::new()
            .with_service(service)
            .with_event_sender(tx)
            .with_config(Config::default())
            .build()
            .unwrap();
        (ctx, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn status(status: &str) -> Scripted {
        Ok(ApiResponse::new(
            200,
            serde_json::json!({"_id": "b9", "status": status}).to_string(),
        ))
    }

    fn fast(max_polls: Option<u32>) -> MonitorOptions {
        MonitorOptions {
            poll_interval: Duration::from_millis(1),
            max_polls,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_millis(5),
        }
    }

    fn status_changes(events: &[AppEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                AppEvent::Build(BuildEvent::StatusChanged { status, .. }) => Some(status.clone()),
                _ => None,
            })
            .collect()
    }

    const APPS: &str = r#"{"applications":[
        {"_id":"","appName":"GetFitSKG draft"},
        {"_id":"a1","appName":"GetFitSKG"},
        {"_id":"a2","appName":"getfitskg-admin"}
    ]}"#;

    #[tokio::test]
    async fn test_resolve_application_first_match_wins() {
        let (ctx, mut rx) = make_ctx(FakeService::default().with_apps(200, APPS));

        let app_id = resolve_application(&ctx, "getfit").await.unwrap();
        assert_eq!(app_id, "a1");

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Application(ApplicationEvent::ListFetched { count: 3 })
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Application(ApplicationEvent::Resolved { app_id, .. }) if app_id == "a1"
        )));
    }

    #[tokio::test]
    async fn test_resolve_application_not_found() {
        let (ctx, _rx) = make_ctx(FakeService::default().with_apps(200, APPS));
        let err = resolve_application(&ctx, "nothing-like-this").await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::NotFound { .. })));

        let (ctx, _rx) = make_ctx(FakeService::default().with_apps(200, r#"{"applications":[]}"#));
        let err = resolve_application(&ctx, "getfit").await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_application_rejected_token() {
        let (ctx, _rx) = make_ctx(FakeService::default().with_apps(401, "invalid token"));
        let err = resolve_application(&ctx, "getfit").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Api(ApiError::Authentication { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_list_workflows() {
        let mut service = FakeService::default();
        service.app_detail = Some(Ok(ApiResponse::new(
            200,
            r#"{"appName":"GetFitSKG","workflows":{
                "ios-development":{"name":"iOS Development"},
                "ios-workflow":{}
            }}"#,
        )));
        let (ctx, mut rx) = make_ctx(service);

        let workflows = list_workflows(&ctx, "a1").await.unwrap();
        assert_eq!(workflows.len(), 2);
        assert_eq!(workflows["ios-workflow"].display_name(), "Unnamed");

        let listed = drain(&mut rx).into_iter().find_map(|e| match e {
            AppEvent::Application(ApplicationEvent::WorkflowsListed { workflows, .. }) => {
                Some(workflows)
            }
            _ => None,
        });
        assert_eq!(listed.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_workflows_empty_and_failed() {
        let (ctx, _rx) = make_ctx(FakeService::default());
        assert!(list_workflows(&ctx, "a1").await.unwrap().is_empty());

        let mut service = FakeService::default();
        service.app_detail = Some(Ok(ApiResponse::new(500, "boom")));
        let (ctx, _rx) = make_ctx(service);
        let err = list_workflows(&ctx, "a1").await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Service { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_submit_build_returns_id() {
        let (ctx, mut rx) = make_ctx(FakeService::default().with_created(201, r#"{"buildId":"b9"}"#));

        let build_id = submit_build(&ctx, "a1", "ios-development", "main")
            .await
            .unwrap();
        assert_eq!(build_id, "b9");

        let sent = ctx.service.requests.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].workflow_id, "ios-development");

        let link = drain(&mut rx).into_iter().find_map(|e| match e {
            AppEvent::Build(BuildEvent::Submitted { dashboard_url, .. }) => dashboard_url,
            _ => None,
        });
        assert_eq!(
            link.as_deref(),
            Some("https://codemagic.io/app/a1/build/b9")
        );
    }

    #[tokio::test]
    async fn test_submit_build_rejected_keeps_body() {
        let (ctx, _rx) = make_ctx(FakeService::default().with_created(400, "unknown workflow"));
        let err = submit_build(&ctx, "a1", "nope", "main").await.unwrap_err();
        match err {
            Error::Api(ApiError::Service { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "unknown workflow");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_build_success_status_other_than_created() {
        let (ctx, _rx) = make_ctx(FakeService::default().with_created(200, r#"{"buildId":"b9"}"#));
        let err = submit_build(&ctx, "a1", "ios-development", "main")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Service { status: 200, .. })));
    }

    #[tokio::test]
    async fn test_submit_build_without_id() {
        for body in [r"{}", r#"{"buildId":""}"#] {
            let (ctx, _rx) = make_ctx(FakeService::default().with_created(201, body));
            let err = submit_build(&ctx, "a1", "ios-development", "main")
                .await
                .unwrap_err();
            assert!(
                matches!(err, Error::Api(ApiError::UnexpectedResponse { .. })),
                "{body}"
            );
        }
    }

    #[tokio::test]
    async fn test_poll_build_status_absorbs_failures() {
        let (ctx, mut rx) = make_ctx(FakeService::default().with_polls(vec![status("building")]));
        let build = poll_build_status(&ctx, "b9").await.unwrap();
        assert_eq!(build.status, Some(BuildStatus::Building));

        for failure in [
            Ok(ApiResponse::new(503, "unavailable")),
            Ok(ApiResponse::new(200, "not json")),
            Err(NetworkError::Timeout {
                url: "https://api.codemagic.io/builds/b9".to_string(),
            }
            .into()),
        ] {
            let (ctx, mut rx) = make_ctx(FakeService::default().with_polls(vec![failure]));
            assert!(poll_build_status(&ctx, "b9").await.is_none());
            assert!(drain(&mut rx).iter().any(|e| matches!(
                e,
                AppEvent::General(GeneralEvent::DebugLog { context, .. })
                    if context.get("build_id").map(String::as_str) == Some("b9")
            )));
        }

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_await_completion_reports_each_status_once() {
        let service = FakeService::default().with_polls(vec![
            status("queued"),
            status("queued"),
            status("building"),
            status("building"),
            status("building"),
            status("finished"),
        ]);
        let (ctx, mut rx) = make_ctx(service);

        let build = await_completion(&ctx, "b9", &fast(None)).await.unwrap();
        assert!(build.is_finished());

        let events = drain(&mut rx);
        assert_eq!(
            status_changes(&events),
            vec!["queued", "building", "finished"]
        );
        assert!(matches!(
            events.last(),
            Some(AppEvent::Build(BuildEvent::Completed { status, .. })) if status == "finished"
        ));
    }

    #[tokio::test]
    async fn test_await_completion_stops_on_failed_build() {
        let (ctx, _rx) = make_ctx(
            FakeService::default().with_polls(vec![status("building"), status("failed")]),
        );
        let build = await_completion(&ctx, "b9", &fast(Some(10))).await.unwrap();
        assert_eq!(build.status, Some(BuildStatus::Failed));
        assert!(!build.is_finished());
    }

    #[tokio::test]
    async fn test_await_completion_never_returns_for_non_terminal_status() {
        for non_terminal in ["skipped", "warming-up", "publishing"] {
            let (ctx, mut rx) = make_ctx(FakeService::default().with_polls(vec![status(non_terminal)]));

            let err = await_completion(&ctx, "b9", &fast(Some(4)))
                .await
                .unwrap_err();
            match err {
                Error::Monitor(MonitorError::PollLimitExceeded {
                    build_id,
                    polls,
                    last_status,
                }) => {
                    assert_eq!(build_id, "b9");
                    assert_eq!(polls, 4);
                    assert_eq!(last_status.as_deref(), Some(non_terminal));
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(status_changes(&drain(&mut rx)), vec![non_terminal]);
        }
    }

    #[tokio::test]
    async fn test_await_completion_backs_off_and_resets() {
        let service = FakeService::default().with_polls(vec![
            Ok(ApiResponse::new(502, "bad gateway")),
            Ok(ApiResponse::new(502, "bad gateway")),
            status("building"),
            Ok(ApiResponse::new(502, "bad gateway")),
            status("finished"),
        ]);
        let (ctx, mut rx) = make_ctx(service);

        let build = await_completion(&ctx, "b9", &fast(None)).await.unwrap();
        assert!(build.is_finished());

        let failures: Vec<u32> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Build(BuildEvent::PollFailed {
                    consecutive_failures,
                    ..
                }) => Some(consecutive_failures),
                _ => None,
            })
            .collect();
        assert_eq!(failures, vec![1, 2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_completion_sleeps_between_polls() {
        let service = FakeService::default().with_polls(vec![
            status("building"),
            Ok(ApiResponse::new(502, "bad gateway")),
            Ok(ApiResponse::new(502, "bad gateway")),
            status("finished"),
        ]);
        let (ctx, mut rx) = make_ctx(service);
        let options = MonitorOptions {
            poll_interval: Duration::from_secs(30),
            max_polls: None,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(300),
        };

        let started = tokio::time::Instant::now();
        let build = await_completion(&ctx, "b9", &options).await.unwrap();
        let elapsed = started.elapsed();
        assert!(build.is_finished());

        // 30s after the good poll, then 60s and 120s after the two failures
        let expected = Duration::from_secs(30 + 60 + 120);
        assert!(elapsed >= expected, "{elapsed:?}");
        assert!(elapsed < expected + Duration::from_secs(1), "{elapsed:?}");

        let delays: Vec<u64> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Build(BuildEvent::PollFailed { next_delay_ms, .. }) => {
                    Some(next_delay_ms)
                }
                _ => None,
            })
            .collect();
        assert_eq!(delays, vec![60_000, 120_000]);
    }

    #[tokio::test]
    async fn test_download_skips_unfinished_build() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("builds");
        let (ctx, mut rx) = make_ctx(FakeService::default());

        let build = Build {
            id: "b9".to_string(),
            status: Some(BuildStatus::Failed),
            artifacts: vec![Artifact::new("app.ipa", "https://files/app.ipa")],
            ..Build::default()
        };
        let report = download_artifacts(&ctx, &build, &out).await.unwrap();

        assert!(report.is_empty());
        assert!(!out.exists());
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, AppEvent::General(GeneralEvent::Warning { .. }))));
    }

    #[tokio::test]
    async fn test_download_without_artifacts() {
        let temp = tempdir().unwrap();
        let (ctx, mut rx) = make_ctx(FakeService::default());

        let build = Build {
            id: "b9".to_string(),
            status: Some(BuildStatus::Finished),
            ..Build::default()
        };
        let report = download_artifacts(&ctx, &build, temp.path()).await.unwrap();

        assert!(report.is_empty());
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            AppEvent::Artifact(ArtifactEvent::NoneAvailable { build_id }) if build_id == "b9"
        )));
    }

    #[tokio::test]
    async fn test_download_continues_past_bad_entries() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("nested").join("builds");
        let service = FakeService::default()
            .with_file("https://files/app.ipa", b"IPA")
            .with_file("https://files/app.dSYM.zip", b"SYMBOLS");
        let (ctx, mut rx) = make_ctx(service);

        let build = Build {
            id: "b9".to_string(),
            status: Some(BuildStatus::Finished),
            artifacts: vec![
                Artifact::new("app.ipa", "https://files/app.ipa"),
                Artifact {
                    name: Some("no-url.ipa".to_string()),
                    url: None,
                },
                Artifact::new("../escape.ipa", "https://files/app.ipa"),
                Artifact::new("gone.ipa", "https://files/gone.ipa"),
                Artifact::new("app.dSYM.zip", "https://files/app.dSYM.zip"),
            ],
            ..Build::default()
        };
        let report = download_artifacts(&ctx, &build, &out).await.unwrap();

        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.failed.len(), 3);
        assert_eq!(std::fs::read(out.join("app.ipa")).unwrap(), b"IPA");
        assert_eq!(report.saved[1].bytes, 7);
        assert!(!temp.path().join("nested").join("escape.ipa").exists());

        let failed: Vec<Option<String>> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Artifact(ArtifactEvent::Failed { code, .. }) => Some(code),
                _ => None,
            })
            .collect();
        assert_eq!(
            failed,
            vec![
                Some("artifact.incomplete".to_string()),
                Some("artifact.invalid_name".to_string()),
                Some("artifact.download_failed".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_download_over_http_keeps_going_after_404() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/app.ipa");
            then.status(200).body("IPA-CONTENT");
        });
        let missing = server.mock(|when, then| {
            when.method(GET).path("/files/bad.ipa");
            then.status(404).body("Not Found");
        });

        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("app.ipa"), b"stale content from an older build").unwrap();

        let mut config = Config::default();
        config.api.base_url = server.base_url();
        let (ctx, mut rx) = make_ctx(RemoteService::from_config(&config, "t").unwrap());

        let build = Build {
            id: "b9".to_string(),
            status: Some(BuildStatus::Finished),
            artifacts: vec![
                Artifact::new("app.ipa", server.url("/files/app.ipa")),
                Artifact::new("bad.ipa", server.url("/files/bad.ipa")),
            ],
            ..Build::default()
        };
        let report = download_artifacts(&ctx, &build, temp.path()).await.unwrap();

        missing.assert();
        assert_eq!(report.saved.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("app.ipa")).unwrap(),
            "IPA-CONTENT"
        );
        assert!(!temp.path().join("bad.ipa").exists());

        let failed = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, AppEvent::Artifact(ArtifactEvent::Failed { .. })))
            .count();
        assert_eq!(failed, 1);
    }

    fn request(output_dir: &Path) -> RunRequest {
        RunRequest {
            app_name: "getfitskg".to_string(),
            workflow_id: "ios-development".to_string(),
            branch: "main".to_string(),
            output_dir: output_dir.to_path_buf(),
            monitor: fast(Some(20)),
        }
    }

    #[tokio::test]
    async fn test_full_process_over_http() {
        let server = MockServer::start();
        let apps = server.mock(|when, then| {
            when.method(GET).path("/apps").header("x-auth-token", "t");
            then.status(200).json_body(serde_json::json!({
                "applications": [{"_id": "a1", "appName": "GetFitSKG"}]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/apps/a1");
            then.status(200).json_body(serde_json::json!({
                "appName": "GetFitSKG",
                "workflows": {"ios-development": {"name": "iOS Development"}}
            }));
        });
        let create = server.mock(|when, then| {
            when.method(POST).path("/builds").json_body(serde_json::json!({
                "appId": "a1",
                "workflowId": "ios-development",
                "branch": "main"
            }));
            then.status(201).json_body(serde_json::json!({"buildId": "b9"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/builds/b9");
            then.status(200).json_body(serde_json::json!({
                "_id": "b9",
                "status": "finished",
                "artefacts": [{"name": "app.ipa", "url": server.url("/files/app.ipa")}]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/files/app.ipa");
            then.status(200).body("IPA");
        });

        let temp = tempdir().unwrap();
        let mut config = Config::default();
        config.api.base_url = server.base_url();
        let (ctx, mut rx) = make_ctx(RemoteService::from_config(&config, "t").unwrap());

        let report = run_full_process(&ctx, &request(temp.path())).await.unwrap();

        apps.assert();
        create.assert_hits(1);
        assert!(report.succeeded());
        assert_eq!(report.app_id, "a1");
        assert_eq!(report.build_id, "b9");
        assert_eq!(report.dashboard_url, "https://codemagic.io/app/a1/build/b9");
        assert_eq!(report.downloads.unwrap().saved.len(), 1);
        assert_eq!(std::fs::read(temp.path().join("app.ipa")).unwrap(), b"IPA");

        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            AppEvent::General(GeneralEvent::OperationCompleted { success: true, .. })
        )));
    }

    #[tokio::test]
    async fn test_full_process_stops_at_first_failure() {
        let temp = tempdir().unwrap();
        let service = FakeService::default()
            .with_apps(200, APPS)
            .with_created(400, "branch not found")
            .with_polls(vec![status("finished")]);
        let (ctx, mut rx) = make_ctx(service);

        let err = run_full_process(&ctx, &request(temp.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Service { status: 400, .. })));

        let events = drain(&mut rx);
        assert!(!events
            .iter()
            .any(|e| matches!(e, AppEvent::Build(BuildEvent::MonitorStarted { .. }))));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::General(GeneralEvent::OperationFailed { .. })
        )));
    }

    #[tokio::test]
    async fn test_full_process_failed_build_downloads_nothing() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("builds");
        let service = FakeService::default()
            .with_apps(200, APPS)
            .with_created(201, r#"{"buildId":"b9"}"#)
            .with_polls(vec![status("building"), status("failed")])
            .with_file("https://files/app.ipa", b"IPA");
        let (ctx, _rx) = make_ctx(service);

        let report = run_full_process(&ctx, &request(&out)).await.unwrap();

        assert!(!report.succeeded());
        assert!(report.downloads.is_none());
        assert!(!out.exists());
    }

    #[test]
    fn test_context_requires_service_and_sender() {
        let (tx, _rx) = channel();
        let err = OpsContextBuilder::<FakeService>::new()
            .with_event_sender(tx)
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("service"));

        let err = OpsContextBuilder::new()
            .with_service(FakeService::default())
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("event sender"));
    }
}
