mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use stampede::prelude::*;
    use std::fs;
    use std::future::IntoFuture;
    use std::time::Duration;

    fn plan(endpoint: Endpoint, users: usize, duration: Duration) -> TestPlan {
        TestPlan::new(
            RunConfig::new()
                .virtual_users(users)
                .test_duration(duration)
                .http_timeout(Duration::from_secs(5))
                .endpoint(endpoint),
        )
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn writes_a_report_per_model() {
        init();
        let addr = server().await;
        let out = tempfile::tempdir().unwrap();
        let sink = FileSink::new(out.path().join("result")).unwrap();

        let plan = plan(
            endpoint(addr, "/delay/ms/50/api/chat"),
            4,
            Duration::from_secs(1),
        )
        .group(TestGroup::new("llama3.1:latest", vec![chat("llama3.1:latest")]))
        .group(TestGroup::new(
            "qwen2.5:1.5b",
            vec![chat("qwen2.5:1.5b"), chat("qwen2.5:1.5b")],
        ));

        let reports = LoadTest::http(plan, sink).unwrap().await.unwrap();
        assert_eq!(reports.len(), 2);

        for report in &reports {
            assert!(report.total_requests_sent > 0);
            assert_eq!(report.error_percent, 0.);
            assert!(report.canceled_requests <= 4);
            assert!(report.min_response_time_ms >= 50.);
            assert!(report.min_response_time_ms <= report.avg_response_time_ms);
            assert!(report.avg_response_time_ms <= report.max_response_time_ms);
            // At most 4 users * 1s / 50ms completions.
            assert!(report.requests_per_second <= 80.);

            let path = out.path().join("result").join(report.file_name());
            let text = fs::read_to_string(path).unwrap();
            assert_eq!(text, report.to_string());
            assert!(text.starts_with(&format!("Model: {}\n", report.model)));
        }

        assert!(out
            .path()
            .join("result/api_metrics_llama3_1_latest.txt")
            .is_file());
        assert!(out.path().join("result/api_metrics_qwen2_5_1_5b.txt").is_file());
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn server_errors_are_counted() {
        init();
        let addr = server().await;

        let plan = plan(
            endpoint(addr, "/status/500/api/chat"),
            2,
            Duration::from_millis(500),
        )
        .group(TestGroup::new("broken", vec![chat("broken")]));

        let reports = LoadTest::http(plan, Vec::<FinalReport>::new()).unwrap().await.unwrap();
        let report = &reports[0];

        assert!(report.total_requests_sent > 0);
        assert_eq!(report.requests_per_second, 0.);
        assert_eq!(report.avg_response_time_ms, 0.);
        assert_eq!(report.min_response_time_ms, 0.);
        assert_eq!(report.max_response_time_ms, 0.);
        assert!(report.error_percent > 90.);
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn overloaded_server_mixes_successes_and_errors() {
        init();
        let addr = server().await;

        let plan = plan(
            endpoint(addr, "/max/5/server/overloaded-mix/api/chat"),
            4,
            Duration::from_secs(1),
        )
        .group(TestGroup::new("capped", vec![chat("capped")]));

        let report = LoadTest::http(plan, Vec::<FinalReport>::new()).unwrap().await.unwrap().remove(0);

        // A burst of 5 plus 5/s refill succeed; the rest get a 503.
        assert!(report.total_requests_sent > 10);
        assert!(report.requests_per_second > 0.);
        assert!(report.requests_per_second <= 20.);
        assert!(report.error_percent > 0.);
        assert!(report.error_percent < 100.);
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn slow_server_times_out() {
        init();
        let addr = server().await;

        let mut plan = plan(
            endpoint(addr, "/delay/ms/5000/api/chat"),
            3,
            Duration::from_secs(1),
        )
        .group(TestGroup::new("hung", vec![chat("hung")]));
        plan.config.http_timeout = Duration::from_millis(300);

        let report = LoadTest::http(plan, Vec::<FinalReport>::new()).unwrap().await.unwrap().remove(0);

        // 3 timeouts per user at 300, 600 and 900ms, then one canceled at 1s.
        assert!(report.total_requests_sent >= 9);
        assert!(report.canceled_requests <= 3);
        assert!(report.error_percent >= 70.);
        assert_eq!(report.requests_per_second, 0.);
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn shutdown_stops_after_current_group() {
        init();
        let addr = server().await;

        let plan = plan(
            endpoint(addr, "/delay/ms/20/api/chat"),
            2,
            Duration::from_secs(60),
        )
        .group(TestGroup::new("first", vec![chat("first")]))
        .group(TestGroup::new("second", vec![chat("second")]));

        let test = LoadTest::http(plan, Vec::<FinalReport>::new()).unwrap();
        let shutdown = test.shutdown_token();
        let handle = tokio::spawn(test.into_future());

        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.cancel();

        let reports = handle.await.unwrap().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].model, "first");
        assert!(reports[0].total_requests_sent > 0);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn invalid_plan_is_rejected() {
        let addr = server().await;

        let empty = plan(endpoint(addr, "/api/chat"), 1, Duration::from_secs(1));
        let err = LoadTest::http(empty, Vec::<FinalReport>::new()).unwrap().await.unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::NoGroups)));

        let clash = plan(endpoint(addr, "/api/chat"), 1, Duration::from_secs(1))
            .group(TestGroup::new("llama3.1:latest", vec![chat("llama3.1:latest")]))
            .group(TestGroup::new("llama3.1/latest", vec![chat("llama3.1/latest")]));
        let err = LoadTest::http(clash, Vec::<FinalReport>::new()).unwrap().await.unwrap_err();
        assert!(matches!(
            err,
            RunError::Config(ConfigError::ReportNameCollision { .. })
        ));

        let json = r#"{"config": {"virtual_users": 0}, "groups": []}"#;
        let err = TestPlan::from_json(json).unwrap_err();
        assert_eq!(err, ConfigError::InvalidVirtualUsers(0));
    }
}
