mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use stampede::prelude::*;
    use std::time::Duration;

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn mock_server_is_alive() {
        let addr = server().await;
        let body = reqwest::get(format!("http://{addr}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "Ollama is running");
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn chat_request_succeeds() {
        let addr = server().await;
        let transport = HttpTransport::new(&endpoint(addr, "/api/chat")).unwrap();

        transport.send(&chat("llama3.1:latest")).await.unwrap();
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn error_status_is_a_failure() {
        let addr = server().await;
        let transport = HttpTransport::new(&endpoint(addr, "/status/503/api/chat")).unwrap();

        let err = transport.send(&chat("llama3.1:latest")).await.unwrap_err();
        assert_eq!(err, TransportError::Status(503));
        assert_eq!(err.category(), "status");
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn slow_response_times_out() {
        let addr = server().await;
        let transport = HttpTransport::new(&endpoint(addr, "/delay/ms/2000/api/chat")).unwrap();
        let executor = RequestExecutor::new(transport);

        let outcome = executor
            .execute(&chat("llama3.1:latest"), Duration::from_millis(200))
            .await;
        assert_eq!(
            outcome,
            Outcome::Failure(TransportError::Timeout(Duration::from_millis(200)))
        );
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn latency_covers_server_delay() {
        let addr = server().await;
        let transport = HttpTransport::new(&endpoint(addr, "/delay/ms/150/api/chat")).unwrap();
        let executor = RequestExecutor::new(transport);

        match executor
            .execute(&chat("llama3.1:latest"), Duration::from_secs(5))
            .await
        {
            Outcome::Success { latency } => assert!(latency >= Duration::from_millis(150)),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn probe_reports_reachability() {
        let addr = server().await;
        let transport = HttpTransport::new(&endpoint(addr, "/api/chat")).unwrap();

        assert_eq!(transport.probe().await, Ok(200));
        transport.log_reachability().await;
        assert!(logs_contain("is reachable"));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn unreachable_target_is_only_a_warning() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HttpTransport::new(&Endpoint::new("127.0.0.1", port)).unwrap();

        assert!(matches!(
            transport.probe().await,
            Err(TransportError::Connect(_))
        ));
        transport.log_reachability().await;
        assert!(logs_contain("is not reachable"));
    }
}
