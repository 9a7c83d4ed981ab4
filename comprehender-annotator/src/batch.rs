//! Bounded-concurrency request batches.
//!
//! One batch holds the requests for a single file: the class request (if
//! any) followed by one request per method. At most
//! `RequestLimits::max_in_flight` of them run at once, each under its own
//! deadline. Results come back in request order whatever the completion
//! order, and a failed request only empties its own slot.

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

use comprehender_core::MethodRecord;

use crate::config::RequestLimits;
use crate::error::ServiceError;
use crate::service::{AnnotationService, SnippetKind};

/// Comments produced by one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub class_comment: Option<String>,

    /// Parallel to the methods of the batch; `None` where the request failed.
    pub method_comments: Vec<Option<String>>,

    /// Number of requests that failed or timed out.
    pub failures: usize,
}

/// Requests a class comment for `class_snippet` and one comment per method.
pub async fn request_annotations(
    service: &dyn AnnotationService,
    class_snippet: Option<&str>,
    methods: &[MethodRecord],
    limits: &RequestLimits,
) -> BatchResult {
    let gate = Semaphore::new(limits.max_in_flight.max(1));

    let requests: Vec<(&str, SnippetKind)> = class_snippet
        .map(|snippet| (snippet, SnippetKind::Class))
        .into_iter()
        .chain(methods.iter().map(|m| (m.raw_text.as_str(), SnippetKind::Method)))
        .collect();

    let results = join_all(
        requests
            .iter()
            .map(|&(snippet, kind)| limited_request(service, &gate, snippet, kind, limits)),
    )
    .await;

    let mut failures = 0;
    let mut comments: Vec<Option<String>> = results
        .into_iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Annotation request {} failed: {}", index, e);
                failures += 1;
                None
            }
        })
        .collect();

    let class_comment = if class_snippet.is_some() && !comments.is_empty() {
        comments.remove(0)
    } else {
        None
    };

    debug!(
        "Batch of {} requests finished with {} failures",
        requests.len(),
        failures
    );

    BatchResult {
        class_comment,
        method_comments: comments,
        failures,
    }
}

async fn limited_request(
    service: &dyn AnnotationService,
    gate: &Semaphore,
    snippet: &str,
    kind: SnippetKind,
    limits: &RequestLimits,
) -> Result<String, ServiceError> {
    let _permit = gate
        .acquire()
        .await
        .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

    match timeout(limits.timeout, service.generate(snippet, kind)).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout(limits.timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Echoes the snippet, sleeping longer for earlier method indices so
    /// completions arrive in reverse order.
    struct EchoService;

    #[async_trait]
    impl AnnotationService for EchoService {
        async fn generate(&self, snippet: &str, kind: SnippetKind) -> Result<String, ServiceError> {
            let n: u64 = snippet.trim_start_matches('m').parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(n * 10))).await;
            Ok(format!("/** {} {} */", kind, snippet))
        }
    }

    /// Fails every method snippet equal to `fail_on`.
    struct FailingService {
        fail_on: &'static str,
    }

    #[async_trait]
    impl AnnotationService for FailingService {
        async fn generate(&self, snippet: &str, _kind: SnippetKind) -> Result<String, ServiceError> {
            if snippet == self.fail_on {
                Err(ServiceError::Unavailable("quota".to_string()))
            } else {
                Ok(format!("/** {} */", snippet))
            }
        }
    }

    /// Tracks the highest number of concurrent calls.
    #[derive(Default)]
    struct CountingService {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl AnnotationService for CountingService {
        async fn generate(&self, _snippet: &str, _kind: SnippetKind) -> Result<String, ServiceError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok("/** ok */".to_string())
        }
    }

    /// Sleeps on snippets named `slow`.
    struct SlowService;

    #[async_trait]
    impl AnnotationService for SlowService {
        async fn generate(&self, snippet: &str, _kind: SnippetKind) -> Result<String, ServiceError> {
            if snippet == "slow" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(format!("/** {} */", snippet))
        }
    }

    fn methods(snippets: &[&str]) -> Vec<MethodRecord> {
        snippets
            .iter()
            .enumerate()
            .map(|(i, s)| MethodRecord::new(i * 2, format!("method{}", i), *s))
            .collect()
    }

    #[tokio::test]
    async fn test_results_keep_request_order() {
        let methods = methods(&["m0", "m1", "m2", "m3"]);

        let result = request_annotations(
            &EchoService,
            Some("class"),
            &methods,
            &RequestLimits::default(),
        )
        .await;

        assert_eq!(result.class_comment.as_deref(), Some("/** class class */"));
        assert_eq!(
            result.method_comments,
            vec![
                Some("/** method m0 */".to_string()),
                Some("/** method m1 */".to_string()),
                Some("/** method m2 */".to_string()),
                Some("/** method m3 */".to_string()),
            ]
        );
        assert_eq!(result.failures, 0);
    }

    #[tokio::test]
    async fn test_failure_only_empties_its_slot() {
        let methods = methods(&["a", "b", "c"]);
        let service = FailingService { fail_on: "b" };

        let result = request_annotations(&service, None, &methods, &RequestLimits::default()).await;

        assert_eq!(result.class_comment, None);
        assert_eq!(
            result.method_comments,
            vec![Some("/** a */".to_string()), None, Some("/** c */".to_string())]
        );
        assert_eq!(result.failures, 1);
    }

    #[tokio::test]
    async fn test_failed_class_request_keeps_method_positions() {
        let methods = methods(&["a", "b"]);
        let service = FailingService { fail_on: "class body" };

        let result =
            request_annotations(&service, Some("class body"), &methods, &RequestLimits::default())
                .await;

        assert_eq!(result.class_comment, None);
        assert_eq!(
            result.method_comments,
            vec![Some("/** a */".to_string()), Some("/** b */".to_string())]
        );
    }

    #[tokio::test]
    async fn test_in_flight_requests_are_bounded() {
        let snippets: Vec<String> = (0..12).map(|i| format!("m{}", i)).collect();
        let refs: Vec<&str> = snippets.iter().map(String::as_str).collect();
        let methods = methods(&refs);
        let service = CountingService::default();
        let limits = RequestLimits {
            max_in_flight: 3,
            timeout: Duration::from_secs(5),
        };

        let result = request_annotations(&service, Some("class"), &methods, &limits).await;

        assert_eq!(result.method_comments.len(), 12);
        assert!(result.class_comment.is_some());
        assert_eq!(service.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let methods = methods(&["fast", "slow"]);
        let limits = RequestLimits {
            max_in_flight: 10,
            timeout: Duration::from_millis(50),
        };

        let result = request_annotations(&SlowService, None, &methods, &limits).await;

        assert_eq!(
            result.method_comments,
            vec![Some("/** fast */".to_string()), None]
        );
        assert_eq!(result.failures, 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let result = request_annotations(&EchoService, None, &[], &RequestLimits::default()).await;

        assert_eq!(result, BatchResult::default());
    }
}
