/// Tower Layer integration, for clients built as Tower services
use crate::breaker::CircuitBreaker;
use crate::error::CircuitBreakerError;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Circuit Breaker Layer for Tower services
#[derive(Clone)]
pub struct CircuitBreakerLayer {
    circuit_breaker: Arc<CircuitBreaker>,
}

impl CircuitBreakerLayer {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self { circuit_breaker }
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreakerService<S>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreakerService {
            inner: service,
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreakerService<S> {
    inner: S,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl<S, Request> Service<Request> for CircuitBreakerService<S>
where
    S: Service<Request> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = CircuitBreakerError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(CircuitBreakerError::Operation)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let circuit_breaker = self.circuit_breaker.clone();
        // Take the instance that was polled ready, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { circuit_breaker.execute(|| inner.call(req)).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitState;
    use crate::config::CircuitBreakerConfig;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tower::ServiceExt;

    #[derive(Clone)]
    struct MockService {
        counter: Arc<AtomicU32>,
        fail_until: u32,
    }

    impl Service<()> for MockService {
        type Response = String;
        type Error = String;
        type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: ()) -> Self::Future {
            let count = self.counter.fetch_add(1, Ordering::SeqCst);
            let fail_until = self.fail_until;

            Box::pin(async move {
                if count < fail_until {
                    Err("Service error".to_string())
                } else {
                    Ok("Success".to_string())
                }
            })
        }
    }

    #[tokio::test]
    async fn test_circuit_breaker_layer() {
        let counter = Arc::new(AtomicU32::new(0));
        let mock_service = MockService {
            counter: counter.clone(),
            fail_until: 3,
        };

        let circuit_breaker = Arc::new(
            CircuitBreaker::new(CircuitBreakerConfig::named("mock").with_failure_threshold(2))
                .unwrap(),
        );
        let layer = CircuitBreakerLayer::new(circuit_breaker.clone());

        let mut service = layer.layer(mock_service);

        // First 2 calls fail
        let _ = service.ready().await.unwrap().call(()).await;
        let _ = service.ready().await.unwrap().call(()).await;
        assert_eq!(circuit_breaker.state(), CircuitState::Open);

        // Circuit should be open now, inner service untouched
        let result = service.ready().await.unwrap().call(()).await;
        assert!(matches!(result, Err(CircuitBreakerError::Open(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_layer_passes_response_through() {
        let mock_service = MockService {
            counter: Arc::new(AtomicU32::new(0)),
            fail_until: 0,
        };
        let circuit_breaker =
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::named("mock")).unwrap());

        let response = CircuitBreakerLayer::new(circuit_breaker.clone())
            .layer(mock_service)
            .oneshot(())
            .await
            .unwrap();

        assert_eq!(response, "Success");
        assert_eq!(circuit_breaker.stats().success_count, 1);
    }
}
