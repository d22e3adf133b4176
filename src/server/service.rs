use super::request::parse_request;
use super::response::{encode_response, write_response, Tidy, WhitespaceTidy};
use crate::dispatcher::Dispatcher;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// `may_minihttp` service that feeds every request to a [`Dispatcher`].
///
/// One clone runs per connection coroutine; all clones share the dispatcher.
#[derive(Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
    /// Applied to `text/html` responses when set.
    pub tidy: Option<Arc<dyn Tidy>>,
    /// Log the wall time of every request at `info`.
    pub benchmark: bool,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            tidy: None,
            benchmark: false,
        }
    }

    /// Enable or disable [`WhitespaceTidy`].
    #[must_use]
    pub fn with_tidy(mut self, enabled: bool) -> Self {
        self.tidy = enabled.then(|| Arc::new(WhitespaceTidy) as Arc<dyn Tidy>);
        self
    }

    #[must_use]
    pub fn with_custom_tidy(mut self, tidy: Arc<dyn Tidy>) -> Self {
        self.tidy = Some(tidy);
        self
    }

    #[must_use]
    pub fn with_benchmark(mut self, enabled: bool) -> Self {
        self.benchmark = enabled;
        self
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let start = Instant::now();
        let request = parse_request(req);
        let request_id = request.request_id;
        let method = request.method.clone();
        let path = request.path.clone();

        let response = self.dispatcher.dispatch(request);
        let encoded = encode_response(response, self.tidy.as_deref());
        let status = encoded.status;
        let body_bytes = encoded.body.len();
        write_response(res, encoded);

        if self.benchmark {
            // A3: Benchmark timing
            info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status,
                body_bytes,
                duration_us = start.elapsed().as_micros() as u64,
                "Request served"
            );
        }
        Ok(())
    }
}
