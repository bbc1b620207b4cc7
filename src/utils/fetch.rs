//! Browser network transport for the readiness probe.

use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use web_sys::RequestMode;

use crate::core::Transport;
use crate::core::error::ProbeError;

/// Probes go out as `no-cors`: a dev server that sends no
/// `Access-Control-Allow-Origin` still yields an opaque response instead of
/// a CORS rejection, so reachability is all that is measured.
const READINESS_MODE: RequestMode = RequestMode::NoCors;

/// [`Transport`] over the Fetch API. Any HTTP response, whatever its status
/// (and even when opaque), counts as a successful connection.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    async fn connect(&self, url: &str) -> Result<(), ProbeError> {
        match Request::get(url).mode(READINESS_MODE).send().await {
            Ok(response) => {
                // Opaque responses report status 0.
                log::debug!("{} answered with status {}", url, response.status());
                Ok(())
            }
            Err(gloo_net::Error::JsError(e)) => Err(ProbeError::Connect {
                url: url.to_string(),
                reason: e.message,
            }),
            Err(e) => Err(ProbeError::InvalidRequest(format!("{}: {}", url, e))),
        }
    }

    async fn sleep(&self, millis: u32) {
        TimeoutFuture::new(millis).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_request_ignores_cors() {
        assert_eq!(READINESS_MODE, RequestMode::NoCors);
    }
}
