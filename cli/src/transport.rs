//! Blocking HTTP transport backed by ureq.

use user_core::{ClientConfig, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        // Error statuses come back as responses; the core classifies them.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match req.method {
            HttpMethod::Get => req
                .headers
                .iter()
                .fold(self.agent.get(&req.path), |b, (k, v)| b.header(k.as_str(), v.as_str()))
                .call(),
            HttpMethod::Delete => req
                .headers
                .iter()
                .fold(self.agent.delete(&req.path), |b, (k, v)| b.header(k.as_str(), v.as_str()))
                .call(),
            HttpMethod::Post => {
                let builder = req
                    .headers
                    .iter()
                    .fold(self.agent.post(&req.path), |b, (k, v)| b.header(k.as_str(), v.as_str()));
                match req.body.as_deref() {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| TransportError::Other(err.to_string()))?;
        Ok(HttpResponse { status, headers, body })
    }
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => TransportError::Timeout,
        ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            TransportError::Connect(err.to_string())
        }
        other => TransportError::Other(other.to_string()),
    }
}
