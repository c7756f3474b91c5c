use uuid::Uuid;

/// The three request facts the ingestion pipeline can enrich metadata with
///
/// The pipeline is deliberately decoupled from any transport object: an HTTP
/// layer, a CLI, or a test fixture only has to answer these three questions.
pub trait RequestInfo {
    /// Client address as received from the transport, if any
    fn remote_ip(&self) -> Option<&str>;

    /// Client agent string, if any
    fn user_agent(&self) -> Option<&str>;

    /// Correlation identifier for tracing the request across layers
    fn request_id(&self) -> Option<&str>;
}

/// Plain-value `RequestInfo` carrier for non-HTTP callers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub remote_ip: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
}

impl RequestMeta {
    /// Meta with a freshly generated correlation id
    pub fn generated(remote_ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            remote_ip,
            user_agent,
            request_id: Some(Uuid::new_v4().to_string()),
        }
    }
}

impl RequestInfo for RequestMeta {
    fn remote_ip(&self) -> Option<&str> {
        self.remote_ip.as_deref()
    }

    fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}
