//! Per-request context injected by the request-id middleware.

#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Server-assigned id, echoed in `x-request-id`.
    pub request_id: String,
}
