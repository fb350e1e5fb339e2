use super::error::PipelineError;
use super::request::{TransportRequest, UserinfoRequest};
use super::response::UserinfoResponse;

/// Per-request state shared between the pipeline stages and the transport.
///
/// Holds the normalized request and the response once they exist, plus the payload
/// that was actually written. At most one payload is ever written.
#[derive(Debug)]
pub struct UserinfoExchange {
    transport: TransportRequest,
    request: Option<UserinfoRequest>,
    response: Option<UserinfoResponse>,
    sent: Option<UserinfoResponse>,
}

impl UserinfoExchange {
    pub fn new(transport: TransportRequest) -> Self {
        Self {
            transport,
            request: None,
            response: None,
            sent: None,
        }
    }

    pub fn transport(&self) -> &TransportRequest {
        &self.transport
    }

    pub fn request(&self) -> Option<&UserinfoRequest> {
        self.request.as_ref()
    }

    pub fn set_request(&mut self, request: UserinfoRequest) {
        self.request = Some(request);
    }

    /// The response built by the pipeline, before the apply hook ran.
    pub fn response(&self) -> Option<&UserinfoResponse> {
        self.response.as_ref()
    }

    pub fn set_response(&mut self, response: UserinfoResponse) {
        self.response = Some(response);
    }

    /// Write the payload to the transport.
    pub fn send(&mut self, response: UserinfoResponse) -> Result<(), PipelineError> {
        if self.sent.is_some() {
            return Err(PipelineError::AlreadySent);
        }
        self.sent = Some(response);
        Ok(())
    }

    pub fn sent(&self) -> Option<&UserinfoResponse> {
        self.sent.as_ref()
    }

    pub fn into_sent(self) -> Option<UserinfoResponse> {
        self.sent
    }
}
