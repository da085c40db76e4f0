use std::io::Read;
use std::sync::Arc;

use http::Method;
use may_minihttp::Request;
use tracing::{debug, info};

use crate::dispatcher::{HandlerRequest, HeaderVec};
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Convert a raw `may_minihttp` request into a [`HandlerRequest`].
///
/// Header names are lower-cased, the query string is split off and decoded,
/// and the body is read fully into memory.
///
/// # Errors
///
/// Returns the method parse error when the request line carries a method
/// token `http` rejects.
pub fn parse_request(req: Request) -> Result<HandlerRequest, http::method::InvalidMethod> {
    let method = Method::from_bytes(req.method().as_bytes())?;
    let target = req.path().to_string();

    // R1: Headers extracted
    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase()),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();
    debug!(header_count = headers.len(), "Headers extracted");

    let request_id = RequestId::from_header_or_new(
        headers
            .iter()
            .find(|(k, _)| k.as_ref() == REQUEST_ID_HEADER)
            .map(|(_, v)| v.as_str()),
    );

    // R2: Request body read
    let mut body = Vec::new();
    if let Err(e) = req.body().read_to_end(&mut body) {
        debug!(error = %e, "Request body read failed");
        body.clear();
    }

    let mut parsed = HandlerRequest::new(method, &target).with_request_id(request_id);
    parsed.headers = headers;
    parsed.body = body;

    // R3: HTTP request parsed
    info!(
        request_id = %parsed.request_id,
        method = %parsed.method,
        path = %parsed.path,
        query_count = parsed.query_params.len(),
        body_size_bytes = parsed.body.len(),
        "HTTP request parsed"
    );

    Ok(parsed)
}
