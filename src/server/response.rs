use may_minihttp::Response;
use serde_json::Value;

use crate::dispatcher::HandlerResponse;

/// Canonical reason phrase for `status`
///
/// `may_minihttp` only accepts `'static` reason phrases, so custom status text
/// on a [`HandlerResponse`] is not written to the wire.
fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Write a pipeline response.
///
/// String bodies are sent as `text/plain`, everything else as JSON.
pub fn write_handler_response(res: &mut Response, resp: HandlerResponse) {
    res.status_code(resp.status as usize, status_reason(resp.status));
    match resp.body {
        Value::String(s) => {
            res.header("Content-Type: text/plain");
            res.body_vec(s.into_bytes());
        }
        Value::Null if resp.status == 204 => {}
        other => write_json_body(res, &other),
    }
}

/// Write a JSON error without going through the pipeline
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    write_json_body(res, &body);
}

fn write_json_body(res: &mut Response, body: &Value) {
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}
