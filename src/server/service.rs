use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request, Response};
use tracing::warn;

use super::request::parse_request;
use super::response::{write_handler_response, write_json_error};
use crate::dispatcher::Dispatcher;

/// `may_minihttp` service that feeds every request through a [`Dispatcher`]
///
/// The dispatcher is a frozen snapshot taken when serving starts; routes
/// registered afterwards are not seen.
#[derive(Clone)]
pub struct AppService {
    dispatcher: Arc<Dispatcher>,
}

impl AppService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = match parse_request(req) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Rejected request with invalid method");
                write_json_error(res, 400, serde_json::json!({ "message": "Invalid method" }));
                return Ok(());
            }
        };
        let response = self.dispatcher.dispatch(&request);
        write_handler_response(res, response);
        Ok(())
    }
}
