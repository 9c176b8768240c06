//! Shared HTTP middleware

mod request_id;
mod trace;

pub use request_id::{get_request_id, request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use trace::{CustomMakeSpan, CustomOnResponse};
