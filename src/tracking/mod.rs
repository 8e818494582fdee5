//! Typed view of the request sets stored in the queue.

mod request;
mod request_set;

pub use request::{Request, VISITOR_ID_HEX_LEN};
pub use request_set::RequestSet;
