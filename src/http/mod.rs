pub mod client;
pub mod error;
pub mod method;
pub mod response;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use error::HttpError;
pub use method::HttpMethod;
pub use response::HttpResponse;
