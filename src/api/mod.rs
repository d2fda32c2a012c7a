pub mod client;
pub mod error;
pub mod logging;
#[cfg(test)]
pub mod mock_client;
pub mod stream;
pub mod transport;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use transport::{ByteStream, ChatTransport};
