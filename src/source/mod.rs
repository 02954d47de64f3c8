//! Sources of raw StopMonitoring responses.
//!
//! The monitor loop does not care where a response body comes from; it asks
//! an [`ArrivalSource`] for the next one, archives it, and parses it. The
//! live source is [`HttpSource`]; [`ArchiveReader`] reads previously
//! archived responses back for replay.

mod archive;
mod http;

pub use archive::{ArchiveReader, ArchiveRecord};
pub use http::HttpSource;

use std::fmt::Debug;

use async_trait::async_trait;
use stopmon_adapters::AdapterError;

/// Trait for fetching raw responses from an upstream.
///
/// Implementations return the response body untouched so that it can be
/// archived verbatim before any parsing happens.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use stopmon::source::ArrivalSource;
/// use stopmon_adapters::AdapterError;
///
/// #[derive(Debug)]
/// struct Canned(&'static str);
///
/// #[async_trait]
/// impl ArrivalSource for Canned {
///     async fn fetch(&mut self) -> Result<Vec<u8>, AdapterError> {
///         Ok(self.0.as_bytes().to_vec())
///     }
///
///     fn description(&self) -> &str {
///         "canned"
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let mut source = Canned("{}");
/// assert_eq!(source.fetch().await.unwrap(), b"{}");
/// # });
/// ```
#[async_trait]
pub trait ArrivalSource: Send + Debug {
    /// Fetch one raw response body.
    ///
    /// Transport failures and non-success statuses are errors; the caller
    /// decides how to recover.
    async fn fetch(&mut self) -> Result<Vec<u8>, AdapterError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
