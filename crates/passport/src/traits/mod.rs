use std::future::Future;

use crate::{error::Result, types::EncodedImage};

/// Remote capability that turns a photo into a black/white person mask
/// (subject white, background black).
///
/// Implementations make a single attempt and never retry; callers decide
/// what to do with a failure.
pub trait SegmentationProvider: Send + Sync {
    fn segment(&self, image: &EncodedImage) -> impl Future<Output = Result<EncodedImage>> + Send;
}
