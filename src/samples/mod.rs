//! Fetching, caching and decoding of sampled pads (the hi-hat).

pub mod cache;
pub mod decode;
pub mod fetch;

pub use cache::SampleCache;
pub use decode::decode;
pub use fetch::fetch_bytes;

use tracing::{info, warn};

use crate::dsp::buffer::SampleBuffer;
use crate::error::SampleError;

/// Fetch (through `cache` when given) and decode the asset at `url`.
pub async fn load_sample(
    client: &reqwest::Client,
    cache: Option<&SampleCache>,
    url: &str,
) -> Result<SampleBuffer, SampleError> {
    let bytes = match cache {
        Some(cache) => cache.load_or_fetch(client, url).await,
        None => fetch_bytes(client, url).await,
    }
    .inspect_err(|e| warn!(url, error = %e, "sample fetch failed"))?;

    let buffer = decode(&bytes).inspect_err(|e| warn!(url, error = %e, "sample decode failed"))?;
    info!(
        url,
        sample_rate = buffer.sample_rate,
        channels = buffer.channel_count(),
        seconds = buffer.duration(),
        "sample loaded"
    );
    Ok(buffer)
}
