/// Read-through caching for catalog lookups.
///
/// With `Some(cache)`, a hit is returned directly; a miss runs the block,
/// queues the result for a background write and returns it. A failed cache
/// read is logged and treated as a miss. With `None` the block simply runs.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`.
/// * `$key`: the `CacheKey` of the value.
/// * `$ttl`: time-to-live of the stored value in seconds.
/// * `$block`: future computing the value, resolving to `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let movie = cached!(self.cache.as_ref(), CacheKey::MovieDetails { .. }, ttl, async move {
///     fetch_details().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache {
            Some(cache) => {
                let key = $key;
                match cache.get_from_cache(&key).await {
                    Ok(Some(hit)) => Ok(hit),
                    outcome => {
                        if let Err(e) = outcome {
                            tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                        }
                        let value = $block.await?;
                        cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                }
            }
            None => $block.await,
        }
    }};
}
