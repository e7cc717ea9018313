/// Read-through caching for provider lookups.
///
/// `$cache` is an `Option<&Cache>`; with `None` the block always runs. On a
/// hit the cached value is returned without running the block. On a miss the
/// block runs, and a successful value is queued for a background write with
/// `$ttl` seconds to live. Errors from the block are propagated with `?` and
/// never cached. Cache read failures count as misses.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache.as_ref(), CacheKey::Poster(title.to_string()), POSTER_CACHE_TTL, async move {
///     fetch_from_api(title).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cache: Option<&$crate::store::Cache> = $cache;
        let key = $key;

        let hit = match cache {
            Some(cache) => cache.lookup(&key).await,
            None => None,
        };

        if let Some(hit) = hit {
            Ok(hit)
        } else {
            let value = $block.await?;
            if let Some(cache) = cache {
                cache.set_in_background(&key, &value, $ttl);
            }
            Ok(value)
        }
    }};
}
