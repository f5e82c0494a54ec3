use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use super::identity_filter::{IdentityField, identity_key};

/// Keys present here are TAKEN. Absence means "ask the database".
pub static IDENTITY_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn mark_taken(field: IdentityField, value: &str) {
    IDENTITY_CACHE.insert(identity_key(field, value), true).await;
}

pub async fn is_taken(field: IdentityField, value: &str) -> bool {
    IDENTITY_CACHE
        .get(&identity_key(field, value))
        .await
        .unwrap_or(false)
}

pub async fn release(field: IdentityField, value: &str) {
    IDENTITY_CACHE.invalidate(&identity_key(field, value)).await;
}

async fn batch_mark(keys: &[String]) {
    let futures: Vec<_> = keys
        .iter()
        .map(|k| IDENTITY_CACHE.insert(k.clone(), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load identities of RECENT hires into the cache (batched). Recent hires
/// are the rows most likely to be re-entered by mistake.
pub async fn warmup_identity_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT nic, email
        FROM employees
        WHERE join_date >= CURDATE() - INTERVAL ? DAY
        ORDER BY join_date DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size * 2);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (nic, email) = row?;
        batch.push(identity_key(IdentityField::Nic, &nic));
        batch.push(identity_key(IdentityField::Email, &email));
        total_count += 1;

        if batch.len() >= batch_size * 2 {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Identity cache warmup complete: {} recent hires (last {} days)",
        total_count,
        days
    );

    Ok(())
}
