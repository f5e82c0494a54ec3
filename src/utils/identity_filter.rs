use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;
use strum_macros::Display;

/// Expected capacity and false-positive rate.
/// Tune these based on real employee counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static IDENTITY_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Employee fields that must be unique across the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum IdentityField {
    Nic,
    Email,
}

/// `nic:199012345678`, `email:kasun@company.lk`
#[inline]
pub fn identity_key(field: IdentityField, value: &str) -> String {
    format!("{}:{}", field, value.trim().to_lowercase())
}

/// Check if an identity might exist (false positives possible)
pub fn might_exist(field: IdentityField, value: &str) -> bool {
    let key = identity_key(field, value);
    match IDENTITY_FILTER.read() {
        Ok(filter) => filter.contains(&key),
        // a poisoned filter can't give a trustworthy negative
        Err(_) => true,
    }
}

pub fn insert(field: IdentityField, value: &str) {
    let key = identity_key(field, value);
    if let Ok(mut filter) = IDENTITY_FILTER.write() {
        filter.add(&key);
    }
}

pub fn remove(field: IdentityField, value: &str) {
    let key = identity_key(field, value);
    if let Ok(mut filter) = IDENTITY_FILTER.write() {
        filter.remove(&key);
    }
}

/// Warm up the filter using streaming + batching
pub async fn warmup_identity_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String, String)>("SELECT nic, email FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size * 2);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (nic, email) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(identity_key(IdentityField::Nic, &nic));
        batch.push(identity_key(IdentityField::Email, &email));
        total += 1;

        if batch.len() >= batch_size * 2 {
            insert_batch(&batch)?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch)?;
    }

    log::info!("Identity filter warmup complete: {} employees", total);
    Ok(())
}

/// Insert a batch of normalized keys
fn insert_batch(keys: &[String]) -> Result<()> {
    let mut filter = IDENTITY_FILTER
        .write()
        .map_err(|_| anyhow!("identity filter poisoned"))?;

    for key in keys {
        filter.add(key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalised_and_namespaced() {
        assert_eq!(identity_key(IdentityField::Nic, " 901234567v "), "nic:901234567v");
        assert_eq!(
            identity_key(IdentityField::Email, "Kasun@Company.LK"),
            "email:kasun@company.lk"
        );
        assert_ne!(
            identity_key(IdentityField::Nic, "x"),
            identity_key(IdentityField::Email, "x")
        );
    }

    #[test]
    fn inserted_values_might_exist_until_removed() {
        insert(IdentityField::Nic, "200045600123");
        assert!(might_exist(IdentityField::Nic, "200045600123"));
        assert!(might_exist(IdentityField::Nic, " 200045600123"));

        remove(IdentityField::Nic, "200045600123");
        assert!(!might_exist(IdentityField::Nic, "200045600123"));
    }
}
