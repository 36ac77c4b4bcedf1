use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use sqlx::PgPool;
use tracing::debug;

/// Mints a 6-digit one-time code, uniform over 100000..=999999.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Ephemeral keyed store for pending OTP challenges, one live code per email.
///
/// `verify_and_evict` is the whole contract: absent or expired codes read as
/// false (expired ones are evicted on the spot), a mismatched live code is
/// kept so the user may retry inside the window, and a matching live code is
/// consumed atomically so it can never be spent twice.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Stores `code` for `email`, replacing any previous record.
    async fn put(&self, email: &str, code: &str, ttl: Duration) -> anyhow::Result<()>;

    async fn verify_and_evict(&self, email: &str, code: &str) -> anyhow::Result<bool>;

    /// Rollback hook: discards the pending code after a failed delivery.
    async fn remove(&self, email: &str) -> anyhow::Result<()>;
}

/// Production binding: Postgres-backed keyed store, durable across restarts
/// and shared between instances. Expired rows are evicted lazily at read
/// time; no sweeper runs.
pub struct PgOtpStore {
    db: PgPool,
}

impl PgOtpStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OtpStore for PgOtpStore {
    async fn put(&self, email: &str, code: &str, ttl: Duration) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (email, code, expires_at)
            VALUES ($1, $2, now() + make_interval(secs => $3))
            ON CONFLICT (email) DO UPDATE
            SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at, created_at = now()
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(ttl.as_secs_f64())
        .execute(&self.db)
        .await?;
        debug!(email = %email, "otp stored");
        Ok(())
    }

    async fn verify_and_evict(&self, email: &str, code: &str) -> anyhow::Result<bool> {
        // Expired rows must read as absent even before eviction.
        sqlx::query("DELETE FROM otp_codes WHERE email = $1 AND expires_at <= now()")
            .bind(email)
            .execute(&self.db)
            .await?;

        // A single conditional DELETE is the atomic verify-and-evict: two
        // racing verifies cannot both observe the row.
        let result = sqlx::query(
            "DELETE FROM otp_codes WHERE email = $1 AND code = $2 AND expires_at > now()",
        )
        .bind(email)
        .bind(code)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, email: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM otp_codes WHERE email = $1")
            .bind(email)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

struct PendingCode {
    code: String,
    expires_at: Instant,
}

/// In-memory binding with the same semantics, scoped to the instance. Used
/// by tests and never shared process-globally.
#[derive(Default)]
pub struct MemoryOtpStore {
    codes: Mutex<HashMap<String, PendingCode>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live (non-expired) code is pending for `email`.
    pub fn contains(&self, email: &str) -> bool {
        let codes = self.codes.lock().expect("otp store mutex poisoned");
        codes
            .get(email)
            .map(|pending| pending.expires_at > Instant::now())
            .unwrap_or(false)
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn put(&self, email: &str, code: &str, ttl: Duration) -> anyhow::Result<()> {
        let mut codes = self.codes.lock().expect("otp store mutex poisoned");
        codes.insert(
            email.to_string(),
            PendingCode {
                code: code.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn verify_and_evict(&self, email: &str, code: &str) -> anyhow::Result<bool> {
        // One guard for the whole check-then-mutate.
        let mut codes = self.codes.lock().expect("otp store mutex poisoned");
        let Some(pending) = codes.get(email) else {
            return Ok(false);
        };
        if pending.expires_at <= Instant::now() {
            codes.remove(email);
            return Ok(false);
        }
        if pending.code != code {
            return Ok(false);
        }
        codes.remove(email);
        Ok(true)
    }

    async fn remove(&self, email: &str) -> anyhow::Result<()> {
        let mut codes = self.codes.lock().expect("otp store mutex poisoned");
        codes.remove(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn correct_code_verifies_exactly_once() {
        let store = MemoryOtpStore::new();
        store.put("a@x.com", "123456", TTL).await.unwrap();
        assert!(store.verify_and_evict("a@x.com", "123456").await.unwrap());
        // Single use: the same code is dead immediately after.
        assert!(!store.verify_and_evict("a@x.com", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn mismatch_keeps_the_code_verifiable() {
        let store = MemoryOtpStore::new();
        store.put("a@x.com", "123456", TTL).await.unwrap();
        assert!(!store.verify_and_evict("a@x.com", "000000").await.unwrap());
        assert!(store.verify_and_evict("a@x.com", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn absent_email_verifies_false() {
        let store = MemoryOtpStore::new();
        assert!(!store.verify_and_evict("ghost@x.com", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn expired_code_reads_as_absent_and_is_evicted() {
        let store = MemoryOtpStore::new();
        store
            .put("a@x.com", "123456", Duration::from_millis(0))
            .await
            .unwrap();
        assert!(!store.verify_and_evict("a@x.com", "123456").await.unwrap());
        assert!(!store.contains("a@x.com"));
    }

    #[tokio::test]
    async fn reissue_overwrites_the_previous_code() {
        let store = MemoryOtpStore::new();
        store.put("a@x.com", "111111", TTL).await.unwrap();
        store.put("a@x.com", "222222", TTL).await.unwrap();
        assert!(!store.verify_and_evict("a@x.com", "111111").await.unwrap());
        assert!(store.verify_and_evict("a@x.com", "222222").await.unwrap());
    }

    #[tokio::test]
    async fn remove_discards_the_pending_code() {
        let store = MemoryOtpStore::new();
        store.put("a@x.com", "123456", TTL).await.unwrap();
        store.remove("a@x.com").await.unwrap();
        assert!(!store.verify_and_evict("a@x.com", "123456").await.unwrap());
    }
}
