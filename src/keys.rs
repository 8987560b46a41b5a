//! Short key generation

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqids::Sqids;
use tracing::{debug, warn};

use crate::{config::KeyConfig, database::Database, errors::TrailRecorderError};

/// Random salts are drawn from `0..SALT_RANGE`
pub const SALT_RANGE: u64 = 1000;

/// Issues short keys built from the current second and a random salt.
///
/// Uniqueness comes from the `issued_keys` primary key: a candidate that
/// collides is dropped and a new salt drawn, at most `max_attempts` times.
pub struct KeyGenerator {
    sqids: Sqids,
    max_attempts: u32,
}

impl KeyGenerator {
    pub fn new(config: &KeyConfig) -> Result<Self, TrailRecorderError> {
        config.validate()?;
        let sqids = Sqids::builder().min_length(config.min_length).build()?;
        Ok(Self {
            sqids,
            max_attempts: config.max_attempts,
        })
    }

    /// Encode one candidate key
    pub fn candidate(&self, epoch_secs: u64, salt: u64) -> Result<String, TrailRecorderError> {
        Ok(self.sqids.encode(&[epoch_secs, salt])?)
    }

    /// Recover `[epoch_secs, salt]` from a key issued by this generator
    pub fn decode(&self, key: &str) -> Vec<u64> {
        self.sqids.decode(key)
    }

    /// Issue and reserve a fresh key
    pub async fn next_key(&self, db: &Database) -> Result<String, TrailRecorderError> {
        let epoch_secs = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let mut rng = StdRng::from_os_rng();
        self.next_key_at(db, epoch_secs, &mut rng).await
    }

    pub async fn next_key_at<R: Rng + Send>(
        &self,
        db: &Database,
        epoch_secs: u64,
        rng: &mut R,
    ) -> Result<String, TrailRecorderError> {
        for attempt in 1..=self.max_attempts {
            let salt = rng.random_range(0..SALT_RANGE);
            let candidate = self.candidate(epoch_secs, salt)?;
            if db.reserve_key(&candidate).await? {
                debug!("Issued key {} on attempt {}", candidate, attempt);
                return Ok(candidate);
            }
            debug!("Key {} already taken", candidate);
        }

        warn!("Key generation gave up after {} attempts", self.max_attempts);
        Err(TrailRecorderError::KeyspaceExhausted {
            attempts: self.max_attempts,
        })
    }
}
