use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of randomness and wall-clock time for token generation.
///
/// Injected into the services so tests can make every token reproducible.
pub trait Entropy: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn next_u64(&self) -> u64;

    /// Uniform in `[0, 1)`
    fn next_f64(&self) -> f64;

    fn fill_bytes(&self, dest: &mut [u8]);

    /// Short base36 string mixed into every token.
    fn nonce(&self) -> String {
        to_base36(self.next_u64())
    }
}

pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(13);
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Thread-local RNG and the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEntropy;

impl Entropy for SystemEntropy {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn next_u64(&self) -> u64 {
        rand::thread_rng().next_u64()
    }

    fn next_f64(&self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        rand::thread_rng().fill_bytes(dest);
    }
}

/// Seeded RNG and a clock that advances one millisecond per reading.
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
    clock: Mutex<DateTime<Utc>>,
}

impl SeededEntropy {
    pub fn new(seed: u64, start: DateTime<Utc>) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            clock: Mutex::new(start),
        }
    }

    /// Seeded RNG starting at the Unix epoch.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(seed, DateTime::<Utc>::UNIX_EPOCH)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

impl Entropy for SeededEntropy {
    fn now(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().unwrap_or_else(|e| e.into_inner());
        let current = *clock;
        *clock = current + Duration::milliseconds(1);
        current
    }

    fn next_u64(&self) -> u64 {
        self.with_rng(|rng| rng.next_u64())
    }

    fn next_f64(&self) -> f64 {
        self.with_rng(|rng| rng.r#gen::<f64>())
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        self.with_rng(|rng| rng.fill_bytes(dest));
    }
}

impl std::fmt::Debug for SeededEntropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededEntropy").finish_non_exhaustive()
    }
}
