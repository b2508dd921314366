use std::sync::Mutex;

use chrono::Utc;
use rand::Rng;

// Ordered so that byte-wise comparison of ids matches generation order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

pub const PUSH_ID_LEN: usize = TIME_CHARS + RANDOM_CHARS;

#[derive(Debug, Default)]
struct PushState {
    last_time: i64,
    last_random: [u8; RANDOM_CHARS],
}

/// Generates 20-character child keys that sort in creation order.
///
/// The first 8 characters encode the millisecond timestamp, the last 12 are random.
/// Two keys generated within the same millisecond reuse the previous random part
/// incremented by one, so keys from one generator are strictly increasing.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self) -> String {
        self.generate_at(Utc::now().timestamp_millis())
    }

    pub fn generate_at(&self, now_ms: i64) -> String {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // A clock that steps backwards must not break ordering.
        let now = now_ms.max(guard.last_time);
        if now == guard.last_time && guard.last_time != 0 {
            increment(&mut guard.last_random);
        } else {
            let mut rng = rand::rng();
            for slot in guard.last_random.iter_mut() {
                *slot = rng.random_range(0..64u8);
            }
        }
        guard.last_time = now;

        let mut out = String::with_capacity(PUSH_ID_LEN);
        let mut remaining = now.max(0) as u64;
        let mut time_chars = [0u8; TIME_CHARS];
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        out.extend(time_chars.iter().map(|&c| c as char));
        out.extend(
            guard
                .last_random
                .iter()
                .map(|&idx| PUSH_CHARS[idx as usize] as char),
        );
        out
    }
}

fn increment(random: &mut [u8; RANDOM_CHARS]) {
    for slot in random.iter_mut().rev() {
        if *slot == 63 {
            *slot = 0;
        } else {
            *slot += 1;
            return;
        }
    }
}
