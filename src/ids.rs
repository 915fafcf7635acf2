/// Identifier generation for entries without a natural key
///
/// Albums, contact entries and locations live inside other documents and
/// never get a database-assigned identifier, so they carry one of these.
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

/// Width of the base36 timestamp prefix (covers millisecond times well past year 5000)
const TIMESTAMP_WIDTH: usize = 9;

/// Length of the random suffix
const RANDOM_LEN: usize = 8;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a new identifier
///
/// Format: zero-padded base36 millisecond timestamp followed by a random
/// lowercase alphanumeric suffix. Identifiers sort approximately by
/// creation time; two calls in the same millisecond differ by the suffix.
pub fn new_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!("{}{}", encode_base36(millis, TIMESTAMP_WIDTH), suffix)
}

fn encode_base36(mut value: u64, width: usize) -> String {
    let mut digits = Vec::with_capacity(width);
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    while digits.len() < width {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
