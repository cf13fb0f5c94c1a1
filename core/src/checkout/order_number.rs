// dropline/src/checkout/order_number.rs

//! Customer-facing order numbers.
//!
//! A candidate is the current time in milliseconds (base 36) followed by a random
//! base-36 suffix, e.g. `M2F9K3QZ7XB4Q`. Candidates are not unique by construction;
//! the store's unique constraint is the authority and the commit retries on collision.

use chrono::Utc;
use rand_core::{OsRng, RngCore};

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub trait OrderNumberGenerator: Send + Sync {
  fn next_number(&self) -> String;
}

/// Time component plus `suffix_len` random characters.
#[derive(Debug, Clone)]
pub struct TimeRandomOrderNumbers {
  suffix_len: usize,
}

impl TimeRandomOrderNumbers {
  pub fn new(suffix_len: usize) -> Self {
    Self { suffix_len }
  }
}

impl Default for TimeRandomOrderNumbers {
  fn default() -> Self {
    Self::new(5)
  }
}

impl OrderNumberGenerator for TimeRandomOrderNumbers {
  fn next_number(&self) -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let mut number = to_base36(millis);
    for _ in 0..self.suffix_len {
      let idx = (OsRng.next_u32() % 36) as usize;
      number.push(ALPHABET[idx] as char);
    }
    number
  }
}

pub(crate) fn to_base36(mut n: u64) -> String {
  if n == 0 {
    return "0".to_string();
  }
  let mut digits = Vec::new();
  while n > 0 {
    digits.push(ALPHABET[(n % 36) as usize]);
    n /= 36;
  }
  digits.reverse();
  String::from_utf8(digits).unwrap_or_default()
}
