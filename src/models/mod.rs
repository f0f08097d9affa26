//! Persisted domain records

pub mod contact;
pub mod customer;
pub mod menu;
pub mod order;
pub mod reservation;

pub use contact::ContactMessage;
pub use customer::{Customer, PublicCustomer};
pub use menu::{Category, MenuItem, Pricing, Size};
pub use order::{Order, OrderItem, OrderStatus, OrderType, PaymentMethod, PaymentStatus};
pub use reservation::{Reservation, ReservationStatus};

use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp id, strictly increasing within the process.
///
/// Two records created in the same millisecond get consecutive values instead of
/// colliding.
pub fn next_time_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Trimmed, non-empty value or `None`
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn time_ids_are_unique_and_increasing() {
        let ids: Vec<i64> = (0..1000)
            .map(|_| next_time_id().parse().unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(&Some("  x ".into())), Some("x"));
        assert_eq!(non_blank(&Some("   ".into())), None);
        assert_eq!(non_blank(&None), None);
    }
}
