use chrono::{DateTime, SubsecRound, Utc};

/// Flow aggregate
pub mod flow;

/// Work order aggregate and its status machine
pub mod work_order;

/// Lifecycle events and the bus envelope
pub mod events;

/// Repository interfaces
pub mod repository;

/// Current UTC time at the store's microsecond resolution
pub fn utc_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly later than `previous`, normally the current time
pub fn utc_now_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = utc_now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}
