use time::OffsetDateTime;

/// Current UTC timestamp, the single clock source for consent bookkeeping.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}
