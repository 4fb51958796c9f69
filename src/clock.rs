use time::{Date, OffsetDateTime, UtcOffset};

/// Source of "now". Injected so intake day-window logic is deterministic in
/// tests and so a user's calendar day is computed from their own offset
/// instead of whatever timezone the server happens to run in.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;
}

#[derive(Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Fixed instant, for tests.
#[derive(Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.0
    }
}

/// Calendar day at the user's UTC offset. Offsets outside ±18h fall back to
/// UTC rather than erroring.
pub fn local_day(clock: &dyn Clock, tz_offset_minutes: i32) -> Date {
    let offset = UtcOffset::from_whole_seconds(tz_offset_minutes * 60)
        .unwrap_or(UtcOffset::UTC);
    clock.now_utc().to_offset(offset).date()
}

/// Timestamp of the consumed-food entry, in the user's offset.
pub fn local_now(clock: &dyn Clock, tz_offset_minutes: i32) -> OffsetDateTime {
    let offset = UtcOffset::from_whole_seconds(tz_offset_minutes * 60)
        .unwrap_or(UtcOffset::UTC);
    clock.now_utc().to_offset(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn local_day_follows_user_offset() {
        // 23:30 UTC is already "tomorrow" for UTC+2, still "today" for UTC-5
        let clock = FixedClock(datetime!(2024-03-10 23:30 UTC));
        assert_eq!(
            local_day(&clock, 120),
            time::macros::date!(2024 - 03 - 11)
        );
        assert_eq!(
            local_day(&clock, -300),
            time::macros::date!(2024 - 03 - 10)
        );
        assert_eq!(local_day(&clock, 0), time::macros::date!(2024 - 03 - 10));
    }

    #[test]
    fn absurd_offset_falls_back_to_utc() {
        let clock = FixedClock(datetime!(2024-03-10 12:00 UTC));
        assert_eq!(
            local_day(&clock, 10_000_000),
            time::macros::date!(2024 - 03 - 10)
        );
    }

    #[test]
    fn two_reads_same_instant_agree() {
        let clock = FixedClock(datetime!(2024-06-01 08:00 UTC));
        assert_eq!(local_day(&clock, 60), local_day(&clock, 60));
    }
}
