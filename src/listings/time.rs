use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone};

use super::types::ListingRecord;

const TODAY_MARKER: &str = "heute";
const YESTERDAY_MARKER: &str = "gestern";

/// Resolve one of the source's date strings against `now`, in `now`'s
/// timezone. In priority order:
///
/// 1. contains "Heute" and a clock time -> today at that time, seconds zero
/// 2. contains "Gestern" -> yesterday, clock time if present else midnight
/// 3. `D.M.YYYY` -> that date at midnight
///
/// Anything else (including a bare "Heute" without a clock time) is
/// unparseable and yields `None`. Callers keep such records but sort them
/// last; never fail, never drop.
pub fn parse<Tz: TimeZone>(raw: &str, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    let tz = now.timezone();

    if lower.contains(TODAY_MARKER) {
        let (hour, minute) = find_clock_time(&lower)?;
        return at_local(&tz, now.date_naive(), hour, minute);
    }

    if lower.contains(YESTERDAY_MARKER) {
        let (hour, minute) = find_clock_time(&lower).unwrap_or((0, 0));
        return at_local(&tz, now.date_naive() - Duration::days(1), hour, minute);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d.%m.%Y") {
        return at_local(&tz, date, 0, 0);
    }

    None
}

/// Order candidates newest first. Unparseable timestamps sink to the end;
/// ties keep their fetch order (the sort is stable).
pub fn sort_newest_first(records: &mut [ListingRecord]) {
    records.sort_by(|a, b| b.parsed_timestamp.cmp(&a.parsed_timestamp));
}

fn at_local<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        // DST transitions: fold to the earlier instant, skip the gap
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

/// First `H:MM`/`HH:MM` group in the string, if any.
fn find_clock_time(s: &str) -> Option<(u32, u32)> {
    let bytes = s.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b':' {
            continue;
        }
        let mut start = i;
        while start > 0 && i - start < 2 && bytes[start - 1].is_ascii_digit() {
            start -= 1;
        }
        if start == i {
            continue;
        }
        if i + 3 > bytes.len() || !bytes[i + 1].is_ascii_digit() || !bytes[i + 2].is_ascii_digit() {
            continue;
        }
        let hour = s[start..i].parse().ok()?;
        let minute = s[i + 1..i + 3].parse().ok()?;
        return Some((hour, minute));
    }
    None
}
