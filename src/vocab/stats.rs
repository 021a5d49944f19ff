use chrono::{DateTime, FixedOffset, Local, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use super::word::Word;

/// Streak is not derived from activity history yet.
pub const PLACEHOLDER_STREAK_DAYS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub words_today: usize,
    pub streak: u32,
    pub total_words: usize,
    pub mastered_words: usize,
}

impl ProgressStats {
    pub fn compute(all: &[Word], today: &[Word]) -> Self {
        Self {
            words_today: today.len(),
            streak: PLACEHOLDER_STREAK_DAYS,
            total_words: all.len(),
            mastered_words: all.iter().filter(|word| word.is_mastered()).count(),
        }
    }

    pub fn mastery_rate(&self) -> u32 {
        mastery_rate(self.mastered_words, self.total_words)
    }
}

/// Percentage of mastered words, rounded half away from zero. Zero for an empty list.
pub fn mastery_rate(mastered: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((mastered as f64 / total as f64) * 100.0).round() as u32
}

/// Where "today" starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    Local,
    Fixed(FixedOffset),
}

impl DayBoundary {
    pub fn today_start(&self) -> DateTime<Utc> {
        match self {
            DayBoundary::Local => day_start(&Local::now()),
            DayBoundary::Fixed(offset) => day_start(&Utc::now().with_timezone(offset)),
        }
    }

    /// Parses `+09:00`, `-05:30` or `Z`.
    pub fn parse_offset(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return FixedOffset::east_opt(0).map(DayBoundary::Fixed);
        }

        let (sign, rest) = match trimmed.as_bytes().first()? {
            b'+' => (1, &trimmed[1..]),
            b'-' => (-1, &trimmed[1..]),
            _ => return None,
        };
        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
        let hours: i32 = hours.parse().ok()?;
        let minutes: i32 = minutes.parse().ok()?;
        if hours > 23 || minutes > 59 {
            return None;
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(DayBoundary::Fixed)
    }
}

/// Midnight of `now`'s calendar date in its own zone, as a UTC instant.
pub fn day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Zones that skip midnight: fall back to the UTC reading of the same wall time.
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

pub fn count_since(words: &[Word], since: DateTime<Utc>) -> usize {
    words.iter().filter(|word| word.created_at >= since).count()
}
