use chrono::NaiveDate;

/// Lookahead for scheduled maintenance scans.
pub const MAINTENANCE_WINDOW_DAYS: i64 = 30;

/// Lookahead for driver license expiry scans.
pub const LICENSE_WINDOW_DAYS: i64 = 90;

/// Ordered, duplicate-free list of non-negative day offsets at which a
/// reminder fires. An empty set disables the category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThresholdSet(Vec<i64>);

impl ThresholdSet {
    /// Builds a set from raw values, keeping first-seen order and dropping
    /// negatives and repeats.
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        let mut days = Vec::new();
        for value in values {
            if value < 0 {
                tracing::warn!(value, "Ignoring negative reminder threshold");
                continue;
            }
            if days.contains(&value) {
                tracing::warn!(value, "Ignoring duplicate reminder threshold");
                continue;
            }
            days.push(value);
        }
        Self(days)
    }

    /// Parses a comma-separated setting value such as `"30,15,7,3"`.
    pub fn parse(raw: &str) -> Self {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| match part.parse::<i64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(part, "Ignoring non-numeric reminder threshold");
                    None
                }
            });
        Self::new(values)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn should_remind(&self, days_remaining: i64) -> bool {
        should_remind(days_remaining, &self.0)
    }
}

/// Exact-match only: a record qualifies on the single day its remaining
/// day count equals a threshold. A skipped day misses that threshold.
pub fn should_remind(days_remaining: i64, thresholds: &[i64]) -> bool {
    thresholds.contains(&days_remaining)
}

/// Whole days from `today` until `due`; negative once overdue.
pub fn days_remaining(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}
