//! Branch enumeration and classification.

pub mod picker;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::git::GitRepository;

pub use picker::{BranchPresentation, PickerView, Section, SectionKind, MAX_REGULAR_BRANCHES};

/// Category assigned to branches without a `<prefix>/` namespace.
pub const OTHER_CATEGORY: &str = "other";

/// Display text for branches whose tip commit cannot be found.
pub const UNKNOWN_TIME: &str = "unknown";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// One enumerated branch with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchDescriptor {
    /// Branch name, unique within one enumeration.
    pub name: String,
    /// Epoch seconds of the tip commit, `0` when unknown.
    pub last_commit_epoch_seconds: i64,
    /// Relative time such as `3d ago`, or `unknown`.
    pub last_commit_time_formatted: String,
    /// Text before the first `/`, or [`OTHER_CATEGORY`].
    pub category: String,
}

impl BranchDescriptor {
    /// Builds a descriptor from an optional tip timestamp.
    pub fn new(name: &str, timestamp: Option<i64>, now: DateTime<Utc>) -> Self {
        let (last_commit_epoch_seconds, last_commit_time_formatted) = match timestamp {
            Some(ts) => (ts, format_relative_time(now.timestamp() - ts)),
            None => (0, UNKNOWN_TIME.to_string()),
        };

        Self {
            name: name.to_string(),
            last_commit_epoch_seconds,
            last_commit_time_formatted,
            category: category_of(name).to_string(),
        }
    }
}

/// Returns the namespace of a branch: the text before the first `/`.
pub fn category_of(branch: &str) -> &str {
    match branch.split_once('/') {
        Some((prefix, _)) if !prefix.is_empty() => prefix,
        _ => OTHER_CATEGORY,
    }
}

/// Formats an age in seconds as a coarse relative time.
///
/// Buckets are fixed-length rather than calendar-aware: a week is 7 days, a
/// month 30 and a year 365. Negative ages (clock skew) count as "just now".
pub fn format_relative_time(age_seconds: i64) -> String {
    let age = age_seconds.max(0);
    let days = age / DAY;

    match days {
        0 if age < MINUTE => "just now".to_string(),
        0 if age < HOUR => format!("{}m ago", age / MINUTE),
        0 => format!("{}h ago", age / HOUR),
        1 => "yesterday".to_string(),
        2..=6 => format!("{days}d ago"),
        7..=29 => format!("{}w ago", days / 7),
        30..=364 => format!("{}mo ago", days / 30),
        _ => format!("{}y ago", days / 365),
    }
}

/// Looks up tip commit times for each branch, one git call at a time.
pub async fn describe_branches(
    repo: &GitRepository,
    names: &[String],
    now: DateTime<Utc>,
) -> Vec<BranchDescriptor> {
    let mut descriptors = Vec::with_capacity(names.len());
    for name in names {
        let timestamp = repo.last_commit_timestamp(name).await;
        descriptors.push(BranchDescriptor::new(name, timestamp, now));
    }
    descriptors
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn category_from_prefix() {
        assert_eq!(category_of("feat/login"), "feat");
        assert_eq!(category_of("release/1.0/hotfix"), "release");
        assert_eq!(category_of("main"), "other");
        assert_eq!(category_of("/odd"), "other");
    }

    #[test]
    fn relative_time_boundaries() {
        assert_eq!(format_relative_time(0), "just now");
        assert_eq!(format_relative_time(59), "just now");
        assert_eq!(format_relative_time(60), "1m ago");
        assert_eq!(format_relative_time(59 * MINUTE + 59), "59m ago");
        assert_eq!(format_relative_time(HOUR), "1h ago");
        assert_eq!(format_relative_time(23 * HOUR + 59 * MINUTE), "23h ago");
        assert_eq!(format_relative_time(DAY), "yesterday");
        assert_eq!(format_relative_time(2 * DAY - 1), "yesterday");
        assert_eq!(format_relative_time(2 * DAY), "2d ago");
        assert_eq!(format_relative_time(6 * DAY), "6d ago");
        assert_eq!(format_relative_time(7 * DAY), "1w ago");
        assert_eq!(format_relative_time(29 * DAY), "4w ago");
        assert_eq!(format_relative_time(30 * DAY), "1mo ago");
        assert_eq!(format_relative_time(364 * DAY), "12mo ago");
        assert_eq!(format_relative_time(365 * DAY), "1y ago");
        assert_eq!(format_relative_time(1000 * DAY), "2y ago");
    }

    #[test]
    fn future_timestamps_are_just_now() {
        assert_eq!(format_relative_time(-300), "just now");
    }

    #[test]
    fn descriptor_with_unknown_time() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let descriptor = BranchDescriptor::new("fix/crash", None, now);
        assert_eq!(descriptor.last_commit_epoch_seconds, 0);
        assert_eq!(descriptor.last_commit_time_formatted, "unknown");
        assert_eq!(descriptor.category, "fix");
    }

    #[test]
    fn descriptor_with_known_time() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let three_days_ago = now.timestamp() - 3 * DAY;
        let descriptor = BranchDescriptor::new("main", Some(three_days_ago), now);
        assert_eq!(descriptor.last_commit_epoch_seconds, three_days_ago);
        assert_eq!(descriptor.last_commit_time_formatted, "3d ago");
        assert_eq!(descriptor.category, "other");
    }

    fn bucket_rank(label: &str) -> u8 {
        match label {
            "just now" => 0,
            "yesterday" => 3,
            l if l.ends_with("mo ago") => 6,
            l if l.ends_with("m ago") => 1,
            l if l.ends_with("h ago") => 2,
            l if l.ends_with("d ago") => 4,
            l if l.ends_with("w ago") => 5,
            _ => 7,
        }
    }

    proptest! {
        #[test]
        fn buckets_never_go_backwards(a in 0i64..(3 * 365 * DAY), b in 0i64..(3 * 365 * DAY)) {
            let (younger, older) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                bucket_rank(&format_relative_time(younger)) <= bucket_rank(&format_relative_time(older))
            );
        }

        #[test]
        fn category_is_a_prefix_or_other(name in "[a-z]{0,5}(/[a-z]{1,5}){0,2}") {
            let category = category_of(&name);
            let prefix = format!("{category}/");
            prop_assert!(category == OTHER_CATEGORY || name.starts_with(&prefix));
        }
    }
}
