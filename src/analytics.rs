//! Aggregations over the materialized user list.
//!
//! Every function here is a full scan over a slice the caller already holds.
//! Nothing is cached or maintained incrementally; callers recompute whenever
//! the loaded list changes. Inputs are never mutated.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::user::{NOT_AVAILABLE, UserRecord};

/// Bucket for records whose grouping key is missing or empty.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// How many rows the geographic breakdowns keep.
pub const TOP_LOCATIONS: usize = 10;

/// How many regions the pie chart shows.
pub const PIE_SLICES: usize = 6;

/// One grouping key and the number of records that carry it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub value: usize,
}

/// Count records per key, most frequent first.
///
/// Records whose key is `None` or empty are counted under `"Unknown"`. Ties
/// keep the order in which keys were first encountered. With `limit`, only
/// the first `limit` groups are returned.
///
/// # Examples
/// ```
/// use tulong_admin::analytics::count_by_field;
///
/// let cities = ["Tacloban", "Ormoc", "Tacloban", ""];
/// let counts = count_by_field(&cities, |c| Some(*c), None);
/// assert_eq!(counts[0].name, "Tacloban");
/// assert_eq!(counts[0].value, 2);
/// assert_eq!(counts.len(), 3);
/// ```
pub fn count_by_field<T, F>(items: &[T], key_fn: F, limit: Option<usize>) -> Vec<NameCount>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<NameCount> = Vec::new();

    for item in items {
        let key = key_fn(item)
            .filter(|k| !k.is_empty())
            .unwrap_or(UNKNOWN_GROUP);

        match positions.get(key) {
            Some(&index) => counts[index].value += 1,
            None => {
                positions.insert(key.to_string(), counts.len());
                counts.push(NameCount {
                    name: key.to_string(),
                    value: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.value.cmp(&a.value));
    if let Some(limit) = limit {
        counts.truncate(limit);
    }
    counts
}

/// Records created within `[start, end]`. Unknown creation times never match.
pub fn filter_by_date_range(
    users: &[UserRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<UserRecord> {
    users
        .iter()
        .filter(|user| user.created_at().within(&start, &end))
        .cloned()
        .collect()
}

fn count_in_range(users: &[UserRecord], start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
    users
        .iter()
        .filter(|user| user.created_at().within(&start, &end))
        .count()
}

/// Registrations per local calendar day within `[start, end]`.
///
/// Days without registrations are absent from the map.
pub fn group_by_day(
    users: &[UserRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BTreeMap<NaiveDate, usize> {
    group_by_day_in(users, start, end, &Local)
}

/// [`group_by_day`] with day boundaries taken from `tz`.
pub fn group_by_day_in<Tz: TimeZone>(
    users: &[UserRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    tz: &Tz,
) -> BTreeMap<NaiveDate, usize> {
    let mut days = BTreeMap::new();
    for user in users {
        let Some(instant) = user.created_at().instant() else {
            continue;
        };
        if instant >= start && instant <= end {
            let day = instant.with_timezone(tz).date_naive();
            *days.entry(day).or_insert(0) += 1;
        }
    }
    days
}

/// Sorted distinct non-empty values.
pub fn get_unique_values<T, F>(items: &[T], value_fn: F) -> Vec<String>
where
    F: Fn(&T) -> Option<&str>,
{
    items
        .iter()
        .filter_map(|item| value_fn(item).filter(|v| !v.is_empty()))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Percentage change from `previous` to `current`.
///
/// With no previous activity, any current activity counts as 100% growth.
/// The result is not rounded.
pub fn calculate_growth(current: usize, previous: usize) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    (current as f64 - previous as f64) / previous as f64 * 100.0
}

/// Apply `processor` to consecutive chunks of `batch_size` items.
pub fn batch_process<T, R, F>(items: &[T], batch_size: usize, processor: F) -> Vec<R>
where
    F: FnMut(&[T]) -> R,
{
    items.chunks(batch_size.max(1)).map(processor).collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// First and last instant of `date` in `tz`, as UTC.
fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| date.and_time(Default::default()).and_utc());
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

/// Registrations in one hour of the day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HourCount {
    /// Label such as `"9:00"`.
    pub hour: String,
    pub hour_num: u32,
    pub users: usize,
}

/// Histogram of creation hour across all records, always 24 entries.
pub fn registrations_by_hour<Tz: TimeZone>(
    users: &[UserRecord],
    tz: &Tz,
) -> Vec<HourCount> {
    let mut counts = [0usize; 24];
    for user in users {
        if let Some(instant) = user.created_at().instant() {
            counts[instant.with_timezone(tz).hour() as usize] += 1;
        }
    }

    (0u32..24)
        .map(|hour| HourCount {
            hour: format!("{hour}:00"),
            hour_num: hour,
            users: counts[hour as usize],
        })
        .collect()
}

/// The busiest hour; the earliest one wins a tie.
pub fn peak_hour(hours: &[HourCount]) -> Option<&HourCount> {
    hours.iter().fold(None, |best: Option<&HourCount>, current| match best {
        Some(best) if best.users >= current.users => Some(best),
        _ => Some(current),
    })
}

/// Headline numbers for the dashboard cards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub users_today: usize,
    pub users_last_7_days: usize,
    pub users_last_30_days: usize,
    /// Share of all users that registered in the last 7 days, one decimal.
    pub growth_7_days: f64,
    pub top_region: String,
    pub top_region_count: usize,
}

pub fn dashboard_summary<Tz: TimeZone>(
    users: &[UserRecord],
    now: &DateTime<Tz>,
) -> DashboardStats {
    let now_utc = now.with_timezone(&Utc);
    let (today_start, today_end) = day_bounds(now.date_naive(), &now.timezone());

    let users_last_7_days = count_in_range(users, now_utc - Duration::days(7), now_utc);
    let growth_7_days = if users.is_empty() {
        0.0
    } else {
        round_one_decimal(users_last_7_days as f64 / users.len() as f64 * 100.0)
    };

    let top = count_by_field(users, |u: &UserRecord| u.data.region.as_deref(), Some(1));
    let (top_region, top_region_count) = top
        .into_iter()
        .next()
        .map(|entry| (entry.name, entry.value))
        .unwrap_or_else(|| (NOT_AVAILABLE.to_string(), 0));

    DashboardStats {
        total_users: users.len(),
        users_today: count_in_range(users, today_start, today_end),
        users_last_7_days,
        users_last_30_days: count_in_range(users, now_utc - Duration::days(30), now_utc),
        growth_7_days,
        top_region,
        top_region_count,
    }
}

/// Window selector for the time-based analytics view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7")]
    Last7,
    #[default]
    #[serde(rename = "30")]
    Last30,
    #[serde(rename = "90")]
    Last90,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    /// Length of the comparison period used for growth. `All` compares
    /// against the 90 days before its start.
    pub fn period_days(&self) -> i64 {
        match self {
            TimeRange::Last7 => 7,
            TimeRange::Last30 => 30,
            TimeRange::Last90 | TimeRange::All => 90,
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7" => Ok(TimeRange::Last7),
            "30" => Ok(TimeRange::Last30),
            "90" => Ok(TimeRange::Last90),
            "all" => Ok(TimeRange::All),
            other => Err(format!("Unknown time range: {other} (expected 7, 30, 90 or all)")),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeRange::Last7 => "7",
            TimeRange::Last30 => "30",
            TimeRange::Last90 => "90",
            TimeRange::All => "all",
        };
        f.write_str(label)
    }
}

/// One point of the registrations-per-day series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// Short label, e.g. `"Oct 18"`.
    pub date: String,
    /// ISO date, e.g. `"2026-10-18"`.
    pub full_date: String,
    pub users: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeAnalytics {
    pub registrations_by_day: Vec<DayCount>,
    pub users_today: usize,
    pub users_last_7_days: usize,
    pub users_last_30_days: usize,
    pub total_in_range: usize,
    /// Growth against the preceding period, one decimal.
    pub growth_percentage: f64,
    pub is_positive_growth: bool,
    pub peak_hour: Option<HourCount>,
    pub registrations_by_hour: Vec<HourCount>,
}

pub fn time_analytics<Tz: TimeZone>(
    users: &[UserRecord],
    range: TimeRange,
    now: &DateTime<Tz>,
) -> TimeAnalytics {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);

    let start = match range {
        TimeRange::Last7 => now_utc - Duration::days(7),
        TimeRange::Last30 => now_utc - Duration::days(30),
        TimeRange::Last90 => now_utc - Duration::days(90),
        TimeRange::All => users
            .iter()
            .filter_map(|user| user.created_at().instant())
            .min()
            .unwrap_or(now_utc - Duration::days(30))
            .max(DateTime::<Utc>::UNIX_EPOCH),
    };

    let per_day = group_by_day_in(users, start, now_utc, &tz);
    let first_day = start.with_timezone(&tz).date_naive();
    let last_day = now.date_naive();
    let registrations_by_day = first_day
        .iter_days()
        .take_while(|day| *day <= last_day)
        .map(|day| DayCount {
            date: day.format("%b %d").to_string(),
            full_date: day.format("%Y-%m-%d").to_string(),
            users: per_day.get(&day).copied().unwrap_or(0),
        })
        .collect();

    let (today_start, today_end) = day_bounds(last_day, &tz);
    let total_in_range = count_in_range(users, start, now_utc);
    let previous_start = start
        .checked_sub_signed(Duration::days(range.period_days()))
        .unwrap_or(start);
    let previous = count_in_range(users, previous_start, start);
    let growth = calculate_growth(total_in_range, previous);

    let registrations_by_hour = registrations_by_hour(users, &tz);
    let peak = peak_hour(&registrations_by_hour).cloned();

    TimeAnalytics {
        registrations_by_day,
        users_today: count_in_range(users, today_start, today_end),
        users_last_7_days: count_in_range(users, now_utc - Duration::days(7), now_utc),
        users_last_30_days: count_in_range(users, now_utc - Duration::days(30), now_utc),
        total_in_range,
        growth_percentage: round_one_decimal(growth),
        is_positive_growth: growth >= 0.0,
        peak_hour: peak,
        registrations_by_hour,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PieSlice {
    pub id: usize,
    pub value: usize,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DistributionStats {
    pub total_regions: usize,
    pub total_provinces: usize,
    pub total_cities: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeographicAnalytics {
    pub top_regions: Vec<NameCount>,
    pub top_provinces: Vec<NameCount>,
    pub top_cities: Vec<NameCount>,
    pub top_regions_pie: Vec<PieSlice>,
    pub stats: DistributionStats,
}

pub fn geographic_analytics(users: &[UserRecord]) -> GeographicAnalytics {
    let top_regions = count_by_field(
        users,
        |u: &UserRecord| u.data.region.as_deref(),
        Some(TOP_LOCATIONS),
    );
    let top_provinces = count_by_field(
        users,
        |u: &UserRecord| u.data.province.as_deref(),
        Some(TOP_LOCATIONS),
    );
    let top_cities = count_by_field(
        users,
        |u: &UserRecord| u.data.city.as_deref(),
        Some(TOP_LOCATIONS),
    );

    let top_regions_pie = top_regions
        .iter()
        .take(PIE_SLICES)
        .enumerate()
        .map(|(id, region)| PieSlice {
            id,
            value: region.value,
            label: region.name.clone(),
        })
        .collect();

    let stats = DistributionStats {
        total_regions: get_unique_values(users, |u: &UserRecord| u.data.region.as_deref())
            .len(),
        total_provinces: get_unique_values(users, |u: &UserRecord| u.data.province.as_deref())
            .len(),
        total_cities: get_unique_values(users, |u: &UserRecord| u.data.city.as_deref())
            .len(),
    };

    GeographicAnalytics {
        top_regions,
        top_provinces,
        top_cities,
        top_regions_pie,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::Timestamp;
    use crate::user::UserData;
    use chrono::FixedOffset;
    use serde_json::json;

    fn user(uid: &str, value: serde_json::Value) -> UserRecord {
        UserRecord::new(uid, UserData::from_value(uid, value))
    }

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn sample() -> Vec<UserRecord> {
        vec![
            user(
                "a",
                json!({"Region": "VIII", "City": "Tacloban", "createdAt": "2026-10-18T01:00:00Z"}),
            ),
            user(
                "b",
                json!({"Region": "VII", "City": "Cebu", "createdAt": "2026-10-17T23:30:00Z"}),
            ),
            user(
                "c",
                json!({"Region": "VIII", "City": "Ormoc", "createdAt": "2026-10-10T12:00:00Z"}),
            ),
            user("d", json!({"City": "Tacloban", "createdAt": "2026-09-01T12:00:00Z"})),
            user("e", json!({"Region": "", "createdAt": "garbage"})),
        ]
    }

    #[test]
    fn count_by_field_sums_to_input_length() {
        let users = sample();
        let counts = count_by_field(&users, |u: &UserRecord| u.data.region.as_deref(), None);
        let total: usize = counts.iter().map(|c| c.value).sum();
        assert_eq!(total, users.len());
        assert_eq!(
            counts,
            vec![
                NameCount { name: "VIII".into(), value: 2 },
                NameCount { name: "Unknown".into(), value: 2 },
                NameCount { name: "VII".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn count_by_field_limit_is_a_prefix() {
        let users = sample();
        let full = count_by_field(&users, |u: &UserRecord| u.data.city.as_deref(), None);
        let limited = count_by_field(&users, |u: &UserRecord| u.data.city.as_deref(), Some(2));
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[..], full[..2]);
    }

    #[test]
    fn count_by_field_ties_keep_first_seen_order() {
        let names = ["b", "a", "c", "a", "b", "c"];
        let counts = count_by_field(&names, |n| Some(*n), None);
        let order: Vec<&str> = counts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn count_by_field_on_empty_input() {
        let empty: Vec<UserRecord> = Vec::new();
        assert!(count_by_field(&empty, |u: &UserRecord| u.data.city.as_deref(), None).is_empty());
    }

    #[test]
    fn filter_by_date_range_is_inclusive_and_idempotent() {
        let users = sample();
        let start = at("2026-10-10T12:00:00Z");
        let end = at("2026-10-18T01:00:00Z");
        let once = filter_by_date_range(&users, start, end);
        let uids: Vec<&str> = once.iter().map(|u| u.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "b", "c"]);
        assert_eq!(filter_by_date_range(&once, start, end), once);
    }

    #[test]
    fn unknown_timestamps_never_match_any_range() {
        let users = sample();
        let everything = filter_by_date_range(
            &users,
            DateTime::<Utc>::MIN_UTC,
            DateTime::<Utc>::MAX_UTC,
        );
        assert!(everything.iter().all(|u| u.uid != "e"));
        assert_eq!(everything.len(), 4);
    }

    #[test]
    fn group_by_day_uses_the_given_zone() {
        let users = sample();
        let start = at("2026-10-01T00:00:00Z");
        let end = at("2026-10-31T00:00:00Z");

        let utc = group_by_day_in(&users, start, end, &Utc);
        assert_eq!(utc.get(&NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()), Some(&1));
        assert_eq!(utc.get(&NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()), Some(&1));
        assert_eq!(utc.get(&NaiveDate::from_ymd_opt(2026, 10, 11).unwrap()), None);

        let manila = FixedOffset::east_opt(8 * 3600).unwrap();
        let local = group_by_day_in(&users, start, end, &manila);
        assert_eq!(local.get(&NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()), Some(&2));
        assert_eq!(local.values().sum::<usize>(), 3);
    }

    #[test]
    fn unique_values_are_sorted_and_skip_empty() {
        let users = sample();
        assert_eq!(
            get_unique_values(&users, |u: &UserRecord| u.data.region.as_deref()),
            vec!["VII".to_string(), "VIII".to_string()]
        );
    }

    #[test]
    fn growth_handles_zero_previous() {
        assert_eq!(calculate_growth(0, 0), 0.0);
        assert_eq!(calculate_growth(5, 0), 100.0);
        assert_eq!(calculate_growth(10, 5), 100.0);
        assert_eq!(calculate_growth(5, 10), -50.0);
        assert!((calculate_growth(4, 3) - 33.333_333).abs() < 1e-4);
    }

    #[test]
    fn batch_process_chunks_input() {
        let items: Vec<u32> = (1..=7).collect();
        let sums = batch_process(&items, 3, |batch| batch.iter().sum::<u32>());
        assert_eq!(sums, vec![6, 15, 7]);
        assert_eq!(batch_process(&items, 0, |batch| batch.len()).len(), 7);
    }

    #[test]
    fn hourly_histogram_and_peak() {
        let users = sample();
        let hours = registrations_by_hour(&users, &Utc);
        assert_eq!(hours.len(), 24);
        assert_eq!(hours.iter().map(|h| h.users).sum::<usize>(), 4);
        let peak = peak_hour(&hours).unwrap();
        assert_eq!(peak.hour_num, 12);
        assert_eq!(peak.users, 2);
        assert_eq!(peak.hour, "12:00");

        let empty = registrations_by_hour(&[], &Utc);
        assert_eq!(peak_hour(&empty).unwrap().hour_num, 0);
    }

    #[test]
    fn dashboard_summary_counts_windows() {
        let users = sample();
        let now = at("2026-10-18T10:00:00Z");
        let stats = dashboard_summary(&users, &now);
        assert_eq!(stats.total_users, 5);
        assert_eq!(stats.users_today, 1);
        assert_eq!(stats.users_last_7_days, 2);
        assert_eq!(stats.users_last_30_days, 3);
        assert_eq!(stats.growth_7_days, 40.0);
        assert_eq!(stats.top_region, "VIII");
        assert_eq!(stats.top_region_count, 2);

        let empty = dashboard_summary(&[], &now);
        assert_eq!(empty.growth_7_days, 0.0);
        assert_eq!(empty.top_region, "N/A");
        assert_eq!(empty.top_region_count, 0);
    }

    #[test]
    fn time_analytics_fills_every_day() {
        let users = sample();
        let now = at("2026-10-18T10:00:00Z");
        let analytics = time_analytics(&users, TimeRange::Last7, &now);

        assert_eq!(analytics.registrations_by_day.len(), 8);
        assert_eq!(analytics.registrations_by_day[0].full_date, "2026-10-11");
        let last = analytics.registrations_by_day.last().unwrap();
        assert_eq!(last.full_date, "2026-10-18");
        assert_eq!(last.date, "Oct 18");
        assert_eq!(last.users, 1);
        assert_eq!(
            analytics.registrations_by_day.iter().map(|d| d.users).sum::<usize>(),
            2
        );

        assert_eq!(analytics.total_in_range, 2);
        // Previous 7 days hold only the 2026-10-10 registration.
        assert_eq!(analytics.growth_percentage, 100.0);
        assert!(analytics.is_positive_growth);
        assert_eq!(analytics.registrations_by_hour.len(), 24);
    }

    #[test]
    fn time_analytics_all_starts_at_earliest_known() {
        let users = sample();
        let now = at("2026-10-18T10:00:00Z");
        let analytics = time_analytics(&users, TimeRange::All, &now);
        assert_eq!(analytics.registrations_by_day[0].full_date, "2026-09-01");
        assert_eq!(analytics.total_in_range, 4);
        // Both windows are inclusive, so the earliest record at the range
        // start is also the one registration of the previous period.
        assert_eq!(analytics.growth_percentage, 300.0);

        let empty = time_analytics(&[], TimeRange::All, &now);
        assert_eq!(empty.registrations_by_day.len(), 31);
        assert_eq!(empty.growth_percentage, 0.0);
        assert!(empty.is_positive_growth);
    }

    #[test]
    fn time_analytics_all_survives_extreme_timestamps() {
        let now = at("2026-10-18T10:00:00Z");

        // Coerced to unknown when read, so the range falls back to 30 days.
        let parsed = user("a", json!({"createdAt": -8_210_266_876_800_000i64}));
        assert!(parsed.created_at().is_unknown());
        let analytics = time_analytics(&[parsed], TimeRange::All, &now);
        assert_eq!(analytics.registrations_by_day.len(), 31);

        // Built directly, it is clamped to the epoch.
        let mut built = user("b", json!({}));
        built.data.created_at = Timestamp::Known(DateTime::<Utc>::MIN_UTC);
        let analytics = time_analytics(&[built], TimeRange::All, &now);
        assert_eq!(analytics.registrations_by_day[0].full_date, "1970-01-01");
        assert_eq!(analytics.total_in_range, 0);
        assert_eq!(analytics.growth_percentage, 0.0);
    }

    #[test]
    fn negative_growth_is_flagged() {
        let users = vec![
            user("a", json!({"createdAt": "2026-10-15T00:00:00Z"})),
            user("b", json!({"createdAt": "2026-10-08T00:00:00Z"})),
            user("c", json!({"createdAt": "2026-10-07T00:00:00Z"})),
            user("d", json!({"createdAt": "2026-10-06T00:00:00Z"})),
        ];
        let now = at("2026-10-18T00:00:00Z");
        let analytics = time_analytics(&users, TimeRange::Last7, &now);
        assert_eq!(analytics.total_in_range, 1);
        assert_eq!(analytics.growth_percentage, -66.7);
        assert!(!analytics.is_positive_growth);
    }

    #[test]
    fn time_range_parses_and_displays() {
        assert_eq!("7".parse::<TimeRange>(), Ok(TimeRange::Last7));
        assert_eq!("ALL".parse::<TimeRange>(), Ok(TimeRange::All));
        assert!("365".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::Last90.to_string(), "90");
        assert_eq!(TimeRange::default(), TimeRange::Last30);
    }

    #[test]
    fn geographic_analytics_summarises_locations() {
        let users = sample();
        let geo = geographic_analytics(&users);
        assert_eq!(geo.top_regions[0].name, "VIII");
        assert_eq!(geo.top_cities[0], NameCount { name: "Tacloban".into(), value: 2 });
        assert_eq!(geo.top_provinces, vec![NameCount { name: "Unknown".into(), value: 5 }]);
        assert_eq!(geo.top_regions_pie.len(), 3);
        assert_eq!(geo.top_regions_pie[0].label, "VIII");
        assert_eq!(
            geo.stats,
            DistributionStats { total_regions: 2, total_provinces: 0, total_cities: 3 }
        );
    }
}
