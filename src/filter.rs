//! Search, filter, sort and paging for the admin user table.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::analytics::get_unique_values;
use crate::user::UserRecord;

/// Rows per table page.
pub const ITEMS_PER_PAGE: usize = 10;

/// Region/province/city value meaning "no filter".
pub const ALL: &str = "all";

lazy_static! {
    static ref NON_DIGIT: Regex = Regex::new(r"\D").unwrap();
    static ref PHONE_LIKE: Regex = Regex::new(r"^[\d\s\-\+\(\)\.]+$").unwrap();
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Email,
    #[default]
    Date,
    Region,
    City,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// What the table shows: a search term, location filters and an ordering.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserQuery {
    pub search: Option<String>,
    pub region: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "sort")]
    pub sort_field: SortField,
    #[serde(rename = "direction")]
    pub sort_direction: SortDirection,
}

fn selected(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case(ALL))
}

fn digits(text: &str) -> String {
    NON_DIGIT.replace_all(text, "").into_owned()
}

impl UserQuery {
    /// Case-insensitive match on name, email, phone or full address.
    ///
    /// A term that looks like a phone number also matches phones that are
    /// formatted differently, e.g. `0917-123` finds `0917 123 4567`.
    pub fn matches_search(&self, user: &UserRecord) -> bool {
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();

        let phone = user.phone_number();
        let found = user.full_name().to_lowercase().contains(&term)
            || user.email().to_lowercase().contains(&term)
            || phone.to_lowercase().contains(&term)
            || user.full_address().to_lowercase().contains(&term);
        if found {
            return true;
        }

        if PHONE_LIKE.is_match(&term) {
            let wanted = digits(&term);
            return !wanted.is_empty() && digits(phone).contains(&wanted);
        }
        false
    }

    fn matches_location(&self, user: &UserRecord) -> bool {
        let exact = |filter: &Option<String>, value: &Option<String>| match selected(filter) {
            Some(wanted) => value.as_deref() == Some(wanted),
            None => true,
        };
        exact(&self.region, &user.data.region)
            && exact(&self.province, &user.data.province)
            && exact(&self.city, &user.data.city)
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        self.matches_location(user) && self.matches_search(user)
    }

    fn compare(&self, a: &UserRecord, b: &UserRecord) -> Ordering {
        let text = |value: &Option<String>| value.as_deref().unwrap_or("").to_lowercase();
        let ordering = match self.sort_field {
            SortField::Name => a.full_name().to_lowercase().cmp(&b.full_name().to_lowercase()),
            SortField::Email => text(&a.data.email).cmp(&text(&b.data.email)),
            SortField::Date => a.created_at().cmp(&b.created_at()),
            SortField::Region => text(&a.data.region).cmp(&text(&b.data.region)),
            SortField::City => text(&a.data.city).cmp(&text(&b.data.city)),
        };
        match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Users matching `query`, in the requested order. Ties keep input order.
pub fn filter_users(users: &[UserRecord], query: &UserQuery) -> Vec<UserRecord> {
    let mut filtered: Vec<UserRecord> = users
        .iter()
        .filter(|user| query.matches(user))
        .cloned()
        .collect();
    filtered.sort_by(|a, b| query.compare(a, b));
    filtered
}

/// One page of a longer list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice out page `page` (1-based) of `per_page` items.
///
/// Out-of-range pages are clamped; an empty list has one empty page.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        total_pages,
        total_items,
    }
}

/// Choices for the region/province/city dropdowns.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub provinces: Vec<String>,
    pub cities: Vec<String>,
}

impl FilterOptions {
    pub fn from_users(users: &[UserRecord]) -> Self {
        FilterOptions {
            regions: get_unique_values(users, |u: &UserRecord| u.data.region.as_deref()),
            provinces: get_unique_values(users, |u: &UserRecord| u.data.province.as_deref()),
            cities: get_unique_values(users, |u: &UserRecord| u.data.city.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserData;
    use serde_json::json;

    fn user(uid: &str, value: serde_json::Value) -> UserRecord {
        UserRecord::new(uid, UserData::from_value(uid, value))
    }

    fn sample() -> Vec<UserRecord> {
        vec![
            user(
                "1",
                json!({
                    "FirstName": "Maria", "LastName": "Santos", "Email": "maria@ph.example",
                    "PhoneNumber": "0917 123 4567", "City": "Tacloban", "Province": "Leyte",
                    "Region": "Eastern Visayas", "createdAt": "2026-10-01T00:00:00Z",
                }),
            ),
            user(
                "2",
                json!({
                    "FirstName": "jose", "LastName": "Rizal", "Email": "JOSE@ph.example",
                    "mobile": "+63-918-555-0000", "City": "Cebu City", "Province": "Cebu",
                    "Region": "Central Visayas", "createdAt": "2026-10-03T00:00:00Z",
                }),
            ),
            user(
                "3",
                json!({
                    "FirstName": "Ana", "City": "Ormoc", "Province": "Leyte",
                    "Region": "Eastern Visayas", "createdAt": "2026-10-02T00:00:00Z",
                }),
            ),
            user("4", json!({"FirstName": "Ben"})),
        ]
    }

    fn uids(users: &[UserRecord]) -> Vec<&str> {
        users.iter().map(|u| u.uid.as_str()).collect()
    }

    #[test]
    fn default_query_sorts_newest_first() {
        let result = filter_users(&sample(), &UserQuery::default());
        assert_eq!(uids(&result), vec!["2", "3", "1", "4"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let query = |term: &str| UserQuery {
            search: Some(term.to_string()),
            ..UserQuery::default()
        };
        assert_eq!(uids(&filter_users(&sample(), &query("JOSE"))), vec!["2"]);
        assert_eq!(uids(&filter_users(&sample(), &query("ph.EXAMPLE"))), vec!["2", "1"]);
        assert_eq!(uids(&filter_users(&sample(), &query("ormoc, leyte"))), vec!["3"]);
        assert!(filter_users(&sample(), &query("nobody")).is_empty());
        assert_eq!(filter_users(&sample(), &query("   ")).len(), 4);
    }

    #[test]
    fn phone_search_ignores_formatting() {
        let query = |term: &str| UserQuery {
            search: Some(term.to_string()),
            ..UserQuery::default()
        };
        assert_eq!(uids(&filter_users(&sample(), &query("09171234567"))), vec!["1"]);
        assert_eq!(uids(&filter_users(&sample(), &query("918 555"))), vec!["2"]);
        assert_eq!(uids(&filter_users(&sample(), &query("(0917) 123-4567"))), vec!["1"]);
    }

    #[test]
    fn location_filters_combine() {
        let query = UserQuery {
            province: Some("Leyte".into()),
            city: Some("all".into()),
            sort_field: SortField::Name,
            sort_direction: SortDirection::Asc,
            ..UserQuery::default()
        };
        assert_eq!(uids(&filter_users(&sample(), &query)), vec!["3", "1"]);

        let query = UserQuery {
            region: Some("Eastern Visayas".into()),
            city: Some("Tacloban".into()),
            ..UserQuery::default()
        };
        assert_eq!(uids(&filter_users(&sample(), &query)), vec!["1"]);
    }

    #[test]
    fn text_sorts_ignore_case() {
        let query = UserQuery {
            sort_field: SortField::Email,
            sort_direction: SortDirection::Asc,
            ..UserQuery::default()
        };
        // Missing emails sort as empty strings.
        assert_eq!(uids(&filter_users(&sample(), &query)), vec!["3", "4", "2", "1"]);
    }

    #[test]
    fn query_from_url_params() {
        let query: UserQuery =
            serde_json::from_value(json!({"search": "ana", "sort": "city", "direction": "asc"}))
                .unwrap();
        assert_eq!(query.sort_field, SortField::City);
        assert_eq!(query.sort_direction, SortDirection::Asc);
        assert_eq!(query.region, None);
    }

    #[test]
    fn pagination_clamps() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(&items, 3, ITEMS_PER_PAGE);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);

        assert_eq!(paginate(&items, 0, 10).page, 1);
        assert_eq!(paginate(&items, 99, 10).page, 3);

        let empty = paginate::<u32>(&[], 1, 10);
        assert!(empty.items.is_empty());
        assert_eq!(empty.total_pages, 1);
    }

    #[test]
    fn filter_options_are_sorted_and_distinct() {
        let options = FilterOptions::from_users(&sample());
        assert_eq!(options.regions, vec!["Central Visayas", "Eastern Visayas"]);
        assert_eq!(options.provinces, vec!["Cebu", "Leyte"]);
        assert_eq!(options.cities, vec!["Cebu City", "Ormoc", "Tacloban"]);
    }
}
