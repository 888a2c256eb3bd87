//! Event records, catalog queries and event payloads

use chrono::{DateTime, NaiveDate, Utc};
use common::pagination::PageRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::user::{AttendeeSummary, OrganizerSummary};

/// Image used when an event is created without one
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1540575467063-178a50c2df87?w=400";

/// Start time used when an event is created without one
pub const DEFAULT_EVENT_TIME: &str = "18:00";

/// Capacity used when an event is created without one
pub const DEFAULT_CAPACITY: i32 = 100;

/// Event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Conference,
    Workshop,
    Concert,
    Networking,
    Exhibition,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Conference,
        Category::Workshop,
        Category::Concert,
        Category::Networking,
        Category::Exhibition,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Conference => "Conference",
            Category::Workshop => "Workshop",
            Category::Concert => "Concert",
            Category::Networking => "Networking",
            Category::Exhibition => "Exhibition",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown category '{}'; expected one of Conference, Workshop, Concert, Networking, Exhibition, Other",
                    s
                )
            })
    }
}

/// Where an event takes place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub venue: String,
    pub address: String,
    pub city: String,
    pub country: String,
}

/// Stored event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: Location,
    pub category: Category,
    pub price: f64,
    pub capacity: i32,
    pub attendees: i32,
    pub image_url: String,
    pub organizer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether every seat is taken
    pub fn is_full(&self) -> bool {
        self.attendees >= self.capacity
    }

    /// Whether the event day has begun, counting from midnight UTC
    pub fn has_started(&self, today: NaiveDate) -> bool {
        self.date <= today
    }

    /// Display fields used when events are joined onto other records
    pub fn brief(&self) -> EventBrief {
        EventBrief {
            id: self.id,
            title: self.title.clone(),
            date: self.date,
            time: self.time.clone(),
            location: self.location.clone(),
            image_url: self.image_url.clone(),
            category: self.category,
        }
    }
}

/// Event display fields joined onto tickets and profiles
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBrief {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: Location,
    pub image_url: String,
    pub category: Category,
}

/// Event with its organizer resolved, and attendees for the detail view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub organizer: Option<OrganizerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendee_list: Option<Vec<AttendeeSummary>>,
}

/// Catalog ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSort {
    /// Event date, earliest first
    #[default]
    Date,
    PriceAsc,
    PriceDesc,
    /// Creation time, latest first
    Newest,
    /// Attendee count, highest first
    Popular,
}

impl EventSort {
    /// Resolve a query-string sort key; unknown keys sort by date
    pub fn from_key(key: &str) -> Self {
        match key {
            "price_asc" => EventSort::PriceAsc,
            "price_desc" => EventSort::PriceDesc,
            "newest" => EventSort::Newest,
            "popular" => EventSort::Popular,
            _ => EventSort::Date,
        }
    }
}

/// Raw catalog query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated catalog filter
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub category: Option<Category>,
    /// Non-empty, trimmed search term
    pub search: Option<String>,
    pub sort: EventSort,
    pub page: PageRequest,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            sort: EventSort::Date,
            page: PageRequest::default(),
        }
    }
}

impl TryFrom<EventQuery> for EventFilter {
    type Error = String;

    fn try_from(query: EventQuery) -> Result<Self, Self::Error> {
        let category = match query.category.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(name) => Some(name.parse::<Category>()?),
        };

        let search = query
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());

        Ok(Self {
            category,
            search,
            sort: query
                .sort
                .as_deref()
                .map(EventSort::from_key)
                .unwrap_or_default(),
            page: PageRequest::new(query.page, query.limit),
        })
    }
}

/// Editable event fields, used by both create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<Location>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub capacity: Option<i32>,
    pub image_url: Option<String>,
}

impl EventFields {
    /// Whether the fields required to create an event are present
    pub fn has_required(&self) -> bool {
        [&self.title, &self.description, &self.date]
            .iter()
            .all(|field| field.as_deref().is_some_and(|value| !value.trim().is_empty()))
    }

    /// Merge the supplied fields into `event`, validating each one
    pub fn apply_to(self, event: &mut Event) -> Result<(), String> {
        if let Some(title) = self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err("Title cannot be empty".to_string());
            }
            event.title = title.to_string();
        }
        if let Some(description) = self.description {
            event.description = description.trim().to_string();
        }
        if let Some(date) = self.date {
            event.date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
                .map_err(|_| "Date must be in YYYY-MM-DD format".to_string())?;
        }
        if let Some(time) = self.time {
            let time = time.trim();
            event.time = if time.is_empty() {
                DEFAULT_EVENT_TIME.to_string()
            } else {
                time.to_string()
            };
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(category) = self.category {
            event.category = category.trim().parse()?;
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err("Price must be zero or more".to_string());
            }
            event.price = price;
        }
        if let Some(capacity) = self.capacity {
            if capacity <= 0 {
                return Err("Capacity must be greater than zero".to_string());
            }
            event.capacity = capacity;
        }
        if let Some(image_url) = self.image_url {
            let image_url = image_url.trim();
            event.image_url = if image_url.is_empty() {
                PLACEHOLDER_IMAGE_URL.to_string()
            } else {
                image_url.to_string()
            };
        }
        Ok(())
    }

    /// Build a new event owned by `organizer_id`; title, description and
    /// date must be present
    pub fn into_event(self, organizer_id: Uuid) -> Result<Event, String> {
        if !self.has_required() {
            return Err("Title, description and date are required".to_string());
        }

        let mut event = Event {
            id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            date: NaiveDate::default(),
            time: DEFAULT_EVENT_TIME.to_string(),
            location: Location::default(),
            category: Category::Other,
            price: 0.0,
            capacity: DEFAULT_CAPACITY,
            attendees: 0,
            image_url: PLACEHOLDER_IMAGE_URL.to_string(),
            organizer_id,
            created_at: Utc::now(),
        };
        self.apply_to(&mut event)?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing_is_exact() {
        assert_eq!("Concert".parse::<Category>(), Ok(Category::Concert));
        assert!("concert".parse::<Category>().is_err());
    }

    #[test]
    fn test_filter_from_query() {
        let filter = EventFilter::try_from(EventQuery {
            category: Some("all".into()),
            search: Some("  ".into()),
            sort: Some("price_desc".into()),
            page: Some(0),
            limit: None,
        })
        .unwrap();

        assert_eq!(filter.category, None);
        assert_eq!(filter.search, None);
        assert_eq!(filter.sort, EventSort::PriceDesc);
        assert_eq!(filter.page, PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn test_filter_rejects_unknown_category_and_tolerates_unknown_sort() {
        let query = EventQuery {
            category: Some("Party".into()),
            ..EventQuery::default()
        };
        assert!(EventFilter::try_from(query).is_err());

        let query = EventQuery {
            sort: Some("alphabetical".into()),
            ..EventQuery::default()
        };
        assert_eq!(EventFilter::try_from(query).unwrap().sort, EventSort::Date);
    }

    #[test]
    fn test_new_event_defaults() {
        let fields: EventFields = serde_json::from_str(
            r#"{"title":"Meetup","description":"Monthly","date":"2030-02-01"}"#,
        )
        .unwrap();
        let organizer = Uuid::new_v4();
        let event = fields.into_event(organizer).unwrap();

        assert_eq!(event.time, DEFAULT_EVENT_TIME);
        assert_eq!(event.capacity, DEFAULT_CAPACITY);
        assert_eq!(event.price, 0.0);
        assert_eq!(event.attendees, 0);
        assert_eq!(event.category, Category::Other);
        assert_eq!(event.image_url, PLACEHOLDER_IMAGE_URL);
        assert_eq!(event.organizer_id, organizer);
    }

    #[test]
    fn test_new_event_validation() {
        let missing_date = EventFields {
            title: Some("Meetup".into()),
            description: Some("Monthly".into()),
            ..EventFields::default()
        };
        assert!(missing_date.into_event(Uuid::nil()).is_err());

        let base = || EventFields {
            title: Some("Meetup".into()),
            description: Some("Monthly".into()),
            date: Some("2030-02-01".into()),
            ..EventFields::default()
        };
        let negative_price = EventFields {
            price: Some(-1.0),
            ..base()
        };
        assert!(negative_price.into_event(Uuid::nil()).is_err());
        let zero_capacity = EventFields {
            capacity: Some(0),
            ..base()
        };
        assert!(zero_capacity.into_event(Uuid::nil()).is_err());
        let bad_date = EventFields {
            date: Some("01/02/2030".into()),
            ..base()
        };
        assert!(bad_date.into_event(Uuid::nil()).is_err());
    }

    #[test]
    fn test_update_merges_only_supplied_fields() {
        let mut event = EventFields {
            title: Some("Meetup".into()),
            description: Some("Monthly".into()),
            date: Some("2030-02-01".into()),
            price: Some(15.0),
            ..EventFields::default()
        }
        .into_event(Uuid::nil())
        .unwrap();

        EventFields {
            capacity: Some(40),
            category: Some("Networking".into()),
            ..EventFields::default()
        }
        .apply_to(&mut event)
        .unwrap();

        assert_eq!(event.title, "Meetup");
        assert_eq!(event.price, 15.0);
        assert_eq!(event.capacity, 40);
        assert_eq!(event.category, Category::Networking);
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = Event {
            id: Uuid::nil(),
            title: "Summer Music Festival".into(),
            description: "3-day music festival".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 20).unwrap(),
            time: "02:00 PM".into(),
            location: Location::default(),
            category: Category::Concert,
            price: 89.0,
            capacity: 1000,
            attendees: 500,
            image_url: PLACEHOLDER_IMAGE_URL.into(),
            organizer_id: Uuid::nil(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["date"], "2024-06-20");
        assert_eq!(json["category"], "Concert");
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("organizerId").is_some());
    }
}
