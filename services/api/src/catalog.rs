//! Catalog filtering, ordering and paging over an in-memory event list

use std::cmp::Ordering;

use crate::models::{Event, EventFilter, EventSort};

/// Whether an event passes the category and search parts of a filter
pub fn matches(event: &Event, filter: &EventFilter) -> bool {
    if let Some(category) = filter.category {
        if event.category != category {
            return false;
        }
    }

    match &filter.search {
        Some(term) => {
            let term = term.to_lowercase();
            [&event.title, &event.description, &event.location.venue]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        }
        None => true,
    }
}

/// Order events in place; equal keys keep their relative order
pub fn sort_events(events: &mut [Event], sort: EventSort) {
    match sort {
        EventSort::Date => events.sort_by(|a, b| a.date.cmp(&b.date)),
        EventSort::PriceAsc => events.sort_by(|a, b| a.price.total_cmp(&b.price)),
        EventSort::PriceDesc => events.sort_by(|a, b| b.price.total_cmp(&a.price)),
        EventSort::Newest => events.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        EventSort::Popular => events.sort_by(|a, b| match b.attendees.cmp(&a.attendees) {
            Ordering::Equal => a.date.cmp(&b.date),
            other => other,
        }),
    }
}

/// Apply a full filter: returns the requested page and the match count
pub fn select(events: Vec<Event>, filter: &EventFilter) -> (Vec<Event>, u64) {
    let mut matching: Vec<Event> = events
        .into_iter()
        .filter(|event| matches(event, filter))
        .collect();
    let total = matching.len() as u64;

    sort_events(&mut matching, filter.sort);
    (filter.page.slice(matching), total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, EventQuery, Location};
    use chrono::{Duration, NaiveDate, Utc};
    use uuid::Uuid;

    fn event(title: &str, category: Category, day: u32, price: f64, attendees: i32) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("About {}", title),
            date: NaiveDate::from_ymd_opt(2030, 1, day).unwrap(),
            time: "18:00".to_string(),
            location: Location {
                venue: format!("{} Hall", title),
                ..Location::default()
            },
            category,
            price,
            capacity: 100,
            attendees,
            image_url: String::new(),
            organizer_id: Uuid::nil(),
            created_at: Utc::now() + Duration::seconds(i64::from(day)),
        }
    }

    fn fixtures() -> Vec<Event> {
        vec![
            event("Rust Conf", Category::Conference, 20, 300.0, 10),
            event("Jazz Night", Category::Concert, 5, 40.0, 90),
            event("Rock Live", Category::Concert, 12, 60.0, 30),
            event("Clay Workshop", Category::Workshop, 1, 0.0, 5),
        ]
    }

    fn filter(query: EventQuery) -> EventFilter {
        EventFilter::try_from(query).unwrap()
    }

    #[test]
    fn test_category_filter_sorted_by_date() {
        let (page, total) = select(
            fixtures(),
            &filter(EventQuery {
                category: Some("Concert".into()),
                ..EventQuery::default()
            }),
        );

        assert_eq!(total, 2);
        let titles: Vec<_> = page.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Jazz Night", "Rock Live"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_description_and_venue() {
        let by_title = filter(EventQuery {
            search: Some("JAZZ".into()),
            ..EventQuery::default()
        });
        assert_eq!(select(fixtures(), &by_title).1, 1);

        let by_venue = filter(EventQuery {
            search: Some("workshop hall".into()),
            ..EventQuery::default()
        });
        let (page, _) = select(fixtures(), &by_venue);
        assert_eq!(page[0].title, "Clay Workshop");

        let by_description = filter(EventQuery {
            search: Some("about r".into()),
            ..EventQuery::default()
        });
        assert_eq!(select(fixtures(), &by_description).1, 2);
    }

    #[test]
    fn test_sort_keys() {
        let order = |sort: &str| {
            let (page, _) = select(
                fixtures(),
                &filter(EventQuery {
                    sort: Some(sort.into()),
                    ..EventQuery::default()
                }),
            );
            page.into_iter().map(|e| e.title).collect::<Vec<_>>()
        };

        assert_eq!(order("price_asc")[0], "Clay Workshop");
        assert_eq!(order("price_desc")[0], "Rust Conf");
        assert_eq!(order("popular")[0], "Jazz Night");
        assert_eq!(order("newest")[0], "Rust Conf");
        assert_eq!(order("bogus")[0], "Clay Workshop");
    }

    #[test]
    fn test_paging_bounds() {
        let request = filter(EventQuery {
            page: Some(2),
            limit: Some(3),
            ..EventQuery::default()
        });
        let (page, total) = select(fixtures(), &request);
        assert_eq!(total, 4);
        assert_eq!(page.len(), 1);
        assert_eq!(request.page.total_pages(total), 2);

        let beyond = filter(EventQuery {
            page: Some(9),
            ..EventQuery::default()
        });
        assert!(select(fixtures(), &beyond).0.is_empty());
    }
}
