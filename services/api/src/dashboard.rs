//! Per-user booking statistics

use chrono::NaiveDate;

use crate::models::{Category, DashboardStats, Event, Ticket, TicketStatus};

/// Reported when no confirmed ticket has a categorised event
pub const NO_FAVORITE_CATEGORY: &str = "Not enough data";

/// Compute stats over a user's tickets, given in purchase order, each paired
/// with its event when the event still exists
pub fn compute_stats(tickets: &[(Ticket, Option<Event>)], today: NaiveDate) -> DashboardStats {
    let confirmed = tickets
        .iter()
        .filter(|(ticket, _)| ticket.status == TicketStatus::Confirmed);

    let mut stats = DashboardStats {
        total_tickets: 0,
        total_spent: 0.0,
        upcoming_events: 0,
        past_events: 0,
        favorite_category: NO_FAVORITE_CATEGORY.to_string(),
    };
    // Insertion ordered so ties resolve to the first category seen
    let mut tally: Vec<(Category, usize)> = Vec::new();

    for (ticket, event) in confirmed {
        stats.total_tickets += 1;
        stats.total_spent += ticket.price;

        let Some(event) = event else { continue };
        if event.date >= today {
            stats.upcoming_events += 1;
        } else {
            stats.past_events += 1;
        }

        match tally.iter_mut().find(|(category, _)| *category == event.category) {
            Some((_, count)) => *count += 1,
            None => tally.push((event.category, 1)),
        }
    }

    let mut best: Option<(Category, usize)> = None;
    for (category, count) in tally {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((category, count));
        }
    }
    if let Some((category, _)) = best {
        stats.favorite_category = category.to_string();
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PaymentMethod, PaymentStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, 1).unwrap()
    }

    fn event(category: Category, date: NaiveDate) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Event".into(),
            description: String::new(),
            date,
            time: "18:00".into(),
            location: Location::default(),
            category,
            price: 10.0,
            capacity: 10,
            attendees: 1,
            image_url: String::new(),
            organizer_id: Uuid::nil(),
            created_at: Utc::now(),
        }
    }

    fn entry(
        category: Category,
        date: NaiveDate,
        price: f64,
        status: TicketStatus,
    ) -> (Ticket, Option<Event>) {
        let event = event(category, date);
        let ticket = Ticket {
            id: Uuid::new_v4(),
            event_id: event.id,
            user_id: Uuid::nil(),
            ticket_number: "TKT-X-0000".into(),
            price,
            status,
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Completed,
            qr_code: String::new(),
            seat_number: "A1".into(),
            purchase_date: Utc::now(),
        };
        (ticket, Some(event))
    }

    #[test]
    fn test_empty_history() {
        let stats = compute_stats(&[], today());
        assert_eq!(stats.total_tickets, 0);
        assert_eq!(stats.total_spent, 0.0);
        assert_eq!(stats.favorite_category, NO_FAVORITE_CATEGORY);
    }

    #[test]
    fn test_only_confirmed_tickets_count() {
        let later = NaiveDate::from_ymd_opt(2030, 7, 1).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let tickets = [
            entry(Category::Concert, later, 89.0, TicketStatus::Confirmed),
            entry(Category::Concert, earlier, 299.0, TicketStatus::Confirmed),
            entry(Category::Workshop, later, 49.0, TicketStatus::Cancelled),
            entry(Category::Workshop, today(), 25.0, TicketStatus::Confirmed),
        ];

        let stats = compute_stats(&tickets, today());
        assert_eq!(stats.total_tickets, 3);
        assert_eq!(stats.total_spent, 413.0);
        assert_eq!(stats.upcoming_events, 2);
        assert_eq!(stats.past_events, 1);
        assert_eq!(stats.favorite_category, "Concert");
    }

    #[test]
    fn test_favorite_category_tie_goes_to_first_seen() {
        let day = today();
        let tickets = [
            entry(Category::Workshop, day, 1.0, TicketStatus::Confirmed),
            entry(Category::Concert, day, 1.0, TicketStatus::Confirmed),
            entry(Category::Concert, day, 1.0, TicketStatus::Confirmed),
            entry(Category::Workshop, day, 1.0, TicketStatus::Confirmed),
        ];
        assert_eq!(compute_stats(&tickets, day).favorite_category, "Workshop");
    }

    #[test]
    fn test_tickets_of_deleted_events_still_count_spending() {
        let (ticket, _) = entry(Category::Other, today(), 12.5, TicketStatus::Confirmed);
        let stats = compute_stats(&[(ticket, None)], today());
        assert_eq!(stats.total_tickets, 1);
        assert_eq!(stats.total_spent, 12.5);
        assert_eq!(stats.upcoming_events + stats.past_events, 0);
        assert_eq!(stats.favorite_category, NO_FAVORITE_CATEGORY);
    }
}
