//! Fixed sample data written by `POST /api/seed` and at demo start-up

use auth::Role;
use auth::password::PasswordService;
use auth::tokens::DEMO_USER_ID;
use chrono::{Duration, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Category, DemoAccount, Event, Location, PaymentMethod, PaymentStatus, SeedSummary, Ticket,
    TicketStatus, User, user::avatar_url,
};
use crate::repositories::{SeedData, Store};

pub const ADMIN_USER_ID: Uuid = Uuid::from_u128(0x6576_656e_7473_7068_6572_6500_0000_00a1);
pub const ORGANIZER_USER_ID: Uuid = Uuid::from_u128(0x6576_656e_7473_7068_6572_6500_0000_00b1);

const EVENT_IDS: [Uuid; 4] = [
    Uuid::from_u128(0x6576_656e_7473_7068_6572_6500_0000_0e01),
    Uuid::from_u128(0x6576_656e_7473_7068_6572_6500_0000_0e02),
    Uuid::from_u128(0x6576_656e_7473_7068_6572_6500_0000_0e03),
    Uuid::from_u128(0x6576_656e_7473_7068_6572_6500_0000_0e04),
];

/// Credentials of the seeded accounts
pub const DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        role: "admin",
        email: "admin@eventsphere.com",
        password: "admin123",
    },
    DemoAccount {
        role: "organizer",
        email: "organizer@eventsphere.com",
        password: "organizer123",
    },
    DemoAccount {
        role: "user",
        email: "john@eventsphere.com",
        password: "user123",
    },
];

struct SampleEvent {
    title: &'static str,
    description: &'static str,
    date: (i32, u32, u32),
    time: &'static str,
    venue: &'static str,
    address: &'static str,
    city: &'static str,
    category: Category,
    price: f64,
    capacity: i32,
    attendees: i32,
    image: &'static str,
}

const SAMPLE_EVENTS: [SampleEvent; 4] = [
    SampleEvent {
        title: "Tech Innovators Conference 2024",
        description: "Join us for the biggest tech conference of the year! Featuring keynote speeches from industry leaders, hands-on workshops, and networking opportunities.",
        date: (2024, 3, 15),
        time: "09:00 AM",
        venue: "Convention Center",
        address: "123 Tech Street",
        city: "San Francisco",
        category: Category::Conference,
        price: 299.0,
        capacity: 500,
        attendees: 150,
        image: "https://images.unsplash.com/photo-1540575467063-178a50c2df87?w=800",
    },
    SampleEvent {
        title: "Summer Music Festival",
        description: "3-day music festival featuring top artists from around the world. Multiple stages, food trucks, and camping available.",
        date: (2024, 6, 20),
        time: "02:00 PM",
        venue: "Central Park",
        address: "Park Avenue",
        city: "New York",
        category: Category::Concert,
        price: 89.0,
        capacity: 1000,
        attendees: 500,
        image: "https://images.unsplash.com/photo-1470225620780-dba8ba36b745?w=800",
    },
    SampleEvent {
        title: "React Native Workshop",
        description: "Hands-on workshop for building mobile apps with React Native. Perfect for beginners and intermediate developers.",
        date: (2024, 4, 10),
        time: "10:00 AM",
        venue: "Tech Hub",
        address: "456 Developer Road",
        city: "Austin",
        category: Category::Workshop,
        price: 49.0,
        capacity: 100,
        attendees: 75,
        image: "https://images.unsplash.com/photo-1556761175-b413da4baf72?w=800",
    },
    SampleEvent {
        title: "Startup Networking Mixer",
        description: "Connect with entrepreneurs, investors, and innovators. Perfect for startup founders looking to network.",
        date: (2024, 5, 5),
        time: "06:30 PM",
        venue: "Innovation Center",
        address: "789 Startup Blvd",
        city: "Boston",
        category: Category::Networking,
        price: 25.0,
        capacity: 200,
        attendees: 120,
        image: "https://images.unsplash.com/photo-1559136555-9303baea8ebd?w=800",
    },
];

/// Build the sample users, events and tickets, hashing the demo passwords
pub async fn build_seed(passwords: &PasswordService) -> ApiResult<SeedData> {
    let now = Utc::now();

    let accounts = [
        (ADMIN_USER_ID, "Admin User", "", Role::Admin, "dc3545"),
        (
            ORGANIZER_USER_ID,
            "Event Organizer",
            "+1234567890",
            Role::Organizer,
            "198754",
        ),
        (
            DEMO_USER_ID,
            "John Attendee",
            "+0987654321",
            Role::User,
            "6200ee",
        ),
    ];

    let mut users = Vec::with_capacity(accounts.len());
    for (index, ((id, name, phone, role, background), credentials)) in
        accounts.into_iter().zip(DEMO_ACCOUNTS).enumerate()
    {
        users.push(User {
            id,
            name: name.to_string(),
            email: credentials.email.to_string(),
            password_hash: passwords.hash_password(credentials.password).await?,
            phone: phone.to_string(),
            avatar: avatar_url(name, background),
            role,
            registered_events: vec![],
            created_at: now + Duration::milliseconds(index as i64),
        });
    }

    let mut events = Vec::with_capacity(SAMPLE_EVENTS.len());
    for (index, (sample, id)) in SAMPLE_EVENTS.iter().zip(EVENT_IDS).enumerate() {
        let (year, month, day) = sample.date;
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| ApiError::internal("Invalid sample event date"))?;
        events.push(Event {
            id,
            title: sample.title.to_string(),
            description: sample.description.to_string(),
            date,
            time: sample.time.to_string(),
            location: Location {
                venue: sample.venue.to_string(),
                address: sample.address.to_string(),
                city: sample.city.to_string(),
                country: "USA".to_string(),
            },
            category: sample.category,
            price: sample.price,
            capacity: sample.capacity,
            attendees: sample.attendees,
            image_url: sample.image.to_string(),
            organizer_id: ORGANIZER_USER_ID,
            created_at: now + Duration::milliseconds(index as i64),
        });
    }

    let millis = now.timestamp_millis();
    let bookings = [
        (&events[0], PaymentMethod::Card, "A12", 1),
        (&events[1], PaymentMethod::Paypal, "VIP-03", 2),
    ];
    let tickets: Vec<Ticket> = bookings
        .into_iter()
        .map(|(event, payment_method, seat, n)| Ticket {
            id: Uuid::new_v4(),
            event_id: event.id,
            user_id: DEMO_USER_ID,
            ticket_number: format!("TKT-{}-{:03}", millis, n),
            price: event.price,
            status: TicketStatus::Confirmed,
            payment_method,
            payment_status: PaymentStatus::Completed,
            qr_code: format!(
                "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=TKT-{:03}",
                n
            ),
            seat_number: seat.to_string(),
            purchase_date: now + Duration::milliseconds(n),
        })
        .collect();

    for ticket in &tickets {
        if let Some(john) = users.iter_mut().find(|user| user.id == ticket.user_id) {
            john.register_event(ticket.event_id);
        }
    }

    Ok(SeedData {
        users,
        events,
        tickets,
    })
}

/// Replace the store contents with the sample data
pub async fn run_seed(
    store: &dyn Store,
    passwords: &PasswordService,
    include_accounts: bool,
) -> ApiResult<SeedSummary> {
    let data = build_seed(passwords).await?;
    let summary = SeedSummary {
        users: data.users.len(),
        events: data.events.len(),
        tickets: data.tickets.len(),
        demo_accounts: include_accounts.then(|| DEMO_ACCOUNTS.to_vec()),
    };

    store.reset(data).await?;
    info!(
        "Seeded {} users, {} events and {} tickets into the {} store",
        summary.users,
        summary.events,
        summary.tickets,
        store.backend_name()
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryStore, TicketRepository, UserRepository};
    use auth::password::PasswordConfig;

    fn passwords() -> PasswordService {
        PasswordService::new(PasswordConfig::low_cost()).unwrap()
    }

    #[tokio::test]
    async fn test_seed_contents() {
        let data = build_seed(&passwords()).await.unwrap();

        assert_eq!(data.users.len(), 3);
        assert_eq!(data.events.len(), 4);
        assert_eq!(data.tickets.len(), 2);
        assert!(data.events.iter().all(|e| e.organizer_id == ORGANIZER_USER_ID));

        let john = data.users.iter().find(|u| u.id == DEMO_USER_ID).unwrap();
        assert_eq!(john.email, "john@eventsphere.com");
        assert_eq!(john.registered_events, vec![EVENT_IDS[0], EVENT_IDS[1]]);
        assert!(passwords().verify_password_sync(&john.password_hash, "user123").unwrap());

        let numbers: Vec<_> = data.tickets.iter().map(|t| &t.ticket_number).collect();
        assert!(numbers[0].ends_with("-001"));
        assert!(numbers[1].ends_with("-002"));
    }

    #[tokio::test]
    async fn test_run_seed_replaces_store_contents() {
        let store = MemoryStore::new();
        let summary = run_seed(&store, &passwords(), true).await.unwrap();
        assert_eq!((summary.users, summary.events, summary.tickets), (3, 4, 2));
        assert_eq!(summary.demo_accounts.map(|a| a.len()), Some(3));

        let summary = run_seed(&store, &passwords(), false).await.unwrap();
        assert!(summary.demo_accounts.is_none());
        assert_eq!(store.list_users().await.unwrap().len(), 3);
        assert_eq!(store.list_tickets().await.unwrap().len(), 2);
    }
}
