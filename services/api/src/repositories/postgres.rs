//! PostgreSQL store used in database mode

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    BookingOutcome, CancelOutcome, EventRepository, SeedData, Store, TicketRepository,
    UserRepository,
};
use crate::models::{Event, EventFilter, EventSort, Location, Ticket, User};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, phone, avatar, role, registered_events, created_at";

const EVENT_COLUMNS: &str = "id, title, description, date, time, venue, address, city, country, \
     category, price, capacity, attendees, image_url, organizer_id, created_at";

const TICKET_COLUMNS: &str = "id, event_id, user_id, ticket_number, price, status, \
     payment_method, payment_status, qr_code, seat_number, purchase_date";

const TICKET_NUMBER_CONSTRAINT: &str = "tickets_ticket_number_key";

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store on an initialised pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> DatabaseResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }
}

fn parse_column<T>(row: &PgRow, column: &str) -> DatabaseResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| DatabaseError::Corrupt(format!("{}: {}", column, e)))
}

fn user_from_row(row: &PgRow) -> DatabaseResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        phone: row.try_get("phone")?,
        avatar: row.try_get("avatar")?,
        role: parse_column(row, "role")?,
        registered_events: row.try_get("registered_events")?,
        created_at: row.try_get("created_at")?,
    })
}

fn event_from_row(row: &PgRow) -> DatabaseResult<Event> {
    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        location: Location {
            venue: row.try_get("venue")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            country: row.try_get("country")?,
        },
        category: parse_column(row, "category")?,
        price: row.try_get("price")?,
        capacity: row.try_get("capacity")?,
        attendees: row.try_get("attendees")?,
        image_url: row.try_get("image_url")?,
        organizer_id: row.try_get("organizer_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn ticket_from_row(row: &PgRow) -> DatabaseResult<Ticket> {
    Ok(Ticket {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        user_id: row.try_get("user_id")?,
        ticket_number: row.try_get("ticket_number")?,
        price: row.try_get("price")?,
        status: parse_column(row, "status")?,
        payment_method: parse_column(row, "payment_method")?,
        payment_status: parse_column(row, "payment_status")?,
        qr_code: row.try_get("qr_code")?,
        seat_number: row.try_get("seat_number")?,
        purchase_date: row.try_get("purchase_date")?,
    })
}

fn collect<T>(
    rows: Vec<PgRow>,
    map: impl Fn(&PgRow) -> DatabaseResult<T>,
) -> DatabaseResult<Vec<T>> {
    rows.iter().map(map).collect()
}

/// Escape `%`, `_` and `\` and wrap the term for a substring `ILIKE`
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Constraint name of a unique violation, `None` for any other error
fn unique_violation(error: &sqlx::Error) -> Option<Option<String>> {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().map(str::to_string))
        }
        _ => None,
    }
}

fn order_clause(sort: EventSort) -> &'static str {
    match sort {
        EventSort::Date => "date ASC, created_at ASC",
        EventSort::PriceAsc => "price ASC, date ASC",
        EventSort::PriceDesc => "price DESC, date ASC",
        EventSort::Newest => "created_at DESC",
        EventSort::Popular => "attendees DESC, date ASC",
    }
}

const EVENT_FILTER: &str = "($1::text IS NULL OR category = $1) \
     AND ($2::text IS NULL OR title ILIKE $2 OR description ILIKE $2 OR venue ILIKE $2)";

async fn insert_user(conn: &mut PgConnection, user: &User) -> DatabaseResult<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, phone, avatar, role, registered_events, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.phone)
    .bind(&user.avatar)
    .bind(user.role.as_str())
    .bind(&user.registered_events)
    .bind(user.created_at)
    .execute(conn)
    .await
    .map_err(|e| DatabaseError::from_write(e, "email"))?;
    Ok(())
}

async fn insert_event(conn: &mut PgConnection, event: &Event) -> DatabaseResult<()> {
    sqlx::query(
        r#"
        INSERT INTO events (id, title, description, date, time, venue, address, city, country,
                            category, price, capacity, attendees, image_url, organizer_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(event.id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.date)
    .bind(&event.time)
    .bind(&event.location.venue)
    .bind(&event.location.address)
    .bind(&event.location.city)
    .bind(&event.location.country)
    .bind(event.category.as_str())
    .bind(event.price)
    .bind(event.capacity)
    .bind(event.attendees)
    .bind(&event.image_url)
    .bind(event.organizer_id)
    .bind(event.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_ticket(conn: &mut PgConnection, ticket: &Ticket) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tickets (id, event_id, user_id, ticket_number, price, status, payment_method,
                             payment_status, qr_code, seat_number, purchase_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(ticket.id)
    .bind(ticket.event_id)
    .bind(ticket.user_id)
    .bind(&ticket.ticket_number)
    .bind(ticket.price)
    .bind(ticket.status.as_str())
    .bind(ticket.payment_method.as_str())
    .bind(ticket.payment_status.as_str())
    .bind(&ticket.qr_code)
    .bind(&ticket.seat_number)
    .bind(ticket.purchase_date)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: User) -> DatabaseResult<User> {
        debug!("Inserting user {}", user.id);
        let mut conn = self.pool.acquire().await?;
        insert_user(&mut conn, &user).await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_users(&self, ids: &[Uuid]) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, user_from_row)
    }

    async fn update_profile(&self, user: &User) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, phone = $3, avatar = $4
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.avatar)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        collect(rows, user_from_row)
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn create_event(&self, event: Event) -> DatabaseResult<Event> {
        debug!("Inserting event {}", event.id);
        let mut conn = self.pool.acquire().await?;
        insert_event(&mut conn, &event).await?;
        Ok(event)
    }

    async fn find_event(&self, id: Uuid) -> DatabaseResult<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn find_events(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE id = ANY($1)",
            EVENT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, event_from_row)
    }

    async fn list_events(&self, filter: &EventFilter) -> DatabaseResult<(Vec<Event>, u64)> {
        let category = filter.category.map(|category| category.as_str());
        let search = filter.search.as_deref().map(like_pattern);

        let total: i64 = sqlx::query(&format!("SELECT COUNT(*) FROM events WHERE {}", EVENT_FILTER))
            .bind(category)
            .bind(search.as_deref())
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE {} ORDER BY {} LIMIT $3 OFFSET $4",
            EVENT_COLUMNS,
            EVENT_FILTER,
            order_clause(filter.sort)
        ))
        .bind(category)
        .bind(search.as_deref())
        .bind(i64::from(filter.page.limit))
        .bind(i64::try_from(filter.page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok((collect(rows, event_from_row)?, u64::try_from(total).unwrap_or(0)))
    }

    async fn update_event(&self, event: &Event) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $2, description = $3, date = $4, time = $5, venue = $6, address = $7,
                city = $8, country = $9, category = $10, price = $11, capacity = $12,
                image_url = $13
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.location.venue)
        .bind(&event.location.address)
        .bind(&event.location.city)
        .bind(&event.location.country)
        .bind(event.category.as_str())
        .bind(event.price)
        .bind(event.capacity)
        .bind(&event.image_url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_event(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn events_by_organizer(&self, organizer_id: Uuid) -> DatabaseResult<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE organizer_id = $1 ORDER BY created_at DESC",
            EVENT_COLUMNS
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, event_from_row)
    }
}

#[async_trait]
impl TicketRepository for PgStore {
    async fn find_ticket(&self, ticket_number: &str) -> DatabaseResult<Option<Ticket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE ticket_number = $1",
            TICKET_COLUMNS
        ))
        .bind(ticket_number)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn find_active_ticket(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Ticket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE event_id = $1 AND user_id = $2 \
             AND status IN ('pending', 'confirmed')",
            TICKET_COLUMNS
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn tickets_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE user_id = $1 ORDER BY purchase_date DESC",
            TICKET_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, ticket_from_row)
    }

    async fn tickets_for_event(&self, event_id: Uuid) -> DatabaseResult<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE event_id = $1 ORDER BY purchase_date ASC",
            TICKET_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, ticket_from_row)
    }

    async fn list_tickets(&self) -> DatabaseResult<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets ORDER BY purchase_date DESC",
            TICKET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        collect(rows, ticket_from_row)
    }

    async fn commit_booking(&self, ticket: &Ticket) -> DatabaseResult<BookingOutcome> {
        let mut tx = self.pool.begin().await?;

        let seats = sqlx::query("SELECT capacity, attendees FROM events WHERE id = $1 FOR UPDATE")
            .bind(ticket.event_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(seats) = seats else {
            return Ok(BookingOutcome::EventNotFound);
        };
        let capacity: i32 = seats.try_get("capacity")?;
        let attendees: i32 = seats.try_get("attendees")?;
        if attendees >= capacity {
            return Ok(BookingOutcome::SoldOut);
        }

        let duplicate = sqlx::query(
            "SELECT 1 FROM tickets WHERE event_id = $1 AND user_id = $2 \
             AND status IN ('pending', 'confirmed')",
        )
        .bind(ticket.event_id)
        .bind(ticket.user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if duplicate.is_some() {
            return Ok(BookingOutcome::AlreadyBooked);
        }

        if let Err(error) = insert_ticket(&mut tx, ticket).await {
            return match unique_violation(&error) {
                Some(Some(constraint)) if constraint == TICKET_NUMBER_CONSTRAINT => {
                    Ok(BookingOutcome::TicketNumberTaken)
                }
                Some(_) => Ok(BookingOutcome::AlreadyBooked),
                None => Err(DatabaseError::Query(error)),
            };
        }

        let row = sqlx::query(&format!(
            "UPDATE events SET attendees = attendees + 1 WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(ticket.event_id)
        .fetch_one(&mut *tx)
        .await?;
        let event = event_from_row(&row)?;

        sqlx::query(
            r#"
            UPDATE users
            SET registered_events = array_append(registered_events, $1)
            WHERE id = $2 AND NOT ($1 = ANY(registered_events))
            "#,
        )
        .bind(ticket.event_id)
        .bind(ticket.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(
            "Committed ticket {} for event {} ({}/{})",
            ticket.ticket_number, event.id, event.attendees, event.capacity
        );
        Ok(BookingOutcome::Booked(event))
    }

    async fn commit_cancellation(&self, ticket_number: &str) -> DatabaseResult<CancelOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE ticket_number = $1 FOR UPDATE",
            TICKET_COLUMNS
        ))
        .bind(ticket_number)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(CancelOutcome::NotFound);
        };
        let ticket = ticket_from_row(&row)?;
        if !ticket.is_active() {
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let row = sqlx::query(&format!(
            "UPDATE tickets SET status = 'cancelled', payment_status = 'refunded' \
             WHERE id = $1 RETURNING {}",
            TICKET_COLUMNS
        ))
        .bind(ticket.id)
        .fetch_one(&mut *tx)
        .await?;
        let cancelled = ticket_from_row(&row)?;

        sqlx::query("UPDATE events SET attendees = GREATEST(attendees - 1, 0) WHERE id = $1")
            .bind(ticket.event_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CancelOutcome::Cancelled(cancelled))
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> bool {
        common::database::health_check(&self.pool).await
    }

    async fn reset(&self, seed: SeedData) -> DatabaseResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("TRUNCATE tickets, events, users")
            .execute(&mut *tx)
            .await?;

        for user in &seed.users {
            insert_user(&mut tx, user).await?;
        }
        for event in &seed.events {
            insert_event(&mut tx, event).await?;
        }
        for ticket in &seed.tickets {
            insert_ticket(&mut tx, ticket)
                .await
                .map_err(|e| DatabaseError::from_write(e, "ticket_number"))?;
        }

        tx.commit().await?;
        info!(
            "Database reset with {} users, {} events and {} tickets",
            seed.users.len(),
            seed.events.len(),
            seed.tickets.len()
        );
        Ok(())
    }
}
