//! In-memory dataset backing the mock routes
//!
//! Records live in arenas (`Vec` plus an id index). The dataset is injected
//! into the handlers so every router, and every test, can own a fresh copy.
//! Nothing here is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use super::route::MockFailure;

/// Dataset shared between the handlers of one router
pub type SharedDataset = Arc<Mutex<MockDataset>>;

/// Record addressable by id
pub trait Record {
    fn id(&self) -> &str;
}

/// Insertion-ordered store with id lookup
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new(), index: HashMap::new() }
    }
}

impl<T: Record> Arena<T> {
    /// Insert a record; a record with the same id is replaced in place.
    pub fn insert(&mut self, item: T) -> usize {
        if let Some(&slot) = self.index.get(item.id()) {
            self.items[slot] = item;
            return slot;
        }
        let slot = self.items.len();
        self.index.insert(item.id().to_string(), slot);
        self.items.push(item);
        slot
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&slot| &self.items[slot])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.index.get(id).map(|&slot| &mut self.items[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for MockUser {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub min_amount: f64,
    pub target_return: f64,
    pub term_months: u32,
    pub status: String,
    #[serde(skip)]
    pub registrations: Vec<Registration>,
}

impl Record for Investment {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub investment_id: String,
    pub user_id: String,
    pub amount: f64,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Record for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: usize,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Record for UploadRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Access/refresh tokens issued by the mock auth routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// New account fields accepted by [`MockDataset::create_user`]
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Mutable state of the simulated backend
#[derive(Debug, Clone, Default)]
pub struct MockDataset {
    pub users: Arena<MockUser>,
    pub investments: Arena<Investment>,
    pub notifications: Arena<Notification>,
    pub uploads: Arena<UploadRecord>,
    /// access token -> user id
    access_sessions: HashMap<String, String>,
    /// refresh token -> (user id, access token issued with it)
    refresh_sessions: HashMap<String, (String, String)>,
    sequence: u64,
}

impl MockDataset {
    pub const DEMO_EMAIL: &'static str = "demo@meridian.app";
    pub const DEMO_PASSWORD: &'static str = "password123";

    /// Dataset with no records.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Demo user, three investments and three notifications.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let mut dataset = Self::default();

        dataset.users.insert(MockUser {
            id: "user-1".into(),
            email: Self::DEMO_EMAIL.into(),
            password: Self::DEMO_PASSWORD.into(),
            first_name: "Demo".into(),
            last_name: "Investor".into(),
            phone: Some("+15550100".into()),
            created_at: now - Duration::days(90),
        });

        let investments = [
            ("inv-1", "Harbor Logistics Park", "real_estate", 5_000.0, 8.5, 36),
            ("inv-2", "Solar Valley Fund", "energy", 1_000.0, 6.2, 24),
            ("inv-3", "Regional SME Credit", "private_credit", 2_500.0, 10.0, 12),
        ];
        for (id, title, category, min_amount, target_return, term_months) in investments {
            dataset.investments.insert(Investment {
                id: id.into(),
                title: title.into(),
                category: category.into(),
                description: format!("{title} offering"),
                min_amount,
                target_return,
                term_months,
                status: "open".into(),
                registrations: Vec::new(),
            });
        }

        let notifications = [
            ("notif-1", "Welcome to Meridian", "Your account is ready.", true),
            ("notif-2", "New offering", "Solar Valley Fund is now open.", false),
            ("notif-3", "Verify your identity", "Upload an ID document to invest.", false),
        ];
        for (offset, (id, title, body, read)) in (0_i64..).zip(notifications) {
            dataset.notifications.insert(Notification {
                id: id.into(),
                user_id: "user-1".into(),
                title: title.into(),
                body: body.into(),
                read,
                created_at: now - Duration::hours(offset),
            });
        }

        dataset
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<&MockUser> {
        self.users.iter().find(|user| user.email.eq_ignore_ascii_case(email))
    }

    /// User with matching credentials.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&MockUser> {
        self.find_user_by_email(email).filter(|user| user.password == password)
    }

    /// # Errors
    /// Returns a 409 failure if the email is already registered.
    pub fn create_user(&mut self, new_user: NewUser) -> Result<MockUser, MockFailure> {
        if self.find_user_by_email(&new_user.email).is_some() {
            return Err(MockFailure::conflict("User already exists"));
        }

        let user = MockUser {
            id: self.next_id("user"),
            email: new_user.email,
            password: new_user.password,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
            created_at: Utc::now(),
        };
        self.users.insert(user.clone());
        Ok(user)
    }

    pub fn issue_tokens(&mut self, user_id: &str) -> IssuedTokens {
        self.sequence += 1;
        let tokens = IssuedTokens {
            access_token: format!("mock-access-{user_id}-{}", self.sequence),
            refresh_token: format!("mock-refresh-{user_id}-{}", self.sequence),
        };
        self.access_sessions.insert(tokens.access_token.clone(), user_id.to_string());
        self.refresh_sessions.insert(
            tokens.refresh_token.clone(),
            (user_id.to_string(), tokens.access_token.clone()),
        );
        tokens
    }

    /// User owning a live access token.
    pub fn user_for_token(&self, access_token: &str) -> Option<&MockUser> {
        self.access_sessions.get(access_token).and_then(|user_id| self.users.get(user_id))
    }

    /// Exchange a refresh token for a new pair; the old pair is revoked.
    pub fn rotate_tokens(&mut self, refresh_token: &str) -> Option<IssuedTokens> {
        let (user_id, access_token) = self.refresh_sessions.remove(refresh_token)?;
        self.access_sessions.remove(&access_token);
        Some(self.issue_tokens(&user_id))
    }

    /// Revoke an access token and, if given, its refresh token.
    pub fn revoke(&mut self, access_token: Option<&str>, refresh_token: Option<&str>) {
        if let Some(token) = access_token {
            self.access_sessions.remove(token);
        }
        if let Some(token) = refresh_token {
            self.refresh_sessions.remove(token);
        }
    }

    pub fn live_sessions(&self) -> usize {
        self.access_sessions.len()
    }

    /// Sequential id with the given prefix, e.g. `upload-4`.
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}-{}", self.sequence)
    }

    pub fn into_shared(self) -> SharedDataset {
        Arc::new(Mutex::new(self))
    }
}
