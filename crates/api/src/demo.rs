//! Scripted session against the configured backend
//!
//! Logs in, browses investments and notifications, registers interest in an
//! offering, uploads a document, refreshes the session and logs out. Run by
//! the `meridian` binary; with mocking enabled it needs no server.

use std::time::Instant;

use meridian_core::mock::MockDataset;
use meridian_core::Credentials;
use meridian_domain::constants::{INVESTMENTS_PATH, NOTIFICATIONS_PATH, UPLOADS_PATH};
use meridian_domain::{MeridianError, MultipartBody, ResponseEnvelope, Result};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::context::AppContext;
use crate::utils::log_operation;

/// What the demo session observed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoReport {
    pub email: Option<String>,
    pub investments: usize,
    pub registered_investment: Option<String>,
    pub unread_before: u64,
    pub unread_after: u64,
    pub uploaded: bool,
    pub refreshed: bool,
}

/// Run the demo session with the demo account.
///
/// # Errors
/// Returns `MeridianError::Auth` if login fails. Later steps are best-effort
/// and only reflected in the report.
#[instrument(skip_all)]
pub async fn run_demo_session(context: &AppContext) -> Result<DemoReport> {
    let credentials = Credentials::new(MockDataset::DEMO_EMAIL, MockDataset::DEMO_PASSWORD);
    run_session(context, &credentials).await
}

async fn run_session(context: &AppContext, credentials: &Credentials) -> Result<DemoReport> {
    let session = &context.session;
    let client = &context.client;
    let mut report = DemoReport::default();

    let started = Instant::now();
    let login = session.login(credentials).await;
    log_operation("auth::login", &login, started.elapsed());
    let user = login.into_result().map_err(|(status, error)| {
        MeridianError::Auth(format!("login failed (status {}): {error}", status.unwrap_or_default()))
    })?;
    report.email = user.get("email").and_then(Value::as_str).map(ToString::to_string);

    let started = Instant::now();
    let profile = session.current_user().await;
    log_operation("users::profile", &profile, started.elapsed());

    let started = Instant::now();
    let investments: ResponseEnvelope<Value> = client.get(INVESTMENTS_PATH, None).await;
    log_operation("investments::list", &investments, started.elapsed());
    let first_open = investments.data.as_ref().and_then(|page| {
        report.investments = page["items"].as_array().map_or(0, Vec::len);
        cheapest_offering(page)
    });

    if let Some((id, min_amount)) = first_open {
        let started = Instant::now();
        let url = format!("{INVESTMENTS_PATH}/{id}/register");
        let registered: ResponseEnvelope<Value> =
            client.post(&url, Some(&json!({ "amount": min_amount })), None).await;
        log_operation("investments::register", &registered, started.elapsed());
        if registered.is_success() {
            report.registered_investment = Some(id);
        }
    }

    report.unread_before = unread_count(context).await;
    let notifications: ResponseEnvelope<Value> = client.get(NOTIFICATIONS_PATH, None).await;
    let unread_ids: Vec<String> = notifications
        .data
        .as_ref()
        .and_then(|page| page["items"].as_array())
        .map(|items| {
            items
                .iter()
                .filter(|item| item["read"] == json!(false))
                .filter_map(|item| item["id"].as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default();
    for id in unread_ids {
        let started = Instant::now();
        let marked: ResponseEnvelope<Value> =
            client.put(&format!("{NOTIFICATIONS_PATH}/{id}/read"), None::<&Value>, None).await;
        log_operation("notifications::mark_read", &marked, started.elapsed());
    }
    report.unread_after = unread_count(context).await;

    let started = Instant::now();
    let form = MultipartBody::new().text("kind", "id_document").file(
        "file",
        "passport.png",
        Some("image/png".to_string()),
        vec![0x89, 0x50, 0x4e, 0x47],
    );
    let upload: ResponseEnvelope<Value> = client.upload(UPLOADS_PATH, form, None).await;
    log_operation("uploads::create", &upload, started.elapsed());
    report.uploaded = upload.is_success();

    let started = Instant::now();
    let refreshed = session.refresh().await;
    log_operation("auth::refresh", &refreshed, started.elapsed());
    report.refreshed = refreshed.is_success();

    session.logout().await;
    info!(?report, "demo session finished");

    Ok(report)
}

async fn unread_count(context: &AppContext) -> u64 {
    let page: ResponseEnvelope<Value> = context.client.get(NOTIFICATIONS_PATH, None).await;
    page.data.and_then(|page| page["unread"].as_u64()).unwrap_or_default()
}

/// Offering with the lowest minimum amount.
fn cheapest_offering(page: &Value) -> Option<(String, f64)> {
    page["items"]
        .as_array()?
        .iter()
        .filter_map(|item| Some((item["id"].as_str()?.to_string(), item["minAmount"].as_f64()?)))
        .min_by(|left, right| left.1.total_cmp(&right.1))
}
