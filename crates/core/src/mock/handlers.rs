//! Simulated backend endpoints
//!
//! [`default_routes`] builds the route table in its fixed registration
//! order. Every endpoint is served by a [`BackendHandler`] bound to the
//! shared dataset.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use meridian_domain::constants::{
    AUTH_LOGIN_PATH, AUTH_LOGOUT_PATH, AUTH_REFRESH_PATH, AUTH_REGISTER_PATH, NOTIFICATIONS_PATH,
    UPLOADS_PATH, USER_PROFILE_PATH,
};
use meridian_domain::{HttpMethod, MultipartPart, RequestBody};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::dataset::{
    IssuedTokens, MockDataset, MockUser, NewUser, Registration, SharedDataset, UploadRecord,
};
use super::route::{MockFailure, MockReply, MockRequest, RouteHandler, RouteRule, UrlPattern};

/// Endpoints served by the simulated backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    Refresh,
    Logout,
    Profile,
    UpdateProfile,
    ListInvestments,
    RegisterInvestment,
    InvestmentDetail,
    ListNotifications,
    MarkNotificationRead,
    Upload,
}

impl Endpoint {
    /// Registration order of the default table. `RegisterInvestment` comes
    /// before `InvestmentDetail` since both share the `/investments/` prefix.
    pub const ALL: [Self; 12] = [
        Self::Login,
        Self::Register,
        Self::Refresh,
        Self::Logout,
        Self::Profile,
        Self::UpdateProfile,
        Self::ListInvestments,
        Self::RegisterInvestment,
        Self::InvestmentDetail,
        Self::ListNotifications,
        Self::MarkNotificationRead,
        Self::Upload,
    ];

    pub fn method(self) -> HttpMethod {
        match self {
            Self::Profile | Self::ListInvestments | Self::InvestmentDetail | Self::ListNotifications => {
                HttpMethod::Get
            }
            Self::UpdateProfile | Self::MarkNotificationRead => HttpMethod::Put,
            Self::Login
            | Self::Register
            | Self::Refresh
            | Self::Logout
            | Self::RegisterInvestment
            | Self::Upload => HttpMethod::Post,
        }
    }

    pub fn pattern(self) -> UrlPattern {
        match self {
            Self::Login => UrlPattern::exact(AUTH_LOGIN_PATH),
            Self::Register => UrlPattern::exact(AUTH_REGISTER_PATH),
            Self::Refresh => UrlPattern::exact(AUTH_REFRESH_PATH),
            Self::Logout => UrlPattern::exact(AUTH_LOGOUT_PATH),
            Self::Profile | Self::UpdateProfile => UrlPattern::exact(USER_PROFILE_PATH),
            Self::ListInvestments => UrlPattern::exact("/investments"),
            Self::RegisterInvestment => UrlPattern::scoped("/investments/", "/register"),
            Self::InvestmentDetail => UrlPattern::param("/investments/"),
            Self::ListNotifications => UrlPattern::exact(NOTIFICATIONS_PATH),
            Self::MarkNotificationRead => UrlPattern::scoped("/notifications/", "/read"),
            Self::Upload => UrlPattern::exact(UPLOADS_PATH),
        }
    }

    pub fn rule(self, dataset: SharedDataset) -> RouteRule {
        RouteRule::new(self.method(), self.pattern(), Arc::new(BackendHandler::new(self, dataset)))
    }
}

/// The default route table over a shared dataset.
pub fn default_routes(dataset: &SharedDataset) -> Vec<RouteRule> {
    Endpoint::ALL.iter().map(|endpoint| endpoint.rule(Arc::clone(dataset))).collect()
}

/// Serves one [`Endpoint`] from the shared dataset
pub struct BackendHandler {
    endpoint: Endpoint,
    dataset: SharedDataset,
}

impl BackendHandler {
    pub fn new(endpoint: Endpoint, dataset: SharedDataset) -> Self {
        Self { endpoint, dataset }
    }
}

#[async_trait]
impl RouteHandler for BackendHandler {
    async fn handle(&self, request: MockRequest<'_>) -> Result<MockReply, MockFailure> {
        let mut data = self.dataset.lock().await;
        debug!(endpoint = ?self.endpoint, path = request.path, "mock backend handling request");

        match self.endpoint {
            Endpoint::Login => login(&mut data, request),
            Endpoint::Register => register(&mut data, request),
            Endpoint::Refresh => refresh(&mut data, request),
            Endpoint::Logout => logout(&mut data, request),
            Endpoint::Profile => profile(&data, request),
            Endpoint::UpdateProfile => update_profile(&mut data, request),
            Endpoint::ListInvestments => list_investments(&data, request),
            Endpoint::RegisterInvestment => register_investment(&mut data, request),
            Endpoint::InvestmentDetail => investment_detail(&data, request),
            Endpoint::ListNotifications => list_notifications(&data, request),
            Endpoint::MarkNotificationRead => mark_notification_read(&mut data, request),
            Endpoint::Upload => upload(&mut data, request),
        }
    }
}

type HandlerResult = Result<MockReply, MockFailure>;

fn to_body<T: Serialize>(value: &T) -> Result<Value, MockFailure> {
    serde_json::to_value(value).map_err(|err| MockFailure::internal(err.to_string()))
}

fn session_body(user: &MockUser, tokens: &IssuedTokens) -> Result<Value, MockFailure> {
    Ok(json!({
        "user": to_body(user)?,
        "accessToken": tokens.access_token,
        "refreshToken": tokens.refresh_token,
    }))
}

/// Id of the user owning the request's bearer token.
fn authorize(data: &MockDataset, request: &MockRequest<'_>) -> Result<String, MockFailure> {
    request
        .bearer_token()
        .and_then(|token| data.user_for_token(token))
        .map(|user| user.id.clone())
        .ok_or_else(|| MockFailure::unauthorized("Unauthorized"))
}

fn path_id<'a>(request: &MockRequest<'a>) -> Result<&'a str, MockFailure> {
    request.param.ok_or_else(|| MockFailure::bad_request("Missing resource id"))
}

fn login(data: &mut MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let (Some(email), Some(password)) = (request.field("email"), request.field("password")) else {
        return Err(MockFailure::bad_request("Email and password are required"));
    };

    let user = data
        .authenticate(email, password)
        .cloned()
        .ok_or_else(|| MockFailure::unauthorized("Invalid credentials"))?;
    let tokens = data.issue_tokens(&user.id);

    let mut body = session_body(&user, &tokens)?;
    body["message"] = json!("Login successful");
    Ok(MockReply::ok(body))
}

fn register(data: &mut MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let required = ["email", "password", "firstName", "lastName"];
    let missing: Vec<&str> =
        required.into_iter().filter(|name| request.field(name).is_none()).collect();
    if !missing.is_empty() {
        return Err(MockFailure::bad_request(format!("Missing required fields: {}", missing.join(", "))));
    }

    let field = |name: &str| request.field(name).unwrap_or_default().to_string();
    let user = data.create_user(NewUser {
        email: field("email"),
        password: field("password"),
        first_name: field("firstName"),
        last_name: field("lastName"),
        phone: request.field("phone").map(String::from),
    })?;
    let tokens = data.issue_tokens(&user.id);

    let mut body = session_body(&user, &tokens)?;
    body["message"] = json!("Registration successful");
    Ok(MockReply::created(body))
}

fn refresh(data: &mut MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let refresh_token = request
        .field("refreshToken")
        .ok_or_else(|| MockFailure::bad_request("Refresh token is required"))?;

    let tokens = data
        .rotate_tokens(refresh_token)
        .ok_or_else(|| MockFailure::unauthorized("Invalid refresh token"))?;

    Ok(MockReply::ok(json!({
        "accessToken": tokens.access_token,
        "refreshToken": tokens.refresh_token,
    })))
}

fn logout(data: &mut MockDataset, request: MockRequest<'_>) -> HandlerResult {
    data.revoke(request.bearer_token(), request.field("refreshToken"));
    Ok(MockReply::ok(json!({ "message": "Logged out" })))
}

fn profile(data: &MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let user_id = authorize(data, &request)?;
    let user = data.users.get(&user_id).ok_or_else(|| MockFailure::not_found("User not found"))?;
    Ok(MockReply::ok(to_body(user)?))
}

fn update_profile(data: &mut MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let user_id = authorize(data, &request)?;
    let user =
        data.users.get_mut(&user_id).ok_or_else(|| MockFailure::not_found("User not found"))?;

    if let Some(first_name) = request.field("firstName") {
        user.first_name = first_name.to_string();
    }
    if let Some(last_name) = request.field("lastName") {
        user.last_name = last_name.to_string();
    }
    if let Some(phone) = request.field("phone") {
        user.phone = Some(phone.to_string());
    }

    Ok(MockReply::ok(to_body(&*user)?))
}

fn list_investments(data: &MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let category = request.query("category").and_then(Value::as_str);
    let items = data
        .investments
        .iter()
        .filter(|investment| match category {
            Some(category) => investment.category == category,
            None => true,
        })
        .map(to_body)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MockReply::ok(json!({ "items": items, "total": items.len() })))
}

fn investment_detail(data: &MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let id = path_id(&request)?;
    let investment =
        data.investments.get(id).ok_or_else(|| MockFailure::not_found("Investment not found"))?;
    Ok(MockReply::ok(to_body(investment)?))
}

fn register_investment(data: &mut MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let user_id = authorize(data, &request)?;
    let id = path_id(&request)?;
    let investment =
        data.investments.get_mut(id).ok_or_else(|| MockFailure::not_found("Investment not found"))?;

    if investment.registrations.iter().any(|registration| registration.user_id == user_id) {
        return Err(MockFailure::conflict("Already registered for this investment"));
    }

    let amount = request
        .json()
        .and_then(|body| body.get("amount"))
        .and_then(Value::as_f64)
        .unwrap_or(investment.min_amount);
    if amount < investment.min_amount {
        return Err(MockFailure::bad_request(format!(
            "Minimum amount is {}",
            investment.min_amount
        )));
    }

    let registration = Registration {
        investment_id: investment.id.clone(),
        user_id,
        amount,
        registered_at: Utc::now(),
    };
    investment.registrations.push(registration.clone());

    let mut body = to_body(&registration)?;
    body["status"] = json!("registered");
    Ok(MockReply::created(body))
}

fn list_notifications(data: &MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let user_id = authorize(data, &request)?;
    let items = data
        .notifications
        .iter()
        .filter(|notification| notification.user_id == user_id)
        .map(to_body)
        .collect::<Result<Vec<_>, _>>()?;
    let unread = data
        .notifications
        .iter()
        .filter(|notification| notification.user_id == user_id && !notification.read)
        .count();

    Ok(MockReply::ok(json!({ "items": items, "unread": unread })))
}

fn mark_notification_read(data: &mut MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let user_id = authorize(data, &request)?;
    let id = path_id(&request)?;
    let notification = data
        .notifications
        .get_mut(id)
        .filter(|notification| notification.user_id == user_id)
        .ok_or_else(|| MockFailure::not_found("Notification not found"))?;

    notification.read = true;
    Ok(MockReply::ok(to_body(&*notification)?))
}

fn upload(data: &mut MockDataset, request: MockRequest<'_>) -> HandlerResult {
    let user_id = authorize(data, &request)?;

    let RequestBody::Multipart(form) = request.body() else {
        return Err(MockFailure::bad_request("Multipart body is required"));
    };
    let Some((file_name, content_type, size)) = form.parts().iter().find_map(|part| match part {
        MultipartPart::File { file_name, content_type, bytes, .. } => {
            Some((file_name.clone(), content_type.clone(), bytes.len()))
        }
        MultipartPart::Text { .. } => None,
    }) else {
        return Err(MockFailure::bad_request("A file part is required"));
    };

    let id = data.next_id("upload");
    let record = UploadRecord {
        url: format!("mock://uploads/{id}/{file_name}"),
        id,
        user_id,
        file_name,
        content_type,
        size,
        uploaded_at: Utc::now(),
    };
    data.uploads.insert(record.clone());

    Ok(MockReply::created(to_body(&record)?))
}

#[cfg(test)]
mod tests {
    use meridian_domain::{MultipartBody, RequestDescriptor};

    use super::*;
    use crate::mock::route::{inline_query, normalize_path};

    fn shared() -> SharedDataset {
        MockDataset::seeded().into_shared()
    }

    async fn call(
        dataset: &SharedDataset,
        endpoint: Endpoint,
        descriptor: &RequestDescriptor,
    ) -> HandlerResult {
        let path = normalize_path(&descriptor.url);
        let param = endpoint.pattern().capture(&path);
        let query = inline_query(&descriptor.url);
        let request = MockRequest { descriptor, path: &path, param, inline_query: &query };
        BackendHandler::new(endpoint, Arc::clone(dataset)).handle(request).await
    }

    fn post(url: &str, body: Value) -> RequestDescriptor {
        RequestDescriptor::new(HttpMethod::Post, url).with_body(RequestBody::Json(body))
    }

    fn signed(mut descriptor: RequestDescriptor, token: &str) -> RequestDescriptor {
        descriptor.set_header("Authorization", format!("Bearer {token}"));
        descriptor
    }

    async fn demo_token(dataset: &SharedDataset) -> String {
        dataset.lock().await.issue_tokens("user-1").access_token
    }

    #[test]
    fn every_endpoint_pattern_is_unique_per_method() {
        for (i, a) in Endpoint::ALL.iter().enumerate() {
            for b in &Endpoint::ALL[i + 1..] {
                assert!(
                    a.method() != b.method() || a.pattern() != b.pattern(),
                    "{a:?} and {b:?} collide"
                );
            }
        }
    }

    #[tokio::test]
    async fn login_with_demo_credentials_issues_tokens() {
        let dataset = shared();
        let reply = call(
            &dataset,
            Endpoint::Login,
            &post("/auth/login", json!({"email": "demo@meridian.app", "password": "password123"})),
        )
        .await
        .unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["user"]["email"], "demo@meridian.app");
        assert!(reply.body["accessToken"].as_str().unwrap().starts_with("mock-access-user-1"));
        assert_eq!(dataset.lock().await.live_sessions(), 1);
    }

    #[tokio::test]
    async fn login_failures() {
        let dataset = shared();

        let bad = call(
            &dataset,
            Endpoint::Login,
            &post("/auth/login", json!({"email": "bad@x.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(bad, Err(MockFailure::unauthorized("Invalid credentials")));

        let missing = call(&dataset, Endpoint::Login, &post("/auth/login", json!({}))).await;
        assert_eq!(missing.unwrap_err().status, 400);
    }

    #[tokio::test]
    async fn register_creates_user_and_rejects_duplicates() {
        let dataset = shared();
        let body = json!({
            "email": "new@meridian.app",
            "password": "secret",
            "firstName": "New",
            "lastName": "User",
        });

        let created = call(&dataset, Endpoint::Register, &post("/auth/register", body.clone()))
            .await
            .unwrap();
        assert_eq!(created.status, 201);
        assert_eq!(dataset.lock().await.users.len(), 2);

        let duplicate = call(&dataset, Endpoint::Register, &post("/auth/register", body)).await;
        assert_eq!(duplicate.unwrap_err().status, 409);

        let incomplete = call(
            &dataset,
            Endpoint::Register,
            &post("/auth/register", json!({"email": "x@y.z"})),
        )
        .await;
        let failure = incomplete.unwrap_err();
        assert_eq!(failure.status, 400);
        assert!(failure.message.contains("firstName"));
    }

    #[tokio::test]
    async fn protected_endpoints_require_live_session() {
        let dataset = shared();
        let anonymous = RequestDescriptor::new(HttpMethod::Get, "/users/profile");

        let denied = call(&dataset, Endpoint::Profile, &anonymous).await;
        assert_eq!(denied.unwrap_err().status, 401);

        let forged = signed(anonymous.clone(), "mock-access-user-1-999");
        assert_eq!(call(&dataset, Endpoint::Profile, &forged).await.unwrap_err().status, 401);

        let token = demo_token(&dataset).await;
        let reply = call(&dataset, Endpoint::Profile, &signed(anonymous, &token)).await.unwrap();
        assert_eq!(reply.body["firstName"], "Demo");
    }

    #[tokio::test]
    async fn register_investment_mutates_dataset_once() {
        let dataset = shared();
        let token = demo_token(&dataset).await;
        let request = signed(post("/investments/inv-2/register", json!({"amount": 1500})), &token);

        let reply = call(&dataset, Endpoint::RegisterInvestment, &request).await.unwrap();
        assert_eq!(reply.status, 201);
        assert_eq!(reply.body["status"], "registered");
        assert_eq!(dataset.lock().await.investments.get("inv-2").unwrap().registrations.len(), 1);

        let again = call(&dataset, Endpoint::RegisterInvestment, &request).await;
        assert_eq!(again.unwrap_err().status, 409);
    }

    #[tokio::test]
    async fn register_investment_enforces_minimum_and_existence() {
        let dataset = shared();
        let token = demo_token(&dataset).await;

        let low = signed(post("/investments/inv-1/register", json!({"amount": 10})), &token);
        assert_eq!(call(&dataset, Endpoint::RegisterInvestment, &low).await.unwrap_err().status, 400);

        let unknown = signed(post("/investments/inv-9/register", json!({})), &token);
        assert_eq!(
            call(&dataset, Endpoint::RegisterInvestment, &unknown).await.unwrap_err().status,
            404
        );
    }

    #[tokio::test]
    async fn investments_can_be_filtered_by_category() {
        let dataset = shared();
        let mut request = RequestDescriptor::new(HttpMethod::Get, "/investments");
        request.params.insert("category".into(), json!("energy"));

        let reply = call(&dataset, Endpoint::ListInvestments, &request).await.unwrap();

        assert_eq!(reply.body["total"], 1);
        assert_eq!(reply.body["items"][0]["id"], "inv-2");
    }

    #[tokio::test]
    async fn inline_category_filters_like_explicit_param() {
        let dataset = shared();
        let inline = RequestDescriptor::new(HttpMethod::Get, "/investments?category=energy");
        let mut explicit = RequestDescriptor::new(HttpMethod::Get, "/investments");
        explicit.params.insert("category".into(), json!("energy"));

        let from_url = call(&dataset, Endpoint::ListInvestments, &inline).await.unwrap();
        let from_params = call(&dataset, Endpoint::ListInvestments, &explicit).await.unwrap();

        assert_eq!(from_url.body["total"], 1);
        assert_eq!(from_url.body, from_params.body);
    }

    #[tokio::test]
    async fn mark_notification_read_persists_across_calls() {
        let dataset = shared();
        let token = demo_token(&dataset).await;

        let mark = signed(RequestDescriptor::new(HttpMethod::Put, "/notifications/notif-2/read"), &token);
        let reply = call(&dataset, Endpoint::MarkNotificationRead, &mark).await.unwrap();
        assert_eq!(reply.body["read"], true);

        let list = signed(RequestDescriptor::new(HttpMethod::Get, "/notifications"), &token);
        let reply = call(&dataset, Endpoint::ListNotifications, &list).await.unwrap();
        assert_eq!(reply.body["unread"], 1);
    }

    #[tokio::test]
    async fn upload_requires_a_file_part() {
        let dataset = shared();
        let token = demo_token(&dataset).await;

        let text_only = signed(
            RequestDescriptor::new(HttpMethod::Post, "/uploads")
                .with_body(RequestBody::Multipart(MultipartBody::new().text("kind", "id"))),
            &token,
        );
        assert_eq!(call(&dataset, Endpoint::Upload, &text_only).await.unwrap_err().status, 400);

        let with_file = signed(
            RequestDescriptor::new(HttpMethod::Post, "/uploads").with_body(RequestBody::Multipart(
                MultipartBody::new().file("file", "id.png", Some("image/png".into()), vec![0; 4]),
            )),
            &token,
        );
        let reply = call(&dataset, Endpoint::Upload, &with_file).await.unwrap();
        assert_eq!(reply.body["size"], 4);
        assert_eq!(dataset.lock().await.uploads.len(), 1);
    }

    #[tokio::test]
    async fn logout_revokes_session() {
        let dataset = shared();
        let token = demo_token(&dataset).await;

        let reply = call(&dataset, Endpoint::Logout, &signed(post("/auth/logout", json!({})), &token))
            .await
            .unwrap();

        assert_eq!(reply.body["message"], "Logged out");
        assert_eq!(dataset.lock().await.live_sessions(), 0);
    }
}
