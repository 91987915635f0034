//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::filters;
use crate::middleware::OptionalAccount;
use crate::models::CurrentAccount;
use crate::services::routing::Destination;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct LandingTemplate {
    pub account: Option<CurrentAccount>,
    /// Where the signed-in account's dashboard lives.
    pub dashboard: Option<&'static str>,
}

/// Display the landing page.
///
/// Anonymous visitors get links to both login pages and signup; signed-in
/// visitors get a link to their dashboard.
pub async fn landing(OptionalAccount(account): OptionalAccount) -> impl IntoResponse {
    let dashboard = account
        .as_ref()
        .map(|account| Destination::for_role(account.role).path());

    LandingTemplate { account, dashboard }
}
