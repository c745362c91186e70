use serde::Deserialize;

/// Query parameters for the list endpoint
///
/// `limit` stays a raw string so an unparseable value falls back to the
/// default instead of rejecting the request.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Maximum number of items to return (default 50)
    pub limit: Option<String>,
}
