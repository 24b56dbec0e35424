use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerLookupQuery {
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertCustomerRequest {
    pub phone: String,
    pub name: String,
    pub address: Option<String>,
}
