//! Request body extraction

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::auth::validation::INVALID_DATA;
use crate::error::Error;

/// `Json<T>` whose rejection is the usual `400 {"message":"Invalid data"}`
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "rejecting request body");
                Err(Error::bad_request(INVALID_DATA))
            }
        }
    }
}

/// Parse an id taken from the path or query string
pub fn parse_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::bad_request(INVALID_DATA))
}
