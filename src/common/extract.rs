use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::common::error::AppError;

// Same as `Json<T>`, but a body that fails to decode (unknown enum value,
// wrong type, malformed JSON) is answered with our validation error shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::ValidationError(vec![rejection.body_text()])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header::CONTENT_TYPE};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    enum Flavor {
        Plain,
    }

    #[derive(Debug, Deserialize)]
    struct Payload {
        flavor: Flavor,
    }

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn decodes_valid_bodies() {
        let JsonBody(payload) = JsonBody::<Payload>::from_request(request(r#"{"flavor":"plain"}"#), &())
            .await
            .unwrap();
        assert!(matches!(payload.flavor, Flavor::Plain));
    }

    #[tokio::test]
    async fn unknown_enum_values_become_validation_errors() {
        let result = JsonBody::<Payload>::from_request(request(r#"{"flavor":"spicy"}"#), &()).await;
        match result {
            Err(AppError::ValidationError(details)) => {
                assert_eq!(details.len(), 1);
                assert!(details[0].contains("unknown variant"));
            }
            _ => panic!("expected a validation error"),
        }
    }
}
