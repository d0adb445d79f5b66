use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ClientError, HttpFailure, Result};

const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Response as received from the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }
}

/// Parsed response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Parse by content type: JSON when declared (empty body reads as `{}`),
    /// raw text otherwise
    pub fn parse(response: &RawResponse) -> std::result::Result<Payload, serde_json::Error> {
        if !response.is_json() {
            return Ok(Payload::Text(
                String::from_utf8_lossy(&response.body).into_owned(),
            ));
        }
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload::Json(Value::Object(Map::new())));
        }
        serde_json::from_slice(&response.body).map(Payload::Json)
    }

    /// Lenient parse for error bodies; undecodable JSON falls back to text
    pub fn parse_lossy(response: &RawResponse) -> Payload {
        Self::parse(response).unwrap_or_else(|_| {
            Payload::Text(String::from_utf8_lossy(&response.body).into_owned())
        })
    }

    /// The `message` field of a JSON object body
    pub fn message(&self) -> Option<&str> {
        match self {
            Payload::Json(Value::Object(map)) => map.get("message").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
        }
    }

    /// Deserialize the body into the caller's type; text bodies deserialize
    /// as a JSON string
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_value())
            .map_err(|e| ClientError::Unknown(format!("Unexpected response shape: {}", e)))
    }
}

/// Successful response returned by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    pub data: Payload,
}

/// Fixed message for well-known statuses
pub fn status_message(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "The request was invalid.",
        401 => "Authentication is required. Please log in again.",
        403 => "You do not have permission to access this resource.",
        404 => "The requested resource could not be found.",
        409 => "The request conflicts with the current state of the resource.",
        422 => "The submitted data could not be processed.",
        429 => "Too many requests. Please try again later.",
        500 => "A server error occurred. Please try again later.",
        502 | 503 => "The service is temporarily unavailable. Please try again later.",
        504 => "The server took too long to respond. Please try again later.",
        _ => return None,
    };
    Some(message)
}

/// Build the typed error for a non-2xx response
pub fn http_error(response: &RawResponse) -> ClientError {
    let body = Payload::parse_lossy(response);
    let message = status_message(response.status)
        .map(str::to_string)
        .or_else(|| body.message().map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());

    ClientError::Http(Box::new(HttpFailure {
        status: response.status,
        status_text: response.status_text.clone(),
        body,
        message,
    }))
}
