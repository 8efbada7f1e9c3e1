//! Unified error type.
//!
//! Every fallible operation in senda returns [`Error`]. Handlers propagate it
//! with `?`; [`IntoResponse`](crate::IntoResponse) turns it into the matching
//! HTTP status, so a handler signature of `Result<String, Error>` is enough.

use http::{Method, StatusCode};

/// The error type returned by senda's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("invalid route `{pattern}`: {reason}")]
    InvalidRoute { pattern: String, reason: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("there is no uploaded file associated with the key `{0}`")]
    MissingFormFile(String),

    #[error("no state of type `{0}` was registered on the router")]
    MissingState(&'static str),

    #[error("invalid socket address: {0}")]
    InvalidAddr(#[from] std::net::AddrParseError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The HTTP status this error is reported as.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Decode(e) => e.status(),
            Self::MissingFormFile(_) => StatusCode::BAD_REQUEST,
            Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidRoute { .. } | Self::MissingState(_) | Self::InvalidAddr(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// A request body could not be decoded into the requested shape.
///
/// Unsupported or missing content types are kept apart from malformed
/// payloads: the former is the client picking a format we do not speak
/// (`415`), the latter is a broken body in a format we do speak (`400`).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("request has no content-type")]
    MissingContentType,

    #[error("unsupported content-type `{0}`")]
    UnsupportedContentType(String),

    #[error("malformed json body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed xml body: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("malformed form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),

    #[error("body is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl DecodeError {
    /// `true` when the content type was understood but the payload was not.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::MissingContentType | Self::UnsupportedContentType(_))
    }

    pub fn status(&self) -> StatusCode {
        if self.is_malformed() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_not_malformed() {
        let e = DecodeError::UnsupportedContentType("text/csv".into());
        assert!(!e.is_malformed());
        assert_eq!(Error::from(e).status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(Error::from(DecodeError::MissingContentType).status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = DecodeError::from(e);
        assert!(e.is_malformed());
        assert_eq!(Error::from(e).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn io_not_found_maps_to_404() {
        let e = Error::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        let e = Error::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn route_not_found_message() {
        let e = Error::RouteNotFound { method: Method::GET, path: "/nope".into() };
        assert_eq!(e.to_string(), "no route for GET /nope");
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
    }
}
