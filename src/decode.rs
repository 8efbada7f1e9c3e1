//! Content-type driven body decoding.
//!
//! A `Content-Type` header is normalized into a [`BodyKind`] once; each kind
//! then knows how to turn raw bytes into any `serde` shape:
//!
//! | Content-Type | Kind | Decoder |
//! |---|---|---|
//! | `application/json`, `*/*+json` | [`BodyKind::Json`] | `serde_json` |
//! | `application/xml`, `text/xml`, `*/*+xml` | [`BodyKind::Xml`] | `quick-xml` |
//! | `application/x-www-form-urlencoded` | [`BodyKind::Form`] | `serde_urlencoded` |
//! | `multipart/form-data; boundary=…` | [`BodyKind::Multipart`] | `multer`, then form rules |
//!
//! One struct with plain field names therefore accepts the same logical
//! payload in all four encodings:
//!
//! ```rust
//! # async fn run() -> Result<(), senda::DecodeError> {
//! use bytes::Bytes;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Register { username: String }
//!
//! let json: Register = senda::decode(Some("application/json"), Bytes::from_static(br#"{"username":"Lev"}"#)).await?;
//! let form: Register = senda::decode(Some("application/x-www-form-urlencoded"), Bytes::from_static(b"username=Lev")).await?;
//! let xml:  Register = senda::decode(Some("application/xml"), Bytes::from_static(b"<r><username>Lev</username></r>")).await?;
//! assert_eq!(json.username, form.username);
//! assert_eq!(form.username, xml.username);
//! # Ok(()) }
//! ```

use bytes::Bytes;
use mime::Mime;
use serde::de::DeserializeOwned;

use crate::error::DecodeError;
use crate::multipart::Multipart;

/// A request body encoding senda knows how to decode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BodyKind {
    Json,
    Xml,
    Form,
    Multipart { boundary: String },
}

impl BodyKind {
    /// Classifies a raw `Content-Type` header value.
    ///
    /// Parameters other than `boundary` (e.g. `charset`) are ignored.
    pub fn from_content_type(content_type: &str) -> Result<Self, DecodeError> {
        let unsupported = || DecodeError::UnsupportedContentType(content_type.to_owned());
        let parsed: Mime = content_type.trim().parse().map_err(|_| unsupported())?;

        let (ty, sub, suffix) = (parsed.type_(), parsed.subtype(), parsed.suffix());

        if (ty == mime::APPLICATION && sub == mime::JSON) || suffix == Some(mime::JSON) {
            Ok(Self::Json)
        } else if ((ty == mime::APPLICATION || ty == mime::TEXT) && sub == mime::XML) || suffix == Some(mime::XML) {
            Ok(Self::Xml)
        } else if ty == mime::APPLICATION && sub == mime::WWW_FORM_URLENCODED {
            Ok(Self::Form)
        } else if ty == mime::MULTIPART && sub == mime::FORM_DATA {
            let boundary = parsed
                .get_param(mime::BOUNDARY)
                .ok_or(DecodeError::Multipart(multer::Error::NoBoundary))?;
            Ok(Self::Multipart { boundary: boundary.as_str().to_owned() })
        } else {
            Err(unsupported())
        }
    }

    /// Decodes `body` into `T` according to this kind.
    pub async fn decode<T: DeserializeOwned>(&self, body: Bytes) -> Result<T, DecodeError> {
        match self {
            Self::Json => Ok(serde_json::from_slice(&body)?),
            Self::Xml => Ok(quick_xml::de::from_str(std::str::from_utf8(&body)?)?),
            Self::Form => Ok(serde_urlencoded::from_bytes(&body)?),
            Self::Multipart { boundary } => Multipart::parse(boundary, body).await?.deserialize(),
        }
    }
}

/// Decodes `body` into `T`, choosing the decoder from `content_type`.
///
/// `None` (no header at all) is reported as
/// [`DecodeError::MissingContentType`], never guessed.
pub async fn decode<T: DeserializeOwned>(content_type: Option<&str>, body: Bytes) -> Result<T, DecodeError> {
    let content_type = content_type.ok_or(DecodeError::MissingContentType)?;
    let kind = BodyKind::from_content_type(content_type)?;
    kind.decode(body).await.inspect_err(|e| {
        tracing::debug!(content_type, error = %e, "body decode failed");
    })
}
