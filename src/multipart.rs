//! `multipart/form-data` bodies.
//!
//! The request body is already buffered by the time a handler runs, so the
//! whole payload is fed to [`multer`] as a single chunk and split into text
//! fields and file attachments up front.

use std::convert::Infallible;
use std::path::Path;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::DecodeError;

/// A parsed `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct Multipart {
    fields: Vec<(String, String)>,
    files: Vec<FormFile>,
}

/// One uploaded file part.
#[derive(Debug, Clone)]
pub struct FormFile {
    field: String,
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

impl Multipart {
    /// Splits `body` on `boundary`.
    ///
    /// Parts carrying a `filename` become [`FormFile`]s; every other named
    /// part is read as UTF-8 text. Unnamed parts are skipped.
    pub async fn parse(boundary: &str, body: Bytes) -> Result<Self, DecodeError> {
        let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
        let mut parts = multer::Multipart::new(stream, boundary);
        let mut form = Self::default();

        while let Some(part) = parts.next_field().await? {
            let Some(name) = part.name().map(str::to_owned) else { continue };

            match part.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = part.content_type().map(ToString::to_string);
                    let data = part.bytes().await?;
                    form.files.push(FormFile { field: name, file_name, content_type, data });
                }
                None => {
                    let value = part.text().await?;
                    form.fields.push((name, value));
                }
            }
        }

        Ok(form)
    }

    /// First text value submitted under `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// First file submitted under the field `name`.
    pub fn file(&self, name: &str) -> Option<&FormFile> {
        self.files.iter().find(|f| f.field == name)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[FormFile] {
        &self.files
    }

    /// Removes and returns the first file submitted under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<FormFile> {
        let idx = self.files.iter().position(|f| f.field == name)?;
        Some(self.files.remove(idx))
    }

    /// Decodes the text fields into `T` with the same rules as an
    /// `application/x-www-form-urlencoded` body. File parts are ignored.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        let encoded = serde_urlencoded::to_string(&self.fields)
            .map_err(|e| <serde_urlencoded::de::Error as serde::de::Error>::custom(e))?;
        Ok(serde_urlencoded::from_str(&encoded)?)
    }
}

impl FormFile {
    /// The form field the file was submitted under.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The client-supplied file name, exactly as sent.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Writes the file contents to `path`, creating or truncating it.
    pub async fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::write(path, &self.data).await
    }

    /// Writes the file into `dir` under its own name.
    ///
    /// Only the final component of the client-supplied name is used, so a
    /// name like `../../etc/passwd` lands in `dir` as `passwd`.
    pub async fn save_into(&self, dir: impl AsRef<Path>) -> std::io::Result<std::path::PathBuf> {
        let name = Path::new(&self.file_name)
            .file_name()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "upload has no usable file name"))?;
        let path = dir.as_ref().join(name);
        self.save(&path).await?;
        Ok(path)
    }
}
