use super::av::AspectClass;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand_core::{OsRng, RngCore};

/// Bytes of entropy per identifier.
pub const RANDOM_ID_BYTES: usize = 32;

/// Draws `RANDOM_ID_BYTES` from the OS source and encodes them as unpadded
/// URL-safe base64.
pub fn random_id() -> Result<String, rand_core::Error> {
    let mut bytes = [0u8; RANDOM_ID_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Name under which an uploaded asset is stored and published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    prefix: Option<AspectClass>,
    id: String,
    extension: String,
}

impl StorageKey {
    pub fn generate(extension: &str) -> Result<Self, rand_core::Error> {
        Ok(Self {
            prefix: None,
            id: random_id()?,
            extension: extension.to_string(),
        })
    }

    pub fn with_prefix(mut self, aspect: AspectClass) -> Self {
        self.prefix = Some(aspect);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prefix(&self) -> Option<AspectClass> {
        self.prefix
    }

    /// `<id>.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }

    /// Path relative to the storage root, also used as the object key.
    pub fn object_path(&self) -> String {
        match self.prefix {
            Some(aspect) => format!("{}/{}", aspect.prefix(), self.file_name()),
            None => self.file_name(),
        }
    }
}
