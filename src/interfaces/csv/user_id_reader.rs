use crate::error::{PayoutError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct UserIdRow {
    user_id: String,
}

/// Reads organizer ids from a CSV with a `user_id` column.
///
/// Accepts the admin listing output as-is: extra columns are ignored, so an
/// exported pending queue can be trimmed by hand and fed to bulk activation.
pub struct UserIdReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> UserIdReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields each non-empty id.
    pub fn user_ids(self) -> impl Iterator<Item = Result<String>> {
        self.reader
            .into_deserialize::<UserIdRow>()
            .map(|result| result.map(|row| row.user_id).map_err(PayoutError::from))
            .filter(|result| !matches!(result, Ok(id) if id.is_empty()))
    }
}
