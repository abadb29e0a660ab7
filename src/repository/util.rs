//! Column codecs and error conversions shared by the repositories.

use diesel::QueryableByName;

use super::pool::DbError;

/// Wrap a failure from outside diesel (connection setup, the migration
/// runner) so repository calls keep a single error type.
pub fn to_diesel_error(e: impl std::fmt::Display) -> DbError {
    DbError::QueryBuilderError(e.to_string().into())
}

/// Serialize a value into a JSON text column.
pub fn to_json_column<T: serde::Serialize>(value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|e| DbError::SerializationError(Box::new(e)))
}

/// Deserialize a JSON text column.
pub fn from_json_column<T: serde::de::DeserializeOwned>(
    text: &str,
) -> Result<T, DbError> {
    serde_json::from_str(text).map_err(|e| DbError::DeserializationError(Box::new(e)))
}

/// Row id of the most recent insert on this connection.
#[derive(QueryableByName)]
pub struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    pub id: i64,
}

/// SQL that yields [`LastInsertRowId`].
pub const LAST_INSERT_ROWID: &str = "SELECT last_insert_rowid()";
