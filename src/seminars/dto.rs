use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct CreateSeminarRequest {
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub apply_till: OffsetDateTime,
    pub term: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSeminarRequest {
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub apply_till: OffsetDateTime,
    pub term: i32,
}
