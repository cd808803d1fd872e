use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct CreateCompetitionRequest {
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub apply_till: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCompetitionRequest {
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub apply_till: OffsetDateTime,
}
