use serde::{Deserialize, Serialize};
use validator::Validate;

/// A registered grid consumer shown on the dashboard map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Consumer {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "db", sqlx(rename = "type"))]
    pub kind: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Payload for creating or replacing a consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewConsumer {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 20))]
    pub kind: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewConsumer {
    pub fn into_consumer(self, id: i32) -> Consumer {
        Consumer {
            id,
            name: self.name,
            kind: self.kind,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
