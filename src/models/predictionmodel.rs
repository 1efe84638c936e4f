use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published prediction. This is the content the premium gate protects;
/// authoring and editing happen outside this service.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Prediction {
    pub id: String,
    pub sport: String,
    pub market: String,
    pub market_value: String,
    pub juice: String,
    pub winning_probability: f64,
    pub match_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
