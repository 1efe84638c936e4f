use serde::{Deserialize, Serialize};

use crate::models::predictionmodel::Prediction;

use super::premiumdtos::timestamp_ns;

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionDto {
    pub id: String,
    pub sport: String,
    pub market: String,
    #[serde(rename = "marketValue")]
    pub market_value: String,
    pub juice: String,
    #[serde(rename = "winningProbability")]
    pub winning_probability: f64,
    #[serde(rename = "matchDate")]
    pub match_date: i64,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl PredictionDto {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        PredictionDto {
            id: prediction.id.clone(),
            sport: prediction.sport.clone(),
            market: prediction.market.clone(),
            market_value: prediction.market_value.clone(),
            juice: prediction.juice.clone(),
            winning_probability: prediction.winning_probability,
            match_date: timestamp_ns(prediction.match_date),
            created_at: timestamp_ns(prediction.created_at),
        }
    }

    pub fn from_predictions(predictions: &[Prediction]) -> Vec<PredictionDto> {
        predictions.iter().map(PredictionDto::from_prediction).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionListResponseDto {
    pub status: String,
    pub predictions: Vec<PredictionDto>,
    pub results: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponseDto {
    pub status: String,
    pub data: PredictionDto,
}
