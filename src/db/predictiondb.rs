use async_trait::async_trait;

use super::db::DBClient;
use crate::models::predictionmodel::Prediction;

#[async_trait]
pub trait PredictionExt {
    async fn get_predictions(
        &self,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Prediction>, sqlx::Error>;

    async fn get_prediction(&self, id: &str) -> Result<Option<Prediction>, sqlx::Error>;
}

#[async_trait]
impl PredictionExt for DBClient {
    async fn get_predictions(
        &self,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Prediction>, sqlx::Error> {
        let offset = (page - 1) * limit as u32;

        sqlx::query_as::<_, Prediction>(
            r#"
            SELECT * FROM predictions
            ORDER BY match_date DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_prediction(&self, id: &str) -> Result<Option<Prediction>, sqlx::Error> {
        sqlx::query_as::<_, Prediction>(r#"SELECT * FROM predictions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
