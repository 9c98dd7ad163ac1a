use std::sync::Arc;

use crate::forecast::repository::{ForecastRepository, RepositoryError};
use crate::forecast::{Forecast, ForecastId, NewForecast};

/// Forecast CRUD in domain terms, backed by any [`ForecastRepository`].
#[derive(Clone)]
pub struct ForecastService {
    repository: Arc<dyn ForecastRepository>,
}

impl ForecastService {
    pub fn new(repository: Arc<dyn ForecastRepository>) -> ForecastService {
        ForecastService { repository }
    }

    pub async fn get_all(&self) -> Result<Vec<Forecast>, RepositoryError> {
        let records = self.repository.get_all().await?;
        Ok(records.into_iter().map(Forecast::from).collect())
    }

    pub async fn get_by_id(&self, id: ForecastId) -> Result<Option<Forecast>, RepositoryError> {
        Ok(self.repository.get_by_id(id).await?.map(Forecast::from))
    }

    pub async fn create(&self, forecast: NewForecast) -> Result<ForecastId, RepositoryError> {
        let id = self.repository.create(forecast.into()).await?;
        log::debug!("Created forecast {}", id);
        Ok(id)
    }

    /// Returns `false` when no forecast with the given id exists.
    pub async fn update(&self, forecast: Forecast) -> Result<bool, RepositoryError> {
        self.repository.update(forecast.into()).await
    }

    /// Returns `false` when no forecast with `id` exists.
    pub async fn delete(&self, id: ForecastId) -> Result<bool, RepositoryError> {
        self.repository.delete(id).await
    }
}
