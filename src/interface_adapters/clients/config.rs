// HTTP side of the simulation server: world geometry at bootstrap, tuning
// while a battle runs. Tuning posts are fire-and-forget from the operator's
// point of view; failures are logged and never block the display.

use crate::domain::WorldDimensions;
use crate::use_cases::{AiLevel, TuningRequest};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Response of GET /config/world.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WorldConfigDto {
    pub world_width: f64,
    pub world_height: f64,
}

#[derive(Debug, Serialize)]
struct SpeedSettingDto {
    multiplier: f64,
}

#[derive(Debug, Serialize)]
struct AiLevelSettingDto {
    level: AiLevelDto,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum AiLevelDto {
    Basic,
    Normal,
    Advanced,
    Adaptive,
}

impl From<AiLevel> for AiLevelDto {
    fn from(level: AiLevel) -> Self {
        match level {
            AiLevel::Basic => AiLevelDto::Basic,
            AiLevel::Normal => AiLevelDto::Normal,
            AiLevel::Advanced => AiLevelDto::Advanced,
            AiLevel::Adaptive => AiLevelDto::Adaptive,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Unreachable,
    BadStatus(u16),
    InvalidWorld { width: f64, height: f64 },
}

// Thin reqwest client for the simulation config endpoints.
#[derive(Clone)]
pub struct ConfigClient {
    http: reqwest::Client,
    base_url: String,
}

impl ConfigClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn fetch_world(&self) -> Result<WorldDimensions, ConfigError> {
        let url = format!("{}/config/world", self.base_url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|_| ConfigError::Unreachable)?;

        if !response.status().is_success() {
            return Err(ConfigError::BadStatus(response.status().as_u16()));
        }

        let dto = response
            .json::<WorldConfigDto>()
            .await
            .map_err(|_| ConfigError::Unreachable)?;
        world_from(dto)
    }

    /// Bootstrap fetch with a bounded retry. Rendering cannot start without
    /// world extents, so the caller decides what to show when this fails.
    pub async fn fetch_world_with_retry(
        &self,
        attempts: u32,
        delay: Duration,
    ) -> Result<WorldDimensions, ConfigError> {
        let attempts = attempts.max(1);
        let mut tried = 0;
        loop {
            tried += 1;
            match self.fetch_world().await {
                Ok(world) => {
                    info!(
                        width = world.width(),
                        height = world.height(),
                        "world config fetched"
                    );
                    return Ok(world);
                }
                Err(e) if tried < attempts => {
                    warn!(
                        attempt = tried,
                        attempts,
                        error = ?e,
                        "world config fetch failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(attempts, error = ?e, "world config fetch failed; giving up");
                    return Err(e);
                }
            }
        }
    }

    pub async fn set_speed(&self, multiplier: f64) -> Result<(), ConfigError> {
        let url = format!("{}/config/speed", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&SpeedSettingDto { multiplier })
            .send()
            .await
            .map_err(|_| ConfigError::Unreachable)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ConfigError::BadStatus(response.status().as_u16()))
        }
    }

    pub async fn set_ai_level(&self, level: AiLevel) -> Result<(), ConfigError> {
        let url = format!("{}/config/ai_level", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&AiLevelSettingDto {
                level: level.into(),
            })
            .send()
            .await
            .map_err(|_| ConfigError::Unreachable)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ConfigError::BadStatus(response.status().as_u16()))
        }
    }
}

fn world_from(dto: WorldConfigDto) -> Result<WorldDimensions, ConfigError> {
    WorldDimensions::new(dto.world_width, dto.world_height).ok_or(ConfigError::InvalidWorld {
        width: dto.world_width,
        height: dto.world_height,
    })
}

/// Drains tuning requests for as long as the channel lives. The simulation
/// server applies whatever arrives; nothing here waits for acknowledgement.
pub async fn tuning_task(client: ConfigClient, mut tuning_rx: mpsc::Receiver<TuningRequest>) {
    while let Some(request) = tuning_rx.recv().await {
        let result = match request {
            TuningRequest::Speed { multiplier } => client.set_speed(multiplier).await,
            TuningRequest::AiLevel { level } => client.set_ai_level(level).await,
        };
        if let Err(e) = result {
            warn!(error = ?e, "tuning request failed");
        }
    }
}
