use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::{config::Config, errors::AppResult};

/// A lesson as the course service knows it. The queue normalizer treats this
/// list as ground truth for which lesson items may exist.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseLesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub order: u32,
}

/// Canonical lesson list per course, owned by the course/lesson collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LessonProvider: Send + Sync {
    async fn lessons_for_course(&self, course_id: &str) -> AppResult<Vec<CourseLesson>>;
}

/// Purchase/entitlement collaborator. Consulted only to block deletion of a
/// template still embedded in a purchased course.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    async fn has_completed_purchase(&self, course_id: &str) -> AppResult<bool>;
}

pub struct HttpLessonProvider {
    client: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl HttpLessonProvider {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(5))
                .timeout(Duration::from_secs(15))
                .build()?,
            base_url: config.lessons_base_url.trim_end_matches('/').to_string(),
            api_token: config.store_api_token.clone(),
        })
    }
}

#[async_trait]
impl LessonProvider for HttpLessonProvider {
    async fn lessons_for_course(&self, course_id: &str) -> AppResult<Vec<CourseLesson>> {
        let url = format!("{}/courses/{}/lessons", self.base_url, course_id);
        let lessons = self
            .client
            .get(url)
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<CourseLesson>>()
            .await?;
        Ok(lessons)
    }
}

pub struct HttpEntitlementProvider {
    client: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl HttpEntitlementProvider {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(5))
                .timeout(Duration::from_secs(15))
                .build()?,
            base_url: config.purchases_base_url.trim_end_matches('/').to_string(),
            api_token: config.store_api_token.clone(),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseSummary {
    has_completed_purchase: bool,
}

#[async_trait]
impl EntitlementProvider for HttpEntitlementProvider {
    async fn has_completed_purchase(&self, course_id: &str) -> AppResult<bool> {
        let url = format!("{}/courses/{}/purchases/summary", self.base_url, course_id);
        let summary = self
            .client
            .get(url)
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?
            .error_for_status()?
            .json::<PurchaseSummary>()
            .await?;
        Ok(summary.has_completed_purchase)
    }
}
