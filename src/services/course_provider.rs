use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::core::config::Settings;
use crate::services::errors::WorkflowError;

const SERVICE: &str = "course provider";

/// Source of class-section data (activities, questions, the student's answers) for a course.
#[async_trait]
pub(crate) trait CourseProvider: Send + Sync {
    /// Raw class-section list for `course_id`, fetched on behalf of the token holder.
    async fn fetch_class_sections(&self, course_id: &str, token: &str)
        -> Result<Value, WorkflowError>;
}

#[derive(Debug, Clone)]
pub(crate) struct HttpCourseProvider {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl HttpCourseProvider {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let provider = settings.course_provider();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(provider.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            page_size: provider.page_size,
        })
    }
}

/// Builds the class-section listing URL. The course id is encoded as a single path segment.
pub(crate) fn class_sections_url(
    base_url: &str,
    course_id: &str,
    page_size: u32,
) -> Result<Url, WorkflowError> {
    if matches!(course_id, "" | "." | "..") {
        return Err(WorkflowError::invalid(format!("Invalid course id {course_id:?}")));
    }

    let mut url = Url::parse(base_url)
        .map_err(|err| WorkflowError::invalid(format!("Invalid course provider URL: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| WorkflowError::invalid("Course provider URL cannot carry a path"))?
        .pop_if_empty()
        .extend(["v2", "courses", course_id, "class-sections"]);
    url.query_pairs_mut()
        .append_pair("recordsPerPage", &page_size.to_string())
        .append_pair("pageNumber", "1")
        .append_pair("excludeEmptySessions", "1")
        .append_pair("expandChild", "activities")
        .append_pair("expandChild", "questions")
        .append_pair("expandChild", "userQuestions")
        .append_pair("expandChild", "results");
    Ok(url)
}

/// Success bodies that are not JSON are malformed payloads, not transport failures.
fn decode_payload(body: &str) -> Result<Value, WorkflowError> {
    serde_json::from_str(body)
        .map_err(|err| WorkflowError::invalid(format!("Malformed course provider payload: {err}")))
}

#[async_trait]
impl CourseProvider for HttpCourseProvider {
    async fn fetch_class_sections(
        &self,
        course_id: &str,
        token: &str,
    ) -> Result<Value, WorkflowError> {
        let url = class_sections_url(&self.base_url, course_id, self.page_size)?;
        tracing::info!(course_id = %course_id, "Fetching class sections from course provider");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| WorkflowError::transport(SERVICE, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(course_id = %course_id, status = status.as_u16(), "Course provider rejected request");
            return Err(WorkflowError::Upstream {
                service: SERVICE,
                status: Some(status.as_u16()),
                body,
            });
        }

        let body = response.text().await.map_err(|err| WorkflowError::transport(SERVICE, err))?;
        decode_payload(&body)
    }
}
