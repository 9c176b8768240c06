//! Consumer notification

use std::time::Duration;

use taskflow_core::{AppError, TaskType, TaskValue};

/// Tells the consumer that a task with `(task_type, value)` may be claimable.
///
/// Delivery is best-effort; the stored task does not depend on it.
#[async_trait::async_trait]
pub trait TaskNotifier: Send + Sync {
    async fn notify(&self, task_type: TaskType, value: TaskValue) -> Result<(), AppError>;
}

/// Posts `type` and `value` as a urlencoded form to the consumer's `/consume`.
#[derive(Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    consumer_url: String,
}

impl HttpNotifier {
    pub fn new(consumer_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            consumer_url: consumer_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl TaskNotifier for HttpNotifier {
    async fn notify(&self, task_type: TaskType, value: TaskValue) -> Result<(), AppError> {
        let form = [("type", task_type.to_string()), ("value", value.to_string())];

        let response = self
            .client
            .post(&self.consumer_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                AppError::Notification(format!(
                    "Request to {} failed: {}",
                    self.consumer_url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Notification(format!(
                "Consumer answered {} for type {} value {}",
                status, task_type, value
            )));
        }

        tracing::debug!(task_type = %task_type, value = %value, "Consumer notified");
        Ok(())
    }
}
