use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of the assistant's JSONL activity log.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub kind: String,

    pub form_id: Option<String>,
    pub detail: Option<String>,
    pub count: Option<usize>,
    pub correlation_id: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, kind: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            step,
            kind: kind.to_string(),
            form_id: None,
            detail: None,
            count: None,
            correlation_id: None,
        }
    }

    pub fn with_form(mut self, form_id: &str) -> Self {
        self.form_id = Some(form_id.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_correlation(mut self, id: impl ToString) -> Self {
        self.correlation_id = Some(id.to_string());
        self
    }
}
