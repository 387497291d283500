use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::resource::{Column, FormFields, Resource, ResourceKind};
use crate::util::{require, validate_email, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    #[default]
    Unread,
    Read,
    /// Answered by an admin. The content API calls this `resolved`.
    #[serde(alias = "resolved")]
    Replied,
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackStatus::Unread => f.write_str("unread"),
            FeedbackStatus::Read => f.write_str("read"),
            FeedbackStatus::Replied => f.write_str("replied"),
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unread" => Ok(FeedbackStatus::Unread),
            "read" => Ok(FeedbackStatus::Read),
            "replied" | "resolved" => Ok(FeedbackStatus::Replied),
            other => Err(ValidationError::InvalidChoice {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// A message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: FeedbackStatus,
    #[serde(default, alias = "admin_response", skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_date: Option<DateTime<Utc>>,
}

impl Feedback {
    /// A fresh, unread message stamped with `date`.
    pub fn new(
        name: &str,
        email: &str,
        message: &str,
        date: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let email = require("Email", email)?;
        validate_email(email)?;
        Ok(Self {
            id: None,
            name: require("Name", name)?.to_string(),
            email: email.to_string(),
            message: require("Message", message)?.to_string(),
            date,
            status: FeedbackStatus::Unread,
            response: None,
            response_date: None,
        })
    }

    pub fn is_unread(&self) -> bool {
        self.status == FeedbackStatus::Unread
    }

    /// Store the admin's answer and mark the message replied.
    pub fn record_reply(&mut self, text: &str, at: DateTime<Utc>) {
        self.response = Some(text.trim().to_string());
        self.response_date = Some(at);
        self.status = FeedbackStatus::Replied;
    }
}

impl Resource for Feedback {
    const KIND: ResourceKind = ResourceKind::Feedback;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_form(form: &FormFields) -> Result<Self, ValidationError> {
        let date = match form.optional("date") {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| ValidationError::InvalidChoice {
                    field: "date",
                    value: raw.to_string(),
                })?,
            None => Utc::now(),
        };
        let mut feedback = Feedback::new(
            form.get("name"),
            form.get("email"),
            form.get("message"),
            date,
        )?;
        if let Some(status) = form.optional("status") {
            feedback.status = status.parse()?;
        }
        feedback.response = form
            .optional("response")
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        if let Some(raw) = form.optional("response_date") {
            let at = DateTime::parse_from_rfc3339(raw).map_err(|_| ValidationError::InvalidChoice {
                field: "response_date",
                value: raw.to_string(),
            })?;
            feedback.response_date = Some(at.with_timezone(&Utc));
        }
        Ok(feedback)
    }

    fn to_form(&self) -> FormFields {
        let mut form = FormFields::new()
            .with("name", &self.name)
            .with("email", &self.email)
            .with("message", &self.message)
            .with("date", self.date.to_rfc3339())
            .with("status", self.status.to_string());
        if let Some(response) = &self.response {
            form.insert("response", response);
        }
        if let Some(at) = self.response_date {
            form.insert("response_date", at.to_rfc3339());
        }
        form
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("Date", 10),
            Column::new("Name", 18),
            Column::new("Email", 24),
            Column::new("Message", 50),
            Column::new("Status", 7),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.name.clone(),
            self.email.clone(),
            self.message.clone(),
            self.status.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_feedback_is_unread() {
        let feedback = Feedback::new("Jane", "jane@x.com", "Hello there!", Utc::now()).unwrap();
        assert!(feedback.is_unread());
        assert_eq!(feedback.message.len(), 12);
    }

    #[test]
    fn test_new_feedback_trims_and_validates() {
        let feedback = Feedback::new("  Jane ", " jane@x.com ", " Hi ", Utc::now()).unwrap();
        assert_eq!(feedback.name, "Jane");
        assert_eq!(feedback.email, "jane@x.com");
        assert_eq!(feedback.message, "Hi");

        assert_eq!(
            Feedback::new("Jane", "not-an-email", "Hi", Utc::now()),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            Feedback::new("", "jane@x.com", "Hi", Utc::now()),
            Err(ValidationError::MissingField("Name"))
        );
    }

    #[test]
    fn test_from_form_reads_status() {
        let form = FormFields::new()
            .with("name", "Jane")
            .with("email", "jane@x.com")
            .with("message", "Hello")
            .with("date", "2026-02-01T09:30:00Z")
            .with("status", "read");
        let feedback = Feedback::from_form(&form).unwrap();
        assert_eq!(feedback.status, FeedbackStatus::Read);
        assert_eq!(feedback.date.to_rfc3339(), "2026-02-01T09:30:00+00:00");
    }

    #[test]
    fn test_record_reply() {
        let mut feedback =
            Feedback::new("Jane", "jane@x.com", "When do loans open?", Utc::now()).unwrap();
        feedback.record_reply(" Next Monday. ", Utc::now());
        assert_eq!(feedback.status, FeedbackStatus::Replied);
        assert_eq!(feedback.response.as_deref(), Some("Next Monday."));
        assert!(!feedback.is_unread());

        let again = Feedback::from_form(&feedback.to_form()).unwrap();
        assert_eq!(again.response, feedback.response);
        assert_eq!(again.status, FeedbackStatus::Replied);
    }

    #[test]
    fn test_server_reply_fields() {
        let feedback: Feedback = serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "Jane",
            "email": "jane@x.com",
            "message": "Hello",
            "status": "resolved",
            "admin_response": "Thanks, Jane."
        }))
        .unwrap();
        assert_eq!(feedback.status, FeedbackStatus::Replied);
        assert_eq!(feedback.response.as_deref(), Some("Thanks, Jane."));
    }
}
