//! Public website content: news, FAQs, downloads and gallery items.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::resource::{Column, FormFields, Resource, ResourceKind};
use crate::util::{require, ValidationError};

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = require(field, value)?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidChoice {
        field,
        value: value.to_string(),
    })
}

fn parse_id(form: &FormFields) -> Result<Option<i64>, ValidationError> {
    match form.optional("id") {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ValidationError::InvalidChoice {
                field: "id",
                value: raw.to_string(),
            }),
        None => Ok(None),
    }
}

// ============================================================================
// News
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    Draft,
    /// The admin form publishes directly.
    #[default]
    Published,
}

impl fmt::Display for NewsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsStatus::Draft => f.write_str("draft"),
            NewsStatus::Published => f.write_str("published"),
        }
    }
}

impl FromStr for NewsStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(NewsStatus::Draft),
            "published" => Ok(NewsStatus::Published),
            other => Err(ValidationError::InvalidChoice {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct News {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub category: String,
    pub content: String,
    pub publish_date: NaiveDate,
    #[serde(default)]
    pub status: NewsStatus,
}

impl Resource for News {
    const KIND: ResourceKind = ResourceKind::News;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_form(form: &FormFields) -> Result<Self, ValidationError> {
        Ok(Self {
            id: parse_id(form)?,
            title: require("Title", form.get("title"))?.to_string(),
            category: require("Category", form.get("category"))?.to_string(),
            content: require("Content", form.get("content"))?.to_string(),
            publish_date: parse_date("Publish date", form.get("publish_date"))?,
            status: form
                .optional("status")
                .map(str::parse::<NewsStatus>)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    fn to_form(&self) -> FormFields {
        FormFields::new()
            .with("title", &self.title)
            .with("category", &self.category)
            .with("content", &self.content)
            .with("publish_date", self.publish_date.to_string())
            .with("status", self.status.to_string())
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("Title", 32),
            Column::new("Category", 14),
            Column::new("Date", 10),
            Column::new("Status", 9),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.category.clone(),
            self.publish_date.to_string(),
            self.status.to_string(),
        ]
    }
}

// ============================================================================
// FAQ
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub question: String,
    #[serde(default)]
    pub category: String,
    pub answer: String,
}

impl Resource for Faq {
    const KIND: ResourceKind = ResourceKind::Faq;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_form(form: &FormFields) -> Result<Self, ValidationError> {
        Ok(Self {
            id: parse_id(form)?,
            question: require("Question", form.get("question"))?.to_string(),
            category: require("Category", form.get("category"))?.to_string(),
            answer: require("Answer", form.get("answer"))?.to_string(),
        })
    }

    fn to_form(&self) -> FormFields {
        FormFields::new()
            .with("question", &self.question)
            .with("category", &self.category)
            .with("answer", &self.answer)
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("Question", 40),
            Column::new("Category", 14),
            Column::new("Answer", 30),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.question.clone(),
            self.category.clone(),
            self.answer.clone(),
        ]
    }
}

// ============================================================================
// Downloads
// ============================================================================

/// Document category of a download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    FinancialReport,
    Policy,
    Form,
    Guide,
    #[default]
    Other,
}

impl FileType {
    fn as_str(self) -> &'static str {
        match self {
            FileType::FinancialReport => "financial_report",
            FileType::Policy => "policy",
            FileType::Form => "form",
            FileType::Guide => "guide",
            FileType::Other => "other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "financial_report" => Ok(FileType::FinancialReport),
            "policy" => Ok(FileType::Policy),
            "form" => Ok(FileType::Form),
            "guide" => Ok(FileType::Guide),
            "other" => Ok(FileType::Other),
            other => Err(ValidationError::InvalidChoice {
                field: "file_type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Download {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub file_type: FileType,
    #[serde(default)]
    pub description: String,
    /// Server URL of the stored file, or a local path in local-only mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip)]
    pub upload: Option<PathBuf>,
}

impl Resource for Download {
    const KIND: ResourceKind = ResourceKind::Download;
    const UPLOAD_FIELD: Option<&'static str> = Some("file");

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_form(form: &FormFields) -> Result<Self, ValidationError> {
        let upload = form.optional("upload").map(PathBuf::from);
        let file = form.optional("file").map(str::to_string);
        if upload.is_none() && file.is_none() {
            return Err(ValidationError::MissingField("File"));
        }
        Ok(Self {
            id: parse_id(form)?,
            title: require("Title", form.get("title"))?.to_string(),
            file_type: require("File type", form.get("file_type"))?.parse()?,
            description: form.get("description").trim().to_string(),
            file,
            upload,
        })
    }

    fn to_form(&self) -> FormFields {
        let mut form = FormFields::new()
            .with("title", &self.title)
            .with("file_type", self.file_type.to_string())
            .with("description", &self.description);
        if let Some(file) = &self.file {
            form.insert("file", file);
        }
        form
    }

    fn upload(&self) -> Option<&Path> {
        self.upload.as_deref()
    }

    fn keep_upload_locally(&mut self) {
        if let Some(path) = self.upload.take() {
            self.file = Some(path.display().to_string());
        }
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("Title", 30),
            Column::new("Type", 16),
            Column::new("File", 36),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.file_type.to_string(),
            self.file.clone().unwrap_or_default(),
        ]
    }
}

// ============================================================================
// Gallery
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip)]
    pub upload: Option<PathBuf>,
}

impl Resource for GalleryItem {
    const KIND: ResourceKind = ResourceKind::Gallery;
    const UPLOAD_FIELD: Option<&'static str> = Some("image");

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_form(form: &FormFields) -> Result<Self, ValidationError> {
        let upload = form.optional("upload").map(PathBuf::from);
        let image = form.optional("image").map(str::to_string);
        if upload.is_none() && image.is_none() {
            return Err(ValidationError::MissingField("Image"));
        }
        Ok(Self {
            id: parse_id(form)?,
            title: require("Title", form.get("title"))?.to_string(),
            description: form.get("description").trim().to_string(),
            category: require("Category", form.get("category"))?.to_string(),
            date: parse_date("Date", form.get("date"))?,
            image,
            upload,
        })
    }

    fn to_form(&self) -> FormFields {
        let mut form = FormFields::new()
            .with("title", &self.title)
            .with("description", &self.description)
            .with("category", &self.category)
            .with("date", self.date.to_string());
        if let Some(image) = &self.image {
            form.insert("image", image);
        }
        form
    }

    fn upload(&self) -> Option<&Path> {
        self.upload.as_deref()
    }

    fn keep_upload_locally(&mut self) {
        if let Some(path) = self.upload.take() {
            self.image = Some(path.display().to_string());
        }
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("Title", 30),
            Column::new("Category", 14),
            Column::new("Date", 10),
            Column::new("Image", 30),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.category.clone(),
            self.date.to_string(),
            self.image.clone().unwrap_or_default(),
        ]
    }
}
