//! Core contract shared by every content type.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::util::ValidationError;

/// The content types managed by the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum ResourceKind {
    News,
    #[value(name = "faqs")]
    Faq,
    #[value(name = "downloads")]
    Download,
    Gallery,
    Team,
    Feedback,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::News,
        ResourceKind::Faq,
        ResourceKind::Download,
        ResourceKind::Gallery,
        ResourceKind::Team,
        ResourceKind::Feedback,
    ];

    /// Collection path relative to the API root, with trailing slash.
    pub fn endpoint(self) -> &'static str {
        match self {
            ResourceKind::News => "news/",
            ResourceKind::Faq => "faqs/",
            ResourceKind::Download => "downloads/",
            ResourceKind::Gallery => "gallery/",
            ResourceKind::Team => "team/",
            ResourceKind::Feedback => "feedback/",
        }
    }

    /// Key of the JSON list in the local store.
    pub fn store_key(self) -> &'static str {
        match self {
            ResourceKind::News => "content.news",
            ResourceKind::Faq => "content.faqs",
            ResourceKind::Download => "content.downloads",
            ResourceKind::Gallery => "content.gallery",
            ResourceKind::Team => "content.team",
            ResourceKind::Feedback => "content.feedback",
        }
    }

    /// Singular noun used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::News => "News article",
            ResourceKind::Faq => "FAQ",
            ResourceKind::Download => "Download",
            ResourceKind::Gallery => "Gallery item",
            ResourceKind::Team => "Staff member",
            ResourceKind::Feedback => "Feedback message",
        }
    }

    /// Heading used on the dashboard.
    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::News => "News",
            ResourceKind::Faq => "FAQs",
            ResourceKind::Download => "Downloads",
            ResourceKind::Gallery => "Gallery",
            ResourceKind::Team => "Team",
            ResourceKind::Feedback => "Feedback",
        }
    }

    /// Team members never leave the local store.
    pub fn is_local_only(self) -> bool {
        matches!(self, ResourceKind::Team)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// A table column for terminal listings.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub width: usize,
}

impl Column {
    pub const fn new(title: &'static str, width: usize) -> Self {
        Self { title, width }
    }
}

/// Submitted form fields: a plain name → value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Field value, or `""` when absent.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    /// Trimmed value, `None` when absent or blank.
    pub fn optional(&self, name: &str) -> Option<&str> {
        let value = self.get(name).trim();
        (!value.is_empty()).then_some(value)
    }

    /// Overlay `other` on top of `self`; fields in `other` win.
    pub fn merged(mut self, other: &FormFields) -> Self {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
        self
    }

    /// Parse `name=value` pairs, e.g. from repeated `--field` CLI flags.
    pub fn parse_pairs<'a>(
        pairs: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ValidationError> {
        let mut fields = Self::new();
        for pair in pairs {
            let Some((name, value)) = pair.split_once('=') else {
                return Err(ValidationError::InvalidChoice {
                    field: "field",
                    value: pair.to_string(),
                });
            };
            fields.insert(name.trim(), value);
        }
        Ok(fields)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A persisted content record.
///
/// The id is assigned by whichever repository persists the record: the
/// server for remote content, `max(existing) + 1` for local lists.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Multipart field name carrying the uploaded file, for file-bearing types.
    const UPLOAD_FIELD: Option<&'static str> = None;

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Build a record from submitted fields, rejecting missing required ones.
    fn from_form(form: &FormFields) -> Result<Self, ValidationError>;

    /// Fields that pre-populate the edit form.
    fn to_form(&self) -> FormFields;

    /// Local file selected for upload, if any.
    fn upload(&self) -> Option<&Path> {
        None
    }

    /// Replace a pending upload with its local path, for local-only storage.
    fn keep_upload_locally(&mut self) {}

    fn columns() -> &'static [Column];

    /// Cell text matching [`Resource::columns`].
    fn cells(&self) -> Vec<String>;
}
