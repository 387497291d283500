use serde::{Deserialize, Serialize};

/// Branch contact details published on the contact page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

/// Content counts reported by the server's dashboard endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_news: u64,
    pub total_faqs: u64,
    pub total_downloads: u64,
    pub total_gallery: u64,
    pub new_feedback_count: u64,
}
