use serde::{Deserialize, Serialize};

use super::resource::{Column, FormFields, Resource, ResourceKind};
use crate::util::{require, ValidationError};

/// A staff member shown on the "our team" page. Kept in the local store only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl Resource for TeamMember {
    const KIND: ResourceKind = ResourceKind::Team;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_form(form: &FormFields) -> Result<Self, ValidationError> {
        Ok(Self {
            id: None,
            name: require("Name", form.get("name"))?.to_string(),
            role: require("Role", form.get("role"))?.to_string(),
            description: form.get("description").trim().to_string(),
            photo: form.optional("photo").map(str::to_string),
        })
    }

    fn to_form(&self) -> FormFields {
        let mut form = FormFields::new()
            .with("name", &self.name)
            .with("role", &self.role)
            .with("description", &self.description);
        if let Some(photo) = &self.photo {
            form.insert("photo", photo);
        }
        form
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("Name", 24),
            Column::new("Role", 20),
            Column::new("Description", 36),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.role.clone(),
            self.description.clone(),
        ]
    }
}
