//! Status taxonomy for deliveries, drivers, partners and clients.
//!
//! Built-in statuses ship with the application and cannot be edited or
//! removed; administrators add their own on top.

use crate::client::ApiClient;
use crate::errors::ServiceError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use validator::Validate;

pub const FALLBACK_COLOR: &str = "secondary";
pub const FALLBACK_ICON: &str = "tabler-circle";
pub const STATUSES_PATH: &str = "/settings/statuses";

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// `"In Progress"` -> `"in-progress"`; the form used in select values and URLs.
pub fn slug(name: &str) -> String {
    WHITESPACE.replace_all(&name.to_lowercase(), "-").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Deliveries,
    Drivers,
    Partners,
    Clients,
}

impl StatusCategory {
    pub const ALL: [StatusCategory; 4] = [
        Self::Deliveries,
        Self::Drivers,
        Self::Partners,
        Self::Clients,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deliveries => "deliveries",
            Self::Drivers => "drivers",
            Self::Partners => "partners",
            Self::Clients => "clients",
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusCategory {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| StatusError::UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("unknown status category: {0}")]
    UnknownCategory(String),

    #[error("status {id} not found in {category}")]
    NotFound { category: StatusCategory, id: u32 },

    #[error("status {id} is built in and cannot be modified")]
    BuiltIn { id: u32 },

    #[error("invalid status: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// What a status looks like, regardless of who defined it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDefinition {
    pub id: u32,
    pub name: String,
    pub label: String,
    pub color: String,
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEntry {
    /// Shipped with the application, read-only
    Default(StatusDefinition),
    /// Added by an administrator
    Custom(StatusDefinition),
}

impl StatusEntry {
    pub fn definition(&self) -> &StatusDefinition {
        match self {
            Self::Default(def) | Self::Custom(def) => def,
        }
    }

    pub fn id(&self) -> u32 {
        self.definition().id
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }
}

/// Fields an administrator supplies for a new status.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStatus {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub label: String,
    #[validate(length(min = 1))]
    pub color: String,
    #[validate(length(min = 1))]
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

/// Entry for a select component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOption {
    pub title: String,
    pub value: String,
    pub color: String,
    pub icon: String,
}

/// Wire form of a status as exchanged with `/settings/statuses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    #[serde(flatten)]
    pub definition: StatusDefinition,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub can_edit: bool,
    pub category: StatusCategory,
}

fn default_true() -> bool {
    true
}

impl StatusRecord {
    fn from_entry(category: StatusCategory, entry: &StatusEntry) -> Self {
        Self {
            definition: entry.definition().clone(),
            is_default: entry.is_default(),
            can_edit: !entry.is_default(),
            category,
        }
    }

    fn into_entry(self) -> StatusEntry {
        if self.is_default {
            StatusEntry::Default(self.definition)
        } else {
            StatusEntry::Custom(self.definition)
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    statuses: Option<BTreeMap<String, Vec<Value>>>,
}

/// Statuses per category, in insertion order within each category.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRegistry {
    categories: BTreeMap<StatusCategory, Vec<StatusEntry>>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self {
            categories: default_statuses(),
        }
    }
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_category(&self, category: StatusCategory) -> &[StatusEntry] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn options(&self, category: StatusCategory) -> Vec<StatusOption> {
        self.by_category(category)
            .iter()
            .map(|entry| {
                let def = entry.definition();
                StatusOption {
                    title: def.label.clone(),
                    value: slug(&def.name),
                    color: def.color.clone(),
                    icon: def.icon.clone(),
                }
            })
            .collect()
    }

    /// Looks a status up by its slug, case-insensitively.
    pub fn find_by_name(&self, category: StatusCategory, name: &str) -> Option<&StatusEntry> {
        let wanted = name.to_lowercase();
        self.by_category(category)
            .iter()
            .find(|entry| slug(&entry.definition().name) == wanted)
    }

    pub fn color(&self, category: StatusCategory, name: &str) -> String {
        self.find_by_name(category, name)
            .map(|entry| entry.definition().color.clone())
            .unwrap_or_else(|| FALLBACK_COLOR.to_string())
    }

    pub fn icon(&self, category: StatusCategory, name: &str) -> String {
        self.find_by_name(category, name)
            .map(|entry| entry.definition().icon.clone())
            .unwrap_or_else(|| FALLBACK_ICON.to_string())
    }

    pub fn label(&self, category: StatusCategory, name: &str) -> String {
        self.find_by_name(category, name)
            .map(|entry| entry.definition().label.clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// Adds a custom status with the next free id in its category.
    pub fn add(&mut self, category: StatusCategory, status: NewStatus) -> Result<u32, StatusError> {
        status.validate()?;

        let entries = self.categories.entry(category).or_default();
        let id = entries.iter().map(StatusEntry::id).max().unwrap_or(0) + 1;
        entries.push(StatusEntry::Custom(StatusDefinition {
            id,
            name: status.name,
            label: status.label,
            color: status.color,
            icon: status.icon,
            description: status.description,
        }));
        Ok(id)
    }

    /// Replaces a custom status in place. Built-in statuses are refused.
    pub fn update(
        &mut self,
        category: StatusCategory,
        definition: StatusDefinition,
    ) -> Result<(), StatusError> {
        let id = definition.id;
        let entry = self
            .categories
            .get_mut(&category)
            .and_then(|entries| entries.iter_mut().find(|e| e.id() == id))
            .ok_or(StatusError::NotFound { category, id })?;

        match entry {
            StatusEntry::Default(_) => Err(StatusError::BuiltIn { id }),
            StatusEntry::Custom(current) => {
                *current = definition;
                Ok(())
            }
        }
    }

    /// Removes a custom status, returning it. Built-in statuses are refused.
    pub fn delete(
        &mut self,
        category: StatusCategory,
        id: u32,
    ) -> Result<StatusDefinition, StatusError> {
        let entries = self
            .categories
            .get_mut(&category)
            .ok_or(StatusError::NotFound { category, id })?;
        let index = entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or(StatusError::NotFound { category, id })?;

        if entries[index].is_default() {
            return Err(StatusError::BuiltIn { id });
        }
        match entries.remove(index) {
            StatusEntry::Custom(def) | StatusEntry::Default(def) => Ok(def),
        }
    }

    /// Applies a server copy: every known category the server sent replaces
    /// the local one wholesale, the others keep their built-in lists.
    /// Unknown categories and records that do not decode are skipped.
    pub fn merge_remote(&mut self, remote: BTreeMap<String, Vec<Value>>) {
        let mut merged = default_statuses();
        for (name, records) in remote {
            let category = match name.parse::<StatusCategory>() {
                Ok(category) => category,
                Err(err) => {
                    warn!(error = %err, "ignoring remote status category");
                    continue;
                }
            };
            let entries = records
                .into_iter()
                .filter_map(|record| match serde_json::from_value::<StatusRecord>(record) {
                    Ok(record) => Some(record.into_entry()),
                    Err(err) => {
                        warn!(error = %err, %category, "ignoring malformed remote status");
                        None
                    }
                })
                .collect();
            merged.insert(category, entries);
        }
        self.categories = merged;
    }

    /// Every category in wire form, ready to be saved.
    pub fn snapshot(&self) -> BTreeMap<StatusCategory, Vec<StatusRecord>> {
        self.categories
            .iter()
            .map(|(category, entries)| {
                let records = entries
                    .iter()
                    .map(|entry| StatusRecord::from_entry(*category, entry))
                    .collect();
                (*category, records)
            })
            .collect()
    }

    /// Replaces the registry with the server's statuses. On any failure the
    /// built-in statuses are restored and the error is returned.
    pub async fn load(&mut self, api: &ApiClient) -> Result<(), ServiceError> {
        match api.get_json::<StatusesResponse>(STATUSES_PATH, &[]).await {
            Ok(StatusesResponse {
                success: true,
                statuses: Some(statuses),
            }) => {
                self.merge_remote(statuses);
                Ok(())
            }
            // a well-formed answer without statuses keeps what we have
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(error = %err, "could not load statuses, using defaults");
                self.categories = default_statuses();
                Err(err)
            }
        }
    }

    pub async fn save(&self, api: &ApiClient) -> Result<(), ServiceError> {
        let body = json!({ "statuses": self.snapshot() });
        api.post_json::<_, serde_json::Value>(STATUSES_PATH, &body)
            .await
            .map(|_| ())
    }
}

/// One built-in status row.
struct Builtin {
    category: StatusCategory,
    id: u32,
    name: &'static str,
    label: &'static str,
    color: &'static str,
    icon: &'static str,
    description: &'static str,
}

const BUILTIN_STATUSES: &[Builtin] = &[
    Builtin {
        category: StatusCategory::Deliveries,
        id: 1,
        name: "Pending",
        label: "En attente",
        color: "warning",
        icon: "tabler-clock",
        description: "Demande reçue, en attente d'assignation",
    },
    Builtin {
        category: StatusCategory::Deliveries,
        id: 2,
        name: "Assigned",
        label: "Assignée",
        color: "info",
        icon: "tabler-user-check",
        description: "Livreur assigné à la demande",
    },
    Builtin {
        category: StatusCategory::Deliveries,
        id: 3,
        name: "In Progress",
        label: "En cours",
        color: "primary",
        icon: "tabler-truck",
        description: "Livraison en cours",
    },
    Builtin {
        category: StatusCategory::Deliveries,
        id: 4,
        name: "Delivered",
        label: "Livrée",
        color: "success",
        icon: "tabler-check",
        description: "Livraison terminée avec succès",
    },
    Builtin {
        category: StatusCategory::Deliveries,
        id: 5,
        name: "Cancelled",
        label: "Annulée",
        color: "error",
        icon: "tabler-x",
        description: "Demande annulée",
    },
    Builtin {
        category: StatusCategory::Drivers,
        id: 101,
        name: "Available",
        label: "Disponible",
        color: "success",
        icon: "tabler-user-check",
        description: "Livreur disponible pour une nouvelle mission",
    },
    Builtin {
        category: StatusCategory::Drivers,
        id: 102,
        name: "Busy",
        label: "Occupé",
        color: "warning",
        icon: "tabler-truck",
        description: "Livreur en cours de livraison",
    },
    Builtin {
        category: StatusCategory::Drivers,
        id: 103,
        name: "Offline",
        label: "Hors ligne",
        color: "secondary",
        icon: "tabler-user-off",
        description: "Livreur non disponible",
    },
    Builtin {
        category: StatusCategory::Drivers,
        id: 104,
        name: "Suspended",
        label: "Suspendu",
        color: "error",
        icon: "tabler-user-x",
        description: "Livreur temporairement suspendu",
    },
    Builtin {
        category: StatusCategory::Partners,
        id: 201,
        name: "Prospecting",
        label: "Prospection",
        color: "info",
        icon: "tabler-search",
        description: "Partenaire en cours de prospection",
    },
    Builtin {
        category: StatusCategory::Partners,
        id: 202,
        name: "Active",
        label: "Actif",
        color: "success",
        icon: "tabler-handshake",
        description: "Partenaire actif et opérationnel",
    },
    Builtin {
        category: StatusCategory::Partners,
        id: 203,
        name: "Inactive",
        label: "Inactif",
        color: "secondary",
        icon: "tabler-pause",
        description: "Partenaire temporairement inactif",
    },
    Builtin {
        category: StatusCategory::Partners,
        id: 204,
        name: "Rejected",
        label: "Rejeté",
        color: "error",
        icon: "tabler-x",
        description: "Partenariat rejeté ou terminé",
    },
    Builtin {
        category: StatusCategory::Clients,
        id: 301,
        name: "Active",
        label: "Actif",
        color: "success",
        icon: "tabler-user-check",
        description: "Client actif avec compte valide",
    },
    Builtin {
        category: StatusCategory::Clients,
        id: 302,
        name: "Pending",
        label: "En attente",
        color: "warning",
        icon: "tabler-clock",
        description: "Client en attente de validation",
    },
    Builtin {
        category: StatusCategory::Clients,
        id: 303,
        name: "Suspended",
        label: "Suspendu",
        color: "error",
        icon: "tabler-user-x",
        description: "Client temporairement suspendu",
    },
];

fn default_statuses() -> BTreeMap<StatusCategory, Vec<StatusEntry>> {
    let mut categories: BTreeMap<StatusCategory, Vec<StatusEntry>> = BTreeMap::new();
    for row in BUILTIN_STATUSES {
        categories
            .entry(row.category)
            .or_default()
            .push(StatusEntry::Default(StatusDefinition {
                id: row.id,
                name: row.name.to_string(),
                label: row.label.to_string(),
                color: row.color.to_string(),
                icon: row.icon.to_string(),
                description: row.description.to_string(),
            }));
    }
    categories
}
