//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub mensagem: String,
    #[serde(default, with = "super::timestamp::option")]
    pub data_criacao: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lida: bool,
}

/// Unread entries in a freshly fetched list
pub fn count_unread(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.lida).count()
}
