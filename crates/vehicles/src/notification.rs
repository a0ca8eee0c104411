use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorpool_core::{DomainError, DomainResult, NotificationId, ShopId, VehicleId};

/// Maintenance notification category. The set is closed; anything else is
/// rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "M1")]
    M1,
    #[serde(rename = "PM")]
    Pm,
    #[serde(rename = "MW")]
    Mw,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::M1 => "M1",
            NotificationKind::Pm => "PM",
            NotificationKind::Mw => "MW",
        }
    }
}

impl core::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M1" => Ok(NotificationKind::M1),
            "PM" => Ok(NotificationKind::Pm),
            "MW" => Ok(NotificationKind::Mw),
            other => Err(DomainError::validation(format!(
                "notification type must be one of M1, PM, MW (got {other})"
            ))),
        }
    }
}

/// A maintenance notification attached to one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleNotification {
    pub id: NotificationId,
    pub shop_id: ShopId,
    pub vehicle_id: VehicleId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub completed: bool,
    pub save_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
    pub completed: Option<bool>,
}

impl VehicleNotification {
    pub fn new(
        shop_id: ShopId,
        vehicle_id: VehicleId,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: NotificationKind,
    ) -> DomainResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("notification title cannot be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            id: NotificationId::new(),
            shop_id,
            vehicle_id,
            title,
            description: description.into(),
            kind,
            completed: false,
            save_time: now,
            last_updated: now,
        })
    }

    pub fn apply_update(&mut self, update: NotificationUpdate) -> DomainResult<()> {
        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(DomainError::validation("notification title cannot be empty"));
            }
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        self.last_updated = Utc::now();
        Ok(())
    }

    /// Names of the fields whose values differ from `before`, in a stable
    /// order. Feeds the audit payload for notification edits.
    pub fn changed_fields_since(&self, before: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.title != before.title {
            changed.push("title");
        }
        if self.description != before.description {
            changed.push("description");
        }
        if self.kind != before.kind {
            changed.push("type");
        }
        if self.completed != before.completed {
            changed.push("completed");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_notification() -> VehicleNotification {
        VehicleNotification::new(
            ShopId::new(),
            VehicleId::new(),
            "Hydraulic leak",
            "Rear lift gate cylinder weeping",
            NotificationKind::M1,
        )
        .unwrap()
    }

    #[test]
    fn kind_parses_only_the_closed_set() {
        assert_eq!("M1".parse::<NotificationKind>().unwrap(), NotificationKind::M1);
        assert_eq!("PM".parse::<NotificationKind>().unwrap(), NotificationKind::Pm);
        assert_eq!("MW".parse::<NotificationKind>().unwrap(), NotificationKind::Mw);
        assert!("m1".parse::<NotificationKind>().is_err());
        assert!("XX".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn new_notifications_start_open() {
        let notification = test_notification();
        assert!(!notification.completed);
    }

    #[test]
    fn empty_title_is_rejected() {
        let result = VehicleNotification::new(
            ShopId::new(),
            VehicleId::new(),
            " ",
            "",
            NotificationKind::Pm,
        );
        assert!(result.is_err());
    }

    #[test]
    fn changed_fields_reports_differences_in_stable_order() {
        let before = test_notification();
        let mut after = before.clone();
        after
            .apply_update(NotificationUpdate {
                title: Some("Hydraulic leak (worse)".to_string()),
                completed: Some(true),
                ..NotificationUpdate::default()
            })
            .unwrap();
        assert_eq!(after.changed_fields_since(&before), vec!["title", "completed"]);
    }

    #[test]
    fn unchanged_notification_reports_no_fields() {
        let before = test_notification();
        let after = before.clone();
        assert!(after.changed_fields_since(&before).is_empty());
    }
}
