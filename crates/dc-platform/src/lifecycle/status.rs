//! Status enums for every status-bearing entity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::shared::error::PlatformError;

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PlatformError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(PlatformError::validation(
                        "INVALID_STATUS",
                        format!("'{}' is not a valid {}", other, stringify!($name)),
                    )),
                }
            }
        }
    };
}

status_enum! {
    AppointmentStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl AppointmentStatus {
    /// Pending and confirmed appointments occupy their slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

status_enum! {
    ScheduleStatus {
        Active => "active",
        Inactive => "inactive",
        Cancelled => "cancelled",
    }
}

status_enum! {
    ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

status_enum! {
    CaseStatus {
        Active => "active",
        OnHold => "on-hold",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

status_enum! {
    /// Review state of a clinical case, independent of its treatment status.
    CaseApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        RevisionNeeded => "revision-needed",
    }
}

status_enum! {
    TaskStatus {
        Pending => "pending",
        InProgress => "in-progress",
        Completed => "completed",
        Closed => "closed",
    }
}

status_enum! {
    AssignmentStatus {
        Draft => "draft",
        Published => "published",
        Closed => "closed",
    }
}

status_enum! {
    EvaluationStatus {
        Pending => "pending",
        Completed => "completed",
    }
}
