use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::Document;

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

/// Who is asking to move an appointment along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentActor {
    Agent,
    Requester,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub property_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Appointment {
    const COLLECTION: &'static str = "appointments";
    const LABEL: &'static str = "Appointment";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Appointment {
    /// `None` when the slot would run past the representable calendar.
    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
            .checked_add_signed(Duration::minutes(self.duration_minutes as i64))
    }

    /// Half-open interval overlap; cancelled slots never block.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status != AppointmentStatus::Cancelled
            && self.scheduled_at < end
            && self.end_at().map_or(true, |own_end| start < own_end)
    }

    pub fn can_transition(&self, actor: AppointmentActor, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match (actor, self.status, next) {
            (AppointmentActor::Agent, Pending, Confirmed) => true,
            (AppointmentActor::Agent, Pending | Confirmed, Cancelled) => true,
            (AppointmentActor::Agent, Confirmed, Completed) => true,
            (AppointmentActor::Requester, Pending | Confirmed, Cancelled) => true,
            _ => false,
        }
    }
}
