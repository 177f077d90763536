use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::reminder::ReminderType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    /// Unique national identity number (RUT).
    pub national_id: String,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub risk_level: Option<String>,
    pub sector: Option<String>,
    pub doctor_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub specialty: String,
    pub doctor_name: String,
    pub status: AppointmentStatus,
    pub reminder_72h_sent: bool,
    pub reminder_72h_sent_at: Option<DateTime<Utc>>,
    pub reminder_48h_sent: bool,
    pub reminder_48h_sent_at: Option<DateTime<Utc>>,
    pub reminder_24h_sent: bool,
    pub reminder_24h_sent_at: Option<DateTime<Utc>>,
    pub call_reminder_sent: bool,
    pub call_reminder_sent_at: Option<DateTime<Utc>>,
    pub needs_human_call: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Confirmed and cancelled appointments receive no further reminders.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self.status,
            AppointmentStatus::Confirmed | AppointmentStatus::Cancelled
        )
    }

    pub fn reminder_sent(&self, reminder_type: ReminderType) -> bool {
        match reminder_type {
            ReminderType::Whatsapp72h => self.reminder_72h_sent,
            ReminderType::Whatsapp48h => self.reminder_48h_sent,
            ReminderType::Whatsapp24h => self.reminder_24h_sent,
            ReminderType::VoiceCall => self.call_reminder_sent,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Rescheduled,
    PendingCall,
    NeedsHumanCall,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
            AppointmentStatus::PendingCall => write!(f, "pending_call"),
            AppointmentStatus::NeedsHumanCall => write!(f, "needs_human_call"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// Append-only audit record of a delivered reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderLogEntry {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub reminder_type: ReminderType,
    pub sent_at: DateTime<Utc>,
}

impl ReminderLogEntry {
    pub fn new(appointment_id: Uuid, reminder_type: ReminderType, sent_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            appointment_id,
            reminder_type,
            sent_at,
        }
    }
}
