pub mod error;
pub mod memory;
pub mod rest;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentStatus, Call, CallUpdate, Patient, ReminderType, ReminderWindow,
};

/// The durable appointment store. The scheduler reads through it, the
/// delivery executor writes reminder flags, and the webhook reconciler
/// writes status transitions. All writes are scoped to a single record.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Appointments inside the window whose reminder flag is still false
    /// and whose status is not resolved.
    async fn find_due_appointments(
        &self,
        window: &ReminderWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError>;

    /// Flags are monotonic: this only ever sets a flag to true.
    async fn set_reminder_sent(
        &self,
        id: Uuid,
        reminder_type: ReminderType,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn set_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), StoreError>;

    async fn set_needs_human_call(&self, id: Uuid) -> Result<(), StoreError>;

    async fn create_call(&self, call: &Call) -> Result<(), StoreError>;

    async fn find_call_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Call>, StoreError>;

    async fn update_call(&self, id: Uuid, update: CallUpdate) -> Result<(), StoreError>;

    async fn append_reminder_log(
        &self,
        appointment_id: Uuid,
        reminder_type: ReminderType,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
