use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentStatus, Call, CallUpdate, Patient, ReminderLogEntry, ReminderType,
    ReminderWindow,
};

use crate::{AppointmentStore, StoreError};

/// In-memory appointment store. Backs tests and local development runs
/// where no external store is configured.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    patients: HashMap<Uuid, Patient>,
    appointments: HashMap<Uuid, Appointment>,
    calls: HashMap<Uuid, Call>,
    reminder_logs: Vec<ReminderLogEntry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_patient(&self, patient: Patient) {
        self.inner.write().await.patients.insert(patient.id, patient);
    }

    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.inner
            .write()
            .await
            .appointments
            .insert(appointment.id, appointment);
    }

    pub async fn insert_call(&self, call: Call) {
        self.inner.write().await.calls.insert(call.id, call);
    }

    pub async fn get_call(&self, id: Uuid) -> Option<Call> {
        self.inner.read().await.calls.get(&id).cloned()
    }

    pub async fn reminder_logs(&self) -> Vec<ReminderLogEntry> {
        self.inner.read().await.reminder_logs.clone()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn find_due_appointments(
        &self,
        window: &ReminderWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .appointments
            .values()
            .filter(|a| {
                !a.is_resolved()
                    && !a.reminder_sent(window.reminder_type)
                    && window.is_due(a.appointment_date, now)
            })
            .cloned()
            .collect())
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.inner.read().await.appointments.get(&id).cloned())
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        Ok(self.inner.read().await.patients.get(&id).cloned())
    }

    async fn set_reminder_sent(
        &self,
        id: Uuid,
        reminder_type: ReminderType,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(appointment) = inner.appointments.get_mut(&id) {
            match reminder_type {
                ReminderType::Whatsapp72h => {
                    appointment.reminder_72h_sent = true;
                    appointment.reminder_72h_sent_at = Some(sent_at);
                }
                ReminderType::Whatsapp48h => {
                    appointment.reminder_48h_sent = true;
                    appointment.reminder_48h_sent_at = Some(sent_at);
                }
                ReminderType::Whatsapp24h => {
                    appointment.reminder_24h_sent = true;
                    appointment.reminder_24h_sent_at = Some(sent_at);
                }
                ReminderType::VoiceCall => {
                    appointment.call_reminder_sent = true;
                    appointment.call_reminder_sent_at = Some(sent_at);
                }
            }
            appointment.updated_at = sent_at;
        }
        Ok(())
    }

    async fn set_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(appointment) = inner.appointments.get_mut(&id) {
            appointment.status = status;
            appointment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_needs_human_call(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(appointment) = inner.appointments.get_mut(&id) {
            appointment.needs_human_call = true;
            appointment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn create_call(&self, call: &Call) -> Result<(), StoreError> {
        self.inner.write().await.calls.insert(call.id, call.clone());
        Ok(())
    }

    async fn find_call_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Call>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .calls
            .values()
            .find(|c| c.conversation_id == conversation_id)
            .cloned())
    }

    async fn update_call(&self, id: Uuid, update: CallUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(call) = inner.calls.get_mut(&id) {
            if let Some(status) = update.status {
                call.status = status;
            }
            if let Some(transcript) = update.transcript {
                call.transcript = Some(transcript);
            }
            if let Some(summary) = update.summary {
                call.summary = Some(summary);
            }
            if let Some(duration) = update.duration_seconds {
                call.duration_seconds = Some(duration);
            }
            if let Some(error_message) = update.error_message {
                call.error_message = Some(error_message);
            }
            if let Some(ended_at) = update.ended_at {
                call.ended_at = Some(ended_at);
            }
        }
        Ok(())
    }

    async fn append_reminder_log(
        &self,
        appointment_id: Uuid,
        reminder_type: ReminderType,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .reminder_logs
            .push(ReminderLogEntry::new(appointment_id, reminder_type, sent_at));
        Ok(())
    }
}
