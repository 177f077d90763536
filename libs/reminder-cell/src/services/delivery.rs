use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use notification_cell::{CallContext, TextChannel, VoiceChannel};
use shared_models::{Appointment, Call, Patient, ReminderChannel};
use shared_store::AppointmentStore;

use crate::{DeliveryOutcome, ReminderError, ReminderJob};

/// Per-job delivery logic: re-check skip conditions against fresh state,
/// send through the right channel, then record the attempt.
pub struct DeliveryExecutor {
    store: Arc<dyn AppointmentStore>,
    text_channel: Arc<dyn TextChannel>,
    voice_channel: Arc<dyn VoiceChannel>,
}

impl DeliveryExecutor {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        text_channel: Arc<dyn TextChannel>,
        voice_channel: Arc<dyn VoiceChannel>,
    ) -> Self {
        Self {
            store,
            text_channel,
            voice_channel,
        }
    }

    #[instrument(skip(self, job), fields(job_id = %job.job_id))]
    pub async fn execute(&self, job: &ReminderJob) -> Result<DeliveryOutcome, ReminderError> {
        // Always act on fresh state, never on the job payload: the
        // appointment may have resolved since the job was enqueued.
        let Some(appointment) = self.store.get_appointment(job.appointment_id).await? else {
            info!("Appointment {} no longer exists, skipping", job.appointment_id);
            return Ok(DeliveryOutcome::Skipped("appointment not found".to_string()));
        };

        if appointment.is_resolved() {
            info!(
                "Appointment {} is {}, reminder not needed",
                appointment.id, appointment.status
            );
            return Ok(DeliveryOutcome::Skipped(format!(
                "appointment {}",
                appointment.status
            )));
        }

        if appointment.reminder_sent(job.reminder_type) {
            info!(
                "{} reminder for appointment {} was already sent",
                job.reminder_type, appointment.id
            );
            return Ok(DeliveryOutcome::Skipped("reminder already sent".to_string()));
        }

        let Some(patient) = self.store.get_patient(appointment.patient_id).await? else {
            info!(
                "Patient {} for appointment {} not found, skipping",
                appointment.patient_id, appointment.id
            );
            return Ok(DeliveryOutcome::Skipped("patient not found".to_string()));
        };

        match job.reminder_type.channel() {
            ReminderChannel::Text => {
                let body = compose_reminder_text(&patient, &appointment);
                let message_id = self.text_channel.send_text(&patient.phone, &body).await?;
                debug!(
                    "WhatsApp reminder for appointment {} accepted as {}",
                    appointment.id, message_id
                );
            }
            ReminderChannel::Voice => {
                let context = call_context(&patient, &appointment);
                let conversation_id = self
                    .voice_channel
                    .start_call(&patient.phone, &context)
                    .await?;

                let call = Call::for_appointment(conversation_id, appointment.id);
                if let Err(e) = self.store.create_call(&call).await {
                    error!(
                        "Call record for conversation {} could not be written, webhook will not match: {}",
                        call.conversation_id, e
                    );
                }
            }
        }

        // The send succeeded. Bookkeeping failures past this point are
        // reconciliation debt for audit tooling; failing the job here
        // would retry and resend.
        let sent_at = Utc::now();

        if let Err(e) = self
            .store
            .append_reminder_log(appointment.id, job.reminder_type, sent_at)
            .await
        {
            error!(
                "Reminder log append failed for appointment {} ({}): {}",
                appointment.id, job.reminder_type, e
            );
        }

        if let Err(e) = self
            .store
            .set_reminder_sent(appointment.id, job.reminder_type, sent_at)
            .await
        {
            error!(
                "Reminder flag update failed for appointment {} ({}): {}",
                appointment.id, job.reminder_type, e
            );
        }

        Ok(DeliveryOutcome::Sent)
    }
}

pub fn compose_reminder_text(patient: &Patient, appointment: &Appointment) -> String {
    format!(
        "Hola {}, le recordamos su cita de {} con {} el {}. Responda SI para confirmar o NO para cancelar.",
        patient.full_name,
        appointment.specialty,
        appointment.doctor_name,
        appointment.appointment_date.format("%d/%m/%Y a las %H:%M"),
    )
}

fn call_context(patient: &Patient, appointment: &Appointment) -> CallContext {
    CallContext {
        patient_name: patient.full_name.clone(),
        specialty: appointment.specialty.clone(),
        doctor_name: appointment.doctor_name.clone(),
        appointment_date: appointment
            .appointment_date
            .format("%d/%m/%Y %H:%M")
            .to_string(),
    }
}
