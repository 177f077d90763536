use shared_models::AppointmentStatus;

// Checked in order; the first category with a hit wins, so a summary
// mentioning both confirmation and cancellation classifies as confirmed.
// Bare attendance words stay out of the confirm set: "asistirá" would
// also match inside "no asistirá" and shadow the cancel branch.
const CONFIRM_KEYWORDS: &[&str] = &["confirm", "sí asistirá", "will attend"];
const CANCEL_KEYWORDS: &[&str] = &["cancel", "anul", "no asistirá", "no podrá asistir", "not attend"];
const RESCHEDULE_KEYWORDS: &[&str] = &["reagend", "reprogram", "reschedul", "cambiar la cita", "nueva fecha"];

/// Best-effort keyword classification of a call summary. Returns `None`
/// when nothing matches and the appointment keeps its current status.
pub fn classify_summary(summary: &str) -> Option<AppointmentStatus> {
    let summary = summary.to_lowercase();

    if CONFIRM_KEYWORDS.iter().any(|k| summary.contains(k)) {
        return Some(AppointmentStatus::Confirmed);
    }
    if CANCEL_KEYWORDS.iter().any(|k| summary.contains(k)) {
        return Some(AppointmentStatus::Cancelled);
    }
    if RESCHEDULE_KEYWORDS.iter().any(|k| summary.contains(k)) {
        return Some(AppointmentStatus::Rescheduled);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_confirmation_in_spanish() {
        assert_eq!(
            classify_summary("La paciente confirmó que asistirá a su cita."),
            Some(AppointmentStatus::Confirmed)
        );
    }

    #[test]
    fn classifies_cancellation() {
        assert_eq!(
            classify_summary("El paciente pidió cancelar la hora médica."),
            Some(AppointmentStatus::Cancelled)
        );
        assert_eq!(
            classify_summary("The patient asked to cancel the visit."),
            Some(AppointmentStatus::Cancelled)
        );
    }

    #[test]
    fn classifies_reschedule() {
        assert_eq!(
            classify_summary("Solicitó reagendar para la próxima semana."),
            Some(AppointmentStatus::Rescheduled)
        );
    }

    #[test]
    fn negated_attendance_classifies_as_cancelled() {
        assert_eq!(
            classify_summary("Indicó que no asistirá a la cita."),
            Some(AppointmentStatus::Cancelled)
        );
    }

    #[test]
    fn confirmation_takes_precedence_over_cancellation() {
        assert_eq!(
            classify_summary("Confirmó la cita después de dudar si cancelar."),
            Some(AppointmentStatus::Confirmed)
        );
    }

    #[test]
    fn unrelated_summary_classifies_as_no_change() {
        assert_eq!(classify_summary("El número no corresponde al paciente."), None);
        assert_eq!(classify_summary(""), None);
    }
}
