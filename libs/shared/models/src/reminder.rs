use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    Whatsapp72h,
    Whatsapp48h,
    Whatsapp24h,
    VoiceCall,
}

impl ReminderType {
    pub fn channel(&self) -> ReminderChannel {
        match self {
            ReminderType::Whatsapp72h
            | ReminderType::Whatsapp48h
            | ReminderType::Whatsapp24h => ReminderChannel::Text,
            ReminderType::VoiceCall => ReminderChannel::Voice,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderType::Whatsapp72h => "whatsapp_72h",
            ReminderType::Whatsapp48h => "whatsapp_48h",
            ReminderType::Whatsapp24h => "whatsapp_24h",
            ReminderType::VoiceCall => "voice_call",
        }
    }
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderChannel {
    Text,
    Voice,
}

/// A reminder window: how long before the appointment a reminder fires,
/// and how far back a scan will still pick it up after downtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReminderWindow {
    pub reminder_type: ReminderType,
    pub lead_minutes: i64,
    pub lookback_minutes: i64,
}

impl ReminderWindow {
    pub fn new(reminder_type: ReminderType, lead_minutes: i64, lookback_minutes: i64) -> Self {
        Self {
            reminder_type,
            lead_minutes,
            lookback_minutes,
        }
    }

    pub fn lead(&self) -> Duration {
        Duration::minutes(self.lead_minutes)
    }

    pub fn lookback(&self) -> Duration {
        Duration::minutes(self.lookback_minutes)
    }

    /// Latest appointment time this window covers at `now`. Inclusive:
    /// an appointment exactly `lead` away is due.
    pub fn deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lead()
    }

    /// Earliest appointment time this window still covers at `now`.
    pub fn floor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.deadline(now) - self.lookback()
    }

    pub fn is_due(&self, appointment_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        appointment_date >= self.floor(now) && appointment_date <= self.deadline(now)
    }

    /// 72h/48h/24h WhatsApp windows plus a voice call close to the appointment.
    pub fn defaults() -> Vec<ReminderWindow> {
        vec![
            ReminderWindow::new(ReminderType::Whatsapp72h, 72 * 60, 12 * 60),
            ReminderWindow::new(ReminderType::Whatsapp48h, 48 * 60, 12 * 60),
            ReminderWindow::new(ReminderType::Whatsapp24h, 24 * 60, 12 * 60),
            ReminderWindow::new(ReminderType::VoiceCall, 4 * 60, 2 * 60),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_72h() -> ReminderWindow {
        ReminderWindow::new(ReminderType::Whatsapp72h, 72 * 60, 12 * 60)
    }

    #[test]
    fn not_due_one_minute_past_lead() {
        let now = Utc::now();
        let window = window_72h();
        assert!(!window.is_due(now + Duration::hours(72) + Duration::minutes(1), now));
    }

    #[test]
    fn due_inside_window() {
        let now = Utc::now();
        let window = window_72h();
        assert!(window.is_due(now + Duration::hours(71) + Duration::minutes(59), now));
    }

    #[test]
    fn due_at_exact_lead_boundary() {
        let now = Utc::now();
        let window = window_72h();
        assert!(window.is_due(now + Duration::hours(72), now));
    }

    #[test]
    fn not_due_beyond_lookback() {
        let now = Utc::now();
        let window = window_72h();
        // 72h lead with a 12h lookback covers appointments 60h..=72h out.
        assert!(!window.is_due(now + Duration::hours(59), now));
        assert!(window.is_due(now + Duration::hours(60), now));
    }

    #[test]
    fn channel_mapping() {
        assert_eq!(ReminderType::Whatsapp48h.channel(), ReminderChannel::Text);
        assert_eq!(ReminderType::VoiceCall.channel(), ReminderChannel::Voice);
    }
}
