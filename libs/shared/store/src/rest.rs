use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentStatus, Call, CallUpdate, Patient, ReminderLogEntry, ReminderType,
    ReminderWindow,
};

use crate::{AppointmentStore, StoreError};

/// REST client for the appointment store (PostgREST-style API).
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_seconds))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.store_url.clone(),
            api_key: config.store_api_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers
    }

    /// GET returning parsed JSON.
    async fn fetch<T>(&self, path: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request: GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.get_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store API error ({}): {}", status, error_text);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Write request; the store answers writes with 201/204 and an empty
    /// body, so only the status is checked.
    async fn execute(&self, method: Method, path: &str, body: Value) -> Result<(), StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request: {} {}", method, url);

        let response = self
            .client
            .request(method, &url)
            .headers(self.get_headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store API error ({}): {}", status, error_text);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(())
    }

    fn flag_column(reminder_type: ReminderType) -> &'static str {
        match reminder_type {
            ReminderType::Whatsapp72h => "reminder_72h_sent",
            ReminderType::Whatsapp48h => "reminder_48h_sent",
            ReminderType::Whatsapp24h => "reminder_24h_sent",
            ReminderType::VoiceCall => "call_reminder_sent",
        }
    }

    fn fmt_ts(ts: DateTime<Utc>) -> String {
        ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

#[async_trait]
impl AppointmentStore for RestStore {
    async fn find_due_appointments(
        &self,
        window: &ReminderWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let flag = Self::flag_column(window.reminder_type);
        let path = format!(
            "/rest/v1/appointments?appointment_date=gte.{}&appointment_date=lte.{}&status=not.in.(confirmed,cancelled)&{}=eq.false",
            Self::fmt_ts(window.floor(now)),
            Self::fmt_ts(window.deadline(now)),
            flag,
        );

        self.fetch(&path).await
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let mut rows: Vec<Appointment> = self.fetch(&path).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        let path = format!("/rest/v1/patients?id=eq.{}", id);
        let mut rows: Vec<Patient> = self.fetch(&path).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn set_reminder_sent(
        &self,
        id: Uuid,
        reminder_type: ReminderType,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let flag = Self::flag_column(reminder_type);
        let path = format!("/rest/v1/appointments?id=eq.{}", id);

        let mut body = serde_json::Map::new();
        body.insert(flag.to_string(), Value::Bool(true));
        body.insert(format!("{}_at", flag), serde_json::to_value(sent_at)?);
        body.insert("updated_at".to_string(), serde_json::to_value(sent_at)?);

        self.execute(Method::PATCH, &path, Value::Object(body)).await
    }

    async fn set_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let body = json!({
            "status": status,
            "updated_at": Utc::now(),
        });

        self.execute(Method::PATCH, &path, body).await
    }

    async fn set_needs_human_call(&self, id: Uuid) -> Result<(), StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let body = json!({
            "needs_human_call": true,
            "updated_at": Utc::now(),
        });

        self.execute(Method::PATCH, &path, body).await
    }

    async fn create_call(&self, call: &Call) -> Result<(), StoreError> {
        let body = serde_json::to_value(call)?;
        self.execute(Method::POST, "/rest/v1/calls", body).await
    }

    async fn find_call_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Call>, StoreError> {
        let path = format!("/rest/v1/calls?conversation_id=eq.{}", conversation_id);
        let mut rows: Vec<Call> = self.fetch(&path).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn update_call(&self, id: Uuid, update: CallUpdate) -> Result<(), StoreError> {
        let path = format!("/rest/v1/calls?id=eq.{}", id);
        let body = serde_json::to_value(&update)?;

        self.execute(Method::PATCH, &path, body).await
    }

    async fn append_reminder_log(
        &self,
        appointment_id: Uuid,
        reminder_type: ReminderType,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let entry = ReminderLogEntry::new(appointment_id, reminder_type, sent_at);
        let body = serde_json::to_value(&entry)?;
        self.execute(Method::POST, "/rest/v1/reminder_logs", body)
            .await
    }
}
