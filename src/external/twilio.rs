use crate::config::TwilioConfig;
use crate::error::{AppError, AppResult};
use crate::utils::to_e164;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SendSmsResponse {
    pub sid: String,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    /// Sends one SMS through the Messages API and returns the message SID.
    pub async fn send_sms(&self, to: &str, body: &str) -> AppResult<String> {
        if !self.is_enabled() {
            return Err(AppError::ExternalApiError(
                "SMS service not configured".to_string(),
            ));
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        );
        let to = to_e164(to);

        let params = [
            ("To", to.as_str()),
            ("From", self.config.from_phone.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let sent: SendSmsResponse = response.json().await?;
            log::info!(
                "SMS sent to {to}: sid={}, status={}",
                sent.sid,
                sent.status.as_deref().unwrap_or("unknown")
            );
            Ok(sent.sid)
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("SMS to {to} failed ({status}): {error_text}");
            Err(AppError::ExternalApiError(format!(
                "SMS sending failed: {error_text}"
            )))
        }
    }
}
