use super::Improvement;

use crate::{config::SmtpSettings, FlightWatchError, GenericError};

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::*;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, improvements: &[Improvement]) -> Result<(), FlightWatchError>;
}

/// Subject and body of the summary mail for one run's improvements.
pub fn compose_summary(improvements: &[Improvement]) -> (String, String) {
    let subject = format!(
        "Cheap Flight{} Found!",
        if improvements.len() > 1 { "s" } else { "" }
    );

    let body = improvements
        .iter()
        .map(|improvement| {
            format!(
                "Found flight to {} for ${} departing on {}\n",
                improvement.city,
                improvement.quote.total_price_text().unwrap_or_else(|| "?".to_string()),
                improvement.quote.departure_at().unwrap_or("an unknown date"),
            )
        })
        .collect();

    (subject, body)
}

/// Mails the summary to the SMTP account's own address over STARTTLS.
pub struct SmtpNotifier {
    settings: Option<SmtpSettings>,
}

impl SmtpNotifier {
    pub fn new(settings: Option<SmtpSettings>) -> Self {
        if settings.is_none() {
            warn!("SMTP settings incomplete; cheap flight notifications will fail.");
        }
        SmtpNotifier { settings }
    }

    async fn send(
        settings: &SmtpSettings,
        subject: String,
        body: String,
    ) -> Result<(), GenericError> {
        let mailbox: Mailbox = settings.email.parse()?;
        let message = Message::builder()
            .from(mailbox.clone())
            .to(mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.email.clone(),
                settings.token.clone(),
            ))
            .build();
        transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, improvements: &[Improvement]) -> Result<(), FlightWatchError> {
        let settings = self
            .settings
            .as_ref()
            .ok_or_else(|| FlightWatchError::Delivery("SMTP settings are not configured".into()))?;

        let (subject, body) = compose_summary(improvements);
        Self::send(settings, subject, body)
            .await
            .map_err(FlightWatchError::Delivery)?;
        info!(
            "Sent notification for {} cheaper flight(s) to {}.",
            improvements.len(),
            settings.email
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::quote;

    fn improvement(city: &str, total: &str, at: &str) -> Improvement {
        Improvement {
            city: city.to_string(),
            quote: quote(total, at),
        }
    }

    #[test]
    fn single_improvement_uses_singular_subject() {
        let (subject, body) =
            compose_summary(&[improvement("Paris", "300.00", "2025-02-01T10:00:00")]);

        assert_eq!(subject, "Cheap Flight Found!");
        assert_eq!(
            body,
            "Found flight to Paris for $300.00 departing on 2025-02-01T10:00:00\n"
        );
    }

    #[test]
    fn several_improvements_get_one_line_each() {
        let (subject, body) = compose_summary(&[
            improvement("Paris", "300.00", "2025-02-01T10:00:00"),
            improvement("Tokyo", "812.40", "2025-02-01T13:35:00"),
        ]);

        assert_eq!(subject, "Cheap Flights Found!");
        assert_eq!(body.lines().count(), 2);
        assert_eq!(
            body.lines().nth(1),
            Some("Found flight to Tokyo for $812.40 departing on 2025-02-01T13:35:00")
        );
    }

    #[tokio::test]
    async fn missing_smtp_settings_is_a_delivery_error() {
        let notifier = SmtpNotifier::new(None);

        let err = notifier
            .notify(&[improvement("Paris", "300.00", "2025-02-01T10:00:00")])
            .await
            .unwrap_err();

        assert!(matches!(err, FlightWatchError::Delivery(_)));
        assert!(!err.is_fatal());
    }
}
