//! Fire-and-forget booking notifications.
//!
//! The booking path only ever calls [`Notifier::dispatch`], which hands the
//! event to a bounded queue without waiting. A single worker task drains the
//! queue and emails the operations inbox. Nothing that happens here can fail
//! a booking: a full or closed queue drops the event, a failed send is logged.

use chrono::{NaiveDate, NaiveTime};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::config::SmtpConfig;

/// Payload of the new-booking event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingNotification {
    pub booking_id: String,
    pub client_name: String,
    pub companion_name: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub venue_name: String,
    pub total_amount: i64,
    pub phone: String,
}

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<BookingNotification>,
}

impl Notifier {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<BookingNotification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue the event for delivery. Never blocks and never fails the caller.
    pub fn dispatch(&self, notification: BookingNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                tracing::warn!("Notification queue full, dropping notice for booking {}", n.booking_id);
            }
            Err(TrySendError::Closed(n)) => {
                tracing::warn!("Notification worker gone, dropping notice for booking {}", n.booking_id);
            }
        }
    }
}

/// Start the worker that drains the queue until every [`Notifier`] is dropped
pub fn spawn_worker(
    mut rx: mpsc::Receiver<BookingNotification>,
    smtp: SmtpConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            if !smtp.enabled {
                tracing::info!(
                    "SMTP disabled, booking notification not emailed: {}",
                    serde_json::to_string(&notification).unwrap_or_default()
                );
                continue;
            }

            match send_booking_email(&smtp, &notification).await {
                Ok(()) => tracing::info!(
                    "Booking notification sent for {} to {}",
                    notification.booking_id,
                    smtp.notify_email
                ),
                Err(e) => tracing::error!(
                    "Failed to send booking notification for {}: {}",
                    notification.booking_id,
                    e
                ),
            }
        }
        tracing::debug!("Notification worker stopped");
    })
}

pub fn subject(n: &BookingNotification) -> String {
    format!("New Booking Request - {}", n.companion_name)
}

pub fn render_html(n: &BookingNotification) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>New Booking Request</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>New Booking Request</h1>
    <p><strong>Client:</strong> {client}</p>
    <p><strong>Companion:</strong> {companion}</p>
    <p><strong>Date:</strong> {date}</p>
    <p><strong>Time:</strong> {time}</p>
    <p><strong>Venue:</strong> {venue}</p>
    <p><strong>Amount:</strong> ₹{amount}</p>
    <p><strong>Phone:</strong> {phone}</p>
    <hr>
    <p>Please review and confirm this booking.</p>
</body>
</html>"#,
        client = escape(&n.client_name),
        companion = escape(&n.companion_name),
        date = n.booking_date.format("%Y-%m-%d"),
        time = n.start_time.format("%H:%M"),
        venue = escape(&n.venue_name),
        amount = n.total_amount,
        phone = escape(&n.phone),
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn send_booking_email(
    smtp_config: &SmtpConfig,
    notification: &BookingNotification,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let email = Message::builder()
        .from(format!("{} <{}>", smtp_config.from_name, smtp_config.from_email).parse()?)
        .to(smtp_config.notify_email.parse()?)
        .subject(subject(notification))
        .header(ContentType::TEXT_HTML)
        .body(render_html(notification))?;

    if smtp_config.use_sendmail {
        AsyncSendmailTransport::<Tokio1Executor>::new().send(email).await?;
        return Ok(());
    }

    let creds = Credentials::new(
        smtp_config.username.clone(),
        smtp_config.password.clone(),
    );

    let mailer: AsyncSmtpTransport<Tokio1Executor> = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_config.host)?
        .credentials(creds)
        .port(smtp_config.port)
        .build();

    mailer.send(email).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: &str) -> BookingNotification {
        BookingNotification {
            booking_id: id.to_string(),
            client_name: "ravi@example.com".to_string(),
            companion_name: "Meera".to_string(),
            booking_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            venue_name: "Tea & <Toast>".to_string(),
            total_amount: 1500,
            phone: "+91 98765 43210".to_string(),
        }
    }

    #[test]
    fn email_carries_every_field() {
        let n = notification("b1");
        assert_eq!(subject(&n), "New Booking Request - Meera");

        let html = render_html(&n);
        assert!(html.contains("ravi@example.com"));
        assert!(html.contains("2026-10-20"));
        assert!(html.contains("18:30"));
        assert!(html.contains("Tea &amp; &lt;Toast&gt;"));
        assert!(html.contains("₹1500"));
        assert!(html.contains("+91 98765 43210"));
    }

    #[tokio::test]
    async fn dispatch_queues_without_waiting() {
        let (notifier, mut rx) = Notifier::channel(4);
        notifier.dispatch(notification("b1"));
        assert_eq!(rx.recv().await.unwrap().booking_id, "b1");
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (notifier, mut rx) = Notifier::channel(1);
        notifier.dispatch(notification("b1"));
        notifier.dispatch(notification("b2"));

        assert_eq!(rx.recv().await.unwrap().booking_id, "b1");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_queue_is_tolerated() {
        let (notifier, rx) = Notifier::channel(1);
        drop(rx);
        notifier.dispatch(notification("b1"));
    }

    #[tokio::test]
    async fn worker_drains_and_stops_when_senders_drop() {
        let (notifier, rx) = Notifier::channel(4);
        let worker = spawn_worker(rx, SmtpConfig::default());
        notifier.dispatch(notification("b1"));
        drop(notifier);
        worker.await.unwrap();
    }
}
