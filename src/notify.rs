//! Outbound notifications for settlement events
//!
//! Rendering is local; actual email/SMS delivery belongs to external
//! providers behind the [`Notifier`] trait. The default implementation
//! logs the rendered payloads, which is also what keeps notification
//! failures from ever failing a settlement run.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Everything the finalization sweep knows about a closed window
#[derive(Debug, Clone)]
pub struct WindowFinalizedNotice {
    pub window_id: Uuid,
    pub title: String,
    pub participants: i32,
    pub orders_paid: usize,
    pub orders_failed: usize,
    pub total_amount: Decimal,
}

impl WindowFinalizedNotice {
    pub fn orders_processed(&self) -> usize {
        self.orders_paid + self.orders_failed
    }
}

/// Generate bulk order finalized email (subject, html body)
pub fn window_finalized_email(notice: &WindowFinalizedNotice) -> (String, String) {
    let subject = format!("Bulk Order Window Finalized - {}", notice.title);
    let body = format!(
        r#"<html>
<body>
  <h2>Bulk Order Window Finalized!</h2>
  <p>The bulk order window "{title}" has been finalized.</p>
  <ul>
    <li>Participants: {participants}</li>
    <li>Orders processed: {processed} ({paid} paid, {failed} failed)</li>
    <li>Total amount: &#8377;{total}</li>
  </ul>
  <p>Check your account for details.</p>
  <p>- UstaadCart</p>
</body>
</html>"#,
        title = notice.title,
        participants = notice.participants,
        processed = notice.orders_processed(),
        paid = notice.orders_paid,
        failed = notice.orders_failed,
        total = notice.total_amount,
    );
    (subject, body)
}

/// Generate bulk order finalized SMS line
pub fn window_finalized_sms(notice: &WindowFinalizedNotice) -> String {
    format!(
        "Bulk order '{}' finalized! {} orders processed, total: \u{20b9}{}. Check your account for details. - UstaadCart",
        notice.title,
        notice.orders_processed(),
        notice.total_amount,
    )
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a finalized window to its participants
    async fn window_finalized(&self, notice: &WindowFinalizedNotice);
}

/// Logs rendered notifications instead of delivering them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn window_finalized(&self, notice: &WindowFinalizedNotice) {
        let (subject, _body) = window_finalized_email(notice);
        let sms = window_finalized_sms(notice);
        tracing::info!(
            target: "NOTIFY",
            window_id = %notice.window_id,
            subject = %subject,
            sms = %sms,
            "window finalized notification"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> WindowFinalizedNotice {
        WindowFinalizedNotice {
            window_id: Uuid::new_v4(),
            title: "Monday veggies".to_string(),
            participants: 3,
            orders_paid: 4,
            orders_failed: 1,
            total_amount: Decimal::new(123450, 2), // 1234.50
        }
    }

    #[test]
    fn test_email_template() {
        let (subject, body) = window_finalized_email(&notice());
        assert_eq!(subject, "Bulk Order Window Finalized - Monday veggies");
        assert!(body.contains("Monday veggies"));
        assert!(body.contains("5 (4 paid, 1 failed)"));
        assert!(body.contains("1234.50"));
    }

    #[test]
    fn test_sms_template() {
        let sms = window_finalized_sms(&notice());
        assert!(sms.starts_with("Bulk order 'Monday veggies' finalized!"));
        assert!(sms.contains("5 orders processed"));
        assert!(sms.ends_with("- UstaadCart"));
    }
}
