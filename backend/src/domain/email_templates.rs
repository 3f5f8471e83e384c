//! Inline HTML templates for deposit emails.

use super::{DepositEvent, DepositEventKind, format_vnd};

/// Rendered email ready for the email port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Render the customer email for an event, or `None` when the customer has
/// no address on file.
pub fn render_deposit_email(event: &DepositEvent) -> Option<EmailMessage> {
    let to = event.customer.email.as_deref()?.trim();
    if to.is_empty() {
        return None;
    }

    let subject = match event.kind {
        DepositEventKind::Created => format!("Xác nhận đặt cọc #{}", event.deposit_id),
        DepositEventKind::Updated => format!("Cập nhật đơn đặt cọc #{}", event.deposit_id),
        DepositEventKind::Cancelled => format!("Hủy đơn đặt cọc #{}", event.deposit_id),
    };
    let lead = match event.kind {
        DepositEventKind::Created => "Cảm ơn bạn đã đặt cọc. Chúng tôi sẽ liên hệ để xác nhận lịch nhận xe.",
        DepositEventKind::Updated => "Trạng thái đơn đặt cọc của bạn đã thay đổi.",
        DepositEventKind::Cancelled => "Đơn đặt cọc của bạn đã được hủy và xe đã được mở bán trở lại.",
    };

    let html = format!(
        "<div style=\"font-family:sans-serif\">\
<h2>{subject}</h2>\
<p>Xin chào {name},</p>\
<p>{lead}</p>\
<table>\
<tr><td>Mã đơn</td><td>#{id}</td></tr>\
<tr><td>Xe</td><td>{vehicle}</td></tr>\
<tr><td>Số tiền đặt cọc</td><td>{amount}</td></tr>\
<tr><td>Trạng thái</td><td>{status}</td></tr>\
</table>\
</div>",
        subject = escape_html(&subject),
        name = escape_html(&event.customer.full_name),
        id = event.deposit_id,
        vehicle = escape_html(&event.vehicle_name),
        amount = format_vnd(event.amount),
        status = event.status.label(),
    );

    Some(EmailMessage {
        to: to.to_owned(),
        subject,
        html,
    })
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DepositId, DepositStatus, Role, User, UserId};
    use rstest::rstest;

    fn event(kind: DepositEventKind, email: Option<&str>) -> DepositEvent {
        DepositEvent {
            kind,
            deposit_id: DepositId::new(5).expect("valid id"),
            customer: User {
                id: UserId::new(3).expect("valid id"),
                role: Role::Customer,
                full_name: "Trần <b>An</b>".to_owned(),
                email: email.map(str::to_owned),
                phone: None,
            },
            vehicle_name: "VF9".to_owned(),
            amount: 150_000_000,
            status: DepositStatus::Confirmed,
        }
    }

    #[rstest]
    fn skips_customers_without_email() {
        assert!(render_deposit_email(&event(DepositEventKind::Created, None)).is_none());
        assert!(render_deposit_email(&event(DepositEventKind::Created, Some("  "))).is_none());
    }

    #[rstest]
    #[case(DepositEventKind::Created, "Xác nhận đặt cọc #5")]
    #[case(DepositEventKind::Updated, "Cập nhật đơn đặt cọc #5")]
    #[case(DepositEventKind::Cancelled, "Hủy đơn đặt cọc #5")]
    fn subject_follows_event_kind(#[case] kind: DepositEventKind, #[case] subject: &str) {
        let email = render_deposit_email(&event(kind, Some("an@example.com"))).expect("email");
        assert_eq!(email.subject, subject);
        assert_eq!(email.to, "an@example.com");
    }

    #[rstest]
    fn body_interpolates_and_escapes_fields() {
        let email =
            render_deposit_email(&event(DepositEventKind::Updated, Some("an@example.com")))
                .expect("email");
        assert!(email.html.contains("Trần &lt;b&gt;An&lt;/b&gt;"));
        assert!(email.html.contains("VF9"));
        assert!(email.html.contains("150.000.000 VND"));
        assert!(email.html.contains("Đã xác nhận"));
    }
}
