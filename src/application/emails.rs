use crate::domain::order::{EmailKind, Order};
use crate::domain::ports::Email;

/// Renders the transactional email of the given kind for an order.
///
/// Rendering is infallible and side-effect free; the invoice and reminder
/// bodies fall back to the dossier number when no payment link exists yet,
/// which only happens if rendering is invoked out of pipeline order.
pub fn render(kind: EmailKind, order: &Order) -> Email {
    let dossier = &order.dossier_number;
    let amount = order.amount;
    let link = order
        .payment_request_url
        .as_deref()
        .unwrap_or("(payment link to follow)");

    let (subject, body) = match kind {
        EmailKind::Confirmation => (
            format!("Order confirmation — {dossier}"),
            format!(
                "Thank you for your CV download order {dossier}.\n\
                 We have received your order of {amount}. You will receive \
                 an invoice shortly."
            ),
        ),
        EmailKind::Invoice => (
            format!("Invoice for order {dossier}"),
            format!(
                "Please find the invoice for order {dossier} ({amount}).\n\
                 You can pay directly via {link}."
            ),
        ),
        EmailKind::Reminder1 => (
            format!("Payment reminder — order {dossier}"),
            format!(
                "Our records show the invoice for order {dossier} ({amount}) \
                 is still open.\nYou can pay via {link}."
            ),
        ),
        EmailKind::Reminder2 => (
            format!("Final notice — order {dossier}"),
            format!(
                "This is the final notice for the open invoice of order \
                 {dossier} ({amount}).\nPlease pay via {link} to avoid \
                 further steps."
            ),
        ),
        EmailKind::PaymentConfirmation => (
            format!("Payment received — order {dossier}"),
            format!(
                "We have received your payment of {amount} for order \
                 {dossier}. Thank you."
            ),
        ),
    };

    Email {
        to: order.customer_email.clone(),
        subject,
        body,
    }
}
