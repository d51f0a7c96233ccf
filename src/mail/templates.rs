use crate::entities::order::{self, Status};

use super::EmailMessage;

const SHOP_NAME: &str = "Shoe Shop";

/// Headline and "next steps" shown in a status update email.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusCopy {
    pub headline: &'static str,
    pub next_steps: &'static [&'static str],
}

pub fn status_copy(status: Status) -> Option<StatusCopy> {
    let copy = match status {
        Status::Confirmed => StatusCopy {
            headline: "Your order has been confirmed!",
            next_steps: &[
                "We are preparing your items for shipment.",
                "You will receive another email as soon as your order ships.",
            ],
        },
        Status::Processing => StatusCopy {
            headline: "Your order is being processed.",
            next_steps: &[
                "Our warehouse team is picking and packing your items.",
                "Shipping usually follows within 1-2 business days.",
            ],
        },
        Status::Shipped => StatusCopy {
            headline: "Your order is on its way!",
            next_steps: &[
                "Your package has been handed over to the carrier.",
                "Delivery usually takes 2-5 business days.",
            ],
        },
        Status::Delivered => StatusCopy {
            headline: "Your order has been delivered.",
            next_steps: &[
                "We hope you enjoy your new shoes!",
                "If something is not right, reply to this email within 14 days.",
            ],
        },
        Status::Cancelled => StatusCopy {
            headline: "Your order has been cancelled.",
            next_steps: &[
                "If you did not request this cancellation, please contact us.",
                "Any payment made will be refunded within 5-7 business days.",
            ],
        },
        Status::Pending => return None,
    };

    Some(copy)
}

pub fn status_update(
    order: &order::Model,
    from: Status,
    to: Status,
    image_url: Option<&str>,
    app_url: &str,
) -> EmailMessage {
    let subject = format!("Order {} is now {}", order.reference, to.label());
    let generic = format!("The status of your order has changed to {}.", to.label());
    let copy = status_copy(to);
    let headline = copy.map(|copy| copy.headline).unwrap_or(generic.as_str());
    let next_steps = copy.map(|copy| copy.next_steps).unwrap_or(&[]);

    let mut text = format!(
        "Hello {},\n\n{}\n\nOrder: {}\nStatus: {} -> {}\n\n{}\n",
        order.customer_name,
        headline,
        order.reference,
        from.label(),
        to.label(),
        order_line_text(order),
    );
    if !next_steps.is_empty() {
        text.push_str("\nNext steps:\n");
        for step in next_steps {
            text.push_str(&format!("- {step}\n"));
        }
    }
    text.push_str(&format!("\n{SHOP_NAME}\n{app_url}\n"));

    let mut content = format!(
        "<p>Hello {},</p><h2>{}</h2><p>Order <strong>{}</strong>: {} &rarr; {}</p>{}",
        escape_html(&order.customer_name),
        escape_html(headline),
        escape_html(&order.reference),
        from.label(),
        to.label(),
        order_line_html(order, image_url),
    );
    if !next_steps.is_empty() {
        content.push_str("<h3>Next steps</h3><ul>");
        for step in next_steps {
            content.push_str(&format!("<li>{}</li>", escape_html(step)));
        }
        content.push_str("</ul>");
    }

    EmailMessage {
        to: order.customer_email.clone(),
        subject,
        text_body: text,
        html_body: layout(&content, app_url),
    }
}

pub fn order_placed(order: &order::Model, image_url: Option<&str>, app_url: &str) -> EmailMessage {
    let text = format!(
        "Hello {},\n\nThank you for your order! We have received it and will confirm it shortly.\n\nOrder: {}\n{}\n\nShipping to:\n{}\n{} {}\n\n{SHOP_NAME}\n{app_url}\n",
        order.customer_name,
        order.reference,
        order_line_text(order),
        order.shipping_address,
        order.postal_code,
        order.city,
    );

    let content = format!(
        "<p>Hello {},</p><h2>Thank you for your order!</h2><p>We have received order <strong>{}</strong> and will confirm it shortly.</p>{}<h3>Shipping to</h3><p>{}<br>{} {}</p>",
        escape_html(&order.customer_name),
        escape_html(&order.reference),
        order_line_html(order, image_url),
        escape_html(&order.shipping_address),
        escape_html(&order.postal_code),
        escape_html(&order.city),
    );

    EmailMessage {
        to: order.customer_email.clone(),
        subject: format!("Order {} received", order.reference),
        text_body: text,
        html_body: layout(&content, app_url),
    }
}

pub fn admin_alert(
    order: &order::Model,
    admin_email: &str,
    image_url: Option<&str>,
    app_url: &str,
) -> EmailMessage {
    let admin_link = format!("{app_url}/admin/orders/{}", order.id);
    let notes = order.notes.as_deref().unwrap_or("-");

    let text = format!(
        "New order {} was placed.\n\n{}\n\nCustomer: {} <{}>\nPhone: {}\nAddress: {}, {} {}\nNotes: {}\n\n{}\n",
        order.reference,
        order_line_text(order),
        order.customer_name,
        order.customer_email,
        order.customer_phone,
        order.shipping_address,
        order.postal_code,
        order.city,
        notes,
        admin_link,
    );

    let content = format!(
        "<h2>New order {}</h2>{}<h3>Customer</h3><p>{} &lt;{}&gt;<br>{}<br>{}, {} {}</p><p>Notes: {}</p><p><a href=\"{}\">Open in back-office</a></p>",
        escape_html(&order.reference),
        order_line_html(order, image_url),
        escape_html(&order.customer_name),
        escape_html(&order.customer_email),
        escape_html(&order.customer_phone),
        escape_html(&order.shipping_address),
        escape_html(&order.postal_code),
        escape_html(&order.city),
        escape_html(notes),
        escape_html(&admin_link),
    );

    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("New order {} ({:.2})", order.reference, order.total),
        text_body: text,
        html_body: layout(&content, app_url),
    }
}

fn order_line_text(order: &order::Model) -> String {
    let mut line = format!(
        "{} - size {}",
        order.product_name, order.size
    );
    if let Some(color) = &order.color {
        line.push_str(&format!(", {color}"));
    }
    line.push_str(&format!(
        "\n{} x {:.2} = {:.2}",
        order.quantity, order.product_price, order.total
    ));
    line
}

fn order_line_html(order: &order::Model, image_url: Option<&str>) -> String {
    let image = match image_url {
        Some(url) => format!(
            "<td width=\"120\"><img src=\"{}\" alt=\"{}\" width=\"120\" style=\"display:block;border:0\"></td>",
            escape_html(url),
            escape_html(&order.product_name)
        ),
        None => String::new(),
    };
    let color = order
        .color
        .as_deref()
        .map(|color| format!(", {}", escape_html(color)))
        .unwrap_or_default();

    format!(
        "<table cellpadding=\"8\"><tr>{}<td><strong>{}</strong><br>Size {}{}<br>{} &times; {:.2}<br>Total: <strong>{:.2}</strong></td></tr></table>",
        image,
        escape_html(&order.product_name),
        escape_html(&order.size),
        color,
        order.quantity,
        order.product_price,
        order.total,
    )
}

fn layout(content: &str, app_url: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#222\">{}<hr><p style=\"color:#888\"><a href=\"{}\">{}</a></p></body></html>",
        content,
        escape_html(app_url),
        SHOP_NAME,
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
