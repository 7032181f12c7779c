use crate::models::{BookingView, StatusDisplay};

use super::OutgoingEmail;

const SALON: &str = "8Paws Pet Boutique";

pub fn verification(address: &str, name: &str, code: &str, ttl_minutes: i64) -> OutgoingEmail {
    OutgoingEmail {
        to: address.to_string(),
        to_name: name.to_string(),
        subject: format!("Verify Your Email - {SALON}"),
        body: format!(
            "Hi {name}!\n\n\
             Your verification code is: {code}\n\n\
             Enter this code on the verification page to activate your account. \
             The code expires in {ttl_minutes} minutes.\n\n\
             If you didn't create this account, you can ignore this email.\n\n\
             The {SALON} Team"
        ),
    }
}

pub fn password_reset(address: &str, name: &str, reset_url: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: address.to_string(),
        to_name: name.to_string(),
        subject: format!("Reset Your Password - {SALON}"),
        body: format!(
            "Hi {name},\n\n\
             We received a request to reset your password. Use the link below to set a new one:\n\n\
             {reset_url}\n\n\
             This link expires in 1 hour and can be used once. \
             If you didn't request a reset, ignore this email.\n\n\
             The {SALON} Team"
        ),
    }
}

pub fn booking_confirmation(
    address: &str,
    view: &BookingView,
    dashboard_url: &str,
) -> OutgoingEmail {
    let services = if view.services.is_empty() {
        "-".to_string()
    } else {
        view.services
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let rfid = view.rfid_tag.as_deref().unwrap_or("-");

    OutgoingEmail {
        to: address.to_string(),
        to_name: view.owner_name.clone(),
        subject: format!("Check-in Confirmation - {} at {SALON}", view.pet_name),
        body: format!(
            "Hi {owner},\n\n\
             {pet} ({breed}) has been checked in.\n\
             Booking: {booking}\n\
             RFID tag: {rfid}\n\
             Services: {services}\n\
             Total: {total}\n\n\
             Follow the grooming progress here:\n{dashboard_url}\n\n\
             The {SALON} Team",
            owner = view.owner_name,
            pet = view.pet_name,
            breed = view.pet_breed,
            booking = view.booking_id,
            total = format_amount(view.total_amount),
        ),
    }
}

pub fn status_update(address: &str, view: &BookingView, dashboard_url: &str) -> OutgoingEmail {
    let StatusDisplay { label, emoji, .. } = &view.status;
    OutgoingEmail {
        to: address.to_string(),
        to_name: view.owner_name.clone(),
        subject: format!("Pet Grooming Update - {} is {}", view.pet_name, label),
        body: format!(
            "Hi {owner},\n\n\
             {emoji} {pet} is now: {label}\n\n\
             Live status:\n{dashboard_url}\n\n\
             The {SALON} Team",
            owner = view.owner_name,
            pet = view.pet_name,
        ),
    }
}

/// Formats minor units (centavos) as pesos.
pub fn format_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}₱{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::BookedService;

    fn view(status: &str) -> BookingView {
        BookingView {
            booking_id: Uuid::new_v4(),
            rfid_tag: Some("PAW-001".into()),
            pet_name: "Mochi".into(),
            pet_type: "dog".into(),
            pet_breed: "Shih Tzu".into(),
            age_range: None,
            size: None,
            special_notes: None,
            owner_name: "Ana Cruz".into(),
            owner_phone: "09171234567".into(),
            owner_email: Some("ana@example.com".into()),
            status: StatusDisplay::from_raw(status),
            status_history: vec![],
            services: vec![
                BookedService { name: "Basic Bath".into(), price: 50000 },
                BookedService { name: "Nail Trim".into(), price: 15000 },
            ],
            total_amount: 65000,
            check_in_time: Utc::now(),
            estimated_completion: None,
        }
    }

    #[test]
    fn verification_mail_carries_code() {
        let mail = verification("ana@example.com", "Ana", "042137", 30);
        assert!(mail.body.contains("042137"));
        assert!(mail.body.contains("30 minutes"));
        assert_eq!(mail.to, "ana@example.com");
    }

    #[test]
    fn status_mail_subject_uses_label() {
        let mail = status_update("ana@example.com", &view("ready"), "http://x/guest?token=t");
        assert_eq!(mail.subject, "Pet Grooming Update - Mochi is Ready for Pickup");
        assert!(mail.body.contains("http://x/guest?token=t"));
    }

    #[test]
    fn confirmation_lists_services_and_total() {
        let mail = booking_confirmation("ana@example.com", &view("checked-in"), "http://x");
        assert!(mail.body.contains("Basic Bath, Nail Trim"));
        assert!(mail.body.contains("₱650.00"));
        assert!(mail.body.contains("PAW-001"));
    }

    #[test]
    fn amounts_format_as_pesos() {
        assert_eq!(format_amount(0), "₱0.00");
        assert_eq!(format_amount(1505), "₱15.05");
        assert_eq!(format_amount(-250), "-₱2.50");
    }
}
