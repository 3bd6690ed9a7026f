//! Plain-text rendering of notification emails in the recipient's language.
//!
//! Supported languages are `en`, `es` and `fr`; anything else falls back to
//! English. Only the surrounding text is localized, the notification title
//! and message are inserted as stored.

use super::email_sender::NotificationEmail;
use crate::notification::notification_models::NotificationCategory;

pub const DEFAULT_LANG: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lang {
    En,
    Es,
    Fr,
}

impl Lang {
    fn resolve(code: &str) -> Self {
        let primary = code.split(['-', '_']).next().unwrap_or(DEFAULT_LANG);
        match primary.to_lowercase().as_str() {
            "es" => Lang::Es,
            "fr" => Lang::Fr,
            _ => Lang::En,
        }
    }
}

fn category_label(category: NotificationCategory, lang: Lang) -> &'static str {
    use NotificationCategory::*;
    match (lang, category) {
        (Lang::En, MaintenanceReminder) => "Maintenance reminder",
        (Lang::En, LicenseExpiry) => "License expiry",
        (Lang::En, IncidentAlert) => "Incident alert",
        (Lang::En, DocumentExpiry) => "Document expiry",
        (Lang::En, System) => "System notice",
        (Lang::Es, MaintenanceReminder) => "Recordatorio de mantenimiento",
        (Lang::Es, LicenseExpiry) => "Vencimiento de licencia",
        (Lang::Es, IncidentAlert) => "Alerta de incidente",
        (Lang::Es, DocumentExpiry) => "Vencimiento de documento",
        (Lang::Es, System) => "Aviso del sistema",
        (Lang::Fr, MaintenanceReminder) => "Rappel d'entretien",
        (Lang::Fr, LicenseExpiry) => "Expiration de permis",
        (Lang::Fr, IncidentAlert) => "Alerte incident",
        (Lang::Fr, DocumentExpiry) => "Expiration de document",
        (Lang::Fr, System) => "Avis système",
    }
}

fn greeting(lang: Lang, name: &str) -> String {
    match lang {
        Lang::En => format!("Hello {},", name),
        Lang::Es => format!("Hola {},", name),
        Lang::Fr => format!("Bonjour {},", name),
    }
}

fn action_line(lang: Lang, url: &str) -> String {
    match lang {
        Lang::En => format!("View details: {}", url),
        Lang::Es => format!("Ver detalles: {}", url),
        Lang::Fr => format!("Voir les détails : {}", url),
    }
}

fn footer(lang: Lang) -> &'static str {
    match lang {
        Lang::En => "You receive this email because alerts are enabled in your notification settings.",
        Lang::Es => "Recibe este correo porque las alertas están activadas en su configuración de notificaciones.",
        Lang::Fr => "Vous recevez cet e-mail car les alertes sont activées dans vos paramètres de notification.",
    }
}

pub fn render_subject(email: &NotificationEmail) -> String {
    let lang = Lang::resolve(&email.language);
    format!("[{}] {}", category_label(email.category, lang), email.title)
}

pub fn render_body(email: &NotificationEmail) -> String {
    let lang = Lang::resolve(&email.language);
    let mut body = format!("{}\n\n{}\n\n{}\n", greeting(lang, &email.name), email.title, email.message);
    if let Some(url) = &email.action_url {
        body.push('\n');
        body.push_str(&action_line(lang, url));
        body.push('\n');
    }
    body.push_str("\n--\n");
    body.push_str(footer(lang));
    body
}
