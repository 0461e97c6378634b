use crate::models::Application;

pub const FALLBACK_RECRUITER_NAME: &str = "Hiring Manager";

/// A follow-up email prepared from a template for one application. Delivery
/// is not implemented; prepared messages are logged and returned to the
/// caller for a compose view.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Fills `{{company_name}}`, `{{job_title}}` and `{{recruiter_name}}` in from
/// the application. The recruiter name is the local part of the contact email.
pub fn render_placeholders(text: &str, application: &Application) -> String {
    let recruiter = application
        .contact_email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or(FALLBACK_RECRUITER_NAME);

    text.replace("{{company_name}}", &application.company_name)
        .replace("{{job_title}}", &application.job_title)
        .replace("{{recruiter_name}}", recruiter)
}

/// Builds the outgoing message for one application, or `None` when there is
/// no contact email to address it to.
pub fn prepare_email(
    subject: &str,
    body: &str,
    application: &Application,
) -> Option<PreparedEmail> {
    let to = application.contact_email.clone()?;
    Some(PreparedEmail {
        to,
        subject: render_placeholders(subject, application),
        body: render_placeholders(body, application),
    })
}
