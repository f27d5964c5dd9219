pub mod mailer;
pub mod repositories;
pub mod session;
