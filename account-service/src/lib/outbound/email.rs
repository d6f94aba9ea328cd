pub mod log;
pub mod smtp;

pub use log::LogEmailSender;
pub use smtp::SmtpEmailSender;
