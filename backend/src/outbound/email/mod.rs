//! Transactional email adapters.

mod http_sender;
mod logging_sender;

pub use http_sender::HttpEmailSender;
pub use logging_sender::LoggingEmailSender;
