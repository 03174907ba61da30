mod at_command;
mod bearer;
mod confirmation;
mod notification;
mod ntp_status;
mod registration_status;
mod sms;

pub use at_command::{AtCommand, ExpectedLines};
pub use bearer::BearerStatus;
pub use confirmation::{Accept, Confirmation};
pub use notification::{HttpMethod, HttpOutcome, Notification};
pub use ntp_status::NtpStatus;
pub use registration_status::RegistrationStatus;
pub use sms::{ListEntry, MessageFilter, SmsRecord, SmsSendStatus};
