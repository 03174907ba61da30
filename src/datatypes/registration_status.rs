use num_enum::TryFromPrimitive;

/// The `<stat>` field of `+CREG: <n>,<stat>`

#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// Not registered, not searching
    NotRegistered = 0,

    /// Registered on the home network
    Home = 1,

    /// Not registered, searching for an operator
    Searching = 2,

    /// Registration denied
    Denied = 3,

    Unknown = 4,

    /// Registered while roaming
    Roaming = 5,
}

impl RegistrationStatus {
    /// Parse `+CREG: 0,1`
    pub fn from_reply(reply: &str) -> Option<RegistrationStatus> {
        let stat = reply.strip_prefix("+CREG:")?.split(',').nth(1)?;
        RegistrationStatus::try_from(stat.trim().parse::<u8>().ok()?).ok()
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationStatus::Home | RegistrationStatus::Roaming)
    }
}
