/// Final acknowledgements a confirmed command may accept besides `OK`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Accept {
    pub download: bool,
    pub error: bool,
}

impl Accept {
    /// Only `OK` counts
    pub fn ok() -> Self {
        Self::default()
    }

    /// Also report `DOWNLOAD` (the modem is ready for an upload)
    pub fn with_download(mut self) -> Self {
        self.download = true;
        self
    }

    /// Also report `ERROR` instead of treating it as a plain failure
    pub fn with_error(mut self) -> Self {
        self.error = true;
        self
    }
}

/// How a confirmed command ended
///
/// `Download` and `Error` are only produced when the matching `Accept`
/// flag was set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Ok,
    Download,
    Error,
    /// Unexpected reply, or no terminal acknowledgement before the deadline
    Failed,
}

impl Confirmation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Confirmation::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_flags() {
        assert_eq!(Accept::ok(), Accept { download: false, error: false });
        let accept = Accept::ok().with_download().with_error();
        assert!(accept.download && accept.error);
    }

    #[test]
    fn test_only_ok_is_ok() {
        assert!(Confirmation::Ok.is_ok());
        assert!(!Confirmation::Download.is_ok());
        assert!(!Confirmation::Error.is_ok());
        assert!(!Confirmation::Failed.is_ok());
    }
}
