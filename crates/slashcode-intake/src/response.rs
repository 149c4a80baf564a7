/// HTTP-shaped outcome of one webhook delivery, independent of any
/// particular web framework (`spec.md` §6's response-code table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeResponse {
    pub status: u16,
    pub body: String,
}

impl IntakeResponse {
    pub(crate) fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub(crate) fn ok_diagnostic(message: impl Into<String>) -> Self {
        Self::new(200, message)
    }
}
