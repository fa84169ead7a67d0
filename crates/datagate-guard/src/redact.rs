//! Outbound redaction.
//!
//! Applied to the formatted answer just before it leaves the pipeline, so
//! contact details read from the database never reach the caller verbatim.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern compiles")
});

/// French numbers: `0X XX XX XX XX` with optional space, dot or dash separators.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b0[1-9][\s.-]?\d{2}[\s.-]?\d{2}[\s.-]?\d{2}[\s.-]?\d{2}\b")
        .expect("phone pattern compiles")
});

pub const EMAIL_MASK: &str = "***@***.com";
pub const PHONE_MASK: &str = "** ** ** ** **";

/// Masks e-mail addresses and phone numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Redactor;

impl Redactor {
    pub fn new() -> Self {
        Self
    }

    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let masked = match EMAIL_RE.replace_all(text, EMAIL_MASK) {
            Cow::Borrowed(_) => PHONE_RE.replace_all(text, PHONE_MASK),
            Cow::Owned(s) => Cow::Owned(PHONE_RE.replace_all(&s, PHONE_MASK).into_owned()),
        };

        if let Cow::Owned(_) = masked {
            tracing::debug!("redacted contact details from answer");
        }
        masked
    }
}
