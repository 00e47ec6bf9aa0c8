//! Mailbox access for device verification codes.

mod code;
mod inbox;

pub use code::extract_verification_code;
pub use inbox::ImapMailClient;

use async_trait::async_trait;

use crate::credentials::MailCredentials;
use crate::error::Result;

/// Reads verification emails from the account's inbox.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Body of the first unseen message whose subject equals `subject`.
    ///
    /// Every matching message is marked seen; unseen mail with other
    /// subjects is left untouched. `None` when nothing matches.
    async fn take_unseen_by_subject(
        &self,
        credentials: &MailCredentials,
        subject: &str,
    ) -> Result<Option<String>>;
}

/// Pick the messages whose subject equals `expected`, in mailbox order.
///
/// `messages` pairs a sequence number with the decoded subject (if any).
pub(crate) fn matching_sequences(messages: &[(u32, Option<String>)], expected: &str) -> Vec<u32> {
    let mut matches: Vec<u32> = messages
        .iter()
        .filter(|(_, subject)| subject.as_deref() == Some(expected))
        .map(|(seq, _)| *seq)
        .collect();
    matches.sort_unstable();
    matches
}
