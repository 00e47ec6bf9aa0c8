//! IMAP mailbox client (Gmail by default).

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use mailparse::MailHeaderMap;

use super::{matching_sequences, MailClient};
use crate::config::ImapConfig;
use crate::credentials::MailCredentials;
use crate::error::{AuthError, Result};

fn mail_err(err: impl std::fmt::Display) -> AuthError {
    AuthError::Mail(err.to_string())
}

/// Fetches verification emails over IMAP with implicit TLS.
#[derive(Debug, Clone)]
pub struct ImapMailClient {
    config: ImapConfig,
}

impl ImapMailClient {
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailClient for ImapMailClient {
    async fn take_unseen_by_subject(
        &self,
        credentials: &MailCredentials,
        subject: &str,
    ) -> Result<Option<String>> {
        tracing::info!(host = %self.config.host, "Retrieving mails to get the verification code");

        let config = self.config.clone();
        let credentials = credentials.clone();
        let subject = subject.to_string();

        // The imap crate is blocking
        tokio::task::spawn_blocking(move || fetch_by_subject(&config, &credentials, &subject))
            .await
            .map_err(|e| AuthError::Mail(format!("Mail task failed: {e}")))?
    }
}

fn fetch_by_subject(
    config: &ImapConfig,
    credentials: &MailCredentials,
    expected: &str,
) -> Result<Option<String>> {
    let tls = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(mail_err)?;

    let tcp = open_socket(&config.host, config.port, config.timeout).map_err(mail_err)?;
    let stream = tls.connect(&config.host, tcp).map_err(mail_err)?;
    let mut client = imap::Client::new(stream);
    client.read_greeting().map_err(mail_err)?;

    let mut session = client
        .login(&credentials.username, credentials.password())
        .map_err(|(e, _)| mail_err(e))?;

    let result = search_inbox(&mut session, expected);

    // Logout failures don't change what we found
    if let Err(e) = session.logout() {
        tracing::warn!(error = %e, "IMAP logout failed");
    }

    result
}

/// Connect with `timeout` bounding the connect and every later read or write.
fn open_socket(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("{host} did not resolve"))
    }))
}

fn search_inbox<T: std::io::Read + std::io::Write>(
    session: &mut imap::Session<T>,
    expected: &str,
) -> Result<Option<String>> {
    session.select("INBOX").map_err(mail_err)?;

    let unseen = session.search("UNSEEN").map_err(mail_err)?;
    if unseen.is_empty() {
        tracing::debug!("No unseen messages");
        return Ok(None);
    }

    let mut seqs: Vec<u32> = unseen.into_iter().collect();
    seqs.sort_unstable();

    // PEEK leaves messages with other subjects unread
    let headers = session
        .fetch(sequence_set(&seqs), "BODY.PEEK[HEADER]")
        .map_err(mail_err)?;
    let subjects: Vec<(u32, Option<String>)> = headers
        .iter()
        .map(|fetch| {
            let subject = fetch
                .header()
                .and_then(|raw| mailparse::parse_headers(raw).ok())
                .and_then(|(parsed, _)| parsed.get_first_value("Subject"));
            (fetch.message, subject)
        })
        .collect();

    let matches = matching_sequences(&subjects, expected);
    let Some(first) = matches.first() else {
        tracing::debug!(unseen = subjects.len(), "No unseen message with the expected subject");
        return Ok(None);
    };

    let bodies = session
        .fetch(first.to_string(), "BODY.PEEK[TEXT]")
        .map_err(mail_err)?;
    let body = bodies
        .iter()
        .find_map(|fetch| fetch.text())
        .map(|raw| String::from_utf8_lossy(raw).into_owned());

    session
        .store(sequence_set(&matches), "+FLAGS (\\Seen)")
        .map_err(mail_err)?;

    tracing::info!(matches = matches.len(), "Found verification email");
    Ok(body)
}

fn sequence_set(seqs: &[u32]) -> String {
    seqs.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
