//! IMAP implementation of the mailbox capability.
//!
//! Built on `async-imap` over `tokio-rustls`, with the Mozilla root
//! certificates from `webpki-roots`.

use std::fmt::Write as _;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use async_imap::extensions::idle::IdleResponse;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use imap_proto::types::{MailboxDatum, Response};
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use super::mailbox::{
    Connector, FetchEvent, IdleEvent, MailboxConnection, MailboxError, SearchCriteria,
};
use crate::account::{AccountConfig, Security};
use crate::record::Uid;

type ImapSession = async_imap::Session<TlsStream<TcpStream>>;

/// TCP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch attributes: the UID and the full message without touching `\Seen`.
const FETCH_QUERY: &str = "(UID BODY.PEEK[])";

impl From<async_imap::error::Error> for MailboxError {
    fn from(err: async_imap::error::Error) -> Self {
        use async_imap::error::Error as ImapError;

        match err {
            ImapError::Io(e) => Self::Io(e),
            ImapError::ConnectionLost => Self::Closed,
            ImapError::No(msg) | ImapError::Bad(msg) => Self::Command(msg),
            other => Self::Protocol(other.to_string()),
        }
    }
}

/// Creates a TLS connector trusting the webpki root set.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Opens [`ImapConnection`]s.
#[derive(Clone)]
pub struct ImapConnector {
    tls: TlsConnector,
}

impl Default for ImapConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ImapConnector {
    /// Creates a connector with the default TLS configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tls: create_tls_connector(),
        }
    }

    async fn open_tls(
        &self,
        account: &AccountConfig,
    ) -> Result<async_imap::Client<TlsStream<TcpStream>>, MailboxError> {
        let addr = (account.host.as_str(), account.port);
        let tcp = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out")
            })??;
        let server_name = ServerName::try_from(account.host.clone())
            .map_err(|_| MailboxError::InvalidDnsName(account.host.clone()))?;

        match account.security {
            Security::Tls => {
                let tls = self.tls.connect(server_name, tcp).await?;
                let mut client = async_imap::Client::new(tls);
                client
                    .read_response()
                    .await
                    .ok_or(MailboxError::MissingGreeting)??;
                Ok(client)
            }
            Security::StartTls => {
                let mut client = async_imap::Client::new(tcp);
                client
                    .read_response()
                    .await
                    .ok_or(MailboxError::MissingGreeting)??;
                client.run_command_and_check_ok("STARTTLS", None).await?;
                let tls = self.tls.connect(server_name, client.into_inner()).await?;
                Ok(async_imap::Client::new(tls))
            }
            Security::None => Err(MailboxError::UnsupportedSecurity(
                Security::None.display_name(),
            )),
        }
    }
}

#[async_trait]
impl Connector for ImapConnector {
    async fn connect(
        &self,
        account: &AccountConfig,
    ) -> Result<Box<dyn MailboxConnection>, MailboxError> {
        let client = self.open_tls(account).await?;
        let mut session = client
            .login(&account.username, account.password())
            .await
            .map_err(|(err, _client)| MailboxError::Auth(err.to_string()))?;

        let capabilities = session.capabilities().await?;
        let idle = capabilities.has_str("IDLE");
        debug!(account = %account.id, idle, "Logged in");

        Ok(Box::new(ImapConnection {
            session: Some(session),
            idle,
        }))
    }
}

/// An authenticated IMAP session.
///
/// The session is taken out while IDLE runs; if IDLE fails midway the
/// connection stays empty and every later call reports
/// [`MailboxError::Closed`].
pub struct ImapConnection {
    session: Option<ImapSession>,
    idle: bool,
}

impl ImapConnection {
    fn session(&mut self) -> Result<&mut ImapSession, MailboxError> {
        self.session.as_mut().ok_or(MailboxError::Closed)
    }
}

/// Formats identifiers as an IMAP sequence set.
fn uid_set(uids: &[Uid]) -> String {
    let mut set = String::new();
    for (i, uid) in uids.iter().enumerate() {
        if i > 0 {
            set.push(',');
        }
        let _ = write!(set, "{uid}");
    }
    set
}

#[async_trait]
impl MailboxConnection for ImapConnection {
    async fn open_mailbox(&mut self, mailbox: &str) -> Result<(), MailboxError> {
        let selected = self.session()?.select(mailbox).await?;
        debug!(mailbox, exists = selected.exists, "Mailbox selected");
        Ok(())
    }

    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>, MailboxError> {
        let found = self.session()?.uid_search(criteria.to_imap()).await?;
        let mut uids: Vec<Uid> = found.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    fn fetch<'a>(
        &'a mut self,
        uids: &'a [Uid],
    ) -> BoxStream<'a, Result<FetchEvent, MailboxError>> {
        Box::pin(async_stream::try_stream! {
            let session = self.session.as_mut().ok_or(MailboxError::Closed)?;
            let responses = session
                .uid_fetch(uid_set(uids), FETCH_QUERY)
                .await
                .map_err(MailboxError::from)?;
            let mut responses = pin!(responses);

            while let Some(fetch) = responses.next().await {
                let fetch = fetch.map_err(MailboxError::from)?;
                let seq = fetch.message;
                if let Some(uid) = fetch.uid {
                    yield FetchEvent::Attributes { seq, uid };
                }
                yield FetchEvent::Body {
                    seq,
                    raw: fetch.body().map(<[u8]>::to_vec),
                };
            }
        })
    }

    async fn mark_seen(&mut self, uid: Uid) -> Result<(), MailboxError> {
        self.session()?
            .uid_store(uid.to_string(), "+FLAGS (\\Seen)")
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        Ok(())
    }

    fn supports_idle(&self) -> bool {
        self.idle
    }

    async fn idle(&mut self, timeout: Duration) -> Result<IdleEvent, MailboxError> {
        let session = self.session.take().ok_or(MailboxError::Closed)?;
        let mut handle = session.idle();
        handle.init().await?;
        let (wait, _stop) = handle.wait_with_timeout(timeout);
        let response = wait.await?;
        self.session = Some(handle.done().await?);

        Ok(match response {
            IdleResponse::NewData(data) => match data.parsed() {
                Response::MailboxData(MailboxDatum::Exists(count)) => IdleEvent::NewMail(*count),
                _ => IdleEvent::Timeout,
            },
            IdleResponse::Timeout | IdleResponse::ManualInterrupt => IdleEvent::Timeout,
        })
    }

    async fn logout(&mut self) -> Result<(), MailboxError> {
        if let Some(mut session) = self.session.take() {
            session.logout().await?;
        }
        Ok(())
    }
}
