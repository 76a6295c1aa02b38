use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::Message;
use tracing::{debug, info, warn};

use crate::attribution::{OwnedResources, UserResources};
use crate::config::EmailConfig;
use crate::error::DeliveryError;
use crate::identity::IdentityIndex;
use crate::report::{OutputFilter, ReportFormatter};
use crate::utils::chunked;

const SMTPS_PORT: u16 = 465;
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait MailChannel {
    fn send(&mut self, mail: &OutgoingMail) -> Result<(), DeliveryError>;
    fn close(self: Box<Self>) -> Result<(), DeliveryError>;
}

pub trait ChannelFactory {
    fn open(&self) -> Result<Box<dyn MailChannel>, DeliveryError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifySummary {
    pub sent: usize,
    pub skipped: usize,
    pub connections: usize,
}

pub struct Notifier<F> {
    factory: F,
    email: EmailConfig,
    filter: OutputFilter,
}

impl<F: ChannelFactory> Notifier<F> {
    pub fn new(factory: F, email: EmailConfig, filter: OutputFilter) -> Self {
        Self {
            factory,
            email,
            filter,
        }
    }

    pub fn compose_body(&self, name: &str, owned: &OwnedResources) -> String {
        let heading = format!("{name}{}", self.email.msg_infix);
        let lines = ReportFormatter::new(&self.filter).user_lines(&heading, owned);
        let mut body = self.email.msg_prefix.clone();
        for line in lines {
            body.push_str(&line);
            body.push('\n');
        }
        body.push_str(&self.email.msg_postfix);
        body
    }

    /// One message per user with a resolvable address: the `To` override
    /// first, then the user's own email. A channel carries at most
    /// `max_msg_per_connection` messages before it is closed and reopened.
    pub fn notify(
        &self,
        tree: &UserResources,
        index: &IdentityIndex,
    ) -> Result<NotifySummary, DeliveryError> {
        let mut summary = NotifySummary::default();
        let mut outgoing = Vec::new();

        // sender and override apply to every message, so a bad one stops
        // the run before anything is sent
        mailbox(&self.email.from)?;
        if let Some(to) = &self.email.to {
            mailbox(to)?;
        }

        for (name, owned) in tree.iter() {
            let to = self.email.to.as_deref().or_else(|| index.email_for_name(name));
            let Some(to) = to else {
                debug!(user = name, "no mail address, report not sent");
                summary.skipped += 1;
                continue;
            };
            if let Err(e) = mailbox(to) {
                warn!(user = name, "report not sent: {e}");
                summary.skipped += 1;
                continue;
            }
            let body = self.compose_body(name, owned);
            debug!(user = name, "{body}");
            outgoing.push(OutgoingMail {
                from: self.email.from.clone(),
                to: to.to_string(),
                subject: self.email.subject.clone(),
                body,
            });
        }

        let batches = chunked(&outgoing, self.email.max_msg_per_connection());
        if batches.is_empty() {
            // still log in once so bad credentials surface
            let channel = self.factory.open()?;
            summary.connections += 1;
            channel.close()?;
        }

        for batch in batches {
            let mut channel = self.factory.open()?;
            summary.connections += 1;
            for mail in &batch {
                if let Err(e) = channel.send(mail) {
                    if let Err(close_err) = channel.close() {
                        warn!("closing mail channel after failure: {close_err}");
                    }
                    return Err(e);
                }
                summary.sent += 1;
            }
            channel.close()?;
        }

        info!(
            sent = summary.sent,
            skipped = summary.skipped,
            connections = summary.connections,
            "mail reports delivered"
        );
        Ok(summary)
    }
}

pub fn split_host(host: &str) -> (String, u16) {
    match host.rsplit_once(':') {
        Some((h, p)) => match p.parse() {
            Ok(port) => (h.to_string(), port),
            Err(_) => (host.to_string(), SMTPS_PORT),
        },
        None => (host.to_string(), SMTPS_PORT),
    }
}

pub struct SmtpChannelFactory {
    host: String,
    port: u16,
    user: String,
    password: String,
}

impl SmtpChannelFactory {
    pub fn new(email: &EmailConfig, password: String) -> Self {
        let (host, port) = split_host(&email.host);
        Self {
            host,
            port,
            user: email.from.clone(),
            password,
        }
    }
}

impl ChannelFactory for SmtpChannelFactory {
    fn open(&self) -> Result<Box<dyn MailChannel>, DeliveryError> {
        let connect_err = |reason: String| DeliveryError::Connect {
            host: format!("{}:{}", self.host, self.port),
            reason,
        };
        let tls = TlsParameters::new(self.host.clone()).map_err(|e| connect_err(e.to_string()))?;
        let mut conn = SmtpConnection::connect(
            (self.host.as_str(), self.port),
            Some(SMTP_TIMEOUT),
            &ClientId::Domain("localhost".into()),
            Some(&tls),
            None,
        )
        .map_err(|e| connect_err(e.to_string()))?;

        let credentials = Credentials::new(self.user.clone(), self.password.clone());
        if let Err(e) = conn.auth(&[Mechanism::Plain, Mechanism::Login], &credentials) {
            if let Err(quit_err) = conn.quit() {
                warn!("closing smtp connection after failed login: {quit_err}");
            }
            return Err(DeliveryError::Auth {
                user: self.user.clone(),
                reason: e.to_string(),
            });
        }
        debug!(host = %self.host, port = self.port, "smtp connection opened");
        Ok(Box::new(SmtpChannel { conn }))
    }
}

struct SmtpChannel {
    conn: SmtpConnection,
}

fn mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address.parse().map_err(|e: lettre::address::AddressError| DeliveryError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

impl MailChannel for SmtpChannel {
    fn send(&mut self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let message = Message::builder()
            .from(mailbox(&mail.from)?)
            .to(mailbox(&mail.to)?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| DeliveryError::Build {
                recipient: mail.to.clone(),
                reason: e.to_string(),
            })?;

        self.conn
            .send(message.envelope(), &message.formatted())
            .map_err(|e| DeliveryError::Send {
                recipient: mail.to.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<(), DeliveryError> {
        self.conn
            .quit()
            .map(|_| ())
            .map_err(|e| DeliveryError::Close(e.to_string()))
    }
}

pub struct StdoutChannelFactory;

struct StdoutChannel;

impl ChannelFactory for StdoutChannelFactory {
    fn open(&self) -> Result<Box<dyn MailChannel>, DeliveryError> {
        Ok(Box::new(StdoutChannel))
    }
}

impl MailChannel for StdoutChannel {
    fn send(&mut self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        println!("From: {}", mail.from);
        println!("To: {}", mail.to);
        println!("Subject: {}", mail.subject);
        println!();
        println!("{}", mail.body);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), DeliveryError> {
        Ok(())
    }
}
