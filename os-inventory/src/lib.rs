pub mod attribution;
pub mod catalog;
pub mod collector_core;
pub mod collectors;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod mock;
pub mod openstack;
pub mod out;
pub mod report;
pub mod secrets;
pub mod utils;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use attribution::{attribute, AttributionReport};
use collector_core::ResourceKind;
use config::Config;
use identity::IdentityIndex;
use openstack::Session;
use out::log_file::{LineFormat, ReportLog};
use out::mail::{Notifier, NotifySummary, SmtpChannelFactory, StdoutChannelFactory};
use out::OutMode;
use report::ReportFormatter;
use secrets::SecretStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub mock: bool,
    pub out: OutMode,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub resources: usize,
    pub users: usize,
    pub attribution: AttributionReport,
    pub notify: NotifySummary,
}

pub async fn run(config: Config, opts: RunOptions, store: &SecretStore) -> Result<RunSummary> {
    // resolve mail credentials up front so nothing is fetched for a run
    // that cannot deliver
    let mail_password = match opts.out {
        OutMode::Smtp => Some(store.resolve(
            secrets::EMAIL_SERVICE,
            config.email.password.as_deref(),
            secrets::EMAIL_PASSWORD_ENV,
        )?),
        OutMode::Stdout => None,
    };

    let mut log = ReportLog::create(
        Path::new(&config.logger.filename),
        LineFormat::new(config.logger.formatter.clone()),
    )?;

    let cloud = &config.clouds.openstack;
    let session = if opts.mock {
        info!("mock mode, using fixture resources");
        None
    } else {
        let password = store.resolve(
            secrets::OPENSTACK_SERVICE,
            cloud.auth.password.as_deref(),
            secrets::OPENSTACK_PASSWORD_ENV,
        )?;
        Some(Session::authenticate(cloud, &password).await?)
    };

    let catalog = collectors::fetch_catalog(session.as_ref()).await?;
    drop(session);

    let formatter = ReportFormatter::new(&config.output_filter);
    log.write_lines(&formatter.catalog_lines(&catalog))?;

    let index = IdentityIndex::build(catalog.get(ResourceKind::User));
    let attribution = attribute(&catalog, &index);
    log.write_lines(&formatter.user_tree_lines(&attribution.tree))?;
    info!(
        attributed = attribution.report.attributed,
        unattributed = attribution.report.unattributed,
        ambiguous = attribution.report.ambiguous.len(),
        skipped = attribution.report.unknown_owners.len(),
        log = %log.path().display(),
        "attribution done"
    );

    let resources = catalog.len();
    let users = index.len();
    let tree = attribution.tree;
    let email = config.email;
    let filter = config.output_filter;

    // SMTP is blocking I/O
    let notify = tokio::task::spawn_blocking(move || match mail_password {
        Some(password) => {
            let factory = SmtpChannelFactory::new(&email, password);
            Notifier::new(factory, email, filter).notify(&tree, &index)
        }
        None => Notifier::new(StdoutChannelFactory, email, filter).notify(&tree, &index),
    })
    .await
    .context("mail task panicked")??;

    Ok(RunSummary {
        resources,
        users,
        attribution: attribution.report,
        notify,
    })
}
