use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use payout_activation::application::activation::{ActivationGate, BulkActivator};
use payout_activation::application::admin::{AdminService, OrganizerSummary};
use payout_activation::application::onboarding::{BankSubmission, OnboardingService};
use payout_activation::application::reconciliation::ReconciliationService;
use payout_activation::config::Settings;
use payout_activation::domain::ports::{
    BankDirectoryRef, NotifierRef, OrganizerStoreRef, OutboxStoreRef, ProvisioningAutomationRef,
    SubaccountProviderRef,
};
use payout_activation::infrastructure::automation::WebhookAutomation;
use payout_activation::infrastructure::in_memory::{InMemoryOrganizerStore, InMemoryOutboxStore};
use payout_activation::infrastructure::notifier::{LogNotifier, ResendNotifier};
use payout_activation::infrastructure::paystack::PaystackClient;
#[cfg(feature = "storage-rocksdb")]
use payout_activation::infrastructure::rocksdb::RocksDBStore;
use payout_activation::infrastructure::unconfigured::Unconfigured;
use payout_activation::interfaces::backup::{read_backup, write_backup};
use payout_activation::interfaces::csv::organizer_writer::OrganizerWriter;
use payout_activation::interfaces::csv::user_id_reader::UserIdReader;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List banks known to the bank directory
    Banks,
    /// Resolve the holder name of a bank account
    VerifyAccount {
        account_number: String,
        bank_code: String,
    },
    /// Verify and save an organizer's bank details, then request a subaccount
    Submit {
        user_id: String,
        #[arg(long)]
        bank_name: String,
        #[arg(long)]
        bank_code: String,
        #[arg(long)]
        account_number: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Record a subaccount id produced out of band
    AttachSubaccount {
        user_id: String,
        subaccount_id: String,
    },
    /// Send a failed provisioning request again
    RetryProvisioning {
        user_id: String,
        /// Also re-send a request the automation accepted without an id
        #[arg(long)]
        force: bool,
    },
    /// Print an organizer record and its provisioning history
    Show { user_id: String },
    /// Diagnose an organizer's payout setup without changing it
    Status { user_id: String },
    /// Confirm an organizer's subaccount with the provider
    Reconcile { user_id: String },
    /// Look up any subaccount id at the provider
    LookupSubaccount { subaccount_id: String },
    /// Activate an organizer's payout account
    Activate {
        user_id: String,
        /// Skip provider confirmation
        #[arg(long)]
        force: bool,
    },
    /// Activate several organizers without provider confirmation
    BulkActivate {
        user_ids: Vec<String>,
        /// CSV file with a `user_id` column
        #[arg(long)]
        from_csv: Option<PathBuf>,
    },
    /// List organizers waiting for activation (CSV)
    Pending,
    /// List every organizer (CSV)
    Organizers,
    /// Write every organizer record to a JSON backup
    Export { output: PathBuf },
    /// Load organizer records from a JSON backup
    Restore { input: PathBuf },
}

struct Services {
    onboarding: OnboardingService,
    reconciler: Arc<ReconciliationService>,
    gate: Arc<ActivationGate>,
    bulk: BulkActivator,
    admin: AdminService,
}

fn init_tracing() {
    let log_format = std::env::var("PAYOUT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output only
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .init();
    }
}

fn open_stores(db_path: Option<&Path>) -> Result<(OrganizerStoreRef, OutboxStoreRef)> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = Arc::new(RocksDBStore::open(path).into_diagnostic()?);
            info!("Using persistent storage at {}", path.display());
            let organizers: OrganizerStoreRef = store.clone();
            let outbox: OutboxStoreRef = store;
            Ok((organizers, outbox))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

fn in_memory_stores() -> (OrganizerStoreRef, OutboxStoreRef) {
    let organizers: OrganizerStoreRef = Arc::new(InMemoryOrganizerStore::new());
    let outbox: OutboxStoreRef = Arc::new(InMemoryOutboxStore::new());
    (organizers, outbox)
}

fn configured(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn build_services(
    settings: &Settings,
    store: OrganizerStoreRef,
    outbox: OutboxStoreRef,
) -> Result<Services> {
    let timeout = settings.http_timeout();

    let (directory, provider): (BankDirectoryRef, SubaccountProviderRef) =
        match configured(&settings.paystack.paystack_secret_key) {
            Some(key) => {
                let client = Arc::new(
                    PaystackClient::new(&settings.paystack.paystack_base_url, key, timeout)
                        .into_diagnostic()?,
                );
                (client.clone() as BankDirectoryRef, client as SubaccountProviderRef)
            }
            None => {
                let missing = Arc::new(Unconfigured::new("PAYSTACK", "PAYSTACK_SECRET_KEY"));
                (missing.clone() as BankDirectoryRef, missing as SubaccountProviderRef)
            }
        };

    let automation: ProvisioningAutomationRef =
        match configured(&settings.automation.onboarding_webhook_url) {
            Some(url) => Arc::new(WebhookAutomation::new(url, timeout).into_diagnostic()?),
            None => Arc::new(Unconfigured::new("AUTOMATION", "ONBOARDING_WEBHOOK_URL")),
        };

    let notifier: NotifierRef = match configured(&settings.notifier.resend_api_key) {
        Some(key) => Arc::new(
            ResendNotifier::new(
                &settings.notifier.resend_base_url,
                key,
                &settings.notifier.notify_from,
                timeout,
            )
            .into_diagnostic()?,
        ),
        None => Arc::new(LogNotifier),
    };

    let reconciler = Arc::new(ReconciliationService::new(
        store.clone(),
        provider.clone(),
        notifier.clone(),
    ));
    let gate = Arc::new(ActivationGate::new(
        store.clone(),
        reconciler.clone(),
        notifier,
    ));

    Ok(Services {
        onboarding: OnboardingService::new(store.clone(), outbox, directory, automation),
        reconciler,
        bulk: BulkActivator::new(gate.clone()),
        gate,
        admin: AdminService::new(store, provider),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

fn write_csv(organizers: &[OrganizerSummary]) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = OrganizerWriter::new(stdout.lock());
    writer.write_organizers(organizers).into_diagnostic()
}

fn collect_user_ids(mut user_ids: Vec<String>, from_csv: Option<PathBuf>) -> Result<Vec<String>> {
    if let Some(path) = from_csv {
        let file = File::open(path).into_diagnostic()?;
        for user_id in UserIdReader::new(file).user_ids() {
            user_ids.push(user_id.into_diagnostic()?);
        }
    }
    Ok(user_ids)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let (store, outbox) = open_stores(cli.settings.db_path.as_deref())?;
    let services = build_services(&cli.settings, store, outbox)?;

    if let Some(seed) = &cli.settings.seed {
        let backup = read_backup(seed).into_diagnostic()?;
        let report = services.admin.restore_backup(backup).await.into_diagnostic()?;
        for reason in &report.skipped {
            warn!("Seed record skipped: {}", reason);
        }
    }

    match cli.command {
        Command::Banks => {
            let banks = services.onboarding.list_banks().await.into_diagnostic()?;
            print_json(&banks)?;
        }
        Command::VerifyAccount {
            account_number,
            bank_code,
        } => {
            let verified = services
                .onboarding
                .verify_account(&account_number, &bank_code)
                .await
                .into_diagnostic()?;
            print_json(&verified)?;
        }
        Command::Submit {
            user_id,
            bank_name,
            bank_code,
            account_number,
            email,
            name,
        } => {
            let receipt = services
                .onboarding
                .submit_bank_details(BankSubmission {
                    user_id,
                    email,
                    name,
                    bank_name,
                    bank_code,
                    account_number,
                })
                .await
                .into_diagnostic()?;
            print_json(&receipt)?;
        }
        Command::AttachSubaccount {
            user_id,
            subaccount_id,
        } => {
            let record = services
                .onboarding
                .attach_subaccount(&user_id, &subaccount_id)
                .await
                .into_diagnostic()?;
            print_json(&record)?;
        }
        Command::RetryProvisioning { user_id, force } => {
            let receipt = services
                .onboarding
                .retry_provisioning(&user_id, force)
                .await
                .into_diagnostic()?;
            print_json(&receipt)?;
        }
        Command::Show { user_id } => {
            let record = services.admin.organizer(&user_id).await.into_diagnostic()?;
            let history = services
                .onboarding
                .provisioning_history(&user_id)
                .await
                .into_diagnostic()?;
            print_json(&serde_json::json!({
                "record": record,
                "state": record.state(),
                "provisioning": history,
            }))?;
        }
        Command::Status { user_id } => {
            let report = services.admin.status(&user_id).await.into_diagnostic()?;
            print_json(&report)?;
        }
        Command::Reconcile { user_id } => {
            let reconciliation = services
                .reconciler
                .reconcile(&user_id)
                .await
                .into_diagnostic()?;
            print_json(&reconciliation)?;
        }
        Command::LookupSubaccount { subaccount_id } => {
            let subaccount = services
                .reconciler
                .lookup_subaccount(&subaccount_id)
                .await
                .into_diagnostic()?;
            print_json(&subaccount)?;
        }
        Command::Activate { user_id, force } => {
            let activated = if force {
                services.gate.force_activate(&user_id).await
            } else {
                services.gate.activate_verified(&user_id).await
            };
            print_json(&activated.into_diagnostic()?)?;
        }
        Command::BulkActivate { user_ids, from_csv } => {
            let user_ids = collect_user_ids(user_ids, from_csv)?;
            let report = services
                .bulk
                .activate_all(&user_ids)
                .await
                .into_diagnostic()?;
            print_json(&report)?;
        }
        Command::Pending => {
            let pending: Vec<OrganizerSummary> = services
                .admin
                .pending_queue()
                .await
                .into_diagnostic()?
                .iter()
                .map(OrganizerSummary::from)
                .collect();
            write_csv(&pending)?;
        }
        Command::Organizers => {
            let organizers = services.admin.list_organizers().await.into_diagnostic()?;
            write_csv(&organizers)?;
        }
        Command::Export { output } => {
            let backup = services.admin.export_backup().await.into_diagnostic()?;
            write_backup(&output, &backup).into_diagnostic()?;
            info!(
                "Exported {} organizers to {}",
                backup.organizers.len(),
                output.display()
            );
        }
        Command::Restore { input } => {
            let backup = read_backup(&input).into_diagnostic()?;
            let report = services
                .admin
                .restore_backup(backup)
                .await
                .into_diagnostic()?;
            print_json(&report)?;
        }
    }

    Ok(())
}
