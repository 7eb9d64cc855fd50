mod cli;

use clap::Parser;
use cli::{Cli, Commands, RegisterArgs};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use velric::config::{Config, WebhookConfig};
use velric::observability::init_tracing;
use velric::registration::{Attachment, RegistrationDraft, RegistrationInput};
use velric::submission::{HttpTransport, RegistrationSession, SubmitAttempt};
use velric::webhook::WebhookResolver;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

const PENDING_POLL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<ExitCode, AnyError> {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    let config = Config::load()?;

    match cli.command {
        Commands::Register(args) => register(config, args).await,
        Commands::Resolve => resolve(&config.webhook),
    }
}

async fn register(config: Config, args: RegisterArgs) -> Result<ExitCode, AnyError> {
    let dry_run = args.dry_run;
    let input = collect_input(args).await?;

    for attachment in input.attachments.iter().filter(|a| !a.is_supported_format()) {
        warn!(file = %attachment.name, "Attachment is not PDF, DOC, DOCX or TXT; sending as-is");
    }

    let transport = Arc::new(HttpTransport::new(&config.http)?);
    let session = RegistrationSession::new(config.webhook, transport).with_input(input);

    if dry_run {
        return match session.preview() {
            Ok(preview) => {
                println!("{}", serde_json::to_string_pretty(&preview)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("{}", err);
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let submit = session.submit();
    tokio::pin!(submit);

    let mut ticker = tokio::time::interval(PENDING_POLL);
    let mut announced = false;

    let attempt = loop {
        tokio::select! {
            biased;
            attempt = &mut submit => break attempt,
            _ = ticker.tick() => {
                if !announced && session.state().is_pending() {
                    eprintln!("Sending...");
                    announced = true;
                }
            }
        }
    };

    debug!(metrics = ?session.metrics().snapshot(), "Submission finished");

    match attempt {
        SubmitAttempt::Finished(outcome) if outcome.is_success() => {
            println!("{}", outcome.message());
            Ok(ExitCode::SUCCESS)
        }
        SubmitAttempt::Finished(outcome) => {
            eprintln!("{}", outcome.message());
            Ok(ExitCode::FAILURE)
        }
        SubmitAttempt::Ignored => {
            eprintln!("A submission is already in progress");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Draft file first, then any flags on top
async fn collect_input(args: RegisterArgs) -> Result<RegistrationInput, AnyError> {
    let draft = match &args.draft {
        Some(path) => RegistrationDraft::from_path(path)?,
        None => RegistrationDraft::default(),
    };
    let mut input = draft.into_input().await?;

    if let Some(name) = args.organization_name {
        input.organization_name = name;
    }
    if let Some(industry) = args.industry {
        input.industry = Some(industry);
    }
    if let Some(email) = args.email {
        input.email = email;
    }
    if let Some(contact) = args.contact {
        input.contact = contact;
    }
    if let Some(password) = args.password {
        input.password = password;
    }
    if let Some(confirm) = args.confirm_password {
        input.confirm_password = confirm;
    }
    if !args.urls.is_empty() {
        input.urls = args.urls.join("\n");
    }
    if !args.files.is_empty() {
        let mut attachments = Vec::with_capacity(args.files.len());
        for path in &args.files {
            attachments.push(Attachment::read(path).await?);
        }
        input.attachments = attachments;
    }
    if let Some(agent_type) = args.agent_type {
        input.agent_type = agent_type;
    }
    if args.agree {
        input.agreed = true;
    }

    debug!(input = ?input, "Collected registration input");

    Ok(input)
}

fn resolve(webhook: &WebhookConfig) -> Result<ExitCode, AnyError> {
    match WebhookResolver::new(webhook).resolve() {
        Ok(target) => {
            println!("{}", serde_json::to_string_pretty(&target)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}
