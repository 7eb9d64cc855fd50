use clap::{Args, Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;
use velric::registration::{AgentType, Industry};

#[derive(Parser, Debug)]
#[command(name = "velric")]
#[command(about = "Velric organization registration client", long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit an organization registration to the webhook
    Register(RegisterArgs),
    /// Print the webhook target a submission would use
    Resolve,
}

#[derive(Args, Default)]
pub struct RegisterArgs {
    /// TOML draft with the form fields; flags given below take precedence
    #[arg(long = "input", value_name = "DRAFT")]
    pub draft: Option<PathBuf>,

    #[arg(long)]
    pub organization_name: Option<String>,

    #[arg(long, value_enum)]
    pub industry: Option<Industry>,

    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone number
    #[arg(long)]
    pub contact: Option<String>,

    #[arg(long, env = "VELRIC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, env = "VELRIC_CONFIRM_PASSWORD", hide_env_values = true)]
    pub confirm_password: Option<String>,

    /// Knowledge base URL, repeatable
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Knowledge base document (PDF, DOC, DOCX, TXT), repeatable
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    #[arg(long, value_enum)]
    pub agent_type: Option<AgentType>,

    /// Accept the terms of service
    #[arg(long)]
    pub agree: bool,

    /// Print the resolved target and payload summary instead of sending
    #[arg(long)]
    pub dry_run: bool,
}

impl fmt::Debug for RegisterArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");

        f.debug_struct("RegisterArgs")
            .field("draft", &self.draft)
            .field("organization_name", &self.organization_name)
            .field("industry", &self.industry)
            .field("email", &self.email)
            .field("contact", &self.contact)
            .field("password", &redacted(&self.password))
            .field("confirm_password", &redacted(&self.confirm_password))
            .field("urls", &self.urls)
            .field("files", &self.files)
            .field("agent_type", &self.agent_type)
            .field("agree", &self.agree)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
