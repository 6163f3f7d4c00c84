use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::activity::ActivityLog;
use crate::config::{self, InstanceOverrides};
use crate::digraph;
use crate::interrupt::Interrupt;
use crate::prompt::{AssumeYes, Confirm, TerminalConfirm};
use crate::readers::{self, RowReader};
use crate::sheet::Sheet;
use crate::sync::fields::parse_override;
use crate::sync::{SyncEngine, SyncOptions, SyncReport};
use crate::tracker::jira::JiraClient;

#[derive(Parser, Debug)]
#[command(
    name = "csv-to-jira",
    version,
    about = "Create and link Jira issues from a spreadsheet"
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Which `[instances.<name>]` entry of the config to use.
    #[arg(long, global = true, default_value = "default")]
    pub instance_name: String,

    #[arg(long, global = true)]
    pub instance_url: Option<String>,

    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Password or API token.
    #[arg(long, global = true, env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, global = true)]
    pub disable_certificate_verification: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or update one issue per row, then link dependencies.
    CreateIssues(CreateIssuesArgs),
    /// Write a Graphviz digraph of the rows and their dependencies.
    Digraph(DigraphArgs),
    /// List the available row readers.
    Readers,
    /// Show recent tracker changes made by this tool.
    Activity {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
pub struct CreateIssuesArgs {
    pub path: PathBuf,

    /// Jira project within which to create new issues.
    pub project: String,

    #[arg(long, default_value = "default", value_parser = reader_name)]
    pub reader: String,

    #[arg(long, default_value = "Story")]
    pub issuetype: String,

    #[arg(long, default_value = "Blocks")]
    pub relationship: String,

    /// Extra field to set on every issue, as `name=value`; wins over
    /// everything else. Repeatable.
    #[arg(long = "field", value_parser = field_override)]
    pub fields: Vec<(String, String)>,

    /// Label added to every issue. Repeatable.
    #[arg(long = "label")]
    pub labels: Vec<String>,

    /// Don't create or update issues; only link the ones already known.
    #[arg(long)]
    pub no_create: bool,

    /// Answer yes to every prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct DigraphArgs {
    pub path: PathBuf,

    pub out_path: PathBuf,

    #[arg(long, default_value = "default", value_parser = reader_name)]
    pub reader: String,
}

fn reader_name(name: &str) -> Result<String, String> {
    if readers::reader_by_name(name).is_some() {
        Ok(name.to_string())
    } else {
        Err(format!(
            "unknown reader `{name}` (available: {})",
            readers::reader_names().join(", ")
        ))
    }
}

fn field_override(arg: &str) -> Result<(String, String), String> {
    parse_override(arg).ok_or_else(|| format!("expected name=value, got `{arg}`"))
}

fn build_reader(name: &str) -> Result<Box<dyn RowReader>> {
    readers::reader_by_name(name).ok_or_else(|| anyhow!("Unknown reader `{name}`"))
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::CreateIssues(args) => handle_create_issues(&cli.connection, args).await,
        Command::Digraph(args) => handle_digraph(&args),
        Command::Readers => {
            for name in readers::reader_names() {
                println!("{name}");
            }
            Ok(())
        }
        Command::Activity { limit } => {
            let log = ActivityLog::default_location();
            let events = log.read_events(Some(limit));
            if events.is_empty() {
                println!("No activity recorded in {}", log.path().display());
            }
            for event in events {
                let row = event.row_id.as_deref().unwrap_or("-");
                let message = event.message.as_deref().unwrap_or("");
                println!("{}  {:<8} {:<12} row {row}  {message}", event.timestamp, event.event, event.key);
            }
            Ok(())
        }
    }
}

async fn handle_create_issues(connection: &ConnectionArgs, args: CreateIssuesArgs) -> Result<()> {
    let config = config::load_config(connection.config.as_deref())?;
    let overrides = InstanceOverrides {
        url: connection.instance_url.clone(),
        username: connection.username.clone(),
        password: connection.password.clone(),
        disable_certificate_verification: connection.disable_certificate_verification,
    };
    let instance = config::resolve_instance(&config, &connection.instance_name, &overrides)?;
    let tracker = JiraClient::new(
        &instance.url,
        &instance.username,
        &instance.password,
        instance.verify,
    )?;
    let reader = build_reader(&args.reader)?;

    let interrupt = Interrupt::install();
    let confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AssumeYes::new(interrupt.clone()))
    } else {
        Box::new(TerminalConfirm::new(interrupt.clone()))
    };

    let options = SyncOptions {
        issue_type_default: args.issuetype,
        relationship: args.relationship,
        labels_to_add: args.labels,
        field_overrides: args.fields,
        create_or_update: !args.no_create,
        size_field: instance.size_field,
    };

    let report = SyncEngine::new(&tracker, reader.as_ref(), confirm.as_ref())
        .with_interrupt(interrupt)
        .with_activity_log(ActivityLog::default_location())
        .synchronize(&args.path, &args.project, &options)
        .await
        .with_context(|| format!("Failed to synchronize {}", args.path.display()))?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &SyncReport) {
    println!(
        "{} rows: {} created, {} updated, {} skipped; {} links created, {} already present",
        report.rows,
        report.created,
        report.updated,
        report.skipped,
        report.links.created,
        report.links.existing
    );
    if report.aborted {
        println!("Run was aborted; rows after that point were written back unchanged.");
    }
}

fn handle_digraph(args: &DigraphArgs) -> Result<()> {
    let reader = build_reader(&args.reader)?;
    let sheet = Sheet::read(&args.path)?;
    let dot = digraph::render(sheet.rows.iter().map(|r| (r.line, &r.row)), reader.as_ref())
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    std::fs::write(&args.out_path, dot)
        .with_context(|| format!("Failed to write {}", args.out_path.display()))?;
    Ok(())
}
