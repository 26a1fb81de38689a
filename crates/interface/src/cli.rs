//! CLI - Command Line Interface
//!
//! Available Commands:
//! - roster member list|get|create|update|delete|clear  - member records
//! - roster profile show|set|reset                      - the local user's profile
//!
//! Storage is chosen by config file, `ROSTER_*` environment variables, and
//! finally the global flags below, in that order.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use roster_core::{Member, MemberDraft, MemberId, RosterConfig, RosterConfigLoader, StorageBackend};
use roster_persistence::{PreferenceStore, Profile, ProfileDefaults};
use roster_storage::{SharedMemberStore, open_member_store};

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = ".roster/config.yaml";

/// CLI Errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CliError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Preferences error: {0}")]
    PreferencesError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Roster CLI
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(author, version, about = "Local member profile store", long_about = None)]
pub struct Cli {
    /// Config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (implies the sqlite backend)
    #[arg(long, global = true, conflicts_with = "memory")]
    db: Option<PathBuf>,

    /// Use a throwaway in-memory member store
    #[arg(long, global = true)]
    memory: bool,

    /// Preference file path
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Manage member records
    #[command(subcommand)]
    Member(MemberCommand),

    /// Manage the local user's profile preferences
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand, Debug)]
pub(crate) enum MemberCommand {
    /// List all members
    List,
    /// Show one member
    Get { id: MemberId },
    /// Create a member
    Create(MemberArgs),
    /// Overwrite every field of a member
    Update {
        id: MemberId,
        #[command(flatten)]
        fields: MemberArgs,
    },
    /// Delete a member
    Delete { id: MemberId },
    /// Delete all members
    Clear,
}

#[derive(Args, Debug)]
pub(crate) struct MemberArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub profession: String,

    #[arg(long, default_value = "")]
    pub about: String,

    /// Image file to attach
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ProfileCommand {
    /// Show the stored profile
    Show,
    /// Change individual profile fields
    Set(ProfileArgs),
    /// Remove the stored profile
    Reset,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub profession: Option<String>,

    #[arg(long)]
    pub about: Option<String>,

    #[arg(long)]
    pub signed_in: Option<bool>,
}

/// Open stores shared by every command
pub struct AppContext {
    pub members: SharedMemberStore,
    pub preferences: Arc<PreferenceStore>,
}

impl AppContext {
    pub async fn open(config: &RosterConfig) -> Result<Self, CliError> {
        let members = open_member_store(&config.storage)
            .await
            .map_err(|e| CliError::StorageError(e.to_string()))?;
        let preferences = PreferenceStore::open(config.preferences.path.clone())
            .await
            .map_err(|e| CliError::PreferencesError(e.to_string()))?;

        Ok(Self {
            members,
            preferences: Arc::new(preferences),
        })
    }
}

/// JSON shape of a member; the image is summarized by its size
#[derive(Debug, Serialize)]
struct MemberSummary<'a> {
    id: MemberId,
    name: &'a str,
    email: &'a str,
    profession: &'a str,
    about: &'a str,
    image_bytes: usize,
}

impl<'a> From<&'a Member> for MemberSummary<'a> {
    fn from(member: &'a Member) -> Self {
        Self {
            id: member.id,
            name: &member.name,
            email: &member.email,
            profession: &member.profession,
            about: &member.about,
            image_bytes: member.image.len(),
        }
    }
}

/// Parse CLI arguments and execute commands
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = execute(cli).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run a parsed command and return the text to print
pub async fn execute(cli: Cli) -> Result<String, CliError> {
    let config = resolve_config(&cli, |key| std::env::var(key).ok())?;
    let format = cli.output.unwrap_or_default();
    let context = AppContext::open(&config).await?;

    match cli.command {
        Commands::Member(command) => cmd_member(command, &context, format).await,
        Commands::Profile(command) => cmd_profile(command, &context, format).await,
    }
}

/// Layer config file, environment and flags into the final config
pub(crate) fn resolve_config<F>(cli: &Cli, env: F) -> Result<RosterConfig, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut loader = RosterConfigLoader::new();
    loader
        .load_file(&config_path)
        .and_then(|l| l.apply_env_with(env))
        .map_err(|e| CliError::ConfigError(e.to_string()))?;

    let config = loader.config_mut();
    if let Some(db) = &cli.db {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.db_path = db.clone();
    }
    if cli.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    if let Some(prefs) = &cli.prefs {
        config.preferences.path = prefs.clone();
    }

    let config = loader
        .finish()
        .map_err(|e| CliError::ConfigError(e.to_string()))?;
    debug!("Resolved config: {:?}", config);
    Ok(config)
}

async fn cmd_member(
    command: MemberCommand,
    context: &AppContext,
    format: OutputFormat,
) -> Result<String, CliError> {
    let store = &context.members;

    match command {
        MemberCommand::List => {
            let members = store.list_all().await.map_err(storage_error)?;
            render_members(&members, format)
        }
        MemberCommand::Get { id } => {
            let member = store
                .get(id)
                .await
                .map_err(storage_error)?
                .ok_or_else(|| member_not_found(id))?;
            render_member(&member, format)
        }
        MemberCommand::Create(args) => {
            let draft = build_draft(args).await?;
            let member = store.create(draft).await.map_err(storage_error)?;
            info!("Created member {}", member.id);
            render_member(&member, format)
        }
        MemberCommand::Update { id, fields } => {
            let draft = build_draft(fields).await?;
            let member = store
                .update(id, draft)
                .await
                .map_err(storage_error)?
                .ok_or_else(|| member_not_found(id))?;
            info!("Updated member {}", id);
            render_member(&member, format)
        }
        MemberCommand::Delete { id } => {
            if !store.delete(id).await.map_err(storage_error)? {
                return Err(member_not_found(id));
            }
            Ok(format!("Deleted member {id}"))
        }
        MemberCommand::Clear => {
            let removed = store.delete_all().await.map_err(storage_error)?;
            Ok(format!("Deleted {removed} members"))
        }
    }
}

async fn cmd_profile(
    command: ProfileCommand,
    context: &AppContext,
    format: OutputFormat,
) -> Result<String, CliError> {
    let defaults = ProfileDefaults::new(context.preferences.clone());

    match command {
        ProfileCommand::Show => {
            let profile = defaults.load().map_err(preferences_error)?;
            render_profile(&profile, format)
        }
        ProfileCommand::Set(args) => {
            let mut profile = defaults.load().map_err(preferences_error)?;
            apply_profile_args(&mut profile, args);
            defaults.save(&profile).await.map_err(preferences_error)?;
            render_profile(&profile, format)
        }
        ProfileCommand::Reset => {
            defaults.reset().await.map_err(preferences_error)?;
            Ok("Profile reset".to_string())
        }
    }
}

async fn build_draft(args: MemberArgs) -> Result<MemberDraft, CliError> {
    let image = match &args.image {
        Some(path) => read_image(path).await?,
        None => Vec::new(),
    };
    Ok(MemberDraft::new(args.name, args.email, args.profession, args.about).with_image(image))
}

async fn read_image(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CliError::IoError(format!("{}: {}", path.display(), e)))
}

pub(crate) fn apply_profile_args(profile: &mut Profile, args: ProfileArgs) {
    if let Some(name) = args.name {
        profile.name = name;
    }
    if let Some(email) = args.email {
        profile.email = email;
    }
    if let Some(profession) = args.profession {
        profile.profession = profession;
    }
    if let Some(about) = args.about {
        profile.about = about;
    }
    if let Some(signed_in) = args.signed_in {
        profile.signed_in = signed_in;
    }
}

pub(crate) fn format_member(member: &Member) -> String {
    let mut line = format!(
        "#{} {} <{}> | {}",
        member.id, member.name, member.email, member.profession
    );
    if !member.image.is_empty() {
        line.push_str(&format!(" | image: {} bytes", member.image.len()));
    }
    if !member.about.is_empty() {
        line.push_str(&format!("\n    {}", member.about));
    }
    line
}

fn render_member(member: &Member, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Pretty => Ok(format_member(member)),
        OutputFormat::Json => to_json(&MemberSummary::from(member)),
    }
}

fn render_members(members: &[Member], format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Pretty if members.is_empty() => Ok("No members".to_string()),
        OutputFormat::Pretty => Ok(members
            .iter()
            .map(format_member)
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => {
            let summaries: Vec<MemberSummary<'_>> = members.iter().map(MemberSummary::from).collect();
            to_json(&summaries)
        }
    }
}

fn render_profile(profile: &Profile, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Pretty => Ok(format!(
            "Name:       {}\nEmail:      {}\nProfession: {}\nAbout:      {}\nSigned in:  {}",
            profile.name, profile.email, profile.profession, profile.about, profile.signed_in
        )),
        OutputFormat::Json => to_json(profile),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::IoError(e.to_string()))
}

fn storage_error(e: roster_storage::StoreError) -> CliError {
    CliError::StorageError(e.to_string())
}

fn preferences_error(e: roster_persistence::PreferenceError) -> CliError {
    CliError::PreferencesError(e.to_string())
}

fn member_not_found(id: MemberId) -> CliError {
    CliError::NotFound(format!("member {id}"))
}
