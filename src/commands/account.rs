//! Login, registration and profile commands.

use clap::{Args, Subcommand, ValueEnum};

use crate::app_system::MarketSystem;
use crate::domain::ProfileForm;
use crate::error::AppResult;
use crate::output::{self, OutputFormat};
use crate::session::UserKind;
use crate::views::account::{self as view, Credentials, ProfileChanges};

/// Arguments for login
#[derive(Debug, Args)]
pub struct LoginArgs {
    #[command(subcommand)]
    pub command: LoginCommand,
}

#[derive(Debug, Subcommand)]
pub enum LoginCommand {
    /// Log in as a client by phone number
    Client { phone: String },
    /// Log in as a maalem by phone number
    Maalem { phone: String },
    /// Log in as an administrator
    Admin { username: String, password: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccountKind {
    Client,
    Maalem,
}

/// Arguments for registration
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account type
    #[arg(value_enum)]
    pub kind: AccountKind,
    #[arg(long)]
    pub firstname: String,
    #[arg(long)]
    pub lastname: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub phone: String,
}

/// Arguments for profile commands
#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Change fields of your client profile
    Update {
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

pub async fn login(args: &LoginArgs, system: &mut MarketSystem, format: OutputFormat) -> AppResult<()> {
    let credentials = match &args.command {
        LoginCommand::Client { phone } => Credentials::Client { phone: phone.clone() },
        LoginCommand::Maalem { phone } => Credentials::Maalem { phone: phone.clone() },
        LoginCommand::Admin { username, password } => Credentials::Admin {
            username: username.clone(),
            password: password.clone(),
        },
    };
    let who = view::login(system, credentials).await?;
    match format {
        OutputFormat::Json => output::print_item(&who, format),
        OutputFormat::Table => output::print_success(&format!(
            "Logged in as {} ({} #{})",
            who.name.as_deref().unwrap_or("admin"),
            who.kind,
            who.id
        )),
    }
    Ok(())
}

pub async fn logout(system: &mut MarketSystem) -> AppResult<()> {
    view::logout(system).await?;
    output::print_success("Logged out");
    Ok(())
}

pub async fn whoami(system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    match view::whoami(system).await? {
        Some(who) => output::print_item(&who, format),
        None => output::print_warning("Not logged in"),
    }
    Ok(())
}

pub async fn register(args: &RegisterArgs, system: &mut MarketSystem, format: OutputFormat) -> AppResult<()> {
    let form = ProfileForm {
        firstname: args.firstname.clone(),
        lastname: args.lastname.clone(),
        address: args.address.clone(),
        phone_number: args.phone.clone(),
    };
    let kind = match args.kind {
        AccountKind::Client => UserKind::Client,
        AccountKind::Maalem => UserKind::Maalem,
    };
    let who = view::register(system, kind, form).await?;
    match format {
        OutputFormat::Json => output::print_item(&who, format),
        OutputFormat::Table => output::print_success(&format!("Registered {} #{} and logged in", who.kind, who.id)),
    }
    Ok(())
}

pub async fn profile(args: &ProfileArgs, system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        ProfileCommand::Update { firstname, lastname, address, phone } => {
            let changes = ProfileChanges {
                firstname: firstname.clone(),
                lastname: lastname.clone(),
                address: address.clone(),
                phone_number: phone.clone(),
            };
            let client = view::update_profile(system, changes).await?;
            output::print_success("Profile updated");
            output::print_item(&client, format);
        }
    }
    Ok(())
}
