use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "claimbook")]
#[command(about = "Insurance client, policy, apartment and accident records with named checkpoints")]
#[command(version)]
pub struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to ~/.config/claimbook/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the database and tables if they do not exist
    Init,

    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Manage policies
    #[command(subcommand)]
    Policy(PolicyCommand),

    /// Manage insured apartments
    #[command(subcommand)]
    Apartment(ApartmentCommand),

    /// Manage accident records
    #[command(subcommand)]
    Accident(AccidentCommand),

    /// Save, restore and list named checkpoints
    #[command(subcommand)]
    Checkpoint(CheckpointCommand),

    /// Reporting queries
    #[command(subcommand)]
    Query(QueryCommand),
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    crate::model::parse_date(s).map_err(|e| e.to_string())
}

#[derive(Args)]
pub struct OutputArgs {
    /// Output as JSON instead of table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

// clients

#[derive(Subcommand)]
pub enum ClientCommand {
    /// Add a client
    Add(ClientAddArgs),
    /// Show one client
    Show {
        cpf: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change fields of a client; omitted fields stay as they are
    Update(ClientUpdateArgs),
    /// Remove a client
    Remove { cpf: String },
    /// List all clients
    List(OutputArgs),
}

#[derive(Args)]
pub struct ClientAddArgs {
    /// 11-digit taxpayer number
    pub cpf: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub contact: String,
    /// YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub birth_date: NaiveDate,
    #[arg(long)]
    pub sex: String,
}

#[derive(Args)]
pub struct ClientUpdateArgs {
    pub cpf: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub birth_date: Option<NaiveDate>,
    #[arg(long)]
    pub sex: Option<String>,
}

// policies

#[derive(Subcommand)]
pub enum PolicyCommand {
    /// Add a policy for an existing client
    Add(PolicyAddArgs),
    /// Show one policy
    Show {
        policy_number: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change fields of a policy; omitted fields stay as they are
    Update(PolicyUpdateArgs),
    /// Remove a policy
    Remove { policy_number: String },
    /// List all policies
    List(OutputArgs),
}

#[derive(Args)]
pub struct PolicyAddArgs {
    pub policy_number: String,
    #[arg(long, value_parser = parse_date)]
    pub start_date: NaiveDate,
    #[arg(long)]
    pub monthly_value: i64,
    #[arg(long)]
    pub coverage: String,
    /// cpf of the policy holder
    #[arg(long)]
    pub client: String,
}

#[derive(Args)]
pub struct PolicyUpdateArgs {
    pub policy_number: String,
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,
    #[arg(long)]
    pub monthly_value: Option<i64>,
    #[arg(long)]
    pub coverage: Option<String>,
    #[arg(long)]
    pub client: Option<String>,
}

// apartments

#[derive(Subcommand)]
pub enum ApartmentCommand {
    /// Add an apartment insured by an existing policy
    Add(ApartmentAddArgs),
    /// Show one apartment
    Show {
        address: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change fields of an apartment; omitted fields stay as they are
    Update(ApartmentUpdateArgs),
    /// Remove an apartment
    Remove { address: String },
    /// List all apartments
    List(OutputArgs),
}

#[derive(Args)]
pub struct ApartmentAddArgs {
    /// Street address, the apartment's key
    pub address: String,
    #[arg(long)]
    pub city: String,
    /// Area in square metres
    #[arg(long)]
    pub area: i64,
    #[arg(long)]
    pub policy: String,
    #[arg(long)]
    pub market_value: i64,
    #[arg(long)]
    pub residents: i64,
}

#[derive(Args)]
pub struct ApartmentUpdateArgs {
    pub address: String,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub area: Option<i64>,
    #[arg(long)]
    pub policy: Option<String>,
    #[arg(long)]
    pub market_value: Option<i64>,
    #[arg(long)]
    pub residents: Option<i64>,
}

// accidents

#[derive(Subcommand)]
pub enum AccidentCommand {
    /// Record an accident at an existing apartment
    Add(AccidentAddArgs),
    /// Show one accident
    Show {
        accident_id: i64,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change fields of an accident; omitted fields stay as they are
    Update(AccidentUpdateArgs),
    /// Remove an accident
    Remove { accident_id: i64 },
    /// List all accidents
    List(OutputArgs),
}

#[derive(Args)]
pub struct AccidentAddArgs {
    /// Explicit id (assigned automatically when omitted)
    #[arg(long)]
    pub id: Option<i64>,
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,
    #[arg(long, default_value_t = 1)]
    pub count: i64,
    #[arg(long)]
    pub apartment: String,
    #[arg(long)]
    pub description: String,
    #[arg(long, default_value_t = 0)]
    pub involved: i64,
}

#[derive(Args)]
pub struct AccidentUpdateArgs {
    pub accident_id: i64,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub count: Option<i64>,
    #[arg(long)]
    pub apartment: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub involved: Option<i64>,
}

// checkpoints

#[derive(Subcommand)]
pub enum CheckpointCommand {
    /// Capture all four tables under a new name
    Save { name: String },
    /// Replace all four tables with a saved checkpoint
    Restore { name: String },
    /// Print the rows stored in a checkpoint without restoring them
    Show {
        name: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List saved checkpoints
    List(OutputArgs),
}

// queries

#[derive(Subcommand)]
pub enum QueryCommand {
    /// Policies joined with their holders
    PoliciesWithClients(OutputArgs),
    /// Number of insured apartments per city
    ApartmentsPerCity(OutputArgs),
    /// Policies with a monthly value above a threshold
    PoliciesAbove {
        #[arg(long)]
        min: i64,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Clients that hold no policy
    ClientsWithoutPolicies(OutputArgs),
}
