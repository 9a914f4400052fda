use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Sets the level of verbosity, repeat for more output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Ignore cached credentials and always log in
    #[arg(short, long)]
    pub force: bool,

    /// IDP Username, overrides ~/.aws/user
    #[arg(short, long)]
    pub username: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in if needed and refresh the AWS credentials file (default)
    Login,

    /// Show the cached credentials without logging in
    Status,
}
