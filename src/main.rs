// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cosmic_ext_users::{Config, ModelEvent, Reply, Session, SystemIdentity, UserModel};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users known to the system
    List,
    /// Print changes as the user manager reports them
    Watch,
    /// Create a new user
    Add { name: String },
    /// Change the name of a user
    Rename { uid: u32, name: String },
    /// Remove a user and their home directory
    Remove { uid: u32 },
    /// Switch to another user
    Switch { uid: u32 },
    /// Add a user to groups
    AddGroups {
        uid: u32,
        #[arg(required = true)]
        groups: Vec<String>,
    },
    /// Remove a user from groups
    RemoveGroups {
        uid: u32,
        #[arg(required = true)]
        groups: Vec<String>,
    },
    /// Check whether a user belongs to a group
    HasGroup { uid: u32, group: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "cosmic_ext_users=info",
        _ => "cosmic_ext_users=debug",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(cli.config.as_deref()).inspect_err(|why| {
        tracing::error!(%why, "error loading config");
    })?;

    match cli.command {
        Commands::List => {
            let model = UserModel::new(SystemIdentity, &config.users_group);
            print_users(&model);
            Ok(())
        }
        Commands::HasGroup { uid, group } => {
            let model = UserModel::new(SystemIdentity, &config.users_group);
            let row = row_of(&model, uid)?;
            println!("{}", model.has_group(row, &group));
            Ok(())
        }
        Commands::Watch => watch(&config).await,
        command => run(&config, command).await,
    }
}

async fn connect(config: &Config) -> Result<Session> {
    let connection = config
        .bus
        .connect()
        .await
        .context("Failed to connect to DBus")?;
    Session::new(connection, config, SystemIdentity)
        .await
        .context("Failed to watch the user manager")
}

async fn watch(config: &Config) -> Result<()> {
    let mut session = connect(config).await?;
    print_users(session.model());

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            event = session.next_event() => event,
        };
        let Some(event) = event else { return Ok(()) };
        print_event(session.model(), &event);
    }
}

async fn run(config: &Config, command: Commands) -> Result<()> {
    let mut session = connect(config).await?;

    let reply = match command {
        Commands::Add { name } => {
            session
                .call(|model| {
                    model.set_placeholder(true);
                    let row = model.row_count() - 1;
                    model.set_name(row, &name);
                    model.create_user()
                })
                .await
        }
        Commands::Rename { uid, name } => {
            let row = row_of(session.model(), uid)?;
            session.call(|model| model.set_name(row, &name)).await
        }
        Commands::Remove { uid } => {
            let row = row_of(session.model(), uid)?;
            session.call(|model| model.remove_user(row)).await
        }
        Commands::Switch { uid } => {
            let row = row_of(session.model(), uid)?;
            session.call(|model| model.set_current_user(row)).await
        }
        Commands::AddGroups { uid, groups } => {
            let row = row_of(session.model(), uid)?;
            session.call(|model| model.add_groups(row, groups)).await
        }
        Commands::RemoveGroups { uid, groups } => {
            let row = row_of(session.model(), uid)?;
            session.call(|model| model.remove_groups(row, groups)).await
        }
        Commands::List | Commands::Watch | Commands::HasGroup { .. } => return Ok(()),
    };

    let Some(reply) = reply else {
        println!("Nothing to do.");
        return Ok(());
    };
    if let Some(error) = reply.error() {
        bail!("{} failed: {}", reply.operation(), error);
    }
    match reply {
        Reply::UserAdded(Ok(uid)) => println!("Created user {uid}."),
        reply => println!("Done: {}.", reply.operation()),
    }
    Ok(())
}

fn row_of<I: cosmic_ext_users::Identity>(model: &UserModel<I>, uid: u32) -> Result<usize> {
    model
        .row_of(uid)
        .with_context(|| format!("No user with uid {uid}"))
}

fn print_users<I: cosmic_ext_users::Identity>(model: &UserModel<I>) {
    for row in 0..model.row_count() {
        let fields: Vec<String> = model
            .role_names()
            .into_iter()
            .filter_map(|(role, name)| {
                model
                    .data(row, role)
                    .map(|value| format!("{name}={value}"))
            })
            .collect();
        println!("{}", fields.join(" "));
    }
}

fn print_event<I: cosmic_ext_users::Identity>(model: &UserModel<I>, event: &ModelEvent) {
    let describe = |row: usize| {
        model
            .user(row)
            .map(ToString::to_string)
            .unwrap_or_default()
    };

    match event {
        ModelEvent::RowInserted(row) => println!("added: {}", describe(*row)),
        ModelEvent::RowRemoved(row) => println!("removed row {row}"),
        ModelEvent::DataChanged { row, .. } => println!("changed: {}", describe(*row)),
        ModelEvent::PlaceholderChanged(value) => println!("placeholder: {value}"),
        ModelEvent::GroupsChanged { row } => println!("groups changed: {}", describe(*row)),
        ModelEvent::Failed {
            operation, error, ..
        } => eprintln!("{operation} failed: {error}"),
    }
}
