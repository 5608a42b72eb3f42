mod render;
mod shell;
mod transport;

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use user_core::{
    ApiResult, ClientConfig, Field, FormState, UserClient, UserForm, UserManager, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
};

use transport::UreqTransport;

const MAIN_HELP: &str = r#"Command line client for the user directory API.

One-shot commands (`list`, `create`, `delete`, ...) issue a single request
and print the outcome. `users shell` keeps a session open: the local list is
updated from each create and delete without reloading, and `retry` repeats
the last request.

`users validate` checks form input offline with the same rules `create`
applies before sending anything."#;

#[derive(Parser)]
#[command(name = "users")]
#[command(about = MAIN_HELP)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, env = "USER_API_BASE_URL", default_value = DEFAULT_BASE_URL, help = "Base URL of the API")]
    base_url: String,

    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Request timeout in seconds"
    )]
    timeout_secs: u64,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Test the connection to the API.")]
    Hello,
    #[command(about = "Show API information.")]
    Info,
    #[command(about = "List all users.")]
    List,
    #[command(about = "Show one user.")]
    Get {
        #[arg(help = "User id")]
        id: String,
    },
    #[command(about = "Create a user.")]
    Create(FormArgs),
    #[command(about = "Delete a user.")]
    Delete {
        #[arg(help = "User id")]
        id: String,
    },
    #[command(about = "Send a JSON payload to the echo endpoint.")]
    TestPost {
        #[arg(help = "JSON payload")]
        payload: String,
    },
    #[command(about = "Validate user fields without contacting the API.")]
    Validate(FormArgs),
    #[command(about = "Start an interactive session.")]
    Shell,
}

#[derive(Args, Debug)]
struct FormArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    age: String,
    #[arg(long, default_value = "")]
    city: String,
}

impl FormArgs {
    fn into_form(self) -> UserForm {
        UserForm {
            name: self.name,
            email: self.email,
            age: self.age,
            city: self.city,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command succeeded.
fn run(cli: Cli) -> Result<bool> {
    let config = ClientConfig::new(cli.base_url).with_timeout(Duration::from_secs(cli.timeout_secs));
    tracing::debug!(?config, "client config");
    let mut mgr = UserManager::new(UserClient::new(&config.base_url), UreqTransport::new(&config));
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let success = match cli.command {
        Commands::Hello => {
            let result = mgr.test_connection();
            report(&mut out, cli.json, &result, |out, hello| render::hello(out, hello))?
        }
        Commands::Info => {
            let result = mgr.load_api_info();
            report(&mut out, cli.json, &result, |out, info| render::api_info(out, info))?
        }
        Commands::List => {
            let result = mgr.refresh().map(|_| mgr.state().users().to_vec());
            report(&mut out, cli.json, &result, |out, users| render::user_table(out, users, None))?
        }
        Commands::Get { id } => {
            let result = mgr.get_user(&id);
            report(&mut out, cli.json, &result, |out, user| render::user_detail(out, user))?
        }
        Commands::Create(args) => {
            let mut form = FormState::new();
            let values = args.into_form();
            for field in Field::ALL {
                form.set(field, values.get(field));
            }
            let result = mgr.submit(&mut form);
            report(&mut out, cli.json, &result, |out, user| render::user_detail(out, user))?
        }
        Commands::Delete { id } => {
            let result = mgr.delete_user(&id);
            report(&mut out, cli.json, &result, |out, user| render::user_detail(out, user))?
        }
        Commands::TestPost { payload } => {
            let payload: serde_json::Value =
                serde_json::from_str(&payload).context("payload is not valid JSON")?;
            let result = mgr.test_post(payload);
            report(&mut out, cli.json, &result, |out, data| render::json(out, data))?
        }
        Commands::Validate(args) => {
            let errors = args.into_form().validate();
            if cli.json {
                let map: std::collections::BTreeMap<_, _> =
                    errors.iter().map(|(field, err)| (field, err.to_string())).collect();
                render::json(&mut out, &map)?;
            } else {
                render::validation(&mut out, &errors)?;
            }
            errors.is_empty()
        }
        Commands::Shell => {
            let stdin = io::stdin();
            shell::run(&mut mgr, stdin.lock(), &mut out)?;
            true
        }
    };
    out.flush()?;
    Ok(success)
}

/// Print a result as JSON, or as the outcome line plus a rendered payload.
fn report<W, T, F>(out: &mut W, json: bool, result: &ApiResult<T>, body: F) -> io::Result<bool>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&mut W, &T) -> io::Result<()>,
{
    if json {
        render::json(out, result)?;
    } else {
        render::outcome(out, result)?;
        if let Some(data) = &result.data {
            body(out, data)?;
        }
    }
    Ok(result.success)
}
