//! Interactive session that keeps local state between commands.
//!
//! Unlike the one-shot subcommands, the shell keeps a single `UserManager`
//! alive, so creates and deletes update the listing in place and `retry`
//! can repeat the last request.

use std::io::{self, BufRead, Write};

use chrono::Utc;
use user_core::{Field, FormState, Transport, UserManager};

use crate::render;

const HELP: &str = "\
commands:
  list            reload users from the server
  show            print the local list without reloading
  add             fill in the new-user form
  get ID          fetch one user from the server
  select ID       show details of a listed user
  unselect        close the details view
  delete ID       delete a user
  retry           repeat the last request
  ping            test the connection
  info            show API information
  notes           list notifications
  dismiss ID      dismiss a notification
  help            this text
  quit            leave the shell";

/// Typed at a form prompt to abandon the form.
const CANCEL: &str = ":q";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    List,
    Show,
    Add,
    Get(&'a str),
    Select(&'a str),
    Unselect,
    Delete(&'a str),
    Retry,
    Ping,
    Info,
    Notes,
    Dismiss(&'a str),
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse(line: &str) -> Option<Command<'_>> {
    let mut words = line.split_whitespace();
    let head = words.next()?;
    let arg = words.next().unwrap_or("");
    let command = match head {
        "list" | "ls" => Command::List,
        "show" => Command::Show,
        "add" | "create" => Command::Add,
        "get" => Command::Get(arg),
        "select" => Command::Select(arg),
        "unselect" | "close" => Command::Unselect,
        "delete" | "rm" => Command::Delete(arg),
        "retry" => Command::Retry,
        "ping" => Command::Ping,
        "info" => Command::Info,
        "notes" => Command::Notes,
        "dismiss" => Command::Dismiss(arg),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other),
    };
    Some(command)
}

pub fn run<T, R, W>(mgr: &mut UserManager<T>, mut input: R, out: &mut W) -> io::Result<()>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    writeln!(out, "type `help` for commands")?;
    let result = mgr.refresh();
    render::outcome(out, &result)?;

    loop {
        mgr.expire_notifications(Utc::now());
        write!(out, "users> ")?;
        out.flush()?;

        let Some(line) = read_line(&mut input)? else {
            break;
        };
        let Some(command) = parse(&line) else {
            continue;
        };
        tracing::debug!(?command, "shell command");

        match command {
            Command::List => {
                let result = mgr.refresh();
                render::outcome(out, &result)?;
                if result.success {
                    render::user_table(out, mgr.state().users(), mgr.state().selected_user())?;
                }
            }
            Command::Show => {
                render::user_table(out, mgr.state().users(), mgr.state().selected_user())?;
            }
            Command::Add => add(mgr, &mut input, out)?,
            Command::Get(id) => {
                let result = mgr.get_user(id);
                render::outcome(out, &result)?;
                if let Some(user) = &result.data {
                    render::user_detail(out, user)?;
                }
            }
            Command::Select(id) => {
                let result = mgr.select_user(id);
                render::outcome(out, &result)?;
                if let Some(user) = &result.data {
                    render::user_detail(out, user)?;
                }
            }
            Command::Unselect => {
                mgr.clear_selection();
                writeln!(out, "selection cleared")?;
            }
            Command::Delete(id) => {
                let result = mgr.delete_user(id);
                render::outcome(out, &result)?;
            }
            Command::Retry => match mgr.retry() {
                Some(result) => render::outcome(out, &result)?,
                None => writeln!(out, "nothing to retry")?,
            },
            Command::Ping => {
                let result = mgr.test_connection();
                render::outcome(out, &result)?;
            }
            Command::Info => {
                let result = mgr.load_api_info();
                match &result.data {
                    Some(info) => render::api_info(out, info)?,
                    None => render::outcome(out, &result)?,
                }
            }
            Command::Notes => render::notifications(out, mgr.notifications().items())?,
            Command::Dismiss(id) => match id.parse() {
                Ok(id) if mgr.dismiss(id) => writeln!(out, "dismissed")?,
                _ => writeln!(out, "no such notification: {id}")?,
            },
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => break,
            Command::Unknown(word) => writeln!(out, "unknown command: {word} (try `help`)")?,
        }
    }
    Ok(())
}

/// Prompt field by field, validating each on blur, then submit.
fn add<T, R, W>(mgr: &mut UserManager<T>, input: &mut R, out: &mut W) -> io::Result<()>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    writeln!(out, "new user ({CANCEL} to cancel)")?;
    let mut form = FormState::new();
    for field in Field::ALL {
        loop {
            let optional = if field.is_required() { "" } else { " (optional)" };
            write!(out, "{field}{optional}: ")?;
            out.flush()?;
            let Some(value) = read_line(input)? else {
                return Ok(());
            };
            if value.trim() == CANCEL {
                writeln!(out, "cancelled")?;
                return Ok(());
            }
            form.set(field, value);
            let valid = form.blur(field);
            render::field_status(out, &form, field)?;
            if valid {
                break;
            }
        }
    }

    let result = mgr.submit(&mut form);
    render::outcome(out, &result)?;
    if result.success {
        render::user_table(out, mgr.state().users(), mgr.state().selected_user())?;
    }
    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
