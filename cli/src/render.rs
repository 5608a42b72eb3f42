//! Plain-text and JSON rendering of controller results.

use std::io::{self, Write};

use serde::Serialize;
use user_core::{
    ApiInfo, ApiResult, ErrorKind, Field, FieldStatus, FormState, Hello, Notification, Severity, User,
    ValidationErrors,
};

pub fn json<W: Write, T: Serialize>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::other)?;
    writeln!(out)
}

/// Print the outcome line: the message on success, message plus guidance on
/// failure.
pub fn outcome<W: Write, T>(out: &mut W, result: &ApiResult<T>) -> io::Result<()> {
    if result.success {
        return writeln!(out, "ok: {}", result.message);
    }
    writeln!(out, "error: {}", result.message)?;
    if let Some(hint) = result.kind.and_then(guidance) {
        writeln!(out, "  hint: {hint}")?;
    }
    Ok(())
}

fn guidance(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::Validation => Some("fix the input and try again"),
        ErrorKind::Server => Some("the server rejected the request; `retry` repeats it"),
        ErrorKind::Connectivity => Some("is the API running? check --base-url, then `retry`"),
        ErrorKind::Unknown => None,
    }
}

pub fn user_table<W: Write>(out: &mut W, users: &[User], selected: Option<&User>) -> io::Result<()> {
    if users.is_empty() {
        return writeln!(out, "no users");
    }
    writeln!(out, "  {:>4}  {:<24} {:<28} {:>3}  city", "id", "name", "email", "age")?;
    for user in users {
        let marker = if selected.is_some_and(|s| s.id == user.id) { '*' } else { ' ' };
        writeln!(
            out,
            "{marker} {:>4}  {:<24} {:<28} {:>3}  {}",
            user.id,
            user.name,
            user.email,
            user.age,
            user.city.as_deref().unwrap_or("-")
        )?;
    }
    writeln!(out, "{} users", users.len())
}

pub fn user_detail<W: Write>(out: &mut W, user: &User) -> io::Result<()> {
    writeln!(out, "id:    {}", user.id)?;
    writeln!(out, "name:  {}", user.name)?;
    writeln!(out, "email: {}", user.email)?;
    writeln!(out, "age:   {}", user.age)?;
    writeln!(out, "city:  {}", user.city.as_deref().unwrap_or("-"))
}

pub fn hello<W: Write>(out: &mut W, hello: &Hello) -> io::Result<()> {
    writeln!(out, "{} ({}) at {}", hello.message, hello.status, hello.timestamp.to_rfc3339())
}

pub fn api_info<W: Write>(out: &mut W, info: &ApiInfo) -> io::Result<()> {
    writeln!(out, "{} v{}", info.api_name, info.version)?;
    writeln!(out, "{}", info.description)?;
    writeln!(out, "endpoints: {}", info.total_endpoints)
}

pub fn validation<W: Write>(out: &mut W, errors: &ValidationErrors) -> io::Result<()> {
    if errors.is_empty() {
        return writeln!(out, "valid");
    }
    for (field, err) in errors.iter() {
        writeln!(out, "{field}: {err}")?;
    }
    Ok(())
}

pub fn field_status<W: Write>(out: &mut W, form: &FormState, field: Field) -> io::Result<()> {
    match form.status(field) {
        FieldStatus::Invalid(msg) => writeln!(out, "  x {msg}"),
        FieldStatus::Valid => writeln!(out, "  ok"),
        FieldStatus::Pending | FieldStatus::Empty => Ok(()),
    }
}

pub fn notifications<W: Write>(out: &mut W, items: &[Notification]) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "no notifications");
    }
    for note in items {
        let tag = match note.severity {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        writeln!(
            out,
            "{} [{tag}] {} ({})",
            note.id,
            note.message,
            note.created_at.format("%H:%M:%S")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use user_core::{ApiError, UserId};

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn failed_outcome_includes_guidance() {
        let result: ApiResult<()> = ApiResult::failed(&ApiError::Connectivity);
        let text = render(|out| outcome(out, &result));
        assert!(text.starts_with("error: unable to reach the server"));
        assert!(text.contains("hint: is the API running?"));
    }

    #[test]
    fn table_marks_the_selection() {
        let user = User {
            id: UserId::new(3).unwrap(),
            name: "Bob Wilson".to_string(),
            email: "bob@example.com".to_string(),
            age: 28,
            city: None,
        };
        let text = render(|out| user_table(out, std::slice::from_ref(&user), Some(&user)));
        assert!(text.lines().nth(1).unwrap().starts_with("*    3"));
        assert!(text.ends_with("1 users\n"));
    }
}
