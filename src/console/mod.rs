//! Interactive console — the view shell.
//!
//! Drives a three-state session on one thread:
//!
//! - **Unauthenticated** — sign-in prompt; a successful login moves on.
//! - **Authenticated, no system selected** — topbar, system list, and
//!   welcome tips.
//! - **Authenticated, system selected** — topbar plus that system's
//!   analytics charts and resource browser; selecting a different system
//!   re-targets the same state with fresh data.
//!
//! `logout` from any authenticated state clears the persisted session
//! and returns to the sign-in prompt. The active system is never
//! persisted — every console run starts unselected.
//!
//! Every command runs to completion before the next line is read, and
//! cache keys carry the full selection, so a superseded query can never
//! land in a newer selection's view.

use std::io::{self, Write as _};

use anyhow::Result;
use colored::Colorize;

use crate::analytics;
use crate::api::{self, ApiClient};
use crate::cache::FetchCache;
use crate::charts;
use crate::cli;
use crate::config::MmpConfig;
use crate::resources::{self, ResultSet};
use crate::session::{self, Session, SessionStore};

/// Why an authenticated dashboard loop ended.
enum Outcome {
    Quit,
    Logout,
}

/// Run the console until the user quits.
pub fn run(config: &MmpConfig, store: &SessionStore) -> Result<()> {
    loop {
        match store.load() {
            None => {
                if !login_screen(config, store)? {
                    return Ok(());
                }
            }
            Some(session) => match dashboard(config, store, &session)? {
                Outcome::Quit => return Ok(()),
                Outcome::Logout => {}
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Unauthenticated: sign-in screen
// ---------------------------------------------------------------------------

/// Prompt for credentials until login succeeds.
///
/// Returns `false` when the user quits (or stdin closes) instead.
fn login_screen(config: &MmpConfig, store: &SessionStore) -> Result<bool> {
    println!();
    println!("{}", "Multi-Management Platform".bold().cyan());
    println!("{}", "Sign in to continue (or type 'quit').".dimmed());

    loop {
        let Some(email) = prompt("Email: ")? else {
            return Ok(false);
        };
        if email == "quit" || email == "exit" {
            return Ok(false);
        }
        if email.is_empty() {
            continue;
        }
        let Some(password) = prompt("Password: ")? else {
            return Ok(false);
        };

        match session::login(config, store, &email, &password) {
            Ok(session) => {
                println!(
                    "{} Signed in as {}",
                    "✓".green().bold(),
                    session.role.bold()
                );
                return Ok(true);
            }
            // Single generic message, no detail — the user retries.
            Err(e) => println!("{}", e.to_string().red()),
        }
    }
}

// ---------------------------------------------------------------------------
// Authenticated: dashboard loop
// ---------------------------------------------------------------------------

/// Mutable view state for one authenticated dashboard session.
struct DashboardState {
    active: Option<String>,
    resource_type: String,
    filter: String,
    results: Option<ResultSet>,
}

fn dashboard(config: &MmpConfig, store: &SessionStore, session: &Session) -> Result<Outcome> {
    let client = ApiClient::with_token(config, session.token.clone());
    let mut cache = FetchCache::new();
    let mut state = DashboardState {
        active: None,
        resource_type: config.console.default_resource_type.clone(),
        filter: String::new(),
        results: None,
    };

    render_topbar(session, &state);
    render_systems(&client, &mut cache, &state);
    render_welcome(config);

    loop {
        let Some(line) = prompt(&prompt_label(&state))? else {
            return Ok(Outcome::Quit);
        };
        let (command, rest) = split_command(&line);

        match command {
            "" => render_current(session, &state),
            "help" => render_help(),
            "systems" => render_systems(&client, &mut cache, &state),
            "use" => select_system(&client, &mut cache, &mut state, rest),
            "type" => {
                if rest.is_empty() {
                    println!("  usage: type <resource-type>");
                } else {
                    state.resource_type = rest.to_string();
                    state.results = None;
                    refresh_browser(&client, &mut cache, &mut state);
                }
            }
            "filter" => {
                // Bare `filter` clears it
                state.filter = rest.to_string();
                refresh_browser(&client, &mut cache, &mut state);
            }
            "search" => refresh_browser(&client, &mut cache, &mut state),
            "create" => create_record(&client, &mut cache, &mut state, rest),
            "analytics" => render_analytics(&client, &mut cache, &state),
            "whoami" => println!("  {} ({})", session.role.bold(), "display-only".dimmed()),
            "logout" => {
                session::logout(store)?;
                cache.clear();
                println!("{} Logged out.", "✓".green().bold());
                return Ok(Outcome::Logout);
            }
            "quit" | "exit" => return Ok(Outcome::Quit),
            other => println!(
                "  unknown command '{}' — type {} for help",
                other,
                "help".bold()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Select a system by name or list index and show its dashboard.
///
/// The new selection replaces the previous one wholesale: analytics and
/// the resource table are re-fetched for the new target, never merged.
fn select_system(
    client: &ApiClient,
    cache: &mut FetchCache,
    state: &mut DashboardState,
    target: &str,
) {
    if target.is_empty() {
        println!("  usage: use <system|index>");
        return;
    }

    let systems = match api::fetch_systems(client, cache) {
        Ok(systems) => systems,
        Err(e) => {
            println!("  {}", e.to_string().red());
            return;
        }
    };

    let chosen = match target.parse::<usize>() {
        Ok(n) if n >= 1 && n <= systems.len() => systems[n - 1].clone(),
        Ok(_) => {
            println!("  no system at that index");
            return;
        }
        Err(_) if systems.iter().any(|s| s == target) => target.to_string(),
        Err(_) => {
            println!("  unknown system '{target}'");
            return;
        }
    };

    state.active = Some(chosen);
    state.results = None;

    render_analytics(client, cache, state);
    refresh_browser(client, cache, state);
}

/// Re-run the current query and render the table.
///
/// A failure (bad filter JSON, network error) is printed and leaves the
/// previous result set untouched.
fn refresh_browser(client: &ApiClient, cache: &mut FetchCache, state: &mut DashboardState) {
    let Some(system) = state.active.clone() else {
        println!("  select a system first: {}", "use <system>".bold());
        return;
    };

    println!("  {}", "fetching records…".dimmed());
    match resources::search(client, cache, &system, &state.resource_type, &state.filter) {
        Ok(results) => {
            println!();
            println!(
                "{}",
                format!("Manage Resources: {}", state.resource_type)
                    .bold()
                    .cyan()
            );
            println!("{}", "=".repeat(56));
            cli::print_result_table(&results);
            state.results = Some(results);
        }
        Err(e) => println!("  {}", e.to_string().red()),
    }
}

/// Create a record from user-typed JSON, then re-query so it appears.
fn create_record(
    client: &ApiClient,
    cache: &mut FetchCache,
    state: &mut DashboardState,
    data_json: &str,
) {
    let Some(system) = state.active.clone() else {
        println!("  select a system first: {}", "use <system>".bold());
        return;
    };
    if data_json.is_empty() {
        println!("  usage: create {{\"name\": \"Alice\"}}");
        return;
    }

    match resources::create(
        client,
        cache,
        &system,
        &state.resource_type,
        &state.filter,
        data_json,
    ) {
        Ok(outcome) => {
            let id = outcome
                .created
                .get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("?");
            println!("{} Created record {}", "✓".green().bold(), id.bold());
            cli::print_result_table(&outcome.results);
            state.results = Some(outcome.results);
        }
        // Malformed JSON aborts before any request; the current result
        // set stays as it was.
        Err(e) => println!("  {}", e.to_string().red()),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Re-render the current view from held state, without re-fetching.
fn render_current(session: &Session, state: &DashboardState) {
    render_topbar(session, state);
    if let Some(results) = &state.results {
        println!(
            "{}",
            format!("Manage Resources: {}", state.resource_type)
                .bold()
                .cyan()
        );
        println!("{}", "=".repeat(56));
        cli::print_result_table(results);
    }
}

fn render_topbar(session: &Session, state: &DashboardState) {
    println!();
    let role_badge = format!("[{}]", session.role.to_uppercase());
    let target = state.active.as_deref().unwrap_or("no system selected");
    println!(
        "{}  {}  {}",
        "Multi-Management Platform".bold().cyan(),
        role_badge.bold(),
        target.dimmed()
    );
    println!("{}", "=".repeat(56));
}

fn render_systems(client: &ApiClient, cache: &mut FetchCache, state: &DashboardState) {
    match api::fetch_systems(client, cache) {
        Ok(systems) => {
            println!("{}", "Systems".bold());
            if systems.is_empty() {
                println!("  {}", "No systems available.".yellow());
            }
            for (i, system) in systems.iter().enumerate() {
                if state.active.as_deref() == Some(system.as_str()) {
                    println!("  {:>3}. {}", i + 1, system.cyan().bold());
                } else {
                    println!("  {:>3}. {}", i + 1, system);
                }
            }
        }
        Err(e) => println!("  {}", e.to_string().red()),
    }
}

fn render_welcome(config: &MmpConfig) {
    println!();
    println!("{}", "Welcome".bold());
    println!("  Select a system to begin: {}", "use <system>".bold());
    if config.console.welcome_tips {
        println!();
        println!("{}", "Quick Tips".bold());
        println!("  {}", "· Filter with dot-addressed keys, e.g. filter {\"data.name\": \"Alice\"}".dimmed());
        println!("  {}", "· Browse arbitrary resource types, e.g. type teacher".dimmed());
        println!("  {}", "· Type help for the full command list".dimmed());
    }
    println!();
    println!("{}", "Status".bold());
    println!("  Authenticated and ready.");
}

fn render_analytics(client: &ApiClient, cache: &mut FetchCache, state: &DashboardState) {
    let Some(system) = state.active.as_deref() else {
        println!("  select a system first: {}", "use <system>".bold());
        return;
    };

    println!("  {}", "fetching analytics…".dimmed());
    match api::fetch_analytics(client, cache, system) {
        Ok(rows) => {
            let series = analytics::monthly_series(&rows);
            let distribution = analytics::type_distribution(&rows);
            let types: Vec<String> = distribution.keys().cloned().collect();
            println!();
            charts::print_monthly(&series, &types);
            println!();
            charts::print_distribution(&distribution);
        }
        Err(e) => println!("  {}", e.to_string().red()),
    }
}

fn render_help() {
    println!("{}", "Commands".bold().cyan());
    println!("  {:<24} list systems", "systems");
    println!("  {:<24} open a system's dashboard", "use <system|index>");
    println!("  {:<24} switch the browsed resource type", "type <rtype>");
    println!("  {:<24} set (or clear) the query filter", "filter [<json>]");
    println!("  {:<24} re-run the current query", "search");
    println!("  {:<24} create a record from JSON", "create <json>");
    println!("  {:<24} re-render the charts", "analytics");
    println!("  {:<24} show the session role", "whoami");
    println!("  {:<24} sign out and clear the session", "logout");
    println!("  {:<24} leave the console", "quit");
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

/// Prompt label reflecting the current selection.
fn prompt_label(state: &DashboardState) -> String {
    match &state.active {
        Some(system) => format!("mmp:{system}> "),
        None => "mmp> ".to_string(),
    }
}

/// Print a label and read one trimmed line; `None` on closed stdin.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    let bytes = io::stdin().read_line(&mut line)?;
    if bytes == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Split a console line into a command word and its argument rest.
fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_command_separates_argument() {
        assert_eq!(split_command("use alpha"), ("use", "alpha"));
        assert_eq!(
            split_command(r#"create {"name": "Alice"}"#),
            ("create", r#"{"name": "Alice"}"#)
        );
        assert_eq!(split_command("search"), ("search", ""));
        assert_eq!(split_command(""), ("", ""));
        assert_eq!(split_command("filter   "), ("filter", ""));
    }

    #[test]
    fn prompt_label_reflects_selection() {
        let mut state = DashboardState {
            active: None,
            resource_type: "student".to_string(),
            filter: String::new(),
            results: None,
        };
        assert_eq!(prompt_label(&state), "mmp> ");

        state.active = Some("alpha".to_string());
        assert_eq!(prompt_label(&state), "mmp:alpha> ");
    }
}
