//! Interactive dashboard session over a line-oriented input.

use super::{Output, render};
use crate::inference::{ActionPlan, Dashboard, RecommendationSession, ViewData};
use crate::{Error, Result};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::str::FromStr;

const PROMPT: &str = "lens> ";

/// One line of dashboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    Report,
    Diagnose,
    Forecast,
    Action,
    /// Accept a title, or the current pick when none is given
    Accept(Option<String>),
    /// Reject a title, or the current pick when none is given
    Reject(Option<String>),
    Reset,
    Override,
    Help,
    Quit,
}

impl DashboardCommand {
    pub const NAMES: [&'static str; 10] = [
        "report", "diagnose", "forecast", "action", "accept", "reject", "reset", "override",
        "help", "quit",
    ];
}

impl FromStr for DashboardCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest.trim().to_string()).filter(|r| !r.is_empty())),
            None => (line, None),
        };

        match word.to_lowercase().as_str() {
            "report" => Ok(DashboardCommand::Report),
            "diagnose" | "diagnosis" => Ok(DashboardCommand::Diagnose),
            "forecast" => Ok(DashboardCommand::Forecast),
            "action" => Ok(DashboardCommand::Action),
            "accept" | "watch" => Ok(DashboardCommand::Accept(rest)),
            "reject" | "skip" => Ok(DashboardCommand::Reject(rest)),
            "reset" => Ok(DashboardCommand::Reset),
            "override" => Ok(DashboardCommand::Override),
            "help" | "?" => Ok(DashboardCommand::Help),
            "quit" | "exit" | "q" => Ok(DashboardCommand::Quit),
            other => Err(Error::InvalidInput(format!(
                "unknown command '{}' (try: {})",
                other,
                DashboardCommand::NAMES.join(", ")
            ))),
        }
    }
}

/// What a session-changing command did, with the refreshed action view.
#[derive(Serialize)]
struct SessionUpdate {
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    action: ViewData<ActionPlan>,
}

impl Output for SessionUpdate {
    fn to_human(&self) -> String {
        let headline = match (self.event, &self.title) {
            ("accepted", Some(title)) => format!("Accepted '{}'.", title),
            ("rejected", Some(title)) => format!("Rejected '{}'.", title),
            ("reset", _) => "Rejection list cleared.".to_string(),
            ("override", _) => "Override acknowledged.".to_string(),
            (event, _) => event.to_string(),
        };
        format!("{}\n\n{}", headline, self.action.to_human())
    }
}

#[derive(Serialize)]
struct Help {
    commands: [&'static str; 10],
}

impl Output for Help {
    fn to_human(&self) -> String {
        [
            "Commands:",
            "  report            historical totals and timeline",
            "  diagnose          work rhythm, focus and viewer profile",
            "  forecast          trend and tomorrow's prediction",
            "  action            strategy, permission and recommendation",
            "  accept [TITLE]    accept the current pick (or TITLE)",
            "  reject [TITLE]    reject the current pick (or TITLE)",
            "  reset             clear rejected titles",
            "  override          allow one pick during a sharp drop",
            "  quit              leave the dashboard",
        ]
        .join("\n")
    }
}

fn write_error<W: Write>(out: &mut W, err: &Error, human: bool) -> Result<()> {
    if human {
        writeln!(out, "Error: {}", err)?;
    } else {
        writeln!(out, "{}", serde_json::json!({ "error": err.to_string() }))?;
    }
    Ok(())
}

/// Target of accept/reject: the given title or the current pick.
fn target(
    dashboard: &Dashboard,
    session: &RecommendationSession,
    title: Option<String>,
) -> Result<String> {
    title
        .or_else(|| dashboard.current_pick(session))
        .ok_or_else(|| Error::InvalidInput("no movie is currently recommended".to_string()))
}

fn update(
    dashboard: &Dashboard,
    session: &RecommendationSession,
    event: &'static str,
    title: Option<String>,
) -> SessionUpdate {
    SessionUpdate {
        event,
        title,
        action: dashboard.action(session),
    }
}

/// Apply one command. Returns the rendered output, or `None` to quit.
fn step(
    dashboard: &Dashboard,
    session: &mut RecommendationSession,
    command: DashboardCommand,
    human: bool,
) -> Result<Option<String>> {
    let rendered = match command {
        DashboardCommand::Report => render(&dashboard.report(), human),
        DashboardCommand::Diagnose => render(&dashboard.diagnosis(), human),
        DashboardCommand::Forecast => render(&dashboard.forecast(), human),
        DashboardCommand::Action => render(&dashboard.action(session), human),
        DashboardCommand::Accept(title) => {
            let trend = dashboard.trend().ok_or_else(|| {
                Error::InvalidInput("no productivity data to accept against".to_string())
            })?;
            let state = trend.state;
            session.permit(state)?;
            let title = target(dashboard, session, title)?;
            session.accept(state, &title)?;
            tracing::info!(title = %title, "recommendation accepted");
            render(&update(dashboard, session, "accepted", Some(title)), human)
        }
        DashboardCommand::Reject(title) => {
            let title = target(dashboard, session, title)?;
            session.reject(&title);
            render(&update(dashboard, session, "rejected", Some(title)), human)
        }
        DashboardCommand::Reset => {
            session.reset();
            render(&update(dashboard, session, "reset", None), human)
        }
        DashboardCommand::Override => {
            let trend = dashboard.trend().ok_or_else(|| {
                Error::InvalidInput("no productivity data to override".to_string())
            })?;
            session.acknowledge_override(trend.state)?;
            render(&update(dashboard, session, "override", None), human)
        }
        DashboardCommand::Help => render(
            &Help {
                commands: DashboardCommand::NAMES,
            },
            human,
        ),
        DashboardCommand::Quit => return Ok(None),
    };
    Ok(Some(rendered))
}

/// Run a dashboard session until `quit` or end of input.
///
/// Bad commands are reported and the session continues. The final session
/// state is returned.
pub fn run_dashboard<R: BufRead, W: Write>(
    dashboard: &Dashboard,
    input: R,
    out: &mut W,
    human: bool,
) -> Result<RecommendationSession> {
    let mut session = RecommendationSession::new();
    if human {
        write!(out, "{}", PROMPT)?;
        out.flush()?;
    }

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            if human {
                write!(out, "{}", PROMPT)?;
                out.flush()?;
            }
            continue;
        }

        let result = line
            .parse::<DashboardCommand>()
            .and_then(|command| step(dashboard, &mut session, command, human));
        match result {
            Ok(Some(rendered)) => writeln!(out, "{}", rendered)?,
            Ok(None) => break,
            Err(e) => write_error(out, &e, human)?,
        }

        if human {
            write!(out, "\n{}", PROMPT)?;
            out.flush()?;
        }
    }

    if human {
        writeln!(out)?;
    }
    Ok(session)
}
