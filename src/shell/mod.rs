//! Line-oriented front end for the `medirec` binary.
//!
//! Each input line is one command; output is plain text lines. The shell
//! owns the session and nothing else; every decision is made by the
//! application services.

use std::io::{BufRead, Write};

use crate::application::{HistoryStatus, PredictionOutcome, Services};
use crate::domain::Session;
use crate::ports::Registration;
use crate::MedirecError;

const HELP: &[&str] = &[
    "commands:",
    "  register <username> <password>",
    "  login <username> <password>",
    "  logout",
    "  symptoms [filter]           list known symptom names",
    "  predict <symptom>, ...      predict from a comma or space separated selection",
    "  history [offset]            show your past predictions",
    "  help | quit",
];

/// One interactive session over the wired services.
pub struct Shell<'a> {
    services: &'a Services,
    session: Session,
}

impl<'a> Shell<'a> {
    #[must_use]
    pub fn new(services: &'a Services) -> Self {
        Self {
            services,
            session: Session::anonymous(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn prompt(&self) -> String {
        match self.session.user_id() {
            Some(user) => format!("medirec({user})> "),
            None => "medirec> ".to_string(),
        }
    }

    /// Handle one line. Returns the output lines and whether to exit.
    pub fn handle_line(&mut self, line: &str) -> (Vec<String>, bool) {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));

        let result = match command {
            "" => Ok(Vec::new()),
            "help" | "?" => Ok(HELP.iter().map(|s| s.to_string()).collect()),
            "quit" | "exit" => return (vec!["bye".to_string()], true),
            "register" => self.register(rest),
            "login" => self.login(rest),
            "logout" => Ok(self.logout()),
            "symptoms" => Ok(self.symptoms(rest)),
            "predict" => self.predict(rest),
            "history" => self.history(rest),
            other => Ok(vec![format!("unknown command '{other}' (try 'help')")]),
        };

        match result {
            Ok(out) => (out, false),
            Err(e) => (vec![error_line(&e)], false),
        }
    }

    fn credentials(rest: &str) -> Result<(&str, &str), MedirecError> {
        let mut parts = rest.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(user), Some(password), None) => Ok((user, password)),
            _ => Err(MedirecError::Validation(
                "expected <username> <password>".into(),
            )),
        }
    }

    fn register(&mut self, rest: &str) -> Result<Vec<String>, MedirecError> {
        let (user, password) = Self::credentials(rest)?;
        Ok(match self.services.accounts.register(user, password)? {
            Registration::Registered => vec!["Registered. You can now log in.".to_string()],
            Registration::AlreadyExists => vec!["Username already exists.".to_string()],
        })
    }

    fn login(&mut self, rest: &str) -> Result<Vec<String>, MedirecError> {
        let (user, password) = Self::credentials(rest)?;
        self.session = self.services.accounts.login(user, password)?;
        Ok(vec![format!("Logged in as {user}")])
    }

    fn logout(&mut self) -> Vec<String> {
        let session = std::mem::take(&mut self.session);
        self.session = self.services.accounts.logout(session);
        vec!["Logged out.".to_string()]
    }

    fn symptoms(&self, filter: &str) -> Vec<String> {
        self.services
            .recommendations
            .knowledge()
            .vocabulary()
            .names()
            .iter()
            .filter(|name| name.contains(filter))
            .cloned()
            .collect()
    }

    fn predict(&self, rest: &str) -> Result<Vec<String>, MedirecError> {
        let selection = parse_selection(rest);
        if selection.is_empty() {
            return Ok(vec!["Please select at least one symptom.".to_string()]);
        }
        let outcome = self
            .services
            .recommendations
            .predict(&self.session, &selection)?;
        Ok(render_outcome(&outcome))
    }

    fn history(&self, rest: &str) -> Result<Vec<String>, MedirecError> {
        let offset = if rest.is_empty() {
            0
        } else {
            rest.parse::<usize>()
                .map_err(|_| MedirecError::Validation(format!("invalid offset '{rest}'")))?
        };
        let page = self.services.recommendations.history_page(
            &self.session,
            offset,
            self.services.history_limit,
        )?;

        if page.items.is_empty() {
            return Ok(vec!["No history yet.".to_string()]);
        }
        let mut out = Vec::with_capacity(page.items.len() * 4 + 1);
        for entry in &page.items {
            out.push("---".to_string());
            out.push(format!("Symptoms: {}", entry.symptoms.join(", ")));
            out.push(format!("Predicted Disease: {}", entry.disease));
            out.push(format!(
                "Timestamp: {}",
                entry.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        out.push(format!(
            "Showing {}-{} of {}",
            page.offset + 1,
            page.offset + page.items.len(),
            page.total_count
        ));
        if let Some(next) = page.next_offset() {
            out.push(format!("More: history {next}"));
        }
        Ok(out)
    }
}

/// Split a selection on commas when present, otherwise on whitespace.
fn parse_selection(input: &str) -> Vec<String> {
    let parts: Vec<&str> = if input.contains(',') {
        input.split(',').collect()
    } else {
        input.split_whitespace().collect()
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn error_line(e: &MedirecError) -> String {
    match e {
        MedirecError::Unauthenticated => "Please log in first.".to_string(),
        MedirecError::InvalidCredentials => "Invalid credentials.".to_string(),
        other => format!("error: {other}"),
    }
}

fn bullet_list(out: &mut Vec<String>, title: &str, items: &[String]) {
    out.push(format!("{title}:"));
    if items.is_empty() {
        out.push("  (none)".to_string());
    }
    out.extend(items.iter().map(|i| format!("  - {i}")));
}

fn render_outcome(outcome: &PredictionOutcome) -> Vec<String> {
    let advisory = &outcome.advisory;
    let mut out = vec![format!("Predicted Disease: {}", outcome.disease)];

    if !outcome.ignored_symptoms.is_empty() {
        out.push(format!(
            "Ignored unknown symptoms: {}",
            outcome.ignored_symptoms.join(", ")
        ));
    }

    out.push("Description:".to_string());
    out.push(format!("  {}", advisory.description));
    out.push(format!("Medications: {}", advisory.medications.join(", ")));
    out.push(format!("Diet: {}", advisory.diet.join(", ")));
    bullet_list(&mut out, "Workouts", &advisory.workout);
    bullet_list(&mut out, "Precautions", &advisory.precautions);
    out.push(format!("Nearby hospitals: {}", outcome.hospital_search_url));

    if let HistoryStatus::Failed { reason } = &outcome.history {
        out.push(format!("warning: prediction not saved to history ({reason})"));
    }
    if let Some(alert) = &outcome.repeat_alert {
        out.push(format!("WARNING: {}", alert.message));
        out.push(format!("Find nearby hospitals: {}", alert.hospital_search_url));
    }
    out
}

/// Drive a shell over arbitrary input and output streams until EOF or `quit`.
///
/// # Errors
/// Returns an I/O error from either stream.
pub fn run<R: BufRead, W: Write>(
    services: &Services,
    input: R,
    mut output: W,
) -> std::io::Result<()> {
    let mut shell = Shell::new(services);
    write!(output, "{}", shell.prompt())?;
    output.flush()?;

    for line in input.lines() {
        let (out, exit) = shell.handle_line(&line?);
        for l in out {
            writeln!(output, "{l}")?;
        }
        if exit {
            return Ok(());
        }
        write!(output, "{}", shell.prompt())?;
        output.flush()?;
    }
    writeln!(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::path::Path;

    fn services() -> Services {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        Services::start(&AppConfig {
            data_dir: root.join("data/sample"),
            model_dir: Some(root.join("models/sample")),
            db_path: ":memory:".into(),
            ..AppConfig::default()
        })
        .expect("Sample services")
    }

    #[test]
    fn test_help_and_quit() {
        let services = services();
        let mut shell = Shell::new(&services);
        let (out, exit) = shell.handle_line("help");
        assert!(!exit);
        assert!(out.iter().any(|l| l.contains("predict")));
        let (_, exit) = shell.handle_line("quit");
        assert!(exit);
    }

    #[test]
    fn test_predict_requires_login() {
        let services = services();
        let mut shell = Shell::new(&services);
        let (out, _) = shell.handle_line("predict itching, skin_rash");
        assert_eq!(out, vec!["Please log in first."]);
    }

    #[test]
    fn test_full_session() {
        let services = services();
        let mut shell = Shell::new(&services);

        let (out, _) = shell.handle_line("register alice pw");
        assert_eq!(out, vec!["Registered. You can now log in."]);
        let (out, _) = shell.handle_line("register alice other");
        assert_eq!(out, vec!["Username already exists."]);

        let (out, _) = shell.handle_line("login alice wrong");
        assert_eq!(out, vec!["Invalid credentials."]);
        shell.handle_line("login alice pw");
        assert_eq!(shell.session().user_id(), Some("alice"));
        assert_eq!(shell.prompt(), "medirec(alice)> ");

        let (out, _) = shell.handle_line("predict itching skin_rash");
        assert_eq!(out[0], "Predicted Disease: Fungal infection");
        assert!(out.iter().any(|l| l.starts_with("Nearby hospitals:")));

        let (out, _) = shell.handle_line("history");
        assert!(out.iter().any(|l| l == "Predicted Disease: Fungal infection"));

        shell.handle_line("logout");
        assert!(!shell.session().is_authenticated());
    }

    #[test]
    fn test_repeat_alert_rendered() {
        let services = services();
        let mut shell = Shell::new(&services);
        shell.handle_line("register bob pw");
        shell.handle_line("login bob pw");
        shell.handle_line("predict itching, skin_rash");
        shell.handle_line("predict itching, skin_rash");
        let (out, _) = shell.handle_line("predict itching, skin_rash");
        assert!(out.iter().any(|l| l.starts_with("WARNING:")));
    }

    #[test]
    fn test_empty_selection() {
        let services = services();
        let mut shell = Shell::new(&services);
        shell.handle_line("register carol pw");
        shell.handle_line("login carol pw");
        let (out, _) = shell.handle_line("predict  ,  ");
        assert_eq!(out, vec!["Please select at least one symptom."]);
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_selection("a b  c"), vec!["a", "b", "c"]);
        assert!(parse_selection("   ").is_empty());
    }

    #[test]
    fn test_run_over_streams() {
        let services = services();
        let input = b"register dave pw\nlogin dave pw\nsymptoms skin\nquit\n";
        let mut output = Vec::new();
        run(&services, &input[..], &mut output).expect("Shell should run");
        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("Logged in as dave"));
        assert!(text.contains("skin_rash"));
        assert!(text.contains("nodal_skin_eruptions"));
        assert!(text.trim_end().ends_with("bye"));
    }
}
