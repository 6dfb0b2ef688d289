//! Styled terminal output and interactive prompts.
//!
//! Presentation layer for the generator: status lines, section headers,
//! long-running step spinners, the dev-server ready report, and the
//! question flow used by `stackgen new`. Everything operator-facing goes
//! through here; diagnostics go through `tracing`.

use std::io;
use std::time::Duration;

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::devserver::ServiceRole;

pub fn header(text: &str) {
    println!();
    println!("{}", style(text).bold().cyan());
    println!("{}", style("═".repeat(60)).dim());
}

pub fn step(text: &str) {
    println!("{} {}", style("→").cyan().bold(), text);
}

pub fn success(text: &str) {
    println!("{} {}", style("✓").green().bold(), style(text).green());
}

pub fn warn(text: &str) {
    println!("{} {}", style("⚠").yellow().bold(), style(text).yellow());
}

pub fn error(text: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(text).red());
}

/// One surfaced line of a dev server's error output.
pub fn service_diagnostic(role: ServiceRole, line: &str) {
    eprintln!(
        "{} {}",
        style(format!("[{role}]")).red().bold(),
        style(line).red()
    );
}

pub fn service_ready(role: ServiceRole, endpoint: &str) {
    println!(
        "{} {} ({}) running at {}",
        style("✓").green().bold(),
        style(role).green(),
        role.framework(),
        style(endpoint).cyan()
    );
}

/// The consolidated report printed once both dev servers are ready.
pub fn ready_report(entries: &[(String, String)], database: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!();
    println!("  {}", style("Everything is ready!").green().bold());
    println!();
    for (label, endpoint) in entries {
        println!("  {:<22}{}", label, style(endpoint).cyan());
    }
    println!("  {:<22}{}", "Database:", style(database).cyan());
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!();
    println!("  {}", style("Press Ctrl+C to stop the servers").yellow());
    println!();
}

/// Printed instead of launching the servers when the operator declines.
pub fn manual_serve_hint(backend_dir: &str, frontend_dir: &str) {
    println!();
    println!("{}", style("To start the servers manually:").yellow());
    println!("  Backend:  cd {backend_dir} && php artisan serve");
    println!("  Frontend: cd {frontend_dir} && ng serve");
    println!();
}

/// ora-style spinner for long-running steps.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}").expect("valid template"));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Interactive question flow, inquirer-style: every question has a default
/// and an empty answer accepts it.
pub struct Prompter {
    term: Term,
}

impl Prompter {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    pub fn input(&self, question: &str, default: &str) -> io::Result<String> {
        self.ask(question, Some(default))?;
        let answer = self.term.read_line()?;
        let answer = answer.trim();
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer.to_string()
        })
    }

    /// Re-asks until `validate` accepts the answer.
    pub fn validated_input<F>(
        &self,
        question: &str,
        default: &str,
        validate: F,
    ) -> io::Result<String>
    where
        F: Fn(&str) -> Result<(), String>,
    {
        loop {
            let answer = self.input(question, default)?;
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => error(&reason),
            }
        }
    }

    /// Hidden input; the default is an empty answer.
    pub fn secret(&self, question: &str) -> io::Result<String> {
        self.ask(question, None)?;
        self.term.read_secure_line()
    }

    pub fn confirm(&self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        self.ask(question, Some(hint))?;
        let answer = self.term.read_line()?;
        Ok(match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }

    fn ask(&self, question: &str, hint: Option<&str>) -> io::Result<()> {
        let mut line = format!("{} {}", style("?").cyan().bold(), style(question).bold());
        if let Some(hint) = hint {
            line.push_str(&format!(" {}", style(format!("({hint})")).dim()));
        }
        line.push(' ');
        self.term.write_str(&line)
    }
}

impl Default for Prompter {
    fn default() -> Self {
        Self::new()
    }
}
