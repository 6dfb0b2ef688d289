//! External toolchain probing.
//!
//! The generator shells out to composer, artisan, ng and the MySQL client;
//! before doing anything it verifies those tools exist and are recent
//! enough, the same checks an operator would run by hand. Probes run
//! concurrently since each one is just a short-lived child process.

use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

/// One probed tool.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub installed: bool,
    pub version: Option<String>,
    /// Whether the tool is present and satisfies its minimum version.
    pub ok: bool,
    /// Shown when the tool is missing or too old.
    pub install_hint: &'static str,
}

/// Aggregated result of probing every required tool.
#[derive(Debug, Clone)]
pub struct ToolchainReport {
    pub tools: Vec<ToolStatus>,
}

impl ToolchainReport {
    pub fn all_ok(&self) -> bool {
        self.tools.iter().all(|t| t.ok)
    }

    pub fn missing(&self) -> impl Iterator<Item = &ToolStatus> {
        self.tools.iter().filter(|t| !t.ok)
    }
}

/// Probe every required tool concurrently.
pub async fn check_all() -> ToolchainReport {
    let (node, php, composer, mysql, ng) = tokio::join!(
        check_node(),
        check_php(),
        check_composer(),
        check_mysql(),
        check_ng()
    );
    ToolchainReport {
        tools: vec![node, php, composer, mysql, ng],
    }
}

pub async fn check_node() -> ToolStatus {
    tool_status(
        "Node.js",
        "install Node.js 14 or newer",
        probe("node", &["--version"]).await,
        r"v(\d+\.\d+\.\d+)",
        Some((14, 0)),
    )
}

pub async fn check_php() -> ToolStatus {
    tool_status(
        "PHP",
        "install PHP 8.0 or newer",
        probe("php", &["-v"]).await,
        r"PHP (\d+\.\d+\.\d+)",
        Some((8, 0)),
    )
}

pub async fn check_composer() -> ToolStatus {
    tool_status(
        "Composer",
        "install Composer (https://getcomposer.org)",
        probe("composer", &["--version"]).await,
        r"Composer version (\d+\.\d+\.\d+)",
        None,
    )
}

pub async fn check_mysql() -> ToolStatus {
    // The client is what we actually drive; fall back to the server binary
    // the way a bare server install sometimes ships.
    let output = match probe("mysql", &["--version"]).await {
        Some(output) => Some(output),
        None => probe("mysqld", &["--version"]).await,
    };
    tool_status(
        "MySQL",
        "install MySQL or MariaDB and make sure `mysql` is on PATH",
        output,
        r"(\d+\.\d+\.\d+)",
        None,
    )
}

pub async fn check_ng() -> ToolStatus {
    tool_status(
        "Angular CLI",
        "npm install -g @angular/cli",
        probe("ng", &["version"]).await,
        r"Angular CLI: (\d+\.\d+\.\d+)",
        None,
    )
}

/// Run `command args...` and return its combined output on success.
async fn probe(command: &str, args: &[&str]) -> Option<String> {
    debug!(command, ?args, "probing tool");
    let output = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Some(text)
}

fn tool_status(
    name: &'static str,
    install_hint: &'static str,
    output: Option<String>,
    version_pattern: &str,
    minimum: Option<(u32, u32)>,
) -> ToolStatus {
    let Some(output) = output else {
        return ToolStatus {
            name,
            installed: false,
            version: None,
            ok: false,
            install_hint,
        };
    };

    let version = extract_version(&output, version_pattern);
    let ok = match (minimum, version.as_deref()) {
        (None, _) => true,
        (Some((major, minor)), Some(version)) => version_at_least(version, major, minor),
        (Some(_), None) => false,
    };
    ToolStatus {
        name,
        installed: true,
        version,
        ok,
        install_hint,
    }
}

fn extract_version(text: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).expect("valid version pattern");
    re.captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Compare a `major.minor[.patch]` string against a minimum major/minor.
fn version_at_least(version: &str, min_major: u32, min_minor: u32) -> bool {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    (major, minor) >= (min_major, min_minor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_php_style_versions() {
        let out = "PHP 8.2.12 (cli) (built: Oct 24 2023 21:15:30) (NTS)";
        assert_eq!(
            extract_version(out, r"PHP (\d+\.\d+\.\d+)"),
            Some("8.2.12".to_string())
        );
    }

    #[test]
    fn extracts_node_style_versions() {
        assert_eq!(
            extract_version("v20.11.1\n", r"v(\d+\.\d+\.\d+)"),
            Some("20.11.1".to_string())
        );
    }

    #[test]
    fn version_comparison_uses_major_then_minor() {
        assert!(version_at_least("8.0.0", 8, 0));
        assert!(version_at_least("8.3.1", 8, 0));
        assert!(version_at_least("14.21.3", 14, 0));
        assert!(!version_at_least("7.4.33", 8, 0));
        assert!(!version_at_least("8.0", 8, 1));
    }

    #[test]
    fn missing_version_fails_a_minimum_requirement() {
        let status = tool_status("PHP", "hint", Some("garbage".into()), r"PHP (\d+\.\d+\.\d+)", Some((8, 0)));
        assert!(status.installed);
        assert!(!status.ok);

        let status = tool_status("Composer", "hint", Some("garbage".into()), r"Composer version (\d+\.\d+\.\d+)", None);
        assert!(status.ok, "no minimum means presence is enough");
    }

    #[tokio::test]
    async fn probe_returns_none_for_unknown_binaries() {
        assert!(probe("stackgen-no-such-binary", &["--version"]).await.is_none());
    }
}
