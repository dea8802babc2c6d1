//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::docstore::DocumentStore;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks. Fails if any check reports an error.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Howie Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_checks = vec![
        check_tool("ffmpeg", install_hint_ffmpeg()),
        check_tool("ffprobe", install_hint_ffmpeg()),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    println!("{}", style("API Configuration").bold());
    let api_check = check_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref());
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Sources").bold());
    let source_checks = vec![
        check_source("Video", &settings.video_path()),
        check_source("Manual", &settings.pdf_path()),
    ];
    for check in &source_checks {
        check.print();
    }
    checks.extend(source_checks);

    println!();

    println!("{}", style("Local State").bold());
    let state_checks = check_local_state(settings);
    for check in &state_checks {
        check.print();
    }
    checks.extend(state_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Howie.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Howie is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the OpenAI API key without printing it in full.
fn check_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Some("") => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// A configured source file must exist before ingestion.
fn check_source(name: &str, path: &Path) -> CheckResult {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => CheckResult::ok(
            name,
            &format!("{} ({})", path.display(), format_size(meta.len())),
        ),
        Ok(_) => CheckResult::error(
            name,
            &format!("{} is not a file", path.display()),
            "Point data_sources at a regular file",
        ),
        Err(_) => CheckResult::error(
            name,
            &format!("{} not found", path.display()),
            "Set data_sources.video_src_path / pdf_src_path in the config file",
        ),
    }
}

/// Cache directory, manifest, docstore and index database.
fn check_local_state(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let cache_dir = settings.cache_dir();
    if cache_dir.exists() {
        results.push(CheckResult::ok("Cache directory", &format!("{}", cache_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Cache directory",
            &format!("{} (will be created)", cache_dir.display()),
            "Directory will be created on first ingest",
        ));
    }

    if settings.manifest_path().exists() {
        results.push(CheckResult::ok("Manifest", "present"));
    } else {
        results.push(CheckResult::warning(
            "Manifest",
            "not found",
            "Run: howie ingest",
        ));
    }

    results.push(check_docstore(&settings.docstore_path()));

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Index database",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Index database",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created on first ingest",
        ));
    }

    results
}

/// A docstore that no longer parses is rebuilt by the next ingest, so it only warns.
fn check_docstore(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::warning("Docstore", "not found", "Run: howie ingest");
    }
    match DocumentStore::load(path) {
        Ok(store) => CheckResult::ok("Docstore", &format!("{} documents", store.len())),
        Err(e) => CheckResult::warning(
            "Docstore",
            &format!("unreadable ({})", e),
            "Run: howie ingest --reset",
        ),
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
