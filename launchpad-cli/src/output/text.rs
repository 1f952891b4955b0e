//! Text output formatting with colors.

use chrono::{DateTime, Duration, Local, Utc};
use launchpad_core::{Analysis, AnalysisStatus, Notification, Question, Startup};
use launchpad_store::{ClientConfig, EntryInfo};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ========================================================================
    // Startups
    // ========================================================================

    /// Formats the startup list as a table.
    pub fn format_startups(&self, startups: &[Startup]) -> String {
        if startups.is_empty() {
            return self.dim("No startups yet");
        }

        let mut lines = vec![format!(
            "{:<14} {:<24} {:<14} {}",
            self.bold("ID"),
            self.bold("Name"),
            self.bold("Stage"),
            self.bold("Industry"),
        )];
        for startup in startups {
            lines.push(format!(
                "{:<14} {:<24} {:<14} {}",
                self.cyan(&startup.id),
                startup.name,
                startup.stage.as_deref().unwrap_or("−"),
                startup.industry.as_deref().unwrap_or("−"),
            ));
        }
        lines.join("\n")
    }

    /// Formats one startup in detail.
    pub fn format_startup(&self, startup: &Startup) -> String {
        let mut lines = vec![
            format!("{} ({})", self.bold(&startup.name), self.cyan(&startup.id)),
            "─".repeat(40),
        ];
        if let Some(description) = &startup.description {
            lines.push(description.clone());
            lines.push(String::new());
        }
        if let Some(industry) = &startup.industry {
            lines.push(format!("Industry: {industry}"));
        }
        if let Some(stage) = &startup.stage {
            lines.push(format!("Stage:    {stage}"));
        }
        if let Some(created_at) = startup.created_at {
            lines.push(format!("Created:  {}", self.format_time(created_at)));
        }
        lines.join("\n")
    }

    // ========================================================================
    // Analyses / Questions
    // ========================================================================

    /// Formats the analyses of a startup.
    pub fn format_analyses(&self, analyses: &[Analysis]) -> String {
        if analyses.is_empty() {
            return self.dim("No analyses yet");
        }

        analyses
            .iter()
            .map(|analysis| {
                let score = analysis
                    .score
                    .map_or_else(|| self.dim("−"), |s| format!("{s:.1}"));
                let mut line = format!(
                    "{:<14} {:<20} {}",
                    self.cyan(&analysis.id),
                    self.format_status(analysis.status),
                    score
                );
                if let Some(summary) = &analysis.summary {
                    line.push_str(&format!("\n  {}", self.dim(summary)));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats follow-up questions, unanswered first.
    pub fn format_questions(&self, questions: &[Question]) -> String {
        if questions.is_empty() {
            return self.dim("No questions");
        }

        let mut sorted: Vec<_> = questions.iter().collect();
        sorted.sort_by_key(|q| q.is_answered());

        sorted
            .into_iter()
            .map(|question| {
                let marker = if question.is_answered() {
                    self.green("✓")
                } else {
                    self.yellow("?")
                };
                let mut line = format!("{marker} [{}] {}", self.cyan(&question.id), question.text);
                if let Some(answer) = &question.answer {
                    line.push_str(&format!("\n    {}", self.dim(answer)));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Formats the notification list.
    pub fn format_notifications(&self, notifications: &[Notification]) -> String {
        if notifications.is_empty() {
            return self.dim("No notifications");
        }

        notifications
            .iter()
            .map(|n| {
                let marker = if n.read { self.dim("·") } else { self.blue("●") };
                let title = if n.read { n.title.clone() } else { self.bold(&n.title) };
                let when = n
                    .created_at
                    .map(|t| format!(" {}", self.dim(&self.format_time(t))))
                    .unwrap_or_default();
                let mut line = format!("{marker} [{}] {title}{when}", self.cyan(&n.id));
                if !n.message.is_empty() {
                    line.push_str(&format!("\n    {}", n.message));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the unread count.
    pub fn format_unread_count(&self, count: u64) -> String {
        match count {
            0 => self.green("No unread notifications"),
            1 => self.yellow("1 unread notification"),
            n => self.yellow(&format!("{n} unread notifications")),
        }
    }

    // ========================================================================
    // Cache / Config
    // ========================================================================

    /// Formats cache entries, one per line.
    pub fn format_entries(&self, entries: &[EntryInfo]) -> String {
        entries
            .iter()
            .map(|entry| {
                let state = if entry.fetching {
                    self.blue("fetching")
                } else if entry.stale {
                    self.yellow("stale")
                } else if entry.has_data {
                    self.green("fresh")
                } else {
                    self.dim("empty")
                };
                let fetched = entry
                    .fetched_at
                    .map_or_else(|| self.dim("never"), |t| self.format_time(t));
                format!(
                    "{:<40} {:<10} {} ({} subscribers)",
                    entry.key.to_string(),
                    state,
                    fetched,
                    entry.subscriber_count
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the effective configuration.
    pub fn format_config(&self, config: &ClientConfig) -> String {
        let mut lines = vec![self.bold("Launchpad Configuration"), "─".repeat(40)];
        lines.push(format!("Base URL:         {}", config.base_url));
        lines.push(format!(
            "Request timeout:  {}",
            config
                .request_timeout_secs
                .map_or_else(|| "none".to_string(), |s| format!("{s}s"))
        ));
        lines.push(format!(
            "Refresh:          {} every {}ms",
            if config.refresh.enabled { "on" } else { "off" },
            config.refresh.interval_ms
        ));
        lines.push(format!(
            "Cache limit:      {}",
            config
                .cache
                .max_entries
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        ));
        lines.push(format!("Chat endpoint:    {}", config.chat.endpoint));
        lines.push(format!("Upload endpoint:  {}", config.upload.endpoint));
        lines.push(format!(
            "Token:            {}{}",
            config
                .identity
                .token_env
                .as_deref()
                .map(|var| format!("${var}, then "))
                .unwrap_or_default(),
            if config.identity.use_keychain {
                format!(
                    "keychain {}/{}",
                    config.identity.keychain_service, config.identity.keychain_account
                )
            } else {
                "anonymous".to_string()
            }
        ));
        lines.join("\n")
    }

    /// Formats an error message.
    pub fn format_error(&self, context: &str, error: &str) -> String {
        format!("{}: {} - {}", self.bold(context), self.red("Error"), error)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn format_status(&self, status: AnalysisStatus) -> String {
        match status {
            AnalysisStatus::Pending => self.dim("pending"),
            AnalysisStatus::Running => self.blue("running"),
            AnalysisStatus::Completed => self.green("completed"),
            AnalysisStatus::Failed => self.red("failed"),
        }
    }

    /// Recent times are relative, older ones are local dates.
    fn format_time(&self, time: DateTime<Utc>) -> String {
        let age = Utc::now() - time;
        if age < Duration::zero() {
            time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
        } else if age < Duration::minutes(1) {
            "just now".to_string()
        } else if age < Duration::hours(1) {
            format!("{}m ago", age.num_minutes())
        } else if age < Duration::days(1) {
            format!("{}h ago", age.num_hours())
        } else {
            time.with_timezone(&Local).format("%Y-%m-%d").to_string()
        }
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub(crate) fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    pub(crate) fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

// ============================================================================
// Tests
// ============================================================================
