use crate::config::DEFAULT_POSTER_PROMPT;
use crate::pr::{ChangedFileSummary, PullRequestSummary};

pub const SUMMARY_LIMIT: usize = 500;
pub const NO_DESCRIPTION: &str = "No description provided.";
pub const NO_FILES: &str = "No file list available from webhook payload.";
const UNKNOWN_AUTHOR: &str = "unknown contributor";
const ELLIPSIS: char = '…';

/// Visual style of the poster; each style has its own base prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PosterStyle {
    #[default]
    Soviet,
    Dprk,
    Cuban,
    Capitalist,
    Royalist,
}

impl PosterStyle {
    /// Case-insensitive lookup; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "soviet" => Some(PosterStyle::Soviet),
            "dprk" => Some(PosterStyle::Dprk),
            "cuban" => Some(PosterStyle::Cuban),
            "capitalist" => Some(PosterStyle::Capitalist),
            "royalist" => Some(PosterStyle::Royalist),
            _ => None,
        }
    }

    pub fn base_prompt(&self) -> &'static str {
        match self {
            PosterStyle::Soviet => DEFAULT_POSTER_PROMPT,
            PosterStyle::Dprk => "Generate a vivid North Korean propaganda style poster that celebrates the collaboration in this pull request. Use saturated reds and blues, marching crowds, monumental architecture, and triumphant slogans.",
            PosterStyle::Cuban => "Generate a Cuban revolutionary silkscreen style poster that celebrates the collaboration in this pull request. Use flat layered colors, bold silhouettes, tropical light, and hand-lettered slogans.",
            PosterStyle::Capitalist => "Generate a 1950s American advertising style poster that celebrates the collaboration in this pull request. Use glossy optimism, smiling workers, chrome details, and a punchy sales slogan.",
            PosterStyle::Royalist => "Generate an ornate royalist proclamation style poster that celebrates the collaboration in this pull request. Use heraldic crests, gilded borders, regal figures, and a formal decree.",
        }
    }
}

/// Everything the poster prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub base_prompt: &'a str,
    /// Extra creative direction placed right after the base prompt
    pub guidance: Option<&'a str>,
    pub repo_full_name: &'a str,
    pub pr: &'a PullRequestSummary,
    pub files: &'a [ChangedFileSummary],
    pub max_files: usize,
}

/// Build the image prompt for a pull request. Pure and deterministic.
///
/// Layout:
///
/// ```text
/// <base prompt>
///
/// Additional guidance: <guidance>    (only when guidance is set)
///
/// Repository: org/repo
/// Pull Request #42: Title
/// Author: alice
///
/// PR Summary: <body, trimmed and capped at 500 chars>
///
/// Changed files:
/// - src/main.rs | status: modified | diff +3/-1
/// ```
pub fn build_poster_prompt(input: &PromptInput<'_>) -> String {
    let summary = input
        .pr
        .body
        .as_deref()
        .map(str::trim)
        .filter(|body| !body.is_empty())
        .unwrap_or(NO_DESCRIPTION);
    let summary = truncate(summary, SUMMARY_LIMIT);
    let author = input.pr.author.as_deref().unwrap_or(UNKNOWN_AUTHOR);
    let file_section = format_files(input.files, input.max_files);
    let guidance = input
        .guidance
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(|g| format!("\n\nAdditional guidance: {}", g))
        .unwrap_or_default();

    format!(
        "{}{}\n\nRepository: {}\nPull Request #{}: {}\nAuthor: {}\n\nPR Summary: {}\n\nChanged files:\n{}",
        input.base_prompt,
        guidance,
        input.repo_full_name,
        input.pr.number,
        input.pr.title,
        author,
        summary,
        file_section
    )
}

/// Hard cut at `limit` characters, marking the cut with an ellipsis.
fn truncate(value: &str, limit: usize) -> String {
    match value.char_indices().nth(limit) {
        Some((byte_idx, _)) => {
            let mut cut = value[..byte_idx].to_string();
            cut.push(ELLIPSIS);
            cut
        }
        None => value.to_string(),
    }
}

fn format_files(files: &[ChangedFileSummary], max_files: usize) -> String {
    let limited = &files[..files.len().min(max_files)];
    if limited.is_empty() {
        return NO_FILES.to_string();
    }

    limited
        .iter()
        .map(format_file)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_file(file: &ChangedFileSummary) -> String {
    let mut parts = vec![file.filename.clone()];
    if let Some(status) = file.status.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("status: {}", status));
    }
    if file.additions.is_some() || file.deletions.is_some() {
        parts.push(format!(
            "diff +{}/-{}",
            file.additions.unwrap_or(0),
            file.deletions.unwrap_or(0)
        ));
    }
    format!("- {}", parts.join(" | "))
}
