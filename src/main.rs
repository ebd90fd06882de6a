mod config;
mod handler;
mod pr;
mod prompt;
mod provider;
mod release;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use handler::{AppContext, EventOutcome};
use pr::{EventSource, GitHubClient};
use release::ReleaseOptions;

/// PR Poster: generates a propaganda-style poster for a pull request or
/// release and posts it back to GitHub.
#[derive(Parser, Debug)]
#[command(name = "pr-poster", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Handle one webhook delivery and comment the poster on the PR
    Event {
        /// Path to the webhook payload JSON
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        payload: PathBuf,

        /// Webhook event name: pull_request, pull_request_target,
        /// issue_comment or workflow_run; anything else is ignored
        #[arg(long, env = "GITHUB_EVENT_NAME", default_value = "pull_request")]
        event_name: String,
    },

    /// Generate a poster for the latest commit and save it to disk
    Release {
        /// Where to write the image
        #[arg(short, long, env = "POSTER_OUTPUT_PATH")]
        output: Option<PathBuf>,

        /// Repository full name (owner/name); defaults to origin's URL
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: Option<String>,

        /// Release tag; falls back to GITHUB_REF_NAME
        #[arg(long, env = "TAG_NAME")]
        tag: Option<String>,

        #[arg(long, env = "GITHUB_REF_NAME", hide = true)]
        ref_name: Option<String>,

        /// Who to credit as the author
        #[arg(long, env = "GITHUB_ACTOR")]
        actor: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Event {
            payload,
            event_name,
        } => {
            let span = info_span!("pr_event", event = %event_name);
            run_event(&payload, &event_name).instrument(span).await
        }
        Command::Release {
            output,
            repo,
            tag,
            ref_name,
            actor,
        } => {
            let options = ReleaseOptions {
                output_path: output,
                repo,
                tag: release_tag(tag, ref_name),
                actor,
            };
            run_release(&options)
                .instrument(info_span!("release_poster"))
                .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

/// An explicit tag wins; otherwise the ref the workflow ran on.
fn release_tag(tag: Option<String>, ref_name: Option<String>) -> Option<String> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    non_empty(tag).or(non_empty(ref_name))
}

async fn run_event(payload: &std::path::Path, event_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let raw = pr::event::read_payload(payload)?;
    let source = pr::event::classify_event(event_name, &raw)?;
    if let EventSource::Ignored(what) = &source {
        info!("ignoring {}", what);
        return Ok(());
    }

    info!("loading configuration");
    let config = config::Config::load()?;
    let image_provider = provider::create_image_provider(&config)?;
    let github = GitHubClient::new(&config.github)?;
    let ctx = AppContext::new(config, image_provider);

    let event = match source {
        EventSource::Direct(event) => event,
        EventSource::Lookup(target) => handler::resolve_target(&github, event_name, &target).await?,
        EventSource::Ignored(_) => return Ok(()),
    };
    debug!(repo = %event.repository.full_name, pr = event.pull_request.number, "resolved pull request");

    match handler::handle_pull_request_event(&ctx, &github, &event).await? {
        EventOutcome::Skipped => info!("done, repository skipped"),
        EventOutcome::Commented(outcome) => info!(?outcome, "done"),
    }
    Ok(())
}

async fn run_release(options: &ReleaseOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;
    let image_provider = provider::create_image_provider(&config)?;

    let summary = release::generate_release_poster(&config, image_provider.as_ref(), options)
        .await
        .map_err(|err| format!("Failed to generate release poster: {}", err))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_tag_prefers_explicit_tag() {
        let tag = release_tag(Some("v1.2.0".to_string()), Some("main".to_string()));
        assert_eq!(tag.as_deref(), Some("v1.2.0"));
    }

    #[test]
    fn test_release_tag_falls_back_to_ref_name() {
        assert_eq!(
            release_tag(Some(String::new()), Some("v2".to_string())).as_deref(),
            Some("v2")
        );
        assert_eq!(release_tag(None, Some(" ".to_string())), None);
    }

    #[test]
    fn test_ref_name_flag_parses() {
        let cli = Cli::try_parse_from([
            "pr-poster",
            "release",
            "--tag",
            "",
            "--ref-name",
            "v3.0.0",
        ])
        .unwrap();
        match cli.command {
            Command::Release { tag, ref_name, .. } => {
                assert_eq!(release_tag(tag, ref_name).as_deref(), Some("v3.0.0"));
            }
            other => panic!("expected release, got {:?}", other),
        }
    }
}
