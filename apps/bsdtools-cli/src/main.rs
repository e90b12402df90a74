//! BSD Tools CLI - issue one signed API call from the command line.
//!
//! # Usage
//!
//! ```text
//! BSD_API_ID=... BSD_API_SECRET=... BSD_API_BASEURL=https://client.cp.bsd.net \
//!     bsdtools cons/get_constituents_by_id cons_ids=1
//!
//! bsdtools --post --form email=jane@example.com signup/process_signup signup_form_id=3
//!
//! bsdtools --post --form list_id=7 --file upload=cons.csv cons/upload_bulk_constituent_data
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BSD_API_ID` | *(required)* | API identifier |
//! | `BSD_API_SECRET` | *(required)* | API secret |
//! | `BSD_API_BASEURL` | *(required)* | Root URL of the BSD Tools install |
//! | `BSD_DEFERRED_INTERVAL` | `5` | Seconds between deferred-result polls |
//! | `BSD_DEFERRED_MAX_ATTEMPTS` | `20` | Maximum deferred-result polls |
//! | `BSD_REQUEST_TIMEOUT` | `10` | Per-request timeout in seconds |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use bsdtools_auth::QueryParams;
use bsdtools_client::{Client, ClientConfig, MultipartPart, RequestBody};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Call a BSD Tools API endpoint and print the response body.
#[derive(Debug, Parser)]
#[command(name = "bsdtools", version, about)]
struct Cli {
    /// Send a POST instead of a GET.
    #[arg(long)]
    post: bool,

    /// Raw request body (POST only).
    #[arg(long, conflicts_with = "form")]
    body: Option<String>,

    /// Form parameter `name=value` (POST only, repeatable).
    #[arg(long, value_parser = parse_pair)]
    form: Vec<(String, String)>,

    /// File part `name=path`; sends a multipart body together with any `--form` fields
    /// (POST only, repeatable).
    #[arg(long, value_parser = parse_pair, conflicts_with = "body")]
    file: Vec<(String, String)>,

    /// Return 202 responses as-is instead of polling for the deferred result.
    #[arg(long)]
    no_deferred: bool,

    /// Endpoint path below `/page/api/`, e.g. `cons_group/list_constituent_groups`.
    api_path: String,

    /// Query parameters as `name=value`, sent in the given order.
    #[arg(value_parser = parse_pair)]
    params: Vec<(String, String)>,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Parse a `name=value` argument.
fn parse_pair(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected name=value, got `{arg}`"))
}

/// Pick the request body from the command-line flags.
fn request_body(cli: &Cli) -> Result<RequestBody> {
    if !cli.post && (cli.body.is_some() || !cli.form.is_empty() || !cli.file.is_empty()) {
        bail!("--body, --form and --file require --post");
    }
    if !cli.file.is_empty() {
        return multipart_body(&cli.form, &cli.file);
    }
    Ok(match (&cli.body, cli.form.is_empty()) {
        (Some(body), _) => RequestBody::raw(body.clone()),
        (None, false) => RequestBody::form(cli.form.clone()),
        (None, true) => RequestBody::Empty,
    })
}

/// Build a multipart body: form fields first, then files in the given order.
fn multipart_body(form: &[(String, String)], files: &[(String, String)]) -> Result<RequestBody> {
    let mut parts: Vec<MultipartPart> = form
        .iter()
        .map(|(name, value)| MultipartPart::text(name.as_str(), value.as_str()))
        .collect();
    for (name, path) in files {
        let content =
            std::fs::read(path).with_context(|| format!("failed to read file part {path}"))?;
        let filename = Path::new(path)
            .file_name()
            .map_or_else(|| path.clone(), |f| f.to_string_lossy().into_owned());
        parts.push(MultipartPart::file(name.as_str(), filename, content));
    }
    Ok(RequestBody::multipart(parts))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ClientConfig::from_env().context("failed to load configuration")?;
    if cli.no_deferred {
        config.process_deferred_results = false;
    }

    init_tracing(&config.log_level)?;

    let client = Client::from_config(&config).context("failed to create BSD Tools client")?;
    let query: QueryParams = cli.params.iter().cloned().collect();
    let body = request_body(&cli)?;

    let result = if cli.post {
        client.post(&cli.api_path, query, body).await
    } else {
        client.get(&cli.api_path, query).await
    };
    let response = result.with_context(|| format!("request to {} failed", cli.api_path))?;

    info!(status = response.status(), bytes = response.body().len(), "Request completed");

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(response.body())?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_name_value_pair() {
        assert_eq!(
            parse_pair("cons_ids=1,2").unwrap(),
            ("cons_ids".to_owned(), "1,2".to_owned())
        );
        assert_eq!(parse_pair("empty=").unwrap(), ("empty".to_owned(), String::new()));
        assert!(parse_pair("novalue").is_err());
    }

    #[test]
    fn test_should_parse_get_arguments_in_order() {
        let cli = Cli::parse_from(["bsdtools", "cons/get_constituents_by_id", "b=2", "a=1"]);
        assert!(!cli.post);
        assert_eq!(cli.api_path, "cons/get_constituents_by_id");
        let query: QueryParams = cli.params.iter().cloned().collect();
        let keys: Vec<&str> = query.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(request_body(&cli).unwrap(), RequestBody::Empty);
    }

    #[test]
    fn test_should_build_form_body_for_post() {
        let cli = Cli::parse_from([
            "bsdtools",
            "--post",
            "--form",
            "email=jane@example.com",
            "signup/process_signup",
        ]);
        assert_eq!(
            request_body(&cli).unwrap(),
            RequestBody::form([("email", "jane@example.com")])
        );
    }

    #[test]
    fn test_should_reject_body_without_post() {
        let cli = Cli::parse_from(["bsdtools", "--body", "data", "x"]);
        assert!(request_body(&cli).is_err());
    }

    #[test]
    fn test_should_build_multipart_body_from_files() {
        let path = std::env::temp_dir().join(format!("bsdtools-cli-{}.csv", std::process::id()));
        std::fs::write(&path, "id\n1\n").unwrap();
        let file_arg = format!("upload={}", path.display());

        let cli = Cli::parse_from([
            "bsdtools",
            "--post",
            "--form",
            "list_id=7",
            "--file",
            file_arg.as_str(),
            "cons/upload_bulk_constituent_data",
        ]);
        let body = request_body(&cli).unwrap();
        std::fs::remove_file(&path).unwrap();

        let RequestBody::Multipart(parts) = body else {
            panic!("expected multipart body");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], MultipartPart::text("list_id", "7"));
        assert_eq!(parts[1].name, "upload");
        assert_eq!(
            parts[1].filename.as_deref(),
            path.file_name().and_then(|f| f.to_str())
        );
        assert_eq!(parts[1].content.as_ref(), b"id\n1\n");
    }

    #[test]
    fn test_should_fail_on_missing_file_part() {
        let cli = Cli::parse_from([
            "bsdtools",
            "--post",
            "--file",
            "upload=/nonexistent/bsdtools/cons.csv",
            "x",
        ]);
        assert!(request_body(&cli).is_err());
    }
}
