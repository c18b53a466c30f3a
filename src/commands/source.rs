use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use url::Url;

use crate::cli::{InputFormat, SourceArgs};
use crate::dom::{Document, html, snapshot};
use crate::extract::ExtractionContext;
use crate::policy::ExclusionPolicy;
use crate::util::sha256_hex;

/// A loaded document plus the context every request against it runs with.
pub struct LoadedSource {
    pub document: Document,
    pub context: ExtractionContext,
    pub url: Option<String>,
    pub sha256: String,
}

pub fn load(args: &SourceArgs) -> Result<LoadedSource> {
    let raw = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let text = String::from_utf8_lossy(&raw);

    let format = resolve_input_format(args.input_format, &args.input, &text);
    let document = match format {
        InputFormat::Snapshot => snapshot::parse(&text)
            .with_context(|| format!("failed to load snapshot {}", args.input.display()))?,
        _ => html::parse(&text),
    };

    let url = args
        .url
        .clone()
        .or_else(|| document.url().map(ToOwned::to_owned));
    let hostname = match &url {
        Some(url) => hostname_from_url(url)?,
        None => String::new(),
    };
    let policy = resolve_policy(args)?;
    let context = ExtractionContext::new(hostname, policy);

    info!(
        path = %args.input.display(),
        format = format.as_str(),
        hostname = %context.hostname,
        policy_applied = context.active_policy().is_some(),
        "loaded document"
    );

    Ok(LoadedSource {
        document,
        context,
        url,
        sha256: sha256_hex(&raw),
    })
}

fn resolve_input_format(requested: InputFormat, path: &Path, text: &str) -> InputFormat {
    if requested != InputFormat::Auto {
        return requested;
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("json") => InputFormat::Snapshot,
        Some("html") | Some("htm") | Some("xhtml") => InputFormat::Html,
        _ if text.trim_start().starts_with('{') => InputFormat::Snapshot,
        _ => InputFormat::Html,
    }
}

fn hostname_from_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw).with_context(|| format!("invalid page url: {raw}"))?;
    Ok(parsed.host_str().unwrap_or_default().to_string())
}

fn resolve_policy(args: &SourceArgs) -> Result<Option<ExclusionPolicy>> {
    if args.no_policy {
        return Ok(None);
    }

    match &args.policy_file {
        Some(path) => ExclusionPolicy::load(path).map(Some),
        None => Ok(Some(ExclusionPolicy::builtin())),
    }
}
