use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ClientConfig;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct RcConfig {
    api_url: Option<String>,
    api_key: Option<String>,
    workspace: Option<String>,
    timeout: Option<Duration>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    resolve(url, key, verify, env_var, &rc_candidates())
}

/// Explicit arguments win over the environment, which wins over the first rc
/// file found. An rc file that cannot be read or parsed is only an error when
/// it is still needed for `api_url` or `api_key`.
fn resolve(
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
    env: impl Fn(&str) -> Option<String>,
    rc_candidates: &[PathBuf],
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| env("ARGILLA_API_URL"));
    let mut key = key.or_else(|| env("ARGILLA_API_KEY"));
    let mut workspace = env("ARGILLA_WORKSPACE");
    let mut timeout = match env("ARGILLA_TIMEOUT") {
        Some(v) => Some(parse_timeout(&v).context("invalid ARGILLA_TIMEOUT")?),
        None => None,
    };
    let mut file_verify: Option<bool> = None;

    if let Some(rc_path) = rc_candidates.iter().find(|p| p.exists()) {
        match read_rc(rc_path) {
            Ok(cfg) => {
                tracing::debug!(path = %rc_path.display(), "loaded rc file");
                url = url.or(cfg.api_url);
                key = key.or(cfg.api_key);
                workspace = workspace.or(cfg.workspace);
                timeout = timeout.or(cfg.timeout);
                file_verify = cfg.verify;
            }
            Err(e) if url.is_some() && key.is_some() => {
                tracing::warn!(
                    path = %rc_path.display(),
                    error = %e,
                    "ignoring unreadable rc file"
                );
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                });
            }
        }
    }

    let Some(url) = url else {
        bail!(
            "Missing configuration: api_url (set ARGILLA_API_URL or put `api_url:` in {})",
            describe_candidates(rc_candidates)
        );
    };

    let Some(key) = key else {
        bail!(
            "Missing configuration: api_key (set ARGILLA_API_KEY or put `api_key:` in {})",
            describe_candidates(rc_candidates)
        );
    };

    Ok(ClientConfig {
        url,
        key,
        workspace,
        timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        verify: verify.or(file_verify).unwrap_or(true),
    })
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn describe_candidates(candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        return ".argillarc".to_string();
    }
    format!(
        "one of: {}",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// Accepts whole seconds (`30`) or a fractional value (`2.5`).
fn parse_timeout(v: &str) -> Result<Duration> {
    let secs: f64 = v
        .trim()
        .parse()
        .with_context(|| format!("timeout must be a number of seconds, got {:?}", v))?;
    if !secs.is_finite() || secs <= 0.0 {
        bail!("timeout must be a positive number of seconds, got {}", v);
    }
    Ok(Duration::from_secs_f64(secs))
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_rc(&text)
}

fn parse_rc(text: &str) -> Result<RcConfig> {
    let mut cfg = RcConfig::default();

    // `api_key:` may be on one line with the value on the next.
    let mut pending_key: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !line.contains(':') || is_url(line) {
                apply(&mut cfg, &pk, strip_quotes(line))?;
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k.to_string());
            } else {
                apply(&mut cfg, k, v)?;
            }
        }
    }

    Ok(cfg)
}

fn apply(cfg: &mut RcConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "api_url" | "url" => cfg.api_url = Some(value.to_string()),
        "api_key" | "key" => cfg.api_key = Some(value.to_string()),
        "workspace" => cfg.workspace = Some(value.to_string()),
        "timeout" => cfg.timeout = Some(parse_timeout(value)?),
        "verify" => cfg.verify = Some(!matches!(value, "0" | "false" | "no")),
        _ => tracing::debug!(key, "ignoring unknown rc key"),
    }
    Ok(())
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) ARGILLA_RC (explicit)
    // 2) ./.argillarc
    // 3) ~/.argillarc
    if let Ok(p) = std::env::var("ARGILLA_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".argillarc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".argillarc"));
    }
    v
}
