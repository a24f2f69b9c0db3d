//! Reverse-proxy deployment: stages, certificate targets and the generated
//! nginx, image and hook artifacts.
//!
//! Pure functions only. Template contents are rendered here and written by
//! the `ArtifactWriter`.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::artifact::Artifact;
use crate::domain::challenge::{ENV_CLIENT_IP, ENV_REGISTRAR_KEY, ENV_REGISTRAR_USER};
use crate::domain::config::GatewayPaths;

/// Path of the gatewayctl binary inside the proxy container.
pub const CONTAINER_BINARY: &str = "/usr/local/bin/gatewayctl";
/// Where the hook scripts are mounted inside the proxy container.
pub const CONTAINER_HOOKS_DIR: &str = "/etc/gateway/hooks";
pub const CONTAINER_NGINX_CONF: &str = "/etc/nginx/nginx.conf";
pub const CONTAINER_LETSENCRYPT: &str = "/etc/letsencrypt";

// ── State machine ────────────────────────────────────────────────────────────

/// Deployment progress. Every run starts at `Idle` and advances one stage at
/// a time; any failure parks the run in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyStage {
    Idle,
    DirectoriesReady,
    ConfigWritten,
    ContainerUp,
    ChallengeBase,
    ChallengeWildcard,
    SslApplied,
    Done,
    Failed {
        /// Stage that was being entered when the failure happened.
        stage: &'static str,
        reason: String,
    },
}

impl ProxyStage {
    /// The stage a successful step leads to. `None` once terminal.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        Some(match self {
            Self::Idle => Self::DirectoriesReady,
            Self::DirectoriesReady => Self::ConfigWritten,
            Self::ConfigWritten => Self::ContainerUp,
            Self::ContainerUp => Self::ChallengeBase,
            Self::ChallengeBase => Self::ChallengeWildcard,
            Self::ChallengeWildcard => Self::SslApplied,
            Self::SslApplied => Self::Done,
            Self::Done | Self::Failed { .. } => return None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DirectoriesReady => "directories-ready",
            Self::ConfigWritten => "config-written",
            Self::ContainerUp => "container-up",
            Self::ChallengeBase => "challenge-base",
            Self::ChallengeWildcard => "challenge-wildcard",
            Self::SslApplied => "ssl-applied",
            Self::Done => "done",
            Self::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }
}

impl fmt::Display for ProxyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { stage, reason } => write!(f, "failed at {stage}: {reason}"),
            other => f.write_str(other.name()),
        }
    }
}

// ── Certificates ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertTarget {
    /// The bare domain.
    Base,
    /// `*.<domain>`.
    Wildcard,
}

impl CertTarget {
    /// Value passed to the certificate tool's `-d`.
    #[must_use]
    pub fn domain_arg(self, fqdn: &str) -> String {
        match self {
            Self::Base => fqdn.to_string(),
            Self::Wildcard => format!("*.{fqdn}"),
        }
    }

    /// Lineage name; the certificate lands in `live/<cert_name>/`.
    #[must_use]
    pub fn cert_name(self, fqdn: &str) -> String {
        match self {
            Self::Base => fqdn.to_string(),
            Self::Wildcard => format!("wildcard.{fqdn}"),
        }
    }

    fn live_dir(self, fqdn: &str) -> String {
        format!("{CONTAINER_LETSENCRYPT}/live/{}", self.cert_name(fqdn))
    }
}

/// Which challenges completed in the current run. Not persisted: a new run
/// repeats both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CertificateWorkflowState {
    pub base_done: bool,
    pub wildcard_done: bool,
}

impl CertificateWorkflowState {
    pub fn record(&mut self, target: CertTarget) {
        match target {
            CertTarget::Base => self.base_done = true,
            CertTarget::Wildcard => self.wildcard_done = true,
        }
    }

    #[must_use]
    pub fn complete(self) -> bool {
        self.base_done && self.wildcard_done
    }
}

/// Arguments for `docker exec` running one certificate issuance.
///
/// Registrar credentials are forwarded by name only (`-e KEY`), so their
/// values come from the caller's environment and never appear in argv.
#[must_use]
pub fn certbot_exec_args(
    container: &str,
    fqdn: &str,
    target: CertTarget,
    staging: bool,
) -> Vec<String> {
    let auth_hook = format!("{CONTAINER_HOOKS_DIR}/auth.sh");
    let cleanup_hook = format!("{CONTAINER_HOOKS_DIR}/cleanup.sh");
    let domain = target.domain_arg(fqdn);
    let cert_name = target.cert_name(fqdn);
    let mut args: Vec<String> = vec!["exec".into()];
    for key in [ENV_REGISTRAR_USER, ENV_REGISTRAR_KEY, ENV_CLIENT_IP] {
        args.push("-e".into());
        args.push(key.into());
    }
    args.extend(
        [
            container,
            "certbot",
            "certonly",
            "--manual",
            "--preferred-challenges",
            "dns",
            "-d",
            domain.as_str(),
            "--cert-name",
            cert_name.as_str(),
            "--manual-auth-hook",
            auth_hook.as_str(),
            "--manual-cleanup-hook",
            cleanup_hook.as_str(),
            "--non-interactive",
            "--agree-tos",
            "--register-unsafely-without-email",
            "--force-renewal",
        ]
        .map(String::from),
    );
    if staging {
        args.push("--test-cert".into());
    }
    args
}

// ── Templates ────────────────────────────────────────────────────────────────

/// Values substituted into the proxy templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyParams {
    pub fqdn: String,
    pub upstream_port: u16,
    pub container: String,
    /// Host path of the gatewayctl build mounted for the hooks.
    pub hook_binary: PathBuf,
}

const PROXY_HEADERS: &str = "            proxy_set_header Host $host;
            proxy_set_header X-Real-IP $remote_addr;
            proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
            proxy_set_header X-Forwarded-Proto $scheme;";

fn upstream(port: u16) -> String {
    format!("http://host.docker.internal:{port}")
}

/// HTTP-only proxy configuration used until certificates exist.
#[must_use]
pub fn nginx_http_conf(p: &ProxyParams) -> String {
    let fqdn = &p.fqdn;
    let upstream = upstream(p.upstream_port);
    format!(
        "events {{
    worker_connections 1024;
}}

http {{
    server {{
        listen 80;
        listen [::]:80;
        server_name {fqdn} *.{fqdn};

        location / {{
            proxy_pass {upstream};
{PROXY_HEADERS}
        }}
    }}
}}
"
    )
}

fn tls_server(server_name: &str, live_dir: &str, upstream: &str) -> String {
    format!(
        "    server {{
        listen 443 ssl;
        listen [::]:443 ssl;
        http2 on;
        server_name {server_name};

        ssl_certificate {live_dir}/fullchain.pem;
        ssl_certificate_key {live_dir}/privkey.pem;
        ssl_protocols TLSv1.2 TLSv1.3;

        location / {{
            proxy_pass {upstream};
{PROXY_HEADERS}
        }}
    }}
"
    )
}

/// TLS-terminating configuration referencing both issued certificates.
#[must_use]
pub fn nginx_tls_conf(p: &ProxyParams) -> String {
    let fqdn = &p.fqdn;
    let upstream = upstream(p.upstream_port);
    let base = tls_server(fqdn, &CertTarget::Base.live_dir(fqdn), &upstream);
    let wildcard = tls_server(
        &format!("*.{fqdn}"),
        &CertTarget::Wildcard.live_dir(fqdn),
        &upstream,
    );
    format!(
        "events {{
    worker_connections 1024;
}}

http {{
    server {{
        listen 80;
        listen [::]:80;
        server_name {fqdn} *.{fqdn};
        return 301 https://$host$request_uri;
    }}

{base}
{wildcard}}}
"
    )
}

#[must_use]
pub fn dockerfile() -> String {
    format!(
        "FROM nginx:stable
RUN apt-get update \\
    && apt-get install -y --no-install-recommends certbot dnsutils ca-certificates \\
    && rm -rf /var/lib/apt/lists/*
COPY nginx.conf {CONTAINER_NGINX_CONF}
"
    )
}

/// Quote a value for YAML using single quotes, which take no escapes.
fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[must_use]
pub fn proxy_compose(p: &ProxyParams) -> String {
    let container = yaml_quote(&p.container);
    let binary = yaml_quote(&format!(
        "{}:{CONTAINER_BINARY}:ro",
        display_path(&p.hook_binary)
    ));
    let certs = yaml_quote(&format!("../certs:{CONTAINER_LETSENCRYPT}"));
    let hooks = yaml_quote(&format!("./hooks:{CONTAINER_HOOKS_DIR}:ro"));
    format!(
        "services:
  proxy:
    build: .
    container_name: {container}
    restart: unless-stopped
    ports:
      - '80:80'
      - '443:443'
    extra_hosts:
      - 'host.docker.internal:host-gateway'
    volumes:
      - {certs}
      - {hooks}
      - {binary}
"
    )
}

fn hook_script(subcommand: &str) -> String {
    format!("#!/bin/sh\nexec {CONTAINER_BINARY} {subcommand}\n")
}

/// Every file written in the `ConfigWritten` stage.
#[must_use]
pub fn base_artifacts(paths: &GatewayPaths, p: &ProxyParams) -> Vec<Artifact> {
    vec![
        Artifact::new(paths.proxy_config(), nginx_http_conf(p)),
        Artifact::new(paths.proxy_dockerfile(), dockerfile()),
        Artifact::new(paths.proxy_compose(), proxy_compose(p)),
        Artifact::executable(paths.auth_hook(), hook_script("_acme-auth-hook")),
        Artifact::executable(paths.cleanup_hook(), hook_script("_acme-cleanup-hook")),
    ]
}

#[must_use]
pub fn tls_artifact(paths: &GatewayPaths, p: &ProxyParams) -> Artifact {
    Artifact::new(paths.proxy_tls_config(), nginx_tls_conf(p))
}

/// Directories created in the `DirectoriesReady` stage.
#[must_use]
pub fn required_dirs(paths: &GatewayPaths) -> Vec<PathBuf> {
    vec![paths.proxy_dir(), paths.hooks_dir(), paths.certs_dir()]
}
