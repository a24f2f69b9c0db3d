//! Production wiring of every port the orchestrator drives.

use anyhow::Result;

use crate::application::ports::{Capabilities, Confirmer, EventSink};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::infra::dns::SystemResolver;
use crate::infra::firewall::SystemFirewall;
use crate::infra::fs::LocalFs;
use crate::infra::http::{ReqwestHttp, build_client};
use crate::infra::namecheap::NamecheapClient;
use crate::infra::runtime_host::DockerHost;
use crate::infra::upnp::UpnpcMapper;

/// Real processes, files and network. The confirmer and sink depend on
/// the front-end and are supplied by the caller.
pub struct SystemCapabilities<C, S> {
    runner: TokioCommandRunner,
    host: DockerHost<TokioCommandRunner>,
    fs: LocalFs,
    http: ReqwestHttp,
    dns: SystemResolver<TokioCommandRunner>,
    registrar: NamecheapClient,
    firewall: SystemFirewall<TokioCommandRunner>,
    router: UpnpcMapper<TokioCommandRunner>,
    confirmer: C,
    sink: S,
}

impl<C: Confirmer, S: EventSink> SystemCapabilities<C, S> {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(confirmer: C, sink: S) -> Result<Self> {
        let client = build_client()?;
        let runner = || TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT);
        Ok(Self {
            runner: runner(),
            host: DockerHost::new(runner()),
            fs: LocalFs,
            http: ReqwestHttp::new(client.clone()),
            dns: SystemResolver::new(runner()),
            registrar: NamecheapClient::new(client),
            firewall: SystemFirewall::new(runner()),
            router: UpnpcMapper::new(runner()),
            confirmer,
            sink,
        })
    }
}

/// Registrar client and resolver for the DNS-01 hook commands, which run
/// inside the proxy container without the rest of the capability set.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn hook_adapters() -> Result<(NamecheapClient, SystemResolver<TokioCommandRunner>)> {
    Ok((
        NamecheapClient::new(build_client()?),
        SystemResolver::new(TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT)),
    ))
}

impl<C: Confirmer, S: EventSink> Capabilities for SystemCapabilities<C, S> {
    type Runner = TokioCommandRunner;
    type Host = DockerHost<TokioCommandRunner>;
    type Fs = LocalFs;
    type Http = ReqwestHttp;
    type Dns = SystemResolver<TokioCommandRunner>;
    type Registrar = NamecheapClient;
    type Firewall = SystemFirewall<TokioCommandRunner>;
    type Router = UpnpcMapper<TokioCommandRunner>;
    type Confirm = C;
    type Sink = S;

    fn runner(&self) -> &Self::Runner {
        &self.runner
    }

    fn host(&self) -> &Self::Host {
        &self.host
    }

    fn fs(&self) -> &Self::Fs {
        &self.fs
    }

    fn http(&self) -> &Self::Http {
        &self.http
    }

    fn dns(&self) -> &Self::Dns {
        &self.dns
    }

    fn registrar(&self) -> &Self::Registrar {
        &self.registrar
    }

    fn firewall(&self) -> &Self::Firewall {
        &self.firewall
    }

    fn router(&self) -> &Self::Router {
        &self.router
    }

    fn confirmer(&self) -> &Self::Confirm {
        &self.confirmer
    }

    fn sink(&self) -> &Self::Sink {
        &self.sink
    }
}
