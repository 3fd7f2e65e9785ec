//! CLI entry point for ephid-resolve
//!
//! Resolves presented usernames the way a file-transfer daemon's password backend
//! would, printing one passwd(5) line per resolved name. Names come from the
//! command line, or from stdin one per line when none are given.
//!
//! # Examples
//!
//! With a configuration file:
//! ```bash
//! ephid-resolve --config /etc/ephid/resolver.json Ab3kLp9Qz1
//! ```
//!
//! With the stock site layout:
//! ```bash
//! ephid-resolve --state-dir /srv/state --uid 1001 --gid 1001 --json alice
//! ```
//!
//! Exits with status 2 when any name did not resolve.

use std::{
    io::{self, BufRead},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, bail};
use clap::Parser;
use ephid_core::{
    config::ResolverConfig,
    resolution::{
        ResolverDefaultStack,
        api::{ResolveRequest, ResolveResponse},
        init_resolver,
    },
};
use tower::{Service, ServiceExt};

#[derive(Parser, Debug)]
#[command(name = "ephid-resolve")]
#[command(about = "Resolve ephemeral session identifiers into synthetic accounts", long_about = None)]
struct Args {
    /// JSON resolver configuration
    #[arg(short, long, env = "EPHID_CONFIG", conflicts_with = "state_dir")]
    config: Option<PathBuf>,

    /// State directory holding the stock namespace roots, used without --config
    #[arg(short, long, env = "EPHID_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Service account uid for the stock namespaces
    #[arg(long, default_value_t = 1001)]
    uid: u32,

    /// Service account gid for the stock namespaces
    #[arg(long, default_value_t = 1001)]
    gid: u32,

    /// Print identities as JSON instead of passwd lines
    #[arg(long)]
    json: bool,

    /// Only report the matching namespace, without touching the filesystem
    #[arg(long)]
    classify: bool,

    /// Usernames to resolve, read from stdin when empty
    names: Vec<String>,
}

impl Args {
    fn resolver_config(&self) -> anyhow::Result<ResolverConfig> {
        match (&self.config, &self.state_dir) {
            (Some(path), _) => ResolverConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display())),
            (None, Some(state_dir)) => {
                Ok(ResolverConfig::site_defaults(state_dir, self.uid, self.gid))
            }
            (None, None) => bail!("either --config or --state-dir is required"),
        }
    }
}

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    #[cfg(feature = "ephid_tracing")]
    ephid_core::ephid_tracing::init_stderr("warn");

    let args = Args::parse();
    let mut resolver =
        init_resolver(args.resolver_config()?).context("invalid resolver configuration")?;

    let names = if args.names.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .map(|line| line.map(|line| line.trim().to_string()))
            .filter(|line| !matches!(line, Ok(line) if line.is_empty()))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        args.names.clone()
    };

    let mut all_found = true;
    for name in names {
        all_found &= if args.classify {
            classify_one(&mut resolver, name).await?
        } else {
            resolve_one(&mut resolver, name, args.json).await?
        };
    }

    Ok(if all_found { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

/// Resolves a single name and prints the identity, returning whether one was found.
async fn resolve_one(
    resolver: &mut ResolverDefaultStack,
    name: String,
    json: bool,
) -> anyhow::Result<bool> {
    match resolver.ready().await?.call(ResolveRequest::ByName(name.clone())).await? {
        ResolveResponse::Identity(identity) if json => {
            println!("{}", serde_json::to_string(&identity)?);
            Ok(true)
        }
        ResolveResponse::Identity(identity) => {
            println!("{identity}");
            Ok(true)
        }
        ResolveResponse::NotFound => {
            eprintln!("{name}: not found");
            Ok(false)
        }
        response => bail!("unexpected response {response:?}"),
    }
}

async fn classify_one(resolver: &mut ResolverDefaultStack, name: String) -> anyhow::Result<bool> {
    match resolver.ready().await?.call(ResolveRequest::Classify(name.clone())).await? {
        ResolveResponse::Namespace(Some(namespace)) => {
            println!("{name}: {namespace}");
            Ok(true)
        }
        ResolveResponse::Namespace(None) => {
            eprintln!("{name}: no namespace");
            Ok(false)
        }
        response => bail!("unexpected response {response:?}"),
    }
}
