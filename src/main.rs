//! salvus-build - builds the salvus server components from source.
//!
//! Extracts vendored tarballs from `src/`, builds them under `data/build/`
//! and installs everything into the `data/local/` prefix, with security
//! relevant options compiled in.

use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use salvus_build::component::{self, BuildContext};
use salvus_build::config::Config;
use salvus_build::preflight;

#[derive(Parser, Debug)]
#[command(name = "salvus-build")]
#[command(about = "Build packages from source")]
#[command(
    after_help = "EXAMPLES:\n  salvus-build --build_all          Build everything\n  salvus-build --build_nginx        Build only nginx\n  salvus-build --preflight          Check host tools and tarballs"
)]
struct Cli {
    /// build everything
    #[arg(long = "build_all", alias = "build-all")]
    build_all: bool,

    /// build tinc
    #[arg(long = "build_tinc", alias = "build-tinc")]
    build_tinc: bool,

    /// build memcached
    #[arg(long = "build_memcached", alias = "build-memcached")]
    build_memcached: bool,

    /// build the python interpreter
    #[arg(long = "build_python", alias = "build-python")]
    build_python: bool,

    /// build the nginx web server
    #[arg(long = "build_nginx", alias = "build-nginx")]
    build_nginx: bool,

    /// build the haproxy server
    #[arg(long = "build_haproxy", alias = "build-haproxy")]
    build_haproxy: bool,

    /// build the stunnel server
    #[arg(long = "build_stunnel", alias = "build-stunnel")]
    build_stunnel: bool,

    /// build the postgresql database server
    #[arg(long = "build_postgresql", alias = "build-postgresql")]
    build_postgresql: bool,

    /// build the cassandra database server
    #[arg(long = "build_cassandra", alias = "build-cassandra")]
    build_cassandra: bool,

    /// build Google's protocol buffers compiler
    #[arg(long = "build_protobuf", alias = "build-protobuf")]
    build_protobuf: bool,

    /// install all Python packages
    #[arg(long = "build_python_packages", alias = "build-python-packages")]
    build_python_packages: bool,

    /// Root directory containing src/ and data/ (default: $SALVUS_ROOT or current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Parallel make jobs (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// List components and the resolved configuration, then exit
    #[arg(long)]
    list: bool,

    /// Check host tools and source tarballs, then exit
    #[arg(long)]
    preflight: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Names of the components requested by individual flags.
    fn requested(&self) -> Vec<&'static str> {
        [
            (self.build_tinc, "tinc"),
            (self.build_memcached, "memcached"),
            (self.build_python, "python"),
            (self.build_nginx, "nginx"),
            (self.build_haproxy, "haproxy"),
            (self.build_stunnel, "stunnel"),
            (self.build_postgresql, "postgresql"),
            (self.build_cassandra, "cassandra"),
            (self.build_protobuf, "protobuf"),
            (self.build_python_packages, "python_packages"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }

    fn root(&self) -> PathBuf {
        self.root
            .clone()
            .or_else(|| env::var_os("SALVUS_ROOT").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.root())?.with_jobs(cli.jobs);

    if cli.list {
        config.print();
        println!("\nComponents (build order):");
        for c in component::ALL {
            println!("  {:<16} {}", c.name, c.description);
        }
        return Ok(());
    }

    let selected = component::select(component::ALL, cli.build_all, &cli.requested());

    if cli.preflight {
        let targets: &[&component::Component] = if selected.is_empty() {
            component::ALL
        } else {
            &selected
        };
        return preflight::run_preflight_or_fail(&config.layout, targets);
    }

    config.layout.ensure_build_dir()?;
    info!("using {} parallel jobs", config.jobs);

    let ctx = BuildContext::from_config(&config)?;
    let report = component::build_components(&ctx, &selected);

    if report.times.is_empty() {
        info!("no components selected, nothing to build");
    } else {
        info!("Times: {}", report.times);
        let json_path = config.layout.build.join("times.json");
        if let Err(e) = report.times.write_json(&json_path) {
            warn!("could not write times report: {:#}", e);
        }
    }

    if let Some((name, cause)) = report.failure {
        return Err(cause.context(format!("building {} failed", name)));
    }

    Ok(())
}
