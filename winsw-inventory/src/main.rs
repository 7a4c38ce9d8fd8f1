use anyhow::{bail, Context};
use clap::builder::FalseyValueParser;
use clap::Parser;
use std::str::FromStr;
use sysinfo::System;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use winsw_registry::{Arch, SoftwareRecord};

mod report;

use report::Report;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "WINSW_PRETTY", value_parser = FalseyValueParser::new())]
    pretty: bool,

    /// ID to map the inventory to a host. Defaults to hostname if not provided.
    #[arg(long, env = "WINSW_ID")]
    id: Option<String>,

    /// URL to POST the JSON report to.
    #[arg(long, env = "WINSW_URL")]
    url: Option<String>,

    /// Registry view(s) to enumerate: all, x64 or x32.
    #[arg(long, default_value = "all", env = "WINSW_ARCH")]
    arch: View,
}

/// Which Uninstall keys to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum View {
    /// 64-bit entries followed by 32-bit entries
    All,
    Only(Arch),
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(View::All)
        } else {
            s.parse().map(View::Only)
        }
    }
}

#[cfg(windows)]
fn collect(view: View) -> Result<Vec<SoftwareRecord>, winsw_registry::AccessError> {
    use winsw_registry::{installed_software, software_list, WindowsRegistry};

    match view {
        View::All => installed_software(),
        View::Only(arch) => software_list(&WindowsRegistry::new(), arch.base_path(), arch),
    }
}

#[cfg(not(windows))]
fn collect(_view: View) -> Result<Vec<SoftwareRecord>, std::io::Error> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "the Windows registry is not available on this platform",
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    debug!(?args, "starting");

    // Determine Host ID: Argument > Hostname > "unknown"
    let host_id = args
        .id
        .or_else(System::host_name)
        .unwrap_or_else(|| "unknown".to_string());

    let software = collect(args.arch).context("failed to enumerate installed software")?;
    info!(
        count = software.len(),
        x64 = software.iter().filter(|s| s.arch == Arch::X64).count(),
        x32 = software.iter().filter(|s| s.arch == Arch::X32).count(),
        "inventory collected"
    );

    let report = Report::new(host_id, System::long_os_version(), software)
        .context("failed to serialize inventory")?;

    if let Some(url) = args.url {
        let client = reqwest::Client::new();
        let res = client
            .post(&url)
            .json(&report)
            .send()
            .await
            .with_context(|| format!("error sending inventory to {url}"))?;
        if !res.status().is_success() {
            bail!("failed to send inventory to {}: status {}", url, res.status());
        }
        println!("Successfully sent inventory to {}", url);
    } else {
        println!("{}", report.to_json(args.pretty)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Parsing reads WINSW_* from the process environment, which tests share.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        Args::try_parse_from(argv)
    }

    #[test]
    fn default_view_is_all() {
        let args = parse(&["winsw-inventory"]).unwrap();
        assert_eq!(args.arch, View::All);
        assert!(args.url.is_none());
    }

    #[test]
    fn parses_single_view() {
        let args = parse(&["winsw-inventory", "--arch", "x32", "-p", "--id", "pc-7"]).unwrap();
        assert_eq!(args.arch, View::Only(Arch::X32));
        assert!(args.pretty);
        assert_eq!(args.id.as_deref(), Some("pc-7"));

        let args = parse(&["winsw-inventory", "--arch", "X64"]).unwrap();
        assert_eq!(args.arch, View::Only(Arch::X64));
    }

    #[test]
    fn rejects_unknown_view() {
        assert!(parse(&["winsw-inventory", "--arch", "arm64"]).is_err());
    }

    #[test]
    fn flags_from_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("WINSW_PRETTY", "1");
        env::set_var("WINSW_ARCH", "x32");
        let parsed = Args::try_parse_from(["winsw-inventory"]);
        env::set_var("WINSW_PRETTY", "0");
        let not_pretty = Args::try_parse_from(["winsw-inventory"]);
        env::remove_var("WINSW_PRETTY");
        env::remove_var("WINSW_ARCH");

        let args = parsed.unwrap();
        assert!(args.pretty);
        assert_eq!(args.arch, View::Only(Arch::X32));
        assert!(!not_pretty.unwrap().pretty);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
