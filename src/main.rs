use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;

use adpso::report::{AnsiPainter, Painter, PlainPainter};
use adpso::{Credentials, LdapConnector, PsoAuditClient, QueryFamily, SessionConfig};

/// Dump fine-grained password policies (PSOs) from Active Directory
#[derive(Debug, Parser)]
#[command(name = "adpso", version, about)]
struct Args {
    /// Username for authentication
    #[arg(short = 'u', long)]
    username: String,

    /// Password for authentication
    #[arg(short = 'p', long)]
    password: String,

    /// Domain name of the target, e.g. corp.local
    #[arg(short = 'd', long)]
    domain: String,

    /// IP address of the domain controller
    #[arg(long = "dc-ip")]
    dc_ip: String,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Diagnostics go to stderr so stdout stays the report
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing();

    let config = SessionConfig::from_env().context("invalid session configuration")?;
    tracing::debug!("{:?}", config);

    let credentials = Credentials::new(args.username, args.password, args.domain, Some(args.dc_ip));

    let painter: Box<dyn Painter> = if std::io::stdout().is_terminal() {
        Box::new(AnsiPainter)
    } else {
        Box::new(PlainPainter)
    };

    let client = PsoAuditClient::new(LdapConnector::new(config.clone()), credentials, config, painter);

    let mut reports = Vec::with_capacity(QueryFamily::ALL.len());
    for (i, family) in QueryFamily::ALL.into_iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", family.heading());
        let report = client.run_family(family).await;
        for line in &report.lines {
            println!("{}", line);
        }
        reports.push(report);
    }

    let summary = adpso::AuditSummary { reports };
    let status = summary.exit_status();
    if status.code() != 0 {
        tracing::warn!("finished with {:?}", status);
    }

    // Zeroes the credentials before the process ends
    drop(client);
    Ok(status.into())
}
