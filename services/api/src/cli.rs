use crate::demo::demo_seed;
use crate::infra::{build_service, end_of_day, parse_date, parse_instant, start_of_day, SeedData};
use crate::server;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use dashboard_reports::config::AppConfig;
use dashboard_reports::error::AppError;
use dashboard_reports::reports::schedule::{next_send, next_send_from_anchor, DeliveryTime, Frequency};
use dashboard_reports::reports::{
    render, ExportFormat, MetricValue, ReportError, ReportType, ValidationError,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "Dashboard Reports",
    about = "Generate, export and schedule dashboard reports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// One-off report generation
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Inspect and trigger report schedules
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Render a report for a date range and write it to disk
    Export(ExportArgs),
}

#[derive(Subcommand, Debug)]
enum ScheduleCommand {
    /// Print upcoming send times for a cadence
    Next(NextArgs),
    /// Run one pass over the due schedules in the seeded store
    Tick(TickArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Report type (sales, leads, activity, analytics, system, feedback)
    #[arg(long = "type", value_parser = parse_report_type)]
    pub(crate) report_type: ReportType,
    /// First day of the range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) from: NaiveDate,
    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) to: NaiveDate,
    /// Output format (csv, html, pdf)
    #[arg(long, value_parser = parse_format, default_value = "csv")]
    pub(crate) format: ExportFormat,
    /// JSON seed with projects, leads and visits. Defaults to built-in demo data.
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Directory the report is written to
    #[arg(long, default_value = ".")]
    pub(crate) out: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct NextArgs {
    /// Cadence (daily, weekly, monthly)
    #[arg(long, value_parser = parse_frequency)]
    pub(crate) frequency: Frequency,
    /// Delivery time (HH:MM or HH:MM:SS). Defaults to 09:00:00.
    #[arg(long, value_parser = parse_delivery_time)]
    pub(crate) time: Option<DeliveryTime>,
    /// Reference instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) from: Option<DateTime<Utc>>,
    /// Number of consecutive send times to print
    #[arg(long, default_value_t = 1)]
    pub(crate) count: usize,
}

#[derive(Args, Debug)]
pub(crate) struct TickArgs {
    /// Instant the pass runs at (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// JSON seed with records and schedules. Defaults to REPORTS_SEED_PATH, then demo data.
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Format for delivered reports. Defaults to REPORTS_DEFAULT_FORMAT.
    #[arg(long, value_parser = parse_format)]
    pub(crate) format: Option<ExportFormat>,
}

fn parse_report_type(raw: &str) -> Result<ReportType, String> {
    raw.parse().map_err(|err: ValidationError| err.to_string())
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    raw.parse().map_err(|err: ValidationError| err.to_string())
}

fn parse_frequency(raw: &str) -> Result<Frequency, String> {
    raw.parse().map_err(|err: ValidationError| err.to_string())
}

fn parse_delivery_time(raw: &str) -> Result<DeliveryTime, String> {
    raw.parse().map_err(|err: ValidationError| err.to_string())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report {
            command: ReportCommand::Export(args),
        } => run_export(args),
        Command::Schedule {
            command: ScheduleCommand::Next(args),
        } => {
            run_next(args);
            Ok(())
        }
        Command::Schedule {
            command: ScheduleCommand::Tick(args),
        } => run_tick(args),
    }
}

fn load_seed(path: Option<&Path>, now: DateTime<Utc>) -> Result<SeedData, AppError> {
    match path {
        Some(path) => SeedData::load(path),
        None => Ok(demo_seed(now)),
    }
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let seed = load_seed(args.data.as_deref(), Utc::now())?;
    let (service, _) = build_service(&seed);

    let document = service.aggregator().generate(
        args.report_type,
        start_of_day(args.from),
        end_of_day(args.to),
    )?;
    let report = render(&document, args.format).map_err(ReportError::from)?;

    std::fs::create_dir_all(&args.out)?;
    let path = args.out.join(&report.filename);
    std::fs::write(&path, &report.bytes)?;

    println!("{}", document.name);
    for metric in &document.metrics {
        match &metric.value {
            MetricValue::Number(value) => println!("- {}: {value}", metric.name),
            MetricValue::Text(value) => println!("- {}: {value}", metric.name),
        }
    }
    println!(
        "Wrote {} ({} bytes, {})",
        path.display(),
        report.bytes.len(),
        report.mime_type
    );
    Ok(())
}

/// Consecutive send times, each anchored on the previous one.
pub(crate) fn upcoming_sends(
    frequency: Frequency,
    time: Option<DeliveryTime>,
    from: DateTime<Utc>,
    count: usize,
) -> Vec<DateTime<Utc>> {
    let mut sends = Vec::with_capacity(count);
    let mut next = next_send(frequency, time, from);
    for _ in 0..count {
        sends.push(next);
        next = next_send_from_anchor(frequency, time, next);
    }
    sends
}

fn run_next(args: NextArgs) {
    let from = args.from.unwrap_or_else(Utc::now);
    println!(
        "{} at {} from {}",
        args.frequency,
        args.time.unwrap_or_default(),
        from.to_rfc3339()
    );
    for send in upcoming_sends(args.frequency, args.time, from, args.count.max(1)) {
        println!("- {}", send.to_rfc3339());
    }
}

pub(crate) fn run_tick(args: TickArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let now = args.now.unwrap_or_else(Utc::now);
    let seed_path = args.data.or(config.reports.seed_path);
    let seed = load_seed(seed_path.as_deref(), now)?;
    let format = args.format.unwrap_or(config.reports.default_format);

    let (service, outbox) = build_service(&seed);
    let summary = service.tick(format, now)?;

    println!(
        "Tick at {}: {} sent, {} skipped, {} failed",
        now.to_rfc3339(),
        summary.sent.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    for failed in &summary.failed {
        println!("failed {}: {}", failed.schedule_id, failed.error);
    }
    for entry in outbox.entries() {
        println!(
            "queued {} for {} ({} bytes)",
            entry.filename,
            entry.recipients.join(", "),
            entry.size
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_export_command() {
        let cli = Cli::try_parse_from([
            "dashboard-reports-api",
            "report",
            "export",
            "--type",
            "leads",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--format",
            "PDF",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Report {
                command: ReportCommand::Export(args),
            }) => {
                assert_eq!(args.report_type, ReportType::Leads);
                assert_eq!(args.format, ExportFormat::Pdf);
                assert_eq!(args.out, PathBuf::from("."));
                assert!(args.data.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_frequency() {
        let result = Cli::try_parse_from([
            "dashboard-reports-api",
            "schedule",
            "next",
            "--frequency",
            "hourly",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn upcoming_sends_chain_from_the_previous_slot() {
        let from = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        let sends = upcoming_sends(Frequency::Monthly, DeliveryTime::from_hms(9, 0, 0), from, 3);
        let expected = [
            Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(),
        ];
        assert_eq!(sends, expected);
    }
}
