use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::warn;

use crate::config::{AppConfig, ConfigError};
use crate::error::AppError;
use crate::grading::export::{self, ExportOptions};
use crate::grading::sheet::ExamResultOptions;
use crate::grading::stats;
use crate::grading::{
    catalog, grade_course, CheckOrder, GradeSheet, GradingError, Roster, RosterOptions,
    SheetOptions,
};
use crate::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "gradebook",
    about = "Compute final course grades from a points export and registrar rosters",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grade a course and write the registrar upload file
    Grade(GradeArgs),
    /// List the available course policies
    Courses,
    /// Summarize registered vs. graded students by study program
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
pub(crate) struct GradeArgs {
    /// Course policy name (see the `courses` subcommand)
    #[arg(short, long)]
    course: String,
    /// Points export CSV file from the e-learning platform
    #[arg(short = 'm', long = "moodle-file")]
    moodle_file: PathBuf,
    /// Registrar participant CSV export files
    #[arg(short = 'k', long = "roster-file", required = true, num_args = 1..)]
    roster_files: Vec<PathBuf>,
    /// Output grading CSV file (default: grading.csv next to the first
    /// roster file)
    #[arg(short = 'g', long = "grading-file")]
    grading_file: Option<PathBuf>,
    /// Externally delivered exam result files, chronologically ascending
    #[arg(long = "exam-file")]
    exam_files: Vec<PathBuf>,
    /// Separator character for the grading files (default from the
    /// environment, usually `;`)
    #[arg(long)]
    separator: Option<char>,
    /// Write a header line into the grading file
    #[arg(long)]
    header: bool,
    /// Check the exam block before the assignment block
    #[arg(long)]
    exam_first: bool,
    /// Skip the `_FULL` audit export
    #[arg(long)]
    no_full_export: bool,
}

#[derive(Args, Debug)]
pub(crate) struct StatsArgs {
    /// Registrar participant CSV export files
    #[arg(short = 'k', long = "roster-file", required = true, num_args = 1..)]
    roster_files: Vec<PathBuf>,
    /// Previously produced grading CSV files; on duplicate entries the file
    /// specified last wins
    #[arg(short = 'g', long = "grading-file", required = true, num_args = 1..)]
    grading_files: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Grade(args) => run_grade(args, &config),
        Command::Courses => run_courses(),
        Command::Stats(args) => run_stats(args, &config),
    }
}

fn run_grade(args: GradeArgs, config: &AppConfig) -> Result<(), AppError> {
    let mut policy = catalog::find(&args.course)
        .ok_or_else(|| GradingError::UnknownCourse(args.course.clone()))?;
    if args.exam_first {
        policy.order = CheckOrder::ExamFirst;
    }
    check_file_names(policy.family, &args);

    let mut sheet = GradeSheet::from_path(&args.moodle_file, &SheetOptions::default())
        .map_err(GradingError::from)?;
    if !args.exam_files.is_empty() {
        sheet
            .merge_exam_results(&args.exam_files, &ExamResultOptions::default())
            .map_err(GradingError::from)?;
    }

    let roster = Roster::from_paths(&args.roster_files, &roster_options(config))
        .map_err(GradingError::from)?;

    let report = grade_course(sheet, roster, &policy)?;

    let delimiter = match args.separator {
        Some(separator) => {
            u8::try_from(separator).map_err(|_| ConfigError::InvalidSeparator {
                key: "--separator",
                value: separator.to_string(),
            })?
        }
        None => config.export.delimiter,
    };

    let grading_path = args
        .grading_file
        .unwrap_or_else(|| export::default_grading_path(&args.roster_files[0]));
    let options = ExportOptions {
        delimiter,
        header: args.header,
    };
    export::write_grading_file(&report, &grading_path, &options)?;
    if !args.no_full_export {
        export::write_full_export(&report, &export::full_export_path(&grading_path), &options)?;
    }

    println!(
        "{}: {} grades written to '{}'",
        report.course,
        report.students.len(),
        grading_path.display()
    );
    if report.excluded_by_filter > 0 {
        println!(
            "{} student(s) excluded by the course's row filter",
            report.excluded_by_filter
        );
    }
    if !report.warnings.is_empty() {
        println!("{} data-quality warning(s):", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}

fn run_courses() -> Result<(), AppError> {
    for policy in catalog::all() {
        println!("{:<26} {}", policy.name, policy.title);
    }
    Ok(())
}

fn run_stats(args: StatsArgs, config: &AppConfig) -> Result<(), AppError> {
    let report = stats::collect(
        &args.roster_files,
        &args.grading_files,
        &roster_options(config),
        config.export.delimiter,
    )?;
    match args.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).map_err(stats::StatsError::from)?)
        }
    }
    Ok(())
}

fn roster_options(config: &AppConfig) -> RosterOptions {
    RosterOptions {
        delimiter: config.roster.delimiter,
        matriculation_column: config.roster.matriculation_column.clone(),
        study_column: config.roster.study_column.clone(),
    }
}

/// Mixing up export files between course instances is the classic mistake;
/// file names usually carry the course keyword, so call out when they don't.
fn check_file_names(family: &str, args: &GradeArgs) {
    let mut paths = vec![&args.moodle_file];
    paths.extend(args.roster_files.iter());
    for path in paths {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !name.contains(family) {
            warn!(
                "file name '{}' does not mention the course keyword '{}'",
                path.display(),
                family
            );
        }
    }
}
