use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use statbank::{Client, ClientConfig, Selection, SubjectFilter, storage};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "statbank",
    version,
    about = "Browse subjects, find tables & download data from Statistics Denmark"
)]
struct Cli {
    /// Response language (en or da). Defaults to STATBANK_LANG or en.
    #[arg(long, global = true)]
    lang: Option<String>,
    /// API host root. Defaults to STATBANK_API_URL or https://api.statbank.dk.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List subjects (leaf-most), or the sub-subjects of the given ids.
    Subjects(SubjectsArgs),
    /// List tables, optionally restricted to subjects.
    Tables(TablesArgs),
    /// Show the variables of a table and their first allowed values.
    Variables(TableArgs),
    /// Print the metadata of a table as JSON.
    Metadata(MetadataArgs),
    /// Download table data (print it, or stream it to --out).
    Data(DataArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct OutArgs {
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct SubjectsArgs {
    /// Subject ids separated by comma (e.g., 02,05)
    ids: Option<String>,
    #[command(flatten)]
    out: OutArgs,
}

#[derive(Args, Debug)]
struct TablesArgs {
    /// Subject ids separated by comma (e.g., 02,05)
    #[arg(short, long)]
    subjects: Option<String>,
    /// Include tables that are no longer updated.
    #[arg(long, default_value_t = false)]
    include_inactive: bool,
    #[command(flatten)]
    out: OutArgs,
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Table id (e.g., FOLK1A)
    table: String,
    #[command(flatten)]
    out: OutArgs,
}

#[derive(Args, Debug)]
struct MetadataArgs {
    /// Table id (e.g., FOLK1A)
    table: String,
    /// Save the JSON to this file instead of printing it.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Table id (e.g., FOLK1A)
    table: String,
    /// Variable selection as ID=v1,v2 (repeatable). Unselected variables use their first value.
    #[arg(short = 'v', long = "var", value_parser = parse_var)]
    vars: Vec<(String, Vec<String>)>,
    /// Stream the raw semicolon-separated download to this file.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_var(s: &str) -> Result<(String, Vec<String>), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid --var {s:?}, expected ID=v1,v2"))?;
    let values = parse_list(v);
    if k.trim().is_empty() || values.is_empty() {
        return Err(format!("invalid --var {s:?}, expected ID=v1,v2"));
    }
    Ok((k.trim().to_string(), values))
}

fn subject_filter(s: Option<&str>) -> Option<SubjectFilter> {
    s.map(|s| SubjectFilter::Many(parse_list(s)))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = ClientConfig::from_env().context("read STATBANK_* environment")?;
    if let Some(url) = cli.base_url {
        cfg.base_url = url;
    }
    if let Some(lang) = cli.lang.as_deref() {
        cfg.lang = lang.parse()?;
    }
    let client = Client::from_config(cfg)?;

    match cli.cmd {
        Command::Subjects(args) => {
            let rows = client.list_subjects(subject_filter(args.ids.as_deref()), None)?;
            emit(&rows, &args.out)
        }
        Command::Tables(args) => {
            let rows = client.list_tables(
                subject_filter(args.subjects.as_deref()),
                args.include_inactive,
                None,
            )?;
            emit(&rows, &args.out)
        }
        Command::Variables(args) => {
            let vars = client.get_variables(&args.table, None)?;
            let rows: Vec<VariableRow> = vars
                .iter()
                .map(|v| VariableRow {
                    id: &v.id,
                    text: &v.text,
                    elimination: v.elimination,
                    time: v.time,
                    values: v.values.len(),
                    first_value: v.first_value_id().unwrap_or(""),
                })
                .collect();
            emit(&rows, &args.out)
        }
        Command::Metadata(args) => {
            let meta = client.get_metadata(&args.table, None)?;
            let s = serde_json::to_string_pretty(&meta)?;
            match args.out {
                Some(path) => {
                    std::fs::write(&path, s)
                        .with_context(|| format!("write {}", path.display()))?;
                    eprintln!("Saved metadata of {} to {}", args.table, path.display());
                }
                None => println!("{s}"),
            }
            Ok(())
        }
        Command::Data(args) => cmd_data(&client, args),
    }
}

#[derive(Serialize)]
struct VariableRow<'a> {
    id: &'a str,
    text: &'a str,
    elimination: bool,
    time: bool,
    values: usize,
    first_value: &'a str,
}

fn cmd_data(client: &Client, args: DataArgs) -> Result<()> {
    let selection: Selection = args.vars.into_iter().collect();
    let selection = (!selection.is_empty()).then_some(&selection);

    if let Some(path) = args.out.as_ref() {
        let lines = client.save_data(path, &args.table, selection, None)?;
        eprintln!("Saved {} lines to {}", lines, path.display());
        return Ok(());
    }

    let frame = client.get_data(&args.table, selection, None)?;
    storage::write_frame(&frame, std::io::stdout().lock(), b';')?;
    Ok(())
}

fn emit<T: Serialize>(rows: &[T], out: &OutArgs) -> Result<()> {
    let Some(path) = out.out.as_ref() else {
        return storage::write_csv(rows, std::io::stdout().lock());
    };
    match out_format(path, out.format.as_ref()).as_str() {
        "csv" => storage::save_csv(rows, path)?,
        "json" => storage::save_json(rows, path)?,
        other => anyhow::bail!("unsupported format: {}", other),
    }
    eprintln!("Saved {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn out_format(path: &Path, format: Option<&OutFormat>) -> String {
    match format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase()
}
