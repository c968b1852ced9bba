use anyhow::Context;
use clap::{Parser, Subcommand};
use dag_history::{DagInfo, HistoryParser, ParseOptions};
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "dag-history")]
#[command(about = "Rebuild a DAG run from its history log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one DAG out of a history log and summarize it.
    Summary {
        #[arg(long)]
        log: String,

        #[arg(long)]
        dag: String,

        /// Record separator; `\n`, `\t` and `\u0001` escapes are understood.
        #[arg(long)]
        separator: Option<String>,

        /// Print the whole model as JSON instead of a text summary.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Summary {
            log,
            dag,
            separator,
            json,
        } => {
            let mut options = ParseOptions::default();
            if let Some(sep) = separator {
                options.separator = unescape(&sep);
            }

            let parsed = HistoryParser::new(&log, options)
                .dag_data(&dag)
                .with_context(|| format!("parse {} from {}", dag, log))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&parsed)?);
            } else {
                print!("{}", render_summary(&parsed));
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DAG_HISTORY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("dag_history=warn"));

    let format = env::var("DAG_HISTORY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr so `--json` output stays clean.
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}

fn unescape(raw: &str) -> String {
    raw.replace("\\u0001", "\u{1}")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}

fn render_summary(dag: &DagInfo) -> String {
    let common = dag.common();
    let mut out = format!(
        "{} {} status={} vertices={} tasks={} attempts={}\n",
        common.entity(),
        dag.name().unwrap_or("-"),
        common.status().unwrap_or("-"),
        dag.vertices().len(),
        dag.tasks().count(),
        dag.attempts().count(),
    );
    for vertex in dag.vertices() {
        let attempts: usize = vertex.tasks().iter().map(|t| t.attempts().len()).sum();
        out.push_str(&format!(
            "  {} {} status={} tasks={} attempts={}\n",
            vertex.common().entity(),
            vertex.name().unwrap_or("-"),
            vertex.common().status().unwrap_or("-"),
            vertex.tasks().len(),
            attempts,
        ));
    }
    out
}
