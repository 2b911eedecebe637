use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::error;

use graphite_api_client::{
    config::defaults, logging, ClientConfig, Credentials, Format, GraphiteError, HttpTransport,
    RenderEval, RenderQuery, Result,
};

#[derive(Parser)]
#[command(
    name = "graphite-api-client",
    version,
    about = "Client for the Graphite render API (set GRAPHITE_USERNAME and GRAPHITE_PASSWORD for basic auth)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch series from /render/
    Render(RenderArgs),
    /// Check the last value of each series against an expression
    Eval(EvalArgs),
}

#[derive(Args)]
struct Range {
    /// Base address of the graphite server
    #[arg(short, long, default_value = defaults::BASE)]
    base: String,
    #[arg(short, long, default_value = "")]
    from: String,
    #[arg(short, long, default_value = "")]
    until: String,
    /// json or protobuf
    #[arg(long, default_value = "protobuf")]
    format: Format,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    range: Range,
    #[arg(short, long = "target", required = true)]
    targets: Vec<String>,
    #[arg(short, long, default_value_t = 0)]
    max_data_points: u32,
}

#[derive(Args)]
struct EvalArgs {
    #[command(flatten)]
    range: Range,
    /// Trailing null points to skip when looking for the last value
    #[arg(short = 'n', long, default_value_t = 1)]
    max_null_points: usize,
    /// Expression such as "servers.*.load >= 4"
    expression: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(GraphiteError::output)?;
    println!("{json}");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let transport = Arc::new(HttpTransport::new(ClientConfig::from_env())?);
    let credentials = Credentials::from_env();

    match cli.command {
        Command::Render(args) => {
            let mut query =
                RenderQuery::new(args.range.base, args.range.from, args.range.until, args.targets)
                    .with_format(args.range.format)
                    .with_max_data_points(args.max_data_points);
            if let Some(credentials) = credentials {
                query = query.with_credentials(credentials);
            }
            let series = query.request(transport.as_ref()).await?;
            print_json(&series)
        }
        Command::Eval(args) => {
            let mut eval = RenderEval::new(
                transport,
                args.range.base,
                args.range.from,
                args.range.until,
                &args.expression,
                args.max_null_points,
            )?
            .with_format(args.range.format);
            if let Some(credentials) = credentials {
                eval = eval.with_credentials(credentials);
            }
            let results = eval.eval().await?;
            print_json(&results)
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init_logger("graphite_api_client=info") {
        eprintln!("{e}");
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "command failed");
        std::process::exit(1);
    }
}
