use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_error;
use crate::cli::OutputFormat;
use crate::router::{PathRouter, Rewrite};

#[derive(Subcommand)]
pub enum RouteCommands {
    #[command(about = "List rewrite rules in match order")]
    List,

    #[command(about = "Show where a client request path is forwarded")]
    Resolve {
        #[arg(help = "Client request path, e.g. /api/vod_list?page=2")]
        path: String,
    },
}

pub async fn handle(cmd: RouteCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let router = PathRouter::from_config()?;

    match cmd {
        RouteCommands::List => {
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "rules": router.rules() }))?);
                }
                OutputFormat::Text => {
                    for (index, rule) in router.rules().iter().enumerate() {
                        let rewrite = match &rule.rewrite {
                            Rewrite::Strip => "(strip)".to_string(),
                            Rewrite::Replace(segment) => segment.clone(),
                        };
                        println!("{:>2}. {:<18} -> {:<18} {}", index + 1, rule.match_prefix, rewrite, rule.target_base);
                    }
                }
            }
            Ok(())
        }
        RouteCommands::Resolve { path } => match router.resolve(&path) {
            Some(resolved) => {
                match output_format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({
                        "request": path,
                        "origin": resolved.origin,
                        "path": resolved.path,
                        "url": resolved.url(),
                    }))?),
                    OutputFormat::Text => println!("{} -> {}", path, resolved.url()),
                }
                Ok(())
            }
            None => {
                output_error(&output_format, &format!("No rule matches '{}'", path), Some("NO_ROUTE"))?;
                Err(anyhow::anyhow!("No rule matches '{}'", path))
            }
        },
    }
}
