use serde_json::json;

use crate::cli::utils::output_error;
use crate::cli::OutputFormat;
use crate::session::Taxonomy;

pub async fn handle(type_id: Option<u32>, output_format: OutputFormat) -> anyhow::Result<()> {
    let taxonomy = Taxonomy::standard();

    match type_id {
        None => match output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(taxonomy)?),
            OutputFormat::Text => {
                for (id, names) in taxonomy.iter() {
                    println!("{}: {}", id, names.join(", "));
                }
            }
        },
        Some(id) => match taxonomy.names(id) {
            Some(names) => match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "type_id": id, "names": names }))?),
                OutputFormat::Text => println!("{}", names.join(", ")),
            },
            None => {
                output_error(&output_format, &format!("Unknown content type {}", id), Some("UNKNOWN_TYPE"))?;
                return Err(anyhow::anyhow!("Unknown content type {}", id));
            }
        },
    }

    Ok(())
}
