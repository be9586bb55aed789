use anyhow::Result;
use campaignforge_cli::PostResult;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Prints `value` in a machine format; `false` means the caller renders it for humans.
    pub fn print_structured<T: Serialize>(self, value: &T) -> Result<bool> {
        match self {
            OutputFormat::Human => Ok(false),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value)?);
                Ok(true)
            }
            OutputFormat::Yaml => {
                print!("{}", serde_yaml::to_string(value)?);
                Ok(true)
            }
        }
    }
}

pub fn print_post_result(result: &PostResult, output: OutputFormat) -> Result<()> {
    if output.print_structured(result)? {
        return Ok(());
    }
    let mark = if result.success { "✅" } else { "❌" };
    println!("{mark} {}", result.message);
    if let Some(status) = result.status_code {
        println!("   HTTP status: {status}");
    }
    if let Some(data) = &result.data {
        if let Some(stages) = data.get("stages").and_then(|stages| stages.as_array()) {
            let names: Vec<&str> = stages.iter().filter_map(|stage| stage.as_str()).collect();
            println!("   Stages: {}", names.join(" → "));
        }
        if let Some(verification) = data.get("verification") {
            println!("   Verification: {verification}");
        }
    }
    Ok(())
}
