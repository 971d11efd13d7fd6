use shared_types::*;
use std::fs;
use std::path::PathBuf;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the result types
    let mut types = Vec::new();

    // Extraction types
    types.push(clean_type(FinancialExtraction::export_to_string()?));
    types.push(clean_type(ExtractionStatus::export_to_string()?));

    // Session types
    types.push(clean_type(SessionStatus::export_to_string()?));
    types.push(clean_type(MessageRole::export_to_string()?));
    types.push(clean_type(AgentSession::export_to_string()?));
    types.push(clean_type(AgentMessage::export_to_string()?));

    types.push(clean_type(ErrorResponse::export_to_string()?));

    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bindings"));
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            // Everything lands in one file, so cross-type imports are dropped
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
