use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use crate::calc::Calculation;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    calculation: &'a Calculation,
}

pub fn generate_console_report(out: &mut dyn Write, calculation: &Calculation) -> Result<()> {
    writeln!(
        out,
        "{} {}",
        calculation.mode.bright_cyan().bold(),
        calculation.input.escape_debug()
    )?;
    writeln!(out, "{}", "=".repeat(30).cyan())?;
    writeln!(out, "{}", calculation.value.green().bold())?;

    for detail in &calculation.details {
        writeln!(out, "  {:10} {}", detail.label, detail.value.escape_debug())?;
    }

    if !calculation.rolls.is_empty() {
        let rolls: Vec<String> = calculation.rolls.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", "🎲 Rolls".bright_yellow().bold())?;
        writeln!(out, "  {}", rolls.join(", "))?;
        #[allow(clippy::cast_precision_loss)]
        let mean =
            calculation.rolls.iter().sum::<i64>() as f64 / calculation.rolls.len() as f64;
        writeln!(out, "  mean       {mean:.2}")?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, calculation: &Calculation) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        calculation,
    };
    let json_output = serde_json::to_string_pretty(&report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}
