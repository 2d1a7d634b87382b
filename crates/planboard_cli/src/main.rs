//! CLI probe for `planboard_core`.
//!
//! # Responsibility
//! - Print linkage info when run without arguments.
//! - Given a JSON file of calendar items, print conflict groups and the
//!   auto-laid-out items so layout rules can be checked by hand.

use planboard_core::{auto_layout_all_conflicts, detect_conflicts, CalendarItem};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("planboard_core ping={}", planboard_core::ping());
    println!("planboard_core version={}", planboard_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("planboard_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str) -> Result<(), String> {
    let payload =
        std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    let items: Vec<CalendarItem> = serde_json::from_str(&payload)
        .map_err(|err| format!("`{path}` is not a JSON array of items: {err}"))?;

    let groups = detect_conflicts(&items);
    let laid_out = auto_layout_all_conflicts(&items);

    let report = serde_json::json!({
        "items": items.len(),
        "conflictGroups": groups,
        "laidOut": laid_out,
    });
    let rendered =
        serde_json::to_string_pretty(&report).map_err(|err| format!("cannot render: {err}"))?;
    println!("{rendered}");
    Ok(())
}
