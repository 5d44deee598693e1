use std::io::{self, Write};
use std::path::PathBuf;

use polars::prelude::{AnyValue, Column, DataFrame};
use project_planner::{
    Assembly, AssemblyOutcome, DecodeOptions, ProjectPlan, Schedule, ScheduleAssembler, TaskId,
    load_schedule_from_xml, load_schedules, read_config, save_schedule_report_csv,
    save_schedule_to_xml,
};
use tracing_subscriber::EnvFilter;

fn cell_text(col: &Column, row_idx: usize) -> String {
    match col.get(row_idx) {
        Ok(AnyValue::Null) => String::new(),
        Ok(AnyValue::Int64(v)) => v.to_string(),
        Ok(AnyValue::String(s)) => s.to_string(),
        Ok(AnyValue::List(inner)) => match inner.str() {
            Ok(ca) => ca.into_iter().flatten().collect::<Vec<_>>().join(","),
            Err(_) => inner.to_string(),
        },
        Ok(av) => av.to_string(),
        Err(_) => String::new(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| columns.iter().map(|col| cell_text(col, row_idx)).collect())
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, s) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(s);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  default [name]                     Assemble the default four-phase plan\n  plan <response_file> [name]        Assemble a plan from saved model output\n  load <xml>                         Load and schedule a project document\n  show                               Show current schedule\n  summary                            One-line schedule summary\n  task <id>                          Show one task\n  save <xml|csv> <path>              Write the document or a CSV report\n  batch <xml>...                     Summarize several documents\n  quit|exit                          Exit"
    );
}

fn print_schedule(schedule: &Schedule) {
    match schedule.task_table() {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error: {}", e),
    }
}

fn report_assembly(assembly: &Assembly) {
    match &assembly.outcome {
        AssemblyOutcome::Remote { project_id } => {
            println!("Schedule published remotely as {}.", project_id)
        }
        AssemblyOutcome::Local { path } => println!("Schedule written to {}", path.display()),
    }
    println!("{}", assembly.schedule.summary().to_cli_summary());
    print_schedule(&assembly.schedule);
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("project_planner=info")),
        )
        .init();

    let settings = match read_config() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    let assembler = ScheduleAssembler::from_settings(&settings);
    let decode_options: DecodeOptions = settings.codec.decode_options();
    let mut current: Option<Schedule> = None;

    println!("Project Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "default" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                match assembler.assemble(&name, &ProjectPlan::default_plan()) {
                    Ok(assembly) => {
                        report_assembly(&assembly);
                        current = Some(assembly.schedule);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "plan" => {
                let Some(file) = parts.next() else {
                    println!("Usage: plan <response_file> [name]");
                    continue;
                };
                let name = parts.collect::<Vec<_>>().join(" ");
                let response = match std::fs::read_to_string(file) {
                    Ok(text) => text,
                    Err(e) => {
                        println!("Cannot read {}: {}", file, e);
                        continue;
                    }
                };
                match assembler.assemble_from_response(&name, &response) {
                    Ok(assembly) => {
                        report_assembly(&assembly);
                        current = Some(assembly.schedule);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "load" => {
                let Some(path) = parts.next() else {
                    println!("Usage: load <xml>");
                    continue;
                };
                match load_schedule_from_xml(path, &decode_options) {
                    Ok(schedule) => {
                        println!("Schedule loaded from {}", path);
                        print_schedule(&schedule);
                        current = Some(schedule);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "show" => match &current {
                Some(schedule) => print_schedule(schedule),
                None => println!("No schedule loaded."),
            },
            "summary" => match &current {
                Some(schedule) => println!(
                    "{}: {}",
                    schedule.project_name(),
                    schedule.summary().to_cli_summary()
                ),
                None => println!("No schedule loaded."),
            },
            "task" => {
                let (Some(schedule), Some(id)) = (&current, parts.next()) else {
                    println!("Usage: task <id> (with a schedule loaded)");
                    continue;
                };
                match schedule.find_task(&TaskId::from(id)) {
                    Some(task) => match serde_json::to_string_pretty(task) {
                        Ok(json) => println!("{}", json),
                        Err(e) => println!("Error: {}", e),
                    },
                    None => println!("Task {} not found.", id),
                }
            }
            "save" => {
                let (Some(format), Some(path)) = (parts.next(), parts.next()) else {
                    println!("Usage: save <xml|csv> <path>");
                    continue;
                };
                let Some(schedule) = &current else {
                    println!("No schedule loaded.");
                    continue;
                };
                let res = match format {
                    "xml" => save_schedule_to_xml(schedule, path),
                    "csv" => save_schedule_report_csv(schedule, path),
                    _ => {
                        println!("Unknown format '{}'. Use xml or csv.", format);
                        continue;
                    }
                };
                match res {
                    Ok(()) => println!("Schedule saved to {}", path),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "batch" => {
                let paths: Vec<PathBuf> = parts.map(PathBuf::from).collect();
                if paths.is_empty() {
                    println!("Usage: batch <xml>...");
                    continue;
                }
                for (path, result) in load_schedules(&paths, &decode_options) {
                    match result {
                        Ok(schedule) => println!(
                            "{}: {} ({})",
                            path.display(),
                            schedule.project_name(),
                            schedule.summary().to_cli_summary()
                        ),
                        Err(e) => println!("{}: error: {}", path.display(), e),
                    }
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
