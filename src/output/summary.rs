use std::fmt::Write;

use chrono::Local;
use comfy_table::{Cell, Color as TableColor};

use crate::graph::status_class;
use crate::model::{Job, Snapshot};

use super::styling::{bright, bright_yellow, cyan, dim, status_style};
use super::tables::{color_coded_status_cell, create_cyan_header, create_table};

/// Prints a colour-coded table of every job in a flow snapshot to stdout.
///
/// Displays:
/// - Overview: flow name, job count, running and failed counts
/// - Jobs: status class, latest build, duration and upstream jobs, in flow order
pub fn print_status(flow: &str, snapshot: &Snapshot) {
    println!("{}", render_status(flow, snapshot));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn count_with_status(snapshot: &Snapshot, status: &str) -> usize {
    snapshot
        .iter()
        .filter(|(_, job)| job.status() == Some(status))
        .count()
}

fn build_cell(job: &Job) -> Cell {
    match &job.build {
        Some(build) => Cell::new(format!("#{}\n{}", build.number, build.full_url)),
        None => Cell::new("—").fg(TableColor::DarkGrey),
    }
}

fn duration_cell(job: &Job) -> Cell {
    match (&job.build, job.duration()) {
        (Some(_), Some(duration)) => Cell::new(format!("{duration}sec")),
        _ => Cell::new("—").fg(TableColor::DarkGrey),
    }
}

fn render_status(flow: &str, snapshot: &Snapshot) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let running = count_with_status(snapshot, "running");
    let failed = count_with_status(snapshot, "failure");
    let failed_display = if failed > 0 {
        status_style("failure").apply_to(failed)
    } else {
        status_style("success").apply_to(failed)
    };

    let _ = write!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        dim("Flow:"),
        cyan(flow),
        dim("Jobs:"),
        bright_yellow(snapshot.len()),
        dim("Running:"),
        status_style("running").apply_to(running),
        dim("Failed:"),
        failed_display,
        dim("Fetched:"),
        dim(Local::now().format("%Y-%m-%d %H:%M:%S"))
    );

    if snapshot.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No jobs found for this flow."));
        return output;
    }

    add_section_header(&mut output, "🔧", "Jobs");

    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Job", "Status", "Build", "Duration", "Upstream",
    ]));

    for (id, job) in snapshot.iter() {
        let name = if job.name.is_empty() || job.name == id {
            id.to_string()
        } else {
            format!("{}\n{}", job.name, dim(id))
        };
        let upstream = if job.previous.is_empty() {
            Cell::new("None").fg(TableColor::DarkGrey)
        } else {
            Cell::new(job.previous.join("\n"))
        };

        table.add_row(vec![
            Cell::new(name),
            color_coded_status_cell(&status_class(job)),
            build_cell(job),
            duration_cell(job),
            upstream,
        ]);
    }

    let _ = writeln!(output, "{table}");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{build, job};

    fn flow() -> Snapshot {
        [
            Job {
                status: Some("success".to_string()),
                build: Some(build("http://ci/job/compile/7/", 7)),
                duration: Some(42.0),
                ..job("compile")
            },
            Job {
                status: Some("running".to_string()),
                previous: vec!["compile".to_string()],
                ..job("test")
            },
            Job {
                status: Some("failure".to_string()),
                duration: Some(9.0),
                previous: vec!["compile".to_string(), "test".to_string()],
                ..job("package")
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_render_status_lists_every_job() {
        console::set_colors_enabled(false);
        let out = render_status("nightly", &flow());

        assert!(out.contains("Flow: nightly"));
        assert!(out.contains("Jobs: 3"));
        assert!(out.contains("Running: 1"));
        assert!(out.contains("Failed: 1"));
        assert!(out.contains("compile"));
        assert!(out.contains("running warn"));
        assert!(out.contains("#7"));
        assert!(out.contains("42sec"));
    }

    #[test]
    fn test_duration_requires_build() {
        console::set_colors_enabled(false);
        let out = render_status("nightly", &flow());
        assert!(!out.contains("9sec"));
    }

    #[test]
    fn test_render_empty_flow() {
        console::set_colors_enabled(false);
        let out = render_status("nightly", &Snapshot::default());
        assert!(out.contains("No jobs found"));
        assert!(!out.contains("Jobs\n"));
    }
}
