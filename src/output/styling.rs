use std::fmt::Display;

use console::{Style, StyledObject};

/// Terminal style for a node status class, in step with the SVG stylesheet.
///
/// Only the first classifier counts, so `"running warn"` styles like `"running"`.
pub fn status_style(class: &str) -> Style {
    match class.split_whitespace().next().unwrap_or_default() {
        "running" => Style::new().yellow().bright(),
        "success" => Style::new().green().bright(),
        "failure" => Style::new().red().bright(),
        _ => Style::new().dim(),
    }
}

fn paint(style: Style, text: impl Display) -> StyledObject<String> {
    style.apply_to(text.to_string())
}

pub fn bright_yellow(text: impl Display) -> StyledObject<String> {
    paint(status_style("running"), text)
}

pub fn bright_green(text: impl Display) -> StyledObject<String> {
    paint(status_style("success"), text)
}

pub fn bright_red(text: impl Display) -> StyledObject<String> {
    paint(status_style("failure"), text)
}

pub fn dim(text: impl Display) -> StyledObject<String> {
    paint(status_style("stopped"), text)
}

pub fn cyan(text: impl Display) -> StyledObject<String> {
    paint(Style::new().cyan(), text)
}

pub fn bright(text: impl Display) -> StyledObject<String> {
    paint(Style::new().bright(), text)
}

pub fn magenta_bold(text: impl Display) -> StyledObject<String> {
    paint(Style::new().magenta().bold(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forced(class: &str) -> String {
        status_style(class)
            .force_styling(true)
            .apply_to("x")
            .to_string()
    }

    #[test]
    fn test_emphasis_class_does_not_change_style() {
        assert_eq!(forced("running warn"), forced("running"));
    }

    #[test]
    fn test_statuses_are_distinct() {
        assert_ne!(forced("running"), forced("success"));
        assert_ne!(forced("success"), forced("failure"));
        assert_ne!(forced("failure"), forced("stopped"));
    }

    #[test]
    fn test_unknown_status_is_dimmed() {
        assert_eq!(forced("aborted"), forced("stopped"));
        assert_eq!(forced(""), forced("stopped"));
    }
}
