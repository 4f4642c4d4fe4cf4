use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::filter::FilterOption;
use crate::view::DerivedView;

pub const FOCUS_MARKER: &str = "> ";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// Colors output only when `color` is on and stdout is a terminal.
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color()? && io::stdout().is_terminal();
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn print_filters<W: Write>(
        &self,
        out: &mut W,
        options: &[FilterOption],
    ) -> anyhow::Result<()> {
        let labels: Vec<String> = options
            .iter()
            .map(|opt| {
                if opt.pressed {
                    self.paint(&format!("[{}]", opt.name), "1")
                } else {
                    format!(" {} ", opt.name)
                }
            })
            .collect();
        writeln!(out, "Show: {}", labels.join(" "))?;
        Ok(())
    }

    /// Writes the heading followed by the visible rows, numbered from 1 so the
    /// numbers can be used as task references.
    #[tracing::instrument(skip_all, fields(count = view.count))]
    pub fn print_view<W: Write>(&self, out: &mut W, view: &DerivedView) -> anyhow::Result<()> {
        writeln!(out, "{}", view.heading)?;
        if view.tasks.is_empty() {
            return Ok(());
        }

        let headers = vec![
            "#".to_string(),
            "Done".to_string(),
            "ID".to_string(),
            "Name".to_string(),
        ];

        let rows = view
            .tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                let check = if task.completed {
                    self.paint("[x]", "32")
                } else {
                    "[ ]".to_string()
                };
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    check,
                    task.id.to_string(),
                    task.name.clone(),
                ]
            })
            .collect();

        write_table(out, &headers, rows)
    }

    /// Terminal stand-in for moving keyboard focus to the list heading.
    pub fn focus_heading<W: Write>(&self, out: &mut W, heading: &str) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&format!("{FOCUS_MARKER}{heading}"), "1;4"))?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: &[String],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let last = widths.len().saturating_sub(1);

    for (idx, (header, width)) in headers.iter().zip(widths.iter().copied()).enumerate() {
        if idx == last {
            write!(writer, "{header}")?;
        } else {
            write!(writer, "{header:width$} ")?;
        }
    }
    writeln!(writer)?;

    let rules: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(writer, "{}", rules.join(" "))?;

    for row in rows {
        for (idx, (cell, width)) in row.iter().zip(widths.iter().copied()).enumerate() {
            if idx == last {
                write!(writer, "{cell}")?;
            } else {
                let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
                let padding = width.saturating_sub(visible_width);
                write!(writer, "{}{} ", cell, " ".repeat(padding))?;
            }
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{Renderer, strip_ansi};
    use crate::config::Config;
    use crate::filter::{FilterEngine, FilterName};
    use crate::store::TaskCollection;
    use crate::task::{Task, TaskId};
    use crate::view::derive_view;

    #[test]
    fn view_table_aligns_wide_names() {
        let mut done = Task::new_active(TaskId::from("todo-0"), "食べる".to_string());
        done.completed = true;
        let tasks = TaskCollection::new(vec![
            done,
            Task::new_active(TaskId::from("todo-10"), "Sleep".to_string()),
        ]);
        let view = derive_view(&tasks, FilterName::All);

        let mut out = Vec::new();
        Renderer::plain().print_view(&mut out, &view).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "2 tasks remaining\n\
             # Done ID      Name\n\
             - ---- ------- ------\n\
             1 [x]  todo-0  食べる\n\
             2 [ ]  todo-10 Sleep\n"
        );
    }

    #[test]
    fn filters_and_focus_marker() {
        let mut engine = FilterEngine::default();
        engine.set_filter(FilterName::Completed);

        let renderer = Renderer::plain();
        let mut out = Vec::new();
        renderer.print_filters(&mut out, &engine.options()).unwrap();
        renderer.focus_heading(&mut out, "1 task remaining").unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Show:  All   Active  [Completed]\n> 1 task remaining\n"
        );
    }

    #[test]
    fn color_setting_is_checked_when_building() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("color".to_string(), "off".to_string())]);
        let renderer = Renderer::new(&cfg).unwrap();
        let mut out = Vec::new();
        renderer.focus_heading(&mut out, "3 tasks remaining").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "> 3 tasks remaining\n");

        cfg.apply_overrides(vec![("color".to_string(), "purple".to_string())]);
        assert!(Renderer::new(&cfg).is_err());
    }

    #[test]
    fn strip_ansi_removes_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[33m12\x1b[0m"), "12");
    }
}
