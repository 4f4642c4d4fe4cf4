use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::app::TodoApp;
use crate::filter;
use crate::render::Renderer;
use crate::task::TaskId;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "toggle", "edit", "delete", "filter", "filters", "list", "help", "quit",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// One line of user input, already split into command and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { name: String },
    Toggle { target: String },
    Edit { target: String, name: String },
    Delete { target: String },
    Filter { name: String },
    Filters,
    List,
    Help,
    Quit,
}

impl Command {
    /// Parses a command line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (token, rest) = split_word(line);
        let known = known_command_names();
        let command = expand_command_abbrev(token, &known)
            .ok_or_else(|| anyhow!("unknown command: {token}"))?;
        debug!(token, command, "resolved command token");

        let parsed = match command {
            "add" => Self::Add {
                name: required_name(rest, "add")?,
            },
            "toggle" => Self::Toggle {
                target: required_word(rest, "toggle")?,
            },
            "edit" => {
                let (target, name) = split_word(rest);
                if target.is_empty() {
                    return Err(anyhow!("edit requires a task and a new name"));
                }
                Self::Edit {
                    target: target.to_string(),
                    name: required_name(name, "edit")?,
                }
            }
            "delete" => Self::Delete {
                target: required_word(rest, "delete")?,
            },
            "filter" => Self::Filter {
                name: required_word(rest, "filter")?,
            },
            "filters" => Self::Filters,
            "list" => Self::List,
            "help" => Self::Help,
            "quit" => Self::Quit,
            other => return Err(anyhow!("unknown command: {other}")),
        };

        Ok(Some(parsed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[instrument(skip(app, renderer, out))]
pub fn dispatch<W: Write>(
    app: &mut TodoApp,
    renderer: &Renderer,
    command: Command,
    out: &mut W,
) -> anyhow::Result<Flow> {
    match command {
        Command::Add { name } => {
            app.add_task(&name);
            show_view(app, renderer, out)?;
        }
        Command::Toggle { target } => {
            let id = resolve_task_ref(app, &target)?;
            app.toggle_task_completed(&id);
            show_view(app, renderer, out)?;
        }
        Command::Edit { target, name } => {
            let id = resolve_task_ref(app, &target)?;
            app.edit_task(&id, &name);
            show_view(app, renderer, out)?;
        }
        Command::Delete { target } => {
            let id = resolve_task_ref(app, &target)?;
            app.delete_task(&id);
            show_view(app, renderer, out)?;
        }
        Command::Filter { name } => {
            app.set_filter(&canonical_filter_name(&name))?;
            renderer.print_filters(out, &app.filter_options())?;
            show_view(app, renderer, out)?;
        }
        Command::Filters => {
            renderer.print_filters(out, &app.filter_options())?;
        }
        Command::List => {
            renderer.print_filters(out, &app.filter_options())?;
            show_view(app, renderer, out)?;
        }
        Command::Help => print_help(out)?,
        Command::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

/// Runs commands read line by line until end of input or `quit`. A failing
/// command is reported on `err` and the session carries on.
#[instrument(skip_all)]
pub fn run_session<R: BufRead, W: Write, E: Write>(
    app: &mut TodoApp,
    renderer: &Renderer,
    input: R,
    out: &mut W,
    err: &mut E,
    prompt: bool,
) -> anyhow::Result<()> {
    info!("interactive session started");
    dispatch(app, renderer, Command::List, out)?;

    if prompt {
        write_prompt(out)?;
    }
    for line in input.lines() {
        let line = line.context("failed to read command input")?;
        let flow = match run_line(app, renderer, &line, out) {
            Ok(flow) => flow,
            Err(failure) => {
                warn!(error = %failure, "command failed");
                out.flush()?;
                writeln!(err, "error: {failure:#}")?;
                Flow::Continue
            }
        };

        if flow == Flow::Quit {
            break;
        }
        if prompt {
            write_prompt(out)?;
        }
    }

    info!("interactive session finished");
    Ok(())
}

fn run_line<W: Write>(
    app: &mut TodoApp,
    renderer: &Renderer,
    line: &str,
    out: &mut W,
) -> anyhow::Result<Flow> {
    match Command::parse(line)? {
        Some(command) => dispatch(app, renderer, command, out),
        None => Ok(Flow::Continue),
    }
}

/// Runs a fixed list of commands, stopping at the first failure.
#[instrument(skip_all, fields(count = commands.len()))]
pub fn run_script<W: Write>(
    app: &mut TodoApp,
    renderer: &Renderer,
    commands: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    for line in commands {
        let Some(command) =
            Command::parse(line).with_context(|| format!("invalid command: {line}"))?
        else {
            continue;
        };
        if dispatch(app, renderer, command, out)? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// Maps user-typed filter text onto the canonical filter name, ignoring case
/// and surrounding blanks. Text that names no filter is returned trimmed and
/// left for the core to reject.
pub fn canonical_filter_name(raw: &str) -> String {
    let wanted = raw.trim();
    filter::names()
        .into_iter()
        .find(|name| name.as_str().eq_ignore_ascii_case(wanted))
        .map_or_else(|| wanted.to_string(), |name| name.as_str().to_string())
}

/// Resolves an exact task id, or a 1-based position in the visible list.
/// Ids that match nothing are passed through; the store ignores them.
pub fn resolve_task_ref(app: &TodoApp, token: &str) -> anyhow::Result<TaskId> {
    let id = TaskId::new(token);
    if app.task(&id).is_some() {
        return Ok(id);
    }

    if let Ok(position) = token.parse::<usize>() {
        let task = position
            .checked_sub(1)
            .and_then(|idx| app.visible_tasks().get(idx))
            .ok_or_else(|| anyhow!("no visible task at position {position}"))?;
        return Ok(task.id.clone());
    }

    warn!(id = %id, "no task with this id; ignoring");
    Ok(id)
}

fn show_view<W: Write>(app: &mut TodoApp, renderer: &Renderer, out: &mut W) -> anyhow::Result<()> {
    renderer.print_view(out, app.view())?;
    if app.take_focus_request() {
        renderer.focus_heading(out, app.heading_text())?;
    }
    Ok(())
}

fn write_prompt<W: Write>(out: &mut W) -> anyhow::Result<()> {
    write!(out, "todo> ")?;
    out.flush()?;
    Ok(())
}

fn print_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "commands:")?;
    writeln!(out, "  add <name>           add a new task")?;
    writeln!(out, "  toggle <task>        mark a task done / not done")?;
    writeln!(out, "  edit <task> <name>   rename a task")?;
    writeln!(out, "  delete <task>        remove a task")?;
    writeln!(out, "  filter <name>        show All, Active or Completed tasks")?;
    writeln!(out, "  filters              list the filters")?;
    writeln!(out, "  list                 show the current list")?;
    writeln!(out, "  quit                 leave")?;
    writeln!(out, "<task> is a task id or its number in the list; commands may be abbreviated")?;
    Ok(())
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text, ""),
    }
}

fn required_word(rest: &str, command: &str) -> anyhow::Result<String> {
    let (word, _) = split_word(rest);
    if word.is_empty() {
        return Err(anyhow!("{command} requires an argument"));
    }
    Ok(word.to_string())
}

fn required_name(rest: &str, command: &str) -> anyhow::Result<String> {
    if rest.trim().is_empty() {
        return Err(anyhow!("{command} requires a non-empty task name"));
    }
    Ok(rest.to_string())
}
