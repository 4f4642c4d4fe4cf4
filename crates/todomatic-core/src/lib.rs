pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod filter;
pub mod ids;
pub mod render;
pub mod seed;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;
use std::io::{
  self,
  IsTerminal
};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting todomatic"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .iter()
        .map(|kv| {
          (
            kv.key.clone(),
            kv.value.clone()
          )
        })
    )
  );

  let seed_path = cli
    .seed
    .clone()
    .or_else(|| cfg.seed_path());
  let initial = seed::load_or_default(
    seed_path.as_deref()
  )
  .context(
    "failed to load initial tasks"
  )?;

  let filter = match cli.filter.as_deref()
  {
    | Some(raw) => {
      commands::canonical_filter_name(
        raw
      )
      .parse::<filter::FilterName>()?
    }
    | None => cfg.default_filter()?
  };

  let ids = ids::build_generator(
    cfg.id_strategy()?,
    &cfg.id_prefix(),
    initial.iter().map(|task| &task.id)
  )
  .context(
    "failed to set up task ids"
  )?;

  let mut todo = app::TodoApp::with_filter(
    initial, ids, filter
  );
  let renderer =
    render::Renderer::new(&cfg)?;

  let stdout = io::stdout();
  let mut out = stdout.lock();
  let scripted = cli.scripted_commands();
  if scripted.is_empty() {
    let stdin = io::stdin();
    let prompt =
      stdin.is_terminal();
    let stderr = io::stderr();
    commands::run_session(
      &mut todo,
      &renderer,
      stdin.lock(),
      &mut out,
      &mut stderr.lock(),
      prompt
    )?;
  } else {
    commands::run_script(
      &mut todo,
      &renderer,
      &scripted,
      &mut out
    )?;
  }

  info!("done");
  Ok(())
}
