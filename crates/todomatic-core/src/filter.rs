use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::task::Task;

pub type Predicate = fn(&Task) -> bool;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
pub enum FilterName {
  #[default]
  All,
  Active,
  Completed
}

impl FilterName {
  pub const ALL: [FilterName; 3] = [
    FilterName::All,
    FilterName::Active,
    FilterName::Completed
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | FilterName::All => "All",
      | FilterName::Active => "Active",
      | FilterName::Completed => {
        "Completed"
      }
    }
  }

  pub fn predicate(self) -> Predicate {
    match self {
      | FilterName::All => keep_all,
      | FilterName::Active => {
        keep_active
      }
      | FilterName::Completed => {
        keep_completed
      }
    }
  }
}

impl fmt::Display for FilterName {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FilterName {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    FilterName::ALL
      .into_iter()
      .find(|name| name.as_str() == s)
      .ok_or_else(|| {
        anyhow!(
          "unknown filter: {s} \
           (expected All, Active or \
           Completed)"
        )
      })
  }
}

fn keep_all(_task: &Task) -> bool {
  true
}

fn keep_active(task: &Task) -> bool {
  task.is_active()
}

fn keep_completed(
  task: &Task
) -> bool {
  task.completed
}

pub fn names() -> [FilterName; 3] {
  FilterName::ALL
}

pub fn predicate_for(
  name: FilterName
) -> Predicate {
  name.predicate()
}

/// One selectable filter as shown to
/// the user, with whether it is the
/// active one.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct FilterOption {
  pub name:    FilterName,
  pub pressed: bool
}

#[derive(
  Debug, Clone, Copy, Default,
)]
pub struct FilterEngine {
  active: FilterName
}

impl FilterEngine {
  pub fn new(
    active: FilterName
  ) -> Self {
    Self {
      active
    }
  }

  pub fn active(&self) -> FilterName {
    self.active
  }

  pub fn predicate(&self) -> Predicate {
    self.active.predicate()
  }

  /// Returns `true` when the active
  /// filter changed.
  #[tracing::instrument(skip(self))]
  pub fn set_filter(
    &mut self,
    name: FilterName
  ) -> bool {
    if self.active == name {
      debug!(
        filter = %name,
        "filter already active"
      );
      return false;
    }
    debug!(
      from = %self.active,
      to = %name,
      "switching filter"
    );
    self.active = name;
    true
  }

  pub fn set_filter_by_name(
    &mut self,
    raw: &str
  ) -> anyhow::Result<bool> {
    let name = raw.parse()?;
    Ok(self.set_filter(name))
  }

  pub fn options(
    &self
  ) -> Vec<FilterOption> {
    names()
      .into_iter()
      .map(|name| {
        FilterOption {
          name,
          pressed: name == self.active
        }
      })
      .collect()
  }
}
