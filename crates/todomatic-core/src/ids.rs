use std::str::FromStr;

use anyhow::{Context, anyhow};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::task::TaskId;

pub const DEFAULT_ID_PREFIX: &str = "todo-";

/// Source of fresh task identifiers.
///
/// Implementations only promise that no id is handed out twice during the
/// lifetime of the generator; callers must not rely on ordering.
pub trait IdGenerator {
    fn next_id(&mut self) -> TaskId;
}

#[derive(Debug, Clone)]
pub struct UuidIdGenerator {
    prefix: String,
}

impl UuidIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for UuidIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX)
    }
}

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> TaskId {
        let id = TaskId::new(format!("{}{}", self.prefix, Uuid::new_v4().simple()));
        trace!(%id, "issued uuid task id");
        id
    }
}

/// Deterministic counter-based ids, `<prefix><n>` starting at `start`.
///
/// Once `u64::MAX` has been issued the counter is spent and later ids use a
/// uuid suffix, which is wider than any counter value and so cannot collide.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: Option<u64>,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>, start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: Some(start),
        }
    }

    /// Starts past every `<prefix><n>` id already present in `existing`, so
    /// seeded ids such as `todo-0..todo-2` are never reissued.
    pub fn after_existing<'a, I>(prefix: impl Into<String>, existing: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = &'a TaskId>,
    {
        let prefix = prefix.into();
        let highest = existing
            .into_iter()
            .filter_map(|id| id.as_str().strip_prefix(prefix.as_str()))
            .filter_map(|n| n.parse::<u64>().ok())
            .max();
        let start = match highest {
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| anyhow!("no sequential ids left after {prefix}{max}"))?,
            None => 0,
        };
        Ok(Self::new(prefix, start))
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> TaskId {
        let id = match self.next {
            Some(n) => {
                self.next = n.checked_add(1);
                TaskId::new(format!("{}{}", self.prefix, n))
            }
            None => {
                warn!(prefix = %self.prefix, "sequential ids exhausted; using uuid suffix");
                TaskId::new(format!("{}{}", self.prefix, Uuid::new_v4().simple()))
            }
        };
        trace!(%id, "issued sequential task id");
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    Uuid,
    Sequential,
}

impl FromStr for IdStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(Self::Uuid),
            "sequential" => Ok(Self::Sequential),
            other => Err(anyhow!("invalid id.generator setting: {other}")),
        }
    }
}

/// Builds the configured generator. Sequential generators skip past ids
/// already used by the initial tasks.
pub fn build_generator<'a, I>(
    strategy: IdStrategy,
    prefix: &str,
    existing: I,
) -> anyhow::Result<Box<dyn IdGenerator>>
where
    I: IntoIterator<Item = &'a TaskId>,
{
    let ids: Box<dyn IdGenerator> = match strategy {
        IdStrategy::Uuid => Box::new(UuidIdGenerator::new(prefix)),
        IdStrategy::Sequential => Box::new(
            SequentialIdGenerator::after_existing(prefix, existing)
                .context("cannot continue sequential ids past the initial tasks")?,
        ),
    };
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{IdGenerator, IdStrategy, SequentialIdGenerator, UuidIdGenerator, build_generator};
    use crate::task::TaskId;

    #[test]
    fn uuid_ids_are_prefixed_and_distinct() {
        let mut ids = UuidIdGenerator::default();
        let issued: Vec<TaskId> = (0..500).map(|_| ids.next_id()).collect();
        let unique: HashSet<&TaskId> = issued.iter().collect();

        assert_eq!(unique.len(), issued.len());
        assert!(issued.iter().all(|id| id.as_str().starts_with("todo-")));
    }

    #[test]
    fn sequential_skips_existing_ids() {
        let existing = [TaskId::from("todo-0"), TaskId::from("todo-7"), TaskId::from("other")];
        let mut ids = SequentialIdGenerator::after_existing("todo-", existing.iter()).unwrap();

        assert_eq!(ids.next_id().as_str(), "todo-8");
        assert_eq!(ids.next_id().as_str(), "todo-9");
    }

    #[test]
    fn sequential_rejects_seed_at_counter_limit() {
        let existing = [TaskId::from("todo-18446744073709551615")];
        assert!(SequentialIdGenerator::after_existing("todo-", existing.iter()).is_err());

        let err = build_generator(IdStrategy::Sequential, "todo-", existing.iter())
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("todo-18446744073709551615"));
    }

    #[test]
    fn sequential_stays_unique_past_the_last_counter_value() {
        let mut ids = SequentialIdGenerator::new("n-", u64::MAX);
        let last = ids.next_id();
        let after = ids.next_id();
        let again = ids.next_id();

        assert_eq!(last.as_str(), "n-18446744073709551615");
        assert!(after.as_str().starts_with("n-"));
        assert_ne!(after, last);
        assert_ne!(after, again);
        assert_ne!(after.as_str(), "n-0");
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("UUID".parse::<IdStrategy>().unwrap(), IdStrategy::Uuid);
        assert_eq!("sequential".parse::<IdStrategy>().unwrap(), IdStrategy::Sequential);
        assert!("nanoid".parse::<IdStrategy>().is_err());
        assert!("seq".parse::<IdStrategy>().is_err());
    }
}
