// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tracing runtime control.

use ordermap::{OrderMap, OrderSet};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, OnceLock};
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, Registry, filter::LevelFilter, prelude::*, reload};

use crate::targets::DECLARED_TARGETS;
use crate::trace_target;

trace_target!("tracectl", LevelFilter::INFO, &[]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceCtlError {
    #[error("Invalid tracing directive '{0}': expected tag=level")]
    BadDirective(String),
    #[error("Invalid level '{level}' for tag '{tag}'")]
    BadLevel { tag: String, level: String },
    #[error("Unknown tag '{0}'")]
    UnknownTag(String),
}

/// Configuration of a single tracing target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub target: &'static str,
    pub name: &'static str,
    pub level: LevelFilter,
    pub tags: Vec<&'static str>,
}

#[derive(Debug)]
pub(crate) struct TargetDb {
    pub(crate) default: LevelFilter,
    pub(crate) targets: OrderMap<&'static str, Target>,
    pub(crate) tags: OrderMap<&'static str, OrderSet<&'static str>>,
}

impl TargetDb {
    fn new(default: LevelFilter) -> Self {
        let mut db = Self {
            default,
            targets: OrderMap::new(),
            tags: OrderMap::new(),
        };
        for decl in DECLARED_TARGETS {
            db.register(decl.target, decl.name, decl.level, decl.tags);
        }
        db
    }

    pub(crate) fn register(
        &mut self,
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        tags: &'static [&'static str],
    ) {
        /* a target is always reachable by its own name */
        let mut all_tags = tags.to_vec();
        if !all_tags.contains(&name) {
            all_tags.push(name);
        }
        for tag in &all_tags {
            self.tags.entry(*tag).or_default().insert(target);
        }
        let entry = Target {
            target,
            name,
            level,
            tags: all_tags,
        };
        if self.targets.insert(target, entry).is_some() {
            warn!("Tracing target {target} was declared more than once");
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::new(self.default.to_string());
        for t in self.targets.values() {
            match format!("{}={}", t.target, t.level).parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => warn!("Skipping tracing target {}: {e}", t.target),
            }
        }
        filter
    }

    fn set_tag_level(&mut self, tag: &str, level: LevelFilter) -> Result<usize, TraceCtlError> {
        let Some(members) = self.tags.get(tag) else {
            return Err(TraceCtlError::UnknownTag(tag.to_string()));
        };
        let mut changed = 0;
        for member in members {
            if let Some(t) = self.targets.get_mut(member)
                && t.level != level
            {
                t.level = level;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// A configuration string that reproduces the current levels.
    pub(crate) fn as_config_string(&self) -> String {
        let mut out = format!("default={}", self.default);
        for t in self.targets.values() {
            out += &format!(",{}={}", t.name, t.level);
        }
        out
    }
}

/// Parse comma-separated `tag=level` items, where level is one of off,error,warn,info,debug,trace.
fn parse_directives(input: &str) -> Result<Vec<(String, LevelFilter)>, TraceCtlError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (tag, level) = item
                .split_once('=')
                .ok_or_else(|| TraceCtlError::BadDirective(item.to_string()))?;
            let (tag, level) = (tag.trim(), level.trim());
            let parsed = LevelFilter::from_str(level).map_err(|_| TraceCtlError::BadLevel {
                tag: tag.to_string(),
                level: level.to_string(),
            })?;
            Ok((tag.to_string(), parsed))
        })
        .collect()
}

pub struct TracingControl {
    db: Mutex<TargetDb>,
    reload: Option<reload::Handle<EnvFilter, Registry>>,
}

impl TracingControl {
    fn new() -> Self {
        let db = TargetDb::new(LevelFilter::INFO);
        let (filter, handle) = reload::Layer::new(db.env_filter());
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_line_number(true)
            .with_target(true)
            .with_thread_names(true)
            .with_level(true);

        /* another subscriber may already be installed (e.g. by test harnesses) */
        let reload = match tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
        {
            Ok(()) => Some(handle),
            Err(e) => {
                eprintln!("Tracing subscriber not installed: {e}");
                None
            }
        };
        Self {
            db: Mutex::new(db),
            reload,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TargetDb> {
        self.db.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn reload(&self, db: &TargetDb) {
        if let Some(handle) = &self.reload
            && let Err(e) = handle.reload(db.env_filter())
        {
            error!("Failed to reload tracing filter: {e}");
        }
    }

    #[cfg(test)]
    pub(crate) fn register(
        &self,
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        tags: &'static [&'static str],
    ) {
        let mut db = self.lock();
        db.register(target, name, level, tags);
        self.reload(&db);
    }
}

static TRACING_CTL: OnceLock<TracingControl> = OnceLock::new();

/// Get the process-wide [`TracingControl`], installing the subscriber on first use.
pub fn get_trace_ctl() -> &'static TracingControl {
    TRACING_CTL.get_or_init(TracingControl::new)
}

impl TracingControl {
    pub fn default_level(&self) -> LevelFilter {
        self.lock().default
    }

    pub fn set_default_level(&self, level: LevelFilter) {
        let mut db = self.lock();
        if db.default != level {
            db.default = level;
            self.reload(&db);
            info!("Default tracing level is now {level}");
        }
    }

    pub fn set_level_all(&self, level: LevelFilter) {
        let mut db = self.lock();
        db.targets.values_mut().for_each(|t| t.level = level);
        self.reload(&db);
    }

    pub fn set_tag_level(&self, tag: &str, level: LevelFilter) -> Result<(), TraceCtlError> {
        let mut db = self.lock();
        let changed = db.set_tag_level(tag, level)?;
        if changed > 0 {
            self.reload(&db);
        }
        debug!("Tag '{tag}' set to {level}: {changed} targets changed");
        Ok(())
    }

    /// Apply a configuration like `default=warn,all=info,engine=debug`.
    ///
    /// `default` sets the level of undeclared targets and `all` that of every declared target;
    /// any other item names a tag. Items are applied in order so later ones override.
    pub fn setup_from_string(&self, input: &str) -> Result<(), TraceCtlError> {
        let directives = parse_directives(input)?;
        for (tag, level) in directives {
            match tag.as_str() {
                "default" => self.set_default_level(level),
                "all" => self.set_level_all(level),
                _ => self.set_tag_level(&tag, level)?,
            }
        }
        Ok(())
    }

    pub fn target(&self, target: &str) -> Option<Target> {
        self.lock().targets.get(target).cloned()
    }

    pub fn targets_by_tag(&self, tag: &str) -> Vec<Target> {
        let db = self.lock();
        db.tags
            .get(tag)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|m| db.targets.get(m).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn as_config_string(&self) -> String {
        self.lock().as_config_string()
    }

    pub fn dump(&self) {
        let db = self.lock();
        info!("{db}");
    }
}
