// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Link-time registry of tracing targets declared across the workspace

use crate::LevelFilter;
use linkme::distributed_slice;

/// A tracing target declaration, as emitted by [`trace_target!`] or [`custom_target!`].
pub struct TargetDecl {
    pub(crate) target: &'static str,
    pub(crate) name: &'static str,
    pub(crate) level: LevelFilter,
    pub(crate) tags: &'static [&'static str],
}
impl TargetDecl {
    #[must_use]
    pub const fn new(
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        tags: &'static [&'static str],
    ) -> Self {
        Self {
            target,
            name,
            level,
            tags,
        }
    }
}

#[distributed_slice]
pub static DECLARED_TARGETS: [TargetDecl];

#[doc(hidden)]
#[macro_export]
macro_rules! target_decl_deps {
    () => {
        use linkme::distributed_slice;
        use $crate::LevelFilter;
        use $crate::targets::{DECLARED_TARGETS, TargetDecl};
    };
}

/// Declare the tracing target of the calling module (its `module_path!()`), giving it a
/// human-friendly name, a default level and a set of tags.
#[macro_export]
macro_rules! trace_target {
    // The declaration lives in its own const scope so that the macro can be invoked more than
    // once per crate without the statics clashing.
    ($name:expr, $level:expr, $tags:expr) => {
        const _: () = {
            $crate::target_decl_deps!();

            #[distributed_slice(DECLARED_TARGETS)]
            static DECL: TargetDecl = TargetDecl::new(module_path!(), $name, $level, $tags);
        };
    };
}

/// Declare a tracing target that is not a module path, e.g. that of a third-party crate.
#[macro_export]
macro_rules! custom_target {
    ($target:expr, $level:expr, $tags:expr) => {
        const _: () = {
            $crate::target_decl_deps!();

            #[distributed_slice(DECLARED_TARGETS)]
            static DECL: TargetDecl = TargetDecl::new($target, $target, $level, $tags);
        };
    };
}
