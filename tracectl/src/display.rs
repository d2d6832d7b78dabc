// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Display implementations

use crate::control::{Target, TargetDb};
use std::fmt::{Display, Formatter, Result};

macro_rules! TARGET_FMT {
    () => {
        "{:>40} │ {:>8} │ {}"
    };
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{}",
            format_args!(TARGET_FMT!(), self.target, self.level, self.tags.join(","))
        )
    }
}

impl Display for TargetDb {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f)?;
        writeln!(f, "{:>52}", "──── Tracing targets ────")?;
        writeln!(f, "{}", format_args!(TARGET_FMT!(), "TARGET", "LEVEL", "TAGS"))?;
        for target in self.targets.values() {
            writeln!(f, "{target}")?;
        }
        write!(
            f,
            "{}",
            format_args!(TARGET_FMT!(), "(default)", self.default, "--")
        )
    }
}
