//! Sample graph descriptions for tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Graph descriptions covering the interesting linting and hashing shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFixture {
    /// `App` and its `Feature` framework both link the static `Core` library.
    DuplicateStaticLink,
    /// A unit test bundle hosted by `App` links the same static library as the app.
    HostedTests,
    /// `A` and `B` depend on each other.
    Circular,
}

impl GraphFixture {
    #[must_use]
    pub const fn content(self) -> &'static str {
        match self {
            Self::DuplicateStaticLink => {
                r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [{ target = "Feature" }, { target = "Core" }]

[[projects.targets]]
name = "Feature"
product = "framework"
platform = "ios"
dependencies = [{ target = "Core" }]

[[projects.targets]]
name = "Core"
product = "static_library"
platform = "ios"
"#
            }
            Self::HostedTests => {
                r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [{ target = "Core" }]

[[projects.targets]]
name = "AppTests"
product = "unit_tests"
platform = "ios"
dependencies = [{ target = "App" }, { target = "Core" }]

[[projects.targets]]
name = "Core"
product = "static_library"
platform = "ios"
"#
            }
            Self::Circular => {
                r#"
[[projects]]
path = "Cycle"

[[projects.targets]]
name = "A"
product = "framework"
platform = "macos"
dependencies = [{ target = "B" }]

[[projects.targets]]
name = "B"
product = "framework"
platform = "macos"
dependencies = [{ target = "A" }]
"#
            }
        }
    }

    /// Write the description to `dir/graph.toml`, returning its path.
    pub fn write_to(self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        let path = dir.join("graph.toml");
        fs::write(&path, self.content().trim_start())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
