use std::fmt;

use git_version::git_version;

// -modified marks builds from a dirty working tree
const COMMIT: &str = git_version!(args = ["--abbrev=10", "--always", "--dirty=-modified"]);

/// Version details baked in at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: String,
    pub commit: &'static str,
    pub profile: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: describe_version(
                option_env!("RELEASE_VERSION").unwrap_or(""),
                option_env!("LATEST_TAG").unwrap_or(""),
                option_env!("COMMITS_AHEAD").unwrap_or(""),
            ),
            commit: COMMIT,
            profile: if cfg!(debug_assertions) { "Dev" } else { "Release" },
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {}\nCommit: {}\n{} build",
            self.name,
            env!("CARGO_PKG_VERSION"),
            self.version,
            self.commit,
            self.profile
        )
    }
}

fn describe_version(release: &str, latest: &str, ahead: &str) -> String {
    match (release, latest, ahead) {
        (tag, _, _) if !tag.is_empty() => format!("release {tag}"),
        (_, "", _) => "development".to_string(),
        (_, latest, "") => format!("development branch ahead of {latest}"),
        (_, latest, ahead) => format!("development branch {ahead} commits ahead of {latest}"),
    }
}

pub fn get_system_info() -> String {
    BuildInfo::current().to_string()
}
