//! Container listing parsed from `docker ps --format "{{.Names}}: {{.Status}}"`.
//!
//! Pure functions only.

use gateway_common::ButtonState;

/// `docker ps` status prefixes for a live container.
const RUNNING_MARKER: &str = "Up";
/// Status prefixes of containers that are not running and will not be.
const TERMINAL_MARKERS: &[&str] = &["Exited", "Created", "Dead"];

/// One line of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub name: String,
    pub status: String,
}

impl ContainerStatus {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status.starts_with(RUNNING_MARKER)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        TERMINAL_MARKERS.iter().any(|m| self.status.starts_with(m))
    }
}

/// One poll of the managed network, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSnapshot {
    pub containers: Vec<ContainerStatus>,
}

impl ContainerSnapshot {
    /// Parse `name: status` lines. Blank lines and lines without the
    /// delimiter are ignored.
    #[must_use]
    pub fn parse(stdout: &str) -> Self {
        let containers = stdout
            .lines()
            .filter_map(|line| {
                let (name, status) = line.split_once(": ")?;
                let name = name.trim();
                (!name.is_empty()).then(|| ContainerStatus {
                    name: name.to_string(),
                    status: status.trim().to_string(),
                })
            })
            .collect();
        Self { containers }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Classify the snapshot into the button the UI should offer.
    ///
    /// No containers, or every container stopped, offers `Start`. Exactly
    /// `expected` containers, all running, offers `Stop`. Anything else is a
    /// transitional mix and yields `None`.
    #[must_use]
    pub fn classify(&self, expected: usize) -> Option<ButtonState> {
        if self.containers.iter().all(ContainerStatus::is_terminal) {
            return Some(ButtonState::Start);
        }
        let all_running = self.containers.iter().all(ContainerStatus::is_running);
        if self.containers.len() == expected && all_running {
            return Some(ButtonState::Stop);
        }
        None
    }

    /// Render back to the listing format, one container per line.
    #[must_use]
    pub fn render(&self) -> String {
        self.containers
            .iter()
            .map(|c| format!("{}: {}", c.name, c.status))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
