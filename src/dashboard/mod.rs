//! View router, polling loop and the presentation components it dispatches to.

pub mod accounts;
pub mod generator;
pub mod notice;
pub mod overview;
pub mod payments;
pub mod router;
pub mod tester;

use std::future::Future;
use std::str::FromStr;

pub use router::{Dashboard, DashboardState, RefreshOutcome};

/// Mutually exclusive views of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Overview,
    Generator,
    Accounts,
    Payments,
    Tester,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Overview,
        View::Generator,
        View::Accounts,
        View::Payments,
        View::Tester,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Generator => "generator",
            View::Accounts => "accounts",
            View::Payments => "payments",
            View::Tester => "tester",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("Invalid view: {s}"))
    }
}

/// A line typed into `watch`: `r` retries the overview fetch, a view name switches to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Retry,
    Show(View),
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "r" | "retry" => Ok(Command::Retry),
            "q" | "quit" => Ok(Command::Quit),
            other => other
                .parse()
                .map(Command::Show)
                .map_err(|_| format!("Unknown command: {other}, expected r, q or a view name")),
        }
    }
}

/// Callback components use to ask the router for a fresh snapshot after a mutation.
pub trait Refresher: Send + Sync {
    fn request_refresh(&self) -> impl Future<Output = ()> + Send;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_parse_from_their_names() {
        for view in View::ALL {
            assert_eq!(view.to_string().parse::<View>(), Ok(view));
        }
        assert!("settings".parse::<View>().is_err());
    }

    #[test]
    fn commands_parse_from_typed_lines() {
        assert_eq!("r\n".parse::<Command>(), Ok(Command::Retry));
        assert_eq!(" retry ".parse::<Command>(), Ok(Command::Retry));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("payments".parse::<Command>(), Ok(Command::Show(View::Payments)));
        assert!("x".parse::<Command>().is_err());
    }
}
