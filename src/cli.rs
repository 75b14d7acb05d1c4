use crate::github::DEFAULT_API_URL;
use crate::report::Format;
use crate::window::{TimeWindow, WindowError};
use chrono::NaiveDate;
use clap::Parser;

const DEFAULT_FISCAL_YEAR: i32 = 2023;

const DEFAULT_MEMBERS: [&str; 3] = ["vincerubinetti", "falquaddoomi", "d33bs"];

const DEFAULT_ORGS: [&str; 13] = [
    "cu-dbmi",
    "cytomining",
    "wayscience",
    "JRaviLab",
    "krishnanlab",
    "greenelab",
    "manubot",
    "CCPM-TIS",
    "monarch-initiative",
    "blekhmanlab",
    "tis-lab",
    "hetio",
    "biothings",
];

/// Count issues, pull requests and reviews authored by a set of GitHub users
/// across the repositories of several organizations.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Organizations whose repositories are scanned
    #[arg(long = "org", value_delimiter = ',', default_values_t = DEFAULT_ORGS.map(String::from))]
    pub orgs: Vec<String>,

    /// GitHub logins whose contributions are counted
    #[arg(long = "member", value_delimiter = ',', default_values_t = DEFAULT_MEMBERS.map(String::from))]
    pub members: Vec<String>,

    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// July 1 of the previous year through June 30 of this one
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub fiscal_year: Option<i32>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, env = "SET_EFFORT_GH_TOKEN", hide_env_values = true)]
    pub token: String,
}

impl Cli {
    /// Resolve the reporting window. Missing bounds fall back to the default
    /// fiscal year.
    pub fn window(&self) -> Result<TimeWindow, WindowError> {
        if let Some(year) = self.fiscal_year {
            return TimeWindow::fiscal_year(year);
        }
        let default = TimeWindow::fiscal_year(DEFAULT_FISCAL_YEAR)?;
        TimeWindow::new(
            self.start.unwrap_or(default.start()),
            self.end.unwrap_or(default.end()),
        )
    }
}
