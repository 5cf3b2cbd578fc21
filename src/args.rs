use clap::{Parser, Subcommand};

/// This is a program to find the most convenient dates for a small group.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the poll: month, holidays, data file.
    /// Without it, the poll is January 2026 with the 1st and 2nd as holidays.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The CSV file holding the submissions. Setting this option overrides
    /// the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub data: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Lists the dates that can be chosen.
    Dates,

    /// Saves the choice of a participant, replacing any previous one.
    Submit {
        /// The name of the participant. Names are compared exactly.
        #[clap(short, long, value_parser)]
        name: String,
        /// (YYYY-MM-DD, up to 3 times) A chosen date. No date clears the choice.
        #[clap(long = "date", value_parser)]
        dates: Vec<String>,
    },

    /// Adds a date to the previous choice of a participant, or removes it if it was chosen.
    Toggle {
        #[clap(short, long, value_parser)]
        name: String,
        /// (YYYY-MM-DD) The date to add or remove.
        #[clap(long, value_parser)]
        date: String,
    },

    /// Shows the current choice of a participant.
    Show {
        #[clap(short, long, value_parser)]
        name: String,
    },

    /// Shows the votes for every date.
    Report {
        /// (default 3) The number of dates in the podium.
        #[clap(long, value_parser)]
        top: Option<usize>,
        /// (file path, 'stdout' or empty) If specified, the report will be written in JSON format
        /// to the given location.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference file containing a report in JSON format. If provided, dpoll will
        /// check that the report matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },

    /// Manages the stored submissions.
    Admin {
        /// The shared administration password.
        #[clap(short, long, value_parser)]
        password: String,
        #[clap(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AdminAction {
    /// Lists every stored submission.
    List,
    /// Removes the submissions of the given participants.
    Delete {
        #[clap(short, long = "name", value_parser, required = true)]
        names: Vec<String>,
    },
    /// Removes every submission. This cannot be undone.
    Clear,
    /// Writes a copy of the submissions table.
    Export {
        /// (file path or 'stdout')
        #[clap(short, long, value_parser)]
        out: String,
    },
}
