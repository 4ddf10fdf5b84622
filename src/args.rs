//! These structs provide the CLI interface for the tally CLI.

use crate::model::TransactionId;
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// tally: A command-line client for your income and expense tracker.
///
/// tally talks to a tracker service that holds your transactions and your expense categories.
/// You can see your totals and recent activity, list and filter transactions, browse categories
/// and record, change or delete transactions.
///
/// Expense categories and subcategories do not need to be set up in advance. When you save an
/// expense with a category or subcategory that does not exist yet, the service creates it.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the configuration file.
    ///
    /// This is the first command you should run. Decide what directory you want to store data in
    /// and pass this as --tally-home. By default, it will be $HOME/tally.
    Init(InitArgs),
    /// Save, check or remove the token you use to sign in to the tracker service.
    Auth(AuthArgs),
    /// Show your total income, total expenses and the most recent transactions.
    Dashboard,
    /// List income or expenses, with optional filters.
    List(ListArgs),
    /// Show expense categories, or the subcategories of one category.
    Categories(CategoriesArgs),
    /// Record new income or a new expense.
    Add(AddArgs),
    /// Change a transaction. Fields you leave out keep their current values.
    Update(UpdateArgs),
    /// Delete a transaction.
    Delete(DeleteArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where tally configuration and your token are held. Defaults to ~/tally
    #[arg(long, env = "TALLY_HOME", default_value_t = default_tally_home())]
    tally_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, tally_home: PathBuf) -> Self {
        Self {
            log_level,
            tally_home: tally_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn tally_home(&self) -> &DisplayPath {
        &self.tally_home
    }
}

/// (Not shown): Args for the `tally init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The address of the tracker service, e.g. http://127.0.0.1:5000
    #[arg(long)]
    base_url: String,
}

impl InitArgs {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// (Not shown): Args for the `tally auth` command. Exactly one of the flags is required.
#[derive(Debug, Parser, Clone)]
#[command(group(ArgGroup::new("action").required(true).args(["token", "verify", "logout"])))]
pub struct AuthArgs {
    /// The token the tracker service gave you when you signed in.
    #[arg(long)]
    token: Option<String>,

    /// Check the stored token by making a request with it.
    #[arg(long)]
    verify: bool,

    /// Remove the stored token.
    #[arg(long)]
    logout: bool,
}

impl AuthArgs {
    pub fn new(token: Option<String>, verify: bool, logout: bool) -> Self {
        Self {
            token,
            verify,
            logout,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    pub fn logout(&self) -> bool {
        self.logout
    }
}

/// (Not shown): Args for the `tally list` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    #[command(subcommand)]
    entity: ListSubcommand,
}

impl ListArgs {
    pub fn entity(&self) -> &ListSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListSubcommand {
    /// List income, newest first.
    Income(ListIncomeArgs),
    /// List expenses, newest first.
    Expenses(ListExpensesArgs),
}

/// (Not shown): Args for the `tally list income` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ListIncomeArgs {
    /// Only show income whose source contains this text, ignoring case.
    #[arg(long)]
    source: Option<String>,

    /// Only show income from this day (YYYY-MM-DD, local time).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Show at most this many.
    #[arg(long)]
    limit: Option<usize>,
}

impl ListIncomeArgs {
    pub fn new(source: Option<String>, date: Option<NaiveDate>, limit: Option<usize>) -> Self {
        Self {
            source,
            date,
            limit,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// (Not shown): Args for the `tally list expenses` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ListExpensesArgs {
    /// Only show expenses in exactly this category (case-sensitive).
    #[arg(long)]
    category: Option<String>,

    /// Only show expenses from this day (YYYY-MM-DD, local time).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Show at most this many.
    #[arg(long)]
    limit: Option<usize>,
}

impl ListExpensesArgs {
    pub fn new(category: Option<String>, date: Option<NaiveDate>, limit: Option<usize>) -> Self {
        Self {
            category,
            date,
            limit,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// (Not shown): Args for the `tally categories` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct CategoriesArgs {
    /// Show the subcategories of this category instead of the categories.
    #[arg(long)]
    category: Option<String>,

    /// Only show names containing this text, ignoring case.
    #[arg(long)]
    search: Option<String>,
}

impl CategoriesArgs {
    pub fn new(category: Option<String>, search: Option<String>) -> Self {
        Self { category, search }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

/// (Not shown): Args for the `tally add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    #[command(subcommand)]
    entity: AddSubcommand,
}

impl AddArgs {
    pub fn entity(&self) -> &AddSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AddSubcommand {
    /// Record money coming in.
    Income(AddIncomeArgs),
    /// Record money going out.
    Expense(AddExpenseArgs),
}

/// (Not shown): Args for the `tally add income` command.
#[derive(Debug, Parser, Clone)]
pub struct AddIncomeArgs {
    /// The amount, e.g. 1500 or 1,500.00
    #[arg(long)]
    amount: String,

    /// Where the money came from, e.g. Salary.
    #[arg(long)]
    source: String,

    /// A short title.
    #[arg(long)]
    title: Option<String>,

    /// A longer description.
    #[arg(long)]
    description: Option<String>,
}

impl AddIncomeArgs {
    pub fn new(
        amount: impl Into<String>,
        source: impl Into<String>,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        Self {
            amount: amount.into(),
            source: source.into(),
            title: title.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// (Not shown): Args for the `tally add expense` command.
#[derive(Debug, Parser, Clone)]
pub struct AddExpenseArgs {
    /// The amount, e.g. 500 or 1,250.50
    #[arg(long)]
    amount: String,

    /// The category. A category that does not exist yet is created when the expense is saved.
    #[arg(long)]
    category: String,

    /// The subcategory. One that does not exist yet is created when the expense is saved.
    #[arg(long)]
    subcategory: Option<String>,

    /// A short title.
    #[arg(long)]
    title: Option<String>,

    /// A longer description.
    #[arg(long)]
    description: Option<String>,
}

impl AddExpenseArgs {
    pub fn new(
        amount: impl Into<String>,
        category: impl Into<String>,
        subcategory: Option<&str>,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        Self {
            amount: amount.into(),
            category: category.into(),
            subcategory: subcategory.map(str::to_string),
            title: title.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// (Not shown): Args for the `tally update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    /// The ID of the transaction to change.
    id: TransactionId,

    /// The new amount.
    #[arg(long)]
    amount: Option<String>,

    /// The new source (income only).
    #[arg(long)]
    source: Option<String>,

    /// The new category (expenses only).
    #[arg(long)]
    category: Option<String>,

    /// The new subcategory (expenses only). Pass an empty string to clear it.
    #[arg(long)]
    subcategory: Option<String>,

    /// The new title. Pass an empty string to clear it.
    #[arg(long)]
    title: Option<String>,

    /// The new description. Pass an empty string to clear it.
    #[arg(long)]
    description: Option<String>,
}

impl UpdateArgs {
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            amount: None,
            source: None,
            category: None,
            subcategory: None,
            title: None,
            description: None,
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = Some(amount.into());
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = Some(category.into());
    }

    pub fn set_subcategory(&mut self, subcategory: impl Into<String>) {
        self.subcategory = Some(subcategory.into());
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }
}

/// (Not shown): Args for the `tally delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The ID of the transaction to delete.
    id: TransactionId,

    /// Confirm the deletion. Nothing is deleted without it.
    #[arg(long)]
    yes: bool,
}

impl DeleteArgs {
    pub fn new(id: TransactionId, yes: bool) -> Self {
        Self { id, yes }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn default_tally_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("tally"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --tally-home or TALLY_HOME instead of relying on the default \
                tally home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("tally")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
