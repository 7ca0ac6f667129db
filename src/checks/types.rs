use std::fmt;

/// Outcome tier of a single check.
///
/// Variants are declared in aggregation order, so the derived `Ord` is the severity
/// order: `Success < Neutral < Warning < Error < Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckResultType {
    Success,
    Neutral,
    Warning,
    /// The check itself could not run to completion
    Error,
    Failure,
}

impl CheckResultType {
    /// The most severe of the given outcomes, `None` if there are none
    pub fn get_worst<I>(results: I) -> Option<CheckResultType>
    where
        I: IntoIterator<Item = CheckResultType>,
    {
        results.into_iter().max()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckResultType::Success => "success",
            CheckResultType::Neutral => "neutral",
            CheckResultType::Warning => "warning",
            CheckResultType::Error => "error",
            CheckResultType::Failure => "failure",
        }
    }

    /// Markup colour for this outcome
    pub fn color(&self) -> &'static str {
        match self {
            CheckResultType::Success => "green",
            CheckResultType::Neutral => "default",
            CheckResultType::Warning => "yellow",
            CheckResultType::Error | CheckResultType::Failure => "red",
        }
    }

    /// Markup icon for this outcome
    pub fn icon(&self) -> &'static str {
        match self {
            CheckResultType::Success => "[green]✔[/green]",
            CheckResultType::Neutral => "✔",
            CheckResultType::Warning => "[yellow bold]![/yellow bold]",
            CheckResultType::Error => "[red]![/red]",
            CheckResultType::Failure => "[red]✖[/red]",
        }
    }
}

impl fmt::Display for CheckResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One checker's verdict for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub result_type: CheckResultType,
    /// Human-readable message; may contain `[color]`/`[link=…]` markup
    pub message: String,
    /// Display order among a package's results, lower first
    pub priority: u32,
}

impl CheckResult {
    /// Create a new result
    pub fn new(result_type: CheckResultType, message: impl Into<String>, priority: u32) -> Self {
        Self {
            result_type,
            message: message.into(),
            priority,
        }
    }
}

/// All results for one package, in checker registration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCheckResults {
    pub pinned_requirement: String,
    pub results: Vec<CheckResult>,
}

impl PackageCheckResults {
    /// Overall verdict; `None` means no checks were performed for the package
    pub fn worst(&self) -> Option<CheckResultType> {
        CheckResultType::get_worst(self.results.iter().map(|r| r.result_type))
    }

    /// Results ordered for display by priority; ties keep registration order
    pub fn display_order(&self) -> Vec<&CheckResult> {
        let mut ordered: Vec<&CheckResult> = self.results.iter().collect();
        ordered.sort_by_key(|r| r.priority);
        ordered
    }
}
