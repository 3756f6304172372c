use std::fmt;

use strum::EnumIter;

/// Views shown by the dashboard, in rotation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter)]
pub enum View {
    #[default]
    AwaitingSignature,
    NewProposals,
    Pending,
    SalesGoal,
    FlipChart,
}

impl View {
    /// Returns the view following this one in the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::AwaitingSignature => Self::NewProposals,
            Self::NewProposals => Self::Pending,
            Self::Pending => Self::SalesGoal,
            Self::SalesGoal => Self::FlipChart,
            Self::FlipChart => Self::AwaitingSignature,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingSignature => write!(f, "Awaiting signature"),
            Self::NewProposals => write!(f, "New proposals"),
            Self::Pending => write!(f, "Pending"),
            Self::SalesGoal => write!(f, "Sales goal"),
            Self::FlipChart => write!(f, "Flip chart"),
        }
    }
}
