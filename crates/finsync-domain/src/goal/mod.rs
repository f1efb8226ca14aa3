
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::{dates, ContributionId, DomainError, GoalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Paused => "paused",
            GoalStatus::Completed => "completed",
            GoalStatus::Failed => "failed",
            GoalStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GoalStatus::Completed | GoalStatus::Failed | GoalStatus::Cancelled
        )
    }

    /// Status changes a client may request
    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        matches!(
            (self, next),
            (GoalStatus::Active, GoalStatus::Paused)
                | (GoalStatus::Paused, GoalStatus::Active)
                | (GoalStatus::Active, GoalStatus::Completed)
                | (GoalStatus::Active, GoalStatus::Cancelled)
                | (GoalStatus::Paused, GoalStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Pending,
    Achieved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub target_percentage: Decimal,
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(default)]
    pub id: Option<ContributionId>,
    pub amount: Decimal,
    #[serde(with = "dates")]
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
    #[serde(default, with = "dates::option")]
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl Goal {
    /// Sum of the contribution ledger
    pub fn contributed_total(&self) -> Decimal {
        self.contributions.iter().map(|c| c.amount).sum()
    }

    /// The contribution ledger is authoritative; `current_amount` is a
    /// server-side projection that may lag behind it. Never lower than either.
    pub fn effective_amount(&self) -> Decimal {
        self.current_amount.max(self.contributed_total())
    }

    pub fn remaining_amount(&self) -> Decimal {
        (self.target_amount - self.effective_amount()).max(Decimal::ZERO)
    }

    /// Progress in percent, capped at 100
    pub fn progress_percentage(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let pct = self.effective_amount() * Decimal::ONE_HUNDRED / self.target_amount;
        pct.min(Decimal::ONE_HUNDRED).round_dp(2)
    }

    pub fn is_reached(&self) -> bool {
        self.target_amount > Decimal::ZERO && self.effective_amount() >= self.target_amount
    }

    /// Milestones whose threshold is covered by the current progress
    pub fn reached_milestones(&self) -> Vec<&Milestone> {
        let progress = self.progress_percentage();
        self.milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::Achieved || m.target_percentage <= progress)
            .collect()
    }

    /// Lowest milestone that is still ahead of the current progress
    pub fn next_milestone(&self) -> Option<&Milestone> {
        let progress = self.progress_percentage();
        self.milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::Pending && m.target_percentage > progress)
            .min_by(|a, b| a.target_percentage.cmp(&b.target_percentage))
    }

    /// Append to the ledger and advance the local projection.
    /// `current_amount` only ever moves forward.
    pub fn record_contribution(&mut self, contribution: Contribution) -> Result<(), DomainError> {
        ContributionDraft::check_amount(contribution.amount)?;
        self.ensure_accepts_contributions()?;

        self.current_amount = self.effective_amount() + contribution.amount;
        self.contributions.push(contribution);

        let progress = self.progress_percentage();
        for milestone in &mut self.milestones {
            if milestone.target_percentage <= progress {
                milestone.status = MilestoneStatus::Achieved;
            }
        }
        Ok(())
    }

    pub fn ensure_accepts_contributions(&self) -> Result<(), DomainError> {
        if self.status != GoalStatus::Active {
            return Err(DomainError::GoalNotActive(format!(
                "Goal '{}' is {}",
                self.name,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    pub fn ensure_transition(&self, next: GoalStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::Validation(format!(
                "Cannot change goal status from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDraft {
    pub name: String,
    pub target_amount: Decimal,
    #[serde(
        default,
        with = "dates::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestone_percentages: Vec<Decimal>,
}

impl GoalDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Goal name cannot be empty".to_string(),
            ));
        }
        if self.target_amount <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "Target amount must be greater than zero".to_string(),
            ));
        }
        if let Some(bad) = self
            .milestone_percentages
            .iter()
            .find(|p| **p <= Decimal::ZERO || **p > Decimal::ONE_HUNDRED)
        {
            return Err(DomainError::Validation(format!(
                "Milestone percentage {} must be within (0, 100]",
                bad
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionDraft {
    pub amount: Decimal,
    #[serde(with = "dates")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ContributionDraft {
    fn check_amount(amount: Decimal) -> Result<(), DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "Contribution amount must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        Self::check_amount(self.amount)
    }
}
