//! Order lifecycle state machine
//!
//! ```text
//! pending ──advance──▶ cooking ──advance──▶ served
//!    │                    │                   │
//!    └──────archive───────┴──────archive──────┴──▶ completed (terminal)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, ErrorCode};

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Cooking,
    Served,
    Completed,
}

/// Operator action on an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    /// Move to the next preparation stage
    Advance,
    /// "Finish & archive": jump straight to completed
    Archive,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Cooking,
        OrderStatus::Served,
        OrderStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cooking => "cooking",
            Self::Served => "served",
            Self::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Next stage in the normal pipeline.
    ///
    /// `served` has no "next": leaving it is only possible through archive.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            Self::Pending => Some(Self::Cooking),
            Self::Cooking => Some(Self::Served),
            Self::Served | Self::Completed => None,
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        match (self, to) {
            (Self::Completed, _) => false,
            (_, Self::Completed) => true,
            (from, to) => from.next() == Some(to),
        }
    }

    /// Validate `self -> to`, returning the target status
    pub fn transition_to(&self, to: OrderStatus) -> Result<OrderStatus, AppError> {
        if self.is_terminal() {
            return Err(AppError::new(ErrorCode::OrderAlreadyCompleted)
                .with_detail("from", self.as_str())
                .with_detail("to", to.as_str()));
        }
        if !self.can_transition_to(to) {
            return Err(AppError::with_message(
                ErrorCode::OrderInvalidTransition,
                format!("Cannot move order from {} to {}", self, to),
            )
            .with_detail("from", self.as_str())
            .with_detail("to", to.as_str()));
        }
        Ok(to)
    }

    /// Resolve an operator action against the current status
    pub fn apply(&self, action: StatusAction) -> Result<OrderStatus, AppError> {
        let target = match action {
            StatusAction::Archive => OrderStatus::Completed,
            StatusAction::Advance => self.next().ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderInvalidTransition,
                    format!("Order in status {} has no next stage", self),
                )
            })?,
        };
        self.transition_to(target)
    }

    /// Actions a staff member may take from this status
    pub fn available_actions(&self) -> Vec<StatusAction> {
        let mut actions = Vec::with_capacity(2);
        if self.next().is_some() {
            actions.push(StatusAction::Advance);
        }
        if !self.is_terminal() {
            actions.push(StatusAction::Archive);
        }
        actions
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "cooking" => Ok(Self::Cooking),
            "served" => Ok(Self::Served),
            "completed" => Ok(Self::Completed),
            other => Err(AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("Unknown order status: {}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_legal_transitions() {
        let legal = [
            (Pending, Cooking),
            (Cooking, Served),
            (Pending, Completed),
            (Cooking, Completed),
            (Served, Completed),
        ];
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_completed_is_terminal() {
        let err = Completed.transition_to(Completed).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderAlreadyCompleted);
        assert!(Completed.available_actions().is_empty());
    }

    #[test]
    fn test_backward_move_rejected() {
        let err = Served.transition_to(Cooking).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInvalidTransition);
        let err = Pending.transition_to(Served).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInvalidTransition);
    }

    #[test]
    fn test_apply_actions() {
        assert_eq!(Pending.apply(StatusAction::Advance).unwrap(), Cooking);
        assert_eq!(Cooking.apply(StatusAction::Advance).unwrap(), Served);
        assert_eq!(Served.apply(StatusAction::Archive).unwrap(), Completed);
        assert_eq!(Pending.apply(StatusAction::Archive).unwrap(), Completed);
        assert!(Served.apply(StatusAction::Advance).is_err());
    }

    #[test]
    fn test_available_actions() {
        assert_eq!(
            Pending.available_actions(),
            vec![StatusAction::Advance, StatusAction::Archive]
        );
        assert_eq!(Served.available_actions(), vec![StatusAction::Archive]);
    }

    #[test]
    fn test_status_string_forms() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(serde_json::to_string(&Cooking).unwrap(), "\"cooking\"");
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }
}
