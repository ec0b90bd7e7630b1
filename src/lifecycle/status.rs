//! Closed status enumerations and the transition table for the donation
//! lifecycle.
//!
//! Every handler that moves a food item or a donation request between states
//! goes through [`food_transition`] / [`request_transition`], so a disallowed
//! transition is rejected in exactly one place.

use crate::error::{AppError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FoodStatus {
    Available,
    Requested,
    Approved,
    Donated,
}

impl FoodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodStatus::Available => "available",
            FoodStatus::Requested => "requested",
            FoodStatus::Approved => "approved",
            FoodStatus::Donated => "donated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(FoodStatus::Available),
            "requested" => Some(FoodStatus::Requested),
            "approved" => Some(FoodStatus::Approved),
            "donated" => Some(FoodStatus::Donated),
            _ => None,
        }
    }

    /// current-state x action -> next-state; None means disallowed.
    pub fn apply(self, action: FoodAction) -> Option<FoodStatus> {
        match (self, action) {
            (FoodStatus::Available, FoodAction::Reserve) => Some(FoodStatus::Requested),
            (FoodStatus::Requested, FoodAction::Approve) => Some(FoodStatus::Approved),
            (FoodStatus::Requested, FoodAction::Release) => Some(FoodStatus::Available),
            (FoodStatus::Approved, FoodAction::Donate) => Some(FoodStatus::Donated),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            "completed" => Some(RequestStatus::Completed),
            _ => None,
        }
    }

    pub fn apply(self, action: RequestAction) -> Option<RequestStatus> {
        match (self, action) {
            (RequestStatus::Pending, RequestAction::Approve) => Some(RequestStatus::Approved),
            (RequestStatus::Pending, RequestAction::Reject) => Some(RequestStatus::Rejected),
            (RequestStatus::Approved, RequestAction::Complete) => Some(RequestStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FoodAction {
    Reserve,
    Approve,
    Release,
    Donate,
}

impl FoodAction {
    fn describe(&self) -> &'static str {
        match self {
            FoodAction::Reserve => "request",
            FoodAction::Approve => "approve",
            FoodAction::Release => "release",
            FoodAction::Donate => "donate",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestAction {
    Approve,
    Reject,
    Complete,
}

impl RequestAction {
    fn describe(&self) -> &'static str {
        match self {
            RequestAction::Approve => "approve",
            RequestAction::Reject => "reject",
            RequestAction::Complete => "complete",
        }
    }
}

/// A canteen's decision on a pending donation request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(Decision::Approve),
            "reject" => Some(Decision::Reject),
            _ => None,
        }
    }
}

/// Resolve a stored food status string and apply an action to it.
pub fn food_transition(current: &str, action: FoodAction) -> Result<FoodStatus> {
    let status = FoodStatus::parse(current)
        .ok_or_else(|| AppError::InvalidTransition(format!("Unknown food status '{current}'")))?;
    status.apply(action).ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "Cannot {} a food item that is {}",
            action.describe(),
            status.as_str()
        ))
    })
}

/// Resolve a stored request status string and apply an action to it.
pub fn request_transition(current: &str, action: RequestAction) -> Result<RequestStatus> {
    let status = RequestStatus::parse(current)
        .ok_or_else(|| AppError::InvalidTransition(format!("Unknown request status '{current}'")))?;
    status.apply(action).ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "Cannot {} a request that is {}",
            action.describe(),
            status.as_str()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn food_happy_path() {
        assert_eq!(
            FoodStatus::Available.apply(FoodAction::Reserve),
            Some(FoodStatus::Requested)
        );
        assert_eq!(
            FoodStatus::Requested.apply(FoodAction::Approve),
            Some(FoodStatus::Approved)
        );
        assert_eq!(
            FoodStatus::Approved.apply(FoodAction::Donate),
            Some(FoodStatus::Donated)
        );
    }

    #[test]
    fn reject_releases_food() {
        assert_eq!(
            FoodStatus::Requested.apply(FoodAction::Release),
            Some(FoodStatus::Available)
        );
    }

    #[test]
    fn food_disallowed_transitions() {
        assert_eq!(FoodStatus::Available.apply(FoodAction::Approve), None);
        assert_eq!(FoodStatus::Available.apply(FoodAction::Donate), None);
        assert_eq!(FoodStatus::Requested.apply(FoodAction::Reserve), None);
        assert_eq!(FoodStatus::Donated.apply(FoodAction::Reserve), None);
        assert_eq!(FoodStatus::Donated.apply(FoodAction::Donate), None);
    }

    #[test]
    fn request_only_decided_once() {
        assert_eq!(
            RequestStatus::Pending.apply(RequestAction::Approve),
            Some(RequestStatus::Approved)
        );
        assert_eq!(RequestStatus::Approved.apply(RequestAction::Approve), None);
        assert_eq!(RequestStatus::Rejected.apply(RequestAction::Approve), None);
        assert_eq!(RequestStatus::Completed.apply(RequestAction::Complete), None);
    }

    #[test]
    fn complete_requires_approved() {
        assert_eq!(RequestStatus::Pending.apply(RequestAction::Complete), None);
        assert_eq!(
            RequestStatus::Approved.apply(RequestAction::Complete),
            Some(RequestStatus::Completed)
        );
    }

    #[test]
    fn status_round_trip() {
        for s in ["available", "requested", "approved", "donated"] {
            assert_eq!(FoodStatus::parse(s).unwrap().as_str(), s);
        }
        for s in ["pending", "approved", "rejected", "completed"] {
            assert_eq!(RequestStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(FoodStatus::parse("eaten").is_none());
        assert!(RequestStatus::parse("").is_none());
    }

    #[test]
    fn transition_errors_name_the_state() {
        let err = request_transition("completed", RequestAction::Approve).unwrap_err();
        assert!(err.to_string().contains("completed"));
        assert!(food_transition("gone", FoodAction::Reserve).is_err());
    }
}
