use super::{
    errors::{StateMachineError, StateMachineResult},
    events::ResolutionEvent,
    states::ResolutionStatus,
};

/// Determine the status a traversal moves to when `event` fires in `current`.
///
/// Allowed graph:
///
/// ```text
/// pending --route--> in_progress --resolve--> resolved
///                         |
///                      suspend
///                         v
///                   waiting_input --resolve--> resolved
///                         |
///                      escalate
///                         v
///                     escalated
/// ```
pub fn determine_target_status(
    current: ResolutionStatus,
    event: &ResolutionEvent,
) -> StateMachineResult<ResolutionStatus> {
    if current.is_terminal() {
        return Err(StateMachineError::AlreadyTerminal {
            status: current.to_string(),
        });
    }

    let target = match (current, event) {
        (ResolutionStatus::Pending, ResolutionEvent::Route) => ResolutionStatus::InProgress,

        (ResolutionStatus::InProgress, ResolutionEvent::Resolve) => ResolutionStatus::Resolved,
        (ResolutionStatus::InProgress, ResolutionEvent::Suspend) => ResolutionStatus::WaitingInput,

        (ResolutionStatus::WaitingInput, ResolutionEvent::Resolve) => ResolutionStatus::Resolved,
        (ResolutionStatus::WaitingInput, ResolutionEvent::Escalate(_)) => {
            ResolutionStatus::Escalated
        }

        (from, _) => {
            return Err(StateMachineError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}

/// Check whether a direct move between two statuses is part of the graph
pub fn is_allowed(from: ResolutionStatus, to: ResolutionStatus) -> bool {
    [
        ResolutionEvent::Route,
        ResolutionEvent::Resolve,
        ResolutionEvent::Suspend,
        ResolutionEvent::Escalate(String::new()),
    ]
    .iter()
    .any(|event| determine_target_status(from, event).ok() == Some(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert_eq!(
            determine_target_status(ResolutionStatus::Pending, &ResolutionEvent::Route).unwrap(),
            ResolutionStatus::InProgress
        );
        assert_eq!(
            determine_target_status(ResolutionStatus::InProgress, &ResolutionEvent::Resolve)
                .unwrap(),
            ResolutionStatus::Resolved
        );
        assert_eq!(
            determine_target_status(ResolutionStatus::InProgress, &ResolutionEvent::Suspend)
                .unwrap(),
            ResolutionStatus::WaitingInput
        );
        assert_eq!(
            determine_target_status(
                ResolutionStatus::WaitingInput,
                &ResolutionEvent::escalate_with_reason("reject")
            )
            .unwrap(),
            ResolutionStatus::Escalated
        );
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot resolve before routing
        assert!(determine_target_status(ResolutionStatus::Pending, &ResolutionEvent::Resolve).is_err());

        // Cannot escalate an automated remediation directly
        assert!(determine_target_status(
            ResolutionStatus::InProgress,
            &ResolutionEvent::escalate_with_reason("x")
        )
        .is_err());

        // Terminal statuses never move
        assert_eq!(
            determine_target_status(ResolutionStatus::Resolved, &ResolutionEvent::Route),
            Err(StateMachineError::AlreadyTerminal {
                status: "resolved".to_string()
            })
        );
    }

    #[test]
    fn test_allowed_pairs() {
        assert!(is_allowed(ResolutionStatus::Pending, ResolutionStatus::InProgress));
        assert!(is_allowed(ResolutionStatus::WaitingInput, ResolutionStatus::Resolved));
        assert!(!is_allowed(ResolutionStatus::Pending, ResolutionStatus::Resolved));
        assert!(!is_allowed(ResolutionStatus::Escalated, ResolutionStatus::Resolved));
        assert!(!is_allowed(ResolutionStatus::InProgress, ResolutionStatus::Pending));
    }
}
