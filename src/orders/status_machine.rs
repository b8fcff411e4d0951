use crate::orders::OrderStatus;

/// Service for managing order status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - New → Preparing, Delivering, Completed, Cancelled
    /// - Preparing → Delivering, Completed, Cancelled
    /// - Delivering → Completed, Cancelled
    /// - Completed → (terminal)
    /// - Cancelled → (terminal)
    /// - Non-terminal status → same status (idempotent)
    ///
    /// The delivery leg is optional: pickup orders jump straight from
    /// Preparing (or even New, for counter sales) to Completed. Terminal
    /// states accept nothing, including themselves, so a repeated
    /// completion surfaces as an error instead of silently reapplying.
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        if from == to {
            return !from.is_terminal();
        }

        match (from, to) {
            // Forward progression from New
            (OrderStatus::New, OrderStatus::Preparing) => true,
            (OrderStatus::New, OrderStatus::Delivering) => true,
            (OrderStatus::New, OrderStatus::Completed) => true,
            (OrderStatus::New, OrderStatus::Cancelled) => true,

            // Forward progression from Preparing
            (OrderStatus::Preparing, OrderStatus::Delivering) => true,
            (OrderStatus::Preparing, OrderStatus::Completed) => true,
            (OrderStatus::Preparing, OrderStatus::Cancelled) => true,

            // Forward progression from Delivering
            (OrderStatus::Delivering, OrderStatus::Completed) => true,
            (OrderStatus::Delivering, OrderStatus::Cancelled) => true,

            // Terminal states accept no transitions
            (OrderStatus::Completed, _) => false,
            (OrderStatus::Cancelled, _) => false,

            // Everything else (backward moves) is invalid
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_to_preparing() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::Preparing
        ));
    }

    #[test]
    fn test_new_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn test_counter_sale_skips_pipeline() {
        // Kitchen monitor completes orders straight from the queue
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_preparing_to_delivering() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Preparing,
            OrderStatus::Delivering
        ));
    }

    #[test]
    fn test_pickup_skips_delivery() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Preparing,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_delivering_to_completed() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Delivering,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Preparing,
            OrderStatus::New
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Delivering,
            OrderStatus::Preparing
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Delivering,
            OrderStatus::New
        ));
    }

    #[test]
    fn test_completed_is_terminal() {
        for to in [
            OrderStatus::New,
            OrderStatus::Preparing,
            OrderStatus::Delivering,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert!(!StatusMachine::is_valid_transition(
                OrderStatus::Completed,
                to
            ));
        }
    }

    #[test]
    fn test_cancelled_is_terminal() {
        for to in [
            OrderStatus::New,
            OrderStatus::Preparing,
            OrderStatus::Delivering,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert!(!StatusMachine::is_valid_transition(
                OrderStatus::Cancelled,
                to
            ));
        }
    }

    #[test]
    fn test_same_status_idempotent_for_open_orders() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::New
        ));
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Preparing,
            OrderStatus::Preparing
        ));
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Delivering,
            OrderStatus::Delivering
        ));
    }

    #[test]
    fn test_transition_valid() {
        let result = StatusMachine::transition(OrderStatus::New, OrderStatus::Preparing);
        assert_eq!(result.unwrap(), OrderStatus::Preparing);
    }

    #[test]
    fn test_transition_invalid() {
        let result = StatusMachine::transition(OrderStatus::Completed, OrderStatus::Preparing);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid status transition"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::New),
            Just(OrderStatus::Preparing),
            Just(OrderStatus::Delivering),
            Just(OrderStatus::Completed),
            Just(OrderStatus::Cancelled),
        ]
    }

    /// Cancelled is reachable from every non-terminal state
    #[test]
    fn prop_can_always_cancel_open_orders() {
        proptest!(|(from in order_status_strategy())| {
            if !from.is_terminal() {
                prop_assert!(
                    StatusMachine::is_valid_transition(from, OrderStatus::Cancelled),
                    "Transition from {} to Cancelled should be valid",
                    from
                );
            }
        });
    }

    /// Terminal states accept no transitions at all
    #[test]
    fn prop_terminal_states_are_final() {
        proptest!(|(from in order_status_strategy(), to in order_status_strategy())| {
            if from.is_terminal() {
                prop_assert!(
                    !StatusMachine::is_valid_transition(from, to),
                    "No transition should be allowed from {} to {}",
                    from,
                    to
                );
            }
        });
    }

    /// Completed is reachable from every non-terminal state
    #[test]
    fn prop_completion_reachable_from_open_orders() {
        proptest!(|(from in order_status_strategy())| {
            if !from.is_terminal() {
                prop_assert!(
                    StatusMachine::is_valid_transition(from, OrderStatus::Completed)
                );
            }
        });
    }

    /// transition() agrees with is_valid_transition() everywhere
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(
            from in order_status_strategy(),
            to in order_status_strategy()
        )| {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            let transition_result = StatusMachine::transition(from, to);

            if is_valid {
                prop_assert!(transition_result.is_ok());
                prop_assert_eq!(transition_result.unwrap(), to);
            } else {
                prop_assert!(transition_result.is_err());
            }
        });
    }
}
