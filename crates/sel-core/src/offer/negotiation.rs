//! Drag-and-drop action negotiation.

use crate::selection::DndAction;

/// Pick the action for one offer.
///
/// Both sides' masks are intersected; an empty intersection yields none.
/// Otherwise the user's modifier-forced action wins if available, then the
/// destination's preferred action, then the lowest-ordinal available one.
pub fn choose_action(
    source_actions: DndAction,
    offer_actions: DndAction,
    preferred: DndAction,
    user_action: DndAction,
) -> DndAction {
    let available = source_actions & offer_actions;
    if available.is_empty() {
        return DndAction::NONE;
    }
    if !user_action.is_empty() && available.contains(user_action) {
        return user_action;
    }
    if !preferred.is_empty() && available.contains(preferred) {
        return preferred;
    }
    available.lowest()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COPY: DndAction = DndAction::COPY;
    const MOVE: DndAction = DndAction::MOVE;
    const ASK: DndAction = DndAction::ASK;
    const NONE: DndAction = DndAction::NONE;

    #[test]
    fn disjoint_masks_yield_none() {
        assert_eq!(choose_action(COPY, MOVE, NONE, NONE), NONE);
    }

    #[test]
    fn intersection_without_preference_picks_lowest() {
        assert_eq!(choose_action(COPY | MOVE, MOVE, NONE, NONE), MOVE);
        assert_eq!(choose_action(COPY | MOVE | ASK, MOVE | ASK, NONE, NONE), MOVE);
    }

    #[test]
    fn unavailable_preference_is_ignored() {
        // source {copy, move}, destination {move} preferring copy
        assert_eq!(choose_action(COPY | MOVE, MOVE, COPY, NONE), MOVE);
    }

    #[test]
    fn preference_wins_over_lowest() {
        assert_eq!(choose_action(COPY | MOVE, COPY | MOVE, MOVE, NONE), MOVE);
    }

    #[test]
    fn user_action_wins_when_available() {
        assert_eq!(choose_action(COPY | MOVE, COPY | MOVE, MOVE, COPY), COPY);
        assert_eq!(choose_action(COPY | MOVE, COPY | MOVE, MOVE, ASK), MOVE);
    }
}
