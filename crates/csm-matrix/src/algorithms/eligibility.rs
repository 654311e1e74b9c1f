//! Buy, lock and unlock rules
//!
//! Each check first applies the position state transition, then the
//! ownership precondition for the level.

use csm_contracts::records::MatrixLevel;

use crate::domain::{PolicyViolation, PositionState, ProfileStanding};

/// A position can be bought when it is empty, is the next position, and the
/// buyer is confirmed in the program (level 1) or holds a place at the
/// previous level.
pub fn check_buy(
    state: PositionState,
    is_next: bool,
    level: MatrixLevel,
    standing: &ProfileStanding,
) -> Result<(), PolicyViolation> {
    state.buy()?;
    if !is_next {
        return Err(PolicyViolation::NotNextPosition);
    }
    match level.previous() {
        None if !standing.program_confirmed => Err(PolicyViolation::ProgramNotConfirmed),
        Some(previous) if standing.places_at(previous) == 0 => {
            Err(PolicyViolation::NoPlacesAtPreviousLevel { level: previous })
        }
        _ => Ok(()),
    }
}

pub fn check_lock(
    state: PositionState,
    level: MatrixLevel,
    standing: &ProfileStanding,
) -> Result<(), PolicyViolation> {
    state.lock()?;
    require_place(level, standing)
}

pub fn check_unlock(
    state: PositionState,
    level: MatrixLevel,
    standing: &ProfileStanding,
) -> Result<(), PolicyViolation> {
    state.unlock()?;
    require_place(level, standing)
}

fn require_place(level: MatrixLevel, standing: &ProfileStanding) -> Result<(), PolicyViolation> {
    if standing.places_at(level) == 0 {
        return Err(PolicyViolation::NoPlacesInMatrix);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(m: u8) -> MatrixLevel {
        MatrixLevel::new(m).unwrap()
    }

    fn standing(confirmed: bool, places: [u32; 6]) -> ProfileStanding {
        ProfileStanding {
            program_confirmed: confirmed,
            places,
        }
    }

    #[test]
    fn test_buy_level_one_requires_confirmed_program() {
        let s = standing(false, [0; 6]);
        assert_eq!(
            check_buy(PositionState::Empty, true, level(1), &s),
            Err(PolicyViolation::ProgramNotConfirmed)
        );
        let s = standing(true, [0; 6]);
        assert_eq!(check_buy(PositionState::Empty, true, level(1), &s), Ok(()));
    }

    #[test]
    fn test_buy_higher_level_requires_previous_place() {
        let s = standing(true, [1, 0, 0, 0, 0, 0]);
        assert_eq!(check_buy(PositionState::Empty, true, level(2), &s), Ok(()));
        assert_eq!(
            check_buy(PositionState::Empty, true, level(3), &s),
            Err(PolicyViolation::NoPlacesAtPreviousLevel { level: level(2) })
        );
    }

    #[test]
    fn test_buy_position_rules_come_first() {
        let s = standing(true, [1; 6]);
        assert_eq!(
            check_buy(PositionState::Filled, true, level(1), &s),
            Err(PolicyViolation::NotEmpty)
        );
        assert_eq!(
            check_buy(PositionState::Empty, false, level(1), &s),
            Err(PolicyViolation::NotNextPosition)
        );
    }

    #[test]
    fn test_lock_rules() {
        let none = standing(true, [0; 6]);
        let some = standing(true, [0, 2, 0, 0, 0, 0]);
        assert_eq!(
            check_lock(PositionState::Empty, level(2), &some),
            Err(PolicyViolation::NotFilled)
        );
        assert_eq!(
            check_lock(PositionState::Filled, level(2), &none),
            Err(PolicyViolation::NoPlacesInMatrix)
        );
        assert_eq!(check_lock(PositionState::Filled, level(2), &some), Ok(()));
        assert_eq!(
            check_lock(PositionState::FilledLocked, level(2), &some),
            Err(PolicyViolation::AlreadyLocked)
        );
    }

    #[test]
    fn test_unlock_rules() {
        let some = standing(false, [3, 0, 0, 0, 0, 0]);
        assert_eq!(check_unlock(PositionState::FilledLocked, level(1), &some), Ok(()));
        assert_eq!(
            check_unlock(PositionState::Filled, level(1), &some),
            Err(PolicyViolation::NotLocked)
        );
        assert_eq!(
            check_unlock(PositionState::FilledLocked, level(2), &some),
            Err(PolicyViolation::NoPlacesInMatrix)
        );
    }
}
