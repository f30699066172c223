// Snake-draft pick arithmetic.
//
// All pick and round numbers are 1-indexed. Odd rounds run team 1..N, even
// rounds run N..1. Every function assumes `num_teams >= 1`; callers validate
// the draft configuration before reaching this module.

/// Round that `pick_num` falls in.
pub fn round_for_pick(pick_num: u32, num_teams: u32) -> u32 {
    pick_num.saturating_sub(1) / num_teams + 1
}

/// Ordinal of `pick_num` within its round, in `1..=num_teams`.
///
/// This is the raw slot in the round, before snake reversal is applied.
pub fn pick_in_round(pick_num: u32, num_teams: u32) -> u32 {
    match pick_num % num_teams {
        0 => num_teams,
        n => n,
    }
}

pub fn is_even_round(round: u32) -> bool {
    round % 2 == 0
}

/// The slot within `round` that belongs to the team drafting `my_pick_num`
/// in round one.
fn my_slot_in_round(my_pick_num: u32, round: u32, num_teams: u32) -> u32 {
    if is_even_round(round) {
        num_teams - my_pick_num + 1
    } else {
        my_pick_num
    }
}

/// Whether `pick_num` belongs to the team holding draft slot `my_pick_num`.
pub fn is_my_pick(pick_num: u32, my_pick_num: u32, num_teams: u32) -> bool {
    let round = round_for_pick(pick_num, num_teams);
    pick_in_round(pick_num, num_teams) == my_slot_in_round(my_pick_num, round, num_teams)
}

/// Absolute pick number of the user's selection in `round`.
pub fn my_absolute_pick_in_round(my_pick_num: u32, round: u32, num_teams: u32) -> u32 {
    (round - 1) * num_teams + my_slot_in_round(my_pick_num, round, num_teams)
}

/// The user's first pick strictly after `pick_num`.
///
/// Resolved from the round arithmetic: if the user's slot in the current
/// round is still ahead of `pick_num` it is the answer, otherwise the user's
/// slot in the following round is. `pick_num == 0` (draft not started)
/// resolves to the user's first-round pick.
pub fn get_my_next_pick(pick_num: u32, my_pick_num: u32, num_teams: u32) -> u32 {
    let round = round_for_pick(pick_num, num_teams);
    let this_round = my_absolute_pick_in_round(my_pick_num, round, num_teams);
    if this_round > pick_num {
        this_round
    } else {
        my_absolute_pick_in_round(my_pick_num, round + 1, num_teams)
    }
}

/// All of the user's picks in `(start_pick, end_pick]`, ascending.
///
/// A `start_pick` of 0 means the draft has not begun, so the user's very
/// first pick is included when it is within range.
pub fn get_my_picks_between(
    start_pick: u32,
    end_pick: u32,
    my_pick_num: u32,
    num_teams: u32,
) -> Vec<u32> {
    let mut picks = Vec::new();
    let mut next = get_my_next_pick(start_pick, my_pick_num, num_teams);
    while next <= end_pick {
        picks.push(next);
        next = get_my_next_pick(next, my_pick_num, num_teams);
    }
    picks
}

/// Round of the user's next selection while the draft sits at `pick_num`.
///
/// `pick_num` itself is still on the clock, so if it is the user's pick the
/// current round is returned.
pub fn my_current_round(pick_num: u32, my_pick_num: u32, num_teams: u32) -> u32 {
    let next = get_my_next_pick(pick_num.saturating_sub(1), my_pick_num, num_teams);
    round_for_pick(next, num_teams)
}

/// Number of picks that will be made before the user's next turn and before
/// the turn after that, with `curr_pick` on the clock.
///
/// Both counts come from [`get_my_next_pick`], so they agree with
/// [`is_my_pick`] for every league size.
pub fn get_picks_until(my_pick_num: u32, curr_pick: u32, num_teams: u32) -> [u32; 2] {
    let next = get_my_next_pick(curr_pick.saturating_sub(1), my_pick_num, num_teams);
    let after = get_my_next_pick(next, my_pick_num, num_teams);
    let curr = curr_pick.max(1);
    [next - curr, after - curr]
}

/// How many of the user's turns away a player taken at `simulated_pick` is.
///
/// `0` means the player goes with the pick the user is making right now.
/// Otherwise the value is the number of the user's own picks in
/// `(curr_pick, simulated_pick]` plus one, so `1` means "gone before your
/// next turn".
pub fn picks_since_curr_pick(
    curr_pick: u32,
    simulated_pick: u32,
    my_pick_num: u32,
    num_teams: u32,
) -> u32 {
    if simulated_pick == curr_pick && is_my_pick(curr_pick, my_pick_num, num_teams) {
        return 0;
    }
    get_my_picks_between(curr_pick, simulated_pick, my_pick_num, num_teams).len() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exhaustive reference for `get_my_picks_between`.
    fn brute_force_between(start: u32, end: u32, my: u32, n: u32) -> Vec<u32> {
        ((start + 1)..=end).filter(|&p| is_my_pick(p, my, n)).collect()
    }

    #[test]
    fn round_and_pick_in_round() {
        assert_eq!(round_for_pick(1, 10), 1);
        assert_eq!(round_for_pick(10, 10), 1);
        assert_eq!(round_for_pick(11, 10), 2);
        assert_eq!(round_for_pick(20, 10), 2);
        assert_eq!(round_for_pick(21, 10), 3);

        assert_eq!(pick_in_round(1, 12), 1);
        assert_eq!(pick_in_round(12, 12), 12);
        assert_eq!(pick_in_round(13, 12), 1);
        assert_eq!(pick_in_round(30, 12), 6);
    }

    #[test]
    fn even_rounds() {
        assert!(!is_even_round(1));
        assert!(is_even_round(2));
        assert!(!is_even_round(15));
        assert!(is_even_round(16));
    }

    #[test]
    fn is_my_pick_last_slot_ten_teams() {
        assert!(!is_my_pick(9, 10, 10));
        assert!(is_my_pick(10, 10, 10));
        assert!(is_my_pick(11, 10, 10));
        assert!(!is_my_pick(20, 10, 10));
    }

    #[test]
    fn get_my_next_pick_at_the_turn() {
        assert_eq!(get_my_next_pick(11, 10, 10), 30);
        assert_eq!(get_my_next_pick(10, 10, 10), 11);
        assert_eq!(get_my_next_pick(9, 10, 10), 10);
        assert_eq!(get_my_next_pick(0, 3, 12), 3);
    }

    #[test]
    fn get_my_picks_between_examples() {
        assert_eq!(get_my_picks_between(10, 12, 10, 10), vec![11]);
        assert_eq!(get_my_picks_between(0, 12, 10, 10), vec![10, 11]);
        assert_eq!(get_my_picks_between(0, 9, 10, 10), Vec::<u32>::new());
        assert_eq!(get_my_picks_between(0, 40, 1, 10), vec![1, 20, 21, 40]);
    }

    #[test]
    fn my_pick_is_mine_in_every_round() {
        for n in 1..=16 {
            for my in 1..=n {
                for round in 1..=20 {
                    let pick = my_absolute_pick_in_round(my, round, n);
                    assert!(
                        is_my_pick(pick, my, n),
                        "pick {pick} (round {round}, slot {my}, {n} teams) should be mine"
                    );
                    assert_eq!(round_for_pick(pick, n), round);
                }
            }
        }
    }

    #[test]
    fn snake_symmetry() {
        for n in 1..=14 {
            for my in 1..=n {
                for pick in 1..=(n * 6) {
                    let slot = pick_in_round(pick, n);
                    let expected = if is_even_round(round_for_pick(pick, n)) {
                        slot == n - my + 1
                    } else {
                        slot == my
                    };
                    assert_eq!(is_my_pick(pick, my, n), expected);
                }
            }
        }
    }

    #[test]
    fn next_pick_is_smallest_later_pick() {
        for n in 1..=14 {
            for my in 1..=n {
                for pick in 0..=(n * 6) {
                    let next = get_my_next_pick(pick, my, n);
                    assert!(next > pick);
                    assert!(is_my_pick(next, my, n));
                    assert!(
                        ((pick + 1)..next).all(|p| !is_my_pick(p, my, n)),
                        "skipped a pick between {pick} and {next} (slot {my}, {n} teams)"
                    );
                }
            }
        }
    }

    #[test]
    fn picks_between_matches_brute_force() {
        for n in [1, 2, 10, 12, 14] {
            for my in 1..=n {
                for start in 0..=(n * 3) {
                    for end in start..=(n * 5) {
                        let picks = get_my_picks_between(start, end, my, n);
                        assert!(picks.windows(2).all(|w| w[0] < w[1]));
                        assert_eq!(picks, brute_force_between(start, end, my, n));
                    }
                }
            }
        }
    }

    #[test]
    fn current_round_counts_the_pick_on_the_clock() {
        assert_eq!(my_current_round(1, 10, 10), 1);
        assert_eq!(my_current_round(10, 10, 10), 1);
        assert_eq!(my_current_round(11, 10, 10), 2);
        assert_eq!(my_current_round(12, 10, 10), 3);
        assert_eq!(my_current_round(5, 6, 12), 1);
        assert_eq!(my_current_round(7, 6, 12), 2);
    }

    #[test]
    fn picks_until_uses_league_size() {
        // 10 teams, slot 10: on the clock at 9 -> next is 10, then 11.
        assert_eq!(get_picks_until(10, 9, 10), [1, 2]);
        // Own pick on the clock.
        assert_eq!(get_picks_until(10, 10, 10), [0, 1]);
        assert_eq!(get_picks_until(10, 11, 10), [0, 19]);
        // 14 teams, slot 3: picks 3, 26.
        assert_eq!(get_picks_until(3, 1, 14), [2, 25]);
        assert_eq!(get_picks_until(3, 4, 14), [22, 27]);
    }

    #[test]
    fn picks_since_curr_pick_twelve_teams() {
        assert_eq!(picks_since_curr_pick(6, 6, 6, 12), 0);
        assert_eq!(picks_since_curr_pick(6, 7, 6, 12), 1);
        assert_eq!(picks_since_curr_pick(18, 18, 6, 12), 1);
    }

    #[test]
    fn picks_since_curr_pick_ten_teams() {
        assert_eq!(picks_since_curr_pick(9, 9, 10, 10), 1);
        assert_eq!(picks_since_curr_pick(9, 10, 10, 10), 2);
        assert_eq!(picks_since_curr_pick(10, 10, 10, 10), 0);
        assert_eq!(picks_since_curr_pick(10, 11, 10, 10), 2);
        assert_eq!(picks_since_curr_pick(10, 12, 10, 10), 2);
        assert_eq!(picks_since_curr_pick(15, 29, 10, 10), 1);
    }
}
