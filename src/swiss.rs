/*!
# Tournament Pairing

Builds one round of Swiss-style tournament pairings by reducing the
pairing problem to a **maximum-weight perfect matching**.

Given a roster of [`Player`] records and a weight function scoring the
desirability of each potential pairing, [`RoundPairing`] builds a complete
weighted graph over the players (inserting a zero-weight dummy node when
the roster is odd, reachable only from the current bye candidates), runs
the matching solver in maximize mode, and maps the matched edges back to
[`Matchup`]s with a six-level color decision.

```
use wmatching::swiss::{Player, RoundPairing};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

let players: Vec<Player> = ["ada", "bob", "cyd", "dan"]
    .iter()
    .map(|name| Player::new(name))
    .collect();

let mut rng = Pcg64Mcg::seed_from_u64(1);
let round = RoundPairing::new(|_, _| 1.0).pair(&players, &mut rng).unwrap();
assert_eq!(round.len(), 2);
```
*/

use rand::Rng;

use crate::blossom::{MatcherOptions, MatchingError, Objective, WeightedPerfectMatching};
use crate::edge::Weight;
use crate::node::Node;
use crate::ops::*;
use crate::repr::{AdjArrayUndir, WeightedGraph};

/// Board color of a player in one game.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other color.
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// A tournament participant with the bookkeeping the pairing rules read.
#[derive(Debug, Clone)]
pub struct Player {
    /// Display name; also used to recognize repeated opponents.
    pub name: String,
    /// Current tournament score.
    pub score: f64,
    /// Byes received so far.
    pub byes: u32,
    /// Games played as white minus games played as black.
    pub color_diff: i32,
    /// Colors played, oldest first.
    pub color_history: Vec<Color>,
    /// Color of a game already played today, if any.
    pub played_today: Option<Color>,
    /// Names of previous opponents.
    pub opponents: Vec<String>,
}

impl Player {
    /// A fresh player with no games on record.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            score: 0.0,
            byes: 0,
            color_diff: 0,
            color_history: Vec::new(),
            played_today: None,
            opponents: Vec::new(),
        }
    }

    /// Color priority in `[-3, 3]`; positive means the player should play
    /// white next.
    ///
    /// - `+-3` forced: two consecutive games of the same color, a color
    ///   difference of two or more, or a game already played today.
    /// - `+-2` color difference of one.
    /// - `+-1` a streak of length one.
    pub fn color_prio(&self) -> i32 {
        if let Some(color) = self.played_today {
            return forced(color);
        }
        let len = self.color_history.len();
        if len >= 2 && self.color_history[len - 1] == self.color_history[len - 2] {
            return forced(self.color_history[len - 1]);
        }
        if self.color_diff.abs() >= 2 {
            return if self.color_diff > 0 { -3 } else { 3 };
        }
        if self.color_diff.abs() == 1 {
            return if self.color_diff > 0 { -2 } else { 2 };
        }
        match self.color_history.last() {
            Some(Color::White) => -1,
            Some(Color::Black) => 1,
            None => 0,
        }
    }
}

fn forced(last: Color) -> i32 {
    match last {
        Color::White => -3,
        Color::Black => 3,
    }
}

/// One matchup of a pairing round. Indices refer to the input roster.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Matchup {
    /// A regular game with assigned colors.
    Game { white: usize, black: usize },
    /// A bye; the player scores without playing.
    Bye { player: usize },
}

/// Default pairing weight of Swiss systems: prefer equal scores, strongly
/// avoid repeated opponents.
pub fn default_weight(a: &Player, b: &Player) -> Weight {
    let mut weight = 100.0 - (a.score - b.score).abs();
    if a.opponents.iter().any(|o| o == &b.name) {
        weight -= 1000.0;
    }
    weight
}

/// Builds one round of pairings from a roster and a weight function.
///
/// The weight function scores how desirable a pairing of two players is;
/// the round maximizes the total score over a perfect matching.
pub struct RoundPairing<W> {
    weight_fn: W,
}

impl<W> RoundPairing<W>
where
    W: Fn(&Player, &Player) -> Weight,
{
    /// Creates a round builder with the given pairing weight function.
    pub fn new(weight_fn: W) -> Self {
        Self { weight_fn }
    }

    /// Pairs the roster. The random generator decides color flips between
    /// players of equal color priority, so a seeded generator makes the
    /// round reproducible.
    pub fn pair<R: Rng>(
        &self,
        players: &[Player],
        rng: &mut R,
    ) -> Result<Vec<Matchup>, MatchingError> {
        if players.is_empty() {
            return Ok(Vec::new());
        }

        let n = players.len();
        let needs_bye = n % 2 == 1;
        let node_num = if needs_bye { n + 1 } else { n };
        let dummy = n as Node;

        let mut graph = WeightedGraph::<AdjArrayUndir>::new(AdjArrayUndir::new(node_num as u32));
        for i in 0..n {
            for j in i + 1..n {
                graph.add_weighted_edge(i as Node, j as Node, (self.weight_fn)(&players[i], &players[j]));
            }
        }
        if needs_bye {
            for candidate in bye_candidates(players) {
                graph.add_weighted_edge(candidate as Node, dummy, 0.0);
            }
        }

        let matching = graph.perfect_matching(
            MatcherOptions::new().with_objective(Objective::Maximize),
        )?;

        let mut round = Vec::with_capacity(matching.edges.len());
        for edge in matching.edges {
            let (u, v) = (edge.0 as usize, edge.1 as usize);
            if needs_bye && (u == n || v == n) {
                round.push(Matchup::Bye {
                    player: if u == n { v } else { u },
                });
            } else {
                let (white, black) = decide_colors(&players[u], &players[v], rng);
                round.push(if white {
                    Matchup::Game { white: u, black: v }
                } else {
                    Matchup::Game { white: v, black: u }
                });
            }
        }

        round.sort_by_key(|m| match *m {
            Matchup::Game { white, black } => (0, white.min(black)),
            Matchup::Bye { player } => (1, player),
        });
        Ok(round)
    }
}

/// Players eligible for the bye: fewer byes than the current maximum, or
/// no bye yet. If the rule admits nobody (everyone shares the same
/// non-zero count), everyone is eligible.
fn bye_candidates(players: &[Player]) -> Vec<usize> {
    let max_byes = players.iter().map(|p| p.byes).max().unwrap_or(0);
    let candidates: Vec<usize> = players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.byes < max_byes || p.byes == 0)
        .map(|(i, _)| i)
        .collect();

    if candidates.is_empty() {
        (0..players.len()).collect()
    } else {
        candidates
    }
}

/// Returns `true` if the first player plays white.
fn decide_colors<R: Rng>(a: &Player, b: &Player, rng: &mut R) -> bool {
    let pa = a.color_prio();
    let pb = b.color_prio();

    if pa > 0 && pb < 0 {
        return true;
    }
    if pb > 0 && pa < 0 {
        return false;
    }

    // same sign: the stronger need wins and takes its preferred color
    match pa.abs().cmp(&pb.abs()) {
        std::cmp::Ordering::Greater => pa > 0,
        std::cmp::Ordering::Less => pb < 0,
        std::cmp::Ordering::Equal => rng.random_bool(0.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn roster(n: usize) -> Vec<Player> {
        (0..n).map(|i| Player::new(&format!("p{i}"))).collect()
    }

    fn games(round: &[Matchup]) -> usize {
        round
            .iter()
            .filter(|m| matches!(m, Matchup::Game { .. }))
            .count()
    }

    fn byes(round: &[Matchup]) -> usize {
        round.iter().filter(|m| matches!(m, Matchup::Bye { .. })).count()
    }

    #[test]
    fn neutral_weights_pair_everyone() {
        let rng = &mut Pcg64Mcg::seed_from_u64(7);
        let pairing = RoundPairing::new(|_, _| 1.0);

        let round = pairing.pair(&roster(4), rng).unwrap();
        assert_eq!((games(&round), byes(&round)), (2, 0));

        let round = pairing.pair(&roster(3), rng).unwrap();
        assert_eq!((games(&round), byes(&round)), (1, 1));

        let round = pairing.pair(&roster(1), rng).unwrap();
        assert_eq!((games(&round), byes(&round)), (0, 1));

        let round = pairing.pair(&roster(0), rng).unwrap();
        assert!(round.is_empty());
    }

    #[test]
    fn bye_goes_to_player_with_fewest_byes() {
        let mut players = roster(3);
        players[0].byes = 1;
        players[1].byes = 1;

        let rng = &mut Pcg64Mcg::seed_from_u64(3);
        let round = RoundPairing::new(|_, _| 1.0).pair(&players, rng).unwrap();
        assert!(round.contains(&Matchup::Bye { player: 2 }));
    }

    #[test]
    fn all_equal_byes_keep_everyone_eligible() {
        let mut players = roster(3);
        for p in players.iter_mut() {
            p.byes = 2;
        }
        let rng = &mut Pcg64Mcg::seed_from_u64(3);
        let round = RoundPairing::new(|_, _| 1.0).pair(&players, rng).unwrap();
        assert_eq!(byes(&round), 1);
    }

    #[test]
    fn color_priorities() {
        let mut p = Player::new("a");
        assert_eq!(p.color_prio(), 0);

        p.color_history = vec![Color::White];
        p.color_diff = 1;
        assert_eq!(p.color_prio(), -2);

        p.color_history = vec![Color::Black, Color::Black];
        p.color_diff = 0;
        assert_eq!(p.color_prio(), 3);

        p.color_history = vec![Color::White];
        p.color_diff = 2;
        assert_eq!(p.color_prio(), -3);

        p.color_history.clear();
        p.color_diff = 0;
        p.played_today = Some(Color::White);
        assert_eq!(p.color_prio(), -3);
    }

    #[test]
    fn opposite_priorities_assign_colors_directly() {
        let mut white_seeker = Player::new("w");
        white_seeker.color_history = vec![Color::Black];
        let mut black_seeker = Player::new("b");
        black_seeker.color_history = vec![Color::White];

        let rng = &mut Pcg64Mcg::seed_from_u64(11);
        let round = RoundPairing::new(|_, _| 1.0)
            .pair(&[white_seeker, black_seeker], rng)
            .unwrap();
        assert_eq!(round, vec![Matchup::Game { white: 0, black: 1 }]);
    }

    #[test]
    fn higher_absolute_priority_wins_on_same_sign() {
        // both lean towards white, one forced
        let mut forced = Player::new("f");
        forced.color_history = vec![Color::Black, Color::Black];
        let mut mild = Player::new("m");
        mild.color_history = vec![Color::Black];

        let rng = &mut Pcg64Mcg::seed_from_u64(5);
        let round = RoundPairing::new(|_, _| 1.0)
            .pair(&[mild, forced], rng)
            .unwrap();
        assert_eq!(round, vec![Matchup::Game { white: 1, black: 0 }]);
    }

    #[test]
    fn repeat_opponents_are_avoided() {
        let mut players = roster(4);
        // p0 already played p1, p2 already played p3
        players[0].opponents.push("p1".into());
        players[1].opponents.push("p0".into());
        players[2].opponents.push("p3".into());
        players[3].opponents.push("p2".into());

        let rng = &mut Pcg64Mcg::seed_from_u64(2);
        let round = RoundPairing::new(default_weight).pair(&players, rng).unwrap();

        for m in &round {
            if let Matchup::Game { white, black } = *m {
                assert!(!players[white].opponents.contains(&players[black].name));
            }
        }
    }
}
