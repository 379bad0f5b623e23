use crate::Chips;
use crate::cards::Strength;

/// One seat's claim on the pot.
#[derive(Debug, Clone)]
pub struct Entry {
    pub spent: Chips,
    /// `None` for seats that folded or were never dealt in.
    pub strength: Option<Strength>,
    pub reward: Chips,
}

/// Ephemeral pot calculator. Walks contribution levels from the smallest
/// live stake upward, awarding each slice to the best eligible hands, so
/// side pots fall out without special cases.
pub struct Showdown {
    entries: Vec<Entry>,
}

impl From<Vec<(Chips, Option<Strength>)>> for Showdown {
    fn from(claims: Vec<(Chips, Option<Strength>)>) -> Self {
        Self {
            entries: claims
                .into_iter()
                .map(|(spent, strength)| Entry {
                    spent,
                    strength,
                    reward: 0,
                })
                .collect(),
        }
    }
}

impl Showdown {
    /// Chips awarded to each seat, in seat order.
    pub fn rewards(mut self) -> Vec<Chips> {
        let mut prev = 0;
        for next in self.levels() {
            let slice = self.slice(prev, next);
            self.distribute(slice, next);
            prev = next;
        }
        let leftover = self.staked() - self.awarded();
        if leftover > 0 {
            self.distribute(leftover, 0);
        }
        self.entries.into_iter().map(|e| e.reward).collect()
    }

    fn levels(&self) -> Vec<Chips> {
        let mut levels = self
            .entries
            .iter()
            .filter(|e| e.strength.is_some())
            .map(|e| e.spent)
            .filter(|s| *s > 0)
            .collect::<Vec<_>>();
        levels.sort_unstable();
        levels.dedup();
        levels
    }
    fn slice(&self, prev: Chips, next: Chips) -> Chips {
        self.entries
            .iter()
            .map(|e| e.spent.min(next) - e.spent.min(prev))
            .sum()
    }
    fn distribute(&mut self, chips: Chips, level: Chips) {
        let best = self
            .entries
            .iter()
            .filter(|e| e.spent >= level)
            .filter_map(|e| e.strength.as_ref())
            .max()
            .cloned();
        let mut winners = self
            .entries
            .iter_mut()
            .filter(|e| e.spent >= level)
            .filter(|e| e.strength.is_some() && e.strength == best)
            .collect::<Vec<_>>();
        if winners.is_empty() {
            return;
        }
        let share = chips / winners.len() as Chips;
        let remainder = (chips % winners.len() as Chips) as usize;
        for winner in winners.iter_mut() {
            winner.reward += share;
        }
        for winner in winners.iter_mut().take(remainder) {
            winner.reward += 1;
        }
    }
    fn staked(&self) -> Chips {
        self.entries.iter().map(|e| e.spent).sum()
    }
    fn awarded(&self) -> Chips {
        self.entries.iter().map(|e| e.reward).sum()
    }
}
