use super::*;
use crate::Chips;
use crate::Position;
use crate::cards::Card;
use crate::cards::Deck;
use crate::cards::Street;
use crate::cards::Strength;

/// No-Limit Texas Hold'em for two to six seats.
///
/// Seats with no chips sit out. The button advances to the next funded
/// seat every round; heads-up the button posts the small blind and acts
/// first preflop. Raises are expressed as raise-to totals for the street,
/// and both check and call mean "check or call".
#[derive(Debug, Clone)]
pub struct Holdem {
    s_blind: Chips,
    b_blind: Chips,
    hand: usize,
    button: Position,
    deck: Deck,
    preset: Option<Deck>,
    seats: Vec<Seat>,
    board: Vec<Card>,
    street: Street,
    actor: Option<Position>,
    stake: Chips,
    raise: Chips,
    live: bool,
}

impl Holdem {
    pub fn new(s_blind: Chips, b_blind: Chips) -> Self {
        Self {
            s_blind,
            b_blind,
            hand: 0,
            button: 0,
            deck: Deck::stacked(Vec::new()),
            preset: None,
            seats: Vec::new(),
            board: Vec::new(),
            street: Street::Preflop,
            actor: None,
            stake: 0,
            raise: b_blind,
            live: false,
        }
    }
    /// Deals the next round from `deck` instead of a fresh shuffle.
    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.preset = Some(deck);
        self
    }

    fn n(&self) -> usize {
        self.seats.len()
    }
    /// Seats clockwise from `from`, exclusive, wrapping once around.
    fn after(&self, from: Position) -> impl Iterator<Item = Position> + '_ {
        let n = self.n();
        (1..=n).map(move |i| (from + i) % n)
    }
    fn next_funded(&self, from: Position) -> Position {
        self.after(from)
            .find(|i| self.seats[*i].status != Status::Out)
            .unwrap_or(from)
    }
    fn contenders(&self) -> usize {
        self.seats.iter().filter(|s| s.is_live()).count()
    }
    fn pot(&self) -> Chips {
        self.seats.iter().map(|s| s.spent).sum()
    }

    /// Whether `seat` still owes a decision on this street.
    fn owes(&self, seat: &Seat) -> bool {
        if !seat.is_betting() {
            return false;
        }
        let others = self
            .seats
            .iter()
            .filter(|s| s.is_betting())
            .count()
            .saturating_sub(1);
        if others == 0 {
            seat.stake < self.stake
        } else {
            !seat.acted || seat.stake < self.stake
        }
    }
    /// Finds the next actor after `from`, closing the hand when betting is
    /// done on the river or only one contender remains.
    fn progress(&mut self, from: Position) {
        if self.contenders() <= 1 {
            self.actor = None;
            self.live = false;
            return;
        }
        let next = self.after(from).find(|i| self.owes(&self.seats[*i]));
        self.actor = next;
        if self.actor.is_none() && self.street == Street::River {
            self.street = Street::Showdown;
            self.live = false;
        }
    }
    fn draw(&mut self, n: usize) -> Result<Vec<Card>, RulesError> {
        self.deck.deal(n).ok_or(RulesError::DeckExhausted)
    }
    fn raise_to(&mut self, actor: Position, to: Chips) -> Result<(), RulesError> {
        let seat = &self.seats[actor];
        let cap = seat.stake + seat.stack;
        let shove = to == cap;
        if to > cap {
            return Err(RulesError::Illegal(format!("raise to {} exceeds stack", to)));
        }
        if to <= self.stake {
            return Err(RulesError::Illegal(format!("raise to {} does not raise", to)));
        }
        if to < self.stake + self.raise && !shove {
            return Err(RulesError::Illegal(format!(
                "raise to {} below minimum {}",
                to,
                self.stake + self.raise
            )));
        }
        let increment = to - self.stake;
        if increment >= self.raise {
            self.raise = increment;
        }
        self.stake = to;
        let owed = to - self.seats[actor].stake;
        self.seats[actor].put(owed);
        Ok(())
    }
    fn strength(&self, seat: &Seat) -> Option<Strength> {
        match (seat.is_live(), seat.hole) {
            (true, Some(hole)) => {
                let cards = hole.iter().chain(self.board.iter()).copied().collect::<Vec<_>>();
                Some(Strength::from(cards.as_slice()))
            }
            _ => None,
        }
    }
}

impl Rules for Holdem {
    fn begin(&mut self, stacks: &[Chips]) -> Result<(), RulesError> {
        if stacks.iter().filter(|s| **s > 0).count() < 2 {
            return Err(RulesError::Shorthanded);
        }
        let first = self.seats.is_empty();
        self.seats = stacks.iter().copied().map(Seat::new).collect();
        self.button = if first { self.next_funded(0) } else { self.next_funded(self.button) };
        self.deck = self.preset.take().unwrap_or_default();
        self.board.clear();
        self.street = Street::Preflop;
        self.hand += 1;
        self.live = true;
        for i in 0..self.n() {
            if self.seats[i].status != Status::Out {
                let cards = self.draw(2)?;
                self.seats[i].hole = Some([cards[0], cards[1]]);
            }
        }
        let funded = self.seats.iter().filter(|s| s.status != Status::Out).count();
        let sb = if funded == 2 { self.button } else { self.next_funded(self.button) };
        let bb = self.next_funded(sb);
        self.seats[sb].put(self.s_blind);
        self.seats[bb].put(self.b_blind);
        self.stake = self.seats.iter().map(|s| s.stake).max().unwrap_or(0);
        self.raise = self.b_blind;
        self.progress(bb);
        log::debug!(
            "[holdem] hand {} button {} blinds {}/{}",
            self.hand,
            self.button,
            sb,
            bb
        );
        Ok(())
    }

    fn actor(&self) -> Option<Position> {
        self.actor
    }

    fn legal(&self) -> Option<Legal> {
        let seat = &self.seats[self.actor?];
        let to_call = self.stake - seat.stake;
        let can_check = to_call <= 0;
        let max_raise = seat.stake + seat.stack;
        Some(Legal {
            can_fold: !can_check,
            can_check,
            can_call: !can_check,
            call_amount: to_call.max(0).min(seat.stack),
            can_raise: seat.stack > to_call,
            min_raise: (self.stake + self.raise).min(max_raise),
            max_raise,
        })
    }

    fn apply(&mut self, action: &Action) -> Result<(), RulesError> {
        let actor = self.actor.ok_or(RulesError::NoHand)?;
        let to_call = self.stake - self.seats[actor].stake;
        match action.kind() {
            ActionKind::Fold if to_call <= 0 => {
                return Err(RulesError::Illegal("nothing to fold against".to_string()));
            }
            ActionKind::Fold => self.seats[actor].status = Status::Folded,
            ActionKind::Check | ActionKind::Call => {
                self.seats[actor].put(to_call);
            }
            ActionKind::Raise => {
                let to = action
                    .amount
                    .ok_or_else(|| RulesError::Illegal("raise without amount".to_string()))?;
                self.raise_to(actor, to)?;
            }
            ActionKind::AllIn => {
                let cap = self.seats[actor].stake + self.seats[actor].stack;
                if cap > self.stake {
                    self.raise_to(actor, cap)?;
                } else {
                    self.seats[actor].put(to_call);
                }
            }
        }
        self.seats[actor].acted = true;
        self.progress(actor);
        Ok(())
    }

    fn concluded(&self) -> bool {
        !self.live
    }

    fn deal(&mut self) -> Result<Option<Street>, RulesError> {
        if !self.live || self.actor.is_some() {
            return Ok(None);
        }
        let Some(next) = self.street.next() else {
            return Ok(None);
        };
        let cards = self.draw(next.n_revealed())?;
        self.board.extend(cards);
        self.street = next;
        self.stake = 0;
        self.raise = self.b_blind;
        for seat in self.seats.iter_mut() {
            seat.stake = 0;
            seat.acted = false;
        }
        match next {
            Street::Showdown => self.live = false,
            _ => self.progress(self.button),
        }
        Ok(Some(next))
    }

    fn settle(&mut self) -> Result<Settlement, RulesError> {
        if self.seats.is_empty() {
            return Err(RulesError::NoHand);
        }
        if self.live {
            return Err(RulesError::Unfinished);
        }
        let showdown = self.contenders() > 1;
        let claims = self
            .seats
            .iter()
            .map(|s| (s.spent, self.strength(s)))
            .collect::<Vec<_>>();
        let rewards = Showdown::from(claims).rewards();
        let mut settlement = Settlement::default();
        for (i, reward) in rewards.into_iter().enumerate() {
            if showdown && self.seats[i].is_live() {
                if let Some(hole) = self.seats[i].hole {
                    settlement.revealed.insert(i, hole.to_vec());
                }
            }
            if reward > 0 {
                settlement.winners.push(i);
                settlement.amounts.push(reward);
            }
            self.seats[i].stack += reward;
            self.seats[i].spent = 0;
            self.seats[i].stake = 0;
        }
        settlement.stacks = self.seats.iter().map(|s| s.stack).collect();
        Ok(settlement)
    }

    fn table(&self) -> Table {
        Table {
            hand: self.hand,
            street: self.street,
            pot: self.pot(),
            board: self.board.clone(),
            button: self.button,
            actor: self.actor,
            seats: self.seats.clone(),
        }
    }
}
