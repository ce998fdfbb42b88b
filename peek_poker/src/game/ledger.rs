//! Chip accounting for a single game.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Chips, Player},
    errors::{GameError, GameResult},
};

/// Pot, table bet, and burned fees of one game. Player balances live on
/// the [`Player`] records; every mutation goes through the game's state
/// machine.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BettingLedger {
    pot: Chips,
    table_bet: Chips,
    /// Peek and swap fees leave circulation for good.
    fees_burned: Chips,
}

impl BettingLedger {
    #[must_use]
    pub fn pot(&self) -> Chips {
        self.pot
    }

    /// Largest single bet placed this round.
    #[must_use]
    pub fn table_bet(&self) -> Chips {
        self.table_bet
    }

    #[must_use]
    pub fn fees_burned(&self) -> Chips {
        self.fees_burned
    }

    pub(crate) fn ensure_affordable(player: &Player, required: Chips) -> GameResult<()> {
        if player.chip_balance < required {
            return Err(GameError::InsufficientChips {
                required,
                available: player.chip_balance,
            });
        }
        Ok(())
    }

    pub(crate) fn charge_fee(&mut self, player: &mut Player, fee: Chips) -> GameResult<()> {
        Self::ensure_affordable(player, fee)?;
        let fees_burned = self
            .fees_burned
            .checked_add(fee)
            .ok_or(GameError::ChipOverflow)?;
        player.chip_balance -= fee;
        self.fees_burned = fees_burned;
        Ok(())
    }

    /// One bet per player per round, at least the minimum, and matching or
    /// raising whatever is already on the table.
    pub(crate) fn validate_bet(
        &self,
        player: &Player,
        amount: Chips,
        minimum: Chips,
    ) -> GameResult<()> {
        if player.current_bet > 0 {
            return Err(GameError::AlreadyBet);
        }
        if amount < minimum {
            return Err(GameError::BetBelowMinimum { amount, minimum });
        }
        if amount < self.table_bet {
            return Err(GameError::BetBelowTableBet {
                amount,
                table_bet: self.table_bet,
            });
        }
        Self::ensure_affordable(player, amount)
    }

    pub(crate) fn place_bet(
        &mut self,
        player: &mut Player,
        amount: Chips,
        minimum: Chips,
    ) -> GameResult<()> {
        self.validate_bet(player, amount, minimum)?;
        let pot = self.pot.checked_add(amount).ok_or(GameError::ChipOverflow)?;
        player.chip_balance -= amount;
        player.current_bet = amount;
        self.pot = pot;
        self.table_bet = self.table_bet.max(amount);
        Ok(())
    }

    /// Move the whole pot onto `winner`'s balance.
    pub(crate) fn award_pot(&mut self, winner: &mut Player) -> GameResult<Chips> {
        winner.chip_balance = winner
            .chip_balance
            .checked_add(self.pot)
            .ok_or(GameError::ChipOverflow)?;
        Ok(std::mem::take(&mut self.pot))
    }

    /// Chips still in play: balances plus the pot.
    pub(crate) fn circulating<'a>(&self, players: impl IntoIterator<Item = &'a Player>) -> u64 {
        let balances: u64 = players
            .into_iter()
            .map(|player| u64::from(player.chip_balance))
            .sum();
        balances + u64::from(self.pot)
    }
}
