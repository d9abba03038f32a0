//! # Timelocks
//!
//! Anchor timestamp plus per-leg stage offsets bounding every escrow
//! operation.
//!
//! The schedule is pure configuration: no offset values are baked in, and
//! the ordering rules are validated wherever a schedule enters the system
//! (order creation and escrow instantiation) rather than assumed.

use super::errors::EscrowError;
use super::value_objects::Leg;
use serde::{Deserialize, Serialize};

/// A named deadline bounding when an operation is permitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Start of the private withdrawal window (maker/taker only).
    Withdrawal,
    /// Start of the public withdrawal window (access-credential holders).
    PublicWithdrawal,
    /// Start of the cancellation window; withdrawal closes here.
    Cancellation,
}

/// Stage offsets for one leg, in seconds relative to the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegSchedule {
    /// Offset of [`Stage::Withdrawal`].
    pub withdrawal: u32,
    /// Offset of [`Stage::PublicWithdrawal`].
    pub public_withdrawal: u32,
    /// Offset of [`Stage::Cancellation`].
    pub cancellation: u32,
}

impl LegSchedule {
    fn offset_of(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Withdrawal => self.withdrawal,
            Stage::PublicWithdrawal => self.public_withdrawal,
            Stage::Cancellation => self.cancellation,
        }
    }

    fn validate(&self, label: &str) -> Result<(), EscrowError> {
        if self.withdrawal > self.public_withdrawal {
            return Err(EscrowError::TimelockOrdering(format!(
                "{label}: public withdrawal cannot start before private withdrawal"
            )));
        }
        if self.public_withdrawal >= self.cancellation {
            return Err(EscrowError::TimelockOrdering(format!(
                "{label}: cancellation cannot start before public withdrawal ends"
            )));
        }
        Ok(())
    }
}

/// Stage offsets for both legs of one swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockOffsets {
    /// Source-leg schedule.
    pub src: LegSchedule,
    /// Destination-leg schedule.
    pub dst: LegSchedule,
}

impl TimelockOffsets {
    /// Validate per-leg monotonicity and the cross-leg cancellation ordering.
    ///
    /// The destination leg is where the secret is revealed first, so its
    /// cancellation must open strictly before the source leg's: the source
    /// counterparty always keeps a reaction window after observing the
    /// disclosed secret. Misordering this breaks atomicity, so it is rejected
    /// here instead of surfacing as an unwinnable race later.
    pub fn validate(&self) -> Result<(), EscrowError> {
        self.src.validate("src")?;
        self.dst.validate("dst")?;
        if self.dst.cancellation >= self.src.cancellation {
            return Err(EscrowError::TimelockOrdering(format!(
                "cross-leg: destination cancellation ({}) must start strictly before \
                 source cancellation ({})",
                self.dst.cancellation, self.src.cancellation
            )));
        }
        Ok(())
    }

    /// Schedule for one leg.
    pub fn leg(&self, leg: Leg) -> &LegSchedule {
        match leg {
            Leg::Source => &self.src,
            Leg::Destination => &self.dst,
        }
    }
}

/// A validated schedule anchored at the escrow's deployment time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timelocks {
    /// Anchor timestamp (escrow deployment).
    pub deployed_at: u64,
    /// Stage offsets relative to the anchor.
    pub offsets: TimelockOffsets,
}

impl Timelocks {
    /// Build a schedule, rejecting invalid stage orderings up front.
    pub fn new(deployed_at: u64, offsets: TimelockOffsets) -> Result<Self, EscrowError> {
        offsets.validate()?;
        Ok(Self {
            deployed_at,
            offsets,
        })
    }

    /// Absolute start of a stage on a leg.
    pub fn start_of(&self, leg: Leg, stage: Stage) -> u64 {
        self.deployed_at + u64::from(self.offsets.leg(leg).offset_of(stage))
    }

    /// Check `now` falls inside the withdrawal window for a leg.
    ///
    /// The private window opens at `Withdrawal`, the public one at
    /// `PublicWithdrawal`; both close when cancellation starts.
    pub fn check_withdrawal_window(
        &self,
        leg: Leg,
        now: u64,
        public_caller: bool,
    ) -> Result<(), EscrowError> {
        let opens = if public_caller {
            self.start_of(leg, Stage::PublicWithdrawal)
        } else {
            self.start_of(leg, Stage::Withdrawal)
        };
        let closes = self.start_of(leg, Stage::Cancellation);
        if now < opens || now >= closes {
            return Err(EscrowError::InvalidTime {
                now,
                not_before: opens,
                not_after: closes,
            });
        }
        Ok(())
    }

    /// Check `now` has reached the cancellation window for a leg.
    pub fn check_cancellation_window(&self, leg: Leg, now: u64) -> Result<(), EscrowError> {
        let opens = self.start_of(leg, Stage::Cancellation);
        if now < opens {
            return Err(EscrowError::InvalidTime {
                now,
                not_before: opens,
                not_after: u64::MAX,
            });
        }
        Ok(())
    }

    /// Canonical byte encoding used for identity hashing.
    pub fn canonical_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..8].copy_from_slice(&self.deployed_at.to_be_bytes());
        for (i, offset) in [
            self.offsets.src.withdrawal,
            self.offsets.src.public_withdrawal,
            self.offsets.src.cancellation,
            self.offsets.dst.withdrawal,
            self.offsets.dst.public_withdrawal,
            self.offsets.dst.cancellation,
        ]
        .into_iter()
        .enumerate()
        {
            out[8 + i * 4..12 + i * 4].copy_from_slice(&offset.to_be_bytes());
        }
        out
    }
}
