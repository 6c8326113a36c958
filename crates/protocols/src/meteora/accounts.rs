//! Byte-offset parsers for the DLMM accounts the agent reads.
//!
//! Only the leading fields are decoded. Offsets follow the program's
//! zero-copy layouts and are stable across program upgrades that append fields.

use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::entities::{PositionInfo, PositionRange};
use solana_sdk::pubkey::Pubkey;

/// Anchor discriminator of `LbPair` accounts.
pub const LB_PAIR_DISCRIMINATOR: [u8; 8] = [0x21, 0x0b, 0x31, 0x62, 0xb5, 0x65, 0xb1, 0x0d];

/// Anchor discriminator of `PositionV2` accounts.
pub const POSITION_V2_DISCRIMINATOR: [u8; 8] = [0x75, 0xb0, 0xd4, 0xc7, 0xf5, 0xb4, 0x85, 0xb6];

/// Offset of the `lb_pair` field in a position account.
pub const POSITION_LB_PAIR_OFFSET: usize = 8;
/// Offset of the `owner` field in a position account.
pub const POSITION_OWNER_OFFSET: usize = 40;

// LbPair: disc(8) + static params(32) + variable params(32) + bump(1)
// + bin_step_seed(2) + pair_type(1) = 76
const LB_PAIR_ACTIVE_ID: usize = 76;
const LB_PAIR_BIN_STEP: usize = 80;
// status(1) + require_base_factor_seed(1) + base_factor_seed(2)
// + activation_type(1) + creator_pool_on_off_control(1)
const LB_PAIR_TOKEN_X_MINT: usize = 88;
const LB_PAIR_TOKEN_Y_MINT: usize = 120;
const LB_PAIR_RESERVE_X: usize = 152;
const LB_PAIR_RESERVE_Y: usize = 184;
const LB_PAIR_MIN_LEN: usize = 216;

// PositionV2: disc(8) + lb_pair(32) + owner(32) + liquidity_shares(70 * 16)
// + reward_infos(70 * 48) = 4552, then fee_infos(70 * 48), then bin bounds.
const POSITION_FEE_INFOS: usize = 4552;
const FEE_INFO_LEN: usize = 48;
const FEE_INFO_PENDING_X: usize = 32;
const FEE_INFO_PENDING_Y: usize = 40;
const POSITION_BINS: usize = 70;
const POSITION_LOWER_BIN_ID: usize = 7912;
const POSITION_UPPER_BIN_ID: usize = 7916;
const POSITION_MIN_LEN: usize = 7920;

/// The subset of pool state the agent needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LbPairState {
    pub address: Pubkey,
    pub active_id: i32,
    pub bin_step: u16,
    pub token_x_mint: Pubkey,
    pub token_y_mint: Pubkey,
    pub reserve_x: Pubkey,
    pub reserve_y: Pubkey,
}

impl LbPairState {
    /// Decodes an `LbPair` account.
    pub fn parse(address: Pubkey, data: &[u8]) -> Result<Self, LedgerError> {
        if data.len() < LB_PAIR_MIN_LEN || data[..8] != LB_PAIR_DISCRIMINATOR {
            return Err(LedgerError::BadRequest(format!(
                "account {address} is not a DLMM pool"
            )));
        }
        Ok(Self {
            address,
            active_id: read_i32(data, LB_PAIR_ACTIVE_ID),
            bin_step: u16::from_le_bytes([data[LB_PAIR_BIN_STEP], data[LB_PAIR_BIN_STEP + 1]]),
            token_x_mint: read_pubkey(data, LB_PAIR_TOKEN_X_MINT),
            token_y_mint: read_pubkey(data, LB_PAIR_TOKEN_Y_MINT),
            reserve_x: read_pubkey(data, LB_PAIR_RESERVE_X),
            reserve_y: read_pubkey(data, LB_PAIR_RESERVE_Y),
        })
    }
}

/// Decoded position bounds and pending fees in raw token units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionState {
    pub address: Pubkey,
    pub lb_pair: Pubkey,
    pub owner: Pubkey,
    pub range: PositionRange,
    pub fee_x_pending: u64,
    pub fee_y_pending: u64,
}

impl PositionState {
    /// Decodes a `PositionV2` account.
    pub fn parse(address: Pubkey, data: &[u8]) -> Result<Self, LedgerError> {
        if data.len() < POSITION_MIN_LEN || data[..8] != POSITION_V2_DISCRIMINATOR {
            return Err(LedgerError::Other(format!(
                "account {address} is not a DLMM position"
            )));
        }

        let (fee_x_pending, fee_y_pending) = (0..POSITION_BINS)
            .map(|bin| POSITION_FEE_INFOS + bin * FEE_INFO_LEN)
            .fold((0u64, 0u64), |(x, y), base| {
                (
                    x.saturating_add(read_u64(data, base + FEE_INFO_PENDING_X)),
                    y.saturating_add(read_u64(data, base + FEE_INFO_PENDING_Y)),
                )
            });

        Ok(Self {
            address,
            lb_pair: read_pubkey(data, POSITION_LB_PAIR_OFFSET),
            owner: read_pubkey(data, POSITION_OWNER_OFFSET),
            range: PositionRange::new(
                read_i32(data, POSITION_LOWER_BIN_ID),
                read_i32(data, POSITION_UPPER_BIN_ID),
            ),
            fee_x_pending,
            fee_y_pending,
        })
    }

    /// Ledger-facing view of this position.
    pub fn info(&self) -> PositionInfo {
        PositionInfo {
            address: self.address.to_string(),
            range: self.range,
        }
    }
}

fn read_i32(data: &[u8], offset: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[offset..offset + 4]);
    i32::from_le_bytes(buf)
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&data[offset..offset + 32]);
    Pubkey::new_from_array(buf)
}
