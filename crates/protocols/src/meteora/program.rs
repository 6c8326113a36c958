//! Program ids and PDA derivation for Meteora DLMM.

use dlmm_lp_domain::math::bin_array_index;
use solana_sdk::pubkey::Pubkey;

/// Meteora DLMM program ID (mainnet).
pub const DLMM_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo");

/// Token program ID.
pub const TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Associated token program ID.
pub const ATA_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// System program ID.
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::from_str_const("11111111111111111111111111111111");

/// Compute budget program ID.
pub const COMPUTE_BUDGET_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("ComputeBudget111111111111111111111111111111");

/// Rent sysvar ID.
pub const RENT_SYSVAR_ID: Pubkey =
    Pubkey::from_str_const("SysvarRent111111111111111111111111111111111");

/// Anchor event authority of the DLMM program.
pub fn event_authority() -> Pubkey {
    let (pda, _bump) = Pubkey::find_program_address(&[b"__event_authority"], &DLMM_PROGRAM_ID);
    pda
}

/// Bin array account holding `bin_id` for `lb_pair`.
pub fn bin_array_for_bin(lb_pair: &Pubkey, bin_id: i32) -> Pubkey {
    let index = bin_array_index(bin_id);
    let (pda, _bump) = Pubkey::find_program_address(
        &[b"bin_array", lb_pair.as_ref(), &index.to_le_bytes()],
        &DLMM_PROGRAM_ID,
    );
    pda
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_in_same_array_share_pda() {
        let pair = Pubkey::new_unique();
        assert_eq!(bin_array_for_bin(&pair, 0), bin_array_for_bin(&pair, 69));
        assert_ne!(bin_array_for_bin(&pair, 69), bin_array_for_bin(&pair, 70));
        assert_ne!(bin_array_for_bin(&pair, 0), bin_array_for_bin(&pair, -1));
    }
}
