//! DLMM executor for on-chain operations.
//!
//! Provides functionality to execute LP operations on Meteora DLMM pools:
//! - Open a position and deposit with a spot strategy
//! - Withdraw all liquidity, claim fees and close a position
//! - Wrap and unwrap native SOL around both

use super::accounts::LbPairState;
use super::program::{
    ATA_PROGRAM_ID, COMPUTE_BUDGET_PROGRAM_ID, DLMM_PROGRAM_ID, RENT_SYSVAR_ID, SYSTEM_PROGRAM_ID,
    TOKEN_PROGRAM_ID, bin_array_for_bin, event_authority,
};
use crate::rpc::RpcProvider;
use crate::wallet::associated_token_address;
use borsh::BorshSerialize;
use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::constants::WRAPPED_NATIVE_MINT;
use dlmm_lp_domain::entities::PositionRange;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Full withdrawal, in basis points.
const BPS_ALL: u16 = 10_000;

/// Compute units requested for liquidity transactions.
const COMPUTE_UNIT_LIMIT: u32 = 400_000;

/// `StrategyType::SpotImBalanced`: uniform distribution accepting any X/Y ratio.
const STRATEGY_SPOT_IMBALANCED: u8 = 6;

/// Parameters for opening a new position.
#[derive(Debug, Clone)]
pub struct OpenPositionParams {
    /// Lower bin bound.
    pub lower_bin_id: i32,
    /// Upper bin bound.
    pub upper_bin_id: i32,
    /// Active bin the range was centered on.
    pub active_id: i32,
    /// Amount of token X to deposit (raw units).
    pub amount_x: u64,
    /// Amount of token Y to deposit (raw units).
    pub amount_y: u64,
    /// How far the active bin may move before the deposit aborts.
    pub max_active_bin_slippage: i32,
}

#[derive(BorshSerialize)]
struct InitializePositionArgs {
    lower_bin_id: i32,
    width: i32,
}

#[derive(BorshSerialize)]
struct StrategyParameters {
    min_bin_id: i32,
    max_bin_id: i32,
    strategy_type: u8,
    parameteres: [u8; 64],
}

#[derive(BorshSerialize)]
struct LiquidityParameterByStrategy {
    amount_x: u64,
    amount_y: u64,
    active_id: i32,
    max_active_bin_slippage: i32,
    strategy_parameters: StrategyParameters,
}

#[derive(BorshSerialize)]
struct RemoveLiquidityByRangeArgs {
    from_bin_id: i32,
    to_bin_id: i32,
    bps_to_remove: u16,
}

#[derive(BorshSerialize)]
struct InitializeBinArrayArgs {
    index: i64,
}

/// Executor for DLMM operations.
pub struct DlmmExecutor {
    /// RPC provider for blockchain interaction.
    provider: Arc<RpcProvider>,
    /// Priority fee in micro-lamports per compute unit.
    compute_unit_price: u64,
}

impl DlmmExecutor {
    /// Creates a new DlmmExecutor.
    pub fn new(provider: Arc<RpcProvider>, compute_unit_price: u64) -> Self {
        Self {
            provider,
            compute_unit_price,
        }
    }

    /// Opens a position and deposits both tokens in one transaction.
    ///
    /// # Returns
    /// The transaction signature.
    pub async fn open_position(
        &self,
        pair: &LbPairState,
        params: &OpenPositionParams,
        position: &Keypair,
        payer: &Keypair,
    ) -> Result<Signature, LedgerError> {
        info!(
            pool = %pair.address,
            position = %position.pubkey(),
            lower_bin_id = params.lower_bin_id,
            upper_bin_id = params.upper_bin_id,
            amount_x = params.amount_x,
            amount_y = params.amount_y,
            "Opening new position"
        );

        let owner = payer.pubkey();
        let mut instructions = self.compute_budget_instructions();

        for (mint, amount) in [
            (pair.token_x_mint, params.amount_x),
            (pair.token_y_mint, params.amount_y),
        ] {
            instructions.push(build_create_ata_idempotent(&owner, &mint));
            if is_wrapped_native(&mint) && amount > 0 {
                let ata = associated_token_address(&owner, &mint);
                instructions.push(build_system_transfer(&owner, &ata, amount));
                instructions.push(build_sync_native(&ata));
            }
        }

        for bin_id in [params.lower_bin_id, params.upper_bin_id] {
            let bin_array = bin_array_for_bin(&pair.address, bin_id);
            if !self.provider.account_exists(&bin_array).await?
                && !instructions.iter().any(|ix| is_bin_array_init(ix, &bin_array))
            {
                debug!(bin_array = %bin_array, "Initializing missing bin array");
                instructions.push(build_initialize_bin_array(
                    &pair.address,
                    &bin_array,
                    bin_id,
                    &owner,
                )?);
            }
        }

        instructions.push(build_initialize_position(
            &pair.address,
            &position.pubkey(),
            &owner,
            params.lower_bin_id,
            params.upper_bin_id - params.lower_bin_id + 1,
        )?);
        instructions.push(build_add_liquidity_by_strategy(
            pair,
            &position.pubkey(),
            &owner,
            params,
        )?);

        self.send_transaction(&instructions, payer, Some(position)).await
    }

    /// Withdraws all liquidity, claims fees and optionally closes the position.
    pub async fn withdraw_position(
        &self,
        pair: &LbPairState,
        position: &Pubkey,
        range: PositionRange,
        close: bool,
        payer: &Keypair,
    ) -> Result<Signature, LedgerError> {
        info!(
            pool = %pair.address,
            position = %position,
            range = %range,
            close,
            "Withdrawing position"
        );

        let owner = payer.pubkey();
        let mut instructions = self.compute_budget_instructions();
        instructions.push(build_create_ata_idempotent(&owner, &pair.token_x_mint));
        instructions.push(build_create_ata_idempotent(&owner, &pair.token_y_mint));
        instructions.push(build_remove_liquidity_by_range(pair, position, &owner, range)?);
        instructions.push(build_claim_fee(pair, position, &owner, range));
        if close {
            instructions.push(build_close_position(pair, position, &owner, range));
        }
        for mint in [pair.token_x_mint, pair.token_y_mint] {
            if is_wrapped_native(&mint) {
                let ata = associated_token_address(&owner, &mint);
                instructions.push(build_close_token_account(&ata, &owner));
            }
        }

        self.send_transaction(&instructions, payer, None).await
    }

    fn compute_budget_instructions(&self) -> Vec<Instruction> {
        let mut limit = vec![2u8];
        limit.extend_from_slice(&COMPUTE_UNIT_LIMIT.to_le_bytes());
        let mut price = vec![3u8];
        price.extend_from_slice(&self.compute_unit_price.to_le_bytes());

        vec![
            Instruction {
                program_id: COMPUTE_BUDGET_PROGRAM_ID,
                accounts: vec![],
                data: limit,
            },
            Instruction {
                program_id: COMPUTE_BUDGET_PROGRAM_ID,
                accounts: vec![],
                data: price,
            },
        ]
    }

    async fn send_transaction(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        co_signer: Option<&Keypair>,
    ) -> Result<Signature, LedgerError> {
        let recent_blockhash = self.provider.get_latest_blockhash().await?;

        let transaction = match co_signer {
            Some(co_signer) => Transaction::new_signed_with_payer(
                instructions,
                Some(&payer.pubkey()),
                &[payer, co_signer],
                recent_blockhash,
            ),
            None => Transaction::new_signed_with_payer(
                instructions,
                Some(&payer.pubkey()),
                &[payer],
                recent_blockhash,
            ),
        };

        debug!(instructions = instructions.len(), "Sending transaction...");
        self.provider.send_and_confirm(&transaction).await
    }
}

fn is_wrapped_native(mint: &Pubkey) -> bool {
    mint.to_string() == WRAPPED_NATIVE_MINT
}

fn is_bin_array_init(ix: &Instruction, bin_array: &Pubkey) -> bool {
    ix.program_id == DLMM_PROGRAM_ID
        && ix.accounts.get(1).map(|meta| meta.pubkey) == Some(*bin_array)
}

fn encode<T: BorshSerialize>(discriminator: [u8; 8], args: &T) -> Result<Vec<u8>, LedgerError> {
    let mut data = discriminator.to_vec();
    let encoded =
        borsh::to_vec(args).map_err(|e| LedgerError::Other(format!("encode failed: {e}")))?;
    data.extend_from_slice(&encoded);
    Ok(data)
}

fn build_initialize_position(
    lb_pair: &Pubkey,
    position: &Pubkey,
    owner: &Pubkey,
    lower_bin_id: i32,
    width: i32,
) -> Result<Instruction, LedgerError> {
    let discriminator: [u8; 8] = [0xdb, 0xc0, 0xea, 0x47, 0xbe, 0xbf, 0x66, 0x50];
    let data = encode(discriminator, &InitializePositionArgs { lower_bin_id, width })?;

    let accounts = vec![
        AccountMeta::new(*owner, true),                         // payer
        AccountMeta::new(*position, true),                      // position
        AccountMeta::new_readonly(*lb_pair, false),             // lb_pair
        AccountMeta::new_readonly(*owner, true),                // owner
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),    // system_program
        AccountMeta::new_readonly(RENT_SYSVAR_ID, false),       // rent
        AccountMeta::new_readonly(event_authority(), false),    // event_authority
        AccountMeta::new_readonly(DLMM_PROGRAM_ID, false),      // program
    ];

    Ok(Instruction {
        program_id: DLMM_PROGRAM_ID,
        accounts,
        data,
    })
}

fn build_initialize_bin_array(
    lb_pair: &Pubkey,
    bin_array: &Pubkey,
    bin_id: i32,
    funder: &Pubkey,
) -> Result<Instruction, LedgerError> {
    let discriminator: [u8; 8] = [0x23, 0x56, 0x13, 0xb9, 0x4e, 0xd4, 0x4b, 0xd3];
    let index = dlmm_lp_domain::math::bin_array_index(bin_id);
    let data = encode(discriminator, &InitializeBinArrayArgs { index })?;

    let accounts = vec![
        AccountMeta::new_readonly(*lb_pair, false),          // lb_pair
        AccountMeta::new(*bin_array, false),                 // bin_array
        AccountMeta::new(*funder, true),                     // funder
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false), // system_program
    ];

    Ok(Instruction {
        program_id: DLMM_PROGRAM_ID,
        accounts,
        data,
    })
}

/// Accounts shared by deposit and withdrawal, in program order.
fn liquidity_accounts(
    pair: &LbPairState,
    position: &Pubkey,
    owner: &Pubkey,
    lower_bin_id: i32,
    upper_bin_id: i32,
) -> Vec<AccountMeta> {
    let user_token_x = associated_token_address(owner, &pair.token_x_mint);
    let user_token_y = associated_token_address(owner, &pair.token_y_mint);
    vec![
        AccountMeta::new(*position, false),
        AccountMeta::new(pair.address, false),
        // No bitmap extension: the program id stands in for the optional account.
        AccountMeta::new_readonly(DLMM_PROGRAM_ID, false),
        AccountMeta::new(user_token_x, false),
        AccountMeta::new(user_token_y, false),
        AccountMeta::new(pair.reserve_x, false),
        AccountMeta::new(pair.reserve_y, false),
        AccountMeta::new_readonly(pair.token_x_mint, false),
        AccountMeta::new_readonly(pair.token_y_mint, false),
        AccountMeta::new(bin_array_for_bin(&pair.address, lower_bin_id), false),
        AccountMeta::new(bin_array_for_bin(&pair.address, upper_bin_id), false),
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(event_authority(), false),
        AccountMeta::new_readonly(DLMM_PROGRAM_ID, false),
    ]
}

fn build_add_liquidity_by_strategy(
    pair: &LbPairState,
    position: &Pubkey,
    owner: &Pubkey,
    params: &OpenPositionParams,
) -> Result<Instruction, LedgerError> {
    let discriminator: [u8; 8] = [0x07, 0x03, 0x96, 0x7f, 0x94, 0x28, 0x3d, 0xc8];
    let args = LiquidityParameterByStrategy {
        amount_x: params.amount_x,
        amount_y: params.amount_y,
        active_id: params.active_id,
        max_active_bin_slippage: params.max_active_bin_slippage,
        strategy_parameters: StrategyParameters {
            min_bin_id: params.lower_bin_id,
            max_bin_id: params.upper_bin_id,
            strategy_type: STRATEGY_SPOT_IMBALANCED,
            parameteres: [0u8; 64],
        },
    };

    Ok(Instruction {
        program_id: DLMM_PROGRAM_ID,
        accounts: liquidity_accounts(
            pair,
            position,
            owner,
            params.lower_bin_id,
            params.upper_bin_id,
        ),
        data: encode(discriminator, &args)?,
    })
}

fn build_remove_liquidity_by_range(
    pair: &LbPairState,
    position: &Pubkey,
    owner: &Pubkey,
    range: PositionRange,
) -> Result<Instruction, LedgerError> {
    let discriminator: [u8; 8] = [0x1a, 0x52, 0x66, 0x98, 0xf0, 0x4a, 0x69, 0x1a];
    let args = RemoveLiquidityByRangeArgs {
        from_bin_id: range.lower_bin_id,
        to_bin_id: range.upper_bin_id,
        bps_to_remove: BPS_ALL,
    };

    Ok(Instruction {
        program_id: DLMM_PROGRAM_ID,
        accounts: liquidity_accounts(
            pair,
            position,
            owner,
            range.lower_bin_id,
            range.upper_bin_id,
        ),
        data: encode(discriminator, &args)?,
    })
}

fn build_claim_fee(
    pair: &LbPairState,
    position: &Pubkey,
    owner: &Pubkey,
    range: PositionRange,
) -> Instruction {
    let discriminator: [u8; 8] = [0xa9, 0x20, 0x4f, 0x89, 0x88, 0xe8, 0x46, 0x89];

    let accounts = vec![
        AccountMeta::new(pair.address, false), // lb_pair
        AccountMeta::new(*position, false),    // position
        AccountMeta::new(bin_array_for_bin(&pair.address, range.lower_bin_id), false),
        AccountMeta::new(bin_array_for_bin(&pair.address, range.upper_bin_id), false),
        AccountMeta::new_readonly(*owner, true), // sender
        AccountMeta::new(pair.reserve_x, false),
        AccountMeta::new(pair.reserve_y, false),
        AccountMeta::new(associated_token_address(owner, &pair.token_x_mint), false),
        AccountMeta::new(associated_token_address(owner, &pair.token_y_mint), false),
        AccountMeta::new_readonly(pair.token_x_mint, false),
        AccountMeta::new_readonly(pair.token_y_mint, false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(event_authority(), false),
        AccountMeta::new_readonly(DLMM_PROGRAM_ID, false),
    ];

    Instruction {
        program_id: DLMM_PROGRAM_ID,
        accounts,
        data: discriminator.to_vec(),
    }
}

fn build_close_position(
    pair: &LbPairState,
    position: &Pubkey,
    owner: &Pubkey,
    range: PositionRange,
) -> Instruction {
    let discriminator: [u8; 8] = [0x7b, 0x86, 0x51, 0x00, 0x31, 0x44, 0x62, 0x62];

    let accounts = vec![
        AccountMeta::new(*position, false),    // position
        AccountMeta::new(pair.address, false), // lb_pair
        AccountMeta::new(bin_array_for_bin(&pair.address, range.lower_bin_id), false),
        AccountMeta::new(bin_array_for_bin(&pair.address, range.upper_bin_id), false),
        AccountMeta::new_readonly(*owner, true), // sender
        AccountMeta::new(*owner, false),         // rent_receiver
        AccountMeta::new_readonly(event_authority(), false),
        AccountMeta::new_readonly(DLMM_PROGRAM_ID, false),
    ];

    Instruction {
        program_id: DLMM_PROGRAM_ID,
        accounts,
        data: discriminator.to_vec(),
    }
}

fn build_create_ata_idempotent(owner: &Pubkey, mint: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*owner, true),                                 // funder
        AccountMeta::new(associated_token_address(owner, mint), false), // associated account
        AccountMeta::new_readonly(*owner, false),                       // wallet
        AccountMeta::new_readonly(*mint, false),                        // mint
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
    ];

    Instruction {
        program_id: ATA_PROGRAM_ID,
        accounts,
        data: vec![1], // CreateIdempotent
    }
}

fn build_system_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = 2u32.to_le_bytes().to_vec(); // Transfer
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    }
}

fn build_sync_native(account: &Pubkey) -> Instruction {
    Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![AccountMeta::new(*account, false)],
        data: vec![17], // SyncNative
    }
}

fn build_close_token_account(account: &Pubkey, owner: &Pubkey) -> Instruction {
    Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*account, false),
            AccountMeta::new(*owner, false),
            AccountMeta::new_readonly(*owner, true),
        ],
        data: vec![9], // CloseAccount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> LbPairState {
        LbPairState {
            address: Pubkey::new_unique(),
            active_id: 100,
            bin_step: 25,
            token_x_mint: Pubkey::new_unique(),
            token_y_mint: Pubkey::new_unique(),
            reserve_x: Pubkey::new_unique(),
            reserve_y: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_add_liquidity_encoding() {
        let pair = pair();
        let params = OpenPositionParams {
            lower_bin_id: 80,
            upper_bin_id: 120,
            active_id: 100,
            amount_x: 5,
            amount_y: 7,
            max_active_bin_slippage: 3,
        };
        let ix = build_add_liquidity_by_strategy(
            &pair,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &params,
        )
        .unwrap();

        // discriminator + 2 * u64 + 2 * i32 + 2 * i32 + u8 + [u8; 64]
        assert_eq!(ix.data.len(), 8 + 16 + 8 + 8 + 1 + 64);
        assert_eq!(&ix.data[8..16], &5u64.to_le_bytes());
        assert_eq!(&ix.data[16..24], &7u64.to_le_bytes());
        assert_eq!(ix.data[40], STRATEGY_SPOT_IMBALANCED);
        assert_eq!(ix.accounts.len(), 16);
        assert!(ix.accounts[11].is_signer);
    }

    #[test]
    fn test_remove_liquidity_removes_everything() {
        let ix = build_remove_liquidity_by_range(
            &pair(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            PositionRange::new(-10, 10),
        )
        .unwrap();
        assert_eq!(&ix.data[8..12], &(-10i32).to_le_bytes());
        assert_eq!(&ix.data[12..16], &10i32.to_le_bytes());
        assert_eq!(&ix.data[16..18], &BPS_ALL.to_le_bytes());
    }

    #[test]
    fn test_system_transfer_layout() {
        let ix = build_system_transfer(&Pubkey::new_unique(), &Pubkey::new_unique(), 42);
        assert_eq!(&ix.data[..4], &2u32.to_le_bytes());
        assert_eq!(&ix.data[4..], &42u64.to_le_bytes());
    }
}
