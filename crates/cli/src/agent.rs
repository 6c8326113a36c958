//! Wiring of the Solana collaborators into the engine.

use crate::config::AgentConfig;
use anyhow::{Context, Result};
use dlmm_lp_data::{ActionLog, Database, FileActionLog, PgActionLog};
use dlmm_lp_execution::prelude::{
    AgentScheduler, Collaborators, ConsoleNotifier, Journal, LifecycleTracker, MultiNotifier,
    PositionController, RebalanceLoop, TelegramNotifier,
};
use dlmm_lp_protocols::prelude::{
    DlmmClient, JupiterSwap, MeteoraApi, RpcProvider, SolanaWallet, WalletProvider, load_keypair,
};
use solana_sdk::signer::Signer;
use std::sync::Arc;
use tracing::info;

/// Connected collaborators for one wallet and pool.
pub struct Services {
    pub collaborators: Collaborators,
    /// Present when the action log is stored in PostgreSQL.
    pub database: Option<Database>,
}

impl Services {
    /// Loads the wallet and connects every collaborator.
    ///
    /// # Errors
    /// Fails on an unreadable key, an unreachable database or an
    /// unwritable log directory.
    pub async fn connect(config: &AgentConfig) -> Result<Self> {
        let payer = Arc::new(
            load_keypair(&config.wallet_private_key).context("failed to load WALLET_PRIVATE_KEY")?,
        );
        info!(wallet = %payer.pubkey(), pool = %config.pool_address, "Loaded wallet");

        let provider = Arc::new(RpcProvider::new(config.rpc_url.clone()));
        let wallet: Arc<dyn WalletProvider> =
            Arc::new(SolanaWallet::new(provider.clone(), payer.pubkey()));
        let liquidity = Arc::new(DlmmClient::new(
            provider.clone(),
            wallet.clone(),
            payer.clone(),
            config.priority_fee,
        ));
        let swaps = Arc::new(JupiterSwap::new(
            config.jupiter_api_url.clone(),
            provider,
            payer,
            config.slippage_bps,
        ));

        let (action_log, database): (Arc<dyn ActionLog>, Option<Database>) =
            match &config.database_url {
                Some(url) => {
                    let db = Database::connect(url)
                        .await
                        .context("failed to connect to DATABASE_URL")?;
                    db.migrate().await.context("failed to run migrations")?;
                    info!("Recording actions to PostgreSQL");
                    let log: Arc<dyn ActionLog> = Arc::new(PgActionLog::from_database(&db));
                    (log, Some(db))
                }
                None => {
                    let log = FileActionLog::open(&config.action_log_dir).await?;
                    info!(dir = %log.dir().display(), "Recording actions to files");
                    let log: Arc<dyn ActionLog> = Arc::new(log);
                    (log, None)
                }
            };

        let mut notifier = MultiNotifier::new().with(Arc::new(ConsoleNotifier::new()));
        if let Some(telegram) = &config.telegram {
            notifier = notifier.with(Arc::new(TelegramNotifier::new(
                telegram.bot_token.clone(),
                telegram.chat_id.clone(),
            )));
        }

        Ok(Self {
            collaborators: Collaborators {
                metadata: Arc::new(MeteoraApi::new(config.meteora_api_url.clone())),
                wallet,
                swaps,
                liquidity,
                action_log,
                notifier: Arc::new(notifier),
            },
            database,
        })
    }

    /// Builds the run loop on top of these collaborators.
    pub fn scheduler(&self, config: &AgentConfig) -> AgentScheduler {
        let engine = config.engine_config();
        let timing = config.engine_timing();
        let journal = Journal::new(
            Arc::new(LifecycleTracker::new()),
            self.collaborators.action_log.clone(),
            self.collaborators.notifier.clone(),
        );
        let controller =
            PositionController::new(engine.clone(), timing, &self.collaborators, journal);
        let decision = RebalanceLoop::new(
            controller,
            self.collaborators.liquidity.clone(),
            timing.retry,
        );
        AgentScheduler::new(decision, &engine, &timing)
    }
}
