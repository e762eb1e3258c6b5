//! Terra exchange rate oracle voter
//!
//! Drives the commit-reveal vote cycle: on each vote period boundary the
//! voter reveals the rates it committed in the prior period, then commits
//! to freshly aggregated market rates for the current one. Missing either
//! transaction increments the validator's miss counter on chain.

use super::{
    lcd::{ExchangeRate, LcdApi},
    msg::MsgExchangeRateVote,
    pending::{PendingQueue, TxHistory},
    tx::{BroadcastTx, StdFee, TxBuilder},
    Denom, MEMO, TX_RESULT_DELAY,
};
use crate::{
    config::NetworkConfig, prelude::*, sources::MarketSet, wallet::Wallet, Error, Map, Rate,
};
use std::{
    fmt::{self, Display},
    sync::Arc,
    time::Duration,
};

/// Delay between the vote and prevote broadcasts of one period, letting
/// the first transaction reach the mempool before the next sequence is used
const INTER_TX_DELAY: Duration = Duration::from_millis(300);

/// Remembered `(rate, salt)` behind an outstanding prevote commitment
#[derive(Clone, Debug)]
pub struct PrevoteCommitment {
    /// Committed rate
    pub rate: Rate,

    /// Salt the commitment hash was derived with
    pub salt: String,

    /// Vote period the commitment was created in
    pub period: u64,
}

/// Commitments carried across the period boundary, keyed by prevote hash.
///
/// The chain reports the hash it recorded for a denom; the voter looks the
/// hash up here to recover the rate and salt to disclose. Position within
/// the period is irrelevant, only the hash matches reveals to commitments.
#[derive(Debug, Default)]
pub struct PrevoteMemory(Map<String, PrevoteCommitment>);

impl PrevoteMemory {
    /// Remember the commitment behind `hash`
    pub fn insert(&mut self, hash: String, commitment: PrevoteCommitment) {
        self.0.insert(hash, commitment);
    }

    /// Look up the commitment the chain reported
    pub fn get(&self, hash: &str) -> Option<&PrevoteCommitment> {
        self.0.get(hash)
    }

    /// Drop commitments two or more periods old: their reveal window has
    /// passed and they can never be disclosed
    pub fn gc(&mut self, current_period: u64) {
        self.0
            .retain(|_, commitment| commitment.period + 2 > current_period);
    }

    /// Number of remembered commitments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Is the memory empty?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Transaction kinds the voter broadcasts
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum TxKind {
    Vote,
    Prevote,
}

impl Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TxKind::Vote => "vote",
            TxKind::Prevote => "prevote",
        })
    }
}

/// Terra exchange rate oracle voter state machine.
///
/// Driven by height ticks from the outer polling loop. All state lives on
/// this struct and is only mutated from the driving task; concurrency is
/// confined to fan-out of independent queries which are joined before any
/// mutation.
pub struct ExchangeRateOracle {
    lcd: Arc<dyn LcdApi>,
    wallet: Wallet,
    markets: MarketSet,

    chain_id: String,
    validator: String,
    fee: StdFee,
    vote_period: u64,

    current_height: u64,
    current_vote_period: u64,
    current_chain_rates: Vec<ExchangeRate>,

    prevote_memory: PrevoteMemory,
    pending_votes: PendingQueue,
    pending_prevotes: PendingQueue,
    hist_votes: TxHistory,
    hist_prevotes: TxHistory,
}

impl ExchangeRateOracle {
    /// Create a new voter for the validator in `config`
    pub fn new(
        lcd: Arc<dyn LcdApi>,
        wallet: Wallet,
        markets: MarketSet,
        config: &NetworkConfig,
    ) -> Self {
        Self {
            lcd,
            wallet,
            markets,
            chain_id: config.chain_id.clone(),
            validator: config.validator.clone(),
            fee: StdFee::new(config.fee.denom.clone(), config.fee.amount, config.fee.gas),
            vote_period: config.vote_period,
            current_height: 0,
            current_vote_period: 0,
            current_chain_rates: vec![],
            prevote_memory: PrevoteMemory::default(),
            pending_votes: PendingQueue::default(),
            pending_prevotes: PendingQueue::default(),
            hist_votes: TxHistory::default(),
            hist_prevotes: TxHistory::default(),
        }
    }

    /// Poll the node for the latest height and advance the machine
    pub async fn poll(&mut self) -> Result<(), Error> {
        let height = self.lcd.latest_block_height().await?;
        self.tick(height).await;
        Ok(())
    }

    /// Advance to `height`. Ticks at or below the current height are
    /// dropped, so heights are processed in strictly increasing order.
    pub async fn tick(&mut self, height: u64) {
        if height <= self.current_height {
            return;
        }

        self.current_height = height;
        self.new_height(height).await;
    }

    async fn new_height(&mut self, height: u64) {
        self.check_pending(height).await;
        self.log_status(height);

        let vote_period = height / self.vote_period;
        if vote_period > self.current_vote_period {
            self.current_vote_period = vote_period;

            // A height jump across several boundaries is a single period
            // transition; commitments whose reveal window passed are dropped
            self.prevote_memory.gc(vote_period);

            if let Err(err) = self.new_vote_period(height).await {
                warn!("vote period {} skipped: {}", vote_period, err);
            }
        }
    }

    /// Run one vote period: reveal the prior commitments, then commit to
    /// fresh rates. A pre-flight failure aborts the whole period without
    /// consuming any sequence.
    async fn new_vote_period(&mut self, height: u64) -> Result<(), Error> {
        let lcd = &self.lcd;
        let wallet = &mut self.wallet;
        let (actives, rates, _) = tokio::try_join!(
            lcd.oracle_active_denoms(),
            lcd.oracle_rates(),
            wallet.sync_state(&**lcd),
        )?;

        self.current_chain_rates = rates;

        let calc_denoms: Vec<Denom> = actives
            .into_iter()
            .filter(|denom| self.markets.supports(denom))
            .collect();

        info!(
            "vote period {} (height {}): {} denom(s) to vote on",
            self.current_vote_period,
            height,
            calc_denoms.len()
        );

        self.reveal_phase(height, &calc_denoms).await;

        tokio::time::delay_for(INTER_TX_DELAY).await;

        self.commit_phase(height, &calc_denoms).await;

        Ok(())
    }

    /// Reveal the rates committed in the prior period (vote tx, sequence `s`).
    ///
    /// The chain is queried for the prevote hash it recorded per denom; a
    /// denom is revealed only if that hash is found in the prevote memory.
    async fn reveal_phase(&mut self, height: u64, denoms: &[Denom]) {
        let mut builder = self.tx_builder();

        let lcd = &self.lcd;
        let validator = &self.validator;
        let feeder = &self.wallet.account_addr;
        let memory = &self.prevote_memory;

        let msgs = futures::future::join_all(denoms.iter().map(|denom| async move {
            let prevotes = match lcd.oracle_prevotes(denom, validator).await {
                Ok(prevotes) => prevotes,
                Err(err) => {
                    warn!("prevote query for {} failed: {}", denom, err);
                    return None;
                }
            };

            let recorded = prevotes.first()?;
            let commitment = memory.get(&recorded.hash)?;

            Some(MsgExchangeRateVote {
                exchange_rate: commitment.rate,
                salt: commitment.salt.clone(),
                denom: denom.clone(),
                feeder: feeder.clone(),
                validator: validator.clone(),
            })
        }))
        .await;

        for msg in msgs.into_iter().flatten() {
            builder.append_vote_msg(&msg);
        }

        if builder.is_empty() {
            return;
        }

        self.broadcast(builder, TxKind::Vote, height).await;
    }

    /// Commit to freshly aggregated rates (prevote tx, sequence `s+1`)
    async fn commit_phase(&mut self, height: u64, denoms: &[Denom]) {
        let mut builder = self.tx_builder();

        let markets = &self.markets;
        let aggregates = futures::future::join_all(denoms.iter().map(|denom| async move {
            (denom, markets.aggregate(denom).await)
        }))
        .await;

        for (denom, result) in aggregates {
            let rate = match result {
                Ok(rate) => rate,
                Err(err) => {
                    warn!("aggregation for {} failed: {}", denom, err);
                    continue;
                }
            };

            if rate.is_abstain() {
                info!("abstaining from {} this period", denom);
                continue;
            }

            if let Some(chain_rate) = self.chain_rate(denom) {
                debug!("{}: market={} chain={}", denom, rate, chain_rate);
            }

            let vote = MsgExchangeRateVote {
                exchange_rate: rate,
                salt: MsgExchangeRateVote::random_salt(),
                denom: denom.clone(),
                feeder: self.wallet.account_addr.clone(),
                validator: self.validator.clone(),
            };

            let prevote = vote.prevote();
            self.prevote_memory.insert(
                prevote.hash.clone(),
                PrevoteCommitment {
                    rate,
                    salt: vote.salt.clone(),
                    period: self.current_vote_period,
                },
            );

            builder.append_prevote_msg(&prevote);
        }

        if builder.is_empty() {
            return;
        }

        self.broadcast(builder, TxKind::Prevote, height).await;
    }

    /// Sign and broadcast the accumulated messages, then enqueue the
    /// transaction hash for a deferred result query.
    ///
    /// A transport failure still consumes the sequence: the node may have
    /// admitted the transaction before the connection dropped, and a reused
    /// sequence would void the following commit as well.
    async fn broadcast(&mut self, builder: TxBuilder, kind: TxKind, height: u64) {
        let signed = match self.wallet.sign_tx(&builder).await {
            Ok(signed) => signed,
            Err(err) => {
                // Nothing was broadcast: the sequence is not consumed
                error!("signing {} tx failed: {}", kind, err);
                return;
            }
        };

        let msgs = signed.value.msg.clone();

        match self.lcd.broadcast(BroadcastTx::sync(signed.value)).await {
            Ok(response) => {
                info!(
                    "{} tx {} broadcast at height {} (seq {})",
                    kind,
                    response.txhash,
                    height,
                    builder.sequence()
                );

                let queue = match kind {
                    TxKind::Vote => &mut self.pending_votes,
                    TxKind::Prevote => &mut self.pending_prevotes,
                };
                queue.push(height + TX_RESULT_DELAY, response.txhash.clone());

                self.history_mut(kind).record_sent(response.txhash, msgs, height);
                self.wallet.sequence += 1;
            }
            Err(err) => {
                warn!("{} tx broadcast failed: {}", kind, err);
                self.history_mut(kind)
                    .record_failed_broadcast(msgs, height, err.to_string());
                self.wallet.sequence += 1;
            }
        }
    }

    /// Query the results of broadcast transactions whose delay has elapsed.
    ///
    /// Only the head of each queue is examined per tick; a failed query is
    /// put back and retried on the next tick.
    async fn check_pending(&mut self, height: u64) {
        for kind in &[TxKind::Vote, TxKind::Prevote] {
            let due = self.pending_mut(*kind).pop_due(height);

            if let Some(pending) = due {
                match self.lcd.tx(&pending.tx_hash).await {
                    Ok(result) => {
                        self.history_mut(*kind)
                            .record_result(&pending.tx_hash, &result.logs);
                    }
                    Err(err) => {
                        warn!(
                            "result query for {} tx {} failed: {}",
                            kind, pending.tx_hash, err
                        );
                        self.pending_mut(*kind).requeue(pending);
                    }
                }
            }
        }
    }

    /// Log the recent vote/prevote history
    fn log_status(&self, height: u64) {
        info!("height {} (vote period {})", height, self.current_vote_period);
        Self::log_history("vote", &self.hist_votes);
        Self::log_history("prevote", &self.hist_prevotes);
    }

    fn log_history(kind: &str, history: &TxHistory) {
        for entry in history.entries() {
            let tx_hash = if entry.tx_hash.is_empty() {
                "unbroadcast"
            } else {
                &entry.tx_hash
            };

            info!("{} [{}] sent at {}", kind, tx_hash, entry.sent_height);

            for msg in &entry.msgs {
                let value = &msg["value"];
                if msg["type"] == "oracle/MsgExchangeRateVote" {
                    info!(
                        "-- px {} salt {} denom {}",
                        value["exchange_rate"], value["salt"], value["denom"]
                    );
                } else {
                    info!("-- hash {} denom {}", value["hash"], value["denom"]);
                }
            }

            if let Some(success) = entry.result {
                info!("-- result: {}", success);
                for (msg_index, log) in &entry.failed_logs {
                    info!("-- failed msg {}: {}", msg_index, log);
                }
            }
        }
    }

    fn tx_builder(&self) -> TxBuilder {
        TxBuilder::new(
            self.chain_id.clone(),
            self.wallet.account_number,
            self.wallet.sequence,
            MEMO,
            self.fee.clone(),
        )
    }

    fn chain_rate(&self, denom: &Denom) -> Option<Rate> {
        self.current_chain_rates
            .iter()
            .find(|rate| &rate.denom == denom)
            .map(|rate| rate.amount)
    }

    fn pending_mut(&mut self, kind: TxKind) -> &mut PendingQueue {
        match kind {
            TxKind::Vote => &mut self.pending_votes,
            TxKind::Prevote => &mut self.pending_prevotes,
        }
    }

    fn history_mut(&mut self, kind: TxKind) -> &mut TxHistory {
        match kind {
            TxKind::Vote => &mut self.hist_votes,
            TxKind::Prevote => &mut self.hist_prevotes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExchangeRateOracle, PrevoteCommitment, PrevoteMemory};
    use crate::{
        config::network::NetworkConfig,
        networks::terra::{
            lcd::{
                AccountInfo, BroadcastResponse, ExchangeRate, LcdApi, Prevote, TxLog, TxResult,
                Vote,
            },
            msg,
            tx::{BroadcastTx, StdTx},
        },
        sources::{Feed, Market, MarketSet},
        wallet::{Signer, Wallet},
        Denom, Error, ErrorKind, Map, Rate,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const VALIDATOR: &str = "terravaloper1v5hrqlv8dqgzvy0pwzqzg0gxy899rm4kdur03x";
    const FEEDER: &str = "terra1v5hrqlv8dqgzvy0pwzqzg0gxy899rm4k8kpzy9";
    const INITIAL_SEQUENCE: u64 = 7;

    #[derive(Default)]
    struct MockLcd {
        height: Mutex<u64>,
        actives: Mutex<Vec<Denom>>,
        rates: Mutex<Vec<ExchangeRate>>,
        prevotes: Mutex<Map<Denom, Vec<Prevote>>>,
        tx_results: Mutex<Map<String, TxResult>>,
        broadcasts: Mutex<Vec<BroadcastTx>>,
        tx_queries: Mutex<Vec<String>>,
        chain_sequence: Mutex<u64>,
        fail_broadcasts: Mutex<u32>,
        fail_preflight: Mutex<bool>,
    }

    impl MockLcd {
        fn new(actives: &[&str]) -> Arc<Self> {
            let lcd = MockLcd::default();
            *lcd.chain_sequence.lock().unwrap() = INITIAL_SEQUENCE;
            lcd.set_actives(actives);
            Arc::new(lcd)
        }

        fn set_actives(&self, actives: &[&str]) {
            *self.actives.lock().unwrap() =
                actives.iter().map(|s| s.parse().unwrap()).collect();
        }

        fn set_prevote(&self, denom: &str, hash: &str) {
            self.prevotes.lock().unwrap().insert(
                denom.parse().unwrap(),
                vec![Prevote {
                    hash: hash.to_owned(),
                    denom: Some(denom.parse().unwrap()),
                    submit_block: None,
                }],
            );
        }

        fn broadcasts(&self) -> Vec<BroadcastTx> {
            self.broadcasts.lock().unwrap().clone()
        }

        fn sequence_of(broadcast: &BroadcastTx) -> u64 {
            broadcast.tx.signatures[0]["sequence"]
                .as_str()
                .unwrap()
                .parse()
                .unwrap()
        }
    }

    #[async_trait]
    impl LcdApi for MockLcd {
        async fn latest_block_height(&self) -> Result<u64, Error> {
            Ok(*self.height.lock().unwrap())
        }

        async fn account(&self, _addr: &str) -> Result<AccountInfo, Error> {
            Ok(AccountInfo {
                account_number: 42,
                sequence: *self.chain_sequence.lock().unwrap(),
            })
        }

        async fn oracle_rates(&self) -> Result<Vec<ExchangeRate>, Error> {
            Ok(self.rates.lock().unwrap().clone())
        }

        async fn oracle_active_denoms(&self) -> Result<Vec<Denom>, Error> {
            if *self.fail_preflight.lock().unwrap() {
                return Err(ErrorKind::Http.context("connection refused").into());
            }
            Ok(self.actives.lock().unwrap().clone())
        }

        async fn oracle_prevotes(
            &self,
            denom: &Denom,
            _validator: &str,
        ) -> Result<Vec<Prevote>, Error> {
            Ok(self
                .prevotes
                .lock()
                .unwrap()
                .get(denom)
                .cloned()
                .unwrap_or_default())
        }

        async fn oracle_votes(
            &self,
            _denom: &Denom,
            _validator: &str,
        ) -> Result<Vec<Vote>, Error> {
            Ok(vec![])
        }

        async fn tx(&self, hash: &str) -> Result<TxResult, Error> {
            self.tx_queries.lock().unwrap().push(hash.to_owned());
            Ok(self
                .tx_results
                .lock()
                .unwrap()
                .get(hash)
                .cloned()
                .unwrap_or_else(|| TxResult {
                    logs: vec![TxLog {
                        msg_index: 0,
                        success: true,
                        log: String::new(),
                    }],
                }))
        }

        async fn broadcast(&self, tx: BroadcastTx) -> Result<BroadcastResponse, Error> {
            let mut failures = self.fail_broadcasts.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ErrorKind::Http.context("connection reset by peer").into());
            }

            let mut broadcasts = self.broadcasts.lock().unwrap();
            broadcasts.push(tx);
            *self.chain_sequence.lock().unwrap() += 1;

            Ok(BroadcastResponse {
                txhash: format!("TX{}", broadcasts.len()),
            })
        }
    }

    /// Pass-through signer which stamps the signing context into the
    /// signatures for inspection
    struct MockSigner;

    #[async_trait]
    impl Signer for MockSigner {
        async fn offline_sign(
            &self,
            mut tx: StdTx,
            chain_id: &str,
            account_number: u64,
            sequence: u64,
        ) -> Result<StdTx, Error> {
            tx.value.signatures.push(json!({
                "chain_id": chain_id,
                "account_number": account_number.to_string(),
                "sequence": sequence.to_string(),
                "signature": "00",
            }));
            Ok(tx)
        }
    }

    fn constant_feed(rate: &'static str) -> Feed {
        Box::new(move || Box::pin(async move { Ok(rate.parse::<Rate>().unwrap()) }))
    }

    fn failing_feed() -> Feed {
        Box::new(|| Box::pin(async { Err(ErrorKind::Source.context("feed offline").into()) }))
    }

    fn market_set(feeds: Vec<(&str, Feed)>) -> MarketSet {
        let mut set = MarketSet::default();
        for (denom, feed) in feeds {
            set.add(denom.parse().unwrap(), vec![Market { feed, weight: 100 }])
                .unwrap();
        }
        set
    }

    fn oracle(lcd: Arc<MockLcd>, markets: MarketSet) -> ExchangeRateOracle {
        let config = NetworkConfig {
            validator: VALIDATOR.to_owned(),
            vote_period: 5,
            ..Default::default()
        };

        ExchangeRateOracle::new(
            lcd,
            Wallet::new(FEEDER, Box::new(MockSigner)),
            markets,
            &config,
        )
    }

    fn prevote_hash(broadcast: &BroadcastTx) -> String {
        broadcast.tx.msg[0]["value"]["hash"]
            .as_str()
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn first_period_commits_without_reveal() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        oracle.tick(5).await;

        let broadcasts = lcd.broadcasts();
        assert_eq!(broadcasts.len(), 1);

        let commit = &broadcasts[0];
        assert_eq!(commit.mode, "sync");
        assert_eq!(commit.tx.msg.len(), 1);
        assert_eq!(commit.tx.msg[0]["type"], "oracle/MsgExchangeRatePrevote");
        assert_eq!(commit.tx.msg[0]["value"]["denom"], "uusd");
        assert_eq!(commit.tx.msg[0]["value"]["feeder"], FEEDER);
        assert_eq!(commit.tx.msg[0]["value"]["validator"], VALIDATOR);
        assert_eq!(MockLcd::sequence_of(commit), INITIAL_SEQUENCE);

        // The committed hash reproduces from the remembered rate and salt
        let hash = prevote_hash(commit);
        assert_eq!(hash.len(), 40);
        let commitment = oracle.prevote_memory.get(&hash).unwrap();
        assert_eq!(commitment.rate.to_string(), "250.000000000000000000");
        assert_eq!(
            msg::vote_hash(
                &commitment.salt,
                commitment.rate,
                &"uusd".parse().unwrap(),
                VALIDATOR
            ),
            hash
        );

        assert_eq!(oracle.pending_prevotes.len(), 1);
        assert_eq!(oracle.wallet.sequence, INITIAL_SEQUENCE + 1);
    }

    #[tokio::test]
    async fn second_period_reveals_prior_commitment() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        oracle.tick(5).await;

        let hash = prevote_hash(&lcd.broadcasts()[0]);
        let salt = oracle.prevote_memory.get(&hash).unwrap().salt.clone();
        lcd.set_prevote("uusd", &hash);

        oracle.tick(10).await;

        let broadcasts = lcd.broadcasts();
        assert_eq!(broadcasts.len(), 3);

        let reveal = &broadcasts[1];
        assert_eq!(reveal.tx.msg.len(), 1);
        assert_eq!(reveal.tx.msg[0]["type"], "oracle/MsgExchangeRateVote");
        assert_eq!(
            reveal.tx.msg[0]["value"]["exchange_rate"],
            "250.000000000000000000"
        );
        assert_eq!(reveal.tx.msg[0]["value"]["salt"], salt.as_str());

        // Reveal uses sequence s, the following commit s+1
        let commit = &broadcasts[2];
        assert_eq!(MockLcd::sequence_of(reveal), INITIAL_SEQUENCE + 1);
        assert_eq!(MockLcd::sequence_of(commit), INITIAL_SEQUENCE + 2);

        // The first period's prevote result was queried after the delay
        assert_eq!(lcd.tx_queries.lock().unwrap().as_slice(), ["TX1"]);
        let entry = oracle.hist_prevotes.entries().next().unwrap();
        assert_eq!(entry.result, Some(true));
    }

    #[tokio::test]
    async fn added_denom_is_committed_but_not_revealed() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![
                ("uusd", constant_feed("250")),
                ("ukrw", constant_feed("8500")),
            ]),
        );

        oracle.tick(5).await;

        let hash = prevote_hash(&lcd.broadcasts()[0]);
        lcd.set_prevote("uusd", &hash);
        lcd.set_actives(&["uusd", "ukrw"]);

        oracle.tick(10).await;

        let broadcasts = lcd.broadcasts();
        assert_eq!(broadcasts.len(), 3);

        let reveal = &broadcasts[1];
        assert_eq!(reveal.tx.msg.len(), 1);
        assert_eq!(reveal.tx.msg[0]["value"]["denom"], "uusd");

        let commit = &broadcasts[2];
        assert_eq!(commit.tx.msg.len(), 2);
        let denoms: Vec<_> = commit
            .tx
            .msg
            .iter()
            .map(|msg| msg["value"]["denom"].as_str().unwrap().to_owned())
            .collect();
        assert!(denoms.contains(&"uusd".to_owned()));
        assert!(denoms.contains(&"ukrw".to_owned()));
    }

    #[tokio::test]
    async fn failed_feed_skips_denom_only() {
        let lcd = MockLcd::new(&["uusd", "ukrw"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250")), ("ukrw", failing_feed())]),
        );

        oracle.tick(5).await;

        let broadcasts = lcd.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].tx.msg.len(), 1);
        assert_eq!(broadcasts[0].tx.msg[0]["value"]["denom"], "uusd");
        assert_eq!(oracle.prevote_memory.len(), 1);
    }

    #[tokio::test]
    async fn abstain_sentinel_skips_commit() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(lcd.clone(), market_set(vec![("uusd", constant_feed("-1"))]));

        oracle.tick(5).await;

        assert!(lcd.broadcasts().is_empty());
        assert!(oracle.prevote_memory.is_empty());
        assert_eq!(oracle.wallet.sequence, INITIAL_SEQUENCE);
    }

    #[tokio::test]
    async fn broadcast_transport_error_still_advances_sequence() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        oracle.tick(5).await;
        let hash = prevote_hash(&lcd.broadcasts()[0]);
        lcd.set_prevote("uusd", &hash);

        // The reveal's POST fails in transport; the commit must still go
        // out with the next sequence
        *lcd.fail_broadcasts.lock().unwrap() = 1;
        oracle.tick(10).await;

        let broadcasts = lcd.broadcasts();
        assert_eq!(broadcasts.len(), 2);
        assert_eq!(
            MockLcd::sequence_of(&broadcasts[1]),
            INITIAL_SEQUENCE + 2
        );
        assert_eq!(oracle.wallet.sequence, INITIAL_SEQUENCE + 3);

        let entry = oracle.hist_votes.entries().next().unwrap();
        assert!(entry.tx_hash.is_empty());
        assert_eq!(entry.result, Some(false));
        assert!(!entry.failed_logs.is_empty());
    }

    #[tokio::test]
    async fn rejected_tx_is_recorded_without_retry() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        oracle.tick(5).await;

        lcd.tx_results.lock().unwrap().insert(
            "TX1".to_owned(),
            TxResult {
                logs: vec![TxLog {
                    msg_index: 0,
                    success: false,
                    log: "prevote period mismatch".to_owned(),
                }],
            },
        );

        // Height 9 = broadcast height + delay, still within period 1
        oracle.tick(9).await;

        assert_eq!(lcd.broadcasts().len(), 1);
        let entry = oracle.hist_prevotes.entries().next().unwrap();
        assert_eq!(entry.result, Some(false));
        assert_eq!(
            entry.failed_logs,
            vec![(0, "prevote period mismatch".to_owned())]
        );
        assert!(oracle.pending_prevotes.is_empty());
    }

    #[tokio::test]
    async fn no_supported_overlap_emits_nothing() {
        let lcd = MockLcd::new(&["umnt"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        oracle.tick(5).await;

        assert!(lcd.broadcasts().is_empty());
        assert_eq!(oracle.wallet.sequence, INITIAL_SEQUENCE);
    }

    #[tokio::test]
    async fn period_skip_drops_stale_commitments() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        oracle.tick(5).await;
        let stale_hash = prevote_hash(&lcd.broadcasts()[0]);
        lcd.set_prevote("uusd", &stale_hash);

        // Jump from period 1 to period 5: one transition, no reveal even
        // though the chain still reports the old prevote
        oracle.tick(27).await;
        assert_eq!(oracle.current_vote_period, 5);

        let broadcasts = lcd.broadcasts();
        assert_eq!(broadcasts.len(), 2);
        assert_eq!(
            broadcasts[1].tx.msg[0]["type"],
            "oracle/MsgExchangeRatePrevote"
        );

        // Only the fresh commitment survives
        assert_eq!(oracle.prevote_memory.len(), 1);
        assert!(oracle.prevote_memory.get(&stale_hash).is_none());
    }

    #[tokio::test]
    async fn preflight_failure_skips_period() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        *lcd.fail_preflight.lock().unwrap() = true;
        oracle.tick(5).await;

        assert!(lcd.broadcasts().is_empty());
        assert_eq!(oracle.current_vote_period, 1);
        assert_eq!(oracle.wallet.sequence, 0);

        // The next period proceeds normally
        *lcd.fail_preflight.lock().unwrap() = false;
        oracle.tick(10).await;
        assert_eq!(lcd.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn stale_ticks_are_dropped() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        oracle.tick(10).await;
        assert_eq!(oracle.current_height, 10);
        assert_eq!(lcd.broadcasts().len(), 1);

        oracle.tick(10).await;
        oracle.tick(7).await;

        assert_eq!(oracle.current_height, 10);
        assert_eq!(oracle.current_vote_period, 2);
        assert_eq!(lcd.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn poll_feeds_latest_height() {
        let lcd = MockLcd::new(&["uusd"]);
        let mut oracle = oracle(
            lcd.clone(),
            market_set(vec![("uusd", constant_feed("250"))]),
        );

        *lcd.height.lock().unwrap() = 5;
        oracle.poll().await.unwrap();

        assert_eq!(oracle.current_height, 5);
        assert_eq!(lcd.broadcasts().len(), 1);
    }

    #[test]
    fn memory_gc_keeps_two_periods() {
        let mut memory = PrevoteMemory::default();
        for period in 1..=3 {
            memory.insert(
                format!("hash{}", period),
                PrevoteCommitment {
                    rate: "250".parse().unwrap(),
                    salt: "ab12".to_owned(),
                    period,
                },
            );
        }

        memory.gc(3);
        assert_eq!(memory.len(), 2);
        assert!(memory.get("hash1").is_none());
        assert!(memory.get("hash2").is_some());
        assert!(memory.get("hash3").is_some());
    }
}
