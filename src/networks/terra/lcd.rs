//! Terra LCD (light client daemon) REST gateway client

use super::{denom::Denom, tx::BroadcastTx};
use crate::{http_client::HttpClient, Error, ErrorKind, Rate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Typed facade over the LCD node's query/broadcast surface
#[async_trait]
pub trait LcdApi: Send + Sync {
    /// Height of the latest committed block
    async fn latest_block_height(&self) -> Result<u64, Error>;

    /// Account number and sequence for `addr`
    async fn account(&self, addr: &str) -> Result<AccountInfo, Error>;

    /// Current on-chain exchange rates
    async fn oracle_rates(&self) -> Result<Vec<ExchangeRate>, Error>;

    /// Denoms the oracle currently accepts votes for
    async fn oracle_active_denoms(&self) -> Result<Vec<Denom>, Error>;

    /// Outstanding prevotes for `denom` by `validator`
    async fn oracle_prevotes(&self, denom: &Denom, validator: &str)
        -> Result<Vec<Prevote>, Error>;

    /// Submitted votes for `denom` by `validator`
    async fn oracle_votes(&self, denom: &Denom, validator: &str) -> Result<Vec<Vote>, Error>;

    /// Per-message result logs of a broadcast transaction
    async fn tx(&self, hash: &str) -> Result<TxResult, Error>;

    /// Broadcast a signed transaction. `sync` mode: a success response
    /// means the node accepted it into its mempool, not that it executed.
    async fn broadcast(&self, tx: BroadcastTx) -> Result<BroadcastResponse, Error>;
}

/// LCD client for a single node
pub struct LcdClient {
    http_client: HttpClient,
    actives_path: String,
}

impl LcdClient {
    /// Create a new LCD client for the node at `addr`
    pub fn new(
        addr: impl Into<String>,
        actives_path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: HttpClient::new(addr, timeout),
            actives_path: actives_path.into(),
        }
    }
}

#[async_trait]
impl LcdApi for LcdClient {
    async fn latest_block_height(&self) -> Result<u64, Error> {
        let response: LatestBlockResponse = self.http_client.get_json("/blocks/latest").await?;
        response
            .block_meta
            .header
            .height
            .parse()
            .map_err(|e| ErrorKind::Decode.context(e).into())
    }

    async fn account(&self, addr: &str) -> Result<AccountInfo, Error> {
        let response: AccountResponse = self
            .http_client
            .get_json(&format!("/auth/accounts/{}", addr))
            .await?;

        Ok(AccountInfo {
            account_number: response
                .account_number
                .parse()
                .map_err(|e| ErrorKind::Decode.context(e))?,
            sequence: response
                .sequence
                .parse()
                .map_err(|e| ErrorKind::Decode.context(e))?,
        })
    }

    async fn oracle_rates(&self) -> Result<Vec<ExchangeRate>, Error> {
        let response: OracleRatesResponse = self
            .http_client
            .get_json("/oracle/denoms/exchange_rates")
            .await?;
        Ok(response.result)
    }

    async fn oracle_active_denoms(&self) -> Result<Vec<Denom>, Error> {
        let response: ActiveDenomsResponse =
            self.http_client.get_json(&self.actives_path).await?;
        Ok(response.result)
    }

    async fn oracle_prevotes(
        &self,
        denom: &Denom,
        validator: &str,
    ) -> Result<Vec<Prevote>, Error> {
        let response: PrevotesResponse = self
            .http_client
            .get_json(&format!("/oracle/denoms/{}/prevotes/{}", denom, validator))
            .await?;
        Ok(response.result)
    }

    async fn oracle_votes(&self, denom: &Denom, validator: &str) -> Result<Vec<Vote>, Error> {
        let response: VotesResponse = self
            .http_client
            .get_json(&format!("/oracle/denoms/{}/votes/{}", denom, validator))
            .await?;
        Ok(response.result)
    }

    async fn tx(&self, hash: &str) -> Result<TxResult, Error> {
        self.http_client.get_json(&format!("/txs/{}", hash)).await
    }

    async fn broadcast(&self, tx: BroadcastTx) -> Result<BroadcastResponse, Error> {
        self.http_client.post_json("/txs", &tx).await
    }
}

/// Account number and sequence of the feeder account
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AccountInfo {
    /// On-chain account number
    pub account_number: u64,

    /// Next account sequence
    pub sequence: u64,
}

/// One on-chain exchange rate
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExchangeRate {
    /// Denomination
    pub denom: Denom,

    /// Rate the chain last accepted
    pub amount: Rate,
}

/// Prevote recorded by the chain
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Prevote {
    /// Commitment hash (40 hex characters)
    pub hash: String,

    /// Denomination
    #[serde(default)]
    pub denom: Option<Denom>,

    /// Height the prevote was submitted at
    #[serde(default)]
    pub submit_block: Option<String>,
}

/// Vote recorded by the chain
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Vote {
    /// Disclosed exchange rate
    pub exchange_rate: Rate,

    /// Denomination
    #[serde(default)]
    pub denom: Option<Denom>,
}

/// Per-message execution log
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TxLog {
    /// Index of the message within the transaction
    pub msg_index: u64,

    /// Did the message execute successfully?
    pub success: bool,

    /// Raw log output
    pub log: String,
}

/// Result logs of an executed transaction
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TxResult {
    /// Per-message logs
    #[serde(default)]
    pub logs: Vec<TxLog>,
}

/// Broadcast acknowledgement
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BroadcastResponse {
    /// Hash assigned to the transaction
    pub txhash: String,
}

/// `GET /blocks/latest` response
#[derive(Clone, Debug, Deserialize)]
struct LatestBlockResponse {
    block_meta: BlockMeta,
}

#[derive(Clone, Debug, Deserialize)]
struct BlockMeta {
    header: BlockHeader,
}

#[derive(Clone, Debug, Deserialize)]
struct BlockHeader {
    height: String,
}

/// `GET /auth/accounts/{addr}` response
#[derive(Clone, Debug, Deserialize)]
struct AccountResponse {
    account_number: String,
    sequence: String,
}

#[derive(Clone, Debug, Deserialize)]
struct OracleRatesResponse {
    result: Vec<ExchangeRate>,
}

#[derive(Clone, Debug, Deserialize)]
struct ActiveDenomsResponse {
    result: Vec<Denom>,
}

#[derive(Clone, Debug, Deserialize)]
struct PrevotesResponse {
    result: Vec<Prevote>,
}

#[derive(Clone, Debug, Deserialize)]
struct VotesResponse {
    result: Vec<Vote>,
}

#[cfg(test)]
mod tests {
    use super::{LatestBlockResponse, PrevotesResponse, TxResult};

    #[test]
    fn decode_latest_block() {
        let response: LatestBlockResponse = serde_json::from_str(
            r#"{"block_meta": {"header": {"height": "2224568", "time": "2026-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();
        assert_eq!(response.block_meta.header.height, "2224568");
    }

    #[test]
    fn decode_prevotes() {
        let response: PrevotesResponse = serde_json::from_str(
            r#"{"result": [{"hash": "12e0c2ed3aad07c399c24f56227229b15613a1bc",
                            "denom": "uusd",
                            "voter": "terravaloper1xx",
                            "submit_block": "2224560"}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.result[0].hash,
            "12e0c2ed3aad07c399c24f56227229b15613a1bc"
        );
    }

    #[test]
    fn decode_tx_result() {
        let result: TxResult = serde_json::from_str(
            r#"{"logs": [{"msg_index": 0, "success": true, "log": ""},
                         {"msg_index": 1, "success": false, "log": "out of gas"}]}"#,
        )
        .unwrap();
        assert_eq!(result.logs.len(), 2);
        assert!(result.logs[0].success);
        assert!(!result.logs[1].success);
    }
}
