//! Standard transaction (`core/StdTx`) wire types and the builder that
//! accumulates oracle messages into a signable payload

use super::msg::{MsgExchangeRatePrevote, MsgExchangeRateVote};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fee coin amount
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Coin {
    /// Fee denomination
    pub denom: String,

    /// Amount of the fee denomination
    pub amount: String,
}

/// StdTx fee
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StdFee {
    /// Fee coins
    pub amount: Vec<Coin>,

    /// Gas allotment
    pub gas: String,
}

impl StdFee {
    /// Fee paying `amount` of `denom` with the given gas allotment
    pub fn new(denom: impl Into<String>, amount: u64, gas: u64) -> Self {
        Self {
            amount: vec![Coin {
                denom: denom.into(),
                amount: amount.to_string(),
            }],
            gas: gas.to_string(),
        }
    }
}

/// StdTx contents: what gets signed, and (with signatures populated)
/// what gets broadcast
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StdTxValue {
    /// Messages, in submission order
    pub msg: Vec<Value>,

    /// Transaction fee
    pub fee: StdFee,

    /// Memo
    pub memo: String,

    /// Signatures (empty until the wallet signs)
    pub signatures: Vec<Value>,
}

/// Wire-format standard transaction
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StdTx {
    /// Amino type tag (`core/StdTx`)
    #[serde(rename = "type")]
    pub type_name: String,

    /// Transaction contents
    pub value: StdTxValue,
}

impl StdTx {
    /// Wrap `value` in the `core/StdTx` envelope
    pub fn new(value: StdTxValue) -> Self {
        Self {
            type_name: "core/StdTx".to_owned(),
            value,
        }
    }
}

/// Broadcast-ready form: the signed `StdTx` contents plus the broadcast mode
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BroadcastTx {
    /// Signed transaction contents
    pub tx: StdTxValue,

    /// Broadcast mode
    pub mode: String,
}

impl BroadcastTx {
    /// `sync` mode: the node accepts the transaction into its mempool
    /// before responding
    pub fn sync(tx: StdTxValue) -> Self {
        Self {
            tx,
            mode: "sync".to_owned(),
        }
    }
}

/// Accumulates oracle messages into a signable transaction.
///
/// One builder per transaction: the voter builds a vote builder and a
/// prevote builder each period, each pinned to the account sequence it
/// will be signed with.
#[derive(Clone, Debug)]
pub struct TxBuilder {
    chain_id: String,
    account_number: u64,
    sequence: u64,
    memo: String,
    fee: StdFee,
    msgs: Vec<Value>,
}

impl TxBuilder {
    /// Create a new builder for the given signing context
    pub fn new(
        chain_id: impl Into<String>,
        account_number: u64,
        sequence: u64,
        memo: impl Into<String>,
        fee: StdFee,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            account_number,
            sequence,
            memo: memo.into(),
            fee,
            msgs: vec![],
        }
    }

    /// Append a reveal (vote) message
    pub fn append_vote_msg(&mut self, msg: &MsgExchangeRateVote) {
        self.msgs.push(msg.to_json_value());
    }

    /// Append a commitment (prevote) message
    pub fn append_prevote_msg(&mut self, msg: &MsgExchangeRatePrevote) {
        self.msgs.push(msg.to_json_value());
    }

    /// Have any messages been appended?
    pub fn is_empty(&self) -> bool {
        self.msgs.is_empty()
    }

    /// Chain ID this transaction will be signed for
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Account number this transaction will be signed with
    pub fn account_number(&self) -> u64 {
        self.account_number
    }

    /// Account sequence this transaction will be signed with
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Unsigned payload handed to the wallet for offline signing
    pub fn to_sign_payload(&self) -> StdTx {
        StdTx::new(StdTxValue {
            msg: self.msgs.clone(),
            fee: self.fee.clone(),
            memo: self.memo.clone(),
            signatures: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{StdFee, TxBuilder};
    use crate::networks::terra::msg::MsgExchangeRatePrevote;

    #[test]
    fn sign_payload_shape() {
        let mut builder = TxBuilder::new(
            "columbus-4",
            42,
            7,
            "pythia/test",
            StdFee::new("uluna", 1_000, 200_000),
        );
        assert!(builder.is_empty());

        builder.append_prevote_msg(&MsgExchangeRatePrevote {
            hash: "12e0c2ed3aad07c399c24f56227229b15613a1bc".to_owned(),
            denom: "uusd".parse().unwrap(),
            feeder: "terra1feeder".to_owned(),
            validator: "terravaloper1validator".to_owned(),
        });
        assert!(!builder.is_empty());
        assert_eq!(builder.sequence(), 7);

        let payload = serde_json::to_value(builder.to_sign_payload()).unwrap();
        assert_eq!(payload["type"], "core/StdTx");
        assert_eq!(payload["value"]["memo"], "pythia/test");
        assert_eq!(payload["value"]["fee"]["gas"], "200000");
        assert_eq!(payload["value"]["fee"]["amount"][0]["denom"], "uluna");
        assert_eq!(payload["value"]["fee"]["amount"][0]["amount"], "1000");
        assert_eq!(payload["value"]["msg"].as_array().unwrap().len(), 1);
        assert_eq!(
            payload["value"]["signatures"].as_array().unwrap().len(),
            0
        );
    }

    #[test]
    fn broadcast_envelope() {
        let builder = TxBuilder::new(
            "columbus-4",
            42,
            7,
            "",
            StdFee::new("uluna", 1_000, 200_000),
        );
        let broadcast =
            serde_json::to_value(super::BroadcastTx::sync(builder.to_sign_payload().value))
                .unwrap();
        assert_eq!(broadcast["mode"], "sync");
        assert!(broadcast["tx"]["msg"].as_array().unwrap().is_empty());
    }
}
