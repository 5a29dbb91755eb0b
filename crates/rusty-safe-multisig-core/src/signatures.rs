use std::collections::BTreeMap;

use alloy::primitives::{eip191_hash_message, Address, Bytes, PrimitiveSignature, B256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{codec, parse_address};
use crate::error::CoreError;

const EOA_SIGNATURE_LEN: usize = 65;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(with = "codec::address")]
    pub signer: Address,
    #[serde(with = "codec::hex_bytes")]
    pub data: Bytes,
    #[serde(default)]
    pub is_contract_signature: bool,
}

impl Signature {
    pub fn eoa(signer: Address, data: impl Into<Bytes>) -> Result<Self, CoreError> {
        let sig = Self {
            signer,
            data: data.into(),
            is_contract_signature: false,
        };
        sig.validate()?;
        Ok(sig)
    }

    /// EIP-1271 signature; `data` is whatever the owner contract's `isValidSignature` expects.
    pub fn contract(signer: Address, data: impl Into<Bytes>) -> Result<Self, CoreError> {
        let sig = Self {
            signer,
            data: data.into(),
            is_contract_signature: true,
        };
        sig.validate()?;
        Ok(sig)
    }

    /// `v = 1` slot: the account accepts it when `owner` is the executing sender.
    pub fn pre_validated(owner: Address) -> Self {
        let mut data = Vec::with_capacity(EOA_SIGNATURE_LEN);
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(owner.as_slice());
        data.extend_from_slice(&[0u8; 32]);
        data.push(1);
        Self {
            signer: owner,
            data: data.into(),
            is_contract_signature: false,
        }
    }

    /// Builds a signature from pasted text. Mixed-case signers must carry a valid checksum.
    pub fn from_parts(
        signer: &str,
        data: &str,
        is_contract_signature: bool,
    ) -> Result<Self, CoreError> {
        let signer = parse_address(signer)?;
        let data = codec::parse_bytes(data)?;
        if is_contract_signature {
            Self::contract(signer, data)
        } else {
            Self::eoa(signer, data)
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.signer == Address::ZERO {
            return Err(CoreError::validation("signer must not be the zero address"));
        }
        if !self.is_contract_signature && self.data.len() != EOA_SIGNATURE_LEN {
            return Err(CoreError::validation(format!(
                "EOA signature must be {EOA_SIGNATURE_LEN} bytes, got {}",
                self.data.len()
            )));
        }
        Ok(())
    }

    pub fn v(&self) -> Option<u8> {
        (!self.is_contract_signature)
            .then(|| self.data.get(EOA_SIGNATURE_LEN - 1).copied())
            .flatten()
    }

    /// Recovers the signer of an EOA signature over `digest`.
    ///
    /// `v` 27/28 signs the digest directly, 31/32 signs it through `eth_sign`.
    pub fn recover(&self, digest: B256) -> Result<Address, CoreError> {
        let v = self
            .v()
            .ok_or_else(|| CoreError::validation("contract signatures cannot be recovered"))?;
        let (prehash, y_parity) = match v {
            0 | 1 => {
                return Err(CoreError::validation(format!(
                    "v={v} signatures are not ECDSA signatures"
                )))
            }
            27 | 28 => (digest, v == 28),
            31 | 32 => (eip191_hash_message(digest.as_slice()), v == 32),
            other => return Err(CoreError::validation(format!("unsupported v value {other}"))),
        };
        let r = U256::from_be_slice(&self.data[0..32]);
        let s = U256::from_be_slice(&self.data[32..64]);
        PrimitiveSignature::new(r, s, y_parity)
            .recover_address_from_prehash(&prehash)
            .map_err(|e| CoreError::validation(format!("signature recovery failed: {e}")))
    }

    /// Checks that the signature belongs to `signer`. Contract signatures are accepted as-is.
    pub fn verify(&self, digest: B256) -> Result<(), CoreError> {
        if self.is_contract_signature {
            return Ok(());
        }
        if self.v() == Some(1) {
            let owner = Address::from_slice(&self.data[12..32]);
            if owner != self.signer {
                return Err(CoreError::validation(
                    "pre-validated signature does not name its signer",
                ));
            }
            return Ok(());
        }
        let recovered = self.recover(digest)?;
        if recovered != self.signer {
            return Err(CoreError::validation(format!(
                "signature recovers to {recovered}, expected {}",
                self.signer
            )));
        }
        Ok(())
    }

    /// Total order used to settle two different signatures from one signer.
    fn precedes(&self, other: &Self) -> bool {
        (self.is_contract_signature, self.data.as_ref())
            < (other.is_contract_signature, other.data.as_ref())
    }
}

/// At most one signature per signer, ordered by signer address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet(BTreeMap<Address, Signature>);

impl SignatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, signer: Address) -> Option<&Signature> {
        self.0.get(&signer)
    }

    pub fn contains(&self, signer: Address) -> bool {
        self.0.contains_key(&signer)
    }

    pub fn signers(&self) -> impl Iterator<Item = Address> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.0.values()
    }

    pub fn is_threshold_met(&self, threshold: u64) -> bool {
        self.0.len() as u64 >= threshold
    }

    /// Upsert. A later signature from the same signer replaces the earlier one.
    pub fn insert(&mut self, signature: Signature) {
        self.0.insert(signature.signer, signature);
    }

    pub fn with(mut self, signature: Signature) -> Self {
        self.insert(signature);
        self
    }

    pub fn remove(&mut self, signer: Address) -> Option<Signature> {
        self.0.remove(&signer)
    }

    /// Union of both sets. Order-independent: conflicting entries for one signer
    /// resolve to the same winner whichever side they come from.
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for sig in other.0.values() {
            merged.absorb(sig.clone());
        }
        merged
    }

    fn absorb(&mut self, signature: Signature) {
        match self.0.get(&signature.signer) {
            Some(existing) if !existing.precedes(&signature) => {}
            _ => {
                self.0.insert(signature.signer, signature);
            }
        }
    }

    /// Canonical `signatures` argument for `execTransaction`.
    ///
    /// Static 65-byte slots in ascending signer order, then the dynamic region
    /// holding `uint256(len) ‖ data` for every contract signature. A contract slot is
    /// `pad32(signer) ‖ uint256(offset) ‖ 0x00`, the offset counted from the start of the blob.
    pub fn encode(&self) -> Bytes {
        let static_len = EOA_SIGNATURE_LEN * self.0.len();
        let mut statics = Vec::with_capacity(static_len);
        let mut dynamic = Vec::new();
        for sig in self.0.values() {
            if sig.is_contract_signature {
                let offset = U256::from(static_len + dynamic.len());
                statics.extend_from_slice(&[0u8; 12]);
                statics.extend_from_slice(sig.signer.as_slice());
                statics.extend_from_slice(&offset.to_be_bytes::<32>());
                statics.push(0);
                dynamic.extend_from_slice(&U256::from(sig.data.len()).to_be_bytes::<32>());
                dynamic.extend_from_slice(&sig.data);
            } else {
                statics.extend_from_slice(&sig.data);
            }
        }
        statics.extend_from_slice(&dynamic);
        statics.into()
    }
}

impl FromIterator<Signature> for SignatureSet {
    fn from_iter<I: IntoIterator<Item = Signature>>(iter: I) -> Self {
        let mut set = Self::new();
        for sig in iter {
            set.absorb(sig);
        }
        set
    }
}

impl Serialize for SignatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values())
    }
}

impl<'de> Deserialize<'de> for SignatureSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<Signature>::deserialize(deserializer)?;
        for sig in &list {
            sig.validate().map_err(serde::de::Error::custom)?;
        }
        Ok(list.into_iter().collect())
    }
}

/// An entity together with the signatures collected for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signed<T> {
    pub data: T,
    #[serde(default)]
    pub signatures: SignatureSet,
}

impl<T> Signed<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            signatures: SignatureSet::new(),
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.insert(signature);
        self
    }

    pub fn is_threshold_met(&self, threshold: u64) -> bool {
        self.signatures.is_threshold_met(threshold)
    }
}

impl<T: Clone> Signed<T> {
    /// Keeps `self.data`; signatures are unioned.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            data: self.data.clone(),
            signatures: self.signatures.merge(&other.signatures),
        }
    }
}
