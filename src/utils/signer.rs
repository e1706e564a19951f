//! Local Transaction Signer
//!
//! Holds the trading keypair and signs prebuilt transactions returned by the
//! swap aggregator. Supports legacy and versioned (v0) wire formats:
//!
//! ```text
//! legacy:    [sig count (compact-u16)] [N × 64-byte sig slots] [message]
//! versioned: [sig count (compact-u16)] [N × 64-byte sig slots] [0x80|ver] [message]
//! ```
//!
//! The fee payer's signature always goes into slot 0.

use ed25519_dalek::{Signer, SigningKey};
use tracing::debug;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::PUBKEY_BYTES;

/// Trading wallet
pub struct WalletSigner {
    signing_key: SigningKey,
    pubkey: String,
}

impl std::fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSigner").field("pubkey", &self.pubkey).finish()
    }
}

impl WalletSigner {
    /// Parse a base58 64-byte keypair (secret ‖ public, Solana CLI convention)
    pub fn from_base58(keypair_b58: &str) -> AppResult<Self> {
        let bytes = bs58::decode(keypair_b58.trim())
            .into_vec()
            .map_err(|e| AppError::invalid_config(format!("Invalid private key encoding: {}", e)))?;
        if bytes.len() != 64 {
            return Err(AppError::invalid_config(format!(
                "Invalid Solana keypair: expected 64 bytes, got {}",
                bytes.len()
            )));
        }

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&bytes[..32]);
        let signer = Self::from_secret(&secret);

        let embedded = bs58::encode(&bytes[32..]).into_string();
        if embedded != signer.pubkey {
            return Err(AppError::invalid_config(
                "Keypair public half does not match its secret half",
            ));
        }
        Ok(signer)
    }

    pub fn from_secret(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let pubkey = bs58::encode(signing_key.verifying_key().as_bytes()).into_string();
        Self { signing_key, pubkey }
    }

    /// Base58 public key
    pub fn pubkey(&self) -> &str {
        &self.pubkey
    }

    /// Sign `tx_bytes` and return the wire transaction with slot 0 filled
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> AppResult<Vec<u8>> {
        if tx_bytes.is_empty() {
            return Err(AppError::signing_failed("Empty transaction"));
        }

        let (num_sigs, header_len) = decode_compact_u16(tx_bytes)?;
        if num_sigs == 0 {
            return Err(AppError::signing_failed("Transaction requires no signatures"));
        }

        let sigs_start = header_len;
        let sigs_end = sigs_start + num_sigs as usize * 64;
        if sigs_end >= tx_bytes.len() {
            return Err(AppError::signing_failed(format!(
                "Transaction too short: {} signature slots need {} bytes, have {}",
                num_sigs,
                sigs_end,
                tx_bytes.len()
            )));
        }

        // The signed message includes the version prefix for v0
        let message = &tx_bytes[sigs_end..];
        let versioned = message[0] & 0x80 != 0;

        let fee_payer = message_fee_payer(message, versioned)?;
        if fee_payer != self.signing_key.verifying_key().as_bytes() {
            return Err(AppError::signing_failed(format!(
                "Transaction fee payer is not wallet {}",
                self.pubkey
            )));
        }

        let signature = self.signing_key.sign(message);
        let mut signed = tx_bytes.to_vec();
        signed[sigs_start..sigs_start + 64].copy_from_slice(&signature.to_bytes());

        debug!(versioned, num_sigs, msg_len = message.len(), "Transaction signed");
        Ok(signed)
    }
}

/// First static account key of the message
fn message_fee_payer(message: &[u8], versioned: bool) -> AppResult<&[u8]> {
    // [version?] [3-byte header] [account count (compact-u16)] [keys...]
    let header_start = usize::from(versioned);
    let keys_len_at = header_start + 3;
    if message.len() <= keys_len_at {
        return Err(AppError::signing_failed("Truncated message header"));
    }
    let (num_keys, len_bytes) = decode_compact_u16(&message[keys_len_at..])?;
    let first_key = keys_len_at + len_bytes;
    if num_keys == 0 || message.len() < first_key + PUBKEY_BYTES {
        return Err(AppError::signing_failed("Message has no account keys"));
    }
    Ok(&message[first_key..first_key + PUBKEY_BYTES])
}

/// Decode Solana compact-u16; returns (value, bytes consumed)
pub fn decode_compact_u16(data: &[u8]) -> AppResult<(u16, usize)> {
    let mut value: u32 = 0;
    for (i, byte) in data.iter().take(3).enumerate() {
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| AppError::signing_failed("compact-u16 overflow"));
        }
    }
    Err(AppError::signing_failed("Truncated compact-u16"))
}

/// Encode a compact-u16 value
pub fn encode_compact_u16(val: u16) -> Vec<u8> {
    if val < 0x80 {
        vec![val as u8]
    } else if val < 0x4000 {
        vec![(val & 0x7F | 0x80) as u8, (val >> 7) as u8]
    } else {
        vec![(val & 0x7F | 0x80) as u8, ((val >> 7) & 0x7F | 0x80) as u8, (val >> 14) as u8]
    }
}
