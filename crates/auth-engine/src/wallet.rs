//! Wallet signing seam.
//!
//! The wallet extension lives outside this crate; callers supply an
//! implementation of [`WalletSigner`].

use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Connected account as reported by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    /// Bech32 address, used as the signer
    pub address: String,
    /// Base64 public key
    pub public_key: String,
}

/// Result of an arbitrary-data signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    /// Public key that produced the signature
    pub public_key: String,
    pub signature: String,
}

#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn status(&self) -> WalletStatus;

    /// Connected account, `None` while disconnected.
    fn account(&self) -> Option<WalletAccount>;

    /// Sign `data` (a base64 string) on behalf of `signer`.
    ///
    /// A user rejection is reported as [`AuthError::SignatureRejected`].
    async fn sign_arbitrary(&self, signer: &str, data: &str) -> AuthResult<SignedMessage>;
}

/// Return the connected account or fail before any network call is made.
pub fn ensure_wallet_ready(wallet: &dyn WalletSigner) -> AuthResult<WalletAccount> {
    match wallet.status() {
        WalletStatus::Connected => wallet.account().ok_or_else(|| {
            AuthError::WalletNotConnected("wallet reports no account".to_string())
        }),
        status => Err(AuthError::WalletNotConnected(format!(
            "wallet is {:?}",
            status
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWallet {
        status: WalletStatus,
        account: Option<WalletAccount>,
    }

    #[async_trait]
    impl WalletSigner for FixedWallet {
        fn status(&self) -> WalletStatus {
            self.status
        }

        fn account(&self) -> Option<WalletAccount> {
            self.account.clone()
        }

        async fn sign_arbitrary(&self, _signer: &str, _data: &str) -> AuthResult<SignedMessage> {
            Err(AuthError::SignatureRejected("unused".to_string()))
        }
    }

    fn account() -> WalletAccount {
        WalletAccount {
            address: "cosmos1abc".to_string(),
            public_key: "AgE2".to_string(),
        }
    }

    #[test]
    fn test_connected_wallet_is_ready() {
        let wallet = FixedWallet {
            status: WalletStatus::Connected,
            account: Some(account()),
        };
        assert_eq!(ensure_wallet_ready(&wallet).unwrap(), account());
    }

    #[test]
    fn test_connecting_wallet_is_not_ready() {
        let wallet = FixedWallet {
            status: WalletStatus::Connecting,
            account: Some(account()),
        };
        assert!(matches!(
            ensure_wallet_ready(&wallet),
            Err(AuthError::WalletNotConnected(_))
        ));
    }

    #[test]
    fn test_connected_without_account_is_not_ready() {
        let wallet = FixedWallet {
            status: WalletStatus::Connected,
            account: None,
        };
        assert!(ensure_wallet_ready(&wallet).is_err());
    }
}
