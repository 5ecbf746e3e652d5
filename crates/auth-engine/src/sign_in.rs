//! Wallet sign-in flow.

use crate::api::{LoginCredentials, TokenPair};
use crate::session::SessionManager;
use crate::wallet::{ensure_wallet_ready, WalletSigner};
use crate::AuthResult;
use tracing::debug;

impl SessionManager {
    /// Full sign-in: challenge, wallet signature, token exchange.
    ///
    /// Fails with `WalletNotConnected` before any request when the wallet is
    /// not ready; a declined signature stops the flow before `/auth`.
    pub async fn sign_in_with_wallet(&self, wallet: &dyn WalletSigner) -> AuthResult<TokenPair> {
        let account = ensure_wallet_ready(wallet)?;

        let challenge = self
            .prepare_challenge(&account.address, &account.public_key)
            .await?;
        let sign_data = challenge.sign_data();

        debug!(signer = %account.address, "Requesting challenge signature");
        let signed = wallet.sign_arbitrary(&account.address, &sign_data).await?;

        let credentials = LoginCredentials {
            signer: challenge.signer,
            public_key: account.public_key,
            signature: signed.signature,
            data: sign_data,
        };
        self.login(&credentials).await
    }
}
